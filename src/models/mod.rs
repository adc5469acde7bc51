//! Data models for catalog API responses.
//!
//! This module contains the structures used to represent tracks, albums,
//! playlists and artists, plus helpers for ordering track lists.

pub mod album;
pub mod artist;
pub mod catalog;
pub mod common;
pub mod playlist;
pub mod track;

// Re-exports for convenience
pub use album::Album;
pub use artist::Artist;
pub use catalog::{dedup_by_id, sort_tracks, SortOrder};
pub use common::{AlbumRef, ArtistRef, Image, StreamVariant};
pub use playlist::Playlist;
pub use track::Track;
