//! # Melodeck
//!
//! Playback queue manager and catalog client for JioSaavn-compatible
//! streaming APIs.
//!
//! ## Quick Start
//!
//! The easiest way to use this library is through the [`Melodeck`] struct:
//!
//! ```rust,no_run
//! use melodeck::{ApiConfig, DryRunBackend, Melodeck, PlayerConfig, SaavnApi};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let api = SaavnApi::new(ApiConfig::default())?;
//!     let (player, events) = Melodeck::new(api, DryRunBackend::new(), PlayerConfig::default());
//!     player.spawn_status_loop(events);
//!
//!     // Search, then play the first hit with related songs queued after it
//!     let hits = player.search_songs("believer").await?;
//!     if let Some(first) = hits.first() {
//!         player.play_track(&first.id).await?;
//!     }
//!
//!     // Transport
//!     player.playback().toggle_play_pause().await?;
//!     player.playback().play_next().await?;
//!
//!     let now = player.playback().snapshot();
//!     println!("{:?} at {} ms", now.current_song.map(|t| t.title), now.position_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **One playback authority**: queue, current index, position and
//!   recently played history live in [`PlaybackManager`]
//! - **Single-flight loading**: overlapping play requests never leak or
//!   double-commit an audio handle
//! - **Pluggable audio**: anything implementing [`AudioBackend`]
//! - **Catalog lookups** for songs, albums, artists and playlists
//!
//! ## Low-Level APIs
//!
//! - [`SaavnApi`] - HTTP catalog client
//! - [`PlaybackManager`] - transport operations and observable state
//! - [`converters`] - JSON to model parsing

pub mod api;
pub mod config;
pub mod converters;
pub mod error;
mod melodeck;
pub mod models;
pub mod playback;

// Main interface (recommended)
pub use melodeck::{
    Melodeck, ARTIST_PLAY_NEXT_COUNT, MIN_QUERY_LEN, SEARCH_LIMIT, SUGGESTION_LIMIT,
};

// Low-level APIs
pub use api::{SaavnApi, TrackLookup};
pub use config::{ApiConfig, PlayerConfig};
pub use error::{MelodeckError, Result};
pub use models::{Album, Artist, Playlist, SortOrder, Track};
pub use playback::{
    AudioBackend, AudioHandle, DryRunBackend, PlaybackManager, PlayerSnapshot, SessionState,
};
