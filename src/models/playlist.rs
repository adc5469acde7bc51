//! Playlist model.

use serde::{Deserialize, Serialize};

use super::common::Image;
use super::track::Track;

/// A playlist and its songs.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Playlist {
    /// Playlist ID.
    pub id: String,

    /// Playlist name.
    pub name: String,

    /// Number of songs reported by the API.
    #[serde(default)]
    pub song_count: u32,

    /// Cover images in quality order.
    #[serde(default)]
    pub images: Vec<Image>,

    /// Songs in playlist order.
    #[serde(default)]
    pub songs: Vec<Track>,
}
