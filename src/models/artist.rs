//! Artist model.

use serde::{Deserialize, Serialize};

use super::album::Album;
use super::common::{preferred_image, Image};
use super::track::Track;

/// A full artist record.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Artist {
    /// Artist ID.
    pub id: String,

    /// Artist name.
    pub name: String,

    /// Profile images in quality order.
    #[serde(default)]
    pub images: Vec<Image>,

    /// Follower count, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follower_count: Option<u64>,

    /// Whether the profile is verified.
    #[serde(default)]
    pub is_verified: bool,

    /// Main language of the artist's catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant_language: Option<String>,

    /// Most popular songs.
    #[serde(default)]
    pub top_songs: Vec<Track>,

    /// Most popular albums.
    #[serde(default)]
    pub top_albums: Vec<Album>,
}

impl Artist {
    /// URL of the avatar shown on artist screens.
    pub fn avatar_url(&self) -> Option<&str> {
        preferred_image(&self.images).map(|i| i.url.as_str())
    }
}
