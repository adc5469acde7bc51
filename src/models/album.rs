//! Album model.

use serde::{Deserialize, Serialize};

use super::common::{preferred_image, ArtistRef, Image};
use super::track::Track;

/// A full album record with its songs.
///
/// Search results return albums without songs; `songs` is only populated
/// by a details lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Album {
    /// Album ID.
    pub id: String,

    /// Album name.
    pub name: String,

    /// Release year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    /// Language label.
    #[serde(default)]
    pub language: String,

    /// Primary album artists.
    #[serde(default)]
    pub artists: Vec<ArtistRef>,

    /// Number of songs reported by the API.
    #[serde(default)]
    pub song_count: u32,

    /// Cover images in quality order.
    #[serde(default)]
    pub images: Vec<Image>,

    /// Songs on the album.
    #[serde(default)]
    pub songs: Vec<Track>,
}

impl Album {
    /// Get all artist names joined by a separator.
    pub fn artists_string(&self, separator: &str) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// URL of the cover shown on album screens.
    pub fn cover_url(&self) -> Option<&str> {
        preferred_image(&self.images).map(|i| i.url.as_str())
    }

    /// Total running time of the known song durations, in seconds.
    pub fn total_duration_secs(&self) -> u64 {
        self.songs
            .iter()
            .filter_map(|s| s.duration_secs)
            .map(u64::from)
            .sum()
    }
}
