//! Track model.
//!
//! A track is immutable once fetched: the playback core clones and moves
//! it between the queue and the history, but never edits it.

use serde::{Deserialize, Serialize};

use super::common::{preferred_image, AlbumRef, ArtistRef, Image, StreamVariant};

/// A playable song with metadata, artwork and stream variants.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Track {
    /// Track ID.
    pub id: String,

    /// Display title.
    pub title: String,

    /// Artists, primary artists first.
    #[serde(default)]
    pub artists: Vec<ArtistRef>,

    /// Album this track belongs to, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<AlbumRef>,

    /// Release year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,

    /// Language label.
    #[serde(default)]
    pub language: String,

    /// Duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,

    /// Whether the track has explicit content.
    #[serde(default)]
    pub explicit: bool,

    /// Play count reported by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_count: Option<u64>,

    /// Artwork variants in quality order.
    #[serde(default)]
    pub images: Vec<Image>,

    /// Stream variants in bitrate order.
    #[serde(default)]
    pub streams: Vec<StreamVariant>,
}

impl Track {
    /// Create a track with just an ID and title.
    pub fn new<S1: Into<String>, S2: Into<String>>(id: S1, title: S2) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Get the primary artist name.
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(|a| a.name.as_str())
    }

    /// Get all artist names joined by a separator.
    pub fn artists_string(&self, separator: &str) -> String {
        self.artists
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// Get duration formatted as MM:SS, or "--:--" when unknown.
    pub fn duration_formatted(&self) -> String {
        match self.duration_secs {
            Some(total) => format!("{:02}:{:02}", total / 60, total % 60),
            None => "--:--".to_string(),
        }
    }

    /// URL of the artwork shown on player screens.
    pub fn artwork_url(&self) -> Option<&str> {
        preferred_image(&self.images).map(|i| i.url.as_str())
    }

    /// Whether the track has at least one stream variant.
    pub fn is_playable(&self) -> bool {
        !self.streams.is_empty()
    }
}
