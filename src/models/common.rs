//! Common types shared across all models.

use serde::{Deserialize, Serialize};

/// Artwork variant with its quality tier label (e.g. "500x500").
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Image {
    /// Quality tier as reported by the API.
    pub quality: String,

    /// URL to the image.
    pub url: String,
}

impl Image {
    /// Create a new image.
    pub fn new<S1: Into<String>, S2: Into<String>>(quality: S1, url: S2) -> Self {
        Self {
            quality: quality.into(),
            url: url.into(),
        }
    }
}

/// One playable stream of a track at a given bitrate tier.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StreamVariant {
    /// Bitrate tier as reported by the API (e.g. "320kbps").
    pub quality: String,

    /// Direct stream URL.
    pub url: String,
}

impl StreamVariant {
    /// Create a new stream variant.
    pub fn new<S1: Into<String>, S2: Into<String>>(quality: S1, url: S2) -> Self {
        Self {
            quality: quality.into(),
            url: url.into(),
        }
    }

    /// Numeric bitrate in kbps, when the tier label carries one.
    pub fn kbps(&self) -> Option<u32> {
        let digits: String = self
            .quality
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        digits.parse().ok()
    }
}

/// Artist reference nested inside tracks and albums.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArtistRef {
    /// Artist ID.
    pub id: String,

    /// Artist name.
    pub name: String,

    /// Role on the record ("primary_artists", "singer", "music", ...).
    #[serde(default)]
    pub role: String,
}

impl ArtistRef {
    /// Create a new artist reference.
    pub fn new<S1: Into<String>, S2: Into<String>>(id: S1, name: S2) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: String::new(),
        }
    }
}

/// Album reference nested inside a track.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlbumRef {
    /// Album ID.
    pub id: String,

    /// Album name.
    pub name: String,
}

/// Pick the preferred artwork from a list of variants.
///
/// Screens show the 500x500 tier; lists that lack it fall back to the third
/// variant and then to the first.
pub fn preferred_image(images: &[Image]) -> Option<&Image> {
    images
        .iter()
        .find(|i| i.quality == "500x500")
        .or_else(|| images.get(2))
        .or_else(|| images.first())
}
