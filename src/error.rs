//! Error types for catalog lookups and playback.

use thiserror::Error;

/// Main error type for all Melodeck operations.
#[derive(Debug, Error)]
pub enum MelodeckError {
    /// Track was not found.
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// Album was not found.
    #[error("Album not found: {0}")]
    AlbumNotFound(String),

    /// Playlist was not found.
    #[error("Playlist not found: {0}")]
    PlaylistNotFound(String),

    /// Artist was not found.
    #[error("Artist not found: {0}")]
    ArtistNotFound(String),

    /// The track carries no stream variant that can be played.
    #[error("No playable source for track: {0}")]
    NoPlayableSource(String),

    /// The audio subsystem failed to acquire or drive a handle.
    #[error("Audio backend error: {0}")]
    AudioBackend(String),

    /// The play request was overtaken by a newer one before it committed.
    #[error("Playback request superseded: {0}")]
    Superseded(String),

    /// No data returned from API.
    #[error("No data from API: {0}")]
    NoDataApi(String),

    /// HTTP request failed.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Generic API error with message.
    #[error("API error: {0}")]
    ApiError(String),
}

/// Result type alias for Melodeck operations.
pub type Result<T> = std::result::Result<T, MelodeckError>;
