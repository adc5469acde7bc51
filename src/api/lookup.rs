//! Track lookup port used by the playback facade.

use async_trait::async_trait;

use super::saavn::SaavnApi;
use crate::error::Result;
use crate::models::Track;

/// Source of tracks for the player.
///
/// [`SaavnApi`] is the production implementation; tests substitute a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackLookup: Send + Sync {
    /// Fetch a single track.
    async fn track(&self, id: &str) -> Result<Track>;

    /// Fetch several tracks. Unknown IDs are left out.
    async fn tracks(&self, ids: &[String]) -> Result<Vec<Track>>;

    /// Search tracks by free text.
    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Track>>;

    /// Tracks related to the given one, for filling a queue.
    async fn suggestions(&self, id: &str, limit: u32) -> Result<Vec<Track>>;

    /// Top tracks of an artist.
    async fn tracks_by_artist(&self, artist_id: &str) -> Result<Vec<Track>>;
}

#[async_trait]
impl TrackLookup for SaavnApi {
    async fn track(&self, id: &str) -> Result<Track> {
        self.get_song(id).await
    }

    async fn tracks(&self, ids: &[String]) -> Result<Vec<Track>> {
        self.get_songs(ids).await
    }

    async fn search(&self, query: &str, limit: u32) -> Result<Vec<Track>> {
        self.search_songs(query, 1, limit).await
    }

    async fn suggestions(&self, id: &str, limit: u32) -> Result<Vec<Track>> {
        self.get_song_suggestions(id, limit).await
    }

    async fn tracks_by_artist(&self, artist_id: &str) -> Result<Vec<Track>> {
        self.get_artist_songs(artist_id).await
    }
}
