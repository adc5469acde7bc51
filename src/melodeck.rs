//! Unified player interface.
//!
//! [`Melodeck`] bundles the catalog lookup, the playback manager and the
//! favorites set into one context object. Build it once at startup and hand
//! references to every screen.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::api::TrackLookup;
use crate::config::PlayerConfig;
use crate::error::{MelodeckError, Result};
use crate::models::{dedup_by_id, Track};
use crate::playback::{AudioBackend, Favorites, PlaybackManager, PlayerSnapshot, StatusEvents};

/// Queries shorter than this never reach the catalog.
pub const MIN_QUERY_LEN: usize = 3;

/// Number of search results requested per query.
pub const SEARCH_LIMIT: u32 = 20;

/// Number of suggestions appended after a track started on its own.
pub const SUGGESTION_LIMIT: u32 = 10;

/// Number of an artist's top songs queued by [`Melodeck::queue_artist_next`].
pub const ARTIST_PLAY_NEXT_COUNT: usize = 5;

/// Player context shared by all screens.
///
/// # Example
///
/// ```rust,no_run
/// use melodeck::{ApiConfig, DryRunBackend, Melodeck, PlayerConfig, SaavnApi};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let api = SaavnApi::new(ApiConfig::default())?;
///     let (player, events) = Melodeck::new(api, DryRunBackend::new(), PlayerConfig::default());
///     player.spawn_status_loop(events);
///
///     let snapshot = player.play_track("yDeAS8Eh").await?;
///     println!("Queue has {} songs", snapshot.queue.len());
///     Ok(())
/// }
/// ```
pub struct Melodeck<B, L> {
    lookup: L,
    playback: Arc<PlaybackManager<B>>,
    favorites: RwLock<Favorites>,
}

impl<B, L> Melodeck<B, L>
where
    B: AudioBackend + 'static,
    L: TrackLookup,
{
    /// Create a player context.
    ///
    /// The returned [`StatusEvents`] carry backend progress reports; pass
    /// them to [`Melodeck::spawn_status_loop`].
    pub fn new(lookup: L, backend: B, config: PlayerConfig) -> (Self, StatusEvents) {
        let (playback, events) = PlaybackManager::new(backend, config);
        let player = Self {
            lookup,
            playback: Arc::new(playback),
            favorites: RwLock::new(Favorites::new()),
        };
        (player, events)
    }

    /// Direct access to the transport operations.
    pub fn playback(&self) -> &Arc<PlaybackManager<B>> {
        &self.playback
    }

    /// The catalog lookup in use.
    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Run the status loop on the tokio runtime.
    pub fn spawn_status_loop(&self, events: StatusEvents) -> JoinHandle<()> {
        let playback = Arc::clone(&self.playback);
        tokio::spawn(async move { playback.run_status_loop(events).await })
    }

    // ==================
    // CATALOG
    // ==================

    /// Search songs. Queries under three characters return nothing.
    pub async fn search_songs(&self, query: &str) -> Result<Vec<Track>> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_LEN {
            debug!("Query {:?} too short, skipping search", query);
            return Ok(Vec::new());
        }
        self.lookup.search(query, SEARCH_LIMIT).await
    }

    // ==================
    // PLAYBACK
    // ==================

    /// Fetch a track and play it, queueing related songs after it.
    ///
    /// Suggestions are best effort: if they cannot be fetched the track
    /// plays as a single-song queue.
    pub async fn play_track(&self, id: &str) -> Result<PlayerSnapshot> {
        let track = self.lookup.track(id).await?;

        let suggestions = match self.lookup.suggestions(id, SUGGESTION_LIMIT).await {
            Ok(tracks) => tracks,
            Err(e) => {
                warn!("No suggestions for {}: {}", id, e);
                Vec::new()
            }
        };

        let mut queue = Vec::with_capacity(suggestions.len() + 1);
        queue.push(track.clone());
        queue.extend(suggestions);
        let queue = dedup_by_id(queue);

        self.playback.play_song(track, queue).await?;
        Ok(self.playback.snapshot())
    }

    /// Play an artist's top songs, starting from the first playable one.
    pub async fn play_artist(&self, artist_id: &str) -> Result<PlayerSnapshot> {
        let tracks = dedup_by_id(self.lookup.tracks_by_artist(artist_id).await?);
        let first = tracks
            .iter()
            .position(Track::is_playable)
            .ok_or_else(|| MelodeckError::NoPlayableSource(artist_id.to_string()))?;

        self.playback.play_at(tracks, first).await?;
        Ok(self.playback.snapshot())
    }

    /// Queue an artist's top five playable songs right after the current
    /// track, in their catalog order. Returns how many were queued.
    pub async fn queue_artist_next(&self, artist_id: &str) -> Result<usize> {
        let tracks = self.playable_artist_tracks(artist_id).await?;
        let picked: Vec<Track> = tracks.into_iter().take(ARTIST_PLAY_NEXT_COUNT).collect();
        let count = picked.len();

        // Each insert lands right after the current track, so go backwards.
        for track in picked.into_iter().rev() {
            self.playback.play_song_next(track).await;
        }
        Ok(count)
    }

    /// Append all of an artist's playable songs to the queue. Returns how
    /// many were queued.
    pub async fn queue_artist(&self, artist_id: &str) -> Result<usize> {
        let tracks = self.playable_artist_tracks(artist_id).await?;
        let count = tracks.len();
        for track in tracks {
            self.playback.add_to_queue(track).await;
        }
        Ok(count)
    }

    async fn playable_artist_tracks(&self, artist_id: &str) -> Result<Vec<Track>> {
        let tracks: Vec<Track> = dedup_by_id(self.lookup.tracks_by_artist(artist_id).await?)
            .into_iter()
            .filter(Track::is_playable)
            .collect();
        if tracks.is_empty() {
            return Err(MelodeckError::NoPlayableSource(artist_id.to_string()));
        }
        debug!("Queueing {} songs by artist {}", tracks.len(), artist_id);
        Ok(tracks)
    }

    // ==================
    // FAVORITES
    // ==================

    /// Flip a track's favorite flag. Returns the new flag.
    pub async fn toggle_favorite(&self, id: &str) -> bool {
        self.favorites.write().await.toggle(id)
    }

    pub async fn is_favorite(&self, id: &str) -> bool {
        self.favorites.read().await.contains(id)
    }

    pub async fn favorite_ids(&self) -> Vec<String> {
        self.favorites.read().await.ids()
    }

    pub async fn favorite_count(&self) -> usize {
        self.favorites.read().await.len()
    }

    /// Resolve the favorite IDs to full tracks.
    pub async fn favorite_tracks(&self) -> Result<Vec<Track>> {
        let ids = {
            let favorites = self.favorites.read().await;
            if favorites.is_empty() {
                return Ok(Vec::new());
            }
            favorites.ids()
        };
        self.lookup.tracks(&ids).await
    }
}
