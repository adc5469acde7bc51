//! The playback manager.
//!
//! Single authority over what is playing: it owns the audio handle, the
//! play queue, the current position and the recently played list. Screens
//! call its transport methods and read [`PlayerSnapshot`]s; nothing else
//! touches the handle.
//!
//! Overlapping `play_song` calls are resolved with a generation counter.
//! Every call takes a new generation before it waits on the backend, and
//! only the call holding the latest generation may commit. A load that
//! finishes late unloads its own handle. Status reports carry the
//! generation of the handle that sent them, so reports from replaced
//! handles are dropped.
//!
//! While a load is in flight the queue it will install is held as a
//! pending queue. Queue edits made during the load go to both the
//! committed queue and the pending one, so they survive either outcome.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, error, info, warn};

use super::audio::{AudioBackend, AudioHandle, StatusEvent, StatusEvents, StatusSink};
use super::history::RecentlyPlayed;
use super::stream::select_stream;
use crate::config::PlayerConfig;
use crate::error::{MelodeckError, Result};
use crate::models::Track;

/// Lifecycle of the current playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Nothing loaded. After a failed load `current_song` and
    /// `current_index` still name the last committed track, with its
    /// duration and position zero.
    #[default]
    Idle,
    /// Waiting for the backend to open a stream.
    Loading,
    Playing,
    Paused,
    /// The last track of the queue ran out. The handle stays loaded.
    Finished,
}

/// Read-only view of the player, published after every change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerSnapshot {
    pub current_song: Option<Track>,
    pub is_playing: bool,
    pub queue: Vec<Track>,
    /// Position of `current_song` in `queue`; `None` when idle.
    pub current_index: Option<usize>,
    pub duration_ms: u64,
    pub position_ms: u64,
    pub recently_played: Vec<Track>,
    pub state: SessionState,
}

/// Queue a load in flight will install when it commits.
struct PendingQueue {
    generation: u64,
    queue: Vec<Track>,
    index: usize,
}

struct Inner {
    pending: Option<PendingQueue>,
    handle: Option<Box<dyn AudioHandle>>,
    current_song: Option<Track>,
    is_playing: bool,
    queue: Vec<Track>,
    current_index: Option<usize>,
    duration_ms: u64,
    position_ms: u64,
    recently_played: RecentlyPlayed,
    state: SessionState,
}

impl Inner {
    fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            current_song: self.current_song.clone(),
            is_playing: self.is_playing,
            queue: self.queue.clone(),
            current_index: self.current_index,
            duration_ms: self.duration_ms,
            position_ms: self.position_ms,
            recently_played: self.recently_played.to_vec(),
            state: self.state,
        }
    }

    /// The queue and position that next/previous move from: the pending
    /// queue while a load is in flight, the committed one otherwise.
    fn play_queue(&self) -> (&[Track], Option<usize>) {
        match &self.pending {
            Some(pending) => (&pending.queue, Some(pending.index)),
            None => (&self.queue, self.current_index),
        }
    }
}

/// Owns the audio session, the queue and the play history.
///
/// Construct once at startup and share it (usually behind an `Arc`). The
/// [`StatusEvents`] returned by [`PlaybackManager::new`] must be fed back
/// through [`PlaybackManager::run_status_loop`] or
/// [`PlaybackManager::handle_status`].
pub struct PlaybackManager<B> {
    backend: B,
    config: PlayerConfig,
    inner: Mutex<Inner>,
    generation: AtomicU64,
    status_tx: mpsc::UnboundedSender<StatusEvent>,
    snapshot_tx: watch::Sender<PlayerSnapshot>,
}

impl<B: AudioBackend> PlaybackManager<B> {
    pub fn new(backend: B, config: PlayerConfig) -> (Self, StatusEvents) {
        let (status_tx, events) = StatusEvents::channel();
        let inner = Inner {
            pending: None,
            handle: None,
            current_song: None,
            is_playing: false,
            queue: Vec::new(),
            current_index: None,
            duration_ms: 0,
            position_ms: 0,
            recently_played: RecentlyPlayed::with_capacity(config.history_capacity),
            state: SessionState::Idle,
        };
        let (snapshot_tx, _) = watch::channel(inner.snapshot());

        let manager = Self {
            backend,
            config,
            inner: Mutex::new(inner),
            generation: AtomicU64::new(0),
            status_tx,
            snapshot_tx,
        };
        (manager, events)
    }

    /// The backend this manager drives.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Latest published state.
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Receive a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn recently_played(&self) -> Vec<Track> {
        self.snapshot_tx.borrow().recently_played.clone()
    }

    fn publish(&self, inner: &Inner) {
        self.snapshot_tx.send_replace(inner.snapshot());
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Play `track` with `queue` as the new play queue.
    ///
    /// A track with no stream variant is refused before anything changes.
    /// When `track` is not part of `queue`, the queue becomes `[track]`.
    pub async fn play_song(&self, track: Track, queue: Vec<Track>) -> Result<()> {
        match queue.iter().position(|t| t.id == track.id) {
            Some(index) => self.play_at(queue, index).await,
            None => {
                warn!(
                    "Track {} is not in its queue; playing it as a single-track queue",
                    track.id
                );
                self.play_at(vec![track], 0).await
            }
        }
    }

    /// Play `queue[index]`, making `queue` the play queue.
    pub async fn play_at(&self, queue: Vec<Track>, index: usize) -> Result<()> {
        let Some(track) = queue.get(index).cloned() else {
            return Err(MelodeckError::TrackNotFound(format!(
                "queue position {} of {}",
                index,
                queue.len()
            )));
        };

        let Some(stream) = select_stream(&track.streams, &self.config.preferred_quality) else {
            warn!("No stream variant for {} ({}); not playing", track.title, track.id);
            return Err(MelodeckError::NoPlayableSource(track.id));
        };
        let url = stream.url.clone();
        debug!("Selected {} stream for {}", stream.quality, track.id);

        // Generations only move under the lock, so the pending queue always
        // belongs to the newest request.
        let (generation, previous) = {
            let mut inner = self.inner.lock().await;
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            let previous = inner.handle.take();
            inner.state = SessionState::Loading;
            inner.is_playing = false;
            inner.position_ms = 0;
            inner.duration_ms = 0;
            inner.pending = Some(PendingQueue {
                generation,
                queue,
                index,
            });
            self.publish(&inner);
            (generation, previous)
        };

        if let Some(mut handle) = previous {
            if let Err(e) = handle.unload().await {
                warn!("Failed to unload previous stream: {}", e);
            }
        }

        let sink = StatusSink::new(generation, self.status_tx.clone());
        let loaded = self.backend.load(&url, sink).await;

        let mut inner = self.inner.lock().await;

        let pending = match inner.pending.take() {
            Some(pending) if pending.generation == generation && self.is_current(generation) => {
                Some(pending)
            }
            other => {
                inner.pending = other;
                None
            }
        };

        let Some(pending) = pending else {
            drop(inner);
            debug!("Load of {} superseded by a newer request", track.id);
            if let Ok(mut handle) = loaded {
                if let Err(e) = handle.unload().await {
                    warn!("Failed to unload superseded stream: {}", e);
                }
            }
            return Err(MelodeckError::Superseded(track.id));
        };

        let handle = match loaded {
            Ok(handle) => handle,
            Err(e) => {
                error!("Error playing {}: {}", track.id, e);
                inner.state = SessionState::Idle;
                inner.is_playing = false;
                inner.duration_ms = 0;
                inner.position_ms = 0;
                self.publish(&inner);
                return Err(e);
            }
        };

        info!(
            "Now playing {} - {} ({}/{})",
            track.artists_string(", "),
            track.title,
            pending.index + 1,
            pending.queue.len()
        );

        // A report that arrived while loading wins over the catalog duration.
        if inner.duration_ms == 0 {
            if let Some(secs) = track.duration_secs {
                inner.duration_ms = u64::from(secs) * 1000;
            }
        }
        inner.handle = Some(handle);
        inner.recently_played.push(track.clone());
        inner.current_song = Some(track);
        inner.queue = pending.queue;
        inner.current_index = Some(pending.index);
        inner.is_playing = true;
        inner.state = SessionState::Playing;
        self.publish(&inner);
        Ok(())
    }

    /// Pause when playing, resume otherwise. No-op with nothing loaded.
    pub async fn toggle_play_pause(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let was_playing = inner.is_playing;
        let Some(handle) = inner.handle.as_mut() else {
            return Ok(());
        };

        if was_playing {
            handle.pause().await?;
        } else {
            handle.resume().await?;
        }

        inner.is_playing = !was_playing;
        inner.state = if was_playing {
            SessionState::Paused
        } else {
            SessionState::Playing
        };
        self.publish(&inner);
        Ok(())
    }

    /// Play the following queue entry. Returns false at the end of the queue.
    pub async fn play_next(&self) -> Result<bool> {
        let (queue, index) = {
            let inner = self.inner.lock().await;
            match inner.play_queue() {
                (queue, Some(i)) if i + 1 < queue.len() => (queue.to_vec(), i + 1),
                _ => return Ok(false),
            }
        };
        self.play_at(queue, index).await.map(|_| true)
    }

    /// Play the preceding queue entry. Returns false at the start of the queue.
    pub async fn play_previous(&self) -> Result<bool> {
        let (queue, index) = {
            let inner = self.inner.lock().await;
            match inner.play_queue() {
                (queue, Some(i)) if i > 0 => (queue.to_vec(), i - 1),
                _ => return Ok(false),
            }
        };
        self.play_at(queue, index).await.map(|_| true)
    }

    /// Move the play head of the current track. No-op with nothing loaded.
    pub async fn seek(&self, position_ms: u64) -> Result<()> {
        let mut inner = self.inner.lock().await;
        let Some(handle) = inner.handle.as_mut() else {
            return Ok(());
        };
        handle.seek(position_ms).await?;
        inner.position_ms = position_ms;
        self.publish(&inner);
        Ok(())
    }

    /// Insert `track` right after the current one. Does not start playback.
    ///
    /// During a load the track goes right after the track being loaded.
    pub async fn play_song_next(&self, track: Track) {
        let mut inner = self.inner.lock().await;
        if let Some(pending) = inner.pending.as_mut() {
            let at = (pending.index + 1).min(pending.queue.len());
            pending.queue.insert(at, track.clone());
        }
        let at = inner
            .current_index
            .map(|i| i + 1)
            .unwrap_or(0)
            .min(inner.queue.len());
        debug!("Queueing {} at position {}", track.id, at);
        inner.queue.insert(at, track);
        self.publish(&inner);
    }

    /// Append `track` to the queue. Does not start playback.
    pub async fn add_to_queue(&self, track: Track) {
        let mut inner = self.inner.lock().await;
        debug!("Appending {} to the queue", track.id);
        if let Some(pending) = inner.pending.as_mut() {
            pending.queue.push(track.clone());
        }
        inner.queue.push(track);
        self.publish(&inner);
    }

    /// Release the audio handle and return to idle.
    ///
    /// Any load still in flight is discarded when it completes. The
    /// recently played list is kept.
    pub async fn stop(&self) -> Result<()> {
        let previous = {
            let mut inner = self.inner.lock().await;
            self.generation.fetch_add(1, Ordering::SeqCst);
            let previous = inner.handle.take();
            inner.pending = None;
            inner.current_song = None;
            inner.current_index = None;
            inner.queue.clear();
            inner.is_playing = false;
            inner.position_ms = 0;
            inner.duration_ms = 0;
            inner.state = SessionState::Idle;
            self.publish(&inner);
            previous
        };

        if let Some(mut handle) = previous {
            handle.unload().await?;
        }
        Ok(())
    }

    /// Apply one status report from the audio subsystem.
    ///
    /// Reports from replaced handles and reports without loaded media are
    /// ignored. While loading, only position and duration are taken. The
    /// end-of-stream report advances the queue; at the end of the queue
    /// playback stays stopped on the last track.
    pub async fn handle_status(&self, event: StatusEvent) -> Result<()> {
        let status = event.status;
        let finished = {
            let mut inner = self.inner.lock().await;
            if !self.is_current(event.generation) {
                debug!("Dropping status from stale generation {}", event.generation);
                return Ok(());
            }
            if !status.is_loaded {
                return Ok(());
            }

            if let Some(duration) = status.duration_ms {
                inner.duration_ms = duration;
            }
            inner.position_ms = status.position_ms;

            if inner.state == SessionState::Loading {
                self.publish(&inner);
                return Ok(());
            }

            inner.is_playing = status.is_playing && !status.did_just_finish;
            inner.state = if status.did_just_finish {
                SessionState::Finished
            } else if status.is_playing {
                SessionState::Playing
            } else {
                SessionState::Paused
            };
            self.publish(&inner);
            status.did_just_finish
        };

        if finished && !self.play_next().await? {
            info!("Reached the end of the queue");
        }
        Ok(())
    }

    /// Feed backend statuses into [`Self::handle_status`] one at a time.
    ///
    /// Runs until every sender is gone, which only happens once the manager
    /// itself is dropped.
    pub async fn run_status_loop(&self, mut events: StatusEvents) {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle_status(event).await {
                warn!("Status update failed: {}", e);
            }
        }
    }

    /// Apply every status report that is already queued.
    pub async fn drain_status(&self, events: &mut StatusEvents) -> usize {
        let mut applied = 0;
        while let Some(event) = events.try_recv() {
            if let Err(e) = self.handle_status(event).await {
                warn!("Status update failed: {}", e);
            }
            applied += 1;
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StreamVariant;
    use crate::playback::audio::PlaybackStatus;
    use async_trait::async_trait;
    use std::collections::{HashMap, HashSet};
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Backend that records every call in a shared log.
    #[derive(Clone, Default)]
    struct RecordingBackend {
        log: Arc<std::sync::Mutex<Vec<String>>>,
        failing: Arc<std::sync::Mutex<HashSet<String>>>,
        gates: Arc<std::sync::Mutex<HashMap<String, Arc<Notify>>>>,
    }

    impl RecordingBackend {
        fn log(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }

        fn fail(&self, url: &str) {
            self.failing.lock().unwrap().insert(url.to_string());
        }

        fn gate(&self, url: &str) -> Arc<Notify> {
            let notify = Arc::new(Notify::new());
            self.gates
                .lock()
                .unwrap()
                .insert(url.to_string(), notify.clone());
            notify
        }
    }

    struct RecordingHandle {
        url: String,
        log: Arc<std::sync::Mutex<Vec<String>>>,
    }

    impl RecordingHandle {
        fn record(&self, op: &str) {
            self.log.lock().unwrap().push(format!("{} {}", op, self.url));
        }
    }

    #[async_trait]
    impl AudioBackend for RecordingBackend {
        async fn load(&self, url: &str, _sink: StatusSink) -> Result<Box<dyn AudioHandle>> {
            self.log.lock().unwrap().push(format!("load {}", url));
            let gate = self.gates.lock().unwrap().get(url).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            if self.failing.lock().unwrap().contains(url) {
                return Err(MelodeckError::AudioBackend("device busy".to_string()));
            }
            Ok(Box::new(RecordingHandle {
                url: url.to_string(),
                log: self.log.clone(),
            }))
        }
    }

    #[async_trait]
    impl AudioHandle for RecordingHandle {
        async fn pause(&mut self) -> Result<()> {
            self.record("pause");
            Ok(())
        }

        async fn resume(&mut self) -> Result<()> {
            self.record("resume");
            Ok(())
        }

        async fn seek(&mut self, position_ms: u64) -> Result<()> {
            self.record(&format!("seek {}", position_ms));
            Ok(())
        }

        async fn unload(&mut self) -> Result<()> {
            self.record("unload");
            Ok(())
        }
    }

    fn track(id: &str) -> Track {
        let mut track = Track::new(id, format!("Song {}", id));
        track.duration_secs = Some(180);
        track.streams = vec![
            StreamVariant::new("96kbps", format!("https://aac/{}/96", id)),
            StreamVariant::new("320kbps", format!("https://aac/{}/320", id)),
        ];
        track
    }

    fn url(id: &str) -> String {
        format!("https://aac/{}/320", id)
    }

    fn queue(ids: &[&str]) -> Vec<Track> {
        ids.iter().map(|id| track(id)).collect()
    }

    fn manager() -> (PlaybackManager<RecordingBackend>, StatusEvents, RecordingBackend) {
        let backend = RecordingBackend::default();
        let (manager, events) = PlaybackManager::new(backend.clone(), PlayerConfig::default());
        (manager, events, backend)
    }

    fn current_generation(manager: &PlaybackManager<RecordingBackend>) -> u64 {
        manager.generation.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_play_song_sets_index_and_song() {
        let (manager, _events, backend) = manager();
        let q = queue(&["a", "b", "c"]);

        manager.play_song(q[1].clone(), q.clone()).await.unwrap();

        let snap = manager.snapshot();
        assert_eq!(snap.current_index, Some(1));
        assert_eq!(snap.current_song.as_ref().map(|t| t.id.as_str()), Some("b"));
        assert_eq!(snap.queue.len(), 3);
        assert!(snap.is_playing);
        assert_eq!(snap.state, SessionState::Playing);
        assert_eq!(snap.duration_ms, 180_000);
        assert_eq!(backend.log(), vec![format!("load {}", url("b"))]);
    }

    #[tokio::test]
    async fn test_new_song_releases_previous_handle_first() {
        let (manager, _events, backend) = manager();
        let q = queue(&["a", "b"]);

        manager.play_song(q[0].clone(), q.clone()).await.unwrap();
        manager.play_song(q[1].clone(), q.clone()).await.unwrap();

        assert_eq!(
            backend.log(),
            vec![
                format!("load {}", url("a")),
                format!("unload {}", url("a")),
                format!("load {}", url("b")),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_stream_variant_leaves_state_unchanged() {
        let (manager, _events, backend) = manager();
        let mut silent = track("x");
        silent.streams.clear();

        let err = manager
            .play_song(silent.clone(), vec![silent.clone()])
            .await
            .unwrap_err();
        assert!(matches!(err, MelodeckError::NoPlayableSource(_)));
        assert_eq!(manager.snapshot(), PlayerSnapshot::default());

        let q = queue(&["a"]);
        manager.play_song(q[0].clone(), q.clone()).await.unwrap();
        let before = manager.snapshot();
        assert!(manager.play_song(silent.clone(), vec![silent]).await.is_err());
        assert_eq!(manager.snapshot(), before);
        assert!(!backend.log().iter().any(|l| l.starts_with("unload")));
    }

    #[tokio::test]
    async fn test_backend_failure_keeps_previous_song() {
        let (manager, _events, backend) = manager();
        let q = queue(&["a", "b"]);
        backend.fail(&url("b"));

        manager.play_song(q[0].clone(), q.clone()).await.unwrap();
        let err = manager.play_song(q[1].clone(), q.clone()).await.unwrap_err();
        assert!(matches!(err, MelodeckError::AudioBackend(_)));

        let snap = manager.snapshot();
        assert_eq!(snap.current_song.as_ref().map(|t| t.id.as_str()), Some("a"));
        assert_eq!(snap.current_index, Some(0));
        assert!(!snap.is_playing);
        assert_eq!(snap.state, SessionState::Idle);
        assert_eq!(snap.duration_ms, 0);
        assert_eq!(snap.position_ms, 0);
        assert_eq!(snap.recently_played.len(), 1);

        // Nothing is loaded, so transport calls are no-ops.
        manager.toggle_play_pause().await.unwrap();
        assert!(!manager.snapshot().is_playing);
    }

    #[tokio::test]
    async fn test_track_missing_from_queue_becomes_single_queue() {
        let (manager, _events, _backend) = manager();
        let stray = track("z");

        manager.play_song(stray, queue(&["a", "b"])).await.unwrap();

        let snap = manager.snapshot();
        assert_eq!(snap.current_index, Some(0));
        assert_eq!(snap.queue.len(), 1);
        assert_eq!(snap.queue[0].id, "z");
        assert!(!manager.play_next().await.unwrap());
        assert!(!manager.play_previous().await.unwrap());
    }

    #[tokio::test]
    async fn test_next_and_previous_stop_at_boundaries() {
        let (manager, _events, _backend) = manager();
        let q = queue(&["a", "b", "c"]);

        manager.play_song(q[2].clone(), q.clone()).await.unwrap();
        let before = manager.snapshot();
        assert!(!manager.play_next().await.unwrap());
        assert_eq!(manager.snapshot(), before);

        assert!(manager.play_previous().await.unwrap());
        assert!(manager.play_previous().await.unwrap());
        assert_eq!(manager.snapshot().current_index, Some(0));

        let before = manager.snapshot();
        assert!(!manager.play_previous().await.unwrap());
        assert_eq!(manager.snapshot(), before);

        assert!(manager.play_next().await.unwrap());
        assert_eq!(
            manager.snapshot().current_song.map(|t| t.id),
            Some("b".to_string())
        );
    }

    #[tokio::test]
    async fn test_next_follows_position_with_repeated_tracks() {
        let (manager, _events, _backend) = manager();
        let q = queue(&["a", "b", "a", "c"]);

        manager.play_at(q.clone(), 1).await.unwrap();
        assert!(manager.play_next().await.unwrap());
        assert_eq!(manager.snapshot().current_index, Some(2));
        assert!(manager.play_next().await.unwrap());
        assert_eq!(manager.snapshot().current_index, Some(3));
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_parity() {
        let (manager, _events, backend) = manager();

        // No handle yet: nothing happens.
        manager.toggle_play_pause().await.unwrap();
        assert!(!manager.snapshot().is_playing);
        assert!(backend.log().is_empty());

        let q = queue(&["a"]);
        manager.play_song(q[0].clone(), q.clone()).await.unwrap();
        manager.toggle_play_pause().await.unwrap();
        assert!(!manager.snapshot().is_playing);
        assert_eq!(manager.snapshot().state, SessionState::Paused);
        manager.toggle_play_pause().await.unwrap();
        assert!(manager.snapshot().is_playing);
        assert_eq!(manager.snapshot().state, SessionState::Playing);

        let log = backend.log();
        assert_eq!(log[1], format!("pause {}", url("a")));
        assert_eq!(log[2], format!("resume {}", url("a")));
    }

    #[tokio::test]
    async fn test_seek_keeps_playing_flag() {
        let (manager, _events, backend) = manager();

        manager.seek(1_000).await.unwrap();
        assert_eq!(manager.snapshot().position_ms, 0);

        let q = queue(&["a"]);
        manager.play_song(q[0].clone(), q.clone()).await.unwrap();
        manager.seek(42_000).await.unwrap();

        let snap = manager.snapshot();
        assert_eq!(snap.position_ms, 42_000);
        assert!(snap.is_playing);
        assert!(backend.log().contains(&format!("seek 42000 {}", url("a"))));
    }

    #[tokio::test]
    async fn test_play_song_next_inserts_after_current() {
        let (manager, _events, backend) = manager();
        let q = queue(&["A", "B", "C"]);
        manager.play_song(q[0].clone(), q.clone()).await.unwrap();

        manager.play_song_next(track("t")).await;

        let snap = manager.snapshot();
        let ids: Vec<&str> = snap.queue.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["A", "t", "B", "C"]);
        assert_eq!(snap.current_index, Some(0));
        assert_eq!(backend.log().len(), 1);
    }

    #[tokio::test]
    async fn test_add_to_queue_appends() {
        let (manager, _events, _backend) = manager();

        manager.add_to_queue(track("a")).await;
        manager.play_song_next(track("b")).await;
        manager.add_to_queue(track("c")).await;

        let snap = manager.snapshot();
        let ids: Vec<&str> = snap.queue.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(snap.current_song, None);
        assert_eq!(snap.state, SessionState::Idle);
    }

    #[tokio::test]
    async fn test_status_updates_progress() {
        let (manager, _events, _backend) = manager();
        let q = queue(&["a"]);
        manager.play_song(q[0].clone(), q.clone()).await.unwrap();

        let generation = current_generation(&manager);
        manager
            .handle_status(StatusEvent {
                generation,
                status: PlaybackStatus::paused(12_500, Some(200_000)),
            })
            .await
            .unwrap();

        let snap = manager.snapshot();
        assert_eq!(snap.position_ms, 12_500);
        assert_eq!(snap.duration_ms, 200_000);
        assert!(!snap.is_playing);
        assert_eq!(snap.state, SessionState::Paused);
    }

    #[tokio::test]
    async fn test_stale_and_unloaded_statuses_are_ignored() {
        let (manager, _events, _backend) = manager();
        let q = queue(&["a", "b"]);
        manager.play_song(q[0].clone(), q.clone()).await.unwrap();
        let old = current_generation(&manager);
        manager.play_song(q[1].clone(), q.clone()).await.unwrap();
        let before = manager.snapshot();

        manager
            .handle_status(StatusEvent {
                generation: old,
                status: PlaybackStatus::finished(180_000),
            })
            .await
            .unwrap();
        assert_eq!(manager.snapshot(), before);

        manager
            .handle_status(StatusEvent {
                generation: current_generation(&manager),
                status: PlaybackStatus::default(),
            })
            .await
            .unwrap();
        assert_eq!(manager.snapshot(), before);
    }

    #[tokio::test]
    async fn test_finish_advances_queue() {
        let (manager, _events, backend) = manager();
        let q = queue(&["a", "b"]);
        manager.play_song(q[0].clone(), q.clone()).await.unwrap();

        manager
            .handle_status(StatusEvent {
                generation: current_generation(&manager),
                status: PlaybackStatus::finished(180_000),
            })
            .await
            .unwrap();

        let snap = manager.snapshot();
        assert_eq!(snap.current_index, Some(1));
        assert!(snap.is_playing);
        assert!(backend.log().contains(&format!("load {}", url("b"))));
        let recent: Vec<&str> = snap.recently_played.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(recent, vec!["b", "a"]);
    }

    #[tokio::test]
    async fn test_finish_at_end_of_queue_stops() {
        let (manager, _events, _backend) = manager();
        let q = queue(&["A", "B"]);
        manager.play_song(q[1].clone(), q.clone()).await.unwrap();

        manager
            .handle_status(StatusEvent {
                generation: current_generation(&manager),
                status: PlaybackStatus::finished(180_000),
            })
            .await
            .unwrap();

        let snap = manager.snapshot();
        assert!(!snap.is_playing);
        assert_eq!(snap.current_index, Some(1));
        assert_eq!(snap.state, SessionState::Finished);
    }

    #[tokio::test]
    async fn test_overlapping_play_commits_latest_only() {
        let (manager, _events, backend) = manager();
        let q = queue(&["a", "b"]);
        let gate = backend.gate(&url("a"));

        let first = manager.play_song(q[0].clone(), q.clone());
        let second = async {
            while !backend.log().contains(&format!("load {}", url("a"))) {
                tokio::task::yield_now().await;
            }
            let result = manager.play_song(q[1].clone(), q.clone()).await;
            gate.notify_one();
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(first, Err(MelodeckError::Superseded(_))));
        second.unwrap();

        let snap = manager.snapshot();
        assert_eq!(snap.current_song.map(|t| t.id), Some("b".to_string()));
        assert!(backend.log().contains(&format!("unload {}", url("a"))));

        // The committed handle is the one for "b".
        manager.toggle_play_pause().await.unwrap();
        assert_eq!(backend.log().last().unwrap(), &format!("pause {}", url("b")));
    }

    #[tokio::test]
    async fn test_queue_edits_during_advance_survive_commit() {
        let (manager, _events, backend) = manager();
        let q = queue(&["a", "b"]);
        manager.play_song(q[0].clone(), q.clone()).await.unwrap();
        let gate = backend.gate(&url("b"));

        let advance = manager.play_next();
        let edits = async {
            while !backend.log().contains(&format!("load {}", url("b"))) {
                tokio::task::yield_now().await;
            }
            assert_eq!(manager.snapshot().state, SessionState::Loading);
            manager.add_to_queue(track("c")).await;
            manager.play_song_next(track("n")).await;
            gate.notify_one();
        };
        let (advanced, ()) = tokio::join!(advance, edits);
        assert!(advanced.unwrap());

        let snap = manager.snapshot();
        let ids: Vec<&str> = snap.queue.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "n", "c"]);
        assert_eq!(snap.current_index, Some(1));
        assert_eq!(snap.current_song.map(|t| t.id), Some("b".to_string()));
    }

    #[tokio::test]
    async fn test_queue_edits_during_failed_advance_are_kept() {
        let (manager, _events, backend) = manager();
        let q = queue(&["a", "b"]);
        manager.play_song(q[0].clone(), q.clone()).await.unwrap();
        backend.fail(&url("b"));
        let gate = backend.gate(&url("b"));

        let advance = manager.play_next();
        let edits = async {
            while !backend.log().contains(&format!("load {}", url("b"))) {
                tokio::task::yield_now().await;
            }
            manager.add_to_queue(track("c")).await;
            manager.play_song_next(track("n")).await;
            gate.notify_one();
        };
        let (advanced, ()) = tokio::join!(advance, edits);
        assert!(matches!(advanced, Err(MelodeckError::AudioBackend(_))));

        let snap = manager.snapshot();
        let ids: Vec<&str> = snap.queue.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "n", "b", "c"]);
        assert_eq!(snap.current_index, Some(0));
        assert_eq!(snap.state, SessionState::Idle);
    }

    #[tokio::test]
    async fn test_next_during_load_moves_from_loading_track() {
        let (manager, _events, backend) = manager();
        let q = queue(&["a", "b", "c"]);
        manager.play_song(q[0].clone(), q.clone()).await.unwrap();
        let gate = backend.gate(&url("b"));

        let first = manager.play_next();
        let second = async {
            while !backend.log().contains(&format!("load {}", url("b"))) {
                tokio::task::yield_now().await;
            }
            let result = manager.play_next().await;
            gate.notify_one();
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(matches!(first, Err(MelodeckError::Superseded(_))));
        assert!(second.unwrap());
        let snap = manager.snapshot();
        assert_eq!(snap.current_index, Some(2));
        assert_eq!(snap.current_song.map(|t| t.id), Some("c".to_string()));
    }

    #[tokio::test]
    async fn test_status_during_load_only_tracks_progress() {
        let (manager, _events, backend) = manager();
        let q = queue(&["a", "b", "c"]);
        manager.play_song(q[0].clone(), q.clone()).await.unwrap();
        let gate = backend.gate(&url("b"));

        let advance = manager.play_next();
        let reports = async {
            while !backend.log().contains(&format!("load {}", url("b"))) {
                tokio::task::yield_now().await;
            }
            let generation = current_generation(&manager);
            manager
                .handle_status(StatusEvent {
                    generation,
                    status: PlaybackStatus::playing(1_500, Some(200_000)),
                })
                .await
                .unwrap();
            let snap = manager.snapshot();
            assert_eq!(snap.state, SessionState::Loading);
            assert!(!snap.is_playing);
            assert_eq!(snap.position_ms, 1_500);
            assert_eq!(snap.duration_ms, 200_000);

            // A finish report cannot advance a track that is not committed.
            manager
                .handle_status(StatusEvent {
                    generation,
                    status: PlaybackStatus::finished(200_000),
                })
                .await
                .unwrap();
            assert_eq!(manager.snapshot().state, SessionState::Loading);
            gate.notify_one();
        };
        let (advanced, ()) = tokio::join!(advance, reports);
        assert!(advanced.unwrap());

        let snap = manager.snapshot();
        assert_eq!(snap.state, SessionState::Playing);
        assert!(snap.is_playing);
        assert_eq!(snap.current_index, Some(1));
        assert_eq!(snap.duration_ms, 200_000);
        assert!(!backend.log().contains(&format!("load {}", url("c"))));
    }

    #[tokio::test]
    async fn test_stop_returns_to_idle() {
        let (manager, _events, backend) = manager();
        let q = queue(&["a"]);
        manager.play_song(q[0].clone(), q.clone()).await.unwrap();

        manager.stop().await.unwrap();

        let snap = manager.snapshot();
        assert_eq!(snap.state, SessionState::Idle);
        assert_eq!(snap.current_song, None);
        assert_eq!(snap.current_index, None);
        assert!(snap.queue.is_empty());
        assert_eq!(snap.recently_played.len(), 1);
        assert_eq!(backend.log().last().unwrap(), &format!("unload {}", url("a")));
    }

    #[tokio::test]
    async fn test_history_is_bounded_and_deduplicated() {
        let (manager, _events, _backend) = manager();
        let q: Vec<Track> = (0..25).map(|i| track(&i.to_string())).collect();

        for t in &q {
            manager.play_song(t.clone(), q.clone()).await.unwrap();
        }
        manager.play_song(q[10].clone(), q.clone()).await.unwrap();

        let recent = manager.recently_played();
        assert_eq!(recent.len(), 20);
        assert_eq!(recent[0].id, "10");
        assert_eq!(recent.iter().filter(|t| t.id == "10").count(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let (manager, _events, _backend) = manager();
        let mut rx = manager.subscribe();
        let q = queue(&["a"]);

        manager.play_song(q[0].clone(), q.clone()).await.unwrap();

        assert!(rx.has_changed().unwrap());
        let seen = rx.borrow_and_update().clone();
        assert_eq!(seen.current_song.map(|t| t.id), Some("a".to_string()));
    }

    #[tokio::test]
    async fn test_drain_applies_backend_statuses() {
        let (manager, mut events) = PlaybackManager::new(
            crate::playback::DryRunBackend::new(),
            PlayerConfig::default(),
        );
        let q = queue(&["a", "b"]);
        manager.play_song(q[0].clone(), q.clone()).await.unwrap();

        assert_eq!(manager.drain_status(&mut events).await, 1);
        assert_eq!(manager.snapshot().state, SessionState::Playing);

        manager.toggle_play_pause().await.unwrap();
        manager.drain_status(&mut events).await;
        assert_eq!(manager.snapshot().state, SessionState::Paused);
    }
}
