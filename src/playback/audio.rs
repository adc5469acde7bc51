//! Audio subsystem seam.
//!
//! The playback manager never decodes audio itself. It asks an
//! [`AudioBackend`] for a handle bound to a stream URL and drives the handle
//! through pause, resume, seek and unload. Backends report progress by
//! sending [`PlaybackStatus`] values through the [`StatusSink`] they were
//! given at load time.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use crate::error::Result;

/// Progress report from the audio subsystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlaybackStatus {
    /// Whether the handle has media loaded. Unloaded reports are ignored.
    pub is_loaded: bool,
    /// Current position in milliseconds.
    pub position_ms: u64,
    /// Total duration in milliseconds, once known.
    pub duration_ms: Option<u64>,
    /// Whether audio is currently audible.
    pub is_playing: bool,
    /// Set once, on the report that ends the stream.
    pub did_just_finish: bool,
}

impl PlaybackStatus {
    /// A loaded, playing status at the given position.
    pub fn playing(position_ms: u64, duration_ms: Option<u64>) -> Self {
        Self {
            is_loaded: true,
            position_ms,
            duration_ms,
            is_playing: true,
            did_just_finish: false,
        }
    }

    /// A loaded, paused status at the given position.
    pub fn paused(position_ms: u64, duration_ms: Option<u64>) -> Self {
        Self {
            is_playing: false,
            ..Self::playing(position_ms, duration_ms)
        }
    }

    /// The end-of-stream status.
    pub fn finished(duration_ms: u64) -> Self {
        Self {
            is_loaded: true,
            position_ms: duration_ms,
            duration_ms: Some(duration_ms),
            is_playing: false,
            did_just_finish: true,
        }
    }
}

/// A status tagged with the generation of the handle that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEvent {
    pub generation: u64,
    pub status: PlaybackStatus,
}

/// Sending half given to a backend on every load.
#[derive(Debug, Clone)]
pub struct StatusSink {
    generation: u64,
    tx: mpsc::UnboundedSender<StatusEvent>,
}

impl StatusSink {
    pub(crate) fn new(generation: u64, tx: mpsc::UnboundedSender<StatusEvent>) -> Self {
        Self { generation, tx }
    }

    /// Generation of the load this sink belongs to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Report a status. Returns false once the manager is gone.
    pub fn send(&self, status: PlaybackStatus) -> bool {
        self.tx
            .send(StatusEvent {
                generation: self.generation,
                status,
            })
            .is_ok()
    }
}

/// Receiving half of the status channel, drained by the manager's event loop.
#[derive(Debug)]
pub struct StatusEvents {
    rx: mpsc::UnboundedReceiver<StatusEvent>,
}

impl StatusEvents {
    pub(crate) fn channel() -> (mpsc::UnboundedSender<StatusEvent>, Self) {
        let (tx, rx) = mpsc::unbounded_channel();
        (tx, Self { rx })
    }

    /// Wait for the next status.
    pub async fn recv(&mut self) -> Option<StatusEvent> {
        self.rx.recv().await
    }

    /// Take a status if one is already queued.
    pub fn try_recv(&mut self) -> Option<StatusEvent> {
        self.rx.try_recv().ok()
    }
}

/// Something that can open audio streams.
#[async_trait]
pub trait AudioBackend: Send + Sync {
    /// Open `url` and start playing it.
    ///
    /// Progress for the returned handle must be sent through `sink`.
    async fn load(&self, url: &str, sink: StatusSink) -> Result<Box<dyn AudioHandle>>;
}

/// One open audio stream.
#[async_trait]
pub trait AudioHandle: Send + Sync {
    async fn pause(&mut self) -> Result<()>;

    async fn resume(&mut self) -> Result<()>;

    /// Move the play head. Does not change whether audio is playing.
    async fn seek(&mut self, position_ms: u64) -> Result<()>;

    /// Release the underlying resources. The handle is dropped afterwards.
    async fn unload(&mut self) -> Result<()>;
}

/// Backend that produces no sound.
///
/// Accepts every load and transport call and reports statuses as a real
/// backend would at the moments they happen. Used by the CLI to run the
/// player against live catalog data.
#[derive(Debug, Clone, Default)]
pub struct DryRunBackend {
    loaded: Arc<Mutex<Vec<String>>>,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs loaded so far, oldest first.
    pub async fn loaded_urls(&self) -> Vec<String> {
        self.loaded.lock().await.clone()
    }
}

#[async_trait]
impl AudioBackend for DryRunBackend {
    async fn load(&self, url: &str, sink: StatusSink) -> Result<Box<dyn AudioHandle>> {
        debug!("dry-run load {} (generation {})", url, sink.generation());
        self.loaded.lock().await.push(url.to_string());
        sink.send(PlaybackStatus::playing(0, None));
        Ok(Box::new(DryRunHandle {
            sink,
            position_ms: 0,
        }))
    }
}

#[derive(Debug)]
struct DryRunHandle {
    sink: StatusSink,
    position_ms: u64,
}

#[async_trait]
impl AudioHandle for DryRunHandle {
    async fn pause(&mut self) -> Result<()> {
        self.sink.send(PlaybackStatus::paused(self.position_ms, None));
        Ok(())
    }

    async fn resume(&mut self) -> Result<()> {
        self.sink.send(PlaybackStatus::playing(self.position_ms, None));
        Ok(())
    }

    async fn seek(&mut self, position_ms: u64) -> Result<()> {
        self.position_ms = position_ms;
        Ok(())
    }

    async fn unload(&mut self) -> Result<()> {
        debug!("dry-run unload (generation {})", self.sink.generation());
        Ok(())
    }
}
