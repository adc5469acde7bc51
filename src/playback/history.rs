//! Recently played list.

use std::collections::VecDeque;

use crate::config::DEFAULT_HISTORY_CAPACITY;
use crate::models::Track;

/// Bounded, most-recent-first play history with one entry per track ID.
#[derive(Debug, Clone)]
pub struct RecentlyPlayed {
    entries: VecDeque<Track>,
    capacity: usize,
}

impl Default for RecentlyPlayed {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl RecentlyPlayed {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a play. A track already present moves to the front.
    pub fn push(&mut self, track: Track) {
        self.entries.retain(|t| t.id != track.id);
        self.entries.push_front(track);
        self.entries.truncate(self.capacity);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<Track> {
        self.iter().cloned().collect()
    }
}
