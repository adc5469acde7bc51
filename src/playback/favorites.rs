//! Favorite tracks.

use std::collections::HashSet;

/// Set of favorite track IDs. No ordering is kept.
#[derive(Debug, Clone, Default)]
pub struct Favorites {
    ids: HashSet<String>,
}

impl Favorites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`. Returns whether it is a favorite afterwards.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// All favorite IDs, sorted for stable output.
    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.ids.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
