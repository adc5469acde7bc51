//! Helpers for ordering and merging track lists.

use std::cmp::{Ordering, Reverse};
use std::collections::HashSet;

use super::track::Track;

/// Orderings offered by song list screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Title, A to Z.
    #[default]
    Ascending,
    /// Title, Z to A.
    Descending,
    /// Primary artist name, then title.
    Artist,
    /// Album name, then title.
    Album,
    /// Release year, newest first. Tracks without a year go last.
    Year,
}

/// Remove repeated tracks, keeping the first occurrence of every ID.
pub fn dedup_by_id(tracks: Vec<Track>) -> Vec<Track> {
    let mut seen = HashSet::new();
    tracks
        .into_iter()
        .filter(|t| seen.insert(t.id.clone()))
        .collect()
}

/// Sort tracks in place. The sort is stable.
pub fn sort_tracks(tracks: &mut [Track], order: SortOrder) {
    match order {
        SortOrder::Ascending => tracks.sort_by(compare_titles),
        SortOrder::Descending => tracks.sort_by(|a, b| compare_titles(b, a)),
        SortOrder::Artist => tracks.sort_by(|a, b| {
            folded(a.primary_artist().unwrap_or(""))
                .cmp(&folded(b.primary_artist().unwrap_or("")))
                .then_with(|| compare_titles(a, b))
        }),
        SortOrder::Album => tracks.sort_by(|a, b| {
            folded(album_name(a))
                .cmp(&folded(album_name(b)))
                .then_with(|| compare_titles(a, b))
        }),
        SortOrder::Year => tracks.sort_by_key(|t| {
            let year = parsed_year(t);
            (year.is_none(), Reverse(year))
        }),
    }
}

fn compare_titles(a: &Track, b: &Track) -> Ordering {
    folded(&a.title).cmp(&folded(&b.title))
}

fn folded(s: &str) -> String {
    s.to_lowercase()
}

fn album_name(track: &Track) -> &str {
    track.album.as_ref().map(|a| a.name.as_str()).unwrap_or("")
}

fn parsed_year(track: &Track) -> Option<u32> {
    track.year.as_deref().and_then(|y| y.trim().parse().ok())
}
