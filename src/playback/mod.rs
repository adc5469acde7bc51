//! Playback core: audio session, play queue, history and favorites.

pub mod audio;
pub mod favorites;
pub mod history;
pub mod manager;
pub mod stream;

pub use audio::{
    AudioBackend, AudioHandle, DryRunBackend, PlaybackStatus, StatusEvent, StatusEvents,
    StatusSink,
};
pub use favorites::Favorites;
pub use history::RecentlyPlayed;
pub use manager::{PlaybackManager, PlayerSnapshot, SessionState};
pub use stream::select_stream;
