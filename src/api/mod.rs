//! Catalog access.
//!
//! - [`SaavnApi`]: HTTP client for the public catalog API
//! - [`TrackLookup`]: the narrow port the player depends on

pub mod lookup;
pub mod saavn;

pub use lookup::TrackLookup;
pub use saavn::SaavnApi;

#[cfg(test)]
pub use lookup::MockTrackLookup;
