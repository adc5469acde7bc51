//! Stream variant selection.

use crate::models::StreamVariant;

/// Pick the stream to play.
///
/// Takes the variant whose tier equals `preferred`; when the track has no
/// such tier, takes the last variant, which the API lists at the highest
/// bitrate it has. Returns `None` only for an empty list.
pub fn select_stream<'a>(
    variants: &'a [StreamVariant],
    preferred: &str,
) -> Option<&'a StreamVariant> {
    variants
        .iter()
        .find(|v| v.quality == preferred)
        .or_else(|| variants.last())
}
