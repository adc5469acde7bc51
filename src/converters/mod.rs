//! JSON to model converters.
//!
//! This module converts raw catalog API responses into typed model
//! structures. The API is loose about types (ids and years come as either
//! strings or numbers, counts may be `null`), so parsing goes through
//! `serde_json::Value` rather than derived deserializers.

use serde_json::Value;
use tracing::warn;

use crate::error::{MelodeckError, Result};
use crate::models::{Album, AlbumRef, Artist, ArtistRef, Image, Playlist, StreamVariant, Track};

/// Unwrap the `{ "success": ..., "data": ... }` envelope of an API response.
pub fn unwrap_envelope(mut json: Value) -> Result<Value> {
    let success = json
        .get("success")
        .and_then(|s| s.as_bool())
        .unwrap_or(false);

    if !success {
        let message = json
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("request was not successful");
        return Err(MelodeckError::ApiError(message.to_string()));
    }

    match json.get_mut("data") {
        Some(data) if !data.is_null() => Ok(data.take()),
        _ => Err(MelodeckError::NoDataApi("response has no data".to_string())),
    }
}

/// Extract the result list from a search payload.
///
/// Search endpoints nest the list under `results`; a few return it directly.
pub fn search_results(data: &Value) -> Vec<Value> {
    data.get("results")
        .and_then(|r| r.as_array())
        .or_else(|| data.as_array())
        .cloned()
        .unwrap_or_default()
}

/// Decode the HTML entities the API leaves in titles and names.
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Get string from JSON, returning empty string if not found.
fn get_str(json: &Value, key: &str) -> String {
    json.get(key)
        .and_then(|v| v.as_str())
        .map(decode_entities)
        .unwrap_or_default()
}

/// Get a scalar as a string (handles both string and numeric values).
fn get_scalar(json: &Value, key: &str) -> Option<String> {
    match json.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Get u64 from JSON (handles numeric strings).
fn get_u64(json: &Value, key: &str) -> Option<u64> {
    match json.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Get bool from JSON.
fn get_bool(json: &Value, key: &str) -> bool {
    json.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
}

/// Extract `[{ "quality": ..., "url": ... }]` pairs.
fn extract_variants(json: &Value, key: &str) -> Vec<(String, String)> {
    json.get(key)
        .and_then(|v| v.as_array())
        .map(|arr| {
            arr.iter()
                .filter_map(|v| {
                    let url = v.get("url").and_then(|u| u.as_str())?;
                    if url.is_empty() {
                        return None;
                    }
                    Some((get_str(v, "quality"), url.to_string()))
                })
                .collect()
        })
        .unwrap_or_default()
}

fn extract_images(json: &Value) -> Vec<Image> {
    extract_variants(json, "image")
        .into_iter()
        .map(|(quality, url)| Image::new(quality, url))
        .collect()
}

fn extract_streams(json: &Value) -> Vec<StreamVariant> {
    extract_variants(json, "downloadUrl")
        .into_iter()
        .map(|(quality, url)| StreamVariant::new(quality, url))
        .collect()
}

fn parse_artist_ref(json: &Value) -> Option<ArtistRef> {
    let name = get_str(json, "name");
    if name.is_empty() {
        return None;
    }
    Some(ArtistRef {
        id: get_scalar(json, "id").unwrap_or_default(),
        name,
        role: get_str(json, "role"),
    })
}

/// Parse the artist list of a track or album.
///
/// Uses `artists.primary`, falling back to `artists.all`, and finally to the
/// comma-separated `primaryArtists` string of older payloads.
fn parse_artist_refs(json: &Value) -> Vec<ArtistRef> {
    if let Some(artists) = json.get("artists") {
        for group in ["primary", "all"] {
            let refs: Vec<ArtistRef> = artists
                .get(group)
                .and_then(|g| g.as_array())
                .map(|arr| arr.iter().filter_map(parse_artist_ref).collect())
                .unwrap_or_default();
            if !refs.is_empty() {
                return refs;
            }
        }
    }

    let names = get_str(json, "primaryArtists");
    names
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(|n| ArtistRef::new("", n))
        .collect()
}

fn parse_album_ref(json: &Value) -> Option<AlbumRef> {
    let album = json.get("album")?;
    let name = get_str(album, "name");
    let id = get_scalar(album, "id").unwrap_or_default();
    if name.is_empty() && id.is_empty() {
        return None;
    }
    Some(AlbumRef { id, name })
}

/// Parse a track from raw JSON.
pub fn parse_track(json: &Value) -> Result<Track> {
    let id = get_scalar(json, "id")
        .ok_or_else(|| MelodeckError::ApiError("Missing track ID".to_string()))?;

    let title = match get_str(json, "name") {
        t if t.is_empty() => get_str(json, "title"),
        t => t,
    };

    Ok(Track {
        id,
        title,
        artists: parse_artist_refs(json),
        album: parse_album_ref(json),
        year: get_scalar(json, "year"),
        language: get_str(json, "language"),
        duration_secs: get_u64(json, "duration").and_then(|d| u32::try_from(d).ok()),
        explicit: get_bool(json, "explicitContent"),
        play_count: get_u64(json, "playCount"),
        images: extract_images(json),
        streams: extract_streams(json),
    })
}

/// Parse a list of tracks, skipping entries that cannot be parsed.
pub fn parse_track_list(items: &[Value]) -> Vec<Track> {
    items
        .iter()
        .filter_map(|t| match parse_track(t) {
            Ok(track) => Some(track),
            Err(e) => {
                warn!("Skipping track entry: {}", e);
                None
            }
        })
        .collect()
}

fn parse_track_array(json: &Value, key: &str) -> Vec<Track> {
    json.get(key)
        .and_then(|v| v.as_array())
        .map(|arr| parse_track_list(arr))
        .unwrap_or_default()
}

/// Parse an album from raw JSON.
pub fn parse_album(json: &Value) -> Result<Album> {
    let id = get_scalar(json, "id")
        .ok_or_else(|| MelodeckError::ApiError("Missing album ID".to_string()))?;

    let songs = parse_track_array(json, "songs");
    let song_count = get_u64(json, "songCount")
        .and_then(|c| u32::try_from(c).ok())
        .unwrap_or(songs.len() as u32);

    Ok(Album {
        id,
        name: get_str(json, "name"),
        year: get_scalar(json, "year"),
        language: get_str(json, "language"),
        artists: parse_artist_refs(json),
        song_count,
        images: extract_images(json),
        songs,
    })
}

/// Parse an artist from raw JSON.
pub fn parse_artist(json: &Value) -> Result<Artist> {
    let id = get_scalar(json, "id")
        .ok_or_else(|| MelodeckError::ApiError("Missing artist ID".to_string()))?;

    let top_albums = json
        .get("topAlbums")
        .and_then(|v| v.as_array())
        .map(|arr| arr.iter().filter_map(|a| parse_album(a).ok()).collect())
        .unwrap_or_default();

    Ok(Artist {
        id,
        name: get_str(json, "name"),
        images: extract_images(json),
        follower_count: get_u64(json, "followerCount"),
        is_verified: get_bool(json, "isVerified"),
        dominant_language: get_scalar(json, "dominantLanguage"),
        top_songs: parse_track_array(json, "topSongs"),
        top_albums,
    })
}

/// Parse a playlist from raw JSON.
pub fn parse_playlist(json: &Value) -> Result<Playlist> {
    let id = get_scalar(json, "id")
        .ok_or_else(|| MelodeckError::ApiError("Missing playlist ID".to_string()))?;

    let songs = parse_track_array(json, "songs");
    let song_count = get_u64(json, "songCount")
        .and_then(|c| u32::try_from(c).ok())
        .unwrap_or(songs.len() as u32);

    Ok(Playlist {
        id,
        name: get_str(json, "name"),
        song_count,
        images: extract_images(json),
        songs,
    })
}
