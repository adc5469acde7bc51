//! Catalog API client.
//!
//! This module provides a client for a JioSaavn-compatible public API
//! (by default `saavn.sumit.co`). No authentication is required.

use futures_util::future::join_all;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::config::ApiConfig;
use crate::converters;
use crate::error::{MelodeckError, Result};
use crate::models::{Album, Artist, Playlist, Track};

/// Catalog API client.
///
/// Provides methods to query songs, albums, artists and playlists.
///
/// # Example
///
/// ```rust,no_run
/// use melodeck::{ApiConfig, SaavnApi};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let api = SaavnApi::new(ApiConfig::default())?;
///     let track = api.get_song("yDeAS8Eh").await?;
///     println!("Track: {} by {}", track.title, track.artists_string(", "));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SaavnApi {
    client: Client,
    base_url: String,
}

impl SaavnApi {
    /// Create a new catalog client.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url,
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Make a GET request and unwrap the response envelope.
    async fn get_api(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("GET {} with params: {:?}", url, params);

        let response = self.client.get(&url).query(params).send().await?;
        let data: Value = response.json().await?;

        converters::unwrap_envelope(data).inspect_err(|e| {
            error!("Catalog API error on {}: {}", endpoint, e);
        })
    }

    /// Get a single song by ID.
    pub async fn get_song(&self, id: &str) -> Result<Track> {
        let data = self
            .get_api(&format!("songs/{}", id), &[])
            .await
            .map_err(|e| not_found(e, MelodeckError::TrackNotFound, id))?;

        data.as_array()
            .and_then(|arr| arr.first())
            .map(converters::parse_track)
            .unwrap_or_else(|| Err(MelodeckError::TrackNotFound(id.to_string())))
    }

    /// Get several songs in one request.
    ///
    /// Songs the API does not know are simply absent from the result.
    pub async fn get_songs(&self, ids: &[String]) -> Result<Vec<Track>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let joined = ids.join(",");
        let data = self.get_api("songs", &[("ids", &joined)]).await?;
        Ok(converters::parse_track_list(
            data.as_array().map(Vec::as_slice).unwrap_or_default(),
        ))
    }

    /// Get songs similar to the given one.
    pub async fn get_song_suggestions(&self, id: &str, limit: u32) -> Result<Vec<Track>> {
        let data = self
            .get_api(
                &format!("songs/{}/suggestions", id),
                &[("limit", &limit.to_string())],
            )
            .await?;
        Ok(converters::parse_track_list(&converters::search_results(
            &data,
        )))
    }

    /// Search for songs.
    pub async fn search_songs(&self, query: &str, page: u32, limit: u32) -> Result<Vec<Track>> {
        let data = self
            .get_api(
                "search/songs",
                &[
                    ("query", query),
                    ("page", &page.to_string()),
                    ("limit", &limit.to_string()),
                ],
            )
            .await?;
        Ok(converters::parse_track_list(&converters::search_results(
            &data,
        )))
    }

    /// Search for albums.
    pub async fn search_albums(&self, query: &str, limit: u32) -> Result<Vec<Album>> {
        let data = self
            .get_api(
                "search/albums",
                &[("query", query), ("limit", &limit.to_string())],
            )
            .await?;
        Ok(converters::search_results(&data)
            .iter()
            .filter_map(|a| converters::parse_album(a).ok())
            .collect())
    }

    /// Search for artists.
    pub async fn search_artists(&self, query: &str, limit: u32) -> Result<Vec<Artist>> {
        let data = self
            .get_api(
                "search/artists",
                &[("query", query), ("limit", &limit.to_string())],
            )
            .await?;
        Ok(converters::search_results(&data)
            .iter()
            .filter_map(|a| converters::parse_artist(a).ok())
            .collect())
    }

    /// Get an album with its songs.
    pub async fn get_album(&self, id: &str) -> Result<Album> {
        let data = self
            .get_api("albums", &[("id", id)])
            .await
            .map_err(|e| not_found(e, MelodeckError::AlbumNotFound, id))?;
        converters::parse_album(&data)
    }

    /// Get several albums concurrently, dropping the ones that fail.
    pub async fn get_albums(&self, ids: &[String]) -> Vec<Album> {
        let results = join_all(ids.iter().map(|id| self.get_album(id))).await;
        results
            .into_iter()
            .zip(ids)
            .filter_map(|(result, id)| match result {
                Ok(album) => Some(album),
                Err(e) => {
                    warn!("Could not fetch album {}: {}", id, e);
                    None
                }
            })
            .collect()
    }

    /// Get an artist with top songs and albums.
    pub async fn get_artist(&self, id: &str) -> Result<Artist> {
        let data = self
            .get_api("artists", &[("id", id)])
            .await
            .map_err(|e| not_found(e, MelodeckError::ArtistNotFound, id))?;
        converters::parse_artist(&data)
    }

    /// Get several artists concurrently, dropping the ones that fail.
    pub async fn get_artists(&self, ids: &[String]) -> Vec<Artist> {
        let results = join_all(ids.iter().map(|id| self.get_artist(id))).await;
        results
            .into_iter()
            .zip(ids)
            .filter_map(|(result, id)| match result {
                Ok(artist) => Some(artist),
                Err(e) => {
                    warn!("Could not fetch artist {}: {}", id, e);
                    None
                }
            })
            .collect()
    }

    /// Get an artist's top songs.
    pub async fn get_artist_songs(&self, id: &str) -> Result<Vec<Track>> {
        Ok(self.get_artist(id).await?.top_songs)
    }

    /// Get a playlist with its songs.
    pub async fn get_playlist(&self, id: &str) -> Result<Playlist> {
        let data = self
            .get_api("playlists", &[("id", id)])
            .await
            .map_err(|e| not_found(e, MelodeckError::PlaylistNotFound, id))?;
        converters::parse_playlist(&data)
    }
}

/// Turn an unsuccessful envelope into the matching not-found error.
///
/// Transport and parse errors pass through unchanged.
fn not_found(err: MelodeckError, kind: fn(String) -> MelodeckError, id: &str) -> MelodeckError {
    match err {
        MelodeckError::ApiError(msg) => kind(format!("{}: {}", id, msg)),
        MelodeckError::NoDataApi(_) => kind(id.to_string()),
        other => other,
    }
}
