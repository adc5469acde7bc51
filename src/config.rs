//! Client and player configuration.

use std::time::Duration;

/// Default base URL of the catalog API.
pub const DEFAULT_API_URL: &str = "https://saavn.sumit.co/api";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Stream tier requested when nothing else is configured.
pub const DEFAULT_STREAM_QUALITY: &str = "320kbps";

/// Maximum number of entries kept in the recently played list.
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

/// Settings for the catalog HTTP client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: concat!("melodeck/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ApiConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL. A trailing slash is stripped.
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent.
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Settings for the playback manager.
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// Stream tier to prefer when several are available.
    pub preferred_quality: String,
    /// Capacity of the recently played list.
    pub history_capacity: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            preferred_quality: DEFAULT_STREAM_QUALITY.to_string(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl PlayerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the preferred stream tier (e.g. "160kbps").
    pub fn with_preferred_quality<S: Into<String>>(mut self, quality: S) -> Self {
        self.preferred_quality = quality.into();
        self
    }

    /// Set the recently played capacity.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}
