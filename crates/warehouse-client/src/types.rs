//! Configuration and API response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default refresh interval for cached responses (20 hours).
pub const DEFAULT_REFRESH_INTERVAL_MS: i64 = 20 * 60 * 60 * 1000;

/// Default number of entries refreshed concurrently.
pub const DEFAULT_REFRESH_LIMIT: usize = 10;

/// Refresh policy for a [`RefreshingCache`](crate::cache::RefreshingCache).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Milliseconds between automatic sweeps. Zero or negative disables the timer.
    #[serde(default = "default_refresh_interval")]
    pub interval_ms: i64,

    /// Maximum refresh fetches in flight during a sweep.
    #[serde(default = "default_refresh_limit")]
    pub limit: usize,
}

fn default_refresh_interval() -> i64 {
    DEFAULT_REFRESH_INTERVAL_MS
}

fn default_refresh_limit() -> usize {
    DEFAULT_REFRESH_LIMIT
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_refresh_interval(),
            limit: default_refresh_limit(),
        }
    }
}

impl RefreshConfig {
    /// Refresh policy with automatic sweeps disabled.
    pub fn manual() -> Self {
        Self {
            interval_ms: -1,
            ..Default::default()
        }
    }

    /// Set the sweep interval in milliseconds.
    pub fn with_interval_ms(mut self, interval_ms: i64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Set the concurrency limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Whether the periodic timer should ever be armed.
    pub fn is_periodic(&self) -> bool {
        self.interval_ms > 0
    }
}

/// Cache settings for one cached resource (builds or assets).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether responses are cached at all.
    #[serde(default)]
    pub enabled: bool,

    /// Refresh policy for cached responses.
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl CacheConfig {
    /// Enabled cache with the given refresh policy.
    pub fn enabled(refresh: RefreshConfig) -> Self {
        Self {
            enabled: true,
            refresh,
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Base URL for the warehouse API.
    #[serde(default = "default_warehouse_url")]
    pub url: String,

    /// Base URL for the status API (defaults to `url`).
    #[serde(default)]
    pub status_url: Option<String>,

    /// Bearer token.
    #[serde(default)]
    pub token: Option<String>,

    /// Basic auth username.
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password.
    #[serde(default)]
    pub password: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Verify TLS certificates.
    #[serde(default = "default_strict_ssl")]
    pub strict_ssl: bool,

    /// Concurrency for the verify workflow.
    #[serde(default = "default_verify_concurrency")]
    pub verify_concurrency: usize,

    /// Cache for build lookups.
    #[serde(default)]
    pub build_cache: CacheConfig,

    /// Cache for asset lookups.
    #[serde(default)]
    pub asset_cache: CacheConfig,
}

fn default_warehouse_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_strict_ssl() -> bool {
    true
}

fn default_verify_concurrency() -> usize {
    10
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            url: default_warehouse_url(),
            status_url: None,
            token: None,
            username: None,
            password: None,
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            strict_ssl: default_strict_ssl(),
            verify_concurrency: default_verify_concurrency(),
            build_cache: CacheConfig::default(),
            asset_cache: CacheConfig::default(),
        }
    }
}

impl WarehouseConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `WAREHOUSE_URL` | API base URL |
    /// | `WAREHOUSE_STATUS_URL` | Status API base URL |
    /// | `WAREHOUSE_TOKEN` | Bearer token |
    /// | `WAREHOUSE_USERNAME` / `WAREHOUSE_PASSWORD` | Basic auth |
    /// | `WAREHOUSE_TIMEOUT` | Request timeout in seconds |
    /// | `WAREHOUSE_MAX_RETRIES` | Max retries for transient failures |
    /// | `WAREHOUSE_STRICT_SSL` | Verify TLS certificates |
    /// | `WAREHOUSE_VERIFY_CONCURRENCY` | Verify fan-out limit |
    pub fn from_env() -> Self {
        Self {
            url: std::env::var("WAREHOUSE_URL").unwrap_or_else(|_| default_warehouse_url()),
            status_url: std::env::var("WAREHOUSE_STATUS_URL").ok(),
            token: std::env::var("WAREHOUSE_TOKEN")
                .ok()
                .filter(|t| !t.is_empty()),
            username: std::env::var("WAREHOUSE_USERNAME").ok(),
            password: std::env::var("WAREHOUSE_PASSWORD").ok(),
            timeout_secs: std::env::var("WAREHOUSE_TIMEOUT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            max_retries: std::env::var("WAREHOUSE_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_max_retries),
            strict_ssl: std::env::var("WAREHOUSE_STRICT_SSL")
                .map(|v| !(v == "0" || v.eq_ignore_ascii_case("false")))
                .unwrap_or_else(|_| default_strict_ssl()),
            verify_concurrency: std::env::var("WAREHOUSE_VERIFY_CONCURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_verify_concurrency),
            build_cache: CacheConfig::default(),
            asset_cache: CacheConfig::default(),
        }
    }

    /// Set the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Set the status API base URL.
    pub fn with_status_url(mut self, url: impl Into<String>) -> Self {
        self.status_url = Some(url.into());
        self
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set basic auth credentials.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Configure the build cache.
    pub fn with_build_cache(mut self, cache: CacheConfig) -> Self {
        self.build_cache = cache;
        self
    }

    /// Configure the asset cache.
    pub fn with_asset_cache(mut self, cache: CacheConfig) -> Self {
        self.asset_cache = cache;
        self
    }

    /// Set the verify concurrency.
    pub fn with_verify_concurrency(mut self, concurrency: usize) -> Self {
        self.verify_concurrency = concurrency;
        self
    }
}

/// A build head as listed by `GET builds/-/head`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildHead {
    /// Build identifier.
    pub build_id: String,

    /// Base URL the artifacts are served from.
    #[serde(default)]
    pub cdn_url: String,

    /// Recommended files (checked first during verify).
    #[serde(default)]
    pub recommended: Vec<String>,

    /// All build artifacts.
    #[serde(default)]
    pub artifacts: Vec<String>,

    /// Package name.
    #[serde(default)]
    pub name: Option<String>,

    /// Environment.
    #[serde(default)]
    pub env: Option<String>,

    /// Version.
    #[serde(default)]
    pub version: Option<String>,

    /// Locale.
    #[serde(default)]
    pub locale: Option<String>,

    /// When the head was created.
    #[serde(default)]
    pub create_date: Option<DateTime<Utc>>,
}

/// File attachment descriptor for publish payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// Size in bytes.
    pub length: usize,

    /// File content (UTF-8, lossy).
    pub data: String,

    /// MIME type guessed from the extension.
    pub content_type: String,

    /// `sha256-{base64}` digest of the raw bytes.
    pub digest: String,
}
