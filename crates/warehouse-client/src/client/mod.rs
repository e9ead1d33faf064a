//! Warehouse API client.
//!
//! Public API: no status code knowledge. All HTTP/status mapping in http.rs.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use crate::assets::Assets;
use crate::auth::Credentials;
use crate::builds::Builds;
use crate::error::{WarehouseError, WarehouseResult};
use crate::objects::{Envs, Objects};
use crate::packages::{Packages, ReleaseLine};
use crate::status::Status;
use crate::types::WarehouseConfig;
use crate::verify::Verify;

pub(crate) mod helpers;
pub(crate) mod http;
mod request;

pub use request::{ApiRequest, Target};

use helpers::parse_base_url;
use http::HttpBackend;

/// User agent sent with every request.
pub const WAREHOUSE_USER_AGENT: &str = concat!("warehouse-client/", env!("CARGO_PKG_VERSION"));

/// Client for the warehouse API.
///
/// Cloning shares the underlying connection pool and caches.
#[derive(Debug, Clone)]
pub struct WarehouseClient {
    http: HttpBackend,
    builds: Builds,
    assets: Assets,
}

impl WarehouseClient {
    /// Create a client. Credentials come from the config, then the environment.
    pub fn new(config: WarehouseConfig) -> WarehouseResult<Self> {
        let credentials = match (&config.token, &config.username, &config.password) {
            (Some(token), _, _) if !token.is_empty() => Credentials::bearer(token),
            (_, Some(username), Some(password)) if !username.is_empty() => {
                Credentials::basic(username, password)
            }
            _ => Credentials::from_env(),
        };

        Self::with_credentials(config, credentials)
    }

    pub fn with_credentials(
        config: WarehouseConfig,
        credentials: Credentials,
    ) -> WarehouseResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(WAREHOUSE_USER_AGENT));

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(default_headers)
            .danger_accept_invalid_certs(!config.strict_ssl)
            .build()
            .map_err(|e| WarehouseError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let base_url = parse_base_url(&config.url)?;
        let status_url = match config.status_url.as_deref() {
            Some(url) if !url.is_empty() => parse_base_url(url)?,
            _ => base_url.clone(),
        };

        debug!(
            url = %base_url,
            status_url = %status_url,
            authenticated = credentials.is_authenticated(),
            "creating warehouse client"
        );

        let http = HttpBackend {
            client,
            base_url,
            status_url,
            credentials,
            config,
        };
        let builds = Builds::new(http.clone(), &http.config.build_cache)?;
        let assets = Assets::new(http.clone(), &http.config.asset_cache)?;

        Ok(Self {
            http,
            builds,
            assets,
        })
    }

    pub fn from_env() -> WarehouseResult<Self> {
        Self::new(WarehouseConfig::from_env())
    }

    pub fn config(&self) -> &WarehouseConfig {
        &self.http.config
    }

    pub fn base_url(&self) -> &Url {
        &self.http.base_url
    }

    pub fn status_url(&self) -> &Url {
        &self.http.status_url
    }

    pub fn is_authenticated(&self) -> bool {
        self.http.credentials.is_authenticated()
    }

    pub fn builds(&self) -> &Builds {
        &self.builds
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn packages(&self) -> Packages<'_> {
        Packages { http: &self.http }
    }

    pub fn status(&self) -> Status<'_> {
        Status { http: &self.http }
    }

    pub fn release_line(&self) -> ReleaseLine<'_> {
        ReleaseLine { http: &self.http }
    }

    pub fn objects(&self) -> Objects<'_> {
        Objects { http: &self.http }
    }

    pub fn envs(&self) -> Envs<'_> {
        Envs { http: &self.http }
    }

    pub fn verify(&self) -> Verify<'_> {
        Verify {
            builds: &self.builds,
            http: &self.http,
        }
    }

    /// Publish a package document (`PUT /{name}`).
    pub async fn publish(&self, name: &str, body: Value) -> WarehouseResult<Value> {
        if name.is_empty() {
            return Err(WarehouseError::MissingParameter { name: "name" });
        }
        info!(name = %name, "publishing package");
        self.send(&ApiRequest::put().segment(name).json(body)).await
    }

    /// Send an arbitrary request through the retrying sender.
    pub async fn send(&self, request: &ApiRequest) -> WarehouseResult<Value> {
        self.http.send(request).await
    }

    /// Send a request and decode the response into `T`.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: &ApiRequest,
    ) -> WarehouseResult<T> {
        let body = self.send(request).await?;
        serde_json::from_value(body).map_err(|e| WarehouseError::InvalidResponse {
            message: format!("failed to decode {}: {}", request.path(), e),
        })
    }

    /// Stop the refresh timers of both caches. Cached data stays readable.
    pub fn shutdown(&self) {
        if let Some(cache) = self.builds.cache() {
            cache.stop_refresh();
        }
        if let Some(cache) = self.assets.cache() {
            cache.stop_refresh();
        }
        debug!("warehouse client refresh timers stopped");
    }
}
