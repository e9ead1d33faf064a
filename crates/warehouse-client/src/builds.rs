//! Build lookups, optionally backed by a refreshing cache.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::cache::{RefreshFn, RefreshingCache};
use crate::client::http::HttpBackend;
use crate::client::ApiRequest;
use crate::error::{WarehouseError, WarehouseResult};
use crate::params::{BuildParams, BuildQuery, HeadParams};
use crate::types::{BuildHead, CacheConfig};

/// Cache of build responses keyed on the canonical build query.
pub type BuildCache = RefreshingCache<BuildQuery, Value>;

fn build_request(query: &BuildQuery) -> ApiRequest {
    ApiRequest::get()
        .segment("builds")
        .segment(query.pkg.as_str())
        .segment(query.env.as_str())
        .segment_opt(query.version.as_deref())
        .segment_opt(query.meta.then_some("meta"))
        .query("locale", query.locale.as_str())
}

/// Refreshes cached builds by re-fetching them.
struct BuildFetcher {
    http: HttpBackend,
}

#[async_trait]
impl RefreshFn<BuildQuery, Value> for BuildFetcher {
    async fn refresh(&self, params: BuildQuery) -> WarehouseResult<Value> {
        self.http.send(&build_request(&params)).await
    }
}

/// The `builds` resource.
#[derive(Debug, Clone)]
pub struct Builds {
    http: HttpBackend,
    cache: Option<BuildCache>,
}

impl Builds {
    pub(crate) fn new(http: HttpBackend, cache: &CacheConfig) -> WarehouseResult<Self> {
        let cache = if cache.enabled {
            Some(
                RefreshingCache::<BuildQuery, Value>::builder()
                    .refresh_fn(BuildFetcher { http: http.clone() })
                    .config(cache.refresh)
                    .build()?,
            )
        } else {
            None
        };
        Ok(Self { http, cache })
    }

    /// Fetch a build.
    ///
    /// With a cache, a hit is returned without a request unless
    /// `bypass_cache` is set; fetched data is written back to the cache.
    pub async fn get(&self, params: &BuildParams) -> WarehouseResult<Value> {
        let query = params.normalize()?;

        let Some(cache) = &self.cache else {
            return self.http.send(&build_request(&query)).await;
        };

        if !params.bypass_cache {
            if let Some(data) = cache.get(&query) {
                debug!(pkg = %query.pkg, env = %query.env, "build cache hit");
                return Ok(data);
            }
        }

        let data = self.http.send(&build_request(&query)).await?;
        cache.set(query, data.clone());
        Ok(data)
    }

    /// Fetch build metadata (`builds/{pkg}/{env}[/{version}]/meta`).
    pub async fn meta(&self, params: &BuildParams) -> WarehouseResult<Value> {
        self.get(&params.clone().meta(true)).await
    }

    /// List the head build for every locale of a package in an environment.
    pub async fn heads(&self, params: &HeadParams) -> WarehouseResult<Vec<BuildHead>> {
        let (pkg, env) = params.normalize()?;
        let request = ApiRequest::get()
            .segment("builds")
            .segment("-")
            .segment("head")
            .query("env", env.as_str())
            .query("name", pkg);

        let body = self.http.send(&request).await?;
        if body.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(body).map_err(|e| WarehouseError::InvalidResponse {
            message: format!("failed to parse build heads: {}", e),
        })
    }

    /// Read a build from the cache only; never makes a request.
    pub fn cached(&self, params: &BuildParams) -> WarehouseResult<Option<Value>> {
        let cache = self
            .cache
            .as_ref()
            .ok_or(WarehouseError::CacheDisabled { resource: "builds" })?;
        Ok(cache.get(&params.normalize()?))
    }

    /// The build cache, when enabled.
    pub fn cache(&self) -> Option<&BuildCache> {
        self.cache.as_ref()
    }
}
