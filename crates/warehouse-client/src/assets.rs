//! Asset file lookups, optionally backed by a refreshing cache.

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::cache::{RefreshFn, RefreshingCache};
use crate::client::http::HttpBackend;
use crate::client::ApiRequest;
use crate::error::{WarehouseError, WarehouseResult};
use crate::params::{AssetParams, AssetQuery};
use crate::types::CacheConfig;

/// Cache of asset responses keyed on the canonical asset query.
pub type AssetCache = RefreshingCache<AssetQuery, Value>;

fn asset_request(query: &AssetQuery) -> ApiRequest {
    ApiRequest::get()
        .segment("assets")
        .segment("files")
        .segment(query.pkg.as_str())
        .segment(query.env.as_str())
        .segment_opt(query.version.as_deref())
        .query("locale", query.locale.as_str())
        .query_opt("filter", query.filter.as_deref())
}

struct AssetFetcher {
    http: HttpBackend,
}

#[async_trait]
impl RefreshFn<AssetQuery, Value> for AssetFetcher {
    async fn refresh(&self, params: AssetQuery) -> WarehouseResult<Value> {
        self.http.send(&asset_request(&params)).await
    }
}

/// The `assets` resource.
#[derive(Debug, Clone)]
pub struct Assets {
    http: HttpBackend,
    cache: Option<AssetCache>,
}

impl Assets {
    pub(crate) fn new(http: HttpBackend, cache: &CacheConfig) -> WarehouseResult<Self> {
        let cache = if cache.enabled {
            Some(
                RefreshingCache::<AssetQuery, Value>::builder()
                    .refresh_fn(AssetFetcher { http: http.clone() })
                    .config(cache.refresh)
                    .build()?,
            )
        } else {
            None
        };
        Ok(Self { http, cache })
    }

    /// Fetch the file listing for a build, honoring the cache like [`Builds::get`](crate::Builds::get).
    pub async fn get(&self, params: &AssetParams) -> WarehouseResult<Value> {
        let query = params.normalize()?;

        let Some(cache) = &self.cache else {
            return self.http.send(&asset_request(&query)).await;
        };

        if !params.bypass_cache {
            if let Some(data) = cache.get(&query) {
                debug!(pkg = %query.pkg, env = %query.env, "asset cache hit");
                return Ok(data);
            }
        }

        let data = self.http.send(&asset_request(&query)).await?;
        cache.set(query, data.clone());
        Ok(data)
    }

    /// Read assets from the cache only; never makes a request.
    pub fn cached(&self, params: &AssetParams) -> WarehouseResult<Option<Value>> {
        let cache = self
            .cache
            .as_ref()
            .ok_or(WarehouseError::CacheDisabled { resource: "assets" })?;
        Ok(cache.get(&params.normalize()?))
    }

    /// The asset cache, when enabled.
    pub fn cache(&self) -> Option<&AssetCache> {
        self.cache.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_request() {
        let query = AssetParams::new("pkg")
            .env("dist")
            .version("2.0.0")
            .locale("fr-FR")
            .filter("*.css")
            .normalize()
            .unwrap();
        let request = asset_request(&query);
        assert_eq!(request.path(), "assets/files/pkg/prod/2.0.0");
        assert_eq!(
            request.query,
            vec![
                ("locale".to_string(), "fr-FR".to_string()),
                ("filter".to_string(), "*.css".to_string()),
            ]
        );
    }
}
