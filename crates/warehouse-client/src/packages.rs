//! Package listings and release lines.

use serde_json::Value;

use crate::client::http::HttpBackend;
use crate::client::ApiRequest;
use crate::error::{WarehouseError, WarehouseResult};

/// The `packages` resource.
#[derive(Debug, Clone, Copy)]
pub struct Packages<'a> {
    pub(crate) http: &'a HttpBackend,
}

impl Packages<'_> {
    /// List every package.
    pub async fn list(&self) -> WarehouseResult<Value> {
        self.get(None).await
    }

    /// Fetch one package, or all packages when `pkg` is `None`.
    pub async fn get(&self, pkg: Option<&str>) -> WarehouseResult<Value> {
        let request = ApiRequest::get().segment("packages").segment_opt(pkg);
        self.http.send(&request).await
    }
}

/// The `release-line` resource.
#[derive(Debug, Clone, Copy)]
pub struct ReleaseLine<'a> {
    pub(crate) http: &'a HttpBackend,
}

impl ReleaseLine<'_> {
    /// Fetch the release line for a package, optionally pinned to a version.
    pub async fn get(&self, pkg: &str, version: Option<&str>) -> WarehouseResult<Value> {
        if pkg.is_empty() {
            return Err(WarehouseError::MissingParameter { name: "pkg" });
        }
        let request = ApiRequest::get()
            .segment("release-line")
            .segment(pkg)
            .segment_opt(version);
        self.http.send(&request).await
    }
}
