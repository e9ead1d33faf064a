//! Build status queries, sent to the status API.

use serde_json::Value;

use crate::client::http::HttpBackend;
use crate::client::ApiRequest;
use crate::error::WarehouseResult;
use crate::params::StatusParams;

/// The status resource.
#[derive(Debug, Clone, Copy)]
pub struct Status<'a> {
    pub(crate) http: &'a HttpBackend,
}

impl Status<'_> {
    /// Current build status (`status/{pkg}/{env}[/{version}]`).
    pub async fn get(&self, params: &StatusParams) -> WarehouseResult<Value> {
        self.send("status", params).await
    }

    /// Status events (`status-events/{pkg}/{env}[/{version}]`).
    pub async fn events(&self, params: &StatusParams) -> WarehouseResult<Value> {
        self.send("status-events", params).await
    }

    /// Build progress (`progress/{pkg}/{env}[/{version}]`).
    pub async fn progress(&self, params: &StatusParams) -> WarehouseResult<Value> {
        self.send("progress", params).await
    }

    async fn send(&self, kind: &str, params: &StatusParams) -> WarehouseResult<Value> {
        let (pkg, env, version) = params.require()?;
        let request = ApiRequest::get()
            .on_status_api()
            .segment(kind)
            .segment(pkg)
            .segment(env)
            .segment_opt(version);
        self.http.send(&request).await
    }
}
