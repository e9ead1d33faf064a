//! Versioned object store and its per-object environments.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::client::http::HttpBackend;
use crate::client::ApiRequest;
use crate::error::{WarehouseError, WarehouseResult};

/// A new object version.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewObject {
    pub name: String,
    pub env: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    /// Expiry passed through to the server (for example `"30d"` or an epoch timestamp).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<Value>,
    #[serde(default)]
    pub data: Value,
}

/// Lookup for an object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectQuery {
    pub name: String,
    pub env: Option<String>,
    pub version: Option<String>,
    pub accepted_variants: Vec<String>,
}

impl ObjectQuery {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn accept_variant(mut self, variant: impl Into<String>) -> Self {
        self.accepted_variants.push(variant.into());
        self
    }
}

fn require<'a>(value: &'a str, name: &'static str) -> WarehouseResult<&'a str> {
    if value.is_empty() {
        return Err(WarehouseError::MissingParameter { name });
    }
    Ok(value)
}

/// The `objects` resource.
#[derive(Debug, Clone, Copy)]
pub struct Objects<'a> {
    pub(crate) http: &'a HttpBackend,
}

impl Objects<'_> {
    /// Create an object version (`POST objects`).
    pub async fn create(&self, object: &NewObject) -> WarehouseResult<Value> {
        require(&object.name, "name")?;
        let body = serde_json::to_value(object).map_err(|e| WarehouseError::InvalidResponse {
            message: format!("failed to serialize object: {}", e),
        })?;
        self.http
            .send(&ApiRequest::post().segment("objects").json(body))
            .await
    }

    /// Fetch an object (`GET objects/{name}`).
    pub async fn get(&self, query: &ObjectQuery) -> WarehouseResult<Value> {
        let name = require(&query.name, "name")?;
        let variants = query.accepted_variants.join(",");
        let request = ApiRequest::get()
            .segment("objects")
            .segment(name)
            .query("accepted_variants", variants)
            .query_opt("env", query.env.as_deref())
            .query_opt("version", query.version.as_deref());
        self.http.send(&request).await
    }

    /// Fetch the head version of an object in an environment (`GET head/{name}/{env}`).
    pub async fn get_head(&self, name: &str, env: &str) -> WarehouseResult<Value> {
        let request = ApiRequest::get()
            .segment("head")
            .segment(require(name, "name")?)
            .segment(require(env, "env")?);
        self.http.send(&request).await
    }

    /// Point the head of an object in an environment at `version`.
    pub async fn set_head(&self, name: &str, env: &str, version: &str) -> WarehouseResult<Value> {
        let request = ApiRequest::put()
            .segment("objects")
            .segment(require(name, "name")?)
            .segment(require(env, "env")?)
            .json(json!({ "head": require(version, "version")? }));
        self.http.send(&request).await
    }
}

/// Environments registered for an object (`objects/{name}/envs`).
#[derive(Debug, Clone, Copy)]
pub struct Envs<'a> {
    pub(crate) http: &'a HttpBackend,
}

impl Envs<'_> {
    fn base(request: ApiRequest, name: &str) -> WarehouseResult<ApiRequest> {
        Ok(request
            .segment("objects")
            .segment(require(name, "name")?)
            .segment("envs"))
    }

    pub async fn create(&self, name: &str, env: &str) -> WarehouseResult<Value> {
        let request =
            Self::base(ApiRequest::post(), name)?.json(json!({ "env": require(env, "env")? }));
        self.http.send(&request).await
    }

    pub async fn list(&self, name: &str) -> WarehouseResult<Value> {
        self.http.send(&Self::base(ApiRequest::get(), name)?).await
    }

    pub async fn get(&self, name: &str, env: &str) -> WarehouseResult<Value> {
        let request = Self::base(ApiRequest::get(), name)?.segment(require(env, "env")?);
        self.http.send(&request).await
    }
}
