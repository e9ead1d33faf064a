//! HTTP layer: status mapping and retry.
//!
//! This is the ONLY place for status code handling. Resource modules never
//! interpret status codes.

use std::future::Future;
use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::auth::Credentials;
use crate::error::{WarehouseError, WarehouseResult};
use crate::types::WarehouseConfig;

use super::helpers::{backoff_for, build_url};
use super::request::{ApiRequest, Target};

/// HTTP backend for making requests (holds reqwest client, base URLs, auth, config).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) status_url: Url,
    pub(crate) credentials: Credentials,
    pub(crate) config: WarehouseConfig,
}

impl HttpBackend {
    fn base_for(&self, target: Target) -> &Url {
        match target {
            Target::Api => &self.base_url,
            Target::Status => &self.status_url,
        }
    }

    /// Send a request and decode the JSON body; empty bodies decode to `Null`.
    pub(crate) async fn send(&self, request: &ApiRequest) -> WarehouseResult<Value> {
        let url = build_url(
            self.base_for(request.target),
            &request.segments,
            &request.query,
        );
        debug!(method = %request.method, url = %url, "sending request");

        self.with_retry(|| self.send_once(request, &url)).await
    }

    /// GET an arbitrary URL without credentials and return its status.
    ///
    /// Only transport failures are errors (and retried); any status is a result.
    pub(crate) async fn probe(&self, url: &str) -> WarehouseResult<StatusCode> {
        self.with_retry(|| async move {
            let response = self.client.get(url).send().await?;
            Ok(response.status())
        })
        .await
    }

    async fn with_retry<T, F, Fut>(&self, mut attempt: F) -> WarehouseResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = WarehouseResult<T>>,
    {
        let mut retries = 0;
        let max_retries = self.config.max_retries;

        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && retries < max_retries => {
                    retries += 1;
                    let backoff = backoff_for(&e, retries);

                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries = max_retries,
                        backoff_ms = backoff.as_millis(),
                        "retrying request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_once(&self, request: &ApiRequest, url: &Url) -> WarehouseResult<Value> {
        let mut builder = self.client.request(request.method.clone(), url.clone());

        if !request.headers.contains_key(AUTHORIZATION) {
            if let Some(auth) = self.credentials.header_value() {
                builder = builder.header(AUTHORIZATION, auth);
            }
        }
        builder = builder.headers(request.headers.clone());

        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();

        match status.as_u16() {
            204 => Ok(Value::Null),

            200..=299 => {
                let text = response.text().await.map_err(|e| WarehouseError::Network {
                    message: format!("failed to read response body: {}", e),
                })?;
                if text.trim().is_empty() {
                    return Ok(Value::Null);
                }
                serde_json::from_str(&text).map_err(|e| WarehouseError::InvalidResponse {
                    message: format!("failed to parse JSON from {}: {}", request.path(), e),
                })
            }

            400 => Err(WarehouseError::BadRequest {
                path: request.path(),
                message: error_body(response, status).await,
            }),

            401 | 403 => Err(WarehouseError::Unauthorized {
                message: error_body(response, status).await,
            }),

            404 => Err(WarehouseError::NotFound {
                path: request.path(),
            }),

            429 => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);

                Err(WarehouseError::RateLimited { retry_after })
            }

            500..=599 => Err(WarehouseError::Server {
                status: status.as_u16(),
                message: error_body(response, status).await,
            }),

            _ => Err(WarehouseError::Status {
                status: status.as_u16(),
                message: error_body(response, status).await,
            }),
        }
    }
}

/// Error message from a failed response: the body text, or the status reason.
async fn error_body(response: reqwest::Response, status: StatusCode) -> String {
    match response.text().await {
        Ok(text) if !text.trim().is_empty() => text,
        _ => status.to_string(),
    }
}
