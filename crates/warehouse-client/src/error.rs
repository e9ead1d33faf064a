//! Error types for the warehouse client.

use std::time::Duration;

/// Warehouse client errors.
#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    /// Resource not found (404).
    #[error("not found: {path}")]
    NotFound { path: String },

    /// Request rejected by the registry (400).
    #[error("bad request: {path} - {message}")]
    BadRequest { path: String, message: String },

    /// Authentication failed or credentials invalid (401/403).
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// Rate limit exceeded (429).
    #[error("rate limited: retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Registry failed with a 5xx status.
    #[error("server error: HTTP {status}: {message}")]
    Server { status: u16, message: String },

    /// Any other non-2xx status.
    #[error("invalid status code {status}: {message}")]
    Status { status: u16, message: String },

    /// Transport-level failure (connect, timeout, reset).
    #[error("network error: {message}")]
    Network { message: String },

    /// Response body could not be decoded.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// A required call parameter was not supplied.
    #[error("invalid parameters supplied, missing `{name}`")]
    MissingParameter { name: &'static str },

    /// A cache-only accessor was used on a resource without a cache.
    #[error("cache is not enabled for {resource}")]
    CacheDisabled { resource: &'static str },

    /// Local file I/O failed.
    #[error("io error: {path}: {message}")]
    Io { path: String, message: String },
}

impl WarehouseError {
    /// Whether the error is retryable.
    ///
    /// 400 and 404 are never retried; neither are auth failures.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Server { .. } | Self::Network { .. }
        )
    }

    /// HTTP status associated with the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::BadRequest { .. } => Some(400),
            Self::RateLimited { .. } => Some(429),
            Self::Server { status, .. } | Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for WarehouseError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for warehouse operations.
pub type WarehouseResult<T> = Result<T, WarehouseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(WarehouseError::Network {
            message: "reset".into()
        }
        .is_retryable());
        assert!(WarehouseError::Server {
            status: 503,
            message: String::new()
        }
        .is_retryable());
        assert!(WarehouseError::RateLimited { retry_after: None }.is_retryable());

        assert!(!WarehouseError::NotFound {
            path: "builds/x".into()
        }
        .is_retryable());
        assert!(!WarehouseError::BadRequest {
            path: "builds/x".into(),
            message: String::new()
        }
        .is_retryable());
        assert!(!WarehouseError::Status {
            status: 409,
            message: String::new()
        }
        .is_retryable());
    }

    #[test]
    fn test_missing_parameter_message() {
        let err = WarehouseError::MissingParameter { name: "pkg" };
        assert_eq!(
            err.to_string(),
            "invalid parameters supplied, missing `pkg`"
        );
    }
}
