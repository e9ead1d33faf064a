//! Credentials for the warehouse API.
//!
//! Two schemes are supported:
//! - Bearer token (`WAREHOUSE_TOKEN`)
//! - Basic auth (`WAREHOUSE_USERNAME` + `WAREHOUSE_PASSWORD`)

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Credentials attached to every request as an `Authorization` header.
#[derive(Clone, Default)]
pub enum Credentials {
    /// Bearer token.
    Bearer(String),

    /// Basic auth.
    Basic { username: String, password: String },

    /// No authentication.
    #[default]
    None,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::None => f.write_str("None"),
        }
    }
}

impl Credentials {
    /// Create a bearer token credential.
    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer(token.into())
    }

    /// Create a basic auth credential.
    pub fn basic(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::Basic {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Create from environment variables.
    ///
    /// Checks in order:
    /// 1. `WAREHOUSE_TOKEN` - bearer token
    /// 2. `WAREHOUSE_USERNAME` + `WAREHOUSE_PASSWORD` - basic auth
    /// 3. Falls back to no auth
    pub fn from_env() -> Self {
        if let Ok(token) = std::env::var("WAREHOUSE_TOKEN") {
            if !token.is_empty() {
                return Self::Bearer(token);
            }
        }

        match (
            std::env::var("WAREHOUSE_USERNAME"),
            std::env::var("WAREHOUSE_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) if !username.is_empty() => {
                Self::Basic { username, password }
            }
            _ => Self::None,
        }
    }

    /// Value for the `Authorization` header, if any.
    pub fn header_value(&self) -> Option<String> {
        match self {
            Self::Bearer(token) => Some(format!("Bearer {}", token)),
            Self::Basic { username, password } => {
                let encoded = BASE64.encode(format!("{}:{}", username, password));
                Some(format!("Basic {}", encoded))
            }
            Self::None => None,
        }
    }

    /// Check if authentication is configured.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}
