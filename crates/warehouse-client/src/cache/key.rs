//! Cache key derivation.
//!
//! A key is the SHA-256 of the JCS (RFC 8785) serialization of the parameter
//! record, so field order never changes the key.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{WarehouseError, WarehouseResult};

/// Opaque, fixed-length (64 hex chars) cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a parameter record.
    ///
    /// Fails only when `params` cannot be represented as JSON
    /// (e.g. a map with non-string keys).
    pub fn derive<P: Serialize + ?Sized>(params: &P) -> WarehouseResult<Self> {
        let bytes = canonical_bytes(params)?;
        Ok(Self(hex::encode(Sha256::digest(&bytes))))
    }

    /// The key as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// JCS bytes for a serializable value.
pub(crate) fn canonical_bytes<P: Serialize + ?Sized>(params: &P) -> WarehouseResult<Vec<u8>> {
    let value = serde_json::to_value(params).map_err(|e| WarehouseError::InvalidResponse {
        message: format!("cache params are not representable as JSON: {}", e),
    })?;
    serde_jcs::to_vec(&value).map_err(|e| WarehouseError::InvalidResponse {
        message: format!("failed to canonicalize cache params: {}", e),
    })
}
