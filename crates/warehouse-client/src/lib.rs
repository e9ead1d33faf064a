//! Client SDK for the warehouse build and package artifact registry.
//!
//! This crate provides:
//!
//! - A retrying HTTP client for the warehouse API (builds, assets, packages,
//!   status, release lines, publish, objects)
//! - A [`RefreshingCache`] that keeps build and asset responses warm by
//!   re-fetching every entry on a timer, with bounded concurrency
//! - A verify workflow that checks every head build file is served by the CDN
//! - Attachment helpers for publish payloads
//!
//! # Quick Start
//!
//! ```no_run
//! use warehouse_client::{BuildParams, WarehouseClient, WarehouseConfig, WarehouseResult};
//!
//! # async fn example() -> WarehouseResult<()> {
//! let client = WarehouseClient::new(WarehouseConfig::from_env())?;
//!
//! let build = client
//!     .builds()
//!     .get(&BuildParams::new("my-package").env("production"))
//!     .await?;
//! println!("{}", build);
//!
//! client.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! # Caching
//!
//! Build and asset caches are disabled by default. Enable them per resource
//! with [`CacheConfig::enabled`]; the default refresh policy re-fetches every
//! cached entry once every 20 hours, at most 10 at a time.
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `WAREHOUSE_URL` | API base URL (default: `http://localhost:8080`) |
//! | `WAREHOUSE_STATUS_URL` | Status API base URL (default: same as `WAREHOUSE_URL`) |
//! | `WAREHOUSE_TOKEN` | Bearer token |
//! | `WAREHOUSE_USERNAME` / `WAREHOUSE_PASSWORD` | Basic auth credentials |
//! | `WAREHOUSE_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `WAREHOUSE_MAX_RETRIES` | Max retries for transient failures (default: 3) |
//! | `WAREHOUSE_STRICT_SSL` | Verify TLS certificates (default: true) |
//! | `WAREHOUSE_VERIFY_CONCURRENCY` | Verify fan-out limit (default: 10) |

pub mod assets;
pub mod auth;
pub mod builds;
pub mod cache;
pub mod client;
pub mod error;
pub mod files;
pub mod objects;
pub mod packages;
pub mod params;
mod pool;
pub mod status;
pub mod types;
pub mod verify;

// Re-export main types
pub use assets::{AssetCache, Assets};
pub use auth::Credentials;
pub use builds::{BuildCache, Builds};
pub use cache::{CacheEntry, CacheKey, RefreshFn, RefreshingCache, SweepReport};
pub use client::{ApiRequest, Target, WarehouseClient, WAREHOUSE_USER_AGENT};
pub use error::{WarehouseError, WarehouseResult};
pub use files::Files;
pub use objects::{Envs, NewObject, ObjectQuery, Objects};
pub use packages::{Packages, ReleaseLine};
pub use params::{
    AssetParams, AssetQuery, BuildParams, BuildQuery, Environment, HeadParams, StatusParams,
    DEFAULT_LOCALE,
};
pub use status::Status;
pub use types::{
    Attachment, BuildHead, CacheConfig, RefreshConfig, WarehouseConfig,
    DEFAULT_REFRESH_INTERVAL_MS, DEFAULT_REFRESH_LIMIT,
};
pub use verify::{Verify, VerifyOptions};
