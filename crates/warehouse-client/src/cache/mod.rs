//! In-memory response cache with periodic background refresh.
//!
//! Entries are keyed by a [`CacheKey`] derived from the request parameters and
//! are never evicted by age or size. Instead, a timer periodically re-fetches
//! every entry through the injected [`RefreshFn`]:
//!
//! - reads never block on a refresh and never perform I/O
//! - a failed refresh leaves the previous data in place
//! - at most `refresh.limit` fetches are in flight during a sweep
//! - only one sweep runs at a time; overlapping requests wait for it
//!
//! # Example
//!
//! ```no_run
//! use warehouse_client::cache::RefreshingCache;
//! use warehouse_client::{RefreshConfig, WarehouseError, WarehouseResult};
//!
//! # async fn example() -> WarehouseResult<()> {
//! let cache = RefreshingCache::new(
//!     |n: u64| async move { Ok::<_, WarehouseError>(n + 1) },
//!     RefreshConfig::manual(),
//! )?;
//!
//! cache.set(1, 0);
//! cache.refresh_now().await;
//! assert_eq!(cache.get(&1), Some(2));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{WarehouseError, WarehouseResult};
use crate::types::RefreshConfig;

mod key;
mod sweep;
mod timer;

pub use key::CacheKey;
pub use sweep::SweepReport;

use timer::RefreshTimer;

/// Produces a fresh value for a previously cached parameter record.
///
/// Any `Fn(P) -> impl Future<Output = WarehouseResult<V>>` closure implements this.
#[async_trait]
pub trait RefreshFn<P, V>: Send + Sync {
    async fn refresh(&self, params: P) -> WarehouseResult<V>;
}

#[async_trait]
impl<P, V, F, Fut> RefreshFn<P, V> for F
where
    F: Fn(P) -> Fut + Send + Sync,
    Fut: Future<Output = WarehouseResult<V>> + Send + 'static,
    P: Send + 'static,
    V: Send + 'static,
{
    async fn refresh(&self, params: P) -> WarehouseResult<V> {
        (self)(params).await
    }
}

/// A stored `{key, params, data}` record.
#[derive(Debug, Clone)]
pub struct CacheEntry<P, V> {
    pub key: CacheKey,
    pub params: P,
    pub data: V,
}

type EntryMap<P, V> = HashMap<CacheKey, Arc<CacheEntry<P, V>>>;

/// Time-based refreshing cache.
///
/// Cloning is cheap and every clone shares the same store and timer.
pub struct RefreshingCache<P, V> {
    inner: Arc<CacheInner<P, V>>,
}

impl<P, V> Clone for RefreshingCache<P, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, V> fmt::Debug for RefreshingCache<P, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshingCache")
            .field("config", &self.inner.config)
            .field("entries", &self.inner.read_entries().len())
            .field("timer_id", &self.inner.lock_timer().as_ref().map(|t| t.id))
            .finish_non_exhaustive()
    }
}

pub(crate) struct CacheInner<P, V> {
    entries: RwLock<EntryMap<P, V>>,
    refresher: Arc<dyn RefreshFn<P, V>>,
    config: RefreshConfig,
    /// Set while a sweep is running.
    refreshing: AtomicBool,
    /// Bumped every time a sweep finishes.
    sweep_done: watch::Sender<u64>,
    timer: Mutex<Option<RefreshTimer>>,
    next_timer_id: AtomicU64,
}

impl<P, V> CacheInner<P, V> {
    fn read_entries(&self) -> RwLockReadGuard<'_, EntryMap<P, V>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, EntryMap<P, V>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_timer(&self) -> MutexGuard<'_, Option<RefreshTimer>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<P, V> CacheInner<P, V>
where
    P: Serialize + fmt::Debug,
{
    fn store(&self, params: P, data: V) {
        match CacheKey::derive(&params) {
            Ok(key) => {
                let entry = Arc::new(CacheEntry {
                    key: key.clone(),
                    params,
                    data,
                });
                self.write_entries().insert(key, entry);
            }
            Err(e) => warn!(params = ?params, error = %e, "dropping cache write"),
        }
    }

    fn lookup(&self, params: &P) -> Option<Arc<CacheEntry<P, V>>> {
        match CacheKey::derive(params) {
            Ok(key) => self.read_entries().get(&key).cloned(),
            Err(e) => {
                warn!(params = ?params, error = %e, "cache lookup with unhashable params");
                None
            }
        }
    }
}

impl<P, V> Drop for CacheInner<P, V> {
    fn drop(&mut self) {
        let timer = self
            .timer
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(timer) = timer {
            timer.handle.abort();
        }
    }
}

/// Builder for [`RefreshingCache`].
pub struct CacheBuilder<P, V> {
    refresher: Option<Arc<dyn RefreshFn<P, V>>>,
    config: RefreshConfig,
}

impl<P, V> Default for CacheBuilder<P, V> {
    fn default() -> Self {
        Self {
            refresher: None,
            config: RefreshConfig::default(),
        }
    }
}

impl<P, V> CacheBuilder<P, V>
where
    P: Serialize + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Set the function used to re-fetch entries.
    pub fn refresh_fn(mut self, refresher: impl RefreshFn<P, V> + 'static) -> Self {
        self.refresher = Some(Arc::new(refresher));
        self
    }

    /// Set the whole refresh policy.
    pub fn config(mut self, config: RefreshConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the sweep interval in milliseconds (`<= 0` disables the timer).
    pub fn interval_ms(mut self, interval_ms: i64) -> Self {
        self.config.interval_ms = interval_ms;
        self
    }

    /// Set the sweep concurrency limit.
    pub fn limit(mut self, limit: usize) -> Self {
        self.config.limit = limit;
        self
    }

    /// Build the cache and arm the refresh timer.
    ///
    /// Fails without a refresh function, or when the timer must be armed
    /// outside of a tokio runtime.
    pub fn build(self) -> WarehouseResult<RefreshingCache<P, V>> {
        let refresher = self.refresher.ok_or_else(|| WarehouseError::Config {
            message: "refreshing cache requires a refresh function".to_string(),
        })?;

        if self.config.is_periodic() && tokio::runtime::Handle::try_current().is_err() {
            return Err(WarehouseError::Config {
                message: "automatic cache refresh needs a running tokio runtime".to_string(),
            });
        }

        let (sweep_done, _) = watch::channel(0);
        let cache = RefreshingCache {
            inner: Arc::new(CacheInner {
                entries: RwLock::new(HashMap::new()),
                refresher,
                config: self.config,
                refreshing: AtomicBool::new(false),
                sweep_done,
                timer: Mutex::new(None),
                next_timer_id: AtomicU64::new(0),
            }),
        };

        debug!(
            interval_ms = self.config.interval_ms,
            limit = self.config.limit,
            "created refreshing cache"
        );
        cache.resume_refresh();
        Ok(cache)
    }
}

impl<P, V> RefreshingCache<P, V>
where
    P: Serialize + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Start building a cache.
    pub fn builder() -> CacheBuilder<P, V> {
        CacheBuilder::default()
    }

    /// Create a cache with the given refresh function and policy.
    pub fn new(
        refresher: impl RefreshFn<P, V> + 'static,
        config: RefreshConfig,
    ) -> WarehouseResult<Self> {
        Self::builder().refresh_fn(refresher).config(config).build()
    }

    /// Cached data for `params`, if any. Never performs I/O.
    pub fn get(&self, params: &P) -> Option<V> {
        self.inner.lookup(params).map(|entry| entry.data.clone())
    }

    /// Full entry for `params`, if any.
    pub fn entry(&self, params: &P) -> Option<Arc<CacheEntry<P, V>>> {
        self.inner.lookup(params)
    }

    /// Store or overwrite the data for `params`.
    pub fn set(&self, params: P, data: V) {
        self.inner.store(params, data);
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.inner.write_entries().clear();
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.inner.read_entries().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read_entries().is_empty()
    }

    /// Refresh policy this cache was built with.
    pub fn config(&self) -> RefreshConfig {
        self.inner.config
    }
}
