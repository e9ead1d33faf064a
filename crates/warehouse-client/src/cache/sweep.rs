//! Refresh sweep: one bounded pass over every cached entry.

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{CacheInner, RefreshingCache};
use crate::error::{WarehouseError, WarehouseResult};
use crate::pool::map_limit;

/// Outcome of a refresh request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries in the snapshot taken at sweep start.
    pub attempted: usize,
    /// Entries overwritten with fresh data.
    pub refreshed: usize,
    /// Entries whose refresh failed or panicked and kept their stale data.
    pub failed: usize,
    /// The request found a sweep already running and waited for it instead.
    pub coalesced: bool,
}

/// Clears the in-progress flag and wakes waiters, even if the sweep is dropped.
struct SweepGuard<'a, P, V> {
    inner: &'a CacheInner<P, V>,
}

impl<P, V> Drop for SweepGuard<'_, P, V> {
    fn drop(&mut self) {
        self.inner.refreshing.store(false, Ordering::Release);
        self.inner
            .sweep_done
            .send_modify(|generation| *generation = generation.wrapping_add(1));
    }
}

impl<P, V> CacheInner<P, V>
where
    P: Serialize + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub(super) async fn sweep(self: &Arc<Self>) -> SweepReport {
        // Subscribe before checking the flag so a sweep finishing in between is not missed.
        let mut done = self.sweep_done.subscribe();

        if self.refreshing.swap(true, Ordering::AcqRel) {
            debug!("skipping cache refresh, previous sweep is still running");
            // The sender lives in `self`, so this only returns once the running sweep ends.
            let _ = done.changed().await;
            return SweepReport {
                coalesced: true,
                ..Default::default()
            };
        }
        let _guard = SweepGuard { inner: self };

        let snapshot: Vec<P> = self
            .read_entries()
            .values()
            .map(|entry| entry.params.clone())
            .collect();
        let attempted = snapshot.len();
        debug!(
            entries = attempted,
            limit = self.config.limit,
            "refreshing cache"
        );

        let outcomes = map_limit(snapshot, self.config.limit, |params| {
            let inner = Arc::clone(self);
            async move {
                match inner.refresher.refresh(params.clone()).await {
                    Ok(data) => {
                        inner.store(params, data);
                        true
                    }
                    Err(e) => {
                        // Stale data is better than none.
                        warn!(params = ?params, error = %e, "error refreshing cache entry");
                        false
                    }
                }
            }
        })
        .await;

        // A panicked refresh yields no outcome and counts as failed.
        let refreshed = outcomes.iter().filter(|ok| **ok).count();
        let report = SweepReport {
            attempted,
            refreshed,
            failed: attempted - refreshed,
            coalesced: false,
        };
        debug!(
            refreshed = report.refreshed,
            failed = report.failed,
            "cache refresh complete"
        );
        report
    }
}

impl<P, V> RefreshingCache<P, V>
where
    P: Serialize + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Run one refresh sweep and wait for it to finish.
    ///
    /// If a sweep is already running, no new work is started; the returned
    /// future resolves when the running sweep completes, with
    /// [`SweepReport::coalesced`] set.
    pub async fn refresh_now(&self) -> SweepReport {
        self.inner.sweep().await
    }

    /// Start a refresh sweep in the background.
    pub fn trigger_refresh(&self) -> WarehouseResult<JoinHandle<SweepReport>> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| WarehouseError::Config {
            message: format!("cache refresh needs a running tokio runtime: {}", e),
        })?;
        let inner = Arc::clone(&self.inner);
        Ok(runtime.spawn(async move { inner.sweep().await }))
    }

    /// Whether a sweep is currently running.
    pub fn is_refreshing(&self) -> bool {
        self.inner.refreshing.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RefreshConfig;
    use serde::Deserialize;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct Params {
        n: u64,
    }

    #[tokio::test]
    async fn test_sweep_updates_on_success() {
        let cache = RefreshingCache::new(
            |p: Params| async move { Ok::<_, WarehouseError>(p.n + 1) },
            RefreshConfig::manual().with_limit(10),
        )
        .unwrap();
        cache.set(Params { n: 1 }, 0);

        let report = cache.refresh_now().await;

        assert_eq!(cache.get(&Params { n: 1 }), Some(2));
        assert_eq!(
            report,
            SweepReport {
                attempted: 1,
                refreshed: 1,
                failed: 0,
                coalesced: false
            }
        );
        assert!(!cache.is_refreshing());
    }

    #[tokio::test]
    async fn test_sweep_preserves_on_failure() {
        let cache = RefreshingCache::new(
            |p: Params| async move {
                if p.n == 2 {
                    Err(WarehouseError::Network {
                        message: "connection reset".into(),
                    })
                } else {
                    Ok(format!("fresh-{}", p.n))
                }
            },
            RefreshConfig::manual(),
        )
        .unwrap();
        cache.set(Params { n: 1 }, "stale-1".to_string());
        cache.set(Params { n: 2 }, "stale-2".to_string());

        let report = cache.refresh_now().await;

        assert_eq!(report.refreshed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(cache.get(&Params { n: 1 }), Some("fresh-1".to_string()));
        assert_eq!(cache.get(&Params { n: 2 }), Some("stale-2".to_string()));
    }

    #[tokio::test]
    async fn test_sweep_counts_panicked_refresh_as_failed() {
        let cache = RefreshingCache::new(
            |p: Params| async move {
                if p.n == 2 {
                    panic!("refresh blew up");
                }
                Ok::<_, WarehouseError>(p.n * 10)
            },
            RefreshConfig::manual(),
        )
        .unwrap();
        cache.set(Params { n: 1 }, 0);
        cache.set(Params { n: 2 }, 0);

        let report = cache.refresh_now().await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.refreshed, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(cache.get(&Params { n: 1 }), Some(10));
        assert_eq!(cache.get(&Params { n: 2 }), Some(0));
        assert!(!cache.is_refreshing());
    }

    #[tokio::test]
    async fn test_empty_sweep_never_calls_refresh() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let cache = RefreshingCache::new(
            move |p: Params| {
                counter.fetch_add(1, Ordering::SeqCst);
                async move { Ok::<_, WarehouseError>(p.n) }
            },
            RefreshConfig::manual(),
        )
        .unwrap();

        let report = cache.refresh_now().await;

        assert_eq!(report, SweepReport::default());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_trigger_refresh_runs_in_background() {
        let cache = RefreshingCache::new(
            |p: Params| async move { Ok::<_, WarehouseError>(p.n * 10) },
            RefreshConfig::manual(),
        )
        .unwrap();
        cache.set(Params { n: 4 }, 0);

        let handle = cache.trigger_refresh().unwrap();
        let report = handle.await.unwrap();

        assert_eq!(report.refreshed, 1);
        assert_eq!(cache.get(&Params { n: 4 }), Some(40));
    }

    #[tokio::test]
    async fn test_dropped_sweep_releases_flag() {
        let cache = RefreshingCache::new(
            |p: Params| async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok::<_, WarehouseError>(p.n)
            },
            RefreshConfig::manual(),
        )
        .unwrap();
        cache.set(Params { n: 1 }, 0);

        let sweep = cache.refresh_now();
        let timed_out = tokio::time::timeout(Duration::from_millis(20), sweep).await;
        assert!(timed_out.is_err());

        assert!(!cache.is_refreshing());
        assert_eq!(cache.get(&Params { n: 1 }), Some(0));
    }
}
