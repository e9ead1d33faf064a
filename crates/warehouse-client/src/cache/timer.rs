//! Periodic refresh timer.

use std::fmt;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Weak};
use std::time::Duration;

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::{CacheInner, RefreshingCache};

/// Handle for an armed timer task.
pub(crate) struct RefreshTimer {
    pub(crate) id: u64,
    pub(crate) handle: JoinHandle<()>,
}

async fn run_timer<P, V>(cache: Weak<CacheInner<P, V>>, period: Duration)
where
    P: Serialize + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    // A sweep that outlives the period skips the missed ticks.
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        let Some(inner) = cache.upgrade() else {
            break;
        };
        // The sweep runs on its own task so aborting the timer leaves it running.
        let sweep = tokio::spawn(async move { inner.sweep().await });
        if let Err(e) = sweep.await {
            warn!(error = %e, "cache refresh sweep did not complete");
        }
    }
}

impl<P, V> RefreshingCache<P, V>
where
    P: Serialize + Clone + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Arm the periodic refresh timer.
    ///
    /// No-op when the timer is already armed or the interval is `<= 0`.
    /// A timer whose task has ended is replaced. Returns whether a timer is
    /// armed afterwards.
    pub fn resume_refresh(&self) -> bool {
        let config = self.inner.config;
        if !config.is_periodic() {
            return false;
        }

        let mut timer = self.inner.lock_timer();
        match timer.as_ref() {
            Some(armed) if !armed.handle.is_finished() => return true,
            Some(armed) => warn!(timer_id = armed.id, "cache refresh timer ended, re-arming"),
            None => {}
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("no tokio runtime, cache refresh timer not armed");
            return false;
        };

        let period = Duration::from_millis(config.interval_ms.unsigned_abs());
        let handle = runtime.spawn(run_timer(Arc::downgrade(&self.inner), period));
        let id = self.inner.next_timer_id.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(timer_id = id, interval_ms = config.interval_ms, "armed cache refresh timer");

        *timer = Some(RefreshTimer { id, handle });
        true
    }

    /// Disarm the periodic refresh timer. A running sweep is not cancelled.
    pub fn stop_refresh(&self) {
        if let Some(timer) = self.inner.lock_timer().take() {
            debug!(timer_id = timer.id, "stopped cache refresh timer");
            timer.handle.abort();
        }
    }

    /// Identity of the armed timer, `None` when disarmed.
    pub fn timer_id(&self) -> Option<u64> {
        self.inner.lock_timer().as_ref().map(|t| t.id)
    }
}
