//! Bounded-concurrency fan-out over a collection.
//!
//! Shared by the cache refresh sweep and the verify workflow. Each item is
//! turned into a future and run on its own task; a semaphore admits at most
//! `limit` of them at a time.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

/// Run `f` over every item with at most `limit` futures in flight.
///
/// Results are returned in completion order. A `limit` of zero is treated as one.
/// A task that panics is logged and contributes no result.
pub async fn map_limit<I, T, F, Fut, R>(items: I, limit: usize, f: F) -> Vec<R>
where
    I: IntoIterator<Item = T>,
    F: Fn(T) -> Fut,
    Fut: Future<Output = R> + Send + 'static,
    R: Send + 'static,
{
    let sem = Arc::new(Semaphore::new(limit.clamp(1, Semaphore::MAX_PERMITS)));
    let mut join_set = JoinSet::new();

    for item in items {
        // The semaphore is owned here and never closed.
        let Ok(permit) = sem.clone().acquire_owned().await else {
            break;
        };
        let fut = f(item);
        join_set.spawn(async move {
            let _permit = permit;
            fut.await
        });
    }

    let mut results = Vec::with_capacity(join_set.len());
    while let Some(res) = join_set.join_next().await {
        match res {
            Ok(value) => results.push(value),
            Err(e) if e.is_panic() => warn!(error = %e, "bounded task panicked"),
            Err(e) => warn!(error = %e, "bounded task cancelled"),
        }
    }
    results
}
