//! Pure helpers: URL building, artifact URL resolution, backoff (no HTTP, no status logic).

use std::time::Duration;

use rand::Rng;
use url::Url;

use crate::error::{WarehouseError, WarehouseResult};

/// Parse and validate a base URL.
pub(crate) fn parse_base_url(raw: &str) -> WarehouseResult<Url> {
    let url = Url::parse(raw.trim()).map_err(|e| WarehouseError::Config {
        message: format!("invalid base url {:?}: {}", raw, e),
    })?;
    if url.cannot_be_a_base() {
        return Err(WarehouseError::Config {
            message: format!("base url cannot carry a path: {}", raw),
        });
    }
    Ok(url)
}

/// Join percent-encoded path segments onto `base` and append non-empty query pairs.
pub(crate) fn build_url(base: &Url, segments: &[String], query: &[(String, String)]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments.iter().map(String::as_str));
    }

    let mut pairs = query.iter().filter(|(_, v)| !v.is_empty()).peekable();
    if pairs.peek().is_some() {
        url.query_pairs_mut()
            .extend_pairs(pairs.map(|(k, v)| (k.as_str(), v.as_str())));
    }
    url
}

/// Resolve an artifact path against a head's CDN URL.
///
/// Relative paths resolve like a browser would; absolute URLs are kept as-is.
/// Unresolvable input is returned unchanged so it is reported as a failed check.
pub(crate) fn resolve_artifact_url(cdn_url: &str, file: &str) -> String {
    match Url::parse(cdn_url).and_then(|base| base.join(file)) {
        Ok(url) => url.to_string(),
        Err(_) => file.to_string(),
    }
}

/// Backoff before retry number `retry` (1-based).
///
/// 429 with `Retry-After` waits that long (capped at 30s, ±10% jitter);
/// everything else uses full-jitter exponential backoff capped at 30s.
pub(crate) fn backoff_for(error: &WarehouseError, retry: u32) -> Duration {
    let cap = Duration::from_secs(30);
    match error {
        WarehouseError::RateLimited {
            retry_after: Some(retry_after),
        } => {
            let base_ms = (*retry_after).min(cap).as_millis() as u64;
            let jitter_factor: f64 = rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
            let jittered_ms = ((base_ms as f64) * jitter_factor).round() as u64;
            Duration::from_millis(jittered_ms.max(100))
        }
        _ => {
            let base_backoff = Duration::from_secs(1 << retry.min(5)).min(cap);
            let jittered_ms = rand::thread_rng().gen_range(0..=base_backoff.as_millis() as u64);
            Duration::from_millis(jittered_ms.max(10))
        }
    }
}
