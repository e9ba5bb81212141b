//! Read-through caching around async fetch functions

use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::clock::Clock;
use super::manager::CacheManager;

/// Returns the live cached value for `key`, or runs `fetch` and caches its result
///
/// `fetch` is not invoked on a hit. On a miss it runs exactly once; an `Ok`
/// result is stored under `key` with `ttl` (the cache default if `None`), an
/// `Err` is returned as-is and nothing is stored.
///
/// Concurrent misses for the same key are not coalesced: each caller runs its
/// own fetch and the last one to finish wins the slot.
pub async fn cached<V, C, F, Fut, E>(
    cache: &CacheManager<V, C>,
    key: &str,
    ttl: Option<Duration>,
    fetch: F,
) -> Result<V, E>
where
    V: Clone,
    C: Clock,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
{
    if let Some(value) = cache.get(key) {
        debug!(key = %key, "Cache hit");
        return Ok(value);
    }

    debug!(key = %key, "Cache miss, fetching");
    let value = fetch().await?;
    cache.set(key, value.clone(), ttl);
    Ok(value)
}

/// Wraps `fetch` into a re-callable function that reads through `cache` under a fixed key
///
/// Each call of the returned closure behaves like [`cached`].
pub fn with_cache<V, C, F, Fut, E>(
    cache: Arc<CacheManager<V, C>>,
    key: impl Into<String>,
    ttl: Option<Duration>,
    fetch: F,
) -> impl Fn() -> BoxFuture<'static, Result<V, E>>
where
    V: Clone + Send + 'static,
    C: Clock + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<V, E>> + Send + 'static,
    E: Send + 'static,
{
    let key: Arc<str> = Arc::from(key.into());
    let fetch = Arc::new(fetch);
    move || {
        let cache = cache.clone();
        let key = key.clone();
        let fetch = fetch.clone();
        Box::pin(async move { cached(&*cache, &key, ttl, || (*fetch)()).await })
    }
}
