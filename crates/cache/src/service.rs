//! Cache service trait and JSON helpers.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;

/// TTL applied when a caller does not pass one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// A string-keyed cache holding JSON-encoded values.
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns the raw JSON stored under `key`, if present and not expired.
    async fn get_raw(&self, key: &str) -> Result<Option<String>>;

    /// Stores raw JSON under `key`. `None` uses [`DEFAULT_TTL`].
    async fn set_raw(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// Removes every key matching `pattern`. A trailing `*` matches any suffix;
    /// without it the pattern must match a key exactly.
    async fn remove_by_pattern(&self, pattern: &str) -> Result<()>;

    async fn exists(&self, key: &str) -> Result<bool>;
}

/// Decodes the value under `key`.
pub async fn get<T: DeserializeOwned>(cache: &dyn CacheService, key: &str) -> Result<Option<T>> {
    match cache.get_raw(key).await? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Encodes `value` and stores it under `key`.
pub async fn set<T: Serialize + ?Sized>(
    cache: &dyn CacheService,
    key: &str,
    value: &T,
    ttl: Option<Duration>,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    cache.set_raw(key, raw, ttl).await
}

/// Reads through the cache, logging failures as misses.
pub(crate) async fn lookup<T: DeserializeOwned>(
    cache: &dyn CacheService,
    entity: &'static str,
    key: &str,
) -> Option<T> {
    match get(cache, key).await {
        Ok(Some(value)) => {
            metrics::counter!("cache_hits_total", "entity" => entity).increment(1);
            tracing::debug!(key, "cache hit");
            Some(value)
        }
        Ok(None) => {
            metrics::counter!("cache_misses_total", "entity" => entity).increment(1);
            None
        }
        Err(e) => {
            metrics::counter!("cache_misses_total", "entity" => entity).increment(1);
            tracing::warn!(key, error = %e, "cache read failed");
            None
        }
    }
}

/// Populates the cache, logging failures.
pub(crate) async fn populate<T: Serialize + ?Sized>(
    cache: &dyn CacheService,
    key: &str,
    value: &T,
    ttl: Duration,
) {
    if let Err(e) = set(cache, key, value, Some(ttl)).await {
        tracing::warn!(key, error = %e, "cache write failed");
    }
}

/// Removes keys or patterns, logging failures.
pub(crate) async fn invalidate(cache: &dyn CacheService, keys: &[String]) {
    for key in keys {
        let result = if key.ends_with('*') {
            cache.remove_by_pattern(key).await
        } else {
            cache.remove(key).await
        };
        if let Err(e) = result {
            tracing::warn!(key = %key, error = %e, "cache invalidation failed");
        }
    }
}
