//! In-process cache backed by Moka.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::sync::Cache;

use crate::error::Result;
use crate::service::{CacheService, DEFAULT_TTL};

#[derive(Clone)]
struct Entry {
    value: Arc<str>,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Bounded in-memory cache with per-entry expiry (TinyLFU admission).
#[derive(Clone)]
pub struct InMemoryCache {
    inner: Cache<String, Entry>,
}

impl InMemoryCache {
    pub fn new(max_entries: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(PerEntryTtl)
                .build(),
        }
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.run_pending_tasks();
        self.inner.entry_count()
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl CacheService for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.inner.get(key).map(|e| e.value.to_string()))
    }

    async fn set_raw(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let entry = Entry {
            value: value.into(),
            ttl: ttl.unwrap_or(DEFAULT_TTL),
        };
        self.inner.insert(key.to_string(), entry);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.invalidate(key);
        Ok(())
    }

    async fn remove_by_pattern(&self, pattern: &str) -> Result<()> {
        let (prefix, wildcard) = match pattern.strip_suffix('*') {
            Some(prefix) => (prefix, true),
            None => (pattern, false),
        };
        let matching: Vec<Arc<String>> = self
            .inner
            .iter()
            .map(|(key, _)| key)
            .filter(|key| {
                if wildcard {
                    key.starts_with(prefix)
                } else {
                    key.as_str() == prefix
                }
            })
            .collect();
        for key in &matching {
            self.inner.invalidate(key.as_str());
        }
        tracing::debug!(pattern, removed = matching.len(), "cache entries removed");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.inner.contains_key(key))
    }
}
