//! Injected key-value cache collaborator.
//!
//! The risk engine and the handler layer depend on the [`CacheStore`]
//! trait only; the concrete client is constructed once at process start
//! and passed in explicitly. Cache failures are surfaced as
//! [`CacheError`] values so callers can apply the single
//! "treat any cache error as a miss / no-op" policy instead of
//! scattering silent fallbacks.

use moka::future::Cache;
use moka::Expiry;
use std::fmt;
use std::time::{Duration, Instant};

/// Key namespaces, kept separate so entry families cannot collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    /// Computed (indicator set, risk score) pairs.
    Risk,
    /// Cached database query results (search, suggestions).
    Db,
}

impl Namespace {
    pub fn prefix(&self) -> &'static str {
        match self {
            Namespace::Risk => "risk",
            Namespace::Db => "db",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Failure of the cache collaborator. Never fatal for a request: readers
/// fall back to computing, writers drop the entry.
#[derive(Debug, Clone)]
pub struct CacheError(pub String);

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cache unavailable: {}", self.0)
    }
}

impl std::error::Error for CacheError {}

/// Contract the core expects from a cache client.
#[allow(async_fn_in_trait)]
pub trait CacheStore {
    /// Look up a value. `Ok(None)` is a miss.
    async fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>, CacheError>;

    /// Store a value with a per-entry retention window.
    async fn set(
        &self,
        namespace: Namespace,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), CacheError>;
}

#[derive(Clone)]
struct ExpiringValue {
    value: String,
    ttl: Duration,
}

/// Reads the retention window each entry was stored with.
struct PerEntryTtl;

impl Expiry<String, ExpiringValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &ExpiringValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-process cache client backed by moka.
///
/// All namespaces share one capacity-bounded cache; keys carry their
/// namespace prefix. Operations cannot actually fail here, but the
/// implementation still speaks the fallible [`CacheStore`] contract so
/// a networked store can be swapped in without touching callers.
#[derive(Clone)]
pub struct MokaCacheStore {
    cache: Cache<String, ExpiringValue>,
}

impl MokaCacheStore {
    pub fn new(max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .build();
        Self { cache }
    }

    fn full_key(namespace: Namespace, key: &str) -> String {
        format!("{}:{}", namespace.prefix(), key)
    }
}

impl CacheStore for MokaCacheStore {
    async fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>, CacheError> {
        let entry = self.cache.get(&Self::full_key(namespace, key)).await;
        Ok(entry.map(|e| e.value))
    }

    async fn set(
        &self,
        namespace: Namespace,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        self.cache
            .insert(Self::full_key(namespace, key), ExpiringValue { value, ttl })
            .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn roundtrips_values_per_namespace() {
        let store = MokaCacheStore::new(100);
        store
            .set(Namespace::Risk, "123456a", "risk-payload".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        let hit = store.get(Namespace::Risk, "123456a").await.unwrap();
        assert_eq!(hit.as_deref(), Some("risk-payload"));

        // Same key in another namespace stays a miss.
        let miss = store.get(Namespace::Db, "123456a").await.unwrap();
        assert_eq!(miss, None);
    }

    #[tokio::test]
    async fn missing_key_is_a_miss_not_an_error() {
        let store = MokaCacheStore::new(100);
        let result = store.get(Namespace::Db, "nothing-here").await.unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn namespaces_have_stable_prefixes() {
        assert_eq!(Namespace::Risk.prefix(), "risk");
        assert_eq!(Namespace::Db.prefix(), "db");
    }
}
