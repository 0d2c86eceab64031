//! Schema cache
//!
//! Memoizes fetch-and-compile per policy name.
//!
//! - Concurrent misses on one name share a single fetch (one `OnceCell` per
//!   in-flight name); misses on different names run in parallel.
//! - The state lock is never held across a call into the [`SchemaSource`].
//! - Failed fetches are not cached; the next call fetches again.
//! - Completed entries live in a bounded LRU. Eviction is silent.
//! - A fetch that was in flight when the cache was purged is returned to its
//!   callers but not stored.

use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::{debug, info, trace, warn};

use super::entry::SchemaCacheEntry;
use super::errors::{SchemaError, SchemaResult};
use super::source::SchemaSource;
use crate::observability::MetricsRegistry;

/// Default number of compiled schemas kept in memory
pub const DEFAULT_CAPACITY: usize = 100;

/// Configuration for the schema cache.
#[derive(Debug, Clone)]
pub struct SchemaCacheConfig {
    /// Maximum number of completed entries. Zero is treated as one.
    pub capacity: usize,
}

impl Default for SchemaCacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

type Slot = Arc<OnceCell<Arc<SchemaCacheEntry>>>;

struct CacheState {
    entries: LruCache<String, Arc<SchemaCacheEntry>>,
    /// Names currently being fetched
    inflight: HashMap<String, Slot>,
}

/// Bounded, concurrency-safe cache of compiled schemas.
pub struct SchemaCache {
    source: Arc<dyn SchemaSource>,
    state: Mutex<CacheState>,
    metrics: Arc<MetricsRegistry>,
}

impl SchemaCache {
    pub fn new(source: Arc<dyn SchemaSource>, config: SchemaCacheConfig) -> Self {
        Self::with_metrics(source, config, Arc::new(MetricsRegistry::new()))
    }

    pub fn with_metrics(
        source: Arc<dyn SchemaSource>,
        config: SchemaCacheConfig,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            source,
            state: Mutex::new(CacheState {
                entries: LruCache::new(capacity),
                inflight: HashMap::new(),
            }),
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Get the compiled schema for `name`, fetching it on first use.
    ///
    /// # Errors
    ///
    /// - `POLICY_SCHEMA_NOT_FOUND` if the source has no schema for `name`
    /// - `POLICY_SCHEMA_FETCH_FAILED` if the source fails or the text does not compile
    /// - `POLICY_SCHEMA_INTERNAL` if the cache lock is poisoned
    pub fn get_entry(&self, name: &str) -> SchemaResult<Arc<SchemaCacheEntry>> {
        let slot = {
            let mut state = self.state.lock().map_err(|_| SchemaError::poisoned())?;
            if let Some(entry) = state.entries.get(name) {
                self.metrics.increment_schema_cache_hits();
                trace!(name, "schema cache hit");
                return Ok(Arc::clone(entry));
            }
            self.metrics.increment_schema_cache_misses();
            Arc::clone(state.inflight.entry(name.to_string()).or_default())
        };

        // Blocks while another caller fetches the same name; that caller's
        // result is shared. If it failed, the next waiter fetches again.
        let result = slot.get_or_try_init(|| self.load(name)).map(Arc::clone);

        let mut state = self.state.lock().map_err(|_| SchemaError::poisoned())?;
        let current = state
            .inflight
            .get(name)
            .is_some_and(|s| Arc::ptr_eq(s, &slot));
        if current {
            match &result {
                Ok(entry) => {
                    state.inflight.remove(name);
                    if let Some((evicted, _)) = state.entries.push(name.to_string(), Arc::clone(entry)) {
                        if evicted != name {
                            self.metrics.increment_schema_cache_evictions();
                            debug!(name = %evicted, "schema evicted from cache");
                        }
                    }
                }
                // Leave the slot to waiters that will retry; the last one out clears it.
                Err(_) if Arc::strong_count(&slot) <= 2 => {
                    state.inflight.remove(name);
                }
                Err(_) => {}
            }
        }
        result
    }

    /// Validate `document` against the schema of `name`.
    pub fn validate(&self, name: &str, document: &Value) -> SchemaResult<BTreeSet<String>> {
        Ok(self.get_entry(name)?.validate(document))
    }

    /// Drop every entry. The next lookup of any name fetches again.
    pub fn purge_cache(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let dropped = state.entries.len();
        state.entries.clear();
        state.inflight.clear();
        drop(state);

        self.metrics.increment_schema_cache_purges();
        info!(dropped, "schema cache purged");
    }

    /// Drop the entry for one name. Returns whether anything was cached or in flight.
    pub fn invalidate(&self, name: &str) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let cached = state.entries.pop(name).is_some();
        let inflight = state.inflight.remove(name).is_some();
        drop(state);

        if cached || inflight {
            debug!(name, "schema invalidated");
        }
        cached || inflight
    }

    /// Whether a completed entry for `name` is cached. Does not touch recency.
    pub fn contains(&self, name: &str) -> bool {
        self.state
            .lock()
            .map(|s| s.entries.contains(name))
            .unwrap_or(false)
    }

    /// Number of completed entries
    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.state
            .lock()
            .map(|s| s.entries.cap().get())
            .unwrap_or(0)
    }

    fn load(&self, name: &str) -> SchemaResult<Arc<SchemaCacheEntry>> {
        self.metrics.increment_schema_fetches();
        debug!(name, "fetching schema");

        let loaded = self
            .source
            .fetch(name)
            .map_err(|e| SchemaError::from_source(name, e))
            .and_then(|text| SchemaCacheEntry::compile(name, text));

        match loaded {
            Ok(entry) => Ok(Arc::new(entry)),
            Err(err) => {
                self.metrics.increment_schema_fetch_failures();
                warn!(name, code = %err.code(), error = %err, "schema fetch failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{SchemaErrorCode, SourceError};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SCHEMA: &str = r#"{"type":"object","required":["id"]}"#;

    /// Source serving SCHEMA for every name except "missing", counting calls.
    fn counting_source(calls: Arc<AtomicUsize>) -> Arc<dyn SchemaSource> {
        Arc::new(move |name: &str| {
            calls.fetch_add(1, Ordering::SeqCst);
            match name {
                "missing" => Err(SourceError::NotFound),
                _ => Ok(SCHEMA.to_string()),
            }
        })
    }

    #[test]
    fn test_hit_does_not_refetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = SchemaCache::new(counting_source(Arc::clone(&calls)), SchemaCacheConfig::default());

        let first = cache.get_entry("svc_a").unwrap();
        let second = cache.get_entry("svc_a").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let snapshot = cache.metrics().snapshot();
        assert_eq!(snapshot.schema_cache_hits, 1);
        assert_eq!(snapshot.schema_cache_misses, 1);
        assert_eq!(snapshot.schema_fetches, 1);
    }

    #[test]
    fn test_failure_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = SchemaCache::new(counting_source(Arc::clone(&calls)), SchemaCacheConfig::default());

        let err = cache.get_entry("missing").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::PolicySchemaNotFound);
        let err = cache.get_entry("missing").unwrap_err();
        assert!(err.is_not_found());

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
        assert_eq!(cache.metrics().snapshot().schema_fetch_failures, 2);
    }

    #[test]
    fn test_purge_forces_fresh_entry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = SchemaCache::new(counting_source(Arc::clone(&calls)), SchemaCacheConfig::default());

        let before = cache.get_entry("svc_a").unwrap();
        cache.purge_cache();
        assert!(cache.is_empty());
        let after = cache.get_entry("svc_a").unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(before.source(), after.source());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_lru_eviction_refetches() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = SchemaCache::new(
            counting_source(Arc::clone(&calls)),
            SchemaCacheConfig { capacity: 2 },
        );

        cache.get_entry("a").unwrap();
        cache.get_entry("b").unwrap();
        cache.get_entry("a").unwrap(); // "b" is now least recently used
        cache.get_entry("c").unwrap();

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert_eq!(cache.metrics().snapshot().schema_cache_evictions, 1);

        cache.get_entry("b").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_invalidate_single_name() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = SchemaCache::new(counting_source(Arc::clone(&calls)), SchemaCacheConfig::default());

        cache.get_entry("a").unwrap();
        cache.get_entry("b").unwrap();
        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert!(cache.contains("b"));

        cache.get_entry("a").unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_zero_capacity_holds_one() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = SchemaCache::new(counting_source(calls), SchemaCacheConfig { capacity: 0 });
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_validate_delegates_to_entry() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cache = SchemaCache::new(counting_source(calls), SchemaCacheConfig::default());

        assert!(cache.validate("svc_a", &json!({ "id": 1 })).unwrap().is_empty());
        assert_eq!(cache.validate("svc_a", &json!({})).unwrap().len(), 1);
    }

    #[test]
    fn test_uncompilable_schema_not_cached() {
        let source: Arc<dyn SchemaSource> =
            Arc::new(|_: &str| -> Result<String, SourceError> { Ok("{broken".to_string()) });
        let cache = SchemaCache::new(source, SchemaCacheConfig::default());

        let err = cache.get_entry("svc_a").unwrap_err();
        assert_eq!(err.code(), SchemaErrorCode::PolicySchemaFetchFailed);
        assert!(cache.is_empty());
    }
}
