//! Metrics registry for the policy runtime
//!
//! - Counters only, monotonic, reset on process start
//! - Thread-safe, lock-free increments
//! - Passive: no decision in the registry or cache reads a counter

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for the version index and the schema cache.
///
/// Share one registry between components with `Arc`.
/// Uses Relaxed ordering; counters are not used for synchronisation.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Versions added to the index
    registrations: AtomicU64,
    /// Versions removed from the index
    removals: AtomicU64,
    /// Rejected registrations
    registration_conflicts: AtomicU64,
    /// Resolve calls
    resolutions: AtomicU64,
    /// Resolve calls with no eligible version
    resolution_misses: AtomicU64,
    /// Schema lookups served from the cache
    schema_cache_hits: AtomicU64,
    /// Schema lookups that had to wait for or start a fetch
    schema_cache_misses: AtomicU64,
    /// Calls into the schema source
    schema_fetches: AtomicU64,
    /// Schema fetches or compiles that failed
    schema_fetch_failures: AtomicU64,
    /// Entries dropped to stay within capacity
    schema_cache_evictions: AtomicU64,
    /// Full cache purges
    schema_cache_purges: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Version index

    pub fn increment_registrations(&self) {
        self.registrations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_removals(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_registration_conflicts(&self) {
        self.registration_conflicts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_resolutions(&self) {
        self.resolutions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_resolution_misses(&self) {
        self.resolution_misses.fetch_add(1, Ordering::Relaxed);
    }

    // Schema cache

    pub fn increment_schema_cache_hits(&self) {
        self.schema_cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_schema_cache_misses(&self) {
        self.schema_cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_schema_fetches(&self) {
        self.schema_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_schema_fetch_failures(&self) {
        self.schema_fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_schema_cache_evictions(&self) {
        self.schema_cache_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_schema_cache_purges(&self) {
        self.schema_cache_purges.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            registrations: self.registrations.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            registration_conflicts: self.registration_conflicts.load(Ordering::Relaxed),
            resolutions: self.resolutions.load(Ordering::Relaxed),
            resolution_misses: self.resolution_misses.load(Ordering::Relaxed),
            schema_cache_hits: self.schema_cache_hits.load(Ordering::Relaxed),
            schema_cache_misses: self.schema_cache_misses.load(Ordering::Relaxed),
            schema_fetches: self.schema_fetches.load(Ordering::Relaxed),
            schema_fetch_failures: self.schema_fetch_failures.load(Ordering::Relaxed),
            schema_cache_evictions: self.schema_cache_evictions.load(Ordering::Relaxed),
            schema_cache_purges: self.schema_cache_purges.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub registrations: u64,
    pub removals: u64,
    pub registration_conflicts: u64,
    pub resolutions: u64,
    pub resolution_misses: u64,
    pub schema_cache_hits: u64,
    pub schema_cache_misses: u64,
    pub schema_fetches: u64,
    pub schema_fetch_failures: u64,
    pub schema_cache_evictions: u64,
    pub schema_cache_purges: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let registry = MetricsRegistry::new();
        assert_eq!(registry.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_increment_counters() {
        let registry = MetricsRegistry::new();

        registry.increment_registrations();
        registry.increment_registrations();
        registry.increment_removals();
        registry.increment_registration_conflicts();
        registry.increment_resolutions();
        registry.increment_resolution_misses();
        registry.increment_schema_cache_hits();
        registry.increment_schema_cache_misses();
        registry.increment_schema_fetches();
        registry.increment_schema_fetch_failures();
        registry.increment_schema_cache_evictions();
        registry.increment_schema_cache_purges();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.registrations, 2);
        assert_eq!(snapshot.removals, 1);
        assert_eq!(snapshot.registration_conflicts, 1);
        assert_eq!(snapshot.resolutions, 1);
        assert_eq!(snapshot.resolution_misses, 1);
        assert_eq!(snapshot.schema_cache_hits, 1);
        assert_eq!(snapshot.schema_cache_misses, 1);
        assert_eq!(snapshot.schema_fetches, 1);
        assert_eq!(snapshot.schema_fetch_failures, 1);
        assert_eq!(snapshot.schema_cache_evictions, 1);
        assert_eq!(snapshot.schema_cache_purges, 1);
    }

    #[test]
    fn test_snapshot_serializes() {
        let registry = MetricsRegistry::new();
        registry.increment_schema_fetches();

        let parsed = serde_json::to_value(registry.snapshot()).unwrap();
        assert_eq!(parsed["schema_fetches"], 1);
        assert_eq!(parsed["registrations"], 0);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..10 {
            let reg = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    reg.increment_resolutions();
                    reg.increment_schema_cache_hits();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.resolutions, 1000);
        assert_eq!(snapshot.schema_cache_hits, 1000);
    }
}
