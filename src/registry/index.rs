//! # Version Index
//!
//! Registry of loaded policy versions and the resolver that picks which one
//! serves a request.
//!
//! Every record lives in one record store (keyed by full name) and in three
//! lookup indexes: by `major`, by `major.minor` and by `major.minor.patch`.
//! All four maps sit behind a single lock so a reader never observes a record
//! that is in the store but missing from an index, or the reverse.

use std::borrow::Borrow;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use super::errors::{RegistryError, RegistryResult};
use super::record::{ActivationStatus, VersionRecord, VersionSpec};
use crate::observability::MetricsRegistry;

/// Resolver behaviour fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct ResolverConfig {
    /// Allow major-only specs ("1") to resolve across minor lines.
    /// When false such specs always resolve to nothing.
    pub ambiguous_major_resolution: bool,
}

impl ResolverConfig {
    pub fn with_ambiguous_major_resolution() -> Self {
        Self {
            ambiguous_major_resolution: true,
        }
    }
}

/// Records grouped by short name, then by a version key.
#[derive(Debug)]
struct Buckets<K> {
    inner: HashMap<String, HashMap<K, HashSet<Arc<VersionRecord>>>>,
}

impl<K> Default for Buckets<K> {
    fn default() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }
}

impl<K: Hash + Eq> Buckets<K> {
    fn insert(&mut self, key: K, record: &Arc<VersionRecord>) {
        self.inner
            .entry(record.short_name().to_string())
            .or_default()
            .entry(key)
            .or_default()
            .insert(Arc::clone(record));
    }

    fn remove<Q>(&mut self, key: &Q, record: &VersionRecord)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let short_name = record.short_name();
        let Some(by_key) = self.inner.get_mut(short_name) else {
            return;
        };
        if let Some(bucket) = by_key.get_mut(key) {
            bucket.remove(record);
            if bucket.is_empty() {
                by_key.remove(key);
            }
        }
        if by_key.is_empty() {
            self.inner.remove(short_name);
        }
    }

    fn get<Q>(&self, short_name: &str, key: &Q) -> Option<&HashSet<Arc<VersionRecord>>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(short_name).and_then(|by_key| by_key.get(key))
    }

    fn all(&self, short_name: &str) -> impl Iterator<Item = &Arc<VersionRecord>> {
        self.inner
            .get(short_name)
            .into_iter()
            .flat_map(|by_key| by_key.values())
            .flatten()
    }
}

#[derive(Debug)]
struct Registered {
    record: Arc<VersionRecord>,
    status: ActivationStatus,
}

#[derive(Debug, Default)]
struct IndexState {
    /// Record store and status table, keyed by full name
    records: HashMap<String, Registered>,
    by_major: Buckets<u32>,
    by_minor: Buckets<String>,
    by_patch: Buckets<String>,
}

impl IndexState {
    fn status_of(&self, record: &VersionRecord) -> Option<ActivationStatus> {
        self.records
            .get(record.full_name())
            .filter(|r| *r.record == *record)
            .map(|r| r.status)
    }

    /// Highest patch in the bucket, provided it is ACTIVE or AVAILABLE.
    ///
    /// A lower patch is never considered when the highest one is ineligible.
    fn pick_pinned(&self, bucket: Option<&HashSet<Arc<VersionRecord>>>) -> Option<VersionRecord> {
        let newest = bucket?.iter().max_by_key(|r| r.patch_version())?;
        match self.status_of(newest) {
            Some(status) if status.is_eligible() => Some(VersionRecord::clone(newest)),
            _ => None,
        }
    }

    /// Highest patch per minor line, kept only when ACTIVE, then the highest minor.
    fn pick_ambiguous(&self, bucket: Option<&HashSet<Arc<VersionRecord>>>) -> Option<VersionRecord> {
        let mut newest_per_minor: BTreeMap<u32, &Arc<VersionRecord>> = BTreeMap::new();
        for record in bucket? {
            newest_per_minor
                .entry(record.minor_version())
                .and_modify(|best| {
                    if record.patch_version() > best.patch_version() {
                        *best = record;
                    }
                })
                .or_insert(record);
        }

        newest_per_minor
            .values()
            .rev()
            .find(|r| self.status_of(r).is_some_and(|s| s.is_promoted()))
            .map(|r| VersionRecord::clone(r))
    }
}

/// Registry of currently loaded policy versions.
///
/// `register` and `remove` take the write lock; `resolve` and the other
/// queries share the read lock.
#[derive(Debug)]
pub struct VersionIndex {
    state: RwLock<IndexState>,
    config: ResolverConfig,
    metrics: Arc<MetricsRegistry>,
}

impl Default for VersionIndex {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

impl VersionIndex {
    /// Create an empty index
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_metrics(config, Arc::new(MetricsRegistry::new()))
    }

    /// Create an empty index reporting into a shared metrics registry
    pub fn with_metrics(config: ResolverConfig, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            state: RwLock::new(IndexState::default()),
            config,
            metrics,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Register a version with its status.
    ///
    /// Fails with [`RegistryError::Conflict`] when the same short name and
    /// version are already bound to a different full name, or when the full
    /// name is already used by a different version. Nothing is modified on
    /// failure. Registering an identical record again only replaces its status.
    pub fn register(&self, record: VersionRecord, status: ActivationStatus) -> RegistryResult<()> {
        let mut state = self.state.write().map_err(|_| RegistryError::poisoned())?;

        if let Some(bound) = state
            .by_patch
            .get(record.short_name(), record.patch_version_string())
            .and_then(|bucket| bucket.iter().find(|r| r.full_name() != record.full_name()))
        {
            return Err(self.conflict(&record, bound.full_name()));
        }

        if let Some(existing) = state.records.get_mut(record.full_name()) {
            if *existing.record != record {
                let existing_full_name = existing.record.full_name().to_string();
                return Err(self.conflict(&record, &existing_full_name));
            }
            let previous = existing.status;
            existing.status = status;
            info!(
                full_name = record.full_name(),
                from = %previous,
                to = %status,
                "policy version re-registered"
            );
            return Ok(());
        }

        let record = Arc::new(record);
        state.by_major.insert(record.major_version(), &record);
        state.by_minor.insert(record.version_string().to_string(), &record);
        state.by_patch.insert(record.patch_version_string().to_string(), &record);
        state.records.insert(
            record.full_name().to_string(),
            Registered {
                record: Arc::clone(&record),
                status,
            },
        );
        drop(state);

        self.metrics.increment_registrations();
        info!(
            short_name = record.short_name(),
            full_name = record.full_name(),
            version = record.patch_version_string(),
            %status,
            "policy version registered"
        );
        Ok(())
    }

    /// Remove a version. Returns whether it was registered; removing an
    /// unknown record is a no-op.
    pub fn remove(&self, record: &VersionRecord) -> RegistryResult<bool> {
        let mut state = self.state.write().map_err(|_| RegistryError::poisoned())?;

        if state.status_of(record).is_none() {
            debug!(full_name = record.full_name(), "remove of unregistered policy version ignored");
            return Ok(false);
        }

        state.records.remove(record.full_name());
        state.by_major.remove(&record.major_version(), record);
        state.by_minor.remove(record.version_string(), record);
        state.by_patch.remove(record.patch_version_string(), record);
        drop(state);

        self.metrics.increment_removals();
        info!(
            short_name = record.short_name(),
            full_name = record.full_name(),
            version = record.patch_version_string(),
            "policy version removed"
        );
        Ok(true)
    }

    /// Change the status of a registered version without touching the
    /// lookup indexes. Returns false when the record is not registered.
    pub fn set_status(&self, record: &VersionRecord, status: ActivationStatus) -> RegistryResult<bool> {
        let mut state = self.state.write().map_err(|_| RegistryError::poisoned())?;

        match state.records.get_mut(record.full_name()) {
            Some(existing) if *existing.record == *record => {
                let previous = existing.status;
                existing.status = status;
                info!(
                    full_name = record.full_name(),
                    from = %previous,
                    to = %status,
                    "policy version status changed"
                );
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Resolve the version that should serve a request for `short_name`.
    ///
    /// - `"M.m"` / `"M.m.p"`: the highest patch among exact matches, if it is
    ///   ACTIVE or AVAILABLE.
    /// - `"M"`: only with ambiguous major resolution enabled; the highest
    ///   minor line whose highest patch is ACTIVE.
    ///
    /// `Ok(None)` means no eligible version. A non-numeric major spec is an
    /// [`RegistryError::InvalidVersionSpec`].
    pub fn resolve(&self, short_name: &str, version_spec: &str) -> RegistryResult<Option<VersionRecord>> {
        if !version_spec.contains('.') && !self.config.ambiguous_major_resolution {
            debug!(short_name, version_spec, "major-only version spec with ambiguous resolution disabled");
            self.record_resolution(false);
            return Ok(None);
        }

        let spec = VersionSpec::parse(version_spec)?;
        let state = self.state.read().map_err(|_| RegistryError::poisoned())?;

        let resolved = match spec {
            VersionSpec::Major(major) => state.pick_ambiguous(state.by_major.get(short_name, &major)),
            VersionSpec::Minor(minor) => state.pick_pinned(state.by_minor.get(short_name, minor)),
            VersionSpec::Patch(patch) => state.pick_pinned(state.by_patch.get(short_name, patch)),
            VersionSpec::Unmatched(_) => None,
        };
        drop(state);

        self.record_resolution(resolved.is_some());
        match &resolved {
            Some(record) => debug!(
                short_name,
                version_spec,
                full_name = record.full_name(),
                "policy version resolved"
            ),
            None => debug!(short_name, version_spec, "no eligible policy version"),
        }
        Ok(resolved)
    }

    /// Current status of a registered record
    pub fn status(&self, record: &VersionRecord) -> RegistryResult<Option<ActivationStatus>> {
        let state = self.state.read().map_err(|_| RegistryError::poisoned())?;
        Ok(state.status_of(record))
    }

    pub fn contains(&self, record: &VersionRecord) -> RegistryResult<bool> {
        Ok(self.status(record)?.is_some())
    }

    /// All registered versions of a policy, oldest first
    pub fn versions(&self, short_name: &str) -> RegistryResult<Vec<(VersionRecord, ActivationStatus)>> {
        let state = self.state.read().map_err(|_| RegistryError::poisoned())?;
        let mut versions: Vec<_> = state
            .by_major
            .all(short_name)
            .filter_map(|r| state.status_of(r).map(|s| (VersionRecord::clone(r), s)))
            .collect();
        versions.sort_by_key(|(r, _)| (r.major_version(), r.minor_version(), r.patch_version()));
        Ok(versions)
    }

    /// Short names with at least one registered version, sorted
    pub fn short_names(&self) -> RegistryResult<Vec<String>> {
        let state = self.state.read().map_err(|_| RegistryError::poisoned())?;
        let mut names: Vec<String> = state.by_major.inner.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    /// Number of registered versions
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn conflict(&self, record: &VersionRecord, existing_full_name: &str) -> RegistryError {
        self.metrics.increment_registration_conflicts();
        warn!(
            short_name = record.short_name(),
            full_name = record.full_name(),
            existing_full_name,
            version = record.patch_version_string(),
            "policy registration conflict"
        );
        RegistryError::Conflict {
            short_name: record.short_name().to_string(),
            version: record.patch_version_string().to_string(),
            existing_full_name: existing_full_name.to_string(),
            full_name: record.full_name().to_string(),
        }
    }

    fn record_resolution(&self, hit: bool) {
        self.metrics.increment_resolutions();
        if !hit {
            self.metrics.increment_resolution_misses();
        }
    }
}
