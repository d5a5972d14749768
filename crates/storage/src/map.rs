//! IndexMap: a primary index plus named secondary indexes under one lock
//!
//! This module implements the public contract of the engine using:
//! - `PrimaryIndex` for the canonical key → record mapping
//! - A registry of named `RecordIndex` trait objects for secondary lookups
//! - `parking_lot::RwLock` guarding all of the above as one unit
//! - `OrderingCache` for lazily sorted traversal
//!
//! # Design Notes
//!
//! - **Shared records**: every index holds an `Arc` to the same record; nothing
//!   is copied per bucket.
//! - **One lock per call**: each public method acquires the lock exactly once.
//!   Multi-step mutations (remove-then-insert) run through the lock-free
//!   helpers on `Inner`.
//! - **Ordered reads under the shared lock**: the ordering cache sits behind
//!   its own mutex, so a rebuild never needs the exclusive lock. Writers hold
//!   the exclusive lock and reach the cache through `Mutex::get_mut`.
//!
//! # Reentrancy
//!
//! The lock is not reentrant. Visitors passed to `range*` and transforms
//! passed to `update*` run while the lock is held and must not call back into
//! the same `IndexMap`; doing so deadlocks.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::ops::ControlFlow;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::{debug, trace, warn};

use strata_index_core::{Error, IndexMapConfig, Result, SecondaryKey};

use crate::ordering::{Comparator, OrderingCache};
use crate::primary::{KeyExtractor, PrimaryIndex};
use crate::secondary::RecordIndex;
use crate::set::RefSet;

/// Result of a key-difference query
///
/// Reports which indexes a candidate replacement would move the stored
/// record in, without performing the replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexChange {
    /// The candidate derives a different primary key
    pub primary_key_changed: bool,
    /// Names of secondary indexes whose derived key set differs, sorted
    pub changed_indexes: Vec<String>,
}

impl IndexChange {
    /// Check whether any index would be affected
    pub fn is_unchanged(&self) -> bool {
        !self.primary_key_changed && self.changed_indexes.is_empty()
    }

    /// Check whether the named secondary index would be affected
    pub fn affects(&self, index_name: &str) -> bool {
        self.changed_indexes.iter().any(|name| name == index_name)
    }
}

/// State guarded by the map's lock
struct Inner<K, V> {
    primary: PrimaryIndex<K, V>,
    indexes: FxHashMap<String, Box<dyn RecordIndex<V>>>,
    cmp: Option<Comparator<V>>,
    ordering: Mutex<OrderingCache<K>>,
}

impl<K, V> Inner<K, V>
where
    K: Eq + Hash + Clone,
{
    fn mark_dirty(&mut self) {
        self.ordering.get_mut().mark_dirty();
    }

    /// Store `value`, replacing and unindexing any record with the same key
    fn attach(&mut self, value: Arc<V>) -> Option<Arc<V>> {
        let replaced = self.primary.insert(Arc::clone(&value));
        for index in self.indexes.values_mut() {
            if let Some(old) = &replaced {
                index.remove(old);
            }
            index.insert(&value);
        }
        replaced
    }

    /// Remove the record under `key` from every index
    ///
    /// Leaves the ordering cache alone so callers can decide whether the
    /// overall mutation invalidates it.
    fn detach<Q>(&mut self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let old = self.primary.remove(key)?;
        for index in self.indexes.values_mut() {
            index.remove(&old);
        }
        Some(old)
    }

    fn bucket(&self, index_name: &str, key: &SecondaryKey) -> Option<&RefSet<V>> {
        self.indexes.get(index_name)?.get(key)
    }

    fn ordered_keys(&self) -> Arc<Vec<K>> {
        self.ordering.lock().refresh(&self.primary, self.cmp.as_ref())
    }
}

/// Concurrent record store with dynamically registered secondary indexes
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use strata_index_storage::{IndexMap, PrimaryIndex, SecondaryIndex};
///
/// struct Person { id: i64, name: String, city: String }
///
/// let persons = IndexMap::new(PrimaryIndex::new(|p: &Person| p.id));
/// persons.add_index("city", SecondaryIndex::by_field(|p: &Person| p.city.clone()));
///
/// persons.insert(Person { id: 0, name: "Ashe".into(), city: "SF".into() });
/// persons.insert(Person { id: 1, name: "Bob".into(), city: "SF".into() });
///
/// assert_eq!(persons.get_all_by("city", "SF").len(), 2);
/// assert_eq!(persons.get(&1).unwrap().name, "Bob");
/// ```
pub struct IndexMap<K, V> {
    inner: RwLock<Inner<K, V>>,
    key_of: KeyExtractor<K, V>,
    config: IndexMapConfig,
}

impl<K, V> IndexMap<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Create a map around `primary` with the default configuration
    ///
    /// Records already in `primary` are kept but no secondary index exists yet.
    pub fn new(primary: PrimaryIndex<K, V>) -> Self {
        Self::build(primary, IndexMapConfig::default())
    }

    /// Create a map around `primary` with a validated configuration
    pub fn with_config(primary: PrimaryIndex<K, V>, config: IndexMapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(primary, config))
    }

    fn build(mut primary: PrimaryIndex<K, V>, config: IndexMapConfig) -> Self {
        primary.reserve(config.initial_capacity);
        let key_of = primary.extractor();
        Self {
            inner: RwLock::new(Inner {
                primary,
                indexes: FxHashMap::default(),
                cmp: None,
                ordering: Mutex::new(OrderingCache::with_capacity(config.initial_capacity)),
            }),
            key_of,
            config,
        }
    }

    /// Configuration this map was created with
    pub fn config(&self) -> &IndexMapConfig {
        &self.config
    }

    /// Derive the primary key of `value` (takes no lock)
    pub fn primary_key(&self, value: &V) -> K {
        (self.key_of)(value)
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Set the comparator used by `range_ordered` and `collect_values_ordered`
    ///
    /// The last comparator set wins. Setting one invalidates the cached order.
    pub fn set_comparator<F>(&self, cmp: F)
    where
        F: Fn(&V, &V) -> Ordering + Send + Sync + 'static,
    {
        let mut inner = self.inner.write();
        inner.cmp = Some(Arc::new(cmp));
        inner.mark_dirty();
    }

    /// Order records by a derived sort key
    pub fn set_order_by_key<F, T>(&self, sort_key: F)
    where
        F: Fn(&V) -> T + Send + Sync + 'static,
        T: Ord,
    {
        self.set_comparator(move |a, b| sort_key(a).cmp(&sort_key(b)));
    }

    // ========================================================================
    // Index registry
    // ========================================================================

    /// Register a secondary index and backfill it from the stored records
    ///
    /// Returns false, leaving the map unchanged, if `name` is taken or the
    /// configured index limit is reached.
    pub fn add_index<I>(&self, name: impl Into<String>, index: I) -> bool
    where
        I: RecordIndex<V> + 'static,
    {
        self.try_add_index(name, index).is_ok()
    }

    /// Register a secondary index, reporting why registration failed
    pub fn try_add_index<I>(&self, name: impl Into<String>, mut index: I) -> Result<()>
    where
        I: RecordIndex<V> + 'static,
    {
        let name = name.into();
        let mut inner = self.inner.write();

        if inner.indexes.contains_key(&name) {
            return Err(Error::DuplicateIndex(name));
        }
        if let Some(limit) = self.config.max_indexes {
            if inner.indexes.len() >= limit {
                return Err(Error::IndexLimitReached { limit });
            }
        }

        for value in inner.primary.values() {
            index.insert(value);
        }

        debug!(
            target: "strata::index",
            map = %self.config.name,
            index = %name,
            backfilled = inner.primary.len(),
            keys = index.key_count(),
            "Secondary index registered"
        );
        inner.indexes.insert(name, Box::new(index));
        Ok(())
    }

    /// Check whether an index named `name` is registered
    pub fn has_index(&self, name: &str) -> bool {
        self.inner.read().indexes.contains_key(name)
    }

    /// Names of all registered secondary indexes, sorted
    pub fn index_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.inner.read().indexes.keys().cloned().collect();
        names.sort();
        names
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Get the record stored under the primary key
    pub fn get<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read().primary.get(key).cloned()
    }

    /// Check whether a record is stored under the primary key
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read().primary.contains_key(key)
    }

    /// One record indexed under `key`; which one is unspecified
    ///
    /// Returns `None` for an unknown index or key.
    pub fn get_by(&self, index_name: &str, key: impl Into<SecondaryKey>) -> Option<Arc<V>> {
        let key = key.into();
        let inner = self.inner.read();
        inner.bucket(index_name, &key)?.any().cloned()
    }

    /// All records indexed under `key`, in unspecified order
    ///
    /// Returns an empty vector for an unknown index or key; use
    /// `try_get_all_by` or `has_index` to tell the two apart.
    ///
    /// The probe must convert to the same `SecondaryKey` variant the index
    /// derives. An index over a `u32` field stores `UInt` keys, so an
    /// unsuffixed literal such as `40` (an `i32`, hence `Int`) matches
    /// nothing; write `40u32`.
    pub fn get_all_by(&self, index_name: &str, key: impl Into<SecondaryKey>) -> Vec<Arc<V>> {
        let key = key.into();
        let inner = self.inner.read();
        match inner.bucket(index_name, &key) {
            Some(bucket) => bucket.to_vec(),
            None => {
                trace!(
                    target: "strata::index",
                    map = %self.config.name,
                    index = index_name,
                    %key,
                    key_type = key.type_name(),
                    known_index = inner.indexes.contains_key(index_name),
                    "get_all_by found no records"
                );
                Vec::new()
            }
        }
    }

    /// All records indexed under `key`, failing if the index is unknown
    pub fn try_get_all_by(
        &self,
        index_name: &str,
        key: impl Into<SecondaryKey>,
    ) -> Result<Vec<Arc<V>>> {
        let key = key.into();
        let inner = self.inner.read();
        let index = inner
            .indexes
            .get(index_name)
            .ok_or_else(|| Error::UnknownIndex(index_name.to_string()))?;
        Ok(index.get(&key).map(RefSet::to_vec).unwrap_or_default())
    }

    /// Number of records indexed under `key`
    pub fn count_by(&self, index_name: &str, key: impl Into<SecondaryKey>) -> usize {
        let key = key.into();
        let inner = self.inner.read();
        inner.bucket(index_name, &key).map_or(0, RefSet::len)
    }

    /// Compare a candidate replacement against the record stored under `key`
    ///
    /// Returns `None` if no record is stored under `key`.
    pub fn index_change_status<Q>(&self, key: &Q, candidate: &V) -> Option<IndexChange>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let inner = self.inner.read();
        let current = inner.primary.get(key)?;

        let primary_key_changed = self.primary_key(current) != self.primary_key(candidate);
        let mut changed_indexes: Vec<String> = inner
            .indexes
            .iter()
            .filter(|(_, index)| index.keys_changed(current, candidate))
            .map(|(name, _)| name.clone())
            .collect();
        changed_indexes.sort();

        Some(IndexChange {
            primary_key_changed,
            changed_indexes,
        })
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.inner.read().primary.len()
    }

    /// Check if the map holds no records
    pub fn is_empty(&self) -> bool {
        self.inner.read().primary.is_empty()
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Insert a record, replacing any record with the same primary key
    ///
    /// The replaced record is removed from every secondary index and returned.
    /// A record must not be modified in place after insertion; use `update`.
    pub fn insert(&self, value: impl Into<Arc<V>>) -> Option<Arc<V>> {
        let mut inner = self.inner.write();
        inner.mark_dirty();
        inner.attach(value.into())
    }

    /// Insert several records under one lock acquisition
    ///
    /// Each record is an independent replacement; later records win over
    /// earlier ones with the same primary key.
    pub fn insert_many<I>(&self, values: I)
    where
        I: IntoIterator,
        I::Item: Into<Arc<V>>,
    {
        let mut inner = self.inner.write();
        inner.mark_dirty();
        for value in values {
            inner.attach(value.into());
        }
    }

    /// Replace the record under `key` with the result of `f`
    ///
    /// The current record (or `None`) is detached from every index and passed
    /// to `f`, which returns the new record (or `None` to delete) and whether
    /// the change affects ordering. Because the map holds no reference to the
    /// record while `f` runs, `Arc::make_mut` edits it without copying when
    /// the caller holds no other clone.
    ///
    /// The ordering cache is invalidated when `f` reports a change, and also
    /// whenever the set of stored keys changes (delete, insert, or rekey).
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use strata_index_storage::{IndexMap, PrimaryIndex};
    ///
    /// #[derive(Clone)]
    /// struct Counter { id: u32, hits: u64 }
    ///
    /// let counters = IndexMap::new(PrimaryIndex::new(|c: &Counter| c.id));
    /// counters.insert(Counter { id: 7, hits: 0 });
    ///
    /// counters.update(&7, |current| {
    ///     let mut counter = current.unwrap();
    ///     Arc::make_mut(&mut counter).hits += 1;
    ///     (Some(counter), true)
    /// });
    /// assert_eq!(counters.get(&7).unwrap().hits, 1);
    /// ```
    pub fn update<Q, F>(&self, key: &Q, f: F) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        F: FnOnce(Option<Arc<V>>) -> (Option<Arc<V>>, bool),
    {
        let mut inner = self.inner.write();

        let old = inner.detach(key);
        let old_key = old.as_deref().map(|v| self.primary_key(v));

        let (new, changed) = f(old);
        let new_key = new.as_deref().map(|v| self.primary_key(v));
        let keys_moved = old_key != new_key;

        trace!(
            target: "strata::index",
            map = %self.config.name,
            existed = old_key.is_some(),
            kept = new.is_some(),
            changed,
            keys_moved,
            "update"
        );

        if let Some(value) = &new {
            inner.attach(Arc::clone(value));
        }
        if changed || keys_moved {
            inner.mark_dirty();
        }
        new
    }

    /// Apply `f` to every record indexed under `key` in `index_name`
    ///
    /// All matching records are detached first, then each is transformed and
    /// the `Some` results are reinserted. Results must keep distinct primary
    /// keys; a later result silently replaces an earlier one with the same key.
    ///
    /// Returns the number of matching records.
    pub fn update_by<F>(&self, index_name: &str, key: impl Into<SecondaryKey>, mut f: F) -> usize
    where
        F: FnMut(Arc<V>) -> (Option<Arc<V>>, bool),
    {
        let key = key.into();
        let mut inner = self.inner.write();

        let matched = match inner.bucket(index_name, &key) {
            Some(bucket) => bucket.to_vec(),
            None => return 0,
        };
        let count = matched.len();

        let mut detached = Vec::with_capacity(count);
        for value in matched {
            let old_key = self.primary_key(&value);
            inner.detach(&old_key);
            detached.push((old_key, value));
        }

        let mut dirty = false;
        let mut reinserted: FxHashSet<K> = FxHashSet::default();
        for (old_key, old) in detached {
            let (new, changed) = f(old);
            dirty |= changed;
            match new {
                Some(value) => {
                    let new_key = self.primary_key(&value);
                    dirty |= new_key != old_key;
                    if !reinserted.insert(new_key) {
                        warn!(
                            target: "strata::index",
                            map = %self.config.name,
                            index = index_name,
                            "update_by produced two records with one primary key, keeping the later"
                        );
                    }
                    inner.attach(value);
                }
                None => dirty = true,
            }
        }

        if dirty {
            inner.mark_dirty();
        }
        trace!(
            target: "strata::index",
            map = %self.config.name,
            index = index_name,
            matched = count,
            "update_by"
        );
        count
    }

    /// Remove the record under the primary key, returning it
    pub fn remove<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let mut inner = self.inner.write();
        inner.mark_dirty();
        inner.detach(key)
    }

    /// Remove several records under one lock acquisition
    ///
    /// Returns the number of records removed; absent keys are skipped.
    pub fn remove_many<I>(&self, keys: I) -> usize
    where
        I: IntoIterator,
        I::Item: Borrow<K>,
    {
        let mut inner = self.inner.write();
        inner.mark_dirty();

        let mut removed = 0;
        for key in keys {
            if inner.detach::<K>(key.borrow()).is_some() {
                removed += 1;
            }
        }
        removed
    }

    /// Remove every record indexed under `key` in `index_name`
    ///
    /// Returns the number of records removed.
    pub fn remove_by(&self, index_name: &str, key: impl Into<SecondaryKey>) -> usize {
        self.remove_by_many(index_name, std::iter::once(key))
    }

    /// Remove every record indexed under any of `keys` in `index_name`
    pub fn remove_by_many<I>(&self, index_name: &str, keys: I) -> usize
    where
        I: IntoIterator,
        I::Item: Into<SecondaryKey>,
    {
        let mut inner = self.inner.write();
        inner.mark_dirty();

        let mut removed = 0;
        for key in keys {
            let matched = match inner.bucket(index_name, &key.into()) {
                Some(bucket) => bucket.to_vec(),
                None => continue,
            };
            for value in matched {
                if inner.detach(&self.primary_key(&value)).is_some() {
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Remove all records from the primary and every secondary index
    ///
    /// Registered indexes and the comparator stay in place.
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let removed = inner.primary.len();
        inner.primary.clear();
        for index in inner.indexes.values_mut() {
            index.clear();
        }
        inner.mark_dirty();
        debug!(target: "strata::index", map = %self.config.name, removed, "Cleared");
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Visit every record in unspecified order until `f` breaks
    ///
    /// Holds the shared lock for the whole traversal; `f` must not mutate
    /// this map.
    pub fn range<F>(&self, mut f: F)
    where
        F: FnMut(&K, &Arc<V>) -> ControlFlow<()>,
    {
        let inner = self.inner.read();
        for (key, value) in inner.primary.iter() {
            if f(key, value).is_break() {
                return;
            }
        }
    }

    /// Visit every record in comparator order until `f` breaks
    ///
    /// Rebuilds the ordering cache first if any mutation happened since the
    /// last ordered read. `f` must not mutate this map.
    pub fn range_ordered<F>(&self, mut f: F)
    where
        F: FnMut(&K, &Arc<V>) -> ControlFlow<()>,
    {
        let inner = self.inner.read();
        let sorted = inner.ordered_keys();
        for key in sorted.iter() {
            if let Some(value) = inner.primary.get(key) {
                if f(key, value).is_break() {
                    return;
                }
            }
        }
    }

    /// Visit every (key, bucket) pair of `index_name` until `f` breaks
    ///
    /// Does nothing for an unknown index. `f` must not mutate this map.
    pub fn range_by<F>(&self, index_name: &str, f: F)
    where
        F: FnMut(&SecondaryKey, &RefSet<V>) -> ControlFlow<()>,
    {
        // try_range_by fails only on an unknown index
        if let Err(err) = self.try_range_by(index_name, f) {
            debug_assert!(matches!(err, Error::UnknownIndex(_)));
            trace!(
                target: "strata::index",
                map = %self.config.name,
                index = index_name,
                %err,
                "range_by on unknown index"
            );
        }
    }

    /// Like `range_by`, failing if the index is unknown
    pub fn try_range_by<F>(&self, index_name: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&SecondaryKey, &RefSet<V>) -> ControlFlow<()>,
    {
        let inner = self.inner.read();
        let index = inner
            .indexes
            .get(index_name)
            .ok_or_else(|| Error::UnknownIndex(index_name.to_string()))?;
        for (key, bucket) in index.buckets() {
            if f(key, bucket).is_break() {
                break;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// All primary keys, in unspecified order
    pub fn collect_keys(&self) -> Vec<K> {
        self.inner.read().primary.keys().cloned().collect()
    }

    /// All records, in unspecified order
    pub fn collect_values(&self) -> Vec<Arc<V>> {
        self.inner.read().primary.values().cloned().collect()
    }

    /// All records, in comparator order
    pub fn collect_values_ordered(&self) -> Vec<Arc<V>> {
        let inner = self.inner.read();
        let sorted = inner.ordered_keys();
        sorted
            .iter()
            .filter_map(|key| inner.primary.get(key).cloned())
            .collect()
    }

    /// All (key, record) pairs, in unspecified order
    pub fn collect(&self) -> Vec<(K, Arc<V>)> {
        self.inner
            .read()
            .primary
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect()
    }

    /// All (key, records) pairs of `index_name`; empty for an unknown index
    pub fn collect_by(&self, index_name: &str) -> Vec<(SecondaryKey, Vec<Arc<V>>)> {
        let mut out = Vec::new();
        self.range_by(index_name, |key, bucket| {
            out.push((key.clone(), bucket.to_vec()));
            ControlFlow::Continue(())
        });
        out
    }
}

impl<K, V, T> Extend<T> for IndexMap<K, V>
where
    K: Eq + Hash + Clone,
    T: Into<Arc<V>>,
{
    /// Insert records with exclusive access, taking no lock
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let inner = self.inner.get_mut();
        inner.mark_dirty();
        for value in iter {
            inner.attach(value.into());
        }
    }
}

/// Serializes the records only, as a map of primary key → record.
///
/// Index structure is not part of the output; rebuild a populated map by
/// registering the indexes again and inserting the records.
impl<K, V> Serialize for IndexMap<K, V>
where
    K: Eq + Hash + Serialize,
    V: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let inner = self.inner.read();
        let mut map = serializer.serialize_map(Some(inner.primary.len()))?;
        for (key, value) in inner.primary.iter() {
            map.serialize_entry(key, value.as_ref())?;
        }
        map.end()
    }
}

impl<K: Eq + Hash, V> fmt::Debug for IndexMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        let mut names: Vec<&String> = inner.indexes.keys().collect();
        names.sort();
        f.debug_struct("IndexMap")
            .field("name", &self.config.name)
            .field("len", &inner.primary.len())
            .field("indexes", &names)
            .field("ordered", &inner.cmp.is_some())
            .finish()
    }
}
