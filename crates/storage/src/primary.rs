//! Primary index: unique key → record
//!
//! The primary index owns the canonical mapping from each record's primary
//! key to the shared record. The key is never supplied by the caller on
//! insert; it is always derived through the index's key extractor so the
//! mapping cannot drift from the records it holds.
//!
//! The index does no locking of its own. `IndexMap` guards it together with
//! the secondary indexes under a single lock.

use rustc_hash::FxHashMap;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// Shared primary key extractor
pub type KeyExtractor<K, V> = Arc<dyn Fn(&V) -> K + Send + Sync>;

/// One-to-one mapping from primary key to record
pub struct PrimaryIndex<K, V> {
    inner: FxHashMap<K, Arc<V>>,
    key_of: KeyExtractor<K, V>,
}

impl<K, V> PrimaryIndex<K, V>
where
    K: Eq + Hash,
{
    /// Create an empty primary index keyed by `key_of`
    ///
    /// `key_of` must be deterministic: the same record always yields the same key.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_index_storage::PrimaryIndex;
    ///
    /// struct Person { id: i64, name: String }
    ///
    /// let index = PrimaryIndex::new(|p: &Person| p.id);
    /// assert!(index.is_empty());
    /// ```
    pub fn new<F>(key_of: F) -> Self
    where
        F: Fn(&V) -> K + Send + Sync + 'static,
    {
        Self {
            inner: FxHashMap::default(),
            key_of: Arc::new(key_of),
        }
    }

    /// Derive the primary key of a record
    pub fn key_of(&self, value: &V) -> K {
        (self.key_of)(value)
    }

    /// Shared handle to the key extractor
    pub(crate) fn extractor(&self) -> KeyExtractor<K, V> {
        Arc::clone(&self.key_of)
    }

    /// Get the record stored under `key`
    pub fn get<Q>(&self, key: &Q) -> Option<&Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.get(key)
    }

    /// Check whether a record is stored under `key`
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.contains_key(key)
    }

    /// Store a record under its derived key
    ///
    /// Replaces any record already stored under that key and returns it.
    pub fn insert(&mut self, value: Arc<V>) -> Option<Arc<V>> {
        let key = self.key_of(&value);
        self.inner.insert(key, value)
    }

    /// Remove the record stored under `key`; no-op if absent
    pub fn remove<Q>(&mut self, key: &Q) -> Option<Arc<V>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.remove(key)
    }

    /// Iterate over all entries in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = (&K, &Arc<V>)> + '_ {
        self.inner.iter()
    }

    /// Iterate over all keys in unspecified order
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.inner.keys()
    }

    /// Iterate over all records in unspecified order
    pub fn values(&self) -> impl Iterator<Item = &Arc<V>> + '_ {
        self.inner.values()
    }

    /// Reserve room for at least `additional` more records
    pub fn reserve(&mut self, additional: usize) {
        self.inner.reserve(additional);
    }

    /// Remove all records
    pub fn clear(&mut self) {
        self.inner.clear();
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PrimaryIndex<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.inner.iter()).finish()
    }
}
