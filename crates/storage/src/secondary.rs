//! Secondary indexes: derived key → set of records
//!
//! A secondary index maps every key its extractor derives from a record to
//! the bucket of records sharing that key. The mapping is many-to-many:
//! - One record may yield zero, one, or many keys ("contains" semantics,
//!   e.g. one key per element of a list field)
//! - Many records may share one key ("equals" semantics)
//!
//! Removal re-derives keys from the record it is given, so a record must be
//! removed in the same state it was inserted in. `IndexMap` guarantees this
//! by detaching a record from every index before handing it to a transform.
//!
//! Buckets never linger empty: removing the last member of a bucket deletes
//! the key.

use crate::set::RefSet;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt;
use std::sync::Arc;
use strata_index_core::{KeyList, SecondaryKey};

/// Capability shared by every index registered with an `IndexMap`
///
/// The registry stores indexes as `Box<dyn RecordIndex<V>>`, so alternative
/// index layouts can be plugged in next to `SecondaryIndex`.
pub trait RecordIndex<V>: Send + Sync {
    /// Derive the keys `value` is indexed under
    fn keys_of(&self, value: &V) -> KeyList;

    /// Add `value` to the bucket of every derived key
    fn insert(&mut self, value: &Arc<V>);

    /// Remove `value` from the bucket of every derived key
    fn remove(&mut self, value: &Arc<V>);

    /// Bucket for `key`, `None` if no record is indexed under it
    fn get(&self, key: &SecondaryKey) -> Option<&RefSet<V>>;

    /// Iterate over all (key, bucket) pairs in unspecified order
    fn buckets(&self) -> Box<dyn Iterator<Item = (&SecondaryKey, &RefSet<V>)> + '_>;

    /// Number of distinct keys
    fn key_count(&self) -> usize;

    /// Drop every bucket
    fn clear(&mut self);

    /// Check whether `old` and `new` derive different key sets
    ///
    /// Added keys, removed keys, or both count as a change. Duplicate keys
    /// from one record are ignored.
    fn keys_changed(&self, old: &V, new: &V) -> bool {
        let old_keys: FxHashSet<SecondaryKey> = self.keys_of(old).into_iter().collect();
        let new_keys: FxHashSet<SecondaryKey> = self.keys_of(new).into_iter().collect();
        old_keys != new_keys
    }
}

type KeysFn<V> = Box<dyn Fn(&V) -> KeyList + Send + Sync>;

/// Hash-bucketed secondary index built from a key extractor
pub struct SecondaryIndex<V> {
    inner: FxHashMap<SecondaryKey, RefSet<V>>,
    keys_of: KeysFn<V>,
}

impl<V> SecondaryIndex<V> {
    /// Create an index from an extractor yielding any number of keys per record
    pub fn new<F>(keys_of: F) -> Self
    where
        F: Fn(&V) -> KeyList + Send + Sync + 'static,
    {
        Self {
            inner: FxHashMap::default(),
            keys_of: Box::new(keys_of),
        }
    }

    /// "Field equals" index: exactly one key per record
    ///
    /// The key variant follows the field type: signed integers become
    /// `Int`, unsigned integers `UInt`. Lookups must use a probe of the
    /// same variant, e.g. `40u32` rather than `40` for a `u32` field.
    ///
    /// # Example
    ///
    /// ```
    /// use strata_index_storage::SecondaryIndex;
    ///
    /// struct Person { city: String }
    ///
    /// let by_city = SecondaryIndex::by_field(|p: &Person| p.city.clone());
    /// # let _ = by_city;
    /// ```
    pub fn by_field<F, T>(field: F) -> Self
    where
        F: Fn(&V) -> T + Send + Sync + 'static,
        T: Into<SecondaryKey>,
    {
        Self::new(move |value| {
            let mut keys = KeyList::new();
            keys.push(field(value).into());
            keys
        })
    }

    /// Index on an optional field: records with `None` are not indexed
    pub fn by_optional_field<F, T>(field: F) -> Self
    where
        F: Fn(&V) -> Option<T> + Send + Sync + 'static,
        T: Into<SecondaryKey>,
    {
        Self::new(move |value| field(value).into_iter().map(Into::into).collect())
    }

    /// "Field contains" index: one key per element of a sequence field
    ///
    /// # Example
    ///
    /// ```
    /// use strata_index_storage::SecondaryIndex;
    ///
    /// struct Person { like: Vec<String> }
    ///
    /// let by_like = SecondaryIndex::by_elements(|p: &Person| p.like.as_slice());
    /// # let _ = by_like;
    /// ```
    pub fn by_elements<F, T>(elements: F) -> Self
    where
        F: Fn(&V) -> &[T] + Send + Sync + 'static,
        T: Clone + Into<SecondaryKey>,
    {
        Self::new(move |value| elements(value).iter().cloned().map(Into::into).collect())
    }

    /// Records indexed under `key`, `None` if there are none
    pub fn get(&self, key: &SecondaryKey) -> Option<&RefSet<V>> {
        self.inner.get(key)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Check if the index has no keys
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<V: Send + Sync> RecordIndex<V> for SecondaryIndex<V> {
    fn keys_of(&self, value: &V) -> KeyList {
        (self.keys_of)(value)
    }

    fn insert(&mut self, value: &Arc<V>) {
        for key in self.keys_of(value) {
            self.inner.entry(key).or_default().insert(Arc::clone(value));
        }
    }

    fn remove(&mut self, value: &Arc<V>) {
        for key in self.keys_of(value) {
            if let Some(bucket) = self.inner.get_mut(&key) {
                bucket.remove(value);
                if bucket.is_empty() {
                    self.inner.remove(&key);
                }
            }
        }
    }

    fn get(&self, key: &SecondaryKey) -> Option<&RefSet<V>> {
        self.inner.get(key)
    }

    fn buckets(&self) -> Box<dyn Iterator<Item = (&SecondaryKey, &RefSet<V>)> + '_> {
        Box::new(self.inner.iter())
    }

    fn key_count(&self) -> usize {
        self.inner.len()
    }

    fn clear(&mut self) {
        self.inner.clear();
    }
}

impl<V: fmt::Debug> fmt::Debug for SecondaryIndex<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.inner.iter()).finish()
    }
}
