//! Reference set used as the bucket type of secondary indexes
//!
//! A `RefSet` holds shared references (`Arc<V>`) to records, deduplicated by
//! pointer identity rather than by value: two equal-looking records stored
//! under different primary keys are distinct members, and the same `Arc`
//! added twice is stored once.

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Identity of a shared record: the address of its allocation.
#[inline]
fn identity<V>(value: &Arc<V>) -> usize {
    Arc::as_ptr(value) as usize
}

/// Unordered set of unique record references
pub struct RefSet<V> {
    refs: FxHashMap<usize, Arc<V>>,
}

impl<V> RefSet<V> {
    /// Create a new empty set
    pub fn new() -> Self {
        Self {
            refs: FxHashMap::default(),
        }
    }

    /// Add a reference, returns false if it was already present
    pub fn insert(&mut self, value: Arc<V>) -> bool {
        let id = identity(&value);
        if self.refs.contains_key(&id) {
            return false;
        }
        self.refs.insert(id, value);
        true
    }

    /// Remove a reference, returns false if it was not present
    pub fn remove(&mut self, value: &Arc<V>) -> bool {
        self.refs.remove(&identity(value)).is_some()
    }

    /// Check whether this exact reference is a member
    pub fn contains(&self, value: &Arc<V>) -> bool {
        self.refs.contains_key(&identity(value))
    }

    /// Number of members
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// Check if the set is empty
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Iterate over members in unspecified order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<V>> + '_ {
        self.refs.values()
    }

    /// Any one member; which one is unspecified
    pub fn any(&self) -> Option<&Arc<V>> {
        self.refs.values().next()
    }

    /// Materialize the members into a sequence (order unspecified)
    pub fn to_vec(&self) -> Vec<Arc<V>> {
        self.refs.values().cloned().collect()
    }

    /// Remove all members
    pub fn clear(&mut self) {
        self.refs.clear();
    }
}

impl<V> Default for RefSet<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for RefSet<V> {
    fn clone(&self) -> Self {
        Self {
            refs: self.refs.clone(),
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for RefSet<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.refs.values()).finish()
    }
}

impl<V> FromIterator<Arc<V>> for RefSet<V> {
    fn from_iter<I: IntoIterator<Item = Arc<V>>>(iter: I) -> Self {
        let mut set = RefSet::new();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl<V> Extend<Arc<V>> for RefSet<V> {
    fn extend<I: IntoIterator<Item = Arc<V>>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}
