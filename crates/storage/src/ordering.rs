//! Lazily rebuilt total order over the records of a primary index
//!
//! The cache is either clean (the sorted key sequence matches the primary
//! index) or dirty. Mutations only flip it to dirty; the O(n log n) rebuild
//! happens on the next ordered read, so a burst of writes followed by one
//! ordered read pays for a single sort.
//!
//! The cache stores primary keys, not records. Ordered traversal resolves
//! each key against the primary index, so a record replaced under the same
//! key without changing its position is still seen in its current state.

use crate::primary::PrimaryIndex;
use std::cmp::Ordering;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

/// Shared record comparator
pub type Comparator<V> = Arc<dyn Fn(&V, &V) -> Ordering + Send + Sync>;

/// Sorted key sequence plus its dirty flag
#[derive(Debug)]
pub struct OrderingCache<K> {
    sorted: Arc<Vec<K>>,
    dirty: bool,
    rebuilds: u64,
}

impl<K> OrderingCache<K>
where
    K: Eq + Hash + Clone,
{
    /// Create a dirty cache with room for `capacity` keys
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sorted: Arc::new(Vec::with_capacity(capacity)),
            dirty: true,
            rebuilds: 0,
        }
    }

    /// Invalidate the cached order
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Check if the next ordered read will rebuild
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of rebuilds performed so far
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Return the sorted key sequence, rebuilding it first if dirty
    ///
    /// Without a comparator the order is whatever the primary index yields,
    /// which still lists every key exactly once.
    pub fn refresh<V>(
        &mut self,
        primary: &PrimaryIndex<K, V>,
        cmp: Option<&Comparator<V>>,
    ) -> Arc<Vec<K>> {
        if self.dirty {
            self.rebuild(primary, cmp);
        }
        Arc::clone(&self.sorted)
    }

    fn rebuild<V>(&mut self, primary: &PrimaryIndex<K, V>, cmp: Option<&Comparator<V>>) {
        let mut entries: Vec<(&K, &Arc<V>)> = primary.iter().collect();
        if let Some(cmp) = cmp {
            entries.sort_by(|a, b| cmp(&**a.1, &**b.1));
        }

        // Reuse the allocation unless a reader still holds the previous sequence
        match Arc::get_mut(&mut self.sorted) {
            Some(sorted) => {
                sorted.clear();
                sorted.extend(entries.iter().map(|(k, _)| (*k).clone()));
            }
            None => {
                self.sorted = Arc::new(entries.iter().map(|(k, _)| (*k).clone()).collect());
            }
        }

        self.dirty = false;
        self.rebuilds += 1;
        debug!(
            target: "strata::index",
            records = self.sorted.len(),
            sorted = cmp.is_some(),
            "Ordering cache rebuilt"
        );
    }
}
