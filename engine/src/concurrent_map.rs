//! A sharded map for accumulating per-document values from parallel workers.
//!
//! Keys are routed to a fixed number of buckets; each bucket carries its own
//! lock and its own ordered map, so contention is bounded by the bucket
//! count no matter how many workers or distinct keys are in play.

use std::collections::BTreeMap;

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

use crate::document::DocumentId;

/// Exclusive handle to one value. The owning bucket stays locked until the
/// handle is dropped.
pub type Access<'a, V> = MappedMutexGuard<'a, V>;

pub struct ConcurrentMap<V> {
    buckets: Vec<Mutex<BTreeMap<DocumentId, V>>>,
}

impl<V: Default> ConcurrentMap<V> {
    /// Create a map with `bucket_count` independently locked buckets.
    ///
    /// # Panics
    ///
    /// Panics if `bucket_count` is zero.
    pub fn new(bucket_count: usize) -> Self {
        assert!(bucket_count > 0, "bucket count must be positive");
        ConcurrentMap {
            buckets: (0..bucket_count).map(|_| Mutex::new(BTreeMap::new())).collect(),
        }
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Lock the bucket owning `key` and return a handle to its value,
    /// default-initialized if absent.
    pub fn access(&self, key: DocumentId) -> Access<'_, V> {
        let bucket = &self.buckets[(key as u64 % self.buckets.len() as u64) as usize];
        MutexGuard::map(bucket.lock(), |map| map.entry(key).or_default())
    }

    /// Merge every bucket into one ordered map. Consuming the accumulator
    /// guarantees no worker can still be writing, so the merge needs no
    /// cross-bucket snapshot.
    pub fn into_ordinary_map(self) -> BTreeMap<DocumentId, V> {
        let mut ordinary = BTreeMap::new();
        for bucket in self.buckets {
            ordinary.extend(bucket.into_inner());
        }
        ordinary
    }
}
