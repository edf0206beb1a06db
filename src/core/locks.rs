//! Per-entity lock map used by the engines for their check-then-act
//! sequences.
//!
//! Each engine serializes mutations per entity id (doctor for bookings,
//! invoice for payments, drug for stock movement) so that requests touching
//! different entities proceed fully in parallel while two concurrent
//! requests on the same entity can never both pass a validation that only
//! one should pass.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A map of async mutexes, one per key.
///
/// Lock cells are created lazily on first use and kept for the lifetime of
/// the map. The inner registry lock is held only long enough to fetch or
/// insert a cell, never across an `.await`.
#[derive(Debug, Default)]
pub struct KeyedLocks<K> {
    cells: StdMutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty lock map.
    pub fn new() -> Self {
        Self {
            cells: StdMutex::new(HashMap::new()),
        }
    }

    fn cell(&self, key: K) -> Arc<Mutex<()>> {
        let mut cells = self
            .cells
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        cells
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquires the lock for one key, waiting if another task holds it.
    pub async fn lock(&self, key: K) -> OwnedMutexGuard<()> {
        self.cell(key).lock_owned().await
    }

    /// Acquires the locks for a set of keys, always in ascending key order
    /// so that two tasks locking overlapping sets cannot deadlock.
    /// Duplicate keys are collapsed.
    pub async fn lock_all(&self, keys: impl IntoIterator<Item = K>) -> Vec<OwnedMutexGuard<()>>
    where
        K: Ord,
    {
        let mut ordered: Vec<K> = keys.into_iter().collect();
        ordered.sort();
        ordered.dedup();

        let mut guards = Vec::with_capacity(ordered.len());
        for key in ordered {
            guards.push(self.cell(key).lock_owned().await);
        }
        guards
    }
}
