//! Per-rent mutual exclusion.
//!
//! Reconciliation reads every settling invoice, aggregates, then writes the
//! rent. Two invoices for the same rent must not interleave that sequence,
//! so hooks hold the rent's lock for the whole read-aggregate-write and
//! release it afterwards.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use rentdesk_core::RentId;

/// Registry of one mutex per rent, created on first use.
#[derive(Debug, Default)]
pub struct RentLocks {
    inner: Mutex<HashMap<RentId, Arc<Mutex<()>>>>,
}

impl RentLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// The lock for `rent`. Callers hold the returned guard from
    /// [`RentLocks::hold`] for the duration of their critical section.
    pub fn lock_for(&self, rent: &RentId) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        map.entry(rent.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire a lock returned by [`RentLocks::lock_for`].
    ///
    /// The mutex guards no data, so a poisoned lock is simply reclaimed.
    pub fn hold(lock: &Mutex<()>) -> MutexGuard<'_, ()> {
        lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Hand back a lock obtained from [`RentLocks::lock_for`] once its guard
    /// is dropped. The entry is removed when no other caller holds it, so the
    /// registry only keeps rents that are currently being worked on.
    pub fn release(&self, rent: &RentId, lock: Arc<Mutex<()>>) {
        drop(lock);
        let mut map = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if map.get(rent).is_some_and(|held| Arc::strong_count(held) == 1) {
            map.remove(rent);
        }
    }

    /// Number of rents with a live lock entry.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .map(|map| map.len())
            .unwrap_or_else(|poisoned| poisoned.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
