//! Per-grid lock table.
//!
//! A submission locks its owner key and every resource key it reads or
//! writes, from the conflict check through the last write. A lock set is
//! granted all at once or not at all, so no caller ever holds part of a set
//! while waiting for the rest; with no hold-and-wait there is no deadlock
//! regardless of how sets overlap.
//!
//! # Reference
//! Coffman, Elphick & Shoshani (1971), "System Deadlocks", ACM Computing Surveys 3(2)

use std::collections::BTreeSet;
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::store::StoreKey;

/// Table of currently held grid keys.
#[derive(Debug, Default)]
pub struct LockTable {
    held: Mutex<BTreeSet<StoreKey>>,
    released: Condvar,
}

/// A granted lock set; released on drop.
#[derive(Debug)]
pub struct LockSet<'a> {
    table: &'a LockTable,
    keys: BTreeSet<StoreKey>,
}

impl LockTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits up to `timeout` for every key in `keys` to be free, then takes
    /// them together. `None` on timeout.
    pub fn acquire(&self, keys: BTreeSet<StoreKey>, timeout: Duration) -> Option<LockSet<'_>> {
        let deadline = Instant::now() + timeout;
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if keys.is_disjoint(&held) {
                held.extend(keys.iter().cloned());
                return Some(LockSet { table: self, keys });
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self
                .released
                .wait_timeout(held, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            held = guard;
        }
    }

    /// Takes `keys` only if all are free right now.
    pub fn try_acquire(&self, keys: BTreeSet<StoreKey>) -> Option<LockSet<'_>> {
        let mut held = self.held.lock().unwrap_or_else(PoisonError::into_inner);
        if keys.is_disjoint(&held) {
            held.extend(keys.iter().cloned());
            Some(LockSet { table: self, keys })
        } else {
            None
        }
    }

    /// Number of keys currently held.
    pub fn held_count(&self) -> usize {
        self.held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl LockSet<'_> {
    pub fn keys(&self) -> &BTreeSet<StoreKey> {
        &self.keys
    }

    /// Whether every key of `required` is held by this set.
    pub fn covers(&self, required: &BTreeSet<StoreKey>) -> bool {
        required.is_subset(&self.keys)
    }
}

impl Drop for LockSet<'_> {
    fn drop(&mut self) {
        let mut held = self
            .table
            .held
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for key in &self.keys {
            held.remove(key);
        }
        drop(held);
        self.table.released.notify_all();
    }
}
