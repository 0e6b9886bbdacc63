//! Fault-injecting store for failure-path tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use super::{MemoryStore, Store, StoreError, StoreKey};

/// Wraps another store and fails operations on demand.
#[derive(Debug)]
pub(crate) struct FaultyStore<S = MemoryStore> {
    pub(crate) inner: S,
    puts: AtomicUsize,
    put_budget: Mutex<Option<usize>>,
    fail_gets: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FaultyStore {
    pub(crate) fn new() -> Self {
        Self::wrap(MemoryStore::new())
    }
}

impl<S> FaultyStore<S> {
    pub(crate) fn wrap(inner: S) -> Self {
        Self {
            inner,
            puts: AtomicUsize::new(0),
            put_budget: Mutex::new(None),
            fail_gets: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
        }
    }

    /// Allows `n` more successful puts, then fails every put.
    pub(crate) fn fail_puts_after(&self, n: usize) {
        *self.put_budget.lock().unwrap_or_else(PoisonError::into_inner) = Some(n);
    }

    pub(crate) fn fail_gets(&self, on: bool) {
        self.fail_gets.store(on, Ordering::SeqCst);
    }

    pub(crate) fn fail_deletes(&self, on: bool) {
        self.fail_deletes.store(on, Ordering::SeqCst);
    }

    /// Clears every injected fault.
    pub(crate) fn heal(&self) {
        *self.put_budget.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.fail_gets(false);
        self.fail_deletes(false);
    }

    /// Successful puts so far.
    pub(crate) fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

impl<S: Store> Store for FaultyStore<S> {
    fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError> {
        if self.fail_gets.load(Ordering::SeqCst) {
            return Err(StoreError::Timeout(key.clone()));
        }
        self.inner.get(key)
    }

    fn put(&self, key: &StoreKey, value: &[u8]) -> Result<(), StoreError> {
        {
            let mut budget = self.put_budget.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(left) = budget.as_mut() {
                if *left == 0 {
                    return Err(StoreError::Unavailable(format!("injected put failure on {key}")));
                }
                *left -= 1;
            }
        }
        self.inner.put(key, value)?;
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn delete(&self, key: &StoreKey) -> Result<(), StoreError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("injected delete failure on {key}")));
        }
        self.inner.delete(key)
    }
}
