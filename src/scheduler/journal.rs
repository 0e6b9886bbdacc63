//! Pending-write journal.
//!
//! Before a commit touches any grid it records the final state of every
//! grid it is about to write. The entry is retired once every write has
//! landed. If the process dies or the store fails in between, the entry
//! survives and is replayed (plain overwrites, so replay is idempotent) by
//! the next operation that locks any of its grids.
//!
//! At most one entry exists per owner: a new commit for an owner first
//! replays that owner's previous entry, since their key sets intersect.
//!
//! # Reference
//! Gray & Reuter (1992), "Transaction Processing: Concepts and Techniques", Ch. 9 (Log Manager)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, PoisonError};

use crate::models::{OwnerGrid, OwnerId, ResourceGrid, ResourceId};
use crate::store::{GridStore, Store, StoreError, StoreKey};

/// Final grid states of one commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingWrite {
    pub owner: OwnerId,
    pub owner_grid: OwnerGrid,
    pub resources: BTreeMap<ResourceId, ResourceGrid>,
}

impl PendingWrite {
    /// Every grid key this entry writes.
    pub fn keys(&self) -> BTreeSet<StoreKey> {
        std::iter::once(StoreKey::Owner(self.owner.clone()))
            .chain(self.resources.keys().cloned().map(StoreKey::Resource))
            .collect()
    }

    /// Whether this entry writes any of `keys`.
    pub fn touches(&self, keys: &BTreeSet<StoreKey>) -> bool {
        !self.keys().is_disjoint(keys)
    }

    /// Writes every recorded grid: resources first, the owner last.
    pub fn apply<S: Store>(&self, store: &GridStore<S>) -> Result<(), StoreError> {
        for (resource, grid) in &self.resources {
            store.save_resource(resource, grid)?;
        }
        store.save_owner(&self.owner, &self.owner_grid)
    }
}

/// The persisted set of unfinished commits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    entries: BTreeMap<OwnerId, PendingWrite>,
}

impl Journal {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> impl Iterator<Item = &PendingWrite> {
        self.entries.values()
    }

    pub fn get(&self, owner: &OwnerId) -> Option<&PendingWrite> {
        self.entries.get(owner)
    }

    /// Entries writing any of `keys`.
    pub fn involving<'a>(
        &'a self,
        keys: &'a BTreeSet<StoreKey>,
    ) -> impl Iterator<Item = &'a PendingWrite> + 'a {
        self.entries().filter(move |e| e.touches(keys))
    }

    /// Grows `keys` until it contains every key of every entry it touches.
    pub fn close_over(&self, keys: &mut BTreeSet<StoreKey>) {
        loop {
            let extra: BTreeSet<StoreKey> = self
                .involving(keys)
                .flat_map(PendingWrite::keys)
                .filter(|k| !keys.contains(k))
                .collect();
            if extra.is_empty() {
                return;
            }
            keys.extend(extra);
        }
    }
}

/// Serialises read-modify-write cycles on the journal document.
#[derive(Debug, Default)]
pub struct PendingLog {
    gate: Mutex<()>,
}

impl PendingLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current journal contents.
    pub fn snapshot<S: Store>(&self, store: &GridStore<S>) -> Result<Journal, StoreError> {
        Ok(store.load(&StoreKey::Journal)?.unwrap_or_default())
    }

    /// Durably records `entry`, replacing any entry of the same owner.
    pub fn record<S: Store>(
        &self,
        store: &GridStore<S>,
        entry: PendingWrite,
    ) -> Result<(), StoreError> {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let mut journal = self.snapshot(store)?;
        journal.entries.insert(entry.owner.clone(), entry);
        store.save(&StoreKey::Journal, &journal)
    }

    /// Removes the entry of `owner`, if present.
    pub fn retire<S: Store>(
        &self,
        store: &GridStore<S>,
        owner: &OwnerId,
    ) -> Result<(), StoreError> {
        let _gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        let mut journal = self.snapshot(store)?;
        if journal.entries.remove(owner).is_none() {
            return Ok(());
        }
        if journal.is_empty() {
            store.delete(&StoreKey::Journal)
        } else {
            store.save(&StoreKey::Journal, &journal)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Booking, Cell, Slot};
    use crate::store::MemoryStore;

    fn entry(owner: &str, resources: &[&str]) -> PendingWrite {
        let slot = Slot::parse("Mon", 1).unwrap();
        PendingWrite {
            owner: owner.into(),
            owner_grid: OwnerGrid::default().with_cell(slot, Cell::new("S1")),
            resources: resources
                .iter()
                .map(|r| {
                    (
                        ResourceId::new(*r),
                        ResourceGrid::default().with_cell(slot, Some(Booking::new(owner, "S1"))),
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn test_entry_keys() {
        let e = entry("ClassA", &["F1", "L1"]);
        let keys: Vec<String> = e.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["owner/ClassA", "resource/F1", "resource/L1"]);
    }

    #[test]
    fn test_record_and_retire() {
        let store = GridStore::new(MemoryStore::new());
        let log = PendingLog::new();

        log.record(&store, entry("ClassA", &["F1"])).unwrap();
        log.record(&store, entry("ClassB", &["F2"])).unwrap();
        assert_eq!(log.snapshot(&store).unwrap().len(), 2);

        log.retire(&store, &"ClassA".into()).unwrap();
        let j = log.snapshot(&store).unwrap();
        assert_eq!(j.len(), 1);
        assert!(j.get(&"ClassB".into()).is_some());

        log.retire(&store, &"ClassB".into()).unwrap();
        assert!(store.inner().get(&StoreKey::Journal).unwrap().is_none());

        // Retiring a missing entry is a no-op.
        log.retire(&store, &"ClassB".into()).unwrap();
    }

    #[test]
    fn test_apply_writes_every_grid() {
        let store = GridStore::new(MemoryStore::new());
        let e = entry("ClassA", &["F1", "F2"]);
        e.apply(&store).unwrap();
        e.apply(&store).unwrap();

        assert_eq!(store.load_owner(&"ClassA".into()).unwrap(), Some(e.owner_grid.clone()));
        assert_eq!(
            store.load_resource(&"F2".into()).unwrap().as_ref(),
            e.resources.get(&ResourceId::new("F2"))
        );
    }

    #[test]
    fn test_close_over_follows_chains() {
        let mut journal = Journal::default();
        for e in [
            entry("ClassA", &["F1"]),
            entry("ClassB", &["F1", "F2"]),
            entry("ClassC", &["F3"]),
        ] {
            journal.entries.insert(e.owner.clone(), e);
        }

        let mut keys: BTreeSet<StoreKey> = [StoreKey::Owner("ClassA".into())].into();
        journal.close_over(&mut keys);

        assert!(keys.contains(&StoreKey::Resource("F1".into())));
        assert!(keys.contains(&StoreKey::Owner("ClassB".into())));
        assert!(keys.contains(&StoreKey::Resource("F2".into())));
        assert!(!keys.contains(&StoreKey::Resource("F3".into())));
    }
}
