//! Propagation planning.
//!
//! Turns an accepted owner week into the resource-grid writes that keep
//! every resource grid mirroring it. Writes happen in two phases:
//!
//! 1. **Clear**: every resource that loses bookings of the owner gets its
//!    cleared state written.
//! 2. **Bind**: every resource that gains bookings gets its final state.
//!
//! The owner grid is written last. Grids whose final state equals the
//! stored state are not written at all, so resubmitting an identical week
//! writes nothing.

use std::collections::BTreeMap;
use tracing::debug;

use super::journal::PendingWrite;
use crate::models::{Booking, OwnerGrid, OwnerId, ResourceGrid, ResourceId, Slot};
use crate::store::{GridStore, Store, StoreError};

#[derive(Debug)]
pub(crate) struct Propagation {
    owner: OwnerId,
    owner_grid: OwnerGrid,
    write_owner: bool,
    clearing: Vec<(ResourceId, ResourceGrid)>,
    binding: Vec<(ResourceId, ResourceGrid)>,
    finals: BTreeMap<ResourceId, ResourceGrid>,
}

impl Propagation {
    /// Plans the writes taking `owner` from `previous` to `week`.
    ///
    /// `loaded` must hold the stored grid (or `None`) of every resource
    /// referenced by either week.
    pub(crate) fn plan(
        owner: &OwnerId,
        previous: Option<&OwnerGrid>,
        week: &OwnerGrid,
        loaded: BTreeMap<ResourceId, Option<ResourceGrid>>,
    ) -> Self {
        let mut bookings: BTreeMap<ResourceId, Vec<(Slot, Booking)>> = BTreeMap::new();
        for (slot, cell) in week.occupied() {
            let Some(subject) = &cell.subject else {
                continue;
            };
            for resource in cell.resources() {
                bookings
                    .entry(resource.clone())
                    .or_default()
                    .push((slot, Booking::new(owner.clone(), subject.clone())));
            }
        }

        let mut clearing = Vec::new();
        let mut binding = Vec::new();
        let mut finals = BTreeMap::new();

        for (resource, stored) in loaded {
            let before = stored.unwrap_or_default();
            let cleared = before.without_owner(owner);
            let mut after = cleared.clone();
            for (slot, booking) in bookings.remove(&resource).unwrap_or_default() {
                after.set(slot, Some(booking));
            }

            if after == before {
                continue;
            }
            if cleared != before {
                clearing.push((resource.clone(), cleared.clone()));
            }
            if after != cleared {
                binding.push((resource.clone(), after.clone()));
            }
            finals.insert(resource, after);
        }
        debug_assert!(bookings.is_empty(), "resource grids missing from plan");

        Self {
            owner: owner.clone(),
            owner_grid: week.clone(),
            write_owner: previous != Some(week),
            clearing,
            binding,
            finals,
        }
    }

    /// Whether the stored state already matches.
    pub(crate) fn is_noop(&self) -> bool {
        self.finals.is_empty() && !self.write_owner
    }

    /// Number of resource grids whose state changes.
    pub(crate) fn touched(&self) -> usize {
        self.finals.len()
    }

    /// Journal entry describing the final state of every written grid.
    pub(crate) fn pending(&self) -> PendingWrite {
        PendingWrite {
            owner: self.owner.clone(),
            owner_grid: self.owner_grid.clone(),
            resources: self.finals.clone(),
        }
    }

    /// Runs both phases, then writes the owner grid.
    pub(crate) fn apply<S: Store>(&self, store: &GridStore<S>) -> Result<(), StoreError> {
        for (resource, grid) in &self.clearing {
            debug!(owner = %self.owner, %resource, "clearing stale bookings");
            store.save_resource(resource, grid)?;
        }
        for (resource, grid) in &self.binding {
            debug!(owner = %self.owner, %resource, "writing bookings");
            store.save_resource(resource, grid)?;
        }
        if self.write_owner {
            store.save_owner(&self.owner, &self.owner_grid)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Cell;
    use crate::store::MemoryStore;

    fn slot(day: &str, period: i64) -> Slot {
        Slot::parse(day, period).unwrap()
    }

    fn owner() -> OwnerId {
        OwnerId::new("ClassA")
    }

    /// ClassA teaching S1 with F1 at one slot.
    fn taught(day: &str, period: i64) -> OwnerGrid {
        OwnerGrid::default().with_cell(slot(day, period), Cell::new("S1").with_primary("F1"))
    }

    /// F1 booked by ClassA for S1 at one slot.
    fn booked(day: &str, period: i64) -> ResourceGrid {
        ResourceGrid::default().with_cell(slot(day, period), Some(Booking::new("ClassA", "S1")))
    }

    #[test]
    fn test_first_commit_binds_only() {
        let week = taught("Mon", 1);
        let loaded = [(ResourceId::new("F1"), None)].into_iter().collect();

        let p = Propagation::plan(&owner(), None, &week, loaded);
        assert!(p.clearing.is_empty());
        assert_eq!(p.binding.len(), 1);
        assert!(p.write_owner);
        assert_eq!(p.touched(), 1);
    }

    #[test]
    fn test_identical_week_is_noop() {
        let week = taught("Mon", 1);
        let f1 = booked("Mon", 1);
        let loaded = [(ResourceId::new("F1"), Some(f1))].into_iter().collect();

        let p = Propagation::plan(&owner(), Some(&week), &week, loaded);
        assert!(p.is_noop());
    }

    #[test]
    fn test_moved_booking_clears_then_binds() {
        let old = taught("Mon", 1);
        let new = taught("Tue", 2);
        let f1 = booked("Mon", 1).with_cell(slot("Mon", 2), Some(Booking::new("ClassB", "S2")));
        let loaded = [(ResourceId::new("F1"), Some(f1))].into_iter().collect();

        let p = Propagation::plan(&owner(), Some(&old), &new, loaded);
        assert_eq!(p.clearing.len(), 1);
        assert_eq!(p.binding.len(), 1);

        let store = GridStore::new(MemoryStore::new());
        p.apply(&store).unwrap();
        let f1 = store.load_resource(&"F1".into()).unwrap().unwrap();
        assert_eq!(f1.cell_at(slot("Mon", 1)), &None);
        assert_eq!(f1.cell_at(slot("Tue", 2)), &Some(Booking::new("ClassA", "S1")));
        assert_eq!(f1.cell_at(slot("Mon", 2)), &Some(Booking::new("ClassB", "S2")));
        assert_eq!(store.load_owner(&owner()).unwrap(), Some(new));
    }

    #[test]
    fn test_dropped_resource_only_clears() {
        let old = taught("Mon", 1);
        let new = OwnerGrid::default();
        let f1 = booked("Mon", 1);
        let loaded = [(ResourceId::new("F1"), Some(f1))].into_iter().collect();

        let p = Propagation::plan(&owner(), Some(&old), &new, loaded);
        assert_eq!(p.clearing.len(), 1);
        assert!(p.binding.is_empty());
        assert_eq!(p.pending().resources[&ResourceId::new("F1")], ResourceGrid::default());
    }
}
