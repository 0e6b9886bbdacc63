//! Conflict detection.
//!
//! Decides, for one (resource, slot) and a requesting owner, whether the
//! resource is free there. Identity based: bookings are compared by typed
//! owner id, never by display name.
//!
//! The detector only reads. A full week is scanned cell by cell and every
//! clash is collected before anything is written.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::{OwnerGrid, OwnerId, ResourceGrid, ResourceId, Slot, SubjectId};
use crate::store::{GridStore, Store, StoreError};

/// A resource already bound to a different owner at a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    #[serde(flatten)]
    pub slot: Slot,
    pub resource_id: ResourceId,
    pub conflicting_owner_id: OwnerId,
    pub conflicting_subject_id: SubjectId,
}

/// Outcome of checking one slot of one resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotStatus {
    /// Nothing booked.
    Free,
    /// Booked by the requesting owner; re-assigning is a no-op.
    OwnedBySelf,
    /// Booked by someone else.
    Conflict(Conflict),
}

impl SlotStatus {
    pub fn is_conflict(&self) -> bool {
        matches!(self, SlotStatus::Conflict(_))
    }
}

/// Checks one slot of a resource grid.
///
/// An absent grid means the resource was never referenced, so it is free.
/// With `requesting = None` any booking counts as a conflict.
pub fn check(
    grid: Option<&ResourceGrid>,
    resource: &ResourceId,
    slot: Slot,
    requesting: Option<&OwnerId>,
) -> SlotStatus {
    let Some(booking) = grid.and_then(|g| g.cell_at(slot).as_ref()) else {
        return SlotStatus::Free;
    };
    if requesting == Some(&booking.owner) {
        return SlotStatus::OwnedBySelf;
    }
    SlotStatus::Conflict(Conflict {
        slot,
        resource_id: resource.clone(),
        conflicting_owner_id: booking.owner.clone(),
        conflicting_subject_id: booking.subject.clone(),
    })
}

/// Store-backed detector that loads each resource grid at most once.
#[derive(Debug)]
pub struct ConflictDetector<'a, S> {
    store: &'a GridStore<S>,
    loaded: BTreeMap<ResourceId, Option<ResourceGrid>>,
}

impl<'a, S: Store> ConflictDetector<'a, S> {
    pub fn new(store: &'a GridStore<S>) -> Self {
        Self {
            store,
            loaded: BTreeMap::new(),
        }
    }

    fn grid(&mut self, resource: &ResourceId) -> Result<Option<&ResourceGrid>, StoreError> {
        if !self.loaded.contains_key(resource) {
            let grid = self.store.load_resource(resource)?;
            self.loaded.insert(resource.clone(), grid);
        }
        Ok(self.loaded.get(resource).and_then(Option::as_ref))
    }

    /// Checks one (resource, slot) for `requesting`.
    pub fn check(
        &mut self,
        resource: &ResourceId,
        slot: Slot,
        requesting: Option<&OwnerId>,
    ) -> Result<SlotStatus, StoreError> {
        let grid = self.grid(resource)?;
        Ok(check(grid, resource, slot, requesting))
    }

    /// Checks every resource reference of every occupied cell of `week`
    /// on behalf of `owner` and returns all conflicts, in week order.
    pub fn scan(&mut self, owner: &OwnerId, week: &OwnerGrid) -> Result<Vec<Conflict>, StoreError> {
        let mut conflicts = Vec::new();
        for (slot, cell) in week.occupied() {
            for resource in cell.resources() {
                match self.check(resource, slot, Some(owner))? {
                    SlotStatus::Conflict(c) => {
                        let holder = &c.conflicting_owner_id;
                        debug!(%owner, %resource, %slot, %holder, "slot taken");
                        conflicts.push(c);
                    }
                    SlotStatus::OwnedBySelf | SlotStatus::Free => {}
                }
            }
        }
        Ok(conflicts)
    }

    /// Makes sure `resource` is loaded without checking anything.
    pub fn preload(&mut self, resource: &ResourceId) -> Result<(), StoreError> {
        self.grid(resource).map(|_| ())
    }

    /// Grids read so far (`None` = never stored).
    pub fn into_loaded(self) -> BTreeMap<ResourceId, Option<ResourceGrid>> {
        self.loaded
    }
}
