//! Slot payloads for owner and resource grids.
//!
//! An owner cell says *what is taught and by whom*; a resource booking says
//! *for whom and what* a resource is committed. Resource grids are derived
//! from owner grids and only ever written by the orchestrator.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::grid::{Grid, SlotContent};
use super::ids::{OwnerId, ResourceId, SubjectId};
use super::slot::Slot;

/// One slot of an owner's week.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub subject: Option<SubjectId>,
    pub primary: Option<ResourceId>,
    pub secondary: Option<ResourceId>,
}

impl Cell {
    /// Creates a cell teaching `subject` with no resources yet.
    pub fn new(subject: impl Into<SubjectId>) -> Self {
        Self {
            subject: Some(subject.into()),
            primary: None,
            secondary: None,
        }
    }

    /// An empty cell.
    pub fn vacant() -> Self {
        Self::default()
    }

    /// Sets the primary resource.
    pub fn with_primary(mut self, resource: impl Into<ResourceId>) -> Self {
        self.primary = Some(resource.into());
        self
    }

    /// Sets the secondary resource.
    pub fn with_secondary(mut self, resource: impl Into<ResourceId>) -> Self {
        self.secondary = Some(resource.into());
        self
    }

    /// Referenced resources, primary first.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceId> {
        self.primary.iter().chain(self.secondary.iter())
    }

    /// Whether the cell names any resource.
    pub fn has_resources(&self) -> bool {
        self.primary.is_some() || self.secondary.is_some()
    }
}

impl SlotContent for Cell {
    fn is_vacant(&self) -> bool {
        self.subject.is_none() && !self.has_resources()
    }
}

/// A resource's commitment at one slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Booking {
    pub owner: OwnerId,
    pub subject: SubjectId,
}

impl Booking {
    pub fn new(owner: impl Into<OwnerId>, subject: impl Into<SubjectId>) -> Self {
        Self {
            owner: owner.into(),
            subject: subject.into(),
        }
    }
}

/// Authored weekly grid of an owner.
pub type OwnerGrid = Grid<Cell>;

/// Derived weekly grid of a resource.
pub type ResourceGrid = Grid<Option<Booking>>;

/// One entry of a submitted week, in wire shape.
///
/// `day` and `period` stay raw here; they are parsed during validation so a
/// malformed value is reported instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekEntry {
    pub day: String,
    pub period: i64,
    #[serde(default)]
    pub subject_id: Option<SubjectId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_resource_id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_resource_id: Option<ResourceId>,
}

impl WeekEntry {
    /// Creates an entry teaching `subject` at (day, period).
    pub fn new(day: impl Into<String>, period: i64, subject: impl Into<SubjectId>) -> Self {
        Self {
            day: day.into(),
            period,
            subject_id: Some(subject.into()),
            primary_resource_id: None,
            secondary_resource_id: None,
        }
    }

    /// An explicitly empty entry.
    pub fn vacant(day: impl Into<String>, period: i64) -> Self {
        Self {
            day: day.into(),
            period,
            subject_id: None,
            primary_resource_id: None,
            secondary_resource_id: None,
        }
    }

    /// Sets the primary resource.
    pub fn with_primary(mut self, resource: impl Into<ResourceId>) -> Self {
        self.primary_resource_id = Some(resource.into());
        self
    }

    /// Sets the secondary resource.
    pub fn with_secondary(mut self, resource: impl Into<ResourceId>) -> Self {
        self.secondary_resource_id = Some(resource.into());
        self
    }

    /// Cell payload of this entry.
    pub fn cell(&self) -> Cell {
        Cell {
            subject: self.subject_id.clone(),
            primary: self.primary_resource_id.clone(),
            secondary: self.secondary_resource_id.clone(),
        }
    }
}

impl Grid<Cell> {
    /// Every resource referenced anywhere in the week.
    pub fn resources(&self) -> BTreeSet<ResourceId> {
        self.occupied()
            .flat_map(|(_, cell)| cell.resources().cloned())
            .collect()
    }

    /// Renders the non-vacant slots back into submission entries.
    pub fn to_week(&self) -> Vec<WeekEntry> {
        self.occupied()
            .map(|(slot, cell)| WeekEntry {
                day: slot.day.short_name().to_string(),
                period: i64::from(slot.period.number()),
                subject_id: cell.subject.clone(),
                primary_resource_id: cell.primary.clone(),
                secondary_resource_id: cell.secondary.clone(),
            })
            .collect()
    }
}

impl Grid<Option<Booking>> {
    /// Slots booked for `owner`.
    pub fn slots_of<'a>(&'a self, owner: &'a OwnerId) -> impl Iterator<Item = Slot> + 'a {
        self.occupied().filter_map(move |(slot, booking)| match booking {
            Some(b) if &b.owner == owner => Some(slot),
            _ => None,
        })
    }

    /// This grid with every booking for `owner` nulled.
    pub fn without_owner(&self, owner: &OwnerId) -> Self {
        self.map(|_, booking| booking.clone().filter(|b| &b.owner != owner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::slot::{Day, Period};

    fn slot(day: Day, period: i64) -> Slot {
        Slot::new(day, Period::new(period).unwrap())
    }

    #[test]
    fn test_cell_vacancy() {
        assert!(Cell::vacant().is_vacant());
        assert!(!Cell::new("S1").is_vacant());
        assert!(!Cell::vacant().with_primary("F1").is_vacant());
    }

    #[test]
    fn test_cell_resources_order() {
        let cell = Cell::new("S1").with_secondary("F2").with_primary("F1");
        let ids: Vec<&str> = cell.resources().map(|r| r.as_str()).collect();
        assert_eq!(ids, vec!["F1", "F2"]);
    }

    #[test]
    fn test_owner_grid_resources_deduplicated() {
        let grid = OwnerGrid::default()
            .with_cell(slot(Day::Mon, 1), Cell::new("S1").with_primary("F1"))
            .with_cell(
                slot(Day::Tue, 2),
                Cell::new("S2").with_primary("F1").with_secondary("L1"),
            );

        let resources: Vec<String> = grid.resources().iter().map(|r| r.to_string()).collect();
        assert_eq!(resources, vec!["F1", "L1"]);
    }

    #[test]
    fn test_to_week_skips_vacant_slots() {
        let grid = OwnerGrid::default()
            .with_cell(slot(Day::Wed, 3), Cell::new("S1").with_primary("F1"));

        let week = grid.to_week();
        assert_eq!(week, vec![WeekEntry::new("Wed", 3, "S1").with_primary("F1")]);
    }

    #[test]
    fn test_without_owner_only_touches_that_owner() {
        let a = OwnerId::new("ClassA");
        let grid = ResourceGrid::default()
            .with_cell(slot(Day::Mon, 1), Some(Booking::new("ClassA", "S1")))
            .with_cell(slot(Day::Mon, 2), Some(Booking::new("ClassB", "S2")))
            .with_cell(slot(Day::Fri, 7), Some(Booking::new("ClassA", "S3")));

        assert_eq!(grid.slots_of(&a).count(), 2);

        let cleared = grid.without_owner(&a);
        assert_eq!(cleared.slots_of(&a).count(), 0);
        assert_eq!(
            cleared.cell_at(slot(Day::Mon, 2)),
            &Some(Booking::new("ClassB", "S2"))
        );
    }

    #[test]
    fn test_week_entry_wire_shape() {
        let json = r#"{"day":"Mon","period":1,"subjectId":"S1","primaryResourceId":"F1"}"#;
        let entry: WeekEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry, WeekEntry::new("Mon", 1, "S1").with_primary("F1"));
        assert_eq!(serde_json::to_string(&entry).unwrap(), json);
    }
}
