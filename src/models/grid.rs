//! Weekly grid model.
//!
//! A `Grid<C>` holds exactly one `C` per slot of the week. Owner grids use
//! [`Cell`](super::Cell) payloads; resource grids use `Option<Booking>`.
//! Grids are plain values: `with_cell` returns an updated copy, so a
//! propagation plan can hold "before" and "after" side by side.

use serde::{Deserialize, Serialize};

use super::slot::{Slot, DAYS, PERIODS, SLOTS};

/// Payload stored in a grid slot.
pub trait SlotContent {
    /// Whether the slot holds no binding at all.
    fn is_vacant(&self) -> bool;
}

impl<T> SlotContent for Option<T> {
    fn is_vacant(&self) -> bool {
        self.is_none()
    }
}

/// A 5 × 7 weekly grid.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Grid<C> {
    days: [[C; PERIODS]; DAYS],
}

impl<C> Grid<C> {
    /// Payload at a slot.
    #[inline]
    pub fn cell_at(&self, slot: Slot) -> &C {
        &self.days[slot.day.index()][slot.period.index()]
    }

    /// Replaces the payload at a slot in place.
    pub fn set(&mut self, slot: Slot, cell: C) {
        self.days[slot.day.index()][slot.period.index()] = cell;
    }

    /// Returns this grid with one slot replaced.
    pub fn with_cell(mut self, slot: Slot, cell: C) -> Self {
        self.set(slot, cell);
        self
    }

    /// All slots with their payloads, day-major.
    pub fn iter(&self) -> impl Iterator<Item = (Slot, &C)> {
        Slot::all().map(move |slot| (slot, self.cell_at(slot)))
    }

    /// Builds a grid by evaluating `f` at every slot.
    pub fn from_fn(mut f: impl FnMut(Slot) -> C) -> Self
    where
        C: Default,
    {
        let mut grid = Self::default();
        for slot in Slot::all() {
            grid.set(slot, f(slot));
        }
        grid
    }

    /// Converts every payload, keeping positions.
    pub fn map<T: Default>(&self, mut f: impl FnMut(Slot, &C) -> T) -> Grid<T> {
        Grid::from_fn(|slot| f(slot, self.cell_at(slot)))
    }
}

impl<C: SlotContent> Grid<C> {
    /// Non-vacant slots with their payloads.
    pub fn occupied(&self) -> impl Iterator<Item = (Slot, &C)> {
        self.iter().filter(|(_, c)| !c.is_vacant())
    }

    /// Number of non-vacant slots.
    pub fn occupied_count(&self) -> usize {
        self.occupied().count()
    }

    /// Whether every slot is vacant.
    pub fn is_vacant(&self) -> bool {
        self.occupied_count() == 0
    }

    /// Share of the week in use (0.0..=1.0).
    pub fn utilization(&self) -> f64 {
        self.occupied_count() as f64 / SLOTS as f64
    }
}
