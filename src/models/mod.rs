//! Timetable domain models.
//!
//! Provides the weekly coordinate space, the grid value type, and the
//! payloads stored in owner and resource grids.
//!
//! # Owners and Resources
//!
//! | u-timetable | Meaning | Grid payload |
//! |-------------|---------|--------------|
//! | Owner | Class, or lab booked as a venue | `Cell` (subject + staff/lab) |
//! | Resource | Staff member or lab | `Option<Booking>` (owner + subject) |
//!
//! Owner grids are authored; resource grids are derived from them.

mod cell;
mod grid;
mod ids;
mod slot;

pub use cell::{Booking, Cell, OwnerGrid, ResourceGrid, WeekEntry};
pub use grid::{Grid, SlotContent};
pub use ids::{OwnerId, ResourceId, SubjectId};
pub use slot::{Day, Period, Slot, SlotParseError, DAYS, PERIODS, SLOTS};
