//! Conflict detection and mirrored propagation.
//!
//! Owner grids are the source of truth; resource grids mirror them. The
//! [`Orchestrator`] is the only writer and keeps two properties after every
//! successful call:
//!
//! - no resource is referenced by two owners at the same slot
//! - every owner reference has a matching resource booking, and vice versa
//!
//! # Components
//!
//! - **`detector`**: read-only slot checks and full-week conflict scans
//! - **`locks`**: all-or-nothing lock sets over grid keys
//! - **`journal`**: durable record of in-flight commits, replayed after
//!   partial failure
//! - **`orchestrator`**: validate, lock, detect, propagate
//!
//! # References
//!
//! - Coffman, Elphick & Shoshani (1971), "System Deadlocks"
//! - Gray & Reuter (1992), "Transaction Processing: Concepts and Techniques"

mod detector;
mod journal;
mod locks;
mod orchestrator;
mod propagation;
mod request;

pub use detector::{check, Conflict, ConflictDetector, SlotStatus};
pub use journal::{Journal, PendingLog, PendingWrite};
pub use locks::{LockSet, LockTable};
pub use orchestrator::Orchestrator;
pub use request::{
    Availability, AvailabilityQuery, ConflictReport, Holder, Label, LabeledBooking, LabeledCell,
    OwnerView, ResourceView, WeekSubmission,
};
