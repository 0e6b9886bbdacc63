//! Weekly timetable consistency engine.
//!
//! Keeps class, staff, and lab timetables in step. Each owner (a class or a
//! lab venue) submits a 5-day by 7-period week; every staff member or lab
//! it references gets a mirrored booking. A submission that would place one
//! resource in two owners at the same slot is rejected as a whole, with every
//! clash reported.
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Slot`, `Grid`, `Cell`, `Booking`, typed ids
//! - **`directory`**: Read-only lookups of subjects, resources, and owners,
//!   plus department `Scope`
//! - **`validation`**: Request checks run before any store access
//! - **`scheduler`**: `ConflictDetector`, `Orchestrator`, lock table, journal
//! - **`store`**: Key/value `Store` trait with in-memory and SQLite backends
//! - **`config`**: `SchedulerConfig`
//! - **`error`**: `ScheduleError` taxonomy
//!
//! # Example
//!
//! ```
//! use u_timetable::directory::{MemoryDirectory, OwnerInfo, ResourceInfo, Scope, SubjectInfo};
//! use u_timetable::models::WeekEntry;
//! use u_timetable::scheduler::{Orchestrator, WeekSubmission};
//! use u_timetable::store::MemoryStore;
//!
//! let directory = MemoryDirectory::new()
//!     .with_owner(OwnerInfo::class("ClassA", "III CSE A"))
//!     .with_owner(OwnerInfo::class("ClassB", "III CSE B"))
//!     .with_subject(SubjectInfo::new("S1", "CS301", "Operating Systems"))
//!     .with_subject(SubjectInfo::new("S2", "CS302", "Computer Networks"))
//!     .with_resource(ResourceInfo::staff("F1", "Dr. Rao"));
//! let orchestrator = Orchestrator::new(MemoryStore::new(), directory);
//!
//! let a = WeekSubmission::new("ClassA", vec![WeekEntry::new("Mon", 1, "S1").with_primary("F1")]);
//! orchestrator.submit(&a, &Scope::Global).unwrap();
//!
//! let b = WeekSubmission::new("ClassB", vec![WeekEntry::new("Mon", 1, "S2").with_primary("F1")]);
//! let err = orchestrator.submit(&b, &Scope::Global).unwrap_err();
//! assert_eq!(err.status_code(), 409);
//! assert_eq!(err.conflicts()[0].conflicting_owner_id.as_str(), "ClassA");
//! ```
//!
//! # References
//!
//! - Coffman, Elphick & Shoshani (1971), "System Deadlocks", ACM Computing Surveys 3(2)
//! - Gray & Reuter (1992), "Transaction Processing: Concepts and Techniques"

pub mod config;
pub mod directory;
pub mod error;
pub mod models;
pub mod scheduler;
pub mod store;
pub mod validation;

pub use config::SchedulerConfig;
pub use error::ScheduleError;
pub use scheduler::Orchestrator;
