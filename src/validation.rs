//! Input validation for week submissions.
//!
//! Checks a submitted week before any store access. Detects:
//! - Unknown or out-of-scope owners
//! - Malformed days and periods
//! - The same slot submitted twice
//! - Unknown subject and resource references
//! - Resources named without a subject
//! - One resource named as both primary and secondary of a cell
//!
//! Every problem in the week is reported, not just the first.

use std::collections::HashSet;
use std::fmt;

use crate::directory::{Directory, OwnerInfo, ResourceInfo, Scope};
use crate::models::{Cell, OwnerGrid, OwnerId, ResourceId, Slot, SlotContent, WeekEntry};
use crate::scheduler::WeekSubmission;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The owner is not in the directory.
    UnknownOwner,
    /// The resource is not in the directory.
    UnknownResource,
    /// The subject is not in the directory.
    UnknownSubject,
    /// The entity exists but is outside the caller's scope.
    OutOfScope,
    /// Day is not one of Mon..Fri.
    InvalidDay,
    /// Period is not in 1..=7.
    InvalidPeriod,
    /// Two entries target the same slot.
    DuplicateSlot,
    /// A cell names resources but no subject.
    MissingSubject,
    /// A cell names the same resource twice.
    RepeatedResource,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Resolves an owner and checks it against `scope`.
pub fn check_owner(
    owner: &OwnerId,
    directory: &dyn Directory,
    scope: &Scope,
) -> Result<OwnerInfo, ValidationError> {
    let info = directory.resolve_owner(owner).ok_or_else(|| {
        ValidationError::new(
            ValidationErrorKind::UnknownOwner,
            format!("Unknown owner '{owner}'"),
        )
    })?;
    if !scope.admits(info.department.as_deref()) {
        return Err(ValidationError::new(
            ValidationErrorKind::OutOfScope,
            format!("Owner '{owner}' is outside the current scope"),
        ));
    }
    Ok(info)
}

/// Resolves a resource and checks it against `scope`.
pub fn check_resource(
    resource: &ResourceId,
    directory: &dyn Directory,
    scope: &Scope,
) -> Result<ResourceInfo, ValidationError> {
    let info = directory.resolve_resource(resource).ok_or_else(|| {
        ValidationError::new(
            ValidationErrorKind::UnknownResource,
            format!("Unknown resource '{resource}'"),
        )
    })?;
    if !scope.admits(info.department.as_deref()) {
        return Err(ValidationError::new(
            ValidationErrorKind::OutOfScope,
            format!("Resource '{resource}' is outside the current scope"),
        ));
    }
    Ok(info)
}

/// Parses an entry's coordinates.
pub fn parse_slot(day: &str, period: i64) -> Result<Slot, ValidationError> {
    let day = day.parse().map_err(|_| {
        ValidationError::new(
            ValidationErrorKind::InvalidDay,
            format!("Invalid day '{day}' (expected Mon..Fri)"),
        )
    })?;
    let period = crate::models::Period::new(period).map_err(|_| {
        ValidationError::new(
            ValidationErrorKind::InvalidPeriod,
            format!("Invalid period {period} (expected 1..=7)"),
        )
    })?;
    Ok(Slot::new(day, period))
}

/// Validates a submitted week and builds the owner grid it describes.
///
/// Checks:
/// 1. The owner exists and is visible in `scope`
/// 2. Every entry has a valid day and period
/// 3. No slot appears twice (omitted slots are vacant)
/// 4. Resources are only named together with a subject
/// 5. Every subject resolves; cells with a subject but no resources take the
///    directory's standing staffing when `auto_staff` is set
/// 6. Every resource resolves, and no cell names the same resource twice
///
/// Resources are not scope-checked here: staff and labs may serve owners of
/// other departments.
///
/// # Returns
/// The new owner grid, or every detected problem.
pub fn validate_submission(
    submission: &WeekSubmission,
    directory: &dyn Directory,
    scope: &Scope,
    auto_staff: bool,
) -> Result<OwnerGrid, Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = check_owner(&submission.owner_id, directory, scope) {
        errors.push(e);
    }

    let mut grid = OwnerGrid::default();
    let mut seen = HashSet::new();

    for entry in &submission.week {
        let slot = match parse_slot(&entry.day, entry.period) {
            Ok(slot) => slot,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };
        if !seen.insert(slot) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateSlot,
                format!("Slot {slot} submitted more than once"),
            ));
            continue;
        }

        let owner = &submission.owner_id;
        let cell = resolve_cell(owner, slot, entry, directory, auto_staff, &mut errors);
        if !cell.is_vacant() {
            grid.set(slot, cell);
        }
    }

    if errors.is_empty() {
        Ok(grid)
    } else {
        Err(errors)
    }
}

fn resolve_cell(
    owner: &OwnerId,
    slot: Slot,
    entry: &WeekEntry,
    directory: &dyn Directory,
    auto_staff: bool,
    errors: &mut Vec<ValidationError>,
) -> Cell {
    let mut cell = entry.cell();

    let Some(subject) = cell.subject.clone() else {
        if cell.has_resources() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MissingSubject,
                format!("Slot {slot} names a resource but no subject"),
            ));
        }
        return cell;
    };

    if directory.resolve_subject(&subject).is_none() {
        errors.push(ValidationError::new(
            ValidationErrorKind::UnknownSubject,
            format!("Slot {slot} references unknown subject '{subject}'"),
        ));
        return cell;
    }

    if auto_staff && !cell.has_resources() {
        if let Some(staffing) = directory.default_staffing(owner, &subject) {
            cell.primary = staffing.primary;
            cell.secondary = staffing.secondary;
        }
    }

    for resource in cell.resources() {
        if directory.resolve_resource(resource).is_none() {
            errors.push(ValidationError::new(
                ValidationErrorKind::UnknownResource,
                format!("Slot {slot} references unknown resource '{resource}'"),
            ));
        }
    }

    if cell.primary.is_some() && cell.primary == cell.secondary {
        errors.push(ValidationError::new(
            ValidationErrorKind::RepeatedResource,
            format!(
                "Slot {slot} names '{}' as both primary and secondary",
                cell.primary.as_ref().map(ResourceId::as_str).unwrap_or_default()
            ),
        ));
    }

    cell
}
