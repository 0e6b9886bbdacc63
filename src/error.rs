//! Engine error taxonomy.
//!
//! | Variant | Retry? | Status |
//! |---------|--------|--------|
//! | `Validation` | no | 400 / 403 / 404 |
//! | `Conflict` | no, change the request | 409 |
//! | `StoreUnavailable` | yes, whole submission | 503 |
//! | `PropagationIncomplete` | yes, whole submission | 503 |
//! | `Busy` | yes | 503 |

use crate::models::OwnerId;
use crate::scheduler::{Conflict, ConflictReport};
use crate::store::StoreError;
use crate::validation::{ValidationError, ValidationErrorKind};

/// Failure of an orchestrator operation.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// The request is malformed or references unknown entities.
    /// Rejected before any store access.
    #[error("invalid request: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),

    /// Committing would double-book at least one resource.
    /// Carries every clash of the submission.
    #[error("{} scheduling conflict(s)", .0.len())]
    Conflict(Vec<Conflict>),

    /// The store failed before anything was written.
    #[error(transparent)]
    StoreUnavailable(#[from] StoreError),

    /// Some touched grids were written, some not. The intended state is
    /// journaled and is replayed on the next access to any involved grid.
    #[error("propagation for owner {owner} did not complete: {source}")]
    PropagationIncomplete {
        owner: OwnerId,
        #[source]
        source: StoreError,
    },

    /// Timed out waiting for another submission to release shared grids.
    #[error("timed out after {waited_ms} ms waiting for {keys} grid lock(s)")]
    Busy { waited_ms: u64, keys: usize },
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<ValidationError> for ScheduleError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(vec![error])
    }
}

impl ScheduleError {
    /// Whether repeating the same request unchanged may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScheduleError::Validation(_) | ScheduleError::Conflict(_) => false,
            ScheduleError::StoreUnavailable(e) => e.is_transient(),
            ScheduleError::PropagationIncomplete { .. } | ScheduleError::Busy { .. } => true,
        }
    }

    /// HTTP-style status code.
    ///
    /// Validation failures that only name missing ids (owner, resource or
    /// subject) are 404.
    pub fn status_code(&self) -> u16 {
        match self {
            ScheduleError::Validation(errors) => {
                let only = |kind: &[ValidationErrorKind]| {
                    errors.iter().all(|e| kind.contains(&e.kind))
                };
                if only(&[
                    ValidationErrorKind::UnknownOwner,
                    ValidationErrorKind::UnknownResource,
                    ValidationErrorKind::UnknownSubject,
                ]) {
                    404
                } else if only(&[ValidationErrorKind::OutOfScope]) {
                    403
                } else {
                    400
                }
            }
            ScheduleError::Conflict(_) => 409,
            ScheduleError::StoreUnavailable(e) if !e.is_transient() => 500,
            ScheduleError::StoreUnavailable(_)
            | ScheduleError::PropagationIncomplete { .. }
            | ScheduleError::Busy { .. } => 503,
        }
    }

    /// Rejection body for a conflict; `None` for other errors.
    pub fn report(&self) -> Option<ConflictReport> {
        match self {
            ScheduleError::Conflict(c) => Some(ConflictReport {
                conflicts: c.clone(),
            }),
            _ => None,
        }
    }

    /// Conflicts carried by a rejection; empty for other errors.
    pub fn conflicts(&self) -> &[Conflict] {
        match self {
            ScheduleError::Conflict(c) => c,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Slot;
    use crate::store::StoreKey;

    fn validation(kind: ValidationErrorKind) -> ValidationError {
        ValidationError {
            kind,
            message: "x".into(),
        }
    }

    #[test]
    fn test_status_codes() {
        let conflict = Conflict {
            slot: Slot::parse("Mon", 1).unwrap(),
            resource_id: "F1".into(),
            conflicting_owner_id: "ClassA".into(),
            conflicting_subject_id: "S1".into(),
        };
        assert_eq!(ScheduleError::Conflict(vec![conflict]).status_code(), 409);
        assert_eq!(
            ScheduleError::from(validation(ValidationErrorKind::UnknownOwner)).status_code(),
            404
        );
        assert_eq!(
            ScheduleError::from(validation(ValidationErrorKind::OutOfScope)).status_code(),
            403
        );
        assert_eq!(
            ScheduleError::Validation(vec![
                validation(ValidationErrorKind::UnknownOwner),
                validation(ValidationErrorKind::InvalidDay),
            ])
            .status_code(),
            400
        );
        assert_eq!(ScheduleError::Busy { waited_ms: 1, keys: 1 }.status_code(), 503);
    }

    #[test]
    fn test_unknown_references_are_not_found() {
        assert_eq!(
            ScheduleError::from(validation(ValidationErrorKind::UnknownSubject)).status_code(),
            404
        );
        assert_eq!(
            ScheduleError::Validation(vec![
                validation(ValidationErrorKind::UnknownSubject),
                validation(ValidationErrorKind::UnknownResource),
            ])
            .status_code(),
            404
        );
    }

    #[test]
    fn test_conflict_report_body() {
        let err = ScheduleError::Conflict(vec![Conflict {
            slot: Slot::parse("Mon", 1).unwrap(),
            resource_id: "F1".into(),
            conflicting_owner_id: "ClassA".into(),
            conflicting_subject_id: "S1".into(),
        }]);
        let body = serde_json::to_string(&err.report().unwrap()).unwrap();
        assert_eq!(
            body,
            concat!(
                r#"{"conflicts":[{"day":"Mon","period":1,"resourceId":"F1","#,
                r#""conflictingOwnerId":"ClassA","conflictingSubjectId":"S1"}]}"#
            )
        );

        assert!(ScheduleError::Busy { waited_ms: 1, keys: 1 }.report().is_none());
    }

    #[test]
    fn test_retryability() {
        assert!(!ScheduleError::Conflict(vec![]).is_retryable());
        assert!(!ScheduleError::from(validation(ValidationErrorKind::InvalidDay)).is_retryable());
        assert!(ScheduleError::from(StoreError::Timeout(StoreKey::Journal)).is_retryable());
        assert!(ScheduleError::PropagationIncomplete {
            owner: "ClassA".into(),
            source: StoreError::Unavailable("down".into()),
        }
        .is_retryable());
    }

    #[test]
    fn test_validation_message_lists_every_problem() {
        let err = ScheduleError::Validation(vec![
            ValidationError {
                kind: ValidationErrorKind::InvalidDay,
                message: "Invalid day 'Sun'".into(),
            },
            ValidationError {
                kind: ValidationErrorKind::UnknownSubject,
                message: "unknown subject 'S9'".into(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "invalid request: Invalid day 'Sun'; unknown subject 'S9'"
        );
    }
}
