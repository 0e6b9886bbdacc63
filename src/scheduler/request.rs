//! Request and response shapes of the orchestrator.

use serde::{Deserialize, Serialize};

use super::Conflict;
use crate::directory::{Directory, ResourceKind};
use crate::models::{Grid, OwnerId, ResourceId, SubjectId, WeekEntry};

/// A full-week submission for one owner.
///
/// Slots not listed are explicitly vacant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSubmission {
    pub owner_id: OwnerId,
    #[serde(default)]
    pub week: Vec<WeekEntry>,
}

impl WeekSubmission {
    pub fn new(owner: impl Into<OwnerId>, week: Vec<WeekEntry>) -> Self {
        Self {
            owner_id: owner.into(),
            week,
        }
    }
}

/// Rejection body: every clash of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub conflicts: Vec<Conflict>,
}

/// Single-slot availability question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub resource_id: ResourceId,
    pub day: String,
    pub period: i64,
    /// Bookings of this owner do not count as taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluding_owner_id: Option<OwnerId>,
}

impl AvailabilityQuery {
    pub fn new(resource: impl Into<ResourceId>, day: impl Into<String>, period: i64) -> Self {
        Self {
            resource_id: resource.into(),
            day: day.into(),
            period,
            excluding_owner_id: None,
        }
    }

    pub fn excluding(mut self, owner: impl Into<OwnerId>) -> Self {
        self.excluding_owner_id = Some(owner.into());
        self
    }
}

/// Who holds a slot that was asked about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holder {
    pub owner_id: OwnerId,
    pub subject_id: SubjectId,
    pub owner_label: String,
    pub subject_label: String,
}

/// Answer to an [`AvailabilityQuery`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub free: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conflict: Option<Holder>,
}

/// A reference rendered for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub text: String,
}

/// Owner cell with resolved labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledCell {
    pub subject: Option<Label>,
    pub primary: Option<Label>,
    pub secondary: Option<Label>,
}

/// Resource booking with resolved labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledBooking {
    pub owner: Label,
    pub subject: Label,
}

/// Display form of an owner's week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerView {
    pub owner: Label,
    pub grid: Grid<LabeledCell>,
}

/// Display form of a resource's week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceView {
    pub resource: Label,
    pub kind: ResourceKind,
    pub grid: Grid<Option<LabeledBooking>>,
    /// Share of the week committed.
    pub utilization: f64,
}

/// Resolves ids to labels; unknown ids render as themselves.
pub(crate) struct Labeler<'a> {
    directory: &'a dyn Directory,
}

impl<'a> Labeler<'a> {
    pub(crate) fn new(directory: &'a dyn Directory) -> Self {
        Self { directory }
    }

    pub(crate) fn subject(&self, id: &SubjectId) -> Label {
        Label {
            id: id.to_string(),
            text: self
                .directory
                .resolve_subject(id)
                .map(|s| s.label())
                .unwrap_or_else(|| id.to_string()),
        }
    }

    pub(crate) fn resource(&self, id: &ResourceId) -> Label {
        Label {
            id: id.to_string(),
            text: self
                .directory
                .resolve_resource(id)
                .map(|r| r.name)
                .unwrap_or_else(|| id.to_string()),
        }
    }

    pub(crate) fn owner(&self, id: &OwnerId) -> Label {
        Label {
            id: id.to_string(),
            text: self
                .directory
                .resolve_owner(id)
                .map(|o| o.name)
                .unwrap_or_else(|| id.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{MemoryDirectory, SubjectInfo};

    #[test]
    fn test_submission_wire_shape() {
        let json = r#"{
            "ownerId": "ClassA",
            "week": [{"day": "Mon", "period": 1, "subjectId": "S1", "primaryResourceId": "F1"}]
        }"#;
        let sub: WeekSubmission = serde_json::from_str(json).unwrap();
        assert_eq!(
            sub,
            WeekSubmission::new("ClassA", vec![WeekEntry::new("Mon", 1, "S1").with_primary("F1")])
        );
    }

    #[test]
    fn test_availability_wire_shape() {
        let free = Availability {
            free: true,
            conflict: None,
        };
        assert_eq!(serde_json::to_string(&free).unwrap(), r#"{"free":true}"#);

        let q: AvailabilityQuery =
            serde_json::from_str(r#"{"resourceId":"F1","day":"Mon","period":2}"#).unwrap();
        assert_eq!(q, AvailabilityQuery::new("F1", "Mon", 2));
    }

    #[test]
    fn test_labeler_falls_back_to_id() {
        let dir = MemoryDirectory::new()
            .with_subject(SubjectInfo::new("S1", "CS301", "Operating Systems"));
        let labels = Labeler::new(&dir);

        assert_eq!(labels.subject(&"S1".into()).text, "OS");
        assert_eq!(labels.subject(&"S9".into()).text, "S9");
        assert_eq!(labels.owner(&"ClassA".into()).text, "ClassA");
    }
}
