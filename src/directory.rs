//! Directory collaborators.
//!
//! Subjects, staff, labs, and classes are maintained elsewhere (CRUD,
//! bulk import). The engine only needs read-only lookups with a NotFound
//! outcome, plus department membership for explicit scoping.
//!
//! `MemoryDirectory` is a complete in-process implementation for
//! embedding and tests.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{OwnerId, ResourceId, SubjectId};

/// Kind of schedule owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OwnerKind {
    /// A class section.
    Class,
    /// A lab booked directly as a teaching venue.
    LabVenue,
}

/// Kind of consumed resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Staff,
    Lab,
}

/// Subject directory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectInfo {
    pub id: SubjectId,
    /// Catalogue code (e.g., "CS301").
    pub code: String,
    pub name: String,
    /// Short display form; derived from the name when absent.
    pub acronym: Option<String>,
    pub department: Option<String>,
}

/// Staff or lab directory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceInfo {
    pub id: ResourceId,
    pub kind: ResourceKind,
    pub name: String,
    pub department: Option<String>,
}

/// Class or venue directory record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerInfo {
    pub id: OwnerId,
    pub kind: OwnerKind,
    pub name: String,
    pub department: Option<String>,
}

/// Standing staffing of a subject for one owner.
///
/// Used to fill cells that name a subject but no resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staffing {
    pub primary: Option<ResourceId>,
    pub secondary: Option<ResourceId>,
}

/// Read-only directory lookups. `None` means NotFound.
pub trait Directory: Send + Sync {
    fn resolve_subject(&self, id: &SubjectId) -> Option<SubjectInfo>;

    fn resolve_resource(&self, id: &ResourceId) -> Option<ResourceInfo>;

    fn resolve_owner(&self, id: &OwnerId) -> Option<OwnerInfo>;

    /// Standing staffing for `subject` in `owner`, if any.
    fn default_staffing(&self, _owner: &OwnerId, _subject: &SubjectId) -> Option<Staffing> {
        None
    }
}

/// Visibility scope threaded through every call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scope {
    /// Organisation-wide access.
    #[default]
    Global,
    /// Only entities of one department.
    Department(String),
}

impl Scope {
    pub fn department(name: impl Into<String>) -> Self {
        Self::Department(name.into())
    }

    /// Whether an entity in `department` is visible.
    pub fn admits(&self, department: Option<&str>) -> bool {
        match self {
            Scope::Global => true,
            Scope::Department(d) => department == Some(d.as_str()),
        }
    }
}

impl SubjectInfo {
    pub fn new(id: impl Into<SubjectId>, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            code: code.into(),
            name: name.into(),
            acronym: None,
            department: None,
        }
    }

    pub fn with_acronym(mut self, acronym: impl Into<String>) -> Self {
        self.acronym = Some(acronym.into());
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    /// Short label: the acronym, else the initials of the name, else the code.
    pub fn label(&self) -> String {
        if let Some(a) = self.acronym.as_deref().filter(|a| !a.trim().is_empty()) {
            return a.to_string();
        }
        let initials: String = self
            .name
            .split_whitespace()
            .filter_map(|w| w.chars().next())
            .flat_map(char::to_uppercase)
            .collect();
        if initials.is_empty() {
            self.code.clone()
        } else {
            initials
        }
    }
}

impl ResourceInfo {
    pub fn new(id: impl Into<ResourceId>, kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            department: None,
        }
    }

    pub fn staff(id: impl Into<ResourceId>, name: impl Into<String>) -> Self {
        Self::new(id, ResourceKind::Staff, name)
    }

    pub fn lab(id: impl Into<ResourceId>, name: impl Into<String>) -> Self {
        Self::new(id, ResourceKind::Lab, name)
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }
}

impl OwnerInfo {
    pub fn new(id: impl Into<OwnerId>, kind: OwnerKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
            department: None,
        }
    }

    pub fn class(id: impl Into<OwnerId>, name: impl Into<String>) -> Self {
        Self::new(id, OwnerKind::Class, name)
    }

    pub fn lab_venue(id: impl Into<OwnerId>, name: impl Into<String>) -> Self {
        Self::new(id, OwnerKind::LabVenue, name)
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }
}

/// In-memory directory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    subjects: HashMap<SubjectId, SubjectInfo>,
    resources: HashMap<ResourceId, ResourceInfo>,
    owners: HashMap<OwnerId, OwnerInfo>,
    staffing: HashMap<(OwnerId, SubjectId), Staffing>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subject.
    pub fn with_subject(mut self, subject: SubjectInfo) -> Self {
        self.subjects.insert(subject.id.clone(), subject);
        self
    }

    /// Adds a staff member or lab.
    pub fn with_resource(mut self, resource: ResourceInfo) -> Self {
        self.resources.insert(resource.id.clone(), resource);
        self
    }

    /// Adds a class or venue.
    pub fn with_owner(mut self, owner: OwnerInfo) -> Self {
        self.owners.insert(owner.id.clone(), owner);
        self
    }

    /// Records who normally teaches `subject` for `owner`.
    pub fn with_staffing(
        mut self,
        owner: impl Into<OwnerId>,
        subject: impl Into<SubjectId>,
        staffing: Staffing,
    ) -> Self {
        self.staffing.insert((owner.into(), subject.into()), staffing);
        self
    }
}

impl Directory for MemoryDirectory {
    fn resolve_subject(&self, id: &SubjectId) -> Option<SubjectInfo> {
        self.subjects.get(id).cloned()
    }

    fn resolve_resource(&self, id: &ResourceId) -> Option<ResourceInfo> {
        self.resources.get(id).cloned()
    }

    fn resolve_owner(&self, id: &OwnerId) -> Option<OwnerInfo> {
        self.owners.get(id).cloned()
    }

    fn default_staffing(&self, owner: &OwnerId, subject: &SubjectId) -> Option<Staffing> {
        self.staffing
            .get(&(owner.clone(), subject.clone()))
            .cloned()
    }
}
