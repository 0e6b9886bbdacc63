//! Typed identifiers.
//!
//! Owners, resources, and subjects each get their own newtype so a class id
//! can never be compared against a staff id by accident, and every reference
//! to the same entity compares through one `Eq` definition.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrowed string form.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self::new(id)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_id!(
    /// Identity of a schedule owner (a class, or a lab booked as a venue).
    OwnerId
);

define_id!(
    /// Identity of a consumed resource (a staff member or a lab).
    ResourceId
);

define_id!(
    /// Identity of a subject.
    SubjectId
);
