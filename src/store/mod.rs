//! Durable key-value storage for grids.
//!
//! The engine treats persistence as a per-key get/put/delete byte store.
//! Every grid lives under its own key, so writes to different grids are
//! independent and a propagation can fail part-way; see
//! [`crate::scheduler::Journal`] for how that is made recoverable.
//!
//! # Backends
//!
//! - [`MemoryStore`]: process-local map.
//! - [`SqliteStore`]: one row per key in a SQLite database.
//!
//! [`GridStore`] layers typed, serde-encoded access on top of any backend.

mod grids;
mod memory;
mod sqlite;

#[cfg(test)]
pub(crate) mod testing;

pub use grids::GridStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use rusqlite::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{OwnerId, ResourceId};

/// Storage key of one document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StoreKey {
    /// Authored grid of an owner.
    Owner(OwnerId),
    /// Derived grid of a resource.
    Resource(ResourceId),
    /// Pending-write journal.
    Journal,
}

impl StoreKey {
    /// Namespace segment ("owner", "resource", "journal").
    pub fn namespace(&self) -> &'static str {
        match self {
            StoreKey::Owner(_) => "owner",
            StoreKey::Resource(_) => "resource",
            StoreKey::Journal => "journal",
        }
    }

    /// Id segment, if the key has one.
    pub fn id(&self) -> Option<&str> {
        match self {
            StoreKey::Owner(id) => Some(id.as_str()),
            StoreKey::Resource(id) => Some(id.as_str()),
            StoreKey::Journal => None,
        }
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{}/{}", self.namespace(), id),
            None => f.write_str(self.namespace()),
        }
    }
}

/// Storage failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend not reachable or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Backend did not answer in time.
    #[error("store timed out on {0}")]
    Timeout(StoreKey),
    /// Database error.
    #[error("store backend error: {0}")]
    Backend(#[from] rusqlite::Error),
    /// A stored document could not be decoded.
    #[error("corrupt document at {key}: {source}")]
    Corrupt {
        key: StoreKey,
        #[source]
        source: serde_json::Error,
    },
}

impl StoreError {
    /// Whether repeating the operation may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Unavailable(_) | StoreError::Timeout(_) => true,
            StoreError::Backend(e) => matches!(
                e.sqlite_error_code(),
                Some(
                    ErrorCode::DatabaseBusy
                        | ErrorCode::DatabaseLocked
                        | ErrorCode::SystemIoFailure
                        | ErrorCode::DiskFull
                        | ErrorCode::CannotOpen
                )
            ),
            StoreError::Corrupt { .. } => false,
        }
    }
}

/// Per-key document store.
///
/// Implementations must make a single `put` atomic for readers of that key
/// (a reader sees the old or the new value, never a mix). No atomicity
/// across keys is assumed.
pub trait Store: Send + Sync {
    /// Reads a document; `Ok(None)` if the key was never written or was deleted.
    fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError>;

    /// Writes a document, replacing any previous value.
    fn put(&self, key: &StoreKey, value: &[u8]) -> Result<(), StoreError>;

    /// Removes a document. Removing a missing key is not an error.
    fn delete(&self, key: &StoreKey) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> Store for std::sync::Arc<S> {
    fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &StoreKey, value: &[u8]) -> Result<(), StoreError> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &StoreKey) -> Result<(), StoreError> {
        (**self).delete(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        assert_eq!(StoreKey::Owner("ClassA".into()).to_string(), "owner/ClassA");
        assert_eq!(StoreKey::Resource("F1".into()).to_string(), "resource/F1");
        assert_eq!(StoreKey::Journal.to_string(), "journal");
    }

    #[test]
    fn test_owner_and_resource_keys_never_collide() {
        assert_ne!(StoreKey::Owner("L1".into()), StoreKey::Resource("L1".into()));
    }

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Unavailable("down".into()).is_transient());
        assert!(StoreError::Timeout(StoreKey::Journal).is_transient());

        let bad = serde_json::from_str::<u32>("x").unwrap_err();
        let corrupt = StoreError::Corrupt {
            key: StoreKey::Journal,
            source: bad,
        };
        assert!(!corrupt.is_transient());

        let no_rows = StoreError::Backend(rusqlite::Error::QueryReturnedNoRows);
        assert!(!no_rows.is_transient());
    }
}
