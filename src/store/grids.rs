//! Typed grid access over a byte store.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::{Store, StoreError, StoreKey};
use crate::models::{OwnerGrid, OwnerId, ResourceGrid, ResourceId};

/// Serde-encoded access to owner grids, resource grids, and other documents.
#[derive(Debug)]
pub struct GridStore<S> {
    inner: S,
}

impl<S: Store> GridStore<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    /// Underlying byte store.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Reads and decodes a document.
    pub fn load<T: DeserializeOwned>(&self, key: &StoreKey) -> Result<Option<T>, StoreError> {
        match self.inner.get(key)? {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| StoreError::Corrupt {
                    key: key.clone(),
                    source,
                }),
        }
    }

    /// Encodes and writes a document.
    pub fn save<T: Serialize>(&self, key: &StoreKey, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value).map_err(|source| StoreError::Corrupt {
            key: key.clone(),
            source,
        })?;
        self.inner.put(key, &bytes)
    }

    pub fn delete(&self, key: &StoreKey) -> Result<(), StoreError> {
        self.inner.delete(key)
    }

    /// Owner grid; `None` if the owner was never scheduled.
    pub fn load_owner(&self, owner: &OwnerId) -> Result<Option<OwnerGrid>, StoreError> {
        self.load(&StoreKey::Owner(owner.clone()))
    }

    pub fn save_owner(&self, owner: &OwnerId, grid: &OwnerGrid) -> Result<(), StoreError> {
        self.save(&StoreKey::Owner(owner.clone()), grid)
    }

    /// Resource grid; `None` if the resource was never referenced.
    pub fn load_resource(&self, resource: &ResourceId) -> Result<Option<ResourceGrid>, StoreError> {
        self.load(&StoreKey::Resource(resource.clone()))
    }

    pub fn save_resource(
        &self,
        resource: &ResourceId,
        grid: &ResourceGrid,
    ) -> Result<(), StoreError> {
        self.save(&StoreKey::Resource(resource.clone()), grid)
    }
}
