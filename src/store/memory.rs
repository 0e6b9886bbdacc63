//! In-memory store.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use super::{Store, StoreError, StoreKey};

/// Process-local store backed by a map.
#[derive(Debug, Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<StoreKey, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.docs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored keys, sorted.
    pub fn keys(&self) -> Vec<StoreKey> {
        let mut keys: Vec<StoreKey> = self
            .docs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>, StoreError> {
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(docs.get(key).cloned())
    }

    fn put(&self, key: &StoreKey, value: &[u8]) -> Result<(), StoreError> {
        let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
        docs.insert(key.clone(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &StoreKey) -> Result<(), StoreError> {
        let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
        docs.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_get_delete() {
        let store = MemoryStore::new();
        let key = StoreKey::Owner("ClassA".into());

        assert!(store.get(&key).unwrap().is_none());
        store.put(&key, b"one").unwrap();
        store.put(&key, b"two").unwrap();
        assert_eq!(store.get(&key).unwrap().as_deref(), Some(&b"two"[..]));
        assert_eq!(store.len(), 1);

        store.delete(&key).unwrap();
        store.delete(&key).unwrap();
        assert!(store.get(&key).unwrap().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_keys_sorted() {
        let store = MemoryStore::new();
        store.put(&StoreKey::Resource("F2".into()), b"").unwrap();
        store.put(&StoreKey::Owner("ClassA".into()), b"").unwrap();
        store.put(&StoreKey::Resource("F1".into()), b"").unwrap();

        assert_eq!(
            store.keys(),
            vec![
                StoreKey::Owner("ClassA".into()),
                StoreKey::Resource("F1".into()),
                StoreKey::Resource("F2".into()),
            ]
        );
    }
}
