use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, PoisonError, RwLock};

use crate::RecordKey;

/// A simple key-value store for record bytes.
///
/// Stores operate on raw bytes — encoding and decoding of items is handled
/// by the repository. Stores have no knowledge of items, the index or the
/// cache.
///
/// All methods take `&self` to support stores with internal locking (e.g., RocksDB).
pub trait Store {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Retrieves the bytes associated with a key, or None if not present.
    fn get(&self, key: &RecordKey) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Stores bytes at the given key, overwriting any previous value.
    fn put(&self, key: &RecordKey, value: &[u8]) -> Result<(), Self::Error>;

    /// Removes a key. Removing a missing key is not an error.
    fn delete(&self, key: &RecordKey) -> Result<(), Self::Error>;
}

impl<S: Store + ?Sized> Store for &S {
    type Error = S::Error;

    fn get(&self, key: &RecordKey) -> Result<Option<Vec<u8>>, Self::Error> {
        (**self).get(key)
    }

    fn put(&self, key: &RecordKey, value: &[u8]) -> Result<(), Self::Error> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &RecordKey) -> Result<(), Self::Error> {
        (**self).delete(key)
    }
}

impl<S: Store + ?Sized> Store for Arc<S> {
    type Error = S::Error;

    fn get(&self, key: &RecordKey) -> Result<Option<Vec<u8>>, Self::Error> {
        (**self).get(key)
    }

    fn put(&self, key: &RecordKey, value: &[u8]) -> Result<(), Self::Error> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &RecordKey) -> Result<(), Self::Error> {
        (**self).delete(key)
    }
}

/// An in-memory store backed by a HashMap.
///
/// Useful for testing and for sessions that do not need durability.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<HashMap<RecordKey, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held, index record included.
    pub fn len(&self) -> usize {
        self.data.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    type Error = Infallible;

    fn get(&self, key: &RecordKey) -> Result<Option<Vec<u8>>, Self::Error> {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        Ok(data.get(key).cloned())
    }

    fn put(&self, key: &RecordKey, value: &[u8]) -> Result<(), Self::Error> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.insert(key.clone(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &RecordKey) -> Result<(), Self::Error> {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        data.remove(key);
        Ok(())
    }
}
