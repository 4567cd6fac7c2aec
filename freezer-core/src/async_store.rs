use std::future::Future;

use crate::{RecordKey, Store};

/// Async key-value store for record bytes.
///
/// Mirrors the `Store` trait but with async methods so every store access is
/// a suspension point for the caller. Methods are prefixed with `async_` to
/// avoid name collisions when a type implements both `Store` and `AsyncStore`.
pub trait AsyncStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    fn async_get(
        &self,
        key: &RecordKey,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;
    fn async_put(
        &self,
        key: &RecordKey,
        value: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
    fn async_delete(&self, key: &RecordKey) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Batch get - default impl calls async_get() in sequence.
    fn async_get_many(
        &self,
        keys: &[RecordKey],
    ) -> impl Future<Output = Result<Vec<Option<Vec<u8>>>, Self::Error>> + Send {
        let keys = keys.to_vec();
        async move {
            let mut results = Vec::with_capacity(keys.len());
            for key in &keys {
                results.push(self.async_get(key).await?);
            }
            Ok(results)
        }
    }

    /// Batch delete - default impl calls async_delete() in sequence.
    fn async_delete_many(
        &self,
        keys: &[RecordKey],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let keys = keys.to_vec();
        async move {
            for key in &keys {
                self.async_delete(key).await?;
            }
            Ok(())
        }
    }
}

/// Blanket impl: any sync `Store` is also an `AsyncStore`.
impl<S: Store + Send + Sync> AsyncStore for S {
    type Error = S::Error;

    async fn async_get(&self, key: &RecordKey) -> Result<Option<Vec<u8>>, Self::Error> {
        self.get(key)
    }

    async fn async_put(&self, key: &RecordKey, value: &[u8]) -> Result<(), Self::Error> {
        self.put(key, value)
    }

    async fn async_delete(&self, key: &RecordKey) -> Result<(), Self::Error> {
        self.delete(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[tokio::test]
    async fn store_as_async_store_basic() {
        let store = MemoryStore::new();
        let key = RecordKey::item("test");
        let value = b"hello world";

        store.async_put(&key, value).await.unwrap();
        let retrieved = store.async_get(&key).await.unwrap();
        assert_eq!(retrieved, Some(value.to_vec()));

        store.async_delete(&key).await.unwrap();
        assert_eq!(store.async_get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn store_as_async_store_batch() {
        let store = MemoryStore::new();
        let keys: Vec<RecordKey> = ["a", "b", "c"].iter().map(|id| RecordKey::item(id)).collect();
        for (key, value) in keys.iter().zip([b"1", b"2", b"3"]) {
            store.async_put(key, value).await.unwrap();
        }

        let results = store.async_get_many(&keys).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0], Some(b"1".to_vec()));
        assert_eq!(results[2], Some(b"3".to_vec()));

        store.async_delete_many(&keys[..2]).await.unwrap();
        let results = store.async_get_many(&keys).await.unwrap();
        assert_eq!(results, vec![None, None, Some(b"3".to_vec())]);
    }
}
