//! The single gateway for item persistence.
//!
//! [`Repository`] owns an in-memory cache of every known item and keeps it
//! in step with the backing store: a write or delete only reaches the cache
//! after the store accepted it. The cache is hydrated lazily on the first
//! operation and never bypassed afterwards.

use indexmap::IndexMap;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::async_store::AsyncStore;
use crate::codec::{ItemIndex, decode_index, decode_item, encode_index, encode_item};
use crate::error::{FreezerError, Mutation};
use crate::fault::{FaultDecision, FaultPolicy};
use crate::item::{Item, ItemId, Location};
use crate::key::RecordKey;

/// Lifecycle of the repository cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initializing,
    Ready,
}

struct CacheState {
    phase: Phase,
    items: IndexMap<ItemId, Item>,
}

/// Cached item repository over an async key-value store.
///
/// Store access is serialized through an async mutex. The fault delay runs
/// before the mutex is taken, so a pending simulated failure never blocks
/// other operations.
pub struct Repository<S> {
    store: S,
    policy: FaultPolicy,
    state: Mutex<CacheState>,
}

impl<S: AsyncStore> Repository<S> {
    pub fn new(store: S, policy: FaultPolicy) -> Self {
        Repository {
            store,
            policy,
            state: Mutex::new(CacheState {
                phase: Phase::Uninitialized,
                items: IndexMap::new(),
            }),
        }
    }

    pub fn policy(&self) -> &FaultPolicy {
        &self.policy
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    /// Number of items currently held in the cache.
    pub async fn cached_len(&self) -> usize {
        self.state.lock().await.items.len()
    }

    /// Stores a new item.
    #[instrument(skip(self, item), fields(id = %item.id))]
    pub async fn create(&self, item: &Item) -> Result<(), FreezerError> {
        item.validate()?;
        self.check_fault(Mutation::Create).await?;

        let mut state = self.state.lock().await;
        self.ensure_ready(&mut state).await?;
        self.write_through(&mut state, item.clone()).await?;
        debug!("item created");
        Ok(())
    }

    /// Overwrites an item. An existing record keeps its original `added_at`.
    #[instrument(skip(self, item), fields(id = %item.id))]
    pub async fn update(&self, item: &Item) -> Result<(), FreezerError> {
        item.validate()?;
        self.check_fault(Mutation::Update).await?;

        let mut state = self.state.lock().await;
        self.ensure_ready(&mut state).await?;

        let mut item = item.clone();
        if let Some(existing) = state.items.get(&item.id) {
            item.added_at = existing.added_at;
        }
        self.write_through(&mut state, item).await?;
        debug!("item updated");
        Ok(())
    }

    /// Removes an item. Unknown ids succeed without effect.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), FreezerError> {
        self.check_fault(Mutation::Delete).await?;

        let mut state = self.state.lock().await;
        self.ensure_ready(&mut state).await?;

        self.store
            .async_delete(&RecordKey::item(id))
            .await
            .map_err(FreezerError::store)?;

        let mut index = self.read_index().await?;
        if index.shift_remove(id) {
            self.write_index(&index).await?;
        }
        state.items.shift_remove(id);
        debug!("item deleted");
        Ok(())
    }

    /// Looks an item up, reading through to the store on a cache miss.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Item>, FreezerError> {
        let mut state = self.state.lock().await;
        self.ensure_ready(&mut state).await?;

        if let Some(item) = state.items.get(id) {
            return Ok(Some(item.clone()));
        }

        let key = RecordKey::item(id);
        let Some(bytes) = self.store.async_get(&key).await.map_err(FreezerError::store)? else {
            return Ok(None);
        };
        let item = decode_item(&key, &bytes)?;
        state.items.insert(item.id.clone(), item.clone());
        Ok(Some(item))
    }

    /// Returns every known item, in cache insertion order.
    pub async fn get_all(&self) -> Result<Vec<Item>, FreezerError> {
        let mut state = self.state.lock().await;
        self.ensure_ready(&mut state).await?;

        if !state.items.is_empty() {
            return Ok(state.items.values().cloned().collect());
        }

        let index = self.read_index().await?;
        if index.is_empty() {
            return Ok(Vec::new());
        }

        debug!(ids = index.len(), "cache empty, hydrating from store");
        let items = self.load_records(&index).await?;
        for item in &items {
            state.items.insert(item.id.clone(), item.clone());
        }
        Ok(items)
    }

    pub async fn get_by_location(&self, location: Location) -> Result<Vec<Item>, FreezerError> {
        let all = self.get_all().await?;
        Ok(all.into_iter().filter(|item| item.location == location).collect())
    }

    /// Erases every indexed record and empties the cache.
    ///
    /// Meant for tests and maintenance; not part of normal application flow.
    #[instrument(skip(self))]
    pub async fn clear_all(&self) -> Result<(), FreezerError> {
        let mut state = self.state.lock().await;

        let index = self.read_index().await?;
        let keys: Vec<RecordKey> = index.iter().map(|id| RecordKey::item(id)).collect();
        self.store
            .async_delete_many(&keys)
            .await
            .map_err(FreezerError::store)?;
        self.write_index(&ItemIndex::new()).await?;

        state.items.clear();
        state.phase = Phase::Ready;
        debug!(removed = keys.len(), "store cleared");
        Ok(())
    }

    async fn check_fault(&self, mutation: Mutation) -> Result<(), FreezerError> {
        match self.policy.decide() {
            FaultDecision::Proceed => Ok(()),
            FaultDecision::Fail { delay } => {
                warn!(%mutation, ?delay, "simulating failure");
                tokio::time::sleep(delay).await;
                Err(FreezerError::SimulatedFailure(mutation))
            }
        }
    }

    async fn ensure_ready(&self, state: &mut CacheState) -> Result<(), FreezerError> {
        if state.phase == Phase::Ready {
            return Ok(());
        }

        state.phase = Phase::Initializing;
        match self.hydrate(state).await {
            Ok(()) => {
                state.phase = Phase::Ready;
                debug!(items = state.items.len(), "cache hydrated");
                Ok(())
            }
            Err(err) => {
                state.phase = Phase::Uninitialized;
                Err(err)
            }
        }
    }

    async fn hydrate(&self, state: &mut CacheState) -> Result<(), FreezerError> {
        let raw = self
            .store
            .async_get(&RecordKey::index())
            .await
            .map_err(FreezerError::store)?;

        let Some(bytes) = raw else {
            return self.write_index(&ItemIndex::new()).await;
        };

        let index = decode_index(&bytes)?;
        for item in self.load_records(&index).await? {
            state.items.insert(item.id.clone(), item);
        }
        Ok(())
    }

    async fn write_through(&self, state: &mut CacheState, item: Item) -> Result<(), FreezerError> {
        let bytes = encode_item(&item)?;
        self.store
            .async_put(&RecordKey::item(&item.id), &bytes)
            .await
            .map_err(FreezerError::store)?;

        let mut index = self.read_index().await?;
        if index.insert(item.id.clone()) {
            self.write_index(&index).await?;
        }

        state.items.insert(item.id.clone(), item);
        Ok(())
    }

    async fn read_index(&self) -> Result<ItemIndex, FreezerError> {
        let raw = self
            .store
            .async_get(&RecordKey::index())
            .await
            .map_err(FreezerError::store)?;
        match raw {
            Some(bytes) => decode_index(&bytes),
            None => Ok(ItemIndex::new()),
        }
    }

    async fn write_index(&self, index: &ItemIndex) -> Result<(), FreezerError> {
        let bytes = encode_index(index)?;
        self.store
            .async_put(&RecordKey::index(), &bytes)
            .await
            .map_err(FreezerError::store)
    }

    /// Loads the records an index points at, skipping ids without a record.
    async fn load_records(&self, index: &ItemIndex) -> Result<Vec<Item>, FreezerError> {
        let keys: Vec<RecordKey> = index.iter().map(|id| RecordKey::item(id)).collect();
        let values = self
            .store
            .async_get_many(&keys)
            .await
            .map_err(FreezerError::store)?;

        let mut items = Vec::with_capacity(values.len());
        for (key, value) in keys.iter().zip(values) {
            match value {
                Some(bytes) => items.push(decode_item(key, &bytes)?),
                None => warn!(%key, "index references a missing record"),
            }
        }
        Ok(items)
    }
}
