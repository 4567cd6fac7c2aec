use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use freezer_core::{
    Environment, FaultConfig, FaultPolicy, MemoryStore, RecordKey, Repository, Store, ViewState,
};
use freezer_rocks::{RocksError, RocksStore};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnyStoreError {
    #[error("rocks error: {0}")]
    Rocks(#[from] RocksError),
    #[error("memory store error: {0}")]
    Memory(#[from] Infallible),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    #[default]
    Rocks,
    Memory,
}

impl std::str::FromStr for StoreType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rocks" | "rocksdb" => Ok(StoreType::Rocks),
            "memory" | "mem" => Ok(StoreType::Memory),
            _ => Err(format!("unknown store type: {}", s)),
        }
    }
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::Rocks => write!(f, "rocks"),
            StoreType::Memory => write!(f, "memory"),
        }
    }
}

pub enum AnyStore {
    Rocks(RocksStore),
    Memory(MemoryStore),
}

impl AnyStore {
    pub fn open(store_type: StoreType, path: impl AsRef<Path>) -> Result<Self, AnyStoreError> {
        match store_type {
            StoreType::Rocks => Ok(Self::Rocks(RocksStore::open(path)?)),
            StoreType::Memory => Ok(Self::Memory(MemoryStore::new())),
        }
    }
}

impl Store for AnyStore {
    type Error = AnyStoreError;

    fn get(&self, key: &RecordKey) -> Result<Option<Vec<u8>>, Self::Error> {
        match self {
            AnyStore::Rocks(s) => s.get(key).map_err(Into::into),
            AnyStore::Memory(s) => s.get(key).map_err(Into::into),
        }
    }

    fn put(&self, key: &RecordKey, value: &[u8]) -> Result<(), Self::Error> {
        match self {
            AnyStore::Rocks(s) => s.put(key, value).map_err(Into::into),
            AnyStore::Memory(s) => s.put(key, value).map_err(Into::into),
        }
    }

    fn delete(&self, key: &RecordKey) -> Result<(), Self::Error> {
        match self {
            AnyStore::Rocks(s) => s.delete(key).map_err(Into::into),
            AnyStore::Memory(s) => s.delete(key).map_err(Into::into),
        }
    }
}

pub struct AppContext {
    pub view: ViewState<AnyStore>,
}

impl AppContext {
    pub fn open(
        store_type: StoreType,
        store_path: PathBuf,
        environment: Environment,
        faults: &FaultConfig,
    ) -> Result<Self, AnyStoreError> {
        let store = AnyStore::open(store_type, &store_path)?;
        let policy = FaultPolicy::new(environment, faults);
        let view = ViewState::new(Arc::new(Repository::new(store, policy)));

        Ok(Self { view })
    }
}

pub fn default_store_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("freezer")
        .join("store")
}
