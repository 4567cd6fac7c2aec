//! Freezer inventory core: a cached item repository over a key-value store,
//! and an optimistic view state on top of it.
//!
//! Core concepts:
//! - **Store**: durable key-value bytes (`item:<id>` records plus one index record)
//! - **Repository**: owns the in-memory item cache and writes through to the store
//! - **FaultPolicy**: decides whether a write should fail on purpose
//! - **ViewState**: the list presentation renders, mutated optimistically and
//!   rolled back when the repository call fails
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use chrono::{Duration, Utc};
//! use freezer_core::{FaultPolicy, Item, Location, MemoryStore, Repository, ViewState};
//!
//! # tokio_test_block_on(async {
//! let repository = Repository::new(MemoryStore::new(), FaultPolicy::disabled());
//! let view = ViewState::new(Arc::new(repository));
//! view.load().await.unwrap();
//!
//! let peas = Item::new("Peas", 1.0, "bag", Location::TopDrawer, Utc::now() + Duration::days(10));
//! view.create_item(peas.clone()).await.unwrap();
//! assert_eq!(view.items(), vec![peas]);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

mod async_store;
mod codec;
mod error;
mod fault;
mod item;
mod key;
pub mod query;
mod repository;
mod store;
mod view;

pub use async_store::AsyncStore;
pub use codec::ItemIndex;
pub use error::{FreezerError, Mutation};
pub use fault::{Environment, FaultConfig, FaultDecision, FaultPolicy};
pub use item::{Item, ItemId, Location};
pub use key::RecordKey;
pub use query::{Freshness, ItemQuery, SortOrder};
pub use repository::{Phase, Repository};
pub use store::{MemoryStore, Store};
pub use view::{ViewSnapshot, ViewState};
