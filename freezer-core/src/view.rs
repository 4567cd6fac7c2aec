//! UI-facing item list with optimistic mutations.
//!
//! [`ViewState`] applies every mutation to its own list before the
//! repository call resolves, then either keeps it or restores the list as it
//! was right before that call. Presentation code reads the current
//! [`ViewSnapshot`] or subscribes to changes.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::async_store::AsyncStore;
use crate::error::FreezerError;
use crate::item::{Item, Location};
use crate::repository::Repository;

/// What presentation renders.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewSnapshot {
    pub items: Vec<Item>,
    /// True until the first full load has finished.
    pub loading: bool,
}

impl Default for ViewSnapshot {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: true,
        }
    }
}

pub struct ViewState<S> {
    repository: Arc<Repository<S>>,
    state: watch::Sender<ViewSnapshot>,
}

impl<S: AsyncStore> ViewState<S> {
    pub fn new(repository: Arc<Repository<S>>) -> Self {
        let (state, _) = watch::channel(ViewSnapshot::default());
        Self { repository, state }
    }

    pub fn repository(&self) -> &Arc<Repository<S>> {
        &self.repository
    }

    /// Receiver notified on every change to the list or loading flag.
    pub fn subscribe(&self) -> watch::Receiver<ViewSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ViewSnapshot {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<Item> {
        self.state.borrow().items.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Replaces the list with the repository contents. Not retried on failure;
    /// a failed load leaves an empty list.
    #[instrument(skip(self))]
    pub async fn load(&self) -> Result<(), FreezerError> {
        match self.repository.get_all().await {
            Ok(items) => {
                debug!(count = items.len(), "items loaded");
                self.state.send_modify(|view| {
                    view.items = items;
                    view.loading = false;
                });
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "initial load failed");
                self.state.send_modify(|view| {
                    view.items.clear();
                    view.loading = false;
                });
                Err(err)
            }
        }
    }

    #[instrument(skip(self, item), fields(id = %item.id))]
    pub async fn create_item(&self, item: Item) -> Result<(), FreezerError> {
        item.validate()?;
        let snapshot = self.apply(|items| items.push(item.clone()));
        let result = self.repository.create(&item).await;
        self.settle(snapshot, result)
    }

    /// Replaces the listed item with the same id, or appends it when the id
    /// is not listed, matching the repository's upsert.
    #[instrument(skip(self, item), fields(id = %item.id))]
    pub async fn update_item(&self, item: Item) -> Result<(), FreezerError> {
        item.validate()?;
        let snapshot = self.apply(|items| {
            match items.iter_mut().find(|existing| existing.id == item.id) {
                Some(slot) => {
                    let added_at = slot.added_at;
                    *slot = item.clone();
                    slot.added_at = added_at;
                }
                None => items.push(item.clone()),
            }
        });
        let result = self.repository.update(&item).await;
        self.settle(snapshot, result)
    }

    #[instrument(skip(self))]
    pub async fn delete_item(&self, id: &str) -> Result<(), FreezerError> {
        let snapshot = self.apply(|items| items.retain(|existing| existing.id != id));
        let result = self.repository.delete(id).await;
        self.settle(snapshot, result)
    }

    pub async fn get_by_location(&self, location: Location) -> Result<Vec<Item>, FreezerError> {
        self.repository.get_by_location(location).await
    }

    /// Applies an optimistic change and returns the list as it was just before.
    fn apply(&self, change: impl FnOnce(&mut Vec<Item>)) -> Vec<Item> {
        let mut snapshot = Vec::new();
        self.state.send_modify(|view| {
            snapshot = view.items.clone();
            change(&mut view.items);
        });
        snapshot
    }

    fn settle(
        &self,
        snapshot: Vec<Item>,
        result: Result<(), FreezerError>,
    ) -> Result<(), FreezerError> {
        if let Err(err) = &result {
            warn!(error = %err, simulated = err.is_simulated(), "rolling back optimistic change");
            self.state.send_modify(|view| view.items = snapshot);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault::{Environment, FaultConfig, FaultPolicy};
    use crate::key::RecordKey;
    use crate::store::{MemoryStore, Store};
    use chrono::{TimeZone, Utc};
    use std::collections::VecDeque;
    use std::convert::Infallible;
    use std::sync::Mutex;

    fn item(id: &str) -> Item {
        Item {
            id: id.to_string(),
            name: "Chicken Breast".to_string(),
            quantity: 2.0,
            unit: "pieces".to_string(),
            location: Location::TopDrawer,
            added_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            expires_on: Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap(),
            notes: Some("Family pack".to_string()),
        }
    }

    async fn loaded_view() -> ViewState<MemoryStore> {
        let repo = Repository::new(MemoryStore::new(), FaultPolicy::for_tests());
        let view = ViewState::new(Arc::new(repo));
        view.load().await.unwrap();
        view
    }

    #[derive(Debug, Default)]
    struct BrokenStore;

    impl Store for BrokenStore {
        type Error = std::io::Error;

        fn get(&self, _key: &RecordKey) -> Result<Option<Vec<u8>>, Self::Error> {
            Err(std::io::Error::other("disk on fire"))
        }

        fn put(&self, _key: &RecordKey, _value: &[u8]) -> Result<(), Self::Error> {
            Err(std::io::Error::other("disk on fire"))
        }

        fn delete(&self, _key: &RecordKey) -> Result<(), Self::Error> {
            Err(std::io::Error::other("disk on fire"))
        }
    }

    /// Memory store that suspends before every access, so concurrent callers
    /// interleave at each store round trip.
    #[derive(Debug, Default)]
    struct YieldingStore(MemoryStore);

    impl AsyncStore for YieldingStore {
        type Error = Infallible;

        async fn async_get(&self, key: &RecordKey) -> Result<Option<Vec<u8>>, Self::Error> {
            tokio::task::yield_now().await;
            self.0.get(key)
        }

        async fn async_put(&self, key: &RecordKey, value: &[u8]) -> Result<(), Self::Error> {
            tokio::task::yield_now().await;
            self.0.put(key, value)
        }

        async fn async_delete(&self, key: &RecordKey) -> Result<(), Self::Error> {
            tokio::task::yield_now().await;
            self.0.delete(key)
        }
    }

    /// Development-mode view whose fault rolls come from `rolls` in order.
    async fn scripted_view(rolls: impl IntoIterator<Item = u8>) -> ViewState<YieldingStore> {
        let rolls = Mutex::new(rolls.into_iter().collect::<VecDeque<_>>());
        let policy = FaultPolicy::new(Environment::Development, &FaultConfig::default())
            .with_roll(move || rolls.lock().unwrap().pop_front().unwrap_or(10));
        let view = ViewState::new(Arc::new(Repository::new(YieldingStore::default(), policy)));
        view.load().await.unwrap();
        view
    }

    fn ids(items: &[Item]) -> Vec<String> {
        items.iter().map(|item| item.id.clone()).collect()
    }

    #[tokio::test]
    async fn load_clears_loading_flag() {
        let repo = Arc::new(Repository::new(MemoryStore::new(), FaultPolicy::for_tests()));
        repo.create(&item("a")).await.unwrap();
        let view = ViewState::new(repo);
        assert!(view.is_loading());

        view.load().await.unwrap();

        assert!(!view.is_loading());
        assert_eq!(view.items(), vec![item("a")]);
    }

    #[tokio::test]
    async fn failed_load_leaves_empty_list() {
        let view = ViewState::new(Arc::new(Repository::new(BrokenStore, FaultPolicy::disabled())));

        let err = view.load().await.unwrap_err();

        assert!(matches!(err, FreezerError::Store(_)));
        assert_eq!(
            view.snapshot(),
            ViewSnapshot {
                items: Vec::new(),
                loading: false
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn create_rolls_back_on_simulated_failure() {
        let view = loaded_view().await;
        view.create_item(item("a")).await.unwrap();
        let before = view.items();

        view.repository().policy().set_guaranteed_failure(true);
        let err = view.create_item(item("b")).await.unwrap_err();

        assert!(err.is_simulated());
        assert_eq!(view.items(), before);
        assert_eq!(view.items(), vec![item("a")]);
    }

    #[tokio::test(start_paused = true)]
    async fn update_rolls_back_on_simulated_failure() {
        let view = loaded_view().await;
        view.create_item(item("a")).await.unwrap();
        let before = view.items();

        view.repository().policy().set_guaranteed_failure(true);
        let mut edited = item("a");
        edited.name = "Updated Name".to_string();
        let err = view.update_item(edited).await.unwrap_err();

        assert!(err.is_simulated());
        assert_eq!(view.items(), before);
        assert_eq!(view.items()[0].name, "Chicken Breast");
    }

    #[tokio::test(start_paused = true)]
    async fn delete_rolls_back_on_simulated_failure() {
        let view = loaded_view().await;
        view.create_item(item("a")).await.unwrap();
        let before = view.items();

        view.repository().policy().set_guaranteed_failure(true);
        let err = view.delete_item("a").await.unwrap_err();

        assert!(err.is_simulated());
        assert_eq!(view.items(), before);
    }

    #[tokio::test]
    async fn optimistic_state_is_visible_while_failure_is_pending() {
        let view = loaded_view().await;
        view.repository().policy().set_guaranteed_failure(true);
        let mut rx = view.subscribe();

        let observer = async {
            rx.changed().await.unwrap();
            rx.borrow_and_update().items.clone()
        };
        let (seen, result) = tokio::join!(observer, view.create_item(item("b")));

        assert_eq!(seen, vec![item("b")]);
        assert!(result.unwrap_err().is_simulated());
        assert!(view.items().is_empty());
    }

    #[tokio::test]
    async fn mutations_pass_through_without_faults() {
        let view = loaded_view().await;

        view.create_item(item("a")).await.unwrap();
        view.create_item(item("b")).await.unwrap();
        let mut edited = item("a");
        edited.quantity = 5.0;
        view.update_item(edited.clone()).await.unwrap();
        view.delete_item("b").await.unwrap();

        assert_eq!(view.items(), vec![edited]);
        assert_eq!(view.items(), view.repository().get_all().await.unwrap());
    }

    #[tokio::test]
    async fn update_keeps_listed_added_at() {
        let view = loaded_view().await;
        view.create_item(item("a")).await.unwrap();

        let mut edited = item("a");
        edited.added_at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        view.update_item(edited).await.unwrap();

        assert_eq!(view.items()[0].added_at, item("a").added_at);
        assert_eq!(view.items(), view.repository().get_all().await.unwrap());
    }

    #[tokio::test]
    async fn invalid_item_never_reaches_the_list() {
        let view = loaded_view().await;
        let mut bad = item("a");
        bad.name = String::new();

        assert!(view.create_item(bad).await.is_err());
        assert!(view.items().is_empty());
    }

    #[tokio::test]
    async fn update_of_unlisted_item_appends_it() {
        let view = loaded_view().await;

        view.update_item(item("ghost")).await.unwrap();

        assert_eq!(view.items(), vec![item("ghost")]);
        assert_eq!(view.items(), view.repository().get_all().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_mutations_restore_their_own_snapshot() {
        // "c" passes the fault check, "b" fails after the development delay.
        let view = scripted_view([10, 1]).await;
        let mut rx = view.subscribe();

        let observer = async {
            let mut seen = Vec::new();
            while seen.len() < 2 {
                rx.changed().await.unwrap();
                seen.push(ids(&rx.borrow_and_update().items));
            }
            seen
        };
        let (first, second, seen) = tokio::join!(
            view.create_item(item("c")),
            view.create_item(item("b")),
            observer
        );

        assert!(first.is_ok());
        assert!(second.unwrap_err().is_simulated());
        // Both optimistic inserts were listed at once before "b" rolled back.
        assert_eq!(seen, vec![vec!["c", "b"], vec!["c"]]);
        assert_eq!(view.items(), vec![item("c")]);
        assert_eq!(view.items(), view.repository().get_all().await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn late_rollback_discards_overlapping_success() {
        // "b" fails after the delay; "c" starts later and is stored meanwhile.
        let view = scripted_view([1, 10]).await;
        let mut rx = view.subscribe();

        let observer = async {
            let mut seen = Vec::new();
            while seen.len() < 2 {
                rx.changed().await.unwrap();
                seen.push(ids(&rx.borrow_and_update().items));
            }
            seen
        };
        let (first, second, seen) = tokio::join!(
            view.create_item(item("b")),
            view.create_item(item("c")),
            observer
        );

        assert!(first.unwrap_err().is_simulated());
        assert!(second.is_ok());
        // The snapshot taken by "b" predates "c", so restoring it drops "c"
        // from the list even though the repository kept it.
        assert_eq!(seen, vec![vec!["b", "c"], Vec::<&str>::new()]);
        assert!(view.items().is_empty());
        assert_eq!(view.repository().get_all().await.unwrap(), vec![item("c")]);

        view.load().await.unwrap();
        assert_eq!(view.items(), vec![item("c")]);
    }
}
