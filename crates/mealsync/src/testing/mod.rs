//! In-memory collaborator implementations
//!
//! Lightweight, non-persistent stand-ins for the external collaborators:
//! - `MemoryLocalStore`: watch-channel-backed observable set store
//! - `FakeRemoteStore`: in-memory remote with switchable failure modes
//! - `FakeConnectivity`: hand-driven connectivity signal
//!
//! Used by the engine's own tests and useful for host-app development
//! without a backend.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::RwLock;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use mealsync_core::{
    ConnectivityMonitor, EatenMealKey, LocalEatenMealsStore, MealSetStream,
    RemoteEatenMealsStore, Result, StoreError,
};

/// In-memory observable local store.
///
/// One watch channel per key; every write publishes the new set to all
/// observers of that key.
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    entries: RwLock<HashMap<EatenMealKey, watch::Sender<HashSet<String>>>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sender_for(&self, key: &EatenMealKey) -> watch::Sender<HashSet<String>> {
        if let Some(tx) = self.entries.read().unwrap().get(key) {
            return tx.clone();
        }
        let mut entries = self.entries.write().unwrap();
        entries
            .entry(key.clone())
            .or_insert_with(|| watch::channel(HashSet::new()).0)
            .clone()
    }
}

#[async_trait]
impl LocalEatenMealsStore for MemoryLocalStore {
    async fn save(&self, key: &EatenMealKey, meal_id: &str) -> Result<()> {
        self.sender_for(key).send_modify(|meals| {
            meals.insert(meal_id.to_string());
        });
        Ok(())
    }

    async fn remove(&self, key: &EatenMealKey, meal_id: &str) -> Result<()> {
        self.sender_for(key).send_modify(|meals| {
            meals.remove(meal_id);
        });
        Ok(())
    }

    async fn get(&self, key: &EatenMealKey) -> Result<HashSet<String>> {
        Ok(self.sender_for(key).borrow().clone())
    }

    async fn observe(&self, key: &EatenMealKey) -> MealSetStream {
        Box::pin(WatchStream::new(self.sender_for(key).subscribe()))
    }
}

/// In-memory remote store with idempotent mutations.
///
/// Failure modes for exercising the retry/queue machinery:
/// - `set_failing`: every call fails until cleared
/// - `fail_next`: the next `n` calls fail, then the store recovers
/// - `fail_for_key`: calls for one key fail, others succeed
#[derive(Debug, Default)]
pub struct FakeRemoteStore {
    sets: RwLock<HashMap<EatenMealKey, HashSet<String>>>,
    failing: AtomicBool,
    fail_remaining: AtomicU32,
    failing_keys: RwLock<HashSet<EatenMealKey>>,
}

impl FakeRemoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(
        &self,
        key: &EatenMealKey,
        meals: impl IntoIterator<Item = impl Into<String>>,
    ) {
        let meals = meals.into_iter().map(Into::into).collect();
        self.sets.write().unwrap().insert(key.clone(), meals);
    }

    /// Remote-side view of the set, for assertions.
    pub fn current(&self, key: &EatenMealKey) -> HashSet<String> {
        self.sets.read().unwrap().get(key).cloned().unwrap_or_default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn fail_next(&self, calls: u32) {
        self.fail_remaining.store(calls, Ordering::SeqCst);
    }

    pub fn fail_for_key(&self, key: &EatenMealKey) {
        self.failing_keys.write().unwrap().insert(key.clone());
    }

    fn check_available(&self, key: &EatenMealKey) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("remote store is down".into()));
        }
        let consumed_budgeted_failure = self
            .fail_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if consumed_budgeted_failure {
            return Err(StoreError::Unavailable("transient remote failure".into()));
        }
        if self.failing_keys.read().unwrap().contains(key) {
            return Err(StoreError::Unavailable(format!(
                "remote store failing for {key}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteEatenMealsStore for FakeRemoteStore {
    async fn get_eaten_meals(&self, key: &EatenMealKey) -> Result<HashSet<String>> {
        self.check_available(key)?;
        Ok(self.current(key))
    }

    async fn save_eaten_meal(&self, key: &EatenMealKey, meal_id: &str) -> Result<()> {
        self.check_available(key)?;
        self.sets
            .write()
            .unwrap()
            .entry(key.clone())
            .or_default()
            .insert(meal_id.to_string());
        Ok(())
    }

    async fn remove_eaten_meal(&self, key: &EatenMealKey, meal_id: &str) -> Result<()> {
        self.check_available(key)?;
        if let Some(meals) = self.sets.write().unwrap().get_mut(key) {
            meals.remove(meal_id);
        }
        Ok(())
    }
}

/// Hand-driven connectivity signal backed by a watch channel.
#[derive(Debug)]
pub struct FakeConnectivity {
    tx: watch::Sender<bool>,
}

impl FakeConnectivity {
    pub fn new(connected: bool) -> Self {
        let (tx, _rx) = watch::channel(connected);
        Self { tx }
    }

    pub fn set_connected(&self, connected: bool) {
        self.tx.send_replace(connected);
    }
}

impl ConnectivityMonitor for FakeConnectivity {
    fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tokio_stream::StreamExt;

    fn key() -> EatenMealKey {
        EatenMealKey::new("u", "2024-01-01")
    }

    #[tokio::test]
    async fn remote_mutations_are_idempotent() {
        let remote = FakeRemoteStore::new();
        let key = key();

        remote.save_eaten_meal(&key, "meal-1").await.unwrap();
        let after_once = remote.current(&key);
        remote.save_eaten_meal(&key, "meal-1").await.unwrap();
        assert_eq!(remote.current(&key), after_once);

        remote.remove_eaten_meal(&key, "meal-1").await.unwrap();
        remote.remove_eaten_meal(&key, "meal-1").await.unwrap();
        assert!(remote.current(&key).is_empty());
    }

    #[tokio::test]
    async fn fail_next_recovers_after_budget() {
        let remote = FakeRemoteStore::new();
        let key = key();
        remote.fail_next(2);

        assert!(remote.get_eaten_meals(&key).await.is_err());
        assert!(remote.get_eaten_meals(&key).await.is_err());
        assert!(remote.get_eaten_meals(&key).await.is_ok());
    }

    #[tokio::test]
    async fn observers_see_every_local_write() {
        let local = Arc::new(MemoryLocalStore::new());
        let key = key();

        let mut stream = local.observe(&key).await;
        assert!(stream.next().await.unwrap().is_empty());

        local.save(&key, "meal-1").await.unwrap();
        assert_eq!(stream.next().await.unwrap(), ["meal-1".to_string()].into());

        local.remove(&key, "meal-1").await.unwrap();
        assert!(stream.next().await.unwrap().is_empty());
    }
}
