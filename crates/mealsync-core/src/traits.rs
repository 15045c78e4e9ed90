//! Trait seams for the external collaborators
//!
//! The engine depends on these traits only; concrete implementations (device
//! key/value store, backend HTTP client, platform connectivity callbacks,
//! platform job scheduler) are wired in by the host application. In-memory
//! implementations for tests live in `mealsync::testing`.

use async_trait::async_trait;
use std::collections::HashSet;
use std::pin::Pin;
use std::time::Duration;
use tokio::sync::watch;
use tokio_stream::Stream;

use crate::error::Result;
use crate::types::EatenMealKey;

/// Live view of one key's eaten-meal set. Emits the current set immediately
/// and again after every local change.
pub type MealSetStream = Pin<Box<dyn Stream<Item = HashSet<String>> + Send>>;

/// Durable on-device store of eaten-meal sets, one set per key.
///
/// Writes must be cheap (no network latency), survive process restart, and be
/// safe for concurrent access. Local writes are the user's ground truth: the
/// engine applies them unconditionally and never rolls them back.
#[async_trait]
pub trait LocalEatenMealsStore: Send + Sync {
    async fn save(&self, key: &EatenMealKey, meal_id: &str) -> Result<()>;

    async fn remove(&self, key: &EatenMealKey, meal_id: &str) -> Result<()>;

    /// Point-in-time read of the current set.
    async fn get(&self, key: &EatenMealKey) -> Result<HashSet<String>>;

    /// Live observable view of the set.
    async fn observe(&self, key: &EatenMealKey) -> MealSetStream;
}

/// Authoritative remote store, accessed over the network.
///
/// Both mutations must be idempotent: saving an already-present meal id or
/// removing an absent one is a no-op, not an error. Failures surface as
/// errors, never as partial states.
#[async_trait]
pub trait RemoteEatenMealsStore: Send + Sync {
    async fn get_eaten_meals(&self, key: &EatenMealKey) -> Result<HashSet<String>>;

    async fn save_eaten_meal(&self, key: &EatenMealKey, meal_id: &str) -> Result<()>;

    async fn remove_eaten_meal(&self, key: &EatenMealKey, meal_id: &str) -> Result<()>;
}

/// Network connectivity signal.
pub trait ConnectivityMonitor: Send + Sync {
    /// Point-in-time check.
    fn is_connected(&self) -> bool;

    /// Live signal. The receiver holds the current value; `changed()` wakes
    /// on every transition.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Callback contract for recurring background work.
#[async_trait]
pub trait RecurringJob: Send + Sync {
    async fn run(&self) -> Result<()>;
}

/// Durable recurring job scheduler.
///
/// Implementations are expected to provide at-least-once invocation and to
/// survive process restarts where the platform allows (the in-process tokio
/// implementation in `mealsync` only covers the lifetime of the process).
pub trait PeriodicScheduler: Send + Sync {
    fn register_recurring(
        &self,
        name: &str,
        interval: Duration,
        job: std::sync::Arc<dyn RecurringJob>,
    );
}
