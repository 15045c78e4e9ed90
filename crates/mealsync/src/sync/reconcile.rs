//! Pull-and-converge-local reconciliation
//!
//! Remote is authoritative at reconciliation time: the reconciler fetches the
//! remote set and replays the symmetric difference against the local store.
//! It never pushes local-only entries upstream; pushing happens only through
//! the immediate-write / pending-queue path. Keeping the two paths separate
//! stops reconciliation from re-sending pushes that already failed.

use std::sync::Arc;
use tracing::debug;

use mealsync_core::{EatenMealKey, LocalEatenMealsStore, RemoteEatenMealsStore};

use super::retry::RetryingExecutor;
use super::SyncError;

pub struct Reconciler {
    local: Arc<dyn LocalEatenMealsStore>,
    remote: Arc<dyn RemoteEatenMealsStore>,
    executor: RetryingExecutor,
}

impl Reconciler {
    pub fn new(
        local: Arc<dyn LocalEatenMealsStore>,
        remote: Arc<dyn RemoteEatenMealsStore>,
        executor: RetryingExecutor,
    ) -> Self {
        Self {
            local,
            remote,
            executor,
        }
    }

    /// Bring the local set for `key` into agreement with the remote one.
    ///
    /// If the remote fetch fails after retries, aborts without mutating local
    /// state; the next trigger (connectivity restore, periodic heal) retries.
    pub async fn reconcile(&self, key: &EatenMealKey) -> Result<(), SyncError> {
        let remote_meals = self
            .executor
            .execute(|| self.remote.get_eaten_meals(key))
            .await?;
        let local_meals = self.local.get(key).await?;

        let to_add = &remote_meals - &local_meals;
        let to_remove = &local_meals - &remote_meals;

        if to_add.is_empty() && to_remove.is_empty() {
            return Ok(());
        }
        debug!(
            "reconciling {key}: adding {} and removing {} local entries",
            to_add.len(),
            to_remove.len()
        );

        for meal_id in &to_add {
            self.local.save(key, meal_id).await?;
        }
        for meal_id in &to_remove {
            self.local.remove(key, meal_id).await?;
        }
        Ok(())
    }
}
