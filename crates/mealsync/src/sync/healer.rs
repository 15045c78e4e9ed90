//! Trailing-window reconciliation job
//!
//! Compensates for missed push deliveries and missed connectivity-transition
//! flushes by periodically forcing full reconciliation over a trailing window
//! of days. Driven by a [`PeriodicScheduler`]; per-day failures are logged
//! and the remaining days still run.

use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use mealsync_core::{EatenMealKey, PeriodicScheduler, RecurringJob};

use super::repository::EatenMealsRepository;

/// Scheduler job name under which healing is registered.
pub const HEAL_JOB_NAME: &str = "meal_sync";

/// Default healing cadence.
pub const DEFAULT_HEAL_INTERVAL: Duration = Duration::from_secs(6 * 60 * 60);

/// Reconciles a trailing window of days for one user.
#[derive(Clone)]
pub struct SyncHealer {
    repository: EatenMealsRepository,
    window_days: u64,
}

impl SyncHealer {
    pub const DEFAULT_WINDOW_DAYS: u64 = 7;

    pub fn new(repository: EatenMealsRepository) -> Self {
        Self::with_window(repository, Self::DEFAULT_WINDOW_DAYS)
    }

    pub fn with_window(repository: EatenMealsRepository, window_days: u64) -> Self {
        Self {
            repository,
            window_days,
        }
    }

    /// Reconcile today and the preceding days of the window.
    ///
    /// A failing day is logged and skipped; it stays unchanged locally and is
    /// picked up again on the next healing pass.
    pub async fn heal_recent_days(&self, user_id: &str) {
        self.heal_window(user_id, Local::now().date_naive()).await;
    }

    /// Reconcile the window ending at `newest_day` (inclusive), newest first.
    pub async fn heal_window(&self, user_id: &str, newest_day: NaiveDate) {
        for offset in 0..self.window_days {
            let day = newest_day - Days::new(offset);
            let key = EatenMealKey::for_day(user_id, day);
            if let Err(e) = self.repository.sync_with_remote(&key).await {
                warn!("healing failed for {key}: {e}");
            }
        }
    }
}

/// Resolves the currently signed-in user, if any.
pub type UserIdSource = Arc<dyn Fn() -> Option<String> + Send + Sync>;

/// [`RecurringJob`] adapter around [`SyncHealer`].
///
/// Succeeds silently when nobody is signed in, so an idle device never
/// reports scheduler failures.
pub struct HealJob {
    healer: SyncHealer,
    user_id_source: UserIdSource,
}

impl HealJob {
    pub fn new(healer: SyncHealer, user_id_source: UserIdSource) -> Self {
        Self {
            healer,
            user_id_source,
        }
    }
}

#[async_trait]
impl RecurringJob for HealJob {
    async fn run(&self) -> mealsync_core::Result<()> {
        let Some(user_id) = (self.user_id_source)() else {
            debug!("no signed-in user, skipping healing pass");
            return Ok(());
        };
        self.healer.heal_recent_days(&user_id).await;
        Ok(())
    }
}

/// Wire healing onto a scheduler with the default window and cadence.
pub fn schedule_periodic_heal(
    scheduler: &dyn PeriodicScheduler,
    repository: EatenMealsRepository,
    user_id_source: UserIdSource,
) {
    let job = HealJob::new(SyncHealer::new(repository), user_id_source);
    scheduler.register_recurring(HEAL_JOB_NAME, DEFAULT_HEAL_INTERVAL, Arc::new(job));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeConnectivity, FakeRemoteStore, MemoryLocalStore};
    use mealsync_core::{ConnectivityMonitor, LocalEatenMealsStore, RemoteEatenMealsStore};

    #[tokio::test(start_paused = true)]
    async fn one_failing_day_does_not_abort_the_rest() {
        let local = Arc::new(MemoryLocalStore::new());
        let remote = Arc::new(FakeRemoteStore::new());
        let connectivity = Arc::new(FakeConnectivity::new(true));
        let repo = EatenMealsRepository::with_defaults(
            Arc::clone(&local) as Arc<dyn LocalEatenMealsStore>,
            Arc::clone(&remote) as Arc<dyn RemoteEatenMealsStore>,
            connectivity as Arc<dyn ConnectivityMonitor>,
        );

        let newest = NaiveDate::from_ymd_opt(2024, 1, 7).unwrap();
        for offset in 0..7 {
            let key = EatenMealKey::for_day("user-42", newest - Days::new(offset));
            remote.seed(&key, [format!("meal-{offset}")]);
        }
        let failing = EatenMealKey::new("user-42", "2024-01-03");
        local.save(&failing, "meal-stale").await.unwrap();
        remote.fail_for_key(&failing);

        SyncHealer::new(repo).heal_window("user-42", newest).await;

        for offset in 0..7 {
            let day = newest - Days::new(offset);
            let key = EatenMealKey::for_day("user-42", day);
            if key == failing {
                // Untouched: the failed fetch must not mutate local state.
                let stale: std::collections::HashSet<String> =
                    ["meal-stale".to_string()].into();
                assert_eq!(local.get(&key).await.unwrap(), stale);
            } else {
                assert_eq!(local.get(&key).await.unwrap(), remote.current(&key));
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn heal_job_skips_when_signed_out() {
        let local = Arc::new(MemoryLocalStore::new());
        let remote = Arc::new(FakeRemoteStore::new());
        let connectivity = Arc::new(FakeConnectivity::new(true));
        let repo = EatenMealsRepository::with_defaults(
            local as Arc<dyn LocalEatenMealsStore>,
            remote as Arc<dyn RemoteEatenMealsStore>,
            connectivity as Arc<dyn ConnectivityMonitor>,
        );

        let job = HealJob::new(SyncHealer::new(repo), Arc::new(|| None));
        job.run().await.unwrap();
    }
}
