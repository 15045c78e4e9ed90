//! In-process recurring job scheduler
//!
//! Tokio-interval implementation of [`PeriodicScheduler`]. Covers the
//! lifetime of the process only; hosts that need restart-surviving schedules
//! (WorkManager, BGTaskScheduler, cron) implement the trait over their
//! platform scheduler and wire it in instead.

use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use mealsync_core::{PeriodicScheduler, RecurringJob};

#[derive(Debug, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    pub fn new() -> Self {
        Self
    }
}

impl PeriodicScheduler for TokioScheduler {
    fn register_recurring(&self, name: &str, period: Duration, job: Arc<dyn RecurringJob>) {
        let name = name.to_string();
        tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of a tokio interval fires immediately; skip it
            // so the job runs on cadence, not at registration.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                debug!("running recurring job '{name}'");
                if let Err(e) = job.run().await {
                    warn!("recurring job '{name}' failed: {e}");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct CountingJob {
        runs: Arc<AtomicU32>,
    }

    #[async_trait]
    impl RecurringJob for CountingJob {
        async fn run(&self) -> mealsync_core::Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn runs_on_cadence_not_at_registration() {
        let runs = Arc::new(AtomicU32::new(0));
        let scheduler = TokioScheduler::new();
        scheduler.register_recurring(
            "counting",
            Duration::from_secs(60 * 60),
            Arc::new(CountingJob {
                runs: Arc::clone(&runs),
            }),
        );

        tokio::task::yield_now().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(3 * 60 * 60 + 1)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }
}
