//! Eaten-meals repository façade
//!
//! Orchestrates the immediate-write path, the pending queue, the
//! connectivity-triggered flush, and on-demand reconciliation. The contract
//! with callers: local success is unconditional, remote success is eventual.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use mealsync_core::{
    ConnectivityMonitor, EatenMealKey, LocalEatenMealsStore, MealSetStream, OperationKind,
    PendingOperation, RemoteEatenMealsStore,
};

use super::queue::PendingQueue;
use super::reconcile::Reconciler;
use super::retry::{RetryPolicy, RetryingExecutor};
use super::SyncError;

/// Result of one pending-queue flush pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlushOutcome {
    pub delivered: usize,
    pub requeued: usize,
}

/// The façade the host application talks to.
///
/// Cheap to clone; all clones share one queue and one connectivity listener.
/// Construction spawns a task that listens on the connectivity signal for the
/// lifetime of the process and flushes the queue on every
/// disconnected→connected transition.
#[derive(Clone)]
pub struct EatenMealsRepository {
    inner: Arc<Inner>,
}

struct Inner {
    local: Arc<dyn LocalEatenMealsStore>,
    remote: Arc<dyn RemoteEatenMealsStore>,
    connectivity: Arc<dyn ConnectivityMonitor>,
    queue: PendingQueue,
    executor: RetryingExecutor,
    reconciler: Reconciler,
}

impl EatenMealsRepository {
    pub fn new(
        local: Arc<dyn LocalEatenMealsStore>,
        remote: Arc<dyn RemoteEatenMealsStore>,
        connectivity: Arc<dyn ConnectivityMonitor>,
        policy: RetryPolicy,
    ) -> Self {
        let executor = RetryingExecutor::new(policy);
        let reconciler = Reconciler::new(
            Arc::clone(&local),
            Arc::clone(&remote),
            executor.clone(),
        );
        let inner = Arc::new(Inner {
            local,
            remote,
            connectivity,
            queue: PendingQueue::new(),
            executor,
            reconciler,
        });
        Inner::spawn_connectivity_listener(Arc::clone(&inner));
        Self { inner }
    }

    pub fn with_defaults(
        local: Arc<dyn LocalEatenMealsStore>,
        remote: Arc<dyn RemoteEatenMealsStore>,
        connectivity: Arc<dyn ConnectivityMonitor>,
    ) -> Self {
        Self::new(local, remote, connectivity, RetryPolicy::default())
    }

    /// Mark a meal as eaten.
    ///
    /// The local write happens first and is the only thing that can fail
    /// here. The remote leg is best-effort: applied immediately when
    /// connected, queued otherwise (or when the immediate apply exhausts its
    /// retries).
    pub async fn save_eaten_meal(
        &self,
        key: &EatenMealKey,
        meal_id: &str,
    ) -> mealsync_core::Result<()> {
        self.inner.local.save(key, meal_id).await?;
        self.inner
            .push_or_enqueue(PendingOperation::save(key.clone(), meal_id))
            .await;
        Ok(())
    }

    /// Unmark a meal. Symmetric to [`save_eaten_meal`](Self::save_eaten_meal).
    pub async fn remove_eaten_meal(
        &self,
        key: &EatenMealKey,
        meal_id: &str,
    ) -> mealsync_core::Result<()> {
        self.inner.local.remove(key, meal_id).await?;
        self.inner
            .push_or_enqueue(PendingOperation::remove(key.clone(), meal_id))
            .await;
        Ok(())
    }

    /// Current set for `key`, refreshed from the remote first when connected.
    ///
    /// The refresh is best-effort within the bounded retry budget; a failed
    /// refresh is logged and the local set is returned as-is.
    pub async fn get_eaten_meals(
        &self,
        key: &EatenMealKey,
    ) -> mealsync_core::Result<HashSet<String>> {
        if self.inner.connectivity.is_connected() {
            if let Err(e) = self.inner.reconciler.reconcile(key).await {
                warn!("pre-read reconciliation failed for {key}: {e}");
            }
        }
        self.inner.local.get(key).await
    }

    /// Live view of the local set for `key`.
    ///
    /// Returns immediately. When connected, a reconciliation pass is spawned
    /// fire-and-forget so the view refreshes without the caller blocking on
    /// the network; the refreshed set arrives through the returned stream.
    pub async fn observe_eaten_meals(&self, key: &EatenMealKey) -> MealSetStream {
        if self.inner.connectivity.is_connected() {
            let inner = Arc::clone(&self.inner);
            let key = key.clone();
            tokio::spawn(async move {
                if let Err(e) = inner.reconciler.reconcile(&key).await {
                    warn!("background reconciliation failed for {key}: {e}");
                }
            });
        }
        self.inner.local.observe(key).await
    }

    /// Explicit full reconciliation for `key`. No-op while offline.
    pub async fn sync_with_remote(&self, key: &EatenMealKey) -> Result<(), SyncError> {
        if !self.inner.connectivity.is_connected() {
            return Ok(());
        }
        self.inner.reconciler.reconcile(key).await
    }

    /// Replay all queued pending operations against the remote store.
    ///
    /// Failures re-enqueue the individual operation and the loop keeps going,
    /// so one poison operation never blocks the rest of the batch.
    pub async fn flush_pending(&self) -> FlushOutcome {
        self.inner.flush_pending().await
    }

    /// Number of operations currently awaiting delivery.
    pub fn pending_count(&self) -> usize {
        self.inner.queue.len()
    }
}

impl Inner {
    fn spawn_connectivity_listener(inner: Arc<Inner>) {
        let mut rx = inner.connectivity.subscribe();
        tokio::spawn(async move {
            let mut was_connected = *rx.borrow();
            while rx.changed().await.is_ok() {
                let connected = *rx.borrow_and_update();
                if connected && !was_connected {
                    debug!("connectivity restored, flushing pending operations");
                    inner.flush_pending().await;
                }
                was_connected = connected;
            }
        });
    }

    /// Immediate remote apply when connected, queue otherwise. Remote
    /// failures never surface to the caller; the local write already
    /// succeeded, so the user-visible action did not fail.
    async fn push_or_enqueue(&self, op: PendingOperation) {
        if !self.connectivity.is_connected() {
            debug!("offline, queuing: {op}");
            self.queue.enqueue(op);
            return;
        }
        if let Err(e) = self.apply_remote(&op).await {
            warn!("immediate remote apply failed, queuing: {op}: {e}");
            self.queue.enqueue(op);
        }
    }

    async fn apply_remote(&self, op: &PendingOperation) -> Result<(), SyncError> {
        match op.kind {
            OperationKind::Save => {
                self.executor
                    .execute(|| self.remote.save_eaten_meal(&op.key, &op.meal_id))
                    .await
            }
            OperationKind::Remove => {
                self.executor
                    .execute(|| self.remote.remove_eaten_meal(&op.key, &op.meal_id))
                    .await
            }
        }
    }

    async fn flush_pending(&self) -> FlushOutcome {
        let drained = self.queue.drain_all();
        if drained.is_empty() {
            return FlushOutcome::default();
        }
        info!("flushing {} pending operations", drained.len());

        let mut outcome = FlushOutcome::default();
        for op in drained {
            match self.apply_remote(&op).await {
                Ok(()) => outcome.delivered += 1,
                Err(e) => {
                    warn!("replay failed, re-queuing: {op}: {e}");
                    self.queue.enqueue(op);
                    outcome.requeued += 1;
                }
            }
        }
        info!(
            "flush done: {} delivered, {} re-queued",
            outcome.delivered, outcome.requeued
        );
        outcome
    }
}
