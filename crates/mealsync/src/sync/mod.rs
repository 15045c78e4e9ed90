//! Synchronization engine internals
//!
//! - `queue`: mutex-guarded pending-operation queue
//! - `retry`: capped exponential backoff executor
//! - `reconcile`: pull-and-converge-local set reconciliation
//! - `repository`: the façade the host application talks to
//! - `healer`: trailing-window reconciliation job
//! - `scheduler`: in-process recurring job scheduler

pub mod healer;
pub mod queue;
pub mod reconcile;
pub mod repository;
pub mod retry;
pub mod scheduler;

use mealsync_core::StoreError;
use thiserror::Error;

/// Engine-level failures.
///
/// None of these reach the callers of `save_eaten_meal`/`remove_eaten_meal`:
/// push failures are absorbed into the pending queue, and reconciliation
/// failures are logged and retried on the next trigger.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Every attempt of a retried remote call failed. Carries the last error.
    #[error("all {attempts} attempts failed: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: StoreError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
