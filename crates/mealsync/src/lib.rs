//! Eaten-meal synchronization engine
//!
//! Keeps a per-user, per-day set of "meal marked as eaten" flags consistent
//! between a durable on-device store and a remote authoritative store, under
//! intermittent connectivity, without losing user intent and without making
//! the user wait on network round-trips.
//!
//! Architecture:
//! - Local writes always succeed immediately; the remote leg is best-effort.
//! - Failed or offline remote mutations land in an in-memory pending queue.
//! - A disconnected→connected transition flushes the queue.
//! - Reconciliation pulls the remote set and converges the local one; a
//!   periodic healer reconciles a trailing window of days to compensate for
//!   missed flushes.

pub mod sync;
pub mod testing;

pub use sync::healer::{
    schedule_periodic_heal, HealJob, SyncHealer, UserIdSource, DEFAULT_HEAL_INTERVAL,
    HEAL_JOB_NAME,
};
pub use sync::queue::PendingQueue;
pub use sync::reconcile::Reconciler;
pub use sync::repository::{EatenMealsRepository, FlushOutcome};
pub use sync::retry::{RetryPolicy, RetryingExecutor};
pub use sync::scheduler::TokioScheduler;
pub use sync::SyncError;
