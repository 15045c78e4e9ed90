//! Pending-operation queue
//!
//! Holds remote mutations awaiting delivery. All access goes through one
//! mutex; replay of drained operations happens outside the lock so a slow
//! network call never blocks a concurrent enqueue.

use std::sync::Mutex;
use tracing::debug;

use mealsync_core::PendingOperation;

/// In-memory queue of not-yet-confirmed remote mutations.
///
/// Lives for the process lifetime only; operations queued at the moment the
/// process is killed are recovered by the periodic healer's window-based
/// reconciliation rather than by queue persistence.
#[derive(Debug, Default)]
pub struct PendingQueue {
    ops: Mutex<Vec<PendingOperation>>,
}

impl PendingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operation under the lock.
    ///
    /// An exact duplicate of an already-queued operation is dropped: remote
    /// mutations are idempotent, so delivering it twice buys nothing.
    pub fn enqueue(&self, op: PendingOperation) {
        let mut ops = self.ops.lock().expect("pending queue mutex poisoned");
        if ops.contains(&op) {
            debug!("dropping duplicate pending operation: {}", op);
            return;
        }
        ops.push(op);
    }

    /// Atomically capture the current contents and empty the queue.
    ///
    /// An `enqueue` racing with this call lands either in the returned batch
    /// or in the queue for the next drain; it is never lost.
    pub fn drain_all(&self) -> Vec<PendingOperation> {
        let mut ops = self.ops.lock().expect("pending queue mutex poisoned");
        std::mem::take(&mut *ops)
    }

    pub fn len(&self) -> usize {
        self.ops.lock().expect("pending queue mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
