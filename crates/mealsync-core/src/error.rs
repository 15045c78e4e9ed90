use thiserror::Error;

/// Failures surfaced by the store collaborators.
///
/// Remote variants are retried by the engine's executor; `Local` propagates
/// to the caller directly since a failed local write means the user-visible
/// action itself failed.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Remote store unreachable or the request timed out. Transient.
    #[error("remote store unavailable: {0}")]
    Unavailable(String),

    /// Remote store answered but refused the request.
    #[error("remote store rejected request: {0}")]
    Rejected(String),

    /// Local store failure (disk, serialization).
    #[error("local store error: {0}")]
    Local(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
