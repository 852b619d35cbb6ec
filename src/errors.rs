use thiserror::Error;
use uuid::Uuid;

/// Failures raised by persistence backends. Converted into [`StoreError`] at
/// the store boundary; never surfaced to UI collaborators directly.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("record {0} not found")]
    NotFound(Uuid),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Error taxonomy exposed by [`crate::store::InstallmentStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// Fetch failed; the working set has been cleared rather than left stale.
    #[error("load failed: {0}")]
    Load(String),
    /// Write failed; the in-memory set is unchanged. Not retried.
    #[error("mutation failed: {0}")]
    Mutation(String),
    /// Rejected before any persistence call was attempted.
    #[error("{0}")]
    Validation(String),
}

impl StoreError {
    pub(crate) fn load(err: BackendError) -> Self {
        StoreError::Load(err.to_string())
    }

    pub(crate) fn mutation(err: BackendError) -> Self {
        StoreError::Mutation(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
