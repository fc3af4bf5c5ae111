use thiserror::Error;

/// Rejected recipe input: non-positive ball count/weight, or a percentage
/// combination that drives the flour divisor to zero or below.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid recipe parameters: {reason}")]
pub struct InvalidParameters {
    pub reason: String,
}

impl InvalidParameters {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Key-value store failure. Callers either propagate (explicit store use)
/// or swallow with a log line (timer, unit preference).
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored value is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}
