use thiserror::Error;

/// Failures that abort the current unit of work (handler, transaction, block
/// or cycle). Only [`SyncError::HeightAhead`] stops the engine.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Transport failure calling {method}: status {status}")]
    Transport { method: String, status: u16 },

    #[error("Failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("Node rejected {method} with err {code}")]
    Node { method: String, code: i64 },

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("Unknown transaction method: {0}")]
    UnknownMethod(String),

    #[error("Indexed height {local} is ahead of finalized height {remote}; reset the index")]
    HeightAhead { local: u64, remote: u64 },

    #[error("Expected block {expected} but node returned block {actual}")]
    UnexpectedBlock { expected: u64, actual: u64 },
}

impl SyncError {
    pub fn parse(what: impl Into<String>, reason: impl ToString) -> Self {
        SyncError::Parse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// Returns `true` for the index-corruption case that must never be retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::HeightAhead { .. })
    }
}
