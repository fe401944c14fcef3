//! Error types for the ledger core.

use thiserror::Error;

/// Result type alias for ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur in the ledger core or its CLI.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// No caller identity could be resolved
    #[error("not signed in")]
    Unauthenticated,

    /// A user, account, or transaction is absent or not owned by the caller
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Malformed caller input (non-numeric balance, unknown account kind, ...)
    #[error("invalid {field}: {message}")]
    InvalidArgument {
        field: &'static str,
        message: String,
    },

    /// The storage layer failed; any in-flight atomic unit was rolled back
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// CSV statement export error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to serialize a payload for output
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failed to read or write a stream
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Bad command-line invocation
    #[error("usage: {0}")]
    Usage(&'static str),
}
