//! Error types for probelog

use thiserror::Error;

/// Errors surfaced by the session-record store and its collaborators.
///
/// Failures are returned to the caller for handling at the user boundary
/// (save button, export button); nothing is retried or swallowed here.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Backing store unreachable: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed backing store: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to parse stored value: {0}")]
    Parse(String),

    #[error("Spreadsheet export failed: {0}")]
    Export(String),

    #[error("Invalid input: {0}")]
    Validation(String),
}
