use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Store failures pass the backend message through verbatim; the caller
    /// retries manually.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Import error: {0}")]
    Import(#[from] outlay_import::ImportError),

    #[error("Pending transaction not found: {0}")]
    NotFound(String),

    #[error("Transaction {0} has no category to confirm")]
    Unclassified(String),

    /// A batch was rejected before any store write; the indices identify the
    /// offending entries in the submitted order.
    #[error("Batch rejected: {} invalid entries at indices {:?}", .0.len(), .0)]
    InvalidEntries(Vec<usize>),

    #[error("Malformed stored record: {0}")]
    Codec(#[from] serde_json::Error),
}
