//! Error taxonomy shared by every layer above raw page I/O.

use crate::catalog::TableId;
use crate::storage::error::StorageError;
use crate::storage::page::PageId;
use crate::transaction::TransactionId;
use std::fmt;
use thiserror::Error;

/// Why the lock manager refused to grant a lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// Waiting would close a cycle in the waits-for graph.
    Deadlock,
    /// The wait exceeded the configured bound.
    LockTimeout,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::Deadlock => write!(f, "deadlock detected"),
            AbortReason::LockTimeout => write!(f, "lock wait timed out"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Schema mismatch: expected [{expected}], got [{actual}]")]
    SchemaMismatch { expected: String, actual: String },

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Page {0} is full")]
    PageFull(PageId),

    #[error("Buffer pool is full: none of the {capacity} cached pages can be evicted")]
    BufferPoolFull { capacity: usize },

    #[error("Tuple is not on page {0}")]
    TupleNotOnThisPage(PageId),

    #[error("Tuple has no recorded location")]
    TupleNotStored,

    #[error("Transaction {tid} aborted: {reason}")]
    TransactionAborted { tid: TransactionId, reason: AbortReason },

    #[error("No such element: {0}")]
    NoSuchElement(&'static str),

    #[error("Invalid iterator state: {0}")]
    IteratorState(&'static str),

    #[error("Unknown table: {0}")]
    UnknownTable(TableId),
}

impl DbError {
    /// True for the concurrency-control failures the caller must answer by
    /// aborting the whole transaction.
    pub fn is_abort(&self) -> bool {
        matches!(self, DbError::TransactionAborted { .. })
    }
}

pub type Result<T> = std::result::Result<T, DbError>;
