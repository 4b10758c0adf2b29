//! Storage layer error types.

use crate::storage::page::PageId;
use thiserror::Error;

/// Errors raised by raw page I/O on a table file.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Page not found: {page_id} (file has {num_pages} pages)")]
    PageNotFound { page_id: PageId, num_pages: u32 },

    #[error("Short read on page {page_id}: got {read} of {expected} bytes")]
    ShortRead {
        page_id: PageId,
        read: usize,
        expected: usize,
    },

    #[error("Buffer size must be the page size ({expected}), got {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
