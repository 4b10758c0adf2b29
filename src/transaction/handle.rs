use crate::error::Result;
use crate::storage::buffer::BufferPool;
use crate::transaction::id::TransactionId;
use std::sync::Arc;

/// Owning handle for one running transaction.
///
/// Dropping a handle that was neither committed nor aborted rolls the
/// transaction back.
pub struct Transaction {
    id: TransactionId,
    buffer_pool: Arc<BufferPool>,
    completed: bool,
}

impl Transaction {
    pub fn new(id: TransactionId, buffer_pool: Arc<BufferPool>) -> Self {
        Self {
            id,
            buffer_pool,
            completed: false,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Flushes every page the transaction dirtied and releases its locks.
    pub fn commit(mut self) -> Result<()> {
        self.completed = true;
        self.buffer_pool.transaction_complete(self.id, true)
    }

    /// Restores the pages the transaction dirtied and releases its locks.
    pub fn abort(mut self) -> Result<()> {
        self.completed = true;
        self.buffer_pool.transaction_complete(self.id, false)
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if !self.completed {
            if let Err(e) = self.buffer_pool.transaction_complete(self.id, false) {
                log::warn!("abort of dropped transaction {} failed: {}", self.id, e);
            }
        }
    }
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("id", &self.id)
            .field("completed", &self.completed)
            .finish()
    }
}
