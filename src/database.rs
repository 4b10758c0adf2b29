use crate::access::heap::HeapFile;
use crate::access::schema::Schema;
use crate::catalog::{Catalog, TableId};
use crate::config::DatabaseConfig;
use crate::error::Result;
use crate::executor::ExecutionContext;
use crate::storage::buffer::BufferPool;
use crate::transaction::{Transaction, TransactionIdGenerator};
use std::path::Path;
use std::sync::Arc;

/// High-level database interface that integrates all layers
///
/// Owns the catalog, the buffer pool and the transaction id sequence. Every
/// component reaches the others through this handle; there is no process
/// global state, so several databases can coexist.
#[derive(Debug)]
pub struct Database {
    config: DatabaseConfig,
    catalog: Arc<Catalog>,
    buffer_pool: Arc<BufferPool>,
    txn_ids: TransactionIdGenerator,
}

impl Database {
    pub fn new(config: DatabaseConfig) -> Self {
        let catalog = Arc::new(Catalog::new());
        let buffer_pool = Arc::new(BufferPool::new(
            catalog.clone(),
            config.pool_pages,
            config.lock_timeout,
        ));
        log::debug!(
            "database opened: page size {}, {} cached pages",
            config.page_size,
            config.pool_pages
        );

        Self {
            config,
            catalog,
            buffer_pool,
            txn_ids: TransactionIdGenerator::new(),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.buffer_pool
    }

    /// Shared resources handed to executors.
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new(self.catalog.clone(), self.buffer_pool.clone())
    }

    /// Starts a transaction. Dropping the handle without committing aborts it.
    pub fn begin(&self) -> Transaction {
        Transaction::new(self.txn_ids.next(), self.buffer_pool.clone())
    }

    /// Opens (or creates) the table file at `path` and registers it as
    /// `name`, replacing any table of that name.
    pub fn create_table(
        &self,
        path: &Path,
        schema: Arc<Schema>,
        name: impl Into<String>,
    ) -> Result<TableId> {
        let file = HeapFile::open(path, schema, self.config.page_size)?;
        Ok(self.catalog.add_table(Arc::new(file), name))
    }

    /// Writes every dirty cached page to disk.
    pub fn flush(&self) -> Result<()> {
        self.buffer_pool.flush_all_pages()
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new(DatabaseConfig::default())
    }
}
