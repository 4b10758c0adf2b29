//! Sequential access to every tuple of a heap file.

use crate::access::heap::HeapFile;
use crate::access::tuple::Tuple;
use crate::error::{DbError, Result};
use crate::storage::buffer::{BufferPool, Permission};
use crate::storage::page::PageId;
use crate::transaction::TransactionId;
use std::sync::Arc;
use std::vec;

/// Walks a heap file page by page, slot order within a page. Pages are
/// fetched read-only through the buffer pool, so the scan holds a shared
/// lock on every page it has visited until the transaction ends.
#[derive(Debug)]
pub struct HeapFileIterator {
    file: Arc<HeapFile>,
    pool: Arc<BufferPool>,
    tid: TransactionId,
    page_number: u32,
    /// Remaining tuples of the current page; None unless open.
    tuples: Option<vec::IntoIter<Tuple>>,
    /// Tuple confirmed by the last successful `has_next`.
    pending: Option<Tuple>,
}

impl HeapFileIterator {
    pub fn new(file: Arc<HeapFile>, tid: TransactionId, pool: Arc<BufferPool>) -> Self {
        Self {
            file,
            pool,
            tid,
            page_number: 0,
            tuples: None,
            pending: None,
        }
    }

    pub fn open(&mut self) -> Result<()> {
        self.page_number = 0;
        self.pending = None;
        self.tuples = Some(if self.file.num_pages()? == 0 {
            Vec::new().into_iter()
        } else {
            self.load_page(0)?
        });
        Ok(())
    }

    fn load_page(&self, page_number: u32) -> Result<vec::IntoIter<Tuple>> {
        let page_id = PageId::new(self.file.table_id(), page_number);
        let page = self.pool.get_page(self.tid, page_id, Permission::ReadOnly)?;
        let tuples: Vec<Tuple> = page.read().iter().cloned().collect();
        Ok(tuples.into_iter())
    }

    pub fn has_next(&mut self) -> Result<bool> {
        if self.pending.is_some() {
            return Ok(true);
        }

        loop {
            let Some(tuples) = self.tuples.as_mut() else {
                return Ok(false);
            };
            if let Some(tuple) = tuples.next() {
                self.pending = Some(tuple);
                return Ok(true);
            }
            if self.page_number + 1 >= self.file.num_pages()? {
                return Ok(false);
            }
            self.page_number += 1;
            let next_page = self.load_page(self.page_number)?;
            self.tuples = Some(next_page);
        }
    }

    /// Returns the tuple found by the preceding `has_next`.
    pub fn next(&mut self) -> Result<Tuple> {
        self.pending
            .take()
            .ok_or(DbError::NoSuchElement("heap file iterator has no pending tuple"))
    }

    pub fn rewind(&mut self) -> Result<()> {
        self.close();
        self.open()
    }

    pub fn close(&mut self) {
        self.tuples = None;
        self.pending = None;
    }
}
