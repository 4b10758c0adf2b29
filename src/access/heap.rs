use crate::access::scan::HeapFileIterator;
use crate::access::schema::Schema;
use crate::access::tuple::Tuple;
use crate::catalog::TableId;
use crate::error::{DbError, Result};
use crate::storage::buffer::{BufferPool, PageHandle, Permission};
use crate::storage::disk::PageManager;
use crate::storage::page::heap_page::slots_per_page;
use crate::storage::page::{HeapPage, PageId};
use crate::transaction::TransactionId;
use parking_lot::Mutex;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// One table stored as a sequence of fixed-size heap pages in a single file.
///
/// The file holds pages only; the page count is derived from its length on
/// every call. Tuple placement goes through the buffer pool so every page
/// touched is locked for the calling transaction.
#[derive(Debug)]
pub struct HeapFile {
    page_manager: Mutex<PageManager>,
    path: PathBuf,
    table_id: TableId,
    schema: Arc<Schema>,
    page_size: usize,
}

impl HeapFile {
    /// Opens the table file at `path`, creating it empty if missing. The
    /// table id is derived from the canonical path.
    pub fn open(path: &Path, schema: Arc<Schema>, page_size: usize) -> Result<Self> {
        let page_manager = PageManager::open(path, page_size)?;
        let path = path
            .canonicalize()
            .map_err(crate::storage::error::StorageError::from)?;

        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        let table_id = TableId(hasher.finish() as u32);

        Ok(Self {
            page_manager: Mutex::new(page_manager),
            path,
            table_id,
            schema,
            page_size,
        })
    }

    pub fn table_id(&self) -> TableId {
        self.table_id
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn num_pages(&self) -> Result<u32> {
        Ok(self.page_manager.lock().num_pages()?)
    }

    /// Reads and decodes one page straight from the file.
    pub fn read_page(&self, page_id: PageId) -> Result<HeapPage> {
        let mut data = HeapPage::empty_page_data(self.page_size);
        self.page_manager.lock().read_page(page_id, &mut data)?;
        HeapPage::decode(page_id, self.schema.clone(), &data)
    }

    pub fn write_page(&self, page: &HeapPage) -> Result<()> {
        let data = page.encode()?;
        self.page_manager.lock().write_page(page.page_id(), &data)?;
        Ok(())
    }

    /// Grows the file by one empty page.
    pub fn append_empty_page(&self) -> Result<PageId> {
        let page_id = self.page_manager.lock().allocate_page(self.table_id)?;
        log::debug!("table {} grew to page {}", self.table_id, page_id.page_number);
        Ok(page_id)
    }

    /// Places `tuple` in the first page with a free slot, appending a page
    /// when every existing one is full. Returns the pages modified.
    pub fn insert_tuple(
        &self,
        tid: TransactionId,
        mut tuple: Tuple,
        pool: &BufferPool,
    ) -> Result<Vec<PageHandle>> {
        if slots_per_page(self.page_size, self.schema.byte_size()) == 0 {
            return Err(DbError::Schema(format!(
                "{}-byte tuples do not fit in {}-byte pages",
                self.schema.byte_size(),
                self.page_size
            )));
        }

        for page_number in 0..self.num_pages()? {
            let page_id = PageId::new(self.table_id, page_number);
            let page = pool.get_page(tid, page_id, Permission::ReadOnly)?;
            if page.read().num_empty_slots() == 0 {
                continue;
            }

            let page = pool.get_page(tid, page_id, Permission::ReadWrite)?;
            page.write().insert_tuple(&mut tuple)?;
            return Ok(vec![page]);
        }

        let page_id = self.append_empty_page()?;
        let page = pool.get_page(tid, page_id, Permission::ReadWrite)?;
        page.write().insert_tuple(&mut tuple)?;
        Ok(vec![page])
    }

    /// Frees the slot `tuple` was read from. Returns the pages modified.
    pub fn delete_tuple(
        &self,
        tid: TransactionId,
        tuple: &Tuple,
        pool: &BufferPool,
    ) -> Result<Vec<PageHandle>> {
        let page_id = tuple.tuple_id().ok_or(DbError::TupleNotStored)?.page_id;
        if page_id.table_id != self.table_id {
            return Err(DbError::TupleNotOnThisPage(page_id));
        }

        let page = pool.get_page(tid, page_id, Permission::ReadWrite)?;
        page.write().delete_tuple(tuple)?;
        Ok(vec![page])
    }

    /// Iterator over every tuple of the table, read through `pool` under
    /// `tid`.
    pub fn iterator(self: &Arc<Self>, tid: TransactionId, pool: Arc<BufferPool>) -> HeapFileIterator {
        HeapFileIterator::new(Arc::clone(self), tid, pool)
    }
}
