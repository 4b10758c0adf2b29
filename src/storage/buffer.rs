//! Buffer pool: the single gateway for page access.
//!
//! Every page read or written by an operator is requested here under a
//! transaction id and a permission. The pool takes the matching page lock,
//! serves the page from its cache (loading it through the owning heap file on
//! a miss), and keeps a before-image of every page handed out for writing so
//! an abort can restore it. Dirty pages are never evicted (NO-STEAL); they
//! reach disk when their transaction commits or through an explicit flush.

pub mod lru;
pub mod replacer;

use crate::access::tuple::Tuple;
use crate::catalog::{Catalog, TableId};
use crate::concurrency::lock::{LockManager, LockMode};
use crate::error::{DbError, Result};
use crate::storage::page::{HeapPage, PageId};
use crate::transaction::TransactionId;
use lru::LruReplacer;
use parking_lot::{Mutex, RwLock};
use replacer::Replacer;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Shared handle to a cached page. Holding a clone pins the page in the pool.
pub type PageHandle = Arc<RwLock<HeapPage>>;

/// Access requested for a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ReadOnly,
    ReadWrite,
}

impl Permission {
    fn lock_mode(self) -> LockMode {
        match self {
            Permission::ReadOnly => LockMode::Shared,
            Permission::ReadWrite => LockMode::Exclusive,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    page: PageHandle,
    /// Content before the current writer's first access.
    before_image: Option<HeapPage>,
}

impl CacheEntry {
    fn is_pinned(&self) -> bool {
        Arc::strong_count(&self.page) > 1
    }
}

#[derive(Debug)]
struct PoolState {
    pages: HashMap<PageId, CacheEntry>,
    replacer: Box<dyn Replacer>,
}

#[derive(Debug)]
pub struct BufferPool {
    catalog: Arc<Catalog>,
    state: Mutex<PoolState>,
    lock_manager: LockManager,
    capacity: usize,
}

impl BufferPool {
    pub fn new(catalog: Arc<Catalog>, capacity: usize, lock_timeout: Duration) -> Self {
        Self::with_replacer(
            catalog,
            capacity,
            lock_timeout,
            Box::new(LruReplacer::new(capacity)),
        )
    }

    pub fn with_replacer(
        catalog: Arc<Catalog>,
        capacity: usize,
        lock_timeout: Duration,
        replacer: Box<dyn Replacer>,
    ) -> Self {
        Self {
            catalog,
            state: Mutex::new(PoolState {
                pages: HashMap::with_capacity(capacity),
                replacer,
            }),
            lock_manager: LockManager::new(lock_timeout),
            capacity,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of pages currently cached.
    pub fn num_cached(&self) -> usize {
        self.state.lock().pages.len()
    }

    pub fn is_cached(&self, page_id: PageId) -> bool {
        self.state.lock().pages.contains_key(&page_id)
    }

    /// Locks `page_id` for `tid` and returns the cached page, loading it from
    /// its heap file on a miss.
    ///
    /// Fails with `TransactionAborted` if the lock cannot be granted; the
    /// caller must then abort the transaction.
    pub fn get_page(
        &self,
        tid: TransactionId,
        page_id: PageId,
        perm: Permission,
    ) -> Result<PageHandle> {
        let file = self.catalog.database_file(page_id.table_id)?;
        self.lock_manager.acquire(tid, page_id, perm.lock_mode())?;

        let mut state = self.state.lock();
        if !state.pages.contains_key(&page_id) && state.pages.len() >= self.capacity {
            self.evict_page(&mut state)?;
        }

        let PoolState { pages, replacer } = &mut *state;
        let entry = match pages.entry(page_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(vacant) => {
                let page = file.read_page(page_id)?;
                log::trace!("loaded page {}", page_id);
                vacant.insert(CacheEntry {
                    page: Arc::new(RwLock::new(page)),
                    before_image: None,
                })
            }
        };
        if perm == Permission::ReadWrite && entry.before_image.is_none() {
            let mut before = entry.page.read().clone();
            before.mark_dirty(false, tid);
            entry.before_image = Some(before);
        }
        replacer.record_access(page_id);

        Ok(entry.page.clone())
    }

    /// Drops the least recently used page that is clean and not pinned.
    fn evict_page(&self, state: &mut PoolState) -> Result<()> {
        let PoolState { pages, replacer } = state;
        let victim = replacer.evict(&|page_id| {
            pages.get(&page_id).is_some_and(|entry| {
                !entry.is_pinned() && entry.page.try_read().is_some_and(|page| !page.is_dirty())
            })
        });

        match victim {
            Some(page_id) => {
                pages.remove(&page_id);
                log::debug!("evicted page {}", page_id);
                Ok(())
            }
            None => {
                log::warn!("buffer pool full: {} pages, none evictable", pages.len());
                Err(DbError::BufferPoolFull {
                    capacity: self.capacity,
                })
            }
        }
    }

    /// Adds `tuple` to table `table_id` on behalf of `tid`, marking every
    /// page it touched dirty.
    pub fn insert_tuple(&self, tid: TransactionId, table_id: TableId, tuple: Tuple) -> Result<()> {
        let file = self.catalog.database_file(table_id)?;
        if **tuple.schema() != **file.schema() {
            return Err(DbError::SchemaMismatch {
                expected: file.schema().to_string(),
                actual: tuple.schema().to_string(),
            });
        }

        for page in file.insert_tuple(tid, tuple, self)? {
            page.write().mark_dirty(true, tid);
        }
        Ok(())
    }

    /// Removes `tuple` from the page it was read from.
    pub fn delete_tuple(&self, tid: TransactionId, tuple: &Tuple) -> Result<()> {
        let page_id = tuple.tuple_id().ok_or(DbError::TupleNotStored)?.page_id;
        let file = self.catalog.database_file(page_id.table_id)?;

        for page in file.delete_tuple(tid, tuple, self)? {
            page.write().mark_dirty(true, tid);
        }
        Ok(())
    }

    /// Writes `page_id` to its file if it is cached and dirty.
    pub fn flush_page(&self, page_id: PageId) -> Result<()> {
        let state = self.state.lock();
        match state.pages.get(&page_id) {
            Some(entry) => self.write_back(&entry.page),
            None => Ok(()),
        }
    }

    pub fn flush_all_pages(&self) -> Result<()> {
        let state = self.state.lock();
        for entry in state.pages.values() {
            self.write_back(&entry.page)?;
        }
        Ok(())
    }

    /// Writes every cached page dirtied by `tid`.
    pub fn flush_pages(&self, tid: TransactionId) -> Result<()> {
        let state = self.state.lock();
        for page_id in self.lock_manager.pages_held(tid) {
            if let Some(entry) = state.pages.get(&page_id) {
                if entry.page.read().dirtied_by() == Some(tid) {
                    self.write_back(&entry.page)?;
                }
            }
        }
        Ok(())
    }

    fn write_back(&self, page: &PageHandle) -> Result<()> {
        let mut page = page.write();
        if let Some(tid) = page.dirtied_by() {
            let file = self.catalog.database_file(page.page_id().table_id)?;
            file.write_page(&page)?;
            page.mark_dirty(false, tid);
            log::trace!("flushed page {}", page.page_id());
        }
        Ok(())
    }

    /// Drops `page_id` from the cache without writing it.
    pub fn discard_page(&self, page_id: PageId) {
        let mut state = self.state.lock();
        state.pages.remove(&page_id);
        state.replacer.remove(page_id);
    }

    pub fn holds_lock(&self, tid: TransactionId, page_id: PageId) -> bool {
        self.lock_manager.holds_lock(tid, page_id)
    }

    /// Ends `tid`. On commit its dirty pages are written to disk; on abort
    /// they are restored to their before-images. Either way every lock the
    /// transaction holds is released.
    pub fn transaction_complete(&self, tid: TransactionId, commit: bool) -> Result<()> {
        let result = if commit {
            self.flush_pages(tid)
        } else {
            Ok(())
        };

        {
            let mut state = self.state.lock();
            for page_id in self.lock_manager.pages_held(tid) {
                let Some(entry) = state.pages.get_mut(&page_id) else {
                    continue;
                };
                let before_image = entry.before_image.take();
                if commit {
                    continue;
                }

                let mut page = entry.page.write();
                if page.dirtied_by() != Some(tid) {
                    continue;
                }
                match before_image {
                    Some(before) => *page = before,
                    None => {
                        drop(page);
                        state.pages.remove(&page_id);
                        state.replacer.remove(page_id);
                    }
                }
                log::debug!("{} rolled back page {}", tid, page_id);
            }
        }

        self.lock_manager.release_all(tid);
        log::info!("{} {}", tid, if commit { "committed" } else { "aborted" });
        result
    }
}
