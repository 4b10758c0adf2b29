use crate::storage::page::PageId;
use std::fmt::Debug;

pub trait Replacer: Send + Sync + Debug {
    /// Records an access to a cached page, making it the most recently used.
    fn record_access(&mut self, page_id: PageId);

    /// Selects and stops tracking a page to evict, skipping pages rejected
    /// by `evictable`. Returns None if no tracked page qualifies.
    fn evict(&mut self, evictable: &dyn Fn(PageId) -> bool) -> Option<PageId>;

    /// Stops tracking a page that left the cache by other means.
    fn remove(&mut self, page_id: PageId);

    /// Get the number of tracked pages.
    fn size(&self) -> usize;
}
