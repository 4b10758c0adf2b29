use super::replacer::Replacer;
use crate::storage::page::PageId;
use std::collections::VecDeque;

#[derive(Debug)]
pub struct LruReplacer {
    /// Tracked pages, least recently used at front
    lru_list: VecDeque<PageId>,
}

impl LruReplacer {
    pub fn new(capacity: usize) -> Self {
        Self {
            lru_list: VecDeque::with_capacity(capacity),
        }
    }

    fn position(&self, page_id: PageId) -> Option<usize> {
        self.lru_list.iter().position(|&tracked| tracked == page_id)
    }
}

impl Replacer for LruReplacer {
    fn record_access(&mut self, page_id: PageId) {
        if let Some(idx) = self.position(page_id) {
            self.lru_list.remove(idx);
        }
        self.lru_list.push_back(page_id);
    }

    fn evict(&mut self, evictable: &dyn Fn(PageId) -> bool) -> Option<PageId> {
        let idx = self
            .lru_list
            .iter()
            .position(|&page_id| evictable(page_id))?;
        self.lru_list.remove(idx)
    }

    fn remove(&mut self, page_id: PageId) {
        if let Some(idx) = self.position(page_id) {
            self.lru_list.remove(idx);
        }
    }

    fn size(&self) -> usize {
        self.lru_list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TableId;

    fn page(n: u32) -> PageId {
        PageId::new(TableId(1), n)
    }

    fn any(_: PageId) -> bool {
        true
    }

    #[test]
    fn test_basic_lru_operations() {
        let mut replacer = LruReplacer::new(3);

        // Initially empty
        assert_eq!(replacer.size(), 0);
        assert_eq!(replacer.evict(&any), None);

        replacer.record_access(page(1));
        replacer.record_access(page(2));
        replacer.record_access(page(3));
        assert_eq!(replacer.size(), 3);

        assert_eq!(replacer.evict(&any), Some(page(1)));
        assert_eq!(replacer.evict(&any), Some(page(2)));
        assert_eq!(replacer.evict(&any), Some(page(3)));
        assert_eq!(replacer.evict(&any), None);
    }

    #[test]
    fn test_access_refreshes_recency() {
        let mut replacer = LruReplacer::new(3);

        replacer.record_access(page(1));
        replacer.record_access(page(2));
        replacer.record_access(page(1));
        assert_eq!(replacer.size(), 2);

        assert_eq!(replacer.evict(&any), Some(page(2)));
        assert_eq!(replacer.evict(&any), Some(page(1)));
    }

    #[test]
    fn test_evict_skips_rejected() {
        let mut replacer = LruReplacer::new(3);

        replacer.record_access(page(1));
        replacer.record_access(page(2));
        replacer.record_access(page(3));

        // Page 1 is pinned or dirty.
        let not_one = |page_id: PageId| page_id != page(1);
        assert_eq!(replacer.evict(&not_one), Some(page(2)));
        assert_eq!(replacer.evict(&not_one), Some(page(3)));
        assert_eq!(replacer.evict(&not_one), None);
        assert_eq!(replacer.size(), 1);
    }

    #[test]
    fn test_remove() {
        let mut replacer = LruReplacer::new(2);

        replacer.record_access(page(1));
        replacer.record_access(page(2));
        replacer.remove(page(1));
        // Removing an untracked page is a no-op.
        replacer.remove(page(999));

        assert_eq!(replacer.size(), 1);
        assert_eq!(replacer.evict(&any), Some(page(2)));
    }
}
