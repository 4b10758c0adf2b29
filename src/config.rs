//! Runtime configuration for a database instance.

use std::time::Duration;

/// Default size of a page in bytes.
pub const DEFAULT_PAGE_SIZE: usize = 4096;

/// Default number of pages the buffer pool keeps resident.
pub const DEFAULT_POOL_PAGES: usize = 50;

/// Default upper bound on a single lock wait before the requester is aborted.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(500);

/// Settings shared by every component of one `Database`.
///
/// The page size is fixed for the lifetime of the instance: every heap file
/// registered with it lays out pages of this size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub page_size: usize,
    pub pool_pages: usize,
    pub lock_timeout: Duration,
}

impl DatabaseConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_pool_pages(mut self, pool_pages: usize) -> Self {
        self.pool_pages = pool_pages;
        self
    }

    pub fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            pool_pages: DEFAULT_POOL_PAGES,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DatabaseConfig::default();
        assert_eq!(config.page_size, 4096);
        assert_eq!(config.pool_pages, 50);
        assert_eq!(config.lock_timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_builder_setters() {
        let config = DatabaseConfig::default()
            .with_page_size(128)
            .with_pool_pages(3)
            .with_lock_timeout(Duration::from_millis(20));

        assert_eq!(config.page_size, 128);
        assert_eq!(config.pool_pages, 3);
        assert_eq!(config.lock_timeout, Duration::from_millis(20));
    }
}
