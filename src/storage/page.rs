pub mod heap_page;

use crate::catalog::TableId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of a serialized [`PageId`] record.
pub const PAGE_ID_RECORD_SIZE: usize = 8;

/// Identity of one page: the table it belongs to and its position in the
/// table file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PageId {
    pub table_id: TableId,
    pub page_number: u32,
}

impl PageId {
    pub fn new(table_id: TableId, page_number: u32) -> Self {
        Self {
            table_id,
            page_number,
        }
    }

    /// Fixed-size binary record of this id.
    pub fn to_record(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_record(data: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(data)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.table_id.0, self.page_number)
    }
}

pub use heap_page::HeapPage;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_and_hash_by_value() {
        let a = PageId::new(TableId(3), 7);
        let b = PageId::new(TableId(3), 7);
        let c = PageId::new(TableId(3), 8);
        let d = PageId::new(TableId(4), 7);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);

        let set: HashSet<PageId> = [a, b, c, d].into_iter().collect();
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_record_is_fixed_size() -> anyhow::Result<()> {
        for id in [
            PageId::new(TableId(0), 0),
            PageId::new(TableId(u32::MAX), 12345),
        ] {
            let record = id.to_record()?;
            assert_eq!(record.len(), PAGE_ID_RECORD_SIZE);
            assert_eq!(PageId::from_record(&record)?, id);
        }
        Ok(())
    }

    #[test]
    fn test_display() {
        assert_eq!(PageId::new(TableId(12), 3).to_string(), "12#3");
    }
}
