//! Storage layer.
//!
//! Page-based persistence for heap tables:
//!
//! - **PageId**: table id plus page number, the unit of caching and locking
//! - **HeapPage**: slotted page with an occupancy bitmap
//! - **PageManager**: reads and writes whole pages of one file
//! - **BufferPool**: page cache, page locks and transaction completion

pub mod buffer;
pub mod disk;
pub mod error;
pub mod page;

pub use buffer::{BufferPool, PageHandle, Permission};
pub use disk::PageManager;
pub use page::{HeapPage, PageId};
