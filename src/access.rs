//! Access layer for tuple-oriented operations.
//!
//! This module provides the logical record model and table storage:
//!
//! - **Field / DataType**: fixed-width typed values and their comparisons
//! - **Schema**: ordered, optionally named column types of a tuple
//! - **Tuple**: one record plus the page slot it was read from
//! - **HeapFile**: a table stored as a file of heap pages
//! - **HeapFileIterator**: page-by-page scan through the buffer pool

pub mod field;
pub mod heap;
pub mod scan;
pub mod schema;
pub mod tuple;

pub use field::{DataType, Field, Op};
pub use heap::HeapFile;
pub use scan::HeapFileIterator;
pub use schema::{ColumnInfo, Schema};
pub use tuple::{Tuple, TupleId};
