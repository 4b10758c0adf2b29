//! Transaction identity and lifecycle.
//!
//! A transaction is nothing more than an id threaded through every page
//! access; the buffer pool tracks its locks and before-images. The
//! `Transaction` handle ties commit and abort to ownership.

pub mod handle;
pub mod id;

pub use handle::Transaction;
pub use id::{TransactionId, TransactionIdGenerator};
