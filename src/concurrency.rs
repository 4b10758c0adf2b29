//! Concurrency control.
//!
//! Page-level strict two-phase locking with shared and exclusive modes.
//! Deadlocks are detected on a waits-for graph and broken by failing the
//! requesting transaction; a bounded wait catches anything the graph misses.

pub mod lock;

pub use lock::{LockManager, LockMode};
