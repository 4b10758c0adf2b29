pub mod access;
pub mod catalog;
pub mod concurrency;
pub mod config;
pub mod database;
pub mod error;
pub mod executor;
pub mod storage;
pub mod transaction;

pub use config::DatabaseConfig;
pub use database::Database;
pub use error::{DbError, Result};
