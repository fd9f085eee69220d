//! `SQLite` backend: bb8 manager over blocking `rusqlite` connections.
//!
//! Each pooled connection sits behind an async mutex and every call runs on
//! the blocking thread pool.

pub mod manager;
pub mod params;
pub mod query;

pub use manager::{SharedSqliteConnection, SqliteManager};
pub use query::{build_result_set, sqlite_extract_value_sync};
