//! Pooled database clients.
//!
//! [`SqlDb`] talks to Postgres, `SQLite` or `MySQL` (behind the `mysql`
//! feature) through a `bb8` pool and builds
//! `SELECT`/`INSERT`/`UPDATE`/`DELETE`/`COUNT` statements from a table name,
//! a column list and an optional [`Decorator`] carrying `WHERE`, `GROUP BY`,
//! `ORDER BY` and `LIMIT` clauses. Rows map into caller types through
//! [`FromRow`]. [`KvDb`] is the matching pooled key-value client.
//!
//! ```rust,no_run
//! use db_engine::prelude::*;
//!
//! # async fn demo() -> Result<(), DbEngineError> {
//! let mut db = SqlDb::new(DatabaseType::Sqlite, SqlDbConfig::new("app.db"))?;
//! db.connect().await?;
//! let n = db
//!     .count("test", Some(Decorator::new().where_clause("value = ?", ["name"])))
//!     .await?;
//! # let _ = n;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod decorator;
pub mod error;
pub mod executor;
pub mod mapping;
pub mod pool;
pub mod prelude;
pub mod results;
pub mod sanitize;
pub mod sqldb;
pub mod statement;
pub mod transaction;
pub mod translation;
pub mod types;

#[cfg(feature = "kv")]
pub mod kv;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use config::{KvConfig, SqlDbConfig};
pub use decorator::Decorator;
pub use error::DbEngineError;
pub use executor::ExecOutcome;
pub use mapping::{FromRow, FromValue, map_rows_into};
pub use pool::{ConnectTarget, PoolBounds, SqlPool};
pub use results::{DbRow, ResultSet};
pub use sqldb::SqlDb;
pub use statement::Statement;
pub use transaction::{Transaction, TxState};
pub use types::{DatabaseType, Dialect, RowValues};

#[cfg(feature = "kv")]
pub use kv::KvDb;
