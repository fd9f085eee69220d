//! Convenient imports for common functionality.

pub use crate::config::{KvConfig, SqlDbConfig};
pub use crate::decorator::Decorator;
pub use crate::error::DbEngineError;
pub use crate::executor::ExecOutcome;
pub use crate::mapping::{FromRow, FromValue, map_rows_into};
pub use crate::pool::SqlPool;
pub use crate::results::{DbRow, ResultSet};
pub use crate::sqldb::SqlDb;
pub use crate::statement::Statement;
pub use crate::transaction::{Transaction, TxState};
pub use crate::types::{DatabaseType, Dialect, RowValues};

#[cfg(feature = "kv")]
pub use crate::kv::KvDb;
