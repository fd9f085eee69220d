//! Pool construction shared by the relational and key-value clients.
//!
//! Both sides use bb8. Checkout blocks while the pool is saturated, bounded by
//! the configured acquire timeout. Idle connections above the idle cap are
//! closed by the pool reaper once they have sat idle for the idle timeout.

use std::fmt;
use std::time::Duration;

use bb8::{Builder, ManageConnection, Pool};

use crate::error::{DbEngineError, checkout_error};
use crate::executor::SqlConn;

#[cfg(feature = "mysql")]
use crate::mysql::MyManager;
#[cfg(feature = "postgres")]
use crate::postgres::PgManager;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteManager;

/// bb8's pool size when none is configured.
pub const DEFAULT_MAX_SIZE: u32 = 10;

/// Static bounds applied once when a pool is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolBounds {
    /// Maximum connections; 0 keeps bb8's default.
    pub max_size: u32,
    /// Idle connections kept warm; 0 disables the floor.
    pub max_idle: u32,
    /// Idle connections above the floor are closed after this long; zero
    /// never reaps.
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl PoolBounds {
    /// Pool size bb8 will actually use.
    #[must_use]
    pub fn effective_max_size(&self) -> u32 {
        if self.max_size == 0 {
            DEFAULT_MAX_SIZE
        } else {
            self.max_size
        }
    }

    /// Idle floor, capped at the pool size.
    #[must_use]
    pub fn effective_min_idle(&self) -> Option<u32> {
        (self.max_idle > 0).then(|| self.max_idle.min(self.effective_max_size()))
    }

    #[must_use]
    pub fn effective_idle_timeout(&self) -> Option<Duration> {
        (!self.idle_timeout.is_zero()).then_some(self.idle_timeout)
    }

    pub(crate) fn builder<M: ManageConnection>(&self) -> Result<Builder<M>, DbEngineError> {
        if self.acquire_timeout.is_zero() {
            return Err(DbEngineError::ConfigError(
                "acquire timeout must be greater than zero".to_string(),
            ));
        }
        Ok(Pool::builder()
            .connection_timeout(self.acquire_timeout)
            .idle_timeout(self.effective_idle_timeout())
            .max_size(self.effective_max_size())
            .min_idle(self.effective_min_idle()))
    }
}

/// A driver connection plus whether it was left inside a transaction.
///
/// Managers report a connection with `in_transaction` still set as broken,
/// so bb8 closes it instead of handing it to the next borrower.
pub struct SessionConn<C> {
    pub(crate) conn: C,
    pub(crate) in_transaction: bool,
}

impl<C> SessionConn<C> {
    pub(crate) fn new(conn: C) -> Self {
        Self {
            conn,
            in_transaction: false,
        }
    }
}

/// Everything needed to open connections to one relational database,
/// assembled once from the configuration.
#[derive(Debug, Clone)]
pub enum ConnectTarget {
    #[cfg(feature = "postgres")]
    Postgres(tokio_postgres::Config),
    #[cfg(feature = "sqlite")]
    Sqlite(String),
    #[cfg(feature = "mysql")]
    Mysql(mysql_async::Opts),
}

/// Connection pool for one relational database.
#[derive(Clone)]
pub enum SqlPool {
    /// `PostgreSQL` connection pool
    #[cfg(feature = "postgres")]
    Postgres(Pool<PgManager>),
    /// `SQLite` connection pool
    #[cfg(feature = "sqlite")]
    Sqlite(Pool<SqliteManager>),
    /// `MySQL` connection pool
    #[cfg(feature = "mysql")]
    Mysql(Pool<MyManager>),
}

impl fmt::Debug for SqlPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (name, state) = match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(pool) => ("Postgres", pool.state()),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(pool) => ("Sqlite", pool.state()),
            #[cfg(feature = "mysql")]
            Self::Mysql(pool) => ("Mysql", pool.state()),
        };
        f.debug_struct(name)
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

impl SqlPool {
    /// Build the pool for `target` and verify one connection can be opened.
    ///
    /// # Errors
    /// Returns `DbEngineError::ConfigError` for invalid bounds and the driver
    /// error if the first connection fails.
    pub async fn connect(target: &ConnectTarget, bounds: PoolBounds) -> Result<Self, DbEngineError> {
        let pool = match target {
            #[cfg(feature = "postgres")]
            ConnectTarget::Postgres(config) => {
                SqlPool::Postgres(bounds.builder()?.build_unchecked(PgManager::new(config.clone())))
            }
            #[cfg(feature = "sqlite")]
            ConnectTarget::Sqlite(path) => {
                SqlPool::Sqlite(bounds.builder()?.build_unchecked(SqliteManager::new(path.as_str())))
            }
            #[cfg(feature = "mysql")]
            ConnectTarget::Mysql(opts) => {
                SqlPool::Mysql(bounds.builder()?.build_unchecked(MyManager::new(opts.clone())))
            }
        };
        tracing::debug!(
            pool = ?pool,
            max_size = bounds.effective_max_size(),
            min_idle = ?bounds.effective_min_idle(),
            "relational pool built"
        );
        // fail fast on unreachable databases
        drop(pool.checkout().await?);
        Ok(pool)
    }

    /// Check a connection out of the pool, waiting while it is saturated.
    pub(crate) async fn checkout(&self) -> Result<SqlConn, DbEngineError> {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(pool) => pool
                .get_owned()
                .await
                .map(SqlConn::Postgres)
                .map_err(checkout_error),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(pool) => pool
                .get_owned()
                .await
                .map(SqlConn::Sqlite)
                .map_err(checkout_error),
            #[cfg(feature = "mysql")]
            Self::Mysql(pool) => pool
                .get_owned()
                .await
                .map(SqlConn::Mysql)
                .map_err(checkout_error),
        }
    }

    /// Current `(connections, idle_connections)` of the pool.
    #[must_use]
    pub fn state(&self) -> (u32, u32) {
        let state = match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(pool) => pool.state(),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(pool) => pool.state(),
            #[cfg(feature = "mysql")]
            Self::Mysql(pool) => pool.state(),
        };
        (state.connections, state.idle_connections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(max_size: u32, max_idle: u32, idle_secs: u64) -> PoolBounds {
        PoolBounds {
            max_size,
            max_idle,
            idle_timeout: Duration::from_secs(idle_secs),
            acquire_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn zero_acquire_timeout_is_rejected() {
        let mut b = bounds(4, 2, 60);
        b.acquire_timeout = Duration::ZERO;
        #[cfg(feature = "sqlite")]
        assert!(matches!(
            b.builder::<SqliteManager>(),
            Err(DbEngineError::ConfigError(_))
        ));
    }

    #[test]
    fn zero_idle_timeout_never_reaps() {
        assert_eq!(bounds(4, 2, 0).effective_idle_timeout(), None);
        assert_eq!(
            bounds(4, 2, 30).effective_idle_timeout(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn idle_floor_is_capped_by_effective_size() {
        assert_eq!(bounds(0, 20, 60).effective_max_size(), DEFAULT_MAX_SIZE);
        assert_eq!(bounds(0, 20, 60).effective_min_idle(), Some(DEFAULT_MAX_SIZE));
        assert_eq!(bounds(4, 20, 60).effective_min_idle(), Some(4));
        assert_eq!(bounds(8, 3, 60).effective_min_idle(), Some(3));
        assert_eq!(bounds(0, 0, 60).effective_min_idle(), None);
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn edge_bounds_build_without_panicking() {
        for b in [bounds(0, 20, 0), bounds(0, 0, 0), bounds(2, 5, 0)] {
            let pool = b
                .builder::<SqliteManager>()
                .unwrap()
                .build_unchecked(SqliteManager::new(":memory:"));
            assert!(pool.state().connections <= b.effective_max_size());
        }
    }
}
