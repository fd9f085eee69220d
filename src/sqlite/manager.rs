use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bb8::ManageConnection;
use tokio::sync::Mutex;

use crate::error::DbEngineError;

/// Shared handle to a rusqlite connection guarded by a mutex for async access.
pub type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// bb8 manager opening `SQLite` connections on one database path.
pub struct SqliteManager {
    path: String,
}

impl SqliteManager {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl ManageConnection for SqliteManager {
    type Connection = SharedSqliteConnection;
    type Error = DbEngineError;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let path = self.path.clone();
        async move {
            tracing::debug!(path = %path, "sqlite connect");
            let conn = tokio::task::spawn_blocking(move || {
                let conn = rusqlite::Connection::open(&path)?;
                conn.busy_timeout(BUSY_TIMEOUT)?;
                conn.query_row("PRAGMA journal_mode = WAL", [], |_| Ok(()))?;
                Ok::<_, DbEngineError>(conn)
            })
            .await
            .map_err(|e| {
                DbEngineError::ConnectionError(format!("sqlite open join error: {e}"))
            })??;
            Ok(Arc::new(Mutex::new(conn)))
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        let handle = Arc::clone(conn);
        async move {
            run_blocking(handle, |conn| {
                conn.query_row("SELECT 1", [], |_| Ok(()))?;
                Ok(())
            })
            .await
        }
    }

    /// A connection still inside a transaction, or still held by a
    /// cancelled blocking call, is not reusable.
    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        !conn.try_lock().is_ok_and(|guard| guard.is_autocommit())
    }
}

/// Run `func` against the connection on the blocking thread pool.
pub(crate) async fn run_blocking<F, R>(
    conn: SharedSqliteConnection,
    func: F,
) -> Result<R, DbEngineError>
where
    F: FnOnce(&mut rusqlite::Connection) -> Result<R, DbEngineError> + Send + 'static,
    R: Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await
    .map_err(|e| DbEngineError::ExecutionError(format!("sqlite spawn_blocking join error: {e}")))?
}
