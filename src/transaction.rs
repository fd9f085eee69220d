//! Single-connection unit of work.

use crate::decorator::Decorator;
use crate::error::DbEngineError;
use crate::executor::{ExecContext, ExecOutcome, SqlConn};
use crate::mapping::FromRow;
use crate::results::ResultSet;
use crate::statement::Statement;
use crate::types::RowValues;

/// Lifecycle of a [`Transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxState {
    Open,
    Committed,
    RolledBack,
    /// Neither COMMIT nor ROLLBACK succeeded. The connection was closed
    /// rather than returned to the pool, so the server discards the work.
    Aborted,
}

/// Transaction handle that owns its pooled connection until commit/rollback.
///
/// Exactly one of [`Transaction::commit`] or [`Transaction::rollback`]
/// succeeds; afterwards every call returns
/// [`DbEngineError::TransactionCompleted`]. A failed COMMIT is followed by a
/// ROLLBACK. The connection goes back to the pool only once the transaction
/// has really ended; otherwise the pool closes it. Dropping a transaction that
/// is still open rolls it back in the background when a runtime is available.
pub struct Transaction {
    conn: Option<SqlConn>,
    ctx: ExecContext,
    state: TxState,
}

impl std::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("state", &self.state)
            .field("dialect", &self.ctx.dialect)
            .finish_non_exhaustive()
    }
}

impl Transaction {
    pub(crate) async fn begin(mut conn: SqlConn, ctx: ExecContext) -> Result<Self, DbEngineError> {
        conn.execute_batch("BEGIN").await?;
        conn.set_in_transaction(true);
        Ok(Self {
            conn: Some(conn),
            ctx,
            state: TxState::Open,
        })
    }

    #[must_use]
    pub fn state(&self) -> TxState {
        self.state
    }

    fn conn_mut(&mut self) -> Result<&mut SqlConn, DbEngineError> {
        self.conn
            .as_mut()
            .ok_or(DbEngineError::TransactionCompleted)
    }

    /// Commit the transaction and release its connection.
    ///
    /// # Errors
    /// Returns `DbEngineError::TransactionCompleted` if already finished, or
    /// the driver error.
    pub async fn commit(&mut self) -> Result<(), DbEngineError> {
        self.finish("COMMIT", TxState::Committed).await
    }

    /// Roll back the transaction and release its connection.
    ///
    /// # Errors
    /// Returns `DbEngineError::TransactionCompleted` if already finished, or
    /// the driver error.
    pub async fn rollback(&mut self) -> Result<(), DbEngineError> {
        self.finish("ROLLBACK", TxState::RolledBack).await
    }

    async fn finish(&mut self, sql: &str, next: TxState) -> Result<(), DbEngineError> {
        let mut conn = self.conn.take().ok_or(DbEngineError::TransactionCompleted)?;
        let err = match conn.execute_batch(sql).await {
            Ok(()) => {
                conn.set_in_transaction(false);
                self.state = next;
                return Ok(());
            }
            Err(e) => e,
        };
        if next == TxState::Committed {
            tracing::warn!(error = %err, "commit failed; rolling back");
            if conn.execute_batch("ROLLBACK").await.is_ok() {
                conn.set_in_transaction(false);
                self.state = TxState::RolledBack;
                return Err(err);
            }
        }
        // still flagged, so the pool closes the connection on release
        tracing::warn!(error = %err, "transaction could not be ended; discarding connection");
        self.state = TxState::Aborted;
        Err(err)
    }

    /// # Errors
    /// Returns `DbEngineError::TransactionCompleted`, a sanitizer rejection, or
    /// the driver error.
    pub async fn exec_sql(
        &mut self,
        sql: &str,
        args: Vec<RowValues>,
    ) -> Result<ExecOutcome, DbEngineError> {
        let ctx = self.ctx;
        ctx.execute(self.conn_mut()?, &Statement::new(sql, args)).await
    }

    /// # Errors
    /// Returns `DbEngineError::TransactionCompleted`, a sanitizer rejection, or
    /// the driver error.
    pub async fn query_sql(
        &mut self,
        sql: &str,
        args: Vec<RowValues>,
    ) -> Result<ResultSet, DbEngineError> {
        let ctx = self.ctx;
        ctx.query(self.conn_mut()?, &Statement::new(sql, args)).await
    }

    /// Append one `T` per selected row to `dest`.
    ///
    /// # Errors
    /// See [`crate::SqlDb::select_into`].
    pub async fn select_into<T: FromRow>(
        &mut self,
        dest: &mut Vec<T>,
        table: &str,
        columns: &[&str],
        decorator: Option<Decorator>,
    ) -> Result<usize, DbEngineError> {
        let ctx = self.ctx;
        ctx.select_into(self.conn_mut()?, dest, table, columns, decorator)
            .await
    }

    /// # Errors
    /// See [`crate::SqlDb::select_into`].
    pub async fn select<T: FromRow>(
        &mut self,
        table: &str,
        columns: &[&str],
        decorator: Option<Decorator>,
    ) -> Result<Vec<T>, DbEngineError> {
        let mut dest = Vec::new();
        self.select_into(&mut dest, table, columns, decorator).await?;
        Ok(dest)
    }

    /// # Errors
    /// See [`crate::SqlDb::insert`].
    pub async fn insert(
        &mut self,
        table: &str,
        columns: &[&str],
        values: Vec<RowValues>,
        decorator: Option<Decorator>,
    ) -> Result<ExecOutcome, DbEngineError> {
        let ctx = self.ctx;
        let stmt = Statement::insert(ctx.dialect, table, columns, values, decorator)?;
        ctx.execute(self.conn_mut()?, &stmt).await
    }

    /// # Errors
    /// See [`crate::SqlDb::update`].
    pub async fn update(
        &mut self,
        table: &str,
        columns: &[&str],
        values: Vec<RowValues>,
        decorator: Option<Decorator>,
    ) -> Result<ExecOutcome, DbEngineError> {
        let ctx = self.ctx;
        let stmt = Statement::update(ctx.dialect, table, columns, values, decorator)?;
        ctx.execute(self.conn_mut()?, &stmt).await
    }

    /// # Errors
    /// See [`crate::SqlDb::delete`].
    pub async fn delete(
        &mut self,
        table: &str,
        decorator: Option<Decorator>,
    ) -> Result<ExecOutcome, DbEngineError> {
        let ctx = self.ctx;
        let stmt = Statement::delete(ctx.dialect, table, decorator);
        ctx.execute(self.conn_mut()?, &stmt).await
    }

    /// # Errors
    /// See [`crate::SqlDb::count`].
    pub async fn count(
        &mut self,
        table: &str,
        decorator: Option<Decorator>,
    ) -> Result<i64, DbEngineError> {
        let ctx = self.ctx;
        ctx.count(self.conn_mut()?, table, decorator).await
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            tracing::warn!("transaction dropped while open; rolling back");
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn(async move {
                        match conn.execute_batch("ROLLBACK").await {
                            Ok(()) => conn.set_in_transaction(false),
                            Err(e) => tracing::warn!(error = %e, "background rollback failed"),
                        }
                    });
                }
                // released still inside the transaction, so the pool closes it
                Err(_) => drop(conn),
            }
        }
    }
}
