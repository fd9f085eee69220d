//! Pooled relational client.

use crate::config::SqlDbConfig;
use crate::decorator::Decorator;
use crate::error::DbEngineError;
use crate::executor::{ExecContext, ExecOutcome};
use crate::mapping::FromRow;
use crate::pool::{ConnectTarget, PoolBounds, SqlPool};
use crate::results::ResultSet;
use crate::statement::Statement;
use crate::transaction::Transaction;
use crate::types::{DatabaseType, RowValues};

/// Relational database handle: configuration plus, once connected, a pool.
///
/// Every operation checks out one connection, runs one statement, and returns
/// the connection to the pool on every exit path. Clones share the pool.
///
/// ```rust,no_run
/// use db_engine::prelude::*;
///
/// #[derive(Debug, Default)]
/// struct Test {
///     id: i64,
///     value: String,
/// }
/// db_engine::impl_from_row!(Test { id: "id", value: "value" });
///
/// # async fn demo() -> Result<(), DbEngineError> {
/// let mut db = SqlDb::new(DatabaseType::Sqlite, SqlDbConfig::new("app.db"))?;
/// db.connect().await?;
///
/// db.insert("test", &["id", "value"], vec![1.into(), "name".into()], None).await?;
/// let rows: Vec<Test> = db
///     .select("test", &["id", "value"], Some(Decorator::new().where_clause("id = ?", [1])))
///     .await?;
/// assert_eq!(rows.len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SqlDb {
    config: SqlDbConfig,
    db_type: DatabaseType,
    target: ConnectTarget,
    pool: Option<SqlPool>,
}

impl SqlDb {
    /// Validate the settings and assemble the engine's connection options. No
    /// connection is opened until [`SqlDb::connect`].
    ///
    /// # Errors
    /// Returns `DbEngineError::ConfigError` if required settings are missing.
    pub fn new(db_type: DatabaseType, config: SqlDbConfig) -> Result<Self, DbEngineError> {
        let target = connect_target(db_type, &config)?;
        Ok(Self {
            config,
            db_type,
            target,
            pool: None,
        })
    }

    /// Like [`SqlDb::new`], taking the engine by name (`postgres`, `sqlite3`,
    /// `mysql`).
    ///
    /// # Errors
    /// Returns `DbEngineError::ConfigError` for an unknown engine name.
    pub fn from_name(db_type: &str, config: SqlDbConfig) -> Result<Self, DbEngineError> {
        Self::new(db_type.parse()?, config)
    }

    /// Build the pool and apply the configured bounds.
    ///
    /// # Errors
    /// Returns the driver error if the database cannot be reached.
    pub async fn connect(&mut self) -> Result<(), DbEngineError> {
        let bounds = PoolBounds {
            max_size: self.config.max_open_conns,
            max_idle: self.config.max_idle_conns,
            idle_timeout: self.config.idle_timeout(),
            acquire_timeout: self.config.acquire_timeout(),
        };
        self.pool = Some(SqlPool::connect(&self.target, bounds).await?);
        Ok(())
    }

    /// Drop this handle's reference to the pool. Connections close once every
    /// clone and checked-out connection is gone.
    pub fn close(&mut self) {
        self.pool = None;
    }

    #[must_use]
    pub fn db_type(&self) -> DatabaseType {
        self.db_type
    }

    #[must_use]
    pub fn config(&self) -> &SqlDbConfig {
        &self.config
    }

    #[must_use]
    pub fn pool(&self) -> Option<&SqlPool> {
        self.pool.as_ref()
    }

    pub(crate) fn context(&self) -> ExecContext {
        ExecContext {
            dialect: self.db_type.dialect(),
            check_args: self.config.check_args,
            query_timeout: self.config.query_timeout(),
        }
    }

    fn connected_pool(&self) -> Result<&SqlPool, DbEngineError> {
        self.pool.as_ref().ok_or_else(|| {
            DbEngineError::ConnectionError("database is not connected".to_string())
        })
    }

    /// Raw statement escape hatch. Arguments go through the sanitizer when
    /// `check_args` is enabled.
    ///
    /// # Errors
    /// Returns `DbEngineError::RejectedArgument` or the driver error.
    pub async fn exec_sql(
        &self,
        sql: &str,
        args: Vec<RowValues>,
    ) -> Result<ExecOutcome, DbEngineError> {
        let stmt = Statement::new(sql, args);
        let ctx = self.context();
        let mut conn = self.connected_pool()?.checkout().await?;
        ctx.execute(&mut conn, &stmt).await
    }

    /// Raw query escape hatch returning the untyped result set.
    ///
    /// # Errors
    /// Returns `DbEngineError::RejectedArgument` or the driver error.
    pub async fn query_sql(
        &self,
        sql: &str,
        args: Vec<RowValues>,
    ) -> Result<ResultSet, DbEngineError> {
        let stmt = Statement::new(sql, args);
        let ctx = self.context();
        let mut conn = self.connected_pool()?.checkout().await?;
        ctx.query(&mut conn, &stmt).await
    }

    /// Run several statements separated by `;` without parameters.
    ///
    /// # Errors
    /// Returns the driver error.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), DbEngineError> {
        let mut conn = self.connected_pool()?.checkout().await?;
        conn.execute_batch(sql).await
    }

    /// Check out a connection and open a transaction on it.
    ///
    /// # Errors
    /// Returns the checkout or driver error.
    pub async fn begin(&self) -> Result<Transaction, DbEngineError> {
        let conn = self.connected_pool()?.checkout().await?;
        Transaction::begin(conn, self.context()).await
    }

    /// Append one `T` per selected row to `dest`, returning the number appended.
    ///
    /// Rows mapped before a failing row remain in `dest`.
    ///
    /// # Errors
    /// Returns `DbEngineError::MappingError` if a selected column has no
    /// binding in `T`, or the driver error.
    pub async fn select_into<T: FromRow>(
        &self,
        dest: &mut Vec<T>,
        table: &str,
        columns: &[&str],
        decorator: Option<Decorator>,
    ) -> Result<usize, DbEngineError> {
        let mut conn = self.connected_pool()?.checkout().await?;
        self.context()
            .select_into(&mut conn, dest, table, columns, decorator)
            .await
    }

    /// Select into a fresh `Vec<T>`.
    ///
    /// # Errors
    /// See [`SqlDb::select_into`].
    pub async fn select<T: FromRow>(
        &self,
        table: &str,
        columns: &[&str],
        decorator: Option<Decorator>,
    ) -> Result<Vec<T>, DbEngineError> {
        let mut dest = Vec::new();
        self.select_into(&mut dest, table, columns, decorator).await?;
        Ok(dest)
    }

    /// # Errors
    /// Returns `DbEngineError::ParameterError` when `columns` and `values`
    /// differ in length (no connection is checked out), or the driver error.
    pub async fn insert(
        &self,
        table: &str,
        columns: &[&str],
        values: Vec<RowValues>,
        decorator: Option<Decorator>,
    ) -> Result<ExecOutcome, DbEngineError> {
        let stmt = Statement::insert(self.context().dialect, table, columns, values, decorator)?;
        self.run(&stmt).await
    }

    /// # Errors
    /// Returns `DbEngineError::ParameterError` when `columns` and `values`
    /// differ in length (no connection is checked out), or the driver error.
    pub async fn update(
        &self,
        table: &str,
        columns: &[&str],
        values: Vec<RowValues>,
        decorator: Option<Decorator>,
    ) -> Result<ExecOutcome, DbEngineError> {
        let stmt = Statement::update(self.context().dialect, table, columns, values, decorator)?;
        self.run(&stmt).await
    }

    /// # Errors
    /// Returns the driver error.
    pub async fn delete(
        &self,
        table: &str,
        decorator: Option<Decorator>,
    ) -> Result<ExecOutcome, DbEngineError> {
        let stmt = Statement::delete(self.context().dialect, table, decorator);
        self.run(&stmt).await
    }

    /// # Errors
    /// Returns `DbEngineError::ExecutionError` unless exactly one integer row
    /// comes back, or the driver error.
    pub async fn count(
        &self,
        table: &str,
        decorator: Option<Decorator>,
    ) -> Result<i64, DbEngineError> {
        let mut conn = self.connected_pool()?.checkout().await?;
        self.context().count(&mut conn, table, decorator).await
    }

    async fn run(&self, stmt: &Statement) -> Result<ExecOutcome, DbEngineError> {
        let ctx = self.context();
        let mut conn = self.connected_pool()?.checkout().await?;
        ctx.execute(&mut conn, stmt).await
    }
}

/// Reject a server engine config missing any of database, host or username.
#[cfg(any(feature = "postgres", feature = "mysql"))]
fn require_server_fields(config: &SqlDbConfig) -> Result<(), DbEngineError> {
    if config.host.is_empty() {
        return Err(DbEngineError::ConfigError("host is required".to_string()));
    }
    if config.username.is_empty() {
        return Err(DbEngineError::ConfigError("username is required".to_string()));
    }
    Ok(())
}

/// Assemble the engine-specific connection options once, at construction.
fn connect_target(db_type: DatabaseType, config: &SqlDbConfig) -> Result<ConnectTarget, DbEngineError> {
    if config.database.is_empty() {
        return Err(DbEngineError::ConfigError("database is required".to_string()));
    }
    match db_type {
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => {
            require_server_fields(config)?;
            if config.port == 0 {
                return Err(DbEngineError::ConfigError("port is required".to_string()));
            }
            let mut pg = tokio_postgres::Config::new();
            pg.user(&config.username)
                .password(&config.password)
                .host(&config.host)
                .port(config.port)
                .dbname(&config.database)
                .ssl_mode(tokio_postgres::config::SslMode::Disable);
            Ok(ConnectTarget::Postgres(pg))
        }
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => Ok(ConnectTarget::Sqlite(config.database.clone())),
        #[cfg(feature = "mysql")]
        DatabaseType::Mysql => {
            require_server_fields(config)?;
            let mut opts = mysql_async::OptsBuilder::default()
                .ip_or_hostname(config.host.clone())
                .user(Some(config.username.clone()))
                .pass(Some(config.password.clone()))
                .db_name(Some(config.database.clone()));
            // 0 keeps the driver's default port
            if config.port != 0 {
                opts = opts.tcp_port(config.port);
            }
            Ok(ConnectTarget::Mysql(opts.into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_engine_is_a_config_error() {
        let err = SqlDb::from_name("oracle", SqlDbConfig::new("test")).unwrap_err();
        assert!(matches!(err, DbEngineError::ConfigError(ref m) if m.contains("oracle")));
    }

    #[cfg(not(feature = "mysql"))]
    #[test]
    fn mysql_needs_its_feature() {
        let err = SqlDb::from_name("mysql", SqlDbConfig::new("test")).unwrap_err();
        assert!(matches!(err, DbEngineError::ConfigError(ref m) if m.contains("mysql")));
    }

    #[cfg(any(feature = "postgres", feature = "mysql"))]
    fn server_config() -> SqlDbConfig {
        let mut cfg = SqlDbConfig::new("test");
        cfg.username = "root".into();
        cfg.password = "it's a/b?c".into();
        cfg.host = "localhost".into();
        cfg.port = 5432;
        cfg
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn postgres_target_carries_settings_verbatim() {
        let db = SqlDb::new(DatabaseType::Postgres, server_config()).unwrap();
        let ConnectTarget::Postgres(pg) = &db.target else {
            panic!("expected a postgres target");
        };
        assert_eq!(pg.get_user(), Some("root"));
        assert_eq!(pg.get_password(), Some(&b"it's a/b?c"[..]));
        assert_eq!(pg.get_dbname(), Some("test"));
        assert_eq!(pg.get_ports(), &[5432]);
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn postgres_requires_host() {
        let err = SqlDb::new(DatabaseType::Postgres, SqlDbConfig::new("test")).unwrap_err();
        assert!(matches!(err, DbEngineError::ConfigError(_)));
    }

    #[cfg(feature = "mysql")]
    #[test]
    fn mysql_target_carries_settings_verbatim() {
        let mut cfg = server_config();
        cfg.port = 3307;
        let db = SqlDb::from_name("mysql", cfg).unwrap();
        assert_eq!(db.db_type().dialect(), crate::types::Dialect::Native);
        let ConnectTarget::Mysql(opts) = &db.target else {
            panic!("expected a mysql target");
        };
        assert_eq!(opts.user(), Some("root"));
        assert_eq!(opts.pass(), Some("it's a/b?c"));
        assert_eq!(opts.db_name(), Some("test"));
        assert_eq!(opts.tcp_port(), 3307);

        let err = SqlDb::new(DatabaseType::Mysql, SqlDbConfig::new("test")).unwrap_err();
        assert!(matches!(err, DbEngineError::ConfigError(_)));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_target_is_the_path() {
        let db = SqlDb::from_name("sqlite3", SqlDbConfig::new("/tmp/x.db")).unwrap();
        assert!(matches!(db.target, ConnectTarget::Sqlite(ref p) if p == "/tmp/x.db"));
        assert!(db.pool().is_none());
    }

    #[cfg(feature = "sqlite")]
    #[tokio::test]
    async fn operations_fail_before_connect() {
        let db = SqlDb::new(DatabaseType::Sqlite, SqlDbConfig::new("unused.db")).unwrap();
        let err = db.count("t", None).await.unwrap_err();
        assert!(matches!(err, DbEngineError::ConnectionError(_)));
    }
}
