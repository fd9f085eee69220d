use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbEngineError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "mysql")]
    #[error(transparent)]
    MysqlError(#[from] mysql_async::Error),

    #[cfg(feature = "kv")]
    #[error(transparent)]
    RedisError(#[from] redis::RedisError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("Row mapping error: {0}")]
    MappingError(String),

    /// Raised by the argument sanitizer; carries the offending value.
    #[error("error arg is {0}")]
    RejectedArgument(String),

    #[error("transaction has already been committed or rolled back")]
    TransactionCompleted,

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

/// Map a bb8 checkout failure, keeping the driver error when there is one.
pub(crate) fn checkout_error<E>(err: bb8::RunError<E>) -> DbEngineError
where
    E: Into<DbEngineError>,
{
    match err {
        bb8::RunError::User(e) => e.into(),
        bb8::RunError::TimedOut => {
            DbEngineError::Timeout("waiting for a pooled connection".to_string())
        }
    }
}
