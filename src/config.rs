//! Structured connection settings.
//!
//! Loading these from files or the environment is left to the application;
//! both structs deserialize from the JSON keys used by existing deployments.

use std::time::Duration;

use serde::Deserialize;

use crate::error::DbEngineError;

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

/// Relational connection and pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SqlDbConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    /// Database name, or the file path for `SQLite`.
    pub database: String,
    /// Upper bound on open connections; 0 uses the pool default.
    #[serde(default, alias = "maxopenconns")]
    pub max_open_conns: u32,
    /// Idle connections kept warm, capped at the pool size; extras are reaped
    /// after `idle_timeout_seconds`.
    #[serde(default, alias = "maxidleconns")]
    pub max_idle_conns: u32,
    /// Run the argument sanitizer before every statement.
    #[serde(default, alias = "checkargs")]
    pub check_args: bool,
    /// 0 keeps idle connections forever.
    #[serde(default = "default_idle_timeout", alias = "idletimeout")]
    pub idle_timeout_seconds: u64,
    #[serde(default = "default_acquire_timeout", alias = "acquiretimeout")]
    pub acquire_timeout_seconds: u64,
    /// Per-statement deadline; unset means no deadline.
    #[serde(default, alias = "querytimeout")]
    pub query_timeout_seconds: Option<u64>,
}

impl SqlDbConfig {
    /// Settings for a database with default pool bounds.
    #[must_use]
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            host: String::new(),
            port: 0,
            database: database.into(),
            max_open_conns: 0,
            max_idle_conns: 0,
            check_args: false,
            idle_timeout_seconds: default_idle_timeout(),
            acquire_timeout_seconds: default_acquire_timeout(),
            query_timeout_seconds: None,
        }
    }

    /// Parse settings from a JSON document.
    ///
    /// # Errors
    /// Returns `DbEngineError::ConfigError` if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, DbEngineError> {
        serde_json::from_str(json)
            .map_err(|e| DbEngineError::ConfigError(format!("invalid sql config: {e}")))
    }

    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_seconds)
    }

    #[must_use]
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }

    #[must_use]
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_seconds.map(Duration::from_secs)
    }
}

/// Key-value connection and pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KvConfig {
    #[serde(alias = "ip")]
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub password: String,
    #[serde(default, alias = "dbindex")]
    pub db_index: i64,
    /// Idle connections kept warm; extras are reaped after the idle timeout.
    #[serde(default, alias = "maxidle")]
    pub max_idle: u32,
    /// Upper bound on connections in use at once; 0 uses the pool default.
    #[serde(default, alias = "maxactive")]
    pub max_active: u32,
    /// 0 keeps idle connections forever.
    #[serde(default = "default_idle_timeout", alias = "idletimeout")]
    pub idle_timeout_seconds: u64,
    /// How long a caller waits for a connection while the pool is saturated.
    #[serde(default = "default_acquire_timeout", alias = "acquiretimeout")]
    pub acquire_timeout_seconds: u64,
}

impl KvConfig {
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            password: String::new(),
            db_index: 0,
            max_idle: 0,
            max_active: 0,
            idle_timeout_seconds: default_idle_timeout(),
            acquire_timeout_seconds: default_acquire_timeout(),
        }
    }

    /// Parse settings from a JSON document.
    ///
    /// # Errors
    /// Returns `DbEngineError::ConfigError` if the JSON is malformed.
    pub fn from_json(json: &str) -> Result<Self, DbEngineError> {
        serde_json::from_str(json)
            .map_err(|e| DbEngineError::ConfigError(format!("invalid kv config: {e}")))
    }

    /// Connection parameters for the `redis` client. The password is passed
    /// as-is rather than embedded in a URL.
    #[cfg(feature = "kv")]
    #[must_use]
    pub fn connection_info(&self) -> redis::ConnectionInfo {
        redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: redis::RedisConnectionInfo {
                db: self.db_index,
                password: (!self.password.is_empty()).then(|| self.password.clone()),
                ..Default::default()
            },
        }
    }
}
