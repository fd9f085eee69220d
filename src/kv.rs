//! Pooled key-value client.

use std::future::Future;
use std::time::{Duration, Instant};

use bb8::{ManageConnection, Pool, PooledConnection};
use redis::aio::MultiplexedConnection;
use redis::{FromRedisValue, RedisError, ToRedisArgs};

use crate::config::KvConfig;
use crate::error::{DbEngineError, checkout_error};
use crate::pool::PoolBounds;

/// Connections idle this long are `PING`ed before being handed out.
pub const STALE_AFTER: Duration = Duration::from_secs(60);

/// A pooled key-value connection and its last successful use.
pub struct KvConnection {
    conn: MultiplexedConnection,
    last_used: Instant,
    broken: bool,
}

impl KvConnection {
    fn is_stale(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_used) >= STALE_AFTER
    }

    fn touch(&mut self) {
        self.last_used = Instant::now();
    }

    async fn query<T: FromRedisValue>(&mut self, cmd: &redis::Cmd) -> Result<T, DbEngineError> {
        let result: redis::RedisResult<T> = cmd.query_async(&mut self.conn).await;
        match result {
            Ok(value) => {
                self.touch();
                Ok(value)
            }
            Err(e) => {
                if e.is_io_error() || e.is_connection_dropped() {
                    self.broken = true;
                }
                Err(e.into())
            }
        }
    }
}

/// bb8 manager for multiplexed `redis` connections.
pub struct KvManager {
    client: redis::Client,
    addr: String,
}

impl KvManager {
    /// # Errors
    /// Returns `DbEngineError::ConfigError` if the client rejects `info`.
    pub fn new(info: redis::ConnectionInfo, addr: impl Into<String>) -> Result<Self, DbEngineError> {
        let client = redis::Client::open(info)
            .map_err(|e| DbEngineError::ConfigError(format!("invalid kv address: {e}")))?;
        Ok(Self {
            client,
            addr: addr.into(),
        })
    }
}

impl ManageConnection for KvManager {
    type Connection = KvConnection;
    type Error = RedisError;

    #[allow(clippy::manual_async_fn)]
    fn connect(&self) -> impl Future<Output = Result<Self::Connection, Self::Error>> + Send {
        let client = self.client.clone();
        let addr = self.addr.clone();
        async move {
            tracing::debug!(addr = %addr, "kv connect");
            let conn = client.get_multiplexed_async_connection().await?;
            Ok(KvConnection {
                conn,
                last_used: Instant::now(),
                broken: false,
            })
        }
    }

    #[allow(clippy::manual_async_fn)]
    fn is_valid(
        &self,
        conn: &mut Self::Connection,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send {
        async move {
            let _: String = redis::cmd("PING").query_async(&mut conn.conn).await?;
            Ok(())
        }
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.broken
    }
}

/// Key-value handle. Clones share one pool.
///
/// Callers block while all `max_active` connections are in use, bounded by
/// the acquire timeout.
#[derive(Clone)]
pub struct KvDb {
    config: KvConfig,
    pool: Pool<KvManager>,
}

impl std::fmt::Debug for KvDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.pool.state();
        f.debug_struct("KvDb")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

impl KvDb {
    /// Build the pool. Connections are dialed on demand, so an unreachable
    /// server surfaces on the first operation. Must be called inside a tokio
    /// runtime.
    ///
    /// # Errors
    /// Returns `DbEngineError::ConfigError` for an invalid address or bounds.
    pub fn new(config: KvConfig) -> Result<Self, DbEngineError> {
        let addr = format!("{}:{}", config.host, config.port);
        let manager = KvManager::new(config.connection_info(), addr)?;
        let bounds = PoolBounds {
            max_size: config.max_active,
            max_idle: config.max_idle,
            idle_timeout: Duration::from_secs(config.idle_timeout_seconds),
            acquire_timeout: Duration::from_secs(config.acquire_timeout_seconds),
        };
        // stale connections are PINGed in `conn` so a failure reaches the caller
        let pool = bounds
            .builder::<KvManager>()?
            .test_on_check_out(false)
            .build_unchecked(manager);
        tracing::debug!(
            host = %config.host,
            port = config.port,
            max_active = config.max_active,
            max_idle = config.max_idle,
            "kv pool built"
        );
        Ok(Self { config, pool })
    }

    #[must_use]
    pub fn config(&self) -> &KvConfig {
        &self.config
    }

    async fn conn(&self) -> Result<PooledConnection<'_, KvManager>, DbEngineError> {
        let mut conn = self.pool.get().await.map_err(checkout_error)?;
        if conn.is_stale(Instant::now()) {
            let pong: redis::RedisResult<String> =
                redis::cmd("PING").query_async(&mut conn.conn).await;
            if let Err(e) = pong {
                tracing::warn!(error = %e, "stale kv connection failed PING");
                conn.broken = true;
                return Err(DbEngineError::ConnectionError(format!(
                    "stale connection failed PING: {e}"
                )));
            }
            conn.touch();
        }
        Ok(conn)
    }

    async fn run<T: FromRedisValue>(&self, cmd: &redis::Cmd) -> Result<T, DbEngineError> {
        let mut conn = self.conn().await?;
        conn.query(cmd).await
    }

    /// # Errors
    /// Returns the checkout or server error.
    pub async fn ping(&self) -> Result<(), DbEngineError> {
        let _: String = self.run(&redis::cmd("PING")).await?;
        Ok(())
    }

    /// `GET key`. A missing key decodes as `None` when `V` is an `Option`.
    ///
    /// # Errors
    /// Returns the checkout or server error, including a decode failure.
    pub async fn get<V: FromRedisValue>(&self, key: &str) -> Result<V, DbEngineError> {
        self.run(redis::cmd("GET").arg(key)).await
    }

    /// `SET key value`, with `EX expire_seconds` when it is positive.
    ///
    /// # Errors
    /// Returns the checkout or server error.
    pub async fn set<V: ToRedisArgs>(
        &self,
        key: &str,
        value: V,
        expire_seconds: u64,
    ) -> Result<(), DbEngineError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if expire_seconds > 0 {
            cmd.arg("EX").arg(expire_seconds);
        }
        let _: redis::Value = self.run(&cmd).await?;
        Ok(())
    }

    /// `DEL key`, returning the number of keys removed.
    ///
    /// # Errors
    /// Returns the checkout or server error.
    pub async fn del(&self, key: &str) -> Result<i64, DbEngineError> {
        self.run(redis::cmd("DEL").arg(key)).await
    }

    /// # Errors
    /// Returns the checkout or server error.
    pub async fn incr(&self, key: &str) -> Result<i64, DbEngineError> {
        self.run(redis::cmd("INCR").arg(key)).await
    }

    /// # Errors
    /// Returns the checkout or server error.
    pub async fn decr(&self, key: &str) -> Result<i64, DbEngineError> {
        self.run(redis::cmd("DECR").arg(key)).await
    }

    /// # Errors
    /// Returns the checkout or server error.
    pub async fn hget<V: FromRedisValue>(&self, key: &str, field: &str) -> Result<V, DbEngineError> {
        self.run(redis::cmd("HGET").arg(key).arg(field)).await
    }

    /// `HSET key field value`, returning the number of fields created.
    ///
    /// # Errors
    /// Returns the checkout or server error.
    pub async fn hset<V: ToRedisArgs>(
        &self,
        key: &str,
        field: &str,
        value: V,
    ) -> Result<i64, DbEngineError> {
        self.run(redis::cmd("HSET").arg(key).arg(field).arg(value))
            .await
    }

    /// # Errors
    /// Returns the checkout or server error.
    pub async fn hdel(&self, key: &str, field: &str) -> Result<i64, DbEngineError> {
        self.run(redis::cmd("HDEL").arg(key).arg(field)).await
    }

    /// `HMGET key f1 .. fN`; one entry per field, in order.
    ///
    /// # Errors
    /// Returns `DbEngineError::ParameterError` for an empty field list, or the
    /// checkout or server error.
    pub async fn hmget<V: FromRedisValue>(
        &self,
        key: &str,
        fields: &[&str],
    ) -> Result<Vec<V>, DbEngineError> {
        if fields.is_empty() {
            return Err(DbEngineError::ParameterError(
                "hmget needs at least one field".to_string(),
            ));
        }
        let mut cmd = redis::cmd("HMGET");
        cmd.arg(key);
        for field in fields {
            cmd.arg(*field);
        }
        self.run(&cmd).await
    }

    /// `HMSET key f1 v1 .. fN vN`.
    ///
    /// # Errors
    /// Returns `DbEngineError::ParameterError` for an empty field list, or the
    /// checkout or server error.
    pub async fn hmset<V: ToRedisArgs>(
        &self,
        key: &str,
        pairs: &[(&str, V)],
    ) -> Result<(), DbEngineError> {
        if pairs.is_empty() {
            return Err(DbEngineError::ParameterError(
                "hmset needs at least one field".to_string(),
            ));
        }
        let mut cmd = redis::cmd("HMSET");
        cmd.arg(key);
        for (field, value) in pairs {
            cmd.arg(*field).arg(value);
        }
        let _: redis::Value = self.run(&cmd).await?;
        Ok(())
    }
}
