//! Redis-backed cache store.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo, RedisResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use explorer_core::error::{CacheError, CacheResult};
use explorer_core::traits::CacheStore;

/// Reconnect attempts after a dropped connection before a command fails.
const RECONNECT_RETRIES: usize = 1;

/// Redis connection settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Server host name
    pub host: String,
    /// Server port
    pub port: u16,
    /// Password / access key, if the server requires AUTH
    pub access_key: Option<String>,
    /// Logical database index
    pub db: i64,
    /// Bound on establishing a connection, handshake included
    pub connect_timeout: Duration,
    /// Bound on any single command, reconnects included
    pub command_timeout: Duration,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 6379,
            access_key: None,
            db: 0,
            connect_timeout: Duration::from_secs(5),
            command_timeout: Duration::from_secs(1),
        }
    }
}

impl RedisConfig {
    /// Creates a config for the given host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Sets the access key used for AUTH.
    pub fn with_access_key(mut self, access_key: impl Into<String>) -> Self {
        self.access_key = Some(access_key.into());
        self
    }

    /// Sets the connect and per-command bounds.
    pub fn with_timeouts(mut self, connect: Duration, command: Duration) -> Self {
        self.connect_timeout = connect;
        self.command_timeout = command;
        self
    }

    /// `host:port`, for logging.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn connection_info(&self) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: RedisConnectionInfo {
                db: self.db,
                password: self.access_key.clone(),
                ..Default::default()
            },
        }
    }

    fn manager_config(&self) -> ConnectionManagerConfig {
        ConnectionManagerConfig::new()
            .set_number_of_retries(RECONNECT_RETRIES)
            .set_connection_timeout(self.connect_timeout)
            .set_response_timeout(self.command_timeout)
    }
}

// Keeps the access key out of logs.
impl std::fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("access_key", &self.access_key.as_ref().map(|_| "***"))
            .field("db", &self.db)
            .field("connect_timeout", &self.connect_timeout)
            .field("command_timeout", &self.command_timeout)
            .finish()
    }
}

/// Cache store backed by a Redis server.
///
/// Holds a [`ConnectionManager`], which multiplexes concurrent requests over
/// one connection and reconnects after a drop, so a single `RedisCache` is
/// shared by every in-flight request. Every command is bounded by
/// `command_timeout`; an outage surfaces as errors, never as a stall.
pub struct RedisCache {
    manager: ConnectionManager,
    endpoint: String,
    command_timeout: Duration,
    closed: AtomicBool,
}

impl RedisCache {
    /// Connects and verifies the server answers `PING` with `PONG`.
    ///
    /// Fails if the server is unreachable within `connect_timeout`, rejects
    /// the credentials or answers the handshake unexpectedly.
    #[instrument(skip(config), fields(endpoint = %config.endpoint()))]
    pub async fn connect(config: &RedisConfig) -> CacheResult<Self> {
        let client = Client::open(config.connection_info())
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let manager = tokio::time::timeout(
            config.connect_timeout,
            ConnectionManager::new_with_config(client, config.manager_config()),
        )
        .await
        .map_err(|_| {
            CacheError::Connection(format!(
                "no connection to {} within {}ms",
                config.endpoint(),
                config.connect_timeout.as_millis()
            ))
        })?
        .map_err(|e| CacheError::Connection(e.to_string()))?;

        let cache = Self {
            manager,
            endpoint: config.endpoint(),
            command_timeout: config.command_timeout,
            closed: AtomicBool::new(false),
        };
        cache.ping().await?;

        info!(endpoint = %cache.endpoint, "Connected to Redis");
        Ok(cache)
    }

    /// Sends `PING` and checks for `PONG`.
    pub async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.connection()?;
        let reply: String = match tokio::time::timeout(
            self.command_timeout,
            redis::cmd("PING").query_async(&mut conn),
        )
        .await
        {
            Ok(reply) => reply.map_err(|e| CacheError::Handshake(e.to_string()))?,
            Err(_) => {
                return Err(CacheError::Handshake(format!(
                    "no PING reply within {}ms",
                    self.command_timeout.as_millis()
                )))
            }
        };

        if reply == "PONG" {
            Ok(())
        } else {
            Err(CacheError::Handshake(format!("unexpected PING reply: {}", reply)))
        }
    }

    /// `host:port` of the server.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn connection(&self) -> CacheResult<ConnectionManager> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }
        Ok(self.manager.clone())
    }

    async fn bounded<T, F>(&self, command: &'static str, request: F) -> CacheResult<T>
    where
        F: Future<Output = RedisResult<T>>,
    {
        match tokio::time::timeout(self.command_timeout, request).await {
            Ok(result) => result.map_err(|e| CacheError::command(command, e)),
            Err(_) => Err(CacheError::Timeout {
                command,
                millis: self.command_timeout.as_millis() as u64,
            }),
        }
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection()?;
        let value: Option<String> = self.bounded("GET", conn.get(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.connection()?;
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            // EX 0 is rejected by the server
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }

        let _: () = self.bounded("SET", cmd.query_async(&mut conn)).await?;

        debug!(key, ttl_secs = ttl.map(|t| t.as_secs()), "Stored cache entry");
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection()?;
        let removed: i64 = self.bounded("DEL", conn.del(key)).await?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection()?;
        let found: bool = self.bounded("EXISTS", conn.exists(key)).await?;
        Ok(found)
    }

    async fn keys(&self, pattern: &str) -> CacheResult<Vec<String>> {
        let mut conn = self.connection()?;
        let mut keys: Vec<String> = self.bounded("KEYS", conn.keys(pattern)).await?;
        keys.sort();
        Ok(keys)
    }

    async fn flush(&self) -> CacheResult<()> {
        let mut conn = self.connection()?;
        let _: () = self
            .bounded("FLUSHDB", redis::cmd("FLUSHDB").query_async(&mut conn))
            .await?;
        info!(endpoint = %self.endpoint, "Flushed Redis database");
        Ok(())
    }

    async fn close(&self) -> CacheResult<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!(endpoint = %self.endpoint, "Closed Redis cache");
        }
        Ok(())
    }
}
