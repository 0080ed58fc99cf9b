//! Per-operation connection establishment.
//!
//! The store is deliberately unpooled: each repository operation opens one
//! connection, runs its statements, and closes it. The
//! [`ConnectionProvider`] trait is the seam the facade branches on — a
//! failed `connect` is an ordinary [`DbError::Unavailable`] value, which the
//! facade turns into a fallback decision rather than an exception unwinding
//! through the caller.

use sqlx::ConnectOptions;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use tracing::warn;

use crate::config::DatabaseConfig;
use crate::db::errors::{DbError, Result};

/// Source of fresh database connections.
#[async_trait::async_trait]
pub trait ConnectionProvider: Send + Sync {
    /// Open one new connection.
    ///
    /// Implementations must not panic on failure; an unreachable or
    /// misconfigured database is an expected condition here.
    async fn connect(&self) -> Result<MySqlConnection>;
}

/// The production provider: connects to the configured MariaDB instance.
#[derive(Debug, Clone)]
pub struct MariaDb {
    options: MySqlConnectOptions,
}

impl MariaDb {
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);
        Self { options }
    }
}

#[async_trait::async_trait]
impl ConnectionProvider for MariaDb {
    async fn connect(&self) -> Result<MySqlConnection> {
        match self.options.connect().await {
            Ok(conn) => Ok(conn),
            Err(err) => {
                warn!(error = %err, "could not open database connection");
                Err(DbError::Unavailable(err))
            }
        }
    }
}
