//! Shared PostgreSQL connection handle
//!
//! The pool is created once by [`DatabaseHandle::connect`] at process start,
//! every checkout is pinged before use, and [`DatabaseHandle::close`] drains
//! it during shutdown.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::domain::DomainError;

/// PostgreSQL connection settings
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/hackathon".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn with_min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn with_connect_timeout(mut self, secs: u64) -> Self {
        self.connect_timeout_secs = secs;
        self
    }
}

/// Owned, lazily-initialized pool shared by every collection
#[derive(Debug)]
pub struct DatabaseHandle {
    config: PostgresConfig,
    pool: OnceCell<PgPool>,
}

impl DatabaseHandle {
    pub fn new(config: PostgresConfig) -> Self {
        Self {
            config,
            pool: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    pub fn is_connected(&self) -> bool {
        self.pool.get().is_some_and(|pool| !pool.is_closed())
    }

    /// Returns the pool, creating it on first use
    pub async fn connect(&self) -> Result<&PgPool, DomainError> {
        self.pool
            .get_or_try_init(|| async {
                debug!(max_connections = self.config.max_connections, "Opening PostgreSQL pool");

                let pool = PgPoolOptions::new()
                    .max_connections(self.config.max_connections)
                    .min_connections(self.config.min_connections)
                    .acquire_timeout(Duration::from_secs(self.config.connect_timeout_secs))
                    .test_before_acquire(true)
                    .connect(&self.config.url)
                    .await
                    .map_err(|e| {
                        DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e))
                    })?;

                info!("PostgreSQL pool ready");
                Ok(pool)
            })
            .await
    }

    /// Round-trips a trivial query through the pool
    pub async fn health_check(&self) -> Result<(), DomainError> {
        let pool = self.connect().await?;

        sqlx::query("SELECT 1")
            .execute(pool)
            .await
            .map_err(|e| DomainError::storage(format!("Database health check failed: {}", e)))?;

        Ok(())
    }

    /// Closes the pool if it was ever opened
    pub async fn close(&self) {
        if let Some(pool) = self.pool.get() {
            pool.close().await;
            info!("PostgreSQL pool closed");
        }
    }
}
