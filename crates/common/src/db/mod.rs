//! Database layer for TenantGrid
//!
//! Provides:
//! - Connection pool management
//! - The SeaORM entity for `public.tenant_registry`
//! - The `TenantStore` capability and its PostgreSQL implementation

pub mod models;
mod repository;

pub use repository::{ListFilter, ListPage, PgTenantStore, TenantStore};

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::errors::{Error, Result};

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Db {
    conn: DatabaseConnection,
}

impl Db {
    /// Create a new pool from configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(
            host = %config.host,
            database = %config.name,
            max_conns = config.max_conns,
            "Connecting to PostgreSQL"
        );

        let mut opts = ConnectOptions::new(config.connection_url());
        opts.max_connections(config.max_conns)
            .min_connections(config.max_idle_conns)
            .max_lifetime(config.conn_max_lifetime())
            .connect_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        let conn = Database::connect(opts).await.map_err(|e| {
            Error::DependencyUnavailable(format!("failed to connect to database: {e}"))
        })?;

        info!("Database connection established");

        Ok(Self { conn })
    }

    /// Wrap an existing connection (tests).
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub fn conn(&self) -> &DatabaseConnection {
        &self.conn
    }

    /// Ping the database to check connectivity.
    pub async fn ping(&self) -> Result<()> {
        self.conn
            .execute_unprepared("SELECT 1")
            .await
            .map_err(|e| Error::DependencyUnavailable(format!("database ping failed: {e}")))?;
        Ok(())
    }

    /// Close the pool, releasing all connections.
    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|e| Error::Internal(format!("failed to close database pool: {e}")))
    }
}
