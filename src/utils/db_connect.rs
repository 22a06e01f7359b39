// src/utils/db_connect.rs

use anyhow::{Context, Result};
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use log::info;
use std::env;
use std::time::Duration;
use tokio_postgres::{Config, NoTls};

pub type PgPool = Pool<PostgresConnectionManager<NoTls>>;

/// Connection settings for the warehouse that holds the customer registry
/// and receives matched rows.
#[derive(Debug, Clone, PartialEq)]
pub struct WarehouseConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    pub pool_size: u32,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            dbname: "dataplatform".to_string(),
            user: "postgres".to_string(),
            password: String::new(),
            pool_size: 4,
        }
    }
}

impl WarehouseConfig {
    /// Reads `POSTGRES_*` variables, falling back to local defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env::var("POSTGRES_HOST").unwrap_or(defaults.host),
            port: env::var("POSTGRES_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            dbname: env::var("POSTGRES_DB").unwrap_or(defaults.dbname),
            user: env::var("POSTGRES_USER").unwrap_or(defaults.user),
            password: env::var("POSTGRES_PASSWORD").unwrap_or(defaults.password),
            pool_size: env::var("WAREHOUSE_POOL_SIZE")
                .ok()
                .and_then(|p| p.parse().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.pool_size),
        }
    }

    fn pg_config(&self) -> Config {
        let mut config = Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.dbname)
            .user(&self.user)
            .password(&self.password);
        config.application_name("dso_recon");
        config.connect_timeout(Duration::from_secs(10));
        config
    }
}

/// Builds a connection pool and checks it with a test query.
pub async fn connect(config: &WarehouseConfig) -> Result<PgPool> {
    info!(
        "DB Config: Host={}, Port={}, DB={}, User={}",
        config.host, config.port, config.dbname, config.user
    );
    let manager = PostgresConnectionManager::new(config.pg_config(), NoTls);

    let pool = Pool::builder()
        .max_size(config.pool_size)
        .idle_timeout(Some(Duration::from_secs(180)))
        .connection_timeout(Duration::from_secs(15))
        .build(manager)
        .await
        .context("Failed to build database connection pool")?;

    let conn = pool
        .get()
        .await
        .context("Failed to get test connection from pool")?;
    conn.query_one("SELECT 1", &[])
        .await
        .context("Test query 'SELECT 1' failed")?;
    drop(conn);

    info!("Database connection pool initialized successfully.");
    Ok(pool)
}

/// Returns (connections, idle connections, connections in use).
pub fn get_pool_status(pool: &PgPool) -> (u32, u32, u32) {
    let state = pool.state();
    (
        state.connections,
        state.idle_connections,
        state.connections.saturating_sub(state.idle_connections),
    )
}
