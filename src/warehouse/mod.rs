// src/warehouse/mod.rs - Postgres-backed registry provider and results sink
pub mod reference;
pub mod sink;

use anyhow::{Context, Result};
use bb8::PooledConnection;
use bb8_postgres::PostgresConnectionManager;
use log::debug;
use tokio_postgres::NoTls;

use crate::utils::db_connect::{self, PgPool, WarehouseConfig};

pub use sink::MatchedDataRow;

/// Handle on the data warehouse. Connections are checked out per operation.
#[derive(Clone)]
pub struct WarehouseClient {
    pool: PgPool,
}

impl WarehouseClient {
    pub async fn connect(config: &WarehouseConfig) -> Result<Self> {
        let pool = db_connect::connect(config).await?;
        Ok(Self { pool })
    }

    async fn conn(
        &self,
        purpose: &str,
    ) -> Result<PooledConnection<'_, PostgresConnectionManager<NoTls>>> {
        let (total, idle, in_use) = db_connect::get_pool_status(&self.pool);
        debug!(
            "Warehouse: acquiring connection for {} (pool: {} total, {} idle, {} in use)",
            purpose, total, idle, in_use
        );
        self.pool
            .get()
            .await
            .with_context(|| format!("Warehouse: DB connection for {}", purpose))
    }
}
