use log::{debug, info};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgPool, PgPoolOptions, PgRow, Postgres};
use sqlx::query::{Query, QueryAs};
use sqlx::FromRow;
use std::time::Duration;

use crate::config::settings::DatabaseConfig;
use crate::storage::migrations::SchemaBootstrap;
use crate::utils::error::StoreError;

// Positional statement parameter, bound in order to $1, $2, ...
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i32),
    Text(Option<String>),
    Decimal(Decimal),
}

// Owns the connection pool; the only component that touches storage
#[derive(Clone)]
pub struct Gateway {
    pool: PgPool,
}

impl Gateway {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let options = config
            .connect_options()
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        info!("🗄️  Connecting to PostgreSQL: {}", config.target());
        Self::connect_with(options, config.max_connections, config.acquire_timeout()).await
    }

    pub async fn connect_with(
        options: PgConnectOptions,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_with(options)
            .await?;

        info!("✅ Connection pool ready (max {} connections)", max_connections);
        Ok(Self { pool })
    }

    // Pool that opens connections on first use
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let options = config
            .connect_options()
            .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout())
            .connect_lazy_with(options);

        Ok(Self { pool })
    }

    /// Creates the tables and constraints if they are missing. Safe to run on
    /// every start.
    pub async fn initialize(&self) -> Result<(), StoreError> {
        SchemaBootstrap::run(&self.pool).await
    }

    pub async fn fetch_all<T>(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<T>, StoreError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        debug!("fetch_all: {} ({} params)", sql, params.len());
        let rows = bind_as(sqlx::query_as::<_, T>(sql), params)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn fetch_optional<T>(&self, sql: &str, params: &[SqlParam]) -> Result<Option<T>, StoreError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        debug!("fetch_optional: {} ({} params)", sql, params.len());
        let row = bind_as(sqlx::query_as::<_, T>(sql), params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn fetch_one<T>(&self, sql: &str, params: &[SqlParam]) -> Result<T, StoreError>
    where
        T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        debug!("fetch_one: {} ({} params)", sql, params.len());
        let row = bind_as(sqlx::query_as::<_, T>(sql), params)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    // Runs a statement that returns no rows; yields the affected row count
    pub async fn execute(&self, sql: &str, params: &[SqlParam]) -> Result<u64, StoreError> {
        debug!("execute: {} ({} params)", sql, params.len());
        let result = bind(sqlx::query(sql), params).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        info!("🔒 Closing PostgreSQL connections");
        self.pool.close().await;
    }
}

fn bind<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Int(value) => query.bind(*value),
            SqlParam::Text(value) => query.bind(value.clone()),
            SqlParam::Decimal(value) => query.bind(*value),
        };
    }
    query
}

fn bind_as<'q, T>(
    mut query: QueryAs<'q, Postgres, T, PgArguments>,
    params: &[SqlParam],
) -> QueryAs<'q, Postgres, T, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Int(value) => query.bind(*value),
            SqlParam::Text(value) => query.bind(value.clone()),
            SqlParam::Decimal(value) => query.bind(*value),
        };
    }
    query
}
