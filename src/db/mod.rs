use std::str::FromStr;

use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

use crate::config::DbConfig;

mod error;

pub use error::StoreError;

/// Everything under /migrations, in version order.
pub static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Clone)]
pub struct Db {
    pub pool: Pool<Sqlite>,
}

impl Db {
    pub async fn connect(cfg: &DbConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&cfg.url)?
            .create_if_missing(true)
            .busy_timeout(cfg.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(cfg.max_connections)
            .connect_with(options)
            .await?;

        tracing::info!("Opened database {}", cfg.url);
        Self::migrated(pool).await
    }

    /// Private in-memory database. One connection that never expires, so the
    /// data lives exactly as long as the returned handle.
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::migrated(pool).await
    }

    async fn migrated(pool: Pool<Sqlite>) -> Result<Self, StoreError> {
        MIGRATOR.run(&pool).await?;
        Ok(Self { pool })
    }
}

/// SQLite has no unsigned integers; Discord ids are stored bit-for-bit as i64.
pub(crate) fn to_sql_id(id: u64) -> i64 {
    id as i64
}

pub(crate) fn from_sql_id(raw: i64) -> u64 {
    raw as u64
}
