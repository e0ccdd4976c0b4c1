//! SQLite persistence adapters
//!
//! This module implements the repository pattern on top of a `sqlx` SQLite
//! pool: generic record CRUD for every entity table, pivot link operations,
//! and units of work for multi-step writes.

mod link_repository;
mod record_repository;
mod schema;
mod table;
mod unit_of_work;

pub use record_repository::SqliteRecordRepository;
pub use table::SqliteTable;

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use crate::application::ports::outbound::StoreError;

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error.as_database_error() {
            Some(db) if db.is_unique_violation() => StoreError::Duplicate(db.message().to_string()),
            Some(db) if db.is_foreign_key_violation() => {
                StoreError::MissingReference(db.message().to_string())
            }
            _ => StoreError::Database(error.to_string()),
        }
    }
}

/// Combined repository providing access to all tables
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid DATABASE_URL: {database_url}"))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        // Every connection to an in-memory database opens a fresh, empty one,
        // so the pool must hold exactly one connection and never recycle it.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite")?;

        let repository = Self { pool };
        repository.initialize_schema().await?;
        Ok(repository)
    }

    /// Create all tables if they do not exist yet
    pub async fn initialize_schema(&self) -> Result<()> {
        for statement in schema::statements() {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to initialize schema")?;
        }
        tracing::info!("SQLite schema initialized");
        Ok(())
    }

    #[cfg(test)]
    pub async fn in_memory() -> Self {
        Self::new("sqlite::memory:", 1)
            .await
            .expect("in-memory database should open")
    }

    #[cfg(test)]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn records<F: SqliteTable>(&self) -> SqliteRecordRepository<F> {
        SqliteRecordRepository::new(self.pool.clone())
    }
}
