//! Generic record repository for SQLite
//!
//! The free functions operate on a borrowed connection so they can run either
//! on a pooled connection or inside a transaction (`&mut *tx`).
//! [`SqliteRecordRepository`] wraps them behind the `RecordRepositoryPort`.

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};

use super::table::{record_from_row, SqliteTable};
use crate::application::ports::outbound::{RecordRepositoryPort, StoreError, Visibility};
use crate::domain::entities::Record;

fn visibility_clause(visibility: Visibility) -> &'static str {
    match visibility {
        Visibility::Live => " AND deleted_at IS NULL",
        Visibility::WithTrashed => "",
    }
}

fn select_columns<F: SqliteTable>() -> String {
    format!(
        "id, {}, created_at, updated_at, deleted_at",
        F::COLUMNS.join(", ")
    )
}

/// Insert a new row and read it back with its generated id and timestamps
pub async fn insert<F: SqliteTable>(
    conn: &mut SqliteConnection,
    fields: &F,
) -> Result<Record<F::Id, F>, StoreError> {
    let now = Utc::now();
    let placeholders = vec!["?"; F::COLUMNS.len() + 2].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}, created_at, updated_at) VALUES ({})",
        F::TABLE,
        F::COLUMNS.join(", "),
        placeholders
    );

    let result = fields
        .bind_fields(sqlx::query(&sql))
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    let id = F::Id::from(result.last_insert_rowid());
    tracing::debug!("Created {} {}", F::ENTITY, id);

    find(conn, id, Visibility::WithTrashed)
        .await?
        .ok_or_else(|| StoreError::Database(format!("{} {} vanished after insert", F::ENTITY, id)))
}

/// Find a row by id
pub async fn find<F: SqliteTable>(
    conn: &mut SqliteConnection,
    id: F::Id,
    visibility: Visibility,
) -> Result<Option<Record<F::Id, F>>, StoreError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?{}",
        select_columns::<F>(),
        F::TABLE,
        visibility_clause(visibility)
    );

    let row = sqlx::query(&sql)
        .bind(Into::<i64>::into(id))
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.as_ref().map(record_from_row::<F>).transpose()?)
}

/// List live rows in insertion order
pub async fn list<F: SqliteTable>(
    conn: &mut SqliteConnection,
) -> Result<Vec<Record<F::Id, F>>, StoreError> {
    let sql = format!(
        "SELECT {} FROM {} WHERE deleted_at IS NULL ORDER BY id",
        select_columns::<F>(),
        F::TABLE
    );

    let rows = sqlx::query(&sql).fetch_all(&mut *conn).await?;

    rows.iter()
        .map(|row| record_from_row::<F>(row).map_err(StoreError::from))
        .collect()
}

/// Replace every writable column of a live row
pub async fn update<F: SqliteTable>(
    conn: &mut SqliteConnection,
    id: F::Id,
    fields: &F,
) -> Result<Option<Record<F::Id, F>>, StoreError> {
    let assignments = F::COLUMNS
        .iter()
        .map(|column| format!("{column} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE {} SET {}, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        F::TABLE,
        assignments
    );

    let result = fields
        .bind_fields(sqlx::query(&sql))
        .bind(Utc::now())
        .bind(Into::<i64>::into(id))
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }

    tracing::debug!("Updated {} {}", F::ENTITY, id);
    find(conn, id, Visibility::Live).await
}

/// Set the tombstone on a live row
pub async fn soft_delete<F: SqliteTable>(
    conn: &mut SqliteConnection,
    id: F::Id,
) -> Result<bool, StoreError> {
    let now = Utc::now();
    let sql = format!(
        "UPDATE {} SET deleted_at = ?, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
        F::TABLE
    );

    let result = sqlx::query(&sql)
        .bind(now)
        .bind(now)
        .bind(Into::<i64>::into(id))
        .execute(&mut *conn)
        .await?;

    let deleted = result.rows_affected() > 0;
    if deleted {
        tracing::debug!("Soft-deleted {} {}", F::ENTITY, id);
    }
    Ok(deleted)
}

/// Pool-backed repository for one entity type
pub struct SqliteRecordRepository<F> {
    pool: SqlitePool,
    marker: PhantomData<fn() -> F>,
}

impl<F> SqliteRecordRepository<F> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            marker: PhantomData,
        }
    }
}

impl<F> Clone for SqliteRecordRepository<F> {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}

#[async_trait]
impl<F: SqliteTable> RecordRepositoryPort<F> for SqliteRecordRepository<F> {
    async fn list(&self) -> Result<Vec<Record<F::Id, F>>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        list::<F>(&mut conn).await
    }

    async fn get(&self, id: F::Id) -> Result<Option<Record<F::Id, F>>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        find::<F>(&mut conn, id, Visibility::Live).await
    }

    async fn get_with_trashed(&self, id: F::Id) -> Result<Option<Record<F::Id, F>>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        find::<F>(&mut conn, id, Visibility::WithTrashed).await
    }

    async fn create(&self, fields: &F) -> Result<Record<F::Id, F>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        insert(&mut conn, fields).await
    }

    async fn update(&self, id: F::Id, fields: &F) -> Result<Option<Record<F::Id, F>>, StoreError> {
        let mut conn = self.pool.acquire().await?;
        update(&mut conn, id, fields).await
    }

    async fn soft_delete(&self, id: F::Id) -> Result<bool, StoreError> {
        let mut conn = self.pool.acquire().await?;
        soft_delete::<F>(&mut conn, id).await
    }
}
