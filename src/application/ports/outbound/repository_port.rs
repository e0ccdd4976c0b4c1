//! Repository ports - Interfaces for data persistence
//!
//! These traits define the contracts that infrastructure repositories must implement.
//! Application services depend on these traits, not concrete implementations.

use async_trait::async_trait;

use crate::domain::entities::{EntityFields, Record};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write (e.g. a pivot pair already linked)
    #[error("Duplicate row: {0}")]
    Duplicate(String),
    /// A foreign key points at a row that does not exist
    #[error("Missing referenced row: {0}")]
    MissingReference(String),
    #[error("Database error: {0}")]
    Database(String),
}

/// Which rows a lookup may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Only rows without a tombstone
    Live,
    /// Soft-deleted rows as well
    WithTrashed,
}

/// Repository port for plain record CRUD of a single entity type
#[async_trait]
pub trait RecordRepositoryPort<F: EntityFields>: Send + Sync {
    /// List live records, oldest first
    async fn list(&self) -> Result<Vec<Record<F::Id, F>>, StoreError>;

    /// Get a live record by ID
    async fn get(&self, id: F::Id) -> Result<Option<Record<F::Id, F>>, StoreError>;

    /// Get a record by ID even if it has been soft-deleted
    async fn get_with_trashed(&self, id: F::Id) -> Result<Option<Record<F::Id, F>>, StoreError>;

    /// Insert a new record
    async fn create(&self, fields: &F) -> Result<Record<F::Id, F>, StoreError>;

    /// Replace the fields of a live record; `None` if there is no such record
    async fn update(&self, id: F::Id, fields: &F) -> Result<Option<Record<F::Id, F>>, StoreError>;

    /// Soft delete a live record; `false` if there was nothing to delete
    async fn soft_delete(&self, id: F::Id) -> Result<bool, StoreError>;
}
