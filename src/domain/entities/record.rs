//! Stored record envelope shared by every entity
//!
//! Each entity is a plain set of fields (`OrganizationFields`, `RoleFields`, ...)
//! wrapped in a [`Record`] that carries the surrogate identifier and the
//! bookkeeping timestamps assigned by the store.

use std::fmt::{Debug, Display};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// The writable attributes of an entity type
pub trait EntityFields: Clone + Debug + Send + Sync + 'static {
    /// Identifier type assigned by the store
    type Id: Copy
        + Eq
        + Debug
        + Display
        + From<i64>
        + Into<i64>
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Human readable entity name, used in error messages
    const ENTITY: &'static str;
}

/// A persisted entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record<I, F> {
    pub id: I,
    #[serde(flatten)]
    pub fields: F,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Tombstone; soft-deleted records are hidden from default queries
    pub deleted_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
impl<I, F> Record<I, F> {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// A related record reached through a pivot row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Linked<R> {
    #[serde(flatten)]
    pub record: R,
    pub link: LinkInfo,
}

/// Data stored on the pivot row itself
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkInfo {
    /// Relation specific metadata (sector description, ecosystem status)
    pub metadata: Option<String>,
    pub linked_at: DateTime<Utc>,
}
