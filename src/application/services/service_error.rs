//! Errors returned by the application services

use crate::application::ports::outbound::StoreError;
use crate::domain::entities::EntityFields;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The id does not resolve to a live row
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// A step of a multi-row write failed; the transaction was rolled back
    #[error("Aggregate write failed: {0}")]
    AggregateWriteFailed(StoreError),

    #[error("Attach failed: {0}")]
    AttachFailed(StoreError),

    #[error("{owner} {owner_id} is not linked to {related} {related_id}")]
    DetachFailed {
        owner: &'static str,
        owner_id: i64,
        related: &'static str,
        related_id: i64,
    },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn not_found<F: EntityFields>(id: F::Id) -> Self {
        ServiceError::NotFound {
            entity: F::ENTITY,
            id: id.into(),
        }
    }

    pub fn not_linked<O: EntityFields, R: EntityFields>(owner_id: O::Id, related_id: R::Id) -> Self {
        ServiceError::DetachFailed {
            owner: O::ENTITY,
            owner_id: owner_id.into(),
            related: R::ENTITY,
            related_id: related_id.into(),
        }
    }
}
