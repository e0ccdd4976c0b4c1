//! Unit of work port - multi-statement writes that commit or roll back together
//!
//! A unit of work is opened from a [`UnitOfWorkPort`] and exposes record and
//! pivot operations for the entity pairs it supports. Nothing it writes is
//! visible to other callers until `commit`; `rollback` discards it all.

use async_trait::async_trait;

use super::{StoreError, Visibility};
use crate::domain::entities::{
    EcosystemFields, EntityFields, EventFields, Linked, LocationFields, OrganizationFields,
    ProjectFields, Record, RoleFields, SectorFields, StageFields,
};

/// Record reads and inserts of entity `F` inside an open unit of work
#[async_trait]
pub trait RecordWork<F: EntityFields>: Send {
    async fn insert(&mut self, fields: &F) -> Result<Record<F::Id, F>, StoreError>;

    async fn find(
        &mut self,
        id: F::Id,
        visibility: Visibility,
    ) -> Result<Option<Record<F::Id, F>>, StoreError>;
}

/// Pivot operations between owner `O` and related `R` inside an open unit of work
#[async_trait]
pub trait LinkWork<O: EntityFields, R: EntityFields>: Send {
    /// Insert the pivot row
    ///
    /// A pair that is already linked fails with `StoreError::Duplicate`, an
    /// unknown id on either side with `StoreError::MissingReference`.
    async fn attach(
        &mut self,
        owner: O::Id,
        related: R::Id,
        metadata: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Remove the pivot row; `false` if the pair was not linked
    async fn detach(&mut self, owner: O::Id, related: R::Id) -> Result<bool, StoreError>;

    /// Live related records with their link data, in link order
    async fn list_linked(
        &mut self,
        owner: O::Id,
    ) -> Result<Vec<Linked<Record<R::Id, R>>>, StoreError>;
}

#[async_trait]
pub trait UnitOfWork: Send + Sized {
    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}

/// Everything the organization aggregate touches in one unit of work
pub trait OrganizationWork:
    UnitOfWork
    + RecordWork<LocationFields>
    + RecordWork<OrganizationFields>
    + RecordWork<EcosystemFields>
    + RecordWork<EventFields>
    + RecordWork<ProjectFields>
    + LinkWork<OrganizationFields, RoleFields>
    + LinkWork<OrganizationFields, SectorFields>
    + LinkWork<OrganizationFields, LocationFields>
    + LinkWork<OrganizationFields, StageFields>
    + LinkWork<OrganizationFields, EventFields>
    + LinkWork<OrganizationFields, ProjectFields>
    + LinkWork<OrganizationFields, EcosystemFields>
    + LinkWork<EcosystemFields, OrganizationFields>
{
}

/// Opens units of work against the store
#[async_trait]
pub trait UnitOfWorkPort: Send + Sync {
    type Work: OrganizationWork;

    /// Open a unit of work for reads
    async fn begin(&self) -> Result<Self::Work, StoreError>;

    /// Open a unit of work that holds the write lock from its first statement,
    /// so concurrent writers queue instead of failing on a lock upgrade
    async fn begin_write(&self) -> Result<Self::Work, StoreError>;
}
