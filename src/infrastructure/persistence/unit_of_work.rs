//! SQLite unit of work: one transaction carrying record and pivot operations

use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};

use super::link_repository::{self, Pivot};
use super::record_repository;
use super::table::SqliteTable;
use super::SqliteRepository;
use crate::application::ports::outbound::{
    LinkWork, OrganizationWork, RecordWork, StoreError, UnitOfWork, UnitOfWorkPort, Visibility,
};
use crate::domain::entities::{Linked, Record};

/// An open SQLite transaction; rolls back if dropped without commit
pub struct SqliteUnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl UnitOfWorkPort for SqliteRepository {
    type Work = SqliteUnitOfWork;

    async fn begin(&self) -> Result<SqliteUnitOfWork, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(SqliteUnitOfWork { tx })
    }

    async fn begin_write(&self) -> Result<SqliteUnitOfWork, StoreError> {
        // A deferred transaction that reads first can only upgrade to a write
        // lock by failing with SQLITE_BUSY when another writer got there first.
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        Ok(SqliteUnitOfWork { tx })
    }
}

#[async_trait]
impl UnitOfWork for SqliteUnitOfWork {
    async fn commit(self) -> Result<(), StoreError> {
        Ok(self.tx.commit().await?)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(self.tx.rollback().await?)
    }
}

#[async_trait]
impl<F: SqliteTable> RecordWork<F> for SqliteUnitOfWork {
    async fn insert(&mut self, fields: &F) -> Result<Record<F::Id, F>, StoreError> {
        record_repository::insert(&mut *self.tx, fields).await
    }

    async fn find(
        &mut self,
        id: F::Id,
        visibility: Visibility,
    ) -> Result<Option<Record<F::Id, F>>, StoreError> {
        record_repository::find::<F>(&mut *self.tx, id, visibility).await
    }
}

#[async_trait]
impl<O, R> LinkWork<O, R> for SqliteUnitOfWork
where
    O: Pivot<R>,
    R: SqliteTable,
{
    async fn attach(
        &mut self,
        owner: O::Id,
        related: R::Id,
        metadata: Option<&str>,
    ) -> Result<(), StoreError> {
        let relation = &<O as Pivot<R>>::RELATION;
        link_repository::attach(&mut *self.tx, relation, owner, related, metadata).await
    }

    async fn detach(&mut self, owner: O::Id, related: R::Id) -> Result<bool, StoreError> {
        let relation = &<O as Pivot<R>>::RELATION;
        link_repository::detach(&mut *self.tx, relation, owner, related).await
    }

    async fn list_linked(
        &mut self,
        owner: O::Id,
    ) -> Result<Vec<Linked<Record<R::Id, R>>>, StoreError> {
        let relation = &<O as Pivot<R>>::RELATION;
        link_repository::list_linked(&mut *self.tx, relation, owner).await
    }
}

impl OrganizationWork for SqliteUnitOfWork {}
