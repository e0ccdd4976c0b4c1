//! Record Service - plain CRUD for the supporting entities
//!
//! Locations, ecosystems, events, projects, stages, sectors and roles have no
//! behaviour of their own; this service passes straight through to the record
//! repository and turns missing rows into `ServiceError::NotFound`.

use std::sync::Arc;

use tracing::{info, instrument};

use super::ServiceError;
use crate::application::ports::outbound::RecordRepositoryPort;
use crate::domain::entities::{EntityFields, Record};

pub struct RecordService<F: EntityFields> {
    repository: Arc<dyn RecordRepositoryPort<F>>,
}

impl<F: EntityFields> Clone for RecordService<F> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

impl<F: EntityFields> RecordService<F> {
    pub fn new(repository: Arc<dyn RecordRepositoryPort<F>>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self), fields(entity = F::ENTITY))]
    pub async fn list(&self) -> Result<Vec<Record<F::Id, F>>, ServiceError> {
        Ok(self.repository.list().await?)
    }

    /// Find a record; soft-deleted ones only when `with_trashed` is set
    #[instrument(skip(self), fields(entity = F::ENTITY))]
    pub async fn get(&self, id: F::Id, with_trashed: bool) -> Result<Record<F::Id, F>, ServiceError> {
        let record = if with_trashed {
            self.repository.get_with_trashed(id).await?
        } else {
            self.repository.get(id).await?
        };
        record.ok_or_else(|| ServiceError::not_found::<F>(id))
    }

    #[instrument(skip(self, fields), fields(entity = F::ENTITY))]
    pub async fn create(&self, fields: &F) -> Result<Record<F::Id, F>, ServiceError> {
        let record = self.repository.create(fields).await?;
        info!("Created {} {}", F::ENTITY, record.id);
        Ok(record)
    }

    #[instrument(skip(self, fields), fields(entity = F::ENTITY))]
    pub async fn update(&self, id: F::Id, fields: &F) -> Result<Record<F::Id, F>, ServiceError> {
        let record = self
            .repository
            .update(id, fields)
            .await?
            .ok_or_else(|| ServiceError::not_found::<F>(id))?;
        info!("Updated {} {}", F::ENTITY, id);
        Ok(record)
    }

    /// Soft delete; pivot rows pointing at the record are left in place
    #[instrument(skip(self), fields(entity = F::ENTITY))]
    pub async fn delete(&self, id: F::Id) -> Result<(), ServiceError> {
        if !self.repository.soft_delete(id).await? {
            return Err(ServiceError::not_found::<F>(id));
        }
        info!("Deleted {} {}", F::ENTITY, id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{SectorFields, StageFields};
    use crate::domain::value_objects::StageId;
    use crate::infrastructure::persistence::SqliteRepository;

    fn service<F: crate::infrastructure::persistence::SqliteTable>(
        repository: &SqliteRepository,
    ) -> RecordService<F> {
        RecordService::new(Arc::new(repository.records::<F>()))
    }

    #[tokio::test]
    async fn test_get_hides_deleted_unless_with_trashed() {
        let repository = SqliteRepository::in_memory().await;
        let stages = service::<StageFields>(&repository);

        let stage = stages.create(&StageFields::new("Seed")).await.unwrap();
        stages.delete(stage.id).await.unwrap();

        let err = stages.get(stage.id, false).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { entity: "Stage", .. }));

        let trashed = stages.get(stage.id, true).await.unwrap();
        assert!(trashed.is_deleted());
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let repository = SqliteRepository::in_memory().await;
        let stages = service::<StageFields>(&repository);
        let missing = StageId::new(41);

        assert!(matches!(
            stages.update(missing, &StageFields::new("x")).await,
            Err(ServiceError::NotFound { id: 41, .. })
        ));
        assert!(matches!(
            stages.delete(missing).await,
            Err(ServiceError::NotFound { id: 41, .. })
        ));
    }

    #[tokio::test]
    async fn test_list_returns_live_rows_in_order() {
        let repository = SqliteRepository::in_memory().await;
        let sectors = service::<SectorFields>(&repository);

        let agri = sectors.create(&SectorFields::new("Agriculture")).await.unwrap();
        let ict = sectors.create(&SectorFields::new("ICT")).await.unwrap();
        let health = sectors.create(&SectorFields::new("Health")).await.unwrap();
        sectors.delete(ict.id).await.unwrap();

        let ids: Vec<_> = sectors.list().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![agri.id, health.id]);
    }
}
