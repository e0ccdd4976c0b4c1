//! Shared application state

use std::sync::Arc;

use anyhow::Result;

use crate::application::services::{OrganizationServiceImpl, RecordService};
use crate::domain::entities::{
    EcosystemFields, EventFields, LocationFields, OrganizationFields, ProjectFields, RoleFields,
    SectorFields, StageFields,
};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::persistence::{SqliteRepository, SqliteTable};

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    // Application services
    pub organization_service: OrganizationServiceImpl<SqliteRepository>,
    pub location_service: RecordService<LocationFields>,
    pub ecosystem_service: RecordService<EcosystemFields>,
    pub event_service: RecordService<EventFields>,
    pub project_service: RecordService<ProjectFields>,
    pub stage_service: RecordService<StageFields>,
    pub sector_service: RecordService<SectorFields>,
    pub role_service: RecordService<RoleFields>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        // Initialize SQLite repository (creates the schema if needed)
        let repository =
            SqliteRepository::new(&config.database_url, config.database_max_connections).await?;

        Ok(Self::with_repository(config, repository))
    }

    /// Wire every service onto an already opened repository
    pub fn with_repository(config: AppConfig, repository: SqliteRepository) -> Self {
        fn records<F: SqliteTable>(repository: &SqliteRepository) -> RecordService<F> {
            RecordService::new(Arc::new(repository.records::<F>()))
        }

        Self {
            location_service: records(&repository),
            ecosystem_service: records(&repository),
            event_service: records(&repository),
            project_service: records(&repository),
            stage_service: records(&repository),
            sector_service: records(&repository),
            role_service: records(&repository),
            organization_service: OrganizationServiceImpl::new(
                repository.clone(),
                Arc::new(repository.records::<OrganizationFields>()),
            ),
            config,
        }
    }
}
