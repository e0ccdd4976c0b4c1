//! Organization Service - the organization resource and its aggregate writes
//!
//! Creating an organization writes a location, the organization itself and
//! four pivot rows in one unit of work. Events and projects created under an
//! organization are written together with their link the same way. Any
//! failing step rolls the whole unit back, so callers never observe a partial
//! aggregate.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::{RecordService, ServiceError};
use crate::application::ports::outbound::{
    LinkWork, OrganizationWork, RecordRepositoryPort, RecordWork, StoreError, UnitOfWork,
    UnitOfWorkPort, Visibility,
};
use crate::domain::entities::{
    EcosystemFields, EntityFields, Event, EventFields, Linked, LocationFields, Organization,
    OrganizationFields, Project, ProjectFields, Record, RoleFields, SectorFields, StageFields,
};
use crate::domain::value_objects::{EcosystemId, LinkStatus, OrganizationId, RoleId, SectorId};

/// Everything needed to create an organization together with its location,
/// classification links and ecosystem membership
#[derive(Debug, Clone)]
pub struct CreateOrganizationRequest {
    pub organization: OrganizationFields,
    pub location: LocationFields,
    pub role_id: RoleId,
    pub sector_id: SectorId,
    /// Stored on the organization-sector link, not on the sector
    pub sector_description: Option<String>,
    pub ecosystem_id: EcosystemId,
}

/// An entity that can be attached to an organization through a pivot table
pub trait OrganizationLink: EntityFields {
    /// The pivot operations for this relation on an open unit of work
    fn links<W: OrganizationWork>(work: &mut W) -> &mut dyn LinkWork<OrganizationFields, Self>;

    /// Check and canonicalize the metadata stored on the link
    ///
    /// Relations whose pivot carries no metadata refuse any value.
    fn link_metadata(raw: Option<String>) -> Result<Option<String>, ServiceError> {
        match raw {
            None => Ok(None),
            Some(_) => Err(ServiceError::ValidationFailed(format!(
                "{} links carry no metadata",
                Self::ENTITY
            ))),
        }
    }
}

/// A record created under an organization and linked to it in one unit of work
pub trait OrganizationChild: OrganizationLink {
    fn records<W: OrganizationWork>(work: &mut W) -> &mut dyn RecordWork<Self>;
}

macro_rules! organization_link {
    ($($fields:ty),*) => {
        $(
            impl OrganizationLink for $fields {
                fn links<W: OrganizationWork>(
                    work: &mut W,
                ) -> &mut dyn LinkWork<OrganizationFields, Self> {
                    work
                }
            }
        )*
    };
}

organization_link!(RoleFields, LocationFields, StageFields, EventFields, ProjectFields);

impl OrganizationLink for SectorFields {
    fn links<W: OrganizationWork>(work: &mut W) -> &mut dyn LinkWork<OrganizationFields, Self> {
        work
    }

    fn link_metadata(raw: Option<String>) -> Result<Option<String>, ServiceError> {
        Ok(raw)
    }
}

impl OrganizationLink for EcosystemFields {
    fn links<W: OrganizationWork>(work: &mut W) -> &mut dyn LinkWork<OrganizationFields, Self> {
        work
    }

    fn link_metadata(raw: Option<String>) -> Result<Option<String>, ServiceError> {
        raw.map(|status| {
            status
                .parse::<LinkStatus>()
                .map(|status| status.as_str().to_string())
                .map_err(|e| ServiceError::ValidationFailed(e.to_string()))
        })
        .transpose()
    }
}

impl OrganizationChild for EventFields {
    fn records<W: OrganizationWork>(work: &mut W) -> &mut dyn RecordWork<Self> {
        work
    }
}

impl OrganizationChild for ProjectFields {
    fn records<W: OrganizationWork>(work: &mut W) -> &mut dyn RecordWork<Self> {
        work
    }
}

/// Organization service trait defining the application use cases
#[async_trait]
pub trait OrganizationService: Send + Sync {
    /// Create an organization with its location, role, sector and ecosystem
    /// membership, all or nothing
    async fn create_organization(
        &self,
        request: CreateOrganizationRequest,
    ) -> Result<Organization, ServiceError>;

    /// Create an event and link it to a live organization in one unit of work
    async fn create_event(
        &self,
        organization_id: OrganizationId,
        fields: EventFields,
    ) -> Result<Event, ServiceError>;

    /// Create a project and link it to a live organization in one unit of work
    async fn create_project(
        &self,
        organization_id: OrganizationId,
        fields: ProjectFields,
    ) -> Result<Project, ServiceError>;

    async fn list_organizations(&self) -> Result<Vec<Organization>, ServiceError>;

    async fn get_organization(
        &self,
        id: OrganizationId,
        with_trashed: bool,
    ) -> Result<Organization, ServiceError>;

    async fn update_organization(
        &self,
        id: OrganizationId,
        fields: &OrganizationFields,
    ) -> Result<Organization, ServiceError>;

    async fn delete_organization(&self, id: OrganizationId) -> Result<(), ServiceError>;

    /// Live records of kind `R` linked to a live organization
    async fn list_links<R: OrganizationLink>(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Linked<Record<R::Id, R>>>, ServiceError>;

    /// Link an existing record to a live organization
    ///
    /// A pair that is already linked, or a related id that does not exist,
    /// fails with `AttachFailed`.
    async fn attach_link<R: OrganizationLink>(
        &self,
        organization_id: OrganizationId,
        related_id: R::Id,
        metadata: Option<String>,
    ) -> Result<(), ServiceError>;

    /// Remove the link between a live organization and a record
    async fn detach_link<R: OrganizationLink>(
        &self,
        organization_id: OrganizationId,
        related_id: R::Id,
    ) -> Result<(), ServiceError>;

    /// Organizations that belong to a live ecosystem, with their status
    async fn list_ecosystem_organizations(
        &self,
        ecosystem_id: EcosystemId,
    ) -> Result<Vec<Linked<Organization>>, ServiceError>;
}

/// Default implementation of OrganizationService over a unit-of-work store
pub struct OrganizationServiceImpl<S> {
    store: S,
    records: RecordService<OrganizationFields>,
}

impl<S: UnitOfWorkPort> OrganizationServiceImpl<S> {
    pub fn new(store: S, records: Arc<dyn RecordRepositoryPort<OrganizationFields>>) -> Self {
        Self {
            store,
            records: RecordService::new(records),
        }
    }

    /// Validate an organization creation request
    fn validate_create_request(request: &CreateOrganizationRequest) -> Result<(), ServiceError> {
        Self::validate_fields(&request.organization)?;
        let location = &request.location;
        if location.address.trim().is_empty() {
            return Err(ServiceError::ValidationFailed(
                "Address cannot be empty".to_string(),
            ));
        }
        if let Some(longitude) = location.longitude {
            if !(-180.0..=180.0).contains(&longitude) {
                return Err(ServiceError::ValidationFailed(format!(
                    "Longitude {longitude} is out of range"
                )));
            }
        }
        if let Some(latitude) = location.latitude {
            if !(-90.0..=90.0).contains(&latitude) {
                return Err(ServiceError::ValidationFailed(format!(
                    "Latitude {latitude} is out of range"
                )));
            }
        }
        Ok(())
    }

    fn validate_fields(fields: &OrganizationFields) -> Result<(), ServiceError> {
        if fields.name.trim().is_empty() {
            return Err(ServiceError::ValidationFailed(
                "Organization name cannot be empty".to_string(),
            ));
        }
        if fields.name.len() > 255 {
            return Err(ServiceError::ValidationFailed(
                "Organization name cannot exceed 255 characters".to_string(),
            ));
        }
        Ok(())
    }

    async fn create_under_organization<R: OrganizationChild>(
        &self,
        organization_id: OrganizationId,
        fields: &R,
    ) -> Result<Record<R::Id, R>, ServiceError> {
        let mut work = self
            .store
            .begin_write()
            .await
            .map_err(ServiceError::AggregateWriteFailed)?;

        let outcome = write_child(&mut work, organization_id, fields).await;
        let child = settle(work, outcome, ServiceError::AggregateWriteFailed).await?;

        info!(
            "Created {} {} under organization {}",
            R::ENTITY,
            child.id,
            organization_id
        );
        Ok(child)
    }
}

#[async_trait]
impl<S: UnitOfWorkPort> OrganizationService for OrganizationServiceImpl<S> {
    #[instrument(skip(self, request), fields(name = %request.organization.name, ecosystem_id = %request.ecosystem_id))]
    async fn create_organization(
        &self,
        request: CreateOrganizationRequest,
    ) -> Result<Organization, ServiceError> {
        Self::validate_create_request(&request)?;

        let mut work = self
            .store
            .begin_write()
            .await
            .map_err(ServiceError::AggregateWriteFailed)?;

        let outcome = write_organization_aggregate(&mut work, &request).await;
        let organization = settle(work, outcome, ServiceError::AggregateWriteFailed).await?;

        info!(
            "Created organization {} ({})",
            organization.id, organization.fields.name
        );
        Ok(organization)
    }

    #[instrument(skip(self, fields))]
    async fn create_event(
        &self,
        organization_id: OrganizationId,
        fields: EventFields,
    ) -> Result<Event, ServiceError> {
        self.create_under_organization(organization_id, &fields).await
    }

    #[instrument(skip(self, fields))]
    async fn create_project(
        &self,
        organization_id: OrganizationId,
        fields: ProjectFields,
    ) -> Result<Project, ServiceError> {
        self.create_under_organization(organization_id, &fields).await
    }

    async fn list_organizations(&self) -> Result<Vec<Organization>, ServiceError> {
        self.records.list().await
    }

    async fn get_organization(
        &self,
        id: OrganizationId,
        with_trashed: bool,
    ) -> Result<Organization, ServiceError> {
        self.records.get(id, with_trashed).await
    }

    async fn update_organization(
        &self,
        id: OrganizationId,
        fields: &OrganizationFields,
    ) -> Result<Organization, ServiceError> {
        Self::validate_fields(fields)?;
        self.records.update(id, fields).await
    }

    async fn delete_organization(&self, id: OrganizationId) -> Result<(), ServiceError> {
        self.records.delete(id).await
    }

    #[instrument(skip(self), fields(related = R::ENTITY))]
    async fn list_links<R: OrganizationLink>(
        &self,
        organization_id: OrganizationId,
    ) -> Result<Vec<Linked<Record<R::Id, R>>>, ServiceError> {
        let mut work = self.store.begin().await?;

        let outcome = async {
            live_organization(&mut work, organization_id).await?;
            let linked = R::links(&mut work).list_linked(organization_id).await?;
            Ok::<_, ServiceError>(linked)
        }
        .await;

        settle(work, outcome, ServiceError::Store).await
    }

    #[instrument(skip(self, metadata), fields(related = R::ENTITY))]
    async fn attach_link<R: OrganizationLink>(
        &self,
        organization_id: OrganizationId,
        related_id: R::Id,
        metadata: Option<String>,
    ) -> Result<(), ServiceError> {
        let metadata = R::link_metadata(metadata)?;
        let mut work = self.store.begin_write().await?;

        let outcome = async {
            live_organization(&mut work, organization_id).await?;
            R::links(&mut work)
                .attach(organization_id, related_id, metadata.as_deref())
                .await
                .map_err(ServiceError::AttachFailed)
        }
        .await;

        settle(work, outcome, ServiceError::Store).await?;
        info!(
            "Attached {} {} to organization {}",
            R::ENTITY,
            related_id,
            organization_id
        );
        Ok(())
    }

    #[instrument(skip(self), fields(related = R::ENTITY))]
    async fn detach_link<R: OrganizationLink>(
        &self,
        organization_id: OrganizationId,
        related_id: R::Id,
    ) -> Result<(), ServiceError> {
        let mut work = self.store.begin_write().await?;

        let outcome = async {
            live_organization(&mut work, organization_id).await?;
            if R::links(&mut work).detach(organization_id, related_id).await? {
                Ok(())
            } else {
                Err(ServiceError::not_linked::<OrganizationFields, R>(
                    organization_id,
                    related_id,
                ))
            }
        }
        .await;

        settle(work, outcome, ServiceError::Store).await?;
        info!(
            "Detached {} {} from organization {}",
            R::ENTITY,
            related_id,
            organization_id
        );
        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_ecosystem_organizations(
        &self,
        ecosystem_id: EcosystemId,
    ) -> Result<Vec<Linked<Organization>>, ServiceError> {
        let mut work = self.store.begin().await?;

        let outcome = async {
            RecordWork::<EcosystemFields>::find(&mut work, ecosystem_id, Visibility::Live)
                .await?
                .ok_or_else(|| ServiceError::not_found::<EcosystemFields>(ecosystem_id))?;
            let members =
                LinkWork::<EcosystemFields, OrganizationFields>::list_linked(&mut work, ecosystem_id)
                    .await?;
            Ok::<_, ServiceError>(members)
        }
        .await;

        settle(work, outcome, ServiceError::Store).await
    }
}

/// The seven ordered steps of organization creation, run on one unit of work
async fn write_organization_aggregate<W: OrganizationWork>(
    work: &mut W,
    request: &CreateOrganizationRequest,
) -> Result<Organization, ServiceError> {
    let failed = ServiceError::AggregateWriteFailed;

    let location = RecordWork::<LocationFields>::insert(&mut *work, &request.location)
        .await
        .map_err(failed)?;
    let organization = RecordWork::<OrganizationFields>::insert(&mut *work, &request.organization)
        .await
        .map_err(failed)?;
    debug!(
        "Inserted location {} and organization {}",
        location.id, organization.id
    );

    RoleFields::links(work)
        .attach(organization.id, request.role_id, None)
        .await
        .map_err(failed)?;
    SectorFields::links(work)
        .attach(
            organization.id,
            request.sector_id,
            request.sector_description.as_deref(),
        )
        .await
        .map_err(failed)?;
    LocationFields::links(work)
        .attach(organization.id, location.id, None)
        .await
        .map_err(failed)?;

    let ecosystem = RecordWork::<EcosystemFields>::find(&mut *work, request.ecosystem_id, Visibility::Live)
        .await
        .map_err(failed)?
        .ok_or_else(|| ServiceError::not_found::<EcosystemFields>(request.ecosystem_id))?;

    LinkWork::<EcosystemFields, OrganizationFields>::attach(
        &mut *work,
        ecosystem.id,
        organization.id,
        Some(LinkStatus::Active.as_str()),
    )
    .await
    .map_err(failed)?;

    Ok(organization)
}

/// Insert a child record and link it to a live organization
async fn write_child<W: OrganizationWork, R: OrganizationChild>(
    work: &mut W,
    organization_id: OrganizationId,
    fields: &R,
) -> Result<Record<R::Id, R>, ServiceError> {
    live_organization(work, organization_id).await?;

    let child = R::records(work)
        .insert(fields)
        .await
        .map_err(ServiceError::AggregateWriteFailed)?;
    R::links(work)
        .attach(organization_id, child.id, None)
        .await
        .map_err(ServiceError::AggregateWriteFailed)?;

    Ok(child)
}

async fn live_organization<W: OrganizationWork>(
    work: &mut W,
    id: OrganizationId,
) -> Result<Organization, ServiceError> {
    RecordWork::<OrganizationFields>::find(&mut *work, id, Visibility::Live)
        .await?
        .ok_or_else(|| ServiceError::not_found::<OrganizationFields>(id))
}

/// Commit on success, roll back on failure
///
/// A failed commit is reported through `on_commit`. A failed rollback is
/// logged and the failing step's error is still returned.
async fn settle<W: UnitOfWork, T>(
    work: W,
    outcome: Result<T, ServiceError>,
    on_commit: fn(StoreError) -> ServiceError,
) -> Result<T, ServiceError> {
    match outcome {
        Ok(value) => {
            work.commit().await.map_err(on_commit)?;
            Ok(value)
        }
        Err(error) => {
            if let Err(rollback_error) = work.rollback().await {
                warn!("Rollback failed: {}", rollback_error);
            }
            debug!("Rolled back: {}", error);
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::StageId;
    use crate::infrastructure::persistence::SqliteRepository;
    use chrono::NaiveDate;

    struct Fixture {
        repository: SqliteRepository,
        service: OrganizationServiceImpl<SqliteRepository>,
        role: RoleId,
        sector: SectorId,
        ecosystem: EcosystemId,
    }

    async fn fixture() -> Fixture {
        seeded(SqliteRepository::in_memory().await).await
    }

    async fn seeded(repository: SqliteRepository) -> Fixture {
        let role = repository
            .records::<RoleFields>()
            .create(&RoleFields::new("Incubator"))
            .await
            .unwrap();
        let sector = repository
            .records::<SectorFields>()
            .create(&SectorFields::new("ICT"))
            .await
            .unwrap();
        let ecosystem = repository
            .records::<EcosystemFields>()
            .create(&EcosystemFields::new("Nairobi"))
            .await
            .unwrap();

        Fixture {
            service: OrganizationServiceImpl::new(
                repository.clone(),
                Arc::new(repository.records::<OrganizationFields>()),
            ),
            repository,
            role: role.id,
            sector: sector.id,
            ecosystem: ecosystem.id,
        }
    }

    impl Fixture {
        fn acme(&self) -> CreateOrganizationRequest {
            CreateOrganizationRequest {
                organization: OrganizationFields::new("Acme")
                    .with_website("https://acme.example")
                    .with_date_founded(NaiveDate::from_ymd_opt(2012, 3, 1).unwrap()),
                location: LocationFields::new("1 Main St").with_coordinates(36.8, -1.3),
                role_id: self.role,
                sector_id: self.sector,
                sector_description: Some("Tech".to_string()),
                ecosystem_id: self.ecosystem,
            }
        }

        async fn count(&self, table: &str) -> i64 {
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
                .fetch_one(self.repository.pool())
                .await
                .unwrap()
        }

        async fn counts(&self) -> [i64; 6] {
            [
                self.count("locations").await,
                self.count("organizations").await,
                self.count("organization_roles").await,
                self.count("organization_sectors").await,
                self.count("organization_locations").await,
                self.count("ecosystem_organizations").await,
            ]
        }

        async fn execute(&self, sql: &str) {
            sqlx::query(sql)
                .execute(self.repository.pool())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_create_organization_writes_whole_aggregate() {
        let f = fixture().await;

        let organization = f.service.create_organization(f.acme()).await.unwrap();
        assert_eq!(organization.fields.name, "Acme");
        assert!(organization.id.get() > 0);
        assert_eq!(f.counts().await, [1, 1, 1, 1, 1, 1]);

        let roles = f.service.list_links::<RoleFields>(organization.id).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].record.id, f.role);

        let sectors = f.service.list_links::<SectorFields>(organization.id).await.unwrap();
        assert_eq!(sectors[0].record.id, f.sector);
        assert_eq!(sectors[0].link.metadata.as_deref(), Some("Tech"));

        let locations = f
            .service
            .list_links::<LocationFields>(organization.id)
            .await
            .unwrap();
        assert_eq!(locations[0].record.fields.address, "1 Main St");

        let members = f
            .service
            .list_ecosystem_organizations(f.ecosystem)
            .await
            .unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].record.id, organization.id);
        assert_eq!(members[0].link.metadata.as_deref(), Some("active"));
    }

    #[tokio::test]
    async fn test_missing_ecosystem_rolls_back_everything() {
        let f = fixture().await;
        let mut request = f.acme();
        request.ecosystem_id = EcosystemId::new(999);

        let err = f.service.create_organization(request).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                entity: "Ecosystem",
                id: 999
            }
        ));
        assert_eq!(f.counts().await, [0, 0, 0, 0, 0, 0]);

        let stray: Option<i64> =
            sqlx::query_scalar("SELECT id FROM locations WHERE address = '1 Main St'")
                .fetch_optional(f.repository.pool())
                .await
                .unwrap();
        assert!(stray.is_none());
    }

    #[tokio::test]
    async fn test_deleted_ecosystem_counts_as_missing() {
        let f = fixture().await;
        f.execute("UPDATE ecosystems SET deleted_at = updated_at").await;

        let err = f.service.create_organization(f.acme()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
        assert_eq!(f.count("organizations").await, 0);
    }

    #[tokio::test]
    async fn test_missing_role_rolls_back_with_aggregate_error() {
        let f = fixture().await;
        let mut request = f.acme();
        request.role_id = RoleId::new(999);

        let err = f.service.create_organization(request).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::AggregateWriteFailed(StoreError::MissingReference(_))
        ));
        assert_eq!(f.counts().await, [0, 0, 0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_service_usable_after_rollback() {
        let f = fixture().await;
        let mut request = f.acme();
        request.sector_id = SectorId::new(999);
        assert!(f.service.create_organization(request).await.is_err());

        f.service.create_organization(f.acme()).await.unwrap();
        assert_eq!(f.counts().await, [1, 1, 1, 1, 1, 1]);
    }

    #[tokio::test]
    async fn test_invalid_request_writes_nothing() {
        let f = fixture().await;

        let mut request = f.acme();
        request.organization.name = "   ".to_string();
        let err = f.service.create_organization(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));

        let mut request = f.acme();
        request.location.latitude = Some(120.0);
        let err = f.service.create_organization(request).await.unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));

        assert_eq!(f.counts().await, [0, 0, 0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_update_rejects_blank_name() {
        let f = fixture().await;
        let organization = f.service.create_organization(f.acme()).await.unwrap();

        let err = f
            .service
            .update_organization(organization.id, &OrganizationFields::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn test_event_under_organization_uses_event_relation() {
        let f = fixture().await;
        let organization = f.service.create_organization(f.acme()).await.unwrap();

        let event = f
            .service
            .create_event(organization.id, EventFields::new("Demo Day"))
            .await
            .unwrap();

        let events = f.service.list_links::<EventFields>(organization.id).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].record.id, event.id);
        assert!(f
            .service
            .list_links::<ProjectFields>(organization.id)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_project_under_organization_uses_project_relation() {
        let f = fixture().await;
        let organization = f.service.create_organization(f.acme()).await.unwrap();

        let project = f
            .service
            .create_project(organization.id, ProjectFields::new("Library"))
            .await
            .unwrap();

        let projects = f
            .service
            .list_links::<ProjectFields>(organization.id)
            .await
            .unwrap();
        assert_eq!(projects[0].record.id, project.id);
        assert_eq!(f.count("organization_events").await, 0);
    }

    #[tokio::test]
    async fn test_child_under_missing_organization_writes_nothing() {
        let f = fixture().await;

        let err = f
            .service
            .create_event(OrganizationId::new(77), EventFields::new("Orphan"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::NotFound {
                entity: "Organization",
                id: 77
            }
        ));
        assert_eq!(f.count("events").await, 0);
    }

    #[tokio::test]
    async fn test_failed_child_link_undoes_child_insert() {
        let f = fixture().await;
        let organization = f.service.create_organization(f.acme()).await.unwrap();
        f.execute(
            "CREATE TRIGGER refuse_event_links BEFORE INSERT ON organization_events \
             BEGIN SELECT RAISE(ABORT, 'event links refused'); END",
        )
        .await;
        f.execute(
            "CREATE TRIGGER refuse_project_links BEFORE INSERT ON organization_projects \
             BEGIN SELECT RAISE(ABORT, 'project links refused'); END",
        )
        .await;

        let err = f
            .service
            .create_event(organization.id, EventFields::new("Demo Day"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AggregateWriteFailed(_)));
        assert_eq!(f.count("events").await, 0);
        assert_eq!(f.count("organization_events").await, 0);

        let err = f
            .service
            .create_project(organization.id, ProjectFields::new("Library"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AggregateWriteFailed(_)));
        assert_eq!(f.count("projects").await, 0);
        assert_eq!(f.count("organization_projects").await, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_children_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("ecosystem.db").display());
        let f = seeded(SqliteRepository::new(&url, 5).await.unwrap()).await;
        let organization = f.service.create_organization(f.acme()).await.unwrap();

        let service = Arc::new(f.service);
        let handles: Vec<_> = (0..40)
            .map(|i| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    if i % 2 == 0 {
                        service
                            .create_event(organization.id, EventFields::new(format!("Meetup {i}")))
                            .await
                            .map(|_| ())
                    } else {
                        service
                            .create_project(organization.id, ProjectFields::new(format!("Lab {i}")))
                            .await
                            .map(|_| ())
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM organization_events")
            .fetch_one(f.repository.pool())
            .await
            .unwrap();
        let projects: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM organization_projects")
            .fetch_one(f.repository.pool())
            .await
            .unwrap();
        assert_eq!((events, projects), (20, 20));
    }

    #[tokio::test]
    async fn test_duplicate_attach_fails() {
        let f = fixture().await;
        let organization = f.service.create_organization(f.acme()).await.unwrap();

        // The coordinator already linked this role
        let err = f
            .service
            .attach_link::<RoleFields>(organization.id, f.role, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AttachFailed(StoreError::Duplicate(_))));
        assert_eq!(f.count("organization_roles").await, 1);
    }

    #[tokio::test]
    async fn test_attach_unknown_related_id_fails() {
        let f = fixture().await;
        let organization = f.service.create_organization(f.acme()).await.unwrap();

        let err = f
            .service
            .attach_link::<StageFields>(organization.id, StageId::new(5), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::AttachFailed(StoreError::MissingReference(_))
        ));
    }

    #[tokio::test]
    async fn test_metadata_on_plain_relation_is_rejected() {
        let f = fixture().await;
        let organization = f.service.create_organization(f.acme()).await.unwrap();
        let stage = f
            .repository
            .records::<StageFields>()
            .create(&StageFields::new("Growth"))
            .await
            .unwrap();

        let err = f
            .service
            .attach_link::<StageFields>(organization.id, stage.id, Some("fast".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));
        assert_eq!(f.count("organization_stages").await, 0);
    }

    #[tokio::test]
    async fn test_detach_then_detach_again() {
        let f = fixture().await;
        let organization = f.service.create_organization(f.acme()).await.unwrap();

        f.service
            .detach_link::<RoleFields>(organization.id, f.role)
            .await
            .unwrap();
        let err = f
            .service
            .detach_link::<RoleFields>(organization.id, f.role)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::DetachFailed { .. }));

        // The role itself is untouched
        assert_eq!(f.count("roles").await, 1);
    }

    #[tokio::test]
    async fn test_ecosystem_status_is_validated() {
        let f = fixture().await;
        let organization = f.service.create_organization(f.acme()).await.unwrap();
        let other = f
            .repository
            .records::<EcosystemFields>()
            .create(&EcosystemFields::new("Kampala"))
            .await
            .unwrap();

        let err = f
            .service
            .attach_link::<EcosystemFields>(organization.id, other.id, Some("dormant".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationFailed(_)));

        f.service
            .attach_link::<EcosystemFields>(organization.id, other.id, Some("Inactive".into()))
            .await
            .unwrap();
        let ecosystems = f
            .service
            .list_links::<EcosystemFields>(organization.id)
            .await
            .unwrap();
        assert_eq!(ecosystems.len(), 2);
        assert_eq!(ecosystems[1].link.metadata.as_deref(), Some("inactive"));
    }

    #[tokio::test]
    async fn test_soft_deleted_organization_lifecycle() {
        let f = fixture().await;
        let organization = f.service.create_organization(f.acme()).await.unwrap();

        f.service.delete_organization(organization.id).await.unwrap();

        assert!(f.service.list_organizations().await.unwrap().is_empty());
        assert!(matches!(
            f.service.get_organization(organization.id, false).await,
            Err(ServiceError::NotFound { .. })
        ));
        let trashed = f
            .service
            .get_organization(organization.id, true)
            .await
            .unwrap();
        assert_eq!(trashed.fields.name, "Acme");

        // Links survive the soft delete but the organization is no longer addressable
        assert_eq!(f.count("organization_roles").await, 1);
        assert!(matches!(
            f.service.list_links::<RoleFields>(organization.id).await,
            Err(ServiceError::NotFound { .. })
        ));
    }
}
