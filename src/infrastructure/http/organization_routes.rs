//! Organization API routes

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{error_response, ShowParams};
use crate::application::services::{
    CreateOrganizationRequest as ServiceCreateOrganizationRequest, OrganizationLink,
    OrganizationService,
};
use crate::domain::entities::{
    EcosystemFields, EventFields, Linked, LocationFields, Organization, OrganizationFields,
    ProjectFields, RoleFields, SectorFields, StageFields,
};
use crate::domain::value_objects::{EcosystemId, OrganizationId, RoleId, SectorId};
use crate::infrastructure::state::AppState;

/// Flat request body for creating an organization with its location,
/// classification and ecosystem membership
#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    pub name: String,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub target_group: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date_founded: Option<NaiveDate>,
    #[serde(default)]
    pub date_registered: Option<NaiveDate>,
    #[serde(default)]
    pub tin_number: Option<String>,
    pub address: String,
    #[serde(default, alias = "long")]
    pub longitude: Option<f64>,
    #[serde(default, alias = "lat")]
    pub latitude: Option<f64>,
    pub role_id: i64,
    pub sector_id: i64,
    #[serde(default)]
    pub sector_description: Option<String>,
    pub ecosystem_id: i64,
}

impl From<CreateOrganizationRequest> for ServiceCreateOrganizationRequest {
    fn from(req: CreateOrganizationRequest) -> Self {
        Self {
            organization: OrganizationFields {
                name: req.name,
                website: req.website,
                target_group: req.target_group,
                description: req.description,
                date_founded: req.date_founded,
                date_registered: req.date_registered,
                tin_number: req.tin_number,
            },
            location: LocationFields {
                address: req.address,
                longitude: req.longitude,
                latitude: req.latitude,
            },
            role_id: RoleId::new(req.role_id),
            sector_id: SectorId::new(req.sector_id),
            sector_description: req.sector_description,
            ecosystem_id: EcosystemId::new(req.ecosystem_id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    pub id: i64,
    pub name: String,
    pub website: Option<String>,
    pub target_group: Option<String>,
    pub description: Option<String>,
    pub date_founded: Option<NaiveDate>,
    pub date_registered: Option<NaiveDate>,
    pub tin_number: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<Organization> for OrganizationResponse {
    fn from(o: Organization) -> Self {
        Self {
            id: o.id.get(),
            name: o.fields.name,
            website: o.fields.website,
            target_group: o.fields.target_group,
            description: o.fields.description,
            date_founded: o.fields.date_founded,
            date_registered: o.fields.date_registered,
            tin_number: o.fields.tin_number,
            created_at: o.created_at,
            updated_at: o.updated_at,
            deleted_at: o.deleted_at,
        }
    }
}

/// Pivot tables reachable from an organization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationName {
    Roles,
    Sectors,
    Locations,
    Stages,
    Events,
    Projects,
    Ecosystems,
}

impl RelationName {
    fn as_str(self) -> &'static str {
        match self {
            RelationName::Roles => "roles",
            RelationName::Sectors => "sectors",
            RelationName::Locations => "locations",
            RelationName::Stages => "stages",
            RelationName::Events => "events",
            RelationName::Projects => "projects",
            RelationName::Ecosystems => "ecosystems",
        }
    }
}

/// Run a generic handler with the field type matching `relation`
macro_rules! for_relation {
    ($relation:expr, $handler:ident($($arg:expr),*)) => {
        match $relation {
            RelationName::Roles => $handler::<RoleFields>($($arg),*).await,
            RelationName::Sectors => $handler::<SectorFields>($($arg),*).await,
            RelationName::Locations => $handler::<LocationFields>($($arg),*).await,
            RelationName::Stages => $handler::<StageFields>($($arg),*).await,
            RelationName::Events => $handler::<EventFields>($($arg),*).await,
            RelationName::Projects => $handler::<ProjectFields>($($arg),*).await,
            RelationName::Ecosystems => $handler::<EcosystemFields>($($arg),*).await,
        }
    };
}

#[derive(Debug, Deserialize)]
pub struct AttachRequest {
    pub id: i64,
    /// Sector description or ecosystem status, depending on the relation
    #[serde(default, alias = "description", alias = "status")]
    pub metadata: Option<String>,
}

/// List organizations
pub async fn list_organizations(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<OrganizationResponse>>, (StatusCode, String)> {
    let organizations = state
        .organization_service
        .list_organizations()
        .await
        .map_err(error_response)?;

    Ok(Json(
        organizations
            .into_iter()
            .map(OrganizationResponse::from)
            .collect(),
    ))
}

/// Create an organization with its location, role, sector and ecosystem
pub async fn create_organization(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrganizationRequest>,
) -> Result<(StatusCode, Json<OrganizationResponse>), (StatusCode, String)> {
    let organization = state
        .organization_service
        .create_organization(req.into())
        .await
        .map_err(error_response)?;

    Ok((
        StatusCode::CREATED,
        Json(OrganizationResponse::from(organization)),
    ))
}

/// Get an organization by ID
pub async fn get_organization(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<ShowParams>,
) -> Result<Json<OrganizationResponse>, (StatusCode, String)> {
    let organization = state
        .organization_service
        .get_organization(OrganizationId::new(id), params.with_trashed)
        .await
        .map_err(error_response)?;

    Ok(Json(OrganizationResponse::from(organization)))
}

/// Update an organization
pub async fn update_organization(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(fields): Json<OrganizationFields>,
) -> Result<Json<OrganizationResponse>, (StatusCode, String)> {
    let organization = state
        .organization_service
        .update_organization(OrganizationId::new(id), &fields)
        .await
        .map_err(error_response)?;

    Ok(Json(OrganizationResponse::from(organization)))
}

/// Soft delete an organization
pub async fn delete_organization(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .organization_service
        .delete_organization(OrganizationId::new(id))
        .await
        .map_err(error_response)?;

    Ok(StatusCode::NO_CONTENT)
}

/// List the records linked to an organization through one relation
pub async fn list_relation(
    State(state): State<Arc<AppState>>,
    Path((id, relation)): Path<(i64, RelationName)>,
) -> Result<Response, (StatusCode, String)> {
    for_relation!(relation, linked_records(&state, OrganizationId::new(id)))
}

async fn linked_records<R: OrganizationLink + Serialize>(
    state: &AppState,
    organization_id: OrganizationId,
) -> Result<Response, (StatusCode, String)> {
    let linked = state
        .organization_service
        .list_links::<R>(organization_id)
        .await
        .map_err(error_response)?;

    Ok(Json(linked).into_response())
}

/// Create an event or project and link it to the organization
pub async fn create_under_organization(
    State(state): State<Arc<AppState>>,
    Path((id, relation)): Path<(i64, RelationName)>,
    Json(body): Json<serde_json::Value>,
) -> Result<Response, (StatusCode, String)> {
    let organization_id = OrganizationId::new(id);
    let service = &state.organization_service;

    let created = match relation {
        RelationName::Events => {
            let fields: EventFields = parse_body(body)?;
            Json(service.create_event(organization_id, fields).await.map_err(error_response)?)
                .into_response()
        }
        RelationName::Projects => {
            let fields: ProjectFields = parse_body(body)?;
            Json(service.create_project(organization_id, fields).await.map_err(error_response)?)
                .into_response()
        }
        other => {
            return Err((
                StatusCode::METHOD_NOT_ALLOWED,
                format!(
                    "Cannot create {} under an organization; use /{}/attach",
                    other.as_str(),
                    other.as_str()
                ),
            ))
        }
    };

    Ok((StatusCode::CREATED, created).into_response())
}

fn parse_body<T: DeserializeOwned>(body: serde_json::Value) -> Result<T, (StatusCode, String)> {
    serde_json::from_value(body).map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
}

/// Link an existing record to the organization
pub async fn attach_related(
    State(state): State<Arc<AppState>>,
    Path((id, relation)): Path<(i64, RelationName)>,
    Json(req): Json<AttachRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    for_relation!(
        relation,
        attach_one(&state, OrganizationId::new(id), req.id, req.metadata)
    )
}

async fn attach_one<R: OrganizationLink>(
    state: &AppState,
    organization_id: OrganizationId,
    related_id: i64,
    metadata: Option<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .organization_service
        .attach_link::<R>(organization_id, R::Id::from(related_id), metadata)
        .await
        .map_err(error_response)?;

    Ok(StatusCode::CREATED)
}

/// Remove the link between the organization and a record
pub async fn detach_related(
    State(state): State<Arc<AppState>>,
    Path((id, relation, related_id)): Path<(i64, RelationName, i64)>,
) -> Result<StatusCode, (StatusCode, String)> {
    for_relation!(
        relation,
        detach_one(&state, OrganizationId::new(id), related_id)
    )
}

async fn detach_one<R: OrganizationLink>(
    state: &AppState,
    organization_id: OrganizationId,
    related_id: i64,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .organization_service
        .detach_link::<R>(organization_id, R::Id::from(related_id))
        .await
        .map_err(error_response)?;

    Ok(StatusCode::NO_CONTENT)
}

/// List the organizations in an ecosystem with their membership status
pub async fn list_ecosystem_organizations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Linked<OrganizationResponse>>>, (StatusCode, String)> {
    let members = state
        .organization_service
        .list_ecosystem_organizations(EcosystemId::new(id))
        .await
        .map_err(error_response)?;

    Ok(Json(
        members
            .into_iter()
            .map(|member| Linked {
                record: OrganizationResponse::from(member.record),
                link: member.link,
            })
            .collect(),
    ))
}
