//! HTTP REST API routes

mod organization_routes;
mod record_routes;

use axum::{
    http::StatusCode,
    routing::{delete, get, post, put},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::application::services::ServiceError;
use crate::domain::entities::{
    EcosystemFields, EventFields, LocationFields, ProjectFields, RoleFields, SectorFields,
    StageFields,
};
use crate::infrastructure::state::AppState;

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Organization routes
        .route(
            "/api/organizations",
            get(organization_routes::list_organizations),
        )
        .route(
            "/api/organizations",
            post(organization_routes::create_organization),
        )
        .route(
            "/api/organizations/{id}",
            get(organization_routes::get_organization),
        )
        .route(
            "/api/organizations/{id}",
            put(organization_routes::update_organization),
        )
        .route(
            "/api/organizations/{id}",
            delete(organization_routes::delete_organization),
        )
        // Relation routes; POST creates an event or project under the organization
        .route(
            "/api/organizations/{id}/{relation}",
            get(organization_routes::list_relation),
        )
        .route(
            "/api/organizations/{id}/{relation}",
            post(organization_routes::create_under_organization),
        )
        .route(
            "/api/organizations/{id}/{relation}/attach",
            post(organization_routes::attach_related),
        )
        .route(
            "/api/organizations/{id}/{relation}/{related_id}",
            delete(organization_routes::detach_related),
        )
        .route(
            "/api/ecosystems/{id}/organizations",
            get(organization_routes::list_ecosystem_organizations),
        )
        // Plain record resources
        .merge(record_routes::routes::<LocationFields>("/api/locations"))
        .merge(record_routes::routes::<EcosystemFields>("/api/ecosystems"))
        .merge(record_routes::routes::<EventFields>("/api/events"))
        .merge(record_routes::routes::<ProjectFields>("/api/projects"))
        .merge(record_routes::routes::<StageFields>("/api/stages"))
        .merge(record_routes::routes::<SectorFields>("/api/sectors"))
        .merge(record_routes::routes::<RoleFields>("/api/roles"))
}

/// Query parameters accepted by every `show` endpoint
#[derive(Debug, Default, Deserialize)]
pub struct ShowParams {
    #[serde(default)]
    pub with_trashed: bool,
}

/// Map a service error onto a status code and message
pub(crate) fn error_response(error: ServiceError) -> (StatusCode, String) {
    let status = match &error {
        ServiceError::NotFound { .. } | ServiceError::DetachFailed { .. } => StatusCode::NOT_FOUND,
        ServiceError::ValidationFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::AttachFailed(_) => StatusCode::CONFLICT,
        ServiceError::AggregateWriteFailed(_) | ServiceError::Store(_) => {
            tracing::error!("Request failed: {}", error);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, error.to_string())
}
