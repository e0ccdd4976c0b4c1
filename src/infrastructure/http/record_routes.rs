//! CRUD routes shared by the plain record resources

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::{error_response, ShowParams};
use crate::application::services::RecordService;
use crate::domain::entities::{
    EcosystemFields, EventFields, LocationFields, ProjectFields, Record, RoleFields, SectorFields,
    StageFields,
};
use crate::infrastructure::persistence::SqliteTable;
use crate::infrastructure::state::AppState;

/// A record type exposed as a REST resource
pub trait RecordResource: SqliteTable + Serialize + DeserializeOwned {
    fn service(state: &AppState) -> &RecordService<Self>;
}

macro_rules! record_resource {
    ($fields:ty, $service:ident) => {
        impl RecordResource for $fields {
            fn service(state: &AppState) -> &RecordService<Self> {
                &state.$service
            }
        }
    };
}

record_resource!(LocationFields, location_service);
record_resource!(EcosystemFields, ecosystem_service);
record_resource!(EventFields, event_service);
record_resource!(ProjectFields, project_service);
record_resource!(StageFields, stage_service);
record_resource!(SectorFields, sector_service);
record_resource!(RoleFields, role_service);

/// `GET/POST {base}` and `GET/PUT/DELETE {base}/{id}`
pub fn routes<F: RecordResource>(base: &str) -> Router<Arc<AppState>> {
    Router::new()
        .route(base, get(list::<F>).post(create::<F>))
        .route(
            &format!("{base}/{{id}}"),
            get(show::<F>).put(update::<F>).delete(destroy::<F>),
        )
}

async fn list<F: RecordResource>(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Record<F::Id, F>>>, (StatusCode, String)> {
    let records = F::service(&state).list().await.map_err(error_response)?;
    Ok(Json(records))
}

async fn show<F: RecordResource>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(params): Query<ShowParams>,
) -> Result<Json<Record<F::Id, F>>, (StatusCode, String)> {
    let record = F::service(&state)
        .get(F::Id::from(id), params.with_trashed)
        .await
        .map_err(error_response)?;
    Ok(Json(record))
}

async fn create<F: RecordResource>(
    State(state): State<Arc<AppState>>,
    Json(fields): Json<F>,
) -> Result<(StatusCode, Json<Record<F::Id, F>>), (StatusCode, String)> {
    let record = F::service(&state)
        .create(&fields)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update<F: RecordResource>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(fields): Json<F>,
) -> Result<Json<Record<F::Id, F>>, (StatusCode, String)> {
    let record = F::service(&state)
        .update(F::Id::from(id), &fields)
        .await
        .map_err(error_response)?;
    Ok(Json(record))
}

async fn destroy<F: RecordResource>(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, (StatusCode, String)> {
    F::service(&state)
        .delete(F::Id::from(id))
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}
