// handlers/protected/beeyards.rs - /api/beeyards handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use serde::Serialize;
use std::collections::HashMap;

use crate::api::format::{self, BeeYardView, InterventionView};
use crate::app::AppState;
use crate::database::models::InterventionType;
use crate::middleware::{ApiResponse, ApiResult};
use crate::ownership::Identity;
use crate::services::beeyards::{self, BeeYardInput, BulkInput};

#[derive(Debug, Serialize)]
pub struct BulkCreated {
    pub interventions: Vec<InterventionView>,
}

/// GET /api/beeyards - the caller's bee yards, filtered by `name[__lookup]`
pub async fn beeyard_list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Vec<BeeYardView>> {
    let store = state.store.as_ref();
    let yards = beeyards::list(store, &identity, &query).await?;
    Ok(ApiResponse::success(format::beeyards(store, yards).await?))
}

/// POST /api/beeyards - create a yard owned by the caller
///
/// ```json
/// { "name": "North field" }
/// ```
pub async fn beeyard_create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<BeeYardInput>, JsonRejection>,
) -> ApiResult<BeeYardView> {
    identity.require()?;
    let Json(input) = payload?;
    let store = state.store.as_ref();
    let yard = beeyards::create(store, &identity, input).await?;
    Ok(ApiResponse::created(format::beeyard(store, yard).await?))
}

/// GET /api/beeyards/:id
pub async fn beeyard_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<BeeYardView> {
    let store = state.store.as_ref();
    let yard = beeyards::get(store, &identity, id).await?;
    Ok(ApiResponse::success(format::beeyard(store, yard).await?))
}

/// PUT /api/beeyards/:id
pub async fn beeyard_put(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    payload: Result<Json<BeeYardInput>, JsonRejection>,
) -> ApiResult<BeeYardView> {
    update(state, identity, id, payload, false).await
}

/// PATCH /api/beeyards/:id
pub async fn beeyard_patch(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    payload: Result<Json<BeeYardInput>, JsonRejection>,
) -> ApiResult<BeeYardView> {
    update(state, identity, id, payload, true).await
}

async fn update(
    state: AppState,
    identity: Identity,
    id: i64,
    payload: Result<Json<BeeYardInput>, JsonRejection>,
    partial: bool,
) -> ApiResult<BeeYardView> {
    identity.require()?;
    let Json(input) = payload?;
    let store = state.store.as_ref();
    let yard = beeyards::update(store, &identity, id, input, partial).await?;
    Ok(ApiResponse::success(format::beeyard(store, yard).await?))
}

/// DELETE /api/beeyards/:id - the yard's hives are kept, detached
pub async fn beeyard_delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    beeyards::delete(state.store.as_ref(), &identity, id).await?;
    Ok(ApiResponse::no_content())
}

/// POST /api/beeyards/:id/health_check_all_hives
///
/// Records one health check per hive of the yard in a single transaction.
///
/// ```json
/// { "success": true, "data": { "interventions": [ { "id": 12, "intervention_type": "health_check", ... } ] } }
/// ```
pub async fn health_check_all_hives(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<BulkCreated> {
    bulk(state, identity, id, Some(InterventionType::HealthCheck.as_str())).await
}

/// POST /api/beeyards/:id/interventions - any payload-less type on every hive
///
/// ```json
/// { "intervention_type": "super_installation" }
/// ```
pub async fn beeyard_interventions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    payload: Result<Json<BulkInput>, JsonRejection>,
) -> ApiResult<BulkCreated> {
    identity.require()?;
    let Json(input) = payload?;
    bulk(state, identity, id, input.intervention_type.as_deref()).await
}

async fn bulk(state: AppState, identity: Identity, id: i64, intervention_type: Option<&str>) -> ApiResult<BulkCreated> {
    let store = state.store.as_ref();
    let created = beeyards::apply_to_all_hives(store, &identity, id, intervention_type).await?;
    Ok(ApiResponse::created(BulkCreated {
        interventions: format::interventions(store, created).await?,
    }))
}
