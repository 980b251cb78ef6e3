// handlers/protected/interventions.rs - /api/interventions handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use std::collections::HashMap;

use crate::api::format::{self, InterventionView};
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::ownership::Identity;
use crate::services::interventions::{self, InterventionInput};

/// GET /api/interventions - interventions on the caller's hives
///
/// Besides the field filters, accepts `treatment_type`, `syrup_type`
/// (icontains on the detail) and `harvest_lt`, `harvest_gt` (kilograms).
pub async fn intervention_list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Vec<InterventionView>> {
    let store = state.store.as_ref();
    let rows = interventions::list(store, &identity, &query).await?;
    Ok(ApiResponse::success(format::interventions(store, rows).await?))
}

/// POST /api/interventions
///
/// The detail is either created with the intervention:
/// ```json
/// { "intervention_type": "harvest", "hive_affected": 4, "detail": { "kind": "harvest", "quantity": 12.5 } }
/// ```
/// or referenced:
/// ```json
/// { "intervention_type": "artificial_swarming", "hive_affected": 4, "content_type": "hive", "object_id": 9 }
/// ```
pub async fn intervention_create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<InterventionInput>, JsonRejection>,
) -> ApiResult<InterventionView> {
    identity.require()?;
    let Json(input) = payload?;
    let store = state.store.as_ref();
    let row = interventions::create(store, &identity, input).await?;
    Ok(ApiResponse::created(format::intervention(store, row).await?))
}

pub async fn intervention_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<InterventionView> {
    let store = state.store.as_ref();
    let row = interventions::get(store, &identity, id).await?;
    Ok(ApiResponse::success(format::intervention(store, row).await?))
}

/// PUT /api/interventions/:id - full replacement, `date` is kept
pub async fn intervention_put(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    payload: Result<Json<InterventionInput>, JsonRejection>,
) -> ApiResult<InterventionView> {
    identity.require()?;
    let Json(input) = payload?;
    let store = state.store.as_ref();
    let row = interventions::replace(store, &identity, id, input).await?;
    Ok(ApiResponse::success(format::intervention(store, row).await?))
}

pub async fn intervention_delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    interventions::delete(state.store.as_ref(), &identity, id).await?;
    Ok(ApiResponse::no_content())
}
