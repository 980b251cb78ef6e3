// handlers/protected/hives.rs - /api/hives handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use std::collections::HashMap;

use crate::app::AppState;
use crate::database::models::Hive;
use crate::middleware::{ApiResponse, ApiResult};
use crate::ownership::Identity;
use crate::services::hives::{self, HiveInput};

/// GET /api/hives - hives in the caller's yards
///
/// Filters: `name`, `status`, `species`, `beeyard__name` (exact, contains,
/// icontains), `date_updated`, `queen_year` (exact, gt, gte, lt, lte),
/// `beeyard__id`.
pub async fn hive_list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Vec<Hive>> {
    let hives = hives::list(state.store.as_ref(), &identity, &query).await?;
    Ok(ApiResponse::success(hives))
}

/// POST /api/hives
///
/// ```json
/// { "name": "H1", "status": "active", "species": "buckfast_bee", "beeyard": 3, "queen_year": 2024 }
/// ```
pub async fn hive_create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<HiveInput>, JsonRejection>,
) -> ApiResult<Hive> {
    identity.require()?;
    let Json(input) = payload?;
    let hive = hives::create(state.store.as_ref(), &identity, input).await?;
    Ok(ApiResponse::created(hive))
}

pub async fn hive_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<Hive> {
    Ok(ApiResponse::success(hives::get(state.store.as_ref(), &identity, id).await?))
}

pub async fn hive_put(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    payload: Result<Json<HiveInput>, JsonRejection>,
) -> ApiResult<Hive> {
    identity.require()?;
    let Json(input) = payload?;
    let hive = hives::update(state.store.as_ref(), &identity, id, input, false).await?;
    Ok(ApiResponse::success(hive))
}

pub async fn hive_patch(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    payload: Result<Json<HiveInput>, JsonRejection>,
) -> ApiResult<Hive> {
    identity.require()?;
    let Json(input) = payload?;
    let hive = hives::update(state.store.as_ref(), &identity, id, input, true).await?;
    Ok(ApiResponse::success(hive))
}

/// DELETE /api/hives/:id - also removes its interventions and contaminations
pub async fn hive_delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    hives::delete(state.store.as_ref(), &identity, id).await?;
    Ok(ApiResponse::no_content())
}
