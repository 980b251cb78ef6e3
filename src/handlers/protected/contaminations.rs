// handlers/protected/contaminations.rs - /api/contaminations handlers

use axum::extract::rejection::JsonRejection;
use axum::extract::{Extension, Path, Query, State};
use axum::Json;
use std::collections::HashMap;

use crate::api::format::ContaminationView;
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::ownership::Identity;
use crate::services::contaminations::{self, ContaminationInput};

pub async fn contamination_list(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Vec<ContaminationView>> {
    let rows = contaminations::list(state.store.as_ref(), &identity, &query).await?;
    Ok(ApiResponse::success(rows.into_iter().map(ContaminationView::from).collect()))
}

/// POST /api/contaminations
///
/// ```json
/// { "type": "parasite", "hive": 4 }
/// ```
pub async fn contamination_create(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<ContaminationInput>, JsonRejection>,
) -> ApiResult<ContaminationView> {
    identity.require()?;
    let Json(input) = payload?;
    let row = contaminations::create(state.store.as_ref(), &identity, input).await?;
    Ok(ApiResponse::created(row.into()))
}

pub async fn contamination_get(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<ContaminationView> {
    let row = contaminations::get(state.store.as_ref(), &identity, id).await?;
    Ok(ApiResponse::success(row.into()))
}

pub async fn contamination_put(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    payload: Result<Json<ContaminationInput>, JsonRejection>,
) -> ApiResult<ContaminationView> {
    identity.require()?;
    let Json(input) = payload?;
    let row = contaminations::update(state.store.as_ref(), &identity, id, input, false).await?;
    Ok(ApiResponse::success(row.into()))
}

pub async fn contamination_patch(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    payload: Result<Json<ContaminationInput>, JsonRejection>,
) -> ApiResult<ContaminationView> {
    identity.require()?;
    let Json(input) = payload?;
    let row = contaminations::update(state.store.as_ref(), &identity, id, input, true).await?;
    Ok(ApiResponse::success(row.into()))
}

pub async fn contamination_delete(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    contaminations::delete(state.store.as_ref(), &identity, id).await?;
    Ok(ApiResponse::no_content())
}
