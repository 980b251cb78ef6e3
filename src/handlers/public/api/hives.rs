// handlers/public/api/hives.rs - GET /public/hives[/:id] handlers

use axum::extract::{Path, Query, State};
use std::collections::HashMap;

use crate::api::public::{self, PublicHiveView};
use crate::api::{Page, PageRequest};
use crate::app::AppState;
use crate::error::ApiError;
use crate::filter::{FilterSet, Resource};
use crate::middleware::{ApiResponse, ApiResult};
use crate::ownership::Scope;

/// GET /public/hives - every hive, paginated
///
/// Accepts the private hive filters plus `beeyard__beekeeper=<name>`.
pub async fn hive_list(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Page<PublicHiveView>> {
    let store = state.store.as_ref();
    let request = PageRequest::from_query(&query, &state.config.api)?;
    let filters = FilterSet::from_query(Resource::PublicHive, &query)?;

    let listing = store
        .list_hives(Scope::Everyone, &filters, Some(request.window()))
        .await?;
    let results = public::hives(store, listing.rows).await?;
    Ok(ApiResponse::success(Page::new(
        results,
        listing.total,
        request,
        "/public/hives",
        &query,
    )?))
}

pub async fn hive_get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<PublicHiveView> {
    let store = state.store.as_ref();
    let hive = store
        .hive(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Hive not found"))?;
    Ok(ApiResponse::success(public::hive(store, hive).await?))
}
