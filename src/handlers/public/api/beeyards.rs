// handlers/public/api/beeyards.rs - GET /public/beeyards[/:id] handlers

use axum::extract::{Path, Query, State};
use std::collections::HashMap;

use crate::api::public::{self, PublicBeeYardView};
use crate::api::{Page, PageRequest};
use crate::app::AppState;
use crate::error::ApiError;
use crate::filter::{FilterSet, Resource};
use crate::middleware::{ApiResponse, ApiResult};
use crate::ownership::Scope;

/// GET /public/beeyards - every bee yard, paginated
///
/// Filters: `name[__contains|__icontains]`, and `beekeeper=<name>` matching
/// keepers who published their contact (one word: first or last name; two
/// words: first name then last name).
///
/// ```json
/// { "count": 23, "next": "/public/beeyards?page=2", "previous": null, "results": [ ... ] }
/// ```
pub async fn beeyard_list(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Page<PublicBeeYardView>> {
    let store = state.store.as_ref();
    let request = PageRequest::from_query(&query, &state.config.api)?;
    let filters = FilterSet::from_query(Resource::PublicBeeYard, &query)?;

    let listing = store
        .list_beeyards(Scope::Everyone, &filters, Some(request.window()))
        .await?;
    let results = public::beeyards(store, listing.rows).await?;
    Ok(ApiResponse::success(Page::new(
        results,
        listing.total,
        request,
        "/public/beeyards",
        &query,
    )?))
}

pub async fn beeyard_get(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<PublicBeeYardView> {
    let store = state.store.as_ref();
    let yard = store
        .beeyard(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Bee yard not found"))?;
    Ok(ApiResponse::success(public::beeyard(store, yard).await?))
}
