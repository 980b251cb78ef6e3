// handlers/public/api/beekeepers.rs - GET /public/beekeepers handler

use axum::extract::{Query, State};
use std::collections::HashMap;

use crate::api::public::ContactView;
use crate::api::{Page, PageRequest};
use crate::app::AppState;
use crate::filter::{FilterSet, Resource};
use crate::middleware::{ApiResponse, ApiResult};

/// GET /public/beekeepers - keepers who published their contact
///
/// Filters: `first_name`, `last_name` (case-insensitive contains).
pub async fn beekeeper_list(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Page<ContactView>> {
    let request = PageRequest::from_query(&query, &state.config.api)?;
    let filters = FilterSet::from_query(Resource::Contact, &query)?;

    let listing = state
        .store
        .list_contacts(&filters, Some(request.window()))
        .await?;
    let page = Page::new(listing.rows, listing.total, request, "/public/beekeepers", &query)?;
    Ok(ApiResponse::success(page.map(ContactView::from)))
}
