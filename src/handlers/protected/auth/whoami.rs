// handlers/protected/auth/whoami.rs - GET /api/auth/whoami handler

use axum::extract::{Extension, State};

use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::ownership::Identity;

/// GET /api/auth/whoami - the authenticated user's profile
///
/// ```json
/// {
///   "success": true,
///   "data": { "id": 1, "username": "ann", "first_name": "Ann", "last_name": "Lee", "email": "ann@example.com" }
/// }
/// ```
pub async fn whoami(State(state): State<AppState>, Extension(identity): Extension<Identity>) -> ApiResult<User> {
    let user_id = identity.require()?;
    let user = state
        .store
        .user(user_id)
        .await?
        // Token outlived its account
        .ok_or_else(|| ApiError::unauthorized("User no longer exists"))?;
    Ok(ApiResponse::success(user))
}
