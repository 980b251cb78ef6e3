// handlers/public/auth/register.rs - POST /auth/register handler

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::accounts::{self, RegisterInput};

/// POST /auth/register - create a beekeeper account
///
/// Expected Input:
/// ```json
/// {
///   "username": "ann",        // Required, unique
///   "password": "s3cret-pw",  // Required, at least 8 characters
///   "first_name": "Ann",      // Optional
///   "last_name": "Lee",       // Optional
///   "email": "ann@example.com" // Optional
/// }
/// ```
///
/// Responds 201 with the user; a taken username is a 409.
pub async fn register_post(
    State(state): State<AppState>,
    payload: Result<Json<RegisterInput>, JsonRejection>,
) -> ApiResult<User> {
    let Json(input) = payload?;
    let user = accounts::register(state.store.as_ref(), input).await?;
    Ok(ApiResponse::created(user))
}
