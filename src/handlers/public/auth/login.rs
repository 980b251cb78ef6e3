// handlers/public/auth/login.rs - POST /auth/login handler

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::app::AppState;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{session_cookie, ApiResponse};
use crate::services::accounts::{self, LoginInput};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
    pub expires_in: i64,
}

/// POST /auth/login - authenticate and receive a JWT
///
/// Expected Input:
/// ```json
/// { "username": "ann", "password": "s3cret-pw" }
/// ```
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "token": "eyJhbGciOiJIUzI1NiI...",
///     "user": { "id": 1, "username": "ann", "first_name": "Ann", "last_name": "Lee", "email": "ann@example.com" },
///     "expires_in": 604800
///   }
/// }
/// ```
///
/// The token is also set as the `apiary_session` cookie for the pages.
/// Unknown users and wrong passwords are both a 401.
pub async fn login_post(
    State(state): State<AppState>,
    payload: Result<Json<LoginInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = payload?;
    let session = accounts::login(state.store.as_ref(), &state.config, input).await?;

    let cookie = session_cookie(&session.token, session.expires_in, state.config.security.cookie_secure);
    let body = LoginResponse {
        token: session.token,
        user: session.user,
        expires_in: session.expires_in,
    };
    Ok(([(SET_COOKIE, cookie)], ApiResponse::success(body)).into_response())
}
