// handlers/public/auth/logout.rs - POST /auth/logout handler

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::app::AppState;
use crate::middleware::{expired_session_cookie, ApiResponse};

/// POST /auth/logout - clear the session cookie
///
/// Tokens are stateless, so a Bearer token stays valid until it expires.
pub async fn logout_post(State(state): State<AppState>) -> Response {
    let cookie = expired_session_cookie(state.config.security.cookie_secure);
    ([(SET_COOKIE, cookie)], ApiResponse::success(json!({ "logged_out": true }))).into_response()
}
