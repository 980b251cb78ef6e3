use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::{AppConfig, Environment};
use crate::database::ApiaryStore;
use crate::handlers;
use crate::middleware::identity_middleware;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ApiaryStore>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn ApiaryStore>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        .merge(public_api_routes())
        // Private API
        .merge(auth_routes())
        .merge(beeyard_routes())
        .merge(hive_routes())
        .merge(intervention_routes())
        .merge(contamination_routes())
        // Pages
        .merge(page_routes())
        // Global middleware
        .layer(middleware::from_fn_with_state(state.clone(), identity_middleware))
        .layer(cors_layer(&state.config));

    let router = if state.config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    };

    router.with_state(state)
}

fn auth_public_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
        .route("/auth/logout", post(auth::logout_post))
}

fn public_api_routes() -> Router<AppState> {
    use handlers::public::api;

    Router::new()
        .route("/public", get(api::index))
        .route("/public/beeyards", get(api::beeyards::beeyard_list))
        .route("/public/beeyards/:id", get(api::beeyards::beeyard_get))
        .route("/public/hives", get(api::hives::hive_list))
        .route("/public/hives/:id", get(api::hives::hive_get))
        .route("/public/beekeepers", get(api::beekeeper_list))
}

fn auth_routes() -> Router<AppState> {
    use handlers::protected::auth;

    Router::new().route("/api/auth/whoami", get(auth::whoami))
}

fn beeyard_routes() -> Router<AppState> {
    use handlers::protected as p;

    Router::new()
        .route("/api/beeyards", get(p::beeyard_list).post(p::beeyard_create))
        .route(
            "/api/beeyards/:id",
            get(p::beeyard_get)
                .put(p::beeyard_put)
                .patch(p::beeyard_patch)
                .delete(p::beeyard_delete),
        )
        .route("/api/beeyards/:id/health_check_all_hives", post(p::health_check_all_hives))
        .route("/api/beeyards/:id/interventions", post(p::beeyard_interventions))
}

fn hive_routes() -> Router<AppState> {
    use handlers::protected as p;

    Router::new()
        .route("/api/hives", get(p::hive_list).post(p::hive_create))
        .route(
            "/api/hives/:id",
            get(p::hive_get).put(p::hive_put).patch(p::hive_patch).delete(p::hive_delete),
        )
}

fn intervention_routes() -> Router<AppState> {
    use handlers::protected as p;

    Router::new()
        .route("/api/interventions", get(p::intervention_list).post(p::intervention_create))
        .route(
            "/api/interventions/:id",
            get(p::intervention_get).put(p::intervention_put).delete(p::intervention_delete),
        )
}

fn contamination_routes() -> Router<AppState> {
    use handlers::protected as p;

    Router::new()
        .route("/api/contaminations", get(p::contamination_list).post(p::contamination_create))
        .route(
            "/api/contaminations/:id",
            get(p::contamination_get)
                .put(p::contamination_put)
                .patch(p::contamination_patch)
                .delete(p::contamination_delete),
        )
}

fn page_routes() -> Router<AppState> {
    use handlers::pages;

    Router::new()
        .route("/apiary", get(pages::beeyards_page))
        .route("/apiary/", get(pages::beeyards_page))
        .route("/apiary/interventions", get(pages::interventions_page))
        .route("/apiary/interventions/", get(pages::interventions_page))
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if config.environment == Environment::Development {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Apiary API",
            "version": version,
            "description": "Record keeping for beekeepers: bee yards, hives, interventions and contaminations",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "public_auth": "/auth/register, /auth/login, /auth/logout (public)",
                "public": "/public, /public/beeyards[/:id], /public/hives[/:id], /public/beekeepers (public, read-only)",
                "auth": "/api/auth/whoami (protected)",
                "beeyards": "/api/beeyards[/:id], /api/beeyards/:id/health_check_all_hives, /api/beeyards/:id/interventions (protected)",
                "hives": "/api/hives[/:id] (protected)",
                "interventions": "/api/interventions[/:id] (protected)",
                "contaminations": "/api/contaminations[/:id] (protected)",
                "pages": "/apiary/, /apiary/interventions/?hive=:id (session cookie)",
            }
        }
    }))
}

async fn health(axum::extract::State(state): axum::extract::State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::error!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
