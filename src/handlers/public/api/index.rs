// handlers/public/api/index.rs - GET /public handler

use axum::response::Json;
use serde_json::{json, Value};

/// GET /public - entry points of the read-only API
pub async fn index() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "beeyards": "/public/beeyards",
            "hives": "/public/hives",
            "beekeepers": "/public/beekeepers",
        }
    }))
}
