//! Health check handler

use axum::Json;
use serde_json::{json, Value};

/// API health check
pub async fn health_check() -> Json<Value> {
    Json(json!({ "ok": true, "status": "healthy" }))
}
