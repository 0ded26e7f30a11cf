pub mod activities;
pub mod auth;
pub mod boards;
pub mod lists;
pub mod search;
pub mod tasks;
pub mod ws;

use axum::Json;

/// GET /api/health — liveness probe, no auth.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
