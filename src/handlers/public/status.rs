use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// GET / - service description
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Drinks API",
            "version": version,
            "endpoints": {
                "drinks": "GET /drinks (public)",
                "drinks_detail": "GET /drinks-detail (get:drinks-detail)",
                "create": "POST /drinks (post:drinks)",
                "update": "PATCH /drinks/:id (patch:drinks)",
                "delete": "DELETE /drinks/:id (delete:drinks)",
                "health": "GET /health (public)",
            }
        }
    }))
}

/// GET /health - store liveness
pub async fn health(State(state): State<AppState>) -> Response {
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
        )
            .into_response(),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            ApiError::service_unavailable("Database unavailable").into_response()
        }
    }
}
