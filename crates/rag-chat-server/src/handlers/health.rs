use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::models::chat::StatsResponse;
use crate::services::conversation::ConversationManager;

#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    version: String,
}

pub async fn health_check() -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

pub async fn readiness_check() -> StatusCode {
    StatusCode::OK
}

pub async fn stats_handler(
    State(manager): State<Arc<ConversationManager>>,
) -> Json<StatsResponse> {
    let stats = manager.stats();
    Json(StatsResponse {
        active_sessions: stats.active_sessions,
        total_turns: stats.total_turns,
        timestamp: chrono::Utc::now(),
    })
}
