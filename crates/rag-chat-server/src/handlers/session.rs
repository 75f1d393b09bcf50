use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::models::chat::TranscriptResponse;
use crate::services::conversation::ConversationManager;

pub async fn get_session_handler(
    State(manager): State<Arc<ConversationManager>>,
    Path(session_id): Path<String>,
) -> Json<TranscriptResponse> {
    let turns = manager.store().get(&session_id);
    Json(TranscriptResponse { session_id, turns })
}

pub async fn delete_session_handler(
    State(manager): State<Arc<ConversationManager>>,
    Path(session_id): Path<String>,
) -> StatusCode {
    if manager.clear_session(&session_id).await {
        info!("Session {:?} cleared", session_id);
    }
    StatusCode::NO_CONTENT
}
