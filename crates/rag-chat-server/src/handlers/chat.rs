use crate::config::LimitsConfig;
use crate::models::chat::{ChatRequest, ChatResponse};
use crate::state::AppState;
use crate::utils::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::time::Instant;
use tracing::{info, Instrument};

/// Validated `(session_id, message)` pair
#[derive(Debug, PartialEq, Eq)]
pub struct ChatInput {
    pub session_id: String,
    pub message: String,
}

pub fn validate_chat_request(
    request: ChatRequest,
    limits: &LimitsConfig,
) -> Result<ChatInput, ApiError> {
    let session_id = request
        .session_id
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidInput("session_id is required".to_string()))?;

    if session_id.chars().count() > limits.max_session_id_chars {
        return Err(ApiError::InvalidInput(format!(
            "session_id exceeds {} characters",
            limits.max_session_id_chars
        )));
    }

    let message = request
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::InvalidInput("message is required".to_string()))?;

    if message.chars().count() > limits.max_message_chars {
        return Err(ApiError::InvalidInput(format!(
            "message exceeds {} characters",
            limits.max_message_chars
        )));
    }

    Ok(ChatInput { session_id, message })
}

pub async fn chat_handler(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidInput(e.body_text()))?;
    let input = validate_chat_request(request, &state.limits)?;

    let request_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("chat", %request_id, session_id = %input.session_id);

    async move {
        let start_time = Instant::now();
        info!("Chat request: message_len={}", input.message.len());

        let response = state
            .rag_service
            .chat(&input.session_id, &input.message)
            .await
            .map_err(ApiError::from)?;

        info!("Chat completed in {}ms", start_time.elapsed().as_millis());
        Ok::<_, ApiError>(Json(ChatResponse { response }))
    }
    .instrument(span)
    .await
}
