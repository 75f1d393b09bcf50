use std::sync::Arc;
use axum::extract::FromRef;

use crate::config::LimitsConfig;
use crate::services::{conversation::ConversationManager, RagService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub rag_service: Arc<RagService>,
    pub conversation_manager: Arc<ConversationManager>,
    pub limits: LimitsConfig,
}

impl AppState {
    pub fn new(rag_service: RagService, limits: LimitsConfig) -> Self {
        let conversation_manager = rag_service.conversation_manager.clone();
        Self {
            rag_service: Arc::new(rag_service),
            conversation_manager,
            limits,
        }
    }
}

impl FromRef<AppState> for Arc<ConversationManager> {
    fn from_ref(state: &AppState) -> Self {
        state.conversation_manager.clone()
    }
}

impl FromRef<AppState> for Arc<RagService> {
    fn from_ref(state: &AppState) -> Self {
        state.rag_service.clone()
    }
}
