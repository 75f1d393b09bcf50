use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use rag_chat_server::config::Settings;
use rag_chat_server::routes::build_router;
use rag_chat_server::services::conversation::{
    CompletionOptions, ContextBuilder, ConversationManager, HistoryWindow, SessionStore,
};
use rag_chat_server::services::{build_retriever, LlmService, RagService};
use rag_chat_server::state::AppState;
use rag_chat_server::utils::{logger, Limiters};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logger::init_logger()?;

    info!("🚀 Starting RAG Chat Server...");

    // Load configuration
    let settings = Settings::load()?;
    info!("✅ Configuration loaded");
    if settings.llm.api_key.is_empty() {
        tracing::warn!("No LLM credential configured (APP__LLM__API_KEY / OPENAI_API_KEY)");
    }

    // Initialize services
    let llm_service = Arc::new(LlmService::new(settings.llm.clone())?);
    let retriever = build_retriever(&settings.retrieval)?;

    let context_builder = ContextBuilder::new(
        settings.conversation.system_prompt.clone(),
        HistoryWindow {
            max_turns: settings.conversation.max_history_turns,
            max_context_tokens: settings.conversation.max_context_tokens,
        },
    );

    let conversation_manager = Arc::new(ConversationManager::new(
        SessionStore::new(),
        context_builder,
        llm_service,
        Limiters::new(&settings.limits),
        CompletionOptions::from_config(&settings.llm),
    ));

    if let Some(ttl) = settings.conversation.session_idle_ttl() {
        spawn_session_sweeper(
            conversation_manager.clone(),
            ttl,
            Duration::from_secs(settings.conversation.cleanup_interval_seconds.max(1)),
        );
        info!("✅ Idle session sweeper started (ttl={:?})", ttl);
    }

    let rag_service = RagService::new(retriever, conversation_manager);
    let app = build_router(AppState::new(rag_service, settings.limits.clone()));

    // Server address
    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));

    info!("🎯 Server listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server stopped");
    Ok(())
}

fn spawn_session_sweeper(manager: Arc<ConversationManager>, ttl: Duration, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            manager.cleanup_idle_sessions(ttl);
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
