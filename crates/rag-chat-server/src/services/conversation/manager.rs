/// manager.rs
use anyhow::Result;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::models::chat::{ChatMessage, SessionId, Turn};
use crate::utils::error::ChatError;
use crate::utils::limiters::Limiters;

use super::context_builder::ContextBuilder;
use super::store::SessionStore;
use super::token_counter::TokenCounter;
use super::types::{CompletionOptions, StoreStats};

/// Trait for the completion (LLM) service
#[async_trait::async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage], temperature: f32) -> Result<String>;
}

pub struct ConversationManager {
    store: SessionStore,
    /// One exclusive section per session id around load -> complete -> append
    locks: DashMap<SessionId, Arc<Mutex<()>>>,
    context_builder: ContextBuilder,
    llm_provider: Arc<dyn CompletionProvider>,
    limiters: Limiters,
    options: CompletionOptions,
}

impl ConversationManager {
    pub fn new(
        store: SessionStore,
        context_builder: ContextBuilder,
        llm_provider: Arc<dyn CompletionProvider>,
        limiters: Limiters,
        options: CompletionOptions,
    ) -> Self {
        Self {
            store,
            locks: DashMap::new(),
            context_builder,
            llm_provider,
            limiters,
            options,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Answer `user_text` in the context of `session_id`.
    ///
    /// The transcript only changes when the completion succeeds; then exactly
    /// the new user turn and the assistant reply are appended, in that order.
    pub async fn respond(
        &self,
        session_id: &str,
        user_text: &str,
        retrieved_context: Option<&str>,
    ) -> Result<String, ChatError> {
        let start_time = Instant::now();

        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        let history = self.store.get(session_id);
        let messages = self
            .context_builder
            .build_messages(&history, user_text, retrieved_context);

        debug!(
            "Session {:?}: {} stored turns, {} outbound messages (~{} tokens), context={}",
            session_id,
            history.len(),
            messages.len(),
            TokenCounter::count_messages(&messages),
            retrieved_context.is_some()
        );

        let reply = self.call_llm_with_retry(&messages).await?;

        self.store.append(
            session_id,
            [Turn::user(user_text), Turn::assistant(reply.clone())],
        );

        info!(
            "Session {:?} answered in {}ms (transcript: {} turns)",
            session_id,
            start_time.elapsed().as_millis(),
            history.len() + 2
        );

        Ok(reply)
    }

    fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    async fn call_llm_with_retry(&self, messages: &[ChatMessage]) -> Result<String, ChatError> {
        let max_attempts = self.options.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=max_attempts {
            match self.call_llm_once(messages).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    last_error = e.to_string();
                    if attempt < max_attempts {
                        warn!(
                            "Completion attempt {}/{} failed: {}",
                            attempt, max_attempts, last_error
                        );
                        tokio::time::sleep(self.options.retry_backoff * attempt).await;
                    }
                }
            }
        }

        error!("Completion failed after {} attempts: {}", max_attempts, last_error);
        Err(ChatError::CompletionFailure {
            attempts: max_attempts,
            reason: last_error,
        })
    }

    async fn call_llm_once(&self, messages: &[ChatMessage]) -> Result<String> {
        let (_permit, waited) = self.limiters.acquire_llm().await?;
        if waited > Duration::from_millis(100) {
            debug!("Waited {}ms for completion permit", waited.as_millis());
        }

        let reply = tokio::time::timeout(
            self.options.timeout,
            self.llm_provider.complete(messages, self.options.temperature),
        )
        .await
        .map_err(|_| anyhow::anyhow!("Completion timed out after {:?}", self.options.timeout))??;

        if reply.trim().is_empty() {
            anyhow::bail!("Completion provider returned an empty reply");
        }

        Ok(reply)
    }

    pub fn stats(&self) -> StoreStats {
        self.store.stats()
    }

    /// Drop one session's transcript. Returns whether it existed.
    pub async fn clear_session(&self, session_id: &str) -> bool {
        let existed = {
            let lock = self.session_lock(session_id);
            let _guard = lock.lock().await;
            self.store.remove(session_id).is_some()
        };

        self.prune_locks();
        existed
    }

    /// Remove sessions idle for `max_idle` and any lock nobody is holding.
    ///
    /// A session is only removed while its lock is held here, so a `respond`
    /// in flight (which may have read the history but not yet appended) keeps
    /// its session.
    pub fn cleanup_idle_sessions(&self, max_idle: Duration) -> usize {
        let now = Instant::now();
        let mut removed = 0;

        for session_id in self.store.idle_sessions(now, max_idle) {
            let lock = self.session_lock(&session_id);
            let Ok(_guard) = lock.try_lock() else {
                debug!("Session {:?} busy, skipping idle cleanup", session_id);
                continue;
            };

            if self.store.remove_if_idle(&session_id, now, max_idle) {
                removed += 1;
            }
        }

        self.prune_locks();

        if removed > 0 {
            info!("Cleaned up {} idle sessions", removed);
        }
        removed
    }

    fn prune_locks(&self) {
        // strong_count == 1: only the map refers to it, no respond in flight
        self.locks.retain(|session_id, lock| {
            Arc::strong_count(lock) > 1 || self.store.contains(session_id)
        });
    }
}
