use std::time::{Duration, Instant};
use crate::models::chat::Turn;

/// Transcript plus bookkeeping for one session
#[derive(Debug, Clone)]
pub struct SessionEntry {
    /// Append-only, oldest first
    pub turns: Vec<Turn>,

    /// Last append (reads do not refresh it)
    pub last_activity: Instant,
}

impl SessionEntry {
    pub fn new() -> Self {
        Self {
            turns: Vec::new(),
            last_activity: Instant::now(),
        }
    }

    /// Idle as observed at `now`; an activity newer than `now` is never idle
    pub fn is_idle_at(&self, now: Instant, max_idle: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) >= max_idle
    }

    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}

impl Default for SessionEntry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub active_sessions: usize,
    pub total_turns: usize,
}

/// Token counting result for an outbound prompt
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCount {
    pub total: usize,
    pub system_tokens: usize,
    pub history_tokens: usize,
    pub current_message_tokens: usize,
}

impl TokenCount {
    pub fn is_over(&self, budget: usize) -> bool {
        self.total > budget
    }
}

/// How much history is replayed to the completion provider
#[derive(Debug, Clone, Copy)]
pub struct HistoryWindow {
    /// Whole user/assistant pairs beyond this are dropped, oldest first
    pub max_turns: usize,
    pub max_context_tokens: usize,
}

impl Default for HistoryWindow {
    fn default() -> Self {
        Self {
            max_turns: 20,
            max_context_tokens: 6000,
        }
    }
}

/// Knobs for the completion call made by `ConversationManager`
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_backoff: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            timeout: Duration::from_secs(60),
            max_attempts: 2,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

impl CompletionOptions {
    pub fn from_config(cfg: &crate::config::LlmConfig) -> Self {
        Self {
            temperature: cfg.temperature,
            timeout: Duration::from_secs(cfg.timeout_seconds.max(1)),
            max_attempts: cfg.max_attempts.max(1),
            retry_backoff: Duration::from_millis(cfg.retry_backoff_ms),
        }
    }
}

/// System context components (for building the leading system message)
#[derive(Debug, Clone)]
pub struct SystemContextComponents {
    /// Static persona text
    pub base_instruction: String,

    /// Passage resolved by the retriever for this request
    pub retrieval_context: Option<String>,
}

impl SystemContextComponents {
    /// Complete system message content, `None` when there is nothing to say
    pub fn build(&self) -> Option<String> {
        let base = self.base_instruction.trim();
        let context = self
            .retrieval_context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        match (base.is_empty(), context) {
            (true, None) => None,
            (false, None) => Some(base.to_string()),
            (true, Some(ctx)) => Some(format!("Relevant context:\n{}", ctx)),
            (false, Some(ctx)) => Some(format!("{}\n\nRelevant context:\n{}", base, ctx)),
        }
    }
}
