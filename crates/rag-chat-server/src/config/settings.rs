use anyhow::Result;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub conversation: ConversationConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            timeout_seconds: 60,
            max_attempts: 2,
            retry_backoff_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalMode {
    #[default]
    Disabled,
    Static,
    Http,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RetrievalConfig {
    pub mode: RetrievalMode,
    pub base_url: String,
    pub top_k: usize,
    pub static_passage: String,
    pub timeout_seconds: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            mode: RetrievalMode::Disabled,
            base_url: "http://127.0.0.1:8090".to_string(),
            top_k: 3,
            static_passage: String::new(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ConversationConfig {
    pub system_prompt: String,
    pub max_history_turns: usize,
    pub max_context_tokens: usize,
    /// 0 keeps sessions for the lifetime of the process
    pub session_idle_ttl_seconds: u64,
    pub cleanup_interval_seconds: u64,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            system_prompt: crate::services::conversation::ContextBuilder::default_base_instruction(),
            max_history_turns: 20,
            max_context_tokens: 6000,
            session_idle_ttl_seconds: 0,
            cleanup_interval_seconds: 300,
        }
    }
}

impl ConversationConfig {
    pub fn session_idle_ttl(&self) -> Option<Duration> {
        (self.session_idle_ttl_seconds > 0).then(|| Duration::from_secs(self.session_idle_ttl_seconds))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LimitsConfig {
    pub llm_concurrency: usize,
    pub acquire_timeout_ms: u64,
    pub max_message_chars: usize,
    pub max_session_id_chars: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            llm_concurrency: 16,
            acquire_timeout_ms: 5_000,
            max_message_chars: 8_000,
            max_session_id_chars: 128,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config::builder()
            .add_source(File::with_name("config/settings").required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        settings.apply_credential_fallback(std::env::var("OPENAI_API_KEY").ok());
        Ok(settings)
    }

    /// Parse settings from an inline TOML document (no environment overlay)
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(raw, FileFormat::Toml))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    fn apply_credential_fallback(&mut self, fallback: Option<String>) {
        if self.llm.api_key.is_empty() {
            if let Some(key) = fallback.filter(|k| !k.trim().is_empty()) {
                self.llm.api_key = key;
            }
        }
    }
}
