pub mod settings;

pub use settings::{
    ConversationConfig, LimitsConfig, LlmConfig, RetrievalConfig, RetrievalMode, ServerConfig,
    Settings,
};
