//! Conversation memory management module
//!
//! Provides in-memory conversation state management with:
//! - Thread-safe transcript storage (DashMap)
//! - Per-session serialization of respond calls
//! - System context building and history trimming

mod context_builder;
pub mod manager;
mod store;
mod token_counter;
pub mod types;

pub use context_builder::ContextBuilder;
pub use manager::{CompletionProvider, ConversationManager};
pub use store::SessionStore;
pub use token_counter::TokenCounter;
pub use types::{CompletionOptions, HistoryWindow, StoreStats, SystemContextComponents};

pub use crate::models::chat::{ChatMessage, Turn};
