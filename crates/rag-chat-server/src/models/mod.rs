pub mod chat;

pub use chat::{ChatMessage, Role, SessionId, Turn, TurnRole};
