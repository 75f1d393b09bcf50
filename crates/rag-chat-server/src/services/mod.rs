pub mod conversation;
pub mod llm_service;
pub mod rag_service;
pub mod retrieval_service;

pub use llm_service::LlmService;
pub use rag_service::RagService;
pub use retrieval_service::{build_retriever, Retriever};
