use crate::services::conversation::ConversationManager;
use crate::services::retrieval_service::Retriever;
use crate::utils::error::ChatError;
use std::sync::Arc;
use tracing::{debug, warn};

/// Retrieval-augmented chat: resolves context, then hands off to the
/// conversation manager.
#[derive(Clone)]
pub struct RagService {
    pub retriever: Arc<dyn Retriever>,
    pub conversation_manager: Arc<ConversationManager>,
}

impl RagService {
    pub fn new(
        retriever: Arc<dyn Retriever>,
        conversation_manager: Arc<ConversationManager>,
    ) -> Self {
        Self {
            retriever,
            conversation_manager,
        }
    }

    /// Best passage for `query`. Search failures degrade to no context.
    pub async fn retrieve_context(&self, query: &str) -> Option<String> {
        match self.retriever.search(query).await {
            Ok(Some(passage)) => {
                debug!("Retrieved context passage ({} chars)", passage.len());
                Some(passage)
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Retrieval failed, answering without context: {:#}", e);
                None
            }
        }
    }

    pub async fn chat(&self, session_id: &str, message: &str) -> Result<String, ChatError> {
        let context = self.retrieve_context(message).await;
        self.conversation_manager
            .respond(session_id, message, context.as_deref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::{ChatMessage, Role, Turn};
    use crate::services::conversation::{
        CompletionOptions, CompletionProvider, ContextBuilder, SessionStore,
    };
    use crate::services::retrieval_service::MockRetriever;
    use crate::utils::limiters::Limiters;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProvider {
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    #[async_trait::async_trait]
    impl CompletionProvider for RecordingProvider {
        async fn complete(&self, messages: &[ChatMessage], _temperature: f32) -> anyhow::Result<String> {
            self.seen.lock().unwrap().push(messages.to_vec());
            Ok("Try 'Gone Girl'.".to_string())
        }
    }

    fn rag(retriever: MockRetriever, provider: Arc<RecordingProvider>) -> RagService {
        let manager = ConversationManager::new(
            SessionStore::new(),
            ContextBuilder::default(),
            provider,
            Limiters::default(),
            CompletionOptions { max_attempts: 1, ..CompletionOptions::default() },
        );
        RagService::new(Arc::new(retriever), Arc::new(manager))
    }

    #[tokio::test]
    async fn test_chat_uses_retrieved_passage() {
        let mut retriever = MockRetriever::new();
        retriever
            .expect_search()
            .withf(|q| q == "Recommend a mystery novel")
            .times(1)
            .returning(|_| Ok(Some("Gone Girl: a 2012 psychological thriller.".to_string())));

        let provider = Arc::new(RecordingProvider::default());
        let service = rag(retriever, provider.clone());

        let reply = service.chat("s1", "Recommend a mystery novel").await.unwrap();
        assert_eq!(reply, "Try 'Gone Girl'.");

        let seen = provider.seen.lock().unwrap();
        assert_eq!(seen[0][0].role, Role::System);
        assert!(seen[0][0].content.contains("psychological thriller"));
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_not_fatal() {
        let mut retriever = MockRetriever::new();
        retriever
            .expect_search()
            .returning(|_| Err(anyhow::anyhow!("vector store down")));

        let provider = Arc::new(RecordingProvider::default());
        let service = rag(retriever, provider.clone());

        service.chat("s1", "Recommend a mystery novel").await.unwrap();

        assert_eq!(
            service.conversation_manager.store().get("s1"),
            vec![
                Turn::user("Recommend a mystery novel"),
                Turn::assistant("Try 'Gone Girl'."),
            ]
        );
        let seen = provider.seen.lock().unwrap();
        assert!(!seen[0][0].content.contains("Relevant context"));
    }
}
