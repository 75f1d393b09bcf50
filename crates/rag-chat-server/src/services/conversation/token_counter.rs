use crate::models::chat::{ChatMessage, Turn};
use crate::utils::token_estimator::estimate_message_tokens;
use super::types::TokenCount;

pub struct TokenCounter;

impl TokenCounter {
    pub fn count_turns(turns: &[Turn]) -> usize {
        turns.iter()
            .map(|turn| estimate_message_tokens(&turn.content))
            .sum()
    }

    pub fn count_messages(messages: &[ChatMessage]) -> usize {
        messages.iter()
            .map(|msg| estimate_message_tokens(&msg.content))
            .sum()
    }

    pub fn count_payload(
        system_context: Option<&str>,
        history: &[Turn],
        current_message: &str,
    ) -> TokenCount {
        let system_tokens = system_context.map(estimate_message_tokens).unwrap_or(0);
        let history_tokens = Self::count_turns(history);
        let current_message_tokens = estimate_message_tokens(current_message);

        TokenCount {
            total: system_tokens + history_tokens + current_message_tokens,
            system_tokens,
            history_tokens,
            current_message_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_turns() {
        // "Hello world": 2 words -> 8, plus 4 overhead
        assert_eq!(TokenCounter::count_turns(&[Turn::user("Hello world")]), 12);
    }

    #[test]
    fn test_payload_breakdown() {
        let history = vec![
            Turn::user("What is RAG?"),
            Turn::assistant("RAG is Retrieval-Augmented Generation"),
        ];
        let count = TokenCounter::count_payload(Some("Be brief."), &history, "Why?");

        assert_eq!(count.history_tokens, TokenCounter::count_turns(&history));
        assert_eq!(
            count.total,
            count.system_tokens + count.history_tokens + count.current_message_tokens
        );
        assert!(count.system_tokens > 0);
    }

    #[test]
    fn test_no_system_context() {
        let count = TokenCounter::count_payload(None, &[], "Hi");
        assert_eq!(count.system_tokens, 0);
        assert_eq!(count.total, count.current_message_tokens);
    }

    #[test]
    fn test_messages_and_turns_agree() {
        let turns = vec![Turn::user("one two"), Turn::assistant("three")];
        let messages: Vec<ChatMessage> = turns.iter().map(ChatMessage::from).collect();
        assert_eq!(TokenCounter::count_turns(&turns), TokenCounter::count_messages(&messages));
    }
}
