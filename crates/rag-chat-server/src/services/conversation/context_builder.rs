use tracing::debug;
use crate::models::chat::{ChatMessage, Turn, TurnRole};
use super::token_counter::TokenCounter;
use super::types::{HistoryWindow, SystemContextComponents};

pub struct ContextBuilder {
    base_instruction: String,
    window: HistoryWindow,
}

impl ContextBuilder {
    pub fn new(base_instruction: String, window: HistoryWindow) -> Self {
        Self {
            base_instruction,
            window,
        }
    }

    pub fn default_base_instruction() -> String {
        r#"You are a friendly book recommendation assistant.

Guidelines:
- Recommend books that match the reader's stated tastes
- Use the provided context when it is relevant and say so when it is not
- Keep answers short and conversational"#.to_string()
    }

    pub fn build_system_context(&self, retrieved_context: Option<&str>) -> Option<String> {
        SystemContextComponents {
            base_instruction: self.base_instruction.clone(),
            retrieval_context: retrieved_context.map(str::to_string),
        }
        .build()
    }

    /// Slice of `history` replayed to the provider: the newest whole pairs that
    /// fit both the turn window and the token budget.
    pub fn trim_history<'a>(
        &self,
        system_context: Option<&str>,
        history: &'a [Turn],
        current_message: &str,
    ) -> &'a [Turn] {
        let keep = self.window.max_turns - self.window.max_turns % 2;
        let mut start = align_to_user(history, history.len().saturating_sub(keep));

        while start < history.len()
            && TokenCounter::count_payload(system_context, &history[start..], current_message)
                .is_over(self.window.max_context_tokens)
        {
            start = align_to_user(history, (start + 2).min(history.len()));
        }

        if start > 0 {
            debug!(
                "Trimmed {} of {} history turns from outbound prompt",
                start,
                history.len()
            );
        }

        &history[start..]
    }

    /// Outbound sequence: optional system message, trimmed history oldest
    /// first, then the new user message.
    pub fn build_messages(
        &self,
        history: &[Turn],
        current_message: &str,
        retrieved_context: Option<&str>,
    ) -> Vec<ChatMessage> {
        let system_context = self.build_system_context(retrieved_context);
        let window = self.trim_history(system_context.as_deref(), history, current_message);

        let mut messages = Vec::with_capacity(window.len() + 2);
        if let Some(system) = system_context {
            messages.push(ChatMessage::system(system));
        }
        messages.extend(window.iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(current_message));
        messages
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(Self::default_base_instruction(), HistoryWindow::default())
    }
}

/// First index >= `start` holding a user turn, so replay never opens with an
/// orphaned assistant reply.
fn align_to_user(history: &[Turn], start: usize) -> usize {
    history[start..]
        .iter()
        .position(|t| t.role == TurnRole::User)
        .map(|offset| start + offset)
        .unwrap_or(history.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::Role;

    fn pairs(n: usize) -> Vec<Turn> {
        (0..n)
            .flat_map(|i| [Turn::user(format!("q{}", i)), Turn::assistant(format!("a{}", i))])
            .collect()
    }

    fn builder(persona: &str, max_turns: usize, max_context_tokens: usize) -> ContextBuilder {
        ContextBuilder::new(
            persona.to_string(),
            HistoryWindow { max_turns, max_context_tokens },
        )
    }

    #[test]
    fn test_system_message_with_context() {
        let b = builder("You recommend books.", 20, 6000);
        let system = b.build_system_context(Some("Gone Girl is a thriller.")).unwrap();
        assert!(system.starts_with("You recommend books."));
        assert!(system.ends_with("Gone Girl is a thriller."));
    }

    #[test]
    fn test_no_system_message_without_persona_or_context() {
        let b = builder("   ", 20, 6000);
        assert!(b.build_system_context(None).is_none());
        assert!(b.build_system_context(Some("  ")).is_none());

        let messages = b.build_messages(&[], "hello", None);
        assert_eq!(messages, vec![ChatMessage::user("hello")]);
    }

    #[test]
    fn test_context_only_system_message() {
        let b = builder("", 20, 6000);
        let messages = b.build_messages(&[], "hello", Some("passage"));
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("passage"));
    }

    #[test]
    fn test_message_order() {
        let b = builder("persona", 20, 6000);
        let history = pairs(1);
        let messages = b.build_messages(&history, "next", None);

        assert_eq!(
            messages,
            vec![
                ChatMessage::system("persona"),
                ChatMessage::user("q0"),
                ChatMessage::assistant("a0"),
                ChatMessage::user("next"),
            ]
        );
    }

    #[test]
    fn test_sliding_window_drops_oldest_pairs() {
        let b = builder("persona", 4, 6000);
        let history = pairs(5);
        let window = b.trim_history(Some("persona"), &history, "next");

        assert_eq!(window, &history[6..]);
        assert_eq!(window[0], Turn::user("q3"));
    }

    #[test]
    fn test_odd_window_rounds_down_to_pairs() {
        let b = builder("persona", 3, 6000);
        let history = pairs(3);
        let window = b.trim_history(None, &history, "next");
        assert_eq!(window.len(), 2);
        assert_eq!(window[0], Turn::user("q2"));
    }

    #[test]
    fn test_token_budget_drops_oldest_pairs() {
        let history = vec![
            Turn::user("word ".repeat(200)),
            Turn::assistant("word ".repeat(200)),
            Turn::user("short"),
            Turn::assistant("reply"),
        ];
        let b = builder("", 20, 100);
        let window = b.trim_history(None, &history, "next");

        assert_eq!(window, &history[2..]);
    }

    #[test]
    fn test_budget_never_drops_current_message() {
        let b = builder("persona", 20, 1);
        let history = pairs(2);
        let messages = b.build_messages(&history, "next", None);

        assert_eq!(
            messages,
            vec![ChatMessage::system("persona"), ChatMessage::user("next")]
        );
    }

    #[test]
    fn test_leading_assistant_turn_is_skipped() {
        let history = vec![
            Turn::assistant("stray"),
            Turn::user("q"),
            Turn::assistant("a"),
        ];
        let b = builder("", 20, 6000);
        assert_eq!(b.trim_history(None, &history, "next"), &history[1..]);
    }
}
