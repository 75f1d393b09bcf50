/// Token estimation for chat prompts.
/// Word-based heuristic, deterministic so trimming decisions are reproducible.

use unicode_segmentation::UnicodeSegmentation;

/// Per-message overhead (role tag and separators)
const MESSAGE_OVERHEAD: usize = 4;

/// Estimate tokens from text using word-based heuristic
/// Rule: English avg ~1.3 tokens per word
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }

    let words = text.unicode_words().count();

    ((words as f64 * 1.3) + 5.0).ceil() as usize
}

/// Estimate tokens for one chat message including role overhead
pub fn estimate_message_tokens(content: &str) -> usize {
    estimate_tokens(content) + MESSAGE_OVERHEAD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_estimation() {
        // 7 words * 1.3 + 5 = 14.1 -> 15
        let text = "Recommend a mystery novel set in Paris";
        assert_eq!(estimate_tokens(text), 15);
    }

    #[test]
    fn test_empty_string() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_message_tokens(""), MESSAGE_OVERHEAD);
    }

    #[test]
    fn test_punctuation_is_not_a_word() {
        // 500 words = 655 tokens
        let text = "word, ".repeat(500);
        assert_eq!(estimate_tokens(&text), 655);
    }
}
