//! Grounded answer generation and summarization.
//!
//! One-shot prompts: a system instruction fixing the reply language and a
//! user message carrying the context block and the question. No retry or
//! streaming at this layer; citation display is the caller's job via the
//! separately returned source list.

use anyhow::Result;

use crate::completion::{ChatMessage, ChatModel};

/// Build the two-message answer prompt.
pub fn answer_messages(question: &str, context: &str, language: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(format!(
            "You are a multilingual assistant. Reply in {}. Use sources if relevant.",
            language
        )),
        ChatMessage::user(format!("Context:\n{}\n\nQuestion: {}", context, question)),
    ]
}

/// Answer `question` against the supplied grounding `context`.
pub async fn answer(
    chat: &dyn ChatModel,
    question: &str,
    context: &str,
    language: &str,
) -> Result<String> {
    chat.complete(&answer_messages(question, context, language))
        .await
}

/// Build the summarization prompt, truncating the input to `max_chars`
/// characters. A hard context-budget cap: longer documents are summarized
/// on their prefix only.
pub fn summary_messages(text: &str, language: &str, max_chars: usize) -> Vec<ChatMessage> {
    let truncated: String = text.chars().take(max_chars).collect();
    vec![
        ChatMessage::system(format!("Summarize in {}", language)),
        ChatMessage::user(truncated),
    ]
}

/// Produce a localized summary of `text`.
pub async fn summarize(
    chat: &dyn ChatModel,
    text: &str,
    language: &str,
    max_chars: usize,
) -> Result<String> {
    chat.complete(&summary_messages(text, language, max_chars))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct RecordingChat {
        seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl RecordingChat {
        fn new() -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for RecordingChat {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.seen.lock().unwrap().push(messages.to_vec());
            Ok("canned answer".to_string())
        }
    }

    #[test]
    fn answer_prompt_fixes_language_and_embeds_context() {
        let msgs = answer_messages("What is Rust?", "Rust is a language.", "French");
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, "system");
        assert!(msgs[0].content.contains("Reply in French"));
        assert_eq!(msgs[1].role, "user");
        assert!(msgs[1].content.starts_with("Context:\nRust is a language."));
        assert!(msgs[1].content.ends_with("Question: What is Rust?"));
    }

    #[test]
    fn summary_prompt_truncates_to_cap() {
        let text = "a".repeat(5000);
        let msgs = summary_messages(&text, "English", 4000);
        assert_eq!(msgs[1].content.chars().count(), 4000);
        assert!(msgs[0].content.contains("Summarize in English"));
    }

    #[test]
    fn summary_prompt_keeps_short_input_whole() {
        let msgs = summary_messages("short text", "German", 4000);
        assert_eq!(msgs[1].content, "short text");
        assert!(msgs[0].content.contains("German"));
    }

    #[tokio::test]
    async fn answer_issues_exactly_one_completion() {
        let chat = RecordingChat::new();
        let out = answer(&chat, "q", "ctx", "English").await.unwrap();
        assert_eq!(out, "canned answer");
        assert_eq!(chat.seen.lock().unwrap().len(), 1);
    }
}
