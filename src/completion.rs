//! Chat-completion capability seam and the OpenAI-backed implementation.
//!
//! Single-turn: one ordered message list in, one text completion out, no
//! memory between calls. Shares the retry/backoff policy with the
//! embedding client.

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::config::CompletionConfig;
use crate::embedding::post_with_retry;
use crate::error::Error;

/// A single chat message.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// External completion capability consumed by the grounded answerer.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// Chat client for the OpenAI API.
///
/// Requires `OPENAI_API_KEY` in the environment, checked at construction.
pub struct OpenAiChat {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_retries: u32,
}

impl OpenAiChat {
    pub fn new(config: &CompletionConfig) -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| Error::Config("OPENAI_API_KEY environment variable not set".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            max_retries: config.max_retries,
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });

        let json = post_with_retry(
            &self.client,
            "https://api.openai.com/v1/chat/completions",
            &self.api_key,
            &body,
            self.max_retries,
        )
        .await?;

        let content = json
            .get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|choice| choice.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| {
                anyhow::Error::from(Error::Provider(
                    "invalid completion response: missing choices[0].message.content".to_string(),
                ))
            })?;

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_constructors_set_roles() {
        let sys = ChatMessage::system("be brief");
        assert_eq!(sys.role, "system");
        assert_eq!(sys.content, "be brief");

        let user = ChatMessage::user("hello");
        assert_eq!(user.role, "user");
    }

    #[test]
    fn messages_serialize_to_wire_shape() {
        let msgs = vec![ChatMessage::system("s"), ChatMessage::user("u")];
        let json = serde_json::to_value(&msgs).unwrap();
        assert_eq!(json[0]["role"], "system");
        assert_eq!(json[1]["content"], "u");
    }
}
