pub mod openai;

use async_trait::async_trait;

use crate::core::error::Result;

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Sampling knobs passed through to the completion API.
#[derive(Debug, Clone, Copy)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        GenerationParams {
            temperature: 0.4,
            max_tokens: 4000,
        }
    }
}

#[async_trait]
pub trait LlmProvider: Send + Sync {
    // Execute a structured conversation and return the assistant's text reply
    async fn generate(&self, messages: &[ChatMessage], params: GenerationParams) -> Result<String>;
}
