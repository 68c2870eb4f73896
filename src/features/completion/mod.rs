//! # Feature: Completion Service
//!
//! Stateless chat completion calls. Every caller supplies the full turn list;
//! nothing is remembered server side.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Sampling parameters are passed per call
//! - 1.0.0: OpenAI chat completions with a 45 second timeout

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use openai::chat::{ChatCompletion, ChatCompletionMessage, ChatCompletionMessageRole};
use std::time::Duration;
use tokio::time::timeout;

/// Upper bound for a single completion request
pub const COMPLETION_TIMEOUT: Duration = Duration::from_secs(45);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub max_tokens: u64,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.5,
            top_p: 1.0,
            presence_penalty: 0.6,
            frequency_penalty: 0.0,
            max_tokens: 1024,
        }
    }
}

impl SamplingParams {
    /// Near-deterministic settings for structured extraction prompts
    pub fn extraction() -> Self {
        Self {
            temperature: 0.0,
            presence_penalty: 0.0,
            max_tokens: 256,
            ..Self::default()
        }
    }
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, turns: &[Turn], params: &SamplingParams) -> Result<String>;

    /// Stored as the handler label on conversation records
    fn model_name(&self) -> &str;
}

/// OpenAI-backed completion service
///
/// The `openai` crate reads its key from `OPENAI_KEY`, set during bootstrap.
pub struct OpenAiCompletion {
    model: String,
}

impl OpenAiCompletion {
    pub fn new(model: impl Into<String>) -> Self {
        Self { model: model.into() }
    }
}

fn to_message(turn: &Turn) -> ChatCompletionMessage {
    let role = match turn.role {
        Role::System => ChatCompletionMessageRole::System,
        Role::User => ChatCompletionMessageRole::User,
        Role::Assistant => ChatCompletionMessageRole::Assistant,
    };
    ChatCompletionMessage {
        role,
        content: Some(turn.content.clone()),
        name: None,
        function_call: None,
        tool_call_id: None,
        tool_calls: None,
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, turns: &[Turn], params: &SamplingParams) -> Result<String> {
        let messages: Vec<ChatCompletionMessage> = turns.iter().map(to_message).collect();
        debug!("Sending {} messages to OpenAI model {}", messages.len(), self.model);

        let completion = timeout(
            COMPLETION_TIMEOUT,
            ChatCompletion::builder(&self.model, messages)
                .temperature(params.temperature)
                .top_p(params.top_p)
                .presence_penalty(params.presence_penalty)
                .frequency_penalty(params.frequency_penalty)
                .max_tokens(params.max_tokens)
                .create(),
        )
        .await
        .map_err(|_| anyhow::anyhow!("OpenAI request timed out after 45 seconds"))??;

        let response = completion
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default()
            .trim()
            .to_string();

        if let Some(usage) = &completion.usage {
            debug!(
                "OpenAI usage | Prompt: {} | Completion: {} | Total: {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }
        Ok(response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sampling_params() {
        let params = SamplingParams::default();
        assert_eq!(params.temperature, 0.5);
        assert_eq!(params.top_p, 1.0);
        assert_eq!(params.presence_penalty, 0.6);
        assert_eq!(params.max_tokens, 1024);
    }

    #[test]
    fn test_turns_map_to_openai_roles() {
        let message = to_message(&Turn::assistant("hello"));
        assert!(matches!(message.role, ChatCompletionMessageRole::Assistant));
        assert_eq!(message.content.as_deref(), Some("hello"));

        let message = to_message(&Turn::system("be brief"));
        assert!(matches!(message.role, ChatCompletionMessageRole::System));
    }

    #[test]
    fn test_model_name() {
        assert_eq!(OpenAiCompletion::new("gpt-4o-mini").model_name(), "gpt-4o-mini");
    }
}
