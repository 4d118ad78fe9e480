//! Generation Capability
//!
//! This module provides a common interface over the external text-generation
//! service (Gemini, or a local Ollama model). The `LLMProvider` trait is the
//! `(instruction profile, conversation history) -> text` contract every
//! responder and pipeline stage relies on; providers never interpret the
//! text they return.

use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::types::{Role, Turn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::config::LLMConfig;

pub mod gemini;
pub mod ollama;

/// Result type for LLM operations
pub type Result<T> = std::result::Result<T, LLMError>;

/// Errors that can occur during LLM operations
#[derive(Debug, thiserror::Error)]
pub enum LLMError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,

    #[error("Parse error: {0}")]
    ParseError(String),
}

impl From<LLMError> for EngineError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::Timeout => EngineError::GenerationTimeout,
            other => EngineError::Generation(other.to_string()),
        }
    }
}

/// Wire-level message sent to a provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender (system, user, assistant)
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Build the full prompt: the instruction profile as the system message
    /// followed by every turn of the conversation, in order.
    pub fn conversation(instruction: &str, history: &[Turn]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(Message::system(instruction));
        messages.extend(history.iter().map(|turn| match turn.role {
            Role::User => Message::user(turn.text.as_str()),
            Role::Assistant => Message::assistant(turn.text.as_str()),
        }));
        messages
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User message
    User,

    /// Assistant message
    Assistant,

    /// System message
    System,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::System => write!(f, "system"),
        }
    }
}

/// LLM Provider trait that all providers must implement
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "gemini", "ollama")
    fn name(&self) -> &str;

    /// Generate free text for an instruction profile over a conversation
    ///
    /// # Arguments
    /// * `instruction` - Fixed instruction profile of the calling responder or stage
    /// * `history` - Conversation so far, oldest turn first
    async fn generate(&self, instruction: &str, history: &[Turn]) -> Result<String>;
}

/// Build the configured provider
pub fn build_provider(config: &LLMConfig) -> std::result::Result<Box<dyn LLMProvider>, EngineError> {
    match config.default_provider.as_str() {
        "gemini" => Ok(Box::new(gemini::GeminiProvider::new(config.gemini.clone()))),
        "ollama" => Ok(Box::new(ollama::OllamaProvider::new(
            config.ollama.base_url.clone(),
            config.ollama.model.clone(),
        ))),
        other => Err(EngineError::Config(format!(
            "Unknown generation provider '{}'",
            other
        ))),
    }
}

/// Run one generation call bounded by `limit`.
///
/// Provider failures map to `EngineError::Generation`, expiry to
/// `EngineError::GenerationTimeout`. The call is never retried.
pub async fn generate_with_timeout(
    provider: &dyn LLMProvider,
    instruction: &str,
    history: &[Turn],
    limit: Duration,
) -> std::result::Result<String, EngineError> {
    match tokio::time::timeout(limit, provider.generate(instruction, history)).await {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => {
            tracing::warn!("Provider {} failed: {}", provider.name(), e);
            Err(e.into())
        }
        Err(_) => {
            tracing::warn!(
                "Provider {} timed out after {}s",
                provider.name(),
                limit.as_secs()
            );
            Err(EngineError::GenerationTimeout)
        }
    }
}

/// Locate the JSON object in a generated answer.
///
/// Handles raw JSON, fenced JSON (with or without surrounding prose) and an
/// object embedded anywhere in prose.
pub fn find_json_object(content: &str) -> Option<serde_json::Value> {
    let trimmed = content.trim();

    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        if value.is_object() {
            return Some(value);
        }
    }

    if let Some(inner) = extract_fenced_json(trimmed) {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(inner.trim()) {
            if value.is_object() {
                return Some(value);
            }
        }
    }

    let start = trimmed.find('{')?;
    let candidate = extract_balanced_json(&trimmed[start..])?;
    serde_json::from_str(candidate).ok()
}

/// Extract the body of the first markdown code fence in the text.
///
/// Works even when there is trailing prose after the closing ```.
/// Returns `None` if no fenced block is found.
fn extract_fenced_json(content: &str) -> Option<&str> {
    let fence_start = content.find("```")?;
    let after_opening = &content[fence_start + 3..];

    // Skip the language tag line (e.g. "json\n")
    let body_start_rel = after_opening.find('\n')? + 1;
    let body_start = fence_start + 3 + body_start_rel;

    let closing = content[body_start..].find("```")?;
    let body_end = body_start + closing;

    if body_start >= body_end {
        return None;
    }

    Some(&content[body_start..body_end])
}

/// Extract a balanced JSON object starting at position 0 of `s`.
///
/// Counts `{` / `}` depth, respecting string literals, to find the
/// matching close brace.
fn extract_balanced_json(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth = 0i32;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in s.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
