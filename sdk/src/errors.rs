//! Error types and handling
//!
//! This module provides the error types used throughout the NutriPlan engine.
//! All errors implement the `NutriErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! All error messages are scrubbed to ensure:
//! - No secrets (API keys, search engine ids) are included
//! - No provider payloads are echoed back to the user
//! - All hints are safe to display in a chat transcript

use thiserror::Error;

/// Trait for NutriPlan error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait NutriErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain:
    /// - Secrets (API keys, tokens)
    /// - Raw provider responses
    /// - Internal implementation details
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors affect a single turn; the next turn may succeed.
    /// Non-recoverable errors need the configuration or environment fixed.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Generation**: Failures and timeouts of the text-generation capability
/// - **Search**: Failures and timeouts of the web-search capability
/// - **Contract**: Output that does not honor a stage contract
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, NutriErrorExt};
///
/// let error = EngineError::GenerationTimeout;
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::Config("missing [llm] section".to_string());
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Generation capability errors
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Generation call timed out")]
    GenerationTimeout,

    // Search capability errors
    #[error("Search error: {0}")]
    Search(String),

    #[error("Search call timed out")]
    SearchTimeout,

    // Contract errors
    #[error("Malformed output: {0}")]
    MalformedOutput(String),

    #[error("Invalid calorie target: {0}")]
    InvalidCalories(i64),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl NutriErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",

            Self::Generation(_) => {
                "The language model is unavailable. Check your API key and network"
            }
            Self::GenerationTimeout => "The language model took too long to respond. Try again",

            Self::Search(_) => "Web search is unavailable right now",
            Self::SearchTimeout => "Web search took too long to respond. Try again",

            Self::MalformedOutput(_) => "Received an unexpected answer. Try rephrasing",
            Self::InvalidCalories(_) => "Calorie targets must be a positive whole number",

            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_) | Self::Io(_))
    }
}
