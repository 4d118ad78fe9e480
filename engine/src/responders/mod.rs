//! Responders
//!
//! A responder looks at the conversation and either answers the newest user
//! turn or declines with `Reply::Skip` so the router can try the next one.
//! Greeting, farewell and help are closed decision procedures with fixed
//! replies; the search responder decides locally and then delegates the
//! answer to the search and generation capabilities.

use async_trait::async_trait;
use sdk::types::Turn;

pub mod farewell;
pub mod greeting;
pub mod help;
pub mod search;

pub use farewell::FarewellResponder;
pub use greeting::GreetingResponder;
pub use help::HelpResponder;
pub use search::SearchResponder;

/// Token a generation call returns to decline a turn
pub const SKIP_TOKEN: &str = "SKIP";

/// Outcome of asking one responder about the current turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Final text for this turn
    Text(String),

    /// Not this responder's turn; try the next candidate
    Skip,
}

impl Reply {
    /// Interpret generated text.
    ///
    /// The skip token (any case, optionally quoted or followed by a period)
    /// and blank output both count as a skip.
    pub fn from_generated(raw: &str) -> Self {
        let trimmed = raw.trim();
        let token = trimmed
            .trim_matches(|c| c == '"' || c == '\'' || c == '`')
            .trim_end_matches('.')
            .trim();

        if token.is_empty() || token.eq_ignore_ascii_case(SKIP_TOKEN) {
            Reply::Skip
        } else {
            Reply::Text(trimmed.to_string())
        }
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, Reply::Skip)
    }
}

/// A candidate answerer for a conversation turn
#[async_trait]
pub trait Responder: Send + Sync {
    /// Stable name used in logs and route outcomes
    fn name(&self) -> &'static str;

    /// Answer the newest user turn or decline it
    async fn respond(&self, history: &[Turn]) -> anyhow::Result<Reply>;
}

/// Text of the newest turn when it was written by the user
pub fn latest_user_text(history: &[Turn]) -> Option<&str> {
    history
        .last()
        .filter(|turn| turn.is_user())
        .map(|turn| turn.text.as_str())
}

/// Lowercase, map curly apostrophes to `'`, replace other punctuation with
/// spaces and collapse whitespace.
pub fn normalize(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| match c {
            '\u{2019}' | '\u{2018}' | '`' => '\'',
            c if c.is_alphanumeric() || c == '\'' => c,
            _ => ' ',
        })
        .flat_map(char::to_lowercase)
        .collect();

    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub(crate) fn has_digit(text: &str) -> bool {
    text.chars().any(|c| c.is_ascii_digit())
}
