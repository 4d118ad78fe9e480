//! Greeting responder
//!
//! Handles a message that is mainly a short greeting. Anything carrying
//! information (numbers, preferences, questions) falls through so the
//! nutrition flow sees it.

use async_trait::async_trait;
use sdk::types::Turn;

use super::{has_digit, latest_user_text, normalize, Reply, Responder};

pub const GREETING_REPLY: &str = "Hi! I'm your nutrition assistant. To get started, please tell me \
your daily calorie target (e.g., 1800 or 2000) and any dietary preferences or restrictions \
(for example: vegetarian, halal, gluten-free, no nuts, or 'none').";

/// Longest message still treated as a short greeting, in words
const MAX_GREETING_WORDS: usize = 6;

const GREETING_OPENERS: &[&[&str]] = &[
    &["good", "morning"],
    &["good", "afternoon"],
    &["good", "evening"],
    &["good", "day"],
    &["hi"],
    &["hello"],
    &["hey"],
    &["hiya"],
    &["howdy"],
    &["greetings"],
];

/// Words allowed after the opener without adding content
const FILLER_WORDS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "there",
    "again",
    "everyone",
    "all",
    "friend",
    "nutri",
    "nutriplan",
    "ai",
    "bot",
    "assistant",
    "how",
    "how's",
    "are",
    "you",
    "it",
    "it's",
    "going",
    "doing",
];

/// Whether the message is a pure greeting
pub fn is_pure_greeting(text: &str) -> bool {
    if has_digit(text) {
        return false;
    }

    let normalized = normalize(text);
    let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();
    if words.is_empty() || words.len() > MAX_GREETING_WORDS {
        return false;
    }

    let Some(opener) = GREETING_OPENERS
        .iter()
        .find(|opener| words.starts_with(opener))
    else {
        return false;
    };

    words[opener.len()..]
        .iter()
        .all(|word| FILLER_WORDS.contains(word))
}

pub struct GreetingResponder;

#[async_trait]
impl Responder for GreetingResponder {
    fn name(&self) -> &'static str {
        "greeting"
    }

    async fn respond(&self, history: &[Turn]) -> anyhow::Result<Reply> {
        match latest_user_text(history) {
            Some(text) if is_pure_greeting(text) => Ok(Reply::Text(GREETING_REPLY.to_string())),
            _ => Ok(Reply::Skip),
        }
    }
}
