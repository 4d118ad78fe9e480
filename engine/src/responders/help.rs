//! Help responder
//!
//! Answers requests for instructions or capabilities with a fixed summary
//! and example prompts.

use async_trait::async_trait;
use sdk::types::Turn;

use super::{has_digit, latest_user_text, normalize, Reply, Responder};

pub const HELP_REPLY: &str = "I'm NutriPlan AI, your nutrition planning assistant. Here's what I can do:\n\
\n\
- Collect your daily calorie target and any dietary preferences or restrictions\n\
- Generate a one-day meal plan with 6 meals (Breakfast, Elevenses, Lunch, Linner, Dinner, Supper)\n\
- Show your recommended protein, carbohydrate and fat targets using a macro calculator\n\
- Look up nutrition facts for specific foods using web search\n\
\n\
Try one of these:\n\
- \"Make me a 1800 calorie vegetarian meal plan\"\n\
- \"2200 calories, no nuts\"\n\
- \"How much protein is in 100g of salmon?\"";

/// Whole messages that ask for help
const HELP_MESSAGES: &[&str] = &[
    "help",
    "help me",
    "help please",
    "please help",
    "need help",
    "i need help",
    "instructions",
    "usage",
    "commands",
    "menu",
    "features",
    "capabilities",
];

/// Phrases that ask what the assistant is or how to use it
const HELP_PHRASES: &[&str] = &[
    "what can you do",
    "what do you do",
    "what can i ask",
    "what can i say",
    "how does this work",
    "how does it work",
    "how do you work",
    "how do i use",
    "how to use",
    "what are your features",
    "what features",
    "your capabilities",
    "who are you",
    "explain this agent",
    "explain yourself",
    "what is nutriplan",
    "what's nutriplan",
    "how can you help",
];

/// Whether the message asks for capabilities or instructions
pub fn is_help_request(text: &str) -> bool {
    if has_digit(text) {
        return false;
    }

    let normalized = normalize(text);
    if HELP_MESSAGES.contains(&normalized.as_str()) {
        return true;
    }

    HELP_PHRASES
        .iter()
        .any(|phrase| contains_phrase(&normalized, phrase))
}

/// Word-aligned substring test on normalized text
fn contains_phrase(haystack: &str, phrase: &str) -> bool {
    let padded = format!(" {} ", haystack);
    padded.contains(&format!(" {} ", phrase))
}

pub struct HelpResponder;

#[async_trait]
impl Responder for HelpResponder {
    fn name(&self) -> &'static str {
        "help"
    }

    async fn respond(&self, history: &[Turn]) -> anyhow::Result<Reply> {
        match latest_user_text(history) {
            Some(text) if is_help_request(text) => Ok(Reply::Text(HELP_REPLY.to_string())),
            _ => Ok(Reply::Skip),
        }
    }
}
