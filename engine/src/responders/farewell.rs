//! Farewell responder
//!
//! Triggers only when the entire message is one of a closed set of farewell
//! phrases. Acknowledgements ("ok", "good"), gratitude without a farewell
//! word and partial phrases ("good to know") never match.

use async_trait::async_trait;
use sdk::types::Turn;

use super::{latest_user_text, normalize, Reply, Responder};

pub const FAREWELL_REPLY: &str =
    "It was a pleasure helping you with your meal plan! Have a great day.";

/// Normalized phrases that end the conversation
const FAREWELL_PHRASES: &[&str] = &[
    "bye",
    "bye bye",
    "bye now",
    "bye for now",
    "ok bye",
    "okay bye",
    "goodbye",
    "good bye",
    "see you",
    "see you later",
    "see ya",
    "farewell",
    "take care",
    "thanks bye",
    "thank you bye",
    "thanks goodbye",
    "thank you goodbye",
    "that's all",
    "that's all thanks",
    "that's all thank you",
    "i'm done",
    "i'm done thanks",
    "i'm done thank you",
];

/// Whether the whole message is a farewell phrase
pub fn is_farewell(text: &str) -> bool {
    let normalized = normalize(text);
    FAREWELL_PHRASES.contains(&normalized.as_str())
}

pub struct FarewellResponder;

#[async_trait]
impl Responder for FarewellResponder {
    fn name(&self) -> &'static str {
        "farewell"
    }

    async fn respond(&self, history: &[Turn]) -> anyhow::Result<Reply> {
        match latest_user_text(history) {
            Some(text) if is_farewell(text) => Ok(Reply::Text(FAREWELL_REPLY.to_string())),
            _ => Ok(Reply::Skip),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_farewell_phrases_match() {
        for text in [
            "bye",
            "Goodbye!",
            "bye bye",
            "See you later.",
            "farewell",
            "Take care",
            "thanks, bye",
            "Thank you, bye!",
            "That’s all, thanks",
            "I'm done, thanks",
            "I'm done",
            "that's all",
        ] {
            assert!(is_farewell(text), "{:?} should be a farewell", text);
        }
    }

    #[test]
    fn test_non_farewells_do_not_match() {
        for text in [
            "good",
            "ok",
            "okay",
            "sure",
            "yes",
            "yeah",
            "great",
            "nice",
            "good to know",
            "good idea",
            "I'm good with that",
            "thanks",
            "thank you",
            "bye the way, I'm vegan",
            "goodbye to sugar, 1800 calories please",
        ] {
            assert!(!is_farewell(text), "{:?} should not be a farewell", text);
        }
    }

    #[tokio::test]
    async fn test_responder_replies_or_skips() {
        let responder = FarewellResponder;

        let reply = responder.respond(&[Turn::user("bye")]).await.unwrap();
        assert_eq!(reply, Reply::Text(FAREWELL_REPLY.to_string()));

        let reply = responder.respond(&[Turn::user("thanks")]).await.unwrap();
        assert_eq!(reply, Reply::Skip);
    }

    #[tokio::test]
    async fn test_only_newest_turn_counts() {
        let history = vec![
            Turn::user("bye"),
            Turn::assistant(FAREWELL_REPLY),
            Turn::user("wait, one more question"),
        ];
        let reply = FarewellResponder.respond(&history).await.unwrap();
        assert_eq!(reply, Reply::Skip);
    }
}
