//! Nutrition-fact search responder
//!
//! Triggers on questions about the nutrition facts of a specific food or
//! ingredient, as opposed to requests for a personal plan. A matching turn
//! is answered by searching the web and asking the generation capability to
//! summarize what the sources say.

use async_trait::async_trait;
use sdk::types::Turn;
use std::sync::Arc;
use std::time::Duration;

use super::{latest_user_text, normalize, Reply, Responder};
use crate::llm::{generate_with_timeout, LLMProvider};
use crate::search::{format_snippets, search_with_timeout, SearchProvider};

pub const NO_RESULTS_REPLY: &str = "I couldn't find reliable nutrition facts for that food. \
Could you try naming the food or ingredient a little more specifically?";

pub const SEARCH_FAILED_REPLY: &str = "Sorry, I couldn't look that up right now. \
Please try your question again in a moment.";

const SUMMARY_INSTRUCTION: &str = "You are a nutrition research specialist. \
Answer the user's latest question about the nutrition facts of a specific food or ingredient \
using only the numbered search results below. Reply in clear, concise plain English. \
When the sources give different numbers, state a sensible range instead of a single value, \
and mention the serving size the numbers refer to. \
If the question is not about nutrition facts for a food, reply with exactly: SKIP\n\n\
Search results:\n";

const DEFAULT_MAX_RESULTS: usize = 5;
const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(20);
const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(60);

const QUESTION_OPENERS: &[&str] = &[
    "how", "what", "what's", "whats", "which", "is", "are", "does", "do", "can", "compare",
    "tell",
];

const NUTRIENT_WORDS: &[&str] = &[
    "calorie",
    "calories",
    "kcal",
    "protein",
    "carb",
    "carbs",
    "carbohydrate",
    "carbohydrates",
    "fat",
    "fats",
    "fiber",
    "fibre",
    "sugar",
    "sugars",
    "sodium",
    "salt",
    "vitamin",
    "vitamins",
    "iron",
    "calcium",
    "potassium",
    "magnesium",
    "zinc",
    "cholesterol",
    "caffeine",
    "nutrient",
    "nutrients",
    "nutrition",
    "nutritional",
    "macros",
    "glycemic",
    "healthier",
];

/// Phrases that tie the question to a specific food
const FOOD_REFERENCE_PHRASES: &[&str] = &[
    "in", "than", "vs", "versus", "compared", "of", "for",
];

/// Phrases that make a question about the user's own plan
const PERSONAL_PHRASES: &[&str] = &[
    "plan",
    "my diet",
    "per day",
    "a day",
    "daily",
    "should i",
    "do i need",
    "i need",
    "for me",
    "i want",
    "i'd like",
    "lose weight",
    "gain weight",
];

/// Whether the message asks for nutrition facts about a specific food
pub fn is_food_fact_question(text: &str) -> bool {
    let normalized = normalize(text);
    let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();
    let Some(first) = words.first() else {
        return false;
    };

    let is_question = text.contains('?') || QUESTION_OPENERS.contains(first);
    if !is_question {
        return false;
    }

    let Some(nutrient_at) = words.iter().position(|w| NUTRIENT_WORDS.contains(w)) else {
        return false;
    };

    // A food must be named somewhere around the nutrient, e.g. "in an
    // avocado", "than white rice" or "salmon protein"
    let has_food_reference = words
        .iter()
        .any(|w| FOOD_REFERENCE_PHRASES.contains(w))
        || nutrient_at > 1;
    if !has_food_reference {
        return false;
    }

    let padded = format!(" {} ", normalized);
    !PERSONAL_PHRASES
        .iter()
        .any(|phrase| padded.contains(&format!(" {} ", phrase)))
}

pub struct SearchResponder {
    search: Arc<dyn SearchProvider>,
    llm: Arc<dyn LLMProvider>,
    max_results: usize,
    search_timeout: Duration,
    llm_timeout: Duration,
}

impl SearchResponder {
    pub fn new(search: Arc<dyn SearchProvider>, llm: Arc<dyn LLMProvider>) -> Self {
        Self {
            search,
            llm,
            max_results: DEFAULT_MAX_RESULTS,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
            llm_timeout: DEFAULT_LLM_TIMEOUT,
        }
    }

    pub fn with_limits(
        mut self,
        max_results: usize,
        search_timeout: Duration,
        llm_timeout: Duration,
    ) -> Self {
        self.max_results = max_results;
        self.search_timeout = search_timeout;
        self.llm_timeout = llm_timeout;
        self
    }
}

#[async_trait]
impl Responder for SearchResponder {
    fn name(&self) -> &'static str {
        "search"
    }

    async fn respond(&self, history: &[Turn]) -> anyhow::Result<Reply> {
        let Some(question) = latest_user_text(history) else {
            return Ok(Reply::Skip);
        };
        if !is_food_fact_question(question) {
            return Ok(Reply::Skip);
        }

        let snippets = match search_with_timeout(
            self.search.as_ref(),
            question.trim(),
            self.max_results,
            self.search_timeout,
        )
        .await
        {
            Ok(snippets) => snippets,
            Err(e) => {
                tracing::warn!("Nutrition search failed: {}", e);
                return Ok(Reply::Text(SEARCH_FAILED_REPLY.to_string()));
            }
        };

        if snippets.is_empty() {
            tracing::info!("No search results for {:?}", question);
            return Ok(Reply::Text(NO_RESULTS_REPLY.to_string()));
        }

        let instruction = format!("{}{}", SUMMARY_INSTRUCTION, format_snippets(&snippets));
        let raw = match generate_with_timeout(
            self.llm.as_ref(),
            &instruction,
            history,
            self.llm_timeout,
        )
        .await
        {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Search summary generation failed: {}", e);
                return Ok(Reply::Text(SEARCH_FAILED_REPLY.to_string()));
            }
        };

        Ok(Reply::from_generated(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMError;
    use crate::search::{SearchError, Snippet};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedSearch {
        snippets: Vec<Snippet>,
        calls: AtomicUsize,
    }

    impl FixedSearch {
        fn new(snippets: Vec<Snippet>) -> Self {
            Self {
                snippets,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl SearchProvider for FixedSearch {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(&self, _query: &str, limit: usize) -> Result<Vec<Snippet>, SearchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.snippets.iter().take(limit).cloned().collect())
        }
    }

    struct BrokenSearch;

    #[async_trait]
    impl SearchProvider for BrokenSearch {
        fn name(&self) -> &str {
            "broken"
        }

        async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<Snippet>, SearchError> {
            Err(SearchError::Request("HTTP 503".to_string()))
        }
    }

    struct EchoInstruction;

    #[async_trait]
    impl LLMProvider for EchoInstruction {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(
            &self,
            instruction: &str,
            _history: &[Turn],
        ) -> Result<String, LLMError> {
            if instruction.contains("240 kcal") {
                Ok("A medium avocado has roughly 230-250 kcal.".to_string())
            } else {
                Ok("SKIP".to_string())
            }
        }
    }

    fn avocado_snippet() -> Snippet {
        Snippet {
            title: "Avocado".to_string(),
            snippet: "One medium avocado has about 240 kcal.".to_string(),
            link: "https://example.org/avocado".to_string(),
        }
    }

    #[test]
    fn test_food_fact_questions_match() {
        for text in [
            "How many calories are in an avocado?",
            "How much protein is in 100g of salmon?",
            "Is brown rice higher in fiber than white rice?",
            "what's the sugar content of a banana",
            "Does spinach have more iron than kale?",
            "How much salmon protein?",
        ] {
            assert!(is_food_fact_question(text), "{:?} should be a food question", text);
        }
    }

    #[test]
    fn test_plan_requests_do_not_match() {
        for text in [
            "How many calories should I eat per day?",
            "I want 1800 calories",
            "Can you make a meal plan with 2000 calories?",
            "vegetarian",
            "What can you do?",
            "How much protein do I need?",
            "calories?",
        ] {
            assert!(!is_food_fact_question(text), "{:?} should not match", text);
        }
    }

    #[tokio::test]
    async fn test_search_then_summarize() {
        let search = Arc::new(FixedSearch::new(vec![avocado_snippet()]));
        let responder = SearchResponder::new(search.clone(), Arc::new(EchoInstruction));

        let reply = responder
            .respond(&[Turn::user("How many calories are in an avocado?")])
            .await
            .unwrap();

        assert_eq!(
            reply,
            Reply::Text("A medium avocado has roughly 230-250 kcal.".to_string())
        );
        assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_non_matching_turn_never_searches() {
        let search = Arc::new(FixedSearch::new(vec![avocado_snippet()]));
        let responder = SearchResponder::new(search.clone(), Arc::new(EchoInstruction));

        let reply = responder.respond(&[Turn::user("1800, vegan")]).await.unwrap();

        assert_eq!(reply, Reply::Skip);
        assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_no_results_reply() {
        let responder = SearchResponder::new(
            Arc::new(FixedSearch::new(vec![])),
            Arc::new(EchoInstruction),
        );

        let reply = responder
            .respond(&[Turn::user("How much fiber is in quinoa?")])
            .await
            .unwrap();

        assert_eq!(reply, Reply::Text(NO_RESULTS_REPLY.to_string()));
    }

    #[tokio::test]
    async fn test_search_failure_apologizes() {
        let responder = SearchResponder::new(Arc::new(BrokenSearch), Arc::new(EchoInstruction));

        let reply = responder
            .respond(&[Turn::user("How much fiber is in quinoa?")])
            .await
            .unwrap();

        assert_eq!(reply, Reply::Text(SEARCH_FAILED_REPLY.to_string()));
    }

    #[tokio::test]
    async fn test_generated_skip_is_skip() {
        let unrelated = Snippet {
            title: "Quinoa".to_string(),
            snippet: "Quinoa is a seed.".to_string(),
            link: "https://example.org/quinoa".to_string(),
        };
        let responder = SearchResponder::new(
            Arc::new(FixedSearch::new(vec![unrelated])),
            Arc::new(EchoInstruction),
        );

        let reply = responder
            .respond(&[Turn::user("How much fiber is in quinoa?")])
            .await
            .unwrap();

        assert_eq!(reply, Reply::Skip);
    }
}
