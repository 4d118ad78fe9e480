//! Integration tests for the turn router
//!
//! Drives the standard candidate list (farewell, greeting, help, search,
//! flow) end to end with in-process generation and search providers.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use nutri_engine::conductor::extractor::{CALORIES_QUESTION, PREFERENCES_QUESTION};
use nutri_engine::conductor::planner::{DISCLAIMER, SAFETY_MESSAGE};
use nutri_engine::conductor::TurnRouter;
use nutri_engine::config::Config;
use nutri_engine::llm::{LLMError, LLMProvider};
use nutri_engine::responders::farewell::FAREWELL_REPLY;
use nutri_engine::responders::greeting::GREETING_REPLY;
use nutri_engine::responders::help::HELP_REPLY;
use nutri_engine::search::{SearchError, SearchProvider, Snippet};
use sdk::types::Turn;

const MEAL_ITEMS: &str = r#"{
  "Breakfast": ["Oatmeal with berries", "Greek yogurt"],
  "Elevenses": ["Apple", "Almonds"],
  "Lunch": ["Lentil soup", "Wholegrain roll", "Side salad"],
  "Linner": ["Hummus", "Carrot sticks"],
  "Dinner": ["Vegetable curry", "Brown rice", "Steamed spinach"],
  "Supper": ["Herbal tea", "Kiwi"]
}"#;

/// Answers search summaries and meal suggestions, counting each kind
#[derive(Default)]
struct ScriptedLLM {
    plan_calls: AtomicUsize,
    summary_calls: AtomicUsize,
    decline_summaries: bool,
}

#[async_trait]
impl LLMProvider for ScriptedLLM {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, instruction: &str, _history: &[Turn]) -> Result<String, LLMError> {
        if instruction.contains("Search results:") {
            self.summary_calls.fetch_add(1, Ordering::SeqCst);
            if self.decline_summaries {
                return Ok("SKIP".to_string());
            }
            return Ok("A medium avocado has roughly 230-250 kcal.".to_string());
        }

        self.plan_calls.fetch_add(1, Ordering::SeqCst);
        Ok(MEAL_ITEMS.to_string())
    }
}

#[derive(Default)]
struct FixedSearch {
    calls: AtomicUsize,
}

#[async_trait]
impl SearchProvider for FixedSearch {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<Snippet>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(vec![Snippet {
            title: "Avocado nutrition".to_string(),
            snippet: "One medium avocado contains about 240 calories.".to_string(),
            link: "https://example.org/avocado".to_string(),
        }])
    }
}

struct Harness {
    router: TurnRouter,
    llm: Arc<ScriptedLLM>,
    search: Arc<FixedSearch>,
}

fn harness_with(llm: ScriptedLLM, with_search: bool) -> Harness {
    let llm = Arc::new(llm);
    let search = Arc::new(FixedSearch::default());
    let search_provider: Option<Arc<dyn SearchProvider>> = if with_search {
        Some(search.clone())
    } else {
        None
    };
    let router = TurnRouter::standard(&Config::default(), llm.clone(), search_provider);

    Harness {
        router,
        llm,
        search,
    }
}

fn harness() -> Harness {
    harness_with(ScriptedLLM::default(), true)
}

/// Append each message as a user turn, route it and record the reply
async fn converse(router: &TurnRouter, history: &mut Vec<Turn>, message: &str) -> (String, String) {
    history.push(Turn::user(message));
    let outcome = router.handle_turn(history).await;
    history.push(Turn::assistant(outcome.text.clone()));
    (outcome.responder.to_string(), outcome.text)
}

#[tokio::test]
async fn test_standard_candidate_order() {
    let h = harness();
    assert_eq!(
        h.router.candidate_names(),
        vec!["farewell", "greeting", "help", "search", "flow"]
    );

    let without_search = harness_with(ScriptedLLM::default(), false);
    assert_eq!(
        without_search.router.candidate_names(),
        vec!["farewell", "greeting", "help", "flow"]
    );
}

#[tokio::test]
async fn test_help_answers_without_running_flow() {
    let h = harness();
    let outcome = h.router.handle_turn(&[Turn::user("What can you do?")]).await;

    assert_eq!(outcome.responder, "help");
    assert_eq!(outcome.text, HELP_REPLY);
    assert_eq!(h.llm.plan_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.search.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_farewell_regardless_of_history() {
    let h = harness();
    let mut history = Vec::new();
    converse(&h.router, &mut history, "1800 calories, vegan").await;

    for message in ["bye", "Thank you, bye!", "I'm done"] {
        let mut conversation = history.clone();
        let (responder, text) = converse(&h.router, &mut conversation, message).await;
        assert_eq!(responder, "farewell");
        assert_eq!(text, FAREWELL_REPLY);
    }
}

#[tokio::test]
async fn test_acknowledgement_is_not_a_farewell() {
    let h = harness();
    let mut history = Vec::new();

    let (responder, _) = converse(&h.router, &mut history, "good").await;
    assert_eq!(responder, "flow");
}

#[tokio::test]
async fn test_greeting_then_full_plan() {
    let h = harness();
    let mut history = Vec::new();

    let (responder, text) = converse(&h.router, &mut history, "hi").await;
    assert_eq!(responder, "greeting");
    assert_eq!(text, GREETING_REPLY);

    let (responder, text) = converse(&h.router, &mut history, "1800").await;
    assert_eq!(responder, "flow");
    assert_eq!(text, PREFERENCES_QUESTION);

    let (responder, plan) = converse(&h.router, &mut history, "vegetarian").await;
    assert_eq!(responder, "flow");
    assert!(plan.contains("**Recommended Macros**"));
    assert!(plan.contains("- Protein: 135 g"));
    assert!(plan.contains("- Carbohydrates: 180 g"));
    assert!(plan.contains("- Fats: 60 g"));
    for section in [
        "**Breakfast (~360 kcal)**",
        "**Elevenses (~180 kcal)**",
        "**Lunch (~450 kcal)**",
        "**Linner (~180 kcal)**",
        "**Dinner (~450 kcal)**",
        "**Supper (~180 kcal)**",
    ] {
        assert!(plan.contains(section), "missing {}", section);
    }
    assert!(plan.contains("vegetarian"));
    assert!(plan.ends_with(DISCLAIMER));
    assert_eq!(h.llm.plan_calls.load(Ordering::SeqCst), 1);

    let (responder, text) = converse(&h.router, &mut history, "thanks, bye").await;
    assert_eq!(responder, "farewell");
    assert_eq!(text, FAREWELL_REPLY);
}

#[tokio::test]
async fn test_greeting_with_content_falls_through_to_flow() {
    let h = harness();
    let outcome = h
        .router
        .handle_turn(&[Turn::user("hi, 1800 calories please")])
        .await;

    assert_eq!(outcome.responder, "flow");
    assert_eq!(outcome.text, PREFERENCES_QUESTION);
}

#[tokio::test]
async fn test_calories_never_requested_twice() {
    let h = harness();
    let mut history = Vec::new();

    let (_, first) = converse(&h.router, &mut history, "I'd like a meal plan").await;
    assert_eq!(first, CALORIES_QUESTION);

    converse(&h.router, &mut history, "2000 please").await;
    for message in ["hmm", "let me think", "what do you suggest?", "ok"] {
        let (_, text) = converse(&h.router, &mut history, message).await;
        assert_ne!(text, CALORIES_QUESTION, "asked again after {:?}", message);
    }

    let (_, plan) = converse(&h.router, &mut history, "no restrictions").await;
    assert!(plan.contains("2000 kcal"));
}

#[tokio::test]
async fn test_unsafe_target_gets_safety_message() {
    let h = harness();
    let mut history = Vec::new();

    converse(&h.router, &mut history, "900 calories").await;
    let (responder, text) = converse(&h.router, &mut history, "none").await;

    assert_eq!(responder, "flow");
    assert_eq!(text, SAFETY_MESSAGE);
    assert!(!text.contains("Recommended Macros"));
    assert_eq!(h.llm.plan_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_food_question_goes_to_search() {
    let h = harness();
    let outcome = h
        .router
        .handle_turn(&[Turn::user("How many calories are in an avocado?")])
        .await;

    assert_eq!(outcome.responder, "search");
    assert!(outcome.text.contains("230-250 kcal"));
    assert_eq!(h.search.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.llm.plan_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_food_question_number_is_not_a_target() {
    let h = harness();
    let mut history = Vec::new();

    let (responder, _) =
        converse(&h.router, &mut history, "Is 300 calories a lot for a snack?").await;
    assert_eq!(responder, "search");

    let (responder, text) =
        converse(&h.router, &mut history, "ok, can you make me a meal plan").await;
    assert_eq!(responder, "flow");
    assert_eq!(text, CALORIES_QUESTION);

    let (_, text) = converse(&h.router, &mut history, "1800").await;
    assert_eq!(text, PREFERENCES_QUESTION);

    let (_, plan) = converse(&h.router, &mut history, "none").await;
    assert_ne!(plan, SAFETY_MESSAGE);
    assert!(plan.contains("**Calorie target:** 1800 kcal per day"));
}

#[tokio::test]
async fn test_later_restriction_keeps_earlier_ones() {
    let h = harness();
    let mut history = Vec::new();

    let (_, first) = converse(&h.router, &mut history, "1800 calories, I'm vegan").await;
    assert!(first.contains("**Dietary preferences:** vegan"));

    let (responder, second) = converse(&h.router, &mut history, "also no nuts please").await;
    assert_eq!(responder, "flow");
    assert!(second.contains("**Dietary preferences:** vegan, no nuts"));
}

#[tokio::test]
async fn test_declined_search_falls_through_to_flow() {
    let h = harness_with(
        ScriptedLLM {
            decline_summaries: true,
            ..Default::default()
        },
        true,
    );
    let outcome = h
        .router
        .handle_turn(&[Turn::user("How many calories are in an avocado?")])
        .await;

    assert_eq!(outcome.responder, "flow");
    assert_eq!(outcome.text, CALORIES_QUESTION);
    assert_eq!(h.llm.summary_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_plan_request_never_searches() {
    let h = harness();
    let outcome = h
        .router
        .handle_turn(&[Turn::user("How many calories should I eat per day?")])
        .await;

    assert_eq!(outcome.responder, "flow");
    assert_eq!(h.search.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_every_turn_gets_one_non_empty_reply() {
    let h = harness();
    let mut history = Vec::new();

    for message in ["", "   ", "???", "hello", "2500", "keto", "bye"] {
        let (_, text) = converse(&h.router, &mut history, message).await;
        assert!(!text.trim().is_empty(), "empty reply to {:?}", message);
        assert_ne!(text.trim(), "SKIP");
    }
}
