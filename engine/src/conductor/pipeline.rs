//! Nutrition flow
//!
//! Runs the extractor and the plan generator strictly in sequence. This is
//! the router's terminal candidate, so it always produces text.

use async_trait::async_trait;
use sdk::errors::{EngineError, NutriErrorExt};
use sdk::types::Turn;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::extractor::{Extraction, ProfileExtractor};
use super::planner::{PlanGenerator, PlanOutcome};
use crate::llm::LLMProvider;
use crate::responders::{Reply, Responder};

pub const APOLOGY_REPLY: &str =
    "Sorry, I ran into a problem while preparing your meal plan. Please try again in a moment.";

/// Where a conversation stands after one flow run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    AwaitingCalories,
    AwaitingPreferences,
    Ready,
    Rejected,
    Planned,
}

impl fmt::Display for FlowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowResult {
    pub state: FlowState,
    pub text: String,
}

impl FlowResult {
    fn new(state: FlowState, text: impl Into<String>) -> Self {
        tracing::info!(state = %state, "Nutrition flow finished");
        Self {
            state,
            text: text.into(),
        }
    }
}

pub struct NutritionFlow {
    extractor: ProfileExtractor,
    planner: PlanGenerator,
}

impl NutritionFlow {
    pub fn new(llm: Arc<dyn LLMProvider>, llm_timeout: Duration) -> Self {
        Self {
            extractor: ProfileExtractor::new(),
            planner: PlanGenerator::new(llm, llm_timeout),
        }
    }

    pub async fn run(&self, history: &[Turn]) -> FlowResult {
        let profile = match self.extractor.run(history) {
            Extraction::NeedCalories(question) => {
                return FlowResult::new(FlowState::AwaitingCalories, question)
            }
            Extraction::NeedPreferences(question) => {
                return FlowResult::new(FlowState::AwaitingPreferences, question)
            }
            Extraction::Ready(profile) => profile,
        };

        tracing::debug!(state = %FlowState::Ready, ?profile, "Profile complete");
        let handoff = profile.to_value();

        match self.planner.generate(Some(&handoff), history).await {
            Ok(PlanOutcome::Planned(plan)) => {
                FlowResult::new(FlowState::Planned, plan.to_markdown())
            }
            Ok(outcome) => FlowResult::new(FlowState::Rejected, outcome.into_text()),
            Err(e) => {
                log_failure(&e);
                FlowResult::new(FlowState::Ready, APOLOGY_REPLY)
            }
        }
    }
}

fn log_failure(error: &EngineError) {
    tracing::error!(
        recoverable = error.is_recoverable(),
        hint = error.user_hint(),
        "Meal plan generation failed: {}",
        error
    );
}

#[async_trait]
impl Responder for NutritionFlow {
    fn name(&self) -> &'static str {
        "flow"
    }

    async fn respond(&self, history: &[Turn]) -> anyhow::Result<Reply> {
        Ok(Reply::Text(self.run(history).await.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conductor::extractor::{CALORIES_QUESTION, PREFERENCES_QUESTION};
    use crate::conductor::planner::SAFETY_MESSAGE;
    use crate::llm::LLMError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LLMProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        async fn generate(
            &self,
            _instruction: &str,
            _history: &[Turn],
        ) -> Result<String, LLMError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("{}".to_string())
        }
    }

    struct HangingProvider;

    #[async_trait]
    impl LLMProvider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn generate(
            &self,
            _instruction: &str,
            _history: &[Turn],
        ) -> Result<String, LLMError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok("{}".to_string())
        }
    }

    fn counting_flow() -> (NutritionFlow, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
        });
        let flow = NutritionFlow::new(provider.clone(), Duration::from_secs(5));
        (flow, provider)
    }

    #[tokio::test]
    async fn test_state_progression() {
        let (flow, provider) = counting_flow();
        let mut history = vec![Turn::user("I want a meal plan")];

        let result = flow.run(&history).await;
        assert_eq!(result.state, FlowState::AwaitingCalories);
        assert_eq!(result.text, CALORIES_QUESTION);

        history.push(Turn::assistant(result.text));
        history.push(Turn::user("1800"));
        let result = flow.run(&history).await;
        assert_eq!(result.state, FlowState::AwaitingPreferences);
        assert_eq!(result.text, PREFERENCES_QUESTION);

        history.push(Turn::assistant(result.text));
        history.push(Turn::user("vegetarian"));
        let result = flow.run(&history).await;
        assert_eq!(result.state, FlowState::Planned);
        assert!(result.text.contains("**Recommended Macros**"));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unsafe_target_is_rejected() {
        let (flow, provider) = counting_flow();
        let result = flow.run(&[Turn::user("900 calories, no restrictions")]).await;

        assert_eq!(result.state, FlowState::Rejected);
        assert_eq!(result.text, SAFETY_MESSAGE);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_generation_timeout_apologizes() {
        let flow = NutritionFlow::new(Arc::new(HangingProvider), Duration::from_millis(50));
        let result = flow.run(&[Turn::user("2000 kcal, vegan")]).await;

        assert_eq!(result.text, APOLOGY_REPLY);
    }

    #[tokio::test]
    async fn test_never_skips() {
        let (flow, _) = counting_flow();
        for text in ["", "bye", "???"] {
            let reply = flow.respond(&[Turn::user(text)]).await.unwrap();
            assert!(!reply.is_skip());
        }
        let reply = flow.respond(&[]).await.unwrap();
        assert_eq!(reply, Reply::Text(CALORIES_QUESTION.to_string()));
    }
}
