//! Turn Router
//!
//! Dispatches each user turn to exactly one responder. Candidates are tried
//! one at a time in a fixed priority order; the first that does not skip
//! answers the turn. The last candidate is terminal and always answers.

use sdk::errors::EngineError;
use sdk::types::Turn;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

use super::pipeline::{NutritionFlow, APOLOGY_REPLY};
use crate::config::Config;
use crate::llm::{build_provider, LLMProvider};
use crate::responders::{
    FarewellResponder, GreetingResponder, HelpResponder, Reply, Responder, SearchResponder,
};
use crate::search::{GoogleSearch, SearchProvider};

/// One entry of the priority list
pub struct Candidate {
    pub name: &'static str,
    pub responder: Arc<dyn Responder>,
    pub terminal: bool,
}

/// Final answer for a turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteOutcome {
    /// Name of the responder that answered
    pub responder: &'static str,
    pub text: String,
}

pub struct TurnRouter {
    candidates: Vec<Candidate>,
    responder_timeout: Duration,
}

impl TurnRouter {
    /// Build a router from non-terminal candidates in priority order and the
    /// terminal fallback that ends the list.
    pub fn new(
        candidates: Vec<Arc<dyn Responder>>,
        terminal: Arc<dyn Responder>,
        responder_timeout: Duration,
    ) -> Self {
        let mut list: Vec<Candidate> = candidates
            .into_iter()
            .map(|responder| Candidate {
                name: responder.name(),
                responder,
                terminal: false,
            })
            .collect();
        list.push(Candidate {
            name: terminal.name(),
            responder: terminal,
            terminal: true,
        });

        Self {
            candidates: list,
            responder_timeout,
        }
    }

    /// Farewell, greeting, help, search (when a search provider is given),
    /// then the nutrition flow.
    pub fn standard(
        config: &Config,
        llm: Arc<dyn LLMProvider>,
        search: Option<Arc<dyn SearchProvider>>,
    ) -> Self {
        let llm_timeout = Duration::from_secs(config.llm.timeout_secs);

        let mut candidates: Vec<Arc<dyn Responder>> = vec![
            Arc::new(FarewellResponder),
            Arc::new(GreetingResponder),
            Arc::new(HelpResponder),
        ];
        if let Some(search) = search {
            candidates.push(Arc::new(
                SearchResponder::new(search, Arc::clone(&llm)).with_limits(
                    config.search.max_results,
                    Duration::from_secs(config.search.timeout_secs),
                    llm_timeout,
                ),
            ));
        }

        let flow = Arc::new(NutritionFlow::new(llm, llm_timeout));

        Self::new(
            candidates,
            flow,
            Duration::from_secs(config.router.responder_timeout_secs),
        )
    }

    /// Build the standard router with the providers named in `config`.
    ///
    /// Missing search credentials disable the search responder rather than
    /// failing startup.
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let llm: Arc<dyn LLMProvider> = Arc::from(build_provider(&config.llm)?);

        let search: Option<Arc<dyn SearchProvider>> = if config.search.enabled {
            match GoogleSearch::from_config(&config.search) {
                Ok(provider) => Some(Arc::new(provider)),
                Err(e) => {
                    tracing::warn!("Nutrition search disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self::standard(config, llm, search))
    }

    /// Candidate names in priority order
    pub fn candidate_names(&self) -> Vec<&'static str> {
        self.candidates.iter().map(|c| c.name).collect()
    }

    /// Answer the newest user turn.
    ///
    /// Non-terminal candidates that fail, time out or return blank text are
    /// treated as skipping. A history that does not end with a user turn goes
    /// straight to the terminal candidate.
    pub async fn handle_turn(&self, history: &[Turn]) -> RouteOutcome {
        let span = tracing::info_span!("turn", id = %uuid::Uuid::new_v4(), turns = history.len());
        self.dispatch(history).instrument(span).await
    }

    async fn dispatch(&self, history: &[Turn]) -> RouteOutcome {
        let user_turn = history.last().is_some_and(Turn::is_user);

        for candidate in &self.candidates {
            if candidate.terminal {
                return self.run_terminal(candidate, history).await;
            }
            if !user_turn {
                continue;
            }

            let decision = tokio::time::timeout(
                self.responder_timeout,
                candidate.responder.respond(history),
            )
            .await;

            match decision {
                Ok(Ok(Reply::Text(text))) if !text.trim().is_empty() => {
                    tracing::debug!(responder = candidate.name, decision = "answer");
                    tracing::info!("Turn answered by {}", candidate.name);
                    return RouteOutcome {
                        responder: candidate.name,
                        text,
                    };
                }
                Ok(Ok(Reply::Text(_))) => {
                    tracing::debug!(responder = candidate.name, decision = "skip", "Blank reply");
                }
                Ok(Ok(Reply::Skip)) => {
                    tracing::debug!(responder = candidate.name, decision = "skip");
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        responder = candidate.name,
                        decision = "skip",
                        "Responder failed: {:#}",
                        e
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        responder = candidate.name,
                        decision = "skip",
                        "Responder timed out after {}s",
                        self.responder_timeout.as_secs()
                    );
                }
            }
        }

        // `new` always appends a terminal candidate
        RouteOutcome {
            responder: "none",
            text: APOLOGY_REPLY.to_string(),
        }
    }

    async fn run_terminal(&self, candidate: &Candidate, history: &[Turn]) -> RouteOutcome {
        let text = match candidate.responder.respond(history).await {
            Ok(Reply::Text(text)) if !text.trim().is_empty() => text,
            Ok(_) => {
                tracing::error!("Terminal responder {} produced no reply", candidate.name);
                APOLOGY_REPLY.to_string()
            }
            Err(e) => {
                tracing::error!("Terminal responder {} failed: {:#}", candidate.name, e);
                APOLOGY_REPLY.to_string()
            }
        };

        tracing::info!("Turn answered by {}", candidate.name);
        RouteOutcome {
            responder: candidate.name,
            text,
        }
    }
}
