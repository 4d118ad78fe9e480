//! Conductor
//!
//! Turn routing and the two-stage nutrition pipeline (profile extraction,
//! then plan generation).

pub mod extractor;
pub mod pipeline;
pub mod planner;
pub mod router;

pub use extractor::{extract, Extraction, PartialProfile, ProfileExtractor};
pub use pipeline::{FlowResult, FlowState, NutritionFlow};
pub use planner::{MealPlan, PlanGenerator, PlanOutcome, PlannedMeal};
pub use router::{Candidate, RouteOutcome, TurnRouter};
