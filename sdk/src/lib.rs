//! NutriPlan SDK
//!
//! Shared library providing the error taxonomy and the conversation and
//! nutrition types used by the engine and its integration tests.

/// Error types and handling
pub mod errors;

/// Conversation and profile types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, NutriErrorExt};
pub use types::{
    MacroBreakdown, NutritionProfile, Role, Turn, EXTRACTION_CALORIE_RANGE, SAFE_CALORIE_RANGE,
};
