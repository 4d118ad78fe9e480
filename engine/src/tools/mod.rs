//! Built-in native tools
//!
//! Deterministic helpers the planner calls directly instead of asking the
//! generation capability to compute them.

pub mod macros;

pub use macros::{calculate_macros, meal_split, MealSlot};
