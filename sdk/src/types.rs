//! Conversation and nutrition types shared across the engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Calorie values worth remembering when scanning a conversation
pub const EXTRACTION_CALORIE_RANGE: RangeInclusive<u32> = 200..=4000;

/// Calorie targets the planner is willing to act on
pub const SAFE_CALORIE_RANGE: RangeInclusive<u32> = 1000..=5000;

/// Author of a turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message exchanged between the user and the assistant.
///
/// Turns are never edited once appended to a history; the session layer
/// owns the history and the engine only reads it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
}

impl Turn {
    /// Create a user turn
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create an assistant turn
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

/// Structured profile handed from the extractor to the plan generator
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NutritionProfile {
    /// Daily calorie target in kcal
    pub daily_calories: u32,

    /// Free-text preferences, or "none"
    pub dietary_preferences: String,
}

impl NutritionProfile {
    pub fn new(daily_calories: u32, dietary_preferences: impl Into<String>) -> Self {
        Self {
            daily_calories,
            dietary_preferences: dietary_preferences.into(),
        }
    }

    /// Validate an untyped stage hand-off.
    ///
    /// Returns `None` unless both fields are present, `daily_calories` is a
    /// non-negative integer that fits in `u32` and `dietary_preferences` is a
    /// non-blank string.
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let calories = value.get("daily_calories")?.as_u64()?;
        let daily_calories = u32::try_from(calories).ok()?;

        let preferences = value.get("dietary_preferences")?.as_str()?.trim();
        if preferences.is_empty() {
            return None;
        }

        Some(Self::new(daily_calories, preferences))
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::json!({
            "daily_calories": self.daily_calories,
            "dietary_preferences": self.dietary_preferences,
        })
    }
}

/// Grams of each macronutrient per day
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MacroBreakdown {
    pub protein_g: u32,
    pub carbs_g: u32,
    pub fats_g: u32,
}
