//! Plan Generator
//!
//! Second pipeline stage. Validates the hand-off from the extractor, applies
//! the safety gate, computes macros and assembles the one-day meal plan.
//! Food items are suggested by the generation capability as JSON; any slot
//! the model gets wrong is filled from a small built-in catalog instead.

use sdk::errors::EngineError;
use sdk::types::{MacroBreakdown, NutritionProfile, Turn, SAFE_CALORIE_RANGE};
use serde_json::Value;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use super::extractor::CALORIES_QUESTION;
use crate::llm::{find_json_object, generate_with_timeout, LLMProvider};
use crate::tools::{calculate_macros, meal_split, MealSlot};

pub const SAFETY_MESSAGE: &str = "A daily calorie target outside typical safe ranges may pose \
health risks. Please consult a healthcare provider or registered dietitian before making such \
extreme changes to your intake. I'm not able to safely create a meal plan for this calorie level.";

pub const DISCLAIMER: &str = "*Disclaimer: This information is for general purposes only and \
not medical advice. For personalized nutrition, please consult a registered dietitian or \
healthcare provider.*";

const MIN_ITEMS: usize = 2;
const MAX_ITEMS: usize = 4;

const MEAT: u8 = 1;
const FISH: u8 = 1 << 1;
const DAIRY: u8 = 1 << 2;
const EGG: u8 = 1 << 3;
const NUTS: u8 = 1 << 4;
const GLUTEN: u8 = 1 << 5;

struct CatalogItem {
    name: &'static str,
    contains: u8,
}

const fn item(name: &'static str, contains: u8) -> CatalogItem {
    CatalogItem { name, contains }
}

// Every slot keeps at least two entries free of all tracked ingredients
const BREAKFAST: &[CatalogItem] = &[
    item("Greek yogurt with berries", DAIRY),
    item("Oatmeal with sliced banana", 0),
    item("Scrambled eggs with spinach", EGG),
    item("Wholegrain toast", GLUTEN),
    item("Tofu scramble with peppers", 0),
    item("Fresh orange", 0),
];

const ELEVENSES: &[CatalogItem] = &[
    item("Apple slices with peanut butter", NUTS),
    item("Cottage cheese with pineapple", DAIRY),
    item("Hummus with carrot sticks", 0),
    item("Rice cakes with avocado", 0),
    item("Fresh pear", 0),
];

const LUNCH: &[CatalogItem] = &[
    item("Grilled chicken salad with olive oil", MEAT),
    item("Quinoa bowl with chickpeas and roasted vegetables", 0),
    item("Tuna salad on mixed greens", FISH),
    item("Lentil soup", 0),
    item("Wholegrain wrap with turkey", MEAT | GLUTEN),
    item("Mixed green salad", 0),
];

const LINNER: &[CatalogItem] = &[
    item("Boiled egg", EGG),
    item("Greek yogurt", DAIRY),
    item("Edamame", 0),
    item("Banana", 0),
    item("Roasted chickpeas", 0),
];

const DINNER: &[CatalogItem] = &[
    item("Baked salmon", FISH),
    item("Brown rice", 0),
    item("Steamed broccoli", 0),
    item("Grilled chicken breast", MEAT),
    item("Tofu stir-fry with vegetables", 0),
    item("Black bean chili", 0),
];

const SUPPER: &[CatalogItem] = &[
    item("Cottage cheese with berries", DAIRY),
    item("Kiwi", 0),
    item("Handful of walnuts", NUTS),
    item("Soy yogurt", 0),
    item("Herbal tea", 0),
];

/// One meal of the plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMeal {
    pub slot: MealSlot,
    pub calories: u32,
    pub items: Vec<String>,
}

/// A complete one-day plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealPlan {
    pub profile: NutritionProfile,
    pub macros: MacroBreakdown,
    pub meals: Vec<PlannedMeal>,
}

impl MealPlan {
    /// Render the plan as the final markdown reply
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Here is your one-day meal plan.\n");
        let _ = writeln!(
            out,
            "**Calorie target:** {} kcal per day",
            self.profile.daily_calories
        );
        let _ = writeln!(
            out,
            "**Dietary preferences:** {}\n",
            self.profile.dietary_preferences
        );

        let _ = writeln!(out, "**Recommended Macros**");
        let _ = writeln!(out, "- Protein: {} g", self.macros.protein_g);
        let _ = writeln!(out, "- Carbohydrates: {} g", self.macros.carbs_g);
        let _ = writeln!(out, "- Fats: {} g\n", self.macros.fats_g);

        for meal in &self.meals {
            let _ = writeln!(out, "**{} (~{} kcal)**", meal.slot, meal.calories);
            for item in &meal.items {
                let _ = writeln!(out, "- {}", item);
            }
            out.push('\n');
        }

        out.push_str(DISCLAIMER);
        out
    }
}

/// What the plan generator decided for a hand-off
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanOutcome {
    /// Unusable hand-off; the previous assistant message, verbatim
    Echo(String),

    /// Target outside the safe range
    Unsafe(String),

    Planned(MealPlan),
}

impl PlanOutcome {
    pub fn into_text(self) -> String {
        match self {
            PlanOutcome::Echo(text) | PlanOutcome::Unsafe(text) => text,
            PlanOutcome::Planned(plan) => plan.to_markdown(),
        }
    }
}

pub struct PlanGenerator {
    llm: Arc<dyn LLMProvider>,
    timeout: Duration,
}

impl PlanGenerator {
    pub fn new(llm: Arc<dyn LLMProvider>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Turn the extractor's hand-off into a reply.
    ///
    /// `input` is untyped on purpose: anything that is not a well-formed
    /// profile is answered by repeating the last assistant message. Only a
    /// failing generation call is an error.
    pub async fn generate(
        &self,
        input: Option<&Value>,
        history: &[Turn],
    ) -> Result<PlanOutcome, EngineError> {
        let Some(profile) = input.and_then(NutritionProfile::from_value) else {
            tracing::warn!("Plan input is not a usable profile, repeating last message");
            let echo = last_assistant_text(history).unwrap_or(CALORIES_QUESTION);
            return Ok(PlanOutcome::Echo(echo.to_string()));
        };

        if !SAFE_CALORIE_RANGE.contains(&profile.daily_calories) {
            tracing::info!(
                daily_calories = profile.daily_calories,
                "Calorie target rejected by safety gate"
            );
            return Ok(PlanOutcome::Unsafe(SAFETY_MESSAGE.to_string()));
        }

        let macros = calculate_macros(profile.daily_calories);
        let split = meal_split(profile.daily_calories);

        let instruction = item_instruction(&profile, &split);
        let raw = generate_with_timeout(self.llm.as_ref(), &instruction, history, self.timeout)
            .await?;
        let suggested = find_json_object(&raw);
        if suggested.is_none() {
            let err = EngineError::MalformedOutput("meal suggestions are not a JSON object".into());
            tracing::warn!("{}; using catalog for all slots", err);
        }

        let excluded = excluded_ingredients(&profile.dietary_preferences);
        let meals = split
            .into_iter()
            .map(|(slot, calories)| {
                let items = suggested
                    .as_ref()
                    .and_then(|value| slot_items(value, slot))
                    .unwrap_or_else(|| {
                        tracing::debug!("Filling {} from catalog", slot);
                        catalog_items(slot, excluded)
                    });
                PlannedMeal {
                    slot,
                    calories,
                    items,
                }
            })
            .collect();

        Ok(PlanOutcome::Planned(MealPlan {
            profile,
            macros,
            meals,
        }))
    }
}

fn last_assistant_text(history: &[Turn]) -> Option<&str> {
    history
        .iter()
        .rev()
        .find(|turn| !turn.is_user())
        .map(|turn| turn.text.as_str())
}

fn item_instruction(profile: &NutritionProfile, split: &[(MealSlot, u32)]) -> String {
    let mut slots = String::new();
    for (slot, calories) in split {
        let _ = writeln!(slots, "- {} (~{} kcal)", slot, calories);
    }

    format!(
        "You are a friendly nutrition planning assistant. Suggest simple, realistic foods \
         (e.g., \"oatmeal with berries\", \"grilled chicken with vegetables\") for a one-day \
         meal plan of {} kcal.\n\
         Dietary preferences: {}. Exclude every food these preferences restrict.\n\
         Give {} to {} foods for each of these meals:\n{}\n\
         Output ONLY a JSON object mapping each meal name to an array of food strings, e.g.\n\
         {{\"Breakfast\": [\"Oatmeal with berries\", \"Greek yogurt\"], \"Elevenses\": [...]}}\n\
         No markdown, no explanation.",
        profile.daily_calories,
        profile.dietary_preferences,
        MIN_ITEMS,
        MAX_ITEMS,
        slots
    )
}

/// Items the model suggested for a slot, if they are 2-4 non-empty strings
fn slot_items(value: &Value, slot: MealSlot) -> Option<Vec<String>> {
    let entries = value
        .as_object()?
        .iter()
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(slot.name()))
        .map(|(_, entries)| entries)?
        .as_array()?;

    if !(MIN_ITEMS..=MAX_ITEMS).contains(&entries.len()) {
        return None;
    }

    entries
        .iter()
        .map(|entry| {
            let text = entry.as_str()?.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .collect()
}

/// Ingredient flags a preference text rules out
fn excluded_ingredients(preferences: &str) -> u8 {
    let lowered = preferences.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| lowered.contains(w));

    let mut excluded = 0;
    if mentions(&["vegan", "plant-based", "plant based"]) {
        excluded |= MEAT | FISH | DAIRY | EGG;
    }
    if mentions(&["vegetarian"]) {
        excluded |= MEAT | FISH;
    }
    if mentions(&["pescatarian", "pescetarian", "meat"]) {
        excluded |= MEAT;
    }
    if mentions(&["fish", "seafood"]) {
        excluded |= FISH;
    }
    if mentions(&["dairy", "lactose", "milk"]) {
        excluded |= DAIRY;
    }
    if mentions(&["egg"]) {
        excluded |= EGG;
    }
    if mentions(&["nut"]) {
        excluded |= NUTS;
    }
    if mentions(&["gluten", "wheat", "celiac", "coeliac"]) {
        excluded |= GLUTEN;
    }
    excluded
}

fn catalog_items(slot: MealSlot, excluded: u8) -> Vec<String> {
    let (catalog, count) = match slot {
        MealSlot::Breakfast => (BREAKFAST, 3),
        MealSlot::Elevenses => (ELEVENSES, 2),
        MealSlot::Lunch => (LUNCH, 3),
        MealSlot::Linner => (LINNER, 2),
        MealSlot::Dinner => (DINNER, 3),
        MealSlot::Supper => (SUPPER, 2),
    };

    catalog
        .iter()
        .filter(|entry| entry.contains & excluded == 0)
        .take(count)
        .map(|entry| entry.name.to_string())
        .collect()
}
