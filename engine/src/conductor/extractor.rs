//! Profile Extractor
//!
//! First pipeline stage. Re-derives the nutrition profile from the whole
//! conversation on every call; nothing is cached between turns, so the
//! result is a pure function of the history.
//!
//! Only user turns that state something are scanned; food-fact and help
//! questions are answered elsewhere and never feed the profile. The most
//! recent calorie statement wins. Preference labels accumulate across turns:
//! a newer label only replaces an older one it conflicts with, and an
//! explicit "none" clears everything before it. A later turn can change a
//! value but can never erase one.

use regex::Regex;
use sdk::types::{NutritionProfile, Turn, EXTRACTION_CALORIE_RANGE};
use std::ops::RangeInclusive;
use std::sync::OnceLock;

use crate::responders::help::is_help_request;
use crate::responders::normalize;
use crate::responders::search::is_food_fact_question;

pub const CALORIES_QUESTION: &str =
    "How many calories per day would you like to consume? (e.g., 1800 or 2000)";

pub const PREFERENCES_QUESTION: &str = "Do you have any dietary preferences or restrictions \
(e.g., vegetarian, halal, gluten-free, no nuts)? If none, you can say 'none'.";

/// Preference value meaning "no restriction"
pub const NO_PREFERENCE: &str = "none";

/// Units that make a number something other than a calorie amount
const NON_CALORIE_UNITS: &[&str] = &[
    "g", "gr", "gram", "grams", "kg", "kgs", "kilo", "kilos", "lb", "lbs", "pound", "pounds",
    "oz", "mg", "mcg", "ml", "l", "liter", "liters", "litre", "litres", "cm", "m", "km", "ft",
    "mi", "miles", "year", "years", "yo", "month", "months", "week", "weeks", "day", "days",
    "hour", "hours", "hr", "hrs", "min", "mins", "minute", "minutes", "step", "steps", "%",
    "percent", "am", "pm",
];

const CALORIE_UNITS: &[&str] = &[
    "cal",
    "cals",
    "calorie",
    "calories",
    "kcal",
    "kcals",
    "kilocalorie",
    "kilocalories",
];

/// Words that turn a following year-like number into a date
const YEAR_CUES: &[&str] = &[
    "since", "in", "from", "born", "year", "until", "till", "circa", "back",
];

const YEAR_LIKE: RangeInclusive<u32> = 1900..=2100;

/// Mutually exclusive eating patterns, one group per slice
const EATING_PATTERNS: &[&[&str]] = &[
    &[
        "vegetarian",
        "vegan",
        "pescatarian",
        "pescetarian",
        "flexitarian",
        "plant-based",
    ],
    &["keto", "ketogenic", "paleo", "mediterranean"],
];

/// Whole replies that decline preferences when preferences were just asked
const BARE_DECLINES: &[&str] = &[
    "no",
    "nope",
    "nah",
    "no thanks",
    "no thank you",
    "not really",
    "n a",
];

static CALORIE_PATTERN: OnceLock<Regex> = OnceLock::new();
static PREFERENCE_PATTERNS: OnceLock<PreferencePatterns> = OnceLock::new();

struct PreferencePatterns {
    diet: Regex,
    free_from: Regex,
    exclusion: Regex,
    allergy: Regex,
    none: Regex,
}

fn calorie_pattern() -> &'static Regex {
    CALORIE_PATTERN.get_or_init(|| {
        // number (optionally with thousands separators), optional decimals,
        // optional unit word
        Regex::new(r"(?i)\b(\d{1,3}(?:,\d{3})+|\d+)(\.\d+)?(?:\s*(%|[a-z]+))?")
            .expect("Invalid calorie pattern")
    })
}

fn preference_patterns() -> &'static PreferencePatterns {
    PREFERENCE_PATTERNS.get_or_init(|| PreferencePatterns {
        diet: Regex::new(
            r"\b(vegetarian|vegan|pescatarian|pescetarian|halal|kosher|keto|ketogenic|paleo|mediterranean|flexitarian|diabetic|low[- ]carb|low[- ]fat|low[- ]sodium|low[- ]sugar|high[- ]protein|plant[- ]based)\b",
        )
        .expect("Invalid diet pattern"),
        free_from: Regex::new(
            r"\b(gluten|dairy|nut|nuts|peanut|lactose|sugar|egg|soy|wheat|meat|pork|fish|shellfish|grain)[- ]free\b",
        )
        .expect("Invalid free-from pattern"),
        exclusion: Regex::new(
            r"\b(?:no|without|avoid|avoiding|allergic to|allergy to|intolerant to|can't eat|cannot eat|don't eat|do not eat)\s+(?:any\s+)?(tree nuts|nuts|nut|peanuts|peanut|dairy|milk|lactose|gluten|wheat|eggs|egg|soy|fish|shellfish|seafood|red meat|meat|pork|beef|chicken|sugar|beans|mushrooms|onions)\b",
        )
        .expect("Invalid exclusion pattern"),
        allergy: Regex::new(
            r"\b(tree nut|nut|peanut|dairy|milk|lactose|gluten|wheat|egg|soy|fish|shellfish|seafood)\s+(?:allergy|allergies|intolerance)\b",
        )
        .expect("Invalid allergy pattern"),
        none: Regex::new(
            r"\b(?:none|no (?:dietary |special )?(?:restrictions?|preferences?|allergies|requirements)|nothing special|no special diet|i eat (?:everything|anything)|anything (?:is fine|goes)|^nothing$|^anything$)\b",
        )
        .expect("Invalid no-preference pattern"),
    })
}

/// Fields recovered from a conversation so far
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialProfile {
    pub daily_calories: Option<u32>,
    pub dietary_preferences: Option<String>,
}

impl PartialProfile {
    /// Complete profile, when both fields are known
    pub fn complete(&self) -> Option<NutritionProfile> {
        let calories = self.daily_calories?;
        let preferences = self.dietary_preferences.as_deref()?;
        Some(NutritionProfile::new(calories, preferences))
    }
}

/// Result of one extraction stage run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// Calories unknown; halt with this question
    NeedCalories(String),

    /// Calories known, preferences unknown; halt with this question
    NeedPreferences(String),

    /// Both fields known
    Ready(NutritionProfile),
}

/// What one message says about dietary preferences
#[derive(Debug, Clone, PartialEq, Eq)]
enum PreferenceStatement {
    /// Restrictions in order of appearance, without duplicates
    Labels(Vec<String>),

    /// Explicitly no restriction
    NoPreference,
}

/// Scan the conversation for a calorie target and dietary preferences
pub fn extract(history: &[Turn]) -> PartialProfile {
    let daily_calories = history
        .iter()
        .rev()
        .filter(|turn| is_statement(turn))
        .find_map(|turn| scan_calories(&turn.text));

    let mut labels: Vec<String> = Vec::new();
    let mut declined = false;
    for (i, turn) in history.iter().enumerate() {
        if !is_statement(turn) {
            continue;
        }

        let asked = i > 0 && asked_for_preferences(&history[i - 1]);
        match preference_statement(&turn.text, asked) {
            Some(PreferenceStatement::Labels(found)) => {
                labels.retain(|old| !found.iter().any(|new| conflicts(old, new)));
                for label in found {
                    if !labels.contains(&label) {
                        labels.push(label);
                    }
                }
            }
            Some(PreferenceStatement::NoPreference) => {
                labels.clear();
                declined = true;
            }
            None => {}
        }
    }

    let dietary_preferences = if !labels.is_empty() {
        Some(labels.join(", "))
    } else if declined {
        Some(NO_PREFERENCE.to_string())
    } else {
        None
    };

    PartialProfile {
        daily_calories,
        dietary_preferences,
    }
}

/// User turn that states something rather than asking a question another
/// responder answers
fn is_statement(turn: &Turn) -> bool {
    turn.is_user() && !is_food_fact_question(&turn.text) && !is_help_request(&turn.text)
}

/// Two different labels from the same eating-pattern group
fn conflicts(old: &str, new: &str) -> bool {
    old != new
        && EATING_PATTERNS
            .iter()
            .any(|group| group.contains(&old) && group.contains(&new))
}

/// Calorie target stated in one message.
///
/// Candidates are whole numbers inside the extraction range that are not
/// followed by a non-calorie unit. Untagged year-like numbers after a date
/// word ("since 2015", "born in 1990") are ignored. A candidate tagged with a calorie unit
/// beats untagged ones; otherwise the last candidate wins.
pub fn scan_calories(text: &str) -> Option<u32> {
    let mut tagged = None;
    let mut untagged = None;

    for caps in calorie_pattern().captures_iter(text) {
        if caps.get(2).is_some() {
            continue;
        }

        let unit = caps.get(3).map(|m| m.as_str().to_lowercase());
        if let Some(unit) = unit.as_deref() {
            if NON_CALORIE_UNITS.contains(&unit) {
                continue;
            }
        }

        let digits = caps[1].replace(',', "");
        let Ok(value) = digits.parse::<u32>() else {
            continue;
        };
        if !EXTRACTION_CALORIE_RANGE.contains(&value) {
            continue;
        }

        match unit.as_deref() {
            Some(unit) if CALORIE_UNITS.contains(&unit) => tagged = Some(value),
            _ => {
                let start = caps.get(0).map_or(0, |m| m.start());
                if YEAR_LIKE.contains(&value) && follows_year_cue(text, start) {
                    continue;
                }
                untagged = Some(value);
            }
        }
    }

    tagged.or(untagged)
}

fn follows_year_cue(text: &str, at: usize) -> bool {
    text[..at]
        .split_whitespace()
        .next_back()
        .map(|word| {
            word.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .is_some_and(|word| YEAR_CUES.contains(&word.as_str()))
}

/// Dietary preferences stated in one message, joined by ", " in order of
/// appearance. An explicit "no restriction" yields [`NO_PREFERENCE`] unless
/// the same message also names a restriction.
pub fn scan_preferences(text: &str, asked_for_preferences: bool) -> Option<String> {
    match preference_statement(text, asked_for_preferences)? {
        PreferenceStatement::Labels(labels) => Some(labels.join(", ")),
        PreferenceStatement::NoPreference => Some(NO_PREFERENCE.to_string()),
    }
}

fn preference_statement(text: &str, asked_for_preferences: bool) -> Option<PreferenceStatement> {
    let lowered = text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");
    let patterns = preference_patterns();

    let mut found: Vec<(usize, String)> = Vec::new();
    for caps in patterns.diet.captures_iter(&lowered) {
        found.push((caps.get(0).map_or(0, |m| m.start()), caps[1].replace(' ', "-")));
    }
    for caps in patterns.free_from.captures_iter(&lowered) {
        found.push((caps.get(0).map_or(0, |m| m.start()), format!("{}-free", &caps[1])));
    }
    for caps in patterns.exclusion.captures_iter(&lowered) {
        found.push((caps.get(0).map_or(0, |m| m.start()), format!("no {}", &caps[1])));
    }
    for caps in patterns.allergy.captures_iter(&lowered) {
        found.push((caps.get(0).map_or(0, |m| m.start()), format!("no {}", &caps[1])));
    }

    if !found.is_empty() {
        found.sort_by_key(|(at, _)| *at);
        let mut labels: Vec<String> = Vec::new();
        for (_, label) in found {
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        return Some(PreferenceStatement::Labels(labels));
    }

    let normalized = normalize(text);
    if patterns.none.is_match(&normalized)
        || (asked_for_preferences && BARE_DECLINES.contains(&normalized.as_str()))
    {
        return Some(PreferenceStatement::NoPreference);
    }

    None
}

/// Assistant turn that asked only for preferences
fn asked_for_preferences(turn: &Turn) -> bool {
    !turn.is_user() && turn.text.trim() == PREFERENCES_QUESTION
}

/// First pipeline stage
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileExtractor;

impl ProfileExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, history: &[Turn]) -> Extraction {
        let partial = extract(history);
        tracing::debug!(
            daily_calories = ?partial.daily_calories,
            dietary_preferences = ?partial.dietary_preferences,
            "Extracted profile fields"
        );

        match (partial.daily_calories, partial.dietary_preferences) {
            (None, _) => Extraction::NeedCalories(CALORIES_QUESTION.to_string()),
            (Some(_), None) => Extraction::NeedPreferences(PREFERENCES_QUESTION.to_string()),
            (Some(calories), Some(preferences)) => {
                Extraction::Ready(NutritionProfile::new(calories, preferences))
            }
        }
    }
}
