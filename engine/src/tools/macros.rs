//! Macro Calculator
//!
//! Pure, deterministic conversion from a daily calorie target to grams of
//! protein, carbohydrate and fat using a fixed 30/40/30 energy split
//! (4 kcal/g for protein and carbohydrate, 9 kcal/g for fat).

use sdk::types::MacroBreakdown;
use std::fmt;

/// Share of daily energy from protein
const PROTEIN_SHARE: f64 = 0.30;

/// Share of daily energy from carbohydrate
const CARB_SHARE: f64 = 0.40;

/// Share of daily energy from fat
const FAT_SHARE: f64 = 0.30;

const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARB: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

/// Calculate daily macronutrients in grams from daily calories.
///
/// Each product is evaluated in double precision as `share * kcal / factor`
/// and rounded half-to-even, so `.5` results go to the even neighbour
/// (`1020 kcal` gives `76.5 -> 76` g protein).
///
/// Callers validate the input; the planner only calls this after the safety
/// gate has accepted the target.
pub fn calculate_macros(daily_calories: u32) -> MacroBreakdown {
    tracing::info!("Calculating macros for daily_calories={}", daily_calories);

    let kcal = f64::from(daily_calories);

    MacroBreakdown {
        protein_g: grams(PROTEIN_SHARE * kcal / KCAL_PER_G_PROTEIN),
        carbs_g: grams(CARB_SHARE * kcal / KCAL_PER_G_CARB),
        fats_g: grams(FAT_SHARE * kcal / KCAL_PER_G_FAT),
    }
}

fn grams(value: f64) -> u32 {
    value.round_ties_even() as u32
}

/// Named meal of the one-day plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MealSlot {
    Breakfast,
    Elevenses,
    Lunch,
    Linner,
    Dinner,
    Supper,
}

impl MealSlot {
    /// All slots in serving order
    pub const ALL: [MealSlot; 6] = [
        MealSlot::Breakfast,
        MealSlot::Elevenses,
        MealSlot::Lunch,
        MealSlot::Linner,
        MealSlot::Dinner,
        MealSlot::Supper,
    ];

    /// Percentage of the daily target assigned to this slot
    pub fn percent(self) -> u32 {
        match self {
            MealSlot::Breakfast => 20,
            MealSlot::Elevenses => 10,
            MealSlot::Lunch => 25,
            MealSlot::Linner => 10,
            MealSlot::Dinner => 25,
            MealSlot::Supper => 10,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Elevenses => "Elevenses",
            MealSlot::Lunch => "Lunch",
            MealSlot::Linner => "Linner",
            MealSlot::Dinner => "Dinner",
            MealSlot::Supper => "Supper",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Split a daily target across the six slots (20/10/25/10/25/10).
///
/// Each share is rounded half-up to whole kcal.
pub fn meal_split(daily_calories: u32) -> Vec<(MealSlot, u32)> {
    MealSlot::ALL
        .iter()
        .map(|&slot| (slot, (daily_calories * slot.percent() + 50) / 100))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macros_for_2000() {
        assert_eq!(
            calculate_macros(2000),
            MacroBreakdown {
                protein_g: 150,
                carbs_g: 200,
                fats_g: 67,
            }
        );
    }

    #[test]
    fn test_macros_for_1800() {
        assert_eq!(
            calculate_macros(1800),
            MacroBreakdown {
                protein_g: 135,
                carbs_g: 180,
                fats_g: 60,
            }
        );
    }

    #[test]
    fn test_macros_round_half_to_even() {
        // 0.30 * 1020 / 4 = 76.5
        assert_eq!(calculate_macros(1020).protein_g, 76);
        assert_eq!(calculate_macros(1020).carbs_g, 102);
        assert_eq!(calculate_macros(1020).fats_g, 34);
    }

    #[test]
    fn test_slot_percentages_sum_to_100() {
        let total: u32 = MealSlot::ALL.iter().map(|s| s.percent()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_meal_split_for_1800() {
        let split: Vec<u32> = meal_split(1800).into_iter().map(|(_, kcal)| kcal).collect();
        assert_eq!(split, vec![360, 180, 450, 180, 450, 180]);
    }

    #[test]
    fn test_meal_split_order_and_rounding() {
        let split = meal_split(1234);
        assert_eq!(split[0], (MealSlot::Breakfast, 247));
        assert_eq!(split[1], (MealSlot::Elevenses, 123));
        assert_eq!(split[2], (MealSlot::Lunch, 309));
        assert_eq!(split[5], (MealSlot::Supper, 123));
    }
}
