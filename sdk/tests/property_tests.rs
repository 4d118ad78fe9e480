use proptest::prelude::*;
use sdk::errors::{EngineError, NutriErrorExt};
use sdk::types::NutritionProfile;

proptest! {
    #[test]
    fn test_error_user_hint_completeness(error_str in "\\PC*") {
        // Hints are static strings; the raw detail must never leak into them
        let errs = vec![
            EngineError::Config(error_str.clone()),
            EngineError::Generation(error_str.clone()),
            EngineError::Search(error_str.clone()),
            EngineError::MalformedOutput(error_str.clone()),
        ];

        for err in errs {
            let hint = err.user_hint();
            prop_assert!(!hint.is_empty());
            if error_str.len() > 12 {
                prop_assert!(!hint.contains(&error_str));
            }
        }
    }
}

proptest! {
    #[test]
    fn test_profile_value_roundtrip(
        calories in 0u32..=10_000,
        preferences in "[a-z][a-z ,-]{0,30}",
    ) {
        let profile = NutritionProfile::new(calories, preferences.trim());
        let parsed = NutritionProfile::from_value(&profile.to_value());
        prop_assert_eq!(parsed, Some(profile));
    }
}
