//! Property tests for score normalisation.

use proptest::prelude::*;
use repo_insights::analysis::types::{FALLBACK_SCORE, QualityScore};
use repo_insights::llm::parse_score_reply;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10_000))]

    #[test]
    fn score_always_in_range(value in any::<f64>()) {
        let score = QualityScore::new(value, "feedback");
        prop_assert!((0.0..=10.0).contains(&score.value));
        if !value.is_finite() {
            prop_assert!(score.is_fallback);
        }
    }

    #[test]
    fn fallback_is_exactly_five(reason in ".*") {
        let score = QualityScore::fallback(reason);
        prop_assert_eq!(score.value, FALLBACK_SCORE);
        prop_assert_eq!(score.value, 5.0);
        prop_assert!(score.is_fallback);
    }

    #[test]
    fn parsed_replies_in_range(value in -1.0e6f64..1.0e6) {
        let reply = format!(r#"{{"score": {value}, "feedback": "x"}}"#);
        let score = parse_score_reply(&reply).unwrap();
        prop_assert!((0.0..=10.0).contains(&score.value));
        prop_assert!(!score.is_fallback);
    }

    #[test]
    fn arbitrary_replies_never_panic(reply in ".{0,200}") {
        if let Ok(score) = parse_score_reply(&reply) {
            prop_assert!((0.0..=10.0).contains(&score.value));
        }
    }
}
