//! Property-based tests (fuzzing) for the scoring and budget arithmetic.
//!
//! Uses proptest to generate random candidate populations and verify the
//! selection/budget invariants hold for all of them, never just the
//! hand-picked cases.
//!
//! Run with: `cargo test --test proptest_fuzz`

use proptest::prelude::*;
use serde_json::{json, Map};

use repocache::{
    BySizeStrategy, CacheObject, DeletionStrategy, OldestFirstStrategy, PurposeTag,
    SelectionBudget, VolumeStatus,
};

// =============================================================================
// Strategies for generating test data
// =============================================================================

/// Generate a cached object with a bounded random size and priority.
fn cache_object_strategy() -> impl Strategy<Value = CacheObject> {
    ("[a-z]{1,16}", -1i64..5_000_000_000i64, 1i64..20i64).prop_map(|(name, size, priority)| {
        let mut md = Map::new();
        md.insert("size".into(), json!(size));
        md.insert("priority".into(), json!(priority));
        let mut co = CacheObject::with_metadata(name, "cv0", md);
        co.cached = true;
        co
    })
}

fn population_strategy() -> impl Strategy<Value = Vec<CacheObject>> {
    prop::collection::vec(cache_object_strategy(), 0..50)
}

// =============================================================================
// Budget arithmetic
// =============================================================================

proptest! {
    /// The accumulated total is exactly the sum of the positive sizes seen,
    /// regardless of order or magnitude.
    #[test]
    fn budget_total_is_sum_of_positive_sizes(sizes in prop::collection::vec(-10i64..10_000i64, 0..100)) {
        let mut budget = SelectionBudget::new(i64::MAX);
        for s in &sizes {
            budget.record(*s);
        }
        let expected: i64 = sizes.iter().filter(|s| **s > 0).sum();
        prop_assert_eq!(budget.total(), expected);
    }

    /// limit_reached is strictly "total > limit": at or below the limit it
    /// stays false, and reset always restores false.
    #[test]
    fn budget_limit_is_strict_and_resettable(limit in 0i64..100_000, total in 0i64..200_000) {
        let mut budget = SelectionBudget::new(limit);
        budget.record(total.max(1));
        prop_assert_eq!(budget.limit_reached(), total.max(1) > limit);
        budget.reset();
        prop_assert!(!budget.limit_reached());
        prop_assert_eq!(budget.total(), 0);
    }

    /// Scoring a population accumulates each positive size exactly once,
    /// independent of the score values produced.
    #[test]
    fn scoring_accumulates_sizes_independent_of_scores(mut objs in population_strategy()) {
        let mut strat = BySizeStrategy::new(i64::MAX);
        for co in objs.iter_mut() {
            strat.score(co);
        }
        let expected: i64 = objs.iter().map(|o| o.size().max(0)).sum();
        prop_assert_eq!(strat.total_size(), expected);
    }
}

// =============================================================================
// By-size scoring
// =============================================================================

proptest! {
    /// The by-size score is exactly size/normalizer for known sizes and
    /// never negative.
    #[test]
    fn by_size_score_is_size_over_normalizer(co in cache_object_strategy(), norm in 1.0f64..1e10) {
        let strat = BySizeStrategy::with_normalizing_size(1000, norm);
        let score = strat.calculate_score(&co);
        if co.size() >= 0 {
            prop_assert_eq!(score, co.size() as f64 / norm);
        }
        prop_assert!(score >= 0.0);
    }

    /// After sorting, scores are non-increasing, so the biggest objects come
    /// out first.
    #[test]
    fn by_size_sort_is_descending(mut objs in population_strategy()) {
        let mut strat = BySizeStrategy::new(i64::MAX);
        for co in objs.iter_mut() {
            strat.score(co);
        }
        strat.sort(&mut objs);
        for pair in objs.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
    }
}

// =============================================================================
// Age scoring
// =============================================================================

proptest! {
    /// At equal priority, an older object never scores below a younger one.
    #[test]
    fn oldest_first_is_monotonic_in_age(
        age_a in 0i64..365 * 24 * 3_600_000,
        age_b in 0i64..365 * 24 * 3_600_000,
        priority in 1i64..20,
    ) {
        let strat = OldestFirstStrategy::new(1000);
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_millis() as i64;
        let aged = |age: i64| {
            let mut md = Map::new();
            md.insert("size".into(), json!(100));
            md.insert("priority".into(), json!(priority));
            md.insert("since".into(), json!(now - age));
            CacheObject::with_metadata("o", "cv0", md)
        };
        let (older, newer) = if age_a >= age_b { (age_a, age_b) } else { (age_b, age_a) };
        prop_assert!(strat.calculate_score(&aged(older)) >= strat.calculate_score(&aged(newer)));
    }
}

// =============================================================================
// Label and status round trips
// =============================================================================

proptest! {
    /// Arbitrary purpose labels never panic the parser; unknown ones fall
    /// back to the default ordering.
    #[test]
    fn purpose_parse_never_panics(label in ".*") {
        let tag = PurposeTag::parse(&label);
        prop_assert!(!tag.sort_keys().is_empty());
    }

    /// Arbitrary integers map to at most one volume status, and statuses
    /// round-trip through their level.
    #[test]
    fn volume_status_level_round_trip(level in -100i64..100) {
        match VolumeStatus::from_level(level) {
            Some(status) => prop_assert_eq!(status.level(), level),
            None => prop_assert!(!(0..=3).contains(&level)),
        }
    }
}
