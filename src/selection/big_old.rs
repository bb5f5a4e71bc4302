// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Combined size/age selection with non-linear weighting.

use crate::cache_object::now_millis;
use crate::cache_object::CacheObject;
use crate::inventory::PurposeTag;

use super::{DeletionStrategy, SelectionBudget};

/// Age (ms) at which the age weight turns over from near-zero to linear
/// (2.5 hours).
const DEFAULT_AGE_TURNOVER_MS: f64 = 2.5 * 3_600_000.0;

/// Size (bytes) at which the size weight turns over from linear to flat
/// (0.5 GB).
const DEFAULT_SIZE_TURNOVER: f64 = 5.0e8;

/// Favors objects that are both large and old.
///
/// The age weight stays near zero until the age turnover, then grows
/// linearly, so recently used files are protected regardless of size. The
/// size weight grows roughly linearly up to the size turnover and then
/// flattens, so one enormous file does not monopolize every plan.
#[derive(Debug, Clone)]
pub struct BigOldStrategy {
    budget: SelectionBudget,
    now: i64,
    age_turnover_ms: f64,
    size_turnover: f64,
}

impl BigOldStrategy {
    /// Create the strategy with the default turnovers (2.5 h, 0.5 GB).
    pub fn new(limit: i64) -> Self {
        Self::with_turnovers(limit, DEFAULT_AGE_TURNOVER_MS, DEFAULT_SIZE_TURNOVER)
    }

    /// Create the strategy with explicit turnover points. Non-positive
    /// values fall back to the defaults.
    pub fn with_turnovers(limit: i64, age_turnover_ms: f64, size_turnover: f64) -> Self {
        Self {
            budget: SelectionBudget::new(limit),
            now: now_millis(),
            age_turnover_ms: if age_turnover_ms > 0.0 {
                age_turnover_ms
            } else {
                DEFAULT_AGE_TURNOVER_MS
            },
            size_turnover: if size_turnover > 0.0 {
                size_turnover
            } else {
                DEFAULT_SIZE_TURNOVER
            },
        }
    }

    /// The age (ms since last access) where the age weight goes from near
    /// zero to linear.
    pub fn age_turnover_ms(&self) -> f64 {
        self.age_turnover_ms
    }

    /// The size (bytes) where the size weight goes from linear to flat.
    pub fn size_turnover(&self) -> f64 {
        self.size_turnover
    }
}

impl DeletionStrategy for BigOldStrategy {
    fn calculate_score(&self, obj: &CacheObject) -> f64 {
        // age weight: ~0 below the turnover, then linear
        let age = (self.now - obj.since(self.now)) as f64;
        let fage = 0.1 * age * (1.0 - 1.0 / (1.0 + (age / (2.0 * self.age_turnover_ms)).powi(4)).sqrt())
            / self.age_turnover_ms;

        // size weight: linear below the turnover, then flat
        let sz = obj.size() as f64;
        let fsz = 2.0 / (1.0 + 8.0_f64.powf(-sz / self.size_turnover)) - 1.0;

        fage * fsz * obj.priority() as f64
    }

    fn purpose(&self) -> PurposeTag {
        PurposeTag::DeletionSize
    }

    fn budget(&self) -> &SelectionBudget {
        &self.budget
    }

    fn budget_mut(&mut self) -> &mut SelectionBudget {
        &mut self.budget
    }

    fn new_for_size(&self, limit: i64) -> Box<dyn DeletionStrategy> {
        Box::new(Self::with_turnovers(limit, self.age_turnover_ms, self.size_turnover))
    }

    /// Also refreshes the timestamp ages are measured against.
    fn reset(&mut self) {
        self.budget.reset();
        self.now = now_millis();
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::sized_object;
    use super::*;
    use serde_json::json;

    fn candidate(name: &str, age_ms: i64, size: i64, now: i64) -> CacheObject {
        let mut co = sized_object(name, size);
        co.metadata.insert("since".into(), json!(now - age_ms));
        co
    }

    #[test]
    fn test_fresh_objects_score_near_zero() {
        let strat = BigOldStrategy::new(1000);
        let co = candidate("fresh", 60_000, 1_000_000_000, strat.now);
        assert!(strat.calculate_score(&co) < 0.01);
    }

    #[test]
    fn test_old_big_beats_old_small() {
        let strat = BigOldStrategy::new(1000);
        let day = 24 * 3_600_000;
        let big = candidate("big", day, 2_000_000_000, strat.now);
        let small = candidate("small", day, 1_000, strat.now);
        assert!(strat.calculate_score(&big) > strat.calculate_score(&small));
    }

    #[test]
    fn test_older_beats_newer_at_same_size() {
        let strat = BigOldStrategy::new(1000);
        let sz = 100_000_000;
        let older = candidate("older", 48 * 3_600_000, sz, strat.now);
        let newer = candidate("newer", 6 * 3_600_000, sz, strat.now);
        assert!(strat.calculate_score(&older) > strat.calculate_score(&newer));
    }

    #[test]
    fn test_size_weight_flattens() {
        // far beyond the size turnover, doubling size barely changes the score
        let strat = BigOldStrategy::new(1000);
        let day = 24 * 3_600_000;
        let huge = candidate("huge", day, 4_000_000_000, strat.now);
        let huger = candidate("huger", day, 8_000_000_000, strat.now);
        let ratio = strat.calculate_score(&huger) / strat.calculate_score(&huge);
        assert!(ratio < 1.05, "ratio was {ratio}");
    }

    #[test]
    fn test_purpose_is_size_ordered() {
        assert_eq!(BigOldStrategy::new(10).purpose(), PurposeTag::DeletionSize);
    }

    #[test]
    fn test_new_for_size_keeps_turnovers() {
        let strat = BigOldStrategy::with_turnovers(10, 1_000.0, 2_000.0);
        let resized = strat.new_for_size(777);
        assert_eq!(resized.budget().limit(), 777);
        assert_eq!(resized.purpose(), PurposeTag::DeletionSize);
    }
}
