// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Age/priority-based selection: long-unaccessed, low-priority objects go
//! first.

use crate::cache_object::{CacheObject, DEFAULT_PRIORITY};
use crate::cache_object::now_millis;
use crate::inventory::PurposeTag;

use super::{DeletionStrategy, SelectionBudget};

/// One hour in milliseconds, the default minimum age for selectability.
const DEFAULT_MIN_AGE_MS: i64 = 3_600_000;

/// One day in milliseconds, the age that maps to a score of 1.0 at normal
/// priority.
const UNIT_AGE_MS: i64 = 24 * 3_600_000;

/// Scores candidates by the time since they were last cached or accessed,
/// weighted by their priority relative to a "normal" priority. Objects
/// younger than a minimum age score zero so just-cached files are never
/// selected for deletion.
#[derive(Debug, Clone)]
pub struct OldestFirstStrategy {
    budget: SelectionBudget,
    now: i64,
    normal_priority: i64,
    min_age_ms: i64,
}

impl OldestFirstStrategy {
    /// Create the strategy with the given selection size limit, a normal
    /// priority of 10, and a one-hour minimum age.
    pub fn new(limit: i64) -> Self {
        Self::with_tuning(limit, DEFAULT_PRIORITY, DEFAULT_MIN_AGE_MS)
    }

    /// Create the strategy with explicit tuning. Non-positive values fall
    /// back to the defaults.
    pub fn with_tuning(limit: i64, normal_priority: i64, min_age_ms: i64) -> Self {
        Self {
            budget: SelectionBudget::new(limit),
            now: now_millis(),
            normal_priority: if normal_priority > 0 {
                normal_priority
            } else {
                DEFAULT_PRIORITY
            },
            min_age_ms: if min_age_ms > 0 { min_age_ms } else { DEFAULT_MIN_AGE_MS },
        }
    }

    /// The priority value considered "normal"; lower-priority objects are
    /// more protected than normal ones.
    pub fn normal_priority(&self) -> i64 {
        self.normal_priority
    }

    /// The minimum age (ms) an object needs for a non-zero score.
    pub fn minimum_age_ms(&self) -> i64 {
        self.min_age_ms
    }
}

impl DeletionStrategy for OldestFirstStrategy {
    fn calculate_score(&self, obj: &CacheObject) -> f64 {
        let age = self.now - obj.since(self.now);
        if age < self.min_age_ms {
            return 0.0;
        }
        obj.priority() as f64 * age as f64 / (UNIT_AGE_MS as f64 * self.normal_priority as f64)
    }

    fn purpose(&self) -> PurposeTag {
        PurposeTag::DeletionPriority
    }

    fn budget(&self) -> &SelectionBudget {
        &self.budget
    }

    fn budget_mut(&mut self) -> &mut SelectionBudget {
        &mut self.budget
    }

    fn new_for_size(&self, limit: i64) -> Box<dyn DeletionStrategy> {
        Box::new(Self::with_tuning(limit, self.normal_priority, self.min_age_ms))
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

    fn aged_object(name: &str, age_ms: i64, priority: i64, now: i64) -> CacheObject {
        let mut co = sized_object(name, 100);
        co.metadata.insert("since".into(), json!(now - age_ms));
        co.metadata.insert("priority".into(), json!(priority));
        co
    }

    #[test]
    fn test_young_objects_score_zero() {
        let strat = OldestFirstStrategy::new(1000);
        let co = aged_object("fresh", 60_000, 10, strat.now);
        assert_eq!(strat.calculate_score(&co), 0.0);
    }

    #[test]
    fn test_one_day_normal_priority_scores_one() {
        let strat = OldestFirstStrategy::new(1000);
        let co = aged_object("old", UNIT_AGE_MS, 10, strat.now);
        let score = strat.calculate_score(&co);
        assert!((score - 1.0).abs() < 1e-9, "score was {score}");
    }

    #[test]
    fn test_older_scores_higher() {
        let strat = OldestFirstStrategy::new(1000);
        let newer = aged_object("newer", 2 * DEFAULT_MIN_AGE_MS, 10, strat.now);
        let older = aged_object("older", 20 * DEFAULT_MIN_AGE_MS, 10, strat.now);
        assert!(strat.calculate_score(&older) > strat.calculate_score(&newer));
    }

    #[test]
    fn test_priority_scales_score() {
        let strat = OldestFirstStrategy::new(1000);
        let normal = aged_object("normal", UNIT_AGE_MS, 10, strat.now);
        let precious = aged_object("precious", UNIT_AGE_MS, 1, strat.now);
        assert!(strat.calculate_score(&precious) < strat.calculate_score(&normal));
    }

    #[test]
    fn test_missing_since_scores_zero() {
        // age defaults to 0, which is below the minimum age
        let strat = OldestFirstStrategy::new(1000);
        let co = sized_object("undated", 100);
        assert_eq!(strat.calculate_score(&co), 0.0);
    }

    #[test]
    fn test_purpose_tag() {
        let strat = OldestFirstStrategy::new(1000);
        assert_eq!(strat.purpose(), PurposeTag::DeletionPriority);
        assert_eq!(strat.purpose().label(), "deletion_p");
    }

    #[test]
    fn test_new_for_size_keeps_tuning() {
        let strat = OldestFirstStrategy::with_tuning(10, 5, 60_000);
        let resized = strat.new_for_size(999);
        assert_eq!(resized.budget().limit(), 999);
        assert_eq!(resized.purpose(), PurposeTag::DeletionPriority);
    }
}
