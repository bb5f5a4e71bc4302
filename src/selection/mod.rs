// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Selection strategies for choosing eviction candidates.
//!
//! A [`DeletionStrategy`] supplies the application-specific notion of "waste":
//! given a candidate [`CacheObject`], it computes a numeric
//! eviction-desirability score (higher = more deletable). The bookkeeping
//! shared by every strategy (accumulating the sizes seen so far, signalling
//! when enough candidates have been gathered) lives in [`SelectionBudget`],
//! so the catalog and the planner stay strategy-agnostic.
//!
//! # Built-in strategies
//!
//! | Strategy | Purpose tag | Favors |
//! |----------|-------------|--------|
//! | [`BySizeStrategy`] | `deletion_s` | large objects |
//! | [`OldestFirstStrategy`] | `deletion_p` | long-unaccessed, low-priority objects |
//! | [`BigOldStrategy`] | `deletion_s` | large *and* old objects (non-linear) |

pub mod big_old;
pub mod by_size;
pub mod oldest;

pub use big_old::BigOldStrategy;
pub use by_size::BySizeStrategy;
pub use oldest::OldestFirstStrategy;

use crate::cache_object::CacheObject;
use crate::inventory::PurposeTag;

/// Scores eviction candidates and tracks how much deletable space has been
/// seen so far.
///
/// Implementations embed a [`SelectionBudget`] and expose it through
/// [`budget`](DeletionStrategy::budget); the accumulation, limit, and reset
/// behavior then comes from the default methods here. Only
/// [`calculate_score`](DeletionStrategy::calculate_score),
/// [`purpose`](DeletionStrategy::purpose), and
/// [`new_for_size`](DeletionStrategy::new_for_size) are strategy-specific.
pub trait DeletionStrategy: Send + Sync {
    /// Compute the eviction-desirability score for `obj` without recording it.
    fn calculate_score(&self, obj: &CacheObject) -> f64;

    /// The purpose tag selecting which pre-ordered catalog query feeds this
    /// strategy.
    fn purpose(&self) -> PurposeTag;

    /// Shared size-accumulation bookkeeping.
    fn budget(&self) -> &SelectionBudget;

    /// Mutable access to the shared bookkeeping.
    fn budget_mut(&mut self) -> &mut SelectionBudget;

    /// A fresh instance of this strategy configured with a new size limit.
    /// The planner uses this to size a strategy per space request.
    fn new_for_size(&self, limit: i64) -> Box<dyn DeletionStrategy>;

    /// Score `obj`, record the score onto it, and accumulate its size into
    /// the running total (sizes ≤ 0 are not counted).
    fn score(&mut self, obj: &mut CacheObject) -> f64 {
        let s = self.calculate_score(obj);
        obj.score = s;
        self.budget_mut().record(obj.size());
        s
    }

    /// True once the sizes seen via [`score`](DeletionStrategy::score)
    /// strictly exceed the limit fixed at construction.
    fn limit_reached(&self) -> bool {
        self.budget().limit_reached()
    }

    /// Total size of all positive-size objects scored so far.
    fn total_size(&self) -> i64 {
        self.budget().total()
    }

    /// Zero the size accumulator.
    fn reset(&mut self) {
        self.budget_mut().reset();
    }

    /// Arrange candidates from most- to least-evictable. The default orders
    /// by score, highest first.
    fn sort(&self, objs: &mut [CacheObject]) {
        objs.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
}

/// Running size accumulator with a fixed limit, shared by all strategies.
#[derive(Debug, Clone)]
pub struct SelectionBudget {
    limit: i64,
    total: i64,
}

impl SelectionBudget {
    /// Create a budget whose limit the accumulated sizes may only just exceed.
    pub fn new(limit: i64) -> Self {
        Self { limit, total: 0 }
    }

    /// Accumulate one candidate's size; non-positive sizes are ignored.
    pub fn record(&mut self, size: i64) {
        if size > 0 {
            self.total += size;
        }
    }

    /// The configured size limit.
    pub fn limit(&self) -> i64 {
        self.limit
    }

    /// Total size accumulated so far.
    pub fn total(&self) -> i64 {
        self.total
    }

    /// True once the total strictly exceeds the limit.
    pub fn limit_reached(&self) -> bool {
        self.total > self.limit
    }

    /// Zero the accumulator.
    pub fn reset(&mut self) {
        self.total = 0;
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sized_object;
    use super::*;

    #[test]
    fn test_budget_limit_is_strict() {
        let mut b = SelectionBudget::new(10);
        b.record(4);
        b.record(6);
        // exactly at the limit: not reached
        assert_eq!(b.total(), 10);
        assert!(!b.limit_reached());
        b.record(1);
        assert!(b.limit_reached());
    }

    #[test]
    fn test_budget_ignores_unknown_sizes() {
        let mut b = SelectionBudget::new(10);
        b.record(-1);
        b.record(0);
        assert_eq!(b.total(), 0);
    }

    #[test]
    fn test_budget_reset() {
        let mut b = SelectionBudget::new(5);
        b.record(9);
        assert!(b.limit_reached());
        b.reset();
        assert!(!b.limit_reached());
        assert_eq!(b.total(), 0);
    }

    #[test]
    fn test_score_accumulates_independent_of_score_value() {
        // A zero-score object still counts toward the accumulated size.
        let mut strat = BySizeStrategy::new(1000);
        let mut co = sized_object("zero", 40);
        co.metadata.insert("size".into(), serde_json::json!(40));
        strat.score(&mut co);
        assert_eq!(strat.total_size(), 40);
    }

    #[test]
    fn test_default_sort_is_descending_by_score() {
        let strat = BySizeStrategy::new(1000);
        let mut objs: Vec<CacheObject> = [1.0, 3.0, 2.0]
            .iter()
            .map(|s| {
                let mut co = sized_object("o", 1);
                co.score = *s;
                co
            })
            .collect();
        strat.sort(&mut objs);
        let scores: Vec<f64> = objs.iter().map(|o| o.score).collect();
        assert_eq!(scores, vec![3.0, 2.0, 1.0]);
    }
}
