// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Size-based selection: bigger objects are more deletable.

use crate::cache_object::CacheObject;
use crate::inventory::PurposeTag;

use super::{DeletionStrategy, SelectionBudget};

/// Size in bytes that maps to a score of 1.0 when no normalizer is given
/// (0.5 GB).
pub const DEFAULT_NORMALIZING_SIZE: f64 = 5.0e8;

/// Scores candidates proportionally to their size, so the largest objects
/// are selected for deletion first. Deleting a few big files frees the
/// requested space with the fewest removal operations.
#[derive(Debug, Clone)]
pub struct BySizeStrategy {
    budget: SelectionBudget,
    norm: f64,
}

impl BySizeStrategy {
    /// Create the strategy with the given selection size limit and the
    /// default normalizing size.
    pub fn new(limit: i64) -> Self {
        Self::with_normalizing_size(limit, DEFAULT_NORMALIZING_SIZE)
    }

    /// Create the strategy with an explicit normalizing size, the byte count
    /// that receives a score of 1.0. Non-positive values fall back to the
    /// default.
    pub fn with_normalizing_size(limit: i64, norm: f64) -> Self {
        Self {
            budget: SelectionBudget::new(limit),
            norm: if norm > 0.0 { norm } else { DEFAULT_NORMALIZING_SIZE },
        }
    }

    /// The normalizing size used when calculating scores.
    pub fn normalizing_size(&self) -> f64 {
        self.norm
    }
}

impl DeletionStrategy for BySizeStrategy {
    fn calculate_score(&self, obj: &CacheObject) -> f64 {
        let s = obj.size() as f64 / self.norm;
        if s >= 0.0 { s } else { 0.0 }
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
        Box::new(Self::with_normalizing_size(limit, self.norm))
    }
}
