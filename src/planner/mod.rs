// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The deletion planner.
//!
//! Turns a "free N bytes" request into an ordered, executable
//! [`DeletionPlan`] for one volume, and ranks plans across multiple volumes
//! so a caller can try the cheapest one first.
//!
//! A plan is computed from a point-in-time snapshot of the catalog. Between
//! computation and execution another actor may have evicted or re-cached one
//! of its entries, so execution treats a vanished entry as skippable and
//! callers re-check available space afterward rather than trusting the
//! plan's estimate.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache_object::{CacheObject, VolumeStatus};
use crate::config::InventoryConfig;
use crate::inventory::{InventoryError, StorageInventory};
use crate::metrics;
use crate::selection::DeletionStrategy;
use crate::volume::CacheVolume;

#[derive(Error, Debug)]
pub enum PlanError {
    /// No candidate volume could satisfy a space request.
    #[error("no volume can free {requested_size} bytes")]
    NoViablePlan { requested_size: i64 },
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

/// An ordered, single-use eviction proposal for one volume.
///
/// Lower scores are more desirable; a score of zero means the volume already
/// has enough free space and nothing needs removing.
#[derive(Debug, Clone)]
pub struct DeletionPlan {
    /// The volume this plan frees space in.
    pub volume: String,
    /// Bytes of free space the caller asked for.
    pub requested_size: i64,
    /// Entries to remove, most-evictable first.
    pub objects: Vec<CacheObject>,
    /// Bytes the removals are expected to free (0 for a zero-score plan).
    pub byte_count_to_remove: i64,
    /// Plan desirability; lower is better.
    pub score: f64,
}

impl DeletionPlan {
    /// A zero-score plan for a volume that already has enough space.
    fn sufficient(volume: &str, requested_size: i64) -> Self {
        Self {
            volume: volume.to_string(),
            requested_size,
            objects: Vec::new(),
            byte_count_to_remove: 0,
            score: 0.0,
        }
    }

    /// Execute this plan: remove each entry's bytes from `volume` and mark
    /// it evicted in `inventory`. Returns the bytes actually freed.
    ///
    /// Entries that have vanished since the plan was computed are skipped,
    /// and a per-entry backend failure is logged and skipped rather than
    /// aborting the rest of the plan. The returned byte count may therefore
    /// fall short of [`byte_count_to_remove`](Self::byte_count_to_remove).
    pub async fn execute(
        &self,
        inventory: &dyn StorageInventory,
        volume: &dyn CacheVolume,
    ) -> Result<i64, PlanError> {
        let _timer = metrics::LatencyTimer::start("execute_plan");
        let mut freed: i64 = 0;
        for obj in &self.objects {
            match volume.remove(&obj.name).await {
                Ok(true) => {}
                Ok(false) => {
                    debug!(volume = %self.volume, name = %obj.name, "plan entry already gone");
                    continue;
                }
                Err(e) => {
                    warn!(
                        volume = %self.volume,
                        name = %obj.name,
                        error = %e,
                        "failed to remove plan entry; skipping"
                    );
                    continue;
                }
            }
            inventory.remove_object(&self.volume, &obj.name, false).await?;
            freed += obj.size().max(0);
        }
        info!(
            volume = %self.volume,
            freed,
            planned = self.byte_count_to_remove,
            "executed deletion plan"
        );
        metrics::record_bytes_freed(&self.volume, freed);
        Ok(freed)
    }
}

/// Builds and ranks [`DeletionPlan`]s against one catalog, using one
/// selection strategy as the scoring policy.
pub struct DeletionPlanner {
    inventory: Arc<dyn StorageInventory>,
    strategy: Box<dyn DeletionStrategy>,
    deletion_headroom: f64,
    selection_headroom: f64,
}

impl DeletionPlanner {
    /// Create a planner with the default headrooms (2% deletion, 20%
    /// selection).
    pub fn new(inventory: Arc<dyn StorageInventory>, strategy: Box<dyn DeletionStrategy>) -> Self {
        Self::with_config(inventory, strategy, &InventoryConfig::default())
    }

    /// Create a planner with explicitly tuned headrooms.
    pub fn with_config(
        inventory: Arc<dyn StorageInventory>,
        strategy: Box<dyn DeletionStrategy>,
        config: &InventoryConfig,
    ) -> Self {
        Self {
            inventory,
            strategy,
            deletion_headroom: config.deletion_headroom,
            selection_headroom: config.selection_headroom,
        }
    }

    /// Bytes that must actually be removed to satisfy `requested_size` given
    /// `avail` free bytes, with the deletion headroom applied. Non-positive
    /// when no removal is needed.
    fn bytes_to_remove(&self, requested_size: i64, avail: i64) -> i64 {
        ((1.0 + self.deletion_headroom) * requested_size as f64).round() as i64 - avail
    }

    /// Build a deletion plan freeing `requested_size` bytes in `volname`.
    ///
    /// Returns a zero-score plan when the volume already has enough
    /// headroom, `None` when the volume's removable entries cannot free
    /// enough (not an error; the caller tries another volume), or an error
    /// for an unregistered volume or catalog failure.
    pub async fn create_deletion_plan_for(
        &self,
        volname: &str,
        requested_size: i64,
    ) -> Result<Option<DeletionPlan>, PlanError> {
        let avail = self.inventory.available_space_in(volname).await?;
        if avail as f64 > (1.0 + self.deletion_headroom) * requested_size as f64 {
            debug!(volume = volname, avail, requested_size, "space already sufficient");
            metrics::record_plan(volname, "sufficient");
            return Ok(Some(DeletionPlan::sufficient(volname, requested_size)));
        }
        let remove_bytes = self.bytes_to_remove(requested_size, avail);
        if remove_bytes <= 0 {
            metrics::record_plan(volname, "sufficient");
            return Ok(Some(DeletionPlan::sufficient(volname, requested_size)));
        }

        // Oversize the selection so a few unremovable candidates at
        // execution time don't sink the plan.
        let selection_size =
            ((1.0 + self.selection_headroom) * (requested_size - avail) as f64).round() as i64;
        let mut strategy = self.strategy.new_for_size(selection_size);

        let selected = self
            .inventory
            .select_objects_from(volname, strategy.as_mut())
            .await?;
        let gathered = strategy.total_size();
        if gathered < remove_bytes {
            debug!(
                volume = volname,
                gathered,
                needed = remove_bytes,
                "volume cannot free enough removable space"
            );
            metrics::record_plan(volname, "infeasible");
            return Ok(None);
        }

        let selected: Vec<CacheObject> =
            selected.into_iter().filter(|co| co.score > 0.0).collect();
        if selected.is_empty() {
            // sizes covered the target but every candidate scored zero, so
            // the strategy is unwilling to remove anything here
            debug!(volume = volname, "no positively scored candidates");
            metrics::record_plan(volname, "infeasible");
            return Ok(None);
        }
        let score = self.calculate_plan_score(&selected, requested_size, avail);
        metrics::record_plan(volname, "viable");
        Ok(Some(DeletionPlan {
            volume: volname.to_string(),
            requested_size,
            objects: selected,
            byte_count_to_remove: remove_bytes,
            score,
        }))
    }

    /// Score a prospective plan; lower is better.
    ///
    /// Walks the sorted candidate list accumulating size and score per
    /// entry, stopping once the accumulated size covers what must be
    /// removed, and returns entry count over summed score. That favors
    /// plans that free the needed space with fewer objects (fewer removal
    /// operations that can fail). This is the designed extension point for
    /// alternative ranking policies.
    pub fn calculate_plan_score(
        &self,
        selected: &[CacheObject],
        requested_size: i64,
        avail: i64,
    ) -> f64 {
        let remove_bytes = self.bytes_to_remove(requested_size, avail);
        let mut accumulated: i64 = 0;
        let mut sum_score = 0.0;
        let mut considered: usize = 0;
        for obj in selected {
            considered += 1;
            accumulated += obj.size().max(0);
            sum_score += obj.score;
            if accumulated > remove_bytes {
                break;
            }
        }
        let score = considered as f64 / sum_score;
        if score.is_finite() {
            score
        } else {
            // zero-score entries should have been filtered upstream
            f64::MAX
        }
    }

    /// Build one plan per candidate volume and rank them, cheapest first.
    ///
    /// Volumes below the full-update capability level are skipped with a
    /// warning, as are volumes whose planning fails for any reason other
    /// than an unregistered name (which is fatal). Fails with
    /// [`PlanError::NoViablePlan`] only when no volume produced a plan.
    pub async fn order_deletion_plans(
        &self,
        requested_size: i64,
        candidate_volumes: &[String],
    ) -> Result<Vec<DeletionPlan>, PlanError> {
        let _timer = metrics::LatencyTimer::start("order_plans");
        let mut plans = Vec::new();
        for volname in candidate_volumes {
            let status = self.inventory.volume_status(volname).await?;
            if status < VolumeStatus::Update {
                warn!(volume = %volname, ?status, "volume not updatable; skipping");
                continue;
            }
            match self.create_deletion_plan_for(volname, requested_size).await {
                Ok(Some(plan)) => plans.push(plan),
                Ok(None) => {}
                Err(e @ PlanError::Inventory(InventoryError::VolumeNotFound(_))) => {
                    return Err(e);
                }
                Err(e) => {
                    warn!(volume = %volname, error = %e, "planning failed; skipping volume");
                }
            }
        }
        if plans.is_empty() {
            return Err(PlanError::NoViablePlan { requested_size });
        }
        plans.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        Ok(plans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::SqliteInventory;
    use crate::selection::BySizeStrategy;
    use serde_json::json;
    use tempfile::TempDir;

    async fn planner_over_empty_db() -> (TempDir, DeletionPlanner) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}/inventory.db", dir.path().display());
        let inv = Arc::new(SqliteInventory::connect(&url).await.unwrap());
        let planner = DeletionPlanner::new(inv, Box::new(BySizeStrategy::new(0)));
        (dir, planner)
    }

    fn scored(name: &str, size: i64, score: f64) -> CacheObject {
        let mut co = CacheObject::new(name, "cv0");
        co.metadata.insert("size".into(), json!(size));
        co.score = score;
        co
    }

    #[tokio::test]
    async fn test_plan_score_counts_fewest_objects() {
        let (_dir, planner) = planner_over_empty_db().await;

        // one big object covers the request by itself
        let few = vec![scored("big", 500, 5.0), scored("spare", 500, 5.0)];
        // five small ones are all needed
        let many: Vec<CacheObject> =
            (0..5).map(|i| scored(&format!("s{i}"), 100, 1.0)).collect();

        let few_score = planner.calculate_plan_score(&few, 400, 0);
        let many_score = planner.calculate_plan_score(&many, 400, 0);
        assert!(few_score < many_score, "{few_score} !< {many_score}");
    }

    #[tokio::test]
    async fn test_plan_score_stops_at_covering_prefix() {
        let (_dir, planner) = planner_over_empty_db().await;
        // first entry alone strictly exceeds remove_bytes = 102
        let selected = vec![scored("a", 200, 4.0), scored("b", 200, 100.0)];
        let score = planner.calculate_plan_score(&selected, 100, 0);
        assert!((score - 1.0 / 4.0).abs() < 1e-12, "score was {score}");
    }

    #[tokio::test]
    async fn test_plan_score_zero_denominator_clamps() {
        let (_dir, planner) = planner_over_empty_db().await;
        let selected = vec![scored("a", 200, 0.0)];
        let score = planner.calculate_plan_score(&selected, 100, 0);
        assert_eq!(score, f64::MAX);
    }
}
