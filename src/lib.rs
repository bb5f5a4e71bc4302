//! # Repocache
//!
//! A disk-cache inventory and eviction-planning engine for long-term data
//! repositories.
//!
//! ## Architecture
//!
//! The engine tracks which data objects currently occupy which storage
//! volumes, decides which objects to evict when a volume needs more free
//! space, and verifies integrity guarantees on cached copies:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Deletion Planner                        │
//! │  • "free N bytes" → ordered, executable DeletionPlan       │
//! │  • Ranks per-volume plans, cheapest first                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Selection Strategies                       │
//! │  • BySize / OldestFirst / BigOld scoring policies          │
//! │  • Shared size-budget bookkeeping with early stop          │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Inventory Catalog                         │
//! │  • SQLite record of every cached object and volume         │
//! │  • Purpose-tagged, pre-ordered candidate queries           │
//! │  • Available/used space arithmetic per volume              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Cache Volumes + Integrity Checks               │
//! │  • exists/get/remove boundary to the byte stores           │
//! │  • Size and checksum drift detection                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use repocache::{
//!     BySizeStrategy, DeletionPlanner, SqliteInventory, StorageInventory,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let inventory = Arc::new(SqliteInventory::connect("sqlite:inventory.db").await?);
//!     inventory.register_volume("cv0", 50_000_000_000, None).await?;
//!
//!     let planner = DeletionPlanner::new(
//!         inventory.clone(),
//!         Box::new(BySizeStrategy::new(0)),
//!     );
//!
//!     // Rank plans across volumes for a 2 GB space request.
//!     let volumes = inventory.volumes().await?;
//!     let plans = planner.order_deletion_plans(2_000_000_000, &volumes).await?;
//!     println!("best plan frees {} bytes in {}", plans[0].byte_count_to_remove, plans[0].volume);
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`inventory`]: The persistent catalog of cached objects and volumes
//! - [`selection`]: Pluggable eviction-candidate scoring strategies
//! - [`planner`]: Deletion-plan construction, ranking, and execution
//! - [`volume`]: The boundary to physical byte-storage backends
//! - [`integrity`]: Catalog-vs-volume drift detection
//! - [`cache_object`]: The object/volume data model shared by everything else

pub mod cache_object;
pub mod config;
pub mod integrity;
pub mod inventory;
pub mod metrics;
pub mod planner;
pub mod selection;
pub mod volume;

pub use cache_object::{CacheObject, VolumeInfo, VolumeStatus};
pub use config::InventoryConfig;
pub use integrity::{CacheObjectCheck, ChecksumCheck, IntegrityError, SizeCheck};
pub use inventory::{InventoryError, PurposeTag, SortKey, SqliteInventory, StorageInventory};
pub use planner::{DeletionPlan, DeletionPlanner, PlanError};
pub use selection::{
    BigOldStrategy, BySizeStrategy, DeletionStrategy, OldestFirstStrategy, SelectionBudget,
};
pub use volume::{CacheVolume, NullVolume, VolumeError};
pub use metrics::LatencyTimer;
