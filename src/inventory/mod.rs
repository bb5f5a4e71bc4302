// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The storage inventory catalog.
//!
//! The catalog is the persistent, queryable record of every cached object's
//! location, size, checksum, priority, and last-access time, plus each
//! volume's capacity and capability status. It answers purpose-tagged
//! candidate queries for the deletion planner and does the available/used
//! space arithmetic per volume.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Inventory Module                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │  mod.rs   - StorageInventory trait, PurposeTag, errors       │
//! │  sql.rs   - SqliteInventory: sqlx-backed implementation      │
//! │             └─ objects / volumes / algorithms tables         │
//! │             └─ write lock serializing mutations and          │
//! │                freshness-sensitive reads                     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod sql;

pub use sql::SqliteInventory;

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::cache_object::{CacheObject, VolumeInfo, VolumeStatus};
use crate::selection::DeletionStrategy;

#[derive(Error, Debug)]
pub enum InventoryError {
    /// Generic catalog/storage failure (connectivity, SQL, corruption).
    #[error("inventory storage failure: {0}")]
    Backend(String),
    /// An unregistered volume name was used in a volume-scoped operation.
    #[error("{0}: not a registered volume")]
    VolumeNotFound(String),
    /// A typed metadata field had the wrong shape.
    #[error("{field}: metadatum has unexpected type")]
    Metadata { field: String },
    /// An unregistered checksum algorithm label was used.
    #[error("{0}: not a registered checksum algorithm")]
    AlgorithmNotFound(String),
}

impl From<sqlx::Error> for InventoryError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Component of a purpose tag's ordering specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Highest eviction priority first (most evictable objects).
    PriorityDesc,
    /// Least recently (re)cached first.
    SinceAsc,
    /// Largest objects first.
    SizeDesc,
}

/// Label selecting which pre-defined ordering a candidate query uses.
///
/// Each tag maps to an explicit tuple of sort keys evaluated by the storage
/// backend, so a strategy receives candidates roughly in its own preferred
/// order and can stop scanning early.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PurposeTag {
    /// Default ordering, an alias for [`PurposeTag::DeletionPriority`].
    #[default]
    Deletion,
    /// Priority descending, then oldest access first (`deletion_p`).
    DeletionPriority,
    /// Priority descending, then largest size, then oldest access
    /// (`deletion_s`).
    DeletionSize,
    /// Oldest access first, then priority descending (`deletion_d`).
    DeletionDate,
}

impl PurposeTag {
    /// The wire label for this tag.
    pub fn label(self) -> &'static str {
        match self {
            Self::Deletion => "deletion",
            Self::DeletionPriority => "deletion_p",
            Self::DeletionSize => "deletion_s",
            Self::DeletionDate => "deletion_d",
        }
    }

    /// Parse a label; unknown or empty labels fall back to the default tag.
    pub fn parse(label: &str) -> Self {
        match label {
            "deletion_p" => Self::DeletionPriority,
            "deletion_s" => Self::DeletionSize,
            "deletion_d" => Self::DeletionDate,
            _ => Self::Deletion,
        }
    }

    /// The ordering specification for this purpose.
    pub fn sort_keys(self) -> &'static [SortKey] {
        match self {
            Self::Deletion | Self::DeletionPriority => {
                &[SortKey::PriorityDesc, SortKey::SinceAsc]
            }
            Self::DeletionSize => {
                &[SortKey::PriorityDesc, SortKey::SizeDesc, SortKey::SinceAsc]
            }
            Self::DeletionDate => &[SortKey::SinceAsc, SortKey::PriorityDesc],
        }
    }
}

/// The persistent catalog of cached objects and volumes.
///
/// Mutating operations are totally ordered within one catalog instance.
/// Reads made for freshness-sensitive purposes (capability
/// [`VolumeStatus::Get`] or above) are serialized with mutations so they
/// never observe a half-committed deletion; purely informational reads may
/// run concurrently and tolerate slightly stale results.
#[async_trait]
pub trait StorageInventory: Send + Sync {
    /// All copies of the object with repository identifier `id` residing in
    /// volumes whose status is at least `min_status`. Returns an empty list,
    /// not an error, when nothing matches. For `min_status` of
    /// [`VolumeStatus::Get`] or above, only currently cached copies are
    /// returned.
    async fn find_object(
        &self,
        id: &str,
        min_status: VolumeStatus,
    ) -> Result<Vec<CacheObject>, InventoryError>;

    /// The record for the object stored under `objname` in `volname`, or
    /// `None` if the catalog has no such row. Soft-deleted rows are returned
    /// with their `cached` flag false.
    async fn find_object_in(
        &self,
        volname: &str,
        objname: &str,
    ) -> Result<Option<CacheObject>, InventoryError>;

    /// Register a newly cached copy of an object.
    ///
    /// Stamps `since` with the current time and extracts `size`, `checksum`,
    /// `checksumAlgorithm`, and `priority` from `metadata` when present. Any
    /// existing row for `(volname, objname)` is purged first, so add is
    /// "replace," not strictly additive.
    async fn add_object(
        &self,
        id: Option<&str>,
        volname: &str,
        objname: &str,
        metadata: Option<&Map<String, Value>>,
    ) -> Result<CacheObject, InventoryError>;

    /// Merge the named fields of `metadata` into one entry's stored
    /// metadata. Fields not present in the partial update are untouched.
    /// Returns false if the entry does not exist.
    async fn update_metadata(
        &self,
        volname: &str,
        objname: &str,
        metadata: &Map<String, Value>,
    ) -> Result<bool, InventoryError>;

    /// Stamp an entry's `since` time with the current time, marking it
    /// freshly accessed. Returns false if the entry does not exist.
    async fn update_access_time(
        &self,
        volname: &str,
        objname: &str,
    ) -> Result<bool, InventoryError> {
        let mut md = Map::new();
        md.insert(
            crate::cache_object::MD_SINCE.to_string(),
            Value::from(crate::cache_object::now_millis()),
        );
        self.update_metadata(volname, objname, &md).await
    }

    /// Remove an object from the catalog's view of `volname`. With
    /// `purge = false` the row is retained with its cached flag cleared
    /// (soft delete); with `purge = true` the row is deleted entirely.
    /// Succeeds silently if the pair was never cached.
    async fn remove_object(
        &self,
        volname: &str,
        objname: &str,
        purge: bool,
    ) -> Result<(), InventoryError>;

    /// Delete every object row in the catalog. Returns true if any rows
    /// were removed.
    async fn remove_all_objects(&self) -> Result<bool, InventoryError>;

    /// Stream eviction candidates from `volname` through `strategy`.
    ///
    /// Runs the purpose-tagged query for `strategy.purpose()`, restricted to
    /// cached rows with positive priority in volumes at the
    /// [`VolumeStatus::Update`] level; scores each row as it arrives,
    /// stopping once the strategy's limit is reached or a hard row cap is
    /// hit; returns the candidates sorted by the strategy's ordering.
    async fn select_objects_from(
        &self,
        volname: &str,
        strategy: &mut dyn DeletionStrategy,
    ) -> Result<Vec<CacheObject>, InventoryError>;

    /// Bytes still unclaimed in `volname`: capacity minus the sizes of its
    /// cached entries. An empty volume reports its full capacity.
    async fn available_space_in(&self, volname: &str) -> Result<i64, InventoryError>;

    /// Bytes consumed by cached entries in `volname`.
    async fn used_space_in(&self, volname: &str) -> Result<i64, InventoryError>;

    /// Available space for every registered volume.
    async fn available_space(&self) -> Result<HashMap<String, i64>, InventoryError>;

    /// Bytes consumed by cached entries, per volume.
    async fn used_space(&self) -> Result<HashMap<String, i64>, InventoryError>;

    /// Registered capacity, per volume.
    async fn volume_capacities(&self) -> Result<HashMap<String, i64>, InventoryError>;

    /// Create or update a volume registration. Recognized metadata keys:
    /// `priority` (integer) and `status` (integer capability level,
    /// defaults to fully operational).
    async fn register_volume(
        &self,
        name: &str,
        capacity: i64,
        metadata: Option<&Map<String, Value>>,
    ) -> Result<(), InventoryError>;

    /// The registration record for one volume.
    async fn volume_info(&self, name: &str) -> Result<VolumeInfo, InventoryError>;

    /// Set a volume's capability level.
    async fn set_volume_status(
        &self,
        name: &str,
        status: VolumeStatus,
    ) -> Result<(), InventoryError>;

    /// A volume's current capability level.
    async fn volume_status(&self, name: &str) -> Result<VolumeStatus, InventoryError>;

    /// Names of all registered volumes.
    async fn volumes(&self) -> Result<Vec<String>, InventoryError>;

    /// Add a checksum algorithm to the allowed vocabulary; adding a known
    /// name is a no-op.
    async fn register_algorithm(&self, name: &str) -> Result<(), InventoryError>;

    /// The allowed checksum-algorithm vocabulary.
    async fn checksum_algorithms(&self) -> Result<Vec<String>, InventoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purpose_labels_round_trip() {
        for tag in [
            PurposeTag::DeletionPriority,
            PurposeTag::DeletionSize,
            PurposeTag::DeletionDate,
        ] {
            assert_eq!(PurposeTag::parse(tag.label()), tag);
        }
        assert_eq!(PurposeTag::parse("deletion"), PurposeTag::Deletion);
        assert_eq!(PurposeTag::parse(""), PurposeTag::Deletion);
        assert_eq!(PurposeTag::parse("goober"), PurposeTag::Deletion);
    }

    #[test]
    fn test_default_purpose_aliases_priority_ordering() {
        assert_eq!(
            PurposeTag::Deletion.sort_keys(),
            PurposeTag::DeletionPriority.sort_keys()
        );
    }

    #[test]
    fn test_size_purpose_orders_by_size_second() {
        assert_eq!(
            PurposeTag::DeletionSize.sort_keys(),
            &[SortKey::PriorityDesc, SortKey::SizeDesc, SortKey::SinceAsc]
        );
    }

    #[test]
    fn test_date_purpose_orders_by_age_first() {
        assert_eq!(
            PurposeTag::DeletionDate.sort_keys()[0],
            SortKey::SinceAsc
        );
    }
}
