// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Cache object data structures.
//!
//! A [`CacheObject`] describes one cached copy of a repository object inside
//! one cache volume. It is the unit of currency shared by the inventory
//! catalog, the selection strategies, the deletion planner, and the integrity
//! checks. Typed attributes (size, priority, checksum, last-cache time) ride
//! inside an open metadata map; well-known keys get typed accessors with
//! defaults so callers never have to pattern-match JSON by hand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Metadata key holding the object's size in bytes.
pub const MD_SIZE: &str = "size";
/// Metadata key holding the hex-encoded checksum.
pub const MD_CHECKSUM: &str = "checksum";
/// Metadata key naming the checksum algorithm.
pub const MD_CHECKSUM_ALG: &str = "checksumAlgorithm";
/// Metadata key holding the eviction priority (higher = less evictable).
pub const MD_PRIORITY: &str = "priority";
/// Metadata key holding the epoch-millisecond time of last (re)caching.
pub const MD_SINCE: &str = "since";

/// Default checksum algorithm label applied when none is given.
pub const DEFAULT_ALGORITHM: &str = "sha256";
/// Default eviction priority applied when none is given.
pub const DEFAULT_PRIORITY: i64 = 10;

/// One cached copy of a repository object in one cache volume.
///
/// The `score` field is transient: a [`crate::selection::DeletionStrategy`]
/// writes into it while candidates stream out of the catalog, and it is never
/// persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheObject {
    /// Repository-wide object identifier, if known.
    pub id: Option<String>,
    /// Volume-local storage key.
    pub name: String,
    /// Name of the volume holding (or formerly holding) the bytes.
    pub volname: String,
    /// True while the bytes are believed present in the volume. A row can
    /// outlive eviction with `cached = false` as a historical record.
    pub cached: bool,
    /// Transient eviction-desirability score set by a selection strategy.
    #[serde(skip)]
    pub score: f64,
    /// Open metadata bag; well-known keys have typed accessors below.
    pub metadata: Map<String, Value>,
}

impl CacheObject {
    /// Create an object record with empty metadata.
    pub fn new(name: impl Into<String>, volname: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            volname: volname.into(),
            cached: false,
            score: 0.0,
            metadata: Map::new(),
        }
    }

    /// Create an object record carrying the given metadata.
    pub fn with_metadata(
        name: impl Into<String>,
        volname: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            metadata,
            ..Self::new(name, volname)
        }
    }

    /// The object's size in bytes, or −1 if unknown.
    pub fn size(&self) -> i64 {
        self.metadatum_i64(MD_SIZE, -1)
    }

    /// The object's eviction priority (higher = less evictable).
    pub fn priority(&self) -> i64 {
        self.metadatum_i64(MD_PRIORITY, DEFAULT_PRIORITY)
    }

    /// Epoch milliseconds of the last time this object was (re)cached, or
    /// `default` when the record carries no timestamp.
    pub fn since(&self, default: i64) -> i64 {
        self.metadatum_i64(MD_SINCE, default)
    }

    /// True if the named metadatum is present.
    pub fn has_metadatum(&self, name: &str) -> bool {
        self.metadata.contains_key(name)
    }

    /// Fetch an integer metadatum, falling back to `default` when the key is
    /// absent or not an integer.
    pub fn metadatum_i64(&self, name: &str, default: i64) -> i64 {
        self.metadata
            .get(name)
            .and_then(Value::as_i64)
            .unwrap_or(default)
    }

    /// Fetch a string metadatum, falling back to `default` when the key is
    /// absent or not a string.
    pub fn metadatum_str<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.metadata
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or(default)
    }
}

/// Capability level of a cache volume, forming a monotonic ladder:
/// each level permits everything below it. Planning and eviction require
/// [`VolumeStatus::Update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VolumeStatus {
    /// The volume must not be used at all.
    Disabled = 0,
    /// Only informational queries about the volume's contents are permitted.
    Info = 1,
    /// Objects may be read out of the volume but not added or removed.
    Get = 2,
    /// Fully operational: reads, writes, and eviction are all permitted.
    Update = 3,
}

impl VolumeStatus {
    /// Integer level as persisted in the `volumes` table.
    pub fn level(self) -> i64 {
        self as i64
    }

    /// Map a persisted integer level back to a status.
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            0 => Some(Self::Disabled),
            1 => Some(Self::Info),
            2 => Some(Self::Get),
            3 => Some(Self::Update),
            _ => None,
        }
    }
}

/// Registration record for one cache volume.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeInfo {
    /// Unique volume name.
    pub name: String,
    /// Total capacity in bytes.
    pub capacity: i64,
    /// Optional tie-breaking priority; unused by the default scoring.
    pub priority: Option<i64>,
    /// Current capability level.
    pub status: VolumeStatus,
    /// Free-form registration metadata.
    pub metadata: Map<String, Value>,
}

/// Current epoch time in milliseconds.
pub(crate) fn now_millis() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
