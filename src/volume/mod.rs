// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! The cache volume boundary.
//!
//! A [`CacheVolume`] is the physical byte-storage backend holding cached
//! objects. The planner and integrity checks only need to ask whether an
//! object exists, describe it, and remove it; saving and copying bytes into
//! a volume belongs to the restorer that fills the cache, not to this engine.

pub mod null;

pub use null::NullVolume;

use async_trait::async_trait;
use thiserror::Error;

use crate::cache_object::CacheObject;

#[derive(Error, Debug)]
pub enum VolumeError {
    /// Failure reaching the physical storage backend.
    #[error("volume {volume}: storage failure: {message}")]
    Storage { volume: String, message: String },
    /// The named object is not present in the volume.
    #[error("{volume}: no object stored under {name}")]
    ObjectNotFound { volume: String, name: String },
}

impl VolumeError {
    pub fn storage(volume: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            volume: volume.into(),
            message: message.into(),
        }
    }

    pub fn not_found(volume: impl Into<String>, name: impl Into<String>) -> Self {
        Self::ObjectNotFound {
            volume: volume.into(),
            name: name.into(),
        }
    }
}

/// The read/remove face of a physical storage backend.
///
/// Implementations serialize their own internal mutations; the catalog never
/// assumes transactional consistency with a volume. Drift between the two is
/// detected by the integrity checks, not prevented here.
#[async_trait]
pub trait CacheVolume: Send + Sync {
    /// The volume's registered name.
    fn name(&self) -> &str;

    /// True if an object is stored under `objname`.
    async fn exists(&self, objname: &str) -> Result<bool, VolumeError>;

    /// Describe the object stored under `objname`, including whatever
    /// size/checksum metadata the backend can report about the actual bytes.
    async fn get(&self, objname: &str) -> Result<CacheObject, VolumeError>;

    /// Remove the object stored under `objname`. Returns true if bytes were
    /// actually removed, false if nothing was stored under that name.
    async fn remove(&self, objname: &str) -> Result<bool, VolumeError>;
}
