// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Integrity checks on cached objects.
//!
//! The catalog and a volume are never transactionally consistent with each
//! other: a `cached = true` row can outlive its bytes, and bytes can change
//! under a stale catalog record. Checks in this module compare one catalog
//! record against what the volume reports about the actual stored object and
//! fail loudly on any divergence, so a verification sweep can quarantine or
//! re-fetch the affected objects.

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;

use crate::cache_object::{CacheObject, MD_CHECKSUM, MD_CHECKSUM_ALG, MD_SIZE};
use crate::volume::{CacheVolume, VolumeError};

#[derive(Error, Debug)]
pub enum IntegrityError {
    /// The physical backend could not be consulted.
    #[error(transparent)]
    Volume(#[from] VolumeError),
    /// The stored object diverges from its catalog record. `expected` and
    /// `calculated` carry hex digests, or a surrogate marker like
    /// `size 4501` when full-hash comparison was skipped or impossible.
    #[error("{name}: checksum mismatch (expected {expected}, calculated {calculated})")]
    ChecksumMismatch {
        name: String,
        expected: String,
        calculated: String,
    },
    /// The catalog record lacks the metadata this check needs.
    #[error("{name}: record carries no {field} to verify against")]
    MissingMetadata { name: String, field: String },
}

impl IntegrityError {
    fn mismatch(
        name: impl Into<String>,
        expected: impl Into<String>,
        calculated: impl Into<String>,
    ) -> Self {
        Self::ChecksumMismatch {
            name: name.into(),
            expected: expected.into(),
            calculated: calculated.into(),
        }
    }
}

/// One verification applied to a catalog record against its volume.
#[async_trait]
pub trait CacheObjectCheck: Send + Sync {
    /// A short label for logs and reports.
    fn name(&self) -> &'static str;

    /// Verify `obj` against the backend that holds its bytes. `Ok(())`
    /// means this check found no divergence.
    async fn check(
        &self,
        obj: &CacheObject,
        volume: &dyn CacheVolume,
    ) -> Result<(), IntegrityError>;
}

/// Verifies that the object exists in its volume and that the size the
/// volume reports matches the catalog record.
///
/// Cheap enough to run on every sweep; a size divergence is reported as a
/// mismatch with `size NNN` surrogate markers.
pub struct SizeCheck;

#[async_trait]
impl CacheObjectCheck for SizeCheck {
    fn name(&self) -> &'static str {
        "size"
    }

    async fn check(
        &self,
        obj: &CacheObject,
        volume: &dyn CacheVolume,
    ) -> Result<(), IntegrityError> {
        let expected = obj.size();
        if expected < 0 {
            return Err(IntegrityError::MissingMetadata {
                name: obj.name.clone(),
                field: MD_SIZE.to_string(),
            });
        }

        // get() rather than exists() so a vanished object surfaces as
        // ObjectNotFound with the volume's name attached.
        let stored = volume.get(&obj.name).await?;
        let actual = stored.size();
        if actual != expected {
            warn!(
                volume = volume.name(),
                name = %obj.name,
                expected,
                actual,
                "cached object size diverged from catalog record"
            );
            return Err(IntegrityError::mismatch(
                &obj.name,
                format!("size {expected}"),
                format!("size {actual}"),
            ));
        }
        Ok(())
    }
}

/// Verifies the checksum the volume reports for an object against the
/// catalog record.
///
/// Runs the size comparison first: when sizes already diverge there is no
/// point comparing digests, and the mismatch carries `size` surrogate
/// markers instead. Digest comparison requires the record and the volume to
/// agree on the algorithm label.
pub struct ChecksumCheck;

#[async_trait]
impl CacheObjectCheck for ChecksumCheck {
    fn name(&self) -> &'static str {
        "checksum"
    }

    async fn check(
        &self,
        obj: &CacheObject,
        volume: &dyn CacheVolume,
    ) -> Result<(), IntegrityError> {
        let expected = obj
            .metadata
            .get(MD_CHECKSUM)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| IntegrityError::MissingMetadata {
                name: obj.name.clone(),
                field: MD_CHECKSUM.to_string(),
            })?;

        let stored = volume.get(&obj.name).await?;

        if obj.size() >= 0 && stored.size() >= 0 && stored.size() != obj.size() {
            return Err(IntegrityError::mismatch(
                &obj.name,
                format!("size {}", obj.size()),
                format!("size {}", stored.size()),
            ));
        }

        let calculated = stored
            .metadata
            .get(MD_CHECKSUM)
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| IntegrityError::MissingMetadata {
                name: obj.name.clone(),
                field: MD_CHECKSUM.to_string(),
            })?;

        let expected_alg = obj.metadatum_str(MD_CHECKSUM_ALG, crate::cache_object::DEFAULT_ALGORITHM);
        let stored_alg = stored.metadatum_str(MD_CHECKSUM_ALG, crate::cache_object::DEFAULT_ALGORITHM);
        if expected_alg != stored_alg {
            return Err(IntegrityError::mismatch(
                &obj.name,
                format!("{expected_alg}:{expected}"),
                format!("{stored_alg}:{calculated}"),
            ));
        }

        if calculated != expected {
            warn!(
                volume = volume.name(),
                name = %obj.name,
                expected,
                calculated,
                "cached object checksum diverged from catalog record"
            );
            return Err(IntegrityError::mismatch(&obj.name, expected, calculated));
        }
        Ok(())
    }
}

/// Hex-encoded SHA-256 digest of a byte buffer, matching the catalog's
/// default algorithm label.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::NullVolume;
    use serde_json::{json, Map, Value};

    fn record(name: &str, size: i64, checksum: Option<&str>) -> CacheObject {
        let mut md = Map::new();
        md.insert("size".into(), json!(size));
        if let Some(c) = checksum {
            md.insert("checksum".into(), json!(c));
        }
        let mut co = CacheObject::with_metadata(name, "null0", md);
        co.cached = true;
        co
    }

    fn stored(size: i64, checksum: Option<&str>) -> Map<String, Value> {
        let mut md = Map::new();
        md.insert("size".into(), json!(size));
        if let Some(c) = checksum {
            md.insert("checksum".into(), json!(c));
        }
        md
    }

    #[tokio::test]
    async fn test_size_check_passes_on_match() {
        let vol = NullVolume::new("null0");
        vol.put("goob.dat", stored(450, None));
        let obj = record("goob.dat", 450, None);
        SizeCheck.check(&obj, &vol).await.unwrap();
    }

    #[tokio::test]
    async fn test_size_check_reports_surrogate_markers() {
        let vol = NullVolume::new("null0");
        vol.put("goob.dat", stored(999, None));
        let obj = record("goob.dat", 450, None);

        let err = SizeCheck.check(&obj, &vol).await.unwrap_err();
        match err {
            IntegrityError::ChecksumMismatch {
                expected,
                calculated,
                ..
            } => {
                assert_eq!(expected, "size 450");
                assert_eq!(calculated, "size 999");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_size_check_missing_object() {
        let vol = NullVolume::new("null0");
        let obj = record("gone.dat", 450, None);
        let err = SizeCheck.check(&obj, &vol).await.unwrap_err();
        assert!(matches!(
            err,
            IntegrityError::Volume(VolumeError::ObjectNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_size_check_needs_recorded_size() {
        let vol = NullVolume::new("null0");
        vol.put("goob.dat", stored(450, None));
        let obj = record("goob.dat", -1, None);
        let err = SizeCheck.check(&obj, &vol).await.unwrap_err();
        assert!(matches!(
            err,
            IntegrityError::MissingMetadata { field, .. } if field == "size"
        ));
    }

    #[tokio::test]
    async fn test_checksum_check_passes_on_match() {
        let digest = sha256_hex(b"hello");
        let vol = NullVolume::new("null0");
        vol.put("goob.dat", stored(5, Some(&digest)));
        let obj = record("goob.dat", 5, Some(&digest));
        ChecksumCheck.check(&obj, &vol).await.unwrap();
    }

    #[tokio::test]
    async fn test_checksum_check_detects_divergence() {
        let vol = NullVolume::new("null0");
        vol.put("goob.dat", stored(5, Some("feedface")));
        let obj = record("goob.dat", 5, Some("deadbeef"));

        let err = ChecksumCheck.check(&obj, &vol).await.unwrap_err();
        match err {
            IntegrityError::ChecksumMismatch {
                expected,
                calculated,
                ..
            } => {
                assert_eq!(expected, "deadbeef");
                assert_eq!(calculated, "feedface");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_checksum_check_size_divergence_short_circuits() {
        // sizes disagree, so the digest comparison is skipped entirely
        let vol = NullVolume::new("null0");
        vol.put("goob.dat", stored(999, Some("deadbeef")));
        let obj = record("goob.dat", 450, Some("deadbeef"));

        let err = ChecksumCheck.check(&obj, &vol).await.unwrap_err();
        assert!(matches!(
            err,
            IntegrityError::ChecksumMismatch { expected, .. } if expected == "size 450"
        ));
    }

    #[tokio::test]
    async fn test_checksum_check_needs_recorded_checksum() {
        let vol = NullVolume::new("null0");
        vol.put("goob.dat", stored(5, Some("deadbeef")));
        let obj = record("goob.dat", 5, None);
        let err = ChecksumCheck.check(&obj, &vol).await.unwrap_err();
        assert!(matches!(
            err,
            IntegrityError::MissingMetadata { field, .. } if field == "checksum"
        ));
    }

    #[test]
    fn test_sha256_hex_known_vector() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
