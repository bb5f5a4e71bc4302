// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! An in-memory volume that stores object descriptions but no bytes.
//!
//! Useful as a stand-in backend in tests and as a sink volume whose
//! "contents" exist only as far as the engine's bookkeeping is concerned.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

use crate::cache_object::CacheObject;

use super::{CacheVolume, VolumeError};

/// A volume backed by a concurrent map of object descriptions.
pub struct NullVolume {
    name: String,
    objects: DashMap<String, Map<String, Value>>,
}

impl NullVolume {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objects: DashMap::new(),
        }
    }

    /// Record an object as present, with the metadata a real backend would
    /// report about its bytes.
    pub fn put(&self, objname: impl Into<String>, metadata: Map<String, Value>) {
        self.objects.insert(objname.into(), metadata);
    }

    /// Number of objects currently "stored".
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl CacheVolume for NullVolume {
    fn name(&self) -> &str {
        &self.name
    }

    async fn exists(&self, objname: &str) -> Result<bool, VolumeError> {
        Ok(self.objects.contains_key(objname))
    }

    async fn get(&self, objname: &str) -> Result<CacheObject, VolumeError> {
        let entry = self
            .objects
            .get(objname)
            .ok_or_else(|| VolumeError::not_found(&self.name, objname))?;
        let mut co = CacheObject::with_metadata(objname, &self.name, entry.value().clone());
        co.cached = true;
        Ok(co)
    }

    async fn remove(&self, objname: &str) -> Result<bool, VolumeError> {
        Ok(self.objects.remove(objname).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn md(size: i64) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("size".into(), json!(size));
        m
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let vol = NullVolume::new("null0");
        assert_eq!(vol.name(), "null0");
        assert!(vol.is_empty());
        assert!(!vol.exists("goob.dat").await.unwrap());

        vol.put("goob.dat", md(450));
        assert!(vol.exists("goob.dat").await.unwrap());
        assert_eq!(vol.len(), 1);

        let co = vol.get("goob.dat").await.unwrap();
        assert_eq!(co.name, "goob.dat");
        assert_eq!(co.volname, "null0");
        assert_eq!(co.size(), 450);
        assert!(co.cached);

        assert!(vol.remove("goob.dat").await.unwrap());
        assert!(!vol.remove("goob.dat").await.unwrap());
        assert!(!vol.exists("goob.dat").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let vol = NullVolume::new("null0");
        let err = vol.get("nope").await;
        assert!(matches!(
            err,
            Err(VolumeError::ObjectNotFound { name, .. }) if name == "nope"
        ));
    }
}
