// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQLite-backed storage inventory.
//!
//! Three tables hold the persistent state:
//!
//! ```sql
//! CREATE TABLE volumes (
//!   id INTEGER PRIMARY KEY,
//!   name TEXT NOT NULL UNIQUE,
//!   capacity INTEGER NOT NULL,
//!   priority INTEGER,
//!   status INTEGER NOT NULL,     -- capability level 0..3
//!   metadata TEXT                -- registration metadata as JSON
//! );
//! CREATE TABLE algorithms (
//!   id INTEGER PRIMARY KEY,
//!   name TEXT NOT NULL UNIQUE
//! );
//! CREATE TABLE objects (
//!   objid TEXT,                  -- repository-wide identifier (nullable)
//!   name TEXT NOT NULL,          -- volume-local storage key
//!   volume INTEGER NOT NULL,     -- volumes.id
//!   size INTEGER NOT NULL,       -- bytes, -1 if unknown
//!   checksum TEXT,
//!   algorithm INTEGER,           -- algorithms.id
//!   priority INTEGER NOT NULL,
//!   since INTEGER NOT NULL,      -- epoch ms of last (re)caching
//!   cached INTEGER NOT NULL,     -- 1 while bytes are present
//!   metadata TEXT                -- full metadata bag as JSON
//! );
//! ```
//!
//! Typed columns (`size`, `priority`, `since`, `checksum`) duplicate keys of
//! the JSON bag so the purpose-tagged candidate queries can order on them
//! natively; reads overlay the columns back onto the bag so callers see one
//! consistent map.
//!
//! ## Locking
//!
//! One `tokio::sync::Mutex` per catalog instance serializes all mutations
//! plus the reads made for fetch-freshness purposes (finding an object one is
//! about to read out of a volume, streaming deletion candidates). Purely
//! informational queries go straight to the pool and may observe slightly
//! stale state, which is acceptable for listings and space reports.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache_object::{
    now_millis, CacheObject, VolumeInfo, VolumeStatus, DEFAULT_ALGORITHM, DEFAULT_PRIORITY,
    MD_CHECKSUM, MD_CHECKSUM_ALG, MD_PRIORITY, MD_SINCE, MD_SIZE,
};
use crate::config::InventoryConfig;
use crate::metrics;
use crate::selection::DeletionStrategy;

use super::{InventoryError, PurposeTag, SortKey, StorageInventory};

/// Column list shared by every object query, joined against the volume and
/// algorithm vocabularies.
const FIND_BASE: &str = "SELECT d.objid AS objid, d.name AS name, v.name AS volume, \
     d.size AS size, d.checksum AS checksum, a.name AS algorithm, \
     d.cached AS cached, d.priority AS priority, d.since AS since, d.metadata AS metadata \
     FROM objects d JOIN volumes v ON d.volume = v.id \
     LEFT JOIN algorithms a ON d.algorithm = a.id";

/// A [`StorageInventory`] persisted in a SQLite database via `sqlx`.
pub struct SqliteInventory {
    pool: SqlitePool,
    /// Serializes mutations and freshness-sensitive reads.
    write_lock: Mutex<()>,
    row_cap: u32,
}

impl SqliteInventory {
    /// Open (creating if necessary) the inventory database at `url`
    /// (e.g. `sqlite:inventory.db`) with default tuning.
    pub async fn connect(url: &str) -> Result<Self, InventoryError> {
        Self::with_config(url, &InventoryConfig::default()).await
    }

    /// Open the database named by `config.db_url`.
    pub async fn from_config(config: &InventoryConfig) -> Result<Self, InventoryError> {
        let url = config
            .db_url
            .as_deref()
            .ok_or_else(|| InventoryError::Backend("no db_url configured".to_string()))?;
        Self::with_config(url, config).await
    }

    /// Open the inventory database with explicit tuning.
    pub async fn with_config(url: &str, config: &InventoryConfig) -> Result<Self, InventoryError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        let inv = Self {
            pool,
            write_lock: Mutex::new(()),
            row_cap: config.selection_row_cap,
        };
        inv.enable_wal_mode().await?;
        inv.init_schema().await?;
        inv.register_algorithm(DEFAULT_ALGORITHM).await?;
        Ok(inv)
    }

    /// Enable WAL mode so planning reads don't block catalog writes.
    async fn enable_wal_mode(&self) -> Result<(), InventoryError> {
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&self.pool)
            .await?;
        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn init_schema(&self) -> Result<(), InventoryError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS volumes (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                capacity INTEGER NOT NULL,
                priority INTEGER,
                status INTEGER NOT NULL DEFAULT 3,
                metadata TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS algorithms (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS objects (
                objid TEXT,
                name TEXT NOT NULL,
                volume INTEGER NOT NULL,
                size INTEGER NOT NULL DEFAULT -1,
                checksum TEXT,
                algorithm INTEGER,
                priority INTEGER NOT NULL DEFAULT 10,
                since INTEGER NOT NULL,
                cached INTEGER NOT NULL DEFAULT 0,
                metadata TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_objects_vol_name ON objects(volume, name)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// The internal row id for a volume name, or `None` if unregistered.
    async fn volume_id(&self, name: &str) -> Result<Option<i64>, InventoryError> {
        let row = sqlx::query("SELECT id FROM volumes WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<i64, _>("id")))
    }

    /// Like [`volume_id`](Self::volume_id) but failing when unregistered.
    async fn require_volume_id(&self, name: &str) -> Result<i64, InventoryError> {
        self.volume_id(name)
            .await?
            .ok_or_else(|| InventoryError::VolumeNotFound(name.to_string()))
    }

    async fn algorithm_id(&self, name: &str) -> Result<Option<i64>, InventoryError> {
        let row = sqlx::query("SELECT id FROM algorithms WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get::<i64, _>("id")))
    }

    /// Render a purpose tag's ordering specification as an ORDER BY clause.
    fn order_clause(purpose: PurposeTag) -> String {
        purpose
            .sort_keys()
            .iter()
            .map(|key| match key {
                SortKey::PriorityDesc => "d.priority DESC",
                SortKey::SinceAsc => "d.since ASC",
                SortKey::SizeDesc => "d.size DESC",
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Turn one result row into a [`CacheObject`], overlaying the typed
    /// columns onto the stored metadata bag.
    fn extract_object(row: &SqliteRow) -> Result<CacheObject, InventoryError> {
        let mut md = match row.try_get::<Option<String>, _>("metadata")? {
            Some(encoded) => parse_metadata(&encoded)?,
            None => Map::new(),
        };

        let size: i64 = row.try_get("size")?;
        md.insert(MD_SIZE.to_string(), Value::from(size));
        md.insert(
            MD_PRIORITY.to_string(),
            Value::from(row.try_get::<i64, _>("priority")?),
        );
        md.insert(
            MD_SINCE.to_string(),
            Value::from(row.try_get::<i64, _>("since")?),
        );
        if let Some(csum) = row.try_get::<Option<String>, _>("checksum")? {
            md.insert(MD_CHECKSUM.to_string(), Value::from(csum));
        }
        if let Some(alg) = row.try_get::<Option<String>, _>("algorithm")? {
            md.insert(MD_CHECKSUM_ALG.to_string(), Value::from(alg));
        }

        let mut co = CacheObject::with_metadata(
            row.try_get::<String, _>("name")?,
            row.try_get::<String, _>("volume")?,
            md,
        );
        co.id = row.try_get::<Option<String>, _>("objid")?;
        co.cached = row.try_get::<i64, _>("cached")? != 0;
        Ok(co)
    }

    /// Sum of cached entry sizes per volume (the used-space query).
    async fn sum_cached_sizes(&self) -> Result<HashMap<String, i64>, InventoryError> {
        let rows = sqlx::query(
            "SELECT v.name AS volume, SUM(d.size) AS used \
             FROM objects d JOIN volumes v ON d.volume = v.id \
             WHERE d.cached = 1 GROUP BY v.name",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            out.insert(
                row.try_get::<String, _>("volume")?,
                row.try_get::<i64, _>("used")?,
            );
        }
        Ok(out)
    }
}

#[async_trait]
impl StorageInventory for SqliteInventory {
    async fn find_object(
        &self,
        id: &str,
        min_status: VolumeStatus,
    ) -> Result<Vec<CacheObject>, InventoryError> {
        let mut sql = format!("{FIND_BASE} WHERE d.objid = ? AND v.status >= ?");
        if min_status >= VolumeStatus::Get {
            sql.push_str(" AND d.cached = 1");
        }

        // Freshness-sensitive lookups (the caller is about to read bytes)
        // must not observe a half-committed deletion.
        let _guard = if min_status >= VolumeStatus::Get {
            Some(self.write_lock.lock().await)
        } else {
            None
        };

        let rows = sqlx::query(&sql)
            .bind(id)
            .bind(min_status.level())
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(Self::extract_object).collect()
    }

    async fn find_object_in(
        &self,
        volname: &str,
        objname: &str,
    ) -> Result<Option<CacheObject>, InventoryError> {
        let sql = format!("{FIND_BASE} WHERE v.name = ? AND d.name = ?");
        let _guard = self.write_lock.lock().await;
        let row = sqlx::query(&sql)
            .bind(volname)
            .bind(objname)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(Self::extract_object).transpose()
    }

    async fn add_object(
        &self,
        id: Option<&str>,
        volname: &str,
        objname: &str,
        metadata: Option<&Map<String, Value>>,
    ) -> Result<CacheObject, InventoryError> {
        let _timer = metrics::LatencyTimer::start("add_object");
        let _guard = self.write_lock.lock().await;
        let volid = self.require_volume_id(volname).await?;

        // The bytes are assumed to land in the volume shortly before or
        // after this registration.
        let since = now_millis();
        let mut md = metadata.cloned().unwrap_or_default();
        md.insert(MD_SINCE.to_string(), Value::from(since));

        let size = typed_i64(&md, MD_SIZE)?.unwrap_or(-1);
        let checksum = typed_str(&md, MD_CHECKSUM)?;
        let algorithm =
            typed_str(&md, MD_CHECKSUM_ALG)?.unwrap_or_else(|| DEFAULT_ALGORITHM.to_string());
        let priority = typed_i64(&md, MD_PRIORITY)?.unwrap_or(DEFAULT_PRIORITY);

        if metadata.is_none() {
            md.insert(MD_SIZE.to_string(), Value::from(size));
            md.insert(MD_PRIORITY.to_string(), Value::from(priority));
        }

        let algid = self
            .algorithm_id(&algorithm)
            .await?
            .ok_or_else(|| InventoryError::AlgorithmNotFound(algorithm.clone()))?;

        // add is "replace": any previous record under this (volume, name)
        // is superseded before the insert.
        sqlx::query("DELETE FROM objects WHERE volume = ? AND name = ?")
            .bind(volid)
            .bind(objname)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "INSERT INTO objects (objid, name, volume, size, checksum, algorithm, \
                                  priority, since, cached, metadata) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?)",
        )
        .bind(id)
        .bind(objname)
        .bind(volid)
        .bind(size)
        .bind(&checksum)
        .bind(algid)
        .bind(priority)
        .bind(since)
        .bind(encode_metadata(&md)?)
        .execute(&self.pool)
        .await?;

        debug!(volume = volname, name = objname, size, "registered cached object");
        metrics::record_catalog_op("add", "success");

        let mut co = CacheObject::with_metadata(objname, volname, md);
        co.id = id.map(String::from);
        co.cached = true;
        Ok(co)
    }

    async fn update_metadata(
        &self,
        volname: &str,
        objname: &str,
        metadata: &Map<String, Value>,
    ) -> Result<bool, InventoryError> {
        let _guard = self.write_lock.lock().await;
        let volid = self.require_volume_id(volname).await?;

        // Validate the typed fields before touching anything.
        let new_size = typed_i64(metadata, MD_SIZE)?;
        let new_checksum = typed_str(metadata, MD_CHECKSUM)?;
        let new_priority = typed_i64(metadata, MD_PRIORITY)?;
        let new_since = typed_i64(metadata, MD_SINCE)?;

        let sql = format!("{FIND_BASE} WHERE v.name = ? AND d.name = ?");
        let row = sqlx::query(&sql)
            .bind(volname)
            .bind(objname)
            .fetch_optional(&self.pool)
            .await?;
        let existing = match row.as_ref().map(Self::extract_object).transpose()? {
            Some(co) => co,
            None => return Ok(false),
        };

        let mut merged = existing.metadata.clone();
        for (key, value) in metadata {
            merged.insert(key.clone(), value.clone());
        }

        let result = sqlx::query(
            "UPDATE objects SET size = ?, checksum = ?, priority = ?, since = ?, metadata = ? \
             WHERE volume = ? AND name = ?",
        )
        .bind(new_size.unwrap_or_else(|| existing.size()))
        .bind(new_checksum.or_else(|| {
            existing
                .metadata
                .get(MD_CHECKSUM)
                .and_then(Value::as_str)
                .map(String::from)
        }))
        .bind(new_priority.unwrap_or_else(|| existing.priority()))
        .bind(new_since.unwrap_or_else(|| existing.since(0)))
        .bind(encode_metadata(&merged)?)
        .bind(volid)
        .bind(objname)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_object(
        &self,
        volname: &str,
        objname: &str,
        purge: bool,
    ) -> Result<(), InventoryError> {
        let _guard = self.write_lock.lock().await;
        let volid = self.require_volume_id(volname).await?;

        let sql = if purge {
            "DELETE FROM objects WHERE volume = ? AND name = ?"
        } else {
            "UPDATE objects SET cached = 0 WHERE volume = ? AND name = ?"
        };
        sqlx::query(sql)
            .bind(volid)
            .bind(objname)
            .execute(&self.pool)
            .await?;

        debug!(volume = volname, name = objname, purge, "removed cached object");
        metrics::record_catalog_op(if purge { "purge" } else { "remove" }, "success");
        Ok(())
    }

    async fn remove_all_objects(&self) -> Result<bool, InventoryError> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("DELETE FROM objects").execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn select_objects_from(
        &self,
        volname: &str,
        strategy: &mut dyn DeletionStrategy,
    ) -> Result<Vec<CacheObject>, InventoryError> {
        let _timer = metrics::LatencyTimer::start("select_objects");
        strategy.reset();

        // Only fully operational volumes may surrender objects, and rows at
        // priority 0 are pinned. The LIMIT bounds worst-case scan cost even
        // if the strategy never reports its limit reached.
        let sql = format!(
            "{FIND_BASE} WHERE v.name = ? AND v.status >= ? AND d.cached = 1 \
             AND d.priority > 0 ORDER BY {} LIMIT ?",
            Self::order_clause(strategy.purpose()),
        );

        let _guard = self.write_lock.lock().await;
        let rows = sqlx::query(&sql)
            .bind(volname)
            .bind(VolumeStatus::Update.level())
            .bind(self.row_cap as i64)
            .fetch_all(&self.pool)
            .await?;

        let scanned = rows.len();
        let mut out = Vec::new();
        for row in &rows {
            if strategy.limit_reached() {
                break;
            }
            let mut co = Self::extract_object(row)?;
            strategy.score(&mut co);
            out.push(co);
        }
        if scanned >= self.row_cap as usize && !strategy.limit_reached() {
            warn!(
                volume = volname,
                row_cap = self.row_cap,
                "candidate scan hit the row cap before the strategy was satisfied"
            );
        }

        metrics::record_selection_scan(volname, out.len());
        strategy.sort(&mut out);
        Ok(out)
    }

    async fn available_space_in(&self, volname: &str) -> Result<i64, InventoryError> {
        // Also validates that the volume is registered.
        let info = self.volume_info(volname).await?;
        let row = sqlx::query(
            "SELECT SUM(d.size) AS used FROM objects d JOIN volumes v ON d.volume = v.id \
             WHERE v.name = ? AND d.cached = 1",
        )
        .bind(volname)
        .fetch_one(&self.pool)
        .await?;
        let used: Option<i64> = row.try_get("used")?;
        Ok(info.capacity - used.unwrap_or(0))
    }

    async fn used_space_in(&self, volname: &str) -> Result<i64, InventoryError> {
        // also validates that the volume is registered
        self.volume_info(volname).await?;
        let row = sqlx::query(
            "SELECT SUM(d.size) AS used FROM objects d JOIN volumes v ON d.volume = v.id \
             WHERE v.name = ? AND d.cached = 1",
        )
        .bind(volname)
        .fetch_one(&self.pool)
        .await?;
        let used: Option<i64> = row.try_get("used")?;
        Ok(used.unwrap_or(0))
    }

    async fn available_space(&self) -> Result<HashMap<String, i64>, InventoryError> {
        let mut out = self.volume_capacities().await?;
        for (volume, used) in self.sum_cached_sizes().await? {
            if let Some(avail) = out.get_mut(&volume) {
                *avail -= used;
            }
        }
        Ok(out)
    }

    async fn used_space(&self) -> Result<HashMap<String, i64>, InventoryError> {
        let mut out: HashMap<String, i64> = self
            .volumes()
            .await?
            .into_iter()
            .map(|name| (name, 0))
            .collect();
        for (volume, used) in self.sum_cached_sizes().await? {
            out.insert(volume, used);
        }
        Ok(out)
    }

    async fn volume_capacities(&self) -> Result<HashMap<String, i64>, InventoryError> {
        let rows = sqlx::query("SELECT name, capacity FROM volumes")
            .fetch_all(&self.pool)
            .await?;
        let mut out = HashMap::with_capacity(rows.len());
        for row in rows {
            out.insert(
                row.try_get::<String, _>("name")?,
                row.try_get::<i64, _>("capacity")?,
            );
        }
        Ok(out)
    }

    async fn register_volume(
        &self,
        name: &str,
        capacity: i64,
        metadata: Option<&Map<String, Value>>,
    ) -> Result<(), InventoryError> {
        let _guard = self.write_lock.lock().await;

        let mut priority: Option<i64> = None;
        let mut status = VolumeStatus::Update;
        let mut encoded: Option<String> = None;
        if let Some(md) = metadata {
            priority = typed_i64(md, "priority")?;
            if let Some(level) = typed_i64(md, "status")? {
                status = VolumeStatus::from_level(level).ok_or(InventoryError::Metadata {
                    field: "status".to_string(),
                })?;
            }
            encoded = Some(encode_metadata(md)?);
        }

        sqlx::query(
            "INSERT INTO volumes (name, capacity, priority, status, metadata) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(name) DO UPDATE SET \
                capacity = excluded.capacity, \
                priority = excluded.priority, \
                status = excluded.status, \
                metadata = excluded.metadata",
        )
        .bind(name)
        .bind(capacity)
        .bind(priority)
        .bind(status.level())
        .bind(&encoded)
        .execute(&self.pool)
        .await?;

        debug!(volume = name, capacity, status = ?status, "registered volume");
        metrics::record_catalog_op("register_volume", "success");
        Ok(())
    }

    async fn volume_info(&self, name: &str) -> Result<VolumeInfo, InventoryError> {
        let row = sqlx::query(
            "SELECT capacity, priority, status, metadata FROM volumes WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| InventoryError::VolumeNotFound(name.to_string()))?;

        let level: i64 = row.try_get("status")?;
        let status = VolumeStatus::from_level(level)
            .ok_or_else(|| InventoryError::Backend(format!("invalid volume status: {level}")))?;
        let metadata = match row.try_get::<Option<String>, _>("metadata")? {
            Some(encoded) => parse_metadata(&encoded)?,
            None => Map::new(),
        };

        Ok(VolumeInfo {
            name: name.to_string(),
            capacity: row.try_get("capacity")?,
            priority: row.try_get::<Option<i64>, _>("priority")?,
            status,
            metadata,
        })
    }

    async fn set_volume_status(
        &self,
        name: &str,
        status: VolumeStatus,
    ) -> Result<(), InventoryError> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("UPDATE volumes SET status = ? WHERE name = ?")
            .bind(status.level())
            .bind(name)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(InventoryError::VolumeNotFound(name.to_string()));
        }
        Ok(())
    }

    async fn volume_status(&self, name: &str) -> Result<VolumeStatus, InventoryError> {
        Ok(self.volume_info(name).await?.status)
    }

    async fn volumes(&self) -> Result<Vec<String>, InventoryError> {
        let rows = sqlx::query("SELECT name FROM volumes ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(Into::into))
            .collect()
    }

    async fn register_algorithm(&self, name: &str) -> Result<(), InventoryError> {
        let _guard = self.write_lock.lock().await;
        sqlx::query("INSERT OR IGNORE INTO algorithms (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn checksum_algorithms(&self) -> Result<Vec<String>, InventoryError> {
        let rows = sqlx::query("SELECT name FROM algorithms ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(Into::into))
            .collect()
    }
}

/// Read an integer metadatum, failing with the offending field name when the
/// key is present with the wrong shape.
fn typed_i64(md: &Map<String, Value>, field: &str) -> Result<Option<i64>, InventoryError> {
    match md.get(field) {
        None => Ok(None),
        Some(v) => v.as_i64().map(Some).ok_or(InventoryError::Metadata {
            field: field.to_string(),
        }),
    }
}

/// Read a string metadatum, failing with the offending field name when the
/// key is present with the wrong shape.
fn typed_str(md: &Map<String, Value>, field: &str) -> Result<Option<String>, InventoryError> {
    match md.get(field) {
        None => Ok(None),
        Some(v) => v
            .as_str()
            .map(|s| Some(s.to_string()))
            .ok_or(InventoryError::Metadata {
                field: field.to_string(),
            }),
    }
}

fn encode_metadata(md: &Map<String, Value>) -> Result<String, InventoryError> {
    serde_json::to_string(&Value::Object(md.clone()))
        .map_err(|e| InventoryError::Backend(format!("metadata encoding failure: {e}")))
}

fn parse_metadata(encoded: &str) -> Result<Map<String, Value>, InventoryError> {
    match serde_json::from_str::<Value>(encoded) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(InventoryError::Backend(
            "metadata is not a JSON object".to_string(),
        )),
        Err(e) => Err(InventoryError::Backend(format!(
            "metadata parsing failure: {e}"
        ))),
    }
}
