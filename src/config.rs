//! Configuration for the cache inventory engine.
//!
//! # Example
//!
//! ```
//! use repocache::InventoryConfig;
//!
//! // Minimal config (uses defaults)
//! let config = InventoryConfig::default();
//! assert_eq!(config.deletion_headroom, 0.02);
//! assert_eq!(config.selection_headroom, 0.20);
//!
//! // Full config
//! let config = InventoryConfig {
//!     db_url: Some("sqlite:inventory.db".into()),
//!     selection_row_cap: 2000,
//!     ..Default::default()
//! };
//! ```

use serde::Deserialize;

/// Configuration for the inventory catalog and deletion planner.
///
/// All fields have sensible defaults. At minimum, you should configure
/// `db_url` for production use.
#[derive(Debug, Clone, Deserialize)]
pub struct InventoryConfig {
    /// SQLite connection string (e.g., "sqlite:inventory.db")
    #[serde(default)]
    pub db_url: Option<String>,

    /// Fractional overhead applied to a requested free-space size before
    /// deciding whether eviction is needed. Absorbs inaccuracies in recorded
    /// sizes and keeps a sliver of slack in each volume (default: 2%).
    #[serde(default = "default_deletion_headroom")]
    pub deletion_headroom: f64,

    /// Fractional overhead applied when sizing a selection strategy, so a few
    /// unremovable candidates don't sink a plan (default: 20%).
    #[serde(default = "default_selection_headroom")]
    pub selection_headroom: f64,

    /// Hard cap on rows scanned by a single candidate-selection query,
    /// bounding worst-case cost even if a strategy never reports its limit
    /// reached (default: 5000).
    #[serde(default = "default_selection_row_cap")]
    pub selection_row_cap: u32,

    /// Max connections for the SQLite pool (default: 8).
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_deletion_headroom() -> f64 { 0.02 }
fn default_selection_headroom() -> f64 { 0.20 }
fn default_selection_row_cap() -> u32 { 5000 }
fn default_max_connections() -> u32 { 8 }

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            db_url: None,
            deletion_headroom: default_deletion_headroom(),
            selection_headroom: default_selection_headroom(),
            selection_row_cap: default_selection_row_cap(),
            max_connections: default_max_connections(),
        }
    }
}
