//! Configuration snapshot contract and persistence seam.
//!
//! The core reads a [`ConfigSnapshot`] at construction and writes one back
//! after every committed mode or theme change. How (and whether) snapshots
//! reach disk is the embedding application's concern: it supplies a
//! [`ConfigStore`] implementation. [`MemoryConfigStore`] is provided for
//! tests and for embedders that persist elsewhere.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::common::{ThemeMode, ThemeType};

fn default_dark_time() -> String {
    "19:00".to_string()
}

fn default_light_time() -> String {
    "07:00".to_string()
}

fn default_true() -> bool {
    true
}

/// Persisted application state, exchanged with the embedding application.
///
/// Field names and defaults follow the on-disk contract; unknown or missing
/// fields deserialize to defaults so a stale snapshot never blocks startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigSnapshot {
    /// The authoritative mode to restore at startup.
    pub current_mode: ThemeMode,
    /// The last theme applied, restored for manual mode.
    pub manual_theme: ThemeType,

    // Schedule mode settings
    pub schedule_enabled: bool,
    #[serde(default = "default_dark_time")]
    pub dark_time: String,
    #[serde(default = "default_light_time")]
    pub light_time: String,

    // Location mode settings
    pub location_enabled: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default = "default_true")]
    pub auto_location: bool,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            current_mode: ThemeMode::Manual,
            manual_theme: ThemeType::Light,
            schedule_enabled: false,
            dark_time: default_dark_time(),
            light_time: default_light_time(),
            location_enabled: false,
            latitude: None,
            longitude: None,
            auto_location: true,
        }
    }
}

/// Persistence seam for configuration snapshots.
///
/// Implementations choose the storage format; the core only guarantees it
/// calls `save` after every committed state change.
pub trait ConfigStore: Send {
    /// Load the current snapshot. Implementations should fall back to
    /// `ConfigSnapshot::default()` rather than failing on corrupt storage.
    fn load(&self) -> ConfigSnapshot;

    /// Persist a snapshot.
    fn save(&mut self, snapshot: &ConfigSnapshot) -> Result<()>;
}

/// In-memory store for tests and storage-less embedders.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    snapshot: ConfigSnapshot,
    save_count: usize,
}

impl MemoryConfigStore {
    pub fn new(snapshot: ConfigSnapshot) -> Self {
        Self {
            snapshot,
            save_count: 0,
        }
    }

    /// Number of times `save` has been called, for test assertions.
    pub fn save_count(&self) -> usize {
        self.save_count
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> ConfigSnapshot {
        self.snapshot.clone()
    }

    fn save(&mut self, snapshot: &ConfigSnapshot) -> Result<()> {
        self.snapshot = snapshot.clone();
        self.save_count += 1;
        Ok(())
    }
}
