//! Game settings
//!
//! Loaded from an optional JSON file next to the binary. Missing fields fall
//! back to defaults, a missing file means all defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{FIRE_COOLDOWN_MS, TICK_MS};
use crate::error::{Error, Result};

/// Runtime settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Timing ===
    /// Simulation tick period
    pub tick_interval_ms: u64,
    /// Render period
    pub frame_interval_ms: u64,
    /// Minimum time between accepted shots
    pub fire_cooldown_ms: u64,

    // === Simulation ===
    /// Fixed RNG seed; fresh entropy per run when unset
    pub seed: Option<u64>,

    // === Storage ===
    /// Score file for the JSON-backed store
    pub score_store_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_MS,
            frame_interval_ms: 33,
            fire_cooldown_ms: FIRE_COOLDOWN_MS,
            seed: None,
            score_store_path: "star_swarm_scores.json".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or defaults if the file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let json = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }

    /// Reject values the loops cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(Error::InvalidSettings(
                "tick_interval_ms must be positive".into(),
            ));
        }
        if self.frame_interval_ms == 0 {
            return Err(Error::InvalidSettings(
                "frame_interval_ms must be positive".into(),
            ));
        }
        if self.score_store_path.trim().is_empty() {
            return Err(Error::InvalidSettings("score_store_path is empty".into()));
        }
        Ok(())
    }

    /// Seed for the next run
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(rand::random)
    }
}
