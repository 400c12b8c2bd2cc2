//! Game balance settings
//!
//! Fixed geometry lives in [`crate::consts`]; everything a designer may want
//! to retune without touching the simulation lives here and round-trips
//! through JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading settings
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Difficulty presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Difficulty {
    Relaxed,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Relaxed => "Relaxed",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "relaxed" | "easy" => Some(Difficulty::Relaxed),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Seconds between row replenishments
    pub fn replenish_interval(&self) -> f64 {
        match self {
            Difficulty::Relaxed => 14.0,
            Difficulty::Normal => 10.0,
            Difficulty::Hard => 7.0,
        }
    }

    /// Seconds a lost ball stays dormant
    pub fn revive_delay(&self) -> f64 {
        match self {
            Difficulty::Relaxed => 20.0,
            Difficulty::Normal => 30.0,
            Difficulty::Hard => 40.0,
        }
    }
}

/// Tunable game balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub difficulty: Difficulty,

    // === Lives ===
    pub initial_lives: u32,

    // === Block field ===
    /// Seconds between row shifts
    pub replenish_interval: f64,

    // === Balls ===
    /// Seconds a lost ball waits off-screen before returning
    pub revive_delay: f64,
    /// Delay between staggered launches of queued balls
    pub launch_stagger: f64,

    // === Star combo ===
    /// Block hits a Star ball needs to fire a combo
    pub required_combo_count: u32,
    /// Blocks broken per combo batch
    pub combo_batch_size: usize,
    /// Seconds between combo batches
    pub combo_batch_interval: f64,
    /// A bonus life is granted on every Nth chained combo
    pub combo_chain_bonus_every: u32,

    // === Messages ===
    pub all_balls_lost_duration: f64,
    pub laser_hit_message_duration: f64,
}

impl Default for Settings {
    fn default() -> Self {
        let difficulty = Difficulty::Normal;
        Self {
            difficulty,
            initial_lives: 3,
            replenish_interval: difficulty.replenish_interval(),
            revive_delay: difficulty.revive_delay(),
            launch_stagger: 0.15,
            required_combo_count: 7,
            combo_batch_size: 3,
            combo_batch_interval: 0.05,
            combo_chain_bonus_every: 2,
            all_balls_lost_duration: 2.0,
            laser_hit_message_duration: 2.0,
        }
    }
}

impl Settings {
    /// Create settings from a difficulty preset
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        let mut settings = Self::default();
        settings.apply_difficulty(difficulty);
        settings
    }

    /// Apply a difficulty preset (updates difficulty-dependent settings)
    pub fn apply_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
        self.replenish_interval = difficulty.replenish_interval();
        self.revive_delay = difficulty.revive_delay();
    }

    /// Parse and validate settings from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!(
            "Loaded settings from {} ({})",
            path.as_ref().display(),
            settings.difficulty.as_str()
        );
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would stall or divide the simulation by zero
    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |field, reason| Err(SettingsError::Invalid { field, reason });

        if self.initial_lives == 0 {
            return invalid("initial_lives", "must be at least 1");
        }
        if !(self.replenish_interval > 0.0) {
            return invalid("replenish_interval", "must be positive");
        }
        if !(self.revive_delay >= 0.0) {
            return invalid("revive_delay", "must not be negative");
        }
        if !(self.launch_stagger >= 0.0) {
            return invalid("launch_stagger", "must not be negative");
        }
        if self.required_combo_count == 0 {
            return invalid("required_combo_count", "must be at least 1");
        }
        if self.combo_batch_size == 0 {
            return invalid("combo_batch_size", "must be at least 1");
        }
        if !(self.combo_batch_interval > 0.0) {
            return invalid("combo_batch_interval", "must be positive");
        }
        if self.combo_chain_bonus_every == 0 {
            return invalid("combo_chain_bonus_every", "must be at least 1");
        }
        Ok(())
    }
}
