//! Game settings and tunable simulation constants
//!
//! Persisted as JSON next to the progress file.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::consts::{COMBO_WINDOW_SECS, DEFAULT_ACCEPTANCE_WINDOW};
use crate::sim::level::Difficulty;
use crate::sim::particles::DEFAULT_CAPACITY;

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Gameplay tuning ===
    /// Angular tolerance for a hit (radians). A heuristic, not a law.
    pub acceptance_window: f32,
    /// Seconds between seed hits that keep a combo going
    pub combo_window_secs: f32,
    /// Chance that a ring slot is a worm, per difficulty
    pub hazard_chance_easy: f32,
    pub hazard_chance_normal: f32,
    pub hazard_chance_hard: f32,
    /// Speed wobble as a fraction of base rotation speed
    pub speed_variation_amplitude: f32,

    // === Visual Effects ===
    /// Particle effects (crumbs, trail, confetti)
    pub particles: bool,
    /// Particle pool capacity
    pub particle_capacity: usize,
    /// Floating "+1" / "Miss!" text
    pub floating_text: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            acceptance_window: DEFAULT_ACCEPTANCE_WINDOW,
            combo_window_secs: COMBO_WINDOW_SECS,
            hazard_chance_easy: 0.1,
            hazard_chance_normal: 0.2,
            hazard_chance_hard: 0.3,
            speed_variation_amplitude: 0.1,

            particles: true,
            particle_capacity: DEFAULT_CAPACITY,
            floating_text: true,
        }
    }
}

impl Settings {
    /// Worm probability for a difficulty tier
    pub fn hazard_chance(&self, difficulty: Difficulty) -> f32 {
        match difficulty {
            Difficulty::Easy => self.hazard_chance_easy,
            Difficulty::Normal => self.hazard_chance_normal,
            Difficulty::Hard => self.hazard_chance_hard,
        }
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.particle_capacity
        }
    }

    /// Problems with hand-edited values, one message per field
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if !(self.acceptance_window.is_finite() && self.acceptance_window > 0.0) {
            warnings.push(format!(
                "acceptance_window ({}) must be a positive number",
                self.acceptance_window
            ));
        }
        if !(self.combo_window_secs.is_finite() && self.combo_window_secs >= 0.0) {
            warnings.push(format!(
                "combo_window_secs ({}) must be zero or more",
                self.combo_window_secs
            ));
        }
        for (name, chance) in [
            ("hazard_chance_easy", self.hazard_chance_easy),
            ("hazard_chance_normal", self.hazard_chance_normal),
            ("hazard_chance_hard", self.hazard_chance_hard),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                warnings.push(format!("{} ({}) must be within 0..=1", name, chance));
            }
        }
        if !(0.0..=1.0).contains(&self.speed_variation_amplitude) {
            warnings.push(format!(
                "speed_variation_amplitude ({}) must be within 0..=1",
                self.speed_variation_amplitude
            ));
        }
        warnings
    }

    /// Replace invalid fields with their defaults. NaN counts as invalid.
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.acceptance_window.is_finite() && self.acceptance_window > 0.0) {
            self.acceptance_window = defaults.acceptance_window;
        }
        if !(self.combo_window_secs.is_finite() && self.combo_window_secs >= 0.0) {
            self.combo_window_secs = defaults.combo_window_secs;
        }
        let fix_unit = |value: f32, default: f32| {
            if (0.0..=1.0).contains(&value) { value } else { default }
        };
        self.hazard_chance_easy = fix_unit(self.hazard_chance_easy, defaults.hazard_chance_easy);
        self.hazard_chance_normal = fix_unit(self.hazard_chance_normal, defaults.hazard_chance_normal);
        self.hazard_chance_hard = fix_unit(self.hazard_chance_hard, defaults.hazard_chance_hard);
        self.speed_variation_amplitude =
            fix_unit(self.speed_variation_amplitude, defaults.speed_variation_amplitude);
        self
    }

    /// Load settings from a JSON file, falling back to defaults.
    /// Invalid fields are reset to their defaults with a warning.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::info!("Using default settings");
            return Self::default();
        }
        match Self::read(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                let warnings = settings.validate();
                for warning in &warnings {
                    log::warn!("Settings: {}, using default", warning);
                }
                if warnings.is_empty() { settings } else { settings.sanitized() }
            }
            Err(e) => {
                log::warn!("Ignoring unreadable settings: {:#}", e);
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
    }

    /// Save settings as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("writing settings to {}", path.display()))?;
        log::info!("Settings saved");
        Ok(())
    }
}
