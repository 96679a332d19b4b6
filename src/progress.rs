//! Level progress: which levels are unlocked and the best stars on each
//!
//! Persisted as JSON. Updates are max-merges, so replaying an outcome is
//! harmless.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::sim::{GameEvent, LEVEL_COUNT};

/// Levels tracked by the progress ledger: the whole catalogue
pub const TRACKED_LEVELS: u32 = LEVEL_COUNT;
/// Best possible rating
pub const MAX_STARS: u8 = 3;

/// Progress on a single level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LevelProgress {
    pub stars: u8,
    pub unlocked: bool,
}

/// Unlock/star ledger keyed by level id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub levels: BTreeMap<u32, LevelProgress>,
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    /// Fresh ledger: level 1 unlocked, nothing else
    pub fn new() -> Self {
        let levels = (1..=TRACKED_LEVELS)
            .map(|id| {
                (
                    id,
                    LevelProgress {
                        stars: 0,
                        unlocked: id == 1,
                    },
                )
            })
            .collect();
        Self { levels }
    }

    pub fn get(&self, level_id: u32) -> Option<LevelProgress> {
        self.levels.get(&level_id).copied()
    }

    pub fn is_unlocked(&self, level_id: u32) -> bool {
        self.get(level_id).is_some_and(|p| p.unlocked)
    }

    /// Unlock a tracked level (untracked ids are ignored)
    pub fn unlock_level(&mut self, level_id: u32) {
        if let Some(level) = self.levels.get_mut(&level_id) {
            if !level.unlocked {
                level.unlocked = true;
                log::info!("Unlocked level {}", level_id);
            }
        }
    }

    /// Record a win: keep the best star count and unlock the next level.
    /// Returns true if the star record improved.
    pub fn complete_level(&mut self, level_id: u32, stars: u8) -> bool {
        let stars = stars.min(MAX_STARS);
        let Some(level) = self.levels.get_mut(&level_id) else {
            log::warn!("Ignoring completion of untracked level {}", level_id);
            return false;
        };
        let improved = stars > level.stars;
        level.stars = level.stars.max(stars);
        self.unlock_level(level_id + 1);
        improved
    }

    /// Apply a simulation event; only `LevelWon` changes anything
    pub fn record(&mut self, event: &GameEvent) -> bool {
        match *event {
            GameEvent::LevelWon { level_id, stars } => self.complete_level(level_id, stars),
            _ => false,
        }
    }

    /// Stars across all levels
    pub fn total_stars(&self) -> u32 {
        self.levels.values().map(|p| p.stars as u32).sum()
    }

    /// Highest unlocked level id
    pub fn highest_unlocked(&self) -> u32 {
        self.levels
            .iter()
            .filter(|(_, p)| p.unlocked)
            .map(|(&id, _)| id)
            .max()
            .unwrap_or(1)
    }

    /// Forget everything
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Load progress from a JSON file, starting fresh if missing or corrupt
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No progress found, starting fresh");
            return Self::new();
        }
        match Self::read(path) {
            Ok(progress) => {
                log::info!("Loaded progress ({} stars)", progress.total_stars());
                progress
            }
            Err(e) => {
                log::warn!("Ignoring unreadable progress: {:#}", e);
                Self::new()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("reading progress from {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("parsing {}", path.display()))
    }

    /// Save progress via a temp file so a crash never leaves half a ledger
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json).with_context(|| format!("writing {}", tmp.display()))?;
        fs::rename(&tmp, path).with_context(|| format!("replacing {}", path.display()))?;
        log::info!("Progress saved ({} stars)", self.total_stars());
        Ok(())
    }
}
