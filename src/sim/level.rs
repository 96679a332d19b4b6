//! Level configuration generator
//!
//! Every level is derived from its index alone, so a level can be replayed
//! (and tested) without any stored data.

use serde::{Deserialize, Serialize};

/// Number of levels in the catalogue
pub const LEVEL_COUNT: u32 = 24;
/// Maximum ring slots on any level
pub const MAX_ITEMS: u32 = 20;
/// Ring slots on level 1
pub const BASE_ITEMS: u32 = 6;

/// Rotation speed on level 0 (radians/sec)
pub const BASE_ROTATION_SPEED: f32 = 1.2;
/// Rotation speed added per level (radians/sec)
pub const ROTATION_SPEED_PER_LEVEL: f32 = 0.12;
/// Extra rotation speed once a level is hard (radians/sec)
pub const HARD_ROTATION_BONUS: f32 = 1.2;

/// Last level that is still easy
pub const EASY_MAX_LEVEL: u32 = 5;
/// Last level that is still normal
pub const NORMAL_MAX_LEVEL: u32 = 12;

/// Difficulty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }
}

/// Immutable parameters of one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfig {
    pub id: u32,
    pub name: String,
    pub difficulty: Difficulty,
    /// Number of ring slots
    pub item_count: u32,
    /// Collectible targets before hazards are rolled (same cap as `item_count`)
    pub initial_ammo: u32,
    /// Base rotation speed (radians/sec, always positive)
    pub rotation_speed: f32,
    /// +1 or -1
    pub rotation_direction: f32,
    /// Whether rotation speed wobbles over time
    pub speed_variation: bool,
}

/// Generate the configuration for a 1-based level index.
///
/// Index 0 is outside the contract; it is treated as level 1 so the
/// arithmetic stays total.
pub fn generate(index: u32) -> LevelConfig {
    let index = index.max(1);

    // Cap the steps before multiplying so huge indices cannot overflow
    let steps = ((index - 1) / 2).min((MAX_ITEMS - BASE_ITEMS) / 2);
    let item_count = BASE_ITEMS + steps * 2;

    let difficulty = if index > NORMAL_MAX_LEVEL {
        Difficulty::Hard
    } else if index > EASY_MAX_LEVEL {
        Difficulty::Normal
    } else {
        Difficulty::Easy
    };

    let mut rotation_speed = BASE_ROTATION_SPEED + index as f32 * ROTATION_SPEED_PER_LEVEL;
    if difficulty == Difficulty::Hard {
        rotation_speed += HARD_ROTATION_BONUS;
    }

    LevelConfig {
        id: index,
        name: format!("Level {}", index),
        difficulty,
        item_count,
        initial_ammo: item_count,
        rotation_speed,
        rotation_direction: if index.is_multiple_of(2) { 1.0 } else { -1.0 },
        speed_variation: difficulty >= Difficulty::Normal,
    }
}

/// The full level catalogue, ordered by id
pub fn all_levels() -> Vec<LevelConfig> {
    (1..=LEVEL_COUNT).map(generate).collect()
}
