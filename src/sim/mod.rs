//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by slot ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod level;
pub mod particles;
pub mod state;
pub mod tick;

pub use collision::{CollisionResult, resolve_shot, star_rating};
pub use level::{Difficulty, LEVEL_COUNT, LevelConfig, all_levels, generate};
pub use particles::{Particle, ParticlePool};
pub use state::{GameEvent, GameState, ItemKind, Outcome, RingItem, Shot};
pub use tick::{TickInput, effective_rotation_speed, fire_shot, tick};
