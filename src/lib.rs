//! Crazy Pigeon - A rotating-target arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (level generation, ring, shot, collisions)
//! - `progress`: Unlocked levels and best star counts
//! - `settings`: Tunable simulation constants

pub mod progress;
pub mod settings;
pub mod sim;

pub use progress::{LevelProgress, Progress};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one tick per rendered frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;

    /// Radius of the rotating target; ring items sit on its edge
    pub const TARGET_RADIUS: f32 = 120.0;
    /// Visual radius of a ring item
    pub const ITEM_RADIUS: f32 = 12.0;
    /// Distance from target center where the pigeon launches
    pub const LAUNCH_OFFSET: f32 = 350.0;
    /// Extra reach beyond the target edge where the pigeon starts eating
    pub const EATING_RANGE: f32 = 20.0;
    /// Pigeon flight speed (units/s, 12 units per frame at 60 Hz)
    pub const SHOT_SPEED: f32 = 720.0;

    /// Default angular acceptance window for a hit (radians).
    /// Twice the item's angular footprint, so generous on purpose.
    pub const DEFAULT_ACCEPTANCE_WINDOW: f32 = (2.0 * ITEM_RADIUS / TARGET_RADIUS) * 2.0;
    /// Seconds between hits that keep a combo alive
    pub const COMBO_WINDOW_SECS: f32 = 1.5;
}

/// Normalize angle to [0, 2π)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    use std::f32::consts::TAU;
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid can round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU { 0.0 } else { wrapped }
}

/// Shortest angular distance between two angles, in [0, π]
#[inline]
pub fn circular_distance(a: f32, b: f32) -> f32 {
    use std::f32::consts::TAU;
    let diff = (normalize_angle(a) - normalize_angle(b)).abs();
    diff.min(TAU - diff)
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
