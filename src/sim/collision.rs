//! Hit detection against the rotating ring and star rating
//!
//! The ring turns under a stationary pigeon, so a shot is resolved purely in
//! angle space: whichever item sits nearest the firing angle is eaten, as
//! long as it lies inside the acceptance window.

use std::collections::BTreeMap;

use super::state::RingItem;
use crate::circular_distance;

/// Result of resolving a shot against the ring
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollisionResult {
    /// Nearest item and its angular distance from the firing angle
    Hit { slot: u32, distance: f32 },
    /// Nothing within the acceptance window
    Miss,
}

/// Find the item nearest `firing_angle` within `window` radians.
///
/// Equidistant items resolve to the lowest slot id (the map iterates in id
/// order and only a strictly closer item replaces the current best).
pub fn resolve_shot(ring: &BTreeMap<u32, RingItem>, firing_angle: f32, window: f32) -> CollisionResult {
    let mut best: Option<(u32, f32)> = None;
    for item in ring.values() {
        let distance = circular_distance(item.angle, firing_angle);
        match best {
            Some((_, best_distance)) if distance >= best_distance => {}
            _ => best = Some((item.id, distance)),
        }
    }

    match best {
        Some((slot, distance)) if distance < window => CollisionResult::Hit { slot, distance },
        _ => CollisionResult::Miss,
    }
}

/// Stars for a won round, from misses alone
pub fn star_rating(misses: u32) -> u8 {
    match misses {
        0 => 3,
        1..=2 => 2,
        _ => 1,
    }
}
