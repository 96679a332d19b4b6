//! Game state and core simulation types
//!
//! One `GameState` per level attempt. Dropping it abandons the attempt.

use std::collections::BTreeMap;
use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::level::LevelConfig;
use super::particles::ParticlePool;
use crate::consts::*;
use crate::settings::Settings;
use crate::{normalize_angle, polar_to_cartesian};

/// What sits in a ring slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    /// Collectible; eat them all to win
    Seed,
    /// Worm; eating one loses the round
    Hazard,
}

/// An item stuck on the rotating target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingItem {
    pub id: u32,
    /// Angle on the target in target space (radians, [0, 2π))
    pub angle: f32,
    pub kind: ItemKind,
}

/// The pigeon in flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    /// Distance from target center
    pub radial_position: f32,
}

impl Shot {
    pub fn new() -> Self {
        Self {
            radial_position: LAUNCH_OFFSET,
        }
    }

    /// Whether the pigeon is close enough to eat
    pub fn reached_target(&self) -> bool {
        self.radial_position <= TARGET_RADIUS + EATING_RANGE
    }
}

impl Default for Shot {
    fn default() -> Self {
        Self::new()
    }
}

/// Round outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    InProgress,
    Won { stars: u8 },
    Lost,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

/// Things that happened during a tick, for sound/visual feedback and the
/// level lifecycle. Emitted after the gameplay mutation they describe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ShotFired,
    SeedEaten { slot: u32, combo: u32 },
    Missed,
    HazardEaten { slot: u32 },
    LevelWon { level_id: u32, stars: u8 },
    LevelLost { level_id: u32 },
}

/// "+1" / "Combo x3!" / "Miss!" text drifting up from the target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingText {
    pub pos: Vec2,
    pub text: String,
    pub color: u32,
    pub life: f32,
}

/// Expanding ring drawn where a seed was eaten
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitEffect {
    pub pos: Vec2,
    pub radius: f32,
    pub width: f32,
    pub color: u32,
    pub life: f32,
}

/// PCG stream that places hazards
pub const HAZARD_STREAM: u64 = 0;
/// PCG stream for particle jitter
pub const PARTICLE_STREAM: u64 = 1;

/// RNG state wrapper for serialization.
///
/// One seed per attempt; gameplay and cosmetics draw from separate PCG
/// streams of it so effects never shift the hazard layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub stream: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            stream: HAZARD_STREAM,
        }
    }

    /// Same seed on another stream
    pub fn with_stream(&self, stream: u64) -> Self {
        Self {
            seed: self.seed,
            stream,
        }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::new(self.seed, self.stream)
    }
}

/// Complete state of one level attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Level being played (read once at attempt start)
    pub level: LevelConfig,
    /// Seed used for hazard placement
    pub rng_state: RngState,
    /// Tunables captured at attempt start
    pub settings: Settings,
    /// Target rotation (radians, [0, 2π))
    pub rotation: f32,
    /// Items still on the target, keyed by slot id
    pub ring: BTreeMap<u32, RingItem>,
    /// Pigeon in flight, if any
    pub shot: Option<Shot>,
    /// Seeds left to eat
    pub remaining_seeds: u32,
    /// Consecutive quick seed hits
    pub combo: u32,
    /// Shots that hit nothing
    pub misses: u32,
    pub outcome: Outcome,
    /// Simulation clock (seconds since attempt start)
    pub elapsed: f32,
    /// Clock time of the last seed hit
    pub last_hit_time: Option<f32>,
    pub paused: bool,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Angles of eaten seeds (decoration)
    pub peck_marks: Vec<f32>,
    /// Events since the last `drain_events`
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    /// Visual-only state
    #[serde(skip)]
    pub floating_texts: Vec<FloatingText>,
    #[serde(skip)]
    pub hit_effects: Vec<HitEffect>,
    #[serde(skip)]
    pub particles: ParticlePool,
}

impl GameState {
    /// Start an attempt with hazards rolled from `seed`
    pub fn new(level: LevelConfig, settings: Settings, seed: u64) -> Self {
        let rng_state = RngState::new(seed);
        let mut rng = rng_state.to_rng();
        let chance = settings.hazard_chance(level.difficulty);
        let kinds: Vec<ItemKind> = (0..level.item_count)
            .map(|_| {
                if rng.random::<f32>() < chance {
                    ItemKind::Hazard
                } else {
                    ItemKind::Seed
                }
            })
            .collect();
        Self::with_layout(level, settings, rng_state, &kinds)
    }

    /// Start an attempt with an explicit slot layout (replays and tests).
    /// `kinds` is indexed by slot; its length decides the slot count.
    pub fn from_kinds(level: LevelConfig, settings: Settings, kinds: &[ItemKind]) -> Self {
        Self::with_layout(level, settings, RngState::new(0), kinds)
    }

    fn with_layout(
        level: LevelConfig,
        settings: Settings,
        rng_state: RngState,
        kinds: &[ItemKind],
    ) -> Self {
        let count = kinds.len();
        let mut ring: BTreeMap<u32, RingItem> = kinds
            .iter()
            .enumerate()
            .map(|(i, &kind)| {
                let id = i as u32;
                let angle = normalize_angle(std::f32::consts::TAU * i as f32 / count as f32);
                (id, RingItem { id, angle, kind })
            })
            .collect();

        // A level must always be winnable
        if !ring.values().any(|item| item.kind == ItemKind::Seed) {
            if let Some(first) = ring.get_mut(&0) {
                log::debug!("No seeds rolled, forcing slot 0 to a seed");
                first.kind = ItemKind::Seed;
            }
        }

        let remaining_seeds = ring
            .values()
            .filter(|item| item.kind == ItemKind::Seed)
            .count() as u32;

        log::info!(
            "Level {} ({}) start: {} slots, {} seeds",
            level.id,
            level.difficulty.as_str(),
            ring.len(),
            remaining_seeds
        );

        let particles = ParticlePool::from_rng(
            settings.max_particles(),
            rng_state.with_stream(PARTICLE_STREAM).to_rng(),
        );

        Self {
            level,
            rng_state,
            settings,
            rotation: 0.0,
            ring,
            shot: None,
            remaining_seeds,
            combo: 0,
            misses: 0,
            outcome: Outcome::InProgress,
            elapsed: 0.0,
            last_hit_time: None,
            paused: false,
            time_ticks: 0,
            peck_marks: Vec::new(),
            events: Vec::new(),
            floating_texts: Vec::new(),
            hit_effects: Vec::new(),
            particles,
        }
    }

    /// Angle on the target currently under the pigeon's flight path
    pub fn firing_angle(&self) -> f32 {
        normalize_angle(-self.rotation)
    }

    /// Items in slot order
    pub fn items(&self) -> impl Iterator<Item = &RingItem> {
        self.ring.values()
    }

    /// Screen-space position of a ring item relative to target center.
    /// Angle 0 points down (y grows downward) toward the pigeon.
    pub fn item_position(&self, item: &RingItem) -> Vec2 {
        polar_to_cartesian(TARGET_RADIUS, item.angle + self.rotation + FRAC_PI_2)
    }

    /// Screen-space position of the pigeon in flight
    pub fn shot_position(&self) -> Option<Vec2> {
        self.shot.map(|s| Vec2::new(0.0, s.radial_position))
    }

    /// Stars earned, once won
    pub fn stars(&self) -> Option<u8> {
        match self.outcome {
            Outcome::Won { stars } => Some(stars),
            _ => None,
        }
    }

    /// Take all events emitted since the last call
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::generate;
    use std::f32::consts::TAU;

    #[test]
    fn test_slots_evenly_spaced() {
        let state = GameState::from_kinds(generate(1), Settings::default(), &[ItemKind::Seed; 6]);
        let angles: Vec<f32> = state.items().map(|i| i.angle).collect();
        assert_eq!(angles.len(), 6);
        for (i, angle) in angles.iter().enumerate() {
            assert!((angle - TAU * i as f32 / 6.0).abs() < 1e-5);
        }
        assert_eq!(state.remaining_seeds, 6);
    }

    #[test]
    fn test_all_hazards_forces_one_seed() {
        let state = GameState::from_kinds(generate(1), Settings::default(), &[ItemKind::Hazard; 4]);
        assert_eq!(state.remaining_seeds, 1);
        assert_eq!(state.ring[&0].kind, ItemKind::Seed);
        assert_eq!(state.ring[&1].kind, ItemKind::Hazard);
    }

    #[test]
    fn test_seeded_layout_reproducible() {
        let a = GameState::new(generate(14), Settings::default(), 42);
        let b = GameState::new(generate(14), Settings::default(), 42);
        assert_eq!(a.ring, b.ring);
        assert_eq!(a.remaining_seeds, b.remaining_seeds);
        assert!(a.remaining_seeds >= 1);
        assert_eq!(a.ring.len(), generate(14).item_count as usize);
    }

    #[test]
    fn test_rng_streams_differ() {
        let state = GameState::new(generate(14), Settings::default(), 42);
        assert_eq!(state.rng_state, RngState::new(42));
        assert_eq!(state.rng_state.stream, HAZARD_STREAM);

        let mut hazards = state.rng_state.to_rng();
        let mut cosmetic = state.rng_state.with_stream(PARTICLE_STREAM).to_rng();
        let a: Vec<u32> = (0..8).map(|_| hazards.random()).collect();
        let b: Vec<u32> = (0..8).map(|_| cosmetic.random()).collect();
        assert_ne!(a, b);

        // Same seed and stream replays the same draws
        let mut again = RngState::new(42).to_rng();
        let c: Vec<u32> = (0..8).map(|_| again.random()).collect();
        assert_eq!(a, c);
    }

    #[test]
    fn test_certain_hazards_still_winnable() {
        let settings = Settings {
            hazard_chance_easy: 1.0,
            ..Default::default()
        };
        let state = GameState::new(generate(1), settings, 5);
        assert_eq!(state.remaining_seeds, 1);
    }

    #[test]
    fn test_aligned_item_sits_at_eat_point() {
        let mut state = GameState::from_kinds(generate(1), Settings::default(), &[ItemKind::Seed; 4]);
        state.rotation = normalize_angle(-state.ring[&1].angle);
        let pos = state.item_position(&state.ring[&1]);
        assert!(pos.x.abs() < 1e-3);
        assert!((pos.y - TARGET_RADIUS).abs() < 1e-3);
        assert!((state.firing_angle() - state.ring[&1].angle).abs() < 1e-5);
    }

    #[test]
    fn test_shot_threshold() {
        let mut shot = Shot::new();
        assert!(!shot.reached_target());
        shot.radial_position = TARGET_RADIUS + EATING_RANGE;
        assert!(shot.reached_target());
    }
}
