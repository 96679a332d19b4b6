//! Fixed-capacity particle pool for eating crumbs, flight trail and confetti
//!
//! Purely visual. Gameplay never reads particles back.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Default pool capacity
pub const DEFAULT_CAPACITY: usize = 200;
/// Downward acceleration per update
pub const GRAVITY: f32 = 0.5;
/// Life lost per update
pub const LIFE_DECAY: f32 = 0.05;

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: u32, // 0xRRGGBBAA
    pub life: f32,  // 0-1, decreases over time
    pub size: f32,
    pub active: bool,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            color: 0xFFFF_FFFF,
            life: 0.0,
            size: 0.0,
            active: false,
        }
    }
}

/// Preallocated particle slots.
///
/// `spawn` is best-effort: once every slot is active, further spawns are
/// dropped instead of growing the pool.
#[derive(Debug, Clone)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    rng: Pcg32,
}

impl Default for ParticlePool {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, 0)
    }
}

impl ParticlePool {
    pub fn new(capacity: usize, seed: u64) -> Self {
        Self::from_rng(capacity, Pcg32::seed_from_u64(seed))
    }

    /// Pool drawing jitter from an existing generator
    pub fn from_rng(capacity: usize, rng: Pcg32) -> Self {
        Self {
            particles: vec![Particle::default(); capacity],
            rng,
        }
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.active).count()
    }

    /// Active particles, for drawing
    pub fn iter_active(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.active)
    }

    /// Activate up to `count` free slots at `pos`. Returns how many spawned.
    pub fn spawn(&mut self, pos: Vec2, color: u32, count: usize, speed: f32) -> usize {
        let mut spawned = 0;
        for p in self.particles.iter_mut() {
            if spawned >= count {
                break;
            }
            if p.active {
                continue;
            }
            p.active = true;
            p.pos = pos;
            p.vel = Vec2::new(
                (self.rng.random::<f32>() - 0.5) * speed,
                (self.rng.random::<f32>() - 0.5) * speed,
            );
            p.life = 1.0;
            p.color = color;
            p.size = self.rng.random::<f32>() * 4.0 + 2.0;
            spawned += 1;
        }
        if spawned < count {
            log::trace!("Particle pool saturated, dropped {}", count - spawned);
        }
        spawned
    }

    /// Move, apply gravity, decay and retire particles
    pub fn update(&mut self) {
        for p in self.particles.iter_mut().filter(|p| p.active) {
            p.pos += p.vel;
            p.vel.y += GRAVITY;
            p.life -= LIFE_DECAY;
            if p.life <= 0.0 {
                p.active = false;
            }
        }
    }

    /// Deactivate everything (level restart)
    pub fn reset(&mut self) {
        for p in self.particles.iter_mut() {
            p.active = false;
        }
    }
}
