//! Fixed timestep simulation tick
//!
//! Core game loop that advances one level attempt deterministically. Time
//! only enters through `dt`; the state keeps its own clock.

use glam::Vec2;

use super::collision::{CollisionResult, resolve_shot, star_rating};
use super::state::{FloatingText, GameEvent, GameState, HitEffect, ItemKind, Outcome, Shot};
use crate::consts::*;
use crate::{circular_distance, normalize_angle};

/// Slowest the target may turn while its speed wobbles (radians/sec)
pub const MIN_ROTATION_SPEED: f32 = 0.6;

/// How much nearer than any worm a seed must be before the autopilot fires
pub const AUTOPILOT_HAZARD_MARGIN: f32 = 0.02;

/// Where the pigeon meets the target (screen space, y down, pigeon below)
pub const EAT_POINT: Vec2 = Vec2::new(0.0, TARGET_RADIUS);

const CRUMB_SHELL: u32 = 0x3E27_23FF;
const CRUMB_KERNEL: u32 = 0xFFEC_B3FF;
const TRAIL: u32 = 0xFFFF_FF66;
const CONFETTI: [u32; 4] = [0xFFD7_00FF, 0xFF40_81FF, 0x00B0_FFFF, 0x76FF_03FF];
const TEXT_PLAIN: u32 = 0xFFFF_FFFF;
const TEXT_COMBO: u32 = 0xFFD7_00FF;
const TEXT_MISS: u32 = 0xE573_73FF;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Send the pigeon (click/tap/space), already debounced by the caller
    pub fire: bool,
    /// Pause toggle
    pub pause: bool,
    /// Idle/demo mode - fire automatically when a seed will line up
    pub idle_mode: bool,
}

/// Advance the attempt by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    // Finished rounds keep their confetti moving but never change again
    if state.outcome.is_terminal() {
        update_cosmetics(state);
        return;
    }

    if input.pause {
        state.paused = !state.paused;
        log::debug!("Paused: {}", state.paused);
    }
    if state.paused {
        return;
    }

    state.time_ticks += 1;
    state.elapsed += dt;

    // Rotate the target
    let speed = effective_rotation_speed(state);
    state.rotation = normalize_angle(state.rotation + speed * state.level.rotation_direction * dt);

    let fire = input.fire || (input.idle_mode && autopilot_wants_fire(state, dt));
    if fire {
        fire_shot(state);
    }

    // Fly the pigeon toward the target
    if let Some(shot) = state.shot.as_mut() {
        shot.radial_position -= SHOT_SPEED * dt;
        let reached = shot.reached_target();
        let trail_pos = Vec2::new(0.0, shot.radial_position + 30.0);

        if state.time_ticks.is_multiple_of(2) {
            state.particles.spawn(trail_pos, TRAIL, 1, 2.0);
        }

        if reached {
            state.shot = None;
            resolve_collision(state);
        }
    }

    update_cosmetics(state);
}

/// Send the pigeon. Returns false (and does nothing) when the round is over,
/// the game is paused, or a pigeon is already in flight.
pub fn fire_shot(state: &mut GameState) -> bool {
    if state.outcome.is_terminal() || state.paused || state.shot.is_some() {
        return false;
    }
    state.shot = Some(Shot::new());
    state.events.push(GameEvent::ShotFired);
    true
}

/// Current rotation speed including the optional wobble (never below
/// `MIN_ROTATION_SPEED`)
pub fn effective_rotation_speed(state: &GameState) -> f32 {
    rotation_speed_at(state, state.elapsed)
}

/// Rotation speed the attempt will have when its clock reads `elapsed`
fn rotation_speed_at(state: &GameState, elapsed: f32) -> f32 {
    let base = state.level.rotation_speed;
    if !state.level.speed_variation {
        return base;
    }
    let variation = elapsed.sin() * state.settings.speed_variation_amplitude * base;
    (base + variation).max(MIN_ROTATION_SPEED)
}

/// Ticks between firing and resolution, counting the firing tick
fn flight_ticks(dt: f32) -> u32 {
    ((LAUNCH_OFFSET - (TARGET_RADIUS + EATING_RANGE)) / (SHOT_SPEED * dt)).ceil() as u32
}

/// Rotation the target will have when a pigeon fired this tick arrives.
/// Replays the same per-tick steps as `tick`, wobble included.
fn predict_rotation(state: &GameState, dt: f32) -> f32 {
    let mut elapsed = state.elapsed;
    let mut rotation = state.rotation;
    // The firing tick already rotated, so the ring turns (n - 1) more times
    for _ in 1..flight_ticks(dt) {
        elapsed += dt;
        let speed = rotation_speed_at(state, elapsed);
        rotation = normalize_angle(rotation + speed * state.level.rotation_direction * dt);
    }
    rotation
}

/// Fire only if, by the time the pigeon arrives, a seed will sit well inside
/// the acceptance window and clearly nearer than any worm.
fn autopilot_wants_fire(state: &GameState, dt: f32) -> bool {
    if state.shot.is_some() {
        return false;
    }
    let firing_angle = normalize_angle(-predict_rotation(state, dt));

    let nearest = |kind: ItemKind| {
        state
            .items()
            .filter(|item| item.kind == kind)
            .map(|item| circular_distance(item.angle, firing_angle))
            .fold(f32::INFINITY, f32::min)
    };
    let seed = nearest(ItemKind::Seed);
    let hazard = nearest(ItemKind::Hazard);

    seed < state.settings.acceptance_window * 0.5 && hazard > seed + AUTOPILOT_HAZARD_MARGIN
}

/// Eat whatever lines up with the pigeon. Runs exactly once per shot.
fn resolve_collision(state: &mut GameState) {
    let firing_angle = state.firing_angle();
    let result = resolve_shot(&state.ring, firing_angle, state.settings.acceptance_window);

    match result {
        CollisionResult::Miss => {
            state.misses += 1;
            state.combo = 0;
            log::debug!("Miss at {:.3} rad (misses: {})", firing_angle, state.misses);

            state.events.push(GameEvent::Missed);
            push_text(state, Vec2::new(0.0, -TARGET_RADIUS), "Miss!".to_string(), TEXT_MISS, 0.8);
        }

        CollisionResult::Hit { slot, distance } => {
            let Some(kind) = state.ring.get(&slot).map(|item| item.kind) else {
                return;
            };
            log::debug!("Hit slot {} ({:?}) at distance {:.3}", slot, kind, distance);

            match kind {
                ItemKind::Hazard => {
                    state.outcome = Outcome::Lost;
                    log::info!("Level {} lost: ate a worm", state.level.id);

                    state.events.push(GameEvent::HazardEaten { slot });
                    state.events.push(GameEvent::LevelLost {
                        level_id: state.level.id,
                    });
                }

                ItemKind::Seed => eat_seed(state, slot),
            }
        }
    }
}

fn eat_seed(state: &mut GameState, slot: u32) {
    let Some(item) = state.ring.remove(&slot) else {
        return;
    };
    state.remaining_seeds = state.remaining_seeds.saturating_sub(1);

    let in_window = state
        .last_hit_time
        .is_some_and(|t| state.elapsed - t < state.settings.combo_window_secs);
    state.combo = if in_window { state.combo + 1 } else { 1 };
    state.last_hit_time = Some(state.elapsed);

    if state.remaining_seeds == 0 {
        let stars = star_rating(state.misses);
        state.outcome = Outcome::Won { stars };
        log::info!(
            "Level {} won with {} stars ({} misses)",
            state.level.id,
            stars,
            state.misses
        );
    }

    // Feedback below this line is cosmetic only
    state.peck_marks.push(item.angle);
    state.events.push(GameEvent::SeedEaten {
        slot,
        combo: state.combo,
    });

    let (text, color) = if state.combo > 1 {
        (format!("Combo x{}!", state.combo), TEXT_COMBO)
    } else {
        ("+1".to_string(), TEXT_PLAIN)
    };
    push_text(state, EAT_POINT, text, color, 1.0);

    state.hit_effects.push(HitEffect {
        pos: EAT_POINT,
        radius: 20.0,
        width: 5.0,
        color: TEXT_COMBO,
        life: 1.0,
    });
    state.particles.spawn(EAT_POINT, CRUMB_SHELL, 5, 8.0);
    state.particles.spawn(EAT_POINT, CRUMB_KERNEL, 5, 8.0);

    if let Outcome::Won { stars } = state.outcome {
        for color in CONFETTI {
            state.particles.spawn(Vec2::ZERO, color, 15, 15.0);
        }
        state.events.push(GameEvent::LevelWon {
            level_id: state.level.id,
            stars,
        });
    }
}

fn push_text(state: &mut GameState, pos: Vec2, text: String, color: u32, life: f32) {
    if state.settings.floating_text {
        state.floating_texts.push(FloatingText {
            pos,
            text,
            color,
            life,
        });
    }
}

/// Particles, floating text and hit rings
fn update_cosmetics(state: &mut GameState) {
    state.particles.update();

    for text in state.floating_texts.iter_mut() {
        text.pos.y -= 1.0;
        text.life -= 0.02;
    }
    state.floating_texts.retain(|t| t.life > 0.0);

    for effect in state.hit_effects.iter_mut() {
        effect.radius += 1.5;
        effect.life -= 0.05;
        effect.width *= 0.9;
    }
    state.hit_effects.retain(|h| h.life > 0.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::level::{LevelConfig, generate};
    use crate::sim::state::RingItem;
    use std::f32::consts::{PI, TAU};

    /// Level 1 with a stationary target so aim is exact
    fn still_level() -> LevelConfig {
        let mut level = generate(1);
        level.rotation_speed = 0.0;
        level
    }

    fn still_state(kinds: &[ItemKind]) -> GameState {
        GameState::from_kinds(still_level(), Settings::default(), kinds)
    }

    /// Turn the target so `angle` sits under the pigeon
    fn aim_at(state: &mut GameState, angle: f32) {
        state.rotation = normalize_angle(-angle);
    }

    fn slot_angle(state: &GameState, slot: u32) -> f32 {
        state.ring[&slot].angle
    }

    /// Tick until the live shot resolves
    fn fly(state: &mut GameState) {
        for _ in 0..100 {
            if state.shot.is_none() {
                return;
            }
            tick(state, &TickInput::default(), SIM_DT);
        }
        panic!("shot never resolved");
    }

    fn shoot_at(state: &mut GameState, angle: f32) {
        aim_at(state, angle);
        assert!(fire_shot(state));
        fly(state);
    }

    fn shoot_slot(state: &mut GameState, slot: u32) {
        let angle = slot_angle(state, slot);
        shoot_at(state, angle);
    }

    type Snapshot = (f32, Vec<RingItem>, Option<Shot>, u32, u32, u32, Outcome, f32, u64);

    fn snapshot(state: &GameState) -> Snapshot {
        (
            state.rotation,
            state.items().cloned().collect(),
            state.shot,
            state.remaining_seeds,
            state.combo,
            state.misses,
            state.outcome,
            state.elapsed,
            state.time_ticks,
        )
    }

    #[test]
    fn test_six_clean_hits_win_three_stars() {
        let mut state = still_state(&[ItemKind::Seed; 6]);
        for slot in 0..6 {
            shoot_slot(&mut state, slot);
            assert_eq!(state.remaining_seeds, 5 - slot);
        }

        assert_eq!(state.outcome, Outcome::Won { stars: 3 });
        assert_eq!(state.stars(), Some(3));
        assert!(state.ring.is_empty());
        assert_eq!(state.peck_marks.len(), 6);
        // Each flight is 0.3s, well inside the combo window
        assert_eq!(state.combo, 6);

        let events = state.drain_events();
        assert_eq!(events.last(), Some(&GameEvent::LevelWon { level_id: 1, stars: 3 }));
        assert_eq!(
            events.iter().filter(|e| matches!(e, GameEvent::SeedEaten { .. })).count(),
            6
        );
    }

    #[test]
    fn test_hazard_loses_immediately() {
        let mut state = still_state(&[
            ItemKind::Seed,
            ItemKind::Hazard,
            ItemKind::Seed,
            ItemKind::Seed,
        ]);
        shoot_slot(&mut state, 1);

        assert_eq!(state.outcome, Outcome::Lost);
        assert_eq!(state.remaining_seeds, 3);
        assert!(state.shot.is_none());
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::HazardEaten { slot: 1 }));
        assert_eq!(events.last(), Some(&GameEvent::LevelLost { level_id: 1 }));
    }

    #[test]
    fn test_double_fire_is_noop() {
        let mut state = still_state(&[ItemKind::Seed; 6]);
        assert!(fire_shot(&mut state));
        let first = state.shot;
        assert!(!fire_shot(&mut state));
        assert_eq!(state.shot, first);

        // Fire input while in flight does not restart the pigeon
        tick(&mut state, &TickInput::default(), SIM_DT);
        let mid_flight = state.shot.map(|s| s.radial_position);
        tick(&mut state, &TickInput { fire: true, ..Default::default() }, SIM_DT);
        assert!(state.shot.map(|s| s.radial_position) < mid_flight);

        let fired = state
            .drain_events()
            .into_iter()
            .filter(|e| *e == GameEvent::ShotFired)
            .count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_miss_between_slots() {
        let mut state = still_state(&[ItemKind::Seed; 6]);
        shoot_slot(&mut state, 0);
        assert_eq!(state.combo, 1);

        // Halfway between slots 1 and 2 is ~0.52 rad from either
        let gap = (slot_angle(&state, 1) + slot_angle(&state, 2)) / 2.0;
        shoot_at(&mut state, gap);

        assert_eq!(state.misses, 1);
        assert_eq!(state.combo, 0);
        assert_eq!(state.remaining_seeds, 5);
        assert_eq!(state.outcome, Outcome::InProgress);
        assert!(state.drain_events().contains(&GameEvent::Missed));
    }

    #[test]
    fn test_stars_from_misses() {
        for (misses, expected) in [(0, 3), (2, 2), (5, 1)] {
            let mut state = still_state(&[ItemKind::Seed]);
            for _ in 0..misses {
                shoot_at(&mut state, PI);
            }
            assert_eq!(state.outcome, Outcome::InProgress);
            shoot_at(&mut state, 0.0);
            assert_eq!(state.outcome, Outcome::Won { stars: expected });
        }
    }

    #[test]
    fn test_terminal_state_is_frozen() {
        let mut state = still_state(&[ItemKind::Hazard, ItemKind::Seed]);
        shoot_slot(&mut state, 1);
        // slot 1 eaten, the only seed, so the round is won
        assert!(state.outcome.is_terminal());

        let before = snapshot(&state);
        let fire = TickInput {
            fire: true,
            pause: true,
            idle_mode: true,
        };
        for _ in 0..30 {
            tick(&mut state, &fire, SIM_DT);
            assert!(!fire_shot(&mut state));
        }
        assert_eq!(snapshot(&state), before);
    }

    #[test]
    fn test_lost_state_is_frozen() {
        let mut state = still_state(&[ItemKind::Hazard, ItemKind::Seed]);
        shoot_at(&mut state, 0.0);
        assert_eq!(state.outcome, Outcome::Lost);

        let before = snapshot(&state);
        for _ in 0..30 {
            tick(&mut state, &TickInput { fire: true, ..Default::default() }, SIM_DT);
        }
        assert_eq!(snapshot(&state), before);
    }

    #[test]
    fn test_combo_expires() {
        let mut state = still_state(&[ItemKind::Seed; 6]);
        shoot_slot(&mut state, 0);
        shoot_slot(&mut state, 1);
        assert_eq!(state.combo, 2);

        // Wait two seconds
        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        shoot_slot(&mut state, 2);
        assert_eq!(state.combo, 1);
    }

    #[test]
    fn test_pause_freezes_round() {
        let mut state = GameState::from_kinds(generate(3), Settings::default(), &[ItemKind::Seed; 8]);
        tick(&mut state, &TickInput::default(), SIM_DT);
        let rotation = state.rotation;

        tick(&mut state, &TickInput { pause: true, ..Default::default() }, SIM_DT);
        assert!(state.paused);
        assert!(!fire_shot(&mut state));
        for _ in 0..10 {
            tick(&mut state, &TickInput { fire: true, ..Default::default() }, SIM_DT);
        }
        assert_eq!(state.rotation, rotation);
        assert!(state.shot.is_none());

        tick(&mut state, &TickInput { pause: true, ..Default::default() }, SIM_DT);
        assert!(!state.paused);
        assert_ne!(state.rotation, rotation);
    }

    #[test]
    fn test_rotation_stays_normalized() {
        for index in [1, 2, 13, 14] {
            let mut state = GameState::new(generate(index), Settings::default(), 3);
            for _ in 0..2_000 {
                tick(&mut state, &TickInput::default(), SIM_DT);
                assert!(state.rotation >= 0.0 && state.rotation < TAU);
            }
        }
    }

    #[test]
    fn test_direction_follows_level() {
        // Level 2 turns positive, level 1 negative
        let mut even = GameState::from_kinds(generate(2), Settings::default(), &[ItemKind::Seed; 6]);
        tick(&mut even, &TickInput::default(), SIM_DT);
        assert!(even.rotation > 0.0 && even.rotation < 1.0);

        let mut odd = GameState::from_kinds(generate(1), Settings::default(), &[ItemKind::Seed; 6]);
        tick(&mut odd, &TickInput::default(), SIM_DT);
        assert!(odd.rotation > TAU - 1.0);
    }

    #[test]
    fn test_speed_variation_never_reverses() {
        let settings = Settings {
            speed_variation_amplitude: 3.0,
            ..Default::default()
        };
        let mut state = GameState::from_kinds(generate(8), settings, &[ItemKind::Seed; 10]);
        for _ in 0..1_000 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            assert!(effective_rotation_speed(&state) >= MIN_ROTATION_SPEED);
        }
    }

    #[test]
    fn test_determinism() {
        let mut a = GameState::new(generate(9), Settings::default(), 77);
        let mut b = GameState::new(generate(9), Settings::default(), 77);

        for i in 0..1_500u32 {
            let input = TickInput {
                fire: i % 37 == 0,
                ..Default::default()
            };
            tick(&mut a, &input, SIM_DT);
            tick(&mut b, &input, SIM_DT);
            assert_eq!(snapshot(&a), snapshot(&b));
        }
        assert_eq!(a.drain_events(), b.drain_events());
    }

    #[test]
    fn test_seeds_never_increase() {
        let mut state = GameState::new(generate(4), Settings::default(), 11);
        let mut last = state.remaining_seeds;
        for i in 0..3_000u32 {
            let input = TickInput {
                fire: i % 23 == 0,
                ..Default::default()
            };
            tick(&mut state, &input, SIM_DT);
            assert!(state.remaining_seeds <= last);
            last = state.remaining_seeds;
            assert_eq!(
                state.remaining_seeds == 0,
                matches!(state.outcome, Outcome::Won { .. })
            );
        }
    }

    #[test]
    fn test_autopilot_clears_level() {
        let mut state = GameState::from_kinds(generate(1), Settings::default(), &[ItemKind::Seed; 6]);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..60 * 60 {
            tick(&mut state, &input, SIM_DT);
            if state.outcome.is_terminal() {
                break;
            }
        }
        assert_eq!(state.outcome, Outcome::Won { stars: 3 });
    }

    #[test]
    fn test_autopilot_avoids_worms() {
        let mut kinds = [ItemKind::Hazard; 8];
        kinds[3] = ItemKind::Seed;
        kinds[6] = ItemKind::Seed;
        let mut state = GameState::from_kinds(generate(4), Settings::default(), &kinds);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..60 * 60 {
            tick(&mut state, &input, SIM_DT);
            if state.outcome.is_terminal() {
                break;
            }
        }
        assert_eq!(state.outcome, Outcome::Won { stars: 3 });
    }

    #[test]
    fn test_prediction_matches_wobbling_rotation() {
        let mut state = GameState::new(generate(20), Settings::default(), 1);
        for _ in 0..45 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        let predicted = predict_rotation(&state, SIM_DT);

        let mut ahead = state.clone();
        for _ in 1..flight_ticks(SIM_DT) {
            tick(&mut ahead, &TickInput::default(), SIM_DT);
        }
        assert_eq!(ahead.rotation, predicted);
    }

    #[test]
    fn test_autopilot_alternating_worms_on_hard_level() {
        let level = generate(20);
        assert!(level.speed_variation);
        let kinds: Vec<ItemKind> = (0..level.item_count)
            .map(|i| if i % 2 == 0 { ItemKind::Seed } else { ItemKind::Hazard })
            .collect();
        let mut state = GameState::from_kinds(level, Settings::default(), &kinds);
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for _ in 0..60 * 120 {
            tick(&mut state, &input, SIM_DT);
            if state.outcome.is_terminal() {
                break;
            }
        }
        assert_eq!(state.outcome, Outcome::Won { stars: 3 });
    }

    #[test]
    fn test_autopilot_never_eats_worms_on_dense_levels() {
        let input = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        for seed in 1..=5 {
            let mut state = GameState::new(generate(20), Settings::default(), seed);
            for _ in 0..60 * 60 {
                tick(&mut state, &input, SIM_DT);
                if state.outcome.is_terminal() {
                    break;
                }
            }
            assert_ne!(state.outcome, Outcome::Lost, "seed {}", seed);
            assert_eq!(state.misses, 0, "seed {}", seed);
        }
    }

    #[test]
    fn test_default_speed_wobble_stays_near_base() {
        let level = generate(8);
        assert!(level.speed_variation);
        let base = level.rotation_speed;
        let mut state = GameState::from_kinds(level, Settings::default(), &[ItemKind::Seed; 10]);

        let mut slowest = f32::INFINITY;
        let mut fastest = 0.0f32;
        // Ten seconds covers more than a full wobble period
        for _ in 0..600 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            let speed = effective_rotation_speed(&state);
            assert!(speed >= base * 0.9 - 1e-4 && speed <= base * 1.1 + 1e-4);
            slowest = slowest.min(speed);
            fastest = fastest.max(speed);
        }
        assert!(fastest - slowest > base * 0.15);
    }

    #[test]
    fn test_cosmetics_decay() {
        let mut state = still_state(&[ItemKind::Seed; 6]);
        shoot_at(&mut state, 0.0);
        assert!(!state.floating_texts.is_empty());
        assert!(state.particles.active_count() > 0);
        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        assert!(state.floating_texts.is_empty());
        assert!(state.hit_effects.is_empty());
        assert_eq!(state.particles.active_count(), 0);
    }
}
