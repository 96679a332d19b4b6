//! Crazy Pigeon headless runner
//!
//! Plays levels with the autopilot, logs what happens and records progress.
//! Stands in for the presentation layer when no renderer is attached.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Parser;

use crazy_pigeon::consts::SIM_DT;
use crazy_pigeon::sim::{GameEvent, GameState, LEVEL_COUNT, Outcome, TickInput, generate, tick};
use crazy_pigeon::{Progress, Settings};

#[derive(Debug, Parser)]
#[command(name = "crazy-pigeon", about = "Peck every seed, dodge the worms")]
struct Args {
    /// Level to play (1-based)
    #[arg(short, long, default_value_t = 1)]
    level: u32,

    /// Keep playing the following levels until one is lost
    #[arg(long)]
    campaign: bool,

    /// Seed for worm placement (defaults to the level id)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Settings file (JSON)
    #[arg(long, default_value = "crazy_pigeon_settings.json")]
    settings: PathBuf,

    /// Progress file (JSON)
    #[arg(long, default_value = "crazy_pigeon_progress.json")]
    progress: PathBuf,

    /// Give up on a level after this many simulated seconds
    #[arg(long, default_value_t = 120.0)]
    max_seconds: f32,

    /// Ignore locks and play any level
    #[arg(long)]
    unlocked: bool,

    /// Wipe saved progress before playing
    #[arg(long)]
    reset_progress: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    log::info!("Crazy Pigeon (native) starting...");

    if args.level == 0 || args.level > LEVEL_COUNT {
        bail!("level must be between 1 and {}", LEVEL_COUNT);
    }

    let settings = Settings::load(&args.settings);
    let mut progress = Progress::load(&args.progress);
    if args.reset_progress {
        progress.reset();
    }

    let mut level_id = args.level;
    loop {
        if !args.unlocked && !progress.is_unlocked(level_id) {
            bail!("level {} is locked (highest unlocked: {})", level_id, progress.highest_unlocked());
        }

        let seed = args.seed.unwrap_or(level_id as u64);
        let outcome = play(level_id, &settings, seed, args.max_seconds, &mut progress);
        progress.save(&args.progress)?;

        match outcome {
            Outcome::Won { stars } => println!("Level {:>2}: won  {}", level_id, star_string(stars)),
            Outcome::Lost => println!("Level {:>2}: lost", level_id),
            Outcome::InProgress => println!("Level {:>2}: gave up", level_id),
        }

        if !args.campaign {
            break;
        }
        match next_campaign_level(level_id, outcome, &progress, args.unlocked) {
            Some(next) => level_id = next,
            None => break,
        }
    }

    println!(
        "Total stars: {} (highest unlocked: {})",
        progress.total_stars(),
        progress.highest_unlocked()
    );
    Ok(())
}

/// Run one attempt to completion (or timeout), feeding outcomes to progress
fn play(level_id: u32, settings: &Settings, seed: u64, max_seconds: f32, progress: &mut Progress) -> Outcome {
    let mut state = GameState::new(generate(level_id), settings.clone(), seed);
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };

    let max_ticks = (max_seconds / SIM_DT).ceil() as u64;
    for _ in 0..max_ticks {
        tick(&mut state, &input, SIM_DT);

        for event in state.drain_events() {
            match &event {
                GameEvent::SeedEaten { slot, combo } if *combo > 1 => {
                    log::debug!("Seed {} eaten, combo x{}", slot, combo)
                }
                GameEvent::LevelWon { .. } | GameEvent::LevelLost { .. } => {
                    log::info!("{:?} after {:.1}s", event, state.elapsed)
                }
                _ => log::trace!("{:?}", event),
            }
            if progress.record(&event) {
                log::info!("New best on level {}", level_id);
            }
        }

        if state.outcome.is_terminal() {
            break;
        }
    }

    if !state.outcome.is_terminal() {
        log::warn!(
            "Level {} timed out with {} seeds left",
            level_id,
            state.remaining_seeds
        );
    }
    state.outcome
}

/// Level the campaign moves on to, if any: only after a win, never past the
/// catalogue, and only into a level the player may play
fn next_campaign_level(level_id: u32, outcome: Outcome, progress: &Progress, ignore_locks: bool) -> Option<u32> {
    if !matches!(outcome, Outcome::Won { .. }) || level_id >= LEVEL_COUNT {
        return None;
    }
    let next = level_id + 1;
    (ignore_locks || progress.is_unlocked(next)).then_some(next)
}

fn star_string(stars: u8) -> String {
    (0..3).map(|i| if i < stars { '*' } else { '.' }).collect()
}
