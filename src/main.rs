//! Shape Breakout headless runner
//!
//! Loads the hint data set and settings, lets the autopilot play at a fixed
//! timestep, logs gameplay events and prints the final state as JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use shape_breakout::consts::{MAX_SUBSTEPS, SIM_DT};
use shape_breakout::sim::{GameEvent, GameState, TickInput, tick};
use shape_breakout::{Difficulty, HintError, HintSet, Settings};

/// Bundled hint data set
const DEFAULT_HINTS: &str = include_str!("../assets/hints.json");

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless Shape Breakout simulation", long_about = None)]
struct Cli {
    /// Hint data set (JSON array of {caption, content}); bundled set if omitted
    #[arg(long)]
    hints: Option<PathBuf>,
    /// Settings file (JSON); defaults if omitted
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Relaxed, Normal or Hard
    #[arg(long)]
    difficulty: Option<String>,
    #[arg(long, default_value_t = 1)]
    seed: u64,
    /// Simulated seconds to run
    #[arg(long, default_value_t = 120.0)]
    seconds: f32,
    /// Host frame rate; each frame is split into fixed simulation steps
    #[arg(long, default_value_t = 60.0)]
    fps: f32,
    /// Pretty-print the final snapshot
    #[arg(long)]
    pretty: bool,
}

/// Fixed-step driver fed with host frame times
struct Runner {
    state: GameState,
    accumulator: f32,
    input: TickInput,
}

impl Runner {
    fn new(state: GameState) -> Self {
        Self {
            state,
            accumulator: 0.0,
            input: TickInput {
                idle_mode: true,
                ..Default::default()
            },
        }
    }

    /// Run as many simulation ticks as `dt` covers
    fn frame(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &self.input, SIM_DT);
            self.accumulator -= SIM_DT;
            substeps += 1;
        }

        for event in self.state.drain_events() {
            match event {
                GameEvent::ComboFired { .. }
                | GameEvent::BonusLife { .. }
                | GameEvent::LifeLost { .. }
                | GameEvent::LevelCleared { .. }
                | GameEvent::LevelStarted { .. }
                | GameEvent::GameOver { .. } => log::info!("{:?}", event),
                _ => log::debug!("{:?}", event),
            }
        }
    }
}

fn load_hints(cli: &Cli) -> Result<HintSet, HintError> {
    match &cli.hints {
        Some(path) => HintSet::load(path),
        None => HintSet::from_json(DEFAULT_HINTS),
    }
}

/// Settings problems are not fatal: fall back to defaults
fn load_settings(cli: &Cli) -> Settings {
    let mut settings = match &cli.settings {
        Some(path) => Settings::load(path).unwrap_or_else(|e| {
            log::warn!("Using default settings: {}", e);
            Settings::default()
        }),
        None => Settings::default(),
    };

    if let Some(name) = &cli.difficulty {
        match Difficulty::parse(name) {
            Some(difficulty) => settings.apply_difficulty(difficulty),
            None => log::warn!("Unknown difficulty '{}', keeping {}", name, settings.difficulty.as_str()),
        }
    }

    settings
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    log::info!("Shape Breakout (headless) starting, seed {}", cli.seed);

    // The game cannot run without hints
    let hints = match load_hints(&cli) {
        Ok(hints) => hints,
        Err(e) => {
            log::error!("Invalid hint data set: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let settings = load_settings(&cli);

    let mut runner = Runner::new(GameState::new(cli.seed, settings, hints));
    let fps = cli.fps.max(1.0);
    let frames = (cli.seconds.max(0.0) * fps).ceil() as u64;

    for _ in 0..frames {
        runner.frame(1.0 / fps);
        if runner.state.is_over() {
            break;
        }
    }

    let state = &runner.state;
    log::info!(
        "Finished after {:.1}s: level {}, score {}, lives {}",
        state.time,
        state.level,
        state.score,
        state.lives
    );

    let snapshot = state.snapshot();
    let json = if cli.pretty {
        serde_json::to_string_pretty(&snapshot)
    } else {
        serde_json::to_string(&snapshot)
    };
    match json {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Failed to serialize snapshot: {}", e);
            ExitCode::FAILURE
        }
    }
}
