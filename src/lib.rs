//! Shape Breakout - simulation core of a multi-ball breakout arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, collisions, block lifecycle, game state)
//! - `settings`: Data-driven game balance
//! - `hints`: Hint data set shown on life loss and game over

pub mod hints;
pub mod settings;
pub mod sim;

pub use hints::{Hint, HintError, HintSet};
pub use settings::{Difficulty, Settings, SettingsError};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Playfield dimensions (origin top-left, +y down)
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 7.5;
    pub const BALL_BASE_SPEED: f32 = 300.0;
    /// Effective diameter never exceeds this
    pub const BALL_MAX_DIAMETER: f32 = 40.0;
    pub const BALL_MAX_GROWTH: f32 = BALL_MAX_DIAMETER / 2.0 - BALL_RADIUS;
    /// Radius added to a Circle ball per block hit
    pub const BALL_GROWTH_STEP: f32 = 0.5;
    /// Horizontal spacing of the three seated balls
    pub const BALL_SEAT_SPACING: f32 = 30.0;
    /// Where dormant balls are parked while their revive countdown runs
    pub const BALL_PARKED_Y: f32 = 2000.0;
    /// Turns/sec of spin per px/s of speed
    pub const BALL_SPIN_PER_SPEED: f32 = 0.002;
    pub const BALL_MAX_SPIN: f32 = BALL_BASE_SPEED * 0.015;
    /// Launch jitter (radians)
    pub const BALL_LAUNCH_JITTER: f32 = 0.1;
    /// Maximum paddle deflection (60 degrees)
    pub const PADDLE_MAX_DEFLECTION: f32 = std::f32::consts::FRAC_PI_3;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 100.0;
    pub const PADDLE_HEIGHT: f32 = 15.0;
    pub const PADDLE_Y: f32 = FIELD_HEIGHT - 30.0;
    /// Width lost per Oval block hit
    pub const PADDLE_SHRINK_STEP: f32 = 1.0;
    pub const PADDLE_MIN_WIDTH: f32 = PADDLE_WIDTH / 2.0;

    /// Block grid
    pub const BLOCK_WIDTH: f32 = 70.0;
    pub const BLOCK_HEIGHT: f32 = 25.0;
    pub const BLOCK_PADDING: f32 = 10.0;
    pub const BLOCK_ROWS: usize = 5;
    pub const BLOCK_COLUMNS: usize = 10;
    pub const BLOCK_TOP_OFFSET: f32 = 50.0;
    pub const BLOCK_ROW_PITCH: f32 = BLOCK_HEIGHT + BLOCK_PADDING;
    /// Seconds a broken block lingers before removal
    pub const BLOCK_REMOVE_DELAY: f64 = 0.7;
    pub const BLOCK_APPEAR_DURATION: f64 = 0.3;
    /// Easing factor for the row-shift animation
    pub const BLOCK_SLIDE_RATE: f32 = 5.0;
    pub const BLOCK_SLIDE_SNAP: f32 = 0.5;

    /// Scoring
    pub const BLOCK_SCORE: u64 = 10;
    pub const COMBO_BLOCK_SCORE: u64 = 20;
    pub const LEVEL_CLEAR_BONUS: u64 = 100;

    /// Lasers
    pub const LASER_WIDTH: f32 = 3.0;
    pub const LASER_HEIGHT: f32 = 15.0;
    pub const LASER_SPEED: f32 = 250.0;
    /// Lasers are discarded once this far below the field
    pub const LASER_EXIT_MARGIN: f32 = 30.0;

    /// Effect durations (seconds)
    pub const COMBO_EFFECT_DURATION: f64 = 1.5;
    pub const LEVEL_UP_DURATION: f64 = 3.0;
    pub const SCREEN_FLASH_DURATION: f64 = 0.3;
    pub const SCREEN_FLASH_MAX_OPACITY: f64 = 0.7;
    pub const PADDLE_HIT_DURATION: f64 = 0.6;

    /// Countdowns within this of zero count as expired
    pub const TIMER_EPSILON: f64 = 1e-6;
}

/// Rotate a vector by `angle` radians
#[inline]
pub fn rotate_vec(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

/// Normalize degrees into [0, 360)
#[inline]
pub fn wrap_degrees(deg: f32) -> f32 {
    deg.rem_euclid(360.0)
}
