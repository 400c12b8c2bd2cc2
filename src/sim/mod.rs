//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only (owned by `GameState`)
//! - Stable iteration order (collection order, pairs by index)
//! - No rendering, audio or platform dependencies

pub mod blocks;
pub mod collision;
pub mod lasers;
pub mod shape;
pub mod state;
pub mod tick;
pub mod timers;

pub use collision::Side;
pub use shape::{Axis, Jitter, Rebound, ShapeProfile};
pub use state::{
    Ball, BallShape, Block, BlockColor, BlockPhase, GameEvent, GamePhase, GameState, Laser,
    LaserKind, Paddle, Snapshot,
};
pub use tick::{TickInput, tick};
pub use timers::{Countdown, EffectTimers};
