//! Game state and core simulation types
//!
//! Entities are plain data. All of them are owned by [`GameState`], which
//! is the only thing the rest of the simulation mutates.

use std::collections::VecDeque;

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::timers::{Countdown, EffectTimers};
use crate::consts::*;
use crate::hints::{Hint, HintSet};
use crate::settings::Settings;

/// Top-level lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Balls seated on the paddle, waiting for the start gesture
    NotStarted,
    /// Active gameplay
    Playing,
    /// Punitive effect running; motion suspended, timers still run
    Frozen,
    /// Level cleared; waiting for the level-up timer
    LevelClear,
    /// Run ended (terminal until restart)
    GameOver,
}

/// Ball shapes. Every seeding creates exactly one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BallShape {
    Star,
    Circle,
    Oval,
}

impl BallShape {
    /// Seeding order, left to right on the paddle
    pub const ALL: [BallShape; 3] = [BallShape::Star, BallShape::Circle, BallShape::Oval];
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub shape: BallShape,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Base radius (fixed)
    pub radius: f32,
    /// Extra radius from block hits (Circle only)
    pub growth: f32,
    /// Rotation in degrees
    pub rotation: f32,
    /// Turns per second; the sign carries spin direction
    pub rotation_speed: f32,
    pub moving: bool,
    /// Running while the ball is dormant off-screen
    pub revive: Countdown,
    /// Consecutive block hits (Star only)
    pub combo_count: u32,
    pub last_hit_color: Option<BlockColor>,
}

impl Ball {
    pub fn new(shape: BallShape) -> Self {
        Self {
            shape,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: BALL_RADIUS,
            growth: 0.0,
            rotation: 0.0,
            rotation_speed: 0.0,
            moving: false,
            revive: Countdown::Inactive,
            combo_count: 0,
            last_hit_color: None,
        }
    }

    /// Collision radius including growth
    #[inline]
    pub fn effective_radius(&self) -> f32 {
        match self.shape {
            BallShape::Circle => self.radius + self.growth.clamp(0.0, BALL_MAX_GROWTH),
            _ => self.radius,
        }
    }

    /// Grow after a block hit (Circle only), capped at the max diameter
    pub fn grow(&mut self) {
        if self.shape == BallShape::Circle {
            self.growth = (self.growth + BALL_GROWTH_STEP).min(BALL_MAX_GROWTH);
        }
    }

    /// Dormant off-screen, counting down to revive
    #[inline]
    pub fn is_dormant(&self) -> bool {
        self.revive.is_active()
    }

    /// Seated on the paddle, ready to launch
    #[inline]
    pub fn is_waiting(&self) -> bool {
        !self.moving && !self.is_dormant()
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Place the ball at rest on top of the paddle at horizontal position `x`
    pub fn seat_on(&mut self, paddle: &Paddle, x: f32) {
        self.pos = Vec2::new(x, paddle.top() - self.effective_radius());
        self.vel = Vec2::ZERO;
        self.moving = false;
    }

    /// Park off-screen until the revive countdown elapses
    pub fn park(&mut self, revive_delay: f64) {
        self.moving = false;
        self.vel = Vec2::ZERO;
        self.pos.y = BALL_PARKED_Y;
        self.revive = Countdown::start(revive_delay);
    }

    /// Clear Star combo progress
    pub fn reset_combo(&mut self) {
        self.combo_count = 0;
        self.last_hit_color = None;
    }
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    /// Center x
    pub x: f32,
    /// Center y (fixed)
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Paddle {
    fn default() -> Self {
        Self {
            x: FIELD_WIDTH / 2.0,
            y: PADDLE_Y,
            width: PADDLE_WIDTH,
            height: PADDLE_HEIGHT,
        }
    }
}

impl Paddle {
    pub const ORIGINAL_WIDTH: f32 = PADDLE_WIDTH;

    #[inline]
    pub fn half_width(&self) -> f32 {
        self.width / 2.0
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.x - self.width / 2.0
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width / 2.0
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.y - self.height / 2.0
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Clamp a target center x so the paddle stays inside the field
    pub fn clamp_x(&self, target: f32) -> f32 {
        target.clamp(self.half_width(), FIELD_WIDTH - self.half_width())
    }

    /// Lose one shrink step, never below half the original width
    pub fn shrink(&mut self) {
        self.width = (self.width - PADDLE_SHRINK_STEP).max(PADDLE_MIN_WIDTH);
    }

    pub fn reset_width(&mut self) {
        self.width = Self::ORIGINAL_WIDTH;
        self.x = self.clamp_x(self.x);
    }
}

/// Block palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockColor {
    Blossom,
    Gold,
    Teal,
    Leaf,
    Sky,
}

impl BlockColor {
    /// One entry per initial grid row, top to bottom
    pub const PALETTE: [BlockColor; 5] = [
        BlockColor::Blossom,
        BlockColor::Gold,
        BlockColor::Teal,
        BlockColor::Leaf,
        BlockColor::Sky,
    ];

    /// sRGB for renderers
    pub fn rgb(&self) -> u32 {
        match self {
            BlockColor::Blossom => 0xFAC4D9,
            BlockColor::Gold => 0xFBCA21,
            BlockColor::Teal => 0x8FCFD0,
            BlockColor::Leaf => 0xBDE899,
            BlockColor::Sky => 0x8ACDEE,
        }
    }
}

/// Block lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BlockPhase {
    Active,
    /// Freshly spawned and fading in; collides like an active block
    Appearing { until: f64 },
    /// Hit; purged once the simulation clock reaches `remove_at`
    Breaking { remove_at: f64 },
}

/// A block entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: u32,
    /// Center
    pub pos: Vec2,
    pub size: Vec2,
    pub color: BlockColor,
    pub phase: BlockPhase,
    /// Set while sliding down during replenishment
    pub target: Option<Vec2>,
    /// Cosmetic marker for blocks removed by a star combo
    pub combo_target: bool,
}

impl Block {
    pub fn new(id: u32, pos: Vec2, color: BlockColor) -> Self {
        Self {
            id,
            pos,
            size: Vec2::new(BLOCK_WIDTH, BLOCK_HEIGHT),
            color,
            phase: BlockPhase::Active,
            target: None,
            combo_target: false,
        }
    }

    /// Still collidable (not yet hit)
    #[inline]
    pub fn is_active(&self) -> bool {
        !self.is_breaking()
    }

    #[inline]
    pub fn is_breaking(&self) -> bool {
        matches!(self.phase, BlockPhase::Breaking { .. })
    }

    /// Start the removal delay. Returns false, leaving the block untouched,
    /// if it is already breaking.
    pub fn begin_breaking(&mut self, now: f64) -> bool {
        if self.is_breaking() {
            return false;
        }
        self.phase = BlockPhase::Breaking {
            remove_at: now + BLOCK_REMOVE_DELAY,
        };
        true
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x - self.size.x / 2.0
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x / 2.0
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y - self.size.y / 2.0
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y / 2.0
    }
}

/// Whether a laser can hurt anything
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaserKind {
    Threat,
    /// Secondary combo laser; falls but never collides
    Cosmetic,
}

/// A falling laser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Laser {
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
    pub color: BlockColor,
    pub kind: LaserKind,
}

impl Laser {
    pub fn new(pos: Vec2, color: BlockColor, kind: LaserKind) -> Self {
        Self {
            pos,
            size: Vec2::new(LASER_WIDTH, LASER_HEIGHT),
            vel: Vec2::new(0.0, LASER_SPEED),
            color,
            kind,
        }
    }
}

/// One-shot notifications for audio/visual feedback
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    BallLaunched { index: usize, shape: BallShape },
    /// Ball fell off the bottom and went dormant
    BallLost { index: usize, shape: BallShape },
    BallRevived { index: usize, shape: BallShape },
    BlockBroken { id: u32, color: BlockColor },
    ComboFired { color: BlockColor, blocks: usize, chain: u32 },
    /// A combo was requested while one was still running
    ComboRejected { color: BlockColor },
    BonusLife { lives: u32 },
    LaserFired { color: BlockColor },
    LaserHitPaddle { color: BlockColor },
    LifeLost { lives: u32 },
    AllBallsLost,
    RowsReplenished,
    LevelCleared { level: u32 },
    LevelStarted { level: u32 },
    GameOver { score: u64, level: u32 },
}

/// Complete simulation state, the single owner of every entity
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub settings: Settings,
    pub hints: HintSet,
    /// Hint chosen on the most recent life loss or game over
    pub current_hint: Option<Hint>,
    /// Simulation clock (seconds, sum of every dt)
    pub time: f64,
    pub phase: GamePhase,
    pub lives: u32,
    pub score: u64,
    pub level: u32,
    pub paddle: Paddle,
    /// Always exactly three, one per shape
    pub balls: Vec<Ball>,
    pub blocks: Vec<Block>,
    pub lasers: Vec<Laser>,
    pub timers: EffectTimers,
    /// Time until the next row shift
    pub replenish: Countdown,
    /// Block ids still to be broken by the running combo
    pub combo_queue: VecDeque<u32>,
    /// Combos fired since the Star ball last touched the paddle
    pub combo_chain: u32,
    /// Ball indices waiting for a staggered launch
    pub launch_queue: VecDeque<usize>,
    /// Pending notifications, drained by the host
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create a new game with the given seed
    pub fn new(seed: u64, settings: Settings, hints: HintSet) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            lives: settings.initial_lives,
            replenish: Countdown::start(settings.replenish_interval),
            settings,
            hints,
            current_hint: None,
            time: 0.0,
            phase: GamePhase::NotStarted,
            score: 0,
            level: 1,
            paddle: Paddle::default(),
            balls: Vec::with_capacity(BallShape::ALL.len()),
            blocks: Vec::new(),
            lasers: Vec::new(),
            timers: EffectTimers::default(),
            combo_queue: VecDeque::new(),
            combo_chain: 0,
            launch_queue: VecDeque::new(),
            events: Vec::new(),
            next_id: 1,
        };

        state.reset_balls(false);
        state.reset_blocks();

        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Seat a fresh set of three balls on the paddle. With `keep_growth`,
    /// a Circle ball that is not dormant carries its growth over.
    pub fn reset_balls(&mut self, keep_growth: bool) {
        use rand::Rng;

        let carried_growth = if keep_growth {
            self.balls
                .iter()
                .find(|b| b.shape == BallShape::Circle && !b.is_dormant())
                .map(|b| b.growth)
                .unwrap_or(0.0)
        } else {
            0.0
        };

        self.paddle.reset_width();
        self.launch_queue.clear();
        self.timers.ball_launch.cancel();
        self.balls.clear();

        for (i, shape) in BallShape::ALL.into_iter().enumerate() {
            let mut ball = Ball::new(shape);
            if shape == BallShape::Circle {
                ball.growth = carried_growth;
            } else {
                ball.rotation = self.rng.random_range(0.0..360.0);
            }
            let x = self.paddle.x + Self::seat_offset(i);
            ball.seat_on(&self.paddle, x);
            self.balls.push(ball);
        }
    }

    /// Horizontal offset of seat `index` from paddle center before launch
    #[inline]
    pub fn seat_offset(index: usize) -> f32 {
        (index as f32 - 1.0) * BALL_SEAT_SPACING
    }

    /// Star combo batches still pending
    pub fn combo_in_progress(&self) -> bool {
        !self.combo_queue.is_empty()
    }

    pub fn is_started(&self) -> bool {
        self.phase != GamePhase::NotStarted
    }

    pub fn is_paused(&self) -> bool {
        self.phase == GamePhase::LevelClear
    }

    pub fn is_frozen(&self) -> bool {
        self.phase == GamePhase::Frozen
    }

    pub fn is_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    /// Balls in flight
    pub fn moving_ball_count(&self) -> usize {
        self.balls.iter().filter(|b| b.moving).count()
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Pick a hint to show alongside a loss message
    pub fn pick_hint(&mut self) {
        self.current_hint = Some(self.hints.pick(&mut self.rng).clone());
    }

    /// Read-only view for renderers
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            phase: self.phase,
            lives: self.lives,
            score: self.score,
            level: self.level,
            paddle: &self.paddle,
            balls: &self.balls,
            blocks: &self.blocks,
            lasers: &self.lasers,
            timers: &self.timers,
            screen_flash_opacity: self.timers.screen_flash_opacity(),
            next_row_in: self.replenish.remaining(),
            combo_chain: self.combo_chain,
            current_hint: self.current_hint.as_ref(),
        }
    }
}

/// Borrowed, serializable view of the state
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub phase: GamePhase,
    pub lives: u32,
    pub score: u64,
    pub level: u32,
    pub paddle: &'a Paddle,
    pub balls: &'a [Ball],
    pub blocks: &'a [Block],
    pub lasers: &'a [Laser],
    pub timers: &'a EffectTimers,
    pub screen_flash_opacity: f64,
    pub next_row_in: Option<f64>,
    pub combo_chain: u32,
    pub current_hint: Option<&'a Hint>,
}


#[cfg(test)]
mod tests {
    use super::test_support::new_state;
    use super::*;

    #[test]
    fn test_new_state_seeds_three_balls() {
        let state = new_state(1);
        assert_eq!(state.phase, GamePhase::NotStarted);
        assert_eq!(state.balls.len(), 3);
        let shapes: Vec<_> = state.balls.iter().map(|b| b.shape).collect();
        assert_eq!(shapes, BallShape::ALL.to_vec());
        for (i, ball) in state.balls.iter().enumerate() {
            assert!(ball.is_waiting());
            assert_eq!(ball.pos.x, state.paddle.x + GameState::seat_offset(i));
            assert_eq!(ball.pos.y, state.paddle.top() - ball.effective_radius());
        }
    }

    #[test]
    fn test_effective_radius_capped() {
        let mut ball = Ball::new(BallShape::Circle);
        for _ in 0..1000 {
            ball.grow();
        }
        assert_eq!(ball.effective_radius(), BALL_MAX_DIAMETER / 2.0);

        let mut star = Ball::new(BallShape::Star);
        star.grow();
        assert_eq!(star.effective_radius(), BALL_RADIUS);
    }

    #[test]
    fn test_paddle_shrink_floor() {
        let mut paddle = Paddle::default();
        for _ in 0..200 {
            paddle.shrink();
        }
        assert_eq!(paddle.width, PADDLE_MIN_WIDTH);
        paddle.reset_width();
        assert_eq!(paddle.width, Paddle::ORIGINAL_WIDTH);
    }

    #[test]
    fn test_reset_balls_keeps_circle_growth() {
        let mut state = new_state(3);
        state.balls[1].growth = 4.0;
        state.paddle.width = 70.0;
        state.reset_balls(true);
        assert_eq!(state.balls[1].growth, 4.0);
        assert_eq!(state.paddle.width, Paddle::ORIGINAL_WIDTH);

        state.reset_balls(false);
        assert_eq!(state.balls[1].growth, 0.0);
    }

    #[test]
    fn test_snapshot_serializes() {
        let state = new_state(5);
        let json = serde_json::to_string(&state.snapshot()).unwrap();
        assert!(json.contains("\"phase\":\"NotStarted\""));
    }
}
