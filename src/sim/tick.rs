//! Fixed timestep simulation tick
//!
//! The game state machine: one `update(dt)` per frame, plus the input entry
//! points (`move_paddle`, `activate`, `launch_ball`, `start_game`,
//! `restart_game`). Timers always run first, in a fixed order; motion and
//! collisions only run while `Playing`.

use glam::Vec2;

use super::collision::{
    bounce_off_block, fell_out, find_block_hit, integrate_ball, launch_velocity, resolve_ball_pair,
    resolve_paddle, resolve_walls,
};
use super::state::{Ball, BallShape, GameEvent, GamePhase, GameState, Paddle};
use super::timers::{Countdown, EffectTimers};
use crate::consts::*;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Target paddle x (from mouse/touch position)
    pub target_x: Option<f32>,
    /// Activate gesture (click/tap/space): start, or launch waiting balls
    pub launch: bool,
    /// Restart the run
    pub restart: bool,
    /// Dismiss the level-clear banner early
    pub skip_level_up: bool,
    /// Idle/demo mode - AI plays the game
    pub idle_mode: bool,
}

/// Apply one tick of input, then advance the game state by `dt`
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) {
    let mut input = input.clone();
    if input.idle_mode {
        autopilot(state, &mut input);
    }
    let input = &input;

    if input.restart {
        state.restart_game();
    }
    if input.skip_level_up {
        state.skip_level_up_message();
    }
    if let Some(x) = input.target_x {
        state.move_paddle(x);
    }
    if input.launch {
        state.activate();
    }

    state.update(dt);
}

/// Steer the paddle under the most urgent descending ball and launch
/// whatever is waiting
fn autopilot(state: &GameState, input: &mut TickInput) {
    let can_launch = matches!(state.phase, GamePhase::NotStarted | GamePhase::Playing)
        && !state.timers.blocking_message();
    if can_launch && state.balls.iter().any(Ball::is_waiting) {
        input.launch = true;
    }

    let paddle = &state.paddle;
    let threat = state
        .balls
        .iter()
        .filter(|b| b.moving && b.vel.y > 0.0)
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
        .or_else(|| {
            state
                .balls
                .iter()
                .filter(|b| b.moving)
                .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
        });

    if let Some(ball) = threat {
        let landing_x = if ball.vel.y > 0.0 {
            let t = ((paddle.top() - ball.pos.y) / ball.vel.y).max(0.0);
            fold_into_field(ball.pos.x + ball.vel.x * t)
        } else {
            ball.pos.x
        };
        // Wander off-center so the rebound angle varies
        let offset = (state.time as f32 * 1.3).sin() * paddle.half_width() * 0.4;
        input.target_x = Some(landing_x + offset);
    }
}

/// Reflect an unbounded x back into the field, as if bouncing off the walls
fn fold_into_field(x: f32) -> f32 {
    let period = FIELD_WIDTH * 2.0;
    let m = x.rem_euclid(period);
    if m > FIELD_WIDTH { period - m } else { m }
}

impl GameState {
    /// Advance the simulation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        let dt_secs = dt as f64;
        self.time += dt_secs;

        if self.is_over() {
            // Only the cosmetic tail of a final paddle hit keeps running
            if self.timers.screen_flash.advance(dt_secs) {
                self.timers.flash_color = None;
            }
            if self.timers.paddle_hit.advance(dt_secs) {
                self.timers.paddle_hit_color = None;
            }
            return;
        }

        self.advance_timers(dt_secs);

        if self.phase != GamePhase::Playing {
            return;
        }

        for ball in &mut self.balls {
            integrate_ball(ball, dt);
        }
        self.resolve_ball_contacts();
        self.resolve_ball_hits();
        if self.phase != GamePhase::Playing {
            return;
        }

        self.move_lasers(dt);
        self.check_laser_collisions();
        if self.phase != GamePhase::Playing {
            return;
        }

        self.purge_broken_blocks();
        self.update_block_animations(dt);

        if self.blocks.is_empty() {
            self.level_cleared();
            return;
        }

        if self.replenish.advance(dt_secs) {
            self.replenish_blocks();
        }
    }

    /// Decrement every effect timer in order, running expiry transitions
    fn advance_timers(&mut self, dt: f64) {
        if self.timers.combo_effect.advance(dt) {
            self.timers.combo_color = None;
        }
        if self.timers.combo_batch.advance(dt) {
            self.break_combo_batch();
        }
        if self.timers.level_up.advance(dt) {
            self.proceed_to_next_level();
        }
        if self.timers.all_balls_lost.advance(dt) {
            self.reseed_after_life_loss();
        }
        self.timers.laser_hit_message.advance(dt);
        if self.timers.screen_flash.advance(dt) {
            self.timers.flash_color = None;
        }
        if self.timers.paddle_hit.advance(dt) {
            self.finish_paddle_hit();
        }

        // Gameplay timers
        if self.phase == GamePhase::Playing {
            if self.timers.ball_launch.advance(dt) {
                self.launch_next_queued();
            }
            for i in 0..self.balls.len() {
                if self.balls[i].revive.advance(dt) {
                    self.revive_ball(i);
                }
            }
        }
    }

    /// A paddle hit always costs a life, so its expiry reseeds the balls
    fn finish_paddle_hit(&mut self) {
        self.timers.paddle_hit_color = None;
        self.reseed_after_life_loss();
    }

    /// Every pair of balls, in index order
    fn resolve_ball_contacts(&mut self) {
        let n = self.balls.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let (head, tail) = self.balls.split_at_mut(j);
                resolve_ball_pair(&mut head[i], &mut tail[0], &mut self.rng);
            }
        }
    }

    /// Walls, paddle, blocks and the bottom edge, one ball at a time
    fn resolve_ball_hits(&mut self) {
        for i in 0..self.balls.len() {
            if !self.balls[i].moving {
                continue;
            }

            resolve_walls(&mut self.balls[i], &mut self.rng);

            if resolve_paddle(&mut self.balls[i], &self.paddle)
                && self.balls[i].shape == BallShape::Star
            {
                self.balls[i].reset_combo();
                self.combo_chain = 0;
            }

            if let Some((block_index, side)) = find_block_hit(&self.balls[i], &self.blocks) {
                bounce_off_block(
                    &mut self.balls[i],
                    &self.blocks[block_index],
                    side,
                    &mut self.rng,
                );
                self.on_block_hit(i, block_index);
            }

            if fell_out(&self.balls[i]) {
                self.on_ball_fell(i);
                if self.phase != GamePhase::Playing {
                    break;
                }
            }
        }
    }

    fn on_ball_fell(&mut self, index: usize) {
        let shape = self.balls[index].shape;
        if shape == BallShape::Star {
            self.balls[index].reset_combo();
            self.combo_chain = 0;
        }

        let others_moving = self
            .balls
            .iter()
            .enumerate()
            .any(|(j, b)| j != index && b.moving);

        if others_moving {
            self.balls[index].park(self.settings.revive_delay);
            self.launch_queue.retain(|&i| i != index);
            self.events.push(GameEvent::BallLost { index, shape });
            log::debug!(
                "Ball {} ({:?}) lost, reviving in {}s",
                index,
                shape,
                self.settings.revive_delay
            );
        } else {
            let ball = &mut self.balls[index];
            ball.moving = false;
            ball.vel = Vec2::ZERO;
            ball.pos.y = BALL_PARKED_Y;
            self.all_balls_lost();
        }
    }

    fn all_balls_lost(&mut self) {
        self.events.push(GameEvent::AllBallsLost);
        self.lose_life();

        if self.lives == 0 {
            self.end_game();
        } else {
            log::info!("All balls lost ({} lives left)", self.lives);
            self.phase = GamePhase::Frozen;
            self.launch_queue.clear();
            self.timers.ball_launch.cancel();
            self.timers.all_balls_lost = Countdown::start(self.settings.all_balls_lost_duration);
        }
    }

    /// Take a life and pick a hint to show with the loss
    pub(crate) fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.events.push(GameEvent::LifeLost { lives: self.lives });
        self.pick_hint();
    }

    /// Seat a fresh set of balls after a life loss and wait for the start gesture
    fn reseed_after_life_loss(&mut self) {
        if self.is_over() {
            return;
        }
        self.reset_balls(false);
        self.lasers.clear();
        self.phase = GamePhase::NotStarted;
        log::debug!("Balls reseeded");
    }

    /// Terminal transition; fires once per run
    pub fn end_game(&mut self) {
        if self.is_over() {
            return;
        }

        self.phase = GamePhase::GameOver;
        self.lasers.clear();
        self.launch_queue.clear();
        self.combo_queue.clear();

        let timers = &mut self.timers;
        timers.combo_batch.cancel();
        timers.ball_launch.cancel();
        timers.level_up.cancel();
        timers.all_balls_lost.cancel();
        timers.laser_hit_message.cancel();

        self.pick_hint();
        self.events.push(GameEvent::GameOver {
            score: self.score,
            level: self.level,
        });
        log::info!("Game over: score {}, level {}", self.score, self.level);
    }

    fn level_cleared(&mut self) {
        self.score += LEVEL_CLEAR_BONUS;
        self.phase = GamePhase::LevelClear;
        self.lasers.clear();
        self.launch_queue.clear();
        self.timers.ball_launch.cancel();
        self.timers.level_up = Countdown::start(LEVEL_UP_DURATION);
        self.events.push(GameEvent::LevelCleared { level: self.level });
        log::info!("Level {} cleared (score {})", self.level, self.score);
    }

    /// Dismiss the level-clear banner and advance right away
    pub fn skip_level_up_message(&mut self) {
        if self.phase == GamePhase::LevelClear && self.timers.level_up.is_active() {
            self.proceed_to_next_level();
        }
    }

    /// Next level: bonus life, fresh grid, balls reseeded (Circle keeps its growth)
    pub fn proceed_to_next_level(&mut self) {
        self.timers.level_up.cancel();
        self.level += 1;
        self.lives += 1;

        self.reset_balls(true);
        self.reset_blocks();
        self.lasers.clear();
        self.phase = GamePhase::NotStarted;

        self.events.push(GameEvent::LevelStarted { level: self.level });
        log::info!("Starting level {} ({} lives)", self.level, self.lives);
    }

    /// Move the paddle toward `target_x`, carrying any seated balls
    pub fn move_paddle(&mut self, target_x: f32) {
        if matches!(self.phase, GamePhase::Frozen | GamePhase::GameOver) || !target_x.is_finite() {
            return;
        }

        let previous = self.paddle.x;
        self.paddle.x = self.paddle.clamp_x(target_x);
        let dx = self.paddle.x - previous;

        let not_started = self.phase == GamePhase::NotStarted;
        let paddle = &self.paddle;
        for (i, ball) in self.balls.iter_mut().enumerate() {
            if not_started {
                ball.seat_on(paddle, paddle.x + Self::seat_offset(i));
            } else if ball.is_waiting() {
                ball.seat_on(paddle, ball.pos.x + dx);
            }
        }
    }

    /// The single "activate" gesture: start the game, or launch every
    /// waiting ball with a stagger
    pub fn activate(&mut self) {
        if self.timers.blocking_message() {
            return;
        }
        match self.phase {
            GamePhase::NotStarted => self.start_game(),
            GamePhase::Playing => self.queue_waiting_balls(),
            _ => {}
        }
    }

    /// NotStarted -> Playing; seated balls launch one after another
    pub fn start_game(&mut self) {
        if self.phase != GamePhase::NotStarted {
            return;
        }
        self.phase = GamePhase::Playing;
        log::info!("Level {} started", self.level);
        self.queue_waiting_balls();
    }

    fn queue_waiting_balls(&mut self) {
        for i in 0..self.balls.len() {
            if self.balls[i].is_waiting() && !self.launch_queue.contains(&i) {
                self.launch_queue.push_back(i);
            }
        }
        if !self.timers.ball_launch.is_active() {
            self.launch_next_queued();
        }
    }

    fn launch_next_queued(&mut self) {
        while let Some(index) = self.launch_queue.pop_front() {
            if self.launch_ball(index) {
                break;
            }
        }

        if self.launch_queue.is_empty() {
            self.timers.ball_launch.cancel();
        } else {
            self.timers.ball_launch = Countdown::start(self.settings.launch_stagger);
        }
    }

    /// Launch one waiting ball. No-op (false) for an out-of-range index, a
    /// ball that is not waiting, or outside `Playing`.
    pub fn launch_ball(&mut self, index: usize) -> bool {
        if self.phase != GamePhase::Playing {
            return false;
        }
        let Some(ball) = self.balls.get(index) else {
            return false;
        };
        if !ball.is_waiting() {
            return false;
        }

        let vel = launch_velocity(ball, &self.paddle, &mut self.rng);
        let ball = &mut self.balls[index];
        ball.vel = vel;
        ball.moving = true;

        let shape = ball.shape;
        self.events.push(GameEvent::BallLaunched { index, shape });
        log::debug!("Ball {} ({:?}) launched", index, shape);
        true
    }

    /// Bring a dormant ball back, seated on the paddle
    pub fn revive_ball(&mut self, index: usize) {
        if index >= self.balls.len() {
            return;
        }

        let waiting = self
            .balls
            .iter()
            .enumerate()
            .filter(|(j, b)| *j != index && b.is_waiting())
            .count();

        self.paddle.reset_width();
        let x = match waiting {
            0 => self.paddle.x,
            1 => self.paddle.x - self.paddle.width / 4.0,
            _ => self.paddle.x + self.paddle.width / 4.0,
        };

        let ball = &mut self.balls[index];
        ball.revive.cancel();
        ball.reset_combo();
        if ball.shape == BallShape::Circle {
            ball.growth = 0.0;
        }
        ball.seat_on(&self.paddle, x);

        let shape = ball.shape;
        self.events.push(GameEvent::BallRevived { index, shape });
        log::debug!("Ball {} ({:?}) revived", index, shape);
    }

    /// Start over from level 1 with a fresh grid
    pub fn restart_game(&mut self) {
        self.lives = self.settings.initial_lives;
        self.score = 0;
        self.level = 1;
        self.phase = GamePhase::NotStarted;
        self.timers = EffectTimers::default();
        self.combo_queue.clear();
        self.combo_chain = 0;
        self.lasers.clear();
        self.current_hint = None;
        self.paddle = Paddle::default();

        self.reset_balls(false);
        self.reset_blocks();
        log::info!("Game restarted");
    }
}
