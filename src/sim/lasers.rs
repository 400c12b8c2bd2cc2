//! Laser mechanics
//!
//! Broken blocks fire a laser straight down. A laser that reaches the paddle
//! costs a life; one that touches any ball is simply absorbed.

use glam::Vec2;

use super::state::{Ball, BlockColor, GameEvent, GamePhase, GameState, Laser, LaserKind, Paddle};
use super::timers::Countdown;
use crate::consts::*;

/// Laser box overlaps the paddle box
pub fn laser_hits_paddle(laser: &Laser, paddle: &Paddle) -> bool {
    let half = laser.size / 2.0;
    laser.pos.y + half.y >= paddle.top()
        && laser.pos.y - half.y <= paddle.bottom()
        && laser.pos.x + half.x >= paddle.left()
        && laser.pos.x - half.x <= paddle.right()
}

/// Laser center within reach of a ball
pub fn laser_hits_ball(laser: &Laser, ball: &Ball) -> bool {
    if ball.is_dormant() {
        return false;
    }
    let reach = ball.effective_radius() + laser.size.x / 2.0;
    laser.pos.distance_squared(ball.pos) < reach * reach
}

impl GameState {
    pub fn spawn_laser(&mut self, pos: Vec2, color: BlockColor, kind: LaserKind) {
        self.lasers.push(Laser::new(pos, color, kind));
        if kind == LaserKind::Threat {
            self.events.push(GameEvent::LaserFired { color });
        }
    }

    /// Move every laser and drop those that left the field
    pub fn move_lasers(&mut self, dt: f32) {
        for laser in &mut self.lasers {
            laser.pos += laser.vel * dt;
        }
        self.lasers
            .retain(|l| l.pos.y <= FIELD_HEIGHT + LASER_EXIT_MARGIN);
    }

    /// Resolve lasers against the paddle and the balls
    ///
    /// Iterates in reverse so removals never shift an unvisited index.
    pub fn check_laser_collisions(&mut self) {
        // A paddle hit is already being played out
        if self.timers.paddle_hit.is_active() {
            return;
        }

        for i in (0..self.lasers.len()).rev() {
            let laser = &self.lasers[i];
            if laser.kind == LaserKind::Cosmetic {
                continue;
            }

            if laser_hits_paddle(laser, &self.paddle) {
                let color = laser.color;
                self.on_laser_hit_paddle(color);
                return;
            }

            if self.balls.iter().any(|ball| laser_hits_ball(laser, ball)) {
                self.lasers.remove(i);
            }
        }
    }

    fn on_laser_hit_paddle(&mut self, color: BlockColor) {
        self.lasers.clear();
        self.events.push(GameEvent::LaserHitPaddle { color });

        self.timers.paddle_hit = Countdown::start(PADDLE_HIT_DURATION);
        self.timers.paddle_hit_color = Some(color);
        self.timers.screen_flash = Countdown::start(SCREEN_FLASH_DURATION);
        self.timers.flash_color = Some(color);

        self.lose_life();
        if self.lives == 0 {
            self.end_game();
        } else {
            log::info!("Laser hit the paddle ({} lives left)", self.lives);
            self.timers.laser_hit_message =
                Countdown::start(self.settings.laser_hit_message_duration);
            self.phase = GamePhase::Frozen;
        }
    }
}
