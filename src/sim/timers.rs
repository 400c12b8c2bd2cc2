//! Countdown timers for transient effects
//!
//! Each effect owns one [`Countdown`]. A countdown is either inactive or
//! counting down; [`Countdown::advance`] reports expiry exactly once, on the
//! tick the remaining time reaches zero, so the caller can run a single
//! state transition in response.

use serde::{Deserialize, Serialize};

use super::state::BlockColor;
use crate::consts::{SCREEN_FLASH_DURATION, SCREEN_FLASH_MAX_OPACITY, TIMER_EPSILON};

/// A timer that is either not running or has `remaining` seconds left
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Countdown {
    #[default]
    Inactive,
    Counting(f64),
}

impl Countdown {
    pub fn start(seconds: f64) -> Self {
        Countdown::Counting(seconds.max(0.0))
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Countdown::Counting(_))
    }

    pub fn remaining(&self) -> Option<f64> {
        match *self {
            Countdown::Counting(remaining) => Some(remaining),
            Countdown::Inactive => None,
        }
    }

    pub fn cancel(&mut self) {
        *self = Countdown::Inactive;
    }

    /// Subtract `dt`. Returns true on the tick the countdown expires, after
    /// which it is inactive again.
    pub fn advance(&mut self, dt: f64) -> bool {
        match *self {
            Countdown::Inactive => false,
            Countdown::Counting(remaining) => {
                let remaining = remaining - dt;
                if remaining <= TIMER_EPSILON {
                    *self = Countdown::Inactive;
                    true
                } else {
                    *self = Countdown::Counting(remaining);
                    false
                }
            }
        }
    }
}

/// All effect timers owned by the game state, advanced in a fixed order
/// once per tick (see `GameState::advance_timers`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectTimers {
    /// Star combo banner
    pub combo_effect: Countdown,
    pub combo_color: Option<BlockColor>,
    /// Spacing between combo batches
    pub combo_batch: Countdown,
    /// Level clear banner; expiry advances the level
    pub level_up: Countdown,
    /// "All balls lost" banner; expiry reseeds balls
    pub all_balls_lost: Countdown,
    /// "Laser hit" banner
    pub laser_hit_message: Countdown,
    pub screen_flash: Countdown,
    pub flash_color: Option<BlockColor>,
    /// Paddle struck by a laser; expiry reseeds balls unless the game ended
    pub paddle_hit: Countdown,
    pub paddle_hit_color: Option<BlockColor>,
    /// Spacing between queued ball launches
    pub ball_launch: Countdown,
}

impl EffectTimers {
    /// Screen flash opacity, fading out over the flash duration
    pub fn screen_flash_opacity(&self) -> f64 {
        match self.screen_flash.remaining() {
            Some(remaining) => {
                (remaining / SCREEN_FLASH_DURATION * SCREEN_FLASH_MAX_OPACITY)
                    .min(SCREEN_FLASH_MAX_OPACITY)
            }
            None => 0.0,
        }
    }

    /// Any banner that blocks player input is showing
    pub fn blocking_message(&self) -> bool {
        self.level_up.is_active()
            || self.all_balls_lost.is_active()
            || self.laser_hit_message.is_active()
    }
}
