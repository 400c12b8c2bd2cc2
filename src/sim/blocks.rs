//! Block lifecycle
//!
//! Grid seeding, timed row replenishment, block-hit side effects and the
//! Star combo, which breaks every block of one color in small timed batches.

use glam::Vec2;
use rand::Rng;

use super::state::{BallShape, Block, BlockColor, BlockPhase, GameEvent, GameState, LaserKind};
use super::timers::Countdown;
use crate::consts::*;

/// Center x of the first grid column; the grid is centered in the field
fn grid_start_x() -> f32 {
    let total = BLOCK_COLUMNS as f32 * BLOCK_WIDTH + (BLOCK_COLUMNS - 1) as f32 * BLOCK_PADDING;
    (FIELD_WIDTH - total) / 2.0 + BLOCK_WIDTH / 2.0
}

/// Center of the grid cell at (`row`, `column`)
pub fn grid_cell(row: usize, column: usize) -> Vec2 {
    Vec2::new(
        grid_start_x() + column as f32 * (BLOCK_WIDTH + BLOCK_PADDING),
        BLOCK_PADDING + row as f32 * BLOCK_ROW_PITCH + BLOCK_TOP_OFFSET + BLOCK_HEIGHT / 2.0,
    )
}

impl GameState {
    /// Replace all blocks with a fresh grid, one palette color per row
    pub fn reset_blocks(&mut self) {
        self.blocks.clear();
        self.combo_queue.clear();
        self.timers.combo_batch.cancel();

        for (row, color) in BlockColor::PALETTE.into_iter().enumerate().take(BLOCK_ROWS) {
            for column in 0..BLOCK_COLUMNS {
                let id = self.next_entity_id();
                self.blocks.push(Block::new(id, grid_cell(row, column), color));
            }
        }

        self.replenish = Countdown::start(self.settings.replenish_interval);
    }

    /// Shift every active block down one row and add a fresh row on top
    ///
    /// Ends the game instead if a shifted block would reach the paddle.
    pub fn replenish_blocks(&mut self) {
        let mut reached_paddle = false;
        for block in self.blocks.iter_mut().filter(|b| b.is_active()) {
            let from = block.target.unwrap_or(block.pos);
            let target = from + Vec2::new(0.0, BLOCK_ROW_PITCH);
            if target.y + block.size.y / 2.0 >= PADDLE_Y {
                reached_paddle = true;
            }
            block.target = Some(target);
        }

        if reached_paddle {
            log::info!("Blocks reached the paddle");
            self.end_game();
            return;
        }

        self.add_block_row();
        self.replenish = Countdown::start(self.settings.replenish_interval);
        self.events.push(GameEvent::RowsReplenished);
        log::debug!("Rows replenished ({} blocks)", self.blocks.len());
    }

    /// Append a new top row in a random palette color, fading in
    fn add_block_row(&mut self) {
        let color = BlockColor::PALETTE[self.rng.random_range(0..BlockColor::PALETTE.len())];
        let until = self.time + BLOCK_APPEAR_DURATION;

        for column in 0..BLOCK_COLUMNS {
            let id = self.next_entity_id();
            let mut block = Block::new(id, grid_cell(0, column), color);
            block.phase = BlockPhase::Appearing { until };
            self.blocks.push(block);
        }
    }

    /// Finish fade-ins and ease shifted blocks toward their targets
    pub fn update_block_animations(&mut self, dt: f32) {
        let now = self.time;
        let step = (dt * BLOCK_SLIDE_RATE).min(1.0);

        for block in &mut self.blocks {
            if let BlockPhase::Appearing { until } = block.phase {
                if now >= until {
                    block.phase = BlockPhase::Active;
                }
            }

            if let Some(target) = block.target {
                let delta = target - block.pos;
                if delta.x.abs() < BLOCK_SLIDE_SNAP && delta.y.abs() < BLOCK_SLIDE_SNAP {
                    block.pos = target;
                    block.target = None;
                } else {
                    block.pos += delta * step;
                }
            }
        }
    }

    /// Drop breaking blocks whose removal time has passed
    pub fn purge_broken_blocks(&mut self) {
        let now = self.time;
        self.blocks.retain(|b| match b.phase {
            BlockPhase::Breaking { remove_at } => now < remove_at,
            _ => true,
        });
    }

    /// Apply every consequence of ball `ball_index` striking block
    /// `block_index`. The bounce itself is handled by the caller.
    pub fn on_block_hit(&mut self, ball_index: usize, block_index: usize) {
        let Some(block) = self.blocks.get(block_index) else {
            return;
        };
        if !block.is_active() {
            return;
        }
        let (id, pos, color) = (block.id, block.pos, block.color);

        // Shape effects run while the hit block is still active, so a combo
        // fired by this hit counts it among its targets
        if let Some(ball) = self.balls.get_mut(ball_index) {
            match ball.shape {
                BallShape::Circle => ball.grow(),
                BallShape::Oval => self.paddle.shrink(),
                BallShape::Star => {
                    ball.combo_count += 1;
                    ball.last_hit_color = Some(color);
                    if ball.combo_count >= self.settings.required_combo_count {
                        ball.combo_count = 0;
                        self.activate_combo(color);
                    }
                }
            }
        }

        self.score += BLOCK_SCORE;

        // The combo's first batch may already have broken it
        let now = self.time;
        let queued_for_combo = self.combo_queue.contains(&id);
        let Some(block) = self.blocks.get_mut(block_index) else {
            return;
        };
        if !block.begin_breaking(now) {
            return;
        }
        block.combo_target = queued_for_combo;
        if queued_for_combo {
            self.combo_queue.retain(|&queued| queued != id);
        }

        self.spawn_laser(pos, color, LaserKind::Threat);
        self.events.push(GameEvent::BlockBroken { id, color });
    }

    /// Start a Star combo on `color`. Returns false if one is already
    /// running; the request is dropped, not queued.
    pub fn activate_combo(&mut self, color: BlockColor) -> bool {
        if self.combo_in_progress() {
            log::warn!("Combo on {:?} rejected: another combo is still running", color);
            self.events.push(GameEvent::ComboRejected { color });
            return false;
        }

        let targets: Vec<u32> = self
            .blocks
            .iter()
            .filter(|b| b.is_active() && b.color == color)
            .map(|b| b.id)
            .collect();

        self.combo_chain += 1;
        let every = self.settings.combo_chain_bonus_every;
        if every > 0 && self.combo_chain % every == 0 {
            self.lives += 1;
            self.events.push(GameEvent::BonusLife { lives: self.lives });
            log::info!("Combo chain {}: bonus life ({} lives)", self.combo_chain, self.lives);
        }

        // The whole set scores now; removal is paced by batches
        self.score += targets.len() as u64 * COMBO_BLOCK_SCORE;

        self.timers.combo_effect = Countdown::start(COMBO_EFFECT_DURATION);
        self.timers.combo_color = Some(color);
        self.events.push(GameEvent::ComboFired {
            color,
            blocks: targets.len(),
            chain: self.combo_chain,
        });
        log::info!(
            "Star combo on {:?}: {} blocks, chain {}",
            color,
            targets.len(),
            self.combo_chain
        );

        self.combo_queue.extend(targets);
        self.break_combo_batch();
        true
    }

    /// Break the next batch of queued combo blocks and re-arm the batch timer
    pub fn break_combo_batch(&mut self) {
        let now = self.time;
        let batch = self.settings.combo_batch_size.max(1);

        for _ in 0..batch {
            let Some(id) = self.combo_queue.pop_front() else {
                break;
            };
            // Blocks broken by a ball in the meantime are skipped
            let Some(block) = self.blocks.iter_mut().find(|b| b.id == id && b.is_active()) else {
                continue;
            };
            block.begin_breaking(now);
            block.combo_target = true;
            let (pos, color) = (block.pos, block.color);

            self.spawn_laser(pos, color, LaserKind::Threat);
            self.spawn_laser(pos - Vec2::new(0.0, LASER_HEIGHT), color, LaserKind::Cosmetic);
            self.events.push(GameEvent::BlockBroken { id, color });
        }

        if self.combo_queue.is_empty() {
            self.timers.combo_batch.cancel();
        } else {
            self.timers.combo_batch = Countdown::start(self.settings.combo_batch_interval);
        }
    }

    /// Active blocks of `color`
    pub fn active_blocks_of(&self, color: BlockColor) -> usize {
        self.blocks
            .iter()
            .filter(|b| b.is_active() && b.color == color)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::test_support::new_state;
    use crate::sim::state::GamePhase;

    #[test]
    fn test_grid_is_centered() {
        let first = grid_cell(0, 0);
        let last = grid_cell(0, BLOCK_COLUMNS - 1);
        assert!((first.x - BLOCK_WIDTH / 2.0 + last.x + BLOCK_WIDTH / 2.0 - FIELD_WIDTH).abs() < 1e-3);
        assert_eq!(first.y, BLOCK_PADDING + BLOCK_TOP_OFFSET + BLOCK_HEIGHT / 2.0);
    }

    #[test]
    fn test_reset_blocks_full_grid() {
        let state = new_state(1);
        assert_eq!(state.blocks.len(), BLOCK_ROWS * BLOCK_COLUMNS);
        for (row, color) in BlockColor::PALETTE.into_iter().enumerate() {
            let in_row = &state.blocks[row * BLOCK_COLUMNS..(row + 1) * BLOCK_COLUMNS];
            assert!(in_row.iter().all(|b| b.color == color && b.phase == BlockPhase::Active));
        }
        let mut ids: Vec<_> = state.blocks.iter().map(|b| b.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), state.blocks.len());
    }

    #[test]
    fn test_replenish_shifts_and_adds_row() {
        let mut state = new_state(2);
        let before_y = state.blocks[0].pos.y;
        state.replenish_blocks();

        assert_eq!(state.blocks.len(), (BLOCK_ROWS + 1) * BLOCK_COLUMNS);
        assert_eq!(state.blocks[0].target, Some(Vec2::new(state.blocks[0].pos.x, before_y + BLOCK_ROW_PITCH)));
        let new_row = &state.blocks[BLOCK_ROWS * BLOCK_COLUMNS..];
        assert!(new_row.iter().all(|b| matches!(b.phase, BlockPhase::Appearing { .. })));
        assert!(new_row.iter().all(|b| b.color == new_row[0].color));
        assert!(state.drain_events().contains(&GameEvent::RowsReplenished));
    }

    #[test]
    fn test_replenish_skips_breaking_blocks() {
        let mut state = new_state(2);
        state.blocks[0].begin_breaking(0.0);
        state.replenish_blocks();
        assert_eq!(state.blocks[0].target, None);
        assert!(state.blocks[1].target.is_some());
    }

    #[test]
    fn test_replenish_game_over_at_paddle() {
        let mut state = new_state(3);
        state.phase = GamePhase::Playing;
        state.blocks.truncate(1);
        state.blocks[0].pos.y = PADDLE_Y - BLOCK_ROW_PITCH;
        state.replenish_blocks();
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.blocks.len(), 1);
    }

    #[test]
    fn test_animations_appear_then_slide() {
        let mut state = new_state(4);
        state.replenish_blocks();
        let appearing = BLOCK_ROWS * BLOCK_COLUMNS;

        state.time = 0.31;
        for _ in 0..240 {
            state.update_block_animations(SIM_DT);
        }
        assert_eq!(state.blocks[appearing].phase, BlockPhase::Active);
        assert!(state.blocks.iter().all(|b| b.target.is_none()));
        assert_eq!(state.blocks[0].pos.y, grid_cell(1, 0).y);
    }

    #[test]
    fn test_purge_after_delay() {
        let mut state = new_state(5);
        state.blocks[0].begin_breaking(0.0);
        state.time = 0.69;
        state.purge_broken_blocks();
        assert_eq!(state.blocks.len(), 50);
        state.time = 0.7;
        state.purge_broken_blocks();
        assert_eq!(state.blocks.len(), 49);
    }

    #[test]
    fn test_block_hit_side_effects() {
        let mut state = new_state(6);

        state.on_block_hit(1, 0);
        assert!(state.blocks[0].is_breaking());
        assert_eq!(state.score, BLOCK_SCORE);
        assert_eq!(state.lasers.len(), 1);
        assert_eq!(state.balls[1].growth, BALL_GROWTH_STEP);

        state.on_block_hit(2, 1);
        assert_eq!(state.paddle.width, PADDLE_WIDTH - PADDLE_SHRINK_STEP);

        state.on_block_hit(0, 2);
        assert_eq!(state.balls[0].combo_count, 1);
        assert_eq!(state.balls[0].last_hit_color, Some(BlockColor::Blossom));

        // Already breaking: no double score
        state.on_block_hit(0, 2);
        assert_eq!(state.score, 3 * BLOCK_SCORE);
    }

    #[test]
    fn test_seventh_star_hit_fires_combo() {
        let mut state = new_state(7);
        state.balls[0].combo_count = 6;
        // Row 1 is all Gold
        state.on_block_hit(0, BLOCK_COLUMNS);

        assert_eq!(state.balls[0].combo_count, 0);
        assert_eq!(state.combo_chain, 1);
        // Hit block scores as a hit and as part of the combo set
        assert_eq!(state.score, BLOCK_SCORE + 10 * COMBO_BLOCK_SCORE);
        assert_eq!(state.timers.combo_color, Some(BlockColor::Gold));
        assert!(state.blocks[BLOCK_COLUMNS].combo_target);
        assert!(state.blocks[BLOCK_COLUMNS].is_breaking());
    }

    #[test]
    fn test_combo_hit_block_in_later_batch() {
        let mut state = new_state(7);
        // Five Gold blocks; the hit one is last in line for the combo
        let mut gold = 0;
        state.blocks.retain(|b| {
            if b.color != BlockColor::Gold {
                return true;
            }
            gold += 1;
            gold <= 5
        });
        let hit = state
            .blocks
            .iter()
            .rposition(|b| b.color == BlockColor::Gold)
            .unwrap();
        let hit_id = state.blocks[hit].id;
        state.balls[0].combo_count = 6;
        state.drain_events();

        state.on_block_hit(0, hit);

        assert_eq!(state.score, BLOCK_SCORE + 5 * COMBO_BLOCK_SCORE);
        assert!(state.blocks[hit].is_breaking());
        assert!(state.blocks[hit].combo_target);
        assert!(!state.combo_queue.contains(&hit_id));
        // First batch of three plus the hit block
        assert_eq!(state.active_blocks_of(BlockColor::Gold), 1);

        while state.combo_in_progress() {
            state.break_combo_batch();
        }
        assert_eq!(state.blocks.iter().filter(|b| b.combo_target).count(), 5);
        let broken = state
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::BlockBroken { .. }))
            .count();
        assert_eq!(broken, 5);
    }

    #[test]
    fn test_begin_breaking_is_idempotent() {
        let mut state = new_state(7);
        assert!(state.blocks[0].begin_breaking(1.0));
        assert!(!state.blocks[0].begin_breaking(5.0));
        assert_eq!(
            state.blocks[0].phase,
            BlockPhase::Breaking {
                remove_at: 1.0 + BLOCK_REMOVE_DELAY
            }
        );
    }

    #[test]
    fn test_combo_batches() {
        let mut state = new_state(8);
        assert!(state.activate_combo(BlockColor::Teal));

        // First batch breaks immediately
        let combo_broken = |s: &GameState| s.blocks.iter().filter(|b| b.combo_target).count();
        assert_eq!(combo_broken(&state), 3);
        assert_eq!(state.combo_queue.len(), 7);
        assert_eq!(state.score, 10 * COMBO_BLOCK_SCORE);
        assert_eq!(state.lasers.len(), 6);

        while state.combo_in_progress() {
            assert!(state.timers.combo_batch.is_active());
            state.break_combo_batch();
        }
        assert_eq!(combo_broken(&state), 10);
        assert_eq!(state.active_blocks_of(BlockColor::Teal), 0);
        assert!(!state.timers.combo_batch.is_active());
        // Score unchanged by pacing
        assert_eq!(state.score, 10 * COMBO_BLOCK_SCORE);
    }

    #[test]
    fn test_reentrant_combo_rejected() {
        let mut state = new_state(9);
        assert!(state.activate_combo(BlockColor::Teal));
        assert!(!state.activate_combo(BlockColor::Sky));
        assert_eq!(state.combo_chain, 1);
        assert_eq!(state.active_blocks_of(BlockColor::Sky), 10);
        assert!(state
            .drain_events()
            .contains(&GameEvent::ComboRejected { color: BlockColor::Sky }));
    }

    #[test]
    fn test_second_chained_combo_grants_life() {
        let mut state = new_state(10);
        let lives = state.lives;
        state.activate_combo(BlockColor::Blossom);
        state.combo_queue.clear();
        assert_eq!(state.lives, lives);
        state.activate_combo(BlockColor::Gold);
        assert_eq!(state.lives, lives + 1);
        assert_eq!(state.combo_chain, 2);
    }
}
