//! End-to-end gameplay scenarios driven through the public API

use glam::Vec2;
use proptest::prelude::*;
use shape_breakout::consts::*;
use shape_breakout::sim::{
    BallShape, BlockColor, GameEvent, GamePhase, GameState, TickInput, tick,
};
use shape_breakout::{HintSet, Settings};

const BUNDLED_HINTS: &str = include_str!("../assets/hints.json");

fn new_game(seed: u64, settings: Settings) -> GameState {
    let hints = HintSet::from_json(BUNDLED_HINTS).unwrap();
    GameState::new(seed, settings, hints)
}

fn run(state: &mut GameState, seconds: f32) {
    let ticks = (seconds / SIM_DT).round() as usize;
    for _ in 0..ticks {
        state.update(SIM_DT);
    }
}

fn count_events(events: &[GameEvent], pred: impl Fn(&GameEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}

#[test]
fn bundled_hints_are_valid() {
    let hints = HintSet::from_json(BUNDLED_HINTS).unwrap();
    assert!(hints.len() >= 5);
}

#[test]
fn losing_every_ball_on_the_last_life_ends_the_game_once() {
    let settings = Settings {
        initial_lives: 1,
        ..Default::default()
    };
    let mut state = new_game(1, settings);
    state.start_game();
    state.drain_events();

    // All three already past the bottom edge, spread apart
    for (i, ball) in state.balls.iter_mut().enumerate() {
        ball.pos = Vec2::new(100.0 + i as f32 * 200.0, FIELD_HEIGHT + 50.0);
        ball.vel = Vec2::new(0.0, 200.0);
        ball.moving = true;
    }
    state.launch_queue.clear();

    state.update(SIM_DT);
    assert_eq!(state.phase, GamePhase::GameOver);
    assert_eq!(state.lives, 0);
    assert!(state.current_hint.is_some());

    // Further ticks change nothing
    run(&mut state, 5.0);
    let events = state.drain_events();
    assert_eq!(
        count_events(&events, |e| matches!(e, GameEvent::GameOver { .. })),
        1
    );
    assert_eq!(
        count_events(&events, |e| matches!(e, GameEvent::BallLost { .. })),
        2
    );
    assert_eq!(state.phase, GamePhase::GameOver);
}

/// Launch `ball` straight up from just below block `block_id` and tick until
/// it breaks. Returns every event raised on the way.
fn strike(state: &mut GameState, ball: usize, block_id: u32) -> Vec<GameEvent> {
    let block = state.blocks.iter().find(|b| b.id == block_id).unwrap();
    let start = Vec2::new(block.pos.x, block.bottom() + 20.0);

    let b = &mut state.balls[ball];
    b.pos = start;
    b.vel = Vec2::new(0.0, -BALL_BASE_SPEED);
    b.moving = true;

    let mut events = Vec::new();
    for _ in 0..30 {
        state.update(SIM_DT);
        events.extend(state.drain_events());
        let broke = events
            .iter()
            .any(|e| matches!(e, GameEvent::BlockBroken { id, .. } if *id == block_id));
        if broke {
            return events;
        }
    }
    panic!("ball {} never reached block {}", ball, block_id);
}

/// Keep only the listed (row, column) cells of the initial grid
fn keep_cells(state: &mut GameState, cells: &[(usize, usize)]) -> Vec<u32> {
    let ids: Vec<u32> = cells
        .iter()
        .map(|&(row, column)| state.blocks[row * BLOCK_COLUMNS + column].id)
        .collect();
    state.blocks.retain(|b| ids.contains(&b.id));
    ids
}

/// Started game with only ball `active` in play and nothing queued
fn started_with_one_ball(seed: u64, active: usize) -> GameState {
    let mut state = new_game(seed, Settings::default());
    state.start_game();
    state.launch_queue.clear();
    state.timers.ball_launch.cancel();
    for (i, ball) in state.balls.iter_mut().enumerate() {
        if i != active {
            ball.park(state.settings.revive_delay);
        }
    }
    state.drain_events();
    state
}

#[test]
fn star_combo_through_play_scores_up_front_and_breaks_in_batches() {
    let mut state = started_with_one_ball(2, 0);
    assert_eq!(state.balls[0].shape, BallShape::Star);

    // Six Sky blocks along the bottom row, five Gold blocks higher up
    let sky_cells = (0..6).map(|column| (4, column));
    let gold_cells = (5..10).map(|column| (1, column));
    let ids = keep_cells(&mut state, &sky_cells.chain(gold_cells).collect::<Vec<_>>());
    let (sky, gold) = ids.split_at(6);

    for &id in sky {
        let events = strike(&mut state, 0, id);
        assert!(!events.iter().any(|e| matches!(e, GameEvent::ComboFired { .. })));
    }
    assert_eq!(state.balls[0].combo_count, 6);
    let score_before = state.score;

    // Seventh hit, on a color with five active blocks
    let events = strike(&mut state, 0, gold[0]);
    assert!(events.contains(&GameEvent::ComboFired {
        color: BlockColor::Gold,
        blocks: 5,
        chain: 1,
    }));
    assert_eq!(state.score - score_before, BLOCK_SCORE + 5 * COMBO_BLOCK_SCORE);
    assert_eq!(state.balls[0].combo_count, 0);
    assert_eq!(state.timers.combo_color, Some(BlockColor::Gold));

    // First batch broke right away, the rest is queued
    let batch = state.settings.combo_batch_size;
    assert_eq!(state.active_blocks_of(BlockColor::Gold), 5 - batch);
    assert!(state.combo_in_progress());

    run(&mut state, 0.1);
    assert_eq!(state.active_blocks_of(BlockColor::Gold), 0);
    assert!(!state.combo_in_progress());
    let combo_targets = state
        .blocks
        .iter()
        .filter(|b| b.combo_target)
        .map(|b| b.id)
        .collect::<Vec<_>>();
    assert_eq!(combo_targets.len(), 5);
    assert!(gold.iter().all(|id| combo_targets.contains(id)));

    // Scoring happened once, up front
    assert_eq!(state.score - score_before, BLOCK_SCORE + 5 * COMBO_BLOCK_SCORE);
}

#[test]
fn oval_hits_only_ever_narrow_the_paddle() {
    let mut state = started_with_one_ball(3, 2);
    assert_eq!(state.balls[2].shape, BallShape::Oval);
    let targets = keep_cells(&mut state, &(0..5).map(|column| (4, column)).collect::<Vec<_>>());

    let mut width = state.paddle.width;
    for (hits, &id) in targets.iter().enumerate() {
        strike(&mut state, 2, id);
        assert!(state.paddle.width <= width);
        width = state.paddle.width;
        assert_eq!(width, PADDLE_WIDTH - (hits + 1) as f32 * PADDLE_SHRINK_STEP);
    }
}

#[test]
fn clearing_a_level_pauses_then_advances() {
    let mut state = new_game(3, Settings::default());
    state.start_game();
    state.launch_queue.clear();
    state.timers.ball_launch.cancel();
    state.paddle.width = 60.0;
    state.blocks.clear();
    let score_before = state.score;

    state.update(SIM_DT);
    assert_eq!(state.phase, GamePhase::LevelClear);
    assert!(state.is_paused());
    assert_eq!(state.score - score_before, LEVEL_CLEAR_BONUS);

    run(&mut state, 2.9);
    assert_eq!(state.phase, GamePhase::LevelClear);
    assert_eq!(state.level, 1);

    run(&mut state, 0.2);
    assert_eq!(state.phase, GamePhase::NotStarted);
    assert_eq!(state.level, 2);
    assert_eq!(state.lives, Settings::default().initial_lives + 1);
    assert_eq!(state.blocks.len(), BLOCK_ROWS * BLOCK_COLUMNS);
    assert_eq!(state.paddle.width, PADDLE_WIDTH);
    assert!(state.balls.iter().all(|b| b.is_waiting()));
}

#[test]
fn revive_restores_paddle_width() {
    let mut state = new_game(4, Settings::default());
    state.start_game();
    state.paddle.width = 55.0;
    state.balls[2].park(1.0);

    state.revive_ball(2);
    assert_eq!(state.paddle.width, PADDLE_WIDTH);
    assert!(state.balls[2].is_waiting());
}

#[test]
fn autopilot_runs_are_reproducible() {
    let input = TickInput {
        idle_mode: true,
        ..Default::default()
    };
    let mut a = new_game(42, Settings::default());
    let mut b = new_game(42, Settings::default());

    for _ in 0..3000 {
        tick(&mut a, &input, SIM_DT);
        tick(&mut b, &input, SIM_DT);
    }

    let ja = serde_json::to_string(&a.snapshot()).unwrap();
    let jb = serde_json::to_string(&b.snapshot()).unwrap();
    assert_eq!(ja, jb);
    assert!(a.is_started());
}

/// How deep a point sits inside a rectangle (negative when outside)
fn depth_inside(point: Vec2, left: f32, right: f32, top: f32, bottom: f32) -> f32 {
    (point.x - left)
        .min(right - point.x)
        .min(point.y - top)
        .min(bottom - point.y)
}

proptest! {
    #[test]
    fn balls_never_end_a_tick_embedded(
        shape in 0usize..3,
        x in 20.0f32..780.0,
        y in 233.0f32..540.0,
        angle in 0.0f32..std::f32::consts::TAU,
        speed in 100.0f32..250.0,
        ticks in 1usize..30,
    ) {
        let mut state = started_with_one_ball(7, shape);
        let ball = &mut state.balls[shape];
        ball.pos = Vec2::new(x, y);
        ball.vel = Vec2::from_angle(angle) * speed;
        ball.moving = true;

        for _ in 0..ticks {
            state.update(SIM_DT);
            for ball in &state.balls {
                for block in state.blocks.iter().filter(|b| b.is_active()) {
                    let depth =
                        depth_inside(ball.pos, block.left(), block.right(), block.top(), block.bottom());
                    prop_assert!(depth <= 1e-3, "ball at {:?} inside block {}", ball.pos, block.id);
                }
                let paddle = &state.paddle;
                let depth =
                    depth_inside(ball.pos, paddle.left(), paddle.right(), paddle.top(), paddle.bottom());
                prop_assert!(depth <= 1e-3, "ball at {:?} inside the paddle", ball.pos);
            }
        }
    }

    #[test]
    fn circle_radius_stays_in_bounds(hits in 0usize..100) {
        let mut state = new_game(6, Settings::default());
        let circle = &mut state.balls[1];
        prop_assert_eq!(circle.shape, BallShape::Circle);
        for _ in 0..hits {
            circle.grow();
        }
        let r = circle.effective_radius();
        prop_assert!(r >= BALL_RADIUS);
        prop_assert!(r <= BALL_RADIUS + BALL_MAX_GROWTH);
    }

    #[test]
    fn revive_fires_once_the_delay_has_elapsed(
        frames in prop::collection::vec(0.001f32..0.05, 40..200),
    ) {
        let delay = 1.0;
        let settings = Settings {
            revive_delay: delay,
            ..Default::default()
        };
        let mut state = new_game(5, settings);
        state.start_game();
        state.launch_queue.clear();
        state.timers.ball_launch.cancel();
        for ball in &mut state.balls {
            ball.vel = Vec2::ZERO;
            ball.moving = false;
        }
        state.balls[0].park(delay);

        let mut elapsed = 0.0f64;
        for dt in frames {
            state.update(dt);
            elapsed += dt as f64;
            if elapsed < delay - 1e-4 {
                prop_assert!(state.balls[0].is_dormant());
            } else if elapsed > delay + 1e-4 {
                prop_assert!(state.balls[0].is_waiting());
            }
        }
    }
}
