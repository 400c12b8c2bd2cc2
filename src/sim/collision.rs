//! Collision detection and response
//!
//! Pure functions over entities: motion integration, wall/ceiling, paddle,
//! block and ball-ball contacts. Shape-specific numbers come from
//! [`super::shape`]; side effects of a hit (scoring, growth, combos) are
//! applied by the game state, not here.

use glam::Vec2;
use rand::Rng;

use super::shape::{Axis, Jitter, Rebound};
use super::state::{Ball, Block, Paddle};
use crate::consts::*;
use crate::{rotate_vec, wrap_degrees};

/// Lengths below this are treated as zero
const DEGENERATE: f32 = 1e-6;

/// Restitution when a moving ball bounces off a seated one
const RESTING_BALL_BOOST: f32 = 1.2;
/// Angular jitter (radians) when bouncing off a seated ball
const RESTING_BALL_JITTER: f32 = 0.2;
/// |v̂·n| above this counts as a head-on impact
const HEAD_ON_THRESHOLD: f32 = 0.7;

/// Which block edge the ball struck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub fn axis(self) -> Axis {
        match self {
            Side::Left | Side::Right => Axis::Horizontal,
            Side::Top | Side::Bottom => Axis::Vertical,
        }
    }
}

/// Advance a moving ball's position and spin
pub fn integrate_ball(ball: &mut Ball, dt: f32) {
    if !ball.moving {
        return;
    }

    ball.pos += ball.vel * dt;

    // Spin magnitude follows speed; the sign survives so impacts can reverse it
    let spin = ball.speed() * BALL_SPIN_PER_SPEED * ball.shape.profile().spin_multiplier;
    ball.rotation_speed = if ball.rotation_speed < 0.0 { -spin } else { spin };
    ball.rotation = wrap_degrees(ball.rotation + ball.rotation_speed * dt * 360.0);
}

/// Reflect `vel` off a surface along `axis`
///
/// The flipped component is multiplied by `rebound.restitution`, then the
/// jitter is applied. With `preserves_speed` the result is rescaled to the
/// incoming speed.
pub fn reflect_on_axis<R: Rng + ?Sized>(
    vel: Vec2,
    rebound: Rebound,
    axis: Axis,
    preserves_speed: bool,
    rng: &mut R,
) -> Vec2 {
    let speed_before = vel.length();
    let mut v = vel;

    match axis {
        Axis::Horizontal => v.x *= rebound.restitution,
        Axis::Vertical => v.y *= rebound.restitution,
    }

    match rebound.jitter {
        Jitter::Angular(_) => {
            let angle = rebound.jitter.sample_angle(rng);
            v = rotate_vec(v, angle);
        }
        Jitter::Perpendicular(lo, hi) => {
            let factor = rng.random_range(lo..=hi);
            match axis {
                Axis::Horizontal => v.y *= factor,
                Axis::Vertical => v.x *= factor,
            }
        }
    }

    if preserves_speed {
        let speed_after = v.length();
        if speed_after > DEGENERATE {
            v *= speed_before / speed_after;
        }
    }

    v
}

/// Bounce a ball off a surface using its shape profile
pub fn bounce<R: Rng + ?Sized>(ball: &mut Ball, axis: Axis, rng: &mut R) {
    let rebound = ball.shape.surface_rebound(ball.rotation, axis);
    let preserves_speed = ball.shape.profile().preserves_speed;
    ball.vel = reflect_on_axis(ball.vel, rebound, axis, preserves_speed, rng);
}

/// Side walls and ceiling. Returns true if the ball bounced.
///
/// The ball only reflects while heading into the surface, but is always
/// clamped back inside the field.
pub fn resolve_walls<R: Rng + ?Sized>(ball: &mut Ball, rng: &mut R) -> bool {
    if !ball.moving {
        return false;
    }

    let r = ball.effective_radius();
    let mut hit = false;

    if ball.pos.x - r <= 0.0 {
        if ball.vel.x < 0.0 {
            bounce(ball, Axis::Horizontal, rng);
            hit = true;
        }
        ball.pos.x = r;
    } else if ball.pos.x + r >= FIELD_WIDTH {
        if ball.vel.x > 0.0 {
            bounce(ball, Axis::Horizontal, rng);
            hit = true;
        }
        ball.pos.x = FIELD_WIDTH - r;
    }

    if ball.pos.y - r <= 0.0 {
        if ball.vel.y < 0.0 {
            bounce(ball, Axis::Vertical, rng);
            hit = true;
        }
        ball.pos.y = r;
    }

    hit
}

/// Axis-aligned overlap between a ball's bounding box and a rectangle
#[inline]
pub fn ball_overlaps_rect(ball: &Ball, left: f32, right: f32, top: f32, bottom: f32) -> bool {
    let r = ball.effective_radius();
    ball.pos.y + r >= top && ball.pos.y - r <= bottom && ball.pos.x + r >= left && ball.pos.x - r <= right
}

/// Paddle contact. Returns true on a hit.
///
/// The outgoing angle depends only on where the ball lands on the paddle,
/// and the speed is reset to base.
pub fn resolve_paddle(ball: &mut Ball, paddle: &Paddle) -> bool {
    if !ball.moving
        || !ball_overlaps_rect(ball, paddle.left(), paddle.right(), paddle.top(), paddle.bottom())
    {
        return false;
    }

    let offset = ((ball.pos.x - paddle.x) / paddle.half_width()).clamp(-1.0, 1.0);
    let angle = offset * PADDLE_MAX_DEFLECTION * ball.shape.profile().paddle_angle_modifier;

    ball.vel = Vec2::new(angle.sin(), -angle.cos()) * BALL_BASE_SPEED;
    ball.pos.y = paddle.top() - ball.effective_radius();
    true
}

/// Launch velocity for a ball sitting at `x` on the paddle
pub fn launch_velocity<R: Rng + ?Sized>(ball: &Ball, paddle: &Paddle, rng: &mut R) -> Vec2 {
    let offset = ((ball.pos.x - paddle.x) / paddle.half_width()).clamp(-1.0, 1.0);
    let angle = offset * PADDLE_MAX_DEFLECTION * ball.shape.profile().paddle_angle_modifier
        + rng.random_range(-BALL_LAUNCH_JITTER..=BALL_LAUNCH_JITTER);
    Vec2::new(angle.sin(), -angle.cos()) * BALL_BASE_SPEED
}

/// First active block overlapping the ball, in collection order
///
/// Only one block is considered per ball per tick, so simultaneous
/// overlaps never compound.
pub fn find_block_hit(ball: &Ball, blocks: &[Block]) -> Option<(usize, Side)> {
    if !ball.moving {
        return None;
    }

    let index = blocks.iter().position(|block| {
        block.is_active()
            && ball_overlaps_rect(ball, block.left(), block.right(), block.top(), block.bottom())
    })?;
    Some((index, nearest_side(ball.pos, &blocks[index])))
}

/// Block edge closest to `point`; ties resolve left, right, top, bottom
pub fn nearest_side(point: Vec2, block: &Block) -> Side {
    let candidates = [
        (Side::Left, (point.x - block.left()).abs()),
        (Side::Right, (point.x - block.right()).abs()),
        (Side::Top, (point.y - block.top()).abs()),
        (Side::Bottom, (point.y - block.bottom()).abs()),
    ];

    let mut best = candidates[0];
    for candidate in &candidates[1..] {
        if candidate.1 < best.1 {
            best = *candidate;
        }
    }
    best.0
}

/// Reflect off a block edge and move the ball flush against it
pub fn bounce_off_block<R: Rng + ?Sized>(ball: &mut Ball, block: &Block, side: Side, rng: &mut R) {
    bounce(ball, side.axis(), rng);

    let r = ball.effective_radius();
    match side {
        Side::Left => ball.pos.x = block.left() - r,
        Side::Right => ball.pos.x = block.right() + r,
        Side::Top => ball.pos.y = block.top() - r,
        Side::Bottom => ball.pos.y = block.bottom() + r,
    }
}

/// Ball's top edge has passed the bottom of the field
#[inline]
pub fn fell_out(ball: &Ball) -> bool {
    ball.moving && !ball.is_dormant() && ball.pos.y - ball.effective_radius() > FIELD_HEIGHT
}

/// Resolve contact between two balls. Returns true if either changed.
///
/// A seated ball never moves; the moving one bounces off it. Two moving
/// balls exchange a shape-weighted impulse along the contact normal, but
/// only while approaching.
pub fn resolve_ball_pair<R: Rng + ?Sized>(a: &mut Ball, b: &mut Ball, rng: &mut R) -> bool {
    if !(a.moving || b.moving) || a.is_dormant() || b.is_dormant() {
        return false;
    }

    let delta = b.pos - a.pos;
    let reach = a.effective_radius() + b.effective_radius();
    if delta.length_squared() >= reach * reach {
        return false;
    }

    let dist = delta.length();
    if dist <= DEGENERATE {
        return false;
    }

    // Contact normal from a to b
    let n = delta / dist;
    let overlap = reach - dist;

    match (a.moving, b.moving) {
        (true, false) => deflect_off_resting(a, -n, overlap, rng),
        (false, true) => deflect_off_resting(b, n, overlap, rng),
        _ => exchange_impulse(a, b, n, overlap, rng),
    }
}

/// `normal` points from the resting ball toward the mover
fn deflect_off_resting<R: Rng + ?Sized>(
    mover: &mut Ball,
    normal: Vec2,
    overlap: f32,
    rng: &mut R,
) -> bool {
    // Push out regardless, so the mover never stays embedded
    mover.pos += normal * overlap;

    let speed = mover.speed();
    if speed <= DEGENERATE {
        return true;
    }

    let dir = mover.vel / speed;
    let approach = dir.dot(normal);
    if approach < 0.0 {
        let reflected = dir - 2.0 * approach * normal;
        let jitter = rng.random_range(-RESTING_BALL_JITTER..=RESTING_BALL_JITTER);
        mover.vel = rotate_vec(reflected * speed * RESTING_BALL_BOOST, jitter);
    }
    true
}

/// `n` points from a to b
fn exchange_impulse<R: Rng + ?Sized>(
    a: &mut Ball,
    b: &mut Ball,
    n: Vec2,
    overlap: f32,
    rng: &mut R,
) -> bool {
    let impulse = (a.vel - b.vel).dot(n);
    if impulse <= 0.0 {
        return false;
    }

    let rebound_a = a.shape.impact(a.rotation);
    let rebound_b = b.shape.impact(b.rotation);

    a.vel -= n * impulse * rebound_a.restitution;
    b.vel += n * impulse * rebound_b.restitution;

    a.vel = rotate_vec(a.vel, rebound_a.jitter.sample_angle(rng));
    b.vel = rotate_vec(b.vel, rebound_b.jitter.sample_angle(rng));

    let half = overlap / 2.0;
    a.pos -= n * half;
    b.pos += n * half;

    adjust_spin(a, n, rng);
    adjust_spin(b, -n, rng);
    true
}

fn adjust_spin<R: Rng + ?Sized>(ball: &mut Ball, n: Vec2, rng: &mut R) {
    let dir = ball.vel.normalize_or_zero();
    ball.rotation_speed = if dir.dot(n).abs() > HEAD_ON_THRESHOLD {
        ball.rotation_speed * -0.9
    } else {
        ball.shape.oblique_spin(ball.rotation_speed, rng)
    };
    ball.rotation_speed = ball.rotation_speed.clamp(-BALL_MAX_SPIN, BALL_MAX_SPIN);
}
