//! Per-shape collision profile
//!
//! Every place that bounces a ball (walls, blocks, paddle, other balls)
//! asks the ball's shape for its coefficients here instead of branching on
//! the shape itself.

use std::f32::consts::{PI, TAU};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::BallShape;

/// Axis of the surface being hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    /// Left/right surface: flips the x component
    Horizontal,
    /// Top/bottom surface: flips the y component
    Vertical,
}

/// Random perturbation applied after a bounce
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Jitter {
    /// Rotate the whole velocity by a uniform angle in `[-a, a]` radians
    Angular(f32),
    /// Scale the component along the surface by a uniform factor in `[lo, hi]`
    Perpendicular(f32, f32),
}

impl Jitter {
    /// Sample an angular jitter (0 for perpendicular jitter)
    pub fn sample_angle<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        match *self {
            Jitter::Angular(a) if a > 0.0 => rng.random_range(-a..=a),
            _ => 0.0,
        }
    }
}

/// Response of a shape to one impact
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rebound {
    /// Surface bounce: multiplier on the flipped component (sign included).
    /// Ball impact: multiplier on the exchanged impulse.
    pub restitution: f32,
    pub jitter: Jitter,
}

/// Fixed per-shape coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeProfile {
    /// Spin per unit speed relative to a Circle
    pub spin_multiplier: f32,
    /// Scales the paddle deflection angle
    pub paddle_angle_modifier: f32,
    /// Surface bounces keep the pre-impact speed
    pub preserves_speed: bool,
}

impl BallShape {
    pub fn profile(self) -> ShapeProfile {
        match self {
            BallShape::Star => ShapeProfile {
                spin_multiplier: 0.8,
                paddle_angle_modifier: 1.2,
                preserves_speed: false,
            },
            BallShape::Circle => ShapeProfile {
                spin_multiplier: 1.0,
                paddle_angle_modifier: 1.0,
                preserves_speed: false,
            },
            BallShape::Oval => ShapeProfile {
                spin_multiplier: 1.2,
                paddle_angle_modifier: 0.85,
                preserves_speed: true,
            },
        }
    }

    /// Bounce off a wall or block edge
    pub fn surface_rebound(self, rotation_deg: f32, axis: Axis) -> Rebound {
        match self {
            // Sharp and unpredictable
            BallShape::Star => Rebound {
                restitution: -1.25,
                jitter: Jitter::Angular(0.35),
            },
            // Plain mirror with a subtle wobble
            BallShape::Circle => Rebound {
                restitution: -1.0,
                jitter: Jitter::Perpendicular(0.95, 1.05),
            },
            BallShape::Oval => {
                let long_axis_horizontal = long_axis_horizontal(rotation_deg);
                let aligned = match axis {
                    Axis::Horizontal => long_axis_horizontal,
                    Axis::Vertical => !long_axis_horizontal,
                };
                if aligned {
                    Rebound {
                        restitution: -0.7,
                        jitter: Jitter::Perpendicular(0.7, 1.3),
                    }
                } else {
                    Rebound {
                        restitution: -1.3,
                        jitter: Jitter::Perpendicular(0.9, 1.1),
                    }
                }
            }
        }
    }

    /// Response to a collision with another moving ball
    pub fn impact(self, rotation_deg: f32) -> Rebound {
        match self {
            BallShape::Star => {
                if star_tip_leading(rotation_deg) {
                    Rebound {
                        restitution: 1.5,
                        jitter: Jitter::Angular(0.5),
                    }
                } else {
                    Rebound {
                        restitution: 0.7,
                        jitter: Jitter::Angular(0.2),
                    }
                }
            }
            BallShape::Circle => Rebound {
                restitution: 1.0,
                jitter: Jitter::Angular(0.05),
            },
            BallShape::Oval => {
                if long_axis_horizontal(rotation_deg) {
                    Rebound {
                        restitution: 0.7,
                        jitter: Jitter::Angular(0.1),
                    }
                } else {
                    Rebound {
                        restitution: 1.4,
                        jitter: Jitter::Angular(0.3),
                    }
                }
            }
        }
    }

    /// New spin after a glancing ball-ball impact
    pub fn oblique_spin<R: Rng + ?Sized>(self, spin: f32, rng: &mut R) -> f32 {
        match self {
            BallShape::Star => rng.random_range(-1.5..=1.5) * spin.abs() * 1.5,
            BallShape::Circle => spin * 1.2,
            BallShape::Oval => {
                if rng.random::<bool>() {
                    spin * -1.2
                } else {
                    spin * 1.4
                }
            }
        }
    }
}

/// The oval's long axis lies closer to horizontal
pub fn long_axis_horizontal(rotation_deg: f32) -> bool {
    rotation_deg.to_radians().rem_euclid(PI) < PI / 2.0
}

/// One of the star's five points faces the impact
pub fn star_tip_leading(rotation_deg: f32) -> bool {
    let turn = rotation_deg.to_radians().rem_euclid(TAU) / TAU;
    let sector = (turn * 5.0).round() as u32 % 5;
    sector % 2 == 0
}
