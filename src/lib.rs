//! CueTips - pool shot trajectory prediction
//!
//! Core modules:
//! - `sim`: Deterministic table simulation (bodies, collisions, friction, path recording)
//! - `config`: Tunable physics parameters
//! - `error`: Error types raised before a run starts

pub mod config;
pub mod error;
pub mod sim;

pub use config::SimConfig;
pub use error::{Result, SimError};
pub use sim::{CueSpeed, CueStrike, Outcome, Pacing, ShotInput, ShotPath, simulate_shot};

use glam::Vec2;

/// Physics configuration constants
pub mod consts {
    /// Fixed simulation timestep (50 Hz)
    pub const SIM_DT: f32 = 1.0 / 50.0;
    /// Step cap: ten minutes of table time, far beyond any real shot
    pub const DEFAULT_MAX_STEPS: u32 = 30_000;

    /// Coefficient of restitution for ball-ball and ball-rail impacts
    pub const RESTITUTION: f32 = 0.9;
    /// Tangential friction between two balls in contact
    pub const BALL_FRICTION: f32 = 0.06;
    /// Along-rail damping on a cushion hit
    pub const WALL_FRICTION: f32 = 0.14;
    /// Rolling resistance of the cloth
    pub const TABLE_FRICTION: f32 = 0.7;
    /// Gravitational acceleration used for rolling resistance
    pub const GRAVITY: f32 = 9.8;

    /// Default ball mass
    pub const BALL_MASS: f32 = 1.0;
    /// Speed below which a ball counts as settled
    pub const REST_SPEED: f32 = 1e-3;

    /// Random cue speed range when the caller does not fix one
    pub const CUE_SPEED_MIN: f32 = 150.0;
    pub const CUE_SPEED_MAX: f32 = 220.0;

    /// Max Euclidean RGB distance from pure white for the cue ball
    pub const CUE_WHITE_TOLERANCE: f32 = 100.0;
    /// Pocket capture radius as a multiple of the ball radius
    pub const POCKET_RADIUS_FACTOR: f32 = 2.5;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}
