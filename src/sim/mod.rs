//! Deterministic shot simulation
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by ball ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod friction;
pub mod geometry;
pub mod recorder;
pub mod state;
pub mod table;
pub mod world;

pub use collision::{CollisionEvent, Contact, ContactParams, ball_ball_impulse, ball_wall_response};
pub use friction::{apply_table_friction, decelerate};
pub use geometry::{Circle, Rgb, Segment};
pub use recorder::{EventRecorder, PathSegment};
pub use state::{Ball, BallId, BodyStore};
pub use table::{Bounds, Pocket, Rail, Table, Wall, rectangle_walls};
pub use world::{
    BallSpec, CancelToken, CueSpeed, CueStrike, Outcome, Pacing, ShotInput, ShotPath, SimPhase,
    SimulationWorld, find_cue_ball, simulate_shot,
};
