//! Simulation world and the fixed-timestep loop
//!
//! A `SimulationWorld` owns everything one shot needs (bodies, table, path
//! recorder). Nothing is shared between runs, so concurrent shots just build
//! their own worlds.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionEvent, ContactParams, resolve_step};
use super::friction::apply_table_friction;
use super::geometry::{Rgb, Segment};
use super::recorder::{EventRecorder, PathSegment};
use super::state::{BallId, BodyStore};
use super::table::{Bounds, Pocket, Table};
use crate::config::SimConfig;
use crate::error::{Result, SimError};
use crate::{normalize_angle, polar_to_cartesian};

/// A detected ball
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallSpec {
    pub pos: Vec2,
    pub color: Rgb,
}

/// How hard the cue ball is struck
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueSpeed {
    /// Exact speed in table units per second
    Fixed(f32),
    /// Drawn uniformly from the configured range with a seeded generator
    Random { seed: u64 },
}

impl Default for CueSpeed {
    fn default() -> Self {
        CueSpeed::Random { seed: 0 }
    }
}

impl CueSpeed {
    /// Concrete speed for this strike
    pub fn resolve(&self, (lo, hi): (f32, f32)) -> f32 {
        match *self {
            CueSpeed::Fixed(speed) => speed,
            CueSpeed::Random { seed } => Pcg32::seed_from_u64(seed).random_range(lo..=hi),
        }
    }
}

/// The cue strike: direction in radians (0 = +x, π/2 = +y, i.e. down the
/// table in image coordinates) and speed
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CueStrike {
    pub angle: f32,
    #[serde(default)]
    pub speed: CueSpeed,
}

impl CueStrike {
    pub fn new(angle: f32, speed: f32) -> Self {
        Self {
            angle,
            speed: CueSpeed::Fixed(speed),
        }
    }

    pub fn from_degrees(degrees: f32, speed: CueSpeed) -> Self {
        Self {
            angle: degrees.to_radians(),
            speed,
        }
    }
}

/// Everything the detection stage hands to the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotInput {
    /// Balls in detection order, cue ball included
    pub balls: Vec<BallSpec>,
    /// Rails as (top, bottom, left, right)
    pub walls: Vec<Segment>,
    pub ball_radius: f32,
    pub cue: CueStrike,
    /// Explicit pockets; derived from the walls when absent
    #[serde(default)]
    pub pockets: Option<Vec<Pocket>>,
    #[serde(default)]
    pub config: SimConfig,
}

/// Step pacing; physics results are identical in both modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pacing {
    /// Steps run back to back
    #[default]
    Unpaced,
    /// Each step takes at least `dt` of wall-clock time
    RealTime,
}

/// Cooperative cancellation, checked between steps
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimPhase {
    Running,
    /// Every ball still on the table is at rest
    Converged,
    /// Gave up after the configured number of steps
    StepCapReached,
}

/// How a finished run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Converged,
    /// Balls were still moving; the path is partial
    StepCapReached { steps: u32 },
}

/// Result of a shot, ready for a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShotPath {
    /// Path segments in chronological order
    pub segments: Vec<PathSegment>,
    /// Every resolved contact in chronological order
    pub events: Vec<CollisionEvent>,
    pub cue_ball: BallId,
    pub cue_start: Vec2,
    pub cue_angle: f32,
    pub cue_speed: f32,
    /// Table extent, for sizing the canvas
    pub table: Bounds,
    pub steps: u32,
    pub outcome: Outcome,
}

impl ShotPath {
    pub fn is_converged(&self) -> bool {
        self.outcome == Outcome::Converged
    }

    pub fn segments_for(&self, ball: BallId) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter().filter(move |s| s.ball == ball)
    }

    /// Vertices of one ball's trajectory, start point first
    pub fn polyline(&self, ball: BallId) -> Vec<Vec2> {
        let mut points = Vec::new();
        for seg in self.segments_for(ball) {
            if points.is_empty() {
                points.push(seg.start);
            }
            points.push(seg.end);
        }
        points
    }
}

/// All state for one shot
#[derive(Debug, Clone)]
pub struct SimulationWorld {
    store: BodyStore,
    table: Table,
    recorder: EventRecorder,
    config: SimConfig,
    params: ContactParams,
    phase: SimPhase,
    step: u32,
    cue: BallId,
    cue_start: Vec2,
    cue_angle: f32,
    cue_speed: f32,
}

impl SimulationWorld {
    /// Validate the inputs and place every ball; the cue ball is added last
    /// and is the only one moving
    pub fn new(input: &ShotInput) -> Result<Self> {
        let config = input.config.clone();
        config.validate()?;

        let radius = input.ball_radius;
        if !(radius.is_finite() && radius > 0.0) {
            return Err(SimError::Configuration(format!(
                "ball radius must be positive, got {radius}"
            )));
        }
        if let Some(bad) = input.balls.iter().position(|b| !b.pos.is_finite()) {
            return Err(SimError::Configuration(format!(
                "ball {bad} has a non-finite position"
            )));
        }

        let table = match &input.pockets {
            Some(pockets) => Table::new(&input.walls, pockets.clone())?,
            None => Table::from_walls(&input.walls, config.pocket_radius_factor * radius)?,
        };

        let cue_index = find_cue_ball(&input.balls, config.cue_white_tolerance)?;

        let cue_speed = input.cue.speed.resolve(config.cue_speed_range);
        if !(input.cue.angle.is_finite() && cue_speed.is_finite() && cue_speed >= 0.0) {
            return Err(SimError::Configuration(format!(
                "invalid cue strike: angle {}, speed {cue_speed}",
                input.cue.angle
            )));
        }
        let cue_angle = normalize_angle(input.cue.angle);

        let mut store = BodyStore::new();
        for (i, spec) in input.balls.iter().enumerate() {
            if i != cue_index {
                store.add_ball(spec.pos, radius, config.ball_mass, spec.color);
            }
        }
        let cue_spec = input.balls[cue_index];
        let cue = store.add_ball(cue_spec.pos, radius, config.ball_mass, cue_spec.color);
        if let Some(ball) = store.get_mut(cue) {
            ball.vel = polar_to_cartesian(cue_speed, cue_angle);
        }

        let recorder = EventRecorder::new(&store);
        let params = ContactParams::from(&config);

        Ok(Self {
            store,
            table,
            recorder,
            config,
            params,
            phase: SimPhase::Running,
            step: 0,
            cue,
            cue_start: cue_spec.pos,
            cue_angle,
            cue_speed,
        })
    }

    /// Advance one fixed timestep: contacts, cloth friction, integration,
    /// then the termination check
    pub fn step(&mut self) -> SimPhase {
        if self.phase != SimPhase::Running {
            return self.phase;
        }

        let events = resolve_step(&mut self.store, &self.table, &self.params, self.step);
        for event in &events {
            self.recorder.record(event, &self.store);
        }

        apply_table_friction(&mut self.store, self.config.table_deceleration(), self.config.dt);

        let dt = self.config.dt;
        self.store.for_each_active_mut(|ball| {
            ball.pos += ball.vel * dt;
        });
        self.step += 1;

        if self.store.all_at_rest(self.config.rest_speed) {
            self.store.for_each_active_mut(|ball| ball.vel = Vec2::ZERO);
            self.recorder.flush(&self.store);
            self.phase = SimPhase::Converged;
        } else if self.step >= self.config.max_steps {
            log::warn!(
                "shot did not settle within {} steps; returning partial path",
                self.step
            );
            self.recorder.flush(&self.store);
            self.phase = SimPhase::StepCapReached;
        }

        self.phase
    }

    /// Step until the run ends, honoring pacing and cancellation
    pub fn run(mut self, pacing: Pacing, cancel: Option<&CancelToken>) -> Result<ShotPath> {
        log::info!(
            "simulating shot: {} balls, cue angle {:.3} rad, speed {:.1}",
            self.store.active_count(),
            self.cue_angle,
            self.cue_speed
        );
        let step_time = match pacing {
            Pacing::RealTime => Some(Duration::try_from_secs_f32(self.config.dt).map_err(
                |e| SimError::Configuration(format!("cannot pace timestep {}: {e}", self.config.dt)),
            )?),
            Pacing::Unpaced => None,
        };

        while self.phase == SimPhase::Running {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                log::info!("shot cancelled at step {}", self.step);
                return Err(SimError::Cancelled { step: self.step });
            }

            let tick_start = Instant::now();
            self.step();

            if let Some(step_time) = step_time {
                let elapsed = tick_start.elapsed();
                if elapsed < step_time {
                    std::thread::sleep(step_time - elapsed);
                }
            }
        }

        let path = self.finish();
        log::info!(
            "shot finished after {} steps: {} segments, {} contacts, {:?}",
            path.steps,
            path.segments.len(),
            path.events.len(),
            path.outcome
        );
        Ok(path)
    }

    /// Package the recorded path. A world still running is reported as
    /// having hit the step cap at its current step.
    pub fn finish(mut self) -> ShotPath {
        let outcome = match self.phase {
            SimPhase::Converged => Outcome::Converged,
            SimPhase::Running => {
                self.recorder.flush(&self.store);
                Outcome::StepCapReached { steps: self.step }
            }
            SimPhase::StepCapReached => Outcome::StepCapReached { steps: self.step },
        };
        let table = self.table.bounds();
        let (segments, events) = self.recorder.into_parts();
        ShotPath {
            segments,
            events,
            cue_ball: self.cue,
            cue_start: self.cue_start,
            cue_angle: self.cue_angle,
            cue_speed: self.cue_speed,
            table,
            steps: self.step,
            outcome,
        }
    }

    pub fn store(&self) -> &BodyStore {
        &self.store
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn recorder(&self) -> &EventRecorder {
        &self.recorder
    }

    pub fn phase(&self) -> SimPhase {
        self.phase
    }

    pub fn steps(&self) -> u32 {
        self.step
    }

    pub fn cue(&self) -> BallId {
        self.cue
    }
}

/// Run one shot from inputs to finished path
pub fn simulate_shot(
    input: &ShotInput,
    pacing: Pacing,
    cancel: Option<&CancelToken>,
) -> Result<ShotPath> {
    SimulationWorld::new(input)?.run(pacing, cancel)
}

/// Index of the ball closest to pure white, if it is within `tolerance`.
///
/// This is a color heuristic and can pick the wrong ball under odd lighting.
pub fn find_cue_ball(balls: &[BallSpec], tolerance: f32) -> Result<usize> {
    let (index, distance) = balls
        .iter()
        .enumerate()
        .map(|(i, b)| (i, b.color.distance_to_white()))
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| SimError::Configuration("no balls on the table".into()))?;

    if distance > tolerance {
        return Err(SimError::Configuration(format!(
            "no cue ball: closest color to white is {:?} at distance {distance:.1} (tolerance {tolerance})",
            balls[index].color
        )));
    }

    let candidates = balls
        .iter()
        .filter(|b| b.color.distance_to_white() <= tolerance)
        .count();
    if candidates > 1 {
        log::debug!("{candidates} balls look white; picking ball {index} as the cue ball");
    }

    Ok(index)
}
