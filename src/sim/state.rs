//! Ball state and the body store
//!
//! The store is the only owner of mutable ball state. Balls are kept sorted
//! by id so every iteration order is stable.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rgb;

/// Stable ball identifier, allocated in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BallId(pub u32);

/// A ball on the table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: BallId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub mass: f32,
    pub color: Rgb,
    /// Cleared when the ball drops into a pocket; never set again
    pub active: bool,
}

impl Ball {
    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Kinetic energy (½·m·|v|²)
    #[inline]
    pub fn kinetic_energy(&self) -> f32 {
        0.5 * self.mass * self.vel.length_squared()
    }
}

/// Owns every ball for one simulation run
#[derive(Debug, Clone, Default)]
pub struct BodyStore {
    balls: Vec<Ball>,
    next_id: u32,
}

impl BodyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a ball at rest; returns its id
    pub fn add_ball(&mut self, pos: Vec2, radius: f32, mass: f32, color: Rgb) -> BallId {
        let id = BallId(self.next_id);
        self.next_id += 1;
        self.balls.push(Ball {
            id,
            pos,
            vel: Vec2::ZERO,
            radius,
            mass,
            color,
            active: true,
        });
        id
    }

    /// Look up a ball (active or pocketed)
    pub fn get(&self, id: BallId) -> Option<&Ball> {
        // Ids are dense and allocated in push order
        self.balls.get(id.0 as usize).filter(|b| b.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: BallId) -> Option<&mut Ball> {
        self.balls.get_mut(id.0 as usize).filter(|b| b.id == id)
    }

    /// Visit every active ball in ascending id order
    pub fn for_each_active<F>(&self, mut f: F)
    where
        F: FnMut(&Ball),
    {
        for ball in self.balls.iter().filter(|b| b.active) {
            f(ball);
        }
    }

    pub(crate) fn for_each_active_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut Ball),
    {
        for ball in self.balls.iter_mut().filter(|b| b.active) {
            f(ball);
        }
    }

    /// Active balls in ascending id order
    pub fn active(&self) -> impl Iterator<Item = &Ball> {
        self.balls.iter().filter(|b| b.active)
    }

    pub fn active_count(&self) -> usize {
        self.balls.iter().filter(|b| b.active).count()
    }

    /// All balls ever added, including pocketed ones
    pub fn all(&self) -> &[Ball] {
        &self.balls
    }

    /// Take a ball off the table. Returns false if it was already gone.
    pub fn deactivate(&mut self, id: BallId) -> bool {
        match self.get_mut(id) {
            Some(ball) if ball.active => {
                ball.active = false;
                ball.vel = Vec2::ZERO;
                true
            }
            _ => false,
        }
    }

    /// True when every active ball is at or below `rest_speed`
    pub fn all_at_rest(&self, rest_speed: f32) -> bool {
        self.active().all(|b| b.speed() <= rest_speed)
    }
}
