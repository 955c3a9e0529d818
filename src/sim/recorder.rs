//! Path recording
//!
//! Turns the contact stream into straight path segments per ball. A segment
//! closes whenever a ball takes part in a contact and has moved since its last
//! recorded point. Pocketed balls are simply dropped: the drop into the pocket
//! is not drawn.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{CollisionEvent, Contact};
use super::geometry::Rgb;
use super::state::{BallId, BodyStore};

/// One straight stroke of a ball's trajectory
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathSegment {
    pub ball: BallId,
    pub start: Vec2,
    pub end: Vec2,
    pub color: Rgb,
}

/// Accumulates path segments in chronological order
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    /// Last recorded point per tracked ball
    last_positions: BTreeMap<BallId, Vec2>,
    segments: Vec<PathSegment>,
    events: Vec<CollisionEvent>,
}

impl EventRecorder {
    /// Start tracking every active ball from its current position
    pub fn new(store: &BodyStore) -> Self {
        let mut last_positions = BTreeMap::new();
        store.for_each_active(|ball| {
            last_positions.insert(ball.id, ball.pos);
        });
        Self {
            last_positions,
            segments: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Record a resolved contact
    pub fn record(&mut self, event: &CollisionEvent, store: &BodyStore) {
        self.events.push(*event);
        match event.contact {
            Contact::BallPocket { ball, .. } => self.forget(ball),
            Contact::BallBall { .. } | Contact::BallWall { .. } => {
                for id in event.contact.balls() {
                    self.close_segment(id, store);
                }
            }
        }
    }

    /// Stop tracking a ball without drawing its last leg
    pub fn forget(&mut self, id: BallId) {
        self.last_positions.remove(&id);
    }

    /// Close the open segment of every tracked ball (used when the run ends)
    pub fn flush(&mut self, store: &BodyStore) {
        let ids: Vec<BallId> = self.last_positions.keys().copied().collect();
        for id in ids {
            self.close_segment(id, store);
        }
    }

    fn close_segment(&mut self, id: BallId, store: &BodyStore) {
        let Some(ball) = store.get(id).filter(|b| b.active) else {
            return;
        };
        let Some(last) = self.last_positions.get_mut(&id) else {
            return;
        };
        if *last != ball.pos {
            self.segments.push(PathSegment {
                ball: id,
                start: *last,
                end: ball.pos,
                color: ball.color,
            });
            *last = ball.pos;
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn events(&self) -> &[CollisionEvent] {
        &self.events
    }

    pub fn is_tracking(&self, id: BallId) -> bool {
        self.last_positions.contains_key(&id)
    }

    /// Hand over the recorded segments and events
    pub fn into_parts(self) -> (Vec<PathSegment>, Vec<CollisionEvent>) {
        (self.segments, self.events)
    }
}
