//! Collision detection and response
//!
//! Each step runs three passes:
//! 1. Pockets: any ball whose center is inside a capture circle leaves the table.
//! 2. Detection: ball-ball pairs in ascending id order, then every ball
//!    against every rail, all measured on the pre-step snapshot.
//! 3. Response: each contact is resolved independently from the snapshot and
//!    the velocity/position corrections are summed.
//!
//! Summing independent responses keeps the result order-independent and
//! deterministic without an iterative solver; with at most sixteen balls
//! simultaneous contacts are rare.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{BallId, BodyStore};
use super::table::{Rail, Table};
use crate::config::SimConfig;

/// Below this relative tangential speed no friction impulse is applied
const TANGENT_EPSILON: f32 = 1e-6;
/// Below this center distance two balls are treated as coincident
const COINCIDENT_EPSILON: f32 = 1e-6;

/// What touched what
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Contact {
    /// Two balls, `a < b`
    BallBall { a: BallId, b: BallId },
    /// A ball against a rail
    BallWall { ball: BallId, rail: Rail },
    /// A ball captured by the pocket at this index
    BallPocket { ball: BallId, pocket: usize },
}

impl Contact {
    /// Balls taking part in this contact
    pub fn balls(&self) -> impl Iterator<Item = BallId> {
        let (first, second) = match *self {
            Contact::BallBall { a, b } => (a, Some(b)),
            Contact::BallWall { ball, .. } | Contact::BallPocket { ball, .. } => (ball, None),
        };
        std::iter::once(first).chain(second)
    }
}

/// A resolved interaction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    /// Step index in which the contact was resolved
    pub step: u32,
    pub contact: Contact,
    /// Contact point (rail or ball surface, or the ball center for a pocket)
    pub point: Vec2,
}

/// Coefficients used by contact response
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactParams {
    pub restitution: f32,
    pub ball_friction: f32,
    pub wall_friction: f32,
}

impl From<&SimConfig> for ContactParams {
    fn from(config: &SimConfig) -> Self {
        Self {
            restitution: config.restitution,
            ball_friction: config.ball_friction,
            wall_friction: config.wall_friction,
        }
    }
}

/// Pre-step copy of a ball's kinematic state
#[derive(Debug, Clone, Copy)]
struct BodySnapshot {
    id: BallId,
    pos: Vec2,
    vel: Vec2,
    radius: f32,
    mass: f32,
}

/// A detected overlap, before response
#[derive(Debug, Clone, Copy)]
enum Overlap {
    /// Snapshot indices `i < j`; normal points from `i` to `j`
    Balls {
        i: usize,
        j: usize,
        normal: Vec2,
        penetration: f32,
    },
    /// Normal is the rail's inward normal
    Wall {
        i: usize,
        rail: Rail,
        point: Vec2,
        normal: Vec2,
        penetration: f32,
    },
}

/// Velocity changes from a ball-ball impact, or `None` if the balls are separating.
///
/// `normal` is the unit vector from ball a to ball b. The normal impulse uses
/// restitution on the combined (reduced) mass; the tangential impulse is
/// Coulomb friction capped so it can at most stop the relative slip.
pub fn ball_ball_impulse(
    (va, ma): (Vec2, f32),
    (vb, mb): (Vec2, f32),
    normal: Vec2,
    params: &ContactParams,
) -> Option<(Vec2, Vec2)> {
    let rel = vb - va;
    let vn = rel.dot(normal);
    if vn >= 0.0 {
        return None;
    }

    let inv_a = 1.0 / ma;
    let inv_b = 1.0 / mb;
    let inv_sum = inv_a + inv_b;

    let jn = -(1.0 + params.restitution) * vn / inv_sum;
    let mut dva = -normal * (jn * inv_a);
    let mut dvb = normal * (jn * inv_b);

    let tangential = rel - normal * vn;
    let slip = tangential.length();
    if slip > TANGENT_EPSILON {
        let tangent = tangential / slip;
        let jt = (params.ball_friction * jn).min(slip / inv_sum);
        dva += tangent * (jt * inv_a);
        dvb -= tangent * (jt * inv_b);
    }

    Some((dva, dvb))
}

/// Velocity change from a rail hit, or `None` if the ball is moving away.
///
/// `normal` points from the rail toward the ball. The normal component is
/// reflected and scaled by restitution; the along-rail component is damped.
pub fn ball_wall_response(vel: Vec2, normal: Vec2, params: &ContactParams) -> Option<Vec2> {
    let vn = vel.dot(normal);
    if vn >= 0.0 {
        return None;
    }
    let normal_part = normal * vn;
    let tangential = vel - normal_part;
    let new_vel = -normal_part * params.restitution + tangential * (1.0 - params.wall_friction);
    Some(new_vel - vel)
}

/// Detect and resolve every interaction for one step.
///
/// Returns the contacts that changed a ball's motion or removed it, in
/// resolution order: pockets first, then ball-ball pairs, then rails.
pub fn resolve_step(
    store: &mut BodyStore,
    table: &Table,
    params: &ContactParams,
    step: u32,
) -> Vec<CollisionEvent> {
    let mut events = Vec::new();

    capture_pocketed(store, table, step, &mut events);

    let mut snapshot = Vec::with_capacity(store.active_count());
    store.for_each_active(|ball| {
        snapshot.push(BodySnapshot {
            id: ball.id,
            pos: ball.pos,
            vel: ball.vel,
            radius: ball.radius,
            mass: ball.mass,
        });
    });

    let overlaps = detect_overlaps(&snapshot, table);
    if overlaps.is_empty() {
        return events;
    }

    let mut dv = vec![Vec2::ZERO; snapshot.len()];
    let mut dp = vec![Vec2::ZERO; snapshot.len()];

    for overlap in overlaps {
        match overlap {
            Overlap::Balls {
                i,
                j,
                normal,
                penetration,
            } => {
                let (a, b) = (&snapshot[i], &snapshot[j]);
                let inv_a = 1.0 / a.mass;
                let inv_b = 1.0 / b.mass;
                let share = penetration / (inv_a + inv_b);
                dp[i] -= normal * (share * inv_a);
                dp[j] += normal * (share * inv_b);

                if let Some((dva, dvb)) =
                    ball_ball_impulse((a.vel, a.mass), (b.vel, b.mass), normal, params)
                {
                    dv[i] += dva;
                    dv[j] += dvb;
                    events.push(CollisionEvent {
                        step,
                        contact: Contact::BallBall { a: a.id, b: b.id },
                        point: a.pos + normal * a.radius,
                    });
                }
            }
            Overlap::Wall {
                i,
                rail,
                point,
                normal,
                penetration,
            } => {
                let body = &snapshot[i];
                dp[i] += normal * penetration;

                if let Some(delta) = ball_wall_response(body.vel, normal, params) {
                    dv[i] += delta;
                    events.push(CollisionEvent {
                        step,
                        contact: Contact::BallWall {
                            ball: body.id,
                            rail,
                        },
                        point,
                    });
                }
            }
        }
    }

    for (k, body) in snapshot.iter().enumerate() {
        if dv[k] == Vec2::ZERO && dp[k] == Vec2::ZERO {
            continue;
        }
        if let Some(ball) = store.get_mut(body.id) {
            ball.vel = body.vel + dv[k];
            ball.pos = body.pos + dp[k];
        }
    }

    for event in &events {
        log::debug!("step {}: {:?} at {:?}", event.step, event.contact, event.point);
    }

    events
}

/// Remove every ball whose center lies inside a pocket
fn capture_pocketed(
    store: &mut BodyStore,
    table: &Table,
    step: u32,
    events: &mut Vec<CollisionEvent>,
) {
    let mut captured = Vec::new();
    store.for_each_active(|ball| {
        if let Some(pocket) = table.pockets().iter().position(|p| p.captures(ball.pos)) {
            captured.push((ball.id, pocket, ball.pos));
        }
    });

    for (ball, pocket, point) in captured {
        if store.deactivate(ball) {
            log::debug!("step {step}: ball {} dropped into pocket {pocket}", ball.0);
            events.push(CollisionEvent {
                step,
                contact: Contact::BallPocket { ball, pocket },
                point,
            });
        }
    }
}

fn detect_overlaps(snapshot: &[BodySnapshot], table: &Table) -> Vec<Overlap> {
    let mut overlaps = Vec::new();

    for i in 0..snapshot.len() {
        for j in (i + 1)..snapshot.len() {
            let (a, b) = (&snapshot[i], &snapshot[j]);
            let offset = b.pos - a.pos;
            let reach = a.radius + b.radius;
            let dist_sq = offset.length_squared();
            if dist_sq >= reach * reach {
                continue;
            }
            let dist = dist_sq.sqrt();
            let normal = if dist < COINCIDENT_EPSILON {
                Vec2::X
            } else {
                offset / dist
            };
            overlaps.push(Overlap::Balls {
                i,
                j,
                normal,
                penetration: reach - dist,
            });
        }
    }

    // Rails are half-planes: a center that crossed the line in one step is
    // still pushed back toward the felt
    for (i, body) in snapshot.iter().enumerate() {
        for wall in table.walls() {
            let dist = wall.signed_distance(body.pos);
            if dist < body.radius {
                overlaps.push(Overlap::Wall {
                    i,
                    rail: wall.rail,
                    point: wall.segment.closest_point(body.pos),
                    normal: wall.inward_normal,
                    penetration: body.radius - dist,
                });
            }
        }
    }

    overlaps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::geometry::Rgb;
    use proptest::prelude::*;

    fn params() -> ContactParams {
        ContactParams::from(&SimConfig::default())
    }

    fn energy(m: f32, v: Vec2) -> f32 {
        0.5 * m * v.length_squared()
    }

    #[test]
    fn test_head_on_equal_mass_transfer() {
        let va = Vec2::new(100.0, 0.0);
        let (dva, dvb) =
            ball_ball_impulse((va, 1.0), (Vec2::ZERO, 1.0), Vec2::X, &params()).unwrap();
        let (va2, vb2) = (va + dva, dvb);

        // (1 - e) / 2 and (1 + e) / 2 of the incoming speed
        assert!((va2.x - 5.0).abs() < 1e-3);
        assert!((vb2.x - 95.0).abs() < 1e-3);
        assert!(va2.y.abs() < 1e-5 && vb2.y.abs() < 1e-5);
    }

    #[test]
    fn test_separating_balls_do_not_collide() {
        let result = ball_ball_impulse(
            (Vec2::new(-10.0, 0.0), 1.0),
            (Vec2::new(10.0, 0.0), 1.0),
            Vec2::X,
            &params(),
        );
        assert!(result.is_none());
    }

    #[test]
    fn test_glancing_hit_gets_friction() {
        let va = Vec2::new(100.0, 50.0);
        let (dva, dvb) =
            ball_ball_impulse((va, 1.0), (Vec2::ZERO, 1.0), Vec2::X, &params()).unwrap();
        // Normal impulse 95, friction capped at 0.06 * 95 along the slip
        assert!((dvb.x - 95.0).abs() < 1e-3);
        assert!((dvb.y - 0.06 * 95.0).abs() < 1e-3);
        assert!((dva.y + 0.06 * 95.0).abs() < 1e-3);
    }

    #[test]
    fn test_wall_reflection_and_damping() {
        let normal = Vec2::new(0.0, -1.0); // bottom rail, ball above it
        let vel = Vec2::new(50.0, 100.0);
        let delta = ball_wall_response(vel, normal, &params()).unwrap();
        let out = vel + delta;
        assert!((out.y - (-90.0)).abs() < 1e-3);
        assert!((out.x - 50.0 * 0.86).abs() < 1e-3);

        assert!(ball_wall_response(Vec2::new(0.0, -10.0), normal, &params()).is_none());
    }

    #[test]
    fn test_resolve_step_wall_contact() {
        let table = Table::rectangle(400.0, 800.0, 25.0).unwrap();
        let mut store = BodyStore::new();
        let id = store.add_ball(Vec2::new(200.0, 792.0), 10.0, 1.0, Rgb::WHITE);
        store.get_mut(id).unwrap().vel = Vec2::new(0.0, 120.0);

        let events = resolve_step(&mut store, &table, &params(), 7);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].contact,
            Contact::BallWall {
                ball: id,
                rail: Rail::Bottom
            }
        );
        assert_eq!(events[0].step, 7);

        let ball = store.get(id).unwrap();
        assert!((ball.pos.y - 790.0).abs() < 1e-3);
        assert!((ball.vel.y - (-108.0)).abs() < 1e-3);

        // Moving away now: no second event
        let events = resolve_step(&mut store, &table, &params(), 8);
        assert!(events.is_empty());
    }

    #[test]
    fn test_ball_past_rail_is_pulled_back() {
        // One step of integration carried the center 1 unit beyond the right rail
        let table = Table::rectangle(400.0, 800.0, 25.0).unwrap();
        let mut store = BodyStore::new();
        let id = store.add_ball(Vec2::new(401.0, 200.0), 3.0, 1.0, Rgb::WHITE);
        store.get_mut(id).unwrap().vel = Vec2::new(200.0, 0.0);

        let events = resolve_step(&mut store, &table, &params(), 3);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].contact,
            Contact::BallWall {
                ball: id,
                rail: Rail::Right
            }
        );
        assert_eq!(events[0].point, Vec2::new(400.0, 200.0));

        let ball = store.get(id).unwrap();
        assert!((ball.pos.x - 397.0).abs() < 1e-3);
        assert!((ball.vel.x + 180.0).abs() < 1e-3);
    }

    #[test]
    fn test_resolve_step_pockets_ball() {
        let table = Table::rectangle(400.0, 800.0, 25.0).unwrap();
        let mut store = BodyStore::new();
        let id = store.add_ball(Vec2::new(12.0, 12.0), 10.0, 1.0, Rgb(200, 0, 0));
        store.get_mut(id).unwrap().vel = Vec2::new(-30.0, -30.0);

        let events = resolve_step(&mut store, &table, &params(), 0);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].contact,
            Contact::BallPocket {
                ball: id,
                pocket: 0
            }
        );
        assert!(!store.get(id).unwrap().active);

        // A pocketed ball never produces another event
        let events = resolve_step(&mut store, &table, &params(), 1);
        assert!(events.is_empty());
    }

    #[test]
    fn test_resting_overlap_is_pushed_apart_silently() {
        let table = Table::rectangle(400.0, 800.0, 25.0).unwrap();
        let mut store = BodyStore::new();
        let a = store.add_ball(Vec2::new(200.0, 400.0), 10.0, 1.0, Rgb::WHITE);
        let b = store.add_ball(Vec2::new(215.0, 400.0), 10.0, 1.0, Rgb(0, 0, 0));

        let events = resolve_step(&mut store, &table, &params(), 0);
        assert!(events.is_empty());

        let pa = store.get(a).unwrap().pos;
        let pb = store.get(b).unwrap().pos;
        assert!(((pb - pa).length() - 20.0).abs() < 1e-3);
        assert!((pa.x - 197.5).abs() < 1e-3);
    }

    #[test]
    fn test_coincident_centers_do_not_produce_nan() {
        let table = Table::rectangle(400.0, 800.0, 25.0).unwrap();
        let mut store = BodyStore::new();
        let a = store.add_ball(Vec2::new(200.0, 400.0), 10.0, 1.0, Rgb::WHITE);
        let b = store.add_ball(Vec2::new(200.0, 400.0), 10.0, 1.0, Rgb(0, 0, 0));

        resolve_step(&mut store, &table, &params(), 0);
        let pa = store.get(a).unwrap().pos;
        let pb = store.get(b).unwrap().pos;
        assert!(pa.is_finite() && pb.is_finite());
        assert!((pb.x - pa.x - 20.0).abs() < 1e-3);
    }

    #[test]
    fn test_simultaneous_contacts_use_snapshot() {
        // Cue ball hits two touching balls at once; each sees the same incoming velocity
        let table = Table::rectangle(400.0, 800.0, 25.0).unwrap();
        let mut store = BodyStore::new();
        let left = store.add_ball(Vec2::new(190.0, 381.0), 10.0, 1.0, Rgb(255, 0, 0));
        let right = store.add_ball(Vec2::new(210.0, 381.0), 10.0, 1.0, Rgb(0, 0, 255));
        let cue = store.add_ball(Vec2::new(200.0, 398.0), 10.0, 1.0, Rgb::WHITE);
        store.get_mut(cue).unwrap().vel = Vec2::new(0.0, -100.0);

        let events = resolve_step(&mut store, &table, &params(), 0);
        let pairs: Vec<Contact> = events.iter().map(|e| e.contact).collect();
        assert_eq!(
            pairs,
            vec![
                Contact::BallBall { a: left, b: cue },
                Contact::BallBall { a: right, b: cue },
            ]
        );

        let vl = store.get(left).unwrap().vel;
        let vr = store.get(right).unwrap().vel;
        assert!((vl.x + vr.x).abs() < 1e-3);
        assert!((vl.y - vr.y).abs() < 1e-3);
    }

    proptest! {
        #[test]
        fn prop_ball_impact_never_gains_energy(
            vax in -300.0f32..300.0, vay in -300.0f32..300.0,
            vbx in -300.0f32..300.0, vby in -300.0f32..300.0,
            ma in 0.5f32..3.0, mb in 0.5f32..3.0,
            angle in 0.0f32..std::f32::consts::TAU,
        ) {
            let va = Vec2::new(vax, vay);
            let vb = Vec2::new(vbx, vby);
            let normal = Vec2::new(angle.cos(), angle.sin());
            let before = energy(ma, va) + energy(mb, vb);

            if let Some((dva, dvb)) = ball_ball_impulse((va, ma), (vb, mb), normal, &params()) {
                let after = energy(ma, va + dva) + energy(mb, vb + dvb);
                prop_assert!(after <= before * (1.0 + 1e-4) + 1e-2);

                // Momentum is conserved
                let p0 = va * ma + vb * mb;
                let p1 = (va + dva) * ma + (vb + dvb) * mb;
                prop_assert!((p1 - p0).length() <= 1e-2 * (1.0 + p0.length()));
            }
        }

        #[test]
        fn prop_wall_hit_never_gains_speed(
            vx in -300.0f32..300.0, vy in -300.0f32..300.0,
            angle in 0.0f32..std::f32::consts::TAU,
        ) {
            let vel = Vec2::new(vx, vy);
            let normal = Vec2::new(angle.cos(), angle.sin());
            if let Some(delta) = ball_wall_response(vel, normal, &params()) {
                let out = vel + delta;
                prop_assert!(out.length() <= vel.length() * (1.0 + 1e-5) + 1e-4);
                prop_assert!(out.dot(normal) >= -1e-3);
            }
        }
    }
}
