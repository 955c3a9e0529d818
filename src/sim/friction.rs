//! Rolling resistance of the cloth
//!
//! Separate from contact friction: every active ball loses `μ_table · g` of
//! speed per second, direction unchanged, floored at zero.

use glam::Vec2;

use super::state::BodyStore;

/// Reduce `vel` by `deceleration * dt` along its own direction.
///
/// Zero or non-finite velocity is treated as already at rest.
pub fn decelerate(vel: Vec2, deceleration: f32, dt: f32) -> Vec2 {
    let speed = vel.length();
    if !speed.is_finite() || speed == 0.0 {
        return Vec2::ZERO;
    }
    let new_speed = (speed - deceleration * dt).max(0.0);
    if new_speed == 0.0 {
        return Vec2::ZERO;
    }
    vel * (new_speed / speed)
}

/// Apply rolling resistance to every active ball
pub fn apply_table_friction(store: &mut BodyStore, deceleration: f32, dt: f32) {
    store.for_each_active_mut(|ball| {
        ball.vel = decelerate(ball.vel, deceleration, dt);
    });
}
