//! Simulation parameters
//!
//! Every physics constant can be overridden per run. Missing JSON fields fall
//! back to the defaults in [`crate::consts`].

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Result, SimError};

/// Longest accepted timestep in seconds
const MAX_DT: f32 = 1.0;

/// Tunable parameters for one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    // === Stepping ===
    /// Fixed timestep in seconds
    pub dt: f32,
    /// Hard cap on steps before the run is reported as not converged
    pub max_steps: u32,
    /// Speed at or below which a ball counts as settled
    pub rest_speed: f32,

    // === Contacts ===
    /// Coefficient of restitution (ball-ball and ball-rail)
    pub restitution: f32,
    /// Tangential friction coefficient between balls
    pub ball_friction: f32,
    /// Along-rail damping on a cushion hit
    pub wall_friction: f32,

    // === Cloth ===
    /// Rolling resistance coefficient
    pub table_friction: f32,
    /// Gravitational acceleration
    pub gravity: f32,

    // === Inputs ===
    /// Default ball mass
    pub ball_mass: f32,
    /// Max RGB distance from white for cue ball identification
    pub cue_white_tolerance: f32,
    /// Pocket capture radius as a multiple of the ball radius
    pub pocket_radius_factor: f32,
    /// Range for a randomly drawn cue speed (inclusive)
    pub cue_speed_range: (f32, f32),
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: SIM_DT,
            max_steps: DEFAULT_MAX_STEPS,
            rest_speed: REST_SPEED,

            restitution: RESTITUTION,
            ball_friction: BALL_FRICTION,
            wall_friction: WALL_FRICTION,

            table_friction: TABLE_FRICTION,
            gravity: GRAVITY,

            ball_mass: BALL_MASS,
            cue_white_tolerance: CUE_WHITE_TOLERANCE,
            pocket_radius_factor: POCKET_RADIUS_FACTOR,
            cue_speed_range: (CUE_SPEED_MIN, CUE_SPEED_MAX),
        }
    }
}

impl SimConfig {
    /// Parse a config from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Deceleration from rolling resistance (μ_table · g)
    #[inline]
    pub fn table_deceleration(&self) -> f32 {
        self.table_friction * self.gravity
    }

    /// Reject values that would make stepping meaningless
    pub fn validate(&self) -> Result<()> {
        if !(self.dt.is_finite() && self.dt > 0.0 && self.dt <= MAX_DT) {
            return Err(SimError::Configuration(format!(
                "timestep must be in (0, {MAX_DT}] seconds, got {}",
                self.dt
            )));
        }
        if self.max_steps == 0 {
            return Err(SimError::Configuration("max_steps must be at least 1".into()));
        }
        if !(self.ball_mass.is_finite() && self.ball_mass > 0.0) {
            return Err(SimError::Configuration(format!(
                "ball mass must be positive, got {}",
                self.ball_mass
            )));
        }

        let non_negative = [
            ("rest_speed", self.rest_speed),
            ("restitution", self.restitution),
            ("ball_friction", self.ball_friction),
            ("wall_friction", self.wall_friction),
            ("table_friction", self.table_friction),
            ("gravity", self.gravity),
            ("cue_white_tolerance", self.cue_white_tolerance),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(SimError::Configuration(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }

        if self.wall_friction > 1.0 {
            return Err(SimError::Configuration(format!(
                "wall_friction must not exceed 1, got {}",
                self.wall_friction
            )));
        }

        let (lo, hi) = self.cue_speed_range;
        if !(lo.is_finite() && hi.is_finite() && lo >= 0.0 && lo <= hi) {
            return Err(SimError::Configuration(format!(
                "invalid cue speed range [{lo}, {hi}]"
            )));
        }

        if !(self.pocket_radius_factor.is_finite() && self.pocket_radius_factor > 0.0) {
            return Err(SimError::Geometry(format!(
                "pocket radius factor must be positive, got {}",
                self.pocket_radius_factor
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert!((config.table_deceleration() - 6.86).abs() < 1e-4);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SimConfig::from_json(r#"{ "table_friction": 0.5 }"#).unwrap();
        assert_eq!(config.table_friction, 0.5);
        assert_eq!(config.restitution, RESTITUTION);
        assert_eq!(config.max_steps, DEFAULT_MAX_STEPS);
    }

    #[test]
    fn test_rejects_bad_values() {
        let config = SimConfig {
            dt: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SimError::Configuration(_))));

        let config = SimConfig {
            dt: 1e20,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SimError::Configuration(_))));

        let config = SimConfig {
            dt: MAX_DT,
            ..Default::default()
        };
        assert!(config.validate().is_ok());

        let config = SimConfig {
            cue_speed_range: (220.0, 150.0),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SimError::Configuration(_))));

        let config = SimConfig {
            pocket_radius_factor: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(SimError::Geometry(_))));
    }
}
