//! Error types
//!
//! Configuration and geometry problems are raised before the first step.
//! Running out of steps is not an error: see [`crate::sim::Outcome`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    /// Inputs that cannot describe a shot (no cue ball, wrong wall count, bad radius)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Table geometry that cannot be simulated (zero-length rail, bad pocket)
    #[error("geometry error: {0}")]
    Geometry(String),

    /// The caller cancelled the run between steps
    #[error("simulation cancelled at step {step}")]
    Cancelled { step: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
