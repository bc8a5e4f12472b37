//! Core configuration.

use serde::{Deserialize, Serialize};

/// Tolerances and sizing knobs. Keep this minimal; expand as needed without
/// breaking API.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Tolerance used when matching keys by position.
    pub position_epsilon: f32,
    /// Maximum events retained per animation before the oldest are dropped.
    pub max_events: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            position_epsilon: crate::curve::POSITION_EPSILON,
            max_events: 1024,
        }
    }
}
