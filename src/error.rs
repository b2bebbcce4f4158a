/*
 * Error Module
 *
 * Configuration is the only thing in the simulation that can fail. Everything
 * downstream of a validated SimulationParams is a total numeric computation,
 * so these errors are raised at construction time and nowhere else.
 */

use thiserror::Error;

// Errors produced while loading or validating simulation parameters
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {field} {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },

    // The neighbor query box must reach at least as far as the largest
    // steering radius or the grid would produce false negatives.
    #[error("neighbor range {range} does not cover steering radius {radius}")]
    RangeTooSmall { range: f32, radius: f32 },

    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        Self::Invalid { field, reason }
    }
}
