//! Validation errors for world and settings configuration

use thiserror::Error;

/// Rejected configuration value.
///
/// Raised when a domain, a live setting or an attraction matrix entry is
/// built or updated. A running tick never produces one.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("cutoff fraction must lie strictly between 0 and 1, got {0}")]
    CutoffOutOfRange(f32),

    #[error("interaction radius must be positive and finite, got {0}")]
    InvalidInteractionRadius(f32),

    #[error("domain dimensions must be positive, got {width}x{height}")]
    InvalidDomain { width: u32, height: u32 },

    #[error("friction half-life must be positive and finite, got {0}")]
    InvalidFrictionHalfLife(f32),

    #[error("step size must be non-negative and finite, got {0}")]
    InvalidStepSize(f32),

    #[error("force multiplier must be finite, got {0}")]
    InvalidForceMultiplier(f32),

    #[error("group {index} is outside the {max_groups}-group attraction matrix")]
    GroupOutOfRange { index: usize, max_groups: usize },
}
