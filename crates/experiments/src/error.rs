//! Input validation errors.

use crate::types::Arm;
use thiserror::Error;

/// Malformed or logically inconsistent analysis input.
///
/// Raised before any computation and never silently corrected. Each variant
/// names the invariant that was violated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{arm} conversions ({conversions}) exceed {arm} visitors ({visitors})")]
    ConversionsExceedVisitors {
        arm: Arm,
        conversions: u64,
        visitors: u64,
    },

    #[error("{arm} visitors must be at least 1")]
    NoVisitors { arm: Arm },

    #[error("confidence_level must be within [0.5, 0.9999], got {0}")]
    ConfidenceLevelOutOfRange(f64),

    #[error("baseline_rate must be strictly between 0 and 1, got {0}")]
    BaselineRateOutOfRange(f64),

    #[error("minimum_detectable_effect must be positive, got {0}")]
    InvalidMinimumDetectableEffect(f64),

    #[error("alpha must be strictly between 0 and 1, got {0}")]
    AlphaOutOfRange(f64),

    #[error("power must be strictly between 0 and 1, got {0}")]
    PowerOutOfRange(f64),
}
