//! Core types for experiment analysis.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest accepted confidence level.
pub const MIN_CONFIDENCE_LEVEL: f64 = 0.5;
/// Highest accepted confidence level.
pub const MAX_CONFIDENCE_LEVEL: f64 = 0.9999;
/// Confidence level used when a request omits one.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Experiment arm identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arm {
    Control,
    Variant,
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Control => f.write_str("control"),
            Self::Variant => f.write_str("variant"),
        }
    }
}

/// Binomial counts for one arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmCounts {
    pub conversions: u64,
    pub visitors: u64,
}

impl ArmCounts {
    #[must_use]
    pub const fn new(conversions: u64, visitors: u64) -> Self {
        Self {
            conversions,
            visitors,
        }
    }

    /// Conversion rate, or 0.0 when the arm has no visitors.
    #[must_use]
    pub fn rate(&self) -> f64 {
        if self.visitors == 0 {
            0.0
        } else {
            self.conversions as f64 / self.visitors as f64
        }
    }

    fn validate(&self, arm: Arm) -> Result<(), ValidationError> {
        if self.visitors == 0 {
            return Err(ValidationError::NoVisitors { arm });
        }
        if self.conversions > self.visitors {
            return Err(ValidationError::ConversionsExceedVisitors {
                arm,
                conversions: self.conversions,
                visitors: self.visitors,
            });
        }
        Ok(())
    }
}

/// A validated pair of experiment arms plus the requested confidence level.
///
/// Can only be built through [`ExperimentObservation::new`], so every
/// instance satisfies `1 <= visitors`, `conversions <= visitors` per arm and
/// `confidence_level` within `[0.5, 0.9999]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExperimentObservation {
    control: ArmCounts,
    variant: ArmCounts,
    confidence_level: f64,
}

impl ExperimentObservation {
    /// Validates and builds an observation.
    ///
    /// # Errors
    /// Returns the first violated invariant, checking the control arm first.
    pub fn new(
        control: ArmCounts,
        variant: ArmCounts,
        confidence_level: f64,
    ) -> Result<Self, ValidationError> {
        control.validate(Arm::Control)?;
        variant.validate(Arm::Variant)?;

        if !(MIN_CONFIDENCE_LEVEL..=MAX_CONFIDENCE_LEVEL).contains(&confidence_level) {
            return Err(ValidationError::ConfidenceLevelOutOfRange(confidence_level));
        }

        Ok(Self {
            control,
            variant,
            confidence_level,
        })
    }

    #[must_use]
    pub const fn control(&self) -> ArmCounts {
        self.control
    }

    #[must_use]
    pub const fn variant(&self) -> ArmCounts {
        self.variant
    }

    #[must_use]
    pub const fn confidence_level(&self) -> f64 {
        self.confidence_level
    }

    /// Significance level `1 - confidence_level`.
    #[must_use]
    pub fn alpha(&self) -> f64 {
        1.0 - self.confidence_level
    }

    /// Visitors across both arms, saturating at `u64::MAX`.
    #[must_use]
    pub const fn total_visitors(&self) -> u64 {
        self.control.visitors.saturating_add(self.variant.visitors)
    }

    /// The same observation with control and variant swapped.
    #[must_use]
    pub const fn swapped(&self) -> Self {
        Self {
            control: self.variant,
            variant: self.control,
            confidence_level: self.confidence_level,
        }
    }
}

/// Wire form of an analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Optional label echoed back in the report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_name: Option<String>,
    pub control_conversions: u64,
    pub control_visitors: u64,
    pub variant_conversions: u64,
    pub variant_visitors: u64,
    #[serde(default = "default_confidence_level")]
    pub confidence_level: f64,
    /// Seed for the posterior sampler, for reproducible output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_confidence_level() -> f64 {
    DEFAULT_CONFIDENCE_LEVEL
}

impl AnalysisRequest {
    /// Validates the request into an [`ExperimentObservation`].
    ///
    /// # Errors
    /// Returns a `ValidationError` naming the violated invariant.
    pub fn observation(&self) -> Result<ExperimentObservation, ValidationError> {
        ExperimentObservation::new(
            ArmCounts::new(self.control_conversions, self.control_visitors),
            ArmCounts::new(self.variant_conversions, self.variant_visitors),
            self.confidence_level,
        )
    }
}

/// Recommended action for an experiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    /// Significant and practically meaningful difference
    DeclareWinner,
    /// Any difference is too small to matter
    StopTestNoWinner,
    /// Not enough evidence yet
    ContinueTest,
}

impl Recommendation {
    /// Wire name of the recommendation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::DeclareWinner => "declare_winner",
            Self::StopTestNoWinner => "stop_test_no_winner",
            Self::ContinueTest => "continue_test",
        }
    }

    /// Returns a human-readable description of the recommendation.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::DeclareWinner => {
                "Statistically significant and practically meaningful difference - ship the winning arm"
            }
            Self::StopTestNoWinner => {
                "Difference is negligible or the posterior is settled on a large sample - stop without a winner"
            }
            Self::ContinueTest => "Insufficient evidence - keep collecting traffic",
        }
    }

    /// Returns true if the test can be stopped.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::DeclareWinner | Self::StopTestNoWinner)
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
