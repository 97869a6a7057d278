//! Sample-size planning for two-proportion experiments.

use crate::error::ValidationError;
use abtest_core::distribution::normal_inverse_ppf;
use serde::{Deserialize, Serialize};

/// Relative lift the planner targets by default (10%).
pub const DEFAULT_MINIMUM_DETECTABLE_EFFECT: f64 = 0.10;
/// Default statistical power.
pub const DEFAULT_POWER: f64 = 0.80;
/// Default significance level.
pub const DEFAULT_ALPHA: f64 = 0.05;
/// Ceiling applied to the target rate `baseline * (1 + mde)`.
pub const MAX_TARGET_RATE: f64 = 0.9999;

/// Minimum visitors per arm to detect a relative lift of
/// `minimum_detectable_effect` over `baseline_rate`.
///
/// # Formula
/// ```text
/// p2 = min(p1 * (1 + mde), 0.9999)
/// n  = ceil((z_{1-alpha/2} + z_{power})^2 * (p1(1-p1) + p2(1-p2)) / (p1 - p2)^2)
/// ```
///
/// Returns 0 when the baseline is outside (0, 1), when `p1 == p2`, or when
/// the quantiles are infinite (alpha or power at 0 or 1).
///
/// # Examples
/// ```
/// use abtest_experiments::sample_size::required_sample_size;
///
/// let n = required_sample_size(0.05, 0.10, 0.05, 0.80);
/// assert!((31_000..31_500).contains(&n));
/// ```
#[must_use]
pub fn required_sample_size(
    baseline_rate: f64,
    minimum_detectable_effect: f64,
    alpha: f64,
    power: f64,
) -> u64 {
    if !(baseline_rate > 0.0 && baseline_rate < 1.0) {
        return 0;
    }

    let p1 = baseline_rate;
    let p2 = target_rate(p1, minimum_detectable_effect);
    let difference = p1 - p2;
    if difference == 0.0 || !difference.is_finite() {
        return 0;
    }

    let z_alpha = normal_inverse_ppf(1.0 - alpha / 2.0);
    let z_beta = normal_inverse_ppf(power);

    let n = (z_alpha + z_beta).powi(2) * (p1 * (1.0 - p1) + p2 * (1.0 - p2))
        / (difference * difference);

    if !n.is_finite() || n <= 0.0 {
        return 0;
    }
    n.ceil() as u64
}

/// Target conversion rate for a relative lift, capped at [`MAX_TARGET_RATE`].
#[must_use]
pub fn target_rate(baseline_rate: f64, minimum_detectable_effect: f64) -> f64 {
    (baseline_rate * (1.0 + minimum_detectable_effect)).min(MAX_TARGET_RATE)
}

/// Standalone sample-size planning request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleSizeRequest {
    /// Current conversion rate (0-1)
    pub baseline_rate: f64,
    /// Minimum relative uplift to detect (0.10 = 10%)
    #[serde(default = "default_mde", alias = "minimum_detectable")]
    pub minimum_detectable_effect: f64,
    /// Significance level (0.05 = 95% confidence)
    #[serde(default = "default_alpha", alias = "significance")]
    pub alpha: f64,
    /// Statistical power (0.80 = 80%)
    #[serde(default = "default_power")]
    pub power: f64,
}

fn default_mde() -> f64 {
    DEFAULT_MINIMUM_DETECTABLE_EFFECT
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

fn default_power() -> f64 {
    DEFAULT_POWER
}

impl SampleSizeRequest {
    #[must_use]
    pub fn new(baseline_rate: f64) -> Self {
        Self {
            baseline_rate,
            minimum_detectable_effect: DEFAULT_MINIMUM_DETECTABLE_EFFECT,
            alpha: DEFAULT_ALPHA,
            power: DEFAULT_POWER,
        }
    }

    /// Validates the request and computes the plan.
    ///
    /// # Errors
    /// Returns a `ValidationError` if any input is outside its valid range.
    pub fn plan(&self) -> Result<SampleSizePlan, ValidationError> {
        if !(self.baseline_rate > 0.0 && self.baseline_rate < 1.0) {
            return Err(ValidationError::BaselineRateOutOfRange(self.baseline_rate));
        }
        if !(self.minimum_detectable_effect > 0.0 && self.minimum_detectable_effect.is_finite()) {
            return Err(ValidationError::InvalidMinimumDetectableEffect(
                self.minimum_detectable_effect,
            ));
        }
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(ValidationError::AlphaOutOfRange(self.alpha));
        }
        if !(self.power > 0.0 && self.power < 1.0) {
            return Err(ValidationError::PowerOutOfRange(self.power));
        }

        let per_variant = required_sample_size(
            self.baseline_rate,
            self.minimum_detectable_effect,
            self.alpha,
            self.power,
        );

        Ok(SampleSizePlan {
            sample_size_per_variant: per_variant,
            total_sample_size: per_variant.saturating_mul(2),
            baseline_rate: self.baseline_rate,
            target_rate: target_rate(self.baseline_rate, self.minimum_detectable_effect),
            minimum_detectable_effect: self.minimum_detectable_effect,
            power: self.power,
            alpha: self.alpha,
        })
    }
}

/// Result of a standalone sample-size calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSizePlan {
    pub sample_size_per_variant: u64,
    pub total_sample_size: u64,
    pub baseline_rate: f64,
    pub target_rate: f64,
    pub minimum_detectable_effect: f64,
    pub power: f64,
    pub alpha: f64,
}

impl SampleSizePlan {
    /// Converts the plan to a human-readable text format.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str("=== Sample Size Plan ===\n\n");
        output.push_str(&format!(
            "Baseline Rate: {:.2}%\n",
            self.baseline_rate * 100.0
        ));
        output.push_str(&format!("Target Rate: {:.2}%\n", self.target_rate * 100.0));
        output.push_str(&format!(
            "Minimum Detectable Effect: {:.1}% (relative)\n",
            self.minimum_detectable_effect * 100.0
        ));
        output.push_str(&format!(
            "Significance: {:.3} | Power: {:.0}%\n\n",
            self.alpha,
            self.power * 100.0
        ));
        output.push_str(&format!(
            "Visitors per variant: {}\n",
            self.sample_size_per_variant
        ));
        output.push_str(&format!("Total visitors: {}\n", self.total_sample_size));
        output.push_str("Reach this many visitors per variant before reading results.\n");

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================
    // required_sample_size Tests
    // ============================================

    #[test]
    fn reference_case_matches_closed_form() {
        // (1.95996 + 0.84162)^2 * (0.0475 + 0.051975) / 0.005^2 = 31230.7
        let n = required_sample_size(0.05, 0.10, 0.05, 0.80);
        assert_eq!(n, 31_231);
    }

    #[test]
    fn reference_case_within_one_percent_of_31200() {
        let n = required_sample_size(0.05, 0.10, 0.05, 0.80) as f64;
        assert!((n - 31_200.0).abs() / 31_200.0 < 0.01, "n was {n}");
    }

    #[test]
    fn baseline_outside_unit_interval_returns_zero() {
        assert_eq!(required_sample_size(0.0, 0.10, 0.05, 0.80), 0);
        assert_eq!(required_sample_size(1.0, 0.10, 0.05, 0.80), 0);
        assert_eq!(required_sample_size(-0.2, 0.10, 0.05, 0.80), 0);
        assert_eq!(required_sample_size(f64::NAN, 0.10, 0.05, 0.80), 0);
    }

    #[test]
    fn zero_effect_returns_zero() {
        assert_eq!(required_sample_size(0.2, 0.0, 0.05, 0.80), 0);
    }

    #[test]
    fn capped_target_equal_to_baseline_returns_zero() {
        // p2 = min(0.9999 * 1.1, 0.9999) = p1
        assert_eq!(required_sample_size(0.9999, 0.10, 0.05, 0.80), 0);
    }

    #[test]
    fn infinite_quantiles_return_zero() {
        assert_eq!(required_sample_size(0.05, 0.10, 0.0, 0.80), 0);
        assert_eq!(required_sample_size(0.05, 0.10, 0.05, 1.0), 0);
    }

    #[test]
    fn stricter_requirements_need_more_visitors() {
        let base = required_sample_size(0.10, 0.10, 0.05, 0.80);
        assert!(required_sample_size(0.10, 0.10, 0.01, 0.80) > base);
        assert!(required_sample_size(0.10, 0.10, 0.05, 0.90) > base);
        assert!(required_sample_size(0.10, 0.05, 0.05, 0.80) > base);
    }

    #[test]
    fn target_rate_is_capped() {
        assert!((target_rate(0.95, 0.10) - MAX_TARGET_RATE).abs() < f64::EPSILON);
        assert!((target_rate(0.05, 0.10) - 0.055).abs() < 1e-12);
    }

    // ============================================
    // SampleSizeRequest Tests
    // ============================================

    #[test]
    fn request_plan_reports_totals() {
        let plan = SampleSizeRequest::new(0.05).plan().unwrap();

        assert_eq!(plan.sample_size_per_variant, 31_231);
        assert_eq!(plan.total_sample_size, 62_462);
        assert!((plan.target_rate - 0.055).abs() < 1e-12);
    }

    #[test]
    fn request_rejects_invalid_inputs() {
        let mut request = SampleSizeRequest::new(1.5);
        assert_eq!(
            request.plan().unwrap_err(),
            ValidationError::BaselineRateOutOfRange(1.5)
        );

        request = SampleSizeRequest::new(0.1);
        request.alpha = 0.0;
        assert_eq!(request.plan().unwrap_err(), ValidationError::AlphaOutOfRange(0.0));

        request = SampleSizeRequest::new(0.1);
        request.power = 1.0;
        assert_eq!(request.plan().unwrap_err(), ValidationError::PowerOutOfRange(1.0));

        request = SampleSizeRequest::new(0.1);
        request.minimum_detectable_effect = -0.1;
        assert_eq!(
            request.plan().unwrap_err(),
            ValidationError::InvalidMinimumDetectableEffect(-0.1)
        );
    }

    #[test]
    fn request_accepts_legacy_field_names() {
        let request: SampleSizeRequest = serde_json::from_str(
            r#"{"baseline_rate":0.05,"minimum_detectable":0.2,"significance":0.1}"#,
        )
        .unwrap();

        assert!((request.minimum_detectable_effect - 0.2).abs() < f64::EPSILON);
        assert!((request.alpha - 0.1).abs() < f64::EPSILON);
        assert!((request.power - DEFAULT_POWER).abs() < f64::EPSILON);
    }

    #[test]
    fn plan_text_lists_visitors() {
        let text = SampleSizeRequest::new(0.05).plan().unwrap().to_text();
        assert!(text.contains("Sample Size Plan"));
        assert!(text.contains("Visitors per variant: 31231"));
    }
}
