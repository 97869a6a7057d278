//! Frequentist two-proportion hypothesis test.
//!
//! Pooled two-proportion z-test with a two-tailed p-value. H0: the control
//! and variant conversion rates are equal.

use crate::types::{ArmCounts, ExperimentObservation};
use abtest_core::distribution::normal_cdf;
use serde::{Deserialize, Serialize};

/// Result of the frequentist test for one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequentistResult {
    /// Test statistic, positive when the variant converts better
    pub z_score: f64,
    /// Two-tailed p-value
    pub p_value: f64,
    /// `p_value < 1 - confidence_level`
    pub is_significant: bool,
    /// Confidence level the test was evaluated at
    pub confidence_level: f64,
    /// (variant - control) / control, in percent. 0 when the control rate is 0
    pub relative_uplift_pct: f64,
    /// (variant - control), in percentage points
    pub absolute_uplift_pct: f64,
    pub control_rate: f64,
    pub variant_rate: f64,
}

impl FrequentistResult {
    /// Runs the two-proportion z-test on a validated observation.
    #[must_use]
    pub fn from_observation(observation: &ExperimentObservation) -> Self {
        let control = observation.control();
        let variant = observation.variant();
        let (z_score, p_value) = z_test_proportions(control, variant);

        let control_rate = control.rate();
        let variant_rate = variant.rate();
        let difference = variant_rate - control_rate;

        let relative_uplift_pct = if control_rate > 0.0 {
            difference / control_rate * 100.0
        } else {
            0.0
        };

        Self {
            z_score,
            p_value,
            is_significant: p_value < observation.alpha(),
            confidence_level: observation.confidence_level(),
            relative_uplift_pct,
            absolute_uplift_pct: difference * 100.0,
            control_rate,
            variant_rate,
        }
    }
}

/// Pooled two-proportion z-test.
///
/// # Returns
/// Tuple of (z_score, two-tailed p_value). Degenerate inputs (an empty arm,
/// a pooled rate of exactly 0 or 1, or a zero standard error) return
/// `(0.0, 1.0)`: no evidence either way.
///
/// # Examples
/// ```
/// use abtest_experiments::frequentist::z_test_proportions;
/// use abtest_experiments::ArmCounts;
///
/// let (z, p) = z_test_proportions(ArmCounts::new(100, 1000), ArmCounts::new(130, 1000));
/// assert!((z - 2.10).abs() < 0.01);
/// assert!((p - 0.036).abs() < 0.001);
/// ```
#[must_use]
pub fn z_test_proportions(control: ArmCounts, variant: ArmCounts) -> (f64, f64) {
    if control.visitors == 0 || variant.visitors == 0 {
        return (0.0, 1.0);
    }

    // Summed in f64: each count may be anywhere up to u64::MAX
    let total_conversions = control.conversions as f64 + variant.conversions as f64;
    let total_visitors = control.visitors as f64 + variant.visitors as f64;

    // Pooled rate of exactly 0 or 1 has no variance
    if total_conversions <= 0.0 || total_conversions >= total_visitors {
        return (0.0, 1.0);
    }

    let pooled = total_conversions / total_visitors;
    let std_error = (pooled
        * (1.0 - pooled)
        * (1.0 / control.visitors as f64 + 1.0 / variant.visitors as f64))
        .sqrt();

    if std_error <= 0.0 || !std_error.is_finite() {
        return (0.0, 1.0);
    }

    let z_score = (variant.rate() - control.rate()) / std_error;
    let p_value = (2.0 * (1.0 - normal_cdf(z_score.abs()))).clamp(0.0, 1.0);

    (z_score, p_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observation(control: (u64, u64), variant: (u64, u64), confidence: f64) -> ExperimentObservation {
        ExperimentObservation::new(
            ArmCounts::new(control.0, control.1),
            ArmCounts::new(variant.0, variant.1),
            confidence,
        )
        .unwrap()
    }

    // ============================================
    // z_test_proportions Tests
    // ============================================

    #[test]
    fn z_test_worked_example() {
        let (z, p) = z_test_proportions(ArmCounts::new(100, 1000), ArmCounts::new(130, 1000));

        // pooled 11.5%, se = sqrt(0.115 * 0.885 * 0.002) = 0.014267
        assert!((z - 2.1027).abs() < 1e-3, "z was {z}");
        assert!((p - 0.0355).abs() < 1e-3, "p was {p}");
    }

    #[test]
    fn z_test_zero_conversions_is_degenerate() {
        let (z, p) = z_test_proportions(ArmCounts::new(0, 100), ArmCounts::new(0, 100));
        assert!((z - 0.0).abs() < f64::EPSILON);
        assert!((p - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn z_test_all_converted_is_degenerate() {
        let (z, p) = z_test_proportions(ArmCounts::new(50, 50), ArmCounts::new(80, 80));
        assert!((z - 0.0).abs() < f64::EPSILON);
        assert!((p - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn z_test_empty_arm_is_degenerate() {
        let (z, p) = z_test_proportions(ArmCounts::new(0, 0), ArmCounts::new(10, 100));
        assert!((z - 0.0).abs() < f64::EPSILON);
        assert!((p - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn z_test_identical_rates_has_zero_z() {
        let (z, p) = z_test_proportions(ArmCounts::new(50, 500), ArmCounts::new(100, 1000));
        assert!(z.abs() < 1e-12, "z was {z}");
        assert!((p - 1.0).abs() < 1e-9, "p was {p}");
    }

    #[test]
    fn z_test_p_value_stays_in_unit_interval() {
        let (z, p) = z_test_proportions(ArmCounts::new(1, 100_000), ArmCounts::new(90_000, 100_000));
        assert!(z > 8.0);
        assert!((0.0..=1.0).contains(&p), "p was {p}");
    }

    #[test]
    fn z_test_handles_counts_near_u64_max() {
        let (z, p) = z_test_proportions(ArmCounts::new(10, u64::MAX), ArmCounts::new(0, 1));
        assert!(z.is_finite(), "z was {z}");
        assert!((0.0..=1.0).contains(&p), "p was {p}");

        let (z, p) = z_test_proportions(ArmCounts::new(0, u64::MAX), ArmCounts::new(0, 1));
        assert!((z - 0.0).abs() < f64::EPSILON);
        assert!((p - 1.0).abs() < f64::EPSILON);
    }

    // ============================================
    // FrequentistResult Tests
    // ============================================

    #[test]
    fn result_reports_rates_and_uplift() {
        let result = FrequentistResult::from_observation(&observation((100, 1000), (130, 1000), 0.95));

        assert!((result.control_rate - 0.10).abs() < 1e-12);
        assert!((result.variant_rate - 0.13).abs() < 1e-12);
        assert!((result.relative_uplift_pct - 30.0).abs() < 1e-9);
        assert!((result.absolute_uplift_pct - 3.0).abs() < 1e-9);
        assert!(result.is_significant);
        assert!((result.confidence_level - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn result_not_significant_at_stricter_level() {
        // p ~= 0.036 clears 0.05 but not 0.01
        let result = FrequentistResult::from_observation(&observation((100, 1000), (130, 1000), 0.99));
        assert!(!result.is_significant);
    }

    #[test]
    fn result_zero_control_rate_has_zero_relative_uplift() {
        let result = FrequentistResult::from_observation(&observation((0, 1000), (20, 1000), 0.95));

        assert!((result.relative_uplift_pct - 0.0).abs() < f64::EPSILON);
        assert!((result.absolute_uplift_pct - 2.0).abs() < 1e-9);
    }

    #[test]
    fn result_swapping_arms_mirrors_statistics() {
        let obs = observation((120, 2000), (150, 2100), 0.95);
        let forward = FrequentistResult::from_observation(&obs);
        let reverse = FrequentistResult::from_observation(&obs.swapped());

        assert!((forward.z_score + reverse.z_score).abs() < 1e-12);
        assert!((forward.p_value - reverse.p_value).abs() < 1e-12);
        assert!(forward.relative_uplift_pct > 0.0);
        assert!(reverse.relative_uplift_pct < 0.0);
    }
}
