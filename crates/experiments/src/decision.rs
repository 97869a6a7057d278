//! Decision policy combining the frequentist and Bayesian analyses.

use crate::types::Recommendation;
use abtest_core::config::DecisionThresholds;
use serde::{Deserialize, Serialize};

/// Everything the decision policy looks at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionInputs {
    pub is_significant: bool,
    pub relative_uplift_pct: f64,
    /// Control plus variant visitors
    pub total_visitors: u64,
    /// Planned visitors per arm
    pub sample_size_needed: u64,
    pub prob_variant_beats_control: f64,
}

/// Determines the recommendation for an experiment.
///
/// Rules are evaluated in order:
/// 1. significant and |uplift| >= `min_practical_uplift_pct` -> `DeclareWinner`
/// 2. significant and |uplift| below it -> `StopTestNoWinner`
/// 3. `total_visitors >= sample_size_multiplier * sample_size_needed` and the
///    posterior is settled (P below `certainty_low` or above
///    `certainty_high`) -> `StopTestNoWinner`
/// 4. otherwise -> `ContinueTest`
#[must_use]
pub fn determine_recommendation(
    inputs: &DecisionInputs,
    thresholds: &DecisionThresholds,
) -> Recommendation {
    if inputs.is_significant {
        return if inputs.relative_uplift_pct.abs() >= thresholds.min_practical_uplift_pct {
            Recommendation::DeclareWinner
        } else {
            Recommendation::StopTestNoWinner
        };
    }

    let large_sample = inputs.total_visitors as f64
        >= thresholds.sample_size_multiplier * inputs.sample_size_needed as f64;
    let posterior_settled = inputs.prob_variant_beats_control < thresholds.certainty_low
        || inputs.prob_variant_beats_control > thresholds.certainty_high;

    if large_sample && posterior_settled {
        Recommendation::StopTestNoWinner
    } else {
        Recommendation::ContinueTest
    }
}
