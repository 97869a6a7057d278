//! End-to-end experiment analysis.
//!
//! Runs the frequentist test and the posterior comparison on one observation,
//! plans the sample size from the control rate, and feeds all three into the
//! decision policy.

use crate::bayesian::{BayesianEngine, BayesianResult};
use crate::decision::{determine_recommendation, DecisionInputs};
use crate::error::ValidationError;
use crate::frequentist::FrequentistResult;
use crate::sample_size::required_sample_size;
use crate::types::{AnalysisRequest, Arm, ExperimentObservation, Recommendation};
use abtest_core::config::{AnalysisConfig, DecisionThresholds};
use anyhow::Result;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Full analysis of one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub experiment_name: Option<String>,
    pub frequentist: FrequentistResult,
    pub bayesian: BayesianResult,
    pub recommendation: Recommendation,
    /// Winning arm, set only for `DeclareWinner`
    pub winner: Option<Arm>,
    pub recommendation_reason: String,
    /// Visitors per arm needed to detect the configured lift over the control rate
    pub sample_size_needed: u64,
}

impl ExperimentReport {
    /// Converts the report to a human-readable text format.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "=== Experiment Analysis: {} ===\n\n",
            self.experiment_name.as_deref().unwrap_or("unnamed")
        ));

        let f = &self.frequentist;
        output.push_str("--- Conversion Rates ---\n");
        output.push_str(&format!("Control: {:.2}%\n", f.control_rate * 100.0));
        output.push_str(&format!("Variant: {:.2}%\n", f.variant_rate * 100.0));
        output.push_str(&format!(
            "Uplift: {:+.2}% relative, {:+.2} pp absolute\n\n",
            f.relative_uplift_pct, f.absolute_uplift_pct
        ));

        output.push_str("--- Frequentist (Two-Proportion Z-Test) ---\n");
        output.push_str(&format!("Z-score: {:.4}\n", f.z_score));
        output.push_str(&format!("P-value: {:.4}\n", f.p_value));
        output.push_str(&format!(
            "Significant (p<{:.4}): {}\n\n",
            1.0 - f.confidence_level,
            if f.is_significant { "Yes" } else { "No" }
        ));

        let b = &self.bayesian;
        output.push_str("--- Bayesian (Beta Posterior) ---\n");
        output.push_str(&format!(
            "P(variant > control): {:.2}%\n",
            b.prob_variant_beats_control * 100.0
        ));
        output.push_str(&format!("Expected Loss: {:.6}\n", b.expected_loss));
        output.push_str(&format!(
            "95% Credible Interval: [{:.2}%, {:.2}%]\n",
            b.credible_interval_95.0 * 100.0,
            b.credible_interval_95.1 * 100.0
        ));
        output.push_str(&format!("Samples per arm: {}\n\n", b.samples));

        output.push_str(&format!(
            "Sample size needed per arm: {}\n\n",
            self.sample_size_needed
        ));

        output.push_str("=== RECOMMENDATION ===\n");
        output.push_str(&format!(
            "{}: {}\n",
            self.recommendation, self.recommendation_reason
        ));
        if let Some(winner) = self.winner {
            output.push_str(&format!("Winner: {winner}\n"));
        }
        output.push_str(self.recommendation.description());
        output.push('\n');

        output
    }

    /// Converts the report to JSON format.
    ///
    /// # Errors
    /// Returns error if serialization fails
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Runs complete experiment analyses with a fixed set of engine settings.
#[derive(Debug, Clone)]
pub struct ExperimentAnalyzer {
    bayesian: BayesianEngine,
    minimum_detectable_effect: f64,
    power: f64,
    thresholds: DecisionThresholds,
    seed: Option<u64>,
}

impl ExperimentAnalyzer {
    /// Builds an analyzer from engine settings.
    ///
    /// # Errors
    /// Returns a `ValidationError` if the planning power is outside (0, 1) or
    /// the minimum detectable effect is not a positive finite number.
    pub fn new(config: &AnalysisConfig) -> Result<Self, ValidationError> {
        if !(config.power > 0.0 && config.power < 1.0) {
            return Err(ValidationError::PowerOutOfRange(config.power));
        }
        if !(config.minimum_detectable_effect > 0.0 && config.minimum_detectable_effect.is_finite())
        {
            return Err(ValidationError::InvalidMinimumDetectableEffect(
                config.minimum_detectable_effect,
            ));
        }

        Ok(Self {
            bayesian: BayesianEngine::new(config.bayesian_samples).with_sampler(config.sampler),
            minimum_detectable_effect: config.minimum_detectable_effect,
            power: config.power,
            thresholds: config.thresholds,
            seed: config.seed,
        })
    }

    #[must_use]
    pub const fn bayesian_engine(&self) -> &BayesianEngine {
        &self.bayesian
    }

    /// Analyzes a validated observation using the caller's generator.
    pub fn analyze<R: Rng + ?Sized>(
        &self,
        observation: &ExperimentObservation,
        rng: &mut R,
    ) -> ExperimentReport {
        let frequentist = FrequentistResult::from_observation(observation);
        let bayesian = self
            .bayesian
            .analyze(observation.control(), observation.variant(), rng);

        let sample_size_needed = required_sample_size(
            observation.control().rate(),
            self.minimum_detectable_effect,
            observation.alpha(),
            self.power,
        );

        let inputs = DecisionInputs {
            is_significant: frequentist.is_significant,
            relative_uplift_pct: frequentist.relative_uplift_pct,
            total_visitors: observation.total_visitors(),
            sample_size_needed,
            prob_variant_beats_control: bayesian.prob_variant_beats_control,
        };
        let recommendation = determine_recommendation(&inputs, &self.thresholds);

        let winner = match recommendation {
            Recommendation::DeclareWinner if frequentist.variant_rate > frequentist.control_rate => {
                Some(Arm::Variant)
            }
            Recommendation::DeclareWinner => Some(Arm::Control),
            _ => None,
        };
        let recommendation_reason =
            self.explain(recommendation, winner, &inputs, frequentist.p_value);

        tracing::info!(
            z_score = frequentist.z_score,
            p_value = frequentist.p_value,
            prob_b_beats_a = bayesian.prob_variant_beats_control,
            sample_size_needed,
            recommendation = %recommendation,
            "Experiment analyzed"
        );

        ExperimentReport {
            experiment_name: None,
            frequentist,
            bayesian,
            recommendation,
            winner,
            recommendation_reason,
            sample_size_needed,
        }
    }

    /// Reason string quoting the figures that drove the recommendation.
    fn explain(
        &self,
        recommendation: Recommendation,
        winner: Option<Arm>,
        inputs: &DecisionInputs,
        p_value: f64,
    ) -> String {
        let prob_pct = inputs.prob_variant_beats_control * 100.0;
        let uplift = inputs.relative_uplift_pct;

        match (recommendation, winner) {
            (Recommendation::DeclareWinner, Some(arm)) => format!(
                "{arm} wins: p = {p_value:.4}, {uplift:+.1}% relative uplift, \
                 P(variant > control) = {prob_pct:.1}%"
            ),
            (Recommendation::StopTestNoWinner, _) if inputs.is_significant => format!(
                "Significant (p = {p_value:.4}) but {uplift:+.1}% uplift is below the \
                 {:.1}% practical threshold",
                self.thresholds.min_practical_uplift_pct
            ),
            (Recommendation::StopTestNoWinner, _) => format!(
                "{} visitors with P(variant > control) = {prob_pct:.1}% and no significant \
                 difference (p = {p_value:.4})",
                inputs.total_visitors
            ),
            _ => format!(
                "Insufficient evidence: p = {p_value:.4}, P(variant > control) = {prob_pct:.1}%, \
                 {} of {:.0} visitors",
                inputs.total_visitors,
                self.thresholds.sample_size_multiplier * inputs.sample_size_needed as f64
            ),
        }
    }

    /// Validates a request and analyzes it.
    ///
    /// The sampler seed is taken from the request, then from configuration;
    /// with neither, a fresh generator is seeded from OS entropy.
    ///
    /// # Errors
    /// Returns a `ValidationError` if the request violates an input invariant.
    pub fn analyze_request(
        &self,
        request: &AnalysisRequest,
    ) -> Result<ExperimentReport, ValidationError> {
        let observation = request.observation()?;

        let mut rng = match request.seed.or(self.seed) {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut report = self.analyze(&observation, &mut rng);
        report.experiment_name = request.experiment_name.clone();
        Ok(report)
    }
}
