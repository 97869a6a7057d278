//! Bayesian posterior comparison for conversion experiments.
//!
//! Each arm gets a uniform `Beta(1, 1)` prior, so an arm with `c` conversions
//! out of `n` visitors has posterior `Beta(c + 1, n - c + 1)`. The engine
//! draws the same number of i.i.d. samples from both posteriors and derives:
//!
//! - P(variant > control), the share of paired draws where the variant wins
//! - expected loss, the mean of `max(control - variant, 0)`
//! - a 95% credible interval for the variant rate
//!
//! The random generator is always passed in by the caller. Seeded runs use
//! [`ChaCha8Rng`] so identical input and seed give identical output.
//!
//! # Example
//!
//! ```
//! use abtest_experiments::bayesian::BayesianEngine;
//! use abtest_experiments::ArmCounts;
//!
//! let engine = BayesianEngine::new(20_000);
//! let result = engine.analyze_seeded(ArmCounts::new(500, 1000), ArmCounts::new(600, 1000), 42);
//!
//! assert!(result.prob_variant_beats_control > 0.95);
//! ```

use crate::types::ArmCounts;
use abtest_core::config::{SamplerMode, DEFAULT_BAYESIAN_SAMPLES, MAX_BAYESIAN_SAMPLES};
use abtest_core::distribution::percentile_ci;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Beta, Distribution, Normal};
use serde::{Deserialize, Serialize};

/// Width of the reported credible interval.
pub const CREDIBLE_LEVEL: f64 = 0.95;

/// Posterior summary for one experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BayesianResult {
    /// P(variant rate > control rate), in [0, 1]
    #[serde(rename = "prob_b_beats_a")]
    pub prob_variant_beats_control: f64,
    /// Mean regret of shipping the variant when control is better, >= 0
    pub expected_loss: f64,
    /// (2.5th, 97.5th) percentile of the variant posterior
    pub credible_interval_95: (f64, f64),
    /// Draws per arm behind the estimate
    pub samples: usize,
}

/// Beta posterior for a single arm under a uniform prior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaPosterior {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaPosterior {
    /// Posterior after `counts.conversions` successes in `counts.visitors` trials.
    #[must_use]
    pub fn from_counts(counts: ArmCounts) -> Self {
        let failures = counts.visitors.saturating_sub(counts.conversions);
        Self {
            alpha: counts.conversions as f64 + 1.0,
            beta: failures as f64 + 1.0,
        }
    }

    #[must_use]
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    #[must_use]
    pub fn variance(&self) -> f64 {
        let total = self.alpha + self.beta;
        self.alpha * self.beta / (total * total * (total + 1.0))
    }

    /// Draws `n` samples using the requested sampler.
    pub fn sample<R: Rng + ?Sized>(&self, n: usize, mode: SamplerMode, rng: &mut R) -> Vec<f64> {
        match mode {
            SamplerMode::Beta => self.sample_exact(n, rng),
            SamplerMode::NormalApproximation => self.sample_normal_approximation(n, rng),
        }
    }

    fn sample_exact<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<f64> {
        match Beta::new(self.alpha, self.beta) {
            Ok(dist) => (0..n).map(|_| dist.sample(rng)).collect(),
            Err(err) => {
                tracing::warn!(
                    alpha = self.alpha,
                    beta = self.beta,
                    error = %err,
                    "Invalid Beta parameters, using posterior mean"
                );
                vec![self.mean(); n]
            }
        }
    }

    fn sample_normal_approximation<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Vec<f64> {
        let mean = self.mean();
        let std_dev = self.variance().max(1e-10).sqrt();
        match Normal::new(mean, std_dev) {
            Ok(dist) => (0..n)
                .map(|_| dist.sample(rng).clamp(0.0, 1.0))
                .collect(),
            Err(err) => {
                tracing::warn!(mean, std_dev, error = %err, "Invalid normal parameters, using posterior mean");
                vec![mean; n]
            }
        }
    }
}

/// Monte Carlo engine comparing two Beta posteriors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BayesianEngine {
    num_samples: usize,
    sampler: SamplerMode,
}

impl Default for BayesianEngine {
    fn default() -> Self {
        Self::new(DEFAULT_BAYESIAN_SAMPLES)
    }
}

impl BayesianEngine {
    /// Creates an engine drawing `num_samples` per arm with the exact Beta sampler.
    ///
    /// The sample count is clamped to `[1, MAX_BAYESIAN_SAMPLES]`.
    #[must_use]
    pub fn new(num_samples: usize) -> Self {
        let clamped = num_samples.clamp(1, MAX_BAYESIAN_SAMPLES);
        if clamped != num_samples {
            tracing::warn!(
                requested = num_samples,
                used = clamped,
                "Posterior sample count out of range, clamping"
            );
        }
        Self {
            num_samples: clamped,
            sampler: SamplerMode::Beta,
        }
    }

    /// Selects the posterior sampler. [`SamplerMode::NormalApproximation`] is
    /// a legacy mode that is only accurate for large shape parameters.
    #[must_use]
    pub fn with_sampler(mut self, sampler: SamplerMode) -> Self {
        self.sampler = sampler;
        self
    }

    #[must_use]
    pub const fn num_samples(&self) -> usize {
        self.num_samples
    }

    #[must_use]
    pub const fn sampler(&self) -> SamplerMode {
        self.sampler
    }

    /// Compares the two posteriors using the caller's generator.
    ///
    /// Control draws are taken before variant draws, so a given generator
    /// state always maps to the same result.
    pub fn analyze<R: Rng + ?Sized>(
        &self,
        control: ArmCounts,
        variant: ArmCounts,
        rng: &mut R,
    ) -> BayesianResult {
        let control_draws =
            BetaPosterior::from_counts(control).sample(self.num_samples, self.sampler, rng);
        let mut variant_draws =
            BetaPosterior::from_counts(variant).sample(self.num_samples, self.sampler, rng);

        let n = self.num_samples as f64;
        let mut wins = 0_usize;
        let mut total_loss = 0.0;
        for (c, v) in control_draws.iter().zip(variant_draws.iter()) {
            if v > c {
                wins += 1;
            }
            total_loss += (c - v).max(0.0);
        }

        variant_draws.sort_by(f64::total_cmp);
        let credible_interval_95 = percentile_ci(&variant_draws, CREDIBLE_LEVEL);

        let result = BayesianResult {
            prob_variant_beats_control: (wins as f64 / n).clamp(0.0, 1.0),
            expected_loss: (total_loss / n).max(0.0),
            credible_interval_95,
            samples: self.num_samples,
        };

        tracing::debug!(
            samples = self.num_samples,
            sampler = ?self.sampler,
            prob_b_beats_a = result.prob_variant_beats_control,
            expected_loss = result.expected_loss,
            "Posterior comparison complete"
        );

        result
    }

    /// Compares the two posteriors with a freshly seeded [`ChaCha8Rng`].
    #[must_use]
    pub fn analyze_seeded(&self, control: ArmCounts, variant: ArmCounts, seed: u64) -> BayesianResult {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.analyze(control, variant, &mut rng)
    }
}
