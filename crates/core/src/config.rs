use serde::{Deserialize, Serialize};

/// Default number of posterior draws per arm.
pub const DEFAULT_BAYESIAN_SAMPLES: usize = 100_000;

/// Hard ceiling on posterior draws per arm. Bounds worst-case CPU per request.
pub const MAX_BAYESIAN_SAMPLES: usize = 1_000_000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum number of Monte Carlo analyses allowed to run at once.
    pub max_concurrent_analyses: usize,
}

impl ServerConfig {
    /// Socket address string in `host:port` form.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            max_concurrent_analyses: 8,
        }
    }
}

/// Engine settings shared by every analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Posterior draws per arm. Clamped to `[1, MAX_BAYESIAN_SAMPLES]` by the engine.
    pub bayesian_samples: usize,
    /// Fixed seed for the posterior sampler. `None` seeds from entropy per request.
    pub seed: Option<u64>,
    pub sampler: SamplerMode,
    /// Relative lift the sample-size planner targets (0.10 = 10%).
    pub minimum_detectable_effect: f64,
    /// Statistical power for the sample-size planner.
    pub power: f64,
    pub thresholds: DecisionThresholds,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bayesian_samples: DEFAULT_BAYESIAN_SAMPLES,
            seed: None,
            sampler: SamplerMode::default(),
            minimum_detectable_effect: 0.10,
            power: 0.80,
            thresholds: DecisionThresholds::default(),
        }
    }
}

/// Posterior sampling strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerMode {
    /// Exact draws from the Beta posterior.
    #[default]
    Beta,
    /// Legacy normal approximation to the Beta posterior, clamped to [0, 1].
    /// Only valid when both shape parameters are large.
    NormalApproximation,
}

/// Cut-offs used by the decision policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    /// Smallest |relative uplift| (in percent) worth shipping.
    pub min_practical_uplift_pct: f64,
    /// Posterior P(variant > control) below this counts as decided against the variant.
    pub certainty_low: f64,
    /// Posterior P(variant > control) above this counts as decided for the variant.
    pub certainty_high: f64,
    /// Multiple of the planned per-arm sample size that counts as a large sample.
    pub sample_size_multiplier: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            min_practical_uplift_pct: 2.0,
            certainty_low: 0.10,
            certainty_high: 0.90,
            sample_size_multiplier: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.analysis.bayesian_samples, DEFAULT_BAYESIAN_SAMPLES);
        assert!(config.analysis.seed.is_none());
        assert_eq!(config.analysis.sampler, SamplerMode::Beta);
        assert!((config.analysis.minimum_detectable_effect - 0.10).abs() < f64::EPSILON);
        assert!((config.analysis.power - 0.80).abs() < f64::EPSILON);
        assert!((config.analysis.thresholds.min_practical_uplift_pct - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn server_addr_joins_host_and_port() {
        let server = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 9090,
            max_concurrent_analyses: 1,
        };
        assert_eq!(server.addr(), "127.0.0.1:9090");
    }

    #[test]
    fn sampler_mode_uses_snake_case() {
        let json = serde_json::to_string(&SamplerMode::NormalApproximation).unwrap();
        assert_eq!(json, "\"normal_approximation\"");

        let parsed: SamplerMode = serde_json::from_str("\"beta\"").unwrap();
        assert_eq!(parsed, SamplerMode::Beta);
    }

    #[test]
    fn partial_analysis_config_fills_defaults() {
        let parsed: AnalysisConfig = serde_json::from_str(r#"{"bayesian_samples": 5000}"#).unwrap();

        assert_eq!(parsed.bayesian_samples, 5000);
        assert!((parsed.power - 0.80).abs() < f64::EPSILON);
        assert_eq!(parsed.thresholds, DecisionThresholds::default());
    }
}
