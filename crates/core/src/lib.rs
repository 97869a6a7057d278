pub mod config;
pub mod config_loader;
pub mod distribution;

pub use config::{
    AnalysisConfig, AppConfig, DecisionThresholds, SamplerMode, ServerConfig,
    DEFAULT_BAYESIAN_SAMPLES, MAX_BAYESIAN_SAMPLES,
};
pub use config_loader::{ConfigLoader, DEFAULT_CONFIG_PATH};
pub use distribution::{normal_cdf, normal_inverse_ppf, percentile, percentile_ci};
