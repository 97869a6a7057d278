//! Analyze experiment CLI command.
//!
//! Runs the frequentist test, the posterior comparison and the decision
//! policy on counts given on the command line.

use abtest_core::{ConfigLoader, DEFAULT_CONFIG_PATH};
use abtest_experiments::{AnalysisRequest, ExperimentAnalyzer};
use anyhow::{Context, Result};
use clap::Args;

use super::OutputFormat;

/// Arguments for the analyze command.
#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Conversions in the control arm
    #[arg(long)]
    pub control_conversions: u64,

    /// Visitors in the control arm
    #[arg(long)]
    pub control_visitors: u64,

    /// Conversions in the variant arm
    #[arg(long)]
    pub variant_conversions: u64,

    /// Visitors in the variant arm
    #[arg(long)]
    pub variant_visitors: u64,

    /// Confidence level for the z-test (0.5 - 0.9999)
    #[arg(long, default_value = "0.95")]
    pub confidence_level: f64,

    /// Optional experiment label shown in the report
    #[arg(long)]
    pub name: Option<String>,

    /// Seed for the posterior sampler (reproducible output)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Posterior draws per arm (overrides config, capped at 1,000,000)
    #[arg(long)]
    pub samples: Option<usize>,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,
}

impl AnalyzeArgs {
    fn to_request(&self) -> AnalysisRequest {
        AnalysisRequest {
            experiment_name: self.name.clone(),
            control_conversions: self.control_conversions,
            control_visitors: self.control_visitors,
            variant_conversions: self.variant_conversions,
            variant_visitors: self.variant_visitors,
            confidence_level: self.confidence_level,
            seed: self.seed,
        }
    }
}

/// Runs the analyze command.
///
/// # Errors
/// Returns error if the configuration cannot be loaded, the format is
/// unknown, or the counts fail validation.
pub fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let format = OutputFormat::parse(&args.format)?;

    let mut config = ConfigLoader::load_from(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config))?
        .analysis;
    if let Some(samples) = args.samples {
        config.bayesian_samples = samples;
    }

    let analyzer = ExperimentAnalyzer::new(&config).context("Invalid analysis configuration")?;
    tracing::info!(
        samples = analyzer.bayesian_engine().num_samples(),
        "Analyzing experiment"
    );

    let report = analyzer.analyze_request(&args.to_request())?;

    match format {
        OutputFormat::Text => print!("{}", report.to_text()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> AnalyzeArgs {
        AnalyzeArgs {
            control_conversions: 100,
            control_visitors: 1000,
            variant_conversions: 130,
            variant_visitors: 1000,
            confidence_level: 0.95,
            name: Some("hero_banner".to_string()),
            seed: Some(5),
            samples: None,
            format: "text".to_string(),
            config: "config/Config.toml".to_string(),
        }
    }

    #[test]
    fn to_request_copies_counts() {
        let request = args().to_request();

        assert_eq!(request.control_conversions, 100);
        assert_eq!(request.variant_visitors, 1000);
        assert_eq!(request.seed, Some(5));
        assert_eq!(request.experiment_name.as_deref(), Some("hero_banner"));
    }

    #[test]
    fn run_rejects_inconsistent_counts() {
        let mut args = args();
        args.variant_conversions = 2000;
        args.samples = Some(100);
        args.config = "does-not-exist.toml".to_string();

        let err = run_analyze(args).unwrap_err();
        assert!(err.to_string().contains("variant conversions"));
    }

    #[test]
    fn run_rejects_unknown_format() {
        let mut args = args();
        args.format = "xml".to_string();

        assert!(run_analyze(args).is_err());
    }
}
