//! Sample-size planning CLI command.

use abtest_experiments::SampleSizeRequest;
use anyhow::Result;
use clap::Args;

use super::OutputFormat;

/// Arguments for the sample-size command.
#[derive(Args, Debug, Clone)]
pub struct SampleSizeArgs {
    /// Current conversion rate of the control (0-1)
    #[arg(long)]
    pub baseline_rate: f64,

    /// Minimum relative uplift to detect (0.10 = 10%)
    #[arg(long, default_value = "0.10")]
    pub mde: f64,

    /// Significance level (0.05 = 95% confidence)
    #[arg(long, default_value = "0.05")]
    pub alpha: f64,

    /// Statistical power (0.80 = 80%)
    #[arg(long, default_value = "0.80")]
    pub power: f64,

    /// Output format: text, json (default: text)
    #[arg(long, default_value = "text")]
    pub format: String,
}

/// Runs the sample-size command.
///
/// # Errors
/// Returns error if the format is unknown or an input is out of range.
pub fn run_sample_size(args: SampleSizeArgs) -> Result<()> {
    let format = OutputFormat::parse(&args.format)?;

    let plan = SampleSizeRequest {
        baseline_rate: args.baseline_rate,
        minimum_detectable_effect: args.mde,
        alpha: args.alpha,
        power: args.power,
    }
    .plan()?;

    match format {
        OutputFormat::Text => print!("{}", plan.to_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_rejects_out_of_range_power() {
        let args = SampleSizeArgs {
            baseline_rate: 0.05,
            mde: 0.10,
            alpha: 0.05,
            power: 1.2,
            format: "json".to_string(),
        };

        let err = run_sample_size(args).unwrap_err();
        assert!(err.to_string().contains("power"));
    }
}
