//! CLI commands for the experiment analysis engine.

pub mod analyze;
pub mod sample_size;
pub mod server;

pub use analyze::{run_analyze, AnalyzeArgs};
pub use sample_size::{run_sample_size, SampleSizeArgs};
pub use server::{run_server, ServerArgs};

use anyhow::{anyhow, Result};

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    /// Parses an output format from string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!(
                "Unknown format: '{}'. Valid formats: text, json",
                s
            )),
        }
    }
}
