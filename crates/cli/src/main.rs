use clap::{Parser, Subcommand};

mod commands;

use commands::{AnalyzeArgs, SampleSizeArgs, ServerArgs};

#[derive(Parser)]
#[command(name = "abtest")]
#[command(about = "Statistical analysis of A/B conversion experiments", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an experiment and print a recommendation
    Analyze(AnalyzeArgs),
    /// Calculate the visitors per variant needed to detect a lift
    SampleSize(SampleSizeArgs),
    /// Start the web API server
    Server(ServerArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze(args) => {
            commands::run_analyze(args)?;
        }
        Commands::SampleSize(args) => {
            commands::run_sample_size(args)?;
        }
        Commands::Server(args) => {
            commands::run_server(args).await?;
        }
    }

    Ok(())
}
