//! Jobwatch CLI
//!
//! Command-line interface for starting dashboard jobs and watching them
//! until they finish.

mod commands;
mod config;
mod display;

use anyhow::Result;
use clap::Parser;
use commands::{Commands, handle_command};
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "jobwatch")]
#[command(about = "Submit and watch long-running dashboard jobs", long_about = None)]
struct Cli {
    /// Dashboard URL
    #[arg(
        long,
        env = "JOBWATCH_DASHBOARD_URL",
        default_value = "http://localhost:5000"
    )]
    dashboard_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobwatch_cli=info,jobwatch_poller=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config {
        dashboard_url: cli.dashboard_url,
    };

    handle_command(cli.command, &config).await
}
