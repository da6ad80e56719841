use std::path::PathBuf;

use clap::Parser;

use cardwatch::app::{self, RunOptions};
use cardwatch::config::get_settings;

#[derive(Parser)]
#[command(
    name = "cardwatch",
    about = "Scrape card prices into a ledger and track your collection against them",
    version
)]
struct Cli {
    /// Settings file (TOML, YAML or JSON). `CARDWATCH_*` env vars override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Skip the scrape and use the prices already in the ledger.
    #[arg(long)]
    skip_scrape: bool,

    /// Run the browser without a window.
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut settings = get_settings(cli.config.as_deref())?;
    if cli.headless {
        settings.headless = true;
    }

    app::run(
        &settings,
        RunOptions {
            skip_scrape: cli.skip_scrape,
        },
    )
    .await?;
    Ok(())
}
