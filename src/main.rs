use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info};
use weatherpulse::config::load_config;

/// Periodically records current weather for one location and serves its history.
#[derive(Parser)]
#[command(name = "weatherpulse", version)]
struct Cli {
    /// TOML config file; defaults and WEATHERPULSE_* env vars apply without one.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Run a single refresh cycle, print the reading and exit.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weatherpulse=info".into()),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        "Location: {}, refresh every {}s, journal: {}",
        config.location,
        config.refresh_interval_secs,
        config
            .journal_path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "off".to_string())
    );

    if cli.once {
        let reading = weatherpulse::run_once(config).await?;
        println!("{}", serde_json::to_string(&reading)?);
        return Ok(());
    }

    weatherpulse::run_server(config).await?;
    Ok(())
}
