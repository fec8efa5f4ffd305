use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tms_client::cli::{self, Cli};
use tms_client::config::ClientConfig;
use tms_client::{App, TmsError};

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        match error.downcast_ref::<TmsError>() {
            Some(TmsError::Unauthorized { .. }) => {
                eprintln!("tms: session expired or missing; run `tms login`");
            }
            _ => eprintln!("tms error: {error:#}"),
        }
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config =
        ClientConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }
    tracing::debug!(base_url = %config.base_url, "configuration loaded");

    let app = App::new(config).context("failed to initialise client")?;
    cli::dispatch(cli.command, &app).await?;
    Ok(())
}

/// Logs go to stderr; `TMS_LOG` overrides the level.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("TMS_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
