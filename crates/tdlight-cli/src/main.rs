//! tdlight - terminal front end for the TD-light light-curve portal.

mod cli;
mod commands;
mod render;

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tdlight_config::Settings;
use tdlight_portal::Portal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::commands::Session;

fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("could not load {}", path.display()))?,
        None => Settings::load().context("could not load tdlight.toml")?,
    };
    if let Some(url) = &cli.backend_url {
        settings.backend.base_url = url.trim().to_string();
        settings.validate()?;
    }
    Ok(settings)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tdlight=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    info!("🔭 TD-light backend: {}", settings.backend.base_url);

    let portal = Portal::from_settings(settings)?;
    let mut session = Session::new(portal);
    let ok = session.run(cli.command).await;

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
