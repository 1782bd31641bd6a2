use std::io::Write;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;
use crate::window;

pub fn run(args: Cli) -> Result<()> {
    initialise_tracing();

    let config = resolve_config(&args)?;
    match args.command {
        Some(Command::Config) => print_config(&config),
        None => {
            tracing::info!(
                source = ?config.source.kind,
                width = config.window.width,
                height = config.window.height,
                "starting edgecam"
            );
            window::run(config)
        }
    }
}

fn resolve_config(args: &Cli) -> Result<AppConfig> {
    let mut config = match args.run.config.as_deref() {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            AppConfig::load(path)?
        }
        None => AppConfig::default(),
    };
    args.run.apply(&mut config);
    config
        .validate()
        .context("command-line overrides produced an invalid configuration")?;
    Ok(config)
}

fn print_config(config: &AppConfig) -> Result<()> {
    let rendered = config
        .to_toml()
        .context("failed to serialise configuration")?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
