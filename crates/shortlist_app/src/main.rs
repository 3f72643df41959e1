mod cli;
mod commands;
mod config;

use std::process::ExitCode;

use clap::Parser;
use shortlist_logging::{shortlist_debug, shortlist_info, LevelFilter, LogDestination};

use crate::cli::Cli;
use crate::config::{AppConfig, ConfigSource};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let (mut config, source) = AppConfig::load(cli.config.as_deref())?;
    config.apply_env(|name| std::env::var(name).ok());
    if let Some(data_dir) = cli.data_dir.clone() {
        config.data_dir = data_dir;
    }
    config.validate()?;

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    let destination = match config.log_file.clone() {
        Some(path) if cli.verbose => LogDestination::Both(path),
        Some(path) => LogDestination::File(path),
        None => LogDestination::Terminal,
    };
    shortlist_logging::initialize(destination, level);
    match &source {
        ConfigSource::Defaults => {}
        ConfigSource::Missing(path) => shortlist_info!("No config at {:?}; using defaults", path),
        ConfigSource::File(path) => shortlist_debug!("Loaded config from {:?}", path),
    }

    commands::run(cli.command, &config)
}
