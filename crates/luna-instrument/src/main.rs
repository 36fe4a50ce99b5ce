//! luna-instrument: assertion rewriting and coverage remapping for luna test runs.

mod cli;
mod commands;
mod config;
mod output;

use camino::Utf8PathBuf;
use clap::Parser;
use cli::Args;
use config::LunaConfig;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::io::Write;
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "LUNA_LOG";

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let cwd = std::env::current_dir().into_diagnostic()?;
    let cwd = Utf8PathBuf::try_from(cwd)
        .into_diagnostic()
        .wrap_err("working directory is not valid UTF-8")?;
    let config = LunaConfig::load(args.config.as_deref(), &cwd).into_diagnostic()?;

    let stdout = commands::run(&args.command, &config).into_diagnostic()?;
    if !stdout.is_empty() {
        let mut handle = std::io::stdout().lock();
        handle.write_all(stdout.as_bytes()).into_diagnostic()?;
        if !stdout.ends_with('\n') {
            handle.write_all(b"\n").into_diagnostic()?;
        }
    }

    Ok(())
}
