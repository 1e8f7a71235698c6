//! Tracing subscriber setup for the `--log` option.

use anyhow::Result;
use std::fs::OpenOptions;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Off,
    Stdout,
    Stderr,
    /// Append to a file, without ANSI colors.
    File(PathBuf),
}

impl LogTarget {
    /// Parse `0/off`, `1/stdout`, `2/stderr`, or anything else as a file path.
    pub fn parse(value: &str) -> Self {
        match value {
            "0" | "off" => LogTarget::Off,
            "1" | "stdout" => LogTarget::Stdout,
            "2" | "stderr" => LogTarget::Stderr,
            path => LogTarget::File(PathBuf::from(path)),
        }
    }
}

/// Build the event filter. `RUST_LOG`-style directives win when present and
/// valid; otherwise `--verbose` picks between debug and info.
fn build_filter(directives: Option<&str>, verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(fallback))
}

/// Install the global subscriber.
pub fn init(target: &LogTarget, verbose: bool) -> Result<()> {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(directives.as_deref(), verbose);
    match target {
        LogTarget::Off => {}
        LogTarget::Stdout => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::Stderr => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        LogTarget::File(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}
