//! CLI command definitions for shiftlist.

use clap::{Parser, Subcommand};

/// Daily checklist service
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// HTTP port (overrides config)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Start the HTTP server (default if no subcommand given)
    Serve,

    /// Run one end-of-day rollover and print its summary as JSON
    Rollover,

    /// Delete expired employee copies and archives once
    Purge,
}
