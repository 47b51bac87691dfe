// src/cli.rs

//! Command-line surface of `dockyard`: run-mode switches that override
//! `[config]`, plus the log level.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `dockyard`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "dockyard",
    version,
    about = "Rebuild and push container images whose sources changed in git.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Dockyard.toml")]
    pub config: String,

    /// Rebuild every target regardless of detected changes.
    #[arg(short, long)]
    pub force: bool,

    /// Run `docker system prune -f` after building.
    #[arg(long)]
    pub prune: bool,

    /// Sync repositories and print the plan, but don't build anything.
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Also print the targets that were left out of the plan.
    #[arg(short, long)]
    pub verbose: bool,

    /// Override `[config].work_dir`.
    #[arg(short = 'p', long, value_name = "PATH")]
    pub work_dir: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `DOCKYARD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
