// src/logging.rs

//! Diagnostics for `dockyard`, written to STDERR through `tracing`.
//!
//! stdout belongs to the build plan and the run report, so everything here
//! goes to stderr. The filter is chosen as follows:
//! 1. `--log-level` sets the level of dockyard's own targets.
//! 2. Otherwise `DOCKYARD_LOG` is read as a full filter directive, e.g.
//!    `info,dockyard::exec=debug`.
//! 3. Otherwise dockyard logs at `info`.
//!
//! Dependencies stay at `warn` unless a directive names them.

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "DOCKYARD_LOG";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref())?;

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("cannot install log subscriber: {e}"))
}

fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(level) = cli_level {
        return Ok(EnvFilter::new(own_targets_at(level.as_str())));
    }
    match env.map(str::trim).filter(|s| !s.is_empty()) {
        Some(spec) => EnvFilter::try_new(spec)
            .with_context(|| format!("invalid {LOG_ENV} filter '{spec}'")),
        None => Ok(EnvFilter::new(own_targets_at("info"))),
    }
}

fn own_targets_at(level: &str) -> String {
    format!("warn,dockyard={level}")
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
