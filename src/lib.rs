// src/lib.rs

pub mod cli;
pub mod config;
pub mod docker;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod git;
pub mod logging;
pub mod pipeline;
pub mod plan;
pub mod settings;
pub mod trigger;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::docker::DockerCli;
use crate::errors::Result;
use crate::fs::RealFileSystem;
use crate::git::GitCli;
use crate::pipeline::Pipeline;
use crate::settings::Settings;
use crate::types::Arch;

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the config, resolves run settings against the
/// host, and runs one pipeline with the real git and docker backends.
/// Failed builds or pushes are reported but do not fail the run.
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    debug!(
        repos = cfg.repos.len(),
        builds = cfg.build_entry_count(),
        git_triggers = cfg.git_triggers.len(),
        "config loaded"
    );

    let fs = Arc::new(RealFileSystem);
    let settings = Settings::resolve(&cfg.config, &args, fs.as_ref(), Arch::detect())?;
    info!(
        work_dir = %settings.work_dir.display(),
        arch = %settings.host_arch,
        dry_run = settings.dry_run,
        "starting run"
    );

    let pipeline = Pipeline::new(
        cfg,
        settings,
        fs,
        Arc::new(GitCli::new()),
        Arc::new(DockerCli::new()),
    );
    let summary = pipeline.run().await?;
    if summary.has_failures() {
        info!(failures = summary.failures.len(), "run finished with failed jobs");
    }
    Ok(())
}
