// src/settings.rs

//! Immutable per-run settings: the `[config]` section with CLI overrides
//! applied and every path resolved.

use std::path::{Path, PathBuf};

use crate::cli::CliArgs;
use crate::config::ConfigSection;
use crate::engine::PipelineOptions;
use crate::errors::{DockyardError, Result};
use crate::fs::FileSystem;
use crate::plan::PlannerOptions;
use crate::types::Arch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub work_dir: PathBuf,
    /// Checkout root for git-trigger repositories.
    pub triggers_dir: PathBuf,
    pub credentials: PathBuf,
    /// Image namespace from the config; replaced by the login user when pushing.
    pub user: String,
    pub host_arch: Arch,
    pub arch_detect: bool,
    pub auto_push: bool,
    pub remove_after_push: bool,
    pub remove_fast: bool,
    pub max_build: usize,
    pub max_push: usize,
    pub force: bool,
    pub prune: bool,
    pub dry_run: bool,
    pub verbose: bool,
}

impl Settings {
    /// Apply CLI overrides to `section` and prepare the working directory.
    ///
    /// Fails if `work_dir` is missing, or if architecture detection is on
    /// and the host architecture is unknown. Creates the git-trigger
    /// checkout directory when needed.
    pub fn resolve(
        section: &ConfigSection,
        args: &CliArgs,
        fs: &dyn FileSystem,
        host_arch: Arch,
    ) -> Result<Self> {
        let work_dir = args.work_dir.as_deref().unwrap_or(&section.work_dir);
        if work_dir.trim().is_empty() {
            return Err(DockyardError::ConfigError(
                "work_dir is not set; use [config].work_dir or -p".to_string(),
            ));
        }
        let work_dir = PathBuf::from(work_dir);
        if !fs.is_dir(&work_dir) {
            return Err(DockyardError::ConfigError(format!(
                "work_dir not found: {}",
                work_dir.display()
            )));
        }

        let triggers_dir = work_dir.join(&section.triggers);
        if !fs.is_dir(&triggers_dir) {
            fs.create_dir_all(&triggers_dir)?;
        }

        if section.arch_detect && host_arch == Arch::Unknown {
            return Err(DockyardError::ConfigError(
                "unknown host architecture and arch_detect is enabled".to_string(),
            ));
        }

        Ok(Self {
            credentials: resolve_against(&work_dir, &section.credentials),
            work_dir,
            triggers_dir,
            user: section.user.clone(),
            host_arch,
            arch_detect: section.arch_detect,
            auto_push: section.auto_push,
            remove_after_push: section.auto_push && section.remove_after_push,
            remove_fast: section.remove_fast,
            max_build: section.max_build,
            max_push: section.max_push,
            force: section.force || args.force,
            prune: section.prune || args.prune,
            dry_run: args.dry_run,
            verbose: args.verbose,
        })
    }

    /// Whether this run logs in to the registry.
    pub fn needs_login(&self) -> bool {
        self.auto_push && !self.dry_run
    }

    pub fn planner_options(&self, user: &str) -> PlannerOptions {
        PlannerOptions {
            user: user.to_string(),
            force: self.force,
            arch_detect: self.arch_detect,
            host_arch: self.host_arch,
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            max_build: self.max_build,
            max_push: self.max_push,
            auto_push: self.auto_push,
            remove_after_push: self.remove_after_push,
            remove_fast: self.remove_fast,
        }
    }
}

fn resolve_against(base: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
