// src/engine/mod.rs

//! Build/push orchestration.
//!
//! The pure state machine lives in [`core`]: it owns the pending, running
//! and finished queues of both pools and turns job completions into
//! commands. The async shell in [`runtime`] feeds it completion events from
//! a channel and hands its commands to a [`crate::exec::JobBackend`].

use std::fmt;
use std::io::{self, Write};
use std::time::Duration;

pub mod core;
pub mod runtime;

pub use core::{CoreCommand, CorePipeline, CoreStep};
pub use runtime::Runtime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Build,
    Push,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Build => f.write_str("Build"),
            JobKind::Push => f.write_str("Push"),
        }
    }
}

/// Tri-state job status. `Failed` carries the status code to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Succeeded,
    Failed(i32),
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobStatus::Pending)
    }
}

/// Final state of one build or push, written once by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub kind: JobKind,
    /// Image name, `[user/]registry:tag`.
    pub name: String,
    pub status: JobStatus,
    pub error: Option<String>,
    pub elapsed: Duration,
}

impl JobReport {
    pub fn succeeded(kind: JobKind, name: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            kind,
            name: name.into(),
            status: JobStatus::Succeeded,
            error: None,
            elapsed,
        }
    }

    pub fn failed(
        kind: JobKind,
        name: impl Into<String>,
        code: i32,
        error: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            status: JobStatus::Failed(code),
            error: Some(error.into()),
            elapsed,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == JobStatus::Succeeded
    }
}

impl fmt::Display for JobReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            JobStatus::Succeeded => write!(
                f,
                "{} {} successful in {} sec",
                self.kind,
                self.name,
                self.elapsed.as_secs()
            ),
            JobStatus::Failed(code) => write!(
                f,
                "{} {} failed [{}]: {}",
                self.kind,
                self.name,
                code,
                self.error.as_deref().unwrap_or("")
            ),
            JobStatus::Pending => write!(f, "{} {} pending", self.kind, self.name),
        }
    }
}

/// Events flowing into the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    JobFinished(JobReport),
}

/// Pool sizes and image policy for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineOptions {
    pub max_build: usize,
    pub max_push: usize,
    pub auto_push: bool,
    pub remove_after_push: bool,
    /// Remove pushed images as soon as they are observed instead of in the
    /// final sweep. Later builds of the same run that use such an image as
    /// their base will have to fetch it again.
    pub remove_fast: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            max_build: 1,
            max_push: 1,
            auto_push: true,
            remove_after_push: true,
            remove_fast: false,
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub builds_started: usize,
    pub built: Vec<String>,
    pub pushed: Vec<String>,
    /// Images whose removal was issued after pushing.
    pub removed: Vec<String>,
    /// Manifests whose publication was issued.
    pub manifests: Vec<String>,
    pub failures: Vec<JobReport>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn print(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out)?;
        writeln!(
            out,
            "Built {}/{}, pushed {}, removed {}, failed {}",
            self.built.len(),
            self.builds_started,
            self.pushed.len(),
            self.removed.len(),
            self.failures.len()
        )?;
        for failure in &self.failures {
            writeln!(out, "  {failure}")?;
        }
        Ok(())
    }
}
