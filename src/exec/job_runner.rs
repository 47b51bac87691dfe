// src/exec/job_runner.rs

//! Single build and push jobs.
//!
//! Each function runs one job to completion and folds every outcome into a
//! [`JobReport`]; nothing here returns an error to the caller.

use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::docker::{ContainerEngine, split_image_tag};
use crate::engine::{JobKind, JobReport};
use crate::plan::BuildTask;

/// Push retry policy. Only transient (connection-level) errors are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushRetry {
    /// Total attempts, including the first.
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for PushRetry {
    fn default() -> Self {
        Self {
            attempts: 4,
            delay: Duration::from_secs(2),
        }
    }
}

pub async fn run_build(engine: &dyn ContainerEngine, task: &BuildTask) -> JobReport {
    let started = Instant::now();
    info!(image = %task.name, dockerfile = %task.dockerfile.display(), "build started");

    match engine
        .build_image(&task.name, &task.dockerfile, &task.context)
        .await
    {
        Ok(()) => JobReport::succeeded(JobKind::Build, &task.name, started.elapsed()),
        Err(e) => JobReport::failed(
            JobKind::Build,
            &task.name,
            e.status_code(),
            e.to_string(),
            started.elapsed(),
        ),
    }
}

pub async fn run_push(engine: &dyn ContainerEngine, name: &str, retry: PushRetry) -> JobReport {
    let started = Instant::now();
    let (repository, tag) = split_image_tag(name);
    let attempts = retry.attempts.max(1);
    info!(image = %name, "push started");

    let mut attempt = 1;
    loop {
        match engine.push_image(repository, tag).await {
            Ok(()) => return JobReport::succeeded(JobKind::Push, name, started.elapsed()),
            Err(e) if e.is_transient() && attempt < attempts => {
                warn!(image = %name, attempt, error = %e, "push failed; retrying");
                attempt += 1;
                if !retry.delay.is_zero() {
                    tokio::time::sleep(retry.delay).await;
                }
            }
            Err(e) => {
                return JobReport::failed(
                    JobKind::Push,
                    name,
                    e.status_code(),
                    e.to_string(),
                    started.elapsed(),
                );
            }
        }
    }
}
