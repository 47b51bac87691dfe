// src/exec/backend.rs

//! Pluggable job backend.
//!
//! The runtime talks to a `JobBackend` instead of spawning work itself, so
//! tests can swap in a backend that completes jobs synchronously.
//!
//! `RealJobBackend` runs every build and push as its own Tokio task against
//! a [`ContainerEngine`] and reports completion over an mpsc channel. A
//! started job always runs to completion; a job that panics is reported as
//! failed so the orchestrator never waits on it.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::docker::ContainerEngine;
use crate::engine::{JobKind, JobReport, PipelineEvent};
use crate::errors::Result;
use crate::plan::BuildTask;
use crate::types::BoxFuture;

use super::job_runner::{PushRetry, run_build, run_push};

pub trait JobBackend: Send {
    /// Start a build; its completion must arrive as a `JobFinished` event.
    fn dispatch_build(&mut self, task: BuildTask) -> BoxFuture<'_, Result<()>>;

    /// Start a push; its completion must arrive as a `JobFinished` event.
    fn dispatch_push(&mut self, name: String) -> BoxFuture<'_, Result<()>>;

    /// Best-effort image removal.
    fn remove_image<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<()>>;

    fn publish_manifest<'a>(
        &'a mut self,
        name: &'a str,
        members: &'a [String],
    ) -> BoxFuture<'a, Result<()>>;
}

pub struct RealJobBackend {
    engine: Arc<dyn ContainerEngine>,
    tx: mpsc::Sender<PipelineEvent>,
    retry: PushRetry,
}

impl RealJobBackend {
    pub fn new(engine: Arc<dyn ContainerEngine>, tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self {
            engine,
            tx,
            retry: PushRetry::default(),
        }
    }

    pub fn with_retry(mut self, retry: PushRetry) -> Self {
        self.retry = retry;
        self
    }
}

impl JobBackend for RealJobBackend {
    fn dispatch_build(&mut self, task: BuildTask) -> BoxFuture<'_, Result<()>> {
        let engine = Arc::clone(&self.engine);
        let tx = self.tx.clone();

        Box::pin(async move {
            let name = task.name.clone();
            spawn_job(tx, JobKind::Build, name, async move {
                run_build(engine.as_ref(), &task).await
            });
            Ok(())
        })
    }

    fn dispatch_push(&mut self, name: String) -> BoxFuture<'_, Result<()>> {
        let engine = Arc::clone(&self.engine);
        let tx = self.tx.clone();
        let retry = self.retry;

        Box::pin(async move {
            let job_name = name.clone();
            spawn_job(tx, JobKind::Push, job_name, async move {
                run_push(engine.as_ref(), &name, retry).await
            });
            Ok(())
        })
    }

    fn remove_image<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            debug!(image = %name, "removing pushed image");
            self.engine.remove_image(name).await?;
            Ok(())
        })
    }

    fn publish_manifest<'a>(
        &'a mut self,
        name: &'a str,
        members: &'a [String],
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.engine.publish_manifest(name, members).await?;
            Ok(())
        })
    }
}

/// Run `job` on its own task and deliver its report. A panic inside the job
/// becomes a failed report with status -1.
fn spawn_job<F>(tx: mpsc::Sender<PipelineEvent>, kind: JobKind, name: String, job: F)
where
    F: Future<Output = JobReport> + Send + 'static,
{
    tokio::spawn(async move {
        let started = Instant::now();
        let report = match tokio::spawn(job).await {
            Ok(report) => report,
            Err(e) => {
                error!(job = %kind, image = %name, error = %e, "job task died");
                JobReport::failed(kind, &name, -1, format!("job task died: {e}"), started.elapsed())
            }
        };
        if tx.send(PipelineEvent::JobFinished(report)).await.is_err() {
            warn!(job = %kind, image = %name, "orchestrator gone; dropping report");
        }
    });
}
