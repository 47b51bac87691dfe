// src/engine/runtime.rs

use std::fmt;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::errors::Result;
use crate::exec::JobBackend;

use super::core::{CoreCommand, CorePipeline};
use super::{PipelineEvent, RunSummary};

/// Drives a [`CorePipeline`] from job completion events and hands its
/// commands to a [`JobBackend`].
///
/// The shell waits on the event channel instead of polling; a dispatched
/// job is never cancelled, so the run ends only once every job reported.
pub struct Runtime<B: JobBackend> {
    core: CorePipeline,
    event_rx: mpsc::Receiver<PipelineEvent>,
    backend: B,
}

impl<B: JobBackend> fmt::Debug for Runtime<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<B: JobBackend> Runtime<B> {
    pub fn new(core: CorePipeline, event_rx: mpsc::Receiver<PipelineEvent>, backend: B) -> Self {
        Self {
            core,
            event_rx,
            backend,
        }
    }

    /// Run until both pools have drained and return what happened.
    pub async fn run(mut self) -> Result<RunSummary> {
        info!("pipeline started");

        let mut step = self.core.start();
        loop {
            for command in step.commands {
                self.execute_command(command).await?;
            }
            if !step.keep_running {
                break;
            }

            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    return Err(anyhow!(
                        "job event channel closed with {} job(s) in flight",
                        self.core.in_flight()
                    )
                    .into());
                }
            };

            debug!(?event, "pipeline received event");
            let PipelineEvent::JobFinished(report) = &event;
            if report.is_success() {
                println!("{report}");
            } else {
                error!(job = %report.kind, image = %report.name, "job failed");
                println!("{report}");
                println!();
            }

            step = self.core.step(event);
        }

        info!("pipeline finished");
        Ok(self.core.into_summary())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchBuild(task) => {
                println!("Start building {}", task.name);
                self.backend.dispatch_build(task).await?;
            }
            CoreCommand::DispatchPush(name) => {
                println!("Start pushing {name}");
                self.backend.dispatch_push(name).await?;
            }
            CoreCommand::RemoveImage(name) => {
                println!("Remove {name}");
                if let Err(e) = self.backend.remove_image(&name).await {
                    warn!(image = %name, error = %e, "failed to remove pushed image");
                }
            }
            CoreCommand::PublishManifest { name, members } => {
                println!("Publish manifest {name}:latest");
                if let Err(e) = self.backend.publish_manifest(&name, &members).await {
                    warn!(manifest = %name, error = %e, "failed to publish manifest");
                }
            }
        }
        Ok(())
    }
}
