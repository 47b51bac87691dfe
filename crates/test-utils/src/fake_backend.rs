use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;

use dockyard::engine::{JobKind, JobReport, PipelineEvent};
use dockyard::errors::Result;
use dockyard::exec::JobBackend;
use dockyard::plan::BuildTask;
use dockyard::types::BoxFuture;

/// A fake job backend that:
/// - records every command it receives (`"build X"`, `"push X"`,
///   `"remove X"`, `"manifest X"`)
/// - immediately reports a `JobFinished` for each build and push, failing
///   the names it was told to fail.
pub struct FakeJobBackend {
    tx: mpsc::Sender<PipelineEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    failing: HashSet<(JobKind, String)>,
}

impl FakeJobBackend {
    pub fn new(tx: mpsc::Sender<PipelineEvent>, executed: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            tx,
            executed,
            failing: HashSet::new(),
        }
    }

    pub fn failing(mut self, kind: JobKind, name: &str) -> Self {
        self.failing.insert((kind, name.to_string()));
        self
    }

    fn report(&self, kind: JobKind, name: &str) -> JobReport {
        if self.failing.contains(&(kind, name.to_string())) {
            JobReport::failed(kind, name, 1, "scripted failure", Duration::ZERO)
        } else {
            JobReport::succeeded(kind, name, Duration::ZERO)
        }
    }

    fn record(&self, entry: String) {
        self.executed.lock().unwrap().push(entry);
    }

    fn complete(&mut self, kind: JobKind, name: String) -> BoxFuture<'_, Result<()>> {
        let label = match kind {
            JobKind::Build => "build",
            JobKind::Push => "push",
        };
        self.record(format!("{label} {name}"));
        let report = self.report(kind, &name);
        let tx = self.tx.clone();

        Box::pin(async move {
            tx.send(PipelineEvent::JobFinished(report))
                .await
                .map_err(anyhow::Error::from)?;
            Ok(())
        })
    }
}

impl JobBackend for FakeJobBackend {
    fn dispatch_build(&mut self, task: BuildTask) -> BoxFuture<'_, Result<()>> {
        self.complete(JobKind::Build, task.name)
    }

    fn dispatch_push(&mut self, name: String) -> BoxFuture<'_, Result<()>> {
        self.complete(JobKind::Push, name)
    }

    fn remove_image<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        self.record(format!("remove {name}"));
        Box::pin(async { Ok(()) })
    }

    fn publish_manifest<'a>(
        &'a mut self,
        name: &'a str,
        _members: &'a [String],
    ) -> BoxFuture<'a, Result<()>> {
        self.record(format!("manifest {name}"));
        Box::pin(async { Ok(()) })
    }
}
