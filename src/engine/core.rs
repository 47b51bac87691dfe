// src/engine/core.rs

//! Pure orchestration state machine.
//!
//! [`CorePipeline`] consumes [`PipelineEvent`]s and returns the commands the
//! IO shell should run next. It owns every queue of the run:
//!
//! ```text
//! pending_builds -> building -> push_pending -> pushing -> pushed -> (removed)
//!                          \-> failures                \-> failures
//! ```
//!
//! It has no channels, no Tokio types and performs no IO, so it can be
//! driven step by step in tests.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info};

use crate::engine::{JobKind, JobReport, PipelineEvent, PipelineOptions, RunSummary};
use crate::plan::{BuildTask, ManifestSpec};

/// Command produced by the core, to be executed by the IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    DispatchBuild(BuildTask),
    DispatchPush(String),
    RemoveImage(String),
    PublishManifest { name: String, members: Vec<String> },
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// False once both pools have drained and the final sweep was issued.
    pub keep_running: bool,
}

#[derive(Debug)]
pub struct CorePipeline {
    options: PipelineOptions,
    pending_builds: VecDeque<BuildTask>,
    building: HashSet<String>,
    push_pending: VecDeque<String>,
    pushing: HashSet<String>,
    pushed: VecDeque<String>,
    manifests: Vec<ManifestSpec>,
    summary: RunSummary,
    finished: bool,
}

impl CorePipeline {
    pub fn new(
        tasks: impl IntoIterator<Item = BuildTask>,
        manifests: Vec<ManifestSpec>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            options,
            pending_builds: tasks.into_iter().collect(),
            building: HashSet::new(),
            push_pending: VecDeque::new(),
            pushing: HashSet::new(),
            pushed: VecDeque::new(),
            manifests,
            summary: RunSummary::default(),
            finished: false,
        }
    }

    /// Admit the first builds. Call once before feeding events.
    pub fn start(&mut self) -> CoreStep {
        self.advance()
    }

    /// Handle a single event and return the resulting commands.
    pub fn step(&mut self, event: PipelineEvent) -> CoreStep {
        match event {
            PipelineEvent::JobFinished(report) => self.record(report),
        }
        self.advance()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Jobs dispatched but not yet reported.
    pub fn in_flight(&self) -> usize {
        self.building.len() + self.pushing.len()
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }

    fn record(&mut self, report: JobReport) {
        if !report.status.is_terminal() {
            debug!(name = %report.name, kind = %report.kind, "ignoring non-final report");
            return;
        }
        let pool = match report.kind {
            JobKind::Build => &mut self.building,
            JobKind::Push => &mut self.pushing,
        };
        if !pool.remove(&report.name) {
            debug!(name = %report.name, kind = %report.kind, "ignoring report for unknown job");
            return;
        }

        match (report.kind, report.is_success()) {
            (JobKind::Build, true) => {
                self.summary.built.push(report.name.clone());
                if self.options.auto_push {
                    self.push_pending.push_back(report.name);
                }
            }
            (JobKind::Push, true) => {
                self.summary.pushed.push(report.name.clone());
                self.pushed.push_back(report.name);
            }
            (_, false) => self.summary.failures.push(report),
        }
    }

    fn advance(&mut self) -> CoreStep {
        if self.finished {
            return CoreStep {
                commands: Vec::new(),
                keep_running: false,
            };
        }

        let mut commands = Vec::new();

        while self.building.len() < self.options.max_build {
            let Some(task) = self.pending_builds.pop_front() else {
                break;
            };
            self.building.insert(task.name.clone());
            self.summary.builds_started += 1;
            commands.push(CoreCommand::DispatchBuild(task));
        }

        while self.options.auto_push && self.pushing.len() < self.options.max_push {
            let Some(name) = self.push_pending.pop_front() else {
                break;
            };
            self.pushing.insert(name.clone());
            commands.push(CoreCommand::DispatchPush(name));
        }

        if self.options.remove_fast {
            self.sweep_pushed(&mut commands);
        }

        let drained = self.pending_builds.is_empty()
            && self.building.is_empty()
            && self.push_pending.is_empty()
            && self.pushing.is_empty();

        if drained {
            self.sweep_pushed(&mut commands);
            self.publish_manifests(&mut commands);
            self.finished = true;
            info!(
                built = self.summary.built.len(),
                pushed = self.summary.pushed.len(),
                failed = self.summary.failures.len(),
                "pipeline drained"
            );
        }

        CoreStep {
            commands,
            keep_running: !self.finished,
        }
    }

    fn sweep_pushed(&mut self, commands: &mut Vec<CoreCommand>) {
        while let Some(name) = self.pushed.pop_front() {
            if self.options.remove_after_push {
                self.summary.removed.push(name.clone());
                commands.push(CoreCommand::RemoveImage(name));
            }
        }
    }

    fn publish_manifests(&mut self, commands: &mut Vec<CoreCommand>) {
        if !self.options.auto_push {
            return;
        }
        let pushed: HashSet<&str> = self.summary.pushed.iter().map(String::as_str).collect();
        let ready: Vec<(String, Vec<String>)> = self
            .manifests
            .iter()
            .filter_map(|spec| {
                let members = spec.members();
                members
                    .iter()
                    .any(|m| pushed.contains(m.as_str()))
                    .then(|| (spec.name.clone(), members))
            })
            .collect();

        for (name, members) in ready {
            self.summary.manifests.push(name.clone());
            commands.push(CoreCommand::PublishManifest { name, members });
        }
    }
}
