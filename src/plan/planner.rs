// src/plan/planner.rs

use std::collections::HashSet;
use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::config::{RepoConfig, TargetConfig};
use crate::fs::FileSystem;
use crate::git::SyncedRepo;
use crate::trigger::{self, TriggerDecision, TriggerFlags, TriggerReason};
use crate::types::Arch;

use super::exclusion::{Candidate, CheckEnv, Exclusion, first_exclusion};
use super::template::TagSet;

/// Why an accepted build is in the plan, highest priority first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptReason {
    Force,
    DockerfileChange,
    Clone,
    FileChange(String),
    Triggered(String),
}

impl fmt::Display for AcceptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptReason::Force => f.write_str("force"),
            AcceptReason::DockerfileChange => f.write_str("dockerfile change"),
            AcceptReason::Clone => f.write_str("clone"),
            AcceptReason::FileChange(pattern) => write!(f, "file change: {pattern}"),
            AcceptReason::Triggered(name) => write!(f, "triggered: {name}"),
        }
    }
}

/// An image to build and (optionally) push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildTask {
    /// `[user/]registry:tag`, unique within a run.
    pub name: String,
    pub dockerfile: PathBuf,
    /// Build context: the repository checkout.
    pub context: PathBuf,
    pub reason: AcceptReason,
}

/// A build entry left out of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub name: String,
    pub dockerfile: PathBuf,
    pub exclusion: Exclusion,
}

/// A multi-arch `name:latest` reference to publish after pushing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestSpec {
    /// `[user/]registry`
    pub name: String,
    pub arches: Vec<Arch>,
}

impl ManifestSpec {
    /// `name:<arch>` for every listed architecture.
    pub fn members(&self) -> Vec<String> {
        self.arches
            .iter()
            .map(|arch| format!("{}:{}", self.name, arch))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildPlan {
    pub accepted: Vec<BuildTask>,
    pub rejected: Vec<Rejection>,
    pub manifests: Vec<ManifestSpec>,
}

impl BuildPlan {
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.accepted.iter().map(|t| t.name.as_str())
    }

    /// Print every planning decision; rejections only when `verbose`.
    pub fn print_report(&self, out: &mut impl Write, verbose: bool) -> io::Result<()> {
        if verbose && !self.rejected.is_empty() {
            writeln!(out)?;
            for r in &self.rejected {
                writeln!(
                    out,
                    "Ignore {} from {}: {}",
                    r.name,
                    r.dockerfile.display(),
                    r.exclusion
                )?;
            }
        }

        if !self.accepted.is_empty() {
            writeln!(out)?;
            for t in &self.accepted {
                writeln!(
                    out,
                    "Allow building {} from {}: {}",
                    t.name,
                    t.dockerfile.display(),
                    t.reason
                )?;
            }
        }

        Ok(())
    }
}

/// Run-wide planner inputs.
#[derive(Debug, Clone)]
pub struct PlannerOptions {
    /// Image namespace; empty for none.
    pub user: String,
    pub force: bool,
    pub arch_detect: bool,
    pub host_arch: Arch,
}

/// `[user/]registry`
pub fn image_base_name(user: &str, registry: &str) -> String {
    if user.is_empty() {
        registry.to_string()
    } else {
        format!("{user}/{registry}")
    }
}

/// Turns synced repositories into an ordered, annotated build plan.
///
/// Repositories are fed in config order with [`BuildPlanner::plan_repository`];
/// build names are registered as they are accepted, so the first entry to
/// claim a name keeps it.
#[derive(Debug)]
pub struct BuildPlanner<'a> {
    fs: &'a dyn FileSystem,
    options: PlannerOptions,
    registered: HashSet<String>,
    plan: BuildPlan,
}

impl<'a> BuildPlanner<'a> {
    pub fn new(fs: &'a dyn FileSystem, options: PlannerOptions) -> Self {
        Self {
            fs,
            options,
            registered: HashSet::new(),
            plan: BuildPlan::default(),
        }
    }

    pub fn plan_repository(
        &mut self,
        repo: &RepoConfig,
        synced: &SyncedRepo,
        tags: &TagSet,
        flags: &TriggerFlags,
    ) {
        for target in &repo.targets {
            self.plan_target(target, synced, tags, flags);
        }
    }

    pub fn finish(self) -> BuildPlan {
        self.plan
    }

    fn plan_target(
        &mut self,
        target: &TargetConfig,
        synced: &SyncedRepo,
        tags: &TagSet,
        flags: &TriggerFlags,
    ) {
        let decision = trigger::evaluate(&target.triggers, &synced.changes, flags);
        let base_name = image_base_name(&self.options.user, &target.registry);

        if !target.manifest.is_empty() && !self.plan.manifests.iter().any(|m| m.name == base_name) {
            self.plan.manifests.push(ManifestSpec {
                name: base_name.clone(),
                arches: target.manifest.clone(),
            });
        }

        for build in &target.builds {
            let tag = build.template.expand(tags);
            let name = format!("{base_name}:{tag}");
            let dockerfile = synced.dir.join(&build.dockerfile);
            let dockerfile_changed = synced.changes.contains(&build.dockerfile);

            let candidate = Candidate {
                name: &name,
                tag: &tag,
                registry: &target.registry,
                dockerfile_rel: &build.dockerfile,
                dockerfile: &dockerfile,
                trigger: &decision,
                dockerfile_changed,
            };
            let env = CheckEnv {
                fs: self.fs,
                force: self.options.force,
                arch_detect: self.options.arch_detect,
                host_arch: self.options.host_arch,
                registered: &self.registered,
            };

            let outcome = match first_exclusion(&candidate, &env) {
                Some(exclusion) => Err(exclusion),
                None => accept_reason(self.options.force, dockerfile_changed, &decision)
                    .ok_or(Exclusion::NoChange),
            };

            match outcome {
                Ok(reason) => {
                    debug!(image = %name, %reason, "build accepted");
                    self.registered.insert(name.clone());
                    self.plan.accepted.push(BuildTask {
                        name,
                        dockerfile,
                        context: synced.dir.clone(),
                        reason,
                    });
                }
                Err(exclusion) => {
                    debug!(image = %name, %exclusion, "build rejected");
                    self.plan.rejected.push(Rejection {
                        name,
                        dockerfile,
                        exclusion,
                    });
                }
            }
        }
    }
}

fn accept_reason(
    force: bool,
    dockerfile_changed: bool,
    decision: &TriggerDecision,
) -> Option<AcceptReason> {
    if force {
        return Some(AcceptReason::Force);
    }
    if dockerfile_changed {
        return Some(AcceptReason::DockerfileChange);
    }
    match &decision.reason {
        TriggerReason::Clone => Some(AcceptReason::Clone),
        TriggerReason::FileChanged(pattern) => Some(AcceptReason::FileChange(pattern.clone())),
        TriggerReason::NamedTrigger(name) => Some(AcceptReason::Triggered(name.clone())),
        TriggerReason::None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_has_optional_user_prefix() {
        assert_eq!(image_base_name("", "demo"), "demo");
        assert_eq!(image_base_name("bob", "demo"), "bob/demo");
    }

    #[test]
    fn force_outranks_other_reasons() {
        let decision = TriggerDecision {
            should_build: true,
            reason: TriggerReason::FileChanged("src*".into()),
        };
        assert_eq!(accept_reason(true, true, &decision), Some(AcceptReason::Force));
        assert_eq!(
            accept_reason(false, true, &decision),
            Some(AcceptReason::DockerfileChange)
        );
        assert_eq!(
            accept_reason(false, false, &decision),
            Some(AcceptReason::FileChange("src*".into()))
        );
    }

    #[test]
    fn manifest_members_follow_arch_list() {
        let spec = ManifestSpec {
            name: "bob/demo".into(),
            arches: vec![Arch::Amd64, Arch::Arm64v8],
        };
        assert_eq!(spec.members(), vec!["bob/demo:amd64", "bob/demo:arm64v8"]);
    }

    #[test]
    fn report_hides_rejections_unless_verbose() {
        let plan = BuildPlan {
            accepted: vec![BuildTask {
                name: "demo:amd64".into(),
                dockerfile: PathBuf::from("/w/demo/Dockerfile.amd64"),
                context: PathBuf::from("/w/demo"),
                reason: AcceptReason::Force,
            }],
            rejected: vec![Rejection {
                name: "demo:".into(),
                dockerfile: PathBuf::from("/w/demo/Dockerfile"),
                exclusion: Exclusion::EmptyTag,
            }],
            manifests: Vec::new(),
        };

        let mut quiet = Vec::new();
        plan.print_report(&mut quiet, false).unwrap();
        let quiet = String::from_utf8(quiet).unwrap();
        assert!(quiet.contains("Allow building demo:amd64 from /w/demo/Dockerfile.amd64: force"));
        assert!(!quiet.contains("Ignore"));

        let mut loud = Vec::new();
        plan.print_report(&mut loud, true).unwrap();
        assert!(String::from_utf8(loud).unwrap().contains("Ignore demo: from /w/demo/Dockerfile: empty tag"));
    }
}
