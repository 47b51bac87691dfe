// src/plan/exclusion.rs

//! Ordered exclusion rules applied to each `(target group, build entry)`.
//!
//! The rules run in the order of [`CHECKS`] and the first one that fires
//! decides the outcome.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use crate::fs::FileSystem;
use crate::trigger::TriggerDecision;
use crate::types::Arch;

use super::arch::dockerfile_arch;

/// Structured reason a build entry was left out of the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    EmptyTag,
    EmptyRegistry,
    NoChange,
    /// Holds the dockerfile path as written in the config.
    FileNotFound(String),
    ArchMismatch {
        expected: Arch,
        found: Option<Arch>,
    },
    DuplicateName(String),
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::EmptyTag => f.write_str("empty tag"),
            Exclusion::EmptyRegistry => f.write_str("empty registry"),
            Exclusion::NoChange => f.write_str("no changes"),
            Exclusion::FileNotFound(path) => write!(f, "file not found: {path}"),
            Exclusion::ArchMismatch { expected, found } => match found {
                Some(found) => write!(f, "architecture mismatch: {found} != {expected}"),
                None => write!(f, "architecture mismatch: none != {expected}"),
            },
            Exclusion::DuplicateName(name) => write!(f, "duplicate build name {name}"),
        }
    }
}

/// One `(target group, build entry)` under evaluation.
#[derive(Debug)]
pub struct Candidate<'a> {
    pub name: &'a str,
    pub tag: &'a str,
    pub registry: &'a str,
    /// Dockerfile path as written in the config.
    pub dockerfile_rel: &'a str,
    pub dockerfile: &'a Path,
    pub trigger: &'a TriggerDecision,
    /// The dockerfile itself is among the repository's changed files.
    pub dockerfile_changed: bool,
}

/// Run-wide inputs shared by every check.
#[derive(Debug)]
pub struct CheckEnv<'a> {
    pub fs: &'a dyn FileSystem,
    pub force: bool,
    pub arch_detect: bool,
    pub host_arch: Arch,
    pub registered: &'a HashSet<String>,
}

pub type Check = fn(&Candidate<'_>, &CheckEnv<'_>) -> Option<Exclusion>;

/// Exclusion rules in priority order.
pub const CHECKS: [(&str, Check); 6] = [
    ("empty-tag", empty_tag),
    ("empty-registry", empty_registry),
    ("no-change", no_change),
    ("file-not-found", file_not_found),
    ("arch-mismatch", arch_mismatch),
    ("duplicate-name", duplicate_name),
];

/// First exclusion that applies to `candidate`, if any.
pub fn first_exclusion(candidate: &Candidate<'_>, env: &CheckEnv<'_>) -> Option<Exclusion> {
    CHECKS.iter().find_map(|(_, check)| check(candidate, env))
}

fn empty_tag(c: &Candidate<'_>, _: &CheckEnv<'_>) -> Option<Exclusion> {
    c.tag.is_empty().then_some(Exclusion::EmptyTag)
}

fn empty_registry(c: &Candidate<'_>, _: &CheckEnv<'_>) -> Option<Exclusion> {
    c.registry.is_empty().then_some(Exclusion::EmptyRegistry)
}

fn no_change(c: &Candidate<'_>, env: &CheckEnv<'_>) -> Option<Exclusion> {
    let changed = env.force || c.dockerfile_changed || c.trigger.should_build;
    (!changed).then_some(Exclusion::NoChange)
}

fn file_not_found(c: &Candidate<'_>, env: &CheckEnv<'_>) -> Option<Exclusion> {
    (!env.fs.is_file(c.dockerfile)).then(|| Exclusion::FileNotFound(c.dockerfile_rel.to_string()))
}

fn arch_mismatch(c: &Candidate<'_>, env: &CheckEnv<'_>) -> Option<Exclusion> {
    if !env.arch_detect {
        return None;
    }
    // An unreadable dockerfile declares nothing, which is a mismatch.
    let found = env
        .fs
        .read_to_string(c.dockerfile)
        .ok()
        .and_then(|content| dockerfile_arch(&content));

    (found != Some(env.host_arch)).then_some(Exclusion::ArchMismatch {
        expected: env.host_arch,
        found,
    })
}

fn duplicate_name(c: &Candidate<'_>, env: &CheckEnv<'_>) -> Option<Exclusion> {
    env.registered
        .contains(c.name)
        .then(|| Exclusion::DuplicateName(c.name.to_string()))
}
