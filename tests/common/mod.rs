#![allow(dead_code)]

use std::path::PathBuf;

use dockyard::fs::mock::MockFileSystem;
use dockyard::git::{SyncedRepo, SyncedRepos};
use dockyard::plan::{BuildPlan, PlannerOptions};
use dockyard::types::{Arch, ChangeResult};

pub const WORK_DIR: &str = "/work";

/// A `FROM` line for `arch`, as found in arch-specific dockerfiles.
pub fn dockerfile_for(arch: Arch) -> String {
    format!("FROM {}/debian:bookworm\nRUN apt-get update\n", arch.as_str())
}

/// Mock filesystem with the work dir in place and `files` written below it.
pub fn work_fs(files: &[(&str, String)]) -> MockFileSystem {
    let fs = MockFileSystem::new();
    fs.add_dir(WORK_DIR);
    for (path, content) in files {
        fs.add_file(PathBuf::from(WORK_DIR).join(path), content.clone());
    }
    fs
}

pub fn synced(url: &str, dir: &str, changes: ChangeResult) -> (SyncedRepos, SyncedRepo) {
    let repo = SyncedRepo {
        dir: PathBuf::from(WORK_DIR).join(dir),
        changes,
    };
    let mut all = SyncedRepos::new();
    all.insert(url, repo.clone());
    (all, repo)
}

pub fn options(host_arch: Arch) -> PlannerOptions {
    PlannerOptions {
        user: String::new(),
        force: false,
        arch_detect: true,
        host_arch,
    }
}

pub fn accepted_names(plan: &BuildPlan) -> Vec<&str> {
    plan.accepted.iter().map(|t| t.name.as_str()).collect()
}
