// src/git/mod.rs

//! Repository synchronisation.
//!
//! - [`VersionControl`] is the seam to the `git` binary; [`GitCli`] is the
//!   production implementation and tests substitute a scripted fake.
//! - [`sync`] clones or pulls working trees and reports what changed.
//! - [`tags`] resolves the commit/tag values used in image tag templates.

pub mod cli;
pub mod sync;
pub mod tags;

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::path::Path;

use thiserror::Error;

use crate::types::BoxFuture;

pub use cli::GitCli;
pub use sync::{SyncRequest, SyncedRepo, SyncedRepos, sync_all, sync_repository};
pub use tags::resolve_tags;

/// A failed `git` invocation.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("git i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("`git {command}` exited with status {code:?}: {stderr}")]
    Command {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

/// A repository could not be brought up to date. Its targets are skipped
/// for this run; other repositories are unaffected.
#[derive(Debug, Error)]
pub enum RepoSyncError {
    #[error("cloning {url} into {dir} failed: {source}")]
    Clone {
        url: String,
        dir: String,
        #[source]
        source: GitError,
    },

    #[error("pulling {url} in {dir} failed: {source}")]
    Pull {
        url: String,
        dir: String,
        #[source]
        source: GitError,
    },
}

/// Version-control operations used during a run.
pub trait VersionControl: Send + Sync + Debug {
    /// Whether `dir` is the root of a usable git working tree.
    fn is_work_tree<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, bool>;

    /// Clone `url` into `dir`, replacing whatever is there.
    fn clone_into<'a>(&'a self, url: &'a str, dir: &'a Path) -> BoxFuture<'a, Result<(), GitError>>;

    fn pull<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<(), GitError>>;

    /// Full hash of `HEAD`.
    fn head_commit<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<String, GitError>>;

    /// Paths touched between two commits.
    fn changed_files<'a>(
        &'a self,
        dir: &'a Path,
        old: &'a str,
        new: &'a str,
    ) -> BoxFuture<'a, Result<BTreeSet<String>, GitError>>;

    /// `git describe`, or `git describe --abbrev=0` when `nearest_only`.
    fn describe<'a>(
        &'a self,
        dir: &'a Path,
        nearest_only: bool,
    ) -> BoxFuture<'a, Result<String, GitError>>;
}
