use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dockyard::git::{GitError, VersionControl};
use dockyard::types::BoxFuture;

#[derive(Debug, Clone)]
struct FakeRepo {
    work_tree: bool,
    clone_fails: bool,
    pull_fails: bool,
    head_before: String,
    head_after: String,
    pulled: bool,
    changed: BTreeSet<String>,
    describe: String,
    describe_nearest: String,
}

impl FakeRepo {
    fn checkout(head: &str) -> Self {
        Self {
            work_tree: true,
            clone_fails: false,
            pull_fails: false,
            head_before: head.to_string(),
            head_after: head.to_string(),
            pulled: false,
            changed: BTreeSet::new(),
            describe: String::new(),
            describe_nearest: String::new(),
        }
    }
}

fn command_failed(command: &str) -> GitError {
    GitError::Command {
        command: command.to_string(),
        code: Some(128),
        stderr: "fatal: scripted failure".to_string(),
    }
}

/// A scripted `VersionControl`.
///
/// Each checkout directory is scripted up front; directories that were
/// never scripted behave like an empty directory that clones fine. Every
/// clone and pull is recorded as `"clone <dir>"` / `"pull <dir>"`.
#[derive(Debug, Clone, Default)]
pub struct FakeVersionControl {
    repos: Arc<Mutex<HashMap<PathBuf, FakeRepo>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FakeVersionControl {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self, dir: impl AsRef<Path>, repo: FakeRepo) {
        self.repos
            .lock()
            .unwrap()
            .insert(dir.as_ref().to_path_buf(), repo);
    }

    fn edit(&self, dir: impl AsRef<Path>, f: impl FnOnce(&mut FakeRepo)) {
        let mut repos = self.repos.lock().unwrap();
        let repo = repos
            .entry(dir.as_ref().to_path_buf())
            .or_insert_with(|| FakeRepo::checkout("0000000000"));
        f(repo);
    }

    /// Existing checkout whose pull brings in `files`.
    pub fn with_changes(self, dir: impl AsRef<Path>, files: &[&str]) -> Self {
        let mut repo = FakeRepo::checkout("1111111111111111");
        repo.head_after = "2222222222222222".to_string();
        repo.changed = files.iter().map(|f| f.to_string()).collect();
        self.script(dir, repo);
        self
    }

    /// Existing checkout that is already up to date.
    pub fn with_unchanged(self, dir: impl AsRef<Path>) -> Self {
        self.script(dir, FakeRepo::checkout("1111111111111111"));
        self
    }

    /// Existing checkout whose pull fails.
    pub fn with_pull_failure(self, dir: impl AsRef<Path>) -> Self {
        let mut repo = FakeRepo::checkout("1111111111111111");
        repo.pull_fails = true;
        self.script(dir, repo);
        self
    }

    /// Not a checkout yet, and cloning into it fails.
    pub fn with_clone_failure(self, dir: impl AsRef<Path>) -> Self {
        let mut repo = FakeRepo::checkout("");
        repo.work_tree = false;
        repo.clone_fails = true;
        self.script(dir, repo);
        self
    }

    /// `git describe` output, full and `--abbrev=0`.
    pub fn with_describe(self, dir: impl AsRef<Path>, full: &str, nearest: &str) -> Self {
        self.edit(dir, |repo| {
            repo.describe = full.to_string();
            repo.describe_nearest = nearest.to_string();
        });
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn repo(&self, dir: &Path) -> Option<FakeRepo> {
        self.repos.lock().unwrap().get(dir).cloned()
    }
}

impl VersionControl for FakeVersionControl {
    fn is_work_tree<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, bool> {
        Box::pin(async move { self.repo(dir).is_some_and(|r| r.work_tree) })
    }

    fn clone_into<'a>(&'a self, _url: &'a str, dir: &'a Path) -> BoxFuture<'a, Result<(), GitError>> {
        Box::pin(async move {
            self.record(format!("clone {}", dir.display()));
            if self.repo(dir).is_some_and(|r| r.clone_fails) {
                return Err(command_failed("clone"));
            }
            self.edit(dir, |repo| repo.work_tree = true);
            Ok(())
        })
    }

    fn pull<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<(), GitError>> {
        Box::pin(async move {
            self.record(format!("pull {}", dir.display()));
            if self.repo(dir).is_some_and(|r| r.pull_fails) {
                return Err(command_failed("pull"));
            }
            self.edit(dir, |repo| repo.pulled = true);
            Ok(())
        })
    }

    fn head_commit<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<String, GitError>> {
        Box::pin(async move {
            let repo = self.repo(dir).ok_or_else(|| command_failed("rev-parse HEAD"))?;
            Ok(if repo.pulled {
                repo.head_after
            } else {
                repo.head_before
            })
        })
    }

    fn changed_files<'a>(
        &'a self,
        dir: &'a Path,
        _old: &'a str,
        _new: &'a str,
    ) -> BoxFuture<'a, Result<BTreeSet<String>, GitError>> {
        Box::pin(async move {
            self.repo(dir)
                .map(|r| r.changed)
                .ok_or_else(|| command_failed("diff"))
        })
    }

    fn describe<'a>(
        &'a self,
        dir: &'a Path,
        nearest_only: bool,
    ) -> BoxFuture<'a, Result<String, GitError>> {
        Box::pin(async move {
            let repo = self.repo(dir).ok_or_else(|| command_failed("describe"))?;
            let out = if nearest_only {
                repo.describe_nearest
            } else {
                repo.describe
            };
            if out.is_empty() {
                Err(command_failed("describe"))
            } else {
                Ok(out)
            }
        })
    }
}
