// src/git/sync.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use super::{RepoSyncError, VersionControl};
use crate::types::ChangeResult;

/// Bring `dir` up to date with `url` and report what changed.
///
/// - `dir` is not a working tree: clone into it and return
///   [`ChangeResult::Unknown`].
/// - Otherwise pull, then diff the pre-pull and post-pull `HEAD`. A no-op
///   pull, or a `HEAD` that cannot be read, yields an empty change set.
pub async fn sync_repository(
    vcs: &dyn VersionControl,
    url: &str,
    dir: &Path,
) -> Result<ChangeResult, RepoSyncError> {
    if !vcs.is_work_tree(dir).await {
        info!(url, dir = %dir.display(), "cloning repository");
        vcs.clone_into(url, dir)
            .await
            .map_err(|source| RepoSyncError::Clone {
                url: url.to_string(),
                dir: dir.display().to_string(),
                source,
            })?;
        return Ok(ChangeResult::Unknown);
    }

    let before = vcs.head_commit(dir).await;
    vcs.pull(dir).await.map_err(|source| RepoSyncError::Pull {
        url: url.to_string(),
        dir: dir.display().to_string(),
        source,
    })?;
    let after = vcs.head_commit(dir).await;

    let (old, new) = match (before, after) {
        (Ok(old), Ok(new)) => (old, new),
        (Err(e), _) | (_, Err(e)) => {
            warn!(url, error = %e, "cannot read HEAD; treating repository as unchanged");
            return Ok(ChangeResult::unchanged());
        }
    };

    if old == new {
        debug!(url, commit = %new, "repository already up to date");
        return Ok(ChangeResult::unchanged());
    }

    match vcs.changed_files(dir, &old, &new).await {
        Ok(files) => {
            info!(url, from = %old, to = %new, changed = files.len(), "pulled new commits");
            Ok(ChangeResult::Files(files))
        }
        Err(e) => {
            warn!(url, error = %e, "cannot diff pulled commits; treating repository as unchanged");
            Ok(ChangeResult::unchanged())
        }
    }
}

/// One repository to bring up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub url: String,
    pub dir: PathBuf,
}

impl SyncRequest {
    pub fn new(url: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            dir: dir.into(),
        }
    }
}

/// A successfully synced repository, shared by every target group and
/// git-trigger that references its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncedRepo {
    pub dir: PathBuf,
    pub changes: ChangeResult,
}

/// Outcome of syncing every repository of a run, keyed by git URL.
#[derive(Debug, Default)]
pub struct SyncedRepos {
    repos: HashMap<String, SyncedRepo>,
    failed: HashMap<String, RepoSyncError>,
}

impl SyncedRepos {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synced state of `url`; `None` if it failed or was never requested.
    pub fn get(&self, url: &str) -> Option<&SyncedRepo> {
        self.repos.get(url)
    }

    pub fn failure(&self, url: &str) -> Option<&RepoSyncError> {
        self.failed.get(url)
    }

    pub fn insert(&mut self, url: impl Into<String>, repo: SyncedRepo) {
        self.repos.insert(url.into(), repo);
    }

    pub fn insert_failure(&mut self, url: impl Into<String>, err: RepoSyncError) {
        self.failed.insert(url.into(), err);
    }

    pub fn len(&self) -> usize {
        self.repos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repos.is_empty()
    }
}

/// Sync every requested repository concurrently and wait for all of them.
///
/// Requests are deduplicated by URL: the first request for a URL decides
/// its directory, and later requests for the same URL share that result.
/// Failures are logged and recorded; they never abort the run.
pub async fn sync_all(vcs: Arc<dyn VersionControl>, requests: Vec<SyncRequest>) -> SyncedRepos {
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    let mut set = JoinSet::new();

    for req in requests {
        if let Some(first_dir) = seen.get(&req.url) {
            if first_dir != &req.dir {
                warn!(
                    url = %req.url,
                    dir = %req.dir.display(),
                    using = %first_dir.display(),
                    "repository listed twice; reusing the first checkout"
                );
            }
            continue;
        }
        seen.insert(req.url.clone(), req.dir.clone());

        let vcs = Arc::clone(&vcs);
        set.spawn(async move {
            let result = sync_repository(vcs.as_ref(), &req.url, &req.dir).await;
            (req, result)
        });
    }

    let mut synced = SyncedRepos::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((req, Ok(changes))) => synced.insert(
                req.url,
                SyncedRepo {
                    dir: req.dir,
                    changes,
                },
            ),
            Ok((req, Err(e))) => {
                error!(url = %req.url, error = %e, "repository sync failed; skipping its targets");
                synced.insert_failure(req.url, e);
            }
            Err(e) => error!(error = %e, "repository sync task panicked"),
        }
    }

    synced
}
