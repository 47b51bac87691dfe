// src/git/cli.rs

use std::collections::BTreeSet;
use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use super::{GitError, VersionControl};
use crate::types::BoxFuture;

/// [`VersionControl`] backed by the `git` binary on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, dir: Option<&Path>, args: &[&str]) -> Result<String, GitError> {
        let mut cmd = Command::new("git");
        if let Some(dir) = dir {
            cmd.arg("-C").arg(dir);
        }
        cmd.args(args)
            .stdin(Stdio::null())
            .env("GIT_TERMINAL_PROMPT", "0");

        debug!(?dir, ?args, "running git");
        let output = cmd.output().await?;

        if !output.status.success() {
            return Err(GitError::Command {
                command: args.join(" "),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VersionControl for GitCli {
    fn is_work_tree<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, bool> {
        Box::pin(async move {
            // `status` alone would also succeed for a plain directory nested
            // inside some other checkout.
            if tokio::fs::metadata(dir.join(".git")).await.is_err() {
                return false;
            }
            self.run(Some(dir), &["status", "--porcelain"]).await.is_ok()
        })
    }

    fn clone_into<'a>(&'a self, url: &'a str, dir: &'a Path) -> BoxFuture<'a, Result<(), GitError>> {
        Box::pin(async move {
            if tokio::fs::metadata(dir).await.is_ok() {
                tokio::fs::remove_dir_all(dir).await?;
            }
            if let Some(parent) = dir.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }

            let target = dir.to_string_lossy().into_owned();
            self.run(None, &["clone", url, target.as_str()]).await?;
            Ok(())
        })
    }

    fn pull<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<(), GitError>> {
        Box::pin(async move {
            self.run(Some(dir), &["pull"]).await?;
            Ok(())
        })
    }

    fn head_commit<'a>(&'a self, dir: &'a Path) -> BoxFuture<'a, Result<String, GitError>> {
        Box::pin(async move {
            let out = self.run(Some(dir), &["rev-parse", "HEAD"]).await?;
            Ok(out.trim().to_string())
        })
    }

    fn changed_files<'a>(
        &'a self,
        dir: &'a Path,
        old: &'a str,
        new: &'a str,
    ) -> BoxFuture<'a, Result<BTreeSet<String>, GitError>> {
        Box::pin(async move {
            let out = self
                .run(Some(dir), &["diff", "-z", "--name-only", old, new])
                .await?;
            Ok(parse_name_list(&out))
        })
    }

    fn describe<'a>(
        &'a self,
        dir: &'a Path,
        nearest_only: bool,
    ) -> BoxFuture<'a, Result<String, GitError>> {
        Box::pin(async move {
            let args: &[&str] = if nearest_only {
                &["describe", "--abbrev=0"]
            } else {
                &["describe"]
            };
            let out = self.run(Some(dir), args).await?;
            Ok(out.trim().to_string())
        })
    }
}

/// Split NUL-separated `diff -z --name-only` output.
fn parse_name_list(out: &str) -> BTreeSet<String> {
    out.split('\0')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_list_is_nul_separated() {
        let files = parse_name_list("src/main.rs\0Dockerfile.amd64\0\0");
        assert_eq!(files.len(), 2);
        assert!(files.contains("src/main.rs"));
        assert!(files.contains("Dockerfile.amd64"));
    }

    #[test]
    fn paths_with_spaces_survive() {
        let files = parse_name_list("docs/read me.md\0");
        assert!(files.contains("docs/read me.md"));
    }
}
