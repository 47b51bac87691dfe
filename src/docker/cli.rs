// src/docker/cli.rs

use std::path::Path;
use std::process::Stdio;
use std::sync::LazyLock;

use regex::Regex;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use super::{ContainerEngine, ContainerInfo, EngineError, ImageInfo};
use crate::config::Credentials;
use crate::types::BoxFuture;

// Connection-level failures reported by `docker push`.
static TRANSIENT_PUSH_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(connection (refused|reset)|broken pipe|i/o timeout|tls handshake timeout|no such host|unexpected eof|temporary failure in name resolution|server misbehaving)",
    )
    .unwrap()
});

/// Whether `docker push` stderr describes a connection failure worth retrying.
pub fn is_transient_push_error(stderr: &str) -> bool {
    TRANSIENT_PUSH_ERROR.is_match(stderr)
}

/// [`ContainerEngine`] backed by the `docker` binary on `PATH`.
#[derive(Debug, Clone, Default)]
pub struct DockerCli;

impl DockerCli {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, args: &[&str]) -> Result<String, EngineError> {
        debug!(?args, "running docker");
        let output = Command::new("docker")
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            return Err(command_error(args, output.status.code(), &output.stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn command_error(args: &[&str], code: Option<i32>, stderr: &[u8]) -> EngineError {
    EngineError::Command {
        action: args.first().copied().unwrap_or_default().to_string(),
        code,
        stderr: String::from_utf8_lossy(stderr).trim().to_string(),
    }
}

impl ContainerEngine for DockerCli {
    fn login<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            let args = ["login", "-u", credentials.user.as_str(), "--password-stdin"];
            let mut child = Command::new("docker")
                .args(args)
                .stdin(Stdio::piped())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()?;

            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(credentials.password.as_bytes()).await?;
                stdin.shutdown().await?;
            }

            let output = child.wait_with_output().await?;
            if !output.status.success() {
                return Err(command_error(&args, output.status.code(), &output.stderr));
            }
            Ok(())
        })
    }

    fn logout(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        Box::pin(async move {
            self.run(&["logout"]).await?;
            Ok(())
        })
    }

    fn build_image<'a>(
        &'a self,
        tag: &'a str,
        dockerfile: &'a Path,
        context: &'a Path,
    ) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            let dockerfile = dockerfile.to_string_lossy().into_owned();
            let context = context.to_string_lossy().into_owned();
            self.run(&[
                "build",
                "--no-cache",
                "--rm",
                "--force-rm",
                "-t",
                tag,
                "-f",
                dockerfile.as_str(),
                context.as_str(),
            ])
            .await?;
            Ok(())
        })
    }

    fn push_image<'a>(
        &'a self,
        repository: &'a str,
        tag: &'a str,
    ) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            let reference = format!("{repository}:{tag}");
            match self.run(&["push", reference.as_str()]).await {
                Err(EngineError::Command { stderr, .. }) if is_transient_push_error(&stderr) => {
                    Err(EngineError::Transient(stderr))
                }
                other => other.map(|_| ()),
            }
        })
    }

    fn list_containers(&self) -> BoxFuture<'_, Result<Vec<ContainerInfo>, EngineError>> {
        Box::pin(async move {
            let out = self
                .run(&["ps", "-a", "--format", "{{.Image}} {{.Names}}"])
                .await?;
            Ok(parse_pairs(&out)
                .map(|(image, name)| ContainerInfo { image, name })
                .collect())
        })
    }

    fn list_images(&self) -> BoxFuture<'_, Result<Vec<ImageInfo>, EngineError>> {
        Box::pin(async move {
            let out = self
                .run(&["images", "--format", "{{.ID}} {{.Repository}}:{{.Tag}}"])
                .await?;
            Ok(parse_pairs(&out)
                .map(|(id, reference)| ImageInfo { id, reference })
                .collect())
        })
    }

    fn stop_container<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            self.run(&["stop", name]).await?;
            Ok(())
        })
    }

    fn remove_container<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            self.run(&["rm", name]).await?;
            Ok(())
        })
    }

    fn remove_image<'a>(&'a self, reference: &'a str) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            self.run(&["rmi", reference]).await?;
            Ok(())
        })
    }

    fn system_prune(&self) -> BoxFuture<'_, Result<(), EngineError>> {
        Box::pin(async move {
            self.run(&["system", "prune", "-f"]).await?;
            Ok(())
        })
    }

    fn publish_manifest<'a>(
        &'a self,
        name: &'a str,
        members: &'a [String],
    ) -> BoxFuture<'a, Result<(), EngineError>> {
        Box::pin(async move {
            let latest = format!("{name}:latest");
            let mut create = vec!["manifest", "create", "--amend", latest.as_str()];
            create.extend(members.iter().map(String::as_str));
            self.run(&create).await?;
            self.run(&["manifest", "push", "--purge", latest.as_str()])
                .await?;
            Ok(())
        })
    }
}

/// Parse `"<first> <rest>"` lines, skipping blank or malformed ones.
fn parse_pairs(out: &str) -> impl Iterator<Item = (String, String)> + '_ {
    out.lines().filter_map(|line| {
        let (first, rest) = line.trim().split_once(' ')?;
        Some((first.to_string(), rest.trim().to_string()))
    })
}
