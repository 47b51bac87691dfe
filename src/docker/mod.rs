// src/docker/mod.rs

//! Container-engine integration.
//!
//! - [`ContainerEngine`] is the seam to the `docker` binary; [`DockerCli`]
//!   is the production implementation and tests use a scripted fake.
//! - [`cleanup`] removes stale images and their containers before building.

pub mod cleanup;
pub mod cli;

use std::fmt::Debug;
use std::path::Path;

use thiserror::Error;

use crate::config::Credentials;
use crate::types::BoxFuture;

pub use cleanup::CleanupStage;
pub use cli::DockerCli;

/// A failed container-engine action.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Connection-level registry failure; pushes are retried on this.
    #[error("transient registry error: {0}")]
    Transient(String),

    #[error("`docker {action}` exited with status {code:?}: {stderr}")]
    Command {
        action: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("docker i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Transient(_))
    }

    /// Status code to report for a failed job; 1 when there is none.
    pub fn status_code(&self) -> i32 {
        match self {
            EngineError::Command {
                code: Some(code), ..
            } => *code,
            _ => 1,
        }
    }
}

/// A container as listed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    /// Image id (or `repo:tag`, depending on how it was started).
    pub image: String,
    pub name: String,
}

/// A local image as listed by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageInfo {
    pub id: String,
    /// `repository:tag`
    pub reference: String,
}

/// Container-engine actions used during a run.
pub trait ContainerEngine: Send + Sync + Debug {
    fn login<'a>(&'a self, credentials: &'a Credentials) -> BoxFuture<'a, Result<(), EngineError>>;

    fn logout(&self) -> BoxFuture<'_, Result<(), EngineError>>;

    /// Build without cache, always removing intermediate containers.
    fn build_image<'a>(
        &'a self,
        tag: &'a str,
        dockerfile: &'a Path,
        context: &'a Path,
    ) -> BoxFuture<'a, Result<(), EngineError>>;

    /// Single push attempt; connection failures map to [`EngineError::Transient`].
    fn push_image<'a>(
        &'a self,
        repository: &'a str,
        tag: &'a str,
    ) -> BoxFuture<'a, Result<(), EngineError>>;

    fn list_containers(&self) -> BoxFuture<'_, Result<Vec<ContainerInfo>, EngineError>>;

    fn list_images(&self) -> BoxFuture<'_, Result<Vec<ImageInfo>, EngineError>>;

    fn stop_container<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), EngineError>>;

    fn remove_container<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<(), EngineError>>;

    fn remove_image<'a>(&'a self, reference: &'a str) -> BoxFuture<'a, Result<(), EngineError>>;

    fn system_prune(&self) -> BoxFuture<'_, Result<(), EngineError>>;

    /// Create and push `name:latest` aggregating `members`.
    fn publish_manifest<'a>(
        &'a self,
        name: &'a str,
        members: &'a [String],
    ) -> BoxFuture<'a, Result<(), EngineError>>;
}

/// Split `repo:tag` into repository and tag.
///
/// The `:port` of a registry host is not a tag; references without a tag
/// default to `latest`.
pub fn split_image_tag(image: &str) -> (&str, &str) {
    match image.rsplit_once(':') {
        Some((repo, tag)) if !tag.is_empty() && !tag.contains('/') => (repo, tag),
        _ => (image, "latest"),
    }
}
