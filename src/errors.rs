// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::docker::EngineError;
use crate::git::RepoSyncError;

#[derive(Error, Debug)]
pub enum DockyardError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    RepoSync(#[from] RepoSyncError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, DockyardError>;
