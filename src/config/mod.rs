// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - `model.rs`: the TOML-backed data model and its validated counterpart.
//! - `loader.rs`: reading a config file from disk.
//! - `validate.rs`: `RawConfigFile -> ConfigFile` conversion and checks.
//! - `credentials.rs`: the registry credentials file.

pub mod credentials;
pub mod loader;
pub mod model;
pub mod validate;

pub use credentials::{Credentials, read_credentials};
pub use loader::{load_and_validate, load_from_path};
pub use model::{
    BuildEntry, ConfigFile, ConfigSection, GitTriggerConfig, RawConfigFile, RawGitTrigger,
    RawRepoConfig, RawTargetConfig, RepoConfig, TargetConfig,
};
