#![allow(dead_code)]

use std::collections::BTreeMap;

use dockyard::config::{
    ConfigFile, ConfigSection, RawConfigFile, RawGitTrigger, RawRepoConfig, RawTargetConfig,
};
use dockyard::types::Arch;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Everything goes through `ConfigFile::try_from`, so built configs are
/// validated exactly like loaded ones.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection {
                    work_dir: "/work".to_string(),
                    ..ConfigSection::default()
                },
                repo: Vec::new(),
                git_trigger: BTreeMap::new(),
            },
        }
    }

    pub fn with_section(mut self, f: impl FnOnce(&mut ConfigSection)) -> Self {
        f(&mut self.config.config);
        self
    }

    pub fn with_repo(mut self, repo: RawRepoConfig) -> Self {
        self.config.repo.push(repo);
        self
    }

    /// Add a `[git_trigger.<dir>]` table.
    pub fn with_git_trigger(mut self, dir: &str, git: &str, triggers: &[(&str, &[&str])]) -> Self {
        let triggers = triggers
            .iter()
            .map(|(name, patterns)| {
                (
                    name.to_string(),
                    patterns.iter().map(|p| p.to_string()).collect(),
                )
            })
            .collect();
        self.config.git_trigger.insert(
            dir.to_string(),
            RawGitTrigger {
                git: git.to_string(),
                triggers,
            },
        );
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for a `[[repo]]` entry.
pub struct RepoBuilder {
    repo: RawRepoConfig,
}

impl RepoBuilder {
    pub fn new(git: &str, dir: &str) -> Self {
        Self {
            repo: RawRepoConfig {
                git: git.to_string(),
                dir: dir.to_string(),
                target: Vec::new(),
            },
        }
    }

    pub fn target(mut self, target: RawTargetConfig) -> Self {
        self.repo.target.push(target);
        self
    }

    pub fn build(self) -> RawRepoConfig {
        self.repo
    }
}

/// Builder for a `[[repo.target]]` entry.
pub struct TargetBuilder {
    target: RawTargetConfig,
}

impl TargetBuilder {
    pub fn new(registry: &str) -> Self {
        Self {
            target: RawTargetConfig {
                registry: registry.to_string(),
                triggers: Vec::new(),
                build: Vec::new(),
                manifest: Vec::new(),
            },
        }
    }

    pub fn trigger(mut self, pattern: &str) -> Self {
        self.target.triggers.push(pattern.to_string());
        self
    }

    pub fn build_entry(mut self, dockerfile: &str, template: &str) -> Self {
        self.target
            .build
            .push((dockerfile.to_string(), template.to_string()));
        self
    }

    pub fn manifest(mut self, arches: &[Arch]) -> Self {
        self.target.manifest.extend_from_slice(arches);
        self
    }

    pub fn build(self) -> RawTargetConfig {
        self.target
    }
}
