// src/config/validate.rs

use tracing::warn;

use crate::config::model::{
    BuildEntry, ConfigFile, ConfigSection, GitTriggerConfig, RawConfigFile, RawGitTrigger,
    RawRepoConfig, RawTargetConfig, RepoConfig, TargetConfig,
};
use crate::errors::{DockyardError, Result};
use crate::plan::TagTemplate;
use crate::trigger::TriggerPattern;
use crate::types::Arch;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = DockyardError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let config = validate_global_config(raw.config)?;

        let repos = raw
            .repo
            .iter()
            .enumerate()
            .map(|(idx, repo)| convert_repo(idx, repo))
            .collect::<Result<Vec<_>>>()?;

        let git_triggers = raw
            .git_trigger
            .iter()
            .map(|(dir, trigger)| convert_git_trigger(dir, trigger))
            .collect::<Result<Vec<_>>>()?;

        Ok(ConfigFile::new_unchecked(config, repos, git_triggers))
    }
}

fn validate_global_config(mut section: ConfigSection) -> Result<ConfigSection> {
    check_slots(&section)?;

    if !section.auto_push && section.remove_after_push {
        warn!("auto_push is disabled; turning off remove_after_push as well");
        section.remove_after_push = false;
    }

    Ok(section)
}

fn check_slots(section: &ConfigSection) -> Result<()> {
    if section.max_build == 0 {
        return Err(DockyardError::ConfigError(
            "[config].max_build must be >= 1 (got 0)".to_string(),
        ));
    }
    if section.max_push == 0 {
        return Err(DockyardError::ConfigError(
            "[config].max_push must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn check_repo_identity(idx: usize, git: &str, dir: &str) -> Result<()> {
    if git.trim().is_empty() {
        return Err(DockyardError::ConfigError(format!(
            "repo #{} has an empty `git` url",
            idx + 1
        )));
    }
    if dir.trim().is_empty() {
        return Err(DockyardError::ConfigError(format!(
            "repo '{}' has an empty `dir`",
            git
        )));
    }
    Ok(())
}

fn convert_repo(idx: usize, raw: &RawRepoConfig) -> Result<RepoConfig> {
    check_repo_identity(idx, &raw.git, &raw.dir)?;

    let targets = raw
        .target
        .iter()
        .map(|target| convert_target(&raw.git, target))
        .collect::<Result<Vec<_>>>()?;

    Ok(RepoConfig {
        git: raw.git.clone(),
        dir: raw.dir.clone(),
        targets,
    })
}

fn convert_target(repo: &str, raw: &RawTargetConfig) -> Result<TargetConfig> {
    let builds = raw
        .build
        .iter()
        .map(|(dockerfile, template)| {
            let template = TagTemplate::parse(template).map_err(|e| {
                DockyardError::ConfigError(format!(
                    "repo '{}', registry '{}': {}",
                    repo, raw.registry, e
                ))
            })?;
            Ok(BuildEntry {
                dockerfile: dockerfile.clone(),
                template,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if raw.manifest.contains(&Arch::Unknown) {
        return Err(DockyardError::ConfigError(format!(
            "repo '{}', registry '{}': manifest entries must be one of amd64, arm64v8, arm32v7",
            repo, raw.registry
        )));
    }

    Ok(TargetConfig {
        registry: raw.registry.clone(),
        triggers: raw.triggers.iter().map(|t| TriggerPattern::parse(t)).collect(),
        builds,
        manifest: raw.manifest.clone(),
    })
}

fn convert_git_trigger(dir: &str, raw: &RawGitTrigger) -> Result<GitTriggerConfig> {
    if raw.git.trim().is_empty() {
        return Err(DockyardError::ConfigError(format!(
            "[git_trigger.{}] has an empty `git` url",
            dir
        )));
    }

    let triggers = raw
        .triggers
        .iter()
        .map(|(name, patterns)| {
            let patterns = patterns.iter().map(|p| TriggerPattern::parse(p)).collect();
            (name.clone(), patterns)
        })
        .collect();

    Ok(GitTriggerConfig {
        dir: dir.to_string(),
        git: raw.git.clone(),
        triggers,
    })
}
