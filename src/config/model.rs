// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::plan::TagTemplate;
use crate::trigger::TriggerPattern;
use crate::types::Arch;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// work_dir = "/srv/dockyard"
/// max_build = 2
///
/// [[repo]]
/// git = "https://example.com/app.git"
/// dir = "app"
///
/// [[repo.target]]
/// registry = "app"
/// triggers = ["entrypoint.sh", "src*", "*shared"]
/// build = [["Dockerfile.amd64", "{arch}"]]
///
/// [git_trigger.shared]
/// git = "https://example.com/shared.git"
/// triggers = { shared = ["lib/*"] }
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Global behaviour from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Tracked repositories from `[[repo]]`.
    #[serde(default)]
    pub repo: Vec<RawRepoConfig>,

    /// Git-trigger repositories from `[git_trigger.<dir>]`, sorted by `<dir>`.
    ///
    /// Keys are checkout directories below `<work_dir>/<triggers>`.
    #[serde(default)]
    pub git_trigger: BTreeMap<String, RawGitTrigger>,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Directory holding the repository checkouts. May be overridden with `-p`.
    #[serde(default)]
    pub work_dir: String,

    /// Subdirectory of `work_dir` for git-trigger checkouts.
    #[serde(default = "default_triggers_dir")]
    pub triggers: String,

    /// Image namespace. Replaced by the login user when `auto_push` is on.
    #[serde(default)]
    pub user: String,

    /// File with `user password` on its first line. Relative paths are
    /// resolved against `work_dir`.
    #[serde(default = "default_credentials")]
    pub credentials: String,

    /// Skip dockerfiles whose `FROM` architecture differs from the host's.
    #[serde(default = "default_true")]
    pub arch_detect: bool,

    #[serde(default = "default_true")]
    pub auto_push: bool,

    /// Remove local images once they are pushed.
    #[serde(default = "default_true")]
    pub remove_after_push: bool,

    /// Remove pushed images immediately instead of at the end of the run.
    ///
    /// A later build in the same run that uses a removed image as its base
    /// will have to pull it again (or fail).
    #[serde(default)]
    pub remove_fast: bool,

    /// Concurrent builds.
    #[serde(default = "default_slots")]
    pub max_build: usize,

    /// Concurrent pushes.
    #[serde(default = "default_slots")]
    pub max_push: usize,

    #[serde(default)]
    pub force: bool,

    /// Run `docker system prune -f` if anything was built.
    #[serde(default)]
    pub prune: bool,
}

fn default_triggers_dir() -> String {
    ".triggers".to_string()
}

fn default_credentials() -> String {
    ".docker_credentials".to_string()
}

fn default_true() -> bool {
    true
}

fn default_slots() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            work_dir: String::new(),
            triggers: default_triggers_dir(),
            user: String::new(),
            credentials: default_credentials(),
            arch_detect: true,
            auto_push: true,
            remove_after_push: true,
            remove_fast: false,
            max_build: default_slots(),
            max_push: default_slots(),
            force: false,
            prune: false,
        }
    }
}

/// `[[repo]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRepoConfig {
    pub git: String,
    /// Checkout directory, relative to `work_dir`.
    pub dir: String,
    #[serde(default)]
    pub target: Vec<RawTargetConfig>,
}

/// `[[repo.target]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawTargetConfig {
    pub registry: String,

    /// Files or flags whose change triggers a rebuild.
    #[serde(default)]
    pub triggers: Vec<String>,

    /// `[dockerfile, tag template]` pairs.
    #[serde(default)]
    pub build: Vec<(String, String)>,

    /// Architectures aggregated into a `latest` multi-arch manifest.
    #[serde(default)]
    pub manifest: Vec<Arch>,
}

/// `[git_trigger.<dir>]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGitTrigger {
    pub git: String,
    #[serde(default)]
    pub triggers: BTreeMap<String, Vec<String>>,
}

/// Validated configuration.
///
/// Construct it through `ConfigFile::try_from(RawConfigFile)` (see
/// `validate.rs`) or [`super::load_and_validate`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub repos: Vec<RepoConfig>,
    pub git_triggers: Vec<GitTriggerConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        repos: Vec<RepoConfig>,
        git_triggers: Vec<GitTriggerConfig>,
    ) -> Self {
        Self {
            config,
            repos,
            git_triggers,
        }
    }

    /// Total number of `(target, build)` entries across all repositories.
    pub fn build_entry_count(&self) -> usize {
        self.repos
            .iter()
            .flat_map(|r| r.targets.iter())
            .map(|t| t.builds.len())
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct RepoConfig {
    pub git: String,
    pub dir: String,
    pub targets: Vec<TargetConfig>,
}

#[derive(Debug, Clone)]
pub struct TargetConfig {
    pub registry: String,
    pub triggers: Vec<TriggerPattern>,
    pub builds: Vec<BuildEntry>,
    pub manifest: Vec<Arch>,
}

#[derive(Debug, Clone)]
pub struct BuildEntry {
    /// Dockerfile path relative to the repository root.
    pub dockerfile: String,
    pub template: TagTemplate,
}

#[derive(Debug, Clone)]
pub struct GitTriggerConfig {
    /// Checkout directory, relative to `<work_dir>/<triggers>`.
    pub dir: String,
    pub git: String,
    pub triggers: BTreeMap<String, Vec<TriggerPattern>>,
}
