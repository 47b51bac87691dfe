// src/pipeline.rs

//! One complete run: login and repository syncs, trigger evaluation,
//! planning, cleanup, build/push execution, and the closing prune/logout.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::{ConfigFile, Credentials, read_credentials};
use crate::docker::{CleanupStage, ContainerEngine};
use crate::engine::{CorePipeline, PipelineEvent, RunSummary, Runtime};
use crate::errors::{DockyardError, Result};
use crate::exec::{PushRetry, RealJobBackend};
use crate::fs::FileSystem;
use crate::git::{SyncRequest, SyncedRepos, VersionControl, resolve_tags, sync_all};
use crate::plan::{BuildPlan, BuildPlanner, TagSet};
use crate::settings::Settings;
use crate::trigger::TriggerFlags;

/// Everything one run needs, with pluggable git/docker/filesystem backends.
#[derive(Debug)]
pub struct Pipeline {
    config: ConfigFile,
    settings: Settings,
    fs: Arc<dyn FileSystem>,
    vcs: Arc<dyn VersionControl>,
    engine: Arc<dyn ContainerEngine>,
    retry: PushRetry,
}

/// Side effects that still need undoing when a run ends, however it ends.
#[derive(Debug, Default)]
struct Session {
    logged_in: bool,
    builds_started: usize,
}

impl Pipeline {
    pub fn new(
        config: ConfigFile,
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        vcs: Arc<dyn VersionControl>,
        engine: Arc<dyn ContainerEngine>,
    ) -> Self {
        Self {
            config,
            settings,
            fs,
            vcs,
            engine,
            retry: PushRetry::default(),
        }
    }

    pub fn with_retry(mut self, retry: PushRetry) -> Self {
        self.retry = retry;
        self
    }

    /// Execute the run.
    ///
    /// Whatever happens inside, a configured prune runs if any build was
    /// started, and the registry session is closed.
    pub async fn run(&self) -> Result<RunSummary> {
        let mut session = Session::default();
        let result = self.execute(&mut session).await;

        if let Err(e) = &result {
            error!(error = %e, "run aborted");
            println!("Internal error: {e}");
        }
        self.finish(&session).await;

        result
    }

    /// Sync and plan without touching the container engine.
    pub async fn plan(&self) -> Result<BuildPlan> {
        let user = self.image_user()?;
        let synced = sync_all(Arc::clone(&self.vcs), self.sync_requests()).await;
        Ok(self.plan_from(&synced, &user).await)
    }

    async fn execute(&self, session: &mut Session) -> Result<RunSummary> {
        let (user, synced) = if self.settings.needs_login() {
            let credentials = read_credentials(self.fs.as_ref(), &self.settings.credentials)?;
            let (login, synced) = tokio::join!(
                self.engine.login(&credentials),
                sync_all(Arc::clone(&self.vcs), self.sync_requests())
            );
            login?;
            session.logged_in = true;
            info!(user = %credentials.user, "logged in to registry");
            (credentials.user, synced)
        } else {
            let user = self.image_user()?;
            (user, sync_all(Arc::clone(&self.vcs), self.sync_requests()).await)
        };

        let plan = self.plan_from(&synced, &user).await;

        print_plan(&plan, self.settings.verbose)?;

        if self.settings.dry_run || plan.is_empty() {
            return Ok(RunSummary::default());
        }

        let report = CleanupStage::new(self.engine.as_ref())
            .run(plan.names())
            .await;
        if self.settings.verbose {
            println!();
            println!("Docker prune in {} sec", report.elapsed.as_secs());
        }

        session.builds_started = plan.accepted.len();
        let summary = self.execute_plan(plan).await?;
        session.builds_started = summary.builds_started;

        summary.print(&mut io::stdout().lock())?;
        Ok(summary)
    }

    async fn execute_plan(&self, plan: BuildPlan) -> Result<RunSummary> {
        let (tx, rx) = mpsc::channel::<PipelineEvent>(64);
        let backend = RealJobBackend::new(Arc::clone(&self.engine), tx).with_retry(self.retry);
        let core = CorePipeline::new(plan.accepted, plan.manifests, self.settings.pipeline_options());
        Runtime::new(core, rx, backend).run().await
    }

    async fn finish(&self, session: &Session) {
        if self.settings.prune && session.builds_started > 0 {
            println!("Run system prune...");
            if let Err(e) = self.engine.system_prune().await {
                warn!(error = %e, "system prune failed");
            }
        }
        if session.logged_in {
            if let Err(e) = self.engine.logout().await {
                warn!(error = %e, "logout failed");
            }
        }
    }

    /// Image namespace when no login happens: the config user, or the
    /// credentials user if a credentials file is readable.
    fn image_user(&self) -> Result<String> {
        if !self.settings.auto_push {
            return Ok(self.settings.user.clone());
        }
        match read_credentials(self.fs.as_ref(), &self.settings.credentials) {
            Ok(Credentials { user, .. }) => Ok(user),
            Err(DockyardError::ConfigError(msg)) => {
                warn!(%msg, "using configured user for image names");
                Ok(self.settings.user.clone())
            }
            Err(e) => Err(e),
        }
    }

    /// Repositories first so their checkout directories win over git-trigger
    /// directories for the same URL.
    fn sync_requests(&self) -> Vec<SyncRequest> {
        let repos = self
            .config
            .repos
            .iter()
            .map(|r| SyncRequest::new(&r.git, self.settings.work_dir.join(&r.dir)));
        let triggers = self
            .config
            .git_triggers
            .iter()
            .filter(|t| !t.triggers.is_empty())
            .map(|t| SyncRequest::new(&t.git, self.settings.triggers_dir.join(&t.dir)));
        repos.chain(triggers).collect()
    }

    async fn plan_from(&self, synced: &SyncedRepos, user: &str) -> BuildPlan {
        if self.settings.verbose {
            println!("Architecture: {}", self.settings.host_arch);
        }

        let flags = TriggerFlags::from_git_triggers(&self.config.git_triggers, synced);
        if self.settings.verbose && !flags.is_empty() {
            let shown: Vec<String> = flags.iter().map(|(k, v)| format!("{k}={v}")).collect();
            println!("git-triggers: {}", shown.join(", "));
        }

        let mut tags_by_url: HashMap<&str, TagSet> = HashMap::new();
        let mut planner = BuildPlanner::new(self.fs.as_ref(), self.settings.planner_options(user));

        if synced.is_empty() && !self.config.repos.is_empty() {
            warn!("no repository could be synced");
        }

        for repo in &self.config.repos {
            let Some(state) = synced.get(&repo.git) else {
                match synced.failure(&repo.git) {
                    Some(e) => {
                        warn!(url = %repo.git, error = %e, "skipping targets of unsynced repository")
                    }
                    None => warn!(url = %repo.git, "skipping targets of unsynced repository"),
                }
                continue;
            };
            if !tags_by_url.contains_key(repo.git.as_str()) {
                let tags = resolve_tags(self.vcs.as_ref(), &state.dir, self.settings.host_arch).await;
                tags_by_url.insert(repo.git.as_str(), tags);
            }
            if let Some(tags) = tags_by_url.get(repo.git.as_str()) {
                planner.plan_repository(repo, state, tags, &flags);
            }
        }

        planner.finish()
    }
}

fn print_plan(plan: &BuildPlan, verbose: bool) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    plan.print_report(&mut stdout, verbose)?;
    if plan.is_empty() {
        writeln!(stdout)?;
        writeln!(stdout, "Nothing to do")?;
    }
    Ok(())
}
