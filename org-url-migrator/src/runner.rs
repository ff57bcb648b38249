//! Orchestrates a full migration run across an organization.
//!
//! Performs the fatal pre-flight checks (git present, acting identity,
//! organization), acquires the run-scoped workspace root, then drives every
//! target repository through the sync workflow strictly sequentially. The
//! workspace root is released unconditionally when the run ends.

use crate::discovery::{
    current_user_login, resolve_organization, resolve_targets, DiscoveryError, TargetFilters,
};
use crate::fork::DEFAULT_FORK_TIMEOUT;
use crate::git::GitWorkspace;
use crate::summary::RunSummary;
use crate::sync::{sync_repository, SyncOptions, SyncOutcome};
use crate::templates::TemplateRenderer;
use octocrab::Octocrab;
use std::time::Duration;
use tempfile::TempDir;
use tracing::{info, warn};

/// Configuration for a migration run.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Organization whose repositories are processed.
    org: String,
    /// Literal string to replace.
    old: String,
    /// Replacement string.
    new: String,
    /// Bearer token; optional, degrades rate limits when absent.
    token: Option<String>,
    /// Explicit repository names within the org; empty means list the org.
    repos: Vec<String>,
    /// Skip private repositories when listing.
    only_public: bool,
    /// Include archived repositories when listing.
    include_archived: bool,
    /// Maximum repositories to process.
    limit: usize,
    /// Branch name prefix.
    branch_prefix: String,
    /// Delay applied after every repository.
    delay: Duration,
    /// Scan and report only.
    dry_run: bool,
    /// Ask for confirmation before mutating each repository.
    confirm: bool,
    /// Always use the fork workflow.
    always_fork: bool,
    /// Enable license-link normalization.
    convert_license_links: bool,
    /// Owner namespaces accepted in license links.
    license_owners: Vec<String>,
}

impl RunnerConfig {
    /// Creates a configuration with defaults matching the standard run.
    pub fn new(org: String, old: String, new: String, token: Option<String>) -> Self {
        Self {
            org,
            old,
            new,
            token,
            repos: Vec::new(),
            only_public: false,
            include_archived: false,
            limit: 1000,
            branch_prefix: "chore/update-org-urls".to_string(),
            delay: Duration::from_secs(2),
            dry_run: false,
            confirm: false,
            always_fork: false,
            convert_license_links: true,
            license_owners: Vec::new(),
        }
    }

    /// Restricts the run to these repository names.
    pub fn with_repos(mut self, repos: Vec<String>) -> Self {
        self.repos = repos;
        self
    }

    /// Skips private repositories.
    pub fn with_only_public(mut self, only_public: bool) -> Self {
        self.only_public = only_public;
        self
    }

    /// Includes archived repositories.
    pub fn with_include_archived(mut self, include_archived: bool) -> Self {
        self.include_archived = include_archived;
        self
    }

    /// Caps the number of repositories processed.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Sets the branch name prefix.
    pub fn with_branch_prefix(mut self, branch_prefix: String) -> Self {
        self.branch_prefix = branch_prefix;
        self
    }

    /// Sets the inter-repository delay.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Enables dry-run mode.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enables the per-repository confirmation gate.
    pub fn with_confirm(mut self, confirm: bool) -> Self {
        self.confirm = confirm;
        self
    }

    /// Forces the fork workflow even with push permission.
    pub fn with_always_fork(mut self, always_fork: bool) -> Self {
        self.always_fork = always_fork;
        self
    }

    /// Enables or disables license-link normalization.
    pub fn with_convert_license_links(mut self, convert: bool) -> Self {
        self.convert_license_links = convert;
        self
    }

    /// Sets the owner namespaces accepted in license links.
    pub fn with_license_owners(mut self, owners: Vec<String>) -> Self {
        self.license_owners = owners;
        self
    }
}

/// Errors that abort the entire run before any repository is touched.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The git binary is not available.
    #[error("git executable not found in PATH")]
    GitUnavailable,

    /// GitHub API client initialization failed.
    #[error("failed to initialize GitHub client: {0}")]
    ClientInit(#[source] octocrab::Error),

    /// The acting identity could not be resolved.
    #[error("failed to resolve authenticated user: {0}")]
    Identity(#[source] DiscoveryError),

    /// The target organization could not be resolved.
    #[error("failed to access organization '{org}': {source}")]
    Organization {
        org: String,
        #[source]
        source: DiscoveryError,
    },

    /// Repository listing failed.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// The workspace root could not be created.
    #[error("failed to create workspace root: {0}")]
    Workspace(#[source] std::io::Error),
}

/// Orchestrates a full migration run.
pub struct Runner {
    config: RunnerConfig,
    octocrab: Octocrab,
    renderer: TemplateRenderer,
}

impl Runner {
    /// Builds a runner from the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::ClientInit`] if the GitHub client cannot be
    /// constructed.
    pub fn new(config: RunnerConfig) -> Result<Self, RunnerError> {
        let mut builder = Octocrab::builder();
        if let Some(token) = &config.token {
            builder = builder.personal_token(token.clone());
        }
        let octocrab = builder.build().map_err(RunnerError::ClientInit)?;
        Ok(Self {
            config,
            octocrab,
            renderer: TemplateRenderer::new(),
        })
    }

    /// Executes the run: pre-flight, target resolution, then one repository
    /// at a time through the sync workflow.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] only for fatal pre-flight failures; anything
    /// that goes wrong inside a repository is recorded in the summary.
    pub async fn run(&self) -> Result<RunSummary, RunnerError> {
        if !GitWorkspace::ensure_installed().await {
            return Err(RunnerError::GitUnavailable);
        }

        let login = current_user_login(&self.octocrab)
            .await
            .map_err(RunnerError::Identity)?;
        resolve_organization(&self.octocrab, &self.config.org)
            .await
            .map_err(|source| RunnerError::Organization {
                org: self.config.org.clone(),
                source,
            })?;

        let filters = TargetFilters {
            only_public: self.config.only_public,
            include_archived: self.config.include_archived,
            limit: self.config.limit,
        };
        let targets = resolve_targets(
            &self.octocrab,
            &self.config.org,
            &self.config.repos,
            filters,
            &login,
        )
        .await?;

        info!(
            org = %self.config.org,
            old = %self.config.old,
            new = %self.config.new,
            repos = targets.len(),
            acting_as = %login,
            dry_run = self.config.dry_run,
            "Starting run"
        );

        // Held for the whole run; dropped (and deleted) on every exit path.
        let workspace_root = tempfile::Builder::new()
            .prefix("org-url-migrator-")
            .tempdir()
            .map_err(RunnerError::Workspace)?;
        info!(workdir = %workspace_root.path().display(), "Workspace root created");

        let mut summary = RunSummary::new(self.config.dry_run);
        let options = SyncOptions {
            token: self.config.token.as_deref(),
            old: &self.config.old,
            new: &self.config.new,
            branch_prefix: &self.config.branch_prefix,
            dry_run: self.config.dry_run,
            confirm: self.config.confirm,
            always_fork: self.config.always_fork,
            convert_license_links: self.config.convert_license_links,
            license_owners: &self.config.license_owners,
            fork_timeout: DEFAULT_FORK_TIMEOUT,
        };

        for (index, target) in targets.iter().enumerate() {
            println!("{}", "-".repeat(70));
            println!(
                "[{}/{}] {} (default: {})",
                index + 1,
                targets.len(),
                target.full_name,
                target.default_branch
            );

            let outcome = sync_repository(
                &self.octocrab,
                &login,
                target,
                workspace_root.path(),
                &self.renderer,
                &options,
            )
            .await;
            report_outcome(&outcome);
            summary.record(&outcome);

            discard_workspace(workspace_root.path(), &target.name);

            // Rate-limit courtesy pacing, applied regardless of outcome.
            tokio::time::sleep(self.config.delay).await;
        }

        Ok(summary)
    }
}

/// Prints the human-readable outcome line for one repository.
fn report_outcome(outcome: &SyncOutcome) {
    match outcome {
        SyncOutcome::Skipped { reason } => println!("  Skipped: {reason}"),
        SyncOutcome::DryRun { files, .. } => {
            println!("  Dry-run preview complete ({files} file(s) would change)");
        }
        SyncOutcome::Published {
            url,
            existed: true,
            ..
        } => println!("  PR already exists: {url}"),
        SyncOutcome::Published { url, .. } => println!("  Created PR: {url}"),
    }
}

/// Removes one repository's workspace subdirectory.
fn discard_workspace(root: &std::path::Path, repo_name: &str) {
    let dir = root.join(repo_name);
    if dir.exists() {
        if let Err(e) = std::fs::remove_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "Failed to remove workspace");
        }
    }
}
