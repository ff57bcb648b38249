//! Target repository resolution via the GitHub API.
//!
//! Resolves the acting identity, the organization and the set of repositories
//! to process, either by listing the organization or from an explicit list of
//! repository names.

use crate::rate_limit::ensure_core_rate_limit;
use octocrab::models::Repository;
use octocrab::Octocrab;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur while resolving repositories.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),
}

/// A repository selected for processing.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryTarget {
    /// Repository owner (the organization).
    pub owner: String,

    /// Repository name.
    pub name: String,

    /// Full repository name in "owner/name" format.
    pub full_name: String,

    /// Default branch name (e.g., "main").
    pub default_branch: String,

    /// Whether the acting identity can push directly to this repository.
    pub can_push: bool,
}

/// Filters applied when listing an organization's repositories.
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetFilters {
    /// Skip private repositories.
    pub only_public: bool,
    /// Include archived repositories.
    pub include_archived: bool,
    /// Stop after this many repositories.
    pub limit: usize,
}

/// Resolves the login of the authenticated (or anonymous) acting identity.
///
/// # Errors
///
/// Returns [`DiscoveryError`] if the current user cannot be resolved; this is
/// a fatal pre-flight failure for the run.
pub async fn current_user_login(octocrab: &Octocrab) -> Result<String, DiscoveryError> {
    let user = octocrab.current().user().await?;
    Ok(user.login)
}

/// Verifies that the target organization exists and is accessible.
///
/// # Errors
///
/// Returns [`DiscoveryError`] if the organization cannot be fetched; this is
/// a fatal pre-flight failure for the run.
pub async fn resolve_organization(octocrab: &Octocrab, org: &str) -> Result<(), DiscoveryError> {
    octocrab.orgs(org).get().await?;
    Ok(())
}

/// Resolves the repositories to process.
///
/// With an explicit name list, each repository is fetched individually and
/// failures skip that name with a warning. Otherwise the organization listing
/// is paginated, always excluding forks, excluding archived repositories
/// unless requested, excluding private repositories in only-public mode, and
/// honoring the processing limit.
pub async fn resolve_targets(
    octocrab: &Octocrab,
    org: &str,
    explicit: &[String],
    filters: TargetFilters,
    login: &str,
) -> Result<Vec<RepositoryTarget>, DiscoveryError> {
    if !explicit.is_empty() {
        return resolve_explicit(octocrab, org, explicit, login).await;
    }

    info!(org, "Listing organization repositories");
    let mut targets = Vec::new();

    let mut page = octocrab
        .orgs(org)
        .list_repos()
        .per_page(100)
        .send()
        .await?;

    loop {
        for repo in &page.items {
            if targets.len() >= filters.limit {
                debug!(limit = filters.limit, "Reached processing limit");
                return Ok(targets);
            }
            if let Some(target) = filter_repository(repo, filters, login) {
                targets.push(target);
            }
        }

        ensure_core_rate_limit(octocrab).await?;
        match octocrab.get_page::<Repository>(&page.next).await? {
            Some(next) => page = next,
            None => break,
        }
    }

    Ok(targets)
}

/// Fetches each explicitly named repository within the organization.
async fn resolve_explicit(
    octocrab: &Octocrab,
    org: &str,
    names: &[String],
    login: &str,
) -> Result<Vec<RepositoryTarget>, DiscoveryError> {
    let mut targets = Vec::new();
    for name in names {
        match octocrab.repos(org, name).get().await {
            Ok(repo) => targets.push(into_target(&repo, login)),
            Err(e) => {
                warn!(repo = format!("{org}/{name}"), error = %e, "Skipping repository");
            }
        }
    }
    Ok(targets)
}

/// Applies listing filters, returning the target when the repository passes.
fn filter_repository(
    repo: &Repository,
    filters: TargetFilters,
    login: &str,
) -> Option<RepositoryTarget> {
    if repo.fork.unwrap_or(false) {
        return None;
    }
    if !filters.include_archived && repo.archived.unwrap_or(false) {
        return None;
    }
    if filters.only_public && repo.private.unwrap_or(false) {
        return None;
    }
    Some(into_target(repo, login))
}

/// Converts an API repository into a processing target.
fn into_target(repo: &Repository, login: &str) -> RepositoryTarget {
    let owner = repo
        .owner
        .as_ref()
        .map(|o| o.login.clone())
        .unwrap_or_default();
    let full_name = repo
        .full_name
        .clone()
        .unwrap_or_else(|| format!("{owner}/{}", repo.name));

    RepositoryTarget {
        can_push: can_push(repo, login),
        owner,
        name: repo.name.clone(),
        full_name,
        default_branch: repo
            .default_branch
            .clone()
            .unwrap_or_else(|| "main".to_string()),
    }
}

/// Infers whether the acting identity can push directly.
///
/// Prefers the per-repository permission flags; falls back to comparing the
/// repository owner against the acting login.
fn can_push(repo: &Repository, login: &str) -> bool {
    if let Some(permissions) = &repo.permissions {
        return permissions.push || permissions.admin;
    }
    repo.owner
        .as_ref()
        .map(|o| o.login == login)
        .unwrap_or(false)
}
