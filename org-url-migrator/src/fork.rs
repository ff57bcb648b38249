//! Fork resolution with bounded visibility polling.
//!
//! Ensures a fork of the upstream repository exists under the acting
//! identity. Freshly created forks are not immediately visible through the
//! API, so creation is followed by a fixed-interval poll up to a bounded
//! timeout.

use crate::discovery::RepositoryTarget;
use crate::rate_limit::ensure_core_rate_limit;
use octocrab::Octocrab;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

/// Interval between fork visibility polls.
const POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default bound on the visibility wait.
pub const DEFAULT_FORK_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors from fork resolution.
#[derive(Debug, Error)]
pub enum ForkError {
    /// The fork creation request failed.
    #[error("failed to create fork of {upstream}: {source}")]
    CreateFailed {
        upstream: String,
        #[source]
        source: octocrab::Error,
    },

    /// The fork never became visible within the timeout.
    #[error("fork {full_name} not visible after {timeout_secs}s (last error: {last_error})")]
    NotVisible {
        full_name: String,
        timeout_secs: u64,
        last_error: String,
    },

    /// GitHub API error outside creation/polling.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),
}

/// A resolved fork under the acting identity.
#[derive(Debug, Clone)]
pub struct ForkHandle {
    /// Fork owner login (the acting identity).
    pub owner: String,
    /// Fork repository name.
    pub name: String,
    /// Full name in "owner/name" format.
    pub full_name: String,
}

/// Ensures a fork of `upstream` exists under `login`.
///
/// Returns the fork and whether it was created by this call. An existing fork
/// is returned immediately; otherwise creation is requested and the fork is
/// polled for visibility every 2 seconds until `timeout` elapses.
///
/// # Errors
///
/// Returns [`ForkError`] if creation fails or the fork never becomes visible;
/// either is terminal for the calling repository.
pub async fn ensure_fork(
    octocrab: &Octocrab,
    upstream: &RepositoryTarget,
    login: &str,
    timeout: Duration,
) -> Result<(ForkHandle, bool), ForkError> {
    let handle = ForkHandle {
        owner: login.to_string(),
        name: upstream.name.clone(),
        full_name: format!("{login}/{}", upstream.name),
    };

    ensure_core_rate_limit(octocrab).await?;
    if octocrab.repos(login, &upstream.name).get().await.is_ok() {
        debug!(fork = %handle.full_name, "Fork already exists");
        return Ok((handle, false));
    }

    info!(upstream = %upstream.full_name, "Requesting fork creation");
    octocrab
        .repos(&upstream.owner, &upstream.name)
        .create_fork()
        .send()
        .await
        .map_err(|source| ForkError::CreateFailed {
            upstream: upstream.full_name.clone(),
            source,
        })?;

    let deadline = Instant::now() + timeout;
    let mut last_error = String::from("never polled");
    while Instant::now() < deadline {
        match octocrab.repos(login, &upstream.name).get().await {
            Ok(_) => {
                info!(fork = %handle.full_name, "Fork is visible");
                return Ok((handle, true));
            }
            Err(e) => {
                last_error = e.to_string();
                sleep(POLL_INTERVAL).await;
            }
        }
    }

    Err(ForkError::NotVisible {
        full_name: handle.full_name,
        timeout_secs: timeout.as_secs(),
        last_error,
    })
}
