//! Repository synchronization error types.

use crate::fork::ForkError;
use crate::git::GitError;
use crate::templates::TemplateError;
use thiserror::Error;

/// Errors that can occur while synchronizing one repository.
///
/// Every variant is terminal for that repository only; the batch continues.
#[derive(Debug, Error)]
pub enum SyncError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),

    /// Git subprocess error.
    #[error(transparent)]
    Git(#[from] GitError),

    /// Fork resolution error.
    #[error(transparent)]
    Fork(#[from] ForkError),

    /// Message rendering error.
    #[error(transparent)]
    Template(#[from] TemplateError),

    /// License-link pattern compilation error.
    #[error("failed to build license link patterns: {0}")]
    Pattern(#[from] regex::Error),

    /// A push was rejected by the remote.
    #[error("push to {remote} rejected for branch {branch}")]
    PushRejected { remote: String, branch: String },
}
