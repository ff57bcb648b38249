//! Terminal states of the per-repository workflow.

use serde::Serialize;

/// How processing one repository ended.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Nothing was published for this repository; carries the reason,
    /// whether benign (no occurrences) or a failure diagnostic.
    Skipped {
        /// Why the repository was skipped.
        reason: String,
    },

    /// Dry-run halt: eligible changes were found but intentionally not made.
    DryRun {
        /// Files with at least one occurrence.
        files: usize,
        /// Literal occurrence total.
        literal: usize,
        /// Blob-shape license link total.
        blob: usize,
        /// Raw-shape license link total.
        raw: usize,
    },

    /// A pull request exists for the pushed branch.
    Published {
        /// PR URL.
        url: String,
        /// True when an open PR for the same head/base already existed.
        existed: bool,
        /// True when the branch was pushed to a fork rather than origin.
        via_fork: bool,
    },
}
