//! Run summary accounting.

use crate::sync::SyncOutcome;

/// Summary of a complete run across all repositories.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Repositories driven through the workflow.
    pub repositories_processed: usize,

    /// Repositories that ended in a skipped state.
    pub repositories_skipped: usize,

    /// Repositories halted by dry-run after a non-empty scan.
    pub dry_run_previews: usize,

    /// Pull requests created by this run.
    pub prs_created: usize,

    /// Repositories where an open pull request already existed.
    pub prs_existing: usize,

    /// Whether this was a dry run.
    pub dry_run: bool,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Updates the summary with one repository's outcome.
    pub fn record(&mut self, outcome: &SyncOutcome) {
        self.repositories_processed += 1;
        match outcome {
            SyncOutcome::Skipped { .. } => self.repositories_skipped += 1,
            SyncOutcome::DryRun { .. } => self.dry_run_previews += 1,
            SyncOutcome::Published { existed: true, .. } => self.prs_existing += 1,
            SyncOutcome::Published { existed: false, .. } => self.prs_created += 1,
        }
    }

    /// Pull requests created or confirmed up to date by this run.
    #[must_use]
    pub fn prs_published(&self) -> usize {
        self.prs_created + self.prs_existing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_outcomes() {
        let mut summary = RunSummary::new(false);

        summary.record(&SyncOutcome::Skipped {
            reason: "no occurrences".to_string(),
        });
        summary.record(&SyncOutcome::Published {
            url: "https://github.com/acme/widgets/pull/1".to_string(),
            existed: false,
            via_fork: true,
        });
        summary.record(&SyncOutcome::Published {
            url: "https://github.com/acme/gears/pull/7".to_string(),
            existed: true,
            via_fork: false,
        });

        assert_eq!(summary.repositories_processed, 3);
        assert_eq!(summary.repositories_skipped, 1);
        assert_eq!(summary.prs_created, 1);
        assert_eq!(summary.prs_existing, 1);
        assert_eq!(summary.prs_published(), 2);
    }

    #[test]
    fn records_dry_run_preview() {
        let mut summary = RunSummary::new(true);
        summary.record(&SyncOutcome::DryRun {
            files: 3,
            literal: 5,
            blob: 1,
            raw: 0,
        });

        assert_eq!(summary.dry_run_previews, 1);
        assert_eq!(summary.prs_published(), 0);
    }
}
