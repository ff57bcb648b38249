//! Per-repository synchronization workflow.
//!
//! Drives one repository through: clone, scan, dry-run halt, branch, rewrite,
//! commit, push (with fork fallback), PR dedup and creation. Every failure is
//! terminal for that repository only and surfaces as a skipped outcome with a
//! diagnostic; the batch always continues.

mod error;
mod outcome;

pub use error::SyncError;
pub use outcome::SyncOutcome;

use crate::discovery::RepositoryTarget;
use crate::fork::ensure_fork;
use crate::git::{remote_url, GitWorkspace};
use crate::license::{owner_namespace, LicenseLinkRewriter};
use crate::rate_limit::ensure_core_rate_limit;
use crate::rewrite::apply_rewrites;
use crate::scan::{scan_repository, ScanResult};
use crate::templates::{generate_branch_name, generate_pr_title, MessageContext, TemplateRenderer};
use octocrab::params::State;
use octocrab::Octocrab;
use std::io::{BufRead, Write};
use std::path::Path;
use std::time::Duration;
use tracing::{info, info_span, warn, Instrument};

/// Number of changed files listed in the printed scan summary.
const SCAN_SUMMARY_FILE_LIMIT: usize = 20;

/// Run options consumed by the per-repository workflow.
#[derive(Debug, Clone)]
pub struct SyncOptions<'a> {
    /// Bearer token, when available; embedded into clone/push URLs.
    pub token: Option<&'a str>,
    /// Literal string to replace.
    pub old: &'a str,
    /// Replacement string.
    pub new: &'a str,
    /// Branch name prefix.
    pub branch_prefix: &'a str,
    /// Scan and report only.
    pub dry_run: bool,
    /// Ask for confirmation before mutating each repository.
    pub confirm: bool,
    /// Use the fork workflow even with push permission.
    pub always_fork: bool,
    /// Enable license-link normalization.
    pub convert_license_links: bool,
    /// Owner namespaces accepted in license links; when empty, they are
    /// derived from the old and new literals.
    pub license_owners: &'a [String],
    /// Bound on the fork visibility wait.
    pub fork_timeout: Duration,
}

/// Runs the full workflow for one repository.
///
/// The workspace is created under `workspace_root` and is exclusively owned
/// by this call; the caller discards it after the outcome is returned.
pub async fn sync_repository(
    octocrab: &Octocrab,
    login: &str,
    target: &RepositoryTarget,
    workspace_root: &Path,
    renderer: &TemplateRenderer,
    options: &SyncOptions<'_>,
) -> SyncOutcome {
    let span = info_span!("sync", repo = %target.full_name);
    async {
        match run_workflow(octocrab, login, target, workspace_root, renderer, options).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Repository skipped");
                SyncOutcome::Skipped {
                    reason: e.to_string(),
                }
            }
        }
    }
    .instrument(span)
    .await
}

async fn run_workflow(
    octocrab: &Octocrab,
    login: &str,
    target: &RepositoryTarget,
    workspace_root: &Path,
    renderer: &TemplateRenderer,
    options: &SyncOptions<'_>,
) -> Result<SyncOutcome, SyncError> {
    let workspace_dir = workspace_root.join(&target.name);
    if workspace_dir.exists() {
        let _ = std::fs::remove_dir_all(&workspace_dir);
    }

    // Cloned
    let clone_url = remote_url(&target.full_name, options.token);
    let git = GitWorkspace::clone_shallow(&clone_url, &workspace_dir).await?;

    // Scanned
    let license = if options.convert_license_links {
        let fallback;
        let owners = if options.license_owners.is_empty() {
            // Literals may be bare org names or base URLs; either way the
            // owner namespace is their last path segment.
            fallback = [
                owner_namespace(options.old).to_string(),
                owner_namespace(options.new).to_string(),
            ];
            &fallback[..]
        } else {
            options.license_owners
        };
        Some(LicenseLinkRewriter::new(&target.name, owners)?)
    } else {
        None
    };

    let scan = scan_repository(git.root(), options.old, license.as_ref());
    if scan.is_empty() {
        info!("No occurrences found");
        return Ok(SyncOutcome::Skipped {
            reason: "no occurrences of old URL or LICENSE links".to_string(),
        });
    }
    print_scan_summary(&scan);

    // DryRunHalt
    let (literal, blob, raw) = scan.totals();
    if options.dry_run {
        println!("  DRY-RUN: not creating branch / committing / pushing / PR.");
        return Ok(SyncOutcome::DryRun {
            files: scan.file_count(),
            literal,
            blob,
            raw,
        });
    }

    if options.confirm && !prompt_confirmation() {
        return Ok(SyncOutcome::Skipped {
            reason: "declined by user".to_string(),
        });
    }

    // Branched
    let branch = generate_branch_name(options.branch_prefix, options.old, options.new);
    git.checkout(&target.default_branch).await?;
    git.fetch_best_effort("origin", &target.default_branch).await;
    git.checkout_or_create_branch(&branch, &target.default_branch)
        .await?;

    // Rewritten
    let rewrite = apply_rewrites(git.root(), options.old, options.new, license.as_ref());
    if rewrite.is_empty() {
        info!("No diff after applying replacements");
        return Ok(SyncOutcome::Skipped {
            reason: "no diff after applying replacements".to_string(),
        });
    }

    // Committed
    let context = MessageContext {
        old: options.old.to_string(),
        new: options.new.to_string(),
        literal_total: rewrite.literal_total,
        blob_total: rewrite.blob_total,
        raw_total: rewrite.raw_total,
        license_enabled: options.convert_license_links,
    };
    git.configure_identity("org-url-migrator", "bot@org-url-migrator")
        .await?;
    git.stage_all().await?;
    if !git.has_staged_diff().await? {
        // A previous partial run may already have pushed identical content.
        info!("Nothing staged to commit");
        return Ok(SyncOutcome::Skipped {
            reason: "nothing staged to commit".to_string(),
        });
    }
    git.commit(&renderer.render_commit_message(&context)?)
        .await?;

    // Pushed / Forked
    let use_fork = options.always_fork || !target.can_push;
    let mut pr_head = branch.clone();
    let mut via_fork = false;

    if use_fork {
        push_via_fork(octocrab, login, target, &git, &branch, options, &mut pr_head).await?;
        via_fork = true;
    } else if !git.push("origin", &branch).await? {
        warn!("Push to origin failed, falling back to fork");
        push_via_fork(octocrab, login, target, &git, &branch, options, &mut pr_head).await?;
        via_fork = true;
    }

    // PRPublished
    let (url, existed) =
        publish_pull_request(octocrab, target, &pr_head, renderer, &context).await?;
    Ok(SyncOutcome::Published {
        url,
        existed,
        via_fork,
    })
}

/// Resolves a fork, binds it as the `fork` remote and pushes the branch there.
///
/// On success `pr_head` becomes `<forkOwner>:<branch>`.
async fn push_via_fork(
    octocrab: &Octocrab,
    login: &str,
    target: &RepositoryTarget,
    git: &GitWorkspace,
    branch: &str,
    options: &SyncOptions<'_>,
    pr_head: &mut String,
) -> Result<(), SyncError> {
    let (fork, created) = ensure_fork(octocrab, target, login, options.fork_timeout).await?;
    info!(fork = %fork.full_name, created, "Using fork");

    let fork_url = remote_url(&fork.full_name, options.token);
    git.add_or_update_remote("fork", &fork_url).await?;
    if !git.push("fork", branch).await? {
        return Err(SyncError::PushRejected {
            remote: "fork".to_string(),
            branch: branch.to_string(),
        });
    }
    *pr_head = fork_head(&fork.owner, branch);
    Ok(())
}

/// Head reference for a branch that lives on a fork.
fn fork_head(fork_owner: &str, branch: &str) -> String {
    format!("{fork_owner}:{branch}")
}

/// An open or freshly created pull request.
#[derive(Debug, Clone)]
pub(crate) struct PullRequestRef {
    pub number: u64,
    pub url: String,
}

/// The slice of the hosting API the publishing step talks to.
///
/// Implemented by [`Octocrab`]; tests substitute an in-memory host to drive
/// the dedup decision without a network.
pub(crate) trait PullRequestHost {
    async fn find_open_pr(
        &self,
        target: &RepositoryTarget,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequestRef>, SyncError>;

    async fn create_pr(
        &self,
        target: &RepositoryTarget,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequestRef, SyncError>;
}

impl PullRequestHost for Octocrab {
    async fn find_open_pr(
        &self,
        target: &RepositoryTarget,
        head: &str,
        base: &str,
    ) -> Result<Option<PullRequestRef>, SyncError> {
        ensure_core_rate_limit(self).await?;

        let page = self
            .pulls(&target.owner, &target.name)
            .list()
            .state(State::Open)
            .head(head)
            .base(base)
            .per_page(1)
            .send()
            .await?;

        Ok(page.items.first().map(|pr| PullRequestRef {
            number: pr.number,
            url: pr_url(pr.html_url.as_ref(), &target.full_name, pr.number),
        }))
    }

    async fn create_pr(
        &self,
        target: &RepositoryTarget,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PullRequestRef, SyncError> {
        let pr = self
            .pulls(&target.owner, &target.name)
            .create(title, head, base)
            .body(body)
            .send()
            .await?;

        Ok(PullRequestRef {
            number: pr.number,
            url: pr_url(pr.html_url.as_ref(), &target.full_name, pr.number),
        })
    }
}

/// API responses may omit `html_url`; fall back to the canonical form.
fn pr_url(html_url: Option<&url::Url>, full_name: &str, number: u64) -> String {
    html_url
        .map(|u| u.to_string())
        .unwrap_or_else(|| format!("https://github.com/{full_name}/pull/{number}"))
}

/// Finds an open PR for the head/base pair, or creates one.
///
/// Returns the PR URL and whether it already existed.
async fn publish_pull_request<H: PullRequestHost>(
    host: &H,
    target: &RepositoryTarget,
    pr_head: &str,
    renderer: &TemplateRenderer,
    context: &MessageContext,
) -> Result<(String, bool), SyncError> {
    if let Some(pr) = host
        .find_open_pr(target, pr_head, &target.default_branch)
        .await?
    {
        info!(url = %pr.url, "PR already exists");
        return Ok((pr.url, true));
    }

    let body = renderer.render_pr_body(context)?;
    let pr = host
        .create_pr(
            target,
            &generate_pr_title(),
            &body,
            pr_head,
            &target.default_branch,
        )
        .await?;
    info!(url = %pr.url, "Created PR");
    Ok((pr.url, false))
}

/// Prints the per-repository scan summary with the first changed files.
fn print_scan_summary(scan: &ScanResult) {
    let (literal, blob, raw) = scan.totals();
    println!(
        "  Scan summary: files={}, old_url_hits={literal}, license_blob_hits={blob}, license_raw_hits={raw}",
        scan.file_count()
    );

    for (path, hits) in scan.files.iter().take(SCAN_SUMMARY_FILE_LIMIT) {
        let mut parts = Vec::new();
        if hits.literal > 0 {
            parts.push(format!("old:{}", hits.literal));
        }
        if hits.license_blob > 0 {
            parts.push(format!("blob:{}", hits.license_blob));
        }
        if hits.license_raw > 0 {
            parts.push(format!("raw:{}", hits.license_raw));
        }
        println!("    - {} ({})", path.display(), parts.join(", "));
    }
    if scan.file_count() > SCAN_SUMMARY_FILE_LIMIT {
        println!(
            "    ... and {} more files",
            scan.file_count() - SCAN_SUMMARY_FILE_LIMIT
        );
    }
}

/// Asks the operator whether to proceed with this repository.
fn prompt_confirmation() -> bool {
    print!("  Proceed? [y/N]: ");
    let _ = std::io::stdout().flush();

    let mut answer = String::new();
    if std::io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
