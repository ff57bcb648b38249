//! CLI for the org URL migrator.
//!
//! Bulk-replaces an old organization URL/name with a new one across an org's
//! repositories, converts absolute LICENSE links to relative form, and opens
//! pull requests with an automatic fork fallback.

use clap::Parser;
use org_url_migrator::{RunSummary, Runner, RunnerConfig, RunnerError};
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Org URL Migrator - Rewrite org URLs and LICENSE links across an organization via PRs.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Organization whose repositories are processed.
    #[arg(long)]
    org: String,

    /// Literal string to replace (e.g. the old org name or base URL).
    #[arg(long)]
    old: String,

    /// Replacement string.
    #[arg(long)]
    new: String,

    /// GitHub Personal Access Token. Optional, but absent tokens mean
    /// anonymous rate limits and no push/PR access.
    #[arg(long, env = "GITHUB_TOKEN")]
    token: Option<String>,

    /// Only process these repository names within the org.
    #[arg(long, num_args = 1..)]
    repos: Vec<String>,

    /// Skip private repositories.
    #[arg(long)]
    only_public: bool,

    /// Include archived repositories.
    #[arg(long)]
    include_archived: bool,

    /// Maximum repositories to process.
    #[arg(long, default_value_t = 1000)]
    limit: usize,

    /// Branch name prefix.
    #[arg(long, default_value = "chore/update-org-urls")]
    branch_prefix: String,

    /// Seconds to sleep between repositories.
    #[arg(long, default_value_t = 2)]
    sleep: u64,

    /// Scan and report without creating branches, commits, pushes or PRs.
    #[arg(long)]
    dry_run: bool,

    /// Ask confirmation before committing per repository.
    #[arg(long)]
    confirm: bool,

    /// Always use the fork workflow even if push permission exists.
    #[arg(long)]
    always_fork: bool,

    /// Disable converting absolute LICENSE blob/raw links to relative ./LICENSE.
    #[arg(long)]
    no_convert_license_links: bool,

    /// Owner namespaces accepted in LICENSE links (default: derived from
    /// --old/--new).
    #[arg(long = "license-owner")]
    license_owners: Vec<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();

    match run(args).await {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::from(0)
        }
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        // Use compact formatting without module target paths for cleaner output
        .with(fmt::layer().compact().with_target(false))
        // Allow runtime log filtering via RUST_LOG env var (e.g., RUST_LOG=debug)
        // Falls back to "info" level if RUST_LOG is not set or invalid
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        // Register as the global default subscriber
        .init();
}

/// Main execution logic.
async fn run(args: Args) -> Result<RunSummary, RunnerError> {
    if args.token.is_none() {
        warn!("GITHUB_TOKEN not set. Set a PAT for better rate limits and PR creation.");
    }

    let config = RunnerConfig::new(args.org, args.old, args.new, args.token)
        .with_repos(args.repos)
        .with_only_public(args.only_public)
        .with_include_archived(args.include_archived)
        .with_limit(args.limit)
        .with_branch_prefix(args.branch_prefix)
        .with_delay(Duration::from_secs(args.sleep))
        .with_dry_run(args.dry_run)
        .with_confirm(args.confirm)
        .with_always_fork(args.always_fork)
        .with_convert_license_links(!args.no_convert_license_links)
        .with_license_owners(args.license_owners);

    let runner = Runner::new(config)?;
    runner.run().await
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    println!(
        "  Mode: {}",
        if summary.dry_run { "Dry Run" } else { "Live" }
    );
    println!(
        "  Repositories processed: {}",
        summary.repositories_processed
    );
    println!("  Repositories skipped: {}", summary.repositories_skipped);

    if summary.dry_run {
        println!("  Dry-run previews: {}", summary.dry_run_previews);
    } else {
        println!("  PRs created: {}", summary.prs_created);
        println!("  PRs already up to date: {}", summary.prs_existing);
    }
}
