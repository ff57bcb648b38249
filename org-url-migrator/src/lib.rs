#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod classify;
pub mod discovery;
pub mod encoding;
pub mod fork;
pub mod git;
pub mod license;
pub mod rate_limit;
pub mod rewrite;
pub mod runner;
pub mod scan;
pub mod summary;
pub mod sync;
pub mod templates;

pub use classify::is_eligible;
pub use discovery::{
    current_user_login, resolve_organization, resolve_targets, DiscoveryError, RepositoryTarget,
    TargetFilters,
};
pub use encoding::{decode, encode, TextEncoding};
pub use fork::{ensure_fork, ForkError, ForkHandle, DEFAULT_FORK_TIMEOUT};
pub use git::{remote_url, GitError, GitWorkspace};
pub use license::{owner_namespace, LicenseLinkRewriter};
pub use rate_limit::{check_core_rate_limit, ensure_core_rate_limit, wait_if_needed, RateLimitInfo};
pub use rewrite::{apply_rewrites, FileChange, RewriteOutcome};
pub use runner::{Runner, RunnerConfig, RunnerError};
pub use scan::{scan_repository, FileHits, ScanResult, SKIP_DIRS};
pub use summary::RunSummary;
pub use sync::{sync_repository, SyncError, SyncOptions, SyncOutcome};
pub use templates::{
    generate_branch_name, generate_pr_title, sanitize_branch_name, MessageContext, TemplateError,
    TemplateRenderer, FALLBACK_BRANCH_NAME,
};
