//! Branch names, commit messages and PR text.
//!
//! Message bodies are rendered with Handlebars from a per-repository count
//! context; branch names are sanitized to git's allowed character set and
//! validated with `gix-validate` before use.

use bstr::BStr;
use handlebars::{no_escape, Handlebars};
use serde_json::json;

/// Branch name used when sanitization produces nothing usable.
pub const FALLBACK_BRANCH_NAME: &str = "update-urls";

/// Template rendering error.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// Handlebars rendering error.
    #[error("Template rendering error: {0}")]
    RenderError(#[from] handlebars::RenderError),
}

/// Counts and literals substituted into commit and PR text.
#[derive(Debug, Clone)]
pub struct MessageContext {
    pub old: String,
    pub new: String,
    pub literal_total: usize,
    pub blob_total: usize,
    pub raw_total: usize,
    /// Whether license-link conversion was enabled for the run.
    pub license_enabled: bool,
}

const COMMIT_MESSAGE_TEMPLATE: &str = "\
chore: update org URLs and normalize LICENSE links

Changes:
{{#if literal_total}}- Replaced {{literal_total}} occurrence(s) of
  {{old}}
  with
  {{new}}{{else}}- (No org URL replacements){{/if}}
{{#if license_enabled}}{{#if license_total}}- Converted LICENSE links: blob={{blob_total}}, raw={{raw_total}}{{else}}- (No LICENSE link conversions){{/if}}{{else}}- LICENSE link conversion disabled{{/if}}

Reason: organization rename + prefer stable relative license links.";

const PR_BODY_TEMPLATE: &str = "\
This PR updates explicit org URLs and converts absolute LICENSE links to relative form.

Org URL replacements: {{literal_total}}
LICENSE link conversions (blob): {{blob_total}}
LICENSE link conversions (raw): {{raw_total}}

Old base: {{old}}
New base: {{new}}

Relative ./LICENSE links stay correct if branches or hosts change.";

/// Renders commit messages and PR bodies.
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Creates a renderer with markdown-safe settings.
    #[must_use]
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        // Markdown output, no HTML entity escaping
        handlebars.register_escape_fn(no_escape);
        handlebars.set_strict_mode(true);
        Self { handlebars }
    }

    /// Renders the commit message for a repository's changes.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_commit_message(&self, context: &MessageContext) -> Result<String, TemplateError> {
        Ok(self
            .handlebars
            .render_template(COMMIT_MESSAGE_TEMPLATE, &self.data(context))?)
    }

    /// Renders the pull request body for a repository's changes.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_pr_body(&self, context: &MessageContext) -> Result<String, TemplateError> {
        Ok(self
            .handlebars
            .render_template(PR_BODY_TEMPLATE, &self.data(context))?)
    }

    fn data(&self, context: &MessageContext) -> serde_json::Value {
        json!({
            "old": context.old,
            "new": context.new,
            "literal_total": context.literal_total,
            "blob_total": context.blob_total,
            "raw_total": context.raw_total,
            "license_total": context.blob_total + context.raw_total,
            "license_enabled": context.license_enabled,
        })
    }
}

/// Generates the pull request title.
#[must_use]
pub fn generate_pr_title() -> String {
    "chore: replace org URLs and LICENSE links".to_string()
}

/// Generates the deterministic branch name for a migration.
///
/// Format: `<prefix>/from-<old>-to-<new>`, with URL schemes stripped from the
/// literals, slashes flattened and the whole name sanitized.
#[must_use]
pub fn generate_branch_name(prefix: &str, old: &str, new: &str) -> String {
    let tail = |s: &str| {
        s.rsplit("://")
            .next()
            .unwrap_or(s)
            .replace('/', "-")
    };
    sanitize_branch_name(&format!("{prefix}/from-{}-to-{}", tail(old), tail(new)))
}

/// Sanitizes an arbitrary string into a valid branch name.
///
/// Keeps `[A-Za-z0-9._/-]`, replaces everything else with `-`, collapses
/// repeated separators and trims them from both ends. Anything git would
/// still reject, and the empty string, falls back to
/// [`FALLBACK_BRANCH_NAME`].
#[must_use]
pub fn sanitize_branch_name(input: &str) -> String {
    let mut safe: String = input
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '/' | '-') {
                ch
            } else {
                '-'
            }
        })
        .collect();

    while safe.contains("--") {
        safe = safe.replace("--", "-");
    }
    while safe.contains("//") {
        safe = safe.replace("//", "/");
    }
    let safe = safe.trim_matches(['-', '/']);

    if safe.is_empty()
        || gix_validate::reference::name_partial(BStr::new(safe.as_bytes())).is_err()
    {
        return FALLBACK_BRANCH_NAME.to_string();
    }
    safe.to_string()
}
