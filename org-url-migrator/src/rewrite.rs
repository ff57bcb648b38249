//! The mutation pass: literal substitution plus license-link normalization.
//!
//! Re-walks the tree with the same eligibility and ignore rules as the
//! scanner, rewrites each file in memory and persists it in its original
//! encoding only when the content actually changed. Applying the pass twice
//! in a row leaves the tree untouched on the second run.

use crate::classify::is_eligible;
use crate::encoding::{decode, encode};
use crate::license::LicenseLinkRewriter;
use crate::scan::is_skipped_dir;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One rewritten file with the number of substitutions per category.
#[derive(Debug, Clone)]
pub struct FileChange {
    /// Path relative to the repository root.
    pub path: PathBuf,
    pub literal: usize,
    pub license_blob: usize,
    pub license_raw: usize,
}

/// Everything the mutation pass changed, plus per-category totals.
#[derive(Debug, Clone, Default)]
pub struct RewriteOutcome {
    pub changes: Vec<FileChange>,
    pub literal_total: usize,
    pub blob_total: usize,
    pub raw_total: usize,
}

impl RewriteOutcome {
    /// Returns true when no file content changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Applies the literal substitution and, when a rewriter is supplied, the
/// license-link normalization to every eligible file under `root`.
///
/// A file is recorded iff its content differs after transformation; a match
/// whose substitution is a no-op (e.g. `old == new`) produces no record. Write
/// failures are logged and isolated to the affected file.
pub fn apply_rewrites(
    root: &Path,
    old: &str,
    new: &str,
    license: Option<&LicenseLinkRewriter>,
) -> RewriteOutcome {
    let mut outcome = RewriteOutcome::default();

    for entry in WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !is_eligible(path) {
            continue;
        }

        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Skipping unreadable file");
                continue;
            }
        };
        let (original, encoding) = decode(&data);

        let mut text = original.clone();
        let mut literal = 0;
        if text.contains(old) {
            literal = text.matches(old).count();
            text = text.replace(old, new);
        }

        let mut blob = 0;
        let mut raw = 0;
        if let Some(rewriter) = license {
            let (rewritten, blob_n, raw_n) = rewriter.rewrite(&text);
            text = rewritten;
            blob = blob_n;
            raw = raw_n;
        }

        if text == original {
            continue;
        }

        let Some(bytes) = encode(&text, encoding) else {
            warn!(
                path = %path.display(),
                "Replacement not representable in file encoding, skipping file"
            );
            continue;
        };
        if let Err(e) = std::fs::write(path, bytes) {
            warn!(path = %path.display(), error = %e, "Failed to write file, skipping");
            continue;
        }

        let rel = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        outcome.literal_total += literal;
        outcome.blob_total += blob;
        outcome.raw_total += raw;
        outcome.changes.push(FileChange {
            path: rel,
            literal,
            license_blob: blob,
            license_raw: raw,
        });
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn rewriter() -> LicenseLinkRewriter {
        LicenseLinkRewriter::new("Repo", &["OldOrg".to_string()]).unwrap()
    }

    #[test]
    fn replaces_all_literal_occurrences() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.md");
        fs::write(&path, "OldOrg and OldOrg and OldOrg").unwrap();

        let outcome = apply_rewrites(dir.path(), "OldOrg", "NewOrg", None);
        assert_eq!(outcome.literal_total, 3);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, "NewOrg and NewOrg and NewOrg");
        assert_eq!(content.matches("NewOrg").count(), 3);
        assert!(!content.contains("OldOrg"));
    }

    #[test]
    fn second_pass_changes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.md");
        fs::write(
            &path,
            "OldOrg says [License](https://github.com/OldOrg/Repo/blob/main/LICENSE.md)",
        )
        .unwrap();

        let first = apply_rewrites(dir.path(), "OldOrg", "NewOrg", Some(&rewriter()));
        assert!(!first.is_empty());

        let second = apply_rewrites(dir.path(), "OldOrg", "NewOrg", Some(&rewriter()));
        assert!(second.is_empty());
        assert_eq!(second.literal_total, 0);
        assert_eq!(second.blob_total, 0);
    }

    #[test]
    fn noop_substitution_produces_no_record() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("doc.md");
        fs::write(&path, "SameOrg everywhere").unwrap();

        let outcome = apply_rewrites(dir.path(), "SameOrg", "SameOrg", None);
        assert!(outcome.is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "SameOrg everywhere");
    }

    #[test]
    fn untouched_files_are_not_recorded() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("hit.txt"), "OldOrg").unwrap();
        fs::write(dir.path().join("miss.txt"), "unrelated").unwrap();

        let outcome = apply_rewrites(dir.path(), "OldOrg", "NewOrg", None);
        assert_eq!(outcome.changes.len(), 1);
        assert_eq!(outcome.changes[0].path, PathBuf::from("hit.txt"));
    }

    #[test]
    fn latin1_file_keeps_its_encoding() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("legacy.txt");
        fs::write(&path, b"caf\xE9 OldOrg").unwrap();

        let outcome = apply_rewrites(dir.path(), "OldOrg", "NewOrg", None);
        assert_eq!(outcome.literal_total, 1);
        assert_eq!(fs::read(&path).unwrap(), b"caf\xE9 NewOrg");
    }
}
