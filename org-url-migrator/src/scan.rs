//! Read-only occurrence scanning over a cloned repository.
//!
//! Walks the tree once, counting literal occurrences of the old string and
//! license-link matches per file. Nothing is ever written during a scan; the
//! result only drives reporting and the decision to proceed.

use crate::classify::is_eligible;
use crate::encoding::decode;
use crate::license::LicenseLinkRewriter;
use bstr::ByteSlice;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Directories pruned from every walk: VCS metadata, dependency trees, build
/// output and caches.
pub const SKIP_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "vendor",
    "dist",
    "build",
    ".venv",
    ".mypy_cache",
    ".pytest_cache",
    "__pycache__",
    "out",
    "target",
];

/// Per-file occurrence counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileHits {
    /// Literal occurrences of the old string.
    pub literal: usize,
    /// Blob-shape license links.
    pub license_blob: usize,
    /// Raw-shape license links.
    pub license_raw: usize,
}

impl FileHits {
    fn any(&self) -> bool {
        self.literal > 0 || self.license_blob > 0 || self.license_raw > 0
    }
}

/// Result of scanning one repository: paths (relative to the repository root)
/// mapped to their occurrence counts. Only files with at least one positive
/// count are included.
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub files: BTreeMap<PathBuf, FileHits>,
}

impl ScanResult {
    /// Returns true when no file had any occurrence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Number of files with at least one occurrence.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Sums the per-file counts into `(literal, blob, raw)` totals.
    #[must_use]
    pub fn totals(&self) -> (usize, usize, usize) {
        self.files.values().fold((0, 0, 0), |acc, hits| {
            (
                acc.0 + hits.literal,
                acc.1 + hits.license_blob,
                acc.2 + hits.license_raw,
            )
        })
    }
}

/// Returns true for directories that should be pruned from the walk.
pub(crate) fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| SKIP_DIRS.contains(&name))
}

/// Scans a repository for occurrences of `old` and, when a rewriter is
/// supplied, license-link matches scoped to the repository.
///
/// Each eligible file is read once as raw bytes. A case-insensitive byte-level
/// pre-check short-circuits decoding when neither the old string nor any
/// license keyword can possibly appear. Per-file read failures are skipped.
pub fn scan_repository(
    root: &Path,
    old: &str,
    license: Option<&LicenseLinkRewriter>,
) -> ScanResult {
    let mut result = ScanResult::default();

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

        let literal_possible = data.contains_str(old.as_bytes());
        let license_possible =
            license.is_some() && data.to_ascii_uppercase().contains_str(b"LICEN");
        if !literal_possible && !license_possible {
            continue;
        }

        let (text, _encoding) = decode(&data);

        let mut hits = FileHits {
            literal: text.matches(old).count(),
            ..FileHits::default()
        };
        if let Some(rewriter) = license {
            let (blob, raw) = rewriter.count(&text);
            hits.license_blob = blob;
            hits.license_raw = raw;
        }

        if hits.any() {
            let rel = path.strip_prefix(root).unwrap_or(path).to_path_buf();
            result.files.insert(rel, hits);
        }
    }

    result
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
    fn counts_literal_occurrences() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "OldOrg here, OldOrg there").unwrap();
        fs::write(dir.path().join("b.txt"), "nothing relevant").unwrap();

        let result = scan_repository(dir.path(), "OldOrg", None);
        assert_eq!(result.file_count(), 1);
        assert_eq!(result.files[&PathBuf::from("a.txt")].literal, 2);
    }

    #[test]
    fn counts_license_links() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("README.md"),
            "[License](https://github.com/OldOrg/Repo/blob/main/LICENSE)",
        )
        .unwrap();

        let result = scan_repository(dir.path(), "no-such-literal", Some(&rewriter()));
        assert_eq!(result.totals(), (0, 1, 0));
    }

    #[test]
    fn empty_scan_for_clean_repository() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();

        let result = scan_repository(dir.path(), "OldOrg", Some(&rewriter()));
        assert!(result.is_empty());
    }

    #[test]
    fn prunes_ignore_directories() {
        let dir = TempDir::new().unwrap();
        let deps = dir.path().join("node_modules");
        fs::create_dir(&deps).unwrap();
        fs::write(deps.join("pkg.js"), "OldOrg").unwrap();
        fs::write(dir.path().join("index.js"), "OldOrg").unwrap();

        let result = scan_repository(dir.path(), "OldOrg", None);
        assert_eq!(result.file_count(), 1);
        assert!(result.files.contains_key(&PathBuf::from("index.js")));
    }

    #[test]
    fn skips_binary_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("blob.bin"), b"OldOrg\x00OldOrg").unwrap();

        let result = scan_repository(dir.path(), "OldOrg", None);
        assert!(result.is_empty());
    }
}
