use std::fs;
use std::path::Path;

use org_url_migrator::{
    apply_rewrites, scan_repository, LicenseLinkRewriter, ScanResult,
};
use tempfile::TempDir;

const OLD: &str = "https://github.com/OldOrg";
const NEW: &str = "https://github.com/NewOrg";

fn owners() -> Vec<String> {
    vec!["OldOrg".to_string(), "NewOrg".to_string()]
}

fn write_fixture_repo(root: &Path) {
    fs::write(
        root.join("README.md"),
        format!(
            "# Widgets\n\nClone from {OLD}/widgets.\n\n\
             Licensed under the [MIT License]({OLD}/widgets/blob/main/LICENSE.md).\n"
        ),
    )
    .unwrap();

    fs::create_dir(root.join("docs")).unwrap();
    fs::write(
        root.join("docs/install.md"),
        format!(
            "Download: {OLD}/widgets/releases\n\
             [licence](https://raw.githubusercontent.com/OldOrg/widgets/v2/LICENCE)\n"
        ),
    )
    .unwrap();

    // Non-license label, must survive untouched.
    fs::write(
        root.join("docs/links.md"),
        format!("[Download]({OLD}/widgets/blob/main/LICENSE)\n"),
    )
    .unwrap();

    // Pruned directory, must never be scanned or rewritten.
    fs::create_dir(root.join("node_modules")).unwrap();
    fs::write(root.join("node_modules/dep.js"), format!("// {OLD}/dep\n")).unwrap();

    // Binary content, must be left alone.
    fs::write(root.join("logo.png"), b"\x89PNG\x00\x00OldOrg").unwrap();
}

fn scan(root: &Path, rewriter: &LicenseLinkRewriter) -> ScanResult {
    scan_repository(root, OLD, Some(rewriter))
}

#[test]
fn scan_reports_without_mutating() {
    let dir = TempDir::new().unwrap();
    write_fixture_repo(dir.path());
    let rewriter = LicenseLinkRewriter::new("widgets", &owners()).unwrap();

    let before: Vec<(String, String)> = collect_tree(dir.path());
    let result = scan(dir.path(), &rewriter);

    assert_eq!(result.file_count(), 3);
    let (literal, blob, raw) = result.totals();
    // links.md holds the third literal hit; its blob link does not count
    // because the label is not license-like.
    assert_eq!(literal, 4);
    assert_eq!(blob, 1);
    assert_eq!(raw, 1);

    assert_eq!(before, collect_tree(dir.path()), "scan must be read-only");
}

#[test]
fn rewrite_applies_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    write_fixture_repo(dir.path());
    let rewriter = LicenseLinkRewriter::new("widgets", &owners()).unwrap();

    let first = apply_rewrites(dir.path(), OLD, NEW, Some(&rewriter));
    assert_eq!(first.literal_total, 4);
    assert_eq!(first.blob_total, 1);
    assert_eq!(first.raw_total, 1);
    assert_eq!(first.changes.len(), 3);

    let readme = fs::read_to_string(dir.path().join("README.md")).unwrap();
    assert!(readme.contains(&format!("{NEW}/widgets")));
    assert!(readme.contains("[MIT License](./LICENSE)"));
    assert!(!readme.contains(OLD));

    // The non-license label keeps its (literal-substituted) absolute URL.
    let links = fs::read_to_string(dir.path().join("docs/links.md")).unwrap();
    assert!(links.contains(&format!("[Download]({NEW}/widgets/blob/main/LICENSE)")));

    // Pruned and binary files are untouched.
    let dep = fs::read_to_string(dir.path().join("node_modules/dep.js")).unwrap();
    assert!(dep.contains(OLD));
    assert_eq!(
        fs::read(dir.path().join("logo.png")).unwrap(),
        b"\x89PNG\x00\x00OldOrg"
    );

    // Second pass: no diff, and a fresh scan comes back empty.
    let second = apply_rewrites(dir.path(), OLD, NEW, Some(&rewriter));
    assert!(second.is_empty());
    assert!(scan(dir.path(), &rewriter).is_empty());
}

#[test]
fn clean_repository_scans_empty() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.rs"), "fn main() {}\n").unwrap();
    let rewriter = LicenseLinkRewriter::new("widgets", &owners()).unwrap();

    assert!(scan(dir.path(), &rewriter).is_empty());

    let outcome = apply_rewrites(dir.path(), OLD, NEW, Some(&rewriter));
    assert!(outcome.is_empty());
}

/// Snapshots every text file under `root` (path, content), sorted.
fn collect_tree(root: &Path) -> Vec<(String, String)> {
    let mut entries = Vec::new();
    collect_into(root, root, &mut entries);
    entries.sort();
    entries
}

fn collect_into(root: &Path, current: &Path, out: &mut Vec<(String, String)>) {
    for entry in fs::read_dir(current).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            collect_into(root, &path, out);
        } else {
            let rel = path.strip_prefix(root).unwrap().display().to_string();
            let content = String::from_utf8_lossy(&fs::read(&path).unwrap()).into_owned();
            out.push((rel, content));
        }
    }
}
