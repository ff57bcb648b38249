//! Normalization of absolute LICENSE hyperlinks to the relative `./LICENSE` form.
//!
//! Two link shapes are recognized, both markdown links whose label itself
//! reads like a license reference:
//!
//! - blob: `https://github.com/<owner>/<repo>/blob/<ref>/LICENSE(.md)?`
//! - raw:  `https://raw.githubusercontent.com/<owner>/<repo>/<ref>/LICENSE(.md)?`
//!
//! Only links pointing at the scanned repository under an allowed owner
//! namespace are rewritten; the label is preserved verbatim.

use regex::Regex;

/// Extracts the owner namespace from a replacement literal.
///
/// Literals may be bare org names or base URLs; the `<owner>` path segment of
/// a license link is the literal's last non-empty path segment
/// (`https://github.com/OldOrg` becomes `OldOrg`).
#[must_use]
pub fn owner_namespace(literal: &str) -> &str {
    let tail = literal.rsplit("://").next().unwrap_or(literal);
    tail.rsplit('/').find(|seg| !seg.is_empty()).unwrap_or(tail)
}

/// Rewrites matching license links for one repository.
///
/// The patterns embed the repository name and the allowed owner namespaces, so
/// an instance is built once per repository and reused across files.
pub struct LicenseLinkRewriter {
    blob: Regex,
    raw: Regex,
}

impl LicenseLinkRewriter {
    /// Compiles the blob and raw patterns for a repository.
    ///
    /// # Errors
    ///
    /// Returns a [`regex::Error`] if pattern compilation fails.
    pub fn new(repo_name: &str, owners: &[String]) -> Result<Self, regex::Error> {
        let owners_alt = owners
            .iter()
            .map(|o| regex::escape(o))
            .collect::<Vec<_>>()
            .join("|");
        let repo = regex::escape(repo_name);

        let blob = Regex::new(&format!(
            r"(?i)\[(?P<label>[^\]]*?licen[cs]e[^\]]*?)\]\(https://github\.com/(?:{owners_alt})/{repo}/blob/[A-Za-z0-9._/-]+/(?:LICENSE|LICENCE)(?:\.md)?\)"
        ))?;
        let raw = Regex::new(&format!(
            r"(?i)\[(?P<label>[^\]]*?licen[cs]e[^\]]*?)\]\(https://raw\.githubusercontent\.com/(?:{owners_alt})/{repo}/[A-Za-z0-9._/-]+/(?:LICENSE|LICENCE)(?:\.md)?\)"
        ))?;

        Ok(Self { blob, raw })
    }

    /// Counts blob- and raw-shape matches without rewriting anything.
    pub fn count(&self, text: &str) -> (usize, usize) {
        (
            self.blob.find_iter(text).count(),
            self.raw.find_iter(text).count(),
        )
    }

    /// Rewrites matching links to `[<label>](./LICENSE)`.
    ///
    /// The blob pass runs before the raw pass; both can apply to the same
    /// document. Returns the new text and the number of substitutions each
    /// pass performed.
    pub fn rewrite(&self, text: &str) -> (String, usize, usize) {
        let blob_count = self.blob.find_iter(text).count();
        let after_blob = if blob_count > 0 {
            self.blob
                .replace_all(text, "[$label](./LICENSE)")
                .into_owned()
        } else {
            text.to_owned()
        };

        let raw_count = self.raw.find_iter(&after_blob).count();
        let after_raw = if raw_count > 0 {
            self.raw
                .replace_all(&after_blob, "[$label](./LICENSE)")
                .into_owned()
        } else {
            after_blob
        };

        (after_raw, blob_count, raw_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewriter() -> LicenseLinkRewriter {
        LicenseLinkRewriter::new(
            "Repo",
            &["OldOrg".to_string(), "NewOrg".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn converts_blob_link() {
        let (out, blob, raw) = rewriter().rewrite(
            "See [License](https://github.com/OldOrg/Repo/blob/main/LICENSE.md) for terms.",
        );
        assert_eq!(out, "See [License](./LICENSE) for terms.");
        assert_eq!((blob, raw), (1, 0));
    }

    #[test]
    fn converts_raw_link() {
        let (out, blob, raw) = rewriter().rewrite(
            "[MIT Licence](https://raw.githubusercontent.com/NewOrg/Repo/v1.2.3/LICENCE)",
        );
        assert_eq!(out, "[MIT Licence](./LICENSE)");
        assert_eq!((blob, raw), (0, 1));
    }

    #[test]
    fn both_passes_apply_to_one_document() {
        let text = "\
[license](https://github.com/OldOrg/Repo/blob/dev/feature/LICENSE)
[the license text](https://raw.githubusercontent.com/OldOrg/Repo/main/LICENSE.md)";
        let (out, blob, raw) = rewriter().rewrite(text);
        assert_eq!(blob, 1);
        assert_eq!(raw, 1);
        assert_eq!(out, "[license](./LICENSE)\n[the license text](./LICENSE)");
    }

    #[test]
    fn preserves_label_verbatim() {
        let (out, _, _) = rewriter().rewrite(
            "[Read the LICENSE here](https://github.com/NewOrg/Repo/blob/main/LICENSE)",
        );
        assert_eq!(out, "[Read the LICENSE here](./LICENSE)");
    }

    #[test]
    fn ignores_non_license_label() {
        let text = "[Download](https://github.com/OldOrg/Repo/blob/main/LICENSE)";
        let (out, blob, raw) = rewriter().rewrite(text);
        assert_eq!(out, text);
        assert_eq!((blob, raw), (0, 0));
    }

    #[test]
    fn ignores_other_repository() {
        let text = "[License](https://github.com/OldOrg/Other/blob/main/LICENSE)";
        let (out, blob, raw) = rewriter().rewrite(text);
        assert_eq!(out, text);
        assert_eq!((blob, raw), (0, 0));
    }

    #[test]
    fn ignores_disallowed_owner() {
        let text = "[License](https://github.com/Stranger/Repo/blob/main/LICENSE)";
        let (out, _, _) = rewriter().rewrite(text);
        assert_eq!(out, text);
    }

    #[test]
    fn already_relative_links_are_untouched() {
        let (out, blob, raw) = rewriter().rewrite("[License](./LICENSE)");
        assert_eq!(out, "[License](./LICENSE)");
        assert_eq!((blob, raw), (0, 0));
    }

    #[test]
    fn second_pass_is_a_no_op() {
        let (once, _, _) = rewriter()
            .rewrite("[License](https://github.com/OldOrg/Repo/blob/main/LICENSE.md)");
        let (twice, blob, raw) = rewriter().rewrite(&once);
        assert_eq!(once, twice);
        assert_eq!((blob, raw), (0, 0));
    }

    #[test]
    fn owner_namespace_from_literals() {
        assert_eq!(owner_namespace("OldOrg"), "OldOrg");
        assert_eq!(owner_namespace("https://github.com/OldOrg"), "OldOrg");
        assert_eq!(owner_namespace("https://github.com/OldOrg/"), "OldOrg");
        assert_eq!(owner_namespace("github.com/OldOrg"), "OldOrg");
    }

    #[test]
    fn owners_derived_from_url_literals_still_match() {
        let owners = vec![
            owner_namespace("https://github.com/OldOrg").to_string(),
            owner_namespace("https://github.com/NewOrg").to_string(),
        ];
        let rw = LicenseLinkRewriter::new("Repo", &owners).unwrap();
        let (out, blob, _) =
            rw.rewrite("[License](https://github.com/OldOrg/Repo/blob/main/LICENSE)");
        assert_eq!(out, "[License](./LICENSE)");
        assert_eq!(blob, 1);
    }

    #[test]
    fn counts_match_rewrites() {
        let text = "\
[License](https://github.com/OldOrg/Repo/blob/main/LICENSE)
[License](https://github.com/OldOrg/Repo/blob/main/LICENSE)";
        let rw = rewriter();
        assert_eq!(rw.count(text), (2, 0));
        let (_, blob, raw) = rw.rewrite(text);
        assert_eq!((blob, raw), (2, 0));
    }
}
