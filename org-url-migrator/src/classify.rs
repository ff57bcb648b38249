//! Decides whether a filesystem entry is eligible for text scanning.
//!
//! Eligibility combines a size ceiling, extension allow/deny lists and a
//! null-byte sniff for files whose extension is unknown.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Files above this size are never scanned.
const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Leading byte window inspected when sniffing for binary content.
const SNIFF_WINDOW: usize = 4096;

/// Extensions that are always treated as binary.
const BINARY_EXTS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "webp", "pdf", "zip", "tar", "gz", "tgz", "7z", "rar",
    "woff", "woff2", "ttf", "otf", "ico", "mp4", "mp3", "avi", "mov", "mkv", "exe", "dll", "so",
    "dylib", "bin", "class", "o", "a", "lib", "obj", "pkl", "pt", "onnx", "pb",
];

/// Extensions that are always treated as text, skipping the sniff.
const TEXT_EXTS: &[&str] = &[
    "md", "markdown", "txt", "rst", "py", "js", "ts", "tsx", "jsx", "mjs", "cjs", "java", "go",
    "rb", "rs", "cpp", "cxx", "cc", "c", "h", "hpp", "cs", "kt", "swift", "sh", "bash", "zsh",
    "ps1", "bat", "cmd", "yml", "yaml", "json", "toml", "ini", "cfg", "conf", "xml", "html", "htm",
    "css", "scss", "less", "dockerfile", "dockerignore", "gitignore", "gitattributes", "tf", "tfvars", "csv",
    "tsv", "gradle", "properties",
];

/// Returns whether a file should be considered for scanning and rewriting.
///
/// Rejects files above the size ceiling and files with a known binary
/// extension. Files with a known text extension are accepted without further
/// inspection; anything else gets a leading-window sniff and is rejected if it
/// contains a null byte. Any read failure counts as "not eligible".
pub fn is_eligible(path: &Path) -> bool {
    let size = match path.metadata() {
        Ok(meta) => meta.len(),
        Err(_) => return false,
    };
    if size > MAX_FILE_SIZE {
        return false;
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase());
    match ext.as_deref() {
        Some(ext) if BINARY_EXTS.contains(&ext) => false,
        Some(ext) if TEXT_EXTS.contains(&ext) => true,
        _ => looks_like_text(path),
    }
}

/// Reads the leading window and rejects content containing a null byte.
fn looks_like_text(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return false,
    };

    let mut buf = [0u8; SNIFF_WINDOW];
    let mut filled = 0;
    // Read::read may return short counts, keep going until the window is full
    // or the file ends.
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(_) => return false,
        }
    }

    !buf[..filled].contains(&0)
}
