//! Patch series produced by `git format-patch` (or any unified diff files).

use std::path::{Path, PathBuf};

use patchdeps_core::{PatchdepsError, RawRevision};
use tracing::debug;

/// Read one patch file as a revision.
///
/// The id comes from the `From <sha>` mbox line, shortened to 8 characters,
/// or the file stem when there is none. The message is the `Subject:` header
/// without its `[PATCH n/m]` tag, or the file stem. Only the text from the
/// first diff header on is kept as the diff, so commit message bodies never
/// reach the parser.
///
/// # Errors
///
/// Returns [`PatchdepsError::FileNotFound`] if `path` does not exist and
/// [`PatchdepsError::Io`] if it cannot be read.
///
/// # Examples
///
/// ```
/// use patchdeps_gitpulse::series::read_patch_file;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("0001-greet.patch");
/// std::fs::write(
///     &path,
///     "Subject: [PATCH 1/2] greet the world\n\n--- a/hello\n+++ b/hello\n@@ -1 +1 @@\n-hi\n+hello\n",
/// )
/// .unwrap();
///
/// let rev = read_patch_file(&path).unwrap();
/// assert_eq!(rev.id, "0001-greet");
/// assert_eq!(rev.message, "greet the world");
/// assert!(rev.diff.starts_with("--- a/hello"));
/// ```
pub fn read_patch_file(path: &Path) -> Result<RawRevision, PatchdepsError> {
    if !path.exists() {
        return Err(PatchdepsError::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let id = mbox_commit(&content).unwrap_or_else(|| stem.clone());
    let message = subject(&content).unwrap_or(stem);
    let diff = diff_body(&content).to_string();
    debug!(path = %path.display(), %id, "read patch file");

    Ok(RawRevision { id, message, diff })
}

/// Read every patch in `paths`, in order. Directories contribute their
/// `*.patch` and `*.diff` files sorted by name.
///
/// # Errors
///
/// Fails on the first path that cannot be read.
pub fn read_series(paths: &[PathBuf]) -> Result<Vec<RawRevision>, PatchdepsError> {
    let mut revisions = Vec::new();
    for path in paths {
        if path.is_dir() {
            for file in patch_files_in(path)? {
                revisions.push(read_patch_file(&file)?);
            }
        } else {
            revisions.push(read_patch_file(path)?);
        }
    }
    Ok(revisions)
}

fn patch_files_in(dir: &Path) -> Result<Vec<PathBuf>, PatchdepsError> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_patch = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "patch" || e == "diff");
        if is_patch && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// `From 1a2b3c... Mon Sep 17 00:00:00 2001`
fn mbox_commit(content: &str) -> Option<String> {
    let first = content.lines().next()?;
    let sha = first.strip_prefix("From ")?.split_whitespace().next()?;
    let is_sha = sha.len() >= 7 && sha.chars().all(|c| c.is_ascii_hexdigit());
    is_sha.then(|| sha[..sha.len().min(8)].to_string())
}

/// The `Subject:` header, unfolded, with leading `[...]` tags removed.
fn subject(content: &str) -> Option<String> {
    let mut subject = content
        .lines()
        .take_while(|l| !l.is_empty())
        .find_map(|l| l.strip_prefix("Subject:"))?
        .trim()
        .to_string();

    // Folded header continuation lines start with whitespace.
    let mut rest = content
        .lines()
        .skip_while(|l| !l.starts_with("Subject:"))
        .skip(1);
    while let Some(next) = rest.next().filter(|l| l.starts_with(char::is_whitespace)) {
        subject.push(' ');
        subject.push_str(next.trim());
    }

    let mut text = subject.as_str();
    while let Some(tagged) = text.strip_prefix('[') {
        match tagged.find(']') {
            Some(end) => text = tagged[end + 1..].trim_start(),
            None => break,
        }
    }
    Some(text.to_string())
}

/// Text from the first `diff --git` line, or the first `---`/`+++` pair.
fn diff_body(content: &str) -> &str {
    let mut offset = 0;
    let mut previous: Option<(usize, &str)> = None;
    for line in content.split_inclusive('\n') {
        if line.starts_with("diff --git ") {
            return &content[offset..];
        }
        if let Some((start, prev)) = previous {
            if prev.starts_with("--- ") && line.starts_with("+++ ") {
                return &content[start..];
            }
        }
        previous = Some((offset, line));
        offset += line.len();
    }
    ""
}
