//! Revision extraction from git history via git2.
//!
//! Walks a revision range like `git rev-list --reverse` and renders each
//! commit's change against its first parent as unified diff text.

use std::path::Path;

use git2::{Commit, Delta, DiffFindOptions, DiffFormat, DiffOptions, Repository, Sort};
use patchdeps_core::{PatchdepsError, RawRevision};
use tracing::{debug, warn};

/// Options for history mining.
///
/// # Examples
///
/// ```
/// use patchdeps_gitpulse::mining::MiningOptions;
///
/// let opts = MiningOptions::default();
/// assert_eq!(opts.context_lines, 2);
/// assert!(opts.detect_renames);
/// ```
#[derive(Debug, Clone)]
pub struct MiningOptions {
    /// Context lines around each hunk (default: 2).
    pub context_lines: u32,
    /// Pair deletions with additions as renames (default: true).
    pub detect_renames: bool,
}

impl Default for MiningOptions {
    fn default() -> Self {
        Self {
            context_lines: 2,
            detect_renames: true,
        }
    }
}

/// Collect the commits selected by `specs`, oldest first.
///
/// Each spec is a revision (`main`, `abc123`), a range (`v1.0..HEAD`) or an
/// exclusion (`^v1.0`). No specs means `HEAD`. Merge commits are kept in the
/// series with an empty diff.
///
/// # Errors
///
/// Returns [`PatchdepsError::Git`] if the repository cannot be opened, a spec
/// does not resolve, or a diff cannot be produced.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use patchdeps_gitpulse::mining::{collect_revisions, MiningOptions};
///
/// let specs = vec!["origin/main..HEAD".to_string()];
/// let revisions = collect_revisions(Path::new("."), &specs, &MiningOptions::default()).unwrap();
/// for rev in &revisions {
///     println!("{} {}", rev.id, rev.message);
/// }
/// ```
pub fn collect_revisions(
    repo_path: &Path,
    specs: &[String],
    options: &MiningOptions,
) -> Result<Vec<RawRevision>, PatchdepsError> {
    let repo = Repository::discover(repo_path)
        .map_err(|e| PatchdepsError::Git(format!("failed to open repository: {e}")))?;

    let mut revwalk = repo
        .revwalk()
        .map_err(|e| PatchdepsError::Git(format!("failed to create revwalk: {e}")))?;
    revwalk
        .set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)
        .map_err(|e| PatchdepsError::Git(format!("failed to sort revwalk: {e}")))?;

    if specs.is_empty() {
        revwalk
            .push_head()
            .map_err(|e| PatchdepsError::Git(format!("failed to push HEAD: {e}")))?;
    }
    for spec in specs {
        if let Some(excluded) = spec.strip_prefix('^') {
            let oid = resolve_commit(&repo, excluded)?;
            revwalk
                .hide(oid)
                .map_err(|e| PatchdepsError::Git(format!("failed to hide '{excluded}': {e}")))?;
        } else if spec.contains("..") {
            revwalk
                .push_range(spec)
                .map_err(|e| PatchdepsError::Git(format!("invalid range '{spec}': {e}")))?;
        } else {
            let oid = resolve_commit(&repo, spec)?;
            revwalk
                .push(oid)
                .map_err(|e| PatchdepsError::Git(format!("failed to push '{spec}': {e}")))?;
        }
    }

    let mut revisions = Vec::new();
    for oid_result in revwalk {
        let oid = oid_result.map_err(|e| PatchdepsError::Git(format!("revwalk error: {e}")))?;
        let commit = repo
            .find_commit(oid)
            .map_err(|e| PatchdepsError::Git(format!("failed to find commit: {e}")))?;

        let hash = oid.to_string();
        let id = hash[..hash.len().min(8)].to_string();
        let message = commit.summary().unwrap_or("").to_string();

        let diff = if commit.parent_count() > 1 {
            warn!(commit = %id, "merge commit analyzed with an empty diff");
            String::new()
        } else {
            commit_diff(&repo, &commit, options)?
        };
        debug!(commit = %id, bytes = diff.len(), "collected revision");

        revisions.push(RawRevision { id, message, diff });
    }

    Ok(revisions)
}

fn resolve_commit(repo: &Repository, spec: &str) -> Result<git2::Oid, PatchdepsError> {
    let object = repo
        .revparse_single(spec)
        .map_err(|e| PatchdepsError::Git(format!("failed to resolve '{spec}': {e}")))?;
    let commit = object
        .peel_to_commit()
        .map_err(|e| PatchdepsError::Git(format!("'{spec}' is not a commit: {e}")))?;
    Ok(commit.id())
}

/// Unified diff of `commit` against its first parent, or against the empty
/// tree for a root commit.
fn commit_diff(
    repo: &Repository,
    commit: &Commit,
    options: &MiningOptions,
) -> Result<String, PatchdepsError> {
    let commit_tree = commit
        .tree()
        .map_err(|e| PatchdepsError::Git(format!("failed to get commit tree: {e}")))?;

    let parent_tree = if commit.parent_count() > 0 {
        let parent = commit
            .parent(0)
            .map_err(|e| PatchdepsError::Git(format!("failed to get parent: {e}")))?;
        Some(
            parent
                .tree()
                .map_err(|e| PatchdepsError::Git(format!("failed to get parent tree: {e}")))?,
        )
    } else {
        None
    };

    let mut diff_opts = DiffOptions::new();
    diff_opts.context_lines(options.context_lines);
    let mut diff = repo
        .diff_tree_to_tree(
            parent_tree.as_ref(),
            Some(&commit_tree),
            Some(&mut diff_opts),
        )
        .map_err(|e| PatchdepsError::Git(format!("failed to compute diff: {e}")))?;

    if options.detect_renames {
        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts))
            .map_err(|e| PatchdepsError::Git(format!("failed to find renames: {e}")))?;
    }

    let mut text = String::new();
    diff.print(DiffFormat::Patch, |delta, _hunk, line| {
        let content = String::from_utf8_lossy(line.content());
        match line.origin() {
            origin @ (' ' | '+' | '-') => {
                text.push(origin);
                text.push_str(&content);
            }
            // End-of-file newline markers carry no line of their own.
            '=' | '>' | '<' => return true,
            'F' => {
                text.push_str(&content);
                if delta.status() == Delta::Renamed && !content.contains("\n--- ") {
                    push_rename_headers(&mut text, &delta);
                }
            }
            _ => text.push_str(&content),
        }
        if !text.ends_with('\n') {
            text.push('\n');
        }
        true
    })
    .map_err(|e| PatchdepsError::Git(format!("failed to print diff: {e}")))?;

    Ok(text)
}

/// A rename without content changes prints no `---`/`+++` pair; add one so
/// the path link is still visible in the patch text.
fn push_rename_headers(text: &mut String, delta: &git2::DiffDelta) {
    let path_of = |file: git2::DiffFile| {
        file.path()
            .unwrap_or(Path::new(""))
            .to_string_lossy()
            .to_string()
    };
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(&format!(
        "--- a/{}\n+++ b/{}\n",
        path_of(delta.old_file()),
        path_of(delta.new_file())
    ));
}
