//! Path identity across revisions.

use std::collections::HashMap;

use patchdeps_difflens::parser::PatchedFile;
use tracing::debug;

/// Re-key the state recorded for a renamed file from its old path to its new
/// one, so the rename's own edits and everything after it land on the same
/// history.
///
/// Only the direct link recorded in `file` is followed. Returns whatever was
/// previously stored under the new path, if anything.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use patchdeps_difflens::parser::parse_patch;
/// use patchdeps_lineage::paths::follow_rename;
///
/// let files = parse_patch("--- a/old.rs\n+++ b/new.rs\n@@ -1 +1 @@\n-a\n+b\n").unwrap();
/// let mut seen = HashMap::from([("old.rs".to_string(), vec![0])]);
/// assert!(follow_rename(&mut seen, &files[0]).is_none());
/// assert_eq!(seen["new.rs"], vec![0]);
/// assert!(!seen.contains_key("old.rs"));
/// ```
pub fn follow_rename<T>(entries: &mut HashMap<String, T>, file: &PatchedFile) -> Option<T> {
    let from = file.renamed_from()?;
    let moved = entries.remove(from)?;
    debug!(from, to = %file.target, "following rename");
    entries.insert(file.target.clone(), moved)
}
