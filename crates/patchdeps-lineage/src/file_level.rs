//! Coarse dependency heuristic: revisions touching the same path depend on
//! each other.

use std::collections::HashMap;

use patchdeps_core::{DependencyEdge, DependencyMap, Result, Revision};
use patchdeps_difflens::parser::PatchedFile;
use tracing::debug;

use crate::history::DependencyAnalyzer;
use crate::paths::follow_rename;

/// Records which revisions touched each logical path.
///
/// Every revision depends (hard) on every earlier revision that touched one
/// of its paths. Cheap, with no false negatives and many false positives.
///
/// # Examples
///
/// ```
/// use patchdeps_core::{DependencyMap, Revision};
/// use patchdeps_difflens::parser::parse_patch;
/// use patchdeps_lineage::file_level::FileLevelAnalyzer;
/// use patchdeps_lineage::DependencyAnalyzer;
///
/// let revisions = vec![Revision::new(0, "a", "one"), Revision::new(1, "b", "two")];
/// let mut map = DependencyMap::new(revisions.clone());
/// let mut analyzer = FileLevelAnalyzer::default();
/// let diff = parse_patch("--- a/x\n+++ b/x\n@@ -1 +1 @@\n-1\n+2\n").unwrap();
/// analyzer.apply(&revisions[0], &diff, &mut map).unwrap();
/// analyzer.apply(&revisions[1], &diff, &mut map).unwrap();
/// assert!(map.depends_on(1, 0));
/// ```
#[derive(Debug, Clone, Default)]
pub struct FileLevelAnalyzer {
    touched: HashMap<String, Vec<usize>>,
}

impl FileLevelAnalyzer {
    /// Revisions recorded for `path` so far, oldest first.
    pub fn touched_by(&self, path: &str) -> &[usize] {
        self.touched.get(path).map(Vec::as_slice).unwrap_or_default()
    }
}

impl DependencyAnalyzer for FileLevelAnalyzer {
    fn apply(
        &mut self,
        revision: &Revision,
        files: &[PatchedFile],
        map: &mut DependencyMap,
    ) -> Result<()> {
        for file in files {
            if let Some(mut displaced) = follow_rename(&mut self.touched, file) {
                let merged = self.touched.entry(file.target.clone()).or_default();
                merged.append(&mut displaced);
                merged.sort_unstable();
                merged.dedup();
            }

            let path = file.logical_path();
            let history = self.touched.entry(path.to_string()).or_default();
            debug!(
                revision = %revision.id,
                path,
                earlier = history.len(),
                "file-level overlap"
            );
            for &earlier in history.iter() {
                map.record(DependencyEdge::hard(
                    revision.ordinal,
                    earlier,
                    Some(path.to_string()),
                ));
            }
            if history.last() != Some(&revision.ordinal) {
                history.push(revision.ordinal);
            }
        }
        Ok(())
    }
}
