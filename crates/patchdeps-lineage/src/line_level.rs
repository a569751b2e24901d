//! Line-level dependency analysis across a whole series.

use std::collections::{BTreeMap, HashMap};

use patchdeps_core::{DependencyEdge, DependencyMap, Result, Revision};
use patchdeps_difflens::parser::PatchedFile;
use tracing::debug;

use crate::history::DependencyAnalyzer;
use crate::paths::follow_rename;
use crate::tracker::{FileFindings, LineTracker};

/// Drives one [`LineTracker`] per logical path, revisions strictly in order.
///
/// Findings for one revision are gathered per file first and merged into the
/// [`DependencyMap`] in path order, so repeated runs record identical edges
/// and reasons.
#[derive(Debug, Clone)]
pub struct LineLevelAnalyzer {
    window: u32,
    trackers: HashMap<String, LineTracker>,
    /// Deleted paths and the revision that deleted them.
    deleted_by: HashMap<String, usize>,
}

impl LineLevelAnalyzer {
    /// Create an analyzer with a proximity `window` (0 = hard edges only).
    pub fn new(window: u32) -> Self {
        Self {
            window,
            trackers: HashMap::new(),
            deleted_by: HashMap::new(),
        }
    }

    /// Tracker currently following `path`.
    pub fn tracker(&self, path: &str) -> Option<&LineTracker> {
        self.trackers.get(path)
    }

    fn replay(
        &mut self,
        revision: &Revision,
        file: &PatchedFile,
        findings: &mut FileFindings,
    ) -> Result<()> {
        if follow_rename(&mut self.trackers, file).is_some() {
            debug!(path = %file.target, "rename replaced an existing tracker");
        }
        let path = file.logical_path();

        if file.is_created() {
            if let Some(deleter) = self.deleted_by.remove(path) {
                findings.add_hard(deleter, format!("recreates {path}"));
            }
        }

        let window = self.window;
        let tracker = self
            .trackers
            .entry(path.to_string())
            .or_insert_with(|| LineTracker::new(path, window));
        tracker.rename(path);

        let found = tracker.apply(revision, &file.hunks)?;
        debug!(
            revision = %revision.id,
            path,
            hard = found.hard.len(),
            proximity = found.proximity.len(),
            known_lines = tracker.known_lines(),
            "replayed file"
        );
        for (owner, reason) in found.hard {
            findings.add_hard(owner, reason);
        }
        for near in found.proximity {
            findings.add_proximity(near);
        }

        if file.is_deleted() {
            self.trackers.remove(path);
            self.deleted_by.insert(path.to_string(), revision.ordinal);
        }
        Ok(())
    }
}

impl Default for LineLevelAnalyzer {
    fn default() -> Self {
        Self::new(2)
    }
}

impl DependencyAnalyzer for LineLevelAnalyzer {
    fn apply(
        &mut self,
        revision: &Revision,
        files: &[PatchedFile],
        map: &mut DependencyMap,
    ) -> Result<()> {
        let mut per_file: BTreeMap<String, FileFindings> = BTreeMap::new();
        for file in files {
            let findings = per_file.entry(file.logical_path().to_string()).or_default();
            self.replay(revision, file, findings)?;
        }

        for findings in per_file.into_values() {
            for (owner, reason) in findings.hard {
                map.record(DependencyEdge::hard(revision.ordinal, owner, Some(reason)));
            }
            for near in findings.proximity {
                map.record(DependencyEdge::proximity(revision.ordinal, near));
            }
        }
        Ok(())
    }
}
