//! Line provenance for a single file.
//!
//! A [`LineTracker`] replays every revision that touches one logical file, in
//! series order, and remembers for each known line who produced it and who
//! edited near it. Replaying a revision yields the [`FileFindings`] for that
//! revision and file.
//!
//! Lines are kept in one sorted sequence split by a boundary. Entries before
//! the boundary are *settled*: already renumbered into the post-image of the
//! revision being replayed. Entries from the boundary on are *pending*: still
//! numbered as in the revision's pre-image, and shifted by the running offset
//! exactly once, when the replay moves past them.

use std::collections::{BTreeMap, BTreeSet};

use patchdeps_core::{PatchdepsError, Revision};
use patchdeps_difflens::parser::{Change, Hunk, LineAction};
use tracing::trace;

/// What is known about one line of a file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineState {
    /// Line content, once any revision has shown it.
    pub text: Option<String>,
    /// Ordinal of the last revision that produced this line.
    pub owner: Option<usize>,
    /// Ordinals of revisions that edited within the proximity window.
    pub nearby: BTreeSet<usize>,
}

impl LineState {
    fn known(text: &str) -> Self {
        Self {
            text: Some(text.to_string()),
            ..Self::default()
        }
    }

    fn carries(&self, revision: usize) -> bool {
        self.owner == Some(revision) || self.nearby.contains(&revision)
    }
}

#[derive(Debug, Clone)]
struct Entry {
    line: u32,
    state: LineState,
}

/// Dependencies of one revision discovered in one file.
///
/// # Examples
///
/// ```
/// use patchdeps_lineage::tracker::FileFindings;
///
/// let mut findings = FileFindings::default();
/// findings.add_proximity(3);
/// findings.add_hard(3, "fn main() {");
/// assert!(findings.proximity.is_empty());
/// assert_eq!(findings.hard[&3], "fn main() {");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFindings {
    /// Hard dependencies with the first deleted line that caused them.
    pub hard: BTreeMap<usize, String>,
    /// Proximity dependencies not already covered by a hard one.
    pub proximity: BTreeSet<usize>,
}

impl FileFindings {
    /// Record a hard dependency; the first reason for a revision is kept.
    pub fn add_hard(&mut self, revision: usize, reason: impl Into<String>) {
        self.proximity.remove(&revision);
        self.hard.entry(revision).or_insert_with(|| reason.into());
    }

    /// Record a proximity dependency unless a hard one already exists.
    pub fn add_proximity(&mut self, revision: usize) {
        if !self.hard.contains_key(&revision) {
            self.proximity.insert(revision);
        }
    }

    /// Whether nothing was found.
    pub fn is_empty(&self) -> bool {
        self.hard.is_empty() && self.proximity.is_empty()
    }
}

/// Per-file line state, replayed one revision at a time.
///
/// # Examples
///
/// ```
/// use patchdeps_core::Revision;
/// use patchdeps_difflens::parser::parse_patch;
/// use patchdeps_lineage::tracker::LineTracker;
///
/// let first = parse_patch("--- /dev/null\n+++ b/x\n@@ -0,0 +1,2 @@\n+a\n+b\n").unwrap();
/// let second = parse_patch("--- a/x\n+++ b/x\n@@ -1,2 +1 @@\n a\n-b\n").unwrap();
///
/// let mut tracker = LineTracker::new("x", 0);
/// tracker.apply(&Revision::new(0, "r1", "create"), &first[0].hunks).unwrap();
/// let found = tracker.apply(&Revision::new(1, "r2", "trim"), &second[0].hunks).unwrap();
/// assert_eq!(found.hard[&0], "b");
/// ```
#[derive(Debug, Clone)]
pub struct LineTracker {
    path: String,
    window: u32,
    lines: Vec<Entry>,
    /// Index of the first pending entry.
    boundary: usize,
    /// Net lines added minus deleted so far in the current replay.
    offset: i64,
    /// Post-image positions below this, settled during the current replay,
    /// lie within the window after one of its edits.
    reach: u32,
}

impl LineTracker {
    /// Create an empty tracker for `path` with a proximity `window`.
    pub fn new(path: impl Into<String>, window: u32) -> Self {
        Self {
            path: path.into(),
            window,
            lines: Vec::new(),
            boundary: 0,
            offset: 0,
            reach: 0,
        }
    }

    /// Logical path this tracker follows.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Follow the file under a new logical path.
    pub fn rename(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    /// Number of lines currently known.
    pub fn known_lines(&self) -> usize {
        self.lines.len()
    }

    /// State of the line at `line`, numbered as after the last replayed revision.
    pub fn line(&self, line: u32) -> Option<&LineState> {
        self.lines
            .binary_search_by_key(&line, |e| e.line)
            .ok()
            .map(|idx| &self.lines[idx].state)
    }

    /// Replay the hunks one revision made to this file.
    ///
    /// # Errors
    ///
    /// Returns [`PatchdepsError::Consistency`] when a context or deleted line
    /// disagrees with the text earlier revisions left at that position. The
    /// tracker must not be used after an error.
    pub fn apply(
        &mut self,
        revision: &Revision,
        hunks: &[Hunk],
    ) -> Result<FileFindings, PatchdepsError> {
        let mut findings = FileFindings::default();

        for hunk in hunks {
            // Lines deleted since the last context line, by pre-image position.
            let mut replaced: Vec<(u32, LineState)> = Vec::new();
            for change in &hunk.changes {
                match change.action {
                    LineAction::Context => {
                        replaced.clear();
                        self.context(revision, change)?;
                    }
                    LineAction::Delete => {
                        self.delete(revision, change, &mut findings, &mut replaced)?;
                    }
                    LineAction::Add => {
                        self.add(revision.ordinal, change, &mut findings, &replaced);
                    }
                }
            }
        }

        while self.boundary < self.lines.len() {
            let line = self.shifted(self.lines[self.boundary].line);
            self.settle_next(line, revision.ordinal);
        }
        self.boundary = 0;
        self.offset = 0;
        self.reach = 0;
        Ok(findings)
    }

    fn context(&mut self, revision: &Revision, change: &Change) -> Result<(), PatchdepsError> {
        let source = change.anchor;
        self.settle_before(source, revision.ordinal);
        let target = self.shifted(source);

        if self.pending_at(source) {
            let state = &mut self.lines[self.boundary].state;
            check_text(revision, &self.path, source, state, &change.text)?;
            if state.text.is_none() {
                state.text = Some(change.text.clone());
            }
        } else {
            self.lines.insert(
                self.boundary,
                Entry {
                    line: source,
                    state: LineState::known(&change.text),
                },
            );
        }
        self.settle_next(target, revision.ordinal);
        Ok(())
    }

    fn delete(
        &mut self,
        revision: &Revision,
        change: &Change,
        findings: &mut FileFindings,
        replaced: &mut Vec<(u32, LineState)>,
    ) -> Result<(), PatchdepsError> {
        let source = change.anchor;
        let current = revision.ordinal;
        self.settle_before(source, current);
        let here = self.shifted(source);

        let state = if self.pending_at(source) {
            let entry = self.lines.remove(self.boundary);
            check_text(revision, &self.path, source, &entry.state, &change.text)?;
            entry.state
        } else {
            LineState::known(&change.text)
        };

        if let Some(owner) = state.owner.filter(|&o| o != current) {
            trace!(path = %self.path, line = source, owner, "deleted line has an owner");
            findings.add_hard(owner, change.text.clone());
        }
        for &near in state.nearby.iter().filter(|&&r| r != current) {
            findings.add_proximity(near);
        }

        self.offset -= 1;
        replaced.push((source, state));
        self.mark_before(current, here);
        self.extend_reach(here);
        Ok(())
    }

    fn add(
        &mut self,
        current: usize,
        change: &Change,
        findings: &mut FileFindings,
        replaced: &[(u32, LineState)],
    ) {
        let target = change
            .target_line
            .unwrap_or_else(|| self.shifted(change.anchor));
        self.settle_before(self.unshifted(target), current);

        let mut inherited = BTreeSet::new();
        if self.window > 0 {
            if let Some(prior) = self.prior_state(replaced, change.anchor) {
                inherited.extend(prior.nearby.iter().copied());
                inherited.extend(prior.owner);
            }
        }
        inherited.remove(&current);
        for &near in &inherited {
            findings.add_proximity(near);
        }

        self.lines.insert(
            self.boundary,
            Entry {
                line: target,
                state: LineState {
                    text: Some(change.text.clone()),
                    owner: Some(current),
                    nearby: inherited,
                },
            },
        );
        self.boundary += 1;
        self.offset += 1;
        self.mark_before(current, target);
        self.extend_reach(target.saturating_add(1));
    }

    /// The line previously at `anchor`: deleted earlier in this run of the
    /// hunk, or the next pending line.
    fn prior_state<'a>(
        &'a self,
        replaced: &'a [(u32, LineState)],
        anchor: u32,
    ) -> Option<&'a LineState> {
        if let Some((_, state)) = replaced.iter().find(|(line, _)| *line == anchor) {
            return Some(state);
        }
        self.lines
            .get(self.boundary)
            .filter(|entry| entry.line == anchor)
            .map(|entry| &entry.state)
    }

    /// Mark settled lines within the window before post-image position `here`.
    fn mark_before(&mut self, revision: usize, here: u32) {
        if self.window == 0 {
            return;
        }
        let lowest = here.saturating_sub(self.window);
        for entry in self.lines[..self.boundary].iter_mut().rev() {
            if entry.line < lowest {
                break;
            }
            if entry.line < here && !entry.state.carries(revision) {
                entry.state.nearby.insert(revision);
            }
        }
    }

    /// Lines that settle at `next` or within the window after it are near
    /// the edit just replayed.
    fn extend_reach(&mut self, next: u32) {
        if self.window > 0 {
            self.reach = self.reach.max(next.saturating_add(self.window));
        }
    }

    fn pending_at(&self, source: u32) -> bool {
        self.lines
            .get(self.boundary)
            .is_some_and(|entry| entry.line == source)
    }

    /// Settle every pending line positioned before `source`.
    fn settle_before(&mut self, source: u32, revision: usize) {
        while let Some(entry) = self.lines.get(self.boundary) {
            if entry.line >= source {
                break;
            }
            let line = self.shifted(entry.line);
            self.settle_next(line, revision);
        }
    }

    /// Move the first pending entry across the boundary at post-image `line`.
    fn settle_next(&mut self, line: u32, revision: usize) {
        let near = line < self.reach;
        let entry = &mut self.lines[self.boundary];
        entry.line = line;
        if near && !entry.state.carries(revision) {
            entry.state.nearby.insert(revision);
        }
        self.boundary += 1;
    }

    fn shifted(&self, line: u32) -> u32 {
        clamp_line(i64::from(line) + self.offset)
    }

    fn unshifted(&self, line: u32) -> u32 {
        clamp_line(i64::from(line) - self.offset)
    }
}

fn clamp_line(line: i64) -> u32 {
    u32::try_from(line.max(0)).unwrap_or(u32::MAX)
}

fn check_text(
    revision: &Revision,
    path: &str,
    line: u32,
    state: &LineState,
    found: &str,
) -> Result<(), PatchdepsError> {
    match &state.text {
        Some(expected) if expected != found => Err(PatchdepsError::Consistency {
            revision: revision.id.clone(),
            path: path.to_string(),
            line,
            expected: expected.clone(),
            found: found.to_string(),
        }),
        _ => Ok(()),
    }
}
