use std::fmt;

use patchdeps_core::{PatchdepsError, NULL_PATH};

/// What a single diff body line does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineAction {
    /// Unchanged line present on both sides.
    Context,
    /// Line only present in the new version.
    Add,
    /// Line only present in the old version.
    Delete,
}

/// One body line of a hunk, with absolute line numbers.
///
/// `source_line` is set for context and delete lines, `target_line` for
/// context and add lines. `anchor` is the old-version position the change
/// lands on: the source line itself for context and delete lines; for an add,
/// the old line it replaces when it follows a run of deletes, otherwise the
/// old line it is inserted before.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Kind of line.
    pub action: LineAction,
    /// Line number in the old version.
    pub source_line: Option<u32>,
    /// Line number in the new version.
    pub target_line: Option<u32>,
    /// Old-version position this change lands on.
    pub anchor: u32,
    /// Line content without its marker.
    pub text: String,
}

/// A contiguous block of changes.
///
/// # Examples
///
/// ```
/// use patchdeps_difflens::parser::parse_patch;
///
/// let diff = "--- a/f.txt\n+++ b/f.txt\n@@ -2,2 +2,3 @@\n two\n+new\n three\n";
/// let files = parse_patch(diff).unwrap();
/// let hunk = &files[0].hunks[0];
/// assert_eq!(hunk.counted_lengths(), (hunk.source_len, hunk.target_len));
/// assert_eq!(hunk.changes[1].target_line, Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// Starting line in the old version.
    pub source_start: u32,
    /// Number of lines in the old version.
    pub source_len: u32,
    /// Starting line in the new version.
    pub target_start: u32,
    /// Number of lines in the new version.
    pub target_len: u32,
    /// Body lines in diff order.
    pub changes: Vec<Change>,
}

impl Hunk {
    /// Source and target lengths re-derived by counting the parsed changes.
    pub fn counted_lengths(&self) -> (u32, u32) {
        self.changes
            .iter()
            .fold((0, 0), |(source, target), change| match change.action {
                LineAction::Context => (source + 1, target + 1),
                LineAction::Delete => (source + 1, target),
                LineAction::Add => (source, target + 1),
            })
    }
}

/// All hunks of one file within a revision.
///
/// # Examples
///
/// ```
/// use patchdeps_difflens::parser::parse_patch;
///
/// let diff = "--- a/old.txt\n+++ /dev/null\n@@ -1 +0,0 @@\n-bye\n";
/// let files = parse_patch(diff).unwrap();
/// assert!(files[0].is_deleted());
/// assert_eq!(files[0].logical_path(), "old.txt");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchedFile {
    /// Path in the old version, or `/dev/null` for a created file.
    pub source: String,
    /// Path in the new version, or `/dev/null` for a deleted file.
    pub target: String,
    /// Parsed hunks for this file.
    pub hunks: Vec<Hunk>,
}

impl PatchedFile {
    /// Identity used to correlate this file across revisions: the target path,
    /// or the source path when the file is deleted.
    pub fn logical_path(&self) -> &str {
        if self.is_deleted() {
            &self.source
        } else {
            &self.target
        }
    }

    /// Whether this file is created by the revision.
    pub fn is_created(&self) -> bool {
        self.source == NULL_PATH
    }

    /// Whether this file is deleted by the revision.
    pub fn is_deleted(&self) -> bool {
        self.target == NULL_PATH
    }

    /// The previous path when the revision renames the file.
    pub fn renamed_from(&self) -> Option<&str> {
        let renamed = !self.is_created() && !self.is_deleted() && self.source != self.target;
        renamed.then_some(self.source.as_str())
    }
}

impl fmt::Display for PatchedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} hunks)", self.logical_path(), self.hunks.len())
    }
}

/// Parse the unified diff of one revision into [`PatchedFile`] entries.
///
/// Only `---`/`+++` file headers, `@@` hunk headers and hunk bodies are
/// significant; any other line outside a hunk (`diff --git`, `index`, commit
/// metadata) is ignored. A hunk ends exactly when both of its declared line
/// counts are used up.
///
/// # Errors
///
/// Returns [`PatchdepsError::Parse`] if a header is malformed, a hunk body
/// line has an unknown marker, a hunk holds more or fewer lines than its
/// header declares, or a hunk appears before any file header. Nothing is
/// returned for a diff that fails anywhere.
///
/// # Examples
///
/// ```
/// use patchdeps_difflens::parser::parse_patch;
///
/// assert!(parse_patch("").unwrap().is_empty());
/// assert!(parse_patch("--- a/x\n+++ b/x\n@@ -1 +1 @@\n*oops\n").is_err());
/// ```
pub fn parse_patch(input: &str) -> Result<Vec<PatchedFile>, PatchdepsError> {
    let mut files: Vec<PatchedFile> = Vec::new();
    let mut source_header: Option<String> = None;
    let mut open: Option<OpenHunk> = None;
    let mut just_closed = false;

    for (idx, line) in input.lines().enumerate() {
        let lineno = idx + 1;

        if let Some(hunk) = open.as_mut() {
            hunk.consume(line)
                .map_err(|reason| PatchdepsError::Parse(format!("line {lineno}: {reason}")))?;
            if hunk.is_complete() {
                close_hunk(&mut files, &mut open);
                just_closed = true;
            }
            continue;
        }

        if line.starts_with('\\') {
            continue;
        }

        if let Some(raw) = line.strip_prefix("--- ") {
            source_header = Some(parse_path(raw, "a/"));
            just_closed = false;
            continue;
        }

        if let Some(raw) = line.strip_prefix("+++ ") {
            let source = source_header.take().ok_or_else(|| {
                PatchdepsError::Parse(format!("line {lineno}: target header without source header"))
            })?;
            files.push(PatchedFile {
                source,
                target: parse_path(raw, "b/"),
                hunks: Vec::new(),
            });
            just_closed = false;
            continue;
        }

        if line.starts_with("@@ ") {
            if files.is_empty() {
                return Err(PatchdepsError::Parse(format!(
                    "line {lineno}: hunk header before any file header"
                )));
            }
            let header = parse_hunk_header(line)
                .map_err(|reason| PatchdepsError::Parse(format!("line {lineno}: {reason}")))?;
            let hunk = OpenHunk::new(header);
            let complete = hunk.is_complete();
            open = Some(hunk);
            if complete {
                close_hunk(&mut files, &mut open);
            }
            just_closed = complete;
            continue;
        }

        if just_closed && is_overflow(line) {
            return Err(PatchdepsError::Parse(format!(
                "line {lineno}: hunk body is longer than its header declares"
            )));
        }
        just_closed = false;
    }

    if let Some(hunk) = open {
        return Err(PatchdepsError::Parse(format!(
            "input ended inside hunk at -{},{} +{},{} ({} old and {} new lines missing)",
            hunk.hunk.source_start,
            hunk.hunk.source_len,
            hunk.hunk.target_start,
            hunk.hunk.target_len,
            hunk.source_left,
            hunk.target_left,
        )));
    }

    Ok(files)
}

/// A body-looking line right after a hunk closed. The `-- ` mail signature
/// separator written by `git format-patch` is not one.
fn is_overflow(line: &str) -> bool {
    if line == "-- " || line == "--" {
        return false;
    }
    line.starts_with(' ') || line.starts_with('+') || line.starts_with('-')
}

fn close_hunk(files: &mut [PatchedFile], open: &mut Option<OpenHunk>) {
    if let (Some(done), Some(file)) = (open.take(), files.last_mut()) {
        file.hunks.push(done.hunk);
    }
}

struct HunkHeader {
    source_start: u32,
    source_len: u32,
    target_start: u32,
    target_len: u32,
    source_first: u32,
    target_first: u32,
}

/// Deletes immediately preceding the adds that replace them.
#[derive(Default)]
struct ReplaceRun {
    first_deleted: Option<u32>,
    deletes: u32,
    adds: u32,
}

struct OpenHunk {
    hunk: Hunk,
    source_left: u32,
    target_left: u32,
    source_cursor: u32,
    target_cursor: u32,
    run: ReplaceRun,
}

impl OpenHunk {
    fn new(header: HunkHeader) -> Self {
        Self {
            source_left: header.source_len,
            target_left: header.target_len,
            source_cursor: header.source_first,
            target_cursor: header.target_first,
            run: ReplaceRun::default(),
            hunk: Hunk {
                source_start: header.source_start,
                source_len: header.source_len,
                target_start: header.target_start,
                target_len: header.target_len,
                changes: Vec::new(),
            },
        }
    }

    fn is_complete(&self) -> bool {
        self.source_left == 0 && self.target_left == 0
    }

    fn consume(&mut self, line: &str) -> Result<(), String> {
        let mut chars = line.chars();
        let marker = chars.next();
        let text = chars.as_str().to_string();

        match marker {
            // Some tools strip the trailing space of empty context lines.
            None | Some(' ') => self.context(text),
            Some('-') => self.delete(text),
            Some('+') => self.add(text),
            Some('\\') => Ok(()),
            Some(_) => Err(format!("unexpected line {line:?} inside hunk")),
        }
    }

    fn context(&mut self, text: String) -> Result<(), String> {
        if self.source_left == 0 || self.target_left == 0 {
            return Err("context line exceeds the hunk's declared ranges".into());
        }
        self.hunk.changes.push(Change {
            action: LineAction::Context,
            source_line: Some(self.source_cursor),
            target_line: Some(self.target_cursor),
            anchor: self.source_cursor,
            text,
        });
        self.source_cursor += 1;
        self.target_cursor += 1;
        self.source_left -= 1;
        self.target_left -= 1;
        self.run = ReplaceRun::default();
        Ok(())
    }

    fn delete(&mut self, text: String) -> Result<(), String> {
        if self.source_left == 0 {
            return Err("deleted line exceeds the hunk's old range".into());
        }
        if self.run.first_deleted.is_none() || self.run.adds > 0 {
            self.run = ReplaceRun {
                first_deleted: Some(self.source_cursor),
                ..ReplaceRun::default()
            };
        }
        self.run.deletes += 1;
        self.hunk.changes.push(Change {
            action: LineAction::Delete,
            source_line: Some(self.source_cursor),
            target_line: None,
            anchor: self.source_cursor,
            text,
        });
        self.source_cursor += 1;
        self.source_left -= 1;
        Ok(())
    }

    fn add(&mut self, text: String) -> Result<(), String> {
        if self.target_left == 0 {
            return Err("added line exceeds the hunk's new range".into());
        }
        let anchor = match self.run.first_deleted {
            Some(first) if self.run.adds < self.run.deletes => first + self.run.adds,
            _ => self.source_cursor,
        };
        self.run.adds += 1;
        self.hunk.changes.push(Change {
            action: LineAction::Add,
            source_line: None,
            target_line: Some(self.target_cursor),
            anchor,
            text,
        });
        self.target_cursor += 1;
        self.target_left -= 1;
        Ok(())
    }
}

/// First line addressed by a range. An empty range names the line before
/// the gap, so the gap itself starts one further.
///
/// `None` when the range, or the position just past it, is not a `u32`.
fn first_line(start: u32, len: u32) -> Option<u32> {
    let first = if len == 0 { start.checked_add(1)? } else { start };
    first.checked_add(len)?;
    Some(first)
}

fn parse_path(raw: &str, prefix: &str) -> String {
    let without_timestamp = raw.split('\t').next().unwrap_or(raw);
    let normalized = without_timestamp.trim_end().trim_matches('"');

    if normalized == NULL_PATH {
        return NULL_PATH.to_string();
    }

    normalized
        .strip_prefix(prefix)
        .unwrap_or(normalized)
        .to_string()
}

fn parse_hunk_header(line: &str) -> Result<HunkHeader, String> {
    let inner = line
        .strip_prefix("@@ ")
        .and_then(|s| {
            let end = s.find(" @@")?;
            Some(&s[..end])
        })
        .ok_or_else(|| format!("invalid hunk header: {line}"))?;

    let parts: Vec<&str> = inner.split(' ').collect();
    if parts.len() != 2 {
        return Err(format!("invalid hunk header: {line}"));
    }

    let old = parts[0]
        .strip_prefix('-')
        .ok_or_else(|| format!("invalid old range in hunk: {line}"))?;
    let new = parts[1]
        .strip_prefix('+')
        .ok_or_else(|| format!("invalid new range in hunk: {line}"))?;

    let (source_start, source_len) = parse_range(old, line)?;
    let (target_start, target_len) = parse_range(new, line)?;
    let too_far = || format!("hunk range exceeds line limit: {line}");
    let source_first = first_line(source_start, source_len).ok_or_else(too_far)?;
    let target_first = first_line(target_start, target_len).ok_or_else(too_far)?;

    Ok(HunkHeader {
        source_start,
        source_len,
        target_start,
        target_len,
        source_first,
        target_first,
    })
}

fn parse_range(range: &str, context: &str) -> Result<(u32, u32), String> {
    let (start, count) = match range.split_once(',') {
        Some((start, count)) => (
            start
                .parse()
                .map_err(|_| format!("invalid range number in: {context}"))?,
            count
                .parse()
                .map_err(|_| format!("invalid range count in: {context}"))?,
        ),
        None => (
            range
                .parse()
                .map_err(|_| format!("invalid range number in: {context}"))?,
            1,
        ),
    };
    if start == 0 && count > 0 {
        return Err(format!("non-empty range starting at line 0 in: {context}"));
    }
    Ok((start, count))
}
