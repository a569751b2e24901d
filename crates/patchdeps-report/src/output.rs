use std::fmt::Write;

use patchdeps_core::{DependencyKind, DependencyMap, OutputFormat, PatchdepsError, Revision};
use serde::Serialize;

use crate::graph::DependencyGraph;

/// JSON-serializable representation of one revision and its dependencies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RevisionOutput<'a> {
    id: &'a str,
    message: &'a str,
    dependencies: Vec<DependencyOutput<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DependencyOutput<'a> {
    id: &'a str,
    kind: DependencyKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// Render `map` in the requested format.
///
/// `color` highlights revision ids with ANSI escapes in the text formats.
///
/// # Errors
///
/// Returns [`PatchdepsError::Serialization`] if JSON output fails.
///
/// # Examples
///
/// ```
/// use patchdeps_core::{DependencyMap, OutputFormat};
/// use patchdeps_report::render;
///
/// let out = render(&DependencyMap::default(), OutputFormat::Json, false).unwrap();
/// assert_eq!(out.trim(), "[]");
/// ```
pub fn render(
    map: &DependencyMap,
    format: OutputFormat,
    color: bool,
) -> Result<String, PatchdepsError> {
    match format {
        OutputFormat::List => Ok(format_list(map, color)),
        OutputFormat::Matrix => Ok(format_matrix(map, color)),
        OutputFormat::Dot => Ok(format_dot(map)),
        OutputFormat::Json => format_json(map),
    }
}

/// Each revision followed by an indented line per dependency.
///
/// # Examples
///
/// ```
/// use patchdeps_core::{DependencyEdge, DependencyMap, Revision};
/// use patchdeps_report::output::format_list;
///
/// let mut map = DependencyMap::new(vec![
///     Revision::new(0, "a1", "base"),
///     Revision::new(1, "b2", "tweak"),
/// ]);
/// map.record(DependencyEdge::proximity(1, 0));
/// assert_eq!(format_list(&map, false), "a1 base\nb2 tweak\n  a1 base (proximity)\n");
/// ```
pub fn format_list(map: &DependencyMap, color: bool) -> String {
    let revisions = map.revisions();
    let mut out = String::new();
    for rev in revisions {
        let _ = writeln!(out, "{}", revision_line(rev, color));
        for edge in map.dependencies(rev.ordinal) {
            let dep = &revisions[edge.dependency];
            let marker = match edge.kind {
                DependencyKind::Hard => "",
                DependencyKind::Proximity => " (proximity)",
            };
            let _ = writeln!(out, "  {}{marker}", revision_line(dep, color));
        }
    }
    out
}

/// Adjacency matrix: one row per revision, one column per later revision.
///
/// `X` marks a hard dependency of the column's revision on the row's, `o` a
/// proximity one. A leader line runs from each revision that has
/// dependencies to its own column, and `|` continues a column past rows it
/// does not depend on.
pub fn format_matrix(map: &DependencyMap, color: bool) -> String {
    let revisions = map.revisions();
    let width = revisions
        .iter()
        .map(|rev| rev.to_string().chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (row, rev) in revisions.iter().enumerate() {
        let plain_len = rev.to_string().chars().count();
        let pad = width - plain_len + row * 2;
        let mut line = revision_line(rev, color);
        line.push(' ');
        if map.dependencies(row).next().is_some() {
            line.push_str(&"-".repeat(pad));
            line.push_str("' ");
        } else {
            line.push_str(&" ".repeat(pad + 2));
        }

        for later in row + 1..revisions.len() {
            let cell = match map.edge(later, row).map(|e| e.kind) {
                Some(DependencyKind::Hard) => "X ",
                Some(DependencyKind::Proximity) => "o ",
                None if map.dependencies(later).any(|e| e.dependency < row) => "| ",
                None => "  ",
            };
            line.push_str(cell);
        }
        let _ = writeln!(out, "{}", line.trim_end());
    }
    out
}

/// Graphviz `digraph` of the dependencies.
pub fn format_dot(map: &DependencyMap) -> String {
    DependencyGraph::build(map).to_dot()
}

/// Pretty-printed JSON array of revisions with their dependencies.
///
/// # Errors
///
/// Returns [`PatchdepsError::Serialization`] if serialization fails.
pub fn format_json(map: &DependencyMap) -> Result<String, PatchdepsError> {
    let revisions = map.revisions();
    let output: Vec<RevisionOutput<'_>> = revisions
        .iter()
        .map(|rev| RevisionOutput {
            id: &rev.id,
            message: &rev.message,
            dependencies: map
                .dependencies(rev.ordinal)
                .map(|edge| DependencyOutput {
                    id: &revisions[edge.dependency].id,
                    kind: edge.kind,
                    reason: edge.reason.as_deref(),
                })
                .collect(),
        })
        .collect();

    serde_json::to_string_pretty(&output).map_err(PatchdepsError::from)
}

fn revision_line(rev: &Revision, color: bool) -> String {
    if color {
        format!("\x1b[33m{}\x1b[39m {}", rev.id, rev.message)
    } else {
        rev.to_string()
    }
}
