use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Path sentinel used by unified diffs for the missing side of a created or
/// deleted file.
pub const NULL_PATH: &str = "/dev/null";

/// One revision of the analyzed series, with its fixed position.
///
/// # Examples
///
/// ```
/// use patchdeps_core::Revision;
///
/// let rev = Revision::new(0, "1a2b3c4d", "parser: accept quoted paths");
/// assert_eq!(rev.to_string(), "1a2b3c4d parser: accept quoted paths");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    /// Position in the input sequence, oldest first.
    pub ordinal: usize,
    /// Revision identifier (usually an abbreviated commit hash).
    pub id: String,
    /// First line of the revision message.
    pub message: String,
}

impl Revision {
    /// Create a revision at `ordinal`.
    pub fn new(ordinal: usize, id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            ordinal,
            id: id.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.message)
    }
}

/// A revision as delivered by a revision source: not yet parsed.
///
/// # Examples
///
/// ```
/// use patchdeps_core::RawRevision;
///
/// let raw = RawRevision {
///     id: "abc123".into(),
///     message: "add greeting".into(),
///     diff: "--- /dev/null\n+++ b/hello.txt\n@@ -0,0 +1 @@\n+hello\n".into(),
/// };
/// assert!(raw.diff.starts_with("---"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRevision {
    /// Revision identifier.
    pub id: String,
    /// First line of the revision message.
    pub message: String,
    /// Raw unified diff text of the revision.
    pub diff: String,
}

/// Strength of a dependency between two revisions.
///
/// Ordered so that `Hard > Proximity`.
///
/// # Examples
///
/// ```
/// use patchdeps_core::DependencyKind;
///
/// assert!(DependencyKind::Hard > DependencyKind::Proximity);
/// assert_eq!(DependencyKind::Proximity.to_string(), "proximity");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// The later revision edits near a position the earlier one touched.
    Proximity,
    /// The later revision edits a line produced by the earlier one.
    Hard,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyKind::Proximity => write!(f, "proximity"),
            DependencyKind::Hard => write!(f, "hard"),
        }
    }
}

/// A directed dependency: `dependent` needs `dependency` to be applied first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEdge {
    /// Ordinal of the later revision.
    pub dependent: usize,
    /// Ordinal of the earlier revision.
    pub dependency: usize,
    /// Strength of the relation.
    pub kind: DependencyKind,
    /// Diagnostic text, e.g. the deleted line that caused a hard edge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl DependencyEdge {
    /// A hard edge carrying `reason` as its diagnostic.
    pub fn hard(dependent: usize, dependency: usize, reason: Option<String>) -> Self {
        Self {
            dependent,
            dependency,
            kind: DependencyKind::Hard,
            reason,
        }
    }

    /// A proximity edge.
    pub fn proximity(dependent: usize, dependency: usize) -> Self {
        Self {
            dependent,
            dependency,
            kind: DependencyKind::Proximity,
            reason: None,
        }
    }
}

/// Per-revision dependency sets for a whole series.
///
/// Edges always point backwards in the series, and a hard edge is never
/// downgraded by a later proximity discovery for the same pair.
///
/// # Examples
///
/// ```
/// use patchdeps_core::{DependencyEdge, DependencyKind, DependencyMap, Revision};
///
/// let mut map = DependencyMap::new(vec![
///     Revision::new(0, "a", "first"),
///     Revision::new(1, "b", "second"),
/// ]);
/// map.record(DependencyEdge::proximity(1, 0));
/// map.record(DependencyEdge::hard(1, 0, Some("foo".into())));
/// map.record(DependencyEdge::proximity(1, 0));
/// assert_eq!(map.edge(1, 0).unwrap().kind, DependencyKind::Hard);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyMap {
    revisions: Vec<Revision>,
    edges: Vec<BTreeMap<usize, DependencyEdge>>,
}

impl DependencyMap {
    /// Create an empty map over `revisions`, which must be in series order.
    pub fn new(revisions: Vec<Revision>) -> Self {
        let edges = vec![BTreeMap::new(); revisions.len()];
        Self { revisions, edges }
    }

    /// The analyzed revisions, oldest first.
    pub fn revisions(&self) -> &[Revision] {
        &self.revisions
    }

    /// Record `edge`, returning `true` if the map changed.
    ///
    /// Edges that do not point to an earlier revision of the series are
    /// ignored. A hard edge upgrades an existing proximity edge; a proximity
    /// edge never replaces anything.
    pub fn record(&mut self, edge: DependencyEdge) -> bool {
        if edge.dependency >= edge.dependent || edge.dependent >= self.edges.len() {
            return false;
        }
        let slot = &mut self.edges[edge.dependent];
        match slot.get_mut(&edge.dependency) {
            Some(existing) if existing.kind >= edge.kind => false,
            Some(existing) => {
                *existing = edge;
                true
            }
            None => {
                slot.insert(edge.dependency, edge);
                true
            }
        }
    }

    /// The edge from `dependent` to `dependency`, if any.
    pub fn edge(&self, dependent: usize, dependency: usize) -> Option<&DependencyEdge> {
        self.edges.get(dependent)?.get(&dependency)
    }

    /// Whether `dependent` depends on `dependency` in any way.
    pub fn depends_on(&self, dependent: usize, dependency: usize) -> bool {
        self.edge(dependent, dependency).is_some()
    }

    /// Dependencies of the revision at `ordinal`, oldest first.
    pub fn dependencies(&self, ordinal: usize) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.get(ordinal).into_iter().flat_map(|deps| deps.values())
    }

    /// Every edge in the map, ordered by dependent then dependency.
    pub fn edges(&self) -> impl Iterator<Item = &DependencyEdge> {
        self.edges.iter().flat_map(|deps| deps.values())
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(BTreeMap::len).sum()
    }
}

/// Granularity of the dependency analysis.
///
/// # Examples
///
/// ```
/// use patchdeps_core::AnalysisMode;
///
/// let mode: AnalysisMode = "file".parse().unwrap();
/// assert_eq!(mode, AnalysisMode::File);
/// assert_eq!(AnalysisMode::default(), AnalysisMode::Line);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Coarse: any two revisions touching the same file are dependent.
    File,
    /// Precise: replay every line of every file.
    #[default]
    Line,
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::File => write!(f, "file"),
            AnalysisMode::Line => write!(f, "line"),
        }
    }
}

impl FromStr for AnalysisMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "file" => Ok(AnalysisMode::File),
            "line" => Ok(AnalysisMode::Line),
            other => Err(format!("unknown analysis mode: {other}")),
        }
    }
}

/// Output format for dependency reports.
///
/// Implements [`FromStr`] so it can be used directly with `clap` argument parsing.
///
/// # Examples
///
/// ```
/// use patchdeps_core::OutputFormat;
///
/// let fmt: OutputFormat = "dot".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Dot);
///
/// let fmt: OutputFormat = "graphviz".parse().unwrap();
/// assert_eq!(fmt, OutputFormat::Dot);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Each revision followed by its dependencies.
    List,
    /// ASCII adjacency matrix.
    #[default]
    Matrix,
    /// Graphviz digraph.
    Dot,
    /// Machine-readable JSON with camelCase keys.
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::List => write!(f, "list"),
            OutputFormat::Matrix => write!(f, "matrix"),
            OutputFormat::Dot => write!(f, "dot"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "list" => Ok(OutputFormat::List),
            "matrix" => Ok(OutputFormat::Matrix),
            "dot" | "graphviz" => Ok(OutputFormat::Dot),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}
