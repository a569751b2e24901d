use petgraph::dot::{Config, Dot};
use petgraph::graph::{DiGraph, NodeIndex};

use patchdeps_core::{DependencyKind, DependencyMap, Revision};

/// Width at which node labels are wrapped.
const LABEL_WIDTH: usize = 25;

/// Revisions as nodes, with an edge from each dependency to its dependent.
///
/// # Examples
///
/// ```
/// use patchdeps_core::{DependencyEdge, DependencyMap, Revision};
/// use patchdeps_report::graph::DependencyGraph;
///
/// let mut map = DependencyMap::new(vec![
///     Revision::new(0, "a1", "base"),
///     Revision::new(1, "b2", "follow-up"),
/// ]);
/// map.record(DependencyEdge::proximity(1, 0));
///
/// let dot = DependencyGraph::build(&map).to_dot();
/// assert!(dot.contains("0 -> 1"));
/// assert!(dot.contains("style = dashed"));
/// ```
pub struct DependencyGraph {
    graph: DiGraph<Revision, DependencyKind>,
}

impl DependencyGraph {
    /// Build the graph for every revision and edge in `map`.
    pub fn build(map: &DependencyMap) -> Self {
        let mut graph = DiGraph::new();
        let nodes: Vec<NodeIndex> = map
            .revisions()
            .iter()
            .map(|rev| graph.add_node(rev.clone()))
            .collect();

        for edge in map.edges() {
            graph.add_edge(nodes[edge.dependency], nodes[edge.dependent], edge.kind);
        }
        Self { graph }
    }

    /// Graphviz description; labels are wrapped and proximity edges dashed.
    pub fn to_dot(&self) -> String {
        let dot = Dot::with_attr_getters(
            &self.graph,
            &[Config::NodeNoLabel, Config::EdgeNoLabel],
            &|_, edge| match edge.weight() {
                DependencyKind::Hard => String::new(),
                DependencyKind::Proximity => "style = dashed".to_string(),
            },
            &|_, (_, rev)| format!("label = \"{}\"", wrap_label(&rev.to_string(), LABEL_WIDTH)),
        );
        format!("{dot}")
    }
}

/// Escape `text` for a quoted Graphviz string and break it into lines of at
/// most `width` characters, joined with `\n` escapes.
fn wrap_label(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if current.is_empty() {
            current = word;
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(&word);
        } else {
            lines.push(std::mem::replace(&mut current, word));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines
        .iter()
        .map(|line| line.replace('\\', "\\\\").replace('"', "\\\""))
        .collect::<Vec<_>>()
        .join("\\n")
}
