//! Rendering of dependency maps as text, Graphviz and JSON.

pub mod graph;
pub mod output;

pub use output::render;
