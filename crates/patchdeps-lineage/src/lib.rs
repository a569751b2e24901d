//! Dependency inference over an ordered series of revisions.
//!
//! - [`tracker`] replays one file's history line by line
//! - [`line_level`] drives one tracker per logical path
//! - [`file_level`] is the coarse same-path heuristic
//! - [`history`] parses raw revisions and runs the selected analyzer

pub mod file_level;
pub mod history;
pub mod line_level;
pub mod paths;
pub mod tracker;

pub use history::{analyze, AnalysisOptions, DependencyAnalyzer};
