//! Unified diff parsing and path filtering.
//!
//! Turns the raw diff text of one revision into a line-addressed
//! file → hunk → change model, and filters out paths that should not take
//! part in dependency analysis.

pub mod filter;
pub mod parser;
