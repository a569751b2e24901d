//! Revision sources: git history and `git format-patch` series.
//!
//! Both produce [`patchdeps_core::RawRevision`]s, oldest first, ready for
//! dependency analysis.

pub mod mining;
pub mod series;
