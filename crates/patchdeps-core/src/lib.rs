//! Core types, configuration, and error handling for patchdeps.
//!
//! This crate provides the shared foundation used by all other patchdeps crates:
//! - [`PatchdepsError`]: unified error type using `thiserror` and `miette`
//! - [`PatchdepsConfig`]: configuration loaded from `.patchdeps.toml`
//! - Shared types: [`Revision`], [`RawRevision`], [`DependencyEdge`],
//!   [`DependencyMap`], [`AnalysisMode`], [`OutputFormat`]

mod config;
mod error;
mod types;

pub use config::{AnalysisConfig, OutputConfig, PatchdepsConfig};
pub use error::PatchdepsError;
pub use types::{
    AnalysisMode, DependencyEdge, DependencyKind, DependencyMap, OutputFormat, RawRevision,
    Revision, NULL_PATH,
};

/// A convenience `Result` type for patchdeps operations.
pub type Result<T> = std::result::Result<T, PatchdepsError>;
