use std::path::PathBuf;

/// Errors that can occur across patchdeps.
///
/// Library crates return this type directly; the binary reports it through
/// `miette` at the boundary. [`PatchdepsError::MalformedRevision`] and
/// [`PatchdepsError::Consistency`] are fatal for a whole analysis run.
///
/// # Examples
///
/// ```
/// use patchdeps_core::PatchdepsError;
///
/// let err = PatchdepsError::Config("window must be a number".into());
/// assert!(err.to_string().contains("window must be a number"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PatchdepsError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Git operation failure.
    #[error("git error: {0}")]
    Git(String),

    /// Malformed diff syntax.
    #[error("parse error: {0}")]
    Parse(String),

    /// A revision's diff could not be parsed as one unit.
    #[error("revision {revision} has a malformed diff: {reason}")]
    #[diagnostic(
        code(patchdeps::malformed_revision),
        help("every revision must parse completely; fix or drop the offending patch")
    )]
    MalformedRevision {
        /// Identifier of the offending revision.
        revision: String,
        /// What the parser rejected.
        reason: String,
    },

    /// A revision's recorded text disagrees with the text reconstructed from
    /// earlier revisions.
    #[error(
        "revision {revision} does not apply on top of its predecessors: \
         {path}:{line} expected {expected:?}, found {found:?}"
    )]
    #[diagnostic(
        code(patchdeps::inconsistent_history),
        help("the revisions are not cleanly applicable in the given order")
    )]
    Consistency {
        /// Identifier of the offending revision.
        revision: String,
        /// Logical path of the file.
        path: String,
        /// Line number in the revision's pre-image.
        line: u32,
        /// Text left at that line by earlier revisions.
        expected: String,
        /// Text the offending revision claims is there.
        found: String,
    },

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}
