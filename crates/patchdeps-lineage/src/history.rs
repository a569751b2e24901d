//! Running an analysis over a whole series of raw revisions.

use patchdeps_core::{
    AnalysisConfig, AnalysisMode, DependencyMap, PatchdepsError, RawRevision, Result, Revision,
};
use patchdeps_difflens::filter::PathFilter;
use patchdeps_difflens::parser::{parse_patch, PatchedFile};
use tracing::{debug, info};

use crate::file_level::FileLevelAnalyzer;
use crate::line_level::LineLevelAnalyzer;

/// A dependency analysis fed one revision at a time, oldest first.
pub trait DependencyAnalyzer {
    /// Account for the files changed by `revision`, recording the edges it
    /// adds into `map`.
    ///
    /// # Errors
    ///
    /// An error is fatal: state is undefined afterwards and the analysis must
    /// stop.
    fn apply(
        &mut self,
        revision: &Revision,
        files: &[PatchedFile],
        map: &mut DependencyMap,
    ) -> Result<()>;
}

/// Settings for [`analyze`].
///
/// # Examples
///
/// ```
/// use patchdeps_core::{AnalysisConfig, AnalysisMode};
/// use patchdeps_lineage::AnalysisOptions;
///
/// let options = AnalysisOptions::from_config(&AnalysisConfig::default()).unwrap();
/// assert_eq!(options.mode, AnalysisMode::Line);
/// assert_eq!(options.window, 2);
/// ```
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// File-level or line-level analysis.
    pub mode: AnalysisMode,
    /// Proximity window for line-level analysis.
    pub window: u32,
    /// Paths excluded before analysis.
    pub filter: PathFilter,
}

impl AnalysisOptions {
    /// Options with the given mode and window and no path filter.
    pub fn new(mode: AnalysisMode, window: u32) -> Self {
        Self {
            mode,
            window,
            filter: PathFilter::default(),
        }
    }

    /// Options from the `[analysis]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns [`PatchdepsError::Config`] if a skip pattern is invalid.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self> {
        Ok(Self {
            mode: config.mode,
            window: config.window,
            filter: PathFilter::from_config(config)?,
        })
    }

    fn analyzer(&self) -> Box<dyn DependencyAnalyzer> {
        match self.mode {
            AnalysisMode::File => Box::new(FileLevelAnalyzer::default()),
            AnalysisMode::Line => Box::new(LineLevelAnalyzer::new(self.window)),
        }
    }
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self::new(AnalysisMode::default(), 2)
    }
}

/// Infer the dependencies among `raws`, given oldest first.
///
/// # Errors
///
/// Returns [`PatchdepsError::MalformedRevision`] for the first revision whose
/// diff does not parse, and [`PatchdepsError::Consistency`] when a revision
/// does not apply on top of its predecessors. No partial map is returned.
///
/// # Examples
///
/// ```
/// use patchdeps_core::{DependencyKind, RawRevision};
/// use patchdeps_lineage::{analyze, AnalysisOptions};
///
/// let raws = vec![
///     RawRevision {
///         id: "r1".into(),
///         message: "add foo".into(),
///         diff: "--- a/x\n+++ b/x\n@@ -4,0 +5 @@\n+foo\n".into(),
///     },
///     RawRevision {
///         id: "r2".into(),
///         message: "drop foo".into(),
///         diff: "--- a/x\n+++ b/x\n@@ -5 +4,0 @@\n-foo\n".into(),
///     },
/// ];
/// let map = analyze(&raws, &AnalysisOptions::default()).unwrap();
/// assert_eq!(map.edge(1, 0).unwrap().kind, DependencyKind::Hard);
/// ```
pub fn analyze(raws: &[RawRevision], options: &AnalysisOptions) -> Result<DependencyMap> {
    let revisions: Vec<Revision> = raws
        .iter()
        .enumerate()
        .map(|(ordinal, raw)| Revision::new(ordinal, raw.id.clone(), raw.message.clone()))
        .collect();
    let mut map = DependencyMap::new(revisions.clone());
    let mut analyzer = options.analyzer();

    for (revision, raw) in revisions.iter().zip(raws) {
        let files = parse_patch(&raw.diff).map_err(|e| malformed(revision, e))?;
        let (files, skipped) = options.filter.retain(files);
        if !skipped.is_empty() {
            debug!(revision = %revision.id, ?skipped, "skipped paths");
        }
        debug!(revision = %revision.id, files = files.len(), "analyzing revision");
        analyzer.apply(revision, &files, &mut map)?;
    }

    info!(
        mode = %options.mode,
        revisions = revisions.len(),
        edges = map.edge_count(),
        "analysis finished"
    );
    Ok(map)
}

fn malformed(revision: &Revision, err: PatchdepsError) -> PatchdepsError {
    let reason = match err {
        PatchdepsError::Parse(reason) => reason,
        other => other.to_string(),
    };
    PatchdepsError::MalformedRevision {
        revision: revision.id.clone(),
        reason,
    }
}
