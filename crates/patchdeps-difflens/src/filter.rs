//! Path filtering ahead of dependency analysis.
//!
//! Files such as lock files or changelogs are touched by almost every
//! revision and would make everything depend on everything; configured glob
//! patterns drop them before any analyzer sees them.

use std::path::Path;

use patchdeps_core::{AnalysisConfig, PatchdepsError};

use crate::parser::PatchedFile;

/// Glob-based filter over logical paths.
///
/// # Examples
///
/// ```
/// use patchdeps_difflens::filter::PathFilter;
///
/// let filter = PathFilter::new(&["*.lock".to_string(), "docs/**".to_string()]).unwrap();
/// assert!(filter.should_skip("Cargo.lock"));
/// assert!(filter.should_skip("docs/guide/intro.md"));
/// assert!(!filter.should_skip("src/lib.rs"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathFilter {
    skip_patterns: Vec<glob::Pattern>,
}

impl PathFilter {
    /// Build a filter from glob patterns.
    ///
    /// # Errors
    ///
    /// Returns [`PatchdepsError::Config`] if a pattern is not a valid glob.
    pub fn new(patterns: &[String]) -> Result<Self, PatchdepsError> {
        let skip_patterns = patterns
            .iter()
            .map(|pat| {
                glob::Pattern::new(pat)
                    .map_err(|e| PatchdepsError::Config(format!("invalid skip pattern {pat:?}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { skip_patterns })
    }

    /// Build a filter from the analysis configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PatchdepsError::Config`] if a configured pattern is invalid.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, PatchdepsError> {
        Self::new(&config.skip_patterns)
    }

    /// Whether `path` matches any skip pattern, by full path or by file name.
    pub fn should_skip(&self, path: &str) -> bool {
        let file_name = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path);
        self.skip_patterns
            .iter()
            .any(|p| p.matches(path) || p.matches(file_name))
    }

    /// Whether any pattern is configured.
    pub fn is_empty(&self) -> bool {
        self.skip_patterns.is_empty()
    }

    /// Keep only files whose source and target paths are both analyzable.
    ///
    /// Returns the kept files and the logical paths that were dropped.
    pub fn retain(&self, files: Vec<PatchedFile>) -> (Vec<PatchedFile>, Vec<String>) {
        if self.is_empty() {
            return (files, Vec::new());
        }
        let mut kept = Vec::new();
        let mut skipped = Vec::new();
        for file in files {
            if self.should_skip(&file.source) || self.should_skip(&file.target) {
                skipped.push(file.logical_path().to_string());
            } else {
                kept.push(file);
            }
        }
        (kept, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_patch;

    #[test]
    fn empty_filter_keeps_everything() {
        let filter = PathFilter::default();
        assert!(filter.is_empty());
        assert!(!filter.should_skip("Cargo.lock"));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let err = PathFilter::new(&["[".to_string()]).unwrap_err();
        assert!(matches!(err, PatchdepsError::Config(_)));
    }

    #[test]
    fn retain_drops_matching_files() {
        let diff = "\
--- a/CHANGELOG.md
+++ b/CHANGELOG.md
@@ -1 +1,2 @@
 # Changes
+- fixed parser
--- a/src/parser.rs
+++ b/src/parser.rs
@@ -1 +1 @@
-old
+new
";
        let files = parse_patch(diff).unwrap();
        let filter = PathFilter::new(&["CHANGELOG.md".to_string()]).unwrap();
        let (kept, skipped) = filter.retain(files);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].target, "src/parser.rs");
        assert_eq!(skipped, vec!["CHANGELOG.md".to_string()]);
    }

    #[test]
    fn null_path_side_does_not_match_name_patterns() {
        let diff = "--- /dev/null\n+++ b/src/new.rs\n@@ -0,0 +1 @@\n+x\n";
        let files = parse_patch(diff).unwrap();
        let filter = PathFilter::new(&["*.lock".to_string()]).unwrap();
        let (kept, skipped) = filter.retain(files);
        assert_eq!(kept.len(), 1);
        assert!(skipped.is_empty());
    }

    #[test]
    fn from_config_uses_skip_patterns() {
        let config = AnalysisConfig {
            skip_patterns: vec!["vendor/**".into()],
            ..AnalysisConfig::default()
        };
        let filter = PathFilter::from_config(&config).unwrap();
        assert!(filter.should_skip("vendor/lib/a.c"));
    }
}
