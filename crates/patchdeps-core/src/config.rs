use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PatchdepsError;
use crate::types::{AnalysisMode, OutputFormat};

/// Top-level configuration loaded from `.patchdeps.toml`.
///
/// Resolution order: CLI flags > config file > defaults.
///
/// # Examples
///
/// ```
/// use patchdeps_core::PatchdepsConfig;
///
/// let config = PatchdepsConfig::default();
/// assert_eq!(config.analysis.window, 2);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchdepsConfig {
    /// Dependency analysis settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Report settings.
    #[serde(default)]
    pub output: OutputConfig,
}

impl PatchdepsConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PatchdepsError::Io`] if the file cannot be read, or
    /// [`PatchdepsError::Toml`] if the content is not valid TOML.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use patchdeps_core::PatchdepsConfig;
    /// use std::path::Path;
    ///
    /// let config = PatchdepsConfig::from_file(Path::new(".patchdeps.toml")).unwrap();
    /// ```
    pub fn from_file(path: &Path) -> Result<Self, PatchdepsError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PatchdepsError::Toml`] if parsing fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use patchdeps_core::{AnalysisMode, PatchdepsConfig};
    ///
    /// let toml = r#"
    /// [analysis]
    /// mode = "file"
    /// "#;
    /// let config = PatchdepsConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.analysis.mode, AnalysisMode::File);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, PatchdepsError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }
}

/// Dependency analysis configuration.
///
/// # Examples
///
/// ```
/// use patchdeps_core::{AnalysisConfig, AnalysisMode};
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.mode, AnalysisMode::Line);
/// assert_eq!(config.effective_context_lines(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// File-level or line-level analysis (default: line).
    #[serde(default)]
    pub mode: AnalysisMode,
    /// Proximity window in lines; 0 only reports hard dependencies (default: 2).
    #[serde(default = "default_window")]
    pub window: u32,
    /// Context lines requested when diffing git commits (default: the window).
    pub context_lines: Option<u32>,
    /// Glob patterns of paths excluded from analysis.
    #[serde(default)]
    pub skip_patterns: Vec<String>,
}

fn default_window() -> u32 {
    2
}

impl AnalysisConfig {
    /// Context lines to request from git: the explicit setting, else the window.
    pub fn effective_context_lines(&self) -> u32 {
        self.context_lines.unwrap_or(self.window)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            mode: AnalysisMode::default(),
            window: default_window(),
            context_lines: None,
            skip_patterns: Vec::new(),
        }
    }
}

/// Report configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Report format (default: matrix).
    #[serde(default)]
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let config = PatchdepsConfig::default();
        assert_eq!(config.analysis.mode, AnalysisMode::Line);
        assert_eq!(config.analysis.window, 2);
        assert!(config.analysis.context_lines.is_none());
        assert!(config.analysis.skip_patterns.is_empty());
        assert_eq!(config.output.format, OutputFormat::Matrix);
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
[analysis]
mode = "file"
window = 0
context_lines = 5
skip_patterns = ["Cargo.lock", "docs/**"]

[output]
format = "dot"
"#;
        let config = PatchdepsConfig::from_toml(toml).unwrap();
        assert_eq!(config.analysis.mode, AnalysisMode::File);
        assert_eq!(config.analysis.window, 0);
        assert_eq!(config.analysis.effective_context_lines(), 5);
        assert_eq!(config.analysis.skip_patterns, vec!["Cargo.lock", "docs/**"]);
        assert_eq!(config.output.format, OutputFormat::Dot);
    }

    #[test]
    fn context_lines_follow_window_when_omitted() {
        let config = PatchdepsConfig::from_toml("[analysis]\nwindow = 4\n").unwrap();
        assert_eq!(config.analysis.effective_context_lines(), 4);
    }

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PatchdepsConfig::from_toml("").unwrap();
        assert_eq!(config.analysis.window, 2);
        assert_eq!(config.output.format, OutputFormat::Matrix);
    }

    #[test]
    fn invalid_toml_returns_error() {
        assert!(PatchdepsConfig::from_toml("{{invalid}}").is_err());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(PatchdepsConfig::from_toml("[analysis]\nmode = \"word\"\n").is_err());
    }
}
