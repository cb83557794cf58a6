//! Settings and policy value objects.
//!
//! [`AnalysisConfig`] decides which files a scan looks at, [`FilterConfig`]
//! narrows stored nodes at query time, and [`ScanLimits`] bounds the work a
//! single scan may do. [`Settings`] bundles them for the `apiscope.yaml` file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Default settings file names to search for.
pub const DEFAULT_SETTINGS_NAMES: &[&str] = &["apiscope.yaml", ".apiscope.yaml"];

/// Scan-time inclusion policy.
///
/// All matching is substring-based and case-sensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub blacklist_files: Vec<String>,
    #[serde(default)]
    pub blacklist_dirs: Vec<String>,
    #[serde(default)]
    pub whitelist_files: Vec<String>,
    #[serde(default)]
    pub whitelist_dirs: Vec<String>,
    #[serde(default)]
    pub include_vendor: bool,
    #[serde(default)]
    pub include_test_file: bool,
}

/// Query-time filter policy. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub node_types: Vec<String>,
    #[serde(default)]
    pub file_extensions: Vec<String>,
    #[serde(default)]
    pub package_names: Vec<String>,
    #[serde(default)]
    pub function_names: Vec<String>,
    #[serde(default)]
    pub blacklist_files: Vec<String>,
    #[serde(default)]
    pub blacklist_dirs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_complexity: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_complexity: Option<i64>,
}

impl FilterConfig {
    /// Parse a filter from a YAML or JSON file (JSON is valid YAML).
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::system_with(format!("failed to read filter {}", path.display()), e)
        })?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::validation(format!("invalid filter {}: {}", path.display(), e)))
    }
}

/// Caller-side caps checked before extraction starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScanLimits {
    /// Maximum number of candidate files in one scan.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Files larger than this many bytes are skipped with a warning.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Maximum total bytes of candidate files in one scan.
    #[serde(default = "default_max_project_size")]
    pub max_project_size: u64,
}

fn default_max_files() -> usize {
    10_000
}

fn default_max_file_size() -> u64 {
    1024 * 1024
}

fn default_max_project_size() -> u64 {
    100 * 1024 * 1024
}

impl Default for ScanLimits {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_file_size: default_max_file_size(),
            max_project_size: default_max_project_size(),
        }
    }
}

/// Contents of an `apiscope.yaml` file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub limits: ScanLimits,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            limits: ScanLimits::default(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Parse settings from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::system_with(format!("failed to read settings {}", path.display()), e)
        })?;
        serde_yaml::from_str(&content)
            .map_err(|e| Error::validation(format!("invalid settings {}: {}", path.display(), e)))
    }

    /// Load `explicit` if given, otherwise the first default file found in `dir`,
    /// otherwise defaults.
    pub fn load(explicit: Option<&Path>, dir: &Path) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::parse_file(path);
        }
        match discover(dir) {
            Some(path) => Self::parse_file(path),
            None => Ok(Self::default()),
        }
    }
}

/// Find a settings file in `dir`.
pub fn discover(dir: &Path) -> Option<PathBuf> {
    DEFAULT_SETTINGS_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_settings_defaults() {
        let settings: Settings = serde_yaml::from_str("{}").unwrap();
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.limits.max_file_size, 1024 * 1024);
        assert_eq!(settings.limits.max_project_size, 100 * 1024 * 1024);
        assert!(!settings.analysis.include_vendor);
    }

    #[test]
    fn test_settings_partial_yaml() {
        let yaml = r#"
analysis:
  blacklist_dirs: ["internal/legacy"]
  include_test_file: true
limits:
  max_files: 50
log_level: debug
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.analysis.blacklist_dirs, vec!["internal/legacy"]);
        assert!(settings.analysis.include_test_file);
        assert_eq!(settings.limits.max_files, 50);
        assert_eq!(settings.limits.max_file_size, 1024 * 1024);
        assert_eq!(settings.log_level, "debug");
    }

    #[test]
    fn test_filter_from_json() {
        let json = r#"{"node_types": ["function"], "min_complexity": 10}"#;
        let filter: FilterConfig = serde_yaml::from_str(json).unwrap();
        assert_eq!(filter.node_types, vec!["function"]);
        assert_eq!(filter.min_complexity, Some(10));
        assert_eq!(filter.max_complexity, None);
    }

    #[test]
    fn test_load_discovers_default_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path()).is_none());

        let mut file = fs::File::create(dir.path().join(".apiscope.yaml")).unwrap();
        writeln!(file, "log_level: warn").unwrap();

        let settings = Settings::load(None, dir.path()).unwrap();
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_invalid_settings_is_validation_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apiscope.yaml");
        fs::write(&path, "limits: [not, a, map]").unwrap();

        let err = Settings::parse_file(&path).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }
}
