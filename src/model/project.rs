//! Complete result of scanning one project.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use super::endpoint::Endpoint;
use super::graph::DependencyGraph;
use super::source::{FileRecord, PackageRecord};

/// Why a file did not make it into the analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanWarning {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectAnalysis {
    /// Empty until the store assigns one.
    pub id: String,
    pub root_path: String,
    /// Keyed by path relative to the root.
    pub files: BTreeMap<String, FileRecord>,
    /// Keyed by package directory relative to the root.
    pub packages: BTreeMap<String, PackageRecord>,
    pub endpoints: Vec<Endpoint>,
    pub graph: DependencyGraph,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<ScanWarning>,
}

impl ProjectAnalysis {
    pub fn new(root_path: impl Into<String>) -> Self {
        Self {
            root_path: root_path.into(),
            ..Default::default()
        }
    }

    /// Register `file` and its package.
    pub fn add_file(&mut self, file: FileRecord) {
        let package_path = file.package_path().to_string();
        let package = self
            .packages
            .entry(package_path.clone())
            .or_insert_with(|| PackageRecord {
                name: file.package.clone(),
                path: package_path,
                files: Vec::new(),
            });
        package.files.push(file.path.clone());
        self.files.insert(file.path.clone(), file);
    }

    pub fn declaration_count(&self) -> usize {
        self.files.values().map(FileRecord::declaration_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_file_groups_packages_by_directory() {
        let mut analysis = ProjectAnalysis::new("/tmp/p");
        for path in ["main.go", "api/router.go", "api/handlers.go"] {
            analysis.add_file(FileRecord {
                path: path.into(),
                package: if path.starts_with("api") { "api" } else { "main" }.into(),
                ..Default::default()
            });
        }

        assert_eq!(analysis.files.len(), 3);
        assert_eq!(analysis.packages.len(), 2);
        let api = &analysis.packages["api"];
        assert_eq!(api.name, "api");
        assert_eq!(api.files, vec!["api/router.go", "api/handlers.go"]);
        assert_eq!(analysis.packages[""].name, "main");
    }
}
