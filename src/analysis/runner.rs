//! Per-project scan pipeline.
//!
//! Walk, enforce limits, extract every file (in parallel), then run the
//! project-wide endpoint and dependency passes over the merged file set.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use rayon::prelude::*;

use crate::analysis::languages::get_extractor;
use crate::analysis::walker::{SourceFile, SourceWalker};
use crate::config::{AnalysisConfig, ScanLimits};
use crate::endpoints::EndpointDiscoverer;
use crate::error::{Error, Result};
use crate::graph::GraphBuilder;
use crate::logging::{tracing_logger, Event, SharedLogger};
use crate::model::{FileRecord, ProjectAnalysis, ScanWarning};

/// Builds a [`ProjectAnalysis`] from a directory.
pub struct Scanner {
    config: AnalysisConfig,
    limits: ScanLimits,
    logger: SharedLogger,
}

impl Scanner {
    /// Create a scanner with default limits and a tracing logger.
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            limits: ScanLimits::default(),
            logger: tracing_logger(),
        }
    }

    pub fn with_limits(mut self, limits: ScanLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_logger(mut self, logger: SharedLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Scan `root`.
    ///
    /// Files that fail to parse are skipped and recorded as warnings. Traversal
    /// and read failures abort the scan.
    pub fn scan<P: AsRef<Path>>(&self, root: P) -> Result<ProjectAnalysis> {
        let root = root.as_ref();
        let root_display = root.display().to_string();
        self.logger.log(&Event::ScanStarted {
            root: root_display.clone(),
        });

        let walker = SourceWalker::new(root, self.config.clone())?;
        let mut analysis = ProjectAnalysis::new(root_display.clone());

        let candidates = self.apply_limits(walker.collect()?, &mut analysis.warnings)?;

        let results: Vec<_> = candidates
            .par_iter()
            .map(extract_file)
            .collect();

        // par_iter preserves input order, so records arrive sorted by path.
        for (file, result) in candidates.iter().zip(results) {
            match result? {
                Ok(record) => analysis.add_file(record),
                Err(e) => {
                    self.logger.log(&Event::ParseFailed {
                        path: file.relative.clone(),
                        error: e.to_string(),
                    });
                    analysis.warnings.push(ScanWarning {
                        path: file.relative.clone(),
                        message: format!("parse failed: {}", e),
                    });
                }
            }
        }

        let discovery = EndpointDiscoverer::new(Arc::clone(&self.logger)).discover(&analysis);
        analysis.endpoints = discovery.endpoints;
        analysis.warnings.extend(discovery.warnings);
        analysis.graph = GraphBuilder::new().build(&analysis);

        self.logger.log(&Event::ScanCompleted {
            root: root_display,
            files: analysis.files.len(),
            nodes: analysis.declaration_count(),
            endpoints: analysis.endpoints.len(),
            warnings: analysis.warnings.len(),
        });

        Ok(analysis)
    }

    /// Drop oversized files and reject scans over the file-count or total-size caps.
    fn apply_limits(
        &self,
        files: Vec<SourceFile>,
        warnings: &mut Vec<ScanWarning>,
    ) -> Result<Vec<SourceFile>> {
        if files.len() > self.limits.max_files {
            return Err(Error::validation(format!(
                "project has {} source files, limit is {}",
                files.len(),
                self.limits.max_files
            )));
        }

        let mut kept = Vec::with_capacity(files.len());
        let mut total: u64 = 0;
        for file in files {
            let size = fs::metadata(&file.absolute)
                .map_err(|e| {
                    Error::system_with(format!("failed to stat {}", file.absolute.display()), e)
                })?
                .len();

            if size > self.limits.max_file_size {
                let reason = format!(
                    "file is {} bytes, limit is {}",
                    size, self.limits.max_file_size
                );
                self.logger.log(&Event::FileSkipped {
                    path: file.relative.clone(),
                    reason: reason.clone(),
                });
                warnings.push(ScanWarning {
                    path: file.relative.clone(),
                    message: reason,
                });
                continue;
            }

            total += size;
            if total > self.limits.max_project_size {
                return Err(Error::validation(format!(
                    "project exceeds {} bytes of source",
                    self.limits.max_project_size
                )));
            }
            kept.push(file);
        }
        Ok(kept)
    }
}

/// Read and extract one file.
///
/// The outer result carries fatal read failures, the inner one recoverable
/// parse failures.
fn extract_file(file: &SourceFile) -> Result<anyhow::Result<FileRecord>> {
    let source = fs::read(&file.absolute).map_err(|e| {
        Error::system_with(format!("failed to read {}", file.absolute.display()), e)
    })?;

    let ext = file
        .absolute
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    let Some(extractor) = get_extractor(ext) else {
        return Ok(Err(anyhow::anyhow!("no extractor for .{} files", ext)));
    };

    Ok(extractor
        .parse(&file.absolute, &source)
        .and_then(|parsed| extractor.extract(&parsed, &file.relative)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::RecordingLogger;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_parse_failure_is_recovered() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "ok.go", "package main\n\nfunc main() {}\n");
        write(dir.path(), "bad.go", "package main\n\nfunc broken( {\n");

        let logger = Arc::new(RecordingLogger::new());
        let analysis = Scanner::new(AnalysisConfig::default())
            .with_logger(logger.clone())
            .scan(dir.path())
            .unwrap();

        assert_eq!(analysis.files.len(), 1);
        assert!(analysis.files.contains_key("ok.go"));
        assert_eq!(analysis.warnings.len(), 1);
        assert_eq!(analysis.warnings[0].path, "bad.go");
        assert!(logger
            .events()
            .iter()
            .any(|e| matches!(e, Event::ParseFailed { path, .. } if path == "bad.go")));
    }

    #[test]
    fn test_oversized_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "small.go", "package main\n");
        write(
            dir.path(),
            "big.go",
            &format!("package main\n\n// {}\n", "x".repeat(200)),
        );

        let limits = ScanLimits {
            max_file_size: 64,
            ..Default::default()
        };
        let analysis = Scanner::new(AnalysisConfig::default())
            .with_limits(limits)
            .with_logger(Arc::new(RecordingLogger::new()))
            .scan(dir.path())
            .unwrap();

        assert_eq!(analysis.files.keys().collect::<Vec<_>>(), vec!["small.go"]);
        assert_eq!(analysis.warnings[0].path, "big.go");
    }

    #[test]
    fn test_file_count_limit_rejects_scan() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.go", "package main\n");
        write(dir.path(), "b.go", "package main\n");

        let limits = ScanLimits {
            max_files: 1,
            ..Default::default()
        };
        let err = Scanner::new(AnalysisConfig::default())
            .with_limits(limits)
            .with_logger(Arc::new(RecordingLogger::new()))
            .scan(dir.path())
            .unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }
}
