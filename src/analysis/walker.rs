//! Source tree traversal with include/exclude policy.
//!
//! Directory rules, in order: vendor (unless included), hidden, blacklisted,
//! not whitelisted. File rules, in order: test files (unless included),
//! blacklisted, not whitelisted. Matching is substring-based and case-sensitive
//! against the `/`-separated path relative to the root.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::analysis::languages::supported_extensions;
use crate::config::AnalysisConfig;
use crate::error::{Error, Result};

/// Candidate source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub absolute: PathBuf,
    /// `/`-separated path relative to the root.
    pub relative: String,
}

/// Walks a project root, yielding the files a scan should extract.
#[derive(Debug, Clone)]
pub struct SourceWalker {
    root: PathBuf,
    config: AnalysisConfig,
}

impl SourceWalker {
    /// Validate `root` and build a walker over it.
    pub fn new<P: AsRef<Path>>(root: P, config: AnalysisConfig) -> Result<Self> {
        let root = root.as_ref();
        if root.as_os_str().is_empty() {
            return Err(Error::validation("project path is required"));
        }
        let metadata = fs::metadata(root).map_err(|e| {
            Error::validation(format!("invalid project path {}: {}", root.display(), e))
        })?;
        if !metadata.is_dir() {
            return Err(Error::validation(format!(
                "project path is not a directory: {}",
                root.display()
            )));
        }

        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the tree. Each call starts a fresh traversal.
    ///
    /// An I/O error is yielded as a system error; callers treat it as fatal.
    /// Symlinked directories are not entered; symlinked files are read.
    pub fn iter(&self) -> impl Iterator<Item = Result<SourceFile>> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| !entry.file_type().is_dir() || self.keep_dir(entry))
            .filter_map(move |entry| match entry {
                Err(e) => Some(Err(Error::system_with(
                    format!("failed to walk {}", self.root.display()),
                    e,
                ))),
                Ok(entry) if entry.file_type().is_file() => self.keep_file(&entry).map(Ok),
                Ok(entry) if entry.path_is_symlink() && entry.path().is_file() => {
                    self.keep_file(&entry).map(Ok)
                }
                Ok(_) => None,
            })
    }

    /// Walk the whole tree, failing on the first I/O error.
    pub fn collect(&self) -> Result<Vec<SourceFile>> {
        self.iter().collect()
    }

    fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    fn keep_dir(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }

        let name = entry.file_name().to_string_lossy();
        if !self.config.include_vendor && name == "vendor" {
            return false;
        }
        if name.starts_with('.') {
            return false;
        }

        let rel = self.relative(entry.path());
        if self.config.blacklist_dirs.iter().any(|b| rel.contains(b.as_str())) {
            return false;
        }

        // Ancestors of a whitelisted directory stay open so traversal can reach it.
        if !self.config.whitelist_dirs.is_empty() {
            let prefix = format!("{}/", rel);
            return self
                .config
                .whitelist_dirs
                .iter()
                .any(|w| rel.contains(w.as_str()) || w.starts_with(&prefix));
        }

        true
    }

    fn keep_file(&self, entry: &DirEntry) -> Option<SourceFile> {
        let path = entry.path();
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !supported_extensions().contains(&ext) {
            return None;
        }

        let name = entry.file_name().to_string_lossy();
        if !self.config.include_test_file && name.ends_with("_test.go") {
            return None;
        }

        let rel = self.relative(path);
        let matches = |token: &String| name.contains(token.as_str()) || rel.contains(token.as_str());

        if self.config.blacklist_files.iter().any(matches) {
            return None;
        }
        if !self.config.whitelist_files.is_empty() && !self.config.whitelist_files.iter().any(matches) {
            return None;
        }

        if !self.config.whitelist_dirs.is_empty() {
            let dir = match rel.rfind('/') {
                Some(idx) => &rel[..idx],
                None => "",
            };
            if !self.config.whitelist_dirs.iter().any(|w| dir.contains(w.as_str())) {
                return None;
            }
        }

        Some(SourceFile {
            absolute: path.to_path_buf(),
            relative: rel,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "package x\n").unwrap();
    }

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        for rel in [
            "main.go",
            "main_test.go",
            "README.md",
            "api/router.go",
            "api/v1/users.go",
            "internal/legacy/old.go",
            "internal/store/db.go",
            "internal/store/db_mock.go",
            "vendor/lib/lib.go",
            ".git/hooks/x.go",
        ] {
            touch(dir.path(), rel);
        }
        dir
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_does_not_fail_walk() {
        let dir = tree();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("api/loop")).unwrap();
        std::os::unix::fs::symlink(
            dir.path().join("api/router.go"),
            dir.path().join("linked.go"),
        )
        .unwrap();

        let files = walk(dir.path(), AnalysisConfig::default());
        assert!(files.contains(&"linked.go".to_string()));
        assert!(files.contains(&"api/router.go".to_string()));
        assert!(files.iter().all(|f| !f.starts_with("api/loop")));
    }

    fn walk(root: &Path, config: AnalysisConfig) -> Vec<String> {
        SourceWalker::new(root, config)
            .unwrap()
            .collect()
            .unwrap()
            .into_iter()
            .map(|f| f.relative)
            .collect()
    }

    #[test]
    fn test_default_policy() {
        let dir = tree();
        let files = walk(dir.path(), AnalysisConfig::default());
        assert_eq!(
            files,
            vec![
                "api/router.go",
                "api/v1/users.go",
                "internal/legacy/old.go",
                "internal/store/db.go",
                "internal/store/db_mock.go",
                "main.go",
            ]
        );
    }

    #[test]
    fn test_vendor_and_tests_included_on_request() {
        let dir = tree();
        let config = AnalysisConfig {
            include_vendor: true,
            include_test_file: true,
            ..Default::default()
        };
        let files = walk(dir.path(), config);
        assert!(files.contains(&"vendor/lib/lib.go".to_string()));
        assert!(files.contains(&"main_test.go".to_string()));
        assert!(!files.iter().any(|f| f.starts_with(".git")));
    }

    #[test]
    fn test_blacklists() {
        let dir = tree();
        let config = AnalysisConfig {
            blacklist_dirs: vec!["legacy".into()],
            blacklist_files: vec!["_mock".into(), "api/v1".into()],
            ..Default::default()
        };
        let files = walk(dir.path(), config);
        assert_eq!(files, vec!["api/router.go", "internal/store/db.go", "main.go"]);
    }

    #[test]
    fn test_whitelists() {
        let dir = tree();
        let config = AnalysisConfig {
            whitelist_dirs: vec!["internal/store".into()],
            ..Default::default()
        };
        let files = walk(dir.path(), config);
        assert_eq!(files, vec!["internal/store/db.go", "internal/store/db_mock.go"]);

        let config = AnalysisConfig {
            whitelist_files: vec!["router".into(), "main".into()],
            ..Default::default()
        };
        let files = walk(dir.path(), config);
        assert_eq!(files, vec!["api/router.go", "main.go"]);
    }

    #[test]
    fn test_walk_is_restartable() {
        let dir = tree();
        let walker = SourceWalker::new(dir.path(), AnalysisConfig::default()).unwrap();
        let first: Vec<_> = walker.iter().collect::<Result<_>>().unwrap();
        let second: Vec<_> = walker.iter().collect::<Result<_>>().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_root_is_validation_error() {
        let dir = TempDir::new().unwrap();
        let err = SourceWalker::new(dir.path().join("nope"), AnalysisConfig::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);

        let err = SourceWalker::new("", AnalysisConfig::default()).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Validation);
    }
}
