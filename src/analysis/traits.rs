//! Core traits for source extraction.

use std::path::Path;

use crate::model::FileRecord;

/// Holds a parsed tree-sitter tree and the source it was parsed from.
///
/// The tree never leaves the extractor; only [`FileRecord`]s do.
pub struct ParsedFile {
    /// The tree-sitter parse tree.
    pub tree: tree_sitter::Tree,
    /// The source, valid UTF-8 (kept for node text extraction).
    pub source: Vec<u8>,
    /// The file path (for error reporting).
    pub path: String,
}

impl ParsedFile {
    /// Get the source code as a string slice.
    pub fn source_str(&self) -> &str {
        std::str::from_utf8(&self.source).unwrap_or("")
    }

    /// Get text for a tree-sitter node.
    ///
    /// Returns an empty string when the node's byte range does not map back
    /// into the source.
    pub fn node_text(&self, node: tree_sitter::Node) -> &str {
        self.source
            .get(node.start_byte()..node.end_byte())
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .unwrap_or("")
    }

    /// First syntax error in the tree, as `(line, column)`, 1-indexed.
    pub fn first_error(&self) -> Option<(usize, usize)> {
        let root = self.tree.root_node();
        if !root.has_error() {
            return None;
        }

        let mut cursor = root.walk();
        loop {
            let node = cursor.node();
            if node.is_error() || node.is_missing() {
                let pos = node.start_position();
                return Some((pos.row + 1, pos.column + 1));
            }
            // Descend only into subtrees that contain the error.
            if node.has_error() && cursor.goto_first_child() {
                continue;
            }
            loop {
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    let pos = root.start_position();
                    return Some((pos.row + 1, pos.column + 1));
                }
            }
        }
    }
}

/// Language-specific extractor.
///
/// # Thread Safety
///
/// tree_sitter::Parser is not Sync, so implementations create a parser per call.
pub trait SourceExtractor: Send + Sync {
    /// Returns the language identifier (e.g., "go").
    fn language_id(&self) -> &'static str;

    /// Returns file extensions this extractor handles (without dot).
    fn file_extensions(&self) -> &'static [&'static str];

    /// Parse a source file into a tree-sitter tree.
    ///
    /// Partial parse errors are still returned as a valid tree with ERROR nodes.
    fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile>;

    /// Flatten a parsed file into a [`FileRecord`].
    ///
    /// Fails when the tree contains syntax errors.
    fn extract(&self, parsed: &ParsedFile, relative_path: &str) -> anyhow::Result<FileRecord>;

    /// Check if this extractor handles the given file extension.
    fn handles_extension(&self, ext: &str) -> bool {
        self.file_extensions().contains(&ext)
    }
}
