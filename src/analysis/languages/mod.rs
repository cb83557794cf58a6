//! Language-specific extractor implementations.

mod go;

pub use go::{expr_to_string, GoExtractor};

use super::SourceExtractor;
use once_cell::sync::OnceCell;

/// Static storage for Go extractor.
static GO_EXTRACTOR: OnceCell<GoExtractor> = OnceCell::new();

/// Get an extractor for the given file extension.
///
/// Returns None if no extractor handles the extension.
pub fn get_extractor(ext: &str) -> Option<&'static dyn SourceExtractor> {
    match ext {
        "go" => Some(GO_EXTRACTOR.get_or_init(GoExtractor::new) as &'static dyn SourceExtractor),
        _ => None,
    }
}

/// Extensions (without dot) the walker should yield.
pub fn supported_extensions() -> &'static [&'static str] {
    &["go"]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_extractor_by_extension() {
        let go = get_extractor("go").unwrap();
        assert_eq!(go.language_id(), "go");
        assert!(go.handles_extension("go"));
        assert!(get_extractor("rs").is_none());
    }
}
