//! Lexical helpers for scanning Go call sites without a parser.

/// Maximum bytes scanned for the closing parenthesis of a call.
const MAX_CALL_SPAN: usize = 4096;

/// Maps byte offsets to 1-indexed line numbers.
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(content: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(content.match_indices('\n').map(|(i, _)| i + 1));
        Self { starts }
    }

    pub fn line_of(&self, offset: usize) -> usize {
        match self.starts.binary_search(&offset) {
            Ok(idx) => idx + 1,
            Err(idx) => idx,
        }
    }
}

/// Whether `offset` sits after a `//` on its line.
pub fn in_line_comment(content: &str, offset: usize) -> bool {
    let start = content[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    content[start..offset].contains("//")
}

/// Arguments of the call whose `(` is at `open`, split on top-level commas.
///
/// Returns the trimmed arguments and the offset just past the closing `)`.
/// Strings, runes and line comments are skipped while matching brackets.
pub fn call_arguments(content: &str, open: usize) -> Option<(Vec<String>, usize)> {
    let bytes = content.as_bytes();
    if bytes.get(open) != Some(&b'(') {
        return None;
    }

    let limit = (open + MAX_CALL_SPAN).min(bytes.len());
    let mut depth = 0usize;
    let mut i = open;
    while i < limit {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    let inner = &content[open + 1..i];
                    return Some((split_top_level(inner), i + 1));
                }
            }
            quote @ (b'"' | b'\'' | b'`') => {
                i = skip_literal(bytes, i, quote, limit)?;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < limit && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Index of the closing quote of the literal opened at `start`.
fn skip_literal(bytes: &[u8], start: usize, quote: u8, limit: usize) -> Option<usize> {
    let mut i = start + 1;
    while i < limit {
        match bytes[i] {
            b'\\' if quote != b'`' => i += 1,
            b if b == quote => return Some(i),
            b'\n' if quote != b'`' => return None,
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split on commas that are not nested in brackets or literals.
///
/// Line comments are dropped. An unterminated literal ends at its line.
pub fn split_top_level(text: &str) -> Vec<String> {
    let bytes = text.as_bytes();
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth = depth.saturating_sub(1),
            quote @ (b'"' | b'\'' | b'`') => {
                i = skip_literal(bytes, i, quote, bytes.len())
                    .unwrap_or_else(|| line_end(bytes, i));
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                current.push_str(&text[start..i]);
                i = line_end(bytes, i);
                start = i;
                continue;
            }
            b',' if depth == 0 => {
                current.push_str(&text[start..i]);
                parts.push(current.trim().to_string());
                current.clear();
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    current.push_str(&text[start.min(text.len())..]);
    let last = current.trim();
    if !last.is_empty() {
        parts.push(last.to_string());
    }
    parts.retain(|p| !p.is_empty());
    parts
}

/// Offset of the newline ending the line that contains `from`, or the end of input.
fn line_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |p| from + p)
}

/// Contents of a Go string literal argument, if `arg` is one.
pub fn string_literal(arg: &str) -> Option<&str> {
    let arg = arg.trim();
    if arg.len() < 2 {
        return None;
    }
    let first = arg.as_bytes()[0];
    let last = arg.as_bytes()[arg.len() - 1];
    if matches!(first, b'"' | b'`' | b'\'') && first == last {
        Some(&arg[1..arg.len() - 1])
    } else {
        None
    }
}
