//! Standalone per-line route patterns.
//!
//! Used for registrations the contextual router pass did not cover. Paths are
//! taken literally; handler and middleware are inferred from nearby lines.

use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use super::paths::normalize;
use super::router::split_handler;
use super::text::split_top_level;
use super::RouteCandidate;
use crate::model::HttpMethod;

/// Lines searched on either side of a match for a handler call.
const HANDLER_WINDOW: usize = 2;

/// Lines searched before a match for middleware.
const MIDDLEWARE_WINDOW: usize = 5;

lazy_static! {
    /// `.GET("/path"` on one line.
    static ref VERB_LITERAL: Regex =
        Regex::new(r#"\.(GET|POST|PUT|DELETE|PATCH|OPTIONS|HEAD|ANY|Any)\s*\(\s*["'`]([^"'`]*)["'`]"#).unwrap();

    /// `.HandleFunc("/path", h).Methods("GET", ...)` on one line.
    static ref HANDLE_METHODS: Regex = Regex::new(
        r#"\.(?:HandleFunc|Handle)\s*\(\s*["'`]([^"'`]*)["'`]\s*,\s*([^)]*?)\s*\)\s*\.Methods\s*\(([^)]*)\)"#
    )
    .unwrap();

    /// An identifier or selector followed by `(`.
    static ref CALL_LIKE: Regex = Regex::new(r"\b([A-Za-z_][\w\.]*)\s*\(").unwrap();

    static ref QUOTED: Regex = Regex::new(r#"["'`]([^"'`]+)["'`]"#).unwrap();

    /// Names that are never handlers.
    static ref NOT_HANDLERS: HashSet<&'static str> = [
        "func", "if", "for", "switch", "return", "go", "defer", "select", "make", "new", "len",
        "append", "panic", "GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS", "HEAD", "ANY",
        "Any", "Group", "Use", "Handle", "HandleFunc", "Methods",
    ]
    .into_iter()
    .collect();
}

/// Lowercase fragments that mark a call as middleware.
const MIDDLEWARE_KEYWORDS: &[&str] = &[
    "middleware", "auth", "cors", "logger", "jwt", "ratelimit", "recovery",
];

/// Scan every line of `content`, skipping 1-indexed lines in `covered`.
pub fn scan(content: &str, covered: &HashSet<usize>) -> Vec<RouteCandidate> {
    let lines: Vec<&str> = content.lines().collect();
    let mut found = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let line_no = i + 1;
        if covered.contains(&line_no) || line.trim_start().starts_with("//") {
            continue;
        }

        if let Some(caps) = HANDLE_METHODS.captures(line) {
            let methods: Vec<HttpMethod> = QUOTED
                .captures_iter(&caps[3])
                .filter_map(|m| HttpMethod::parse(&m[1]))
                .collect();
            let args = split_top_level(&caps[2]);
            let (handler, middlewares) = split_handler(&args);
            for method in methods {
                found.push(RouteCandidate {
                    method,
                    path: normalize(&caps[1]),
                    handler: handler.clone(),
                    middlewares: middlewares.clone(),
                    line: line_no,
                });
            }
            continue;
        }

        if let Some(caps) = VERB_LITERAL.captures(line) {
            let Some(method) = HttpMethod::parse(&caps[1]) else {
                continue;
            };
            let rest = caps.get(0).map(|m| &line[m.end()..]).unwrap_or("");

            let (handler, mut middlewares) = match same_line_arguments(rest) {
                Some(args) => split_handler(&args),
                None => (nearby_handler(&lines, i), Vec::new()),
            };
            if middlewares.is_empty() {
                middlewares = nearby_middlewares(&lines, i);
            }

            found.push(RouteCandidate {
                method,
                path: normalize(&caps[2]),
                handler,
                middlewares,
                line: line_no,
            });
        }
    }

    found
}

/// Arguments after the path literal when the call closes on the same line.
fn same_line_arguments(rest: &str) -> Option<Vec<String>> {
    let rest = rest.trim_start().strip_prefix(',')?;
    let mut depth = 0usize;
    for (i, c) in rest.char_indices() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' if depth == 0 => {
                let args = split_top_level(&rest[..i]);
                return (!args.is_empty()).then_some(args);
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// First call-like identifier on the matched line, then in the lines after
/// it, then in the lines before it.
fn nearby_handler(lines: &[&str], idx: usize) -> String {
    let mut order = vec![idx];
    order.extend((1..=HANDLER_WINDOW).map(|d| idx + d).filter(|&i| i < lines.len()));
    order.extend((1..=HANDLER_WINDOW).filter(|&d| idx >= d).map(|d| idx - d));

    for i in order {
        let line = lines[i];
        // On the matched line, only look past the path literal.
        let text = if i == idx {
            VERB_LITERAL
                .find(line)
                .map(|m| &line[m.end()..])
                .unwrap_or(line)
        } else {
            line
        };
        if text.trim_start().starts_with("//") {
            continue;
        }
        for caps in CALL_LIKE.captures_iter(text) {
            let name = &caps[1];
            let last = name.rsplit('.').next().unwrap_or(name);
            if !NOT_HANDLERS.contains(name) && !NOT_HANDLERS.contains(last) {
                return name.to_string();
            }
        }
    }
    String::new()
}

/// Middleware-looking calls in the lines just before `idx`.
fn nearby_middlewares(lines: &[&str], idx: usize) -> Vec<String> {
    let start = idx.saturating_sub(MIDDLEWARE_WINDOW);
    let mut found: Vec<String> = Vec::new();
    for line in &lines[start..idx] {
        if line.trim_start().starts_with("//") {
            continue;
        }
        for caps in CALL_LIKE.captures_iter(line) {
            let name = &caps[1];
            let lower = name.to_lowercase();
            if MIDDLEWARE_KEYWORDS.iter().any(|k| lower.contains(k))
                && !found.iter().any(|f| f == name)
            {
                found.push(name.to_string());
            }
        }
    }
    found
}
