//! HTTP endpoint discovery.
//!
//! Discovery is lexical: routing idioms are recognized in source text, not
//! type-checked. Each file goes through two strategies:
//!
//! - `router`: contextual multi-pass analysis (groups, engines, middleware) for
//!   files that look like routing code
//! - `patterns`: standalone single-line patterns for anything the first pass
//!   did not cover
//!
//! Results are deduplicated by (method, path), first discovery wins, and
//! sorted by path.

mod hints;
mod paths;
mod patterns;
mod router;
mod text;

pub use paths::{combine, normalize, path_params, top_level};
pub use router::is_router_file;

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;

use crate::logging::{Event, SharedLogger};
use crate::model::{Endpoint, FileRecord, HttpMethod, ProjectAnalysis, ScanWarning};

lazy_static! {
    /// Calls that hand a router to code elsewhere, e.g. `api.SetupRoutes(r)`.
    static ref INDIRECT_REGISTRATION: Regex =
        Regex::new(r"\b(?:[\w\.]+\.)?(?:Setup|Register)\w*Routes?\s*\([^)]*\)").unwrap();
}

/// Lowercase path fragments that mark a setup file.
const SETUP_FILE_KEYWORDS: &[&str] = &["main.go", "router", "route", "setup"];

/// A route found by one of the strategies, before identity is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RouteCandidate {
    pub method: HttpMethod,
    /// Full path.
    pub path: String,
    pub handler: String,
    pub middlewares: Vec<String>,
    pub line: usize,
}

/// Output of [`EndpointDiscoverer::discover`].
#[derive(Debug, Default)]
pub struct Discovery {
    /// Unique by (method, path), sorted by path.
    pub endpoints: Vec<Endpoint>,
    /// One entry per dropped duplicate.
    pub warnings: Vec<ScanWarning>,
}

pub struct EndpointDiscoverer {
    logger: SharedLogger,
}

impl EndpointDiscoverer {
    pub fn new(logger: SharedLogger) -> Self {
        Self { logger }
    }

    /// Discover endpoints across every file of `analysis`.
    pub fn discover(&self, analysis: &ProjectAnalysis) -> Discovery {
        let mut discovery = Discovery::default();
        let mut seen: HashMap<(HttpMethod, String), String> = HashMap::new();

        for file in analysis.files.values() {
            for candidate in self.discover_file(file) {
                let key = (candidate.method, candidate.path.clone());
                if let Some(first) = seen.get(&key) {
                    self.logger.log(&Event::DuplicateEndpoint {
                        method: candidate.method.to_string(),
                        path: candidate.path.clone(),
                        file: file.path.clone(),
                    });
                    discovery.warnings.push(ScanWarning {
                        path: file.path.clone(),
                        message: format!(
                            "duplicate endpoint {} {} at line {} (first defined in {})",
                            candidate.method, candidate.path, candidate.line, first
                        ),
                    });
                    continue;
                }
                seen.insert(key, file.path.clone());

                let mut endpoint = Endpoint {
                    id: uuid::Uuid::new_v4().to_string(),
                    method: candidate.method,
                    path_params: path_params(&candidate.path),
                    path: candidate.path,
                    handler: candidate.handler,
                    file: file.path.clone(),
                    package: file.package.clone(),
                    line: candidate.line,
                    middlewares: candidate.middlewares,
                    query_params: Vec::new(),
                    request_type: None,
                    response_type: None,
                };
                hints::apply(&mut endpoint, analysis);
                discovery.endpoints.push(endpoint);
            }
        }

        self.report_indirect_registrations(analysis);

        // Stable: equal paths keep discovery order.
        discovery.endpoints.sort_by(|a, b| a.path.cmp(&b.path));
        discovery
    }

    /// Contextual pass first, then standalone patterns on uncovered lines.
    fn discover_file(&self, file: &FileRecord) -> Vec<RouteCandidate> {
        let mut candidates = if is_router_file(&file.content) {
            router::analyze(&file.content)
        } else {
            Vec::new()
        };

        let covered: HashSet<usize> = candidates.iter().map(|c| c.line).collect();
        candidates.extend(patterns::scan(&file.content, &covered));
        candidates
    }

    /// Setup files that delegate route registration are reported, never expanded.
    fn report_indirect_registrations(&self, analysis: &ProjectAnalysis) {
        for file in analysis.files.values() {
            let lower = file.path.to_lowercase();
            if !SETUP_FILE_KEYWORDS.iter().any(|k| lower.contains(k)) {
                continue;
            }
            let lines = text::LineIndex::new(&file.content);
            for m in INDIRECT_REGISTRATION.find_iter(&file.content) {
                if text::in_line_comment(&file.content, m.start()) {
                    continue;
                }
                self.logger.log(&Event::IndirectRegistration {
                    file: file.path.clone(),
                    line: lines.line_of(m.start()),
                    call: m.as_str().to_string(),
                });
            }
        }
    }
}
