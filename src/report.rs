//! Wire envelopes and terminal output.
//!
//! The envelope types are the request/response shapes a REST front end
//! exchanges with the service. The `write_*` functions render results for a
//! terminal, in color when stdout is a TTY.

use colored::*;
use serde::{Deserialize, Serialize};

use crate::config::{AnalysisConfig, FilterConfig};
use crate::error::{Error, Result};
use crate::filter::{FilterResult, FilterSuggestions};
use crate::model::{CodeNode, Dependency, DependencyGraph, Endpoint, HttpMethod, ProjectAnalysis};
use crate::service::ProjectStats;
use crate::store::PageResult;

// =============================================================================
// Envelopes
// =============================================================================

/// Response envelope carried by every reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Failure envelope; `message` carries the error kind.
    pub fn failure(err: &Error) -> Self {
        Self {
            success: false,
            message: Some(err.kind().to_string()),
            data: None,
            error: Some(err.to_string()),
        }
    }
}

/// Envelope for one page of results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
    pub total_pages: usize,
}

impl<T> From<PageResult<T>> for PaginatedResponse<T> {
    fn from(page: PageResult<T>) -> Self {
        let total_pages = page.total_pages();
        Self {
            success: true,
            message: None,
            data: page.items,
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages,
        }
    }
}

/// Body of a scan request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub project_path: String,
    #[serde(flatten)]
    pub config: AnalysisConfig,
}

impl ScanRequest {
    pub fn validate(&self) -> Result<()> {
        if self.project_path.trim().is_empty() {
            return Err(Error::validation("project_path is required"));
        }
        Ok(())
    }
}

/// Body of a filter request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRequest {
    #[serde(flatten)]
    pub filter: FilterConfig,
}

/// Print `value` as indented JSON on stdout.
pub fn write_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

fn write_header(title: &str, path: &str) {
    println!();
    print!("  ");
    print!("{}", "apiscope".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print!("  {}", format!("{:<10}", title).dimmed());
    println!("{}", path);
    println!();
}

fn method_tag(method: HttpMethod) -> ColoredString {
    let tag = format!("{:<7}", method.as_str());
    match method {
        HttpMethod::Get => tag.green(),
        HttpMethod::Post => tag.yellow(),
        HttpMethod::Put | HttpMethod::Patch => tag.blue(),
        HttpMethod::Delete => tag.red(),
        _ => tag.magenta(),
    }
}

/// Summary of a completed scan.
pub fn write_scan_summary(analysis: &ProjectAnalysis, stats: &ProjectStats) {
    write_header("Scanned:", &analysis.root_path);

    println!(
        "  {} files  {} packages  {} nodes  {} endpoints  {} dependencies",
        stats.total_files.to_string().bold(),
        stats.total_packages.to_string().bold(),
        stats.total_nodes.to_string().bold(),
        stats.total_endpoints.to_string().bold(),
        stats.total_dependencies.to_string().bold(),
    );
    println!();

    println!("  {}", "Nodes:".bold());
    for (kind, count) in &stats.nodes_by_kind {
        println!("    {:<12} {:>5}", kind, count);
    }
    println!();

    if !analysis.endpoints.is_empty() {
        write_endpoint_list(&analysis.endpoints);
        println!();
    }

    write_warnings(analysis);
}

fn write_warnings(analysis: &ProjectAnalysis) {
    if analysis.warnings.is_empty() {
        println!("  {}", "✓ no warnings".green());
        println!();
        return;
    }
    println!("  {} ({}):", "Warnings".yellow().bold(), analysis.warnings.len());
    for w in &analysis.warnings {
        println!("    {}  {}", w.path.blue(), w.message);
    }
    println!();
}

fn write_endpoint_list(endpoints: &[Endpoint]) {
    println!("  {} ({}):", "Endpoints".bold(), endpoints.len());
    println!();
    for e in endpoints {
        print!("    {} {:<36}", method_tag(e.method), e.path);
        if !e.handler.is_empty() {
            print!(" {}", e.handler);
        }
        println!();

        print!("            {}", e.file.blue());
        print!("{}", format!(":{}", e.line).dimmed());
        if !e.middlewares.is_empty() {
            print!("  {}", format!("[{}]", e.middlewares.join(", ")).dimmed());
        }
        println!();
    }
}

/// Discovered endpoints.
pub fn write_endpoints(root: &str, endpoints: &[Endpoint]) {
    write_header("Project:", root);
    if endpoints.is_empty() {
        println!("  {}", "no endpoints found".dimmed());
        println!();
        return;
    }
    write_endpoint_list(endpoints);
    println!();
}

fn write_node_line(node: &CodeNode) {
    print!("    {:<10}", node.kind().as_str().dimmed());
    print!("{:<32}", node.name.bold());
    print!("{}", node.file.blue());
    if let Some(pos) = node.position {
        print!("{}", format!(":{}", pos.line).dimmed());
    }
    println!();
}

/// One page of nodes.
pub fn write_node_page(root: &str, page: &PageResult<CodeNode>) {
    write_header("Project:", root);
    println!(
        "  {} (page {} of {}, {} total):",
        "Nodes".bold(),
        page.page,
        page.total_pages().max(1),
        page.total
    );
    println!();
    for node in &page.items {
        write_node_line(node);
    }
    println!();
}

/// Nodes that passed a filter.
pub fn write_filter_result(root: &str, result: &FilterResult) {
    write_header("Project:", root);
    println!(
        "  {} {} of {} nodes  {}",
        "Matched".bold(),
        result.nodes.len(),
        result.total,
        format!("({} filters applied)", result.applied_filters).dimmed()
    );
    println!();
    for node in &result.nodes {
        write_node_line(node);
    }
    println!();
}

pub fn write_suggestions(root: &str, s: &FilterSuggestions) {
    write_header("Project:", root);
    let rows = [
        ("Node types", &s.node_types),
        ("Extensions", &s.file_extensions),
        ("Packages", &s.package_names),
        ("Functions", &s.function_names),
    ];
    for (label, values) in rows {
        println!("  {:<12} {}", format!("{}:", label).bold(), values.join(", "));
    }
    println!();
}

pub fn write_stats(stats: &ProjectStats) {
    write_header("Project:", &stats.root_path);

    let totals = [
        ("Files", stats.total_files),
        ("Packages", stats.total_packages),
        ("Nodes", stats.total_nodes),
        ("Endpoints", stats.total_endpoints),
        ("Dependencies", stats.total_dependencies),
        ("Warnings", stats.warnings),
    ];
    for (label, value) in totals {
        println!("  {:<14} {:>6}", label, value.to_string().bold());
    }
    println!();

    let sections = [
        ("Nodes by kind:", &stats.nodes_by_kind),
        ("Files by extension:", &stats.files_by_extension),
        ("Endpoints by method:", &stats.endpoints_by_method),
        ("Endpoints by prefix:", &stats.endpoints_by_prefix),
        ("Endpoints by file:", &stats.endpoints_by_file),
    ];
    for (title, counts) in sections {
        if counts.is_empty() {
            continue;
        }
        println!("  {}", title.bold());
        for (key, count) in counts {
            println!("    {:<30} {:>5}", key, count);
        }
        println!();
    }
}

fn write_edges(edges: &[Dependency]) {
    for d in edges {
        println!(
            "    {} {} {}  {}",
            d.from,
            "→".dimmed(),
            d.to,
            format!("{} ({})", d.kind.as_str(), d.strength).dimmed()
        );
    }
}

/// The whole dependency graph.
pub fn write_graph(root: &str, graph: &DependencyGraph) {
    write_header("Project:", root);
    println!(
        "  {} {} nodes, {} edges",
        "Graph:".bold(),
        graph.nodes.len(),
        graph.dependencies.len()
    );
    println!();
    write_edges(&graph.dependencies);
    println!();
}

/// Edges touching one node, and optionally its neighbours.
pub fn write_node_edges(node: &str, edges: &[Dependency], neighbors: Option<&[CodeNode]>) {
    write_header("Node:", node);
    println!("  {} ({}):", "Edges".bold(), edges.len());
    write_edges(edges);
    println!();
    if let Some(neighbors) = neighbors {
        println!("  {} ({}):", "Neighbours".bold(), neighbors.len());
        for n in neighbors {
            write_node_line(n);
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Page;

    #[test]
    fn test_success_envelope_omits_empty_fields() {
        let json = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": [1, 2]}));
    }

    #[test]
    fn test_failure_envelope_carries_kind_and_error() {
        let err = Error::not_found("project p1 not found");
        let json = serde_json::to_value(ApiResponse::<()>::failure(&err)).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["message"], "not_found");
        assert_eq!(json["error"], "not found: project p1 not found");
        assert!(json.get("data").is_none());
    }

    #[test]
    fn test_paginated_envelope() {
        let items: Vec<u32> = (0..25).collect();
        let response = PaginatedResponse::from(Page::new(3, 10).apply(&items));
        assert_eq!(response.data, vec![20, 21, 22, 23, 24]);
        assert_eq!(response.total, 25);
        assert_eq!(response.total_pages, 3);
        assert_eq!(response.page, 3);
        assert_eq!(response.limit, 10);
    }

    #[test]
    fn test_scan_request_wire_shape() {
        let req: ScanRequest = serde_json::from_str(
            r#"{"project_path": "/src/app", "blacklist_dirs": ["mocks"], "include_vendor": true}"#,
        )
        .unwrap();
        assert_eq!(req.project_path, "/src/app");
        assert_eq!(req.config.blacklist_dirs, vec!["mocks"]);
        assert!(req.config.include_vendor);
        assert!(!req.config.include_test_file);
        assert!(req.validate().is_ok());

        let empty: ScanRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(
            empty.validate().unwrap_err().kind(),
            crate::error::ErrorKind::Validation
        );
    }

    #[test]
    fn test_filter_request_wire_shape() {
        let req: FilterRequest =
            serde_json::from_str(r#"{"node_types": ["function"], "min_complexity": 10}"#).unwrap();
        assert_eq!(req.filter.node_types, vec!["function"]);
        assert_eq!(req.filter.min_complexity, Some(10));
        assert_eq!(req.filter.max_complexity, None);
    }
}
