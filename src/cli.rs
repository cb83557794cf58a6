//! Command-line interface for apiscope.
//!
//! The store is volatile, so every command scans the project, publishes it
//! into a fresh store and then queries that store.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{AnalysisConfig, FilterConfig, Settings};
use crate::export::ExportFormat;
use crate::logging;
use crate::model::{HttpMethod, ProjectAnalysis};
use crate::report::{self, ApiResponse, PaginatedResponse};
use crate::service::{AnalyzerService, Direction};
use crate::store::AnalysisStore;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Static analysis of Go projects: declarations, HTTP endpoints and dependencies.
#[derive(Parser)]
#[command(name = "apiscope")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan a project and print a summary
    Scan(ScanArgs),
    /// List discovered HTTP endpoints
    Endpoints(ProjectArgs),
    /// List declarations, one page at a time
    Nodes(NodesArgs),
    /// Search declarations by name, body, file or package
    Search(SearchArgs),
    /// Filter declarations by kind, package, name or complexity
    Filter(FilterArgs),
    /// Print project statistics
    Stats(ProjectArgs),
    /// Print the dependency graph or the edges of one node
    Graph(GraphArgs),
    /// Export the full analysis as json, yaml or xml
    Export(ExportArgs),
}

/// Options shared by every command.
#[derive(Args)]
pub struct ProjectArgs {
    /// Project root to scan
    pub path: PathBuf,

    /// Path to settings YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format: pretty or json
    #[arg(short, long, default_value = "pretty")]
    pub format: String,

    /// Include vendor directories
    #[arg(long)]
    pub include_vendor: bool,

    /// Include _test.go files
    #[arg(long)]
    pub include_tests: bool,

    /// Skip directories whose path contains this text (repeatable)
    #[arg(long = "exclude-dir")]
    pub exclude_dirs: Vec<String>,

    /// Skip files whose name or path contains this text (repeatable)
    #[arg(long = "exclude-file")]
    pub exclude_files: Vec<String>,

    /// Only scan directories whose path contains this text (repeatable)
    #[arg(long = "only-dir")]
    pub only_dirs: Vec<String>,

    /// Only scan files whose name or path contains this text (repeatable)
    #[arg(long = "only-file")]
    pub only_files: Vec<String>,
}

#[derive(Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Exit non-zero when the scan produced warnings
    #[arg(long)]
    pub strict: bool,
}

#[derive(Args)]
pub struct NodesArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Only list nodes of this kind (function, struct, interface, type, variable, constant)
    #[arg(short, long)]
    pub kind: Option<String>,

    #[arg(long, default_value_t = 1)]
    pub page: usize,

    #[arg(long, default_value_t = 50)]
    pub limit: usize,
}

#[derive(Args)]
pub struct SearchArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Text to search for (case-insensitive)
    pub query: String,

    #[arg(long, default_value_t = 1)]
    pub page: usize,

    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Args)]
pub struct FilterArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Filter definition file (YAML or JSON); flags are added on top
    #[arg(long)]
    pub filter: Option<PathBuf>,

    /// Node kinds to keep (repeatable)
    #[arg(long = "type")]
    pub node_types: Vec<String>,

    /// File extensions to keep (repeatable)
    #[arg(long = "ext")]
    pub extensions: Vec<String>,

    /// Package name fragments to keep (repeatable)
    #[arg(long = "package")]
    pub packages: Vec<String>,

    /// Function name fragments to keep (repeatable)
    #[arg(long = "function")]
    pub functions: Vec<String>,

    /// Drop nodes whose file path contains this text (repeatable)
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,

    #[arg(long)]
    pub min_complexity: Option<i64>,

    #[arg(long)]
    pub max_complexity: Option<i64>,

    /// Print the values available to filter on instead of filtering
    #[arg(long)]
    pub suggest: bool,
}

#[derive(Args)]
pub struct GraphArgs {
    #[command(flatten)]
    pub project: ProjectArgs,

    /// Only show edges touching this node (`package.name.kind`)
    #[arg(short, long)]
    pub node: Option<String>,

    /// With --node, also list neighbouring declarations
    #[arg(long)]
    pub neighbors: bool,

    /// Only show edges touching the handler of a route, e.g. "GET /users/:id"
    #[arg(long, conflicts_with = "node")]
    pub endpoint: Option<String>,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Project root to scan
    pub path: PathBuf,

    /// Path to settings YAML file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Export format: json, yaml or xml
    #[arg(short, long, default_value = "json")]
    pub format: String,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Include vendor directories
    #[arg(long)]
    pub include_vendor: bool,

    /// Include _test.go files
    #[arg(long)]
    pub include_tests: bool,
}

impl ProjectArgs {
    fn json(&self) -> bool {
        self.format == "json"
    }

    /// Flags layered over the settings file.
    fn analysis_config(&self, base: AnalysisConfig) -> AnalysisConfig {
        let mut config = base;
        config.include_vendor |= self.include_vendor;
        config.include_test_file |= self.include_tests;
        config.blacklist_dirs.extend(self.exclude_dirs.iter().cloned());
        config.blacklist_files.extend(self.exclude_files.iter().cloned());
        config.whitelist_dirs.extend(self.only_dirs.iter().cloned());
        config.whitelist_files.extend(self.only_files.iter().cloned());
        config
    }
}

/// Load settings, start logging, then scan and publish the project.
fn open_project(
    path: &Path,
    config_path: Option<&Path>,
    overlay: impl FnOnce(AnalysisConfig) -> AnalysisConfig,
) -> anyhow::Result<(AnalyzerService, Arc<ProjectAnalysis>)> {
    let cwd = std::env::current_dir()?;
    let settings = Settings::load(config_path, &cwd)?;
    logging::init(&settings.log_level);

    let logger = logging::tracing_logger();
    let store = Arc::new(AnalysisStore::new(Arc::clone(&logger)));
    let service = AnalyzerService::new(store, logger).with_limits(settings.limits);
    let analysis = service.analyze(path, overlay(settings.analysis))?;
    Ok((service, analysis))
}

fn open(args: &ProjectArgs) -> anyhow::Result<(AnalyzerService, Arc<ProjectAnalysis>)> {
    if args.format != "pretty" && args.format != "json" {
        anyhow::bail!("invalid format {:?}, must be 'pretty' or 'json'", args.format);
    }
    open_project(&args.path, args.config.as_deref(), |base| {
        args.analysis_config(base)
    })
}

/// Run the scan command.
pub fn run_scan(args: &ScanArgs) -> anyhow::Result<i32> {
    let (service, analysis) = open(&args.project)?;

    if args.project.json() {
        report::write_json(&ApiResponse::ok(analysis.as_ref()).with_message("scan completed"))?;
    } else {
        let stats = service.project_stats(&analysis.id)?;
        report::write_scan_summary(&analysis, &stats);
    }

    if args.strict && !analysis.warnings.is_empty() {
        Ok(EXIT_FAILED)
    } else {
        Ok(EXIT_SUCCESS)
    }
}

/// Run the endpoints command.
pub fn run_endpoints(args: &ProjectArgs) -> anyhow::Result<i32> {
    let (service, analysis) = open(args)?;
    let endpoints = service.endpoints(&analysis.id)?;

    if args.json() {
        report::write_json(&ApiResponse::ok(endpoints))?;
    } else {
        report::write_endpoints(&analysis.root_path, &endpoints);
    }
    Ok(EXIT_SUCCESS)
}

/// Run the nodes command.
pub fn run_nodes(args: &NodesArgs) -> anyhow::Result<i32> {
    let (service, analysis) = open(&args.project)?;
    let page = service.list_nodes(&analysis.id, args.kind.as_deref(), args.page, args.limit)?;

    if args.project.json() {
        report::write_json(&PaginatedResponse::from(page))?;
    } else {
        report::write_node_page(&analysis.root_path, &page);
    }
    Ok(EXIT_SUCCESS)
}

/// Run the search command.
pub fn run_search(args: &SearchArgs) -> anyhow::Result<i32> {
    let (service, analysis) = open(&args.project)?;
    let page = service.search_nodes(&analysis.id, &args.query, args.page, args.limit)?;

    if args.project.json() {
        report::write_json(&PaginatedResponse::from(page))?;
    } else {
        report::write_node_page(&analysis.root_path, &page);
    }
    Ok(EXIT_SUCCESS)
}

/// Run the filter command.
pub fn run_filter(args: &FilterArgs) -> anyhow::Result<i32> {
    let mut filter = match &args.filter {
        Some(path) => FilterConfig::parse_file(path)?,
        None => FilterConfig::default(),
    };
    filter.node_types.extend(args.node_types.iter().cloned());
    filter.file_extensions.extend(args.extensions.iter().cloned());
    filter.package_names.extend(args.packages.iter().cloned());
    filter.function_names.extend(args.functions.iter().cloned());
    filter.blacklist_files.extend(args.exclude.iter().cloned());
    filter.min_complexity = args.min_complexity.or(filter.min_complexity);
    filter.max_complexity = args.max_complexity.or(filter.max_complexity);

    let (service, analysis) = open(&args.project)?;

    if args.suggest {
        let suggestions = service.filter_suggestions(&analysis.id)?;
        if args.project.json() {
            report::write_json(&ApiResponse::ok(suggestions))?;
        } else {
            report::write_suggestions(&analysis.root_path, &suggestions);
        }
        return Ok(EXIT_SUCCESS);
    }

    let result = service.filter_nodes(&analysis.id, filter)?;
    if args.project.json() {
        let message = format!("{} filters applied", result.applied_filters);
        report::write_json(&ApiResponse::ok(&result).with_message(message))?;
    } else {
        report::write_filter_result(&analysis.root_path, &result);
    }
    Ok(EXIT_SUCCESS)
}

/// Run the stats command.
pub fn run_stats(args: &ProjectArgs) -> anyhow::Result<i32> {
    let (service, analysis) = open(args)?;
    let stats = service.project_stats(&analysis.id)?;

    if args.json() {
        report::write_json(&ApiResponse::ok(stats))?;
    } else {
        report::write_stats(&stats);
    }
    Ok(EXIT_SUCCESS)
}

/// Run the graph command.
pub fn run_graph(args: &GraphArgs) -> anyhow::Result<i32> {
    let (service, analysis) = open(&args.project)?;

    if let Some(route) = &args.endpoint {
        let (method, path) = parse_route(route)?;
        let endpoint = service.endpoint_by_route(&analysis.id, method, path)?;
        let edges = service.endpoint_dependencies(&analysis.id, &endpoint.id)?;
        if args.project.json() {
            report::write_json(&ApiResponse::ok(serde_json::json!({
                "endpoint": endpoint,
                "edges": edges,
            })))?;
        } else {
            let title = format!("{} ({})", route.trim(), endpoint.handler);
            report::write_node_edges(&title, &edges, None);
        }
        return Ok(EXIT_SUCCESS);
    }

    let Some(node) = &args.node else {
        let graph = service.graph(&analysis.id)?;
        if args.project.json() {
            report::write_json(&ApiResponse::ok(graph))?;
        } else {
            report::write_graph(&analysis.root_path, &graph);
        }
        return Ok(EXIT_SUCCESS);
    };

    let edges = service.node_edges(&analysis.id, node)?;
    let neighbors = if args.neighbors {
        Some(service.dependency_neighbors(&analysis.id, node, Direction::BOTH)?)
    } else {
        None
    };

    if args.project.json() {
        report::write_json(&ApiResponse::ok(serde_json::json!({
            "node": node,
            "edges": edges,
            "neighbors": neighbors,
        })))?;
    } else {
        report::write_node_edges(node, &edges, neighbors.as_deref());
    }
    Ok(EXIT_SUCCESS)
}

/// Split `"GET /users"` into a method and a path.
fn parse_route(route: &str) -> anyhow::Result<(HttpMethod, &str)> {
    let (method, path) = route
        .trim()
        .split_once(char::is_whitespace)
        .ok_or_else(|| anyhow::anyhow!("invalid route {:?}, expected \"METHOD /path\"", route))?;
    let method = HttpMethod::parse(method)
        .ok_or_else(|| anyhow::anyhow!("unknown HTTP method {:?}", method))?;
    Ok((method, path.trim()))
}

/// Run the export command.
pub fn run_export(args: &ExportArgs) -> anyhow::Result<i32> {
    ExportFormat::parse(&args.format)?;
    let (service, analysis) = open_project(&args.path, args.config.as_deref(), |mut base| {
        base.include_vendor |= args.include_vendor;
        base.include_test_file |= args.include_tests;
        base
    })?;
    let text = service.export_project(&analysis.id, &args.format)?;

    match &args.output {
        Some(path) => {
            std::fs::write(path, &text)?;
            eprintln!("Exported {} to {}", args.format, path.display());
        }
        None => print!("{}", text),
    }
    Ok(EXIT_SUCCESS)
}
