//! Query surface over the analysis store.
//!
//! [`AnalyzerService`] is what a transport layer or the CLI talks to: it scans
//! and publishes projects, then answers listing, search, filter, statistics,
//! export and graph queries against the store.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::analysis::{code_nodes, count_by_kind, Scanner};
use crate::config::{AnalysisConfig, FilterConfig, ScanLimits};
use crate::endpoints::top_level;
use crate::error::{Error, Result};
use crate::export::{export, ExportFormat};
use crate::filter::{FilterEngine, FilterResult, FilterSuggestions};
use crate::logging::{Event, SharedLogger};
use crate::model::{
    CodeNode, Dependency, DependencyGraph, Endpoint, HttpMethod, NodeKind, ProjectAnalysis,
};
use crate::store::{AnalysisStore, Page, PageResult, ProjectSummary};

/// Largest page size for node listings.
pub const MAX_LIST_LIMIT: usize = 1000;

/// Largest page size for searches.
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Project-wide counts.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectStats {
    pub project_id: String,
    pub root_path: String,
    pub total_files: usize,
    pub total_packages: usize,
    pub total_nodes: usize,
    pub total_endpoints: usize,
    pub total_dependencies: usize,
    pub warnings: usize,
    pub nodes_by_kind: BTreeMap<String, usize>,
    pub files_by_extension: BTreeMap<String, usize>,
    pub endpoints_by_method: BTreeMap<String, usize>,
    /// Keyed by first path segment, e.g. `/api`.
    pub endpoints_by_prefix: BTreeMap<String, usize>,
    pub endpoints_by_file: BTreeMap<String, usize>,
    pub generated_at: DateTime<Utc>,
}

/// Counts for one endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointStats {
    pub project_id: String,
    pub endpoint_id: String,
    pub method: String,
    pub path: String,
    pub handler: String,
    pub middleware_count: usize,
    pub path_param_count: usize,
    pub query_param_count: usize,
    /// Nodes declared in the endpoint's file.
    pub related_nodes: usize,
    pub related_nodes_by_kind: BTreeMap<String, usize>,
    pub generated_at: DateTime<Utc>,
}

/// One endpoint with the nodes of its defining file.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointExport {
    pub endpoint: Endpoint,
    pub nodes: Vec<CodeNode>,
}

/// Which graph edges to follow from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Direction {
    pub incoming: bool,
    pub outgoing: bool,
}

impl Direction {
    pub const BOTH: Direction = Direction {
        incoming: true,
        outgoing: true,
    };
}

pub struct AnalyzerService {
    store: Arc<AnalysisStore>,
    logger: SharedLogger,
    limits: ScanLimits,
}

impl AnalyzerService {
    pub fn new(store: Arc<AnalysisStore>, logger: SharedLogger) -> Self {
        Self {
            store,
            logger,
            limits: ScanLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ScanLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn store(&self) -> &AnalysisStore {
        &self.store
    }

    /// Scan `root` and publish the result. Returns the stored analysis.
    pub fn analyze<P: AsRef<Path>>(
        &self,
        root: P,
        config: AnalysisConfig,
    ) -> Result<Arc<ProjectAnalysis>> {
        let analysis = Scanner::new(config)
            .with_limits(self.limits)
            .with_logger(Arc::clone(&self.logger))
            .scan(root)?;
        let nodes = code_nodes(&analysis);
        let id = self.store.publish(analysis, nodes)?;
        self.store.read_project(&id)
    }

    pub fn project(&self, project_id: &str) -> Result<Arc<ProjectAnalysis>> {
        self.store.read_project(project_id)
    }

    pub fn delete_project(&self, project_id: &str) -> Result<()> {
        self.store.delete_project(project_id)
    }

    pub fn list_projects(&self) -> Vec<ProjectSummary> {
        self.store.list_projects()
    }

    pub fn endpoints(&self, project_id: &str) -> Result<Vec<Endpoint>> {
        self.store.list_endpoints(project_id)
    }

    pub fn endpoint(&self, project_id: &str, endpoint_id: &str) -> Result<Endpoint> {
        self.store.read_endpoint(project_id, endpoint_id)
    }

    /// The endpoint registered for `method` and `path`.
    pub fn endpoint_by_route(
        &self,
        project_id: &str,
        method: HttpMethod,
        path: &str,
    ) -> Result<Endpoint> {
        self.store
            .list_endpoints(project_id)?
            .into_iter()
            .find(|e| e.key() == (method, path))
            .ok_or_else(|| Error::not_found(format!("endpoint {} {} not found", method, path)))
    }

    pub fn endpoint_nodes(&self, project_id: &str, endpoint_id: &str) -> Result<Vec<CodeNode>> {
        self.store.nodes_for_endpoint(project_id, endpoint_id)
    }

    pub fn node(&self, project_id: &str, node_id: &str) -> Result<CodeNode> {
        self.store.read_node(project_id, node_id)
    }

    /// Paginated node listing; `kind` must name a node kind when given.
    pub fn list_nodes(
        &self,
        project_id: &str,
        kind: Option<&str>,
        page: usize,
        limit: usize,
    ) -> Result<PageResult<CodeNode>> {
        let kind = match kind.map(str::trim).filter(|k| !k.is_empty()) {
            Some(k) => Some(
                NodeKind::parse(k)
                    .ok_or_else(|| Error::validation(format!("unknown node kind: {}", k)))?,
            ),
            None => None,
        };
        let page = Page::new(page, limit.clamp(1, MAX_LIST_LIMIT));
        self.store.list_nodes(project_id, kind, page)
    }

    pub fn search_nodes(
        &self,
        project_id: &str,
        query: &str,
        page: usize,
        limit: usize,
    ) -> Result<PageResult<CodeNode>> {
        let page = Page::new(page, limit.clamp(1, MAX_SEARCH_LIMIT));
        self.store.search_nodes(project_id, query, page)
    }

    pub fn filter_nodes(&self, project_id: &str, config: FilterConfig) -> Result<FilterResult> {
        let nodes = self.store.all_nodes(project_id)?;
        let result = FilterEngine::new(config).apply(nodes);
        self.logger.log(&Event::FilterApplied {
            project_id: project_id.to_string(),
            predicates: result.applied_filters,
            matched: result.nodes.len(),
        });
        Ok(result)
    }

    pub fn filter_suggestions(&self, project_id: &str) -> Result<FilterSuggestions> {
        let nodes = self.store.all_nodes(project_id)?;
        Ok(FilterEngine::suggestions(&nodes))
    }

    pub fn project_stats(&self, project_id: &str) -> Result<ProjectStats> {
        let analysis = self.store.read_project(project_id)?;
        let nodes = self.store.all_nodes(project_id)?;

        let mut files_by_extension = BTreeMap::new();
        for file in analysis.files.values() {
            *files_by_extension.entry(file.extension()).or_insert(0) += 1;
        }

        let mut endpoints_by_method = BTreeMap::new();
        let mut endpoints_by_prefix = BTreeMap::new();
        let mut endpoints_by_file = BTreeMap::new();
        for endpoint in &analysis.endpoints {
            *endpoints_by_method
                .entry(endpoint.method.to_string())
                .or_insert(0) += 1;
            *endpoints_by_prefix
                .entry(top_level(&endpoint.path).unwrap_or_else(|| "/".to_string()))
                .or_insert(0) += 1;
            *endpoints_by_file.entry(endpoint.file.clone()).or_insert(0) += 1;
        }

        Ok(ProjectStats {
            project_id: analysis.id.clone(),
            root_path: analysis.root_path.clone(),
            total_files: analysis.files.len(),
            total_packages: analysis.packages.len(),
            total_nodes: nodes.len(),
            total_endpoints: analysis.endpoints.len(),
            total_dependencies: analysis.graph.dependencies.len(),
            warnings: analysis.warnings.len(),
            nodes_by_kind: count_by_kind(&nodes),
            files_by_extension,
            endpoints_by_method,
            endpoints_by_prefix,
            endpoints_by_file,
            generated_at: Utc::now(),
        })
    }

    pub fn endpoint_stats(&self, project_id: &str, endpoint_id: &str) -> Result<EndpointStats> {
        let endpoint = self.store.read_endpoint(project_id, endpoint_id)?;
        let related = self.store.nodes_for_endpoint(project_id, endpoint_id)?;
        Ok(EndpointStats {
            project_id: project_id.to_string(),
            endpoint_id: endpoint.id.clone(),
            method: endpoint.method.to_string(),
            path: endpoint.path.clone(),
            handler: endpoint.handler.clone(),
            middleware_count: endpoint.middlewares.len(),
            path_param_count: endpoint.path_params.len(),
            query_param_count: endpoint.query_params.len(),
            related_nodes: related.len(),
            related_nodes_by_kind: count_by_kind(&related),
            generated_at: Utc::now(),
        })
    }

    /// Full analysis as `format` text.
    pub fn export_project(&self, project_id: &str, format: &str) -> Result<String> {
        let format = ExportFormat::parse(format)?;
        let analysis = self.store.read_project(project_id)?;
        export(analysis.as_ref(), format, "analysis")
    }

    /// One endpoint and its related nodes as `format` text.
    pub fn export_endpoint(
        &self,
        project_id: &str,
        endpoint_id: &str,
        format: &str,
    ) -> Result<String> {
        let format = ExportFormat::parse(format)?;
        let data = EndpointExport {
            endpoint: self.store.read_endpoint(project_id, endpoint_id)?,
            nodes: self.store.nodes_for_endpoint(project_id, endpoint_id)?,
        };
        export(&data, format, "endpoint_analysis")
    }

    pub fn graph(&self, project_id: &str) -> Result<DependencyGraph> {
        Ok(self.store.read_project(project_id)?.graph.clone())
    }

    /// Edges touching a node, addressed by node id or `package.name.kind` id.
    pub fn node_edges(&self, project_id: &str, node_ref: &str) -> Result<Vec<Dependency>> {
        let analysis = self.store.read_project(project_id)?;
        let graph_id = self.resolve_graph_id(project_id, &analysis.graph, node_ref)?;
        Ok(analysis.graph.edges_touching(&graph_id).cloned().collect())
    }

    /// Edges touching the handler function of an endpoint; empty when the
    /// handler is not a declared function.
    pub fn endpoint_dependencies(
        &self,
        project_id: &str,
        endpoint_id: &str,
    ) -> Result<Vec<Dependency>> {
        let endpoint = self.store.read_endpoint(project_id, endpoint_id)?;
        let analysis = self.store.read_project(project_id)?;

        let callee = endpoint.handler.split('(').next().unwrap_or_default();
        let name = callee.rsplit('.').next().unwrap_or_default().trim();
        let candidates: Vec<_> = analysis
            .graph
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Function && !name.is_empty() && n.name == name)
            .collect();
        let Some(handler) = candidates
            .iter()
            .find(|n| n.package == endpoint.package)
            .or_else(|| candidates.first())
        else {
            return Ok(Vec::new());
        };
        Ok(analysis.graph.edges_touching(&handler.id).cloned().collect())
    }

    /// Nodes one edge away from `node_ref` in the chosen directions.
    pub fn dependency_neighbors(
        &self,
        project_id: &str,
        node_ref: &str,
        direction: Direction,
    ) -> Result<Vec<CodeNode>> {
        let analysis = self.store.read_project(project_id)?;
        let graph = &analysis.graph;
        let target = self.resolve_graph_id(project_id, graph, node_ref)?;

        let incoming = graph
            .incoming(&target)
            .filter(|_| direction.incoming)
            .map(|d| &d.from);
        let outgoing = graph
            .outgoing(&target)
            .filter(|_| direction.outgoing)
            .map(|d| &d.to);

        let mut related = Vec::new();
        let mut seen = HashSet::new();
        for other in incoming.chain(outgoing) {
            if seen.insert(other.as_str()) {
                related.extend(self.store.nodes_by_graph_id(project_id, other)?);
            }
        }
        Ok(related)
    }

    fn resolve_graph_id(
        &self,
        project_id: &str,
        graph: &DependencyGraph,
        node_ref: &str,
    ) -> Result<String> {
        if graph.node(node_ref).is_some() {
            return Ok(node_ref.to_string());
        }
        self.store
            .read_node(project_id, node_ref)
            .map(|node| node.graph_id)
    }
}
