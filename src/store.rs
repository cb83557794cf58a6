//! In-memory analysis store.
//!
//! One coarse `RwLock` guards every project. A project and all of its indices
//! are swapped in under a single write guard, so readers observe either the
//! previous state or the complete new one.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::logging::{Event, SharedLogger};
use crate::model::{CodeNode, Endpoint, NodeKind, ProjectAnalysis};

/// 1-indexed page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: usize,
    pub limit: usize,
}

impl Page {
    /// Page numbers and limits below 1 are raised to 1.
    pub fn new(page: usize, limit: usize) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    /// Slice `items` to this page; `total` always counts every item.
    pub fn apply<T: Clone>(&self, items: &[T]) -> PageResult<T> {
        let total = items.len();
        let start = (self.page - 1).saturating_mul(self.limit);
        let page_items = if start >= total {
            Vec::new()
        } else {
            let end = start.saturating_add(self.limit).min(total);
            items[start..end].to_vec()
        };
        PageResult {
            items: page_items,
            total,
            page: self.page,
            limit: self.limit,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(1, 50)
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

impl<T> PageResult<T> {
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.limit.max(1))
    }
}

/// Listing entry for [`AnalysisStore::list_projects`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub id: String,
    pub root_path: String,
    pub files: usize,
    pub packages: usize,
    pub nodes: usize,
    pub endpoints: usize,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A stored project with its node and endpoint indices.
#[derive(Debug)]
struct ProjectEntry {
    analysis: Arc<ProjectAnalysis>,
    nodes: Vec<CodeNode>,
    node_index: HashMap<String, usize>,
    /// `package.name.kind` to positions in `nodes`.
    graph_index: HashMap<String, Vec<usize>>,
    endpoint_index: HashMap<String, usize>,
}

impl ProjectEntry {
    fn new(analysis: ProjectAnalysis) -> Self {
        let endpoint_index = analysis
            .endpoints
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id.clone(), i))
            .collect();
        Self {
            analysis: Arc::new(analysis),
            nodes: Vec::new(),
            node_index: HashMap::new(),
            graph_index: HashMap::new(),
            endpoint_index,
        }
    }

    fn upsert_node(&mut self, mut node: CodeNode) -> String {
        if node.id.is_empty() {
            node.id = Uuid::new_v4().to_string();
        }
        let id = node.id.clone();
        if let Some(&idx) = self.node_index.get(&id) {
            let old = std::mem::replace(&mut self.nodes[idx], node);
            if let Some(slots) = self.graph_index.get_mut(&old.graph_id) {
                slots.retain(|&i| i != idx);
            }
            let graph_id = self.nodes[idx].graph_id.clone();
            self.graph_index.entry(graph_id).or_default().push(idx);
        } else {
            let idx = self.nodes.len();
            self.graph_index
                .entry(node.graph_id.clone())
                .or_default()
                .push(idx);
            self.node_index.insert(id.clone(), idx);
            self.nodes.push(node);
        }
        id
    }

    fn summary(&self) -> ProjectSummary {
        let a = &self.analysis;
        ProjectSummary {
            id: a.id.clone(),
            root_path: a.root_path.clone(),
            files: a.files.len(),
            packages: a.packages.len(),
            nodes: self.nodes.len(),
            endpoints: a.endpoints.len(),
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

/// Concurrent, project-scoped store of analyses, nodes and endpoints.
pub struct AnalysisStore {
    projects: RwLock<HashMap<String, ProjectEntry>>,
    logger: SharedLogger,
}

impl AnalysisStore {
    pub fn new(logger: SharedLogger) -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
            logger,
        }
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, HashMap<String, ProjectEntry>> {
        self.projects.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, HashMap<String, ProjectEntry>> {
        self.projects.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_project<T>(&self, id: &str, f: impl FnOnce(&ProjectEntry) -> Result<T>) -> Result<T> {
        let projects = self.read_guard();
        let entry = projects
            .get(id)
            .ok_or_else(|| Error::not_found(format!("project {} not found", id)))?;
        f(entry)
    }

    /// Store `analysis`, replacing any project with the same id, with empty node index.
    pub fn write_project(&self, analysis: ProjectAnalysis) -> Result<String> {
        self.publish(analysis, Vec::new())
    }

    /// Store `analysis` together with its nodes in one step.
    ///
    /// Assigns a project id if absent, stamps timestamps, assigns node and
    /// endpoint ids if absent, and rebuilds every index.
    pub fn publish(&self, mut analysis: ProjectAnalysis, nodes: Vec<CodeNode>) -> Result<String> {
        if analysis.root_path.trim().is_empty() {
            return Err(Error::validation("project analysis has no root path"));
        }
        if analysis.id.is_empty() {
            analysis.id = Uuid::new_v4().to_string();
        }
        for endpoint in analysis.endpoints.iter_mut().filter(|e| e.id.is_empty()) {
            endpoint.id = Uuid::new_v4().to_string();
        }

        let mut projects = self.write_guard();

        let now = Utc::now();
        let previous = projects.get(&analysis.id).and_then(|e| e.analysis.created_at);
        analysis.created_at = analysis.created_at.or(previous).or(Some(now));
        analysis.updated_at = Some(now);

        let id = analysis.id.clone();
        let mut entry = ProjectEntry::new(analysis);
        for node in nodes {
            entry.upsert_node(node);
        }

        self.logger.log(&Event::ProjectStored {
            project_id: id.clone(),
            nodes: entry.nodes.len(),
            endpoints: entry.analysis.endpoints.len(),
        });
        projects.insert(id.clone(), entry);
        Ok(id)
    }

    pub fn read_project(&self, id: &str) -> Result<Arc<ProjectAnalysis>> {
        self.with_project(id, |entry| Ok(Arc::clone(&entry.analysis)))
    }

    pub fn delete_project(&self, id: &str) -> Result<()> {
        let mut projects = self.write_guard();
        if projects.remove(id).is_none() {
            return Err(Error::not_found(format!("project {} not found", id)));
        }
        drop(projects);
        self.logger.log(&Event::ProjectDeleted {
            project_id: id.to_string(),
        });
        Ok(())
    }

    /// Summaries of every project, oldest first.
    pub fn list_projects(&self) -> Vec<ProjectSummary> {
        let projects = self.read_guard();
        let mut summaries: Vec<_> = projects.values().map(ProjectEntry::summary).collect();
        summaries.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        summaries
    }

    /// Insert or replace a node of an existing project. Returns the node id.
    pub fn write_node(&self, project_id: &str, node: CodeNode) -> Result<String> {
        let mut projects = self.write_guard();
        let entry = projects
            .get_mut(project_id)
            .ok_or_else(|| Error::not_found(format!("project {} not found", project_id)))?;
        Ok(entry.upsert_node(node))
    }

    /// Insert or replace an endpoint of an existing project. Returns the endpoint id.
    ///
    /// `(method, path)` stays unique: when another endpoint already owns the
    /// pair, the write is logged as a duplicate, nothing is stored, and the
    /// id of the endpoint already stored is returned.
    pub fn write_endpoint(&self, project_id: &str, mut endpoint: Endpoint) -> Result<String> {
        let mut projects = self.write_guard();
        let entry = projects
            .get_mut(project_id)
            .ok_or_else(|| Error::not_found(format!("project {} not found", project_id)))?;

        if endpoint.id.is_empty() {
            endpoint.id = Uuid::new_v4().to_string();
        }
        let duplicate_of = entry
            .analysis
            .endpoints
            .iter()
            .find(|e| e.key() == endpoint.key() && e.id != endpoint.id)
            .map(|e| e.id.clone());
        if let Some(first_id) = duplicate_of {
            drop(projects);
            self.logger.log(&Event::DuplicateEndpoint {
                method: endpoint.method.to_string(),
                path: endpoint.path,
                file: endpoint.file,
            });
            return Ok(first_id);
        }

        let id = endpoint.id.clone();
        let analysis = Arc::make_mut(&mut entry.analysis);
        match entry.endpoint_index.get(&id) {
            Some(&idx) => analysis.endpoints[idx] = endpoint,
            None => {
                entry.endpoint_index.insert(id.clone(), analysis.endpoints.len());
                analysis.endpoints.push(endpoint);
            }
        }
        analysis.updated_at = Some(Utc::now());
        Ok(id)
    }

    pub fn read_node(&self, project_id: &str, node_id: &str) -> Result<CodeNode> {
        self.with_project(project_id, |entry| {
            entry
                .node_index
                .get(node_id)
                .map(|&i| entry.nodes[i].clone())
                .ok_or_else(|| Error::not_found(format!("node {} not found", node_id)))
        })
    }

    /// Nodes carrying the `package.name.kind` identity `graph_id`.
    pub fn nodes_by_graph_id(&self, project_id: &str, graph_id: &str) -> Result<Vec<CodeNode>> {
        self.with_project(project_id, |entry| {
            Ok(entry
                .graph_index
                .get(graph_id)
                .map(|slots| slots.iter().map(|&i| entry.nodes[i].clone()).collect())
                .unwrap_or_default())
        })
    }

    pub fn read_endpoint(&self, project_id: &str, endpoint_id: &str) -> Result<Endpoint> {
        self.with_project(project_id, |entry| {
            entry
                .endpoint_index
                .get(endpoint_id)
                .map(|&i| entry.analysis.endpoints[i].clone())
                .ok_or_else(|| Error::not_found(format!("endpoint {} not found", endpoint_id)))
        })
    }

    pub fn list_endpoints(&self, project_id: &str) -> Result<Vec<Endpoint>> {
        self.with_project(project_id, |entry| Ok(entry.analysis.endpoints.clone()))
    }

    /// Every node of a project, in storage order.
    pub fn all_nodes(&self, project_id: &str) -> Result<Vec<CodeNode>> {
        self.with_project(project_id, |entry| Ok(entry.nodes.clone()))
    }

    /// Nodes of `kind` (all when `None`), one page at a time.
    pub fn list_nodes(
        &self,
        project_id: &str,
        kind: Option<NodeKind>,
        page: Page,
    ) -> Result<PageResult<CodeNode>> {
        self.with_project(project_id, |entry| {
            let matching: Vec<&CodeNode> = entry
                .nodes
                .iter()
                .filter(|n| kind.map_or(true, |k| n.kind() == k))
                .collect();
            Ok(owned_page(page.apply(&matching)))
        })
    }

    /// Case-insensitive substring search over name, body, file and package.
    pub fn search_nodes(
        &self,
        project_id: &str,
        query: &str,
        page: Page,
    ) -> Result<PageResult<CodeNode>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Err(Error::validation("search query must not be empty"));
        }
        self.with_project(project_id, |entry| {
            let matching: Vec<&CodeNode> = entry
                .nodes
                .iter()
                .filter(|n| {
                    [&n.name, &n.body, &n.file, &n.package]
                        .iter()
                        .any(|field| field.to_lowercase().contains(&needle))
                })
                .collect();
            Ok(owned_page(page.apply(&matching)))
        })
    }

    /// Nodes declared in the file that defines the endpoint.
    pub fn nodes_for_endpoint(&self, project_id: &str, endpoint_id: &str) -> Result<Vec<CodeNode>> {
        self.with_project(project_id, |entry| {
            let idx = entry
                .endpoint_index
                .get(endpoint_id)
                .ok_or_else(|| Error::not_found(format!("endpoint {} not found", endpoint_id)))?;
            let file = &entry.analysis.endpoints[*idx].file;
            Ok(entry
                .nodes
                .iter()
                .filter(|n| &n.file == file)
                .cloned()
                .collect())
        })
    }
}

fn owned_page(page: PageResult<&CodeNode>) -> PageResult<CodeNode> {
    PageResult {
        items: page.items.into_iter().cloned().collect(),
        total: page.total,
        page: page.page,
        limit: page.limit,
    }
}
