//! Contextual multi-pass route analysis of a single router file.
//!
//! Pass 1 records engine and group variables, pass 2 builds the group arena,
//! pass 3 collects route registrations and pass 4 resolves full paths through
//! the group hierarchy.

use std::collections::HashMap;

use lazy_static::lazy_static;
use regex::Regex;

use super::paths::{combine, normalize};
use super::text::{call_arguments, in_line_comment, string_literal, LineIndex};
use super::RouteCandidate;
use crate::model::HttpMethod;

lazy_static! {
    /// Engine constructors and engine-typed bindings. All map to `/`.
    static ref ENGINE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(\w+)\s*:?=\s*gin\.(?:New|Default)\(\)").unwrap(),
        Regex::new(r"(\w+)\s*:?=\s*(?:mux\.NewRouter|http\.NewServeMux|echo\.New|chi\.NewRouter)\(\)").unwrap(),
        Regex::new(r"(\w+)\s*:?=\s*&?[\w\.]+\.Engine\b").unwrap(),
        Regex::new(r"\b(\w+)\s+\*(?:gin\.Engine|gin\.RouterGroup|mux\.Router|http\.ServeMux|echo\.Echo)\b").unwrap(),
    ];

    /// `child := parent.Group("path"` with an optional trailing chain.
    static ref GROUP_PATTERN: Regex =
        Regex::new(r#"(\w+)\s*:?=\s*(\w+)\.Group\s*\(\s*["'`]"#).unwrap();

    /// `var.Use(` on its own statement.
    static ref USE_PATTERN: Regex = Regex::new(r"\b(\w+)\.Use\s*\(").unwrap();

    /// `var.GET(` and friends.
    static ref VERB_PATTERN: Regex =
        Regex::new(r"\b(\w+)\.(GET|POST|PUT|DELETE|PATCH|OPTIONS|HEAD|ANY|Any)\s*\(").unwrap();

    /// `var.HandleFunc(` / `var.Handle(`.
    static ref HANDLE_PATTERN: Regex = Regex::new(r"\b(\w+)\.(HandleFunc|Handle)\s*\(").unwrap();

    /// Trailing `.Methods(` chain.
    static ref METHODS_PATTERN: Regex = Regex::new(r"^\s*\.Methods\s*\(").unwrap();

    /// Trailing `.Use(` chain.
    static ref CHAINED_USE_PATTERN: Regex = Regex::new(r"^\s*\.Use\s*\(").unwrap();

    /// Keywords that flag a file as router code, compared lowercased.
    static ref ROUTER_INDICATORS: Vec<String> = [
        "gin.Engine", "gin.RouterGroup", ".Group(",
        ".GET(", ".POST(", ".PUT(", ".DELETE(", ".PATCH(", ".OPTIONS(", ".HEAD(",
        "router", "Route", "HandleFunc", "mux.Router",
        "setupRoutes", "SetupRoutes", "routes.go",
    ]
    .iter()
    .map(|s| s.to_lowercase())
    .collect();
}

/// Whether `content` looks like routing code.
pub fn is_router_file(content: &str) -> bool {
    let lower = content.to_lowercase();
    ROUTER_INDICATORS.iter().any(|i| lower.contains(i.as_str()))
}

/// A `child := parent.Group(...)` statement.
#[derive(Debug, Clone)]
struct RouterGroup {
    path: String,
    parent_var: String,
    /// Index into the arena, set in pass 4.
    parent: Option<usize>,
    full_path: Option<String>,
    line: usize,
    middlewares: Vec<String>,
}

#[derive(Debug, Clone)]
struct RouteCall {
    method: HttpMethod,
    path: String,
    var: String,
    line: usize,
    handler: String,
    middlewares: Vec<String>,
}

/// Routing facts for one file.
#[derive(Default)]
struct RouterContext {
    groups: Vec<RouterGroup>,
    by_var: HashMap<String, Vec<usize>>,
    variables: HashMap<String, String>,
    /// Middleware attached to engine variables through `.Use(...)`.
    engine_middlewares: HashMap<String, Vec<String>>,
    routes: Vec<RouteCall>,
}

impl RouterContext {
    /// Latest group bound to `var` at or before `line`, else the latest one at all.
    fn group_for(&self, var: &str, line: usize) -> Option<usize> {
        let candidates = self.by_var.get(var)?;
        candidates
            .iter()
            .rev()
            .find(|&&idx| self.groups[idx].line <= line)
            .or_else(|| candidates.last())
            .copied()
    }
}

/// Run all four passes over `content`.
pub fn analyze(content: &str) -> Vec<RouteCandidate> {
    let lines = LineIndex::new(content);
    let mut ctx = RouterContext::default();

    collect_variables(content, &mut ctx);
    collect_groups(content, &lines, &mut ctx);
    collect_standalone_use(content, &lines, &mut ctx);
    collect_routes(content, &lines, &mut ctx);
    resolve(&mut ctx)
}

/// Pass 1: engine constructors map to `/`, group assignments to their literal path.
fn collect_variables(content: &str, ctx: &mut RouterContext) {
    for pattern in ENGINE_PATTERNS.iter() {
        for caps in pattern.captures_iter(content) {
            let whole = caps.get(0).map(|m| m.start()).unwrap_or(0);
            if in_line_comment(content, whole) {
                continue;
            }
            ctx.variables.insert(caps[1].to_string(), "/".to_string());
        }
    }
}

/// Pass 2: group records with their parent variable and middleware.
fn collect_groups(content: &str, lines: &LineIndex, ctx: &mut RouterContext) {
    for caps in GROUP_PATTERN.captures_iter(content) {
        let whole = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        if in_line_comment(content, whole.0) {
            continue;
        }
        // The regex ends just past the opening quote; back up to the `(`.
        let Some(open) = content[..whole.1].rfind('(') else {
            continue;
        };
        let Some((args, end)) = call_arguments(content, open) else {
            continue;
        };
        let Some(path) = args.first().and_then(|a| string_literal(a)) else {
            continue;
        };

        let mut middlewares: Vec<String> = args[1..].to_vec();
        middlewares.extend(chained_use(content, end));

        let var = caps[1].to_string();
        ctx.variables.insert(var.clone(), path.to_string());

        let idx = ctx.groups.len();
        ctx.groups.push(RouterGroup {
            path: path.to_string(),
            parent_var: caps[2].to_string(),
            parent: None,
            full_path: None,
            line: lines.line_of(whole.0),
            middlewares,
        });
        ctx.by_var.entry(var).or_default().push(idx);
    }
}

/// Arguments of every `.Use(...)` chained directly after offset `end`.
fn chained_use(content: &str, mut end: usize) -> Vec<String> {
    let mut middlewares = Vec::new();
    while let Some(m) = CHAINED_USE_PATTERN.find(&content[end..]) {
        let open = end + m.end() - 1;
        match call_arguments(content, open) {
            Some((args, next)) => {
                middlewares.extend(args);
                end = next;
            }
            None => break,
        }
    }
    middlewares
}

/// `api.Use(mw)` statements attach middleware to a group or engine.
fn collect_standalone_use(content: &str, lines: &LineIndex, ctx: &mut RouterContext) {
    for caps in USE_PATTERN.captures_iter(content) {
        let m = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        if in_line_comment(content, m.0) {
            continue;
        }
        let Some((args, _)) = call_arguments(content, m.1 - 1) else {
            continue;
        };

        let var = &caps[1];
        let line = lines.line_of(m.0);
        if let Some(idx) = ctx.group_for(var, line) {
            ctx.groups[idx].middlewares.extend(args);
        } else {
            ctx.engine_middlewares
                .entry(var.to_string())
                .or_default()
                .extend(args);
        }
    }
}

/// Pass 3: verb registrations and `HandleFunc(...).Methods(...)` registrations.
fn collect_routes(content: &str, lines: &LineIndex, ctx: &mut RouterContext) {
    for caps in VERB_PATTERN.captures_iter(content) {
        let m = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        if in_line_comment(content, m.0) {
            continue;
        }
        let Some((args, _)) = call_arguments(content, m.1 - 1) else {
            continue;
        };
        if args.len() < 2 {
            continue;
        }
        let Some(path) = string_literal(&args[0]) else {
            continue;
        };
        let Some(method) = HttpMethod::parse(&caps[2]) else {
            continue;
        };

        let (handler, middlewares) = split_handler(&args[1..]);
        ctx.routes.push(RouteCall {
            method,
            path: path.to_string(),
            var: caps[1].to_string(),
            line: lines.line_of(m.0),
            handler,
            middlewares,
        });
    }

    for caps in HANDLE_PATTERN.captures_iter(content) {
        let m = caps.get(0).map(|m| (m.start(), m.end())).unwrap_or((0, 0));
        if in_line_comment(content, m.0) {
            continue;
        }
        let Some((args, end)) = call_arguments(content, m.1 - 1) else {
            continue;
        };

        // gin's `Handle("GET", "/path", h)` names the method first.
        let (methods, rest) = match (args.first(), args.get(1)) {
            (Some(first), Some(second))
                if string_literal(second).is_some()
                    && string_literal(first)
                        .and_then(HttpMethod::parse)
                        .is_some() =>
            {
                let method = string_literal(first).and_then(HttpMethod::parse);
                (method.into_iter().collect::<Vec<_>>(), &args[1..])
            }
            _ => (chained_methods(content, end), &args[..]),
        };
        if rest.len() < 2 {
            continue;
        }
        let Some(path) = string_literal(&rest[0]) else {
            continue;
        };

        let (handler, middlewares) = split_handler(&rest[1..]);
        let methods = if methods.is_empty() {
            vec![HttpMethod::Any]
        } else {
            methods
        };
        for method in methods {
            ctx.routes.push(RouteCall {
                method,
                path: path.to_string(),
                var: caps[1].to_string(),
                line: lines.line_of(m.0),
                handler: handler.clone(),
                middlewares: middlewares.clone(),
            });
        }
    }

    ctx.routes.sort_by_key(|r| r.line);
}

/// Methods listed in a `.Methods("GET", "POST")` chain after `end`.
fn chained_methods(content: &str, end: usize) -> Vec<HttpMethod> {
    let Some(m) = METHODS_PATTERN.find(&content[end..]) else {
        return Vec::new();
    };
    let open = end + m.end() - 1;
    call_arguments(content, open)
        .map(|(args, _)| {
            args.iter()
                .filter_map(|a| string_literal(a))
                .filter_map(HttpMethod::parse)
                .collect()
        })
        .unwrap_or_default()
}

/// Last argument is the handler, the rest are middleware.
pub(crate) fn split_handler(args: &[String]) -> (String, Vec<String>) {
    match args.split_last() {
        Some((handler, middlewares)) => (handler.clone(), middlewares.to_vec()),
        None => (String::new(), Vec::new()),
    }
}

/// Pass 4: link parents, compute group full paths depth-first, then resolve routes.
fn resolve(ctx: &mut RouterContext) -> Vec<RouteCandidate> {
    for idx in 0..ctx.groups.len() {
        let group = &ctx.groups[idx];
        let parent = ctx
            .by_var
            .get(&group.parent_var)
            .and_then(|candidates| {
                candidates
                    .iter()
                    .rev()
                    .find(|&&p| p != idx && ctx.groups[p].line <= group.line)
                    .or_else(|| candidates.iter().rev().find(|&&p| p != idx))
            })
            .copied();
        ctx.groups[idx].parent = parent;
    }

    let mut in_progress = vec![false; ctx.groups.len()];
    for idx in 0..ctx.groups.len() {
        full_path(ctx, idx, &mut in_progress);
    }

    ctx.routes
        .iter()
        .map(|route| {
            let (path, mut middlewares) = match ctx.group_for(&route.var, route.line) {
                Some(idx) => (
                    combine(ctx.groups[idx].full_path.as_deref().unwrap_or("/"), &route.path),
                    inherited_middlewares(ctx, idx),
                ),
                None => match ctx.variables.get(&route.var) {
                    Some(base) => (
                        combine(base, &route.path),
                        ctx.engine_middlewares
                            .get(&route.var)
                            .cloned()
                            .unwrap_or_default(),
                    ),
                    None => (normalize(&route.path), Vec::new()),
                },
            };
            middlewares.extend(route.middlewares.iter().cloned());

            RouteCandidate {
                method: route.method,
                path,
                handler: route.handler.clone(),
                middlewares,
                line: route.line,
            }
        })
        .collect()
}

/// Full path of group `idx`, memoized. A group revisited while in progress is
/// part of a cycle and resolves to its own literal path.
fn full_path(ctx: &mut RouterContext, idx: usize, in_progress: &mut [bool]) -> String {
    if let Some(path) = &ctx.groups[idx].full_path {
        return path.clone();
    }
    if in_progress[idx] {
        return normalize(&ctx.groups[idx].path);
    }
    in_progress[idx] = true;

    let base = match ctx.groups[idx].parent {
        Some(parent) => full_path(ctx, parent, in_progress),
        None => {
            let parent_var = &ctx.groups[idx].parent_var;
            ctx.variables
                .get(parent_var)
                .filter(|_| !ctx.by_var.contains_key(parent_var))
                .cloned()
                .unwrap_or_else(|| "/".to_string())
        }
    };
    let path = combine(&base, &ctx.groups[idx].path);

    in_progress[idx] = false;
    ctx.groups[idx].full_path = Some(path.clone());
    path
}

/// Middleware from the root engine down to group `idx`, outermost first.
fn inherited_middlewares(ctx: &RouterContext, idx: usize) -> Vec<String> {
    let mut chain = Vec::new();
    let mut visited = vec![false; ctx.groups.len()];
    let mut current = Some(idx);
    let mut root_var = None;
    while let Some(i) = current {
        if visited[i] {
            break;
        }
        visited[i] = true;
        chain.push(i);
        root_var = Some(ctx.groups[i].parent_var.as_str());
        current = ctx.groups[i].parent;
    }

    let mut middlewares = root_var
        .and_then(|v| ctx.engine_middlewares.get(v))
        .cloned()
        .unwrap_or_default();
    for i in chain.into_iter().rev() {
        middlewares.extend(ctx.groups[i].middlewares.iter().cloned());
    }
    middlewares
}

#[cfg(test)]
mod tests {
    use super::*;

    fn routes(content: &str) -> Vec<(String, String)> {
        analyze(content)
            .into_iter()
            .map(|r| (r.method.to_string(), r.path))
            .collect()
    }

    #[test]
    fn test_nested_groups() {
        let content = r#"
func SetupRouter() *gin.Engine {
    r := gin.Default()
    api := r.Group("/api")
    v1 := api.Group("/v1")
    v1.GET("/users", h.ListUsers)
    r.GET("/health", health)
    return r
}
"#;
        assert_eq!(
            routes(content),
            vec![
                ("GET".to_string(), "/api/v1/users".to_string()),
                ("GET".to_string(), "/health".to_string()),
            ]
        );
    }

    #[test]
    fn test_groups_declared_out_of_order_resolve() {
        let content = r#"
    users := v1.Group("/users")
    v1 := api.Group("/v1")
    api := r.Group("/api")
    users.DELETE("/:id", h.Delete)
"#;
        assert_eq!(
            routes(content),
            vec![("DELETE".to_string(), "/api/v1/users/:id".to_string())]
        );
    }

    #[test]
    fn test_cyclic_groups_terminate() {
        let content = r#"
    a := b.Group("/a")
    b := a.Group("/b")
    a.GET("/x", h)
"#;
        let found = analyze(content);
        assert_eq!(found.len(), 1);
        assert!(found[0].path.ends_with("/a/x"));
    }

    #[test]
    fn test_handler_and_middleware_split() {
        let content = r#"
    r := gin.New()
    admin := r.Group("/admin", middleware.Auth()).Use(middleware.Audit())
    admin.Use(rateLimit)
    admin.POST("/users",
        validate(CreateUserRequest{}),
        handlers.CreateUser)
"#;
        let found = analyze(content);
        assert_eq!(found.len(), 1);
        let route = &found[0];
        assert_eq!(route.path, "/admin/users");
        assert_eq!(route.handler, "handlers.CreateUser");
        assert_eq!(
            route.middlewares,
            vec![
                "middleware.Auth()",
                "middleware.Audit()",
                "rateLimit",
                "validate(CreateUserRequest{})"
            ]
        );
        assert_eq!(route.line, 5);
    }

    #[test]
    fn test_handlefunc_with_methods() {
        let content = r#"
    router := mux.NewRouter()
    router.HandleFunc("/items/{id}", getItem).Methods("GET", "HEAD")
    router.HandleFunc("/anything", anyHandler)
    // router.HandleFunc("/disabled", old).Methods("GET")
"#;
        assert_eq!(
            routes(content),
            vec![
                ("GET".to_string(), "/items/{id}".to_string()),
                ("HEAD".to_string(), "/items/{id}".to_string()),
                ("ANY".to_string(), "/anything".to_string()),
            ]
        );
    }

    #[test]
    fn test_engine_parameter_and_unknown_var() {
        let content = r#"
func Register(r *gin.Engine) {
    r.PUT("settings", h.Update)
    other.PATCH("/x/", h.Patch)
}
"#;
        assert_eq!(
            routes(content),
            vec![
                ("PUT".to_string(), "/settings".to_string()),
                ("PATCH".to_string(), "/x/".to_string()),
            ]
        );
    }

    #[test]
    fn test_is_router_file() {
        assert!(is_router_file("r.GET(\"/\", h)"));
        assert!(is_router_file("func setupRoutes() {}"));
        assert!(!is_router_file("package util\nfunc Add(a, b int) int { return a + b }"));
    }
}
