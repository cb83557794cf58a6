//! Integration tests for the scan pipeline against the `testdata/shop` fixture.
//!
//! The fixture is a small gin service with nested route groups, middleware,
//! a vendored dependency, a test file, a hidden directory and one file that
//! does not parse.

use std::path::PathBuf;
use std::sync::Arc;

use apiscope::logging::Event;
use apiscope::{AnalysisConfig, HttpMethod, ProjectAnalysis, RecordingLogger, Scanner};

fn shop_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("testdata/shop")
}

fn scan_with(config: AnalysisConfig) -> (ProjectAnalysis, Arc<RecordingLogger>) {
    let logger = Arc::new(RecordingLogger::new());
    let analysis = Scanner::new(config)
        .with_logger(logger.clone())
        .scan(shop_path())
        .expect("scan should succeed");
    (analysis, logger)
}

fn scan() -> (ProjectAnalysis, Arc<RecordingLogger>) {
    scan_with(AnalysisConfig::default())
}

#[test]
fn test_default_policy_selects_project_sources() {
    let (analysis, _) = scan();

    let files: Vec<&str> = analysis.files.keys().map(String::as_str).collect();
    assert_eq!(
        files,
        vec![
            "internal/handlers/health.go",
            "internal/handlers/user.go",
            "internal/middleware/middleware.go",
            "internal/models/user.go",
            "internal/router/router.go",
            "internal/service/user_service.go",
            "main.go",
        ]
    );
}

#[test]
fn test_parse_failure_is_a_warning() {
    let (analysis, logger) = scan();

    assert_eq!(analysis.warnings.len(), 1);
    assert_eq!(analysis.warnings[0].path, "broken/broken.go");
    assert!(analysis.warnings[0].message.starts_with("parse failed"));
    assert!(!analysis.files.contains_key("broken/broken.go"));

    assert!(logger
        .events()
        .iter()
        .any(|e| matches!(e, Event::ParseFailed { path, .. } if path == "broken/broken.go")));
}

#[test]
fn test_vendor_and_test_files_on_request() {
    let (analysis, _) = scan_with(AnalysisConfig {
        include_vendor: true,
        include_test_file: true,
        blacklist_dirs: vec!["broken".into()],
        ..Default::default()
    });

    assert!(analysis
        .files
        .contains_key("vendor/github.com/gin-gonic/gin/gin.go"));
    let test_file = &analysis.files["internal/service/user_service_test.go"];
    assert_eq!(test_file.functions[0].name, "TestCreateUser");

    // Hidden directories stay excluded.
    assert!(analysis.files.keys().all(|p| !p.starts_with(".cache")));
    assert!(analysis.warnings.is_empty());
}

#[test]
fn test_whitelist_restricts_scan() {
    let (analysis, _) = scan_with(AnalysisConfig {
        whitelist_dirs: vec!["internal/models".into()],
        ..Default::default()
    });
    let files: Vec<&str> = analysis.files.keys().map(String::as_str).collect();
    assert_eq!(files, vec!["internal/models/user.go"]);
    assert!(analysis.endpoints.is_empty());
}

#[test]
fn test_packages_grouped_by_directory() {
    let (analysis, _) = scan();

    let handlers = &analysis.packages["internal/handlers"];
    assert_eq!(handlers.name, "handlers");
    assert_eq!(
        handlers.files,
        vec!["internal/handlers/health.go", "internal/handlers/user.go"]
    );
    assert_eq!(analysis.packages[""].name, "main");
    assert_eq!(analysis.packages.len(), 6);
}

#[test]
fn test_declarations_extracted() {
    let (analysis, _) = scan();

    let models = &analysis.files["internal/models/user.go"];
    assert_eq!(models.package, "models");
    let user = models.structs.iter().find(|s| s.name == "User").unwrap();
    let fields: Vec<&str> = user.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(fields, vec!["ID", "Name", "Email", "Role"]);
    assert_eq!(models.types[0].name, "Role");
    let consts: Vec<&str> = models.constants.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(consts, vec!["RoleAdmin", "RoleMember"]);

    let service = &analysis.files["internal/service/user_service.go"];
    assert_eq!(
        service.imports,
        vec!["errors", "strconv", "example.com/shop/internal/models"]
    );
    assert_eq!(service.interfaces[0].name, "UserService");
    assert_eq!(service.interfaces[0].methods.len(), 5);
    assert_eq!(service.variables[0].name, "ErrNotFound");

    let create = service
        .functions
        .iter()
        .find(|f| f.name == "CreateUser")
        .unwrap();
    assert!(create.is_method);
    assert_eq!(create.receiver.as_deref(), Some("*userService"));
    assert!(create.calls.iter().any(|c| c.name == "s.nextID"));
    assert!(create.used_types.iter().any(|t| t == "models.User"));
}

#[test]
fn test_endpoints_resolved_through_groups() {
    let (analysis, _) = scan();

    let keys: Vec<(HttpMethod, &str)> = analysis
        .endpoints
        .iter()
        .map(|e| (e.method, e.path.as_str()))
        .collect();
    assert_eq!(
        keys,
        vec![
            (HttpMethod::Get, "/api/admin/stats"),
            (HttpMethod::Get, "/api/v1/users"),
            (HttpMethod::Post, "/api/v1/users"),
            (HttpMethod::Get, "/api/v1/users/:id"),
            (HttpMethod::Delete, "/api/v1/users/:id"),
            (HttpMethod::Get, "/health"),
        ]
    );

    for endpoint in &analysis.endpoints {
        assert_eq!(endpoint.file, "internal/router/router.go");
        assert_eq!(endpoint.package, "router");
        assert!(!endpoint.id.is_empty());
    }
}

#[test]
fn test_endpoint_handlers_and_middleware() {
    let (analysis, _) = scan();
    let find = |method: HttpMethod, path: &str| {
        analysis
            .endpoints
            .iter()
            .find(|e| e.method == method && e.path == path)
            .unwrap()
    };

    let health = find(HttpMethod::Get, "/health");
    assert_eq!(health.handler, "handlers.Health");
    assert_eq!(health.line, 14);
    assert_eq!(health.middlewares, vec!["middleware.Logger()"]);

    let delete = find(HttpMethod::Delete, "/api/v1/users/:id");
    assert_eq!(delete.handler, "h.DeleteUser");
    assert_eq!(delete.path_params, vec!["id"]);
    assert_eq!(
        delete.middlewares,
        vec![
            "middleware.Logger()",
            "middleware.Auth()",
            "middleware.RequireAdmin()"
        ]
    );

    let stats = find(HttpMethod::Get, "/api/admin/stats");
    assert_eq!(
        stats.middlewares,
        vec!["middleware.Logger()", "middleware.RequireAdmin()"]
    );
}

#[test]
fn test_handler_hints() {
    let (analysis, _) = scan();
    let find = |method: HttpMethod, path: &str| {
        analysis
            .endpoints
            .iter()
            .find(|e| e.method == method && e.path == path)
            .unwrap()
    };

    let list = find(HttpMethod::Get, "/api/v1/users");
    assert_eq!(list.query_params, vec!["limit"]);

    let create = find(HttpMethod::Post, "/api/v1/users");
    assert_eq!(
        create.request_type.as_deref(),
        Some("models.CreateUserRequest")
    );
    assert!(create.response_type.is_some());
}

#[test]
fn test_indirect_registration_logged() {
    let (_, logger) = scan();
    assert!(logger.events().iter().any(|e| matches!(
        e,
        Event::IndirectRegistration { file, line: 17, call }
            if file == "main.go" && call == "router.SetupRoutes(r, h)"
    )));
}

#[test]
fn test_scan_events_bracket_the_run() {
    let (analysis, logger) = scan();
    let events = logger.events();

    assert!(matches!(events.first(), Some(Event::ScanStarted { .. })));
    match events.last() {
        Some(Event::ScanCompleted {
            files, endpoints, ..
        }) => {
            assert_eq!(*files, analysis.files.len());
            assert_eq!(*endpoints, 6);
        }
        other => panic!("unexpected last event: {:?}", other),
    }
}

#[test]
fn test_missing_root_is_validation_error() {
    let err = Scanner::new(AnalysisConfig::default())
        .with_logger(Arc::new(RecordingLogger::new()))
        .scan(shop_path().join("does-not-exist"))
        .unwrap_err();
    assert_eq!(err.kind(), apiscope::ErrorKind::Validation);
}
