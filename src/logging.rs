//! Logging capability injected into the scanner, discoverer, graph builder and store.
//!
//! Components never reach for a global logger: they hold an `Arc<dyn Logger>`
//! and report typed [`Event`]s through it. [`TracingLogger`] forwards events to
//! `tracing`; [`RecordingLogger`] keeps them in memory so tests can assert on them.

use std::io;
use std::sync::{Arc, Mutex, PoisonError};

use tracing_subscriber::EnvFilter;

/// Something worth reporting during a scan or a store mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ScanStarted {
        root: String,
    },
    ScanCompleted {
        root: String,
        files: usize,
        nodes: usize,
        endpoints: usize,
        warnings: usize,
    },
    FileSkipped {
        path: String,
        reason: String,
    },
    ParseFailed {
        path: String,
        error: String,
    },
    DuplicateEndpoint {
        method: String,
        path: String,
        file: String,
    },
    IndirectRegistration {
        file: String,
        line: usize,
        call: String,
    },
    FilterApplied {
        project_id: String,
        predicates: usize,
        matched: usize,
    },
    ProjectStored {
        project_id: String,
        nodes: usize,
        endpoints: usize,
    },
    ProjectDeleted {
        project_id: String,
    },
}

/// Sink for [`Event`]s.
pub trait Logger: Send + Sync {
    fn log(&self, event: &Event);
}

/// Shared logger handle.
pub type SharedLogger = Arc<dyn Logger>;

/// Forwards events to the `tracing` macros with structured fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, event: &Event) {
        match event {
            Event::ScanStarted { root } => tracing::info!(root = %root, "scan started"),
            Event::ScanCompleted {
                root,
                files,
                nodes,
                endpoints,
                warnings,
            } => tracing::info!(
                root = %root,
                files,
                nodes,
                endpoints,
                warnings,
                "scan completed"
            ),
            Event::FileSkipped { path, reason } => {
                tracing::warn!(path = %path, reason = %reason, "file skipped")
            }
            Event::ParseFailed { path, error } => {
                tracing::warn!(path = %path, error = %error, "failed to parse file")
            }
            Event::DuplicateEndpoint { method, path, file } => tracing::warn!(
                method = %method,
                path = %path,
                file = %file,
                "duplicate endpoint ignored"
            ),
            Event::IndirectRegistration { file, line, call } => tracing::debug!(
                file = %file,
                line,
                call = %call,
                "indirect route registration"
            ),
            Event::FilterApplied {
                project_id,
                predicates,
                matched,
            } => tracing::debug!(project = %project_id, predicates, matched, "filter applied"),
            Event::ProjectStored {
                project_id,
                nodes,
                endpoints,
            } => tracing::info!(project = %project_id, nodes, endpoints, "project stored"),
            Event::ProjectDeleted { project_id } => {
                tracing::info!(project = %project_id, "project deleted")
            }
        }
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _event: &Event) {}
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    events: Mutex<Vec<Event>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, event: &Event) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Default logger handle used when a component is built without one.
pub fn tracing_logger() -> SharedLogger {
    Arc::new(TracingLogger)
}

/// Install the `tracing` subscriber.
///
/// `APISCOPE_LOG` (then `RUST_LOG`) overrides `level`. Output goes to stderr.
/// Calling this twice is harmless.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_env("APISCOPE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}
