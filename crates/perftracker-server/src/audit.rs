// perftracker-server/src/audit.rs
// ============================================================================
// Module: Request Audit Logging
// Description: Structured audit events for PerfTracker request handling.
// Purpose: Emit one JSON line per request without hard dependencies.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Every handled request produces a [`RequestAuditEvent`] carrying the
//! endpoint, outcome, status, byte counts, and whether the body came from
//! the query cache. Sinks are deliberately small so deployments can route
//! the JSON lines wherever they collect logs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Request outcome classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// The operation succeeded.
    Ok,
    /// The request was rejected with a user-visible error.
    Rejected,
    /// The request failed fatally.
    Failed,
}

/// Request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct RequestAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Endpoint label.
    pub endpoint: &'static str,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// HTTP status code.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
    /// Whether the response body was served from the query cache.
    pub cache_hit: bool,
}

/// Inputs required to construct a request audit event.
#[derive(Debug, Clone)]
pub struct RequestAuditEventParams {
    /// Endpoint label.
    pub endpoint: &'static str,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// HTTP status code.
    pub status: u16,
    /// Normalized error kind label.
    pub error_kind: Option<&'static str>,
    /// Request body size in bytes.
    pub request_bytes: usize,
    /// Response body size in bytes.
    pub response_bytes: usize,
    /// Whether the response body was served from the query cache.
    pub cache_hit: bool,
}

impl RequestAuditEvent {
    /// Creates an event stamped with the current wall-clock time.
    #[must_use]
    pub fn new(params: RequestAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "request_audit",
            timestamp_ms,
            endpoint: params.endpoint,
            outcome: params.outcome,
            status: params.status,
            error_kind: params.error_kind,
            request_bytes: params.request_bytes,
            response_bytes: params.response_bytes,
            cache_hit: params.cache_hit,
        }
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Audit sink for request events.
pub trait RequestAuditSink: Send + Sync {
    /// Records one request event.
    fn record(&self, event: &RequestAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl RequestAuditSink for StderrAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that appends JSON lines to a file.
pub struct FileAuditSink {
    /// Append-mode log file.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens (or creates) `path` for appending.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl RequestAuditSink for FileAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl RequestAuditSink for NoopAuditSink {
    fn record(&self, _event: &RequestAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
