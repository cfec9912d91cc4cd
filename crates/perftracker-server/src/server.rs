// perftracker-server/src/server.rs
// ============================================================================
// Module: PerfTracker HTTP Server
// Description: axum router, handlers, and backend construction.
// Purpose: Serve the tracker over HTTP with body limits and request audit.
// Dependencies: axum, tokio, tracing, perftracker-config, perftracker-core
// ============================================================================

//! ## Overview
//! The server owns a [`PerfTracker`] built from configuration and an audit
//! sink. Each handler checks the body limit, merges parameters, runs
//! [`dispatch`] on the blocking pool (store calls may block on `SQLite`), records
//! one audit event, and returns the reply.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::DefaultBodyLimit;
use axum::extract::RawQuery;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use perftracker_config::AuditSinkKind;
use perftracker_config::LoggingConfig;
use perftracker_config::PerfTrackerConfig;
use perftracker_config::StoreType;
use perftracker_core::Clock;
use perftracker_core::InMemoryQueryCache;
use perftracker_core::InMemoryRecordStore;
use perftracker_core::PerfTracker;
use perftracker_core::SharedQueryCache;
use perftracker_core::SharedRecordStore;
use perftracker_core::SystemClock;
use perftracker_store_sqlite::SqliteRecordStore;
use tokio::net::TcpListener;
use tracing::error;
use tracing::info;

use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::RequestAuditEvent;
use crate::audit::RequestAuditSink;
use crate::audit::StderrAuditSink;
use crate::dispatch::Endpoint;
use crate::dispatch::OWNER_HEADER;
use crate::dispatch::Reply;
use crate::dispatch::dispatch;
use crate::dispatch::RequestParams;

// ============================================================================
// SECTION: Server
// ============================================================================

/// PerfTracker HTTP server instance.
pub struct PerfTrackerServer {
    /// Server configuration.
    config: PerfTrackerConfig,
    /// Shared service.
    tracker: PerfTracker,
    /// Request audit sink.
    audit: Arc<dyn RequestAuditSink>,
}

impl PerfTrackerServer {
    /// Builds a server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when validation or backend initialization fails.
    pub fn from_config(mut config: PerfTrackerConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let store = build_record_store(&config)?;
        let clock: Arc<dyn Clock + Send + Sync> = Arc::new(SystemClock);
        let cache = InMemoryQueryCache::with_clock(Arc::clone(&clock), config.cache.max_entries);
        let tracker = PerfTracker::new(
            store,
            SharedQueryCache::from_cache(cache),
            clock,
            config.tracker_settings(),
        );
        let audit = build_audit_sink(&config.logging)?;
        Ok(Self::from_parts(config, tracker, audit))
    }

    /// Builds a server around an existing tracker and audit sink.
    #[must_use]
    pub fn from_parts(
        config: PerfTrackerConfig,
        tracker: PerfTracker,
        audit: Arc<dyn RequestAuditSink>,
    ) -> Self {
        Self {
            config,
            tracker,
            audit,
        }
    }

    /// Returns the served tracker.
    #[must_use]
    pub const fn tracker(&self) -> &PerfTracker {
        &self.tracker
    }

    /// Builds the axum router for all endpoints.
    #[must_use]
    pub fn router(&self) -> Router {
        let max_body_bytes = self.config.server.max_body_bytes;
        let state = Arc::new(ServerState {
            tracker: self.tracker.clone(),
            audit: Arc::clone(&self.audit),
            max_body_bytes,
        });
        Router::new()
            .route("/set", post(handle_session))
            .route("/result", post(handle_result))
            .route("/summary", post(handle_summary))
            .route("/json", get(handle_json))
            .route("/bulkdel", get(handle_bulk_delete))
            .route("/admin/reconcile", post(handle_reconcile))
            .layer(DefaultBodyLimit::max(max_body_bytes.saturating_add(1)))
            .with_state(state)
    }

    /// Binds the configured address and serves until interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let addr =
            self.config.server.socket_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed: {err}")))?;
        self.serve_listener(listener).await
    }

    /// Serves on an already bound listener until interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when the server fails.
    pub async fn serve_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "perftracker listening");
        }
        let app = self.router();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|err| ServerError::Transport(format!("http server failed: {err}")))
    }
}

/// Builds the record store from configuration.
fn build_record_store(config: &PerfTrackerConfig) -> Result<SharedRecordStore, ServerError> {
    let store = match config.store.store_type {
        StoreType::Memory => SharedRecordStore::from_store(InMemoryRecordStore::new()),
        StoreType::Sqlite => {
            let sqlite_config = config
                .store
                .sqlite_config()
                .ok_or_else(|| ServerError::Config("sqlite store requires path".to_string()))?;
            let store = SqliteRecordStore::new(&sqlite_config)
                .map_err(|err| ServerError::Init(err.to_string()))?;
            SharedRecordStore::from_store(store)
        }
    };
    Ok(store)
}

/// Builds the request audit sink from configuration.
fn build_audit_sink(logging: &LoggingConfig) -> Result<Arc<dyn RequestAuditSink>, ServerError> {
    let sink: Arc<dyn RequestAuditSink> = match logging.audit {
        AuditSinkKind::Stderr => Arc::new(StderrAuditSink),
        AuditSinkKind::None => Arc::new(NoopAuditSink),
        AuditSinkKind::File => {
            let path = logging.audit_path.as_deref().ok_or_else(|| {
                ServerError::Config("file audit requires logging.audit_path".to_string())
            })?;
            let sink = FileAuditSink::new(Path::new(path.trim()))
                .map_err(|err| ServerError::Init(format!("audit log open failed: {err}")))?;
            Arc::new(sink)
        }
    };
    Ok(sink)
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

// ============================================================================
// SECTION: Handlers
// ============================================================================

/// Shared state for HTTP handlers.
struct ServerState {
    /// Shared service.
    tracker: PerfTracker,
    /// Request audit sink.
    audit: Arc<dyn RequestAuditSink>,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
}

/// Handles `/set`.
async fn handle_session(
    State(state): State<Arc<ServerState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(state, Endpoint::Session, query, &headers, body).await
}

/// Handles `/result`.
async fn handle_result(
    State(state): State<Arc<ServerState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(state, Endpoint::Result, query, &headers, body).await
}

/// Handles `/summary`.
async fn handle_summary(
    State(state): State<Arc<ServerState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(state, Endpoint::Summary, query, &headers, body).await
}

/// Handles `/json`.
async fn handle_json(
    State(state): State<Arc<ServerState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(state, Endpoint::Json, query, &headers, body).await
}

/// Handles `/bulkdel`.
async fn handle_bulk_delete(
    State(state): State<Arc<ServerState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(state, Endpoint::BulkDelete, query, &headers, body).await
}

/// Handles `/admin/reconcile`.
async fn handle_reconcile(
    State(state): State<Arc<ServerState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    handle(state, Endpoint::Reconcile, query, &headers, body).await
}

/// Runs one request through dispatch and records its audit event.
async fn handle(
    state: Arc<ServerState>,
    endpoint: Endpoint,
    query: Option<String>,
    headers: &HeaderMap,
    body: Bytes,
) -> Response {
    let request_bytes = body.len();
    let reply = if request_bytes > state.max_body_bytes {
        Reply::too_large(endpoint)
    } else {
        let owner = owner_from_headers(headers);
        let form_body = if is_form_body(headers) { body } else { Bytes::new() };
        let tracker = state.tracker.clone();
        let raw_query = query.unwrap_or_default();
        tokio::task::spawn_blocking(move || {
            let request = RequestParams::parse(&raw_query, &form_body);
            dispatch(&tracker, endpoint, &request, owner)
        })
        .await
        .unwrap_or_else(|err| {
            error!(endpoint = endpoint.label(), error = %err, "request task failed");
            Reply::internal(endpoint)
        })
    };
    state.audit.record(&RequestAuditEvent::new(reply.audit_params(endpoint, request_bytes)));
    reply.into_response()
}

/// Returns the authenticated uploader from request headers.
fn owner_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(OWNER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Returns true when the body should be parsed as form parameters.
fn is_form_body(headers: &HeaderMap) -> bool {
    headers.get(CONTENT_TYPE).and_then(|value| value.to_str().ok()).is_none_or(|value| {
        value.trim_start().to_ascii_lowercase().starts_with("application/x-www-form-urlencoded")
    })
}

impl IntoResponse for Reply {
    fn into_response(self) -> Response {
        (self.status, [(CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// PerfTracker server errors.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}

// ============================================================================
// SECTION: Tests
// ============================================================================
