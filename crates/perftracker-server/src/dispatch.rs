// perftracker-server/src/dispatch.rs
// ============================================================================
// Module: Request Dispatch
// Description: Synchronous mapping from endpoints and parameters to replies.
// Purpose: Run one tracker operation and shape its HTTP reply.
// Dependencies: axum (status codes), perftracker-core, serde_json, tracing, url
// ============================================================================

//! ## Overview
//! Parameters come from the query string merged with a form-encoded body;
//! body values win. Upload endpoints reply with the new record id as plain
//! text. `/json` replies with the serialized view, or `{"error": "..."}`.
//!
//! User-visible failures (missing parameter, unknown id, unknown selector)
//! return their message with a 4xx status. Every other failure is logged
//! and answered with a generic 500 so store details never reach the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::http::StatusCode;
use perftracker_core::PerfTracker;
use perftracker_core::SessionCommand;
use perftracker_core::TrackerError;
use perftracker_core::UploadParams;
use tracing::error;
use tracing::warn;

use crate::audit::RequestAuditEventParams;
use crate::audit::RequestOutcome;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Header carrying the authenticated uploader, set by a fronting proxy.
pub const OWNER_HEADER: &str = "x-perftracker-user";
/// Plain text content type.
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
/// JSON content type.
const JSON_CONTENT_TYPE: &str = "application/json";
/// Body returned for fatal failures.
const INTERNAL_ERROR_MESSAGE: &str = "internal error";

// ============================================================================
// SECTION: Endpoints
// ============================================================================

/// Served endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `/set`: session create and update.
    Session,
    /// `/result`: result upload.
    Result,
    /// `/summary`: summary upload.
    Summary,
    /// `/json`: typed reads.
    Json,
    /// `/bulkdel`: bulk result deletion.
    BulkDelete,
    /// `/admin/reconcile`: dimension reconciliation.
    Reconcile,
}

impl Endpoint {
    /// Returns the stable label used in logs and audit events.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Session => "set",
            Self::Result => "result",
            Self::Summary => "summary",
            Self::Json => "json",
            Self::BulkDelete => "bulkdel",
            Self::Reconcile => "reconcile",
        }
    }

    /// Returns true when errors are reported as JSON objects.
    const fn json_errors(self) -> bool {
        matches!(self, Self::Json | Self::Reconcile)
    }
}

// ============================================================================
// SECTION: Reply
// ============================================================================

/// HTTP reply produced by [`dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Response status.
    pub status: StatusCode,
    /// Response content type.
    pub content_type: &'static str,
    /// Response body.
    pub body: Vec<u8>,
    /// Whether the body was served from the query cache.
    pub cache_hit: bool,
    /// Error kind label for failed requests.
    pub error_kind: Option<&'static str>,
}

impl Reply {
    /// Builds a 200 plain text reply.
    fn text(body: String) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: TEXT_CONTENT_TYPE,
            body: body.into_bytes(),
            cache_hit: false,
            error_kind: None,
        }
    }

    /// Builds a 200 JSON reply.
    fn json(body: Vec<u8>, cache_hit: bool) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: JSON_CONTENT_TYPE,
            body,
            cache_hit,
            error_kind: None,
        }
    }

    /// Builds an error reply shaped for `endpoint`.
    fn failure(
        endpoint: Endpoint,
        status: StatusCode,
        error_kind: &'static str,
        message: &str,
    ) -> Self {
        let (content_type, body) = if endpoint.json_errors() {
            let body = serde_json::json!({ "error": message }).to_string().into_bytes();
            (JSON_CONTENT_TYPE, body)
        } else {
            (TEXT_CONTENT_TYPE, message.as_bytes().to_vec())
        };
        Self {
            status,
            content_type,
            body,
            cache_hit: false,
            error_kind: Some(error_kind),
        }
    }

    /// Builds the 413 reply for an oversized body.
    #[must_use]
    pub fn too_large(endpoint: Endpoint) -> Self {
        Self::failure(
            endpoint,
            StatusCode::PAYLOAD_TOO_LARGE,
            "body_too_large",
            "request body too large",
        )
    }

    /// Builds the generic 500 reply.
    #[must_use]
    pub fn internal(endpoint: Endpoint) -> Self {
        Self::failure(
            endpoint,
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            INTERNAL_ERROR_MESSAGE,
        )
    }

    /// Classifies the reply for auditing.
    #[must_use]
    pub fn outcome(&self) -> RequestOutcome {
        if self.status.is_success() {
            RequestOutcome::Ok
        } else if self.status.is_client_error() {
            RequestOutcome::Rejected
        } else {
            RequestOutcome::Failed
        }
    }

    /// Builds audit inputs for this reply.
    #[must_use]
    pub fn audit_params(&self, endpoint: Endpoint, request_bytes: usize) -> RequestAuditEventParams {
        RequestAuditEventParams {
            endpoint: endpoint.label(),
            outcome: self.outcome(),
            status: self.status.as_u16(),
            error_kind: self.error_kind,
            request_bytes,
            response_bytes: self.body.len(),
            cache_hit: self.cache_hit,
        }
    }
}

// ============================================================================
// SECTION: Dispatch
// ============================================================================

/// Request parameters merged from the query string and a form body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    /// Merged parameters; body values win.
    pub params: UploadParams,
    /// Every received pair, query first then body, re-encoded in arrival
    /// order. Keys cached reads so body-carried filters are part of the key.
    pub cache_query: String,
}

impl RequestParams {
    /// Parses the query string and form body of one request.
    #[must_use]
    pub fn parse(raw_query: &str, form_body: &[u8]) -> Self {
        let pairs: Vec<(String, String)> = url::form_urlencoded::parse(raw_query.as_bytes())
            .chain(url::form_urlencoded::parse(form_body))
            .map(|(name, value)| (name.into_owned(), value.into_owned()))
            .collect();
        let cache_query = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs.iter())
            .finish();
        Self {
            params: UploadParams::from_pairs(pairs),
            cache_query,
        }
    }
}

/// Runs the operation behind `endpoint` and shapes its reply.
///
/// `owner` is the authenticated uploader, when known.
#[must_use]
pub fn dispatch(
    tracker: &PerfTracker,
    endpoint: Endpoint,
    request: &RequestParams,
    owner: Option<String>,
) -> Reply {
    match run(tracker, endpoint, &request.params, &request.cache_query, owner) {
        Ok(reply) => reply,
        Err(err) => error_reply(endpoint, &err),
    }
}

/// Runs one operation.
fn run(
    tracker: &PerfTracker,
    endpoint: Endpoint,
    params: &UploadParams,
    cache_query: &str,
    owner: Option<String>,
) -> Result<Reply, TrackerError> {
    match endpoint {
        Endpoint::Session => {
            let id = match params.session_command()? {
                SessionCommand::Create => {
                    tracker.create_session(params.create_session_request(owner)?)?
                }
                SessionCommand::Update => {
                    tracker.update_session(params.update_session_request()?)?
                }
            };
            Ok(Reply::text(id.to_string()))
        }
        Endpoint::Result => {
            let id = tracker.create_result(params.create_result_request()?)?;
            Ok(Reply::text(id.to_string()))
        }
        Endpoint::Summary => {
            let id = tracker.create_summary(params.create_summary_request()?)?;
            Ok(Reply::text(id.to_string()))
        }
        Endpoint::Json => {
            let cached = tracker.read_json(params, cache_query)?;
            Ok(Reply::json(cached.body, cached.cache_hit))
        }
        Endpoint::BulkDelete => {
            let deleted = tracker.bulk_delete_results()?;
            Ok(Reply::text(format!("{deleted} entries deleted")))
        }
        Endpoint::Reconcile => {
            let report = tracker.reconcile_dimensions()?;
            Ok(Reply::json(serde_json::to_vec(&report)?, false))
        }
    }
}

/// Maps a tracker error to its reply, logging it.
fn error_reply(endpoint: Endpoint, err: &TrackerError) -> Reply {
    let kind = err.kind_label();
    if err.is_user_visible() {
        warn!(endpoint = endpoint.label(), kind, error = %err, "request rejected");
        let status = match err {
            TrackerError::NotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::BAD_REQUEST,
        };
        return Reply::failure(endpoint, status, kind, &err.to_string());
    }
    error!(endpoint = endpoint.label(), kind, error = %err, "request failed");
    Reply::failure(endpoint, StatusCode::INTERNAL_SERVER_ERROR, kind, INTERNAL_ERROR_MESSAGE)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
