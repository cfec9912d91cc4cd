// perftracker-server/src/lib.rs
// ============================================================================
// Module: PerfTracker Server Library
// Description: HTTP transport for the PerfTracker service.
// Purpose: Map upload, JSON, and admin endpoints onto `PerfTracker`.
// Dependencies: axum, tokio, perftracker-core, perftracker-config
// ============================================================================

//! ## Overview
//! [`PerfTrackerServer`] builds the record store and cache from
//! configuration and serves the upload endpoints (`/set`, `/result`,
//! `/summary`), the JSON read endpoint (`/json`), and the administrative
//! endpoints (`/bulkdel`, `/admin/reconcile`). Request handling is split into
//! a synchronous [`dispatch`] layer, which is what the tests drive, and thin
//! axum handlers that run it on the blocking pool.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod dispatch;
pub mod server;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RequestAuditEvent;
pub use audit::RequestAuditEventParams;
pub use audit::RequestAuditSink;
pub use audit::RequestOutcome;
pub use audit::StderrAuditSink;
pub use dispatch::Endpoint;
pub use dispatch::OWNER_HEADER;
pub use dispatch::Reply;
pub use dispatch::RequestParams;
pub use dispatch::dispatch;
pub use server::PerfTrackerServer;
pub use server::ServerError;
