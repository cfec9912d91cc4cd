// crates/perftracker-server/tests/http.rs
// ============================================================================
// Module: HTTP Transport Tests
// Description: End-to-end requests against a live listener.
// Purpose: Validate routing, body limits, and request auditing over TCP.
// ============================================================================

//! ## Overview
//! Binds an ephemeral port, serves the router, and speaks raw HTTP/1.1 so
//! the tests exercise the same stack deployments run.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

mod common;

use std::net::SocketAddr;
use std::sync::Arc;

use perftracker_config::PerfTrackerConfig;
use perftracker_server::PerfTrackerServer;
use perftracker_server::RequestOutcome;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::net::TcpStream;

use crate::common::RecordingAuditSink;
use crate::common::create_form;
use crate::common::tracker;

/// Starts a server with `config` and returns its address and audit sink.
async fn start(config: PerfTrackerConfig) -> (SocketAddr, Arc<RecordingAuditSink>) {
    let (tracker, _clock) = tracker();
    let audit = Arc::new(RecordingAuditSink::default());
    let server = PerfTrackerServer::from_parts(config, tracker, Arc::clone(&audit) as Arc<dyn perftracker_server::RequestAuditSink>);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve_listener(listener));
    (addr, audit)
}

/// Sends one request and returns the status code and body.
async fn send(addr: SocketAddr, method: &str, target: &str, body: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{method} {target} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: \
         application/x-www-form-urlencoded\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let response = String::from_utf8(raw).unwrap();
    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or_else(|| panic!("malformed response: {response}"));
    let body = response.split_once("\r\n\r\n").map(|(_, body)| body.to_string()).unwrap_or_default();
    (status, body)
}

#[tokio::test(flavor = "multi_thread")]
async fn create_session_over_http_is_audited() {
    let (addr, audit) = start(PerfTrackerConfig::default()).await;
    let (status, body) = send(addr, "POST", "/set", &create_form("1.0")).await;
    assert_eq!(status, 200);
    assert_eq!(body, "1");

    let (status, body) = send(addr, "GET", "/json?type=set&id=1", "").await;
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["object"]["platform"], "linux");

    let events = audit.events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].endpoint, "set");
    assert_eq!(events[0].outcome, RequestOutcome::Ok);
    assert_eq!(events[0].response_bytes, 1);
    assert_eq!(events[1].endpoint, "json");
}

#[tokio::test(flavor = "multi_thread")]
async fn oversized_body_is_rejected() {
    let mut config = PerfTrackerConfig::default();
    config.server.max_body_bytes = 64;
    let (addr, audit) = start(config).await;
    let body = format!("cmd=create&version=1.0&notes={}", "x".repeat(36));
    assert_eq!(body.len(), 65);
    let (status, reply) = send(addr, "POST", "/set", &body).await;
    assert_eq!(status, 413);
    assert_eq!(reply, "request body too large");

    let events = audit.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].outcome, RequestOutcome::Rejected);
    assert_eq!(events[0].error_kind, Some("body_too_large"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_route_is_not_found() {
    let (addr, audit) = start(PerfTrackerConfig::default()).await;
    let (status, _) = send(addr, "GET", "/missing", "").await;
    assert_eq!(status, 404);
    assert!(audit.events.lock().unwrap().is_empty());
}
