// crates/perftracker-server/tests/dispatch.rs
// ============================================================================
// Module: Server Dispatch Tests
// Description: Endpoint behavior through the synchronous dispatch layer.
// Purpose: Validate reply bodies, status mapping, and cache flags.
// ============================================================================

//! ## Overview
//! Drives [`dispatch`] the way the HTTP handlers do: merge parameters, run
//! the endpoint, and inspect the reply.

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

use axum::http::StatusCode;
use perftracker_core::PerfTracker;
use perftracker_server::Endpoint;
use perftracker_server::Reply;
use perftracker_server::RequestOutcome;
use perftracker_server::RequestParams;
use perftracker_server::dispatch;
use serde_json::Value;

use crate::common::STATS_FORM;
use crate::common::create_form;
use crate::common::tracker;

/// Merges parameters and dispatches one request without an owner.
fn call(tracker: &PerfTracker, endpoint: Endpoint, query: &str, body: &str) -> Reply {
    let request = RequestParams::parse(query, body.as_bytes());
    dispatch(tracker, endpoint, &request, None)
}

/// Returns the reply body as text.
fn body_text(reply: &Reply) -> String {
    String::from_utf8(reply.body.clone()).unwrap()
}

/// Parses the reply body as JSON.
fn body_json(reply: &Reply) -> Value {
    serde_json::from_slice(&reply.body).unwrap()
}

/// Creates a session and returns its id.
fn create_session(tracker: &PerfTracker, version: &str) -> String {
    let reply = call(tracker, Endpoint::Session, "", &create_form(version));
    assert_eq!(reply.status, StatusCode::OK, "create failed: {}", body_text(&reply));
    body_text(&reply)
}

// ============================================================================
// SECTION: Uploads
// ============================================================================

#[test]
fn upload_flow_returns_ids_as_text() {
    let (tracker, _clock) = tracker();
    let set_id = create_session(&tracker, "5.0");
    assert_eq!(set_id, "1");

    let update = call(
        &tracker,
        Endpoint::Session,
        "",
        &format!("cmd=update&set_id={set_id}&iterations=3&url_count=2&{STATS_FORM}"),
    );
    assert_eq!(body_text(&update), set_id);

    let result = call(
        &tracker,
        Endpoint::Result,
        "",
        &format!("set_id={set_id}&url=http%3A%2F%2Fa.test%2F&using_spdy=true&{STATS_FORM}"),
    );
    assert_eq!(result.status, StatusCode::OK);
    assert_eq!(body_text(&result), "1");

    let summary = call(
        &tracker,
        Endpoint::Summary,
        "",
        &format!(
            "set_id={set_id}&url=http%3A%2F%2Fa.test%2F&iterations=3&total_time_stddev=4.5&{STATS_FORM}"
        ),
    );
    assert_eq!(body_text(&summary), "1");

    let view = call(&tracker, Endpoint::Json, &format!("type=summary&id={}", body_text(&summary)), "");
    let json = body_json(&view);
    assert_eq!(json["object"]["url"], "http://a.test/");
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
    assert_eq!(json["results"][0]["using_spdy"], true);
    assert_eq!(json["results"][0]["total_time"], 450);
    assert_eq!(json["object"]["total_time"], 450);
}

#[test]
fn query_string_parameters_are_accepted_for_uploads() {
    let (tracker, _clock) = tracker();
    let reply = call(&tracker, Endpoint::Session, &create_form("1.0"), "");
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(body_text(&reply), "1");
}

#[test]
fn missing_command_is_rejected_with_message() {
    let (tracker, _clock) = tracker();
    let reply = call(&tracker, Endpoint::Session, "", "version=1.0");
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(body_text(&reply), "bad request, no cmd param");
    assert_eq!(reply.error_kind, Some("missing_parameter"));
    assert_eq!(reply.outcome(), RequestOutcome::Rejected);
}

#[test]
fn unknown_command_is_rejected() {
    let (tracker, _clock) = tracker();
    let reply = call(&tracker, Endpoint::Session, "", "cmd=delete");
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.error_kind, Some("unknown_command"));
}

#[test]
fn unknown_parent_session_is_not_found() {
    let (tracker, _clock) = tracker();
    let reply =
        call(&tracker, Endpoint::Result, "", &format!("set_id=77&url=http%3A%2F%2Fa.test%2F&{STATS_FORM}"));
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(body_text(&reply), "could not find session id: 77");
}

#[test]
fn malformed_number_is_a_generic_failure() {
    let (tracker, _clock) = tracker();
    let set_id = create_session(&tracker, "1.0");
    let reply = call(
        &tracker,
        Endpoint::Session,
        "",
        &format!("cmd=update&set_id={set_id}&iterations=three&url_count=2&{STATS_FORM}"),
    );
    assert_eq!(reply.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_text(&reply), "internal error");
    assert_eq!(reply.error_kind, Some("invalid_argument"));
    assert_eq!(reply.outcome(), RequestOutcome::Failed);
}

// ============================================================================
// SECTION: JSON Reads
// ============================================================================

#[test]
fn json_errors_use_error_objects() {
    let (tracker, _clock) = tracker();
    let missing = call(&tracker, Endpoint::Json, "", "");
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(body_json(&missing)["error"], "bad request, no type param");

    let unknown = call(&tracker, Endpoint::Json, "type=set&id=9", "");
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
    assert_eq!(body_json(&unknown)["error"], "could not find session id: 9");
}

#[test]
fn session_search_is_served_from_cache_on_repeat() {
    let (tracker, _clock) = tracker();
    create_session(&tracker, "1.0");
    let first = call(&tracker, Endpoint::Json, "type=set_search", "");
    assert!(!first.cache_hit);
    assert_eq!(body_json(&first).as_array().unwrap().len(), 1);

    create_session(&tracker, "1.0");
    let second = call(&tracker, Endpoint::Json, "type=set_search", "");
    assert!(second.cache_hit);
    assert_eq!(second.body, first.body);
}

#[test]
fn body_filters_key_their_own_cache_entry() {
    let (tracker, _clock) = tracker();
    create_session(&tracker, "1.0");
    create_session(&tracker, "2.0");

    let filtered = call(&tracker, Endpoint::Json, "type=set_search", "version_filter=1");
    assert!(!filtered.cache_hit);
    assert_eq!(body_json(&filtered).as_array().unwrap().len(), 1);

    let unfiltered = call(&tracker, Endpoint::Json, "type=set_search", "");
    assert!(!unfiltered.cache_hit);
    assert_eq!(body_json(&unfiltered).as_array().unwrap().len(), 2);

    let repeat = call(&tracker, Endpoint::Json, "type=set_search", "version_filter=1");
    assert!(repeat.cache_hit);
    assert_eq!(repeat.body, filtered.body);
}

#[test]
fn result_type_returns_empty_object() {
    let (tracker, _clock) = tracker();
    let reply = call(&tracker, Endpoint::Json, "type=result&id=1", "");
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, b"{}".to_vec());
}

#[test]
fn filters_list_versions_and_networks() {
    let (tracker, _clock) = tracker();
    create_session(&tracker, "2.0");
    create_session(&tracker, "1.0");
    let json = body_json(&call(&tracker, Endpoint::Json, "type=filters", ""));
    let versions: Vec<&str> =
        json["versions"].as_array().unwrap().iter().map(|v| v["label"].as_str().unwrap()).collect();
    assert_eq!(versions, vec!["1.0", "2.0"]);
    assert_eq!(json["networks"][0]["label"], "tcp/5.0Mbps/1000Kbps/40ms/0.0%");
}

// ============================================================================
// SECTION: Administration
// ============================================================================

#[test]
fn bulk_delete_reports_actual_count() {
    let (tracker, _clock) = tracker();
    let set_id = create_session(&tracker, "1.0");
    for _ in 0 .. 3 {
        call(
            &tracker,
            Endpoint::Result,
            "",
            &format!("set_id={set_id}&url=http%3A%2F%2Fa.test%2F&{STATS_FORM}"),
        );
    }
    let reply = call(&tracker, Endpoint::BulkDelete, "", "");
    assert_eq!(body_text(&reply), "3 entries deleted");
    let again = call(&tracker, Endpoint::BulkDelete, "", "");
    assert_eq!(body_text(&again), "0 entries deleted");
}

#[test]
fn reconcile_returns_json_report() {
    let (tracker, _clock) = tracker();
    create_session(&tracker, "1.0");
    let reply = call(&tracker, Endpoint::Reconcile, "", "");
    assert_eq!(reply.status, StatusCode::OK);
    let json = body_json(&reply);
    assert_eq!(json["merged_versions"], 0);
    assert_eq!(json["merged_networks"], 0);
    assert_eq!(json["repointed_sessions"], 0);
}

#[test]
fn owner_is_recorded_on_created_session() {
    let (tracker, _clock) = tracker();
    let form = create_form("1.0");
    let request = RequestParams::parse("", form.as_bytes());
    let reply =
        dispatch(&tracker, Endpoint::Session, &request, Some("bench@example.com".to_string()));
    let view = call(&tracker, Endpoint::Json, &format!("type=set&id={}", body_text(&reply)), "");
    assert_eq!(body_json(&view)["object"]["owner"], "bench@example.com");
}
