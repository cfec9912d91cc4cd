// crates/perftracker-store-sqlite/tests/sqlite_store.rs
// ============================================================================
// Module: SQLite Record Store Tests
// Description: Persistence, query, and integrity tests for the SQLite store.
// Purpose: Validate ordering, filters, durability, and corruption detection.
// ============================================================================

//! ## Overview
//! Exercises [`SqliteRecordStore`] through the `RecordStore` trait:
//! - Round trips for every record kind and `None` for missing ids
//! - Persistence across store instances on one file
//! - Filter, ordering, and limit semantics of the query operations
//! - Hash mismatch, schema version, and path safety failures

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

use std::path::Path;
use std::sync::Arc;
use std::thread;

use perftracker_core::InMemoryQueryCache;
use perftracker_core::ManualClock;
use perftracker_core::NetworkCandidate;
use perftracker_core::NetworkId;
use perftracker_core::PerfTracker;
use perftracker_core::RecordStore;
use perftracker_core::ResultDraft;
use perftracker_core::ResultQuery;
use perftracker_core::SessionDraft;
use perftracker_core::SessionId;
use perftracker_core::SessionMetadata;
use perftracker_core::SessionQuery;
use perftracker_core::SharedQueryCache;
use perftracker_core::SharedRecordStore;
use perftracker_core::SortOrder;
use perftracker_core::StatisticsPayload;
use perftracker_core::StoreError;
use perftracker_core::SummaryDraft;
use perftracker_core::SummaryId;
use perftracker_core::SummaryQuery;
use perftracker_core::Timestamp;
use perftracker_core::TrackerSettings;
use perftracker_core::VersionId;
use perftracker_store_sqlite::SqliteRecordStore;
use perftracker_store_sqlite::SqliteStoreConfig;
use perftracker_store_sqlite::SqliteStoreError;
use perftracker_store_sqlite::SqliteStoreMode;
use perftracker_store_sqlite::SqliteSyncMode;
use rusqlite::Connection;
use rusqlite::params;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn config_for(path: &Path) -> SqliteStoreConfig {
    SqliteStoreConfig {
        path: path.to_path_buf(),
        busy_timeout_ms: 1_000,
        journal_mode: SqliteStoreMode::Wal,
        sync_mode: SqliteSyncMode::Normal,
    }
}

fn open_store(dir: &TempDir) -> SqliteRecordStore {
    SqliteRecordStore::new(&config_for(&dir.path().join("perftracker.db"))).unwrap()
}

fn network(rtt_ms: u64) -> NetworkCandidate {
    NetworkCandidate {
        download_kbps: 5_000,
        upload_kbps: 1_000,
        rtt_ms,
        packet_loss_pct: 0.0,
        protocol: "tcp".to_string(),
    }
}

fn stats(total_time: u64) -> StatisticsPayload {
    StatisticsPayload {
        total_time,
        num_requests: 12,
        ..StatisticsPayload::default()
    }
}

fn insert_session(
    store: &SqliteRecordStore,
    version_ref: VersionId,
    network_ref: Option<NetworkId>,
    created_at: i64,
) -> SessionId {
    store
        .insert_session(SessionDraft {
            version_ref,
            network_ref,
            metadata: SessionMetadata {
                owner: Some("bench@example.com".to_string()),
                notes: "nightly".to_string(),
                cmdline: "chrome --benchmark".to_string(),
                platform: "linux".to_string(),
                client_hostname: "bench-1".to_string(),
            },
            created_at: Timestamp::from_unix_millis(created_at),
        })
        .unwrap()
        .id
}

fn insert_result(store: &SqliteRecordStore, session: SessionId, url: &str, created_at: i64) {
    store
        .insert_result(ResultDraft {
            session_ref: session,
            url: url.to_string(),
            using_spdy: false,
            statistics: stats(450),
            created_at: Timestamp::from_unix_millis(created_at),
        })
        .unwrap();
}

fn insert_summary(
    store: &SqliteRecordStore,
    session: SessionId,
    url: &str,
    created_at: i64,
) -> SummaryId {
    store
        .insert_summary(SummaryDraft {
            session_ref: session,
            url: url.to_string(),
            iterations: 10,
            total_time_stddev: 12.5,
            statistics: stats(450),
            created_at: Timestamp::from_unix_millis(created_at),
        })
        .unwrap()
        .id
}

// ============================================================================
// SECTION: Round Trips
// ============================================================================

#[test]
fn records_round_trip_with_assigned_ids() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);

    let version = store.insert_version("5.0.1").unwrap();
    assert_eq!(version.id.get(), 1);
    assert_eq!(store.find_version("5.0.1").unwrap(), Some(version.clone()));

    let profile = store.insert_network(network(40)).unwrap();
    assert_eq!(profile.label, "tcp/5.0Mbps/1000Kbps/40ms/0.0%");
    assert_eq!(store.find_network(&profile.label).unwrap(), Some(profile.clone()));

    let session_id = insert_session(&store, version.id, Some(profile.id), 1_000);
    let session = store.load_session(session_id).unwrap().unwrap();
    assert_eq!(session.version_ref, version.id);
    assert_eq!(session.network_ref, Some(profile.id));
    assert_eq!(session.owner.as_deref(), Some("bench@example.com"));
    assert_eq!(session.statistics, None);

    let summary_id = insert_summary(&store, session_id, "http://a.test/", 1_001);
    let summary = store.load_summary(summary_id).unwrap().unwrap();
    assert_eq!(summary.url, "http://a.test/");
    assert!((summary.total_time_stddev - 12.5).abs() < f64::EPSILON);
}

#[test]
fn missing_records_load_as_none() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    assert!(store.find_version("missing").unwrap().is_none());
    assert!(store.find_network("udp/1Kbps/1Kbps/1ms/0.0%").unwrap().is_none());
    assert!(store.load_session(SessionId::from_raw(42).unwrap()).unwrap().is_none());
    assert!(store.load_summary(SummaryId::from_raw(42).unwrap()).unwrap().is_none());
}

#[test]
fn save_session_overwrites_statistics() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let version = store.insert_version("1.0").unwrap();
    let id = insert_session(&store, version.id, None, 10);

    let mut session = store.load_session(id).unwrap().unwrap();
    session.statistics = Some(stats(900));
    session.iterations = Some(3);
    session.url_count = Some(7);
    store.save_session(&session).unwrap();

    let reloaded = store.load_session(id).unwrap().unwrap();
    assert_eq!(reloaded, session);
}

#[test]
fn save_session_rejects_unknown_id() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let version = store.insert_version("1.0").unwrap();
    let id = insert_session(&store, version.id, None, 10);
    let mut session = store.load_session(id).unwrap().unwrap();
    session.id = SessionId::from_raw(999).unwrap();

    let err = store.save_session(&session).unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

#[test]
fn records_persist_across_instances() {
    let dir = TempDir::new().unwrap();
    let session_id = {
        let store = open_store(&dir);
        let version = store.insert_version("2.0").unwrap();
        insert_session(&store, version.id, None, 5)
    };
    let reopened = open_store(&dir);
    assert!(reopened.load_session(session_id).unwrap().is_some());
    assert_eq!(reopened.list_versions().unwrap().len(), 1);
}

// ============================================================================
// SECTION: Queries
// ============================================================================

#[test]
fn session_query_filters_and_orders_newest_first() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let v1 = store.insert_version("1.0").unwrap();
    let v2 = store.insert_version("2.0").unwrap();
    let fast = store.insert_network(network(10)).unwrap();
    let slow = store.insert_network(network(200)).unwrap();

    let a = insert_session(&store, v1.id, Some(fast.id), 100);
    let b = insert_session(&store, v2.id, Some(fast.id), 200);
    let c = insert_session(&store, v1.id, Some(slow.id), 300);
    let _ = insert_session(&store, v2.id, Some(slow.id), 400);

    let by_version: Vec<SessionId> = store
        .query_sessions(&SessionQuery {
            version_refs: vec![v1.id],
            network_refs: Vec::new(),
            order: SortOrder::CreatedDesc,
            limit: None,
        })
        .unwrap()
        .into_iter()
        .map(|session| session.id)
        .collect();
    assert_eq!(by_version, vec![c, a]);

    let by_both: Vec<SessionId> = store
        .query_sessions(&SessionQuery {
            version_refs: vec![v1.id, v2.id],
            network_refs: vec![fast.id],
            order: SortOrder::CreatedDesc,
            limit: None,
        })
        .unwrap()
        .into_iter()
        .map(|session| session.id)
        .collect();
    assert_eq!(by_both, vec![b, a]);

    let limited = store
        .query_sessions(&SessionQuery {
            version_refs: Vec::new(),
            network_refs: Vec::new(),
            order: SortOrder::CreatedDesc,
            limit: Some(2),
        })
        .unwrap();
    assert_eq!(limited.len(), 2);
    assert_eq!(limited[1].id, c);
}

#[test]
fn equal_timestamps_order_by_id() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let version = store.insert_version("1.0").unwrap();
    let first = insert_session(&store, version.id, None, 50);
    let second = insert_session(&store, version.id, None, 50);

    let asc = store
        .query_sessions(&SessionQuery {
            version_refs: Vec::new(),
            network_refs: Vec::new(),
            order: SortOrder::CreatedAsc,
            limit: None,
        })
        .unwrap();
    assert_eq!(asc.iter().map(|s| s.id).collect::<Vec<_>>(), vec![first, second]);
}

#[test]
fn result_query_matches_session_and_url() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let version = store.insert_version("1.0").unwrap();
    let s1 = insert_session(&store, version.id, None, 1);
    let s2 = insert_session(&store, version.id, None, 2);
    insert_result(&store, s1, "http://a.test/", 10);
    insert_result(&store, s1, "http://b.test/", 11);
    insert_result(&store, s1, "http://a.test/", 12);
    insert_result(&store, s2, "http://a.test/", 13);

    let matched = store
        .query_results(&ResultQuery {
            session_ref: Some(s1),
            url: Some("http://a.test/".to_string()),
            order: SortOrder::CreatedAsc,
            limit: None,
        })
        .unwrap();
    assert_eq!(matched.len(), 2);
    assert!(matched.iter().all(|r| r.session_ref == s1 && r.url == "http://a.test/"));
    assert!(matched[0].created_at < matched[1].created_at);

    let latest = store
        .query_results(&ResultQuery {
            session_ref: None,
            url: None,
            order: SortOrder::CreatedDesc,
            limit: Some(1),
        })
        .unwrap();
    assert_eq!(latest[0].session_ref, s2);
}

#[test]
fn summary_query_scopes_to_session() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let version = store.insert_version("1.0").unwrap();
    let s1 = insert_session(&store, version.id, None, 1);
    let s2 = insert_session(&store, version.id, None, 2);
    let a = insert_summary(&store, s1, "http://a.test/", 10);
    let b = insert_summary(&store, s1, "http://b.test/", 11);
    insert_summary(&store, s2, "http://a.test/", 12);

    let summaries = store
        .query_summaries(&SummaryQuery {
            session_ref: Some(s1),
            order: SortOrder::CreatedAsc,
            limit: None,
        })
        .unwrap();
    assert_eq!(summaries.iter().map(|s| s.id).collect::<Vec<_>>(), vec![a, b]);
}

#[test]
fn delete_results_counts_only_existing_rows() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let version = store.insert_version("1.0").unwrap();
    let session = insert_session(&store, version.id, None, 1);
    insert_result(&store, session, "http://a.test/", 10);
    insert_result(&store, session, "http://a.test/", 11);
    let ids: Vec<_> = store
        .query_results(&ResultQuery {
            session_ref: None,
            url: None,
            order: SortOrder::CreatedAsc,
            limit: None,
        })
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();

    assert_eq!(store.delete_results(&ids).unwrap(), 2);
    assert_eq!(store.delete_results(&ids).unwrap(), 0);
}

#[test]
fn duplicate_dimension_values_are_accepted() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let first = store.insert_version("3.1").unwrap();
    let second = store.insert_version("3.1").unwrap();
    assert_ne!(first.id, second.id);
    assert_eq!(store.find_version("3.1").unwrap().unwrap().id, first.id);

    assert!(store.delete_version(second.id).unwrap());
    assert!(!store.delete_version(second.id).unwrap());
    assert_eq!(store.list_versions().unwrap(), vec![first]);
}

// ============================================================================
// SECTION: Integrity
// ============================================================================

#[test]
fn tampered_payload_is_reported_as_corrupt() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("perftracker.db");
    let store = SqliteRecordStore::new(&config_for(&path)).unwrap();
    let version = store.insert_version("1.0").unwrap();
    let id = insert_session(&store, version.id, None, 1);
    drop(store);

    let conn = Connection::open(&path).unwrap();
    conn.execute(
        "UPDATE sessions SET record_json = CAST(?1 AS BLOB) WHERE id = ?2",
        params![r#"{"tampered":true}"#, i64::try_from(id.get()).unwrap()],
    )
    .unwrap();
    drop(conn);

    let store = SqliteRecordStore::new(&config_for(&path)).unwrap();
    let err = store.load_session(id).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)), "unexpected error: {err:?}");
}

#[test]
fn unsupported_hash_algorithm_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("perftracker.db");
    let store = SqliteRecordStore::new(&config_for(&path)).unwrap();
    let profile = store.insert_network(network(40)).unwrap();
    drop(store);

    let conn = Connection::open(&path).unwrap();
    conn.execute("UPDATE networks SET hash_algorithm = 'md5' WHERE id = ?1", params![
        i64::try_from(profile.id.get()).unwrap()
    ])
    .unwrap();
    drop(conn);

    let store = SqliteRecordStore::new(&config_for(&path)).unwrap();
    let err = store.list_networks().unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
}

#[test]
fn schema_version_mismatch_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("perftracker.db");
    drop(SqliteRecordStore::new(&config_for(&path)).unwrap());

    let conn = Connection::open(&path).unwrap();
    conn.execute("UPDATE store_meta SET version = 99", params![]).unwrap();
    drop(conn);

    let Err(err) = SqliteRecordStore::new(&config_for(&path)) else {
        panic!("expected schema version mismatch");
    };
    assert!(matches!(err, SqliteStoreError::VersionMismatch(_)));
}

#[test]
fn directory_path_is_rejected() {
    let dir = TempDir::new().unwrap();
    let Err(err) = SqliteRecordStore::new(&config_for(dir.path())) else {
        panic!("expected directory rejection");
    };
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn overlong_path_component_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("x".repeat(300));
    let Err(err) = SqliteRecordStore::new(&config_for(&path)) else {
        panic!("expected path rejection");
    };
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

// ============================================================================
// SECTION: Service Integration
// ============================================================================

#[test]
fn concurrent_session_creates_share_one_file() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(open_store(&dir));
    let version = store.insert_version("1.0").unwrap();

    let handles: Vec<_> = (0 .. 4)
        .map(|worker| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0 .. 5 {
                    insert_session(&store, version.id, None, worker * 100 + i);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let all = store
        .query_sessions(&SessionQuery {
            version_refs: Vec::new(),
            network_refs: Vec::new(),
            order: SortOrder::CreatedAsc,
            limit: None,
        })
        .unwrap();
    assert_eq!(all.len(), 20);
}

#[test]
fn tracker_reconciles_duplicates_in_sqlite() {
    let dir = TempDir::new().unwrap();
    let store = open_store(&dir);
    let first = store.insert_version("7.0").unwrap();
    let duplicate = store.insert_version("7.0").unwrap();
    let session = insert_session(&store, duplicate.id, None, 1);

    let clock = ManualClock::new(Timestamp::from_unix_millis(10));
    let tracker = PerfTracker::new(
        SharedRecordStore::from_store(store.clone()),
        SharedQueryCache::from_cache(InMemoryQueryCache::with_clock(Arc::new(clock.clone()), 16)),
        Arc::new(clock),
        TrackerSettings::default(),
    );
    let report = tracker.reconcile_dimensions().unwrap();
    assert_eq!(report.merged_versions, 1);
    assert_eq!(report.repointed_sessions, 1);
    assert_eq!(store.load_session(session).unwrap().unwrap().version_ref, first.id);
    assert_eq!(store.list_versions().unwrap(), vec![first]);
}
