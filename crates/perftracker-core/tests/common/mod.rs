// crates/perftracker-core/tests/common/mod.rs
// =============================================================================
// Module: PerfTracker Test Helpers
// Description: Shared fixtures for PerfTracker integration tests.
// Purpose: Build a tracker on in-memory backends with a manual clock.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]
#![allow(clippy::expect_used, reason = "Fixtures fail fast on setup errors.")]

use std::sync::Arc;
use std::time::Duration;

use perftracker_core::InMemoryQueryCache;
use perftracker_core::InMemoryRecordStore;
use perftracker_core::ManualClock;
use perftracker_core::PerfTracker;
use perftracker_core::ResultId;
use perftracker_core::SessionId;
use perftracker_core::SharedQueryCache;
use perftracker_core::SharedRecordStore;
use perftracker_core::SummaryId;
use perftracker_core::Timestamp;
use perftracker_core::TrackerSettings;
use perftracker_core::UploadParams;

/// Start time of every test clock.
pub const START_MILLIS: i64 = 1_700_000_000_000;

/// Tracker plus handles to its in-memory collaborators.
pub struct Harness {
    /// Service under test.
    pub tracker: PerfTracker,
    /// Clock shared by the tracker and its cache.
    pub clock: ManualClock,
    /// Store shared with the tracker.
    pub store: InMemoryRecordStore,
    /// Cache shared with the tracker.
    pub cache: InMemoryQueryCache,
}

/// Builds a harness with default settings.
pub fn harness() -> Harness {
    harness_with(TrackerSettings::default())
}

/// Builds a harness with explicit settings.
pub fn harness_with(settings: TrackerSettings) -> Harness {
    let clock = ManualClock::new(Timestamp::from_unix_millis(START_MILLIS));
    let store = InMemoryRecordStore::new();
    let cache = InMemoryQueryCache::with_clock(Arc::new(clock.clone()), 1024);
    let tracker = PerfTracker::new(
        SharedRecordStore::from_store(store.clone()),
        SharedQueryCache::from_cache(cache.clone()),
        Arc::new(clock.clone()),
        settings,
    );
    Harness {
        tracker,
        clock,
        store,
        cache,
    }
}

/// Returns the eleven statistics fields with fixed values.
pub fn stats_pairs() -> Vec<(String, String)> {
    [
        ("start_load_time", "100"),
        ("commit_load_time", "120"),
        ("doc_load_time", "300"),
        ("paint_time", "280"),
        ("total_time", "450"),
        ("last_load_time", "440"),
        ("num_requests", "12"),
        ("num_connects", "4"),
        ("num_sessions", "2"),
        ("read_bytes_kb", "12.5"),
        ("write_bytes_kb", "3.2"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), value.to_string()))
    .collect()
}

/// Session create parameters on a fixed tcp network.
pub fn create_params(version: &str) -> UploadParams {
    UploadParams::from_pairs([
        ("cmd", "create"),
        ("version", version),
        ("download_kbps", "5000"),
        ("upload_kbps", "1000"),
        ("rtt_ms", "40"),
        ("packet_loss_pct", "0.0"),
        ("protocol", "tcp"),
        ("notes", "nightly"),
        ("cmdline", "--run"),
        ("platform", "linux"),
        ("client_hostname", "bench-1"),
    ])
}

/// Session update parameters.
pub fn update_params(session: SessionId) -> UploadParams {
    let mut params = UploadParams::from_pairs(stats_pairs());
    params.insert("cmd", "update");
    params.insert("set_id", session.to_string());
    params.insert("iterations", "5");
    params.insert("url_count", "10");
    params
}

/// Result upload parameters.
pub fn result_params(session: SessionId, url: &str) -> UploadParams {
    let mut params = UploadParams::from_pairs(stats_pairs());
    params.insert("set_id", session.to_string());
    params.insert("url", url);
    params.insert("using_spdy", "true");
    params
}

/// Summary upload parameters.
pub fn summary_params(session: SessionId, url: &str) -> UploadParams {
    let mut params = UploadParams::from_pairs(stats_pairs());
    params.insert("set_id", session.to_string());
    params.insert("url", url);
    params.insert("iterations", "5");
    params.insert("total_time_stddev", "1.5");
    params
}

impl Harness {
    /// Advances the clock by one millisecond.
    pub fn tick(&self) {
        self.clock.advance(Duration::from_millis(1));
    }

    /// Creates a session for `version` on the fixed network.
    pub fn create_session(&self, version: &str) -> SessionId {
        self.tick();
        let request = create_params(version).create_session_request(None).expect("create params");
        self.tracker.create_session(request).expect("create session")
    }

    /// Creates a result under `session`.
    pub fn create_result(&self, session: SessionId, url: &str) -> ResultId {
        self.tick();
        let request = result_params(session, url).create_result_request().expect("result params");
        self.tracker.create_result(request).expect("create result")
    }

    /// Creates a summary under `session`.
    pub fn create_summary(&self, session: SessionId, url: &str) -> SummaryId {
        self.tick();
        let request =
            summary_params(session, url).create_summary_request().expect("summary params");
        self.tracker.create_summary(request).expect("create summary")
    }
}
