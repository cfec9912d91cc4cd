// crates/perftracker-server/tests/common/mod.rs
// =============================================================================
// Module: Server Test Helpers
// Description: Shared fixtures for PerfTracker server tests.
// Purpose: Build a tracker on in-memory backends and encode upload forms.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use std::sync::Arc;
use std::sync::Mutex;

use perftracker_core::InMemoryQueryCache;
use perftracker_core::InMemoryRecordStore;
use perftracker_core::ManualClock;
use perftracker_core::PerfTracker;
use perftracker_core::SharedQueryCache;
use perftracker_core::SharedRecordStore;
use perftracker_core::Timestamp;
use perftracker_core::TrackerSettings;
use perftracker_server::RequestAuditEvent;
use perftracker_server::RequestAuditSink;

/// Builds a tracker over in-memory backends with a manual clock.
pub fn tracker() -> (PerfTracker, ManualClock) {
    let clock = ManualClock::new(Timestamp::from_unix_millis(1_700_000_000_000));
    let cache = InMemoryQueryCache::with_clock(Arc::new(clock.clone()), 256);
    let tracker = PerfTracker::new(
        SharedRecordStore::from_store(InMemoryRecordStore::new()),
        SharedQueryCache::from_cache(cache),
        Arc::new(clock.clone()),
        TrackerSettings::default(),
    );
    (tracker, clock)
}

/// Form-encoded statistics fields.
pub const STATS_FORM: &str = "start_load_time=100&commit_load_time=120&doc_load_time=300\
&paint_time=280&total_time=450&last_load_time=440&num_requests=12&num_connects=4\
&num_sessions=2&read_bytes_kb=12.5&write_bytes_kb=3.2";

/// Form-encoded session create with network conditions.
pub fn create_form(version: &str) -> String {
    format!(
        "cmd=create&version={version}&download_kbps=5000&upload_kbps=1000&rtt_ms=40\
&packet_loss_pct=0&protocol=tcp&notes=nightly&platform=linux"
    )
}

/// Audit sink that keeps events in memory.
#[derive(Default)]
pub struct RecordingAuditSink {
    /// Recorded events.
    pub events: Mutex<Vec<RequestAuditEvent>>,
}

impl RequestAuditSink for RecordingAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
