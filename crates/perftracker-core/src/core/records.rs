// perftracker-core/src/core/records.rs
// ============================================================================
// Module: PerfTracker Records
// Description: Benchmark sessions, per-URL results, and per-URL summaries.
// Purpose: Strongly typed records for everything a client uploads.
// Dependencies: serde, crate::core::{identifiers, time}
// ============================================================================

//! ## Overview
//! A [`TestSession`] is one benchmark upload run. It owns any number of
//! [`TestResult`] records (one per URL load) and [`TestSummary`] records (one
//! per URL, aggregated over iterations). All three share the
//! [`StatisticsPayload`] block verbatim.
//!
//! Drafts (`*Draft`) are records without a store-assigned id; the record store
//! allocates the id and the creation timestamp is supplied by the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::NetworkId;
use crate::core::identifiers::ResultId;
use crate::core::identifiers::SessionId;
use crate::core::identifiers::SummaryId;
use crate::core::identifiers::VersionId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Statistics Payload
// ============================================================================

/// Timing, count, and byte statistics shared by sessions, results, and summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsPayload {
    /// Time until the load started (ms).
    pub start_load_time: u64,
    /// Time until the load committed (ms).
    pub commit_load_time: u64,
    /// Time until the document finished loading (ms).
    pub doc_load_time: u64,
    /// Time until first paint (ms).
    pub paint_time: u64,
    /// Total load time (ms).
    pub total_time: u64,
    /// Time of the last load event (ms).
    pub last_load_time: u64,
    /// Number of requests issued.
    pub num_requests: u64,
    /// Number of connections opened.
    pub num_connects: u64,
    /// Number of sessions opened.
    pub num_sessions: u64,
    /// Kilobytes read, truncated to a whole number.
    pub read_bytes_kb: u64,
    /// Kilobytes written, truncated to a whole number.
    pub write_bytes_kb: u64,
}

// ============================================================================
// SECTION: Test Session
// ============================================================================

/// Metadata supplied when a session is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Authenticated uploader, when the transport knows one.
    pub owner: Option<String>,
    /// Free-form notes.
    pub notes: String,
    /// Benchmark command line.
    pub cmdline: String,
    /// Client platform description.
    pub platform: String,
    /// Client host name.
    pub client_hostname: String,
}

/// Session record before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDraft {
    /// Version dimension reference.
    pub version_ref: VersionId,
    /// Network dimension reference, when network conditions were uploaded.
    pub network_ref: Option<NetworkId>,
    /// Identity and descriptive metadata.
    pub metadata: SessionMetadata,
    /// Creation time.
    pub created_at: Timestamp,
}

/// One benchmark upload run.
///
/// # Invariants
/// - `statistics`, `iterations`, and `url_count` are `None` until the session
///   is updated; the update writes all three together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSession {
    /// Store-assigned identifier.
    pub id: SessionId,
    /// Version dimension reference (non-owning).
    pub version_ref: VersionId,
    /// Network dimension reference (non-owning).
    pub network_ref: Option<NetworkId>,
    /// Authenticated uploader.
    pub owner: Option<String>,
    /// Free-form notes.
    pub notes: String,
    /// Benchmark command line.
    pub cmdline: String,
    /// Client platform description.
    pub platform: String,
    /// Client host name.
    pub client_hostname: String,
    /// Creation time.
    pub created_at: Timestamp,
    /// Iterations run per URL.
    pub iterations: Option<u64>,
    /// Number of URLs in the run.
    pub url_count: Option<u64>,
    /// Aggregate statistics for the whole run.
    #[serde(flatten)]
    pub statistics: Option<StatisticsPayload>,
}

impl SessionDraft {
    /// Builds the stored session for this draft.
    #[must_use]
    pub fn into_session(self, id: SessionId) -> TestSession {
        TestSession {
            id,
            version_ref: self.version_ref,
            network_ref: self.network_ref,
            owner: self.metadata.owner,
            notes: self.metadata.notes,
            cmdline: self.metadata.cmdline,
            platform: self.metadata.platform,
            client_hostname: self.metadata.client_hostname,
            created_at: self.created_at,
            iterations: None,
            url_count: None,
            statistics: None,
        }
    }
}

// ============================================================================
// SECTION: Test Result
// ============================================================================

/// Result record before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultDraft {
    /// Parent session.
    pub session_ref: SessionId,
    /// URL that was loaded.
    pub url: String,
    /// Whether the load used SPDY.
    pub using_spdy: bool,
    /// Load statistics.
    #[serde(flatten)]
    pub statistics: StatisticsPayload,
    /// Creation time.
    pub created_at: Timestamp,
}

/// One URL load within a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    /// Store-assigned identifier.
    pub id: ResultId,
    /// Parent session.
    pub session_ref: SessionId,
    /// URL that was loaded.
    pub url: String,
    /// Whether the load used SPDY.
    pub using_spdy: bool,
    /// Creation time.
    pub created_at: Timestamp,
    /// Load statistics.
    #[serde(flatten)]
    pub statistics: StatisticsPayload,
}

impl ResultDraft {
    /// Builds the stored result for this draft.
    #[must_use]
    pub fn into_result(self, id: ResultId) -> TestResult {
        TestResult {
            id,
            session_ref: self.session_ref,
            url: self.url,
            using_spdy: self.using_spdy,
            created_at: self.created_at,
            statistics: self.statistics,
        }
    }
}

// ============================================================================
// SECTION: Test Summary
// ============================================================================

/// Summary record before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryDraft {
    /// Parent session.
    pub session_ref: SessionId,
    /// URL the summary aggregates.
    pub url: String,
    /// Iterations aggregated.
    pub iterations: u64,
    /// Standard deviation of `total_time` across iterations.
    pub total_time_stddev: f64,
    /// Aggregated statistics.
    #[serde(flatten)]
    pub statistics: StatisticsPayload,
    /// Creation time.
    pub created_at: Timestamp,
}

/// Per-URL aggregate over a session's iterations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    /// Store-assigned identifier.
    pub id: SummaryId,
    /// Parent session.
    pub session_ref: SessionId,
    /// URL the summary aggregates.
    pub url: String,
    /// Iterations aggregated.
    pub iterations: u64,
    /// Standard deviation of `total_time` across iterations.
    pub total_time_stddev: f64,
    /// Creation time.
    pub created_at: Timestamp,
    /// Aggregated statistics.
    #[serde(flatten)]
    pub statistics: StatisticsPayload,
}

impl SummaryDraft {
    /// Builds the stored summary for this draft.
    #[must_use]
    pub fn into_summary(self, id: SummaryId) -> TestSummary {
        TestSummary {
            id,
            session_ref: self.session_ref,
            url: self.url,
            iterations: self.iterations,
            total_time_stddev: self.total_time_stddev,
            created_at: self.created_at,
            statistics: self.statistics,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
