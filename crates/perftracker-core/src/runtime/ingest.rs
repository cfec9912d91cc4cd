// perftracker-core/src/runtime/ingest.rs
// ============================================================================
// Module: PerfTracker Ingest Writer
// Description: Session, result, and summary upload operations.
// Purpose: Persist uploaded records after dimension resolution.
// Dependencies: crate::core, crate::interfaces, crate::runtime::dedup
// ============================================================================

//! ## Overview
//! Requests arrive fully parsed (see [`crate::UploadParams`]), so every
//! operation here starts with store calls only. Child uploads verify the
//! parent session exists before writing. Operations are not atomic as a
//! whole: a session create may leave a freshly resolved dimension behind if
//! the session insert fails.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing::debug;

use crate::core::NetworkCandidate;
use crate::core::ResultDraft;
use crate::core::ResultId;
use crate::core::SessionDraft;
use crate::core::SessionId;
use crate::core::SessionMetadata;
use crate::core::StatisticsPayload;
use crate::core::SummaryDraft;
use crate::core::SummaryId;
use crate::core::TestSession;
use crate::interfaces::Clock;
use crate::interfaces::RecordStore;
use crate::runtime::dedup::DimensionDeduplicator;
use crate::runtime::error::RecordKind;
use crate::runtime::error::TrackerError;

// ============================================================================
// SECTION: Requests
// ============================================================================

/// Parsed session create upload.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSessionRequest {
    /// Version string.
    pub version: String,
    /// Network conditions, when uploaded.
    pub network: Option<NetworkCandidate>,
    /// Descriptive metadata.
    pub metadata: SessionMetadata,
}

/// Parsed session update upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateSessionRequest {
    /// Session to update.
    pub session_id: SessionId,
    /// Aggregate statistics.
    pub statistics: StatisticsPayload,
    /// Iterations run per URL.
    pub iterations: u64,
    /// Number of URLs in the run.
    pub url_count: u64,
}

/// Parsed result upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateResultRequest {
    /// Parent session.
    pub session_id: SessionId,
    /// URL that was loaded.
    pub url: String,
    /// Whether the load used SPDY.
    pub using_spdy: bool,
    /// Load statistics.
    pub statistics: StatisticsPayload,
}

/// Parsed summary upload.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateSummaryRequest {
    /// Parent session.
    pub session_id: SessionId,
    /// URL the summary aggregates.
    pub url: String,
    /// Aggregated statistics.
    pub statistics: StatisticsPayload,
    /// Iterations aggregated.
    pub iterations: u64,
    /// Standard deviation of total time.
    pub total_time_stddev: f64,
}

// ============================================================================
// SECTION: Ingest Writer
// ============================================================================

/// Writes uploaded records.
pub struct IngestWriter<'a, S: ?Sized, C: ?Sized> {
    /// Backing record store.
    store: &'a S,
    /// Creation time source.
    clock: &'a C,
}

impl<'a, S: RecordStore + ?Sized, C: Clock + ?Sized> IngestWriter<'a, S, C> {
    /// Creates a writer over `store` stamping records with `clock`.
    #[must_use]
    pub const fn new(store: &'a S, clock: &'a C) -> Self {
        Self {
            store,
            clock,
        }
    }

    /// Creates a session and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Store`] when dimension resolution or the insert fails.
    pub fn create_session(&self, request: CreateSessionRequest) -> Result<SessionId, TrackerError> {
        let dedup = DimensionDeduplicator::new(self.store);
        let version_ref = dedup.resolve_version(&request.version)?;
        let network_ref = match request.network {
            Some(candidate) => Some(dedup.resolve_network(candidate)?),
            None => None,
        };
        let session = self.store.insert_session(SessionDraft {
            version_ref,
            network_ref,
            metadata: request.metadata,
            created_at: self.clock.now(),
        })?;
        debug!(session = %session.id, version = %version_ref, "created session");
        Ok(session.id)
    }

    /// Overwrites a session's statistics and returns its id.
    ///
    /// A second update silently replaces the first.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] for an unknown session, or
    /// [`TrackerError::Store`] when the store fails.
    pub fn update_session(&self, request: UpdateSessionRequest) -> Result<SessionId, TrackerError> {
        let mut session = self.parent_session(request.session_id)?;
        session.statistics = Some(request.statistics);
        session.iterations = Some(request.iterations);
        session.url_count = Some(request.url_count);
        self.store.save_session(&session)?;
        Ok(session.id)
    }

    /// Creates a result under an existing session and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] for an unknown session, or
    /// [`TrackerError::Store`] when the store fails.
    pub fn create_result(&self, request: CreateResultRequest) -> Result<ResultId, TrackerError> {
        let session = self.parent_session(request.session_id)?;
        let result = self.store.insert_result(ResultDraft {
            session_ref: session.id,
            url: request.url,
            using_spdy: request.using_spdy,
            statistics: request.statistics,
            created_at: self.clock.now(),
        })?;
        Ok(result.id)
    }

    /// Creates a summary under an existing session and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] for an unknown session, or
    /// [`TrackerError::Store`] when the store fails.
    pub fn create_summary(&self, request: CreateSummaryRequest) -> Result<SummaryId, TrackerError> {
        let session = self.parent_session(request.session_id)?;
        let summary = self.store.insert_summary(SummaryDraft {
            session_ref: session.id,
            url: request.url,
            iterations: request.iterations,
            total_time_stddev: request.total_time_stddev,
            statistics: request.statistics,
            created_at: self.clock.now(),
        })?;
        Ok(summary.id)
    }

    /// Loads the session a write refers to.
    fn parent_session(&self, id: SessionId) -> Result<TestSession, TrackerError> {
        self.store.load_session(id)?.ok_or(TrackerError::NotFound {
            kind: RecordKind::Session,
            id: id.get(),
        })
    }
}
