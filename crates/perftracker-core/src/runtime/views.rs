// perftracker-core/src/runtime/views.rs
// ============================================================================
// Module: PerfTracker View Assembler
// Description: Composite parent/child views, session search, latest results.
// Purpose: Join records into the JSON shapes served to the dashboard.
// Dependencies: serde, crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Composite views pair a parent record (`object`) with its children. A
//! summary view only carries results of the summary's own session whose URL
//! matches the summary's URL. Session search is newest first and bounded by
//! [`MAX_SEARCH_RESULTS`]; an explicit session id takes precedence over the
//! filter lists and yields that session's summaries instead.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::NetworkId;
use crate::core::SessionId;
use crate::core::SummaryId;
use crate::core::TestResult;
use crate::core::TestSession;
use crate::core::TestSummary;
use crate::core::VersionId;
use crate::interfaces::RecordStore;
use crate::interfaces::ResultQuery;
use crate::interfaces::SessionQuery;
use crate::interfaces::SortOrder;
use crate::interfaces::SummaryQuery;
use crate::runtime::error::RecordKind;
use crate::runtime::error::TrackerError;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Hard upper bound on session search results.
pub const MAX_SEARCH_RESULTS: usize = 500;
/// Default number of results in the latest-results view.
pub const DEFAULT_LATEST_RESULTS: usize = 25;

/// Result-count limits for list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewLimits {
    /// Session search limit; never above [`MAX_SEARCH_RESULTS`].
    pub search: usize,
    /// Latest-results limit.
    pub latest_results: usize,
}

impl Default for ViewLimits {
    fn default() -> Self {
        Self {
            search: MAX_SEARCH_RESULTS,
            latest_results: DEFAULT_LATEST_RESULTS,
        }
    }
}

// ============================================================================
// SECTION: View Types
// ============================================================================

/// Session with its summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionView {
    /// The session.
    pub object: TestSession,
    /// Summaries of the session, oldest first.
    pub summaries: Vec<TestSummary>,
}

/// Summary with the matching results of its session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryView {
    /// The summary.
    pub object: TestSummary,
    /// Results with the summary's session and URL, oldest first.
    pub results: Vec<TestResult>,
}

/// Parsed session search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSearchRequest {
    /// Allowed network profiles; empty means any.
    pub network_ids: Vec<NetworkId>,
    /// Allowed versions; empty means any.
    pub version_ids: Vec<VersionId>,
    /// Explicit session whose summaries replace the search.
    pub session_id: Option<SessionId>,
}

/// Session search output; serializes as a plain JSON array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchOutcome {
    /// Filtered sessions, newest first.
    Sessions(Vec<TestSession>),
    /// Summaries of the explicitly requested session.
    Summaries(Vec<TestSummary>),
}

impl SearchOutcome {
    /// Returns the number of records in the outcome.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Sessions(sessions) => sessions.len(),
            Self::Summaries(summaries) => summaries.len(),
        }
    }

    /// Returns true when the outcome holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// SECTION: View Assembler
// ============================================================================

/// Assembles read views from the record store.
pub struct ViewAssembler<'a, S: ?Sized> {
    /// Backing record store.
    store: &'a S,
    /// List view limits.
    limits: ViewLimits,
}

impl<'a, S: RecordStore + ?Sized> ViewAssembler<'a, S> {
    /// Creates an assembler over `store`.
    #[must_use]
    pub const fn new(store: &'a S, limits: ViewLimits) -> Self {
        Self {
            store,
            limits,
        }
    }

    /// Returns a session with its summaries.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] for an unknown session, or
    /// [`TrackerError::Store`] when the store fails.
    pub fn session_view(&self, id: SessionId) -> Result<SessionView, TrackerError> {
        let session = self.store.load_session(id)?.ok_or(TrackerError::NotFound {
            kind: RecordKind::Session,
            id: id.get(),
        })?;
        let summaries = self.store.query_summaries(&SummaryQuery {
            session_ref: Some(session.id),
            order: SortOrder::CreatedAsc,
            limit: None,
        })?;
        Ok(SessionView {
            object: session,
            summaries,
        })
    }

    /// Returns a summary with the matching results of its session.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] for an unknown summary or a summary
    /// whose session is gone, or [`TrackerError::Store`] when the store fails.
    pub fn summary_view(&self, id: SummaryId) -> Result<SummaryView, TrackerError> {
        let summary = self.store.load_summary(id)?.ok_or(TrackerError::NotFound {
            kind: RecordKind::Summary,
            id: id.get(),
        })?;
        let session = self.store.load_session(summary.session_ref)?.ok_or(
            TrackerError::NotFound {
                kind: RecordKind::Session,
                id: summary.session_ref.get(),
            },
        )?;
        let results = self.store.query_results(&ResultQuery {
            session_ref: Some(session.id),
            url: Some(summary.url.clone()),
            order: SortOrder::CreatedAsc,
            limit: None,
        })?;
        Ok(SummaryView {
            object: summary,
            results,
        })
    }

    /// Runs a session search.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] when an explicit session id does not
    /// resolve, or [`TrackerError::Store`] when the store fails.
    pub fn search_sessions(
        &self,
        request: &SessionSearchRequest,
    ) -> Result<SearchOutcome, TrackerError> {
        let limit = self.limits.search.min(MAX_SEARCH_RESULTS);
        if let Some(session_id) = request.session_id {
            let session = self.store.load_session(session_id)?.ok_or(TrackerError::NotFound {
                kind: RecordKind::Session,
                id: session_id.get(),
            })?;
            let summaries = self.store.query_summaries(&SummaryQuery {
                session_ref: Some(session.id),
                order: SortOrder::CreatedAsc,
                limit: Some(limit),
            })?;
            return Ok(SearchOutcome::Summaries(summaries));
        }
        let sessions = self.store.query_sessions(&SessionQuery {
            version_refs: request.version_ids.clone(),
            network_refs: request.network_ids.clone(),
            order: SortOrder::CreatedDesc,
            limit: Some(limit),
        })?;
        Ok(SearchOutcome::Sessions(sessions))
    }

    /// Returns the most recent results, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Store`] when the store fails.
    pub fn latest_results(&self) -> Result<Vec<TestResult>, TrackerError> {
        Ok(self.store.query_results(&ResultQuery {
            session_ref: None,
            url: None,
            order: SortOrder::CreatedDesc,
            limit: Some(self.limits.latest_results),
        })?)
    }
}
