// perftracker-core/src/interfaces/mod.rs
// ============================================================================
// Module: PerfTracker Interfaces
// Description: Backend-agnostic interfaces for records, cache, and time.
// Purpose: Define the contract surfaces used by the PerfTracker runtime.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! Interfaces describe the external collaborators of the query layer without
//! embedding backend details. [`RecordStore`] is the minimal repository
//! capability set (get by id, filtered query with order and limit, put,
//! delete) for each record kind. Stores provide per-record atomic writes and
//! no cross-record transactions. [`QueryCache`] is a shared key/value cache
//! whose only write primitive is an atomic insert-if-absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use thiserror::Error;

use crate::core::Fingerprint;
use crate::core::NetworkCandidate;
use crate::core::NetworkId;
use crate::core::NetworkProfile;
use crate::core::ResultDraft;
use crate::core::ResultId;
use crate::core::SessionDraft;
use crate::core::SessionId;
use crate::core::SummaryDraft;
use crate::core::SummaryId;
use crate::core::TestResult;
use crate::core::TestSession;
use crate::core::TestSummary;
use crate::core::Timestamp;
use crate::core::Version;
use crate::core::VersionId;

// ============================================================================
// SECTION: Record Queries
// ============================================================================

/// Ordering by creation time; ties break on id in the same direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Oldest first.
    #[default]
    CreatedAsc,
    /// Newest first.
    CreatedDesc,
}

/// Filtered session query.
///
/// # Invariants
/// - An empty reference list applies no filter; a non-empty list is a
///   membership filter. Lists combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionQuery {
    /// Allowed version references.
    pub version_refs: Vec<VersionId>,
    /// Allowed network references.
    pub network_refs: Vec<NetworkId>,
    /// Result ordering.
    pub order: SortOrder,
    /// Maximum number of records returned.
    pub limit: Option<usize>,
}

/// Filtered result query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultQuery {
    /// Parent session filter.
    pub session_ref: Option<SessionId>,
    /// Exact URL filter.
    pub url: Option<String>,
    /// Result ordering.
    pub order: SortOrder,
    /// Maximum number of records returned.
    pub limit: Option<usize>,
}

/// Filtered summary query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryQuery {
    /// Parent session filter.
    pub session_ref: Option<SessionId>,
    /// Result ordering.
    pub order: SortOrder,
    /// Maximum number of records returned.
    pub limit: Option<usize>,
}

// ============================================================================
// SECTION: Record Store
// ============================================================================

/// Record store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("record store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("record store corruption: {0}")]
    Corrupt(String),
    /// Store data is invalid.
    #[error("record store invalid data: {0}")]
    Invalid(String),
    /// Store reported an error.
    #[error("record store error: {0}")]
    Store(String),
}

/// Persistence for every record kind.
///
/// Inserts allocate the record id; the stored record is returned.
pub trait RecordStore {
    /// Returns one version record whose `version` equals `version`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_version(&self, version: &str) -> Result<Option<Version>, StoreError>;

    /// Persists a new version record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn insert_version(&self, version: &str) -> Result<Version, StoreError>;

    /// Returns every version record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the scan fails.
    fn list_versions(&self) -> Result<Vec<Version>, StoreError>;

    /// Deletes a version record; returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn delete_version(&self, id: VersionId) -> Result<bool, StoreError>;

    /// Returns one network profile whose canonical label equals `label`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_network(&self, label: &str) -> Result<Option<NetworkProfile>, StoreError>;

    /// Persists a new network profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn insert_network(&self, candidate: NetworkCandidate) -> Result<NetworkProfile, StoreError>;

    /// Returns every network profile.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the scan fails.
    fn list_networks(&self) -> Result<Vec<NetworkProfile>, StoreError>;

    /// Deletes a network profile; returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn delete_network(&self, id: NetworkId) -> Result<bool, StoreError>;

    /// Loads a session by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn load_session(&self, id: SessionId) -> Result<Option<TestSession>, StoreError>;

    /// Persists a new session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn insert_session(&self, draft: SessionDraft) -> Result<TestSession, StoreError>;

    /// Overwrites an existing session.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails or the session is unknown.
    fn save_session(&self, session: &TestSession) -> Result<(), StoreError>;

    /// Runs a filtered session query.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn query_sessions(&self, query: &SessionQuery) -> Result<Vec<TestSession>, StoreError>;

    /// Persists a new result.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn insert_result(&self, draft: ResultDraft) -> Result<TestResult, StoreError>;

    /// Runs a filtered result query.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn query_results(&self, query: &ResultQuery) -> Result<Vec<TestResult>, StoreError>;

    /// Deletes results by id; returns how many existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the delete fails.
    fn delete_results(&self, ids: &[ResultId]) -> Result<usize, StoreError>;

    /// Loads a summary by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn load_summary(&self, id: SummaryId) -> Result<Option<TestSummary>, StoreError>;

    /// Persists a new summary.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the write fails.
    fn insert_summary(&self, draft: SummaryDraft) -> Result<TestSummary, StoreError>;

    /// Runs a filtered summary query.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn query_summaries(&self, query: &SummaryQuery) -> Result<Vec<TestSummary>, StoreError>;
}

// ============================================================================
// SECTION: Query Cache
// ============================================================================

/// Shared response cache with first-writer-wins semantics.
///
/// Cache failures are not errors for callers: a backend that cannot answer
/// reports a miss, and a backend that cannot store reports `false`.
pub trait QueryCache {
    /// Returns the unexpired value for `fingerprint`.
    fn get(&self, fingerprint: &Fingerprint) -> Option<Vec<u8>>;

    /// Stores `value` unless an unexpired value already exists.
    ///
    /// The check and the insert are one atomic step. Returns whether the value
    /// was stored.
    fn put(&self, fingerprint: &Fingerprint, value: Vec<u8>, ttl: Duration) -> bool;
}

// ============================================================================
// SECTION: Clock
// ============================================================================

/// Source of creation timestamps and cache expiry time.
pub trait Clock {
    /// Returns the current time.
    fn now(&self) -> Timestamp;
}
