// perftracker-core/src/runtime/store.rs
// ============================================================================
// Module: PerfTracker In-Memory Store
// Description: In-memory record store and shared store wrapper.
// Purpose: Provide a deterministic store implementation without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! [`InMemoryRecordStore`] keeps every table behind one mutex and allocates
//! ids from per-table counters starting at 1. It backs tests and the
//! `memory` store type; durable deployments use the SQLite store.
//! [`SharedRecordStore`] erases the backend behind an `Arc` so the runtime can
//! be cloned across request handlers.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

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
use crate::interfaces::RecordStore;
use crate::interfaces::ResultQuery;
use crate::interfaces::SessionQuery;
use crate::interfaces::SortOrder;
use crate::interfaces::StoreError;
use crate::interfaces::SummaryQuery;

// ============================================================================
// SECTION: Ordering Helpers
// ============================================================================

/// Sorts `records` by creation time then id, and applies `limit`.
pub(crate) fn order_and_limit<T>(
    records: &mut Vec<T>,
    order: SortOrder,
    limit: Option<usize>,
    key: impl Fn(&T) -> (Timestamp, u64),
) {
    records.sort_by_key(|record| key(record));
    if order == SortOrder::CreatedDesc {
        records.reverse();
    }
    if let Some(limit) = limit {
        records.truncate(limit);
    }
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Table contents guarded together.
#[derive(Debug, Default)]
struct Tables {
    /// Last allocated id per table.
    last_version: u64,
    /// Last allocated network id.
    last_network: u64,
    /// Last allocated session id.
    last_session: u64,
    /// Last allocated result id.
    last_result: u64,
    /// Last allocated summary id.
    last_summary: u64,
    /// Version records by id.
    versions: BTreeMap<VersionId, Version>,
    /// Network profiles by id.
    networks: BTreeMap<NetworkId, NetworkProfile>,
    /// Sessions by id.
    sessions: BTreeMap<SessionId, TestSession>,
    /// Results by id.
    results: BTreeMap<ResultId, TestResult>,
    /// Summaries by id.
    summaries: BTreeMap<SummaryId, TestSummary>,
}

/// Advances an id counter and returns the new value.
fn next_id(counter: &mut u64) -> Result<u64, StoreError> {
    *counter = counter
        .checked_add(1)
        .ok_or_else(|| StoreError::Store("record id space exhausted".to_string()))?;
    Ok(*counter)
}

/// Builds the error for an id that cannot be represented.
fn zero_id() -> StoreError {
    StoreError::Store("record id allocation returned zero".to_string())
}

/// In-memory record store for tests and single-process deployments.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordStore {
    /// All tables protected by a single mutex.
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRecordStore {
    /// Creates an empty in-memory record store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the tables.
    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Store("record store mutex poisoned".to_string()))
    }
}

impl RecordStore for InMemoryRecordStore {
    fn find_version(&self, version: &str) -> Result<Option<Version>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.versions.values().find(|record| record.version == version).cloned())
    }

    fn insert_version(&self, version: &str) -> Result<Version, StoreError> {
        let mut guard = self.lock()?;
        let id = VersionId::from_raw(next_id(&mut guard.last_version)?).ok_or_else(zero_id)?;
        let record = Version {
            id,
            version: version.to_string(),
        };
        guard.versions.insert(id, record.clone());
        drop(guard);
        Ok(record)
    }

    fn list_versions(&self) -> Result<Vec<Version>, StoreError> {
        Ok(self.lock()?.versions.values().cloned().collect())
    }

    fn delete_version(&self, id: VersionId) -> Result<bool, StoreError> {
        Ok(self.lock()?.versions.remove(&id).is_some())
    }

    fn find_network(&self, label: &str) -> Result<Option<NetworkProfile>, StoreError> {
        let guard = self.lock()?;
        Ok(guard.networks.values().find(|record| record.label == label).cloned())
    }

    fn insert_network(&self, candidate: NetworkCandidate) -> Result<NetworkProfile, StoreError> {
        let mut guard = self.lock()?;
        let id = NetworkId::from_raw(next_id(&mut guard.last_network)?).ok_or_else(zero_id)?;
        let record = candidate.into_profile(id);
        guard.networks.insert(id, record.clone());
        drop(guard);
        Ok(record)
    }

    fn list_networks(&self) -> Result<Vec<NetworkProfile>, StoreError> {
        Ok(self.lock()?.networks.values().cloned().collect())
    }

    fn delete_network(&self, id: NetworkId) -> Result<bool, StoreError> {
        Ok(self.lock()?.networks.remove(&id).is_some())
    }

    fn load_session(&self, id: SessionId) -> Result<Option<TestSession>, StoreError> {
        Ok(self.lock()?.sessions.get(&id).cloned())
    }

    fn insert_session(&self, draft: SessionDraft) -> Result<TestSession, StoreError> {
        let mut guard = self.lock()?;
        let id = SessionId::from_raw(next_id(&mut guard.last_session)?).ok_or_else(zero_id)?;
        let record = draft.into_session(id);
        guard.sessions.insert(id, record.clone());
        drop(guard);
        Ok(record)
    }

    fn save_session(&self, session: &TestSession) -> Result<(), StoreError> {
        let mut guard = self.lock()?;
        let Some(slot) = guard.sessions.get_mut(&session.id) else {
            return Err(StoreError::Invalid(format!("session {} does not exist", session.id)));
        };
        *slot = session.clone();
        drop(guard);
        Ok(())
    }

    fn query_sessions(&self, query: &SessionQuery) -> Result<Vec<TestSession>, StoreError> {
        let mut records: Vec<TestSession> = {
            let guard = self.lock()?;
            guard
                .sessions
                .values()
                .filter(|session| {
                    query.version_refs.is_empty() || query.version_refs.contains(&session.version_ref)
                })
                .filter(|session| {
                    query.network_refs.is_empty()
                        || session.network_ref.is_some_and(|id| query.network_refs.contains(&id))
                })
                .cloned()
                .collect()
        };
        order_and_limit(&mut records, query.order, query.limit, |session| {
            (session.created_at, session.id.get())
        });
        Ok(records)
    }

    fn insert_result(&self, draft: ResultDraft) -> Result<TestResult, StoreError> {
        let mut guard = self.lock()?;
        let id = ResultId::from_raw(next_id(&mut guard.last_result)?).ok_or_else(zero_id)?;
        let record = draft.into_result(id);
        guard.results.insert(id, record.clone());
        drop(guard);
        Ok(record)
    }

    fn query_results(&self, query: &ResultQuery) -> Result<Vec<TestResult>, StoreError> {
        let mut records: Vec<TestResult> = {
            let guard = self.lock()?;
            guard
                .results
                .values()
                .filter(|result| query.session_ref.is_none_or(|id| result.session_ref == id))
                .filter(|result| query.url.as_ref().is_none_or(|url| &result.url == url))
                .cloned()
                .collect()
        };
        order_and_limit(&mut records, query.order, query.limit, |result| {
            (result.created_at, result.id.get())
        });
        Ok(records)
    }

    fn delete_results(&self, ids: &[ResultId]) -> Result<usize, StoreError> {
        let mut guard = self.lock()?;
        let deleted = ids.iter().filter(|id| guard.results.remove(*id).is_some()).count();
        drop(guard);
        Ok(deleted)
    }

    fn load_summary(&self, id: SummaryId) -> Result<Option<TestSummary>, StoreError> {
        Ok(self.lock()?.summaries.get(&id).cloned())
    }

    fn insert_summary(&self, draft: SummaryDraft) -> Result<TestSummary, StoreError> {
        let mut guard = self.lock()?;
        let id = SummaryId::from_raw(next_id(&mut guard.last_summary)?).ok_or_else(zero_id)?;
        let record = draft.into_summary(id);
        guard.summaries.insert(id, record.clone());
        drop(guard);
        Ok(record)
    }

    fn query_summaries(&self, query: &SummaryQuery) -> Result<Vec<TestSummary>, StoreError> {
        let mut records: Vec<TestSummary> = {
            let guard = self.lock()?;
            guard
                .summaries
                .values()
                .filter(|summary| query.session_ref.is_none_or(|id| summary.session_ref == id))
                .cloned()
                .collect()
        };
        order_and_limit(&mut records, query.order, query.limit, |summary| {
            (summary.created_at, summary.id.get())
        });
        Ok(records)
    }
}

// ============================================================================
// SECTION: Shared Store Wrapper
// ============================================================================

/// Shared record store backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedRecordStore {
    /// Inner store implementation.
    inner: Arc<dyn RecordStore + Send + Sync>,
}

impl SharedRecordStore {
    /// Wraps a record store in a shared, clonable wrapper.
    #[must_use]
    pub fn from_store(store: impl RecordStore + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(store),
        }
    }

    /// Wraps an existing shared store.
    #[must_use]
    pub const fn new(store: Arc<dyn RecordStore + Send + Sync>) -> Self {
        Self {
            inner: store,
        }
    }
}

impl RecordStore for SharedRecordStore {
    fn find_version(&self, version: &str) -> Result<Option<Version>, StoreError> {
        self.inner.find_version(version)
    }

    fn insert_version(&self, version: &str) -> Result<Version, StoreError> {
        self.inner.insert_version(version)
    }

    fn list_versions(&self) -> Result<Vec<Version>, StoreError> {
        self.inner.list_versions()
    }

    fn delete_version(&self, id: VersionId) -> Result<bool, StoreError> {
        self.inner.delete_version(id)
    }

    fn find_network(&self, label: &str) -> Result<Option<NetworkProfile>, StoreError> {
        self.inner.find_network(label)
    }

    fn insert_network(&self, candidate: NetworkCandidate) -> Result<NetworkProfile, StoreError> {
        self.inner.insert_network(candidate)
    }

    fn list_networks(&self) -> Result<Vec<NetworkProfile>, StoreError> {
        self.inner.list_networks()
    }

    fn delete_network(&self, id: NetworkId) -> Result<bool, StoreError> {
        self.inner.delete_network(id)
    }

    fn load_session(&self, id: SessionId) -> Result<Option<TestSession>, StoreError> {
        self.inner.load_session(id)
    }

    fn insert_session(&self, draft: SessionDraft) -> Result<TestSession, StoreError> {
        self.inner.insert_session(draft)
    }

    fn save_session(&self, session: &TestSession) -> Result<(), StoreError> {
        self.inner.save_session(session)
    }

    fn query_sessions(&self, query: &SessionQuery) -> Result<Vec<TestSession>, StoreError> {
        self.inner.query_sessions(query)
    }

    fn insert_result(&self, draft: ResultDraft) -> Result<TestResult, StoreError> {
        self.inner.insert_result(draft)
    }

    fn query_results(&self, query: &ResultQuery) -> Result<Vec<TestResult>, StoreError> {
        self.inner.query_results(query)
    }

    fn delete_results(&self, ids: &[ResultId]) -> Result<usize, StoreError> {
        self.inner.delete_results(ids)
    }

    fn load_summary(&self, id: SummaryId) -> Result<Option<TestSummary>, StoreError> {
        self.inner.load_summary(id)
    }

    fn insert_summary(&self, draft: SummaryDraft) -> Result<TestSummary, StoreError> {
        self.inner.insert_summary(draft)
    }

    fn query_summaries(&self, query: &SummaryQuery) -> Result<Vec<TestSummary>, StoreError> {
        self.inner.query_summaries(query)
    }
}
