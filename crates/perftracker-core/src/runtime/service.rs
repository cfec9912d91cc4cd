// perftracker-core/src/runtime/service.rs
// ============================================================================
// Module: PerfTracker Service
// Description: Operation façade over ingest, views, catalog, and cache.
// Purpose: Expose every upload, read, and admin operation to transports.
// Dependencies: crate::core, crate::interfaces, crate::runtime, tracing
// ============================================================================

//! ## Overview
//! [`PerfTracker`] owns shared handles to the record store, the query cache,
//! and the clock. It is cheap to clone and safe to share across request
//! handlers; all coordination between concurrent requests happens in the
//! store (per-record atomic writes) and the cache (atomic insert-if-absent).
//!
//! Typed operations return records. [`PerfTracker::read_json`] dispatches a
//! `type=` read from raw parameters and returns serialized JSON, serving the
//! session search, summary lookup, and filter catalog through the cache.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::core::CacheTtls;
use crate::core::CachedResource;
use crate::core::Fingerprint;
use crate::core::ResultId;
use crate::core::SessionId;
use crate::core::SummaryId;
use crate::core::TestResult;
use crate::interfaces::Clock;
use crate::interfaces::RecordStore;
use crate::interfaces::ResultQuery;
use crate::interfaces::SortOrder;
use crate::runtime::cache::CachedBody;
use crate::runtime::cache::SharedQueryCache;
use crate::runtime::cache::read_through;
use crate::runtime::catalog::FilterCatalog;
use crate::runtime::catalog::FilterCatalogBuilder;
use crate::runtime::dedup::DimensionDeduplicator;
use crate::runtime::dedup::ReconcileReport;
use crate::runtime::error::TrackerError;
use crate::runtime::ingest::CreateResultRequest;
use crate::runtime::ingest::CreateSessionRequest;
use crate::runtime::ingest::CreateSummaryRequest;
use crate::runtime::ingest::IngestWriter;
use crate::runtime::ingest::UpdateSessionRequest;
use crate::runtime::params::PARAM_ID;
use crate::runtime::params::ReadResource;
use crate::runtime::params::UploadParams;
use crate::runtime::store::SharedRecordStore;
use crate::runtime::views::SearchOutcome;
use crate::runtime::views::SessionSearchRequest;
use crate::runtime::views::SessionView;
use crate::runtime::views::SummaryView;
use crate::runtime::views::ViewAssembler;
use crate::runtime::views::ViewLimits;

// ============================================================================
// SECTION: Settings
// ============================================================================

/// Default and maximum number of results removed by one bulk delete.
pub const DEFAULT_BULK_DELETE_LIMIT: usize = 500;

/// Tunables for a [`PerfTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerSettings {
    /// Cache lifetimes per resource.
    pub ttls: CacheTtls,
    /// List view limits.
    pub limits: ViewLimits,
    /// Results removed per bulk delete.
    pub bulk_delete_limit: usize,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            ttls: CacheTtls::default(),
            limits: ViewLimits::default(),
            bulk_delete_limit: DEFAULT_BULK_DELETE_LIMIT,
        }
    }
}

// ============================================================================
// SECTION: Service
// ============================================================================

/// Query, deduplication, and caching service.
#[derive(Clone)]
pub struct PerfTracker {
    /// Record store.
    store: SharedRecordStore,
    /// Response cache.
    cache: SharedQueryCache,
    /// Creation time source.
    clock: Arc<dyn Clock + Send + Sync>,
    /// Tunables.
    settings: TrackerSettings,
}

impl PerfTracker {
    /// Creates a service over the given collaborators.
    #[must_use]
    pub fn new(
        store: SharedRecordStore,
        cache: SharedQueryCache,
        clock: Arc<dyn Clock + Send + Sync>,
        settings: TrackerSettings,
    ) -> Self {
        Self {
            store,
            cache,
            clock,
            settings,
        }
    }

    /// Returns the service tunables.
    #[must_use]
    pub const fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Returns the underlying record store.
    #[must_use]
    pub const fn store(&self) -> &SharedRecordStore {
        &self.store
    }

    /// Builds an ingest writer over the shared store and clock.
    fn writer(&self) -> IngestWriter<'_, SharedRecordStore, dyn Clock + Send + Sync> {
        IngestWriter::new(&self.store, self.clock.as_ref())
    }

    /// Builds a view assembler over the shared store.
    fn views(&self) -> ViewAssembler<'_, SharedRecordStore> {
        ViewAssembler::new(&self.store, self.settings.limits)
    }

    // ------------------------------------------------------------------------
    // Uploads
    // ------------------------------------------------------------------------

    /// Creates a session.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError`] when dimension resolution or the insert fails.
    pub fn create_session(&self, request: CreateSessionRequest) -> Result<SessionId, TrackerError> {
        self.writer().create_session(request)
    }

    /// Fills a session's statistics.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] for an unknown session.
    pub fn update_session(&self, request: UpdateSessionRequest) -> Result<SessionId, TrackerError> {
        self.writer().update_session(request)
    }

    /// Creates a result.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] for an unknown session.
    pub fn create_result(&self, request: CreateResultRequest) -> Result<ResultId, TrackerError> {
        self.writer().create_result(request)
    }

    /// Creates a summary.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] for an unknown session.
    pub fn create_summary(&self, request: CreateSummaryRequest) -> Result<SummaryId, TrackerError> {
        self.writer().create_summary(request)
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Returns a session with its summaries.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] for an unknown session.
    pub fn get_session(&self, id: SessionId) -> Result<SessionView, TrackerError> {
        self.views().session_view(id)
    }

    /// Returns a summary with its matching results, uncached.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::NotFound`] for an unknown summary.
    pub fn get_summary(&self, id: SummaryId) -> Result<SummaryView, TrackerError> {
        self.views().summary_view(id)
    }

    /// Runs a session search, uncached.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError`] when the store fails or an explicit session
    /// id does not resolve.
    pub fn search_sessions(
        &self,
        request: &SessionSearchRequest,
    ) -> Result<SearchOutcome, TrackerError> {
        self.views().search_sessions(request)
    }

    /// Builds the filter catalog, uncached.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Store`] when a scan fails.
    pub fn get_filters(&self) -> Result<FilterCatalog, TrackerError> {
        Ok(FilterCatalogBuilder::new(&self.store).build()?)
    }

    /// Returns the most recent results.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Store`] when the store fails.
    pub fn get_latest_results(&self) -> Result<Vec<TestResult>, TrackerError> {
        self.views().latest_results()
    }

    /// Serves a `type=` JSON read.
    ///
    /// `query` is the request's full parameter list encoded as a query
    /// string in arrival order; it keys the session search cache entry.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MissingParameter`] or
    /// [`TrackerError::UnknownCommand`] for a bad selector, and the errors of
    /// the selected read otherwise.
    pub fn read_json(
        &self,
        params: &UploadParams,
        query: &str,
    ) -> Result<CachedBody, TrackerError> {
        match params.read_resource()? {
            ReadResource::Summary => {
                let id = params.summary_id(PARAM_ID)?;
                self.cached(CachedResource::SummaryLookup, &id.to_string(), || {
                    self.get_summary(id)
                })
            }
            ReadResource::Result => uncached(&serde_json::Map::new()),
            ReadResource::Session => uncached(&self.get_session(params.session_id(PARAM_ID)?)?),
            ReadResource::SessionSearch => {
                let request = params.session_search_request()?;
                self.cached(CachedResource::SessionSearch, query, || {
                    self.search_sessions(&request)
                })
            }
            ReadResource::Filters => {
                self.cached(CachedResource::FilterCatalog, "", || self.get_filters())
            }
            ReadResource::LatestResults => uncached(&self.get_latest_results()?),
        }
    }

    /// Serves `resource` through the cache, computing it with `compute` on a miss.
    fn cached<T: Serialize>(
        &self,
        resource: CachedResource,
        params: &str,
        compute: impl FnOnce() -> Result<T, TrackerError>,
    ) -> Result<CachedBody, TrackerError> {
        let fingerprint = Fingerprint::new(resource, params);
        read_through(&self.cache, &fingerprint, self.settings.ttls.for_resource(resource), || {
            Ok(serde_json::to_vec(&compute()?)?)
        })
    }

    // ------------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------------

    /// Deletes up to the configured limit of results, oldest first.
    ///
    /// Returns the number actually deleted.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Store`] when the store fails.
    pub fn bulk_delete_results(&self) -> Result<usize, TrackerError> {
        let ids: Vec<ResultId> = self
            .store
            .query_results(&ResultQuery {
                session_ref: None,
                url: None,
                order: SortOrder::CreatedAsc,
                limit: Some(self.settings.bulk_delete_limit),
            })?
            .into_iter()
            .map(|result| result.id)
            .collect();
        let deleted = self.store.delete_results(&ids)?;
        info!(deleted, "bulk deleted results");
        Ok(deleted)
    }

    /// Folds duplicate dimension records created by concurrent uploads.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::Store`] when the store fails.
    pub fn reconcile_dimensions(&self) -> Result<ReconcileReport, TrackerError> {
        Ok(DimensionDeduplicator::new(&self.store).reconcile()?)
    }
}

/// Serializes an uncached read.
fn uncached<T: Serialize>(value: &T) -> Result<CachedBody, TrackerError> {
    Ok(CachedBody {
        body: serde_json::to_vec(value)?,
        cache_hit: false,
    })
}
