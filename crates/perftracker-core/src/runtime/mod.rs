// perftracker-core/src/runtime/mod.rs
// ============================================================================
// Module: PerfTracker Runtime
// Description: Ingest, deduplication, caching, and view assembly.
// Purpose: Implement every PerfTracker operation over the core interfaces.
// Dependencies: crate::{core, interfaces}, tracing
// ============================================================================

//! ## Overview
//! Runtime modules implement the write path (parameter parsing, dimension
//! deduplication, ingest) and the read path (query cache, composite views,
//! filter catalog). [`PerfTracker`] is the single entry point transports use.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod cache;
pub mod catalog;
pub mod clock;
pub mod dedup;
pub mod error;
pub mod ingest;
pub mod params;
pub mod service;
pub mod store;
pub mod views;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use cache::CachedBody;
pub use cache::DEFAULT_MAX_CACHE_ENTRIES;
pub use cache::InMemoryQueryCache;
pub use cache::SharedQueryCache;
pub use cache::read_through;
pub use catalog::FilterCatalog;
pub use catalog::FilterCatalogBuilder;
pub use catalog::FilterEntry;
pub use clock::ManualClock;
pub use clock::SystemClock;
pub use dedup::DimensionDeduplicator;
pub use dedup::ReconcileReport;
pub use error::RecordKind;
pub use error::TrackerError;
pub use ingest::CreateResultRequest;
pub use ingest::CreateSessionRequest;
pub use ingest::CreateSummaryRequest;
pub use ingest::IngestWriter;
pub use ingest::UpdateSessionRequest;
pub use params::ReadResource;
pub use params::SessionCommand;
pub use params::UploadParams;
pub use service::DEFAULT_BULK_DELETE_LIMIT;
pub use service::PerfTracker;
pub use service::TrackerSettings;
pub use store::InMemoryRecordStore;
pub use store::SharedRecordStore;
pub use views::DEFAULT_LATEST_RESULTS;
pub use views::MAX_SEARCH_RESULTS;
pub use views::SearchOutcome;
pub use views::SessionSearchRequest;
pub use views::SessionView;
pub use views::SummaryView;
pub use views::ViewAssembler;
pub use views::ViewLimits;
