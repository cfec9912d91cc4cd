// perftracker-core/src/lib.rs
// ============================================================================
// Module: PerfTracker Core Library
// Description: Public API surface for the PerfTracker core.
// Purpose: Expose records, interfaces, and the query/dedup/cache runtime.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! PerfTracker core stores browser benchmark uploads as typed records, folds
//! repeated version and network values into shared dimension records, and
//! serves filtered and composite JSON views through a time-bounded cache. It
//! is storage-agnostic: backends implement [`RecordStore`] and
//! [`QueryCache`], and transports call into [`PerfTracker`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::Clock;
pub use interfaces::QueryCache;
pub use interfaces::RecordStore;
pub use interfaces::ResultQuery;
pub use interfaces::SessionQuery;
pub use interfaces::SortOrder;
pub use interfaces::StoreError;
pub use interfaces::SummaryQuery;
pub use crate::runtime::*;
