// perftracker-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Record Store
// Description: Durable RecordStore backend using SQLite WAL.
// Purpose: Provide production persistence for PerfTracker records.
// Dependencies: perftracker-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`RecordStore`] implementation. Each
//! record is stored as canonical JSON next to an integrity hash, with the
//! columns needed for filtering and ordering kept alongside. Loads verify the
//! hash and fail closed on corruption.
//!
//! [`RecordStore`]: perftracker_core::RecordStore

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::MAX_RECORD_BYTES;
pub use store::SqliteRecordStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
