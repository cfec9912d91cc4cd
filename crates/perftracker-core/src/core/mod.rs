// perftracker-core/src/core/mod.rs
// ============================================================================
// Module: PerfTracker Core Types
// Description: Canonical records, identifiers, and cache fingerprints.
// Purpose: Provide stable, serializable types for uploads and read views.
// Dependencies: serde, serde_jcs, sha2
// ============================================================================

//! ## Overview
//! Core types define the uploaded records, the deduplicated dimensions they
//! reference, and the fingerprints under which read responses are cached.
//! These types are the source of truth for every JSON surface.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod dimension;
pub mod fingerprint;
pub mod hashing;
pub mod identifiers;
pub mod records;
pub mod time;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use dimension::NetworkCandidate;
pub use dimension::NetworkProfile;
pub use dimension::Version;
pub use fingerprint::CacheTtls;
pub use fingerprint::CachedResource;
pub use fingerprint::Fingerprint;
pub use hashing::DEFAULT_HASH_ALGORITHM;
pub use hashing::HashAlgorithm;
pub use hashing::HashDigest;
pub use identifiers::NetworkId;
pub use identifiers::ResultId;
pub use identifiers::SessionId;
pub use identifiers::SummaryId;
pub use identifiers::VersionId;
pub use records::ResultDraft;
pub use records::SessionDraft;
pub use records::SessionMetadata;
pub use records::StatisticsPayload;
pub use records::SummaryDraft;
pub use records::TestResult;
pub use records::TestSession;
pub use records::TestSummary;
pub use time::Timestamp;
