// perftracker-core/src/core/fingerprint.rs
// ============================================================================
// Module: PerfTracker Query Fingerprints
// Description: Deterministic cache keys for cached read resources.
// Purpose: Pair a resource kind with its raw query parameters.
// Dependencies: crate::core::hashing
// ============================================================================

//! ## Overview
//! A fingerprint is `<resource>.<params>` where `params` is the order-preserved
//! raw query string (or the looked-up id). Two requests share a cache entry
//! only when they spell their parameters identically. Keys longer than
//! [`MAX_FINGERPRINT_KEY_BYTES`] are replaced by a SHA-256 digest of the
//! parameters so backends with key limits can hold them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::core::hashing::DEFAULT_HASH_ALGORITHM;
use crate::core::hashing::hash_bytes;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum fingerprint key length before the parameters are digested.
pub const MAX_FINGERPRINT_KEY_BYTES: usize = 250;
/// Default TTL for filtered session searches.
pub const DEFAULT_SEARCH_TTL: Duration = Duration::from_secs(30);
/// Default TTL for summary-with-results lookups.
pub const DEFAULT_SUMMARY_TTL: Duration = Duration::from_secs(60);
/// Default TTL for the filter catalog.
pub const DEFAULT_FILTERS_TTL: Duration = Duration::from_secs(600);

// ============================================================================
// SECTION: Resource Kinds
// ============================================================================

/// Read resources whose responses are cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachedResource {
    /// Filtered session search.
    SessionSearch,
    /// Summary plus its matching results.
    SummaryLookup,
    /// Distinct dimension values for search filters.
    FilterCatalog,
}

impl CachedResource {
    /// Returns the stable key prefix for the resource.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::SessionSearch => "set_search",
            Self::SummaryLookup => "summary",
            Self::FilterCatalog => "filters",
        }
    }
}

/// Per-resource cache lifetimes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    /// Lifetime of session search responses.
    pub search: Duration,
    /// Lifetime of summary lookup responses.
    pub summary: Duration,
    /// Lifetime of the filter catalog.
    pub filters: Duration,
}

impl CacheTtls {
    /// Returns the lifetime configured for `resource`.
    #[must_use]
    pub const fn for_resource(&self, resource: CachedResource) -> Duration {
        match resource {
            CachedResource::SessionSearch => self.search,
            CachedResource::SummaryLookup => self.summary,
            CachedResource::FilterCatalog => self.filters,
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            search: DEFAULT_SEARCH_TTL,
            summary: DEFAULT_SUMMARY_TTL,
            filters: DEFAULT_FILTERS_TTL,
        }
    }
}

// ============================================================================
// SECTION: Fingerprint
// ============================================================================

/// Cache key for one cached read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    /// Resource the key belongs to.
    resource: CachedResource,
    /// Rendered key.
    key: String,
}

impl Fingerprint {
    /// Builds the fingerprint for `resource` with raw `params`.
    ///
    /// The filter catalog has no parameters; `params` is ignored for it.
    #[must_use]
    pub fn new(resource: CachedResource, params: &str) -> Self {
        let key = match resource {
            CachedResource::FilterCatalog => resource.prefix().to_string(),
            _ => {
                let key = format!("{}.{params}", resource.prefix());
                if key.len() > MAX_FINGERPRINT_KEY_BYTES {
                    let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, params.as_bytes());
                    format!("{}.{}:{}", resource.prefix(), digest.algorithm.label(), digest.value)
                } else {
                    key
                }
            }
        };
        Self {
            resource,
            key,
        }
    }

    /// Returns the resource this fingerprint caches.
    #[must_use]
    pub const fn resource(&self) -> CachedResource {
        self.resource
    }

    /// Returns the rendered cache key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.key.fmt(f)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
