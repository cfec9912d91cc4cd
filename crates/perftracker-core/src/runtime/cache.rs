// perftracker-core/src/runtime/cache.rs
// ============================================================================
// Module: PerfTracker Query Cache
// Description: Bounded in-memory TTL cache and the read-through helper.
// Purpose: Memoize serialized read responses with first-writer-wins puts.
// Dependencies: crate::core, crate::interfaces, tracing
// ============================================================================

//! ## Overview
//! [`InMemoryQueryCache`] holds serialized responses keyed by
//! [`Fingerprint`]. `put` is an atomic insert-if-absent under a single mutex:
//! an unexpired entry is never overwritten. Expired entries read as absent and
//! are replaced by the next `put`. When the cache is full, expired entries are
//! purged before an insert is refused.
//!
//! [`read_through`] is the call-site pattern: check, compute on miss, put,
//! and serve the freshly computed bytes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use tracing::debug;
use tracing::warn;

use crate::core::Fingerprint;
use crate::core::Timestamp;
use crate::interfaces::Clock;
use crate::interfaces::QueryCache;
use crate::runtime::clock::SystemClock;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default maximum number of cached responses.
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 4096;

// ============================================================================
// SECTION: In-Memory Cache
// ============================================================================

/// One cached response.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Serialized response bytes.
    value: Vec<u8>,
    /// First instant at which the entry reads as absent.
    expires_at: Timestamp,
}

/// Bounded in-memory query cache.
#[derive(Clone)]
pub struct InMemoryQueryCache {
    /// Entries by rendered fingerprint key.
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    /// Time source for expiry.
    clock: Arc<dyn Clock + Send + Sync>,
    /// Maximum number of entries held.
    max_entries: usize,
}

impl Default for InMemoryQueryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryQueryCache {
    /// Creates a cache on the system clock with the default bound.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock), DEFAULT_MAX_CACHE_ENTRIES)
    }

    /// Creates a cache with an explicit clock and entry bound.
    ///
    /// A bound of zero is raised to one.
    #[must_use]
    pub fn with_clock(clock: Arc<dyn Clock + Send + Sync>, max_entries: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            clock,
            max_entries: max_entries.max(1),
        }
    }

    /// Returns the number of entries held, expired ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().map_or(0, |guard| guard.len())
    }

    /// Returns true when no entries are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl QueryCache for InMemoryQueryCache {
    fn get(&self, fingerprint: &Fingerprint) -> Option<Vec<u8>> {
        let now = self.clock.now();
        let Ok(guard) = self.entries.lock() else {
            warn!(key = %fingerprint, "query cache mutex poisoned; treating as miss");
            return None;
        };
        guard
            .get(fingerprint.as_str())
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value.clone())
    }

    fn put(&self, fingerprint: &Fingerprint, value: Vec<u8>, ttl: Duration) -> bool {
        let now = self.clock.now();
        let Ok(mut guard) = self.entries.lock() else {
            warn!(key = %fingerprint, "query cache mutex poisoned; dropping put");
            return false;
        };
        if let Some(existing) = guard.get(fingerprint.as_str()) {
            if existing.expires_at > now {
                debug!(key = %fingerprint, "query cache put lost to an earlier writer");
                return false;
            }
        } else if guard.len() >= self.max_entries {
            guard.retain(|_, entry| entry.expires_at > now);
            if guard.len() >= self.max_entries {
                debug!(key = %fingerprint, max_entries = self.max_entries, "query cache full");
                return false;
            }
        }
        guard.insert(fingerprint.as_str().to_string(), CacheEntry {
            value,
            expires_at: now.saturating_add(ttl),
        });
        drop(guard);
        true
    }
}

// ============================================================================
// SECTION: Shared Cache Wrapper
// ============================================================================

/// Shared query cache backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedQueryCache {
    /// Inner cache implementation.
    inner: Arc<dyn QueryCache + Send + Sync>,
}

impl SharedQueryCache {
    /// Wraps a query cache in a shared, clonable wrapper.
    #[must_use]
    pub fn from_cache(cache: impl QueryCache + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(cache),
        }
    }

    /// Wraps an existing shared cache.
    #[must_use]
    pub const fn new(cache: Arc<dyn QueryCache + Send + Sync>) -> Self {
        Self {
            inner: cache,
        }
    }
}

impl QueryCache for SharedQueryCache {
    fn get(&self, fingerprint: &Fingerprint) -> Option<Vec<u8>> {
        self.inner.get(fingerprint)
    }

    fn put(&self, fingerprint: &Fingerprint, value: Vec<u8>, ttl: Duration) -> bool {
        self.inner.put(fingerprint, value, ttl)
    }
}

// ============================================================================
// SECTION: Read-Through
// ============================================================================

/// Response bytes plus whether they came from the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBody {
    /// Serialized response.
    pub body: Vec<u8>,
    /// True when served from the cache.
    pub cache_hit: bool,
}

/// Serves `fingerprint` from `cache`, computing and storing it on a miss.
///
/// A lost `put` race still serves the locally computed bytes.
///
/// # Errors
///
/// Returns the error of `compute`; nothing is cached in that case.
pub fn read_through<E>(
    cache: &dyn QueryCache,
    fingerprint: &Fingerprint,
    ttl: Duration,
    compute: impl FnOnce() -> Result<Vec<u8>, E>,
) -> Result<CachedBody, E> {
    if let Some(body) = cache.get(fingerprint) {
        debug!(key = %fingerprint, "query cache hit");
        return Ok(CachedBody {
            body,
            cache_hit: true,
        });
    }
    let body = compute()?;
    cache.put(fingerprint, body.clone(), ttl);
    Ok(CachedBody {
        body,
        cache_hit: false,
    })
}
