// perftracker-core/src/core/time.rs
// ============================================================================
// Module: PerfTracker Time Model
// Description: Creation timestamps and cache expiry arithmetic.
// Purpose: Keep ordering and TTL logic independent of the wall clock.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Records carry a creation timestamp in unix milliseconds. The runtime never
//! reads the wall clock directly; it asks an injected [`crate::Clock`], which
//! lets tests drive TTL expiry and creation order deterministically.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Time Values
// ============================================================================

/// Unix epoch milliseconds.
///
/// # Invariants
/// - Monotonicity is the clock's responsibility; no validation is applied here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns this timestamp advanced by `duration`, saturating on overflow.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(millis))
    }
}
