// perftracker-core/src/core/dimension.rs
// ============================================================================
// Module: PerfTracker Dimensions
// Description: Deduplicated Version and NetworkProfile records.
// Purpose: Define dimension records and the canonical network label.
// Dependencies: serde, crate::core::identifiers
// ============================================================================

//! ## Overview
//! Dimensions are attribute values shared by many sessions. Each one is keyed
//! by a canonical string: the version text itself, or the label rendered from
//! a network profile's five fields. Dimension records are created lazily and
//! never mutated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::NetworkId;
use crate::core::identifiers::VersionId;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Bandwidths strictly above this value are rendered in Mbps.
const MBPS_THRESHOLD_KBPS: u64 = 1000;
/// Smallest decimal exponent rendered without exponent notation.
const MIN_PLAIN_EXPONENT: i32 = -4;
/// Decimal exponent from which exponent notation is used.
const MAX_PLAIN_EXPONENT: i32 = 16;

// ============================================================================
// SECTION: Version
// ============================================================================

/// Software version dimension.
///
/// # Invariants
/// - `version` is the uniqueness key across all version records, modulo the
///   accepted concurrent-create race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Store-assigned identifier.
    pub id: VersionId,
    /// Version string as uploaded.
    pub version: String,
}

// ============================================================================
// SECTION: Network Profile
// ============================================================================

/// Network conditions under which a session ran, before it is stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkCandidate {
    /// Download bandwidth in Kbps.
    pub download_kbps: u64,
    /// Upload bandwidth in Kbps.
    pub upload_kbps: u64,
    /// Round trip time in milliseconds.
    pub rtt_ms: u64,
    /// Packet loss percentage.
    pub packet_loss_pct: f64,
    /// Transport protocol label (for example `tcp`).
    pub protocol: String,
}

impl NetworkCandidate {
    /// Renders the canonical label, e.g. `tcp/5.0Mbps/1000Kbps/40ms/0.0%`.
    #[must_use]
    pub fn canonical_label(&self) -> String {
        format!(
            "{}/{}/{}/{}ms/{}%",
            self.protocol,
            bandwidth_label(self.download_kbps),
            bandwidth_label(self.upload_kbps),
            self.rtt_ms,
            decimal_label(self.packet_loss_pct)
        )
    }

    /// Builds the stored profile for this candidate.
    #[must_use]
    pub fn into_profile(self, id: NetworkId) -> NetworkProfile {
        let label = self.canonical_label();
        NetworkProfile {
            id,
            label,
            download_kbps: self.download_kbps,
            upload_kbps: self.upload_kbps,
            rtt_ms: self.rtt_ms,
            packet_loss_pct: self.packet_loss_pct,
            protocol: self.protocol,
        }
    }
}

/// Network profile dimension.
///
/// # Invariants
/// - `label` equals the canonical label of the five network fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkProfile {
    /// Store-assigned identifier.
    pub id: NetworkId,
    /// Canonical label; the uniqueness key.
    pub label: String,
    /// Download bandwidth in Kbps.
    pub download_kbps: u64,
    /// Upload bandwidth in Kbps.
    pub upload_kbps: u64,
    /// Round trip time in milliseconds.
    pub rtt_ms: u64,
    /// Packet loss percentage.
    pub packet_loss_pct: f64,
    /// Transport protocol label.
    pub protocol: String,
}

// ============================================================================
// SECTION: Label Formatting
// ============================================================================

/// Renders a bandwidth as `<n>Kbps`, or `<x.y>Mbps` above 1000 Kbps.
#[allow(clippy::cast_precision_loss, reason = "Labels mirror float division of kbps.")]
fn bandwidth_label(kbps: u64) -> String {
    if kbps > MBPS_THRESHOLD_KBPS {
        format!("{}Mbps", decimal_label(kbps as f64 / 1000.0))
    } else {
        format!("{kbps}Kbps")
    }
}

/// Renders a float with at least one fractional digit (`5` becomes `5.0`).
///
/// Magnitudes below `1e-4` or from `1e16` up switch to exponent notation with
/// a signed two-digit exponent (`0.00001` becomes `1e-05`).
fn decimal_label(value: f64) -> String {
    // Folds negative zero so it labels identically to zero.
    let value = if value == 0.0 { 0.0 } else { value };
    if !value.is_finite() {
        return value.to_string();
    }
    let scientific = format!("{value:e}");
    if let Some((mantissa, exponent)) = scientific.split_once('e')
        && let Ok(exponent) = exponent.parse::<i32>()
        && !(MIN_PLAIN_EXPONENT .. MAX_PLAIN_EXPONENT).contains(&exponent)
    {
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs());
    }
    let text = value.to_string();
    if text.contains('.') { text } else { format!("{text}.0") }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
