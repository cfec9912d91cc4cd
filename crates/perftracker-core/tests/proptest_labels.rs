// crates/perftracker-core/tests/proptest_labels.rs
// ============================================================================
// Module: Network Label Property Tests
// Description: Property tests for canonical network labels.
// Purpose: Equal network fields always share one label and one record.
// ============================================================================

//! Property-based tests for network label canonicalization.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use perftracker_core::DimensionDeduplicator;
use perftracker_core::InMemoryRecordStore;
use perftracker_core::NetworkCandidate;
use perftracker_core::RecordStore;
use proptest::prelude::*;

fn candidate_strategy() -> impl Strategy<Value = NetworkCandidate> {
    (
        0u64 .. 1_000_000,
        0u64 .. 1_000_000,
        0u64 .. 10_000,
        0.0f64 .. 100.0,
        prop_oneof![Just("tcp".to_string()), Just("spdy".to_string()), "[a-z]{1,6}"],
    )
        .prop_map(|(download_kbps, upload_kbps, rtt_ms, packet_loss_pct, protocol)| {
            NetworkCandidate {
                download_kbps,
                upload_kbps,
                rtt_ms,
                packet_loss_pct,
                protocol,
            }
        })
}

proptest! {
    #[test]
    fn label_is_deterministic(candidate in candidate_strategy()) {
        prop_assert_eq!(candidate.canonical_label(), candidate.clone().canonical_label());
    }

    #[test]
    fn label_shape_is_stable(candidate in candidate_strategy()) {
        let label = candidate.canonical_label();
        let parts: Vec<&str> = label.split('/').collect();
        prop_assert_eq!(parts.len(), 5);
        prop_assert_eq!(parts[0], candidate.protocol.as_str());
        prop_assert!(parts[1].ends_with("bps"));
        prop_assert!(parts[2].ends_with("bps"));
        prop_assert_eq!(parts[3], format!("{}ms", candidate.rtt_ms));
        prop_assert!(parts[4].ends_with('%'));
        prop_assert!(parts[4].contains('.') || parts[4].contains('e'));
    }

    #[test]
    fn equal_candidates_resolve_to_one_record(candidate in candidate_strategy()) {
        let store = InMemoryRecordStore::new();
        let dedup = DimensionDeduplicator::new(&store);
        let first = dedup.resolve_network(candidate.clone()).unwrap();
        let second = dedup.resolve_network(candidate).unwrap();
        prop_assert_eq!(first, second);
        prop_assert_eq!(store.list_networks().unwrap().len(), 1);
    }

    #[test]
    fn bandwidth_unit_follows_threshold(kbps in 0u64 .. 100_000) {
        let candidate = NetworkCandidate {
            download_kbps: kbps,
            upload_kbps: 0,
            rtt_ms: 0,
            packet_loss_pct: 0.0,
            protocol: "tcp".to_string(),
        };
        let label = candidate.canonical_label();
        let download = label.split('/').nth(1).unwrap();
        if kbps > 1000 {
            prop_assert!(download.ends_with("Mbps"));
            prop_assert!(download.contains('.'));
        } else {
            prop_assert_eq!(download, format!("{kbps}Kbps"));
        }
    }
}
