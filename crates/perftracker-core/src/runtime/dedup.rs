// perftracker-core/src/runtime/dedup.rs
// ============================================================================
// Module: PerfTracker Dimension Deduplicator
// Description: Lookup-or-create for Version and NetworkProfile dimensions.
// Purpose: Share one dimension record among all sessions with equal values.
// Dependencies: crate::core, crate::interfaces, tracing
// ============================================================================

//! ## Overview
//! `resolve` looks a dimension up by its canonical value and creates it when
//! absent. The lookup and the create are separate store calls, so two
//! concurrent first observations of a value may both create a record. That gap
//! is accepted; [`DimensionDeduplicator::reconcile`] folds such duplicates back
//! into the lowest id afterwards.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::info;

use crate::core::NetworkCandidate;
use crate::core::NetworkId;
use crate::core::VersionId;
use crate::interfaces::RecordStore;
use crate::interfaces::SessionQuery;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Reconciliation Report
// ============================================================================

/// Outcome of a reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcileReport {
    /// Duplicate version records removed.
    pub merged_versions: usize,
    /// Duplicate network profiles removed.
    pub merged_networks: usize,
    /// Sessions re-pointed at a surviving dimension record.
    pub repointed_sessions: usize,
}

// ============================================================================
// SECTION: Deduplicator
// ============================================================================

/// Resolves dimension candidates to shared records.
pub struct DimensionDeduplicator<'a, S: ?Sized> {
    /// Backing record store.
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> DimensionDeduplicator<'a, S> {
    /// Creates a deduplicator over `store`.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self {
            store,
        }
    }

    /// Returns the id of the version record for `version`, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup or insert fails.
    pub fn resolve_version(&self, version: &str) -> Result<VersionId, StoreError> {
        if let Some(existing) = self.store.find_version(version)? {
            return Ok(existing.id);
        }
        let created = self.store.insert_version(version)?;
        debug!(version, id = %created.id, "created version dimension");
        Ok(created.id)
    }

    /// Returns the id of the network profile for `candidate`, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup or insert fails.
    pub fn resolve_network(&self, candidate: NetworkCandidate) -> Result<NetworkId, StoreError> {
        let label = candidate.canonical_label();
        if let Some(existing) = self.store.find_network(&label)? {
            return Ok(existing.id);
        }
        let created = self.store.insert_network(candidate)?;
        debug!(label = %created.label, id = %created.id, "created network dimension");
        Ok(created.id)
    }

    /// Folds duplicate dimension records into the lowest id of each value.
    ///
    /// Sessions are re-pointed before duplicates are deleted, so an
    /// interruption leaves at worst unreferenced duplicates behind.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when any store call fails; earlier steps stay
    /// applied.
    pub fn reconcile(&self) -> Result<ReconcileReport, StoreError> {
        let version_remap = duplicate_map(
            self.store.list_versions()?.into_iter().map(|record| (record.version, record.id)),
        );
        let network_remap = duplicate_map(
            self.store.list_networks()?.into_iter().map(|record| (record.label, record.id)),
        );
        let mut report = ReconcileReport::default();
        if version_remap.is_empty() && network_remap.is_empty() {
            return Ok(report);
        }

        for mut session in self.store.query_sessions(&SessionQuery::default())? {
            let mut changed = false;
            if let Some(kept) = version_remap.get(&session.version_ref) {
                session.version_ref = *kept;
                changed = true;
            }
            if let Some(kept) = session.network_ref.and_then(|id| network_remap.get(&id)) {
                session.network_ref = Some(*kept);
                changed = true;
            }
            if changed {
                self.store.save_session(&session)?;
                report.repointed_sessions += 1;
            }
        }
        for duplicate in version_remap.keys() {
            if self.store.delete_version(*duplicate)? {
                report.merged_versions += 1;
            }
        }
        for duplicate in network_remap.keys() {
            if self.store.delete_network(*duplicate)? {
                report.merged_networks += 1;
            }
        }
        info!(
            merged_versions = report.merged_versions,
            merged_networks = report.merged_networks,
            repointed_sessions = report.repointed_sessions,
            "reconciled dimension duplicates"
        );
        Ok(report)
    }
}

/// Maps each duplicate id to the lowest id sharing its canonical value.
fn duplicate_map<I: Ord + Copy>(records: impl Iterator<Item = (String, I)>) -> BTreeMap<I, I> {
    let mut groups: BTreeMap<String, Vec<I>> = BTreeMap::new();
    for (value, id) in records {
        groups.entry(value).or_default().push(id);
    }
    let mut remap = BTreeMap::new();
    for mut ids in groups.into_values() {
        ids.sort_unstable();
        if let Some((kept, duplicates)) = ids.split_first() {
            for duplicate in duplicates {
                remap.insert(*duplicate, *kept);
            }
        }
    }
    remap
}
