// perftracker-core/src/runtime/catalog.rs
// ============================================================================
// Module: PerfTracker Filter Catalog
// Description: Distinct dimension values for search filters.
// Purpose: Populate the dashboard's version and network filter lists.
// Dependencies: serde, crate::interfaces
// ============================================================================

//! ## Overview
//! The catalog is a full scan of both dimension tables. Entries are
//! de-duplicated by value, not by id: when the create race left two records
//! with one value, the lowest id represents it. Both lists are sorted by label.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::interfaces::RecordStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Catalog Types
// ============================================================================

/// One selectable filter value.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilterEntry {
    /// Display label (version string or canonical network label).
    pub label: String,
    /// Dimension record id used as the filter value.
    pub id: u64,
}

/// Distinct dimension values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCatalog {
    /// Versions sorted by label.
    pub versions: Vec<FilterEntry>,
    /// Network profiles sorted by label.
    pub networks: Vec<FilterEntry>,
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builds the filter catalog from the record store.
pub struct FilterCatalogBuilder<'a, S: ?Sized> {
    /// Backing record store.
    store: &'a S,
}

impl<'a, S: RecordStore + ?Sized> FilterCatalogBuilder<'a, S> {
    /// Creates a builder over `store`.
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self {
            store,
        }
    }

    /// Scans both dimension tables.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a scan fails.
    pub fn build(&self) -> Result<FilterCatalog, StoreError> {
        let versions = distinct_by_label(
            self.store.list_versions()?.into_iter().map(|record| (record.version, record.id.get())),
        );
        let networks = distinct_by_label(
            self.store.list_networks()?.into_iter().map(|record| (record.label, record.id.get())),
        );
        Ok(FilterCatalog {
            versions,
            networks,
        })
    }
}

/// Keeps one entry per label (lowest id) sorted by label.
fn distinct_by_label(records: impl Iterator<Item = (String, u64)>) -> Vec<FilterEntry> {
    let mut by_label: BTreeMap<String, u64> = BTreeMap::new();
    for (label, id) in records {
        by_label.entry(label).and_modify(|kept| *kept = (*kept).min(id)).or_insert(id);
    }
    by_label
        .into_iter()
        .map(|(label, id)| FilterEntry {
            label,
            id,
        })
        .collect()
}
