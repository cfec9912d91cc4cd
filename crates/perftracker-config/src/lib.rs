// perftracker-config/src/lib.rs
// ============================================================================
// Module: PerfTracker Config Library
// Description: Canonical config model, validation, and example generation.
// Purpose: Single source of truth for perftracker.toml semantics.
// Dependencies: perftracker-core, perftracker-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `perftracker-config` defines the configuration model for the PerfTracker
//! server. Loading is strict and fail-closed; every section has defaults so
//! an empty file is a valid configuration.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
