// perftracker-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payload.
// Purpose: Deterministic example for docs and the `config example` command.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for PerfTracker configuration. Every value shown is the
//! default except the store backend, which selects `SQLite`.

/// Returns a canonical example `perftracker.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[server]
bind = "127.0.0.1:8080"
max_body_bytes = 1048576

[store]
type = "sqlite"
path = "data/perftracker.sqlite"
busy_timeout_ms = 5000
journal_mode = "wal"
sync_mode = "full"

[cache]
search_ttl_secs = 30
summary_ttl_secs = 60
filters_ttl_secs = 600
max_entries = 4096

[limits]
search_limit = 500
latest_results_limit = 25
bulk_delete_limit = 500

[logging]
level = "info"
format = "text"
audit = "stderr"
"#,
    )
}
