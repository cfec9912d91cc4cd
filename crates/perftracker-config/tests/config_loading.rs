//! Config loading and validation tests for perftracker-config.
// perftracker-config/tests/config_loading.rs
// =============================================================================
// Module: Config Loading and Validation Tests
// Description: Validate defaults, file limits, and per-section invariants.
// Purpose: Ensure empty config is valid and invalid values fail closed.
// =============================================================================

#![allow(clippy::use_debug, reason = "Test-only diagnostics are permitted.")]

use std::fs;
use std::time::Duration;

use perftracker_config::AuditSinkKind;
use perftracker_config::ConfigError;
use perftracker_config::LogFormat;
use perftracker_config::PerfTrackerConfig;
use perftracker_config::StoreType;
use perftracker_config::config_toml_example;
use perftracker_store_sqlite::SqliteStoreMode;
use perftracker_store_sqlite::SqliteSyncMode;

mod common;

use common::TestResult;
use common::assert_invalid;
use common::write_config;

// ============================================================================
// SECTION: Defaults
// ============================================================================

#[test]
fn empty_file_uses_defaults() -> TestResult {
    let (_dir, path) = write_config("")?;
    let config = PerfTrackerConfig::load(Some(&path)).map_err(|err| err.to_string())?;
    if config.server.bind != "127.0.0.1:8080" {
        return Err(format!("unexpected bind {}", config.server.bind));
    }
    if config.store.store_type != StoreType::Memory || config.store.sqlite_config().is_some() {
        return Err("default store should be memory".to_string());
    }
    let settings = config.tracker_settings();
    if settings.ttls.search != Duration::from_secs(30)
        || settings.ttls.summary != Duration::from_secs(60)
        || settings.ttls.filters != Duration::from_secs(600)
    {
        return Err(format!("unexpected ttls {:?}", settings.ttls));
    }
    if settings.limits.search != 500 || settings.limits.latest_results != 25 {
        return Err(format!("unexpected limits {:?}", settings.limits));
    }
    if config.logging.format != LogFormat::Text || config.logging.audit != AuditSinkKind::Stderr {
        return Err("unexpected logging defaults".to_string());
    }
    Ok(())
}

#[test]
fn example_config_validates() -> TestResult {
    let config =
        PerfTrackerConfig::from_toml_str(&config_toml_example()).map_err(|err| err.to_string())?;
    let sqlite = config.store.sqlite_config().ok_or("example should select sqlite")?;
    if sqlite.path.to_string_lossy() != "data/perftracker.sqlite" {
        return Err(format!("unexpected path {}", sqlite.path.display()));
    }
    if sqlite.journal_mode != SqliteStoreMode::Wal || sqlite.sync_mode != SqliteSyncMode::Full {
        return Err("unexpected sqlite modes".to_string());
    }
    Ok(())
}

#[test]
fn custom_values_flow_into_tracker_settings() -> TestResult {
    let config = PerfTrackerConfig::from_toml_str(
        r#"
[cache]
search_ttl_secs = 5
summary_ttl_secs = 7
filters_ttl_secs = 9

[limits]
search_limit = 50
latest_results_limit = 10
bulk_delete_limit = 3
"#,
    )
    .map_err(|err| err.to_string())?;
    let settings = config.tracker_settings();
    if settings.ttls.search != Duration::from_secs(5)
        || settings.ttls.summary != Duration::from_secs(7)
        || settings.ttls.filters != Duration::from_secs(9)
    {
        return Err(format!("unexpected ttls {:?}", settings.ttls));
    }
    if settings.limits.search != 50
        || settings.limits.latest_results != 10
        || settings.bulk_delete_limit != 3
    {
        return Err(format!("unexpected settings {settings:?}"));
    }
    Ok(())
}

// ============================================================================
// SECTION: File Limits
// ============================================================================

#[test]
fn missing_file_is_io_error() -> TestResult {
    let (dir, _path) = write_config("")?;
    match PerfTrackerConfig::load(Some(&dir.path().join("absent.toml"))) {
        Err(ConfigError::Io(_)) => Ok(()),
        other => Err(format!("expected io error, got {other:?}")),
    }
}

#[test]
fn oversized_file_is_rejected() -> TestResult {
    let padding = format!("# {}\n", "x".repeat(1024 * 1024));
    let (_dir, path) = write_config(&padding)?;
    assert_invalid(PerfTrackerConfig::load(Some(&path)), "exceeds size limit")
}

#[test]
fn non_utf8_file_is_rejected() -> TestResult {
    let (_dir, path) = write_config("")?;
    fs::write(&path, [0xff_u8, 0xfe, 0x00]).map_err(|err| err.to_string())?;
    assert_invalid(PerfTrackerConfig::load(Some(&path)), "must be utf-8")
}

#[test]
fn unknown_field_is_parse_error() -> TestResult {
    match PerfTrackerConfig::from_toml_str("[server]\nport = 80\n") {
        Err(ConfigError::Parse(_)) => Ok(()),
        other => Err(format!("expected parse error, got {other:?}")),
    }
}

// ============================================================================
// SECTION: Section Validation
// ============================================================================

#[test]
fn bind_must_be_socket_address() -> TestResult {
    assert_invalid(
        PerfTrackerConfig::from_toml_str("[server]\nbind = \"localhost\"\n"),
        "server.bind is not a socket address",
    )
}

#[test]
fn max_body_bytes_is_bounded() -> TestResult {
    assert_invalid(
        PerfTrackerConfig::from_toml_str("[server]\nmax_body_bytes = 0\n"),
        "server.max_body_bytes",
    )?;
    assert_invalid(
        PerfTrackerConfig::from_toml_str("[server]\nmax_body_bytes = 16777217\n"),
        "server.max_body_bytes",
    )
}

#[test]
fn sqlite_store_requires_path() -> TestResult {
    assert_invalid(
        PerfTrackerConfig::from_toml_str("[store]\ntype = \"sqlite\"\n"),
        "sqlite store requires path",
    )
}

#[test]
fn memory_store_rejects_path() -> TestResult {
    assert_invalid(
        PerfTrackerConfig::from_toml_str("[store]\ntype = \"memory\"\npath = \"x.db\"\n"),
        "memory store must not set path",
    )
}

#[test]
fn cache_bounds_are_enforced() -> TestResult {
    assert_invalid(
        PerfTrackerConfig::from_toml_str("[cache]\nmax_entries = 0\n"),
        "cache.max_entries",
    )?;
    assert_invalid(
        PerfTrackerConfig::from_toml_str("[cache]\nfilters_ttl_secs = 86401\n"),
        "cache.filters_ttl_secs",
    )
}

#[test]
fn list_limits_are_capped_at_five_hundred() -> TestResult {
    assert_invalid(
        PerfTrackerConfig::from_toml_str("[limits]\nsearch_limit = 501\n"),
        "limits.search_limit",
    )?;
    assert_invalid(
        PerfTrackerConfig::from_toml_str("[limits]\nbulk_delete_limit = 0\n"),
        "limits.bulk_delete_limit",
    )
}

#[test]
fn file_audit_requires_path() -> TestResult {
    assert_invalid(
        PerfTrackerConfig::from_toml_str("[logging]\naudit = \"file\"\n"),
        "requires logging.audit_path",
    )?;
    assert_invalid(
        PerfTrackerConfig::from_toml_str("[logging]\naudit = \"none\"\naudit_path = \"a.log\"\n"),
        "only valid with",
    )?;
    let config = PerfTrackerConfig::from_toml_str(
        "[logging]\naudit = \"file\"\naudit_path = \"logs/audit.jsonl\"\nformat = \"json\"\n",
    )
    .map_err(|err| err.to_string())?;
    if config.logging.format != LogFormat::Json {
        return Err("expected json format".to_string());
    }
    Ok(())
}

#[test]
fn empty_log_level_is_rejected() -> TestResult {
    assert_invalid(PerfTrackerConfig::from_toml_str("[logging]\nlevel = \" \"\n"), "logging.level")
}
