// perftracker-config/src/config.rs
// ============================================================================
// Module: PerfTracker Configuration
// Description: Configuration loading and validation for the PerfTracker server.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: perftracker-core, perftracker-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Every section defaults to the service constants, so an empty file (or no
//! file at all for `serve`) yields a working in-memory tracker. Invalid values
//! fail closed with [`ConfigError::Invalid`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use perftracker_core::CacheTtls;
use perftracker_core::DEFAULT_BULK_DELETE_LIMIT;
use perftracker_core::DEFAULT_LATEST_RESULTS;
use perftracker_core::DEFAULT_MAX_CACHE_ENTRIES;
use perftracker_core::MAX_SEARCH_RESULTS;
use perftracker_core::TrackerSettings;
use perftracker_core::ViewLimits;
use perftracker_core::fingerprint::DEFAULT_FILTERS_TTL;
use perftracker_core::fingerprint::DEFAULT_SEARCH_TTL;
use perftracker_core::fingerprint::DEFAULT_SUMMARY_TTL;
use perftracker_store_sqlite::SqliteStoreConfig;
use perftracker_store_sqlite::SqliteStoreMode;
use perftracker_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "perftracker.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "PERFTRACKER_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default listen address.
pub(crate) const DEFAULT_BIND: &str = "127.0.0.1:8080";
/// Default maximum request body size in bytes.
pub(crate) const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;
/// Maximum configurable request body size in bytes.
pub(crate) const MAX_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Maximum configurable cache entry bound.
pub(crate) const MAX_CACHE_ENTRIES_LIMIT: usize = 1_000_000;
/// Maximum configurable cache TTL in seconds.
pub(crate) const MAX_CACHE_TTL_SECS: u64 = 86_400;
/// Maximum configurable list limit.
pub(crate) const MAX_LIST_LIMIT: usize = 500;
/// Default `SQLite` busy timeout in milliseconds.
pub(crate) const DEFAULT_STORE_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of the log level directive.
pub(crate) const MAX_LOG_LEVEL_LENGTH: usize = 256;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// PerfTracker server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerfTrackerConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Record store configuration.
    #[serde(default)]
    pub store: StoreConfig,
    /// Query cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// List view and bulk delete limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Diagnostics and audit configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PerfTrackerConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        Self::load_file(&resolved)
    }

    /// Loads configuration like [`Self::load`], but falls back to defaults
    /// when no path was given, no override is set, and the default file is
    /// absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an existing file fails to load or validate.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if path.is_none() && env::var_os(CONFIG_ENV_VAR).is_none() {
            let default_path = Path::new(DEFAULT_CONFIG_NAME);
            if !default_path.exists() {
                let mut config = Self::default();
                config.validate()?;
                return Ok(config);
            }
        }
        Self::load(path)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates one config file.
    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        validate_path(path)?;
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.store.validate()?;
        self.cache.validate()?;
        self.limits.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Returns the service tunables described by this configuration.
    #[must_use]
    pub const fn tracker_settings(&self) -> TrackerSettings {
        TrackerSettings {
            ttls: self.cache.ttls(),
            limits: ViewLimits {
                search: self.limits.search_limit,
                latest_results: self.limits.latest_results_limit,
            },
            bulk_delete_limit: self.limits.bulk_delete_limit,
        }
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed listen address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `bind` is not a socket address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("server.bind is not a socket address: {}", self.bind)))
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.max_body_bytes == 0 || self.max_body_bytes > MAX_MAX_BODY_BYTES {
            return Err(ConfigError::Invalid(format!(
                "server.max_body_bytes must be between 1 and {MAX_MAX_BODY_BYTES}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// Record store backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// Use the in-memory store.
    #[default]
    Memory,
    /// Use the `SQLite`-backed durable store.
    Sqlite,
}

/// Record store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Store backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// `SQLite` database path when using the sqlite backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_store_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            path: None,
            busy_timeout_ms: default_store_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Returns the `SQLite` settings when the sqlite backend is selected.
    #[must_use]
    pub fn sqlite_config(&self) -> Option<SqliteStoreConfig> {
        match self.store_type {
            StoreType::Memory => None,
            StoreType::Sqlite => self.path.as_ref().map(|path| SqliteStoreConfig {
                path: path.clone(),
                busy_timeout_ms: self.busy_timeout_ms,
                journal_mode: self.journal_mode,
                sync_mode: self.sync_mode,
            }),
        }
    }

    /// Validates record store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.store_type {
            StoreType::Memory => {
                if self.path.is_some() {
                    return Err(ConfigError::Invalid(
                        "memory store must not set path".to_string(),
                    ));
                }
                Ok(())
            }
            StoreType::Sqlite => {
                let path = self.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("sqlite store requires path".to_string())
                })?;
                validate_path_string("store.path", &path.to_string_lossy())
            }
        }
    }
}

// ============================================================================
// SECTION: Cache
// ============================================================================

/// Query cache configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Session search lifetime in seconds.
    #[serde(default = "default_search_ttl_secs")]
    pub search_ttl_secs: u64,
    /// Summary lookup lifetime in seconds.
    #[serde(default = "default_summary_ttl_secs")]
    pub summary_ttl_secs: u64,
    /// Filter catalog lifetime in seconds.
    #[serde(default = "default_filters_ttl_secs")]
    pub filters_ttl_secs: u64,
    /// Maximum number of cached responses.
    #[serde(default = "default_max_cache_entries")]
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            search_ttl_secs: default_search_ttl_secs(),
            summary_ttl_secs: default_summary_ttl_secs(),
            filters_ttl_secs: default_filters_ttl_secs(),
            max_entries: default_max_cache_entries(),
        }
    }
}

impl CacheConfig {
    /// Returns the configured lifetimes.
    #[must_use]
    pub const fn ttls(&self) -> CacheTtls {
        CacheTtls {
            search: Duration::from_secs(self.search_ttl_secs),
            summary: Duration::from_secs(self.summary_ttl_secs),
            filters: Duration::from_secs(self.filters_ttl_secs),
        }
    }

    /// Validates cache configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("cache.search_ttl_secs", self.search_ttl_secs),
            ("cache.summary_ttl_secs", self.summary_ttl_secs),
            ("cache.filters_ttl_secs", self.filters_ttl_secs),
        ] {
            if value > MAX_CACHE_TTL_SECS {
                return Err(ConfigError::Invalid(format!(
                    "{field} must be at most {MAX_CACHE_TTL_SECS}"
                )));
            }
        }
        if self.max_entries == 0 || self.max_entries > MAX_CACHE_ENTRIES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "cache.max_entries must be between 1 and {MAX_CACHE_ENTRIES_LIMIT}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Limits
// ============================================================================

/// List view and bulk delete limits.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum sessions returned by a search.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    /// Number of results in the latest-results view.
    #[serde(default = "default_latest_results_limit")]
    pub latest_results_limit: usize,
    /// Results removed per bulk delete.
    #[serde(default = "default_bulk_delete_limit")]
    pub bulk_delete_limit: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            latest_results_limit: default_latest_results_limit(),
            bulk_delete_limit: default_bulk_delete_limit(),
        }
    }
}

impl LimitsConfig {
    /// Validates limits.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_list_limit("limits.search_limit", self.search_limit)?;
        validate_list_limit("limits.latest_results_limit", self.latest_results_limit)?;
        validate_list_limit("limits.bulk_delete_limit", self.bulk_delete_limit)
    }
}

// ============================================================================
// SECTION: Logging
// ============================================================================

/// Diagnostic log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// Human-readable text lines.
    #[default]
    Text,
    /// JSON lines.
    Json,
}

/// Request audit destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to `audit_path`.
    File,
    /// Audit disabled.
    None,
}

/// Diagnostics and audit configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Default tracing filter directive; `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Diagnostic output format.
    #[serde(default)]
    pub format: LogFormat,
    /// Request audit destination.
    #[serde(default)]
    pub audit: AuditSinkKind,
    /// Audit log path when `audit = "file"`.
    #[serde(default)]
    pub audit_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            audit: AuditSinkKind::default(),
            audit_path: None,
        }
    }
}

impl LoggingConfig {
    /// Validates logging configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.trim();
        if level.is_empty() || level.len() > MAX_LOG_LEVEL_LENGTH {
            return Err(ConfigError::Invalid(format!(
                "logging.level must be 1 to {MAX_LOG_LEVEL_LENGTH} characters"
            )));
        }
        match (self.audit, &self.audit_path) {
            (AuditSinkKind::File, Some(path)) => validate_path_string("logging.audit_path", path),
            (AuditSinkKind::File, None) => Err(ConfigError::Invalid(
                "logging.audit = \"file\" requires logging.audit_path".to_string(),
            )),
            (_, Some(_)) => Err(ConfigError::Invalid(
                "logging.audit_path is only valid with logging.audit = \"file\"".to_string(),
            )),
            (_, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().to_string_lossy().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a list limit against `1..=MAX_LIST_LIMIT`.
fn validate_list_limit(field: &str, value: usize) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_LIST_LIMIT {
        return Err(ConfigError::Invalid(format!("{field} must be between 1 and {MAX_LIST_LIMIT}")));
    }
    Ok(())
}

/// Default listen address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default maximum request body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default `SQLite` busy timeout.
const fn default_store_busy_timeout_ms() -> u64 {
    DEFAULT_STORE_BUSY_TIMEOUT_MS
}

/// Default session search lifetime.
const fn default_search_ttl_secs() -> u64 {
    DEFAULT_SEARCH_TTL.as_secs()
}

/// Default summary lookup lifetime.
const fn default_summary_ttl_secs() -> u64 {
    DEFAULT_SUMMARY_TTL.as_secs()
}

/// Default filter catalog lifetime.
const fn default_filters_ttl_secs() -> u64 {
    DEFAULT_FILTERS_TTL.as_secs()
}

/// Default cache entry bound.
const fn default_max_cache_entries() -> usize {
    DEFAULT_MAX_CACHE_ENTRIES
}

/// Default session search limit.
const fn default_search_limit() -> usize {
    MAX_SEARCH_RESULTS
}

/// Default latest-results limit.
const fn default_latest_results_limit() -> usize {
    DEFAULT_LATEST_RESULTS
}

/// Default bulk delete limit.
const fn default_bulk_delete_limit() -> usize {
    DEFAULT_BULK_DELETE_LIMIT
}

/// Default tracing filter directive.
fn default_log_level() -> String {
    "info".to_string()
}

// ============================================================================
// SECTION: Tests
// ============================================================================
