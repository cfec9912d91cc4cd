// perftracker-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Record Store
// Description: Durable RecordStore backed by SQLite WAL.
// Purpose: Persist PerfTracker records with integrity-checked payloads.
// Dependencies: perftracker-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Every table keeps an `INTEGER PRIMARY KEY AUTOINCREMENT` id, the columns
//! used by filters and ordering, and the record itself as canonical JSON with
//! a hash. Inserts allocate the id, render the record with it, and write the
//! payload inside one transaction. Loads recompute the hash and fail closed on
//! mismatch.
//!
//! Dimension tables carry no uniqueness constraint on their canonical value:
//! concurrent first observations may insert twice, and reconciliation folds
//! them later.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;

use perftracker_core::NetworkCandidate;
use perftracker_core::NetworkId;
use perftracker_core::NetworkProfile;
use perftracker_core::RecordStore;
use perftracker_core::ResultDraft;
use perftracker_core::ResultId;
use perftracker_core::ResultQuery;
use perftracker_core::SessionDraft;
use perftracker_core::SessionId;
use perftracker_core::SessionQuery;
use perftracker_core::SortOrder;
use perftracker_core::StoreError;
use perftracker_core::SummaryDraft;
use perftracker_core::SummaryId;
use perftracker_core::SummaryQuery;
use perftracker_core::TestResult;
use perftracker_core::TestSession;
use perftracker_core::TestSummary;
use perftracker_core::Version;
use perftracker_core::VersionId;
use perftracker_core::hashing::DEFAULT_HASH_ALGORITHM;
use perftracker_core::hashing::HashAlgorithm;
use perftracker_core::hashing::canonical_json_bytes;
use perftracker_core::hashing::hash_bytes;
use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum record payload size accepted on load.
pub const MAX_RECORD_BYTES: usize = 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` record store.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Builds a config for `path` with default tuning.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
#[derive(Debug, Error)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Store corruption or hash mismatch.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid store data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Stored payload exceeded the size limit.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Io(message),
            SqliteStoreError::Db(message) => Self::Store(message),
            SqliteStoreError::Corrupt(message) => Self::Corrupt(message),
            SqliteStoreError::VersionMismatch(message) => {
                Self::Invalid(format!("schema version mismatch: {message}"))
            }
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Invalid(format!(
                "record_json exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

/// Maps an engine error.
#[allow(clippy::needless_pass_by_value, reason = "Used as a map_err function.")]
fn db_error(err: rusqlite::Error) -> SqliteStoreError {
    SqliteStoreError::Db(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed record store with WAL support.
#[derive(Clone)]
pub struct SqliteRecordStore {
    /// Shared `SQLite` connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    /// Opens an `SQLite`-backed record store.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be opened or
    /// initialized.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_store_path(&config.path)?;
        ensure_parent_dir(&config.path)?;
        let mut connection = open_connection(config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Runs `op` inside a transaction and commits it.
    fn with_transaction<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let mut guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))?;
        let tx = guard.transaction().map_err(db_error)?;
        let value = op(&*tx)?;
        tx.commit().map_err(db_error)?;
        drop(guard);
        Ok(value)
    }

    /// Runs a read-only `op` on the connection.
    fn with_connection<T>(
        &self,
        op: impl FnOnce(&Connection) -> Result<T, SqliteStoreError>,
    ) -> Result<T, SqliteStoreError> {
        let guard = self
            .connection
            .lock()
            .map_err(|_| SqliteStoreError::Db("mutex poisoned".to_string()))?;
        let value = op(&guard)?;
        drop(guard);
        Ok(value)
    }
}

impl RecordStore for SqliteRecordStore {
    fn find_version(&self, version: &str) -> Result<Option<Version>, StoreError> {
        Ok(self.with_connection(|conn| {
            let row: Option<(i64, String)> = conn
                .query_row(
                    "SELECT id, version FROM versions WHERE version = ?1 ORDER BY id LIMIT 1",
                    params![version],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()
                .map_err(db_error)?;
            row.map(version_from_row).transpose()
        })?)
    }

    fn insert_version(&self, version: &str) -> Result<Version, StoreError> {
        Ok(self.with_transaction(|conn| {
            conn.execute("INSERT INTO versions (version) VALUES (?1)", params![version])
                .map_err(db_error)?;
            version_from_row((conn.last_insert_rowid(), version.to_string()))
        })?)
    }

    fn list_versions(&self) -> Result<Vec<Version>, StoreError> {
        Ok(self.with_connection(|conn| {
            let mut statement =
                conn.prepare("SELECT id, version FROM versions ORDER BY id").map_err(db_error)?;
            let rows = statement
                .query_map(params![], |row| Ok((row.get(0)?, row.get(1)?)))
                .map_err(db_error)?;
            let mut versions = Vec::new();
            for row in rows {
                versions.push(version_from_row(row.map_err(db_error)?)?);
            }
            Ok(versions)
        })?)
    }

    fn delete_version(&self, id: VersionId) -> Result<bool, StoreError> {
        Ok(self.with_transaction(|conn| delete_row(conn, "versions", id.get()))?)
    }

    fn find_network(&self, label: &str) -> Result<Option<NetworkProfile>, StoreError> {
        Ok(self.with_connection(|conn| {
            let mut records: Vec<NetworkProfile> = read_payloads(
                conn,
                "SELECT id, record_json, record_hash, hash_algorithm FROM networks WHERE label = \
                 ?1 ORDER BY id LIMIT 1",
                &[Value::Text(label.to_string())],
            )?;
            Ok(records.pop())
        })?)
    }

    fn insert_network(&self, candidate: NetworkCandidate) -> Result<NetworkProfile, StoreError> {
        Ok(self.with_transaction(|conn| {
            conn.execute(
                "INSERT INTO networks (label, record_json, record_hash, hash_algorithm) VALUES \
                 (?1, x'', '', '')",
                params![candidate.canonical_label()],
            )
            .map_err(db_error)?;
            let id = NetworkId::from_raw(row_id(conn.last_insert_rowid())?)
                .ok_or_else(|| SqliteStoreError::Corrupt("network id is zero".to_string()))?;
            let record = candidate.into_profile(id);
            write_payload(conn, "networks", id.get(), &record)?;
            Ok(record)
        })?)
    }

    fn list_networks(&self) -> Result<Vec<NetworkProfile>, StoreError> {
        Ok(self.with_connection(|conn| {
            read_payloads(
                conn,
                "SELECT id, record_json, record_hash, hash_algorithm FROM networks ORDER BY id",
                &[],
            )
        })?)
    }

    fn delete_network(&self, id: NetworkId) -> Result<bool, StoreError> {
        Ok(self.with_transaction(|conn| delete_row(conn, "networks", id.get()))?)
    }

    fn load_session(&self, id: SessionId) -> Result<Option<TestSession>, StoreError> {
        Ok(self.with_connection(|conn| {
            let mut records: Vec<TestSession> = read_payloads(
                conn,
                "SELECT id, record_json, record_hash, hash_algorithm FROM sessions WHERE id = ?1",
                &[Value::Integer(sql_id(id.get())?)],
            )?;
            let record = records.pop();
            if record.as_ref().is_some_and(|session| session.id != id) {
                return Err(SqliteStoreError::Invalid(
                    "session id mismatch between key and payload".to_string(),
                ));
            }
            Ok(record)
        })?)
    }

    fn insert_session(&self, draft: SessionDraft) -> Result<TestSession, StoreError> {
        Ok(self.with_transaction(|conn| {
            conn.execute(
                "INSERT INTO sessions (version_ref, network_ref, created_at, record_json, \
                 record_hash, hash_algorithm) VALUES (?1, ?2, ?3, x'', '', '')",
                params![
                    sql_id(draft.version_ref.get())?,
                    draft.network_ref.map(|id| sql_id(id.get())).transpose()?,
                    draft.created_at.as_unix_millis()
                ],
            )
            .map_err(db_error)?;
            let id = SessionId::from_raw(row_id(conn.last_insert_rowid())?)
                .ok_or_else(|| SqliteStoreError::Corrupt("session id is zero".to_string()))?;
            let record = draft.into_session(id);
            write_payload(conn, "sessions", id.get(), &record)?;
            Ok(record)
        })?)
    }

    fn save_session(&self, session: &TestSession) -> Result<(), StoreError> {
        Ok(self.with_transaction(|conn| {
            let changed = conn
                .execute(
                    "UPDATE sessions SET version_ref = ?1, network_ref = ?2 WHERE id = ?3",
                    params![
                        sql_id(session.version_ref.get())?,
                        session.network_ref.map(|id| sql_id(id.get())).transpose()?,
                        sql_id(session.id.get())?
                    ],
                )
                .map_err(db_error)?;
            if changed == 0 {
                return Err(SqliteStoreError::Invalid(format!(
                    "session {} does not exist",
                    session.id
                )));
            }
            write_payload(conn, "sessions", session.id.get(), session)
        })?)
    }

    fn query_sessions(&self, query: &SessionQuery) -> Result<Vec<TestSession>, StoreError> {
        let mut filters = Vec::new();
        let mut values = Vec::new();
        if !query.version_refs.is_empty() {
            filters.push(in_clause("version_ref", query.version_refs.len()));
            for id in &query.version_refs {
                values.push(Value::Integer(sql_id(id.get())?));
            }
        }
        if !query.network_refs.is_empty() {
            filters.push(in_clause("network_ref", query.network_refs.len()));
            for id in &query.network_refs {
                values.push(Value::Integer(sql_id(id.get())?));
            }
        }
        let sql = select_sql("sessions", &filters, query.order, query.limit);
        Ok(self.with_connection(|conn| read_payloads(conn, &sql, &values))?)
    }

    fn insert_result(&self, draft: ResultDraft) -> Result<TestResult, StoreError> {
        Ok(self.with_transaction(|conn| {
            conn.execute(
                "INSERT INTO results (session_ref, url, created_at, record_json, record_hash, \
                 hash_algorithm) VALUES (?1, ?2, ?3, x'', '', '')",
                params![
                    sql_id(draft.session_ref.get())?,
                    draft.url,
                    draft.created_at.as_unix_millis()
                ],
            )
            .map_err(db_error)?;
            let id = ResultId::from_raw(row_id(conn.last_insert_rowid())?)
                .ok_or_else(|| SqliteStoreError::Corrupt("result id is zero".to_string()))?;
            let record = draft.into_result(id);
            write_payload(conn, "results", id.get(), &record)?;
            Ok(record)
        })?)
    }

    fn query_results(&self, query: &ResultQuery) -> Result<Vec<TestResult>, StoreError> {
        let mut filters = Vec::new();
        let mut values = Vec::new();
        if let Some(session_ref) = query.session_ref {
            filters.push(format!("session_ref = ?{}", values.len() + 1));
            values.push(Value::Integer(sql_id(session_ref.get())?));
        }
        if let Some(url) = &query.url {
            filters.push(format!("url = ?{}", values.len() + 1));
            values.push(Value::Text(url.clone()));
        }
        let sql = select_sql("results", &filters, query.order, query.limit);
        Ok(self.with_connection(|conn| read_payloads(conn, &sql, &values))?)
    }

    fn delete_results(&self, ids: &[ResultId]) -> Result<usize, StoreError> {
        Ok(self.with_transaction(|conn| {
            let mut deleted = 0;
            for id in ids {
                if delete_row(conn, "results", id.get())? {
                    deleted += 1;
                }
            }
            Ok(deleted)
        })?)
    }

    fn load_summary(&self, id: SummaryId) -> Result<Option<TestSummary>, StoreError> {
        Ok(self.with_connection(|conn| {
            let mut records: Vec<TestSummary> = read_payloads(
                conn,
                "SELECT id, record_json, record_hash, hash_algorithm FROM summaries WHERE id = ?1",
                &[Value::Integer(sql_id(id.get())?)],
            )?;
            let record = records.pop();
            if record.as_ref().is_some_and(|summary| summary.id != id) {
                return Err(SqliteStoreError::Invalid(
                    "summary id mismatch between key and payload".to_string(),
                ));
            }
            Ok(record)
        })?)
    }

    fn insert_summary(&self, draft: SummaryDraft) -> Result<TestSummary, StoreError> {
        Ok(self.with_transaction(|conn| {
            conn.execute(
                "INSERT INTO summaries (session_ref, created_at, record_json, record_hash, \
                 hash_algorithm) VALUES (?1, ?2, x'', '', '')",
                params![sql_id(draft.session_ref.get())?, draft.created_at.as_unix_millis()],
            )
            .map_err(db_error)?;
            let id = SummaryId::from_raw(row_id(conn.last_insert_rowid())?)
                .ok_or_else(|| SqliteStoreError::Corrupt("summary id is zero".to_string()))?;
            let record = draft.into_summary(id);
            write_payload(conn, "summaries", id.get(), &record)?;
            Ok(record)
        })?)
    }

    fn query_summaries(&self, query: &SummaryQuery) -> Result<Vec<TestSummary>, StoreError> {
        let mut filters = Vec::new();
        let mut values = Vec::new();
        if let Some(session_ref) = query.session_ref {
            filters.push("session_ref = ?1".to_string());
            values.push(Value::Integer(sql_id(session_ref.get())?));
        }
        let sql = select_sql("summaries", &filters, query.order, query.limit);
        Ok(self.with_connection(|conn| read_payloads(conn, &sql, &values))?)
    }
}

// ============================================================================
// SECTION: Payload Helpers
// ============================================================================

/// Builds `SELECT` over a payload table with filters, ordering, and limit.
fn select_sql(table: &str, filters: &[String], order: SortOrder, limit: Option<usize>) -> String {
    let direction = match order {
        SortOrder::CreatedAsc => "ASC",
        SortOrder::CreatedDesc => "DESC",
    };
    let mut sql =
        format!("SELECT id, record_json, record_hash, hash_algorithm FROM {table}");
    if !filters.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&filters.join(" AND "));
    }
    sql.push_str(&format!(" ORDER BY created_at {direction}, id {direction}"));
    if let Some(limit) = limit {
        sql.push_str(&format!(" LIMIT {limit}"));
    }
    sql
}

/// Builds `column IN (?, ...)` with `count` anonymous placeholders.
fn in_clause(column: &str, count: usize) -> String {
    format!("{column} IN ({})", vec!["?"; count].join(", "))
}

/// Serializes `record` canonically and stores it on row `id` of `table`.
fn write_payload<T: Serialize>(
    conn: &Connection,
    table: &str,
    id: u64,
    record: &T,
) -> Result<(), SqliteStoreError> {
    let canonical_json =
        canonical_json_bytes(record).map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
    let digest = hash_bytes(DEFAULT_HASH_ALGORITHM, &canonical_json);
    conn.execute(
        &format!(
            "UPDATE {table} SET record_json = ?1, record_hash = ?2, hash_algorithm = ?3 WHERE id \
             = ?4"
        ),
        params![canonical_json, digest.value, digest.algorithm.label(), sql_id(id)?],
    )
    .map_err(db_error)?;
    Ok(())
}

/// Stored payload columns of one row.
struct PayloadRow {
    /// Row id.
    id: i64,
    /// Canonical JSON bytes.
    json: Vec<u8>,
    /// Stored hash value.
    hash: String,
    /// Stored hash algorithm label.
    algorithm: String,
}

/// Runs `sql` and decodes every row's verified payload.
fn read_payloads<T: DeserializeOwned>(
    conn: &Connection,
    sql: &str,
    values: &[Value],
) -> Result<Vec<T>, SqliteStoreError> {
    let mut statement = conn.prepare(sql).map_err(db_error)?;
    let rows = statement
        .query_map(params_from_iter(values.iter()), |row| {
            Ok(PayloadRow {
                id: row.get(0)?,
                json: row.get(1)?,
                hash: row.get(2)?,
                algorithm: row.get(3)?,
            })
        })
        .map_err(db_error)?;
    let mut records = Vec::new();
    for row in rows {
        records.push(decode_payload(&row.map_err(db_error)?)?);
    }
    Ok(records)
}

/// Verifies a payload hash and deserializes it.
fn decode_payload<T: DeserializeOwned>(row: &PayloadRow) -> Result<T, SqliteStoreError> {
    if row.json.len() > MAX_RECORD_BYTES {
        return Err(SqliteStoreError::TooLarge {
            max_bytes: MAX_RECORD_BYTES,
            actual_bytes: row.json.len(),
        });
    }
    let algorithm = HashAlgorithm::from_label(&row.algorithm).ok_or_else(|| {
        SqliteStoreError::Invalid(format!("unsupported hash algorithm: {}", row.algorithm))
    })?;
    let expected = hash_bytes(algorithm, &row.json);
    if expected.value != row.hash {
        return Err(SqliteStoreError::Corrupt(format!("hash mismatch for row {}", row.id)));
    }
    serde_json::from_slice(&row.json).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Deletes row `id` of `table`; returns whether it existed.
fn delete_row(conn: &Connection, table: &str, id: u64) -> Result<bool, SqliteStoreError> {
    let changed = conn
        .execute(&format!("DELETE FROM {table} WHERE id = ?1"), params![sql_id(id)?])
        .map_err(db_error)?;
    Ok(changed > 0)
}

/// Builds a version record from its columns.
fn version_from_row((id, version): (i64, String)) -> Result<Version, SqliteStoreError> {
    let id = VersionId::from_raw(row_id(id)?)
        .ok_or_else(|| SqliteStoreError::Corrupt("version id is zero".to_string()))?;
    Ok(Version {
        id,
        version,
    })
}

/// Converts a record id to an `SQLite` integer.
fn sql_id(id: u64) -> Result<i64, SqliteStoreError> {
    i64::try_from(id).map_err(|_| SqliteStoreError::Invalid(format!("id out of range: {id}")))
}

/// Converts an `SQLite` row id to a record id.
fn row_id(id: i64) -> Result<u64, SqliteStoreError> {
    u64::try_from(id).map_err(|_| SqliteStoreError::Corrupt(format!("negative row id: {id}")))
}

// ============================================================================
// SECTION: Connection Helpers
// ============================================================================

/// Ensures the parent directory for the store exists.
fn ensure_parent_dir(path: &Path) -> Result<(), SqliteStoreError> {
    let Some(parent) = path.parent() else {
        return Err(SqliteStoreError::Io("store path missing parent directory".to_string()));
    };
    std::fs::create_dir_all(parent).map_err(|err| SqliteStoreError::Io(err.to_string()))
}

/// Validates store paths for safety limits.
fn validate_store_path(path: &Path) -> Result<(), SqliteStoreError> {
    let path_string = path.display().to_string();
    if path_string.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store path exceeds length limit".to_string()));
    }
    for component in path.components() {
        let name = component.as_os_str().to_string_lossy();
        if name.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store path contains an overlong component".to_string(),
            ));
        }
    }
    if path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store path must be a file, not a directory".to_string(),
        ));
    }
    Ok(())
}

/// Opens an `SQLite` connection with the configured pragmas.
fn open_connection(config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(&config.path, flags).map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(db_error)?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(db_error)?;
    Ok(connection)
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(db_error)?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(db_error)?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(db_error)?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(db_error)?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS versions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    version TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_versions_version ON versions (version);
                CREATE TABLE IF NOT EXISTS networks (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    label TEXT NOT NULL,
                    record_json BLOB NOT NULL,
                    record_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_networks_label ON networks (label);
                CREATE TABLE IF NOT EXISTS sessions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    version_ref INTEGER NOT NULL,
                    network_ref INTEGER,
                    created_at INTEGER NOT NULL,
                    record_json BLOB NOT NULL,
                    record_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_sessions_created ON sessions (created_at, id);
                CREATE INDEX IF NOT EXISTS idx_sessions_version ON sessions (version_ref);
                CREATE INDEX IF NOT EXISTS idx_sessions_network ON sessions (network_ref);
                CREATE TABLE IF NOT EXISTS results (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_ref INTEGER NOT NULL,
                    url TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    record_json BLOB NOT NULL,
                    record_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_results_created ON results (created_at, id);
                CREATE INDEX IF NOT EXISTS idx_results_session_url ON results (session_ref, url);
                CREATE TABLE IF NOT EXISTS summaries (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    session_ref INTEGER NOT NULL,
                    created_at INTEGER NOT NULL,
                    record_json BLOB NOT NULL,
                    record_hash TEXT NOT NULL,
                    hash_algorithm TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_summaries_session ON summaries (session_ref);",
            )
            .map_err(db_error)?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit().map_err(db_error)?;
    Ok(())
}

// ============================================================================
// SECTION: Tests
// ============================================================================
