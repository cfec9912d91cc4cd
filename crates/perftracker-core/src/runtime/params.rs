// perftracker-core/src/runtime/params.rs
// ============================================================================
// Module: PerfTracker Request Parameters
// Description: Typed parsing of upload and read parameters.
// Purpose: Validate presence, then parse, before any store call.
// Dependencies: crate::core, crate::runtime::{error, ingest, views}
// ============================================================================

//! ## Overview
//! Transports hand the runtime a flat string map of request parameters. This
//! module turns that map into typed requests. Required identifying
//! parameters are checked for presence first ([`TrackerError::MissingParameter`]),
//! then every numeric field is parsed ([`TrackerError::InvalidArgument`]).
//! Nothing here touches the store, so a parse failure never leaves a partial
//! write behind.
//!
//! An empty value counts as absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use crate::core::NetworkCandidate;
use crate::core::NetworkId;
use crate::core::SessionId;
use crate::core::SessionMetadata;
use crate::core::StatisticsPayload;
use crate::core::SummaryId;
use crate::core::VersionId;
use crate::runtime::error::TrackerError;
use crate::runtime::ingest::CreateResultRequest;
use crate::runtime::ingest::CreateSessionRequest;
use crate::runtime::ingest::CreateSummaryRequest;
use crate::runtime::ingest::UpdateSessionRequest;
use crate::runtime::views::SessionSearchRequest;

// ============================================================================
// SECTION: Parameter Names
// ============================================================================

/// Session upload command selector.
pub const PARAM_CMD: &str = "cmd";
/// JSON read resource selector.
pub const PARAM_TYPE: &str = "type";
/// Session id on uploads.
pub const PARAM_SET_ID: &str = "set_id";
/// Record id on JSON lookups.
pub const PARAM_ID: &str = "id";

/// Network fields that switch on network resolution when any is present.
const NETWORK_NUMERIC_PARAMS: [&str; 4] =
    ["download_kbps", "upload_kbps", "rtt_ms", "packet_loss_pct"];

// ============================================================================
// SECTION: Selectors
// ============================================================================

/// Session upload commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Create a session.
    Create,
    /// Fill a session's statistics.
    Update,
}

/// JSON read resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadResource {
    /// Summary with its matching results.
    Summary,
    /// Single result lookup; answered with an empty object.
    Result,
    /// Session with its summaries.
    Session,
    /// Filtered session search.
    SessionSearch,
    /// Filter catalog.
    Filters,
    /// Most recent results.
    LatestResults,
}

impl ReadResource {
    /// Parses the `type` selector value.
    fn parse(value: &str) -> Option<Self> {
        match value {
            "summary" => Some(Self::Summary),
            "result" => Some(Self::Result),
            "set" => Some(Self::Session),
            "set_search" => Some(Self::SessionSearch),
            "filters" => Some(Self::Filters),
            "latestresults" => Some(Self::LatestResults),
            _ => None,
        }
    }
}

// ============================================================================
// SECTION: Parameter Map
// ============================================================================

/// Flat request parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadParams {
    /// Parameter values by name.
    values: BTreeMap<String, String>,
}

impl UploadParams {
    /// Builds parameters from name/value pairs; later pairs win.
    #[must_use]
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = pairs.into_iter().map(|(key, value)| (key.into(), value.into())).collect();
        Self {
            values,
        }
    }

    /// Adds or replaces one parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Returns the non-empty value of `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str).filter(|value| !value.is_empty())
    }

    /// Returns the value of `name`, or an empty string.
    #[must_use]
    pub fn text(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    /// Returns the value of `name` or fails with `MissingParameter`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MissingParameter`] when the value is absent.
    pub fn require(&self, name: &str) -> Result<&str, TrackerError> {
        self.get(name).ok_or_else(|| TrackerError::MissingParameter(name.to_string()))
    }

    /// Parses `name` as an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidArgument`] when absent or malformed.
    pub fn unsigned(&self, name: &str) -> Result<u64, TrackerError> {
        let raw = self.get(name).unwrap_or_default();
        raw.trim().parse::<u64>().map_err(|_| TrackerError::invalid(name, raw))
    }

    /// Parses `name` as a finite, non-negative float.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidArgument`] when absent or malformed.
    pub fn non_negative_float(&self, name: &str) -> Result<f64, TrackerError> {
        let raw = self.get(name).unwrap_or_default();
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
            _ => Err(TrackerError::invalid(name, raw)),
        }
    }

    /// Parses `name` as a float and truncates it toward zero.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidArgument`] when absent, malformed, or
    /// out of range.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "Kilobyte counts are truncated floats; range is checked first."
    )]
    pub fn truncated(&self, name: &str) -> Result<u64, TrackerError> {
        let value = self.non_negative_float(name)?;
        if value >= 18_446_744_073_709_551_616.0 {
            return Err(TrackerError::invalid(name, self.get(name).unwrap_or_default()));
        }
        Ok(value.trunc() as u64)
    }

    /// Parses `name` as a record id (non-zero integer).
    fn raw_id(&self, name: &str) -> Result<u64, TrackerError> {
        let raw = self.require(name)?;
        match raw.trim().parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(TrackerError::invalid(name, raw)),
        }
    }

    /// Parses a comma separated id list; absent means empty.
    fn id_list(&self, name: &str) -> Result<Vec<u64>, TrackerError> {
        let Some(raw) = self.get(name) else {
            return Ok(Vec::new());
        };
        raw.split(',')
            .map(|part| match part.trim().parse::<u64>() {
                Ok(value) if value > 0 => Ok(value),
                _ => Err(TrackerError::invalid(name, raw)),
            })
            .collect()
    }

    /// Parses the eleven statistics fields.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidArgument`] for the first malformed field.
    pub fn statistics(&self) -> Result<StatisticsPayload, TrackerError> {
        Ok(StatisticsPayload {
            start_load_time: self.unsigned("start_load_time")?,
            commit_load_time: self.unsigned("commit_load_time")?,
            doc_load_time: self.unsigned("doc_load_time")?,
            paint_time: self.unsigned("paint_time")?,
            total_time: self.unsigned("total_time")?,
            last_load_time: self.unsigned("last_load_time")?,
            num_requests: self.unsigned("num_requests")?,
            num_connects: self.unsigned("num_connects")?,
            num_sessions: self.unsigned("num_sessions")?,
            read_bytes_kb: self.truncated("read_bytes_kb")?,
            write_bytes_kb: self.truncated("write_bytes_kb")?,
        })
    }

    // ------------------------------------------------------------------------
    // Selectors
    // ------------------------------------------------------------------------

    /// Parses the `cmd` selector of a session upload.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MissingParameter`] or
    /// [`TrackerError::UnknownCommand`].
    pub fn session_command(&self) -> Result<SessionCommand, TrackerError> {
        match self.require(PARAM_CMD)? {
            "create" => Ok(SessionCommand::Create),
            "update" => Ok(SessionCommand::Update),
            other => Err(TrackerError::UnknownCommand(other.to_string())),
        }
    }

    /// Parses the `type` selector of a JSON read.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MissingParameter`] or
    /// [`TrackerError::UnknownCommand`].
    pub fn read_resource(&self) -> Result<ReadResource, TrackerError> {
        let raw = self.require(PARAM_TYPE)?;
        ReadResource::parse(raw).ok_or_else(|| TrackerError::UnknownCommand(raw.to_string()))
    }

    // ------------------------------------------------------------------------
    // Typed Requests
    // ------------------------------------------------------------------------

    /// Builds a create-session request.
    ///
    /// Network conditions are optional as a group: when none of the numeric
    /// network fields is present the session gets no network reference.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MissingParameter`] without `version`, or
    /// [`TrackerError::InvalidArgument`] for malformed network fields.
    pub fn create_session_request(
        &self,
        owner: Option<String>,
    ) -> Result<CreateSessionRequest, TrackerError> {
        let version = self.require("version")?.to_string();
        let network = if NETWORK_NUMERIC_PARAMS.iter().any(|name| self.get(name).is_some()) {
            Some(NetworkCandidate {
                download_kbps: self.unsigned("download_kbps")?,
                upload_kbps: self.unsigned("upload_kbps")?,
                rtt_ms: self.unsigned("rtt_ms")?,
                packet_loss_pct: self.non_negative_float("packet_loss_pct")?,
                protocol: self.text("protocol"),
            })
        } else {
            None
        };
        Ok(CreateSessionRequest {
            version,
            network,
            metadata: SessionMetadata {
                owner,
                notes: self.text("notes"),
                cmdline: self.text("cmdline"),
                platform: self.text("platform"),
                client_hostname: self.text("client_hostname"),
            },
        })
    }

    /// Builds an update-session request.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MissingParameter`] without `set_id`, or
    /// [`TrackerError::InvalidArgument`] for malformed fields.
    pub fn update_session_request(&self) -> Result<UpdateSessionRequest, TrackerError> {
        let session_id = self.session_id(PARAM_SET_ID)?;
        Ok(UpdateSessionRequest {
            session_id,
            statistics: self.statistics()?,
            iterations: self.unsigned("iterations")?,
            url_count: self.unsigned("url_count")?,
        })
    }

    /// Builds a create-result request.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MissingParameter`] without `set_id`, or
    /// [`TrackerError::InvalidArgument`] for malformed fields.
    pub fn create_result_request(&self) -> Result<CreateResultRequest, TrackerError> {
        let session_id = self.session_id(PARAM_SET_ID)?;
        Ok(CreateResultRequest {
            session_id,
            url: self.text("url"),
            using_spdy: self.get("using_spdy") == Some("true"),
            statistics: self.statistics()?,
        })
    }

    /// Builds a create-summary request.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MissingParameter`] without `set_id`, or
    /// [`TrackerError::InvalidArgument`] for malformed fields.
    pub fn create_summary_request(&self) -> Result<CreateSummaryRequest, TrackerError> {
        let session_id = self.session_id(PARAM_SET_ID)?;
        Ok(CreateSummaryRequest {
            session_id,
            url: self.text("url"),
            statistics: self.statistics()?,
            iterations: self.unsigned("iterations")?,
            total_time_stddev: self.non_negative_float("total_time_stddev")?,
        })
    }

    /// Builds a session search request.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::InvalidArgument`] for malformed id lists.
    pub fn session_search_request(&self) -> Result<SessionSearchRequest, TrackerError> {
        let network_ids =
            self.id_list("networks_filter")?.into_iter().filter_map(NetworkId::from_raw).collect();
        let version_ids =
            self.id_list("version_filter")?.into_iter().filter_map(VersionId::from_raw).collect();
        let session_id = match self.get(PARAM_SET_ID) {
            Some(_) => Some(self.session_id(PARAM_SET_ID)?),
            None => None,
        };
        Ok(SessionSearchRequest {
            network_ids,
            version_ids,
            session_id,
        })
    }

    /// Parses a required session id parameter.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MissingParameter`] or
    /// [`TrackerError::InvalidArgument`].
    pub fn session_id(&self, name: &str) -> Result<SessionId, TrackerError> {
        let raw = self.raw_id(name)?;
        SessionId::from_raw(raw).ok_or_else(|| TrackerError::invalid(name, &raw.to_string()))
    }

    /// Parses a required summary id parameter.
    ///
    /// # Errors
    ///
    /// Returns [`TrackerError::MissingParameter`] or
    /// [`TrackerError::InvalidArgument`].
    pub fn summary_id(&self, name: &str) -> Result<SummaryId, TrackerError> {
        let raw = self.raw_id(name)?;
        SummaryId::from_raw(raw).ok_or_else(|| TrackerError::invalid(name, &raw.to_string()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
