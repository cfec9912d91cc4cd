// perftracker-core/src/runtime/error.rs
// ============================================================================
// Module: PerfTracker Runtime Errors
// Description: Error taxonomy for ingest and read operations.
// Purpose: Separate user-visible failures from fatal request failures.
// Dependencies: crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! Missing parameters, unresolved ids, and unknown command selectors are
//! reported back to the caller as-is. Malformed numbers and store failures are
//! fatal to the request: the transport logs the detail and returns a generic
//! failure.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Record kinds named in [`TrackerError::NotFound`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    /// Test session.
    Session,
    /// Test summary.
    Summary,
}

impl RecordKind {
    /// Returns a stable label for messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::Summary => "summary",
        }
    }
}

/// Errors returned by PerfTracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A required identifying parameter is absent.
    #[error("bad request, no {0} param")]
    MissingParameter(String),
    /// A referenced id does not resolve to a stored record.
    #[error("could not find {} id: {id}", .kind.as_str())]
    NotFound {
        /// Kind of record looked up.
        kind: RecordKind,
        /// Raw id that failed to resolve.
        id: u64,
    },
    /// A parameter is present but does not parse as its expected type.
    #[error("invalid value for {name}: '{value}'")]
    InvalidArgument {
        /// Parameter name.
        name: String,
        /// Raw parameter value.
        value: String,
    },
    /// The operation selector is not recognized.
    #[error("bad request, unknown command: {0}")]
    UnknownCommand(String),
    /// The record store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// A response could not be serialized.
    #[error("response serialization failed: {0}")]
    Serialization(String),
}

impl TrackerError {
    /// Returns true when the error is reported to the caller verbatim.
    #[must_use]
    pub const fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::MissingParameter(_) | Self::NotFound { .. } | Self::UnknownCommand(_)
        )
    }

    /// Returns a stable label for logs and audit events.
    #[must_use]
    pub const fn kind_label(&self) -> &'static str {
        match self {
            Self::MissingParameter(_) => "missing_parameter",
            Self::NotFound { .. } => "not_found",
            Self::InvalidArgument { .. } => "invalid_argument",
            Self::UnknownCommand(_) => "unknown_command",
            Self::Store(_) => "store_error",
            Self::Serialization(_) => "serialization_error",
        }
    }

    /// Builds an [`TrackerError::InvalidArgument`] for `name` and `value`.
    pub(crate) fn invalid(name: &str, value: &str) -> Self {
        Self::InvalidArgument {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}
