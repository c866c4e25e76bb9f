// src/error.rs
//! Application error types with structured error handling.
//!
//! Failures fall into four families: the transport could not complete a
//! round trip, a payload did not decode, the fetched records are
//! inconsistent with each other, or the caller's configuration is unusable.
//! Every layer returns these upward; nothing is logged-and-skipped.

use crate::model::InlineDecodeError;
use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Request to {url} failed with status {status}: {body}")]
    Transport {
        url: String,
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to decode {context}: {source}\nBody: {body}")]
    Deserialization {
        context: String,
        #[source]
        source: serde_json::Error,
        body: String,
    },

    #[error("Failed to decode rich text of block {block_id}: {source}")]
    InlineDecode {
        block_id: String,
        #[source]
        source: InlineDecodeError,
    },

    #[error("Failed to decode {block_type} format of block {block_id}: {source}")]
    FormatDecode {
        block_id: String,
        block_type: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {context}: {source}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Block '{id}' is referenced but missing from the record map")]
    MissingBlock { id: String },

    #[error("Root block '{id}' is missing from the record map")]
    MissingRoot { id: String },

    #[error("Root block '{id}' has been deleted")]
    DeletedBlock { id: String },

    #[error("Cycle detected at block '{id}' (path: {})", .path.join(" -> "))]
    CycleDetected { id: String, path: Vec<String> },

    #[error("{table} record '{id}' is referenced but missing from the record map")]
    MissingRecord { table: String, id: String },

    #[error("Block '{id}' is nested deeper than {limit} levels")]
    DepthExceeded { id: String, limit: usize },

    #[error("Requested {requested} records but the service returned {returned}")]
    RecordCountMismatch { requested: usize, returned: usize },

    #[error("Record '{id}' is not readable (role: {role})")]
    RecordUnavailable { id: String, role: String },

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),
}

impl AppError {
    /// Whether the transport may try the same request again.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkFailure(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            AppError::Transport { status, .. } => {
                status.as_u16() == 429 || status.is_server_error()
            }
            _ => false,
        }
    }

    /// Whether the error means the fetched records do not form a complete tree.
    pub fn is_consistency_error(&self) -> bool {
        matches!(
            self,
            AppError::MissingBlock { .. }
                | AppError::MissingRoot { .. }
                | AppError::DeletedBlock { .. }
                | AppError::CycleDetected { .. }
                | AppError::MissingRecord { .. }
                | AppError::DepthExceeded { .. }
        )
    }
}

/// Result type alias for convenience
pub type Result<T, E = AppError> = std::result::Result<T, E>;
