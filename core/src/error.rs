//! Error types for the survey API client.
//!
//! # Design
//! Construction-time failures (`DefinitionNotFound`, `DefinitionParse`, `Io`)
//! are fatal for the client being built. Everything else is local to one
//! invocation and never poisons the other operations of the same client.
//! Transport failures carry the transport's own error as their source,
//! unmodified.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned while loading definitions, resolving calls, and
/// dispatching requests.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The version file does not exist at its resolved path.
    #[error("definition not found: {}", path.display())]
    DefinitionNotFound { path: PathBuf },

    /// The version file exists but does not parse to a call mapping.
    #[error("malformed definition {}: {message}", path.display())]
    DefinitionParse { path: PathBuf, message: String },

    /// The version file or directory could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No operation with this name exists in the loaded definition.
    #[error("unknown call: {name}")]
    UnknownCall { name: String },

    /// `adhoc_redcap_options` was supplied but is not a mapping.
    #[error("{call}: adhoc_redcap_options must be a mapping")]
    InvalidAdhocOptions { call: String },

    /// A payload was supplied to a read-only call under `ReadOnlyPolicy::Reject`.
    #[error("{call} is read-only and does not accept a data payload")]
    ReadOnlyViolation { call: String },

    /// The HTTP round-trip failed before a response was received.
    #[error("transport failure")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// JSON text could not be parsed or rendered.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ApiError {
    /// Returns `true` for errors raised while building a client, as opposed
    /// to errors local to a single invocation.
    pub fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::DefinitionNotFound { .. } | Self::DefinitionParse { .. } | Self::Io { .. }
        )
    }
}
