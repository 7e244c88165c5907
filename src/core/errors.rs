//! ACAL-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, CalError>;

/// Top-level error type for the academy calendar engine.
#[derive(Debug, Error)]
pub enum CalError {
    #[error("[ACAL-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[ACAL-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[ACAL-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[ACAL-1101] invalid grid window: {details}")]
    InvalidGrid { details: String },

    #[error("[ACAL-2001] malformed interval for {event_id}: end {end} is not after start {start}")]
    MalformedInterval {
        event_id: String,
        start: String,
        end: String,
    },

    #[error("[ACAL-2002] invalid event record {event_id}: {details}")]
    InvalidRecord { event_id: String, details: String },

    #[error("[ACAL-2003] duplicate event id {event_id}")]
    DuplicateEvent { event_id: String },

    #[error("[ACAL-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[ACAL-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CalError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "ACAL-1001",
            Self::MissingConfig { .. } => "ACAL-1002",
            Self::ConfigParse { .. } => "ACAL-1003",
            Self::InvalidGrid { .. } => "ACAL-1101",
            Self::MalformedInterval { .. } => "ACAL-2001",
            Self::InvalidRecord { .. } => "ACAL-2002",
            Self::DuplicateEvent { .. } => "ACAL-2003",
            Self::Serialization { .. } => "ACAL-2101",
            Self::Io { .. } => "ACAL-3002",
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for record validation failures.
    #[must_use]
    pub fn invalid_record(event_id: impl Into<String>, details: impl Into<String>) -> Self {
        Self::InvalidRecord {
            event_id: event_id.into(),
            details: details.into(),
        }
    }
}

impl From<serde_json::Error> for CalError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for CalError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
