//! Error types for configuration, plan extraction and event emission.
//!
//! Each type maps to one decision point: `ConfigError` fails context
//! construction, `ExtractionError` aborts lineage for a single run, and
//! `LineageHttpError` is absorbed (logged) by the context's `emit`.

use std::fmt;

/// The run configuration could not be turned into a usable context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The backend URI built from the host could not be parsed
    InvalidUri { uri: String, reason: String },
    /// The emitter's worker pool or HTTP client could not be created
    ClientInit(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidUri { uri, reason } => {
                write!(f, "Invalid lineage backend URI '{}': {}", uri, reason)
            }
            ConfigError::ClientInit(reason) => write!(f, "Failed to create lineage client: {}", reason),
        }
    }
}

impl std::error::Error for ConfigError {}

/// The engine could not answer a catalog metadata lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisError {
    pub message: String,
}

impl AnalysisError {
    pub fn new(message: impl Into<String>) -> Self {
        AnalysisError {
            message: message.into(),
        }
    }
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnalysisError: {}", self.message)
    }
}

impl std::error::Error for AnalysisError {}

/// A recognizer matched a plan node but could not produce a trustworthy dataset identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Neither the catalog location nor the qualified table name resolved
    LocationUnresolved {
        table: String,
        primary: AnalysisError,
        fallback: String,
    },
    /// A path recorded in the plan is not a usable URI
    InvalidLocation { location: String, reason: String },
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionError::LocationUnresolved {
                table,
                primary,
                fallback,
            } => write!(
                f,
                "Could not resolve location of table '{}' ({}; fallback: {})",
                table, primary, fallback
            ),
            ExtractionError::InvalidLocation { location, reason } => {
                write!(f, "Invalid location '{}': {}", location, reason)
            }
        }
    }
}

impl std::error::Error for ExtractionError {}

/// A lineage event could not be delivered.
///
/// Backend rejections (non-2xx) are not errors; they come back as an
/// unsuccessful `ResponseMessage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineageHttpError {
    /// Connection refused, DNS failure, timeout, bad scheme...
    Transport(String),
    /// The event could not be converted to JSON
    Serialization(String),
    /// The client was closed before the post was submitted
    Closed,
}

impl fmt::Display for LineageHttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineageHttpError::Transport(e) => write!(f, "Lineage transport error: {}", e),
            LineageHttpError::Serialization(e) => write!(f, "Lineage serialization error: {}", e),
            LineageHttpError::Closed => write!(f, "Lineage client is closed"),
        }
    }
}

impl std::error::Error for LineageHttpError {}

impl From<serde_json::Error> for LineageHttpError {
    fn from(e: serde_json::Error) -> Self {
        LineageHttpError::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for LineageHttpError {
    fn from(e: reqwest::Error) -> Self {
        LineageHttpError::Transport(e.to_string())
    }
}
