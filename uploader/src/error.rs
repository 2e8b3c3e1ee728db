//! Error types for the hevyload upload pipeline.
//!
//! Each stage has its own error type:
//!
//! - [`TransformError`] - per-field cast and bounds failures
//! - [`SchemaError`] - post-mapping payload checks
//! - [`ClientError`] - outbound HTTP failures, classified transient or fatal
//! - [`ConfigError`] - configuration loading and validation
//! - [`SourceError`] - reading the tabular input
//! - [`ReportError`] - writing the results log
//! - [`RunError`] - top-level errors surfaced by the CLI
//!
//! Row-level errors ([`TransformError`], [`SchemaError`], [`ClientError`])
//! never abort a batch; they are folded into a
//! [`RequestOutcome`](crate::models::RequestOutcome) for the row.

use std::fmt;

use thiserror::Error;

// =============================================================================
// Transformation Errors
// =============================================================================

/// Which configured bound a value violated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    Min(f64),
    Max(f64),
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Min(v) => write!(f, "min={}", v),
            Bound::Max(v) => write!(f, "max={}", v),
        }
    }
}

/// Errors raised while applying a column's transform rules.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TransformError {
    /// The value could not be parsed as a number for a numeric cast.
    #[error("cannot cast '{value}' to {target}")]
    Cast { value: String, target: &'static str },

    /// The (cast) numeric value fell outside the configured bounds.
    #[error("value {value:?} violates bound {bound}")]
    Bounds { value: f64, bound: Bound },
}

impl TransformError {
    /// Attach the source column to the error for row-level reporting.
    pub fn in_column(self, column: &str) -> FieldError {
        FieldError {
            column: column.to_string(),
            source: self,
        }
    }
}

/// A [`TransformError`] tagged with the column it came from.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("column '{column}': {source}")]
pub struct FieldError {
    pub column: String,
    #[source]
    pub source: TransformError,
}

// =============================================================================
// Schema Errors
// =============================================================================

/// The first schema rule a mapped payload violated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct SchemaError(pub String);

// =============================================================================
// Client Errors
// =============================================================================

/// Errors from a single outbound API call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, timeout or body-read failure.
    #[error("network error: {0}")]
    Network(String),

    /// Status 429, 500, 502, 503 or 504.
    #[error("transient error {status}: {body}")]
    Transient { status: u16, body: String },

    /// Any other non-2xx status.
    #[error("API error {status}: {body}")]
    Fatal { status: u16, body: String },

    /// The request could not be built (bad URL, bad header).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Whether the retry driver may attempt the call again.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Transient { .. })
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_builder() {
            ClientError::InvalidRequest(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The YAML could not be parsed.
    #[error("Failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A field holds a value the uploader cannot use.
    #[error("Invalid config value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// An environment variable named by the config is not set.
    #[error("Environment variable {0} is not set")]
    MissingEnv(String),
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

// =============================================================================
// Source Errors
// =============================================================================

/// Errors while reading tabular input.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed CSV.
    #[error("Invalid CSV format: {0}")]
    Csv(#[from] csv::Error),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// The configured header row does not exist.
    #[error("Header row {0} is past the end of the file")]
    NoHeaders(usize),

    /// CSV delimiters must be a single ASCII character.
    #[error("Delimiter {0:?} is not a single ASCII character")]
    InvalidDelimiter(char),
}

// =============================================================================
// Report Errors
// =============================================================================

/// Errors while writing the results log.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write results: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to write results: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize result: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Run Errors (top-level)
// =============================================================================

/// Top-level errors for a whole run. Row-level failures never reach here.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for source reading.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for the CLI.
pub type RunResult<T> = Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_message_cites_value_and_bound() {
        let err = TransformError::Bounds {
            value: 15.0,
            bound: Bound::Max(10.0),
        };
        let msg = err.to_string();
        assert!(msg.contains("15.0"));
        assert!(msg.contains("max=10"));
    }

    #[test]
    fn test_transient_classification() {
        assert!(ClientError::Network("reset".into()).is_transient());
        assert!(ClientError::Transient { status: 503, body: String::new() }.is_transient());
        assert!(!ClientError::Fatal { status: 400, body: String::new() }.is_transient());
        assert!(!ClientError::InvalidRequest("bad".into()).is_transient());
    }

    #[test]
    fn test_error_conversion_chain() {
        let source_err = SourceError::EmptyFile;
        let run_err: RunError = source_err.into();
        assert!(run_err.to_string().contains("empty"));

        let cfg_err = ConfigError::invalid("api.base_url", "must not be empty");
        let run_err: RunError = cfg_err.into();
        assert!(run_err.to_string().contains("api.base_url"));
    }

    #[test]
    fn test_field_error_names_column() {
        let err = TransformError::Cast {
            value: "abc".into(),
            target: "float",
        }
        .in_column("Weight");
        let msg = err.to_string();
        assert!(msg.contains("Weight"));
        assert!(msg.contains("abc"));
    }
}
