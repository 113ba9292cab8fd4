//! Error types for factor graph inference.
//!
//! Every failure is scoped to a single call: a factor operation, a model
//! construction, or one inference query. Nothing here is fatal to the
//! process and no operation leaves a model or factor partially modified.
//!
//! Errors carry:
//! - Stable error codes for machine parsing
//! - Category classification for error grouping
//! - Recoverability hints for callers deciding whether to retry with
//!   corrected inputs

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for inference operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Variable, factor, or model construction errors.
    Model,
    /// Factor algebra errors (scope mismatches, degenerate tables).
    Factor,
    /// Query validation and inference errors.
    Query,
    /// Configuration errors.
    Config,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Factor => write!(f, "factor"),
            ErrorCategory::Query => write!(f, "query"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for factor graph inference.
#[derive(Error, Debug)]
pub enum Error {
    // Model errors (10-19)
    #[error("invalid random variable {id}: {reason}")]
    InvalidVariable { id: String, reason: String },

    #[error("invalid factor {id}: {reason}")]
    InvalidFactor { id: String, reason: String },

    #[error("model {model} is inconsistent: {reason}")]
    ModelConsistency { model: String, reason: String },

    // Factor algebra errors (20-29)
    #[error("scope error: {0}")]
    Scope(String),

    #[error("degenerate factor {factor}: normalization denominator is {denominator}")]
    DegenerateFactor { factor: String, denominator: f64 },

    // Query errors (30-39)
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    // Config errors (60-64)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    // I/O errors (65-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// Error codes are stable and grouped by category:
    /// - 10-19: Model construction errors
    /// - 20-29: Factor algebra errors
    /// - 30-39: Query errors
    /// - 60-64: Configuration errors
    /// - 65-69: I/O errors
    pub fn code(&self) -> u32 {
        match self {
            Error::InvalidVariable { .. } => 10,
            Error::InvalidFactor { .. } => 11,
            Error::ModelConsistency { .. } => 12,
            Error::Scope(_) => 20,
            Error::DegenerateFactor { .. } => 21,
            Error::InvalidQuery(_) => 30,
            Error::Config(_) => 60,
            Error::Toml(_) => 61,
            Error::Io(_) => 65,
            Error::Json(_) => 66,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidVariable { .. }
            | Error::InvalidFactor { .. }
            | Error::ModelConsistency { .. } => ErrorCategory::Model,

            Error::Scope(_) | Error::DegenerateFactor { .. } => ErrorCategory::Factor,

            Error::InvalidQuery(_) => ErrorCategory::Query,

            Error::Config(_) | Error::Toml(_) => ErrorCategory::Config,

            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Returns whether this error may go away if the caller retries.
    ///
    /// Logical errors are deterministic: the same inputs fail the same way,
    /// so only corrected inputs help. Plain I/O failures can be transient.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::Io(_))
    }

    /// Short human-facing fix suggestion.
    pub fn remediation(&self) -> &'static str {
        match self {
            Error::InvalidVariable { .. } => "give every variable a non-empty, duplicate-free domain",
            Error::InvalidFactor { .. } => "supply a finite, non-negative value for every assignment",
            Error::ModelConsistency { .. } => "add the referenced variable to the model's nodes",
            Error::Scope(_) => "check that assignments name exactly the factor's scope",
            Error::DegenerateFactor { .. } => "the evidence has zero support; revise the evidence",
            Error::InvalidQuery(_) => "query at least one variable that is not observed",
            Error::Config(_) | Error::Toml(_) => "fix the configuration file or remove it",
            Error::Io(_) | Error::Json(_) => "check the input file path and format",
        }
    }

    pub(crate) fn scope(msg: impl Into<String>) -> Self {
        Error::Scope(msg.into())
    }

    pub(crate) fn inconsistent(model: &str, reason: impl Into<String>) -> Self {
        Error::ModelConsistency {
            model: model.to_string(),
            reason: reason.into(),
        }
    }
}

/// Machine-readable rendering of an [`Error`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub code: u32,
    pub category: ErrorCategory,
    pub message: String,
    pub recoverable: bool,
    pub remediation: &'static str,
}

impl From<&Error> for ErrorReport {
    fn from(err: &Error) -> Self {
        ErrorReport {
            code: err.code(),
            category: err.category(),
            message: err.to_string(),
            recoverable: err.is_recoverable(),
            remediation: err.remediation(),
        }
    }
}
