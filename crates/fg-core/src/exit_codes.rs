//! Exit codes for the `fg` CLI.
//!
//! Exit code ranges:
//! - 0-1: Operational outcomes
//! - 10-19: Input errors (fixable by correcting the model, query or config)
//! - 20-29: Environment errors

use crate::error::{Error, ErrorCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Command succeeded.
    Ok = 0,

    /// `fg check` found warnings (for example unnormalised marginals).
    Warnings = 1,

    /// Model document or construction error.
    ModelError = 10,

    /// Invalid query or evidence.
    QueryError = 11,

    /// Evidence has zero probability under the model.
    DegenerateError = 12,

    /// Configuration error.
    ConfigError = 13,

    /// I/O error.
    IoError = 20,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Name used in JSON output.
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Ok => "OK",
            ExitCode::Warnings => "OK_WARNINGS",
            ExitCode::ModelError => "ERR_MODEL",
            ExitCode::QueryError => "ERR_QUERY",
            ExitCode::DegenerateError => "ERR_DEGENERATE",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::IoError => "ERR_IO",
        }
    }
}

impl From<&Error> for ExitCode {
    fn from(err: &Error) -> Self {
        match err {
            Error::DegenerateFactor { .. } => ExitCode::DegenerateError,
            // A scope error out of a command means the evidence named an
            // outcome the variable does not have.
            Error::Scope(_) => ExitCode::QueryError,
            _ => match err.category() {
                ErrorCategory::Model | ErrorCategory::Factor => ExitCode::ModelError,
                ErrorCategory::Query => ExitCode::QueryError,
                ErrorCategory::Config => ExitCode::ConfigError,
                ErrorCategory::Io => match err {
                    Error::Json(_) => ExitCode::ModelError,
                    _ => ExitCode::IoError,
                },
            },
        }
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
