//! Errors of the `litesync` binary and their exit codes.
//!
//! Library errors pass through unchanged, so the printed message keeps the
//! `"<Operation>: <detail>"` form of the access layer.

use litesync::Error as LibError;
use std::fmt;

/// Failure of one CLI invocation.
#[derive(Debug)]
pub enum CliError {
    /// An access-layer error.
    Library(LibError),

    /// Bad arguments or unreadable input files.
    InvalidArguments(String),

    /// Writing output failed.
    Io(std::io::Error),

    /// Neither `--database` nor `LITESYNC_DATABASE` was given.
    NoDatabase,

    /// The data directory could not be resolved.
    Config(String),

    /// The command ran but the answer is "no" (e.g. a missing table).
    SemanticFailure(String),
}

impl CliError {
    /// Process exit status for this error.
    ///
    /// | code | meaning |
    /// |------|---------|
    /// | 1 | negative answer or invalid JSON document |
    /// | 3 | no database named |
    /// | 4 | invalid arguments |
    /// | 5 | I/O failure |
    /// | 6 | database operation failed |
    /// | 7 | configuration or upgrade file problem |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::SemanticFailure(_) | Self::Library(LibError::InvalidJson { .. }) => 1,
            Self::NoDatabase => 3,
            Self::InvalidArguments(_) => 4,
            Self::Io(_) => 5,
            Self::Config(_)
            | Self::Library(LibError::Configuration(_) | LibError::Validation { .. }) => 7,
            Self::Library(_) => 6,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Library(e) => write!(f, "{e}"),
            Self::InvalidArguments(msg) => write!(f, "Invalid arguments: {msg}"),
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::NoDatabase => f.write_str("No database given (use --database or LITESYNC_DATABASE)"),
            Self::Config(msg) => write!(f, "Configuration error: {msg}"),
            Self::SemanticFailure(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Library(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LibError> for CliError {
    fn from(e: LibError) -> Self {
        Self::Library(e)
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::Library(LibError::Json(e))
    }
}
