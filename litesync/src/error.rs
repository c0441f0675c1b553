//! Error types for the litesync library.
//!
//! Every failure surfaced to a caller is tagged with the [`Operation`] that
//! was running, so the rendered message always starts with the operation's
//! adapter-facing name (for example `"Run: no such table: t"`). Wrapping a
//! lower-level error embeds its rendered message, which leaves a breadcrumb
//! trail such as `"ImportFromJson: Execute: near \"CREAT\": syntax error"`.

use std::fmt;

use thiserror::Error;

/// Result type alias for operations that may fail with a litesync error.
///
/// # Examples
///
/// ```
/// use litesync::{Error, Result};
///
/// fn example_operation() -> Result<i64> {
///     Ok(1)
/// }
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// The inbound operations of the access layer.
///
/// The `Display` form is the name used as the message prefix in errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Opening a handle, including the upgrade cycle.
    Open,
    /// Closing a handle.
    Close,
    /// Raw multi-statement script execution.
    Execute,
    /// Batch execution of bound statements.
    ExecuteSet,
    /// Single bound statement execution.
    Run,
    /// Read-only query.
    Query,
    /// Explicit transaction start.
    BeginTransaction,
    /// Explicit transaction commit.
    CommitTransaction,
    /// Explicit transaction rollback.
    RollbackTransaction,
    /// Transaction state introspection.
    IsTransactionActive,
    /// Reading the stored schema version.
    GetVersion,
    /// Removing the database file.
    DeleteDatabase,
    /// Listing user tables.
    GetTableList,
    /// Checking a single table.
    IsTableExists,
    /// Creating the sync anchor table.
    CreateSyncTable,
    /// Reading the sync anchor.
    GetSyncDate,
    /// Writing the sync anchor.
    SetSyncDate,
    /// Full or partial JSON export.
    ExportToJson,
    /// Purging exported soft-deleted rows.
    DeleteExportedRows,
    /// JSON import.
    ImportFromJson,
    /// JSON document validation.
    IsJsonValid,
    /// Version-driven schema upgrade.
    Upgrade,
}

impl Operation {
    /// Returns the adapter-facing name of the operation.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Close => "Close",
            Self::Execute => "Execute",
            Self::ExecuteSet => "ExecuteSet",
            Self::Run => "Run",
            Self::Query => "Query",
            Self::BeginTransaction => "BeginTransaction",
            Self::CommitTransaction => "CommitTransaction",
            Self::RollbackTransaction => "RollbackTransaction",
            Self::IsTransactionActive => "IsTransactionActive",
            Self::GetVersion => "GetVersion",
            Self::DeleteDatabase => "DeleteDatabase",
            Self::GetTableList => "GetTableList",
            Self::IsTableExists => "IsTableExists",
            Self::CreateSyncTable => "CreateSyncTable",
            Self::GetSyncDate => "GetSyncDate",
            Self::SetSyncDate => "SetSyncDate",
            Self::ExportToJson => "ExportToJson",
            Self::DeleteExportedRows => "DeleteExportedRows",
            Self::ImportFromJson => "ImportFromJson",
            Self::IsJsonValid => "IsJsonValid",
            Self::Upgrade => "Upgrade",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The main error type for the litesync library.
#[derive(Debug, Error)]
pub enum Error {
    /// The handle could not be opened, or its upgrade cycle failed.
    #[error("Open: {message}")]
    OpenFailed {
        /// Description of the failure.
        message: String,
    },

    /// The handle could not be closed.
    #[error("Close: {message}")]
    CloseFailed {
        /// Description of the failure.
        message: String,
    },

    /// A statement or script failed to execute.
    #[error("{operation}: {message}")]
    ExecutionFailed {
        /// The operation that was running.
        operation: Operation,
        /// Description of the failure, including any rollback failure.
        message: String,
    },

    /// A read-only query failed to prepare, bind or step.
    #[error("Query: {message}")]
    QueryFailed {
        /// Description of the failure.
        message: String,
    },

    /// A transaction state transition was rejected or failed.
    #[error("{operation}: {message}")]
    TransactionFailed {
        /// The operation that was running.
        operation: Operation,
        /// Description of the failure.
        message: String,
    },

    /// Bound values could not be bound to a prepared statement.
    #[error("{operation}: bind failed: {message}")]
    BindFailed {
        /// The operation that was running.
        operation: Operation,
        /// Description of the failure.
        message: String,
    },

    /// Reading the engine catalog failed.
    #[error("{operation}: {message}")]
    IntrospectionFailed {
        /// The operation that was running.
        operation: Operation,
        /// Description of the failure.
        message: String,
    },

    /// An upgrade step failed.
    #[error("Upgrade: {message}")]
    MigrationFailed {
        /// The target version of the failing step.
        version: i32,
        /// Description of the failure.
        message: String,
    },

    /// An export-side operation failed.
    #[error("{operation}: {message}")]
    ExportFailed {
        /// The operation that was running.
        operation: Operation,
        /// Description of the failure.
        message: String,
    },

    /// An import failed after validation succeeded.
    #[error("ImportFromJson: {message}")]
    ImportFailed {
        /// The most specific underlying message.
        message: String,
    },

    /// A JSON document does not have the expected shape.
    #[error("IsJsonValid: {message}")]
    InvalidJson {
        /// Description of the first problem found.
        message: String,
    },

    /// A sync date could not be parsed.
    #[error("SetSyncDate: invalid sync date '{value}': {message}")]
    InvalidSyncDate {
        /// The rejected input.
        value: String,
        /// Why it was rejected.
        message: String,
    },

    /// The database file could not be deleted.
    #[error("DeleteDatabase: {message}")]
    DeleteFailed {
        /// Description of the failure.
        message: String,
    },

    /// A raw engine error that was not attributed to an operation.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON (de)serialization error occurred.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A configuration file could not be parsed.
    #[error("configuration error: {0}")]
    Configuration(#[from] serde_yaml::Error),

    /// A validation error occurred.
    #[error("validation error for '{field}': {message}")]
    Validation {
        /// The field that failed validation.
        field: String,
        /// A description of the validation failure.
        message: String,
    },
}

impl Error {
    /// Returns the operation the error is attributed to, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use litesync::{Error, Operation};
    ///
    /// let err = Error::QueryFailed { message: "no such table: t".into() };
    /// assert_eq!(err.operation(), Some(Operation::Query));
    /// ```
    #[must_use]
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::OpenFailed { .. } => Some(Operation::Open),
            Self::CloseFailed { .. } => Some(Operation::Close),
            Self::QueryFailed { .. } => Some(Operation::Query),
            Self::MigrationFailed { .. } => Some(Operation::Upgrade),
            Self::ImportFailed { .. } => Some(Operation::ImportFromJson),
            Self::InvalidJson { .. } => Some(Operation::IsJsonValid),
            Self::InvalidSyncDate { .. } => Some(Operation::SetSyncDate),
            Self::DeleteFailed { .. } => Some(Operation::DeleteDatabase),
            Self::ExecutionFailed { operation, .. }
            | Self::TransactionFailed { operation, .. }
            | Self::BindFailed { operation, .. }
            | Self::IntrospectionFailed { operation, .. }
            | Self::ExportFailed { operation, .. } => Some(*operation),
            Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Configuration(_)
            | Self::Validation { .. } => None,
        }
    }

    /// Builds the taxonomy variant that `operation` reports failures with.
    pub(crate) fn for_operation(operation: Operation, message: impl Into<String>) -> Self {
        let message = message.into();
        match operation {
            Operation::Open | Operation::Upgrade => Self::OpenFailed { message },
            Operation::Close => Self::CloseFailed { message },
            Operation::Query => Self::QueryFailed { message },
            Operation::ImportFromJson => Self::ImportFailed { message },
            Operation::IsJsonValid => Self::InvalidJson { message },
            Operation::DeleteDatabase => Self::DeleteFailed { message },
            Operation::BeginTransaction
            | Operation::CommitTransaction
            | Operation::RollbackTransaction
            | Operation::IsTransactionActive => Self::TransactionFailed { operation, message },
            Operation::GetTableList | Operation::IsTableExists | Operation::GetVersion => {
                Self::IntrospectionFailed { operation, message }
            }
            Operation::ExportToJson
            | Operation::DeleteExportedRows
            | Operation::CreateSyncTable
            | Operation::GetSyncDate
            | Operation::SetSyncDate => Self::ExportFailed { operation, message },
            Operation::Execute | Operation::ExecuteSet | Operation::Run => {
                Self::ExecutionFailed { operation, message }
            }
        }
    }

    /// The error reported when `operation` runs on a closed handle.
    pub(crate) fn not_open(operation: Operation) -> Self {
        Self::for_operation(operation, "database not opened")
    }

    /// Returns a copy of this error with `note` appended to its message.
    ///
    /// Used when a cleanup step (rollback, foreign key restore) fails after
    /// the original error: the cleanup failure is appended, never substituted.
    #[must_use]
    pub(crate) fn with_note(self, note: &str) -> Self {
        match self {
            Self::OpenFailed { message } => Self::OpenFailed {
                message: format!("{message} {note}"),
            },
            Self::CloseFailed { message } => Self::CloseFailed {
                message: format!("{message} {note}"),
            },
            Self::QueryFailed { message } => Self::QueryFailed {
                message: format!("{message} {note}"),
            },
            Self::ImportFailed { message } => Self::ImportFailed {
                message: format!("{message} {note}"),
            },
            Self::DeleteFailed { message } => Self::DeleteFailed {
                message: format!("{message} {note}"),
            },
            Self::MigrationFailed { version, message } => Self::MigrationFailed {
                version,
                message: format!("{message} {note}"),
            },
            Self::ExecutionFailed { operation, message } => Self::ExecutionFailed {
                operation,
                message: format!("{message} {note}"),
            },
            Self::TransactionFailed { operation, message } => Self::TransactionFailed {
                operation,
                message: format!("{message} {note}"),
            },
            Self::BindFailed { operation, message } => Self::BindFailed {
                operation,
                message: format!("{message} {note}"),
            },
            Self::IntrospectionFailed { operation, message } => Self::IntrospectionFailed {
                operation,
                message: format!("{message} {note}"),
            },
            Self::ExportFailed { operation, message } => Self::ExportFailed {
                operation,
                message: format!("{message} {note}"),
            },
            other => Self::ExecutionFailed {
                operation: other.operation().unwrap_or(Operation::Execute),
                message: format!("{other} {note}"),
            },
        }
    }

    /// Check if the error came from binding parameters.
    #[must_use]
    pub fn is_bind_failure(&self) -> bool {
        matches!(self, Self::BindFailed { .. })
    }

    /// Check if the error is a JSON shape error.
    #[must_use]
    pub fn is_invalid_json(&self) -> bool {
        matches!(self, Self::InvalidJson { .. })
    }
}
