//! Error types for tablekeeper.
//!
//! Two layers:
//! - `WarehouseError` is what a warehouse adapter returns. It carries a
//!   coarse `WarehouseErrorKind` so callers can tell "table exists" from
//!   "access denied" without parsing messages.
//! - `TableKeeperError` is what the operations return. Dataset-level
//!   variants abort a run; `TableOperation` is recorded per table.

use std::fmt;
use std::path::PathBuf;

/// Classification of a failure reported by the remote warehouse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarehouseErrorKind {
    NotFound,
    AlreadyExists,
    AccessDenied,
    Credentials,
    RateLimited,
    InvalidRequest,
    Connection,
    Other,
}

impl WarehouseErrorKind {
    /// Classify an HTTP status code returned by the warehouse API.
    pub fn from_status(code: i64) -> Self {
        match code {
            400 => WarehouseErrorKind::InvalidRequest,
            401 => WarehouseErrorKind::Credentials,
            403 => WarehouseErrorKind::AccessDenied,
            404 => WarehouseErrorKind::NotFound,
            409 => WarehouseErrorKind::AlreadyExists,
            429 => WarehouseErrorKind::RateLimited,
            500..=599 => WarehouseErrorKind::Connection,
            _ => WarehouseErrorKind::Other,
        }
    }
}

impl fmt::Display for WarehouseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WarehouseErrorKind::NotFound => "not found",
            WarehouseErrorKind::AlreadyExists => "already exists",
            WarehouseErrorKind::AccessDenied => "access denied",
            WarehouseErrorKind::Credentials => "invalid credentials",
            WarehouseErrorKind::RateLimited => "rate limited",
            WarehouseErrorKind::InvalidRequest => "invalid request",
            WarehouseErrorKind::Connection => "connection failure",
            WarehouseErrorKind::Other => "remote error",
        };
        f.write_str(name)
    }
}

/// A failure reported by a warehouse adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct WarehouseError {
    pub kind: WarehouseErrorKind,
    pub message: String,
}

impl WarehouseError {
    pub fn new(kind: WarehouseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(WarehouseErrorKind::NotFound, message)
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(WarehouseErrorKind::AlreadyExists, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == WarehouseErrorKind::NotFound
    }
}

/// The per-table operation a `TableOperation` error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableOperationKind {
    Create,
    UpdateExpiration,
}

impl fmt::Display for TableOperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableOperationKind::Create => f.write_str("create"),
            TableOperationKind::UpdateExpiration => f.write_str("update expiration"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TableKeeperError {
    /// A required input is missing, e.g. no credential source at all.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to load credentials from {}: {reason}", path.display())]
    CredentialsLoad { path: PathBuf, reason: String },

    #[error("dataset '{0}' not found")]
    DatasetNotFound(String),

    #[error("{operation} failed for table '{table}': {source}")]
    TableOperation {
        table: String,
        operation: TableOperationKind,
        #[source]
        source: WarehouseError,
    },

    #[error("invalid table name pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Warehouse(#[from] WarehouseError),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

pub type Result<T, E = TableKeeperError> = std::result::Result<T, E>;

impl TableKeeperError {
    pub fn table_operation(
        table: impl Into<String>,
        operation: TableOperationKind,
        source: WarehouseError,
    ) -> Self {
        TableKeeperError::TableOperation {
            table: table.into(),
            operation,
            source,
        }
    }

    /// Remote failure kind behind a per-table error, if any.
    pub fn warehouse_kind(&self) -> Option<WarehouseErrorKind> {
        match self {
            TableKeeperError::TableOperation { source, .. } => Some(source.kind),
            TableKeeperError::Warehouse(err) => Some(err.kind),
            _ => None,
        }
    }
}
