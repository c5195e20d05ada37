//! Storage error types.

use thiserror::Error;

use crate::value::DataType;

/// Errors reported by a storage engine session.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Engine configuration could not be parsed or is invalid.
    #[error("invalid engine configuration: {0}")]
    Config(String),

    /// The engine could not be reached or opened.
    #[error("cannot connect to storage engine: {0}")]
    Connection(String),

    /// The session was used after `close()`.
    #[error("storage session is closed")]
    SessionClosed,

    /// A write or DDL was issued against a read-only engine.
    #[error("storage engine is read-only")]
    ReadOnly,

    /// Namespace not found.
    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),

    /// Namespace already exists.
    #[error("namespace already exists: {0}")]
    NamespaceExists(String),

    /// Table not found.
    #[error("table not found: {namespace}.{table}")]
    TableNotFound {
        /// Namespace name.
        namespace: String,
        /// Table name.
        table: String,
    },

    /// Table already exists.
    #[error("table already exists: {namespace}.{table}")]
    TableExists {
        /// Namespace name.
        namespace: String,
        /// Table name.
        table: String,
    },

    /// Table metadata is malformed.
    #[error("invalid table metadata: {0}")]
    InvalidMetadata(String),

    /// A scan request does not fit the table schema.
    #[error("invalid scan on {table}: {message}")]
    InvalidScan {
        /// Qualified table name.
        table: String,
        /// What is wrong with the request.
        message: String,
    },

    /// A put request does not fit the table schema.
    #[error("invalid put on {table}: {message}")]
    InvalidPut {
        /// Qualified table name.
        table: String,
        /// What is wrong with the request.
        message: String,
    },

    /// A column was read as a different type than it holds.
    #[error("column {column} is {actual}, not {expected}")]
    TypeMismatch {
        /// Column name.
        column: String,
        /// Requested type.
        expected: DataType,
        /// Stored type.
        actual: DataType,
    },

    /// Column not present in a result.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// I/O error while touching the snapshot file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot file could not be encoded or decoded.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl StorageError {
    /// Creates an invalid-scan error.
    pub fn invalid_scan(table: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::InvalidScan {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid-put error.
    pub fn invalid_put(table: impl Into<String>, message: impl Into<String>) -> Self {
        StorageError::InvalidPut {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Creates a table-not-found error.
    pub fn table_not_found(namespace: impl Into<String>, table: impl Into<String>) -> Self {
        StorageError::TableNotFound {
            namespace: namespace.into(),
            table: table.into(),
        }
    }

    /// Returns true if the error was caused by the configuration rather than
    /// by the engine.
    pub fn is_config(&self) -> bool {
        matches!(self, StorageError::Config(_))
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
