//! Error types for the access layer.

use std::path::PathBuf;

use scanbridge_storage::StorageError;
use thiserror::Error;

/// Access layer error type.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration could not be read or parsed.
    #[error("invalid configuration {}: {message}", path.display())]
    Config {
        /// Configuration file path (`<inline>` for text given directly).
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// The engine could not be reached.
    #[error("connection failed: {message}")]
    Connection {
        /// What went wrong.
        message: String,
        /// Underlying engine error.
        #[source]
        source: StorageError,
    },

    /// The registry has no live connection.
    #[error("connection is not initialized")]
    NotInitialized,

    /// The table does not exist.
    #[error("table not found: {namespace}.{table}")]
    TableNotFound {
        /// Namespace name.
        namespace: String,
        /// Table name.
        table: String,
    },

    /// The column is not a clustering key of the table.
    #[error("column {column} is not a clustering key of {namespace}.{table}")]
    UnknownColumn {
        /// Namespace name.
        namespace: String,
        /// Table name.
        table: String,
        /// Column name.
        column: String,
    },

    /// The engine rejected or failed a request.
    #[error("engine query failed: {0}")]
    EngineQuery(#[from] StorageError),

    /// An option is not valid in its context.
    #[error("invalid option \"{option}\" ({hint})")]
    InvalidOption {
        /// Option name.
        option: String,
        /// Valid options of the context.
        hint: String,
    },

    /// A required option is missing.
    #[error("missing required option \"{option}\" for {context}")]
    MissingOption {
        /// Option name.
        option: String,
        /// Where it was expected.
        context: String,
    },
}

impl BridgeError {
    /// Creates a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        BridgeError::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a table-not-found error.
    pub fn table_not_found(namespace: impl Into<String>, table: impl Into<String>) -> Self {
        BridgeError::TableNotFound {
            namespace: namespace.into(),
            table: table.into(),
        }
    }

    /// Returns true if the caller can keep using the connection after this
    /// error.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            BridgeError::TableNotFound { .. }
                | BridgeError::UnknownColumn { .. }
                | BridgeError::EngineQuery(_)
        )
    }
}

/// Result type for access layer operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::table_not_found("ns", "missing");
        assert_eq!(err.to_string(), "table not found: ns.missing");

        let err = BridgeError::config("/etc/x.toml", "file not found");
        assert_eq!(err.to_string(), "invalid configuration /etc/x.toml: file not found");

        let err = BridgeError::UnknownColumn {
            namespace: "ns".to_string(),
            table: "t".to_string(),
            column: "c".to_string(),
        };
        assert_eq!(err.to_string(), "column c is not a clustering key of ns.t");
    }

    #[test]
    fn test_engine_error_conversion() {
        let err: BridgeError = StorageError::SessionClosed.into();
        assert!(matches!(err, BridgeError::EngineQuery(StorageError::SessionClosed)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_recoverable() {
        assert!(BridgeError::table_not_found("a", "b").is_recoverable());
        assert!(!BridgeError::NotInitialized.is_recoverable());
        assert!(!BridgeError::config("x", "y").is_recoverable());
        assert!(!BridgeError::Connection {
            message: "down".to_string(),
            source: StorageError::Connection("down".to_string()),
        }
        .is_recoverable());
    }
}
