//! Engine client interfaces.
//!
//! These traits are the boundary between the access layer and a storage
//! engine client. A [`StorageConnector`] turns configuration text into a data
//! session ([`DistributedStorage`]) and an admin session ([`StorageAdmin`]).
//! Both sessions must be safe to share across threads.

use std::sync::Arc;

use crate::error::StorageResult;
use crate::key::TableIdentifier;
use crate::metadata::TableMetadata;
use crate::operation::{Put, Scan};
use crate::result::ResultRow;

/// A forward-only cursor over scan results.
pub trait Scanner: Send {
    /// Returns the next row, or `None` once the scan is exhausted.
    fn one(&mut self) -> StorageResult<Option<ResultRow>>;

    /// Releases the cursor. Further calls to `one` return `None`.
    fn close(&mut self);
}

/// A data session.
pub trait DistributedStorage: Send + Sync {
    /// Starts a scan.
    fn scan(&self, scan: &Scan) -> StorageResult<Box<dyn Scanner>>;

    /// Inserts or updates one record.
    fn put(&self, put: &Put) -> StorageResult<()>;

    /// Makes buffered writes durable.
    fn flush(&self) -> StorageResult<()> {
        Ok(())
    }

    /// Closes the session. Closing twice is a no-op.
    fn close(&self);
}

/// An administrative/metadata session.
pub trait StorageAdmin: Send + Sync {
    /// Creates a namespace.
    fn create_namespace(&self, namespace: &str, if_not_exists: bool) -> StorageResult<()>;

    /// Returns true if the namespace exists.
    fn namespace_exists(&self, namespace: &str) -> StorageResult<bool>;

    /// Creates a table.
    fn create_table(
        &self,
        table: &TableIdentifier,
        metadata: TableMetadata,
        if_not_exists: bool,
    ) -> StorageResult<()>;

    /// Returns true if the table exists.
    fn table_exists(&self, table: &TableIdentifier) -> StorageResult<bool> {
        Ok(self.table_metadata(table)?.is_some())
    }

    /// Removes every record of a table.
    fn truncate_table(&self, table: &TableIdentifier) -> StorageResult<()>;

    /// Drops a table.
    fn drop_table(&self, table: &TableIdentifier) -> StorageResult<()>;

    /// Returns the metadata of a table, or `None` if it does not exist.
    fn table_metadata(&self, table: &TableIdentifier) -> StorageResult<Option<TableMetadata>>;

    /// Closes the session. Closing twice is a no-op.
    fn close(&self);
}

/// Opens engine sessions from configuration text.
///
/// The configuration format is owned by the connector; callers pass it
/// through unmodified.
pub trait StorageConnector: Send + Sync {
    /// Checks that the configuration is well formed without connecting.
    fn parse_config(&self, config: &str) -> StorageResult<()>;

    /// Opens a data session.
    fn open_storage(&self, config: &str) -> StorageResult<Arc<dyn DistributedStorage>>;

    /// Opens an admin session.
    fn open_admin(&self, config: &str) -> StorageResult<Arc<dyn StorageAdmin>>;
}
