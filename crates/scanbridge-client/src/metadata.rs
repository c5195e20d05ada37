//! Table metadata access.
//!
//! Every call fetches the table metadata through the admin session; nothing
//! is cached.

use std::collections::BTreeSet;

use scanbridge_storage::{ClusteringOrder, ColumnDef, DataType, TableIdentifier, TableMetadata};
use tracing::debug;

use crate::error::{BridgeError, BridgeResult};
use crate::registry::ConnectionRegistry;

/// Key layout of one table, as used by the planning hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    /// Partition key names in declaration order.
    pub partition_keys: Vec<String>,
    /// Clustering key names with their orders, in declaration order.
    pub clustering_keys: Vec<(String, ClusteringOrder)>,
    /// Secondary index names.
    pub secondary_indexes: BTreeSet<String>,
    /// Declared columns.
    pub columns: Vec<ColumnDef>,
}

impl ColumnMetadata {
    /// Returns true if `column` is a partition key.
    pub fn is_partition_key(&self, column: &str) -> bool {
        self.partition_keys.iter().any(|k| k == column)
    }

    /// Returns the position of `column` among the clustering keys.
    pub fn clustering_position(&self, column: &str) -> Option<usize> {
        self.clustering_keys.iter().position(|(k, _)| k == column)
    }

    /// Returns true if `column` is a secondary index.
    pub fn is_secondary_index(&self, column: &str) -> bool {
        self.secondary_indexes.contains(column)
    }

    /// Returns the type of a declared column.
    pub fn column_type(&self, column: &str) -> Option<DataType> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.data_type)
    }
}

impl From<&TableMetadata> for ColumnMetadata {
    fn from(metadata: &TableMetadata) -> Self {
        Self {
            partition_keys: metadata.partition_key_names().to_vec(),
            clustering_keys: clustering_pairs(metadata),
            secondary_indexes: metadata.secondary_index_names().clone(),
            columns: metadata.columns().to_vec(),
        }
    }
}

fn clustering_pairs(metadata: &TableMetadata) -> Vec<(String, ClusteringOrder)> {
    metadata
        .clustering_key_names()
        .iter()
        .map(|name| {
            let order = metadata
                .clustering_order(name)
                .unwrap_or(ClusteringOrder::Asc);
            (name.clone(), order)
        })
        .collect()
}

/// Metadata queries against the registry's live connection.
#[derive(Debug, Clone, Copy)]
pub struct MetadataService<'a> {
    registry: &'a ConnectionRegistry,
}

impl<'a> MetadataService<'a> {
    /// Creates a service over `registry`.
    pub fn new(registry: &'a ConnectionRegistry) -> Self {
        Self { registry }
    }

    /// Fetches the table metadata.
    pub fn table_metadata(&self, table: &TableIdentifier) -> BridgeResult<TableMetadata> {
        let connection = self.registry.connection()?;
        debug!("Fetching metadata of {}", table);
        connection
            .admin()
            .table_metadata(table)?
            .ok_or_else(|| BridgeError::table_not_found(table.namespace(), table.table()))
    }

    /// Returns the partition key names in declaration order.
    pub fn partition_key_names(&self, table: &TableIdentifier) -> BridgeResult<Vec<String>> {
        Ok(self.table_metadata(table)?.partition_key_names().to_vec())
    }

    /// Returns the clustering key names in declaration order.
    pub fn clustering_key_names(&self, table: &TableIdentifier) -> BridgeResult<Vec<String>> {
        Ok(self.table_metadata(table)?.clustering_key_names().to_vec())
    }

    /// Returns the secondary index names.
    pub fn secondary_index_names(&self, table: &TableIdentifier) -> BridgeResult<BTreeSet<String>> {
        Ok(self.table_metadata(table)?.secondary_index_names().clone())
    }

    /// Returns the clustering order of `column`.
    ///
    /// Fails with [`BridgeError::UnknownColumn`] if `column` is not a
    /// clustering key of the table.
    pub fn clustering_order(
        &self,
        table: &TableIdentifier,
        column: &str,
    ) -> BridgeResult<ClusteringOrder> {
        let metadata = self.table_metadata(table)?;
        if !metadata.clustering_key_names().iter().any(|k| k == column) {
            return Err(BridgeError::UnknownColumn {
                namespace: table.namespace().to_string(),
                table: table.table().to_string(),
                column: column.to_string(),
            });
        }
        Ok(metadata
            .clustering_order(column)
            .unwrap_or(ClusteringOrder::Asc))
    }

    /// Returns the clustering key names paired with their orders.
    pub fn clustering_keys_and_orders(
        &self,
        table: &TableIdentifier,
    ) -> BridgeResult<Vec<(String, ClusteringOrder)>> {
        Ok(clustering_pairs(&self.table_metadata(table)?))
    }

    /// Returns the key layout of the table in one fetch.
    pub fn column_metadata(&self, table: &TableIdentifier) -> BridgeResult<ColumnMetadata> {
        Ok(ColumnMetadata::from(&self.table_metadata(table)?))
    }
}
