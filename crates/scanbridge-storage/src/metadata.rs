//! Table metadata.
//!
//! The engine describes each table by its ordered columns, its partition key,
//! its clustering key (with a sort order per column) and its secondary
//! indexes.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};
use crate::value::DataType;

/// Sort order of a clustering key column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClusteringOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl ClusteringOrder {
    /// Returns the opposite order.
    pub const fn reverse(self) -> Self {
        match self {
            ClusteringOrder::Asc => ClusteringOrder::Desc,
            ClusteringOrder::Desc => ClusteringOrder::Asc,
        }
    }

    /// Returns the stable ordinal (`ASC` = 0, `DESC` = 1).
    pub const fn ordinal(self) -> u8 {
        match self {
            ClusteringOrder::Asc => 0,
            ClusteringOrder::Desc => 1,
        }
    }
}

impl fmt::Display for ClusteringOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusteringOrder::Asc => write!(f, "ASC"),
            ClusteringOrder::Desc => write!(f, "DESC"),
        }
    }
}

/// A declared column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Column type.
    pub data_type: DataType,
}

/// Schema of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    columns: Vec<ColumnDef>,
    partition_key_names: Vec<String>,
    clustering_key_names: Vec<String>,
    clustering_orders: HashMap<String, ClusteringOrder>,
    secondary_index_names: BTreeSet<String>,
}

impl TableMetadata {
    /// Returns a builder.
    pub fn builder() -> TableMetadataBuilder {
        TableMetadataBuilder::default()
    }

    /// Returns the declared columns in order.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Returns the declared column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Returns the type of a column.
    pub fn column_type(&self, name: &str) -> Option<DataType> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.data_type)
    }

    /// Returns true if the column is declared.
    pub fn has_column(&self, name: &str) -> bool {
        self.column_type(name).is_some()
    }

    /// Returns the partition key column names in order.
    pub fn partition_key_names(&self) -> &[String] {
        &self.partition_key_names
    }

    /// Returns the clustering key column names in order.
    pub fn clustering_key_names(&self) -> &[String] {
        &self.clustering_key_names
    }

    /// Returns the clustering order of a clustering key column.
    pub fn clustering_order(&self, name: &str) -> Option<ClusteringOrder> {
        self.clustering_orders.get(name).copied()
    }

    /// Returns the secondary index column names.
    pub fn secondary_index_names(&self) -> &BTreeSet<String> {
        &self.secondary_index_names
    }

    /// Returns true if the column is a partition or clustering key column.
    pub fn is_key_column(&self, name: &str) -> bool {
        self.partition_key_names.iter().any(|n| n == name)
            || self.clustering_key_names.iter().any(|n| n == name)
    }
}

/// Builder for [`TableMetadata`].
#[derive(Debug, Default)]
pub struct TableMetadataBuilder {
    columns: Vec<ColumnDef>,
    partition_key_names: Vec<String>,
    clustering_keys: Vec<(String, ClusteringOrder)>,
    secondary_index_names: Vec<String>,
}

impl TableMetadataBuilder {
    /// Declares a column.
    pub fn add_column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.columns.push(ColumnDef {
            name: name.into(),
            data_type,
        });
        self
    }

    /// Appends a partition key column.
    pub fn add_partition_key(mut self, name: impl Into<String>) -> Self {
        self.partition_key_names.push(name.into());
        self
    }

    /// Appends an ascending clustering key column.
    pub fn add_clustering_key(self, name: impl Into<String>) -> Self {
        self.add_clustering_key_with_order(name, ClusteringOrder::Asc)
    }

    /// Appends a clustering key column with the given order.
    pub fn add_clustering_key_with_order(
        mut self,
        name: impl Into<String>,
        order: ClusteringOrder,
    ) -> Self {
        self.clustering_keys.push((name.into(), order));
        self
    }

    /// Declares a secondary index on a column.
    pub fn add_secondary_index(mut self, name: impl Into<String>) -> Self {
        self.secondary_index_names.push(name.into());
        self
    }

    /// Validates and builds the metadata.
    pub fn build(self) -> StorageResult<TableMetadata> {
        let mut seen = BTreeSet::new();
        for column in &self.columns {
            if !seen.insert(column.name.as_str()) {
                return Err(StorageError::InvalidMetadata(format!(
                    "duplicate column {}",
                    column.name
                )));
            }
        }

        if self.partition_key_names.is_empty() {
            return Err(StorageError::InvalidMetadata(
                "at least one partition key is required".to_string(),
            ));
        }

        let mut keys = BTreeSet::new();
        let key_names = self
            .partition_key_names
            .iter()
            .chain(self.clustering_keys.iter().map(|(name, _)| name));
        for name in key_names {
            if !seen.contains(name.as_str()) {
                return Err(StorageError::InvalidMetadata(format!(
                    "key column {} is not declared",
                    name
                )));
            }
            if !keys.insert(name.as_str()) {
                return Err(StorageError::InvalidMetadata(format!(
                    "column {} is used as a key more than once",
                    name
                )));
            }
        }

        for name in &self.secondary_index_names {
            if !seen.contains(name.as_str()) {
                return Err(StorageError::InvalidMetadata(format!(
                    "indexed column {} is not declared",
                    name
                )));
            }
        }

        let clustering_orders = self.clustering_keys.iter().cloned().collect();
        let clustering_key_names = self
            .clustering_keys
            .into_iter()
            .map(|(name, _)| name)
            .collect();

        Ok(TableMetadata {
            columns: self.columns,
            partition_key_names: self.partition_key_names,
            clustering_key_names,
            clustering_orders,
            secondary_index_names: self.secondary_index_names.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_metadata() -> TableMetadata {
        TableMetadata::builder()
            .add_column("pk", DataType::Int)
            .add_column("ck1", DataType::Int)
            .add_column("ck2", DataType::Text)
            .add_column("col", DataType::Text)
            .add_partition_key("pk")
            .add_clustering_key("ck1")
            .add_clustering_key_with_order("ck2", ClusteringOrder::Desc)
            .add_secondary_index("col")
            .build()
            .unwrap()
    }

    #[test]
    fn test_metadata_accessors() {
        let metadata = test_metadata();
        assert_eq!(metadata.partition_key_names(), ["pk"]);
        assert_eq!(metadata.clustering_key_names(), ["ck1", "ck2"]);
        assert_eq!(metadata.clustering_order("ck1"), Some(ClusteringOrder::Asc));
        assert_eq!(metadata.clustering_order("ck2"), Some(ClusteringOrder::Desc));
        assert_eq!(metadata.clustering_order("col"), None);
        assert!(metadata.secondary_index_names().contains("col"));
        assert_eq!(metadata.column_type("ck2"), Some(DataType::Text));
        assert_eq!(metadata.column_names().count(), 4);
        assert!(metadata.is_key_column("ck1"));
        assert!(!metadata.is_key_column("col"));
    }

    #[test]
    fn test_metadata_requires_partition_key() {
        let result = TableMetadata::builder()
            .add_column("a", DataType::Int)
            .build();
        assert!(matches!(result, Err(StorageError::InvalidMetadata(_))));
    }

    #[test]
    fn test_metadata_rejects_undeclared_keys() {
        let result = TableMetadata::builder()
            .add_column("a", DataType::Int)
            .add_partition_key("a")
            .add_clustering_key("b")
            .build();
        assert!(matches!(result, Err(StorageError::InvalidMetadata(_))));

        let result = TableMetadata::builder()
            .add_column("a", DataType::Int)
            .add_partition_key("a")
            .add_secondary_index("missing")
            .build();
        assert!(matches!(result, Err(StorageError::InvalidMetadata(_))));
    }

    #[test]
    fn test_metadata_rejects_duplicates() {
        let result = TableMetadata::builder()
            .add_column("a", DataType::Int)
            .add_column("a", DataType::Text)
            .add_partition_key("a")
            .build();
        assert!(matches!(result, Err(StorageError::InvalidMetadata(_))));

        let result = TableMetadata::builder()
            .add_column("a", DataType::Int)
            .add_partition_key("a")
            .add_clustering_key("a")
            .build();
        assert!(matches!(result, Err(StorageError::InvalidMetadata(_))));
    }

    #[test]
    fn test_clustering_order() {
        assert_eq!(ClusteringOrder::Asc.reverse(), ClusteringOrder::Desc);
        assert_eq!(ClusteringOrder::Asc.ordinal(), 0);
        assert_eq!(ClusteringOrder::Desc.ordinal(), 1);
        assert_eq!(ClusteringOrder::Desc.to_string(), "DESC");
    }
}
