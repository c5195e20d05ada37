//! Namespace and table catalog of the memory backend.

use std::collections::BTreeMap;

use crate::error::{StorageError, StorageResult};
use crate::key::TableIdentifier;
use crate::metadata::TableMetadata;

use super::table::TableStore;

/// Namespaces and their tables.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    namespaces: BTreeMap<String, BTreeMap<String, TableStore>>,
}

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a namespace.
    ///
    /// Returns `false` if it already existed and `if_not_exists` is set.
    pub fn create_namespace(&mut self, namespace: &str, if_not_exists: bool) -> StorageResult<bool> {
        if self.namespaces.contains_key(namespace) {
            if if_not_exists {
                return Ok(false);
            }
            return Err(StorageError::NamespaceExists(namespace.to_string()));
        }
        self.namespaces.insert(namespace.to_string(), BTreeMap::new());
        Ok(true)
    }

    /// Returns true if the namespace exists.
    pub fn namespace_exists(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    /// Returns the namespace names.
    pub fn namespace_names(&self) -> impl Iterator<Item = &str> {
        self.namespaces.keys().map(String::as_str)
    }

    /// Creates a table.
    ///
    /// Returns `false` if it already existed and `if_not_exists` is set.
    pub fn create_table(
        &mut self,
        id: &TableIdentifier,
        metadata: TableMetadata,
        if_not_exists: bool,
    ) -> StorageResult<bool> {
        let tables = self
            .namespaces
            .get_mut(id.namespace())
            .ok_or_else(|| StorageError::NamespaceNotFound(id.namespace().to_string()))?;

        if tables.contains_key(id.table()) {
            if if_not_exists {
                return Ok(false);
            }
            return Err(StorageError::TableExists {
                namespace: id.namespace().to_string(),
                table: id.table().to_string(),
            });
        }
        tables.insert(id.table().to_string(), TableStore::new(id.clone(), metadata));
        Ok(true)
    }

    /// Drops a table.
    pub fn drop_table(&mut self, id: &TableIdentifier) -> StorageResult<()> {
        self.namespaces
            .get_mut(id.namespace())
            .and_then(|tables| tables.remove(id.table()))
            .map(|_| ())
            .ok_or_else(|| StorageError::table_not_found(id.namespace(), id.table()))
    }

    /// Returns a table.
    pub fn table(&self, id: &TableIdentifier) -> StorageResult<&TableStore> {
        self.namespaces
            .get(id.namespace())
            .and_then(|tables| tables.get(id.table()))
            .ok_or_else(|| StorageError::table_not_found(id.namespace(), id.table()))
    }

    /// Returns a table for writing.
    pub fn table_mut(&mut self, id: &TableIdentifier) -> StorageResult<&mut TableStore> {
        self.namespaces
            .get_mut(id.namespace())
            .and_then(|tables| tables.get_mut(id.table()))
            .ok_or_else(|| StorageError::table_not_found(id.namespace(), id.table()))
    }

    /// Returns the metadata of a table, or `None` if it does not exist.
    pub fn metadata(&self, id: &TableIdentifier) -> Option<TableMetadata> {
        self.table(id).ok().map(|t| t.metadata().clone())
    }

    /// Iterates over every table.
    pub fn tables(&self) -> impl Iterator<Item = &TableStore> {
        self.namespaces.values().flat_map(|tables| tables.values())
    }

    /// Inserts a restored table, creating its namespace if needed.
    pub(crate) fn restore_table(&mut self, store: TableStore) {
        let id = store.id().clone();
        self.namespaces
            .entry(id.namespace().to_string())
            .or_default()
            .insert(id.table().to_string(), store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::DataType;

    fn metadata() -> TableMetadata {
        TableMetadata::builder()
            .add_column("pk", DataType::Int)
            .add_partition_key("pk")
            .build()
            .unwrap()
    }

    #[test]
    fn test_namespaces() {
        let mut catalog = Catalog::new();
        assert!(catalog.create_namespace("ns", false).unwrap());
        assert!(!catalog.create_namespace("ns", true).unwrap());
        assert!(matches!(
            catalog.create_namespace("ns", false),
            Err(StorageError::NamespaceExists(_))
        ));
        assert!(catalog.namespace_exists("ns"));
        assert_eq!(catalog.namespace_names().collect::<Vec<_>>(), vec!["ns"]);
    }

    #[test]
    fn test_tables() {
        let mut catalog = Catalog::new();
        let id = TableIdentifier::new("ns", "t");

        assert!(matches!(
            catalog.create_table(&id, metadata(), false),
            Err(StorageError::NamespaceNotFound(_))
        ));

        catalog.create_namespace("ns", false).unwrap();
        assert!(catalog.create_table(&id, metadata(), false).unwrap());
        assert!(!catalog.create_table(&id, metadata(), true).unwrap());
        assert!(matches!(
            catalog.create_table(&id, metadata(), false),
            Err(StorageError::TableExists { .. })
        ));
        assert_eq!(catalog.metadata(&id), Some(metadata()));
        assert_eq!(catalog.tables().count(), 1);

        catalog.drop_table(&id).unwrap();
        assert!(catalog.metadata(&id).is_none());
        match catalog.table(&id) {
            Err(StorageError::TableNotFound { namespace, table }) => {
                assert_eq!(namespace, "ns");
                assert_eq!(table, "t");
            }
            other => panic!("unexpected: {:?}", other.map(|t| t.id().clone())),
        }
    }
}
