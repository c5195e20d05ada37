//! JSON snapshot persistence for the memory backend.
//!
//! A snapshot holds every namespace, table schema and record. It is written
//! to a temporary file next to the target, synced, and renamed into place.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, StorageResult};
use crate::key::TableIdentifier;
use crate::metadata::TableMetadata;
use crate::value::Value;

use super::catalog::Catalog;
use super::table::TableStore;

/// Serialized form of a [`Catalog`].
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    namespaces: BTreeMap<String, BTreeMap<String, TableSnapshot>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct TableSnapshot {
    metadata: TableMetadata,
    records: Vec<RecordSnapshot>,
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordSnapshot {
    partition: Vec<Value>,
    #[serde(default)]
    clustering: Vec<Value>,
    #[serde(default)]
    values: BTreeMap<String, Value>,
}

impl Snapshot {
    /// Captures the contents of a catalog.
    pub fn capture(catalog: &Catalog) -> Self {
        let mut namespaces: BTreeMap<String, BTreeMap<String, TableSnapshot>> = catalog
            .namespace_names()
            .map(|ns| (ns.to_string(), BTreeMap::new()))
            .collect();

        for store in catalog.tables() {
            let records = store
                .records()
                .map(|(partition, clustering, values)| RecordSnapshot {
                    partition: partition.clone(),
                    clustering: clustering.clone(),
                    values: values.clone(),
                })
                .collect();
            namespaces
                .entry(store.id().namespace().to_string())
                .or_default()
                .insert(
                    store.id().table().to_string(),
                    TableSnapshot {
                        metadata: store.metadata().clone(),
                        records,
                    },
                );
        }

        Self { namespaces }
    }

    /// Rebuilds a catalog from this snapshot.
    pub fn restore(self) -> StorageResult<Catalog> {
        let mut catalog = Catalog::new();
        for (namespace, tables) in self.namespaces {
            catalog.create_namespace(&namespace, true)?;
            for (table, snapshot) in tables {
                let id = TableIdentifier::new(namespace.as_str(), table);
                let key_widths = (
                    snapshot.metadata.partition_key_names().len(),
                    snapshot.metadata.clustering_key_names().len(),
                );
                let mut store = TableStore::new(id.clone(), snapshot.metadata);
                for record in snapshot.records {
                    if (record.partition.len(), record.clustering.len()) != key_widths {
                        return Err(StorageError::Snapshot(format!(
                            "record of {} does not match its key columns",
                            id
                        )));
                    }
                    store.insert_raw(record.partition, record.clustering, record.values);
                }
                catalog.restore_table(store);
            }
        }
        Ok(catalog)
    }

    /// Reads a snapshot file. Returns `None` if the file does not exist.
    pub fn load(path: &Path) -> StorageResult<Option<Self>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StorageError::Snapshot(format!("{}: {}", path.display(), e)))
    }

    /// Writes this snapshot to `path`, replacing any previous file.
    pub fn save(&self, path: &Path) -> StorageResult<()> {
        let json =
            serde_json::to_vec_pretty(self).map_err(|e| StorageError::Snapshot(e.to_string()))?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = temp_path(path);
        let mut file = File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
