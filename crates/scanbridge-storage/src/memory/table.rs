//! Per-table record store of the memory backend.
//!
//! Records are grouped by partition key and, inside a partition, keyed by
//! clustering key. Non-key columns are stored only when set, so an unset
//! column reads back as NULL.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::{StorageError, StorageResult};
use crate::key::{Key, TableIdentifier};
use crate::metadata::{ClusteringOrder, TableMetadata};
use crate::operation::{Put, Scan, ScanBound, ScanOrdering, Selection};
use crate::result::ResultRow;
use crate::value::Value;

/// Key column values in declaration order.
pub(crate) type KeyValues = Vec<Value>;

/// Set non-key columns of one record.
pub(crate) type Record = BTreeMap<String, Value>;

/// Records of one table.
#[derive(Debug, Clone)]
pub struct TableStore {
    id: TableIdentifier,
    metadata: TableMetadata,
    partitions: BTreeMap<KeyValues, BTreeMap<KeyValues, Record>>,
}

impl TableStore {
    /// Creates an empty table store.
    pub fn new(id: TableIdentifier, metadata: TableMetadata) -> Self {
        Self {
            id,
            metadata,
            partitions: BTreeMap::new(),
        }
    }

    /// Returns the table identifier.
    pub fn id(&self) -> &TableIdentifier {
        &self.id
    }

    /// Returns the table metadata.
    pub fn metadata(&self) -> &TableMetadata {
        &self.metadata
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.partitions.values().map(BTreeMap::len).sum()
    }

    /// Returns true if the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }

    /// Removes every record.
    pub fn truncate(&mut self) {
        self.partitions.clear();
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts or updates one record.
    pub fn put(&mut self, put: &Put) -> StorageResult<()> {
        let table = self.id.to_string();
        let partition = self
            .key_values(&put.partition_key, self.metadata.partition_key_names(), false)
            .map_err(|msg| StorageError::invalid_put(&table, format!("partition key: {}", msg)))?;
        let clustering = self
            .key_values(&put.clustering_key, self.metadata.clustering_key_names(), false)
            .map_err(|msg| StorageError::invalid_put(&table, format!("clustering key: {}", msg)))?;

        for (name, value) in &put.values {
            let data_type = self.metadata.column_type(name).ok_or_else(|| {
                StorageError::invalid_put(&table, format!("unknown column {}", name))
            })?;
            if self.metadata.is_key_column(name) {
                return Err(StorageError::invalid_put(
                    &table,
                    format!("key column {} cannot be set as a value", name),
                ));
            }
            if !value.fits(data_type) {
                return Err(StorageError::invalid_put(
                    &table,
                    format!("column {} expects {}, got {}", name, data_type, value),
                ));
            }
        }

        let record = self
            .partitions
            .entry(partition)
            .or_default()
            .entry(clustering)
            .or_default();
        for (name, value) in &put.values {
            if value.is_null() {
                record.remove(name);
            } else {
                record.insert(name.clone(), value.clone());
            }
        }
        Ok(())
    }

    /// Inserts a record without validation. Used when restoring a snapshot.
    pub(crate) fn insert_raw(&mut self, partition: KeyValues, clustering: KeyValues, record: Record) {
        self.partitions
            .entry(partition)
            .or_default()
            .insert(clustering, record);
    }

    /// Iterates over every record as `(partition, clustering, record)`.
    pub(crate) fn records(&self) -> impl Iterator<Item = (&KeyValues, &KeyValues, &Record)> {
        self.partitions.iter().flat_map(|(partition, rows)| {
            rows.iter()
                .map(move |(clustering, record)| (partition, clustering, record))
        })
    }

    // =========================================================================
    // Scans
    // =========================================================================

    /// Executes a scan and returns the matching rows in result order.
    pub fn scan(&self, scan: &Scan) -> StorageResult<Vec<ResultRow>> {
        let table = self.id.to_string();
        let projections = self.resolve_projections(&scan.projections)?;

        let mut rows: Vec<(&KeyValues, &KeyValues, &Record)> = match &scan.selection {
            Selection::All => {
                let mut rows = Vec::new();
                for (partition, records) in &self.partitions {
                    rows.extend(
                        self.sorted(records)
                            .into_iter()
                            .map(|(clustering, record)| (partition, clustering, record)),
                    );
                }
                rows
            }
            Selection::Partition {
                key,
                start,
                end,
                orderings,
            } => {
                let partition = self
                    .key_values(key, self.metadata.partition_key_names(), false)
                    .map_err(|msg| {
                        StorageError::invalid_scan(&table, format!("partition key: {}", msg))
                    })?;
                let reverse = self
                    .resolve_orderings(orderings)
                    .map_err(|msg| StorageError::invalid_scan(&table, msg))?;
                let start = self.resolve_bound(start.as_ref(), "start")?;
                let end = self.resolve_bound(end.as_ref(), "end")?;

                let mut rows = Vec::new();
                if let Some((stored_partition, records)) = self.partitions.get_key_value(&partition) {
                    for (clustering, record) in self.sorted(records) {
                        if self.within(clustering, start.as_ref(), end.as_ref()) {
                            rows.push((stored_partition, clustering, record));
                        }
                    }
                }
                if reverse {
                    rows.reverse();
                }
                rows
            }
            Selection::Index(key) => {
                let (column, value) = self
                    .resolve_index_key(key)
                    .map_err(|msg| StorageError::invalid_scan(&table, msg))?;
                let mut rows = Vec::new();
                for (partition, records) in &self.partitions {
                    for (clustering, record) in self.sorted(records) {
                        if self.cell(column, partition, clustering, record) == *value {
                            rows.push((partition, clustering, record));
                        }
                    }
                }
                rows
            }
        };

        if scan.limit > 0 {
            rows.truncate(scan.limit);
        }

        Ok(rows
            .into_iter()
            .map(|(partition, clustering, record)| {
                projections
                    .iter()
                    .map(|name| {
                        (
                            name.clone(),
                            self.cell(name, partition, clustering, record),
                        )
                    })
                    .collect()
            })
            .collect())
    }

    fn resolve_projections(&self, projections: &[String]) -> StorageResult<Vec<String>> {
        if projections.is_empty() {
            return Ok(self.metadata.column_names().map(str::to_string).collect());
        }
        for name in projections {
            if !self.metadata.has_column(name) {
                return Err(StorageError::invalid_scan(
                    self.id.to_string(),
                    format!("unknown column {} in projections", name),
                ));
            }
        }
        Ok(projections.to_vec())
    }

    /// Returns true when the orderings reverse the declared clustering order.
    fn resolve_orderings(&self, orderings: &[ScanOrdering]) -> Result<bool, String> {
        let clustering_keys = self.metadata.clustering_key_names();
        if orderings.len() > clustering_keys.len() {
            return Err(format!(
                "{} orderings given but the table has {} clustering keys",
                orderings.len(),
                clustering_keys.len()
            ));
        }

        let mut reverse = None;
        for (ordering, expected) in orderings.iter().zip(clustering_keys) {
            if &ordering.column != expected {
                return Err(format!(
                    "ordering on {} does not follow the clustering key order (expected {})",
                    ordering.column, expected
                ));
            }
            let declared = self
                .metadata
                .clustering_order(expected)
                .unwrap_or(ClusteringOrder::Asc);
            let reversed = ordering.order != declared;
            match reverse {
                None => reverse = Some(reversed),
                Some(previous) if previous != reversed => {
                    return Err(
                        "orderings must all follow or all reverse the clustering order".to_string(),
                    );
                }
                Some(_) => {}
            }
        }
        Ok(reverse.unwrap_or(false))
    }

    fn resolve_bound(
        &self,
        bound: Option<&ScanBound>,
        which: &str,
    ) -> StorageResult<Option<(KeyValues, bool)>> {
        let Some(bound) = bound else {
            return Ok(None);
        };
        let values = self
            .key_values(&bound.key, self.metadata.clustering_key_names(), true)
            .map_err(|msg| {
                StorageError::invalid_scan(self.id.to_string(), format!("{} bound: {}", which, msg))
            })?;
        Ok(Some((values, bound.inclusive)))
    }

    fn resolve_index_key<'k>(&self, key: &'k Key) -> Result<(&'k str, &'k Value), String> {
        let [(column, value)] = key.columns() else {
            return Err(format!(
                "index key must have exactly one column, got {}",
                key.len()
            ));
        };
        if !self.metadata.secondary_index_names().contains(column) {
            return Err(format!("column {} is not a secondary index", column));
        }
        self.check_value(column, value)?;
        Ok((column.as_str(), value))
    }

    /// Validates key columns against `expected` and returns their values.
    ///
    /// With `prefix` set the key may cover a non-empty prefix of `expected`;
    /// otherwise it must match exactly.
    fn key_values(&self, key: &Key, expected: &[String], prefix: bool) -> Result<KeyValues, String> {
        let names: Vec<&str> = key.names().collect();
        let matches = if prefix {
            !names.is_empty()
                && names.len() <= expected.len()
                && names.iter().zip(expected).all(|(a, b)| *a == b.as_str())
        } else {
            names.len() == expected.len() && names.iter().zip(expected).all(|(a, b)| *a == b.as_str())
        };
        if !matches {
            return Err(format!(
                "columns [{}] do not match [{}]",
                names.join(", "),
                expected.join(", ")
            ));
        }

        for (name, value) in key.columns() {
            self.check_value(name, value)?;
        }
        Ok(key.values().cloned().collect())
    }

    fn check_value(&self, name: &str, value: &Value) -> Result<(), String> {
        let data_type = self
            .metadata
            .column_type(name)
            .ok_or_else(|| format!("unknown column {}", name))?;
        if value.is_null() {
            return Err(format!("key column {} must not be NULL", name));
        }
        if !value.fits(data_type) {
            return Err(format!("column {} expects {}, got {}", name, data_type, value));
        }
        Ok(())
    }

    /// Compares clustering key (prefixes) in the declared clustering order.
    fn compare_clustering(&self, a: &[Value], b: &[Value]) -> Ordering {
        let names = self.metadata.clustering_key_names();
        for ((x, y), name) in a.iter().zip(b).zip(names) {
            let ordering = match self.metadata.clustering_order(name) {
                Some(ClusteringOrder::Desc) => y.cmp(x),
                _ => x.cmp(y),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    fn sorted<'a>(&self, records: &'a BTreeMap<KeyValues, Record>) -> Vec<(&'a KeyValues, &'a Record)> {
        let mut rows: Vec<_> = records.iter().collect();
        rows.sort_by(|(a, _), (b, _)| self.compare_clustering(a, b));
        rows
    }

    fn within(
        &self,
        clustering: &[Value],
        start: Option<&(KeyValues, bool)>,
        end: Option<&(KeyValues, bool)>,
    ) -> bool {
        if let Some((bound, inclusive)) = start {
            match self.compare_clustering(clustering, bound) {
                Ordering::Less => return false,
                Ordering::Equal if !inclusive => return false,
                _ => {}
            }
        }
        if let Some((bound, inclusive)) = end {
            match self.compare_clustering(clustering, bound) {
                Ordering::Greater => return false,
                Ordering::Equal if !inclusive => return false,
                _ => {}
            }
        }
        true
    }

    fn cell(&self, name: &str, partition: &[Value], clustering: &[Value], record: &Record) -> Value {
        if let Some(i) = self
            .metadata
            .partition_key_names()
            .iter()
            .position(|n| n == name)
        {
            return partition[i].clone();
        }
        if let Some(i) = self
            .metadata
            .clustering_key_names()
            .iter()
            .position(|n| n == name)
        {
            return clustering[i].clone();
        }
        record.get(name).cloned().unwrap_or(Value::Null)
    }
}
