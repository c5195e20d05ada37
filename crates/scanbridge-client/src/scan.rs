//! Scan descriptors.
//!
//! A [`ScanDescriptor`] is an engine-independent description of one of the
//! three supported access patterns. Building one never touches the engine:
//! key/schema mismatches surface when the descriptor is executed.
//!
//! ## Example
//!
//! ```rust
//! use scanbridge_client::scan::{build_partition_scan, ScanKind};
//! use scanbridge_storage::{Key, ScanOrdering, TableIdentifier};
//!
//! let scan = build_partition_scan(TableIdentifier::new("ns", "t"), Key::of("pk", 1))
//!     .with_start(Key::of("ck", 10), true)
//!     .with_orderings(vec![ScanOrdering::desc("ck")])
//!     .with_projections(["pk", "ck", "col"])
//!     .with_limit(100);
//!
//! assert_eq!(scan.kind(), ScanKind::Partition);
//! ```

use std::fmt;

use scanbridge_storage::{Key, Scan, ScanBound, ScanOrdering, Selection, TableIdentifier};

/// Access pattern of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanKind {
    /// Every row of the table.
    Full,
    /// The rows of one partition.
    Partition,
    /// The rows matching a secondary index value.
    Index,
}

impl fmt::Display for ScanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanKind::Full => write!(f, "full"),
            ScanKind::Partition => write!(f, "partition"),
            ScanKind::Index => write!(f, "index"),
        }
    }
}

/// Refinements shared by every scan shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Columns to return; empty means every declared column.
    pub projections: Vec<String>,
    /// Maximum number of rows; zero means unlimited.
    pub limit: usize,
}

/// Clustering key refinements of a partition scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusteringRange {
    /// Lower bound.
    pub start: Option<ScanBound>,
    /// Upper bound.
    pub end: Option<ScanBound>,
    /// Requested clustering orderings.
    pub orderings: Vec<ScanOrdering>,
}

/// A logical scan request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanDescriptor {
    /// Scan every row of the table.
    FullScan {
        /// Target table.
        table: TableIdentifier,
        /// Shared refinements.
        options: ScanOptions,
    },
    /// Scan the rows of one partition.
    PartitionScan {
        /// Target table.
        table: TableIdentifier,
        /// Partition key, in the table's partition key column order.
        key: Key,
        /// Clustering range and orderings.
        range: ClusteringRange,
        /// Shared refinements.
        options: ScanOptions,
    },
    /// Scan the rows whose indexed column equals the key value.
    IndexScan {
        /// Target table.
        table: TableIdentifier,
        /// Single-column index key.
        key: Key,
        /// Shared refinements.
        options: ScanOptions,
    },
}

/// Builds a scan over every row of `table`.
pub fn build_full_scan(table: TableIdentifier) -> ScanDescriptor {
    ScanDescriptor::FullScan {
        table,
        options: ScanOptions::default(),
    }
}

/// Builds a scan over the partition of `table` identified by `key`.
///
/// `key` is not checked against the table's partition key here.
pub fn build_partition_scan(table: TableIdentifier, key: Key) -> ScanDescriptor {
    ScanDescriptor::PartitionScan {
        table,
        key,
        range: ClusteringRange::default(),
        options: ScanOptions::default(),
    }
}

/// Builds a secondary index scan over `table`.
///
/// `key` must carry exactly one column, a secondary index of the table.
/// Neither is checked here.
pub fn build_index_scan(table: TableIdentifier, key: Key) -> ScanDescriptor {
    ScanDescriptor::IndexScan {
        table,
        key,
        options: ScanOptions::default(),
    }
}

impl ScanDescriptor {
    /// Returns the target table.
    pub fn table(&self) -> &TableIdentifier {
        match self {
            ScanDescriptor::FullScan { table, .. }
            | ScanDescriptor::PartitionScan { table, .. }
            | ScanDescriptor::IndexScan { table, .. } => table,
        }
    }

    /// Returns the access pattern.
    pub fn kind(&self) -> ScanKind {
        match self {
            ScanDescriptor::FullScan { .. } => ScanKind::Full,
            ScanDescriptor::PartitionScan { .. } => ScanKind::Partition,
            ScanDescriptor::IndexScan { .. } => ScanKind::Index,
        }
    }

    /// Returns the requested projections.
    pub fn projections(&self) -> &[String] {
        &self.options().projections
    }

    /// Returns the row limit; zero means unlimited.
    pub fn limit(&self) -> usize {
        self.options().limit
    }

    /// Returns the key of a partition or index scan.
    pub fn key(&self) -> Option<&Key> {
        match self {
            ScanDescriptor::FullScan { .. } => None,
            ScanDescriptor::PartitionScan { key, .. } | ScanDescriptor::IndexScan { key, .. } => {
                Some(key)
            }
        }
    }

    /// Returns the clustering refinements of a partition scan.
    pub fn clustering_range(&self) -> Option<&ClusteringRange> {
        match self {
            ScanDescriptor::PartitionScan { range, .. } => Some(range),
            _ => None,
        }
    }

    /// Restricts the returned columns.
    pub fn with_projections<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options_mut().projections = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Limits the number of returned rows.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.options_mut().limit = limit;
        self
    }

    /// Sets the lower clustering bound. Ignored unless this is a partition scan.
    pub fn with_start(mut self, key: Key, inclusive: bool) -> Self {
        if let ScanDescriptor::PartitionScan { range, .. } = &mut self {
            range.start = Some(ScanBound::new(key, inclusive));
        }
        self
    }

    /// Sets the upper clustering bound. Ignored unless this is a partition scan.
    pub fn with_end(mut self, key: Key, inclusive: bool) -> Self {
        if let ScanDescriptor::PartitionScan { range, .. } = &mut self {
            range.end = Some(ScanBound::new(key, inclusive));
        }
        self
    }

    /// Sets the clustering orderings. Ignored unless this is a partition scan.
    pub fn with_orderings(mut self, orderings: Vec<ScanOrdering>) -> Self {
        if let ScanDescriptor::PartitionScan { range, .. } = &mut self {
            range.orderings = orderings;
        }
        self
    }

    /// Translates the descriptor into an engine-native scan.
    pub fn to_scan(&self) -> Scan {
        let (table, selection, options) = match self {
            ScanDescriptor::FullScan { table, options } => (table, Selection::All, options),
            ScanDescriptor::PartitionScan {
                table,
                key,
                range,
                options,
            } => (
                table,
                Selection::Partition {
                    key: key.clone(),
                    start: range.start.clone(),
                    end: range.end.clone(),
                    orderings: range.orderings.clone(),
                },
                options,
            ),
            ScanDescriptor::IndexScan {
                table,
                key,
                options,
            } => (table, Selection::Index(key.clone()), options),
        };

        Scan {
            table: table.clone(),
            selection,
            projections: options.projections.clone(),
            limit: options.limit,
        }
    }

    fn options(&self) -> &ScanOptions {
        match self {
            ScanDescriptor::FullScan { options, .. }
            | ScanDescriptor::PartitionScan { options, .. }
            | ScanDescriptor::IndexScan { options, .. } => options,
        }
    }

    fn options_mut(&mut self) -> &mut ScanOptions {
        match self {
            ScanDescriptor::FullScan { options, .. }
            | ScanDescriptor::PartitionScan { options, .. }
            | ScanDescriptor::IndexScan { options, .. } => options,
        }
    }
}

impl fmt::Display for ScanDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanDescriptor::FullScan { table, .. } => write!(f, "FullScan({})", table)?,
            ScanDescriptor::PartitionScan {
                table, key, range, ..
            } => {
                write!(f, "PartitionScan({}, partition={}", table, key)?;
                if let Some(start) = &range.start {
                    let op = if start.inclusive { ">=" } else { ">" };
                    write!(f, ", start{}{}", op, start.key)?;
                }
                if let Some(end) = &range.end {
                    let op = if end.inclusive { "<=" } else { "<" };
                    write!(f, ", end{}{}", op, end.key)?;
                }
                if !range.orderings.is_empty() {
                    let orderings: Vec<String> =
                        range.orderings.iter().map(ToString::to_string).collect();
                    write!(f, ", order=[{}]", orderings.join(", "))?;
                }
                write!(f, ")")?;
            }
            ScanDescriptor::IndexScan { table, key, .. } => {
                write!(f, "IndexScan({}, index={})", table, key)?
            }
        }

        let options = self.options();
        if !options.projections.is_empty() {
            write!(f, " columns=[{}]", options.projections.join(", "))?;
        }
        if options.limit > 0 {
            write!(f, " limit={}", options.limit)?;
        }
        Ok(())
    }
}
