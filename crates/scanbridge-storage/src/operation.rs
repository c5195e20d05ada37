//! Engine-native operations: `Scan` and `Put`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::key::{Key, TableIdentifier};
use crate::metadata::ClusteringOrder;
use crate::value::Value;

/// Ordering of one clustering key column in a partition scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanOrdering {
    /// Clustering key column.
    pub column: String,
    /// Requested order.
    pub order: ClusteringOrder,
}

impl ScanOrdering {
    /// Ascending ordering on `column`.
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: ClusteringOrder::Asc,
        }
    }

    /// Descending ordering on `column`.
    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            order: ClusteringOrder::Desc,
        }
    }
}

impl fmt::Display for ScanOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.column, self.order)
    }
}

/// One end of a clustering key range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanBound {
    /// Clustering key prefix.
    pub key: Key,
    /// Whether rows equal to `key` are included.
    pub inclusive: bool,
}

impl ScanBound {
    /// Creates a bound.
    pub fn new(key: Key, inclusive: bool) -> Self {
        Self { key, inclusive }
    }
}

/// Which rows of a table a scan reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selection {
    /// Every row of the table.
    All,
    /// The rows of one partition, optionally restricted to a clustering range.
    Partition {
        /// Partition key, matching the table's partition key columns in order.
        key: Key,
        /// Lower clustering bound.
        start: Option<ScanBound>,
        /// Upper clustering bound.
        end: Option<ScanBound>,
        /// Clustering orderings.
        orderings: Vec<ScanOrdering>,
    },
    /// The rows whose indexed column equals the single key value.
    Index(Key),
}

/// An engine-native scan request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scan {
    /// Target table.
    pub table: TableIdentifier,
    /// Row selection.
    pub selection: Selection,
    /// Columns to return; empty means every declared column.
    pub projections: Vec<String>,
    /// Maximum number of rows; zero means unlimited.
    pub limit: usize,
}

impl Scan {
    /// Creates a scan over every row of `table`.
    pub fn all(table: TableIdentifier) -> Self {
        Self {
            table,
            selection: Selection::All,
            projections: Vec::new(),
            limit: 0,
        }
    }

    /// Creates a scan over one partition of `table`.
    pub fn partition(table: TableIdentifier, key: Key) -> Self {
        Self {
            table,
            selection: Selection::Partition {
                key,
                start: None,
                end: None,
                orderings: Vec::new(),
            },
            projections: Vec::new(),
            limit: 0,
        }
    }

    /// Creates a secondary index scan over `table`.
    pub fn index(table: TableIdentifier, key: Key) -> Self {
        Self {
            table,
            selection: Selection::Index(key),
            projections: Vec::new(),
            limit: 0,
        }
    }

    /// Sets the projections.
    pub fn with_projections<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projections = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the limit.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

impl fmt::Display for Scan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.selection {
            Selection::All => write!(f, "Scan[{} all", self.table)?,
            Selection::Partition {
                key,
                start,
                end,
                orderings,
            } => {
                write!(f, "Scan[{} partition={}", self.table, key)?;
                if let Some(start) = start {
                    let op = if start.inclusive { ">=" } else { ">" };
                    write!(f, " start{}{}", op, start.key)?;
                }
                if let Some(end) = end {
                    let op = if end.inclusive { "<=" } else { "<" };
                    write!(f, " end{}{}", op, end.key)?;
                }
                if !orderings.is_empty() {
                    let rendered: Vec<String> = orderings.iter().map(ToString::to_string).collect();
                    write!(f, " order=[{}]", rendered.join(", "))?;
                }
            }
            Selection::Index(key) => write!(f, "Scan[{} index={}", self.table, key)?,
        }
        if !self.projections.is_empty() {
            write!(f, " projections=[{}]", self.projections.join(", "))?;
        }
        if self.limit > 0 {
            write!(f, " limit={}", self.limit)?;
        }
        write!(f, "]")
    }
}

/// An engine-native write of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Put {
    /// Target table.
    pub table: TableIdentifier,
    /// Partition key.
    pub partition_key: Key,
    /// Clustering key; empty for tables without clustering columns.
    pub clustering_key: Key,
    /// Non-key column values. Columns not listed keep their previous value.
    pub values: Vec<(String, Value)>,
}

impl Put {
    /// Creates a put for the given record key.
    pub fn new(table: TableIdentifier, partition_key: Key, clustering_key: Key) -> Self {
        Self {
            table,
            partition_key,
            clustering_key,
            values: Vec::new(),
        }
    }

    /// Sets a non-key column value.
    pub fn value(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.push((column.into(), value.into()));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_display() {
        let table = TableIdentifier::new("ns", "t");
        let scan = Scan::all(table.clone()).with_limit(5);
        assert_eq!(scan.to_string(), "Scan[ns.t all limit=5]");

        let scan = Scan::index(table.clone(), Key::of("idx", 3)).with_projections(["a", "b"]);
        assert_eq!(scan.to_string(), "Scan[ns.t index={idx=3} projections=[a, b]]");

        let mut scan = Scan::partition(table, Key::of("pk", 1));
        if let Selection::Partition {
            start, orderings, ..
        } = &mut scan.selection
        {
            *start = Some(ScanBound::new(Key::of("ck", 2), true));
            orderings.push(ScanOrdering::desc("ck"));
        }
        assert_eq!(
            scan.to_string(),
            "Scan[ns.t partition={pk=1} start>={ck=2} order=[ck DESC]]"
        );
    }

    #[test]
    fn test_put_builder() {
        let put = Put::new(
            TableIdentifier::new("ns", "t"),
            Key::of("pk", 1),
            Key::of("ck", 1),
        )
        .value("col", "x")
        .value("other", None::<i32>);
        assert_eq!(put.values.len(), 2);
        assert!(put.values[1].1.is_null());
    }
}
