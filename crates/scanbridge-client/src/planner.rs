//! Planning hooks.
//!
//! Helps a query planner decide which of its conditions the engine can
//! evaluate, which access pattern to use, whether a requested sort order can
//! be served by the clustering order, and how many rows to expect.
//!
//! Pushdown priority:
//!
//! 1. Equality on every partition key: partition scan. Clustering key
//!    conditions forming an equality prefix followed by at most one range
//!    column become the clustering range.
//! 2. Equality on a secondary index: index scan on the first such condition.
//! 3. Otherwise: full scan.
//!
//! Conditions not pushed down are returned as local conditions, which the
//! caller must evaluate itself.

use std::cmp::Ordering;
use std::fmt;

use scanbridge_storage::{
    ClusteringOrder, Key, ResultRow, ScanBound, ScanOrdering, TableIdentifier, Value,
};

use crate::metadata::ColumnMetadata;
use crate::scan::{
    build_full_scan, build_index_scan, build_partition_scan, ScanDescriptor, ScanKind,
};

/// Estimated row count of a pushed-down scan.
pub const DEFAULT_ROWS_FOR_PARTITION_KEY_SCAN: f64 = 10.0;

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    fn is_lower_bound(self) -> bool {
        matches!(self, CompareOp::Gt | CompareOp::Ge)
    }

    fn is_upper_bound(self) -> bool {
        matches!(self, CompareOp::Lt | CompareOp::Le)
    }

    fn is_inclusive(self) -> bool {
        matches!(self, CompareOp::Eq | CompareOp::Le | CompareOp::Ge)
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompareOp::Eq => "=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        };
        write!(f, "{}", s)
    }
}

/// A `column <op> constant` condition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Condition {
    /// Column name.
    pub column: String,
    /// Operator.
    pub op: CompareOp,
    /// Constant operand.
    pub value: Value,
}

impl Condition {
    /// Creates a condition.
    pub fn new(column: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }

    /// Creates an equality condition.
    pub fn equal(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(column, CompareOp::Eq, value)
    }

    /// Evaluates the condition against a row.
    ///
    /// NULL never matches, and neither does a value of another type.
    pub fn matches(&self, row: &ResultRow) -> bool {
        let Some(actual) = row.get(&self.column) else {
            return false;
        };
        if actual.is_null() || self.value.is_null() || actual.data_type() != self.value.data_type() {
            return false;
        }
        let ordering = actual.cmp(&self.value);
        match self.op {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Le => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Ge => ordering != Ordering::Less,
        }
    }

    fn is_pushable_eq(&self, column: &str) -> bool {
        self.column == column && self.op == CompareOp::Eq && !self.value.is_null()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.column, self.op, self.value)
    }
}

/// How a plan reads the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPath {
    /// Full table scan.
    Full,
    /// Partition scan with an optional clustering range (in clustering order).
    Partition {
        /// Partition key.
        key: Key,
        /// Lower bound in clustering order.
        start: Option<ScanBound>,
        /// Upper bound in clustering order.
        end: Option<ScanBound>,
    },
    /// Secondary index scan.
    Index(Key),
}

/// Result of condition analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
    /// Access path.
    pub access: AccessPath,
    /// Conditions evaluated by the engine.
    pub remote: Vec<Condition>,
    /// Conditions the caller must evaluate.
    pub local: Vec<Condition>,
}

impl ScanPlan {
    /// Returns the scan kind.
    pub fn kind(&self) -> ScanKind {
        match self.access {
            AccessPath::Full => ScanKind::Full,
            AccessPath::Partition { .. } => ScanKind::Partition,
            AccessPath::Index(_) => ScanKind::Index,
        }
    }

    /// Returns true if any condition is evaluated by the engine.
    pub fn is_pushed_down(&self) -> bool {
        !self.remote.is_empty()
    }

    /// Builds the scan descriptor for this plan.
    pub fn build_descriptor(&self, table: TableIdentifier) -> ScanDescriptor {
        match &self.access {
            AccessPath::Full => build_full_scan(table),
            AccessPath::Partition { key, start, end } => {
                let mut descriptor = build_partition_scan(table, key.clone());
                if let Some(start) = start {
                    descriptor = descriptor.with_start(start.key.clone(), start.inclusive);
                }
                if let Some(end) = end {
                    descriptor = descriptor.with_end(end.key.clone(), end.inclusive);
                }
                descriptor
            }
            AccessPath::Index(key) => build_index_scan(table, key.clone()),
        }
    }
}

/// Splits `conditions` into those the engine evaluates and those left to
/// the caller, and picks the access path.
pub fn determine_remote_conditions(conditions: &[Condition], columns: &ColumnMetadata) -> ScanPlan {
    let mut remote_positions = Vec::new();

    let access = if let Some(access) = partition_access(conditions, columns, &mut remote_positions) {
        access
    } else if let Some(i) = conditions.iter().position(|c| {
        c.op == CompareOp::Eq && !c.value.is_null() && columns.is_secondary_index(&c.column)
    }) {
        remote_positions.push(i);
        AccessPath::Index(Key::of(conditions[i].column.clone(), conditions[i].value.clone()))
    } else {
        AccessPath::Full
    };

    let (remote, local) = conditions
        .iter()
        .enumerate()
        .fold((Vec::new(), Vec::new()), |(mut remote, mut local), (i, c)| {
            if remote_positions.contains(&i) {
                remote.push(c.clone());
            } else {
                local.push(c.clone());
            }
            (remote, local)
        });

    ScanPlan {
        access,
        remote,
        local,
    }
}

fn partition_access(
    conditions: &[Condition],
    columns: &ColumnMetadata,
    remote_positions: &mut Vec<usize>,
) -> Option<AccessPath> {
    if columns.partition_keys.is_empty() {
        return None;
    }
    let find_eq = |column: &str| conditions.iter().position(|c| c.is_pushable_eq(column));

    let mut used = Vec::new();
    let mut key = Key::new();
    for name in &columns.partition_keys {
        let i = find_eq(name)?;
        key.push(name.clone(), conditions[i].value.clone());
        used.push(i);
    }

    let mut prefix = Key::new();
    let mut start = None;
    let mut end = None;
    for (name, order) in &columns.clustering_keys {
        if let Some(i) = find_eq(name) {
            prefix.push(name.clone(), conditions[i].value.clone());
            used.push(i);
            continue;
        }

        let bound = |pick: fn(CompareOp) -> bool| {
            conditions.iter().position(|c| {
                c.column == *name && pick(c.op) && !c.value.is_null()
            })
        };
        let lower = bound(CompareOp::is_lower_bound).map(|i| {
            used.push(i);
            range_bound(&prefix, name, &conditions[i])
        });
        let upper = bound(CompareOp::is_upper_bound).map(|i| {
            used.push(i);
            range_bound(&prefix, name, &conditions[i])
        });

        // Bounds are expressed in clustering order.
        (start, end) = match order {
            ClusteringOrder::Asc => (lower, upper),
            ClusteringOrder::Desc => (upper, lower),
        };
        break;
    }

    if !prefix.is_empty() {
        start = start.or_else(|| Some(ScanBound::new(prefix.clone(), true)));
        end = end.or_else(|| Some(ScanBound::new(prefix, true)));
    }

    remote_positions.extend(used);
    Some(AccessPath::Partition { key, start, end })
}

fn range_bound(prefix: &Key, column: &str, condition: &Condition) -> ScanBound {
    let key = prefix.clone().with(column, condition.value.clone());
    ScanBound::new(key, condition.op.is_inclusive())
}

/// Returns the engine orderings that produce `requested`, or `None` if the
/// clustering order cannot serve it.
///
/// `requested` must be a non-empty prefix of the clustering keys whose
/// directions all match, or all reverse, the declared clustering orders.
pub fn clustering_sort(
    requested: &[(String, ClusteringOrder)],
    columns: &ColumnMetadata,
) -> Option<Vec<ScanOrdering>> {
    if requested.is_empty() || requested.len() > columns.clustering_keys.len() {
        return None;
    }

    let mut same_order = None;
    let mut orderings = Vec::with_capacity(requested.len());
    for ((column, direction), (name, declared)) in requested.iter().zip(&columns.clustering_keys) {
        if column != name {
            return None;
        }
        let same = direction == declared;
        if *same_order.get_or_insert(same) != same {
            return None;
        }
        orderings.push(ScanOrdering {
            column: column.clone(),
            order: *direction,
        });
    }
    Some(orderings)
}

/// Estimates the number of rows a plan returns.
pub fn estimate_rows(plan: &ScanPlan, base_rows: f64) -> f64 {
    if plan.is_pushed_down() {
        DEFAULT_ROWS_FOR_PARTITION_KEY_SCAN
    } else {
        base_rows
    }
}
