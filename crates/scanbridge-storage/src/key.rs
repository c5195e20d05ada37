//! Table identifiers and key material.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Identifies a table within one engine connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableIdentifier {
    namespace: String,
    table: String,
}

impl TableIdentifier {
    /// Creates a new table identifier.
    pub fn new(namespace: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            table: table.into(),
        }
    }

    /// Returns the namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the table name.
    pub fn table(&self) -> &str {
        &self.table
    }
}

impl fmt::Display for TableIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.table)
    }
}

/// Ordered `(column, value)` pairs used as a partition, clustering or index
/// key.
///
/// Column order is significant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Key {
    columns: Vec<(String, Value)>,
}

impl Key {
    /// Creates an empty key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a key with a single column.
    pub fn of(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new().with(column, value)
    }

    /// Appends a column to the key.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(column, value);
        self
    }

    /// Appends a column to the key in place.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Returns the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the key has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the column names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Returns the values in order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.columns.iter().map(|(_, value)| value)
    }

    /// Returns the `(column, value)` pairs in order.
    pub fn columns(&self) -> &[(String, Value)] {
        &self.columns
    }

    /// Looks up a value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, "}}")
    }
}

impl<N: Into<String>, V: Into<Value>> FromIterator<(N, V)> for Key {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_identifier() {
        let id = TableIdentifier::new("ns", "orders");
        assert_eq!(id.namespace(), "ns");
        assert_eq!(id.table(), "orders");
        assert_eq!(id.to_string(), "ns.orders");
    }

    #[test]
    fn test_key_preserves_order() {
        let key = Key::new().with("b", 2).with("a", 1);
        assert_eq!(key.names().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(key.get("a"), Some(&Value::Int(1)));
        assert_eq!(key.len(), 2);
        assert_eq!(key.to_string(), "{b=2, a=1}");
    }

    #[test]
    fn test_key_from_iter() {
        let key: Key = vec![("pk", 1), ("ck", 2)].into_iter().collect();
        assert_eq!(key, Key::of("pk", 1).with("ck", 2));
        assert!(Key::new().is_empty());
    }
}
