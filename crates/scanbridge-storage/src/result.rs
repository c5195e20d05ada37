//! Result rows returned by scans.

use std::fmt;

use crate::error::{StorageError, StorageResult};
use crate::value::{DataType, Value};

/// A named column value in a result row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column value; `Null` when the column is unset.
    pub value: Value,
}

/// One row returned by a scan.
///
/// Columns keep the order of the scan's projections, or the table's declared
/// column order when the scan has no projections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResultRow {
    columns: Vec<Column>,
}

impl ResultRow {
    /// Creates a row from its columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Returns the number of columns in this row.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Returns the number of columns holding a non-NULL value.
    pub fn num_non_null(&self) -> usize {
        self.columns.iter().filter(|c| !c.value.is_null()).count()
    }

    /// Returns true if this row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns the columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Returns true if the row has the column.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the value of a column.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| &c.value)
    }

    /// Returns true if the column is NULL.
    ///
    /// Fails if the row has no such column.
    pub fn is_null(&self, name: &str) -> StorageResult<bool> {
        Ok(self.require(name)?.is_null())
    }

    /// Reads a BOOLEAN column.
    pub fn get_boolean(&self, name: &str) -> StorageResult<Option<bool>> {
        self.typed(name, DataType::Boolean, Value::as_bool)
    }

    /// Reads an INT column.
    pub fn get_int(&self, name: &str) -> StorageResult<Option<i32>> {
        self.typed(name, DataType::Int, Value::as_i32)
    }

    /// Reads a BIGINT column.
    pub fn get_bigint(&self, name: &str) -> StorageResult<Option<i64>> {
        self.typed(name, DataType::BigInt, |v| match v {
            Value::BigInt(i) => Some(*i),
            _ => None,
        })
    }

    /// Reads a FLOAT column.
    pub fn get_float(&self, name: &str) -> StorageResult<Option<f32>> {
        self.typed(name, DataType::Float, Value::as_f32)
    }

    /// Reads a DOUBLE column.
    pub fn get_double(&self, name: &str) -> StorageResult<Option<f64>> {
        self.typed(name, DataType::Double, |v| match v {
            Value::Double(f) => Some(*f),
            _ => None,
        })
    }

    /// Reads a TEXT column.
    pub fn get_text(&self, name: &str) -> StorageResult<Option<&str>> {
        self.typed(name, DataType::Text, Value::as_str)
    }

    /// Reads a BLOB column.
    pub fn get_blob(&self, name: &str) -> StorageResult<Option<&[u8]>> {
        self.typed(name, DataType::Blob, Value::as_bytes)
    }

    /// Consumes the row and returns its columns.
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    fn require(&self, name: &str) -> StorageResult<&Value> {
        self.get(name)
            .ok_or_else(|| StorageError::ColumnNotFound(name.to_string()))
    }

    fn typed<'a, T>(
        &'a self,
        name: &str,
        expected: DataType,
        extract: impl FnOnce(&'a Value) -> Option<T>,
    ) -> StorageResult<Option<T>> {
        let value = self.require(name)?;
        match value.data_type() {
            None => Ok(None),
            Some(actual) if actual == expected => Ok(extract(value)),
            Some(actual) => Err(StorageError::TypeMismatch {
                column: name.to_string(),
                expected,
                actual,
            }),
        }
    }
}

impl fmt::Display for ResultRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", column.name, column.value)?;
        }
        write!(f, ")")
    }
}

impl<N: Into<String>> FromIterator<(N, Value)> for ResultRow {
    fn from_iter<I: IntoIterator<Item = (N, Value)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(name, value)| Column {
                    name: name.into(),
                    value,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> ResultRow {
        vec![
            ("pk", Value::Int(1)),
            ("big", Value::BigInt(9)),
            ("col", Value::text("test")),
            ("missing", Value::Null),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_row_counts() {
        let row = sample_row();
        assert_eq!(row.num_columns(), 4);
        assert_eq!(row.num_non_null(), 3);
        assert_eq!(row.to_string(), "(pk=1, big=9, col='test', missing=NULL)");
    }

    #[test]
    fn test_typed_getters() {
        let row = sample_row();
        assert_eq!(row.get_int("pk").unwrap(), Some(1));
        assert_eq!(row.get_bigint("big").unwrap(), Some(9));
        assert_eq!(row.get_text("col").unwrap(), Some("test"));
        assert_eq!(row.get_text("missing").unwrap(), None);
        assert!(row.is_null("missing").unwrap());
        assert!(!row.is_null("pk").unwrap());
    }

    #[test]
    fn test_typed_getter_errors() {
        let row = sample_row();
        assert!(matches!(
            row.get_text("pk"),
            Err(StorageError::TypeMismatch { .. })
        ));
        assert!(matches!(
            row.get_int("nope"),
            Err(StorageError::ColumnNotFound(_))
        ));
    }
}
