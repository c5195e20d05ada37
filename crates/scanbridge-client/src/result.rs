//! Scan results.
//!
//! [`ResultSequence`] pulls rows from an engine scanner one at a time.
//! [`ResultAdapter`] maps rows onto the attribute layout of the caller.

use std::iter::FusedIterator;

use scanbridge_storage::{ResultRow, Scanner, Value};
use tracing::debug;

use crate::error::BridgeResult;

/// Returns the number of columns present in `row`.
///
/// Unset columns are present as NULL, so this is the number of projected
/// columns (or declared columns when the scan had no projections).
pub fn column_count(row: &ResultRow) -> usize {
    row.num_columns()
}

/// A lazy, forward-only sequence of scan results.
///
/// Once the engine reports exhaustion or an error, the sequence yields `None`
/// forever and the underlying scanner is released. The connection that
/// produced the sequence must stay open while it is consumed.
pub struct ResultSequence {
    scanner: Option<Box<dyn Scanner>>,
    label: String,
    rows_read: usize,
}

impl ResultSequence {
    /// Wraps an engine scanner. `label` identifies the scan in logs.
    pub fn new(scanner: Box<dyn Scanner>, label: impl Into<String>) -> Self {
        Self {
            scanner: Some(scanner),
            label: label.into(),
            rows_read: 0,
        }
    }

    /// Returns the number of rows yielded so far.
    pub fn rows_read(&self) -> usize {
        self.rows_read
    }

    /// Returns true once the scanner has been released.
    pub fn is_finished(&self) -> bool {
        self.scanner.is_none()
    }

    /// Releases the scanner without reading the remaining rows.
    pub fn close(&mut self) {
        if let Some(mut scanner) = self.scanner.take() {
            scanner.close();
            debug!("{} released after {} rows", self.label, self.rows_read);
        }
    }
}

impl Iterator for ResultSequence {
    type Item = BridgeResult<ResultRow>;

    fn next(&mut self) -> Option<Self::Item> {
        let scanner = self.scanner.as_mut()?;
        match scanner.one() {
            Ok(Some(row)) => {
                self.rows_read += 1;
                Some(Ok(row))
            }
            Ok(None) => {
                self.close();
                None
            }
            Err(e) => {
                self.close();
                Some(Err(e.into()))
            }
        }
    }
}

impl FusedIterator for ResultSequence {}

impl Drop for ResultSequence {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ResultSequence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSequence")
            .field("label", &self.label)
            .field("rows_read", &self.rows_read)
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Maps result rows onto a fixed attribute layout.
#[derive(Debug, Clone)]
pub struct ResultAdapter {
    attribute_names: Vec<String>,
}

impl ResultAdapter {
    /// Creates an adapter for the given attribute names, in output order.
    pub fn new<I, S>(attribute_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            attribute_names: attribute_names.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the number of output attributes.
    pub fn width(&self) -> usize {
        self.attribute_names.len()
    }

    /// Returns the attribute names.
    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    /// Returns one value per attribute: `None` for NULL or for a column the
    /// row does not carry.
    pub fn adapt(&self, row: &ResultRow) -> Vec<Option<Value>> {
        self.attribute_names
            .iter()
            .map(|name| row.get(name).filter(|v| !v.is_null()).cloned())
            .collect()
    }
}
