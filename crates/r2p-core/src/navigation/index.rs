//! Group index derived from an integer key column

use crate::{Table, TableError};

/// Per-row keys of the index column plus their sorted unique values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupIndex {
    column: String,
    row_keys: Vec<i64>,
    values: Vec<i64>,
}

impl GroupIndex {
    /// Build an index from per-row keys
    pub fn from_keys(column: impl Into<String>, row_keys: Vec<i64>) -> Self {
        let mut values = row_keys.clone();
        values.sort_unstable();
        values.dedup();

        Self {
            column: column.into(),
            row_keys,
            values,
        }
    }

    /// Build an index from a column of `table`
    pub fn from_table(table: &Table, column: &str) -> Result<Self, TableError> {
        let row_keys = table.index_keys(column)?;
        Ok(Self::from_keys(column, row_keys))
    }

    /// Name of the key column
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Sorted unique key values
    pub fn values(&self) -> &[i64] {
        &self.values
    }

    /// Key of every row, in row order
    pub fn row_keys(&self) -> &[i64] {
        &self.row_keys
    }

    pub fn group_count(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value_at(&self, position: usize) -> Option<i64> {
        self.values.get(position).copied()
    }

    pub fn position_of(&self, value: i64) -> Option<usize> {
        self.values.binary_search(&value).ok()
    }

    /// Rows whose key equals `value`, ascending.
    ///
    /// Linear in the row count; a view's table is small enough that this
    /// runs on every transition.
    pub fn rows_for(&self, value: i64) -> Vec<usize> {
        self.row_keys
            .iter()
            .enumerate()
            .filter(|(_, &key)| key == value)
            .map(|(row, _)| row)
            .collect()
    }

    /// Number of configuration slots, `max(key) + 1`, used by distribution lists.
    ///
    /// Fails when the largest key leaves no representable slot count.
    pub fn slot_count(&self) -> Result<usize, TableError> {
        let max = match self.values.last() {
            Some(&max) => max.max(-1),
            None => return Ok(0),
        };
        max.checked_add(1)
            .and_then(|count| usize::try_from(count).ok())
            .ok_or_else(|| TableError::SlotOverflow {
                name: self.column.clone(),
                value: max,
            })
    }
}
