//! Columnar table model
//!
//! A [`Table`] is an ordered set of named numeric columns that all hold the
//! same number of rows. It is the unit that gets encoded, shipped to a view
//! and decoded again, so it stays deliberately small: typed vectors, an arity
//! for distribution-valued columns, and a handful of row helpers.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::TableError;

/// Element type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl DType {
    /// Type tag used on the wire (`"int32"`, `"float64"`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        }
    }

    /// Width of one element in bytes
    pub fn width(&self) -> usize {
        match self {
            DType::Int8 | DType::UInt8 => 1,
            DType::Int16 | DType::UInt16 => 2,
            DType::Int32 | DType::UInt32 | DType::Float32 => 4,
            DType::Int64 | DType::UInt64 | DType::Float64 => 8,
        }
    }

    pub fn is_integer(&self) -> bool {
        !matches!(self, DType::Float32 | DType::Float64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a type tag is not one of the supported element types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown data type: {0}")]
pub struct ParseDTypeError(pub String);

impl FromStr for DType {
    type Err = ParseDTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int8" => Ok(DType::Int8),
            "int16" => Ok(DType::Int16),
            "int32" => Ok(DType::Int32),
            "int64" => Ok(DType::Int64),
            "uint8" => Ok(DType::UInt8),
            "uint16" => Ok(DType::UInt16),
            "uint32" => Ok(DType::UInt32),
            "uint64" => Ok(DType::UInt64),
            "float32" => Ok(DType::Float32),
            "float64" => Ok(DType::Float64),
            other => Err(ParseDTypeError(other.to_string())),
        }
    }
}

/// Typed storage for one column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
}

/// Run `$body` with `$v` bound to the inner vector, whatever its type.
#[macro_export]
macro_rules! with_column_values {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            $crate::ColumnData::Int8($v) => $body,
            $crate::ColumnData::Int16($v) => $body,
            $crate::ColumnData::Int32($v) => $body,
            $crate::ColumnData::Int64($v) => $body,
            $crate::ColumnData::UInt8($v) => $body,
            $crate::ColumnData::UInt16($v) => $body,
            $crate::ColumnData::UInt32($v) => $body,
            $crate::ColumnData::UInt64($v) => $body,
            $crate::ColumnData::Float32($v) => $body,
            $crate::ColumnData::Float64($v) => $body,
        }
    };
}

/// Like [`with_column_values!`] but rewraps the resulting vector in the
/// same variant.
macro_rules! map_column_values {
    ($data:expr, $v:ident => $body:expr) => {
        match $data {
            ColumnData::Int8($v) => ColumnData::Int8($body),
            ColumnData::Int16($v) => ColumnData::Int16($body),
            ColumnData::Int32($v) => ColumnData::Int32($body),
            ColumnData::Int64($v) => ColumnData::Int64($body),
            ColumnData::UInt8($v) => ColumnData::UInt8($body),
            ColumnData::UInt16($v) => ColumnData::UInt16($body),
            ColumnData::UInt32($v) => ColumnData::UInt32($body),
            ColumnData::UInt64($v) => ColumnData::UInt64($body),
            ColumnData::Float32($v) => ColumnData::Float32($body),
            ColumnData::Float64($v) => ColumnData::Float64($body),
        }
    };
}

macro_rules! impl_from_vec {
    ($($t:ty => $variant:ident),*) => {
        $(
            impl From<Vec<$t>> for ColumnData {
                fn from(values: Vec<$t>) -> Self {
                    ColumnData::$variant(values)
                }
            }

            impl From<Vec<$t>> for Column {
                fn from(values: Vec<$t>) -> Self {
                    Column::new(ColumnData::$variant(values))
                }
            }
        )*
    }
}

impl_from_vec!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float32,
    f64 => Float64
);

impl ColumnData {
    pub fn dtype(&self) -> DType {
        match self {
            ColumnData::Int8(_) => DType::Int8,
            ColumnData::Int16(_) => DType::Int16,
            ColumnData::Int32(_) => DType::Int32,
            ColumnData::Int64(_) => DType::Int64,
            ColumnData::UInt8(_) => DType::UInt8,
            ColumnData::UInt16(_) => DType::UInt16,
            ColumnData::UInt32(_) => DType::UInt32,
            ColumnData::UInt64(_) => DType::UInt64,
            ColumnData::Float32(_) => DType::Float32,
            ColumnData::Float64(_) => DType::Float64,
        }
    }

    /// Number of elements (not rows)
    pub fn len(&self) -> usize {
        with_column_values!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element `i` widened to `f64`
    pub fn get_f64(&self, i: usize) -> Option<f64> {
        with_column_values!(self, v => v.get(i).map(|x| *x as f64))
    }

    /// All elements widened to `f64`
    pub fn to_f64_vec(&self) -> Vec<f64> {
        with_column_values!(self, v => v.iter().map(|x| *x as f64).collect())
    }

    /// Elements at the given element positions, in the given order
    pub fn take(&self, positions: &[usize]) -> ColumnData {
        map_column_values!(self, v => positions.iter().map(|&i| v[i]).collect())
    }
}

/// A column: typed elements plus the number of elements each row owns
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    data: ColumnData,
    arity: usize,
}

impl Column {
    /// Scalar column, one element per row
    pub fn new(data: ColumnData) -> Self {
        Self { data, arity: 1 }
    }

    /// Distribution-valued column: row `r` owns elements `[r*arity, (r+1)*arity)`
    pub fn with_arity(data: ColumnData, arity: usize) -> Result<Self, TableError> {
        if arity == 0 || data.len() % arity != 0 {
            return Err(TableError::InvalidArity {
                len: data.len(),
                arity,
            });
        }
        Ok(Self { data, arity })
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn into_data(self) -> ColumnData {
        self.data
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    pub fn rows(&self) -> usize {
        self.data.len() / self.arity
    }

    /// Value of a scalar row, widened to `f64`
    pub fn value(&self, row: usize) -> Option<f64> {
        if row >= self.rows() {
            return None;
        }
        self.data.get_f64(row * self.arity)
    }

    /// All elements of one row, widened to `f64`
    pub fn row_values(&self, row: usize) -> Vec<f64> {
        if row >= self.rows() {
            return Vec::new();
        }
        (row * self.arity..(row + 1) * self.arity)
            .filter_map(|i| self.data.get_f64(i))
            .collect()
    }

    /// Rows at the given positions, in order. Panics if a row is out of range.
    pub fn take_rows(&self, rows: &[usize]) -> Column {
        let positions: Vec<usize> = rows
            .iter()
            .flat_map(|&r| r * self.arity..(r + 1) * self.arity)
            .collect();
        Column {
            data: self.data.take(&positions),
            arity: self.arity,
        }
    }

    /// Smallest and largest element, ignoring NaN
    pub fn extent(&self) -> Option<(f64, f64)> {
        self.data
            .to_f64_vec()
            .into_iter()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

impl From<ColumnData> for Column {
    fn from(data: ColumnData) -> Self {
        Column::new(data)
    }
}

/// Ordered set of equal-length named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: IndexMap<String, Column>,
}

impl Table {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table, checking names and row counts
    pub fn from_columns<I, S>(columns: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (S, Column)>,
        S: Into<String>,
    {
        let mut table = Table::new();
        for (name, column) in columns {
            table.push_column(name, column)?;
        }
        Ok(table)
    }

    /// Builder form of [`Table::push_column`]
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        column: impl Into<Column>,
    ) -> Result<Self, TableError> {
        self.push_column(name, column)?;
        Ok(self)
    }

    /// Append a column. Names must be unique and row counts must match.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        column: impl Into<Column>,
    ) -> Result<(), TableError> {
        let name = name.into();
        let column = column.into();

        if self.columns.contains_key(&name) {
            return Err(TableError::DuplicateColumn(name));
        }
        if let Some((_, first)) = self.columns.first() {
            if first.rows() != column.rows() {
                return Err(TableError::LengthMismatch {
                    name,
                    expected: first.rows(),
                    actual: column.rows(),
                });
            }
        }

        self.columns.insert(name, column);
        Ok(())
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map(|(_, c)| c.rows()).unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    /// Like [`Table::column`] but a missing column is an error
    pub fn require(&self, name: &str) -> Result<&Column, TableError> {
        self.columns
            .get(name)
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Sub-table holding only the given rows, in the given order
    pub fn take_rows(&self, rows: &[usize]) -> Table {
        Table {
            columns: self
                .columns
                .iter()
                .map(|(name, column)| (name.clone(), column.take_rows(rows)))
                .collect(),
        }
    }

    /// Values of an integer-valued scalar column as `i64` grouping keys.
    ///
    /// Float columns are accepted when every value is integral, which is what
    /// the row-major encoding produces for index columns.
    pub fn index_keys(&self, name: &str) -> Result<Vec<i64>, TableError> {
        let column = self.require(name)?;
        if column.arity() != 1 {
            return Err(TableError::IndexArity {
                name: name.to_string(),
                arity: column.arity(),
            });
        }

        let non_integer = |value: f64| TableError::NonIntegerIndex {
            name: name.to_string(),
            value,
        };

        match column.data() {
            ColumnData::Float32(_) | ColumnData::Float64(_) => column
                .data()
                .to_f64_vec()
                .into_iter()
                .map(|v| {
                    if v.is_finite() && v.fract() == 0.0 {
                        Ok(v as i64)
                    } else {
                        Err(non_integer(v))
                    }
                })
                .collect(),
            ColumnData::UInt64(values) => values
                .iter()
                .map(|&v| i64::try_from(v).map_err(|_| non_integer(v as f64)))
                .collect(),
            data => Ok(with_column_values!(data, v => v.iter().map(|&x| x as i64).collect())),
        }
    }
}
