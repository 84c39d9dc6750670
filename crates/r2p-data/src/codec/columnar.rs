//! Named-columnar JSON encoding
//!
//! `{"<col>": {"type": "<dtype>", "data": "<base64>"}, ...}` where `data` is
//! the column's raw little-endian bytes. Column order is preserved.

use std::borrow::Cow;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use indexmap::IndexMap;
use r2p_core::{with_column_values, Column, ColumnData, DType, Table};
use serde::{Deserialize, Serialize};

use super::{from_le_bytes, to_le_bytes};
use crate::{DataError, EncoderConfig};

/// One encoded column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedColumn {
    /// Element type tag; kept as text so unknown tags surface as decode errors
    #[serde(rename = "type")]
    pub dtype: String,
    /// Base64 of the little-endian element bytes
    pub data: String,
}

/// Column name -> encoded column, in table order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnarPayload {
    columns: IndexMap<String, EncodedColumn>,
}

impl ColumnarPayload {
    pub fn get(&self, name: &str) -> Option<&EncodedColumn> {
        self.columns.get(name)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &EncodedColumn)> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn insert(&mut self, name: impl Into<String>, column: EncodedColumn) {
        self.columns.insert(name.into(), column);
    }

    pub fn to_json(&self) -> Result<String, DataError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Encode every column of `table`, narrowing 64-bit integers per `config`
pub fn encode_columns(table: &Table, config: &EncoderConfig) -> Result<ColumnarPayload, DataError> {
    let mut payload = ColumnarPayload::default();

    for (name, column) in table.columns() {
        if column.arity() != 1 {
            return Err(DataError::UnsupportedArity {
                column: name.to_string(),
                arity: column.arity(),
            });
        }

        let data = narrow(name, column.data(), config)?;
        let bytes = with_column_values!(data.as_ref(), v => to_le_bytes(v));

        payload.insert(
            name,
            EncodedColumn {
                dtype: data.dtype().as_str().to_string(),
                data: STANDARD.encode(bytes),
            },
        );
    }

    Ok(payload)
}

fn narrow<'a>(
    name: &str,
    data: &'a ColumnData,
    config: &EncoderConfig,
) -> Result<Cow<'a, ColumnData>, DataError> {
    match data {
        ColumnData::Int64(values) => Ok(Cow::Owned(ColumnData::Int32(
            config.narrowing.narrow_i64(name, values)?,
        ))),
        ColumnData::UInt64(values) => Ok(Cow::Owned(ColumnData::UInt32(
            config.narrowing.narrow_u64(name, values)?,
        ))),
        other => Ok(Cow::Borrowed(other)),
    }
}

/// Rebuild a table from a columnar payload.
///
/// Fails on unknown type tags, malformed base64, byte counts that are not a
/// whole number of elements, and columns of different lengths.
pub fn decode_columns(payload: &ColumnarPayload) -> Result<Table, DataError> {
    let mut table = Table::new();
    for (name, encoded) in payload.columns() {
        table.push_column(name, decode_column(name, encoded)?)?;
    }
    Ok(table)
}

fn decode_column(name: &str, encoded: &EncodedColumn) -> Result<Column, DataError> {
    let dtype: DType = encoded
        .dtype
        .parse()
        .map_err(|_| DataError::UnknownType {
            column: name.to_string(),
            tag: encoded.dtype.clone(),
        })?;

    let bytes = STANDARD
        .decode(encoded.data.as_bytes())
        .map_err(|source| DataError::Base64 {
            column: name.to_string(),
            source,
        })?;

    if bytes.len() % dtype.width() != 0 {
        return Err(DataError::TruncatedColumn {
            column: name.to_string(),
            len: bytes.len(),
            width: dtype.width(),
        });
    }

    let data = match dtype {
        DType::Int8 => ColumnData::Int8(from_le_bytes(&bytes)),
        DType::Int16 => ColumnData::Int16(from_le_bytes(&bytes)),
        DType::Int32 => ColumnData::Int32(from_le_bytes(&bytes)),
        DType::Int64 => ColumnData::Int64(from_le_bytes(&bytes)),
        DType::UInt8 => ColumnData::UInt8(from_le_bytes(&bytes)),
        DType::UInt16 => ColumnData::UInt16(from_le_bytes(&bytes)),
        DType::UInt32 => ColumnData::UInt32(from_le_bytes(&bytes)),
        DType::UInt64 => ColumnData::UInt64(from_le_bytes(&bytes)),
        DType::Float32 => ColumnData::Float32(from_le_bytes(&bytes)),
        DType::Float64 => ColumnData::Float64(from_le_bytes(&bytes)),
    };

    Ok(Column::new(data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NarrowingPolicy;

    fn sample_table() -> Table {
        Table::new()
            .with_column("i8", vec![-128i8, 0, 127])
            .and_then(|t| t.with_column("u16", vec![0u16, 1, u16::MAX]))
            .and_then(|t| t.with_column("i32", vec![i32::MIN, 7, i32::MAX]))
            .and_then(|t| t.with_column("u32", vec![0u32, 3, u32::MAX]))
            .and_then(|t| t.with_column("f32", vec![f32::NAN, -0.0, 1e-30]))
            .and_then(|t| t.with_column("f64", vec![f64::INFINITY, 0.1, -2.5]))
            .unwrap()
    }

    #[test]
    fn test_round_trip_is_exact() {
        let table = sample_table();
        let payload = encode_columns(&table, &EncoderConfig::default()).unwrap();
        let decoded = decode_columns(&payload).unwrap();

        assert_eq!(decoded.column_names().collect::<Vec<_>>(), vec!["i8", "u16", "i32", "u32", "f32", "f64"]);
        for (name, column) in table.columns() {
            let back = decoded.column(name).unwrap();
            assert_eq!(back.dtype(), column.dtype());
            // Compare bit patterns so NaN and -0.0 count
            let bits = |c: &Column| with_column_values!(c.data(), v => to_le_bytes(v));
            assert_eq!(bits(back), bits(column), "column {}", name);
        }
    }

    #[test]
    fn test_wire_format() {
        let table = Table::new().with_column("t", vec![1i32, 2]).unwrap();
        let json = encode_columns(&table, &EncoderConfig::default())
            .unwrap()
            .to_json()
            .unwrap();
        assert_eq!(json, r#"{"t":{"type":"int32","data":"AQAAAAIAAAA="}}"#);
    }

    #[test]
    fn test_int64_narrowed() {
        let table = Table::new()
            .with_column("i", vec![-5i64, i32::MAX as i64])
            .and_then(|t| t.with_column("u", vec![9u64, 10]))
            .unwrap();
        let payload = encode_columns(&table, &EncoderConfig::default()).unwrap();
        assert_eq!(payload.get("i").unwrap().dtype, "int32");
        assert_eq!(payload.get("u").unwrap().dtype, "uint32");

        let decoded = decode_columns(&payload).unwrap();
        assert_eq!(decoded.column("i").unwrap().data(), &ColumnData::Int32(vec![-5, i32::MAX]));
        assert_eq!(decoded.column("u").unwrap().data(), &ColumnData::UInt32(vec![9, 10]));
    }

    #[test]
    fn test_out_of_range_int64() {
        let table = Table::new().with_column("big", vec![1i64 << 40, 3]).unwrap();

        // Default policy truncates to the low 32 bits
        let payload = encode_columns(&table, &EncoderConfig::default()).unwrap();
        let decoded = decode_columns(&payload).unwrap();
        assert_eq!(decoded.column("big").unwrap().data(), &ColumnData::Int32(vec![0, 3]));

        let strict = EncoderConfig {
            narrowing: NarrowingPolicy::Reject,
        };
        assert!(matches!(
            encode_columns(&table, &strict),
            Err(DataError::NarrowingOverflow { .. })
        ));
    }

    #[test]
    fn test_decode_accepts_64_bit_tags() {
        let mut payload = ColumnarPayload::default();
        payload.insert(
            "x",
            EncodedColumn {
                dtype: "int64".to_string(),
                data: STANDARD.encode(to_le_bytes(&[1i64 << 40])),
            },
        );
        let table = decode_columns(&payload).unwrap();
        assert_eq!(table.column("x").unwrap().data(), &ColumnData::Int64(vec![1 << 40]));
    }

    #[test]
    fn test_decode_errors() {
        let bad = |dtype: &str, data: &str| {
            let mut payload = ColumnarPayload::default();
            payload.insert(
                "x",
                EncodedColumn {
                    dtype: dtype.to_string(),
                    data: data.to_string(),
                },
            );
            decode_columns(&payload).unwrap_err()
        };

        assert!(matches!(bad("complex64", "AAAA"), DataError::UnknownType { .. }));
        assert!(matches!(bad("int32", "!!!"), DataError::Base64 { .. }));
        assert!(matches!(bad("int32", "AAAA"), DataError::TruncatedColumn { len: 3, width: 4, .. }));
    }

    #[test]
    fn test_mismatched_lengths_rejected() {
        let json = r#"{"a":{"type":"uint8","data":"AQI="},"b":{"type":"uint8","data":"AQ=="}}"#;
        let payload = ColumnarPayload::from_json(json).unwrap();
        assert!(matches!(decode_columns(&payload), Err(DataError::Table(_))));
    }

    #[test]
    fn test_distribution_columns_rejected() {
        let column = Column::with_arity(ColumnData::Float32(vec![1.0, 2.0]), 2).unwrap();
        let table = Table::from_columns([("d", column)]).unwrap();
        assert!(matches!(
            encode_columns(&table, &EncoderConfig::default()),
            Err(DataError::UnsupportedArity { arity: 2, .. })
        ));
    }

    #[test]
    fn test_empty_table() {
        let table = Table::new().with_column("x", Vec::<f64>::new()).unwrap();
        let payload = encode_columns(&table, &EncoderConfig::default()).unwrap();
        assert_eq!(payload.get("x").unwrap().data, "");
        let decoded = decode_columns(&payload).unwrap();
        assert_eq!(decoded.row_count(), 0);
        assert_eq!(decoded.column_count(), 1);

        assert!(decode_columns(&ColumnarPayload::default()).unwrap().is_empty());
    }
}
