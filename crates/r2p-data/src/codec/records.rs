//! Row-major record encoding
//!
//! One line per row: base64 of a fixed-width record of little-endian float32
//! values, laid out by a [`RecordLayout`] that travels separately. Values are
//! stored as float32, so round trips are exact only up to float32 precision.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use r2p_core::{Column, ColumnData, Table};

use super::{from_le_bytes, to_le_bytes};
use crate::{DataError, RecordLayout};

/// Encode `table` as newline-delimited base64 records.
///
/// Every layout field must name a column of `table` with the same arity.
pub fn encode_records(table: &Table, layout: &RecordLayout) -> Result<String, DataError> {
    let columns = layout
        .fields()
        .iter()
        .map(|field| {
            let column = table.require(&field.name)?;
            if column.arity() != field.arity {
                return Err(DataError::ArityMismatch {
                    field: field.name.clone(),
                    expected: field.arity,
                    actual: column.arity(),
                });
            }
            Ok(column.data().to_f64_vec())
        })
        .collect::<Result<Vec<_>, DataError>>()?;

    let mut lines = Vec::with_capacity(table.row_count());
    let mut record: Vec<f32> = Vec::with_capacity(layout.record_width());

    for row in 0..table.row_count() {
        record.clear();
        for (field, values) in layout.fields().iter().zip(&columns) {
            let start = row * field.arity;
            record.extend(values[start..start + field.arity].iter().map(|&v| v as f32));
        }
        lines.push(STANDARD.encode(to_le_bytes(&record)));
    }

    Ok(lines.join("\n"))
}

/// Decode a record body into float32 columns, one per layout field.
///
/// Blank lines (including a trailing newline) are skipped; any other line
/// must decode to exactly one record.
pub fn decode_records(body: &str, layout: &RecordLayout) -> Result<Table, DataError> {
    let mut values: Vec<Vec<f32>> = vec![Vec::new(); layout.fields().len()];
    let expected = layout.record_bytes();

    for (line_no, line) in body.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let bytes = STANDARD
            .decode(line.as_bytes())
            .map_err(|source| DataError::RecordBase64 {
                line: line_no,
                source,
            })?;
        if bytes.len() != expected {
            return Err(DataError::TruncatedRecord {
                line: line_no,
                expected,
                actual: bytes.len(),
            });
        }

        let record: Vec<f32> = from_le_bytes(&bytes);
        let mut offset = 0;
        for (field, out) in layout.fields().iter().zip(values.iter_mut()) {
            out.extend_from_slice(&record[offset..offset + field.arity]);
            offset += field.arity;
        }
    }

    let mut table = Table::new();
    for (field, data) in layout.fields().iter().zip(values) {
        let column = Column::with_arity(ColumnData::Float32(data), field.arity)?;
        table.push_column(field.name.clone(), column)?;
    }

    tracing::trace!("Decoded {} records", table.row_count());
    Ok(table)
}
