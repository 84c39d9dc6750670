//! Arrow `RecordBatch` ingestion
//!
//! Data frames usually reach us as Arrow record batches. Only the ten
//! primitive numeric types map onto table columns; nulls have no
//! representation on the wire and are rejected.

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{
    ArrowPrimitiveType, DataType, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type,
    Int8Type, UInt16Type, UInt32Type, UInt64Type, UInt8Type,
};
use arrow::record_batch::RecordBatch;
use r2p_core::{ColumnData, Table};

use crate::DataError;

/// Convert every column of `batch` into a table column, in schema order
pub fn table_from_record_batch(batch: &RecordBatch) -> Result<Table, DataError> {
    let schema = batch.schema();
    let mut table = Table::new();

    for (field, array) in schema.fields().iter().zip(batch.columns()) {
        let name = field.name();
        if array.null_count() > 0 {
            return Err(DataError::NullValues {
                column: name.clone(),
                count: array.null_count(),
            });
        }

        let data = column_data(name, array)?;
        table.push_column(name.clone(), data)?;
    }

    tracing::debug!(
        "Loaded record batch: {} rows, {} columns",
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

fn column_data(name: &str, array: &ArrayRef) -> Result<ColumnData, DataError> {
    let data = match array.data_type() {
        DataType::Int8 => ColumnData::Int8(values::<Int8Type>(array)),
        DataType::Int16 => ColumnData::Int16(values::<Int16Type>(array)),
        DataType::Int32 => ColumnData::Int32(values::<Int32Type>(array)),
        DataType::Int64 => ColumnData::Int64(values::<Int64Type>(array)),
        DataType::UInt8 => ColumnData::UInt8(values::<UInt8Type>(array)),
        DataType::UInt16 => ColumnData::UInt16(values::<UInt16Type>(array)),
        DataType::UInt32 => ColumnData::UInt32(values::<UInt32Type>(array)),
        DataType::UInt64 => ColumnData::UInt64(values::<UInt64Type>(array)),
        DataType::Float32 => ColumnData::Float32(values::<Float32Type>(array)),
        DataType::Float64 => ColumnData::Float64(values::<Float64Type>(array)),
        other => {
            return Err(DataError::UnsupportedArrowType {
                column: name.to_string(),
                data_type: other.to_string(),
            })
        }
    };
    Ok(data)
}

fn values<T: ArrowPrimitiveType>(array: &ArrayRef) -> Vec<T::Native> {
    array.as_primitive::<T>().values().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Float32Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use std::sync::Arc;

    #[test]
    fn test_primitive_columns() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("i_timestep", DataType::Int64, false),
            Field::new("loss", DataType::Float32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![0, 0, 1])),
                Arc::new(Float32Array::from(vec![0.5, 0.25, 0.125])),
            ],
        )
        .unwrap();

        let table = table_from_record_batch(&batch).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(
            table.column("i_timestep").unwrap().data(),
            &ColumnData::Int64(vec![0, 0, 1])
        );
        assert_eq!(table.column("loss").unwrap().value(2), Some(0.125));
    }

    #[test]
    fn test_nulls_rejected() {
        let schema = Arc::new(Schema::new(vec![Field::new("x", DataType::Float32, true)]));
        let batch = RecordBatch::try_new(
            schema,
            vec![Arc::new(Float32Array::from(vec![Some(1.0), None]))],
        )
        .unwrap();

        assert!(matches!(
            table_from_record_batch(&batch),
            Err(DataError::NullValues { count: 1, .. })
        ));
    }

    #[test]
    fn test_strings_rejected() {
        let schema = Arc::new(Schema::new(vec![Field::new("name", DataType::Utf8, false)]));
        let batch = RecordBatch::try_new(schema, vec![Arc::new(StringArray::from(vec!["a"]))]).unwrap();

        assert!(matches!(
            table_from_record_batch(&batch),
            Err(DataError::UnsupportedArrowType { .. })
        ));
    }
}
