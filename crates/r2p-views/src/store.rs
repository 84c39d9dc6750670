//! Client-side table store

use std::sync::Arc;

use r2p_core::{GroupIndex, Table, TableError};
use r2p_data::{DataError, Encoding, TransportPayload};

use crate::ViewError;

/// A freshly decoded table and, for grouped views, its index
#[derive(Debug, Clone)]
pub struct Refreshed {
    pub table: Arc<Table>,
    pub index: Option<GroupIndex>,
}

/// Holds the decoded table of one view instance
#[derive(Debug, Clone, Default)]
pub struct TableStore {
    index_column: Option<String>,
    encoding: Encoding,
    table: Option<Arc<Table>>,
}

impl TableStore {
    pub fn new(index_column: Option<String>, encoding: Encoding) -> Self {
        Self {
            index_column,
            encoding,
            table: None,
        }
    }

    pub fn index_column(&self) -> Option<&str> {
        self.index_column.as_deref()
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    /// The current table, if any refresh succeeded yet
    pub fn table(&self) -> Option<&Arc<Table>> {
        self.table.as_ref()
    }

    /// Decode `payload` and replace the current table.
    ///
    /// Decoding and index derivation both finish before anything is
    /// replaced; on error the previous table stays current.
    pub fn refresh(&mut self, payload: &TransportPayload) -> Result<Refreshed, ViewError> {
        let table = self.encoding.decode(payload).map_err(|e| match e {
            DataError::PayloadMismatch { expected } => ViewError::PayloadMismatch { expected },
            other => ViewError::Data(other),
        })?;

        let index = match &self.index_column {
            Some(column) => Some(derive_index(&table, column)?),
            None => None,
        };

        let table = Arc::new(table);
        self.table = Some(Arc::clone(&table));

        tracing::debug!(
            "Table refreshed: {} rows, {} columns{}",
            table.row_count(),
            table.column_count(),
            index
                .as_ref()
                .map(|i| format!(", {} groups", i.group_count()))
                .unwrap_or_default()
        );

        Ok(Refreshed { table, index })
    }
}

fn derive_index(table: &Table, column: &str) -> Result<GroupIndex, ViewError> {
    GroupIndex::from_table(table, column).map_err(|e| match e {
        TableError::MissingColumn(name) => ViewError::MissingIndexColumn(name),
        other => ViewError::Data(DataError::Table(other)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use r2p_data::{Encoder, EncoderConfig, RecordLayout};

    fn payload(table: &Table) -> TransportPayload {
        Encoder::default().encode(table).unwrap()
    }

    #[test]
    fn test_refresh_derives_index() {
        let table = Table::new()
            .with_column("t", vec![3i64, 1, 2, 2, 1])
            .unwrap();
        let mut store = TableStore::new(Some("t".into()), Encoding::Columnar);

        let refreshed = store.refresh(&payload(&table)).unwrap();
        let index = refreshed.index.unwrap();
        assert_eq!(index.values(), &[1, 2, 3]);
        assert_eq!(index.rows_for(2), vec![2, 3]);
        assert_eq!(store.table().unwrap().row_count(), 5);
    }

    #[test]
    fn test_missing_index_column_keeps_previous_table() {
        let good = Table::new().with_column("t", vec![0i32]).unwrap();
        let bad = Table::new().with_column("x", vec![1.0f32, 2.0]).unwrap();
        let mut store = TableStore::new(Some("t".into()), Encoding::Columnar);

        store.refresh(&payload(&good)).unwrap();
        let err = store.refresh(&payload(&bad)).unwrap_err();

        assert!(matches!(err, ViewError::MissingIndexColumn(ref c) if c == "t"));
        assert_eq!(store.table().unwrap().column_names().collect::<Vec<_>>(), vec!["t"]);
    }

    #[test]
    fn test_decode_failure_keeps_previous_table() {
        let good = Table::new().with_column("x", vec![1.0f32]).unwrap();
        let mut store = TableStore::default();
        store.refresh(&payload(&good)).unwrap();

        let corrupt = TransportPayload::from_json(r#"{"x":{"type":"float32","data":"AAA"}}"#).unwrap();
        assert!(matches!(store.refresh(&corrupt), Err(ViewError::Data(_))));
        assert_eq!(store.table().unwrap().column("x").unwrap().value(0), Some(1.0));
    }

    #[test]
    fn test_records_payload_on_columnar_store() {
        let layout = RecordLayout::scalars(["x"]).unwrap();
        let table = Table::new().with_column("x", vec![1.0f32]).unwrap();
        let records = Encoder::new(Encoding::Records(layout), EncoderConfig::default())
            .encode(&table)
            .unwrap();

        let mut store = TableStore::default();
        assert!(matches!(
            store.refresh(&records),
            Err(ViewError::PayloadMismatch { expected: "columnar" })
        ));
        assert!(store.table().is_none());
    }
}
