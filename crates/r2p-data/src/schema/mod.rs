use std::collections::HashSet;

use r2p_core::Table;
use serde::{Deserialize, Serialize};

use crate::DataError;

fn scalar_arity() -> usize {
    1
}

/// One field of a row-major record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    /// float32 elements this field occupies in each record
    #[serde(default = "scalar_arity")]
    pub arity: usize,
}

impl FieldSpec {
    pub fn scalar(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arity: 1,
        }
    }

    pub fn distribution(name: impl Into<String>, arity: usize) -> Self {
        Self {
            name: name.into(),
            arity,
        }
    }
}

/// Side-band header of the row-major encoding: ordered fields and their arity.
///
/// Every record is `record_width()` little-endian float32 values, fields laid
/// out back to back in layout order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldSpec>", into = "Vec<FieldSpec>")]
pub struct RecordLayout {
    fields: Vec<FieldSpec>,
}

impl RecordLayout {
    /// Build a layout; names must be unique and arities non-zero
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, DataError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if field.arity == 0 {
                return Err(DataError::InvalidLayout(format!(
                    "field '{}' has arity 0",
                    field.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(DataError::InvalidLayout(format!(
                    "duplicate field '{}'",
                    field.name
                )));
            }
        }
        Ok(Self { fields })
    }

    /// Layout of scalar fields
    pub fn scalars<I, S>(names: I) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(FieldSpec::scalar).collect())
    }

    /// Layout where every field holds the same number of elements
    pub fn uniform<I, S>(names: I, arity: usize) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            names
                .into_iter()
                .map(|name| FieldSpec::distribution(name, arity))
                .collect(),
        )
    }

    /// Layout matching every column of `table`, in column order
    pub fn from_table(table: &Table) -> Result<Self, DataError> {
        Self::new(
            table
                .columns()
                .map(|(name, column)| FieldSpec::distribution(name, column.arity()))
                .collect(),
        )
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// float32 elements per record
    pub fn record_width(&self) -> usize {
        self.fields.iter().map(|f| f.arity).sum()
    }

    /// Bytes per record
    pub fn record_bytes(&self) -> usize {
        self.record_width() * std::mem::size_of::<f32>()
    }
}

impl TryFrom<Vec<FieldSpec>> for RecordLayout {
    type Error = DataError;

    fn try_from(fields: Vec<FieldSpec>) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

impl From<RecordLayout> for Vec<FieldSpec> {
    fn from(layout: RecordLayout) -> Self {
        layout.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_width() {
        let layout = RecordLayout::new(vec![
            FieldSpec::scalar("i_timestep"),
            FieldSpec::distribution("loss", 8),
        ])
        .unwrap();
        assert_eq!(layout.record_width(), 9);
        assert_eq!(layout.record_bytes(), 36);
    }

    #[test]
    fn test_invalid_layouts() {
        assert!(RecordLayout::scalars(["a", "a"]).is_err());
        assert!(RecordLayout::uniform(["a"], 0).is_err());
    }

    #[test]
    fn test_serde_validates() {
        let layout: RecordLayout =
            serde_json::from_str(r#"[{"name": "a"}, {"name": "b", "arity": 3}]"#).unwrap();
        assert_eq!(layout.fields()[0].arity, 1);
        assert_eq!(layout.record_width(), 4);

        let bad = serde_json::from_str::<RecordLayout>(r#"[{"name": "a", "arity": 0}]"#);
        assert!(bad.is_err());
    }
}
