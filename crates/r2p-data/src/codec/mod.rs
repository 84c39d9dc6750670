//! Table <-> transport payload codecs

pub mod columnar;
pub mod records;

use r2p_core::Table;
use serde::{Deserialize, Serialize};

use crate::{DataError, EncoderConfig, RecordLayout};
use columnar::ColumnarPayload;

/// An encoded table as it travels to a view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransportPayload {
    /// Named-columnar JSON object
    Columnar(ColumnarPayload),
    /// Newline-delimited base64 float32 records
    Records(String),
}

impl TransportPayload {
    /// The payload as a JavaScript/JSON literal: an object for columnar
    /// payloads, a string for record bodies.
    pub fn to_json(&self) -> Result<String, DataError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, DataError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Which transport form a view consumes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", content = "layout", rename_all = "snake_case")]
pub enum Encoding {
    #[default]
    Columnar,
    Records(RecordLayout),
}

impl Encoding {
    fn name(&self) -> &'static str {
        match self {
            Encoding::Columnar => "columnar",
            Encoding::Records(_) => "records",
        }
    }

    /// Decode a payload produced for this encoding
    pub fn decode(&self, payload: &TransportPayload) -> Result<Table, DataError> {
        match (self, payload) {
            (Encoding::Columnar, TransportPayload::Columnar(columns)) => {
                columnar::decode_columns(columns)
            }
            (Encoding::Records(layout), TransportPayload::Records(body)) => {
                records::decode_records(body, layout)
            }
            _ => Err(DataError::PayloadMismatch {
                expected: self.name(),
            }),
        }
    }
}

/// Encodes tables with a fixed encoding and configuration
#[derive(Debug, Clone, Default)]
pub struct Encoder {
    encoding: Encoding,
    config: EncoderConfig,
}

impl Encoder {
    pub fn new(encoding: Encoding, config: EncoderConfig) -> Self {
        Self { encoding, config }
    }

    pub fn encoding(&self) -> &Encoding {
        &self.encoding
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    pub fn encode(&self, table: &Table) -> Result<TransportPayload, DataError> {
        let payload = match &self.encoding {
            Encoding::Columnar => {
                TransportPayload::Columnar(columnar::encode_columns(table, &self.config)?)
            }
            Encoding::Records(layout) => {
                TransportPayload::Records(records::encode_records(table, layout)?)
            }
        };
        tracing::debug!(
            "Encoded {} rows x {} columns as {}",
            table.row_count(),
            table.column_count(),
            self.encoding.name()
        );
        Ok(payload)
    }

    pub fn decode(&self, payload: &TransportPayload) -> Result<Table, DataError> {
        self.encoding.decode(payload)
    }
}

/// Little-endian byte conversion for column elements.
///
/// Little-endian targets cast slices directly; other targets go element by
/// element.
pub(crate) trait LeBytes: bytemuck::Pod {
    fn extend_le(&self, out: &mut Vec<u8>);
    fn read_le(bytes: &[u8]) -> Self;
}

macro_rules! impl_le_bytes {
    ($($t:ty),*) => {
        $(
            impl LeBytes for $t {
                fn extend_le(&self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }

                fn read_le(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$t>()];
                    buf.copy_from_slice(bytes);
                    <$t>::from_le_bytes(buf)
                }
            }
        )*
    }
}

impl_le_bytes!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

pub(crate) fn to_le_bytes<T: LeBytes>(values: &[T]) -> Vec<u8> {
    if cfg!(target_endian = "little") {
        bytemuck::cast_slice(values).to_vec()
    } else {
        let mut out = Vec::with_capacity(std::mem::size_of_val(values));
        for value in values {
            value.extend_le(&mut out);
        }
        out
    }
}

/// Caller guarantees `bytes.len()` is a multiple of the element size
pub(crate) fn from_le_bytes<T: LeBytes>(bytes: &[u8]) -> Vec<T> {
    if cfg!(target_endian = "little") {
        bytemuck::pod_collect_to_vec(bytes)
    } else {
        bytes
            .chunks_exact(std::mem::size_of::<T>())
            .map(T::read_le)
            .collect()
    }
}
