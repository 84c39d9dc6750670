//! Transport encodings for rows2prose tables
//!
//! Tables travel to views in one of two forms: named-columnar JSON
//! (`{"col": {"type": "float32", "data": "<base64>"}}`) or newline-delimited
//! base64 float32 records described by a side-band [`RecordLayout`].

pub mod codec;
pub mod config;
pub mod schema;
pub mod sources;

use arrow::error::ArrowError;
use r2p_core::TableError;
use thiserror::Error;

// Re-exports
pub use codec::{
    columnar::{decode_columns, encode_columns, ColumnarPayload, EncodedColumn},
    records::{decode_records, encode_records},
    Encoder, Encoding, TransportPayload,
};
pub use config::{EncoderConfig, NarrowingPolicy};
pub use schema::{FieldSpec, RecordLayout};
pub use sources::table_from_record_batch;

/// Errors that can occur while encoding or decoding tables
#[derive(Error, Debug)]
pub enum DataError {
    #[error("invalid table: {0}")]
    Table(#[from] TableError),

    #[error("column '{column}': unknown data type '{tag}'")]
    UnknownType { column: String, tag: String },

    #[error("column '{column}': invalid base64: {source}")]
    Base64 {
        column: String,
        #[source]
        source: base64::DecodeError,
    },

    #[error("column '{column}': {len} bytes is not a whole number of {width}-byte elements")]
    TruncatedColumn {
        column: String,
        len: usize,
        width: usize,
    },

    #[error("record {line}: invalid base64: {source}")]
    RecordBase64 {
        line: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("record {line}: expected {expected} bytes, got {actual}")]
    TruncatedRecord {
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("column '{column}': value {value} does not fit in 32 bits")]
    NarrowingOverflow { column: String, value: i128 },

    #[error("column '{column}' has arity {arity}; the columnar encoding only carries scalar columns")]
    UnsupportedArity { column: String, arity: usize },

    #[error("field '{field}' has arity {expected} in the layout but {actual} in the table")]
    ArityMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid record layout: {0}")]
    InvalidLayout(String),

    #[error("payload does not match the {expected} encoding")]
    PayloadMismatch { expected: &'static str },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("column '{column}' has {count} null values")]
    NullValues { column: String, count: usize },

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedArrowType { column: String, data_type: String },
}
