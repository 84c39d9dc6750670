//! 64-bit integer narrowing for transport
//!
//! The browser side reads integer columns into 32-bit typed arrays, since
//! 64-bit arrays decode to BigInts that plotting code cannot mix with plain
//! numbers. `int64` columns therefore travel as `int32` and `uint64` columns
//! as `uint32`.

use serde::{Deserialize, Serialize};

use crate::DataError;

/// Narrowing behavior for values that do not fit in 32 bits
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrowingPolicy {
    /// Keep the low 32 bits (an `as` cast). `2^40` becomes `0`.
    #[default]
    Truncate,
    /// Fail the encode with [`DataError::NarrowingOverflow`]
    Reject,
}

impl NarrowingPolicy {
    pub fn narrow_i64(&self, column: &str, values: &[i64]) -> Result<Vec<i32>, DataError> {
        match self {
            NarrowingPolicy::Truncate => Ok(values.iter().map(|&v| v as i32).collect()),
            NarrowingPolicy::Reject => values
                .iter()
                .map(|&v| i32::try_from(v).map_err(|_| overflow(column, v as i128)))
                .collect(),
        }
    }

    pub fn narrow_u64(&self, column: &str, values: &[u64]) -> Result<Vec<u32>, DataError> {
        match self {
            NarrowingPolicy::Truncate => Ok(values.iter().map(|&v| v as u32).collect()),
            NarrowingPolicy::Reject => values
                .iter()
                .map(|&v| u32::try_from(v).map_err(|_| overflow(column, v as i128)))
                .collect(),
        }
    }
}

fn overflow(column: &str, value: i128) -> DataError {
    DataError::NarrowingOverflow {
        column: column.to_string(),
        value,
    }
}
