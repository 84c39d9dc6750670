//! Encoder configuration

pub mod narrowing;

pub use narrowing::*;

use serde::{Deserialize, Serialize};

/// Configuration for encoding tables into transport payloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    /// What to do with 64-bit integer values outside the 32-bit range
    #[serde(default)]
    pub narrowing: NarrowingPolicy,
}

impl EncoderConfig {
    /// Configuration that refuses lossy narrowing
    pub fn strict() -> Self {
        Self {
            narrowing: NarrowingPolicy::Reject,
        }
    }
}
