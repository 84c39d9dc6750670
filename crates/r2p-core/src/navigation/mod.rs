//! Time/index navigation
//!
//! Rows of a grouped table are partitioned by an integer index column
//! (timestep or configuration id). The [`TimeController`] tracks which group
//! is active and produces a [`Selection`] whenever that changes.

use serde::{Deserialize, Serialize};

mod engine;
mod index;
mod position;

pub use engine::TimeController;
pub use index::GroupIndex;
pub use position::{ControllerState, Selection};

/// Where the controller lands when it has no previous value to preserve
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPosition {
    /// Start at the first group, fall back to it when the value disappears
    #[default]
    First,
    /// Start at the last group and keep following it while the user is on it
    Last,
}

/// Controller configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default)]
    pub start: StartPosition,
}

impl ControllerConfig {
    /// Configuration that follows the most recent timestep
    pub fn follow_latest() -> Self {
        Self {
            start: StartPosition::Last,
        }
    }
}
