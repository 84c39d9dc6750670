//! Core functionality for rows2prose
//!
//! This crate provides the table model, the component registry and the
//! time/index controller that every view instance is built from.

pub mod navigation;
pub mod registry;
pub mod state;
pub mod table;

use thiserror::Error;

// Re-export commonly used types
pub use navigation::{
    ControllerConfig, ControllerState, GroupIndex, Selection, StartPosition, TimeController,
};
pub use registry::{
    Callback, CallbackFailure, CallbackKind, ComponentRegistry, DispatchReport,
};
pub use state::ViewId;
pub use table::{Column, ColumnData, DType, ParseDTypeError, Table};

/// Errors raised while building or querying a [`Table`]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TableError {
    #[error("column '{name}' has {actual} rows, expected {expected}")]
    LengthMismatch {
        name: String,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate column '{0}'")]
    DuplicateColumn(String),

    #[error("column '{0}' not found")]
    MissingColumn(String),

    #[error("a column of {len} elements cannot have arity {arity}")]
    InvalidArity { len: usize, arity: usize },

    #[error("index column '{name}' has arity {arity}, expected a scalar column")]
    IndexArity { name: String, arity: usize },

    #[error("index column '{name}' holds non-integer value {value}")]
    NonIntegerIndex { name: String, value: f64 },

    #[error("key {value} of column '{name}' leaves no valid slot count")]
    SlotOverflow { name: String, value: i64 },
}

/// Errors raised by render callbacks
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{0}")]
    Message(String),

    #[error("callback panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Renderer(#[from] anyhow::Error),
}

/// Errors raised by the component registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("components can only be registered before the first refresh")]
    Sealed,
}
