//! View instances and the page runtime
//!
//! A [`ViewInstance`] is one live visualization: a table store, a component
//! registry and a time controller bound to one container element. The
//! [`Page`] holds every instance on a page together with the queue of
//! instructions that arrived before the runtime was ready.

mod components;
pub mod envelope;
mod instance;
mod page;
mod store;
mod view_spec;

pub use components::ComponentSpec;
pub use envelope::{build_update, drain_script, escape_script_json, Instruction, InstructionKind};
pub use instance::{RefreshReport, SelectionReport, ViewInstance};
pub use page::{DrainReport, Outcome, Page, Submission};
pub use store::{Refreshed, TableStore};
pub use view_spec::ViewSpec;

use r2p_core::{RegistryError, ViewId};
use r2p_data::DataError;
use thiserror::Error;

/// Errors raised by view instances and the page
#[derive(Error, Debug)]
pub enum ViewError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("view is grouped by '{0}' but the table has no such column")]
    MissingIndexColumn(String),

    #[error("components can only be registered before the first refresh")]
    RegistrationClosed,

    #[error("no view with id '{0}' on this page")]
    UnknownView(ViewId),

    #[error("payload does not match the view's {expected} encoding")]
    PayloadMismatch { expected: &'static str },

    #[error("failed to serialize instruction: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<RegistryError> for ViewError {
    fn from(_: RegistryError) -> Self {
        ViewError::RegistrationClosed
    }
}
