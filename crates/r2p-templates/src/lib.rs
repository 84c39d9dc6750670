//! View lifecycles
//!
//! This crate turns a table plus a [`ViewSpec`](r2p_views::ViewSpec) into
//! page markup: a container element, a bootstrap script and refresh
//! scripts. Two lifecycles share that output. Static documents return the
//! fragment directly; notebooks publish it through a [`DisplayHost`] and
//! republish the data slot on every update.

mod assets;
mod document;
mod host;
mod notebook;

pub use assets::{full_html, header_content, HeaderAssets};
pub use document::{create, create_with_id, static_document, RenderedDocument, UpdateHandle};
pub use host::{DisplayHost, DisplayId, MemoryDisplay};
pub use notebook::Notebook;

use r2p_data::DataError;
use r2p_views::ViewError;
use thiserror::Error;

/// Errors raised while creating, publishing or updating a view
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    View(#[from] ViewError),

    #[error("display host failed: {0}")]
    Host(#[source] anyhow::Error),
}

impl From<DataError> for LifecycleError {
    fn from(e: DataError) -> Self {
        LifecycleError::View(ViewError::Data(e))
    }
}

/// Wrap script text in a `<script>` element
pub(crate) fn script_tag(script: &str) -> String {
    format!("<script>\n{}</script>\n", script)
}
