//! Markup composition and update handles

use r2p_core::{Table, ViewId};
use r2p_data::{Encoder, EncoderConfig};
use r2p_views::{build_update, Instruction, ViewSpec};

use crate::{script_tag, LifecycleError};

/// Markup and instructions for a freshly created view
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDocument {
    pub id: ViewId,
    /// Container element wrapping the caller's preamble
    pub markup: String,
    /// Mounts the view
    pub bootstrap: Instruction,
    /// Loads the initial table
    pub refresh: Instruction,
}

impl RenderedDocument {
    /// Container markup followed by the bootstrap script
    pub fn bootstrap_html(&self) -> Result<String, LifecycleError> {
        Ok(format!("{}\n{}", self.markup, script_tag(&self.bootstrap.to_script()?)))
    }

    /// Script element carrying the initial refresh
    pub fn refresh_html(&self) -> Result<String, LifecycleError> {
        Ok(script_tag(&self.refresh.to_script()?))
    }

    /// Whole fragment: container, bootstrap and initial refresh
    pub fn to_html(&self) -> Result<String, LifecycleError> {
        Ok(format!("{}{}", self.bootstrap_html()?, self.refresh_html()?))
    }
}

/// Produces refresh instructions for one view
#[derive(Debug, Clone)]
pub struct UpdateHandle {
    id: ViewId,
    encoder: Encoder,
}

impl UpdateHandle {
    pub fn new(id: ViewId, encoder: Encoder) -> Self {
        Self { id, encoder }
    }

    pub fn id(&self) -> &ViewId {
        &self.id
    }

    /// Encode `table` into a refresh instruction for this view
    pub fn set_data(&self, table: &Table) -> Result<Instruction, LifecycleError> {
        let payload = self.encoder.encode(table)?;
        Ok(build_update(&self.id, payload))
    }

    /// [`UpdateHandle::set_data`] as a script element
    pub fn set_data_html(&self, table: &Table) -> Result<String, LifecycleError> {
        Ok(script_tag(&self.set_data(table)?.to_script()?))
    }
}

/// Create a view with a fresh identifier
pub fn create(
    preamble: &str,
    spec: ViewSpec,
    table: &Table,
    config: EncoderConfig,
) -> Result<(RenderedDocument, UpdateHandle), LifecycleError> {
    create_with_id(ViewId::generate(), preamble, spec, table, config)
}

/// Create a view under a caller-chosen identifier
pub fn create_with_id(
    id: ViewId,
    preamble: &str,
    spec: ViewSpec,
    table: &Table,
    config: EncoderConfig,
) -> Result<(RenderedDocument, UpdateHandle), LifecycleError> {
    let handle = UpdateHandle::new(id.clone(), Encoder::new(spec.encoding.clone(), config));
    let refresh = handle.set_data(table)?;

    let markup = format!(
        "<div id=\"{}\" class=\"r2p-output\">{}</div>",
        escape_attribute(id.as_str()),
        preamble
    );
    tracing::debug!("Created view {} ({} components)", id, spec.components.len());

    let document = RenderedDocument {
        bootstrap: Instruction::initialize(id.clone(), spec),
        id,
        markup,
        refresh,
    };
    Ok((document, handle))
}

/// One-shot fragment that mounts the view and loads `table`
pub fn static_document(
    preamble: &str,
    spec: ViewSpec,
    table: &Table,
    config: EncoderConfig,
) -> Result<String, LifecycleError> {
    let (document, _) = create(preamble, spec, table, config)?;
    let script = format!(
        "{}{}",
        document.bootstrap.to_script()?,
        document.refresh.to_script()?
    );
    Ok(format!("{}\n{}", document.markup, script_tag(&script)))
}

fn escape_attribute(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
