//! Display hosts
//!
//! A notebook front end shows published markup in output slots. A slot
//! published under a display id can later be replaced in place.

use std::fmt;

use parking_lot::RwLock;
use r2p_core::ViewId;
use serde::{Deserialize, Serialize};

/// Identifier of a display slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DisplayId(String);

impl DisplayId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DisplayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A view's data slot reuses the view id
impl From<&ViewId> for DisplayId {
    fn from(id: &ViewId) -> Self {
        Self::new(id.as_str())
    }
}

/// Where notebook output goes
pub trait DisplayHost {
    /// Show `markup` in a new output slot, optionally under `display_id`
    fn publish(&self, markup: &str, display_id: Option<&DisplayId>) -> anyhow::Result<DisplayId>;

    /// Replace the markup of every slot published under `display_id`
    fn republish(&self, display_id: &DisplayId, markup: &str) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
struct Slot {
    id: DisplayId,
    markup: String,
}

/// Host that keeps every output slot in memory
#[derive(Debug, Default)]
pub struct MemoryDisplay {
    slots: RwLock<Vec<Slot>>,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    /// Markup of every slot, in publish order
    pub fn outputs(&self) -> Vec<String> {
        self.slots.read().iter().map(|s| s.markup.clone()).collect()
    }

    /// Markup of the most recent slot published under `id`
    pub fn markup(&self, id: &DisplayId) -> Option<String> {
        self.slots
            .read()
            .iter()
            .rev()
            .find(|s| &s.id == id)
            .map(|s| s.markup.clone())
    }
}

impl DisplayHost for MemoryDisplay {
    fn publish(&self, markup: &str, display_id: Option<&DisplayId>) -> anyhow::Result<DisplayId> {
        let mut slots = self.slots.write();
        let id = display_id
            .cloned()
            .unwrap_or_else(|| DisplayId::new(format!("output-{}", slots.len())));

        tracing::debug!("Published {} bytes to {}", markup.len(), id);
        slots.push(Slot {
            id: id.clone(),
            markup: markup.to_string(),
        });
        Ok(id)
    }

    fn republish(&self, display_id: &DisplayId, markup: &str) -> anyhow::Result<()> {
        let mut slots = self.slots.write();
        let mut found = false;
        for slot in slots.iter_mut().filter(|s| &s.id == display_id) {
            slot.markup = markup.to_string();
            found = true;
        }

        if !found {
            anyhow::bail!("no output slot with display id '{}'", display_id);
        }
        tracing::debug!("Republished {} bytes to {}", markup.len(), display_id);
        Ok(())
    }
}
