//! Page-global runtime
//!
//! Instructions that arrive before the page runtime has loaded wait in a
//! FIFO queue. A later refresh for the same view replaces its queued
//! predecessor. The first ready transition drains the queue once and tears
//! it down; from then on every instruction executes immediately.

use std::collections::VecDeque;
use std::sync::Arc;

use ahash::AHashMap;
use r2p_core::ViewId;
use r2p_render::ComponentRenderer;

use crate::{Instruction, InstructionKind, RefreshReport, SelectionReport, ViewError, ViewInstance};

/// What executing an instruction did
#[derive(Debug)]
pub enum Outcome {
    Initialized(ViewId),
    Refreshed(RefreshReport),
}

/// Result of submitting an instruction to a page
#[derive(Debug)]
pub enum Submission {
    Executed(Outcome),
    /// Waiting for the runtime; `pending` counts the queue after the push
    Queued { pending: usize },
}

/// Result of the ready transition
#[derive(Debug, Default)]
pub struct DrainReport {
    pub executed: Vec<Outcome>,
    pub errors: Vec<ViewError>,
}

#[derive(Debug)]
struct Pending {
    key: Option<String>,
    instruction: Instruction,
}

/// All views on one page plus the pending-work queue
pub struct Page {
    renderer: Arc<dyn ComponentRenderer>,
    ready: bool,
    /// `None` once the queue has been drained
    pending: Option<VecDeque<Pending>>,
    views: AHashMap<ViewId, ViewInstance>,
}

impl Page {
    pub fn new(renderer: Arc<dyn ComponentRenderer>) -> Self {
        Self {
            renderer,
            ready: false,
            pending: Some(VecDeque::new()),
            views: AHashMap::new(),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn pending_len(&self) -> usize {
        self.pending.as_ref().map_or(0, VecDeque::len)
    }

    pub fn view(&self, id: &ViewId) -> Option<&ViewInstance> {
        self.views.get(id)
    }

    pub fn view_mut(&mut self, id: &ViewId) -> Option<&mut ViewInstance> {
        self.views.get_mut(id)
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Execute `instruction` now, or queue it until the runtime is ready
    pub fn submit(&mut self, instruction: Instruction) -> Result<Submission, ViewError> {
        if self.ready {
            return self.execute(instruction).map(Submission::Executed);
        }

        let key = instruction.queue_key();
        let queue = self.pending.get_or_insert_with(VecDeque::new);
        if let Some(key) = &key {
            let before = queue.len();
            queue.retain(|p| p.key.as_ref() != Some(key));
            if queue.len() != before {
                tracing::debug!("Superseded queued '{}'", key);
            }
        }

        queue.push_back(Pending { key, instruction });
        tracing::debug!("Queued instruction, {} pending", queue.len());
        Ok(Submission::Queued {
            pending: queue.len(),
        })
    }

    /// The runtime has loaded: run every queued instruction in order.
    ///
    /// Only the first call drains. A failing instruction is logged and the
    /// drain moves on.
    pub fn mark_ready(&mut self) -> DrainReport {
        self.ready = true;
        let mut report = DrainReport::default();

        let queue = match self.pending.take() {
            Some(queue) => queue,
            None => {
                tracing::debug!("Page already ready, nothing to drain");
                return report;
            }
        };

        tracing::info!("Page ready, draining {} queued instructions", queue.len());
        for Pending { instruction, .. } in queue {
            match self.execute(instruction) {
                Ok(outcome) => report.executed.push(outcome),
                Err(e) => {
                    tracing::error!("Queued instruction failed: {}", e);
                    report.errors.push(e);
                }
            }
        }
        report
    }

    /// Entry point of a view's time control
    pub fn select_timestep(
        &mut self,
        id: &ViewId,
        value: i64,
    ) -> Result<Option<SelectionReport>, ViewError> {
        Ok(self.require_view(id)?.select_timestep(value))
    }

    pub fn set_position(
        &mut self,
        id: &ViewId,
        position: usize,
    ) -> Result<Option<SelectionReport>, ViewError> {
        Ok(self.require_view(id)?.set_position(position))
    }

    pub fn scrub(&mut self, id: &ViewId, position: f64) -> Result<Option<SelectionReport>, ViewError> {
        Ok(self.require_view(id)?.scrub(position))
    }

    fn require_view(&mut self, id: &ViewId) -> Result<&mut ViewInstance, ViewError> {
        self.views
            .get_mut(id)
            .ok_or_else(|| ViewError::UnknownView(id.clone()))
    }

    fn execute(&mut self, instruction: Instruction) -> Result<Outcome, ViewError> {
        let (target, kind) = instruction.into_parts();
        match kind {
            InstructionKind::Initialize(spec) => {
                let view = ViewInstance::mount(target.clone(), spec, &self.renderer);
                if self.views.insert(target.clone(), view).is_some() {
                    tracing::warn!("View {} initialized twice, previous instance dropped", target);
                }
                Ok(Outcome::Initialized(target))
            }
            InstructionKind::Refresh(payload) => {
                let report = self.require_view(&target)?.refresh(&payload)?;
                Ok(Outcome::Refreshed(report))
            }
        }
    }
}
