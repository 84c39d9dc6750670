//! A live view instance

use std::sync::Arc;

use r2p_core::{
    Callback, ComponentRegistry, DispatchReport, Selection, Table, TimeController, ViewId,
};
use r2p_data::TransportPayload;
use r2p_render::ComponentRenderer;

use crate::{Refreshed, TableStore, ViewError, ViewSpec};

/// Callbacks run for one position change
#[derive(Debug)]
pub struct SelectionReport {
    pub position: usize,
    pub value: i64,
    pub rows: DispatchReport,
    pub time: DispatchReport,
}

impl SelectionReport {
    pub fn is_clean(&self) -> bool {
        self.rows.is_clean() && self.time.is_clean()
    }
}

/// Callbacks run for one refresh
#[derive(Debug)]
pub struct RefreshReport {
    pub row_count: usize,
    pub loaded: DispatchReport,
    /// Present for grouped views whose new index has groups
    pub selection: Option<SelectionReport>,
}

impl RefreshReport {
    pub fn is_clean(&self) -> bool {
        self.loaded.is_clean() && self.selection.as_ref().map_or(true, SelectionReport::is_clean)
    }
}

/// One visualization bound to one container element
#[derive(Debug)]
pub struct ViewInstance {
    id: ViewId,
    spec: ViewSpec,
    registry: ComponentRegistry,
    store: TableStore,
    controller: TimeController,
}

impl ViewInstance {
    /// Create an instance with an empty registry
    pub fn new(id: ViewId, spec: ViewSpec) -> Self {
        Self {
            id,
            store: TableStore::new(spec.index_column.clone(), spec.encoding.clone()),
            controller: TimeController::new(spec.controller),
            registry: ComponentRegistry::new(),
            spec,
        }
    }

    /// Create an instance and register the callbacks of every component in
    /// `spec`, in order
    pub fn mount(id: ViewId, spec: ViewSpec, renderer: &Arc<dyn ComponentRenderer>) -> Self {
        let mut view = Self::new(id, spec);
        let grouping = view.spec.index_column.as_deref();

        for component in &view.spec.components {
            for callback in component.bind(renderer, grouping) {
                if let Err(e) = view.registry.register(component.class_name(), callback) {
                    tracing::error!("View {}: '{}' not mounted: {}", view.id, component.class_name(), e);
                }
            }
        }

        tracing::debug!(
            "Mounted view {} with {} components ({} callbacks)",
            view.id,
            view.spec.components.len(),
            view.registry.len()
        );
        view
    }

    pub fn id(&self) -> &ViewId {
        &self.id
    }

    pub fn spec(&self) -> &ViewSpec {
        &self.spec
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    pub fn controller(&self) -> &TimeController {
        &self.controller
    }

    pub fn table(&self) -> Option<&Arc<Table>> {
        self.store.table()
    }

    /// Register an extra callback. Only allowed before the first refresh.
    pub fn register(&mut self, label: impl Into<String>, callback: Callback) -> Result<(), ViewError> {
        Ok(self.registry.register(label, callback)?)
    }

    /// Replace the table with a decoded `payload` and notify every callback
    pub fn refresh(&mut self, payload: &TransportPayload) -> Result<RefreshReport, ViewError> {
        let Refreshed { table, index } = self.store.refresh(payload)?;

        if !self.registry.is_sealed() {
            self.registry.seal();
        }

        let loaded = self.registry.dispatch_loaded(&table);
        let selection = match index {
            Some(index) => {
                let selection = self.controller.set_index(index);
                self.emit(selection)
            }
            None => None,
        };

        tracing::debug!("View {} refreshed with {} rows", self.id, table.row_count());
        Ok(RefreshReport {
            row_count: table.row_count(),
            loaded,
            selection,
        })
    }

    /// Move to group `position` (clamped). `None` if nothing changed.
    pub fn set_position(&mut self, position: usize) -> Option<SelectionReport> {
        let selection = self.controller.set_position(position);
        self.emit(selection)
    }

    /// Move to the group keyed `value`
    pub fn select_timestep(&mut self, value: i64) -> Option<SelectionReport> {
        let selection = self.controller.select_timestep(value);
        self.emit(selection)
    }

    /// Move to a fractional slider position
    pub fn scrub(&mut self, position: f64) -> Option<SelectionReport> {
        let selection = self.controller.scrub(position);
        self.emit(selection)
    }

    fn emit(&mut self, selection: Option<Selection>) -> Option<SelectionReport> {
        let selection = selection?;
        let table = Arc::clone(self.store.table()?);

        let rows = self.registry.dispatch_rows(&table, &selection.rows);
        let time = self.registry.dispatch_time(&selection.values, selection.position);

        Some(SelectionReport {
            position: selection.position,
            value: selection.value,
            rows,
            time,
        })
    }
}
