//! Notebook lifecycle

use r2p_core::Table;
use r2p_data::EncoderConfig;
use r2p_views::{drain_script, ViewSpec};

use crate::{
    create, header_content, script_tag, DisplayHost, DisplayId, HeaderAssets, LifecycleError,
    UpdateHandle,
};

/// Publishes views into a notebook's output.
///
/// `init` loads the runtime once per page. Each visualized view takes two
/// slots: the container with its bootstrap script, and a data slot keyed by
/// the view id that every update republishes.
pub struct Notebook<H: DisplayHost> {
    host: H,
    assets: HeaderAssets,
    config: EncoderConfig,
    initialized: bool,
}

impl<H: DisplayHost> Notebook<H> {
    pub fn new(host: H, assets: HeaderAssets) -> Self {
        Self {
            host,
            assets,
            config: EncoderConfig::default(),
            initialized: false,
        }
    }

    pub fn with_encoder_config(mut self, config: EncoderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Publish the runtime header followed by the queue drain
    pub fn init(&mut self) -> Result<DisplayId, LifecycleError> {
        let markup = format!("{}{}", header_content(&self.assets), script_tag(drain_script()));
        let id = self.host.publish(&markup, None).map_err(LifecycleError::Host)?;
        self.initialized = true;
        tracing::info!("Notebook runtime published to {}", id);
        Ok(id)
    }

    /// Publish a new view showing `table`
    pub fn visualize(
        &mut self,
        preamble: &str,
        spec: ViewSpec,
        table: &Table,
    ) -> Result<UpdateHandle, LifecycleError> {
        if !self.initialized {
            tracing::warn!("Notebook runtime not published yet; view scripts will wait in the queue");
        }

        let (document, handle) = create(preamble, spec, table, self.config)?;
        self.host
            .publish(&document.bootstrap_html()?, None)
            .map_err(LifecycleError::Host)?;
        self.host
            .publish(&document.refresh_html()?, Some(&DisplayId::from(&document.id)))
            .map_err(LifecycleError::Host)?;

        tracing::debug!("Visualized view {}", document.id);
        Ok(handle)
    }

    /// Replace a view's data slot with a refresh for `table`
    pub fn update(&self, handle: &UpdateHandle, table: &Table) -> Result<(), LifecycleError> {
        let markup = handle.set_data_html(table)?;
        self.host
            .republish(&DisplayId::from(handle.id()), &markup)
            .map_err(LifecycleError::Host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_with_id, MemoryDisplay};
    use parking_lot::Mutex;
    use r2p_core::Callback;
    use r2p_render::RecordingRenderer;
    use r2p_views::{ComponentSpec, Page};
    use std::sync::Arc;

    fn table(keys: Vec<i64>) -> Table {
        let loss: Vec<f32> = keys.iter().map(|&k| k as f32 * 0.5).collect();
        Table::new()
            .with_column("t", keys)
            .unwrap()
            .with_column("loss", loss)
            .unwrap()
    }

    fn spec() -> ViewSpec {
        ViewSpec::grouped_by("t")
            .with_component(ComponentSpec::scalar("loss", ["loss"]))
            .with_component(ComponentSpec::time_control("time"))
    }

    #[test]
    fn test_init_publishes_header_and_drain() {
        let mut notebook = Notebook::new(MemoryDisplay::new(), HeaderAssets::default());
        notebook.init().unwrap();

        let outputs = notebook.host().outputs();
        assert_eq!(outputs.len(), 1);
        assert!(outputs[0].starts_with("<style>"));
        assert!(outputs[0].contains("window.r2pQueue = null;"));
        assert!(notebook.is_initialized());
    }

    #[test]
    fn test_visualize_and_update() {
        let mut notebook = Notebook::new(MemoryDisplay::new(), HeaderAssets::default());
        notebook.init().unwrap();

        let handle = notebook.visualize("", spec(), &table(vec![0, 1])).unwrap();
        assert_eq!(notebook.host().len(), 3);

        let slot = DisplayId::from(handle.id());
        let before = notebook.host().markup(&slot).unwrap();
        notebook.update(&handle, &table(vec![0, 1, 2])).unwrap();
        let after = notebook.host().markup(&slot).unwrap();

        assert_ne!(before, after);
        assert_eq!(notebook.host().len(), 3);
    }

    #[test]
    fn test_lifecycles_emit_identical_refreshes() {
        let mut notebook = Notebook::new(MemoryDisplay::new(), HeaderAssets::default());
        let handle = notebook.visualize("", spec(), &table(vec![0, 0, 1])).unwrap();

        let (document, static_handle) = create_with_id(
            handle.id().clone(),
            "",
            spec(),
            &table(vec![0, 0, 1]),
            EncoderConfig::default(),
        )
        .unwrap();

        let slot = DisplayId::from(handle.id());
        assert_eq!(notebook.host().markup(&slot).unwrap(), document.refresh_html().unwrap());

        let next = table(vec![3, 4]);
        notebook.update(&handle, &next).unwrap();
        assert_eq!(
            notebook.host().markup(&slot).unwrap(),
            static_handle.set_data_html(&next).unwrap()
        );
    }

    #[test]
    fn test_document_drives_page() {
        let (document, handle) =
            create_with_id("view".into(), "", spec(), &table(vec![0, 0, 1, 1]), EncoderConfig::default())
                .unwrap();
        let renderer = Arc::new(RecordingRenderer::new());
        let mut page = Page::new(renderer.clone());

        page.submit(document.bootstrap.clone()).unwrap();
        page.submit(document.refresh.clone()).unwrap();
        page.submit(handle.set_data(&table(vec![0, 0, 1, 1])).unwrap()).unwrap();
        assert_eq!(page.pending_len(), 2);

        // Mount happens at drain; register before the refresh that follows
        page.mark_ready();
        assert_eq!(renderer.count_for("time"), 1);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let (document, _) =
            create_with_id("rows".into(), "", spec(), &table(vec![0, 0, 1, 1]), EncoderConfig::default())
                .unwrap();
        page.submit(document.bootstrap.clone()).unwrap();
        let sink = seen.clone();
        page.view_mut(&document.id)
            .unwrap()
            .register(
                "rows",
                Callback::on_rows(move |_, rows| {
                    sink.lock().push(rows.to_vec());
                    Ok(())
                }),
            )
            .unwrap();
        page.submit(document.refresh.clone()).unwrap();
        page.set_position(&document.id, 1).unwrap();

        assert_eq!(*seen.lock(), vec![vec![0, 1], vec![2, 3]]);
    }
}
