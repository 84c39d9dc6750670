//! Serializable view configuration

use r2p_core::ControllerConfig;
use r2p_data::Encoding;
use serde::{Deserialize, Serialize};

use crate::ComponentSpec;

/// Everything a page needs to mount a view.
///
/// Snapshot views have no `index_column`; every component renders the whole
/// table. Grouped views partition rows by the index column and render the
/// active group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_column: Option<String>,

    #[serde(default)]
    pub encoding: Encoding,

    #[serde(default)]
    pub components: Vec<ComponentSpec>,

    #[serde(default)]
    pub controller: ControllerConfig,
}

impl ViewSpec {
    /// Ungrouped view with columnar encoding
    pub fn snapshot() -> Self {
        Self::default()
    }

    /// View grouped by `index_column`
    pub fn grouped_by(index_column: impl Into<String>) -> Self {
        Self {
            index_column: Some(index_column.into()),
            ..Self::default()
        }
    }

    pub fn with_component(mut self, component: ComponentSpec) -> Self {
        self.components.push(component);
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_controller(mut self, controller: ControllerConfig) -> Self {
        self.controller = controller;
        self
    }

    pub fn is_grouped(&self) -> bool {
        self.index_column.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use r2p_core::StartPosition;

    #[test]
    fn test_minimal_json() {
        let spec: ViewSpec = serde_json::from_str("{}").unwrap();
        assert_eq!(spec, ViewSpec::snapshot());
        assert_eq!(
            serde_json::to_string(&spec).unwrap(),
            r#"{"encoding":{"format":"columnar"},"components":[],"controller":{"start":"first"}}"#
        );
    }

    #[test]
    fn test_grouped_json() {
        let spec: ViewSpec = serde_json::from_str(
            r#"{
                "index_column": "i_timestep",
                "controller": {"start": "last"},
                "components": [{"component": "timeControl", "class_name": "time"}]
            }"#,
        )
        .unwrap();

        assert!(spec.is_grouped());
        assert_eq!(spec.controller.start, StartPosition::Last);
        assert_eq!(spec.components, vec![ComponentSpec::time_control("time")]);
    }
}
