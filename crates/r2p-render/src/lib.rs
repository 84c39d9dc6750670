//! Rendering abstraction layer
//!
//! The charting primitives (gauges, distribution plots, position dials, time
//! scrubbers) live outside this workspace. Components talk to them through
//! [`ComponentRenderer`], handing over a fully computed [`Datum`] for one
//! element at a time.

mod recording;
mod scale;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use recording::{RecordingRenderer, RenderCall};
pub use scale::{ScaleDomain, LOG_EPSILON};

/// The visual element a datum is bound to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    /// CSS class of the element inside the view's container
    pub class_name: String,
    /// Column the element displays, for elements bound per key
    pub key: Option<String>,
}

impl ElementRef {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            key: None,
        }
    }

    pub fn keyed(class_name: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            key: Some(key.into()),
        }
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, ".{}[data-key={}]", self.class_name, key),
            None => write!(f, ".{}", self.class_name),
        }
    }
}

/// How an expression view interprets its bindings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    #[default]
    Scalar,
    ScalarDistribution,
    ScalarDistributionList,
}

/// Value bound to one expression variable
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Binding {
    /// Value of one row; `None` when the table has no such row
    Scalar(Option<f64>),
    Distribution(Vec<f64>),
    /// Whole column split by configuration id, with its extent
    DistributionList {
        values: Vec<f64>,
        configs: Vec<i64>,
        config_count: usize,
        extent: Option<(f64, f64)>,
    },
}

/// Value bound to one element for one render
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Datum {
    /// Single value on a bar gauge
    Scalar { value: f64, domain: ScaleDomain },
    /// Single value on a position dial
    Position { value: f64, domain: ScaleDomain },
    /// Set of values drawn as one distribution
    Distribution { values: Vec<f64>, domain: ScaleDomain },
    /// Values split into configuration slots, `configs[i]` owning `values[i]`
    DistributionList {
        values: Vec<f64>,
        configs: Vec<i64>,
        config_count: usize,
        domain: ScaleDomain,
    },
    /// Free-form expression with its variables bound to column values
    Expression {
        expression: String,
        value_type: ValueType,
        bindings: IndexMap<String, Binding>,
    },
    /// Time scrubber state
    Time {
        values: Vec<i64>,
        position: usize,
        prefix: String,
    },
}

/// Trait for charting backends
pub trait ComponentRenderer: Send + Sync {
    /// Draw `datum` into `element`
    fn render(&self, element: &ElementRef, datum: &Datum) -> anyhow::Result<()>;
}
