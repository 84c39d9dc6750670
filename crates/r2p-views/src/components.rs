//! Component catalogue
//!
//! A [`ComponentSpec`] is embedded in the bootstrap script so the page knows
//! which elements to draw, and bound in-process to registry callbacks that
//! compute a [`Datum`] and hand it to the renderer.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use r2p_core::{Callback, Column, GroupIndex, RenderError, Table};
use r2p_render::{Binding, ComponentRenderer, Datum, ElementRef, ScaleDomain, ValueType};
use serde::{Deserialize, Serialize};

const DEFAULT_PREFIX: &str = "Step";
const DEFAULT_CONFIG_COLUMN: &str = "i_config";

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

/// One visual component of a view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "component", rename_all = "camelCase")]
pub enum ComponentSpec {
    /// Bar gauge per key
    Scalar {
        class_name: String,
        keys: Vec<String>,
        #[serde(default)]
        log_scale: bool,
    },

    /// Position dial per key
    Position {
        class_name: String,
        keys: Vec<String>,
    },

    /// Distribution plot per key
    Distribution {
        class_name: String,
        keys: Vec<String>,
        #[serde(default)]
        log_scale: bool,
    },

    /// Distribution plot per key, split by configuration id.
    ///
    /// Configuration ids come from `config_column`, else the view's index
    /// column, else `i_config`.
    DistributionList {
        class_name: String,
        keys: Vec<String>,
        #[serde(default)]
        log_scale: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        config_column: Option<String>,
    },

    /// Expression with its variables bound to `keys`.
    ///
    /// `value_type` picks the binding: one row's value, a set of rows, or
    /// the whole column split by configuration id as in `DistributionList`.
    Expression {
        class_name: String,
        keys: Vec<String>,
        expression: String,
        #[serde(default)]
        value_type: ValueType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        config_column: Option<String>,
    },

    /// Time scrubber; grouped views only
    TimeControl {
        class_name: String,
        #[serde(default = "default_prefix")]
        prefix: String,
    },
}

fn key_list<I, S>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    keys.into_iter().map(Into::into).collect()
}

impl ComponentSpec {
    pub fn scalar<I, S>(class_name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ComponentSpec::Scalar {
            class_name: class_name.into(),
            keys: key_list(keys),
            log_scale: false,
        }
    }

    pub fn position<I, S>(class_name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ComponentSpec::Position {
            class_name: class_name.into(),
            keys: key_list(keys),
        }
    }

    pub fn distribution<I, S>(class_name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ComponentSpec::Distribution {
            class_name: class_name.into(),
            keys: key_list(keys),
            log_scale: false,
        }
    }

    pub fn distribution_list<I, S>(class_name: impl Into<String>, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ComponentSpec::DistributionList {
            class_name: class_name.into(),
            keys: key_list(keys),
            log_scale: false,
            config_column: None,
        }
    }

    pub fn expression<I, S>(class_name: impl Into<String>, keys: I, expression: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ComponentSpec::Expression {
            class_name: class_name.into(),
            keys: key_list(keys),
            expression: expression.into(),
            value_type: ValueType::Scalar,
            config_column: None,
        }
    }

    pub fn time_control(class_name: impl Into<String>) -> Self {
        ComponentSpec::TimeControl {
            class_name: class_name.into(),
            prefix: default_prefix(),
        }
    }

    /// Switch to a log scale. No effect on components without a scale.
    pub fn with_log_scale(mut self) -> Self {
        match &mut self {
            ComponentSpec::Scalar { log_scale, .. }
            | ComponentSpec::Distribution { log_scale, .. }
            | ComponentSpec::DistributionList { log_scale, .. } => *log_scale = true,
            _ => {}
        }
        self
    }

    /// Set how an expression binds its variables. No effect on other components.
    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        if let ComponentSpec::Expression { value_type: current, .. } = &mut self {
            *current = value_type;
        }
        self
    }

    /// Read configuration ids from `column`. No effect on components that
    /// do not split by configuration.
    pub fn with_config_column(mut self, column: impl Into<String>) -> Self {
        match &mut self {
            ComponentSpec::DistributionList { config_column, .. }
            | ComponentSpec::Expression { config_column, .. } => *config_column = Some(column.into()),
            _ => {}
        }
        self
    }

    pub fn class_name(&self) -> &str {
        match self {
            ComponentSpec::Scalar { class_name, .. }
            | ComponentSpec::Position { class_name, .. }
            | ComponentSpec::Distribution { class_name, .. }
            | ComponentSpec::DistributionList { class_name, .. }
            | ComponentSpec::Expression { class_name, .. }
            | ComponentSpec::TimeControl { class_name, .. } => class_name,
        }
    }

    /// Build the callbacks that draw this component.
    ///
    /// `grouping` is the view's index column; `None` for snapshot views.
    pub(crate) fn bind(
        &self,
        renderer: &Arc<dyn ComponentRenderer>,
        grouping: Option<&str>,
    ) -> Vec<Callback> {
        let renderer = Arc::clone(renderer);
        let grouped = grouping.is_some();

        match self.clone() {
            ComponentSpec::Scalar {
                class_name,
                keys,
                log_scale,
            } => bind_points(
                renderer,
                class_name,
                keys,
                Scale::gauge(log_scale),
                grouped,
                |value, domain| Datum::Scalar { value, domain },
            ),
            ComponentSpec::Position { class_name, keys } => bind_points(
                renderer,
                class_name,
                keys,
                Scale::extent(false),
                grouped,
                |value, domain| Datum::Position { value, domain },
            ),
            ComponentSpec::Distribution {
                class_name,
                keys,
                log_scale,
            } => bind_distribution(renderer, class_name, keys, Scale::extent(log_scale), grouped),
            ComponentSpec::DistributionList {
                class_name,
                keys,
                log_scale,
                config_column,
            } => {
                let config_column = resolve_config_column(config_column, grouping);
                bind_distribution_list(renderer, class_name, keys, Scale::extent(log_scale), config_column)
            }
            ComponentSpec::Expression {
                class_name,
                keys,
                expression,
                value_type,
                config_column,
            } => {
                let element = ElementRef::new(class_name);
                match value_type {
                    ValueType::Scalar => bind_scalar_expression(renderer, element, keys, expression, grouped),
                    ValueType::ScalarDistribution => {
                        bind_distribution_expression(renderer, element, keys, expression, grouped)
                    }
                    ValueType::ScalarDistributionList => bind_distribution_list_expression(
                        renderer,
                        element,
                        keys,
                        expression,
                        resolve_config_column(config_column, grouping),
                    ),
                }
            }
            ComponentSpec::TimeControl { class_name, prefix } => {
                if !grouped {
                    tracing::debug!("Time control '{}' ignored on a snapshot view", class_name);
                    return Vec::new();
                }
                let element = ElementRef::new(class_name);
                vec![Callback::on_time(move |values, position| {
                    let datum = Datum::Time {
                        values: values.to_vec(),
                        position,
                        prefix: prefix.clone(),
                    };
                    Ok(renderer.render(&element, &datum)?)
                })]
            }
        }
    }
}

type SharedDomain = Arc<Mutex<Option<ScaleDomain>>>;

/// How a component's scale covers its data
#[derive(Debug, Clone, Copy)]
struct Scale {
    log: bool,
    from_zero: bool,
}

impl Scale {
    /// `[min, max]` of the data
    fn extent(log: bool) -> Self {
        Self {
            log,
            from_zero: false,
        }
    }

    /// `[0, max]` of the data, for bar gauges
    fn gauge(log: bool) -> Self {
        Self {
            log,
            from_zero: true,
        }
    }

    fn domain(self, values: Vec<f64>) -> ScaleDomain {
        if self.from_zero {
            ScaleDomain::gauge(values, self.log)
        } else {
            ScaleDomain::spanning(values, self.log)
        }
    }
}

/// Configuration ids come from the component, else the view's index column,
/// else `i_config`
fn resolve_config_column(config_column: Option<String>, grouping: Option<&str>) -> String {
    config_column
        .or_else(|| grouping.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_CONFIG_COLUMN.to_string())
}

fn column<'a>(table: &'a Table, key: &str) -> Result<&'a Column, RenderError> {
    table
        .column(key)
        .ok_or_else(|| RenderError::Message(format!("column '{}' not found", key)))
}

/// Domain over every element of every key column
fn domain_over(table: &Table, keys: &[String], scale: Scale) -> Result<ScaleDomain, RenderError> {
    let mut bounds = Vec::with_capacity(keys.len() * 2);
    for key in keys {
        if let Some((lo, hi)) = column(table, key)?.extent() {
            bounds.extend([lo, hi]);
        }
    }
    Ok(scale.domain(bounds))
}

/// Domain computed on load, or from `table` if no load happened yet
fn shared_or_compute(
    shared: &SharedDomain,
    table: &Table,
    keys: &[String],
    scale: Scale,
) -> Result<ScaleDomain, RenderError> {
    let cached = *shared.lock();
    match cached {
        Some(domain) => Ok(domain),
        None => domain_over(table, keys, scale),
    }
}

/// Callback that only stores the table-wide domain for later row renders
fn domain_loader(shared: &SharedDomain, keys: &[String], scale: Scale) -> Callback {
    let shared = Arc::clone(shared);
    let keys = keys.to_vec();
    Callback::on_loaded(move |table| {
        *shared.lock() = Some(domain_over(table, &keys, scale)?);
        Ok(())
    })
}

/// Configuration index of `table` and the number of slots it spans
fn config_index(table: &Table, config_column: &str) -> Result<(GroupIndex, usize), RenderError> {
    let index = GroupIndex::from_table(table, config_column)
        .map_err(|e| RenderError::Message(e.to_string()))?;
    let slots = index
        .slot_count()
        .map_err(|e| RenderError::Message(e.to_string()))?;
    Ok((index, slots))
}

/// Configuration id of every element of a column whose rows own `arity` elements
fn element_configs(index: &GroupIndex, arity: usize) -> Vec<i64> {
    index
        .row_keys()
        .iter()
        .flat_map(|&config| std::iter::repeat(config).take(arity))
        .collect()
}

fn bind_points(
    renderer: Arc<dyn ComponentRenderer>,
    class_name: String,
    keys: Vec<String>,
    scale: Scale,
    grouped: bool,
    make: fn(f64, ScaleDomain) -> Datum,
) -> Vec<Callback> {
    let render_keys = keys.clone();
    let render_row = move |table: &Table, row: usize, domain: ScaleDomain| -> Result<(), RenderError> {
        for key in &render_keys {
            if let Some(value) = column(table, key)?.value(row) {
                let element = ElementRef::keyed(class_name.as_str(), key.as_str());
                renderer.render(&element, &make(value, domain))?;
            }
        }
        Ok(())
    };

    if !grouped {
        return vec![Callback::on_loaded(move |table| {
            let domain = domain_over(table, &keys, scale)?;
            render_row(table, 0, domain)
        })];
    }

    let shared = SharedDomain::default();
    let loader = domain_loader(&shared, &keys, scale);
    let rows = Callback::on_rows(move |table, rows| {
        let first = match rows.first() {
            Some(&row) => row,
            None => return Ok(()),
        };
        let domain = shared_or_compute(&shared, table, &keys, scale)?;
        render_row(table, first, domain)
    });
    vec![loader, rows]
}

fn bind_distribution(
    renderer: Arc<dyn ComponentRenderer>,
    class_name: String,
    keys: Vec<String>,
    scale: Scale,
    grouped: bool,
) -> Vec<Callback> {
    let render_keys = keys.clone();
    let render = move |table: &Table, rows: Option<&[usize]>, domain: ScaleDomain| -> Result<(), RenderError> {
        for key in &render_keys {
            let column = column(table, key)?;
            let values = match rows {
                Some(rows) => column.take_rows(rows).data().to_f64_vec(),
                None => column.data().to_f64_vec(),
            };
            let element = ElementRef::keyed(class_name.as_str(), key.as_str());
            renderer.render(&element, &Datum::Distribution { values, domain })?;
        }
        Ok(())
    };

    if !grouped {
        return vec![Callback::on_loaded(move |table| {
            let domain = domain_over(table, &keys, scale)?;
            render(table, None, domain)
        })];
    }

    let shared = SharedDomain::default();
    let loader = domain_loader(&shared, &keys, scale);
    let rows = Callback::on_rows(move |table, rows| {
        let domain = shared_or_compute(&shared, table, &keys, scale)?;
        render(table, Some(rows), domain)
    });
    vec![loader, rows]
}

fn bind_distribution_list(
    renderer: Arc<dyn ComponentRenderer>,
    class_name: String,
    keys: Vec<String>,
    scale: Scale,
    config_column: String,
) -> Vec<Callback> {
    vec![Callback::on_loaded(move |table| {
        let (index, config_count) = config_index(table, &config_column)?;
        let domain = domain_over(table, &keys, scale)?;

        for key in &keys {
            let column = column(table, key)?;
            let datum = Datum::DistributionList {
                values: column.data().to_f64_vec(),
                configs: element_configs(&index, column.arity()),
                config_count,
                domain,
            };
            renderer.render(&ElementRef::keyed(class_name.as_str(), key.as_str()), &datum)?;
        }
        Ok(())
    })]
}

/// Binding of every key, in key order
fn bindings(
    table: &Table,
    keys: &[String],
    bind: impl Fn(&Column) -> Binding,
) -> Result<IndexMap<String, Binding>, RenderError> {
    let mut bindings = IndexMap::with_capacity(keys.len());
    for key in keys {
        bindings.insert(key.clone(), bind(column(table, key)?));
    }
    Ok(bindings)
}

fn render_expression(
    renderer: &dyn ComponentRenderer,
    element: &ElementRef,
    expression: &str,
    value_type: ValueType,
    bindings: IndexMap<String, Binding>,
) -> Result<(), RenderError> {
    let datum = Datum::Expression {
        expression: expression.to_string(),
        value_type,
        bindings,
    };
    Ok(renderer.render(element, &datum)?)
}

/// Each variable bound to one row: the first row, or the first row of the group
fn bind_scalar_expression(
    renderer: Arc<dyn ComponentRenderer>,
    element: ElementRef,
    keys: Vec<String>,
    expression: String,
    grouped: bool,
) -> Vec<Callback> {
    let render = move |table: &Table, row: usize| -> Result<(), RenderError> {
        let bindings = bindings(table, &keys, |column| Binding::Scalar(column.value(row)))?;
        render_expression(renderer.as_ref(), &element, &expression, ValueType::Scalar, bindings)
    };

    if !grouped {
        return vec![Callback::on_loaded(move |table| render(table, 0))];
    }
    vec![Callback::on_rows(move |table, rows| match rows.first() {
        Some(&row) => render(table, row),
        None => Ok(()),
    })]
}

/// Each variable bound to a set of values: the whole column, or the group's rows
fn bind_distribution_expression(
    renderer: Arc<dyn ComponentRenderer>,
    element: ElementRef,
    keys: Vec<String>,
    expression: String,
    grouped: bool,
) -> Vec<Callback> {
    let render = move |table: &Table, rows: Option<&[usize]>| -> Result<(), RenderError> {
        let bindings = bindings(table, &keys, |column| {
            Binding::Distribution(match rows {
                Some(rows) => column.take_rows(rows).data().to_f64_vec(),
                None => column.data().to_f64_vec(),
            })
        })?;
        render_expression(
            renderer.as_ref(),
            &element,
            &expression,
            ValueType::ScalarDistribution,
            bindings,
        )
    };

    if !grouped {
        return vec![Callback::on_loaded(move |table| render(table, None))];
    }
    vec![Callback::on_rows(move |table, rows| render(table, Some(rows)))]
}

/// Each variable bound to its whole column split by configuration id
fn bind_distribution_list_expression(
    renderer: Arc<dyn ComponentRenderer>,
    element: ElementRef,
    keys: Vec<String>,
    expression: String,
    config_column: String,
) -> Vec<Callback> {
    vec![Callback::on_loaded(move |table| {
        let (index, config_count) = config_index(table, &config_column)?;
        let bindings = bindings(table, &keys, |column| Binding::DistributionList {
            values: column.data().to_f64_vec(),
            configs: element_configs(&index, column.arity()),
            config_count,
            extent: column.extent(),
        })?;
        render_expression(
            renderer.as_ref(),
            &element,
            &expression,
            ValueType::ScalarDistributionList,
            bindings,
        )
    })]
}

#[cfg(test)]
mod tests {
    use super::*;
    use r2p_core::{ColumnData, ComponentRegistry};
    use r2p_render::{RecordingRenderer, LOG_EPSILON};

    fn registry_for(
        spec: &ComponentSpec,
        renderer: &Arc<RecordingRenderer>,
        grouping: Option<&str>,
    ) -> ComponentRegistry {
        let renderer: Arc<dyn ComponentRenderer> = renderer.clone();
        let mut registry = ComponentRegistry::new();
        for callback in spec.bind(&renderer, grouping) {
            registry.register(spec.class_name(), callback).unwrap();
        }
        registry
    }

    fn table() -> Table {
        Table::new()
            .with_column("t", vec![0i32, 0, 1, 1])
            .unwrap()
            .with_column("loss", vec![4.0f32, 3.0, 2.0, 1.0])
            .unwrap()
    }

    #[test]
    fn test_scalar_snapshot_uses_first_row() {
        let renderer = Arc::new(RecordingRenderer::new());
        let mut registry = registry_for(&ComponentSpec::scalar("gauge", ["loss"]), &renderer, None);

        registry.dispatch_loaded(&table());

        assert_eq!(
            renderer.last_for("gauge"),
            Some(Datum::Scalar {
                value: 4.0,
                domain: ScaleDomain::gauge([1.0, 4.0], false),
            })
        );
    }

    #[test]
    fn test_gauge_domain_starts_at_zero() {
        let renderer = Arc::new(RecordingRenderer::new());
        let table = Table::new().with_column("loss", vec![1.0f32, 2.0, 4.0]).unwrap();

        let mut registry = registry_for(&ComponentSpec::scalar("gauge", ["loss"]), &renderer, None);
        registry.dispatch_loaded(&table);
        match renderer.last_for("gauge") {
            Some(Datum::Scalar { value, domain }) => {
                assert_eq!(value, 1.0);
                assert_eq!((domain.min, domain.max), (0.0, 4.0));
                assert_eq!(domain.fraction(value), 0.25);
            }
            other => panic!("unexpected datum {:?}", other),
        }

        let spec = ComponentSpec::scalar("log", ["loss"]).with_log_scale();
        let mut registry = registry_for(&spec, &renderer, None);
        registry.dispatch_loaded(&table);
        match renderer.last_for("log") {
            Some(Datum::Scalar { domain, .. }) => assert_eq!((domain.min, domain.max), (LOG_EPSILON, 4.0)),
            other => panic!("unexpected datum {:?}", other),
        }

        // Dials keep the data extent
        let mut registry = registry_for(&ComponentSpec::position("dial", ["loss"]), &renderer, None);
        registry.dispatch_loaded(&table);
        match renderer.last_for("dial") {
            Some(Datum::Position { domain, .. }) => assert_eq!((domain.min, domain.max), (1.0, 4.0)),
            other => panic!("unexpected datum {:?}", other),
        }
    }

    #[test]
    fn test_grouped_scalar_shares_load_domain() {
        let renderer = Arc::new(RecordingRenderer::new());
        let spec = ComponentSpec::scalar("gauge", ["loss"]);
        let mut registry = registry_for(&spec, &renderer, Some("t"));
        assert_eq!(registry.len(), 2);

        let table = table();
        registry.dispatch_loaded(&table);
        assert_eq!(renderer.count_for("gauge"), 0);

        // Rows of a sub-table only span [1, 2]; the domain still covers the load
        registry.dispatch_rows(&table, &[2, 3]);
        assert_eq!(
            renderer.last_for("gauge"),
            Some(Datum::Scalar {
                value: 2.0,
                domain: ScaleDomain::gauge([1.0, 4.0], false),
            })
        );
    }

    #[test]
    fn test_grouped_distribution_extracts_rows() {
        let renderer = Arc::new(RecordingRenderer::new());
        let spec = ComponentSpec::distribution("dist", ["loss"]).with_log_scale();
        let mut registry = registry_for(&spec, &renderer, Some("t"));

        let table = table();
        registry.dispatch_loaded(&table);
        registry.dispatch_rows(&table, &[0, 1]);

        match renderer.last_for("dist") {
            Some(Datum::Distribution { values, domain }) => {
                assert_eq!(values, vec![4.0, 3.0]);
                assert!(domain.log);
            }
            other => panic!("unexpected datum {:?}", other),
        }
    }

    #[test]
    fn test_distribution_list_counts_configs() {
        let renderer = Arc::new(RecordingRenderer::new());
        let spec = ComponentSpec::distribution_list("configs", ["loss"]);
        let mut registry = registry_for(&spec, &renderer, Some("t"));

        registry.dispatch_loaded(&table());

        match renderer.last_for("configs") {
            Some(Datum::DistributionList {
                configs,
                config_count,
                ..
            }) => {
                assert_eq!(configs, vec![0, 0, 1, 1]);
                assert_eq!(config_count, 2);
            }
            other => panic!("unexpected datum {:?}", other),
        }
    }

    #[test]
    fn test_distribution_list_repeats_configs_per_element() {
        let renderer = Arc::new(RecordingRenderer::new());
        let samples = Column::with_arity(ColumnData::from(vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]), 3).unwrap();
        let table = Table::new()
            .with_column("i_config", vec![0i32, 1])
            .unwrap()
            .with_column("samples", samples)
            .unwrap();

        let spec = ComponentSpec::distribution_list("configs", ["samples"]);
        let mut registry = registry_for(&spec, &renderer, None);
        assert!(registry.dispatch_loaded(&table).is_clean());

        match renderer.last_for("configs") {
            Some(Datum::DistributionList {
                values,
                configs,
                config_count,
                ..
            }) => {
                assert_eq!(values.len(), configs.len());
                assert_eq!(configs, vec![0, 0, 0, 1, 1, 1]);
                assert_eq!(config_count, 2);
            }
            other => panic!("unexpected datum {:?}", other),
        }
    }

    #[test]
    fn test_distribution_list_config_overflow_fails_cleanly() {
        let renderer = Arc::new(RecordingRenderer::new());
        let table = Table::new()
            .with_column("i_config", vec![0i64, i64::MAX])
            .unwrap()
            .with_column("loss", vec![1.0f32, 2.0])
            .unwrap();

        let spec = ComponentSpec::distribution_list("configs", ["loss"]);
        let mut registry = registry_for(&spec, &renderer, None);
        let report = registry.dispatch_loaded(&table);

        assert_eq!(report.failures.len(), 1);
        assert!(matches!(report.failures[0].error, RenderError::Message(_)));
        assert_eq!(renderer.count_for("configs"), 0);
    }

    fn expression_datum(renderer: &RecordingRenderer) -> (ValueType, IndexMap<String, Binding>) {
        match renderer.last_for("expr") {
            Some(Datum::Expression {
                value_type, bindings, ..
            }) => (value_type, bindings),
            other => panic!("unexpected datum {:?}", other),
        }
    }

    #[test]
    fn test_grouped_scalar_expression_binds_first_row() {
        let renderer = Arc::new(RecordingRenderer::new());
        let spec = ComponentSpec::expression("expr", ["loss"], "loss * 2");
        let mut registry = registry_for(&spec, &renderer, Some("t"));

        registry.dispatch_rows(&table(), &[2, 3]);

        let (value_type, bindings) = expression_datum(&renderer);
        assert_eq!(value_type, ValueType::Scalar);
        assert_eq!(bindings["loss"], Binding::Scalar(Some(2.0)));
    }

    #[test]
    fn test_distribution_expression_binds_rows() {
        let renderer = Arc::new(RecordingRenderer::new());
        let spec = ComponentSpec::expression("expr", ["loss"], "mean(loss)")
            .with_value_type(ValueType::ScalarDistribution);

        let mut registry = registry_for(&spec, &renderer, Some("t"));
        registry.dispatch_rows(&table(), &[0, 1]);
        let (value_type, bindings) = expression_datum(&renderer);
        assert_eq!(value_type, ValueType::ScalarDistribution);
        assert_eq!(bindings["loss"], Binding::Distribution(vec![4.0, 3.0]));

        let mut registry = registry_for(&spec, &renderer, None);
        registry.dispatch_loaded(&table());
        let (_, bindings) = expression_datum(&renderer);
        assert_eq!(bindings["loss"], Binding::Distribution(vec![4.0, 3.0, 2.0, 1.0]));
    }

    #[test]
    fn test_distribution_list_expression_splits_by_config() {
        let renderer = Arc::new(RecordingRenderer::new());
        let spec = ComponentSpec::expression("expr", ["loss"], "loss")
            .with_value_type(ValueType::ScalarDistributionList)
            .with_config_column("t");
        let mut registry = registry_for(&spec, &renderer, None);

        assert!(registry.dispatch_loaded(&table()).is_clean());

        let (value_type, bindings) = expression_datum(&renderer);
        assert_eq!(value_type, ValueType::ScalarDistributionList);
        assert_eq!(
            bindings["loss"],
            Binding::DistributionList {
                values: vec![4.0, 3.0, 2.0, 1.0],
                configs: vec![0, 0, 1, 1],
                config_count: 2,
                extent: Some((1.0, 4.0)),
            }
        );
    }

    #[test]
    fn test_time_control_only_when_grouped() {
        let renderer = Arc::new(RecordingRenderer::new());
        let spec = ComponentSpec::time_control("time");
        assert!(registry_for(&spec, &renderer, None).is_empty());

        let mut registry = registry_for(&spec, &renderer, Some("t"));
        registry.dispatch_time(&[0, 1], 1);
        assert_eq!(
            renderer.last_for("time"),
            Some(Datum::Time {
                values: vec![0, 1],
                position: 1,
                prefix: "Step".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_key_is_a_render_error() {
        let renderer = Arc::new(RecordingRenderer::new());
        let spec = ComponentSpec::expression("expr", ["nope"], "x + 1");
        let mut registry = registry_for(&spec, &renderer, None);

        let report = registry.dispatch_loaded(&table());
        assert_eq!(report.failures.len(), 1);
        assert_eq!(renderer.count_for("expr"), 0);
    }

    #[test]
    fn test_spec_json_tags() {
        let json = serde_json::to_string(&ComponentSpec::distribution_list("d", ["a"])).unwrap();
        assert_eq!(
            json,
            r#"{"component":"distributionList","class_name":"d","keys":["a"],"log_scale":false}"#
        );
    }
}
