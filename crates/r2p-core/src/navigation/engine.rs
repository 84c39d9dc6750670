//! Time/index controller implementation

use super::{ControllerConfig, ControllerState, GroupIndex, Selection, StartPosition};

/// Tracks the active group of a grouped view.
///
/// Every transition that changes what is on screen returns the new
/// [`Selection`]; the owner forwards it to the "on rows" and "on time"
/// callbacks.
#[derive(Debug, Clone, Default)]
pub struct TimeController {
    config: ControllerConfig,
    state: ControllerState,
    index: Option<GroupIndex>,
}

impl TimeController {
    /// Create a controller in the `Uninitialized` state
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            state: ControllerState::Uninitialized,
            index: None,
        }
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn position(&self) -> Option<usize> {
        self.state.position()
    }

    pub fn index(&self) -> Option<&GroupIndex> {
        self.index.as_ref()
    }

    /// Key value of the active group
    pub fn current_value(&self) -> Option<i64> {
        let position = self.position()?;
        self.index.as_ref()?.value_at(position)
    }

    /// Install a new index.
    ///
    /// If a group was active and its value still exists, the controller stays
    /// on that value (its position may move). Otherwise it falls back to the
    /// configured start position. Always returns a selection when the new
    /// index has groups, so callers can re-render against new data.
    pub fn set_index(&mut self, index: GroupIndex) -> Option<Selection> {
        if index.is_empty() {
            tracing::debug!("Index on '{}' has no groups, controller reset", index.column());
            self.index = Some(index);
            self.state = ControllerState::Uninitialized;
            return None;
        }

        let last = index.group_count() - 1;
        let fallback = match self.config.start {
            StartPosition::First => 0,
            StartPosition::Last => last,
        };

        let previous = match (self.state, self.index.as_ref()) {
            (ControllerState::Ready { position }, Some(old)) => old
                .value_at(position)
                .map(|value| (value, position + 1 == old.group_count())),
            _ => None,
        };

        let position = match previous {
            Some((_, true)) if self.config.start == StartPosition::Last => last,
            Some((value, _)) => index.position_of(value).unwrap_or(fallback),
            None => fallback,
        };

        tracing::debug!(
            "Index on '{}' set: {} groups, position {} (previous value {:?})",
            index.column(),
            index.group_count(),
            position,
            previous.map(|(value, _)| value)
        );

        self.index = Some(index);
        self.state = ControllerState::Ready { position };
        self.selection(position)
    }

    /// Move to `requested`, clamped into range.
    ///
    /// Returns `None` when nothing changed or there is no index yet.
    pub fn set_position(&mut self, requested: usize) -> Option<Selection> {
        let count = self.index.as_ref()?.group_count();
        if count == 0 {
            return None;
        }

        let position = requested.min(count - 1);
        if position != requested {
            tracing::debug!("Position {} clamped to {}", requested, position);
        }

        if self.state == (ControllerState::Ready { position }) {
            return None;
        }

        self.state = ControllerState::Ready { position };
        self.selection(position)
    }

    /// Select the group whose key is `value`.
    ///
    /// A value between groups selects the last group below it; a value below
    /// every group selects the first.
    pub fn select_timestep(&mut self, value: i64) -> Option<Selection> {
        let position = match self.index.as_ref()?.values().binary_search(&value) {
            Ok(position) => position,
            Err(0) => 0,
            Err(insert_at) => insert_at - 1,
        };
        self.set_position(position)
    }

    /// Move to a fractional slider position, floored and clamped
    pub fn scrub(&mut self, position: f64) -> Option<Selection> {
        if position.is_nan() {
            return None;
        }
        let position = if position <= 0.0 {
            0
        } else {
            position.floor() as usize
        };
        self.set_position(position)
    }

    /// Selection for the active group, without changing state
    pub fn current(&self) -> Option<Selection> {
        self.selection(self.position()?)
    }

    fn selection(&self, position: usize) -> Option<Selection> {
        let index = self.index.as_ref()?;
        let value = index.value_at(position)?;
        Some(Selection {
            position,
            value,
            rows: index.rows_for(value),
            values: index.values().to_vec(),
        })
    }
}
