/// State of a [`super::TimeController`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    /// No index yet, or the last index had no groups
    #[default]
    Uninitialized,
    /// A group is active; `position < group_count`
    Ready { position: usize },
}

impl ControllerState {
    pub fn position(&self) -> Option<usize> {
        match self {
            ControllerState::Uninitialized => None,
            ControllerState::Ready { position } => Some(*position),
        }
    }
}

/// The active group, as handed to "on rows" and "on time" callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// Position of the active group in `values`
    pub position: usize,
    /// Key value of the active group
    pub value: i64,
    /// Rows belonging to the active group, ascending
    pub rows: Vec<usize>,
    /// Sorted unique key values
    pub values: Vec<i64>,
}
