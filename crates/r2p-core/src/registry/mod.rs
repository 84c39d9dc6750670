//! Component registry
//!
//! Each view instance keeps an ordered list of render callbacks. Callbacks
//! are registered while the view initializes; after the first refresh the
//! list is sealed and only the inputs handed to the callbacks change.

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::{RegistryError, RenderError, Table};

type LoadedFn = Box<dyn FnMut(&Table) -> Result<(), RenderError> + Send>;
type RowsFn = Box<dyn FnMut(&Table, &[usize]) -> Result<(), RenderError> + Send>;
type TimeFn = Box<dyn FnMut(&[i64], usize) -> Result<(), RenderError> + Send>;

/// Which notification a callback listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    /// Full table, after every refresh
    OnLoaded,
    /// Rows of the active group, after every position change
    OnRows,
    /// Sorted index values and position, after every position change
    OnTime,
}

/// A render callback bound to one visual element
pub enum Callback {
    OnLoaded(LoadedFn),
    OnRows(RowsFn),
    OnTime(TimeFn),
}

impl Callback {
    pub fn on_loaded<F>(f: F) -> Self
    where
        F: FnMut(&Table) -> Result<(), RenderError> + Send + 'static,
    {
        Callback::OnLoaded(Box::new(f))
    }

    pub fn on_rows<F>(f: F) -> Self
    where
        F: FnMut(&Table, &[usize]) -> Result<(), RenderError> + Send + 'static,
    {
        Callback::OnRows(Box::new(f))
    }

    pub fn on_time<F>(f: F) -> Self
    where
        F: FnMut(&[i64], usize) -> Result<(), RenderError> + Send + 'static,
    {
        Callback::OnTime(Box::new(f))
    }

    pub fn kind(&self) -> CallbackKind {
        match self {
            Callback::OnLoaded(_) => CallbackKind::OnLoaded,
            Callback::OnRows(_) => CallbackKind::OnRows,
            Callback::OnTime(_) => CallbackKind::OnTime,
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").field(&self.kind()).finish()
    }
}

#[derive(Debug)]
struct Registration {
    label: String,
    callback: Callback,
}

/// One callback that failed during a dispatch
#[derive(Debug)]
pub struct CallbackFailure {
    /// Registration order of the failed callback
    pub slot: usize,
    pub label: String,
    pub error: RenderError,
}

/// Outcome of one dispatch
#[derive(Debug)]
pub struct DispatchReport {
    pub kind: CallbackKind,
    pub invoked: usize,
    pub failures: Vec<CallbackFailure>,
}

impl DispatchReport {
    fn new(kind: CallbackKind) -> Self {
        Self {
            kind,
            invoked: 0,
            failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Ordered list of render callbacks for one view instance
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    entries: Vec<Registration>,
    sealed: bool,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback. `label` names the element it renders, for logs.
    pub fn register(
        &mut self,
        label: impl Into<String>,
        callback: Callback,
    ) -> Result<(), RegistryError> {
        let label = label.into();
        if self.sealed {
            tracing::warn!("Rejected late registration of '{}'", label);
            return Err(RegistryError::Sealed);
        }
        self.entries.push(Registration { label, callback });
        Ok(())
    }

    /// Close registration; called by the first refresh
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count(&self, kind: CallbackKind) -> usize {
        self.entries
            .iter()
            .filter(|e| e.callback.kind() == kind)
            .count()
    }

    pub fn dispatch_loaded(&mut self, table: &Table) -> DispatchReport {
        self.dispatch(CallbackKind::OnLoaded, |callback| match callback {
            Callback::OnLoaded(f) => Some(f(table)),
            _ => None,
        })
    }

    pub fn dispatch_rows(&mut self, table: &Table, rows: &[usize]) -> DispatchReport {
        self.dispatch(CallbackKind::OnRows, |callback| match callback {
            Callback::OnRows(f) => Some(f(table, rows)),
            _ => None,
        })
    }

    pub fn dispatch_time(&mut self, values: &[i64], position: usize) -> DispatchReport {
        self.dispatch(CallbackKind::OnTime, |callback| match callback {
            Callback::OnTime(f) => Some(f(values, position)),
            _ => None,
        })
    }

    /// Run every callback of `kind` in registration order. A failing or
    /// panicking callback is recorded and the loop moves on.
    fn dispatch<F>(&mut self, kind: CallbackKind, mut invoke: F) -> DispatchReport
    where
        F: FnMut(&mut Callback) -> Option<Result<(), RenderError>>,
    {
        let mut report = DispatchReport::new(kind);

        for (slot, entry) in self.entries.iter_mut().enumerate() {
            if entry.callback.kind() != kind {
                continue;
            }

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| invoke(&mut entry.callback)));
            report.invoked += 1;

            let error = match outcome {
                Ok(Some(Ok(()))) | Ok(None) => continue,
                Ok(Some(Err(error))) => error,
                Err(payload) => RenderError::Panicked(panic_message(payload.as_ref())),
            };

            tracing::error!("Component '{}' failed during {:?}: {}", entry.label, kind, error);
            report.failures.push(CallbackFailure {
                slot,
                label: entry.label.clone(),
                error,
            });
        }

        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
