//! Headless renderer that records every draw call

use std::collections::HashSet;

use parking_lot::Mutex;

use crate::{ComponentRenderer, Datum, ElementRef};

/// One recorded draw
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCall {
    pub element: ElementRef,
    pub datum: Datum,
}

/// Renderer that keeps every call in memory.
///
/// Used for headless pages and tests. Elements listed with
/// [`RecordingRenderer::fail_on`] return an error instead of recording.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    calls: Mutex<Vec<RenderCall>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every render into elements of `class_name` fail
    pub fn fail_on(&self, class_name: impl Into<String>) {
        self.failing.lock().insert(class_name.into());
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.lock().clone()
    }

    /// Most recent datum drawn into `class_name` (any key)
    pub fn last_for(&self, class_name: &str) -> Option<Datum> {
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|call| call.element.class_name == class_name)
            .map(|call| call.datum.clone())
    }

    /// Number of draws into `class_name`
    pub fn count_for(&self, class_name: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.element.class_name == class_name)
            .count()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

impl ComponentRenderer for RecordingRenderer {
    fn render(&self, element: &ElementRef, datum: &Datum) -> anyhow::Result<()> {
        if self.failing.lock().contains(&element.class_name) {
            anyhow::bail!("renderer refused {}", element);
        }
        tracing::trace!("Render {}", element);
        self.calls.lock().push(RenderCall {
            element: element.clone(),
            datum: datum.clone(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScaleDomain;

    #[test]
    fn test_records_and_fails() {
        let renderer = RecordingRenderer::new();
        let datum = Datum::Scalar {
            value: 1.0,
            domain: ScaleDomain::from_extent(0.0, 2.0, false),
        };

        renderer.render(&ElementRef::keyed("gauge", "loss"), &datum).unwrap();
        renderer.fail_on("dial");
        assert!(renderer.render(&ElementRef::new("dial"), &datum).is_err());

        assert_eq!(renderer.calls().len(), 1);
        assert_eq!(renderer.last_for("gauge"), Some(datum));
        assert_eq!(renderer.count_for("dial"), 0);
    }
}
