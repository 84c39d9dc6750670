//! Transport envelope
//!
//! An [`Instruction`] targets one view and either mounts it or refreshes its
//! data. Every instruction renders to a self-executing script: it runs at
//! once when the page runtime (`window.r2p`) is loaded, and otherwise pushes
//! itself onto the page-global `window.r2pQueue`. Refresh instructions are
//! keyed `"<id> update"` and remove any queued refresh with the same key.

use r2p_core::ViewId;
use r2p_data::TransportPayload;

use crate::{ViewError, ViewSpec};

/// Runs the pending queue once and tears it down
const DRAIN_SCRIPT: &str = r#"if (window.r2pQueue) {
  window.r2pQueue.forEach(([k, f]) => f());
  window.r2pQueue = null;
}
"#;

/// What an instruction does to its target
#[derive(Debug, Clone, PartialEq)]
pub enum InstructionKind {
    /// Mount the view: install its registry and refresh entry point
    Initialize(ViewSpec),
    /// Replace the view's table
    Refresh(TransportPayload),
}

/// One unit of work for a view on the page
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    target: ViewId,
    kind: InstructionKind,
}

/// Wrap `payload` into a refresh instruction for `target`
pub fn build_update(target: &ViewId, payload: TransportPayload) -> Instruction {
    Instruction::refresh(target.clone(), payload)
}

impl Instruction {
    pub fn initialize(target: ViewId, spec: ViewSpec) -> Self {
        Self {
            target,
            kind: InstructionKind::Initialize(spec),
        }
    }

    pub fn refresh(target: ViewId, payload: TransportPayload) -> Self {
        Self {
            target,
            kind: InstructionKind::Refresh(payload),
        }
    }

    pub fn target(&self) -> &ViewId {
        &self.target
    }

    pub fn kind(&self) -> &InstructionKind {
        &self.kind
    }

    pub fn into_parts(self) -> (ViewId, InstructionKind) {
        (self.target, self.kind)
    }

    /// Key under which the instruction waits in the pending queue.
    ///
    /// Only refreshes are keyed; initializations are never superseded.
    pub fn queue_key(&self) -> Option<String> {
        match self.kind {
            InstructionKind::Initialize(_) => None,
            InstructionKind::Refresh(_) => Some(format!("{} update", self.target)),
        }
    }

    /// Script text (without `<script>` tags) that carries out this instruction
    pub fn to_script(&self) -> Result<String, ViewError> {
        let container = format!(
            "document.getElementById({})",
            escape_script_json(&serde_json::to_string(&self.target)?)
        );

        let (name, call) = match &self.kind {
            InstructionKind::Initialize(spec) => (
                "initialize",
                format!(
                    "r2p.mountView({}, {});",
                    container,
                    escape_script_json(&serde_json::to_string(spec)?)
                ),
            ),
            InstructionKind::Refresh(payload) => (
                "update",
                format!(
                    "{}._r2pState.refresh({});",
                    container,
                    escape_script_json(&payload.to_json()?)
                ),
            ),
        };

        let enqueue = match self.queue_key() {
            Some(key) => format!(
                concat!(
                    "    const k = {key};\n",
                    "    window.r2pQueue = window.r2pQueue.filter(([k2, f]) => k2 != k);\n",
                    "    window.r2pQueue.push([k, {name}]);\n",
                ),
                key = escape_script_json(&serde_json::to_string(&key)?),
                name = name,
            ),
            None => format!("    window.r2pQueue.push([\"\", {}]);\n", name),
        };

        Ok(format!(
            concat!(
                "(function() {{\n",
                "  function {name}() {{\n",
                "    {call}\n",
                "  }}\n",
                "\n",
                "  if (window.r2p) {{\n",
                "    {name}();\n",
                "  }} else {{\n",
                "    if (!window.r2pQueue) {{\n",
                "      window.r2pQueue = [];\n",
                "    }}\n",
                "{enqueue}",
                "  }}\n",
                "}})();\n",
            ),
            name = name,
            call = call,
            enqueue = enqueue,
        ))
    }
}

/// Script that runs every queued instruction once and disables the queue.
///
/// Published right after the page runtime has loaded.
pub fn drain_script() -> &'static str {
    DRAIN_SCRIPT
}

/// Make JSON safe to embed inside a `<script>` element.
///
/// `</` would end the element early; `<\/` means the same in JSON strings.
pub fn escape_script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use r2p_core::Table;
    use r2p_data::Encoder;

    fn payload() -> TransportPayload {
        let table = Table::new().with_column("x", vec![1i32]).unwrap();
        Encoder::default().encode(&table).unwrap()
    }

    #[test]
    fn test_queue_keys() {
        let id = ViewId::new("abc");
        assert_eq!(build_update(&id, payload()).queue_key().as_deref(), Some("abc update"));
        assert_eq!(Instruction::initialize(id, ViewSpec::snapshot()).queue_key(), None);
    }

    #[test]
    fn test_refresh_script() {
        let script = build_update(&ViewId::new("abc"), payload()).to_script().unwrap();

        assert!(script.contains(
            r#"document.getElementById("abc")._r2pState.refresh({"x":{"type":"int32","data":"AQAAAA=="}});"#
        ));
        assert!(script.contains(r#"const k = "abc update";"#));
        assert!(script.contains("window.r2pQueue.push([k, update]);"));
    }

    #[test]
    fn test_initialize_script() {
        let spec = ViewSpec::grouped_by("t");
        let script = Instruction::initialize(ViewId::new("abc"), spec).to_script().unwrap();

        assert!(script.contains(r#"r2p.mountView(document.getElementById("abc"), {"index_column":"t""#));
        assert!(script.contains(r#"window.r2pQueue.push(["", initialize]);"#));
        assert!(!script.contains("filter"));
    }

    #[test]
    fn test_script_json_escaped() {
        let id = ViewId::new("</script><b>");
        let script = build_update(&id, payload()).to_script().unwrap();
        assert!(!script.contains("</script>"));
        assert!(script.contains(r#""<\/script><b>""#));
    }
}
