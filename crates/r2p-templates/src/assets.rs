//! Page header: runtime scripts and style sheet

use serde::{Deserialize, Serialize};

const DEFAULT_STYLE: &str = "div.r2p-output svg {\n  max-width: initial;\n}\n";

fn default_style() -> String {
    DEFAULT_STYLE.to_string()
}

/// Runtime assets embedded in every page header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderAssets {
    /// JavaScript sources, in load order (charting library first, then the
    /// view runtime that defines `window.r2p`)
    #[serde(default)]
    pub scripts: Vec<String>,

    #[serde(default = "default_style")]
    pub style: String,
}

impl Default for HeaderAssets {
    fn default() -> Self {
        Self {
            scripts: Vec::new(),
            style: default_style(),
        }
    }
}

impl HeaderAssets {
    pub fn with_script(mut self, source: impl Into<String>) -> Self {
        self.scripts.push(source.into());
        self
    }
}

/// Style and script elements that load the runtime.
///
/// An AMD `define` on the page would capture the bundles as modules instead
/// of globals, so it is hidden while they load.
pub fn header_content(assets: &HeaderAssets) -> String {
    let mut header = format!("<style>\n{}</style>\n", assets.style);
    if assets.scripts.is_empty() {
        return header;
    }

    header.push_str("<script>\n");
    header.push_str("  var r2p_undef_define = (\"function\" == typeof define),\n");
    header.push_str("      r2p_prev_define = undefined;\n");
    header.push_str("  if (r2p_undef_define) {\n");
    header.push_str("    r2p_prev_define = define;\n");
    header.push_str("    define = undefined;\n");
    header.push_str("  }\n");
    for source in &assets.scripts {
        header.push_str(source);
        header.push('\n');
    }
    header.push_str("  if (r2p_undef_define) {\n");
    header.push_str("    define = r2p_prev_define;\n");
    header.push_str("  }\n");
    header.push_str("</script>\n");
    header
}

/// Complete HTML document around `body`
pub fn full_html(assets: &HeaderAssets, body: &str) -> String {
    format!(
        "<!doctype html>\n<html>\n<head>\n{}</head>\n<body>\n{}\n</body>\n</html>",
        header_content(assets),
        body
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_without_scripts() {
        let header = header_content(&HeaderAssets::default());
        assert_eq!(header, "<style>\ndiv.r2p-output svg {\n  max-width: initial;\n}\n</style>\n");
    }

    #[test]
    fn test_scripts_in_order() {
        let assets = HeaderAssets::default()
            .with_script("window.d3 = {};")
            .with_script("window.r2p = {};");
        let header = header_content(&assets);

        let d3 = header.find("window.d3").unwrap();
        let r2p = header.find("window.r2p").unwrap();
        assert!(d3 < r2p);
        assert!(header.contains("define = r2p_prev_define;"));
    }

    #[test]
    fn test_full_html() {
        let html = full_html(&HeaderAssets::default(), "<p>hi</p>");
        assert!(html.starts_with("<!doctype html>\n<html>\n<head>\n<style>"));
        assert!(html.ends_with("<body>\n<p>hi</p>\n</body>\n</html>"));
    }

    #[test]
    fn test_assets_from_json() {
        let assets: HeaderAssets = serde_json::from_str(r#"{"scripts": ["x"]}"#).unwrap();
        assert_eq!(assets.scripts, vec!["x"]);
        assert_eq!(assets.style, DEFAULT_STYLE);
    }
}
