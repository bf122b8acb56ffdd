//! DOM parsing, marker lookup, and output serialization.

use crate::error::RawHtmlError;
use kuchiki::traits::TendrilSink;
use kuchiki::{NodeData, NodeRef};
use std::path::{Path, PathBuf};

/// Parse an HTML string into a mutable kuchiki document tree. html5ever is
/// lenient, so this never fails; malformed input yields a best-effort tree.
pub(crate) fn parse_document(html: &str) -> NodeRef {
    kuchiki::parse_html().one(html)
}

/// `true` when a node sits inside an `<svg>` subtree. SVG `<style>` elements
/// style the vector graphic, not the HTML document, and must not be consumed.
pub(crate) fn nested_in_svg(node: &NodeRef) -> bool {
    node.ancestors().any(|ancestor| {
        if let NodeData::Element(el) = ancestor.data() {
            el.name.local.as_ref().eq_ignore_ascii_case("svg")
        } else {
            false
        }
    })
}

/// Inner HTML of the first element carrying `marker_attr="true"`, along with
/// the total number of marker elements in the document. The first marker in
/// document order wins; callers warn about the extras.
pub(crate) fn locked_fragment(document: &NodeRef, marker_attr: &str) -> Option<(String, usize)> {
    let selector = format!("[{marker_attr}=\"true\"]");
    let matches: Vec<NodeRef> = match document.select(&selector) {
        Ok(found) => found.map(|el| el.as_node().clone()).collect(),
        Err(()) => return None,
    };
    let first = matches.first()?;
    Some((serialize_inner(first), matches.len()))
}

/// HTML serialization of a node's children, excluding the node itself.
pub(crate) fn serialize_inner(node: &NodeRef) -> String {
    let mut out = String::new();
    for child in node.children() {
        out.push_str(&child.to_string());
    }
    out
}

/// Derive the sibling output path by inserting `suffix` before the input's
/// extension. Extensionless inputs get `.html`.
pub(crate) fn output_path(input: &Path, suffix: &str) -> Result<PathBuf, RawHtmlError> {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            RawHtmlError::InvalidInput(format!("input path has no file name: {}", input.display()))
        })?;
    let ext = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("html");
    Ok(input.with_file_name(format!("{stem}{suffix}.{ext}")))
}
