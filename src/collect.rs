//! Style Collector: drains `<style>` blocks and `<link rel="stylesheet">`
//! references out of the document and concatenates their CSS text.

use crate::ConvertWarning;
use crate::debug::DebugLogger;
use crate::fetch;
use crate::html::nested_in_svg;
use kuchiki::NodeRef;
use rayon::prelude::*;
use std::path::Path;
use std::time::Duration;

pub(crate) struct CollectedStyles {
    pub css: String,
    pub warnings: Vec<ConvertWarning>,
}

/// Extract all HTML styling sources from `document`, detaching the source
/// nodes as they are consumed. `<style>` blocks come first, then stylesheet
/// links, each group in document order. Link contents are fetched in
/// parallel but concatenated by document position, never completion order.
///
/// A failed fetch or read drops that stylesheet's contribution and records a
/// warning; one bad stylesheet never aborts the conversion.
pub(crate) fn collect_stylesheets(
    document: &NodeRef,
    base_dir: Option<&Path>,
    fetch_timeout: Duration,
    debug: Option<&DebugLogger>,
) -> CollectedStyles {
    let mut css = String::new();
    let mut warnings = Vec::new();

    let style_blocks: Vec<NodeRef> = match document.select("style") {
        Ok(found) => found
            .map(|el| el.as_node().clone())
            .filter(|node| !nested_in_svg(node))
            .collect(),
        Err(()) => Vec::new(),
    };
    for block in &style_blocks {
        append_chunk(&mut css, &block.text_contents());
        block.detach();
    }
    if let Some(logger) = debug {
        logger.increment("collect.style_blocks", style_blocks.len() as u64);
    }

    let mut links: Vec<(NodeRef, String)> = Vec::new();
    if let Ok(found) = document.select("link[rel][href]") {
        for link in found {
            let node = link.as_node().clone();
            if nested_in_svg(&node) {
                continue;
            }
            let attrs = link.attributes.borrow();
            let rel = attrs.get("rel").unwrap_or("").to_ascii_lowercase();
            if !rel.split_ascii_whitespace().any(|token| token == "stylesheet") {
                continue;
            }
            let href = attrs.get("href").unwrap_or("").trim().to_string();
            drop(attrs);
            links.push((node, href));
        }
    }

    // Detach first: a link is consumed whether or not its fetch succeeds.
    for (node, _) in &links {
        node.detach();
    }
    if let Some(logger) = debug {
        logger.increment("collect.links", links.len() as u64);
    }

    // Indexed gather: fetches run in parallel, results join in document
    // order. NodeRef is Rc-based, so only the hrefs cross thread boundaries.
    let hrefs: Vec<String> = links.iter().map(|(_, href)| href.clone()).collect();
    let fetched: Vec<Result<String, String>> = hrefs
        .par_iter()
        .map(|href| resolve_href(href, base_dir, fetch_timeout))
        .collect();

    for ((_, href), result) in links.iter().zip(fetched) {
        if href.is_empty() {
            continue;
        }
        match result {
            Ok(text) => {
                append_chunk(&mut css, &text);
                if let Some(logger) = debug {
                    logger.link_result(href, Ok(()));
                }
            }
            Err(message) => {
                if let Some(logger) = debug {
                    logger.link_result(href, Err(&message));
                }
                warnings.push(ConvertWarning {
                    kind: "stylesheet".to_string(),
                    message: format!("failed to load stylesheet {href}: {message}"),
                });
            }
        }
    }

    CollectedStyles { css, warnings }
}

fn resolve_href(
    href: &str,
    base_dir: Option<&Path>,
    fetch_timeout: Duration,
) -> Result<String, String> {
    if href.is_empty() {
        return Ok(String::new());
    }
    if fetch::is_remote_href(href) {
        return fetch::fetch_text(href, fetch_timeout);
    }
    match base_dir {
        Some(base) => {
            let path = base.join(href);
            std::fs::read_to_string(&path)
                .map_err(|e| format!("cannot read {}: {e}", path.display()))
        }
        None => Err("relative href with no base directory".to_string()),
    }
}

fn append_chunk(css: &mut String, chunk: &str) {
    if chunk.is_empty() {
        return;
    }
    css.push_str(chunk);
    if !css.ends_with('\n') {
        css.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_document;
    use std::time::{SystemTime, UNIX_EPOCH};

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn temp_css_file(name: &str, contents: &str) -> std::path::PathBuf {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let dir = std::env::temp_dir().join(format!(
            "rawhtml_collect_{}_{}_{}",
            std::process::id(),
            stamp,
            name
        ));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("write temp css");
        path
    }

    #[test]
    fn style_blocks_are_concatenated_and_detached() {
        let doc = parse_document(
            "<html><head><style>.a{color:red}</style></head><body><style>.b{color:blue}</style><p class=\"a\">x</p></body></html>",
        );
        let collected = collect_stylesheets(&doc, None, TIMEOUT, None);
        let a = collected.css.find(".a").expect(".a rule collected");
        let b = collected.css.find(".b").expect(".b rule collected");
        assert!(a < b, "style blocks must keep document order");
        assert!(collected.warnings.is_empty());
        assert!(
            doc.select_first("style").is_err(),
            "consumed style blocks must be detached"
        );
    }

    #[test]
    fn svg_style_blocks_are_left_alone() {
        let doc = parse_document(
            "<html><body><svg><style>.s{fill:red}</style></svg><style>.h{color:red}</style></body></html>",
        );
        let collected = collect_stylesheets(&doc, None, TIMEOUT, None);
        assert!(collected.css.contains(".h"));
        assert!(!collected.css.contains(".s"), "svg styles are not document CSS");
        assert!(
            doc.select_first("svg style").is_ok(),
            "svg style block must stay in the tree"
        );
    }

    #[test]
    fn local_stylesheet_link_is_read_relative_to_base_dir() {
        let css_path = temp_css_file("site.css", ".linked { margin: 4px; }");
        let base = css_path.parent().expect("base dir").to_path_buf();
        let doc = parse_document(
            "<html><head><link rel=\"stylesheet\" href=\"site.css\"><style>.inline{color:red}</style></head><body></body></html>",
        );
        let collected = collect_stylesheets(&doc, Some(&base), TIMEOUT, None);
        let _ = std::fs::remove_file(&css_path);

        assert!(collected.warnings.is_empty(), "{:?}", collected.warnings);
        let inline = collected.css.find(".inline").expect("style block collected");
        let linked = collected.css.find(".linked").expect("linked css collected");
        assert!(
            inline < linked,
            "style blocks are collected before link contents"
        );
        assert!(
            doc.select_first("link").is_err(),
            "consumed link must be detached"
        );
    }

    #[test]
    fn missing_local_stylesheet_warns_and_continues() {
        let doc = parse_document(
            "<html><head><link rel=\"stylesheet\" href=\"missing.css\"><style>.kept{color:red}</style></head><body></body></html>",
        );
        let collected =
            collect_stylesheets(&doc, Some(std::env::temp_dir().as_path()), TIMEOUT, None);
        assert!(collected.css.contains(".kept"));
        assert!(!collected.css.contains("missing"));
        assert_eq!(collected.warnings.len(), 1);
        assert!(collected.warnings[0].message.contains("missing.css"));
        assert!(
            doc.select_first("link").is_err(),
            "failed link must still be detached"
        );
    }

    #[test]
    fn relative_href_without_base_dir_warns() {
        let doc = parse_document(
            "<html><head><link rel=\"stylesheet\" href=\"site.css\"></head><body></body></html>",
        );
        let collected = collect_stylesheets(&doc, None, TIMEOUT, None);
        assert!(collected.css.is_empty());
        assert_eq!(collected.warnings.len(), 1);
    }

    #[test]
    fn non_stylesheet_links_and_empty_hrefs_are_skipped() {
        let doc = parse_document(
            "<html><head>\
             <link rel=\"icon\" href=\"favicon.ico\">\
             <link rel=\"stylesheet\" href=\"\">\
             </head><body></body></html>",
        );
        let collected = collect_stylesheets(&doc, None, TIMEOUT, None);
        assert!(collected.css.is_empty());
        assert!(collected.warnings.is_empty());
        assert!(
            doc.select_first("link[rel=icon]").is_ok(),
            "non-stylesheet links must stay in the tree"
        );
        assert!(
            doc.select_first("link[rel=stylesheet]").is_err(),
            "empty-href stylesheet link is still consumed"
        );
    }
}
