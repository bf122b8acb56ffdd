//! Inliner: applies parsed style rules to matching elements by appending
//! their declarations to each element's `style` attribute and stripping the
//! class token the selector consumed.

use crate::ConvertWarning;
use crate::debug::DebugLogger;
use kuchiki::NodeRef;
use lightningcss::declaration::DeclarationBlock;
use lightningcss::rules::CssRule;
use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::traits::ToCss;

#[derive(Default)]
pub(crate) struct InlineOutcome {
    pub rules_applied: usize,
    pub warnings: Vec<ConvertWarning>,
}

/// Apply every style rule in `css` to `document`, in source order of rules,
/// selectors, and declarations. Matching is recomputed per selector against
/// the current tree, and class stripping for one selector happens only after
/// that selector's full match set is collected.
///
/// A total parse failure skips inlining for the whole run; the document then
/// passes through with its collected styles dropped and classes intact.
pub(crate) fn inline_rules(
    document: &NodeRef,
    css: &str,
    debug: Option<&DebugLogger>,
) -> InlineOutcome {
    let mut outcome = InlineOutcome::default();
    if css.trim().is_empty() {
        return outcome;
    }

    let sheet = match StyleSheet::parse(css, ParserOptions::default()) {
        Ok(sheet) => sheet,
        Err(err) => {
            outcome.warnings.push(ConvertWarning {
                kind: "css-parse".to_string(),
                message: format!("stylesheet failed to parse, inlining skipped: {err}"),
            });
            return outcome;
        }
    };

    for rule in &sheet.rules.0 {
        let CssRule::Style(style) = rule else {
            continue;
        };
        let new_style = render_declarations(&style.declarations);
        let selector_list = style
            .selectors
            .to_css_string(PrinterOptions::default())
            .unwrap_or_default();
        for selector in selector_list.split(',') {
            let selector = selector.trim();
            if selector.is_empty() {
                continue;
            }
            if let Some(logger) = debug {
                logger.increment("inline.selectors", 1);
            }
            apply_selector(document, selector, &new_style, &mut outcome, debug);
        }
        outcome.rules_applied += 1;
        if let Some(logger) = debug {
            logger.increment("inline.rules", 1);
        }
    }
    outcome
}

/// Render a rule's declarations as `property: value;` tokens joined by single
/// spaces, normal declarations first, `!important` ones after, each group in
/// source order. This is the text appended to matched elements verbatim; no
/// property-aware dedup happens here, later occurrences win downstream under
/// CSS last-declaration-wins parsing.
fn render_declarations(block: &DeclarationBlock) -> String {
    let mut parts: Vec<String> = Vec::new();
    for property in &block.declarations {
        if let Ok(text) = property.to_css_string(false, PrinterOptions::default()) {
            parts.push(format!("{text};"));
        }
    }
    for property in &block.important_declarations {
        if let Ok(text) = property.to_css_string(true, PrinterOptions::default()) {
            parts.push(format!("{text};"));
        }
    }
    parts.join(" ")
}

fn apply_selector(
    document: &NodeRef,
    selector: &str,
    new_style: &str,
    outcome: &mut InlineOutcome,
    debug: Option<&DebugLogger>,
) {
    let matches: Vec<NodeRef> = match document.select(selector) {
        Ok(found) => found.map(|el| el.as_node().clone()).collect(),
        Err(()) => {
            outcome.warnings.push(ConvertWarning {
                kind: "selector".to_string(),
                message: format!("unsupported selector skipped: {selector}"),
            });
            return;
        }
    };
    if let Some(logger) = debug {
        logger.selector_matches(selector, matches.len());
    }

    // Class removal is only well defined when the selector is literally one
    // class token; compound and combinator selectors keep their classes.
    let class_token = single_class_token(selector);

    for node in &matches {
        let Some(el) = node.as_element() else {
            continue;
        };
        let mut attrs = el.attributes.borrow_mut();

        if !new_style.is_empty() {
            let existing = attrs.get("style").unwrap_or("").trim();
            let mut combined = existing.to_string();
            if !combined.is_empty() && !combined.ends_with(';') {
                combined.push(';');
            }
            if !combined.is_empty() {
                combined.push(' ');
            }
            combined.push_str(new_style);
            attrs.insert("style", combined);
        }

        if let Some(token) = class_token {
            let Some(current) = attrs.get("class").map(|value| value.to_string()) else {
                continue;
            };
            let remaining: Vec<&str> = current
                .split_whitespace()
                .filter(|candidate| *candidate != token)
                .collect();
            if remaining.len() != current.split_whitespace().count() {
                if let Some(logger) = debug {
                    logger.increment("inline.classes_stripped", 1);
                }
            }
            if remaining.is_empty() {
                attrs.remove("class");
            } else {
                attrs.insert("class", remaining.join(" "));
            }
        }
    }
}

/// The class token a selector consumes, when the selector is syntactically a
/// single `.classname`. Anything else (`div.a`, `.a .b`, `.a.b`, `#id`)
/// returns `None` and leaves class attributes untouched.
fn single_class_token(selector: &str) -> Option<&str> {
    let token = selector.strip_prefix('.')?;
    let first = token.chars().next()?;
    if !(first.is_alphabetic() || first == '_' || first == '-') {
        return None;
    }
    if token
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        Some(token)
    } else {
        None
    }
}
