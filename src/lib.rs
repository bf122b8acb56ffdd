//! rawhtml flattens `<style>` blocks, external stylesheets, and class
//! selectors into inline `style` attributes, producing "raw" HTML documents
//! or fragments with no styling dependencies. The intended consumers are
//! contexts that ignore block-level CSS, such as HTML email and rich-text
//! editors.
//!
//! ```no_run
//! use rawhtml::RawHtml;
//!
//! let engine = RawHtml::new();
//! let conversion = engine
//!     .convert_html("<style>.hi{color:red}</style><p class=\"hi\">Hi</p>", None)
//!     .unwrap();
//! assert!(conversion.html.contains("style=\"color: red;\""));
//! ```

mod collect;
mod debug;
mod error;
mod fetch;
mod html;
mod inline;

pub use error::RawHtmlError;

use debug::DebugLogger;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_MARKER_ATTR: &str = "data-lock";
const DEFAULT_OUTPUT_SUFFIX: &str = "_rawed";
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// A recoverable problem encountered during a conversion run. Warnings never
/// abort the run; they describe content that was dropped or ignored.
#[derive(Debug, Clone)]
pub struct ConvertWarning {
    pub kind: String,
    pub message: String,
}

/// Outcome of one conversion run.
#[derive(Debug)]
pub struct Conversion {
    /// Serialized output: the full document, or the inner markup of the
    /// locked element when one was present.
    pub html: String,
    /// `true` when the output is a locked fragment rather than a document.
    pub fragment: bool,
    /// Where the output was written, for file conversions.
    pub output_path: Option<PathBuf>,
    pub warnings: Vec<ConvertWarning>,
}

/// The conversion engine. Holds the run options; each `convert_*` call owns
/// its document tree for the duration of that run.
pub struct RawHtml {
    marker_attr: String,
    output_suffix: String,
    fetch_timeout: Duration,
    debug: Option<Arc<DebugLogger>>,
}

impl RawHtml {
    /// Engine with default options: `data-lock` marker, `_rawed` output
    /// suffix, 30 second stylesheet fetch timeout, no debug log.
    pub fn new() -> Self {
        Self {
            marker_attr: DEFAULT_MARKER_ATTR.to_string(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            debug: None,
        }
    }

    pub fn builder() -> RawHtmlBuilder {
        RawHtmlBuilder::new()
    }

    /// Run the pipeline over an HTML string. `base_dir` is the directory
    /// against which relative stylesheet hrefs are resolved; without one,
    /// relative hrefs become warnings.
    ///
    /// Stages run strictly forward: collect stylesheet text (mutating the
    /// tree), parse it, inline matched rules, then pick the output form.
    pub fn convert_html(
        &self,
        html: &str,
        base_dir: Option<&Path>,
    ) -> Result<Conversion, RawHtmlError> {
        self.run_pipeline(html, base_dir, "convert_html")
    }

    fn run_pipeline(
        &self,
        html: &str,
        base_dir: Option<&Path>,
        context: &str,
    ) -> Result<Conversion, RawHtmlError> {
        let document = html::parse_document(html);

        let collected = collect::collect_stylesheets(
            &document,
            base_dir,
            self.fetch_timeout,
            self.debug.as_deref(),
        );
        let mut warnings = collected.warnings;

        let outcome = inline::inline_rules(&document, &collected.css, self.debug.as_deref());
        warnings.extend(outcome.warnings);

        let (text, fragment) = match html::locked_fragment(&document, &self.marker_attr) {
            Some((inner, count)) => {
                if count > 1 {
                    warnings.push(ConvertWarning {
                        kind: "marker".to_string(),
                        message: format!(
                            "{count} elements carry {}=\"true\"; using the first in document order",
                            self.marker_attr
                        ),
                    });
                }
                (inner, true)
            }
            None => (document.to_string(), false),
        };

        self.emit_debug_summary(context);
        Ok(Conversion {
            html: text,
            fragment,
            output_path: None,
            warnings,
        })
    }

    /// Convert and stream the output text into `writer`.
    pub fn convert_to_writer<W: std::io::Write>(
        &self,
        html: &str,
        base_dir: Option<&Path>,
        writer: &mut W,
    ) -> Result<Conversion, RawHtmlError> {
        let conversion = self.run_pipeline(html, base_dir, "convert_to_writer")?;
        writer.write_all(conversion.html.as_bytes())?;
        Ok(conversion)
    }

    /// Convert an HTML file and write the result beside it as
    /// `<stem><suffix>.<ext>`. Relative stylesheet hrefs resolve against the
    /// input file's directory. A failed output write aborts the run; there
    /// is no partial result worth salvaging.
    pub fn convert_file(&self, path: impl AsRef<Path>) -> Result<Conversion, RawHtmlError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)?;
        // A bare relative input like "page.html" has an empty parent; its
        // stylesheets still live in the current directory.
        let base_dir = path.parent().map(|parent| {
            if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            }
        });
        let mut conversion = self.run_pipeline(&input, base_dir, "convert_file")?;
        let output = html::output_path(path, &self.output_suffix)?;
        std::fs::write(&output, conversion.html.as_bytes())?;
        conversion.output_path = Some(output);
        Ok(conversion)
    }

    fn emit_debug_summary(&self, context: &str) {
        if let Some(logger) = self.debug.as_deref() {
            logger.emit_summary(context);
            logger.flush();
        }
    }
}

impl Default for RawHtml {
    fn default() -> Self {
        Self::new()
    }
}

pub struct RawHtmlBuilder {
    marker_attr: String,
    output_suffix: String,
    fetch_timeout: Duration,
    debug_path: Option<PathBuf>,
}

impl RawHtmlBuilder {
    pub fn new() -> Self {
        Self {
            marker_attr: DEFAULT_MARKER_ATTR.to_string(),
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            debug_path: None,
        }
    }

    /// Attribute that marks an element for fragment-only output. The marker
    /// value must be the string `true`.
    pub fn marker_attribute(mut self, name: impl Into<String>) -> Self {
        self.marker_attr = name.into();
        self
    }

    /// Suffix inserted before the output file's extension.
    pub fn output_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.output_suffix = suffix.into();
        self
    }

    /// Timeout for each external stylesheet fetch.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Write a JSON-lines trace of each run to `path`.
    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<RawHtml, RawHtmlError> {
        let debug = if let Some(path) = self.debug_path {
            Some(Arc::new(DebugLogger::new(path)?))
        } else {
            None
        };
        Ok(RawHtml {
            marker_attr: self.marker_attr,
            output_suffix: self.output_suffix,
            fetch_timeout: self.fetch_timeout,
            debug,
        })
    }
}

impl Default for RawHtmlBuilder {
    fn default() -> Self {
        Self::new()
    }
}
