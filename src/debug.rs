use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// JSON-lines trace of one conversion run: per-stage events plus named
/// counters that are drained into a summary record at the end.
#[derive(Clone)]
pub(crate) struct DebugLogger {
    inner: Arc<Mutex<DebugState>>,
}

struct DebugState {
    writer: BufWriter<File>,
    counters: BTreeMap<String, u64>,
}

fn bump(state: &mut DebugState, key: &str, amount: u64) {
    let entry = state.counters.entry(key.to_string()).or_insert(0);
    *entry = entry.saturating_add(amount);
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(DebugState {
                writer: BufWriter::new(file),
                counters: BTreeMap::new(),
            })),
        })
    }

    pub fn increment(&self, key: &str, amount: u64) {
        if let Ok(mut state) = self.inner.lock() {
            bump(&mut state, key, amount);
        }
    }

    /// One `collect.link` event per stylesheet link, successful or not.
    /// Failures also feed the `collect.link_failures` counter.
    pub fn link_result(&self, href: &str, result: Result<(), &str>) {
        if let Ok(mut state) = self.inner.lock() {
            match result {
                Ok(()) => {
                    let _ = writeln!(
                        state.writer,
                        "{{\"type\":\"collect.link\",\"href\":{},\"ok\":true}}",
                        json_string(href)
                    );
                }
                Err(message) => {
                    bump(&mut state, "collect.link_failures", 1);
                    let _ = writeln!(
                        state.writer,
                        "{{\"type\":\"collect.link\",\"href\":{},\"ok\":false,\"error\":{}}}",
                        json_string(href),
                        json_string(message)
                    );
                }
            }
        }
    }

    /// One `inline.selector` event per selector application, carrying the
    /// match count; the count also feeds the `inline.matches` counter.
    pub fn selector_matches(&self, selector: &str, matches: usize) {
        if let Ok(mut state) = self.inner.lock() {
            bump(&mut state, "inline.matches", matches as u64);
            let _ = writeln!(
                state.writer,
                "{{\"type\":\"inline.selector\",\"selector\":{},\"matches\":{}}}",
                json_string(selector),
                matches
            );
        }
    }

    /// Drain the counters into a `debug.summary` record. `context` names the
    /// API entry point that ran the pipeline.
    pub fn emit_summary(&self, context: &str) {
        if let Ok(mut state) = self.inner.lock() {
            let mut counts = String::from("{");
            for (idx, (key, value)) in state.counters.iter().enumerate() {
                if idx > 0 {
                    counts.push(',');
                }
                counts.push_str(&format!("{}:{}", json_string(key), value));
            }
            counts.push('}');
            let line = format!(
                "{{\"type\":\"debug.summary\",\"context\":{},\"counts\":{}}}",
                json_string(context),
                counts
            );
            let _ = writeln!(state.writer, "{line}");
            state.counters.clear();
        }
    }

    pub fn flush(&self) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = state.writer.flush();
        }
    }
}

fn json_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len() + 8);
    for ch in raw.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

fn json_string(raw: &str) -> String {
    format!("\"{}\"", json_escape(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_escape_handles_quotes_and_control_chars() {
        assert_eq!(json_escape("a\"b"), "a\\\"b");
        assert_eq!(json_escape("line\nbreak"), "line\\nbreak");
        assert_eq!(json_escape("\u{01}"), "\\u0001");
    }

    #[test]
    fn summary_drains_counters_in_key_order() {
        let path = std::env::temp_dir().join(format!(
            "rawhtml_debug_summary_{}.jsonl",
            std::process::id()
        ));
        let logger = DebugLogger::new(&path).expect("create logger");
        logger.increment("inline.rules", 2);
        logger.link_result("missing.css", Err("cannot read"));
        logger.emit_summary("convert_html");
        logger.emit_summary("convert_html");
        logger.flush();

        let trace = std::fs::read_to_string(&path).expect("read trace");
        let _ = std::fs::remove_file(&path);
        let mut lines = trace.lines();
        assert!(
            lines
                .next()
                .is_some_and(|line| line.contains("\"type\":\"collect.link\"")
                    && line.contains("\"ok\":false"))
        );
        let summary = lines.next().expect("summary line");
        assert!(
            summary.contains("\"collect.link_failures\":1,\"inline.rules\":2"),
            "counters sort by key, got {summary}"
        );
        assert!(
            lines
                .next()
                .is_some_and(|line| line.contains("\"counts\":{}")),
            "second summary starts from drained counters"
        );
    }
}
