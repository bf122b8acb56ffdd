//! rawhtml CLI
//!
//! Converts one HTML file into its inline-styled sibling
//! (`page.html` -> `page_rawed.html`).

use rawhtml::RawHtml;
use std::env;
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: rawhtml <file.html>");
        eprintln!("       rawhtml <file.html> --debug-log <trace.jsonl>");
        process::exit(1);
    }

    let mut builder = RawHtml::builder();
    if let Some(flag) = args.iter().position(|arg| arg == "--debug-log") {
        match args.get(flag + 1) {
            Some(path) => builder = builder.debug_log(path),
            None => {
                eprintln!("Error: --debug-log requires a path argument");
                process::exit(1);
            }
        }
    }

    let engine = match builder.build() {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    };

    match engine.convert_file(&args[1]) {
        Ok(conversion) => {
            for warning in &conversion.warnings {
                eprintln!("warning [{}]: {}", warning.kind, warning.message);
            }
            if let Some(path) = &conversion.output_path {
                println!("saved as {}", path.display());
            }
        }
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    }
}
