//! forge – command-line resume generator.
//!
//! Usage:
//!   forge <resume.json> <output> [--theme NAME] [--themes-dir DIR] [--pdf ENGINE] [--options FILE]
//!
//! The output format follows the output extension (`.html`, `.txt`, `.md`,
//! `.pdf`). Theme files are written next to the output path.

use std::{env, path::PathBuf, process, sync::Arc};

use resume_forge::error::LogErrorHandler;
use resume_forge::{GenerationOptions, PdfEngine, Pipeline, Resume};
use serde_json::{Map, Value};

#[tokio::main]
async fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut options_file: Option<PathBuf> = None;
    let mut overrides = Map::new();
    let mut theme_dirs: Vec<Value> = Vec::new();
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--theme" | "-t" => {
                let v = flag_value(&mut iter, arg, &args[0]);
                overrides.insert("theme".to_string(), Value::String(v));
            }
            "--themes-dir" | "-d" => {
                theme_dirs.push(Value::String(flag_value(&mut iter, arg, &args[0])));
            }
            "--pdf" | "-p" => {
                let v = flag_value(&mut iter, arg, &args[0]);
                overrides.insert("pdf".to_string(), Value::String(v));
            }
            "--options" | "-o" => {
                options_file = Some(PathBuf::from(flag_value(&mut iter, arg, &args[0])));
            }
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                if positional == 0 {
                    input_path = Some(PathBuf::from(path));
                } else if positional == 1 {
                    output_path = Some(PathBuf::from(path));
                } else {
                    eprintln!("Unexpected argument: {path}");
                    print_usage(&args[0]);
                    process::exit(1);
                }
                positional += 1;
            }
        }
    }

    let (input, output) = match (input_path, output_path) {
        (Some(i), Some(o)) => (i, o),
        _ => {
            eprintln!("Error: a resume file and an output path are required.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    // Options file first, then command-line flags on top.
    let base = match &options_file {
        Some(path) => GenerationOptions::from_file(path),
        None => Ok(GenerationOptions::default()),
    };
    if !theme_dirs.is_empty() {
        overrides.insert("themeDirs".to_string(), Value::Array(theme_dirs));
    }
    let options = match base.and_then(|b| b.merged(&Value::Object(overrides))) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    let resume = match Resume::from_path(&input) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error reading '{}': {e}", input.display());
            process::exit(1);
        }
    };

    let pipeline = Pipeline::new(options).with_error_handler(Arc::new(LogErrorHandler));
    match pipeline.generate(&resume, &output).await {
        Ok(report) => {
            for failure in &report.files.failures {
                eprintln!("Warning: {}: {}", failure.path.display(), failure.error);
            }
            let count = report.files.written.len() + usize::from(report.pdf.is_some());
            eprintln!(
                "Wrote '{}' with theme '{}' ({} file{})",
                output.display(),
                report.theme,
                count,
                if count == 1 { "" } else { "s" }
            );
            if !report.is_clean() {
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Error generating '{}': {e}", output.display());
            process::exit(1);
        }
    }
}

fn flag_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str, prog: &str) -> String {
    match iter.next() {
        Some(v) => v.clone(),
        None => {
            eprintln!("Missing value for {flag}");
            print_usage(prog);
            process::exit(1);
        }
    }
}

fn print_usage(prog: &str) {
    eprintln!("forge – theme-driven resume generator (resume-forge)");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <resume.json> <output> [--theme NAME] [--themes-dir DIR] [--pdf ENGINE] [--options FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <resume.json>     Resume data (any JSON document)");
    eprintln!("  <output>          Output path; the extension selects html, txt, md or pdf");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --theme, -t       Theme name or folder (default: modern)");
    eprintln!("  --themes-dir, -d  Directory searched for themes (repeatable)");
    let engines: Vec<&str> = PdfEngine::ALL.iter().map(PdfEngine::as_str).collect();
    eprintln!("  --pdf, -p         PDF engine: {}", engines.join(", "));
    eprintln!("  --options, -o     JSON file with generation options");
    eprintln!("  --help            Print this message");
}
