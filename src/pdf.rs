//! PDF engine dispatcher.
//!
//! Every engine first writes the markup to an intermediate HTML file next to
//! the output (`resume.pdf` → `resume.pdf.html`) and then rasterizes that
//! file. Failures are returned and, when a handler is supplied, reported to it
//! with [`Status::PdfGeneration`].

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;

use crate::chrome;
use crate::error::{ErrorHandler, PdfError, Status};
use crate::options::{GenerationOptions, PdfEngine};
use crate::spawn;

/// Rasterization script used by the phantomjs engine when none is configured.
pub const RASTERIZE_JS: &str = include_str!("../assets/rasterize.js");

/// Margins passed to wkhtmltopdf unless overridden.
pub const WKHTMLTOPDF_DEFAULTS: [(&str, &str); 2] =
    [("margin-bottom", "10mm"), ("margin-top", "10mm")];

/// Intermediate HTML path for `output`: a `.pdf` extension becomes
/// `.pdf.html`; any other path gets `.pdf.html` appended.
pub fn intermediate_path(output: &Path) -> PathBuf {
    let is_pdf = output
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    let mut name: OsString = if is_pdf {
        output.with_extension("").into_os_string()
    } else {
        output.as_os_str().to_os_string()
    };
    name.push(".pdf.html");
    PathBuf::from(name)
}

/// Rasterize `markup` to `output` with the engine called `name`.
///
/// Unknown names produce no output and are reported like any other failure.
pub async fn render_named(
    name: &str,
    markup: &str,
    output: &Path,
    options: &GenerationOptions,
    on_error: Option<&dyn ErrorHandler>,
) -> Result<PathBuf, PdfError> {
    match PdfEngine::from_name(name) {
        Some(engine) => render(engine, markup, output, options, on_error).await,
        None => {
            let err = PdfError::UnknownEngine(name.to_string());
            report(on_error, &err);
            Err(err)
        }
    }
}

/// Rasterize `markup` to `output` with `engine`.
pub async fn render(
    engine: PdfEngine,
    markup: &str,
    output: &Path,
    options: &GenerationOptions,
    on_error: Option<&dyn ErrorHandler>,
) -> Result<PathBuf, PdfError> {
    match rasterize(engine, markup, output, options).await {
        Ok(()) => {
            log::info!("Wrote {} with {engine}", output.display());
            Ok(output.to_path_buf())
        }
        Err(err) => {
            report(on_error, &err);
            Err(err)
        }
    }
}

fn report(on_error: Option<&dyn ErrorHandler>, err: &PdfError) {
    log::error!("PDF generation failed: {err}");
    if let Some(handler) = on_error {
        handler.err(Status::PdfGeneration, err);
    }
}

async fn rasterize(
    engine: PdfEngine,
    markup: &str,
    output: &Path,
    options: &GenerationOptions,
) -> Result<(), PdfError> {
    let temp = intermediate_path(output);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&temp, markup).await?;
    log::debug!("Wrote intermediate {}", temp.display());

    let program = options.executable(engine);
    match engine {
        PdfEngine::Wkhtmltopdf => {
            let mut args: Vec<OsString> = wkhtmltopdf_flags(&options.wkhtmltopdf)
                .into_iter()
                .map(OsString::from)
                .collect();
            args.push(temp.into_os_string());
            args.push(output.as_os_str().to_os_string());
            spawn::run(&program, args).await
        }
        PdfEngine::Phantomjs => {
            let (script, _guard) = phantom_script(options, &temp)?;
            let args = [
                to_tool_path(&script),
                to_tool_path(&temp),
                to_tool_path(output),
            ];
            spawn::run(&program, args).await
        }
        PdfEngine::Weasyprint => spawn::run(&program, [temp.as_os_str(), output.as_os_str()]).await,
        PdfEngine::Chrome => {
            let mut chrome = options.chrome.clone();
            if chrome.launch.path.is_none() && has_override(options, engine) {
                chrome.launch.path = Some(program);
            }
            chrome::print(&temp, output, &chrome).await
        }
    }
}

fn has_override(options: &GenerationOptions, engine: PdfEngine) -> bool {
    options
        .executables
        .keys()
        .any(|k| PdfEngine::from_name(k) == Some(engine))
}

// ---------------------------------------------------------------------------
// Engine arguments
// ---------------------------------------------------------------------------

/// Command-line flags for wkhtmltopdf: the default margins merged with
/// `overrides`, one `--key value` pair per key in key order. `true` and
/// `null` emit a bare flag; `false` omits it.
pub fn wkhtmltopdf_flags(overrides: &Map<String, Value>) -> Vec<String> {
    let mut merged: BTreeMap<String, Value> = WKHTMLTOPDF_DEFAULTS
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    for (key, value) in overrides {
        merged.insert(key.trim_start_matches('-').to_string(), value.clone());
    }

    let mut flags = Vec::with_capacity(merged.len() * 2);
    for (key, value) in merged {
        match value {
            Value::Bool(false) => {}
            Value::Bool(true) | Value::Null => flags.push(format!("--{key}")),
            Value::String(s) => {
                flags.push(format!("--{key}"));
                flags.push(s);
            }
            other => {
                flags.push(format!("--{key}"));
                flags.push(other.to_string());
            }
        }
    }
    flags
}

/// The configured phantomjs script, or the bundled one written to a private
/// temporary file next to `intermediate`. The returned guard owns that file
/// and must be held until phantomjs exits.
fn phantom_script(
    options: &GenerationOptions,
    intermediate: &Path,
) -> Result<(PathBuf, Option<NamedTempFile>), PdfError> {
    if let Some(script) = &options.phantomjs.script {
        return Ok((script.clone(), None));
    }
    let dir = intermediate
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut file = tempfile::Builder::new()
        .prefix(".rasterize-")
        .suffix(".js")
        .tempfile_in(dir)?;
    file.write_all(RASTERIZE_JS.as_bytes())?;
    file.flush()?;
    Ok((file.path().to_path_buf(), Some(file)))
}

/// Path relative to the working directory when possible, with forward
/// slashes.
pub fn to_tool_path(path: &Path) -> String {
    let relative = std::env::current_dir()
        .ok()
        .and_then(|cwd| path.strip_prefix(&cwd).ok().map(Path::to_path_buf))
        .unwrap_or_else(|| path.to_path_buf());
    relative.to_string_lossy().replace('\\', "/")
}
