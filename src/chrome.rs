//! Headless Chrome back-end.
//!
//! The browser session is blocking, so it runs on tokio's blocking pool.
//! Page lengths from [`ChromePdfOptions`] are converted to inches, the unit
//! the DevTools `Page.printToPDF` call expects.

use std::ffi::OsStr;
use std::path::Path;

use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};

use crate::error::PdfError;
use crate::options::{ChromeLaunchOptions, ChromeOptions, ChromePdfOptions};

const PX_PER_INCH: f64 = 96.0;
const CM_PER_INCH: f64 = 2.54;
const MM_PER_INCH: f64 = 25.4;

/// Paper formats in inches (width, height).
const PAPER_FORMATS: &[(&str, f64, f64)] = &[
    ("letter", 8.5, 11.0),
    ("legal", 8.5, 14.0),
    ("tabloid", 11.0, 17.0),
    ("ledger", 17.0, 11.0),
    ("a0", 33.1, 46.8),
    ("a1", 23.4, 33.1),
    ("a2", 16.54, 23.4),
    ("a3", 11.7, 16.54),
    ("a4", 8.27, 11.7),
    ("a5", 5.83, 8.27),
    ("a6", 4.13, 5.83),
];

/// Print the HTML file at `source` to `output`.
pub async fn print(source: &Path, output: &Path, options: &ChromeOptions) -> Result<(), PdfError> {
    let url = file_url(source)?;
    let launch = options.launch.clone();
    let page = page_options(&options.pdf)?;

    log::info!("Printing {url} with headless Chrome");
    let bytes = tokio::task::spawn_blocking(move || print_blocking(&url, &launch, page))
        .await
        .map_err(|e| PdfError::Browser(e.to_string()))??;

    tokio::fs::write(output, bytes).await?;
    Ok(())
}

fn print_blocking(
    url: &str,
    launch: &ChromeLaunchOptions,
    page: PrintToPdfOptions,
) -> Result<Vec<u8>, PdfError> {
    let args: Vec<&OsStr> = launch.args.iter().map(OsStr::new).collect();
    let launch_options = LaunchOptions {
        headless: launch.headless,
        sandbox: launch.sandbox,
        path: launch.path.clone(),
        args,
        ..LaunchOptions::default()
    };

    let browser = Browser::new(launch_options).map_err(browser_err)?;
    let tab = browser.new_tab().map_err(browser_err)?;
    tab.navigate_to(url).map_err(browser_err)?;
    tab.wait_until_navigated().map_err(browser_err)?;
    tab.wait_for_element("body").map_err(browser_err)?;
    let bytes = tab.print_to_pdf(Some(page)).map_err(browser_err)?;
    drop(browser);
    Ok(bytes)
}

fn browser_err(e: impl std::fmt::Display) -> PdfError {
    PdfError::Browser(e.to_string())
}

/// `file://` URL for a local file.
fn file_url(path: &Path) -> Result<String, PdfError> {
    let absolute = std::fs::canonicalize(path)?;
    let text = absolute.to_string_lossy().replace('\\', "/");
    let text = text.trim_start_matches("//?/");
    if text.starts_with('/') {
        Ok(format!("file://{text}"))
    } else {
        Ok(format!("file:///{text}"))
    }
}

/// Convert page settings to DevTools print options.
pub fn page_options(pdf: &ChromePdfOptions) -> Result<PrintToPdfOptions, PdfError> {
    let (width, height) = match pdf.format.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => paper_size(name)
            .ok_or_else(|| PdfError::Browser(format!("unknown paper format '{name}'")))?,
        _ => (parse_length(&pdf.width)?, parse_length(&pdf.height)?),
    };
    let page_ranges = (!pdf.page_ranges.trim().is_empty()).then(|| pdf.page_ranges.clone());

    Ok(PrintToPdfOptions {
        landscape: Some(pdf.landscape),
        display_header_footer: Some(pdf.display_header_footer),
        print_background: Some(pdf.print_background),
        scale: Some(pdf.scale),
        paper_width: Some(width),
        paper_height: Some(height),
        margin_top: Some(parse_length(&pdf.margin.top)?),
        margin_bottom: Some(parse_length(&pdf.margin.bottom)?),
        margin_left: Some(parse_length(&pdf.margin.left)?),
        margin_right: Some(parse_length(&pdf.margin.right)?),
        page_ranges,
        ..Default::default()
    })
}

/// Paper size in inches for a format name (case-insensitive).
pub fn paper_size(name: &str) -> Option<(f64, f64)> {
    let name = name.to_ascii_lowercase();
    PAPER_FORMATS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|&(_, w, h)| (w, h))
}

/// Parse a CSS-style length (`in`, `cm`, `mm`, `px`, or a bare pixel count)
/// into inches. An empty string is zero.
pub fn parse_length(text: &str) -> Result<f64, PdfError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(0.0);
    }
    let lower = text.to_ascii_lowercase();
    let (number, divisor) = if let Some(n) = lower.strip_suffix("in") {
        (n, 1.0)
    } else if let Some(n) = lower.strip_suffix("cm") {
        (n, CM_PER_INCH)
    } else if let Some(n) = lower.strip_suffix("mm") {
        (n, MM_PER_INCH)
    } else if let Some(n) = lower.strip_suffix("px") {
        (n, PX_PER_INCH)
    } else {
        (lower.as_str(), PX_PER_INCH)
    };
    let value: f64 = number
        .trim()
        .parse()
        .map_err(|_| PdfError::Browser(format!("invalid length '{text}'")))?;
    Ok(value / divisor)
}
