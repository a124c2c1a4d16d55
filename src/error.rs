//! Error types for resume generation and PDF rasterization.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that abort a generation run.
#[derive(Error, Debug)]
pub enum Error {
    /// The configured theme could not be resolved to a local folder.
    #[error("Theme not found: {0}")]
    ThemeNotFound(String),

    /// The theme manifest is missing or malformed.
    #[error("Invalid theme manifest {path}: {message}")]
    ThemeManifest { path: PathBuf, message: String },

    /// The theme declares no manifest for the requested format.
    #[error("Theme '{theme}' does not support the '{format}' format")]
    UnsupportedFormat { theme: String, format: String },

    /// Generation options failed validation.
    #[error("Invalid options: {0}")]
    Options(String),

    /// Template compilation or expansion failed.
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// PDF rasterization failed.
    #[error("PDF generation failed: {0}")]
    Pdf(#[from] PdfError),
}

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the PDF engine dispatcher.
#[derive(Error, Debug)]
pub enum PdfError {
    /// The requested engine name is not one of the registered back-ends.
    #[error("Unknown PDF engine '{0}' (expected wkhtmltopdf, phantomjs, weasyprint or chrome)")]
    UnknownEngine(String),

    /// The engine executable could not be found.
    #[error("PDF engine '{program}' is not installed or not on PATH")]
    NotInstalled { program: String },

    /// The engine process could not be started.
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran but exited unsuccessfully.
    #[error("'{program}' exited with {}: {stderr}", exit_label(.code))]
    ProcessFailed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },

    /// Headless browser session failure.
    #[error("Browser error: {0}")]
    Browser(String),

    /// Writing the intermediate HTML or the PDF failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {c}"),
        None => "no status (terminated by signal)".to_string(),
    }
}

/// Status reported alongside an error to an [`ErrorHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    ThemeNotFound,
    PdfGeneration,
}

impl Status {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Status::ThemeNotFound => "THEME_NOT_FOUND",
            Status::PdfGeneration => "PDF_GENERATION",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Receives failures that are reported rather than propagated, such as a
/// PDF engine that could not produce output.
pub trait ErrorHandler: Send + Sync {
    fn err(&self, status: Status, error: &dyn std::error::Error);
}

/// Handler that forwards every report to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorHandler;

impl ErrorHandler for LogErrorHandler {
    fn err(&self, status: Status, error: &dyn std::error::Error) {
        log::error!("[{status}] {error}");
    }
}
