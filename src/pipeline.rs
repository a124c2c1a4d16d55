//! Pipeline – ties together theme resolution, template expansion, output
//! post-processing and PDF rasterization into a single call.
//!
//! The output format is inferred from the output path. Theme files are
//! written to the output path's directory; for PDF output the expanded HTML
//! is captured instead of written and handed to the configured PDF engine,
//! which writes the output path itself.

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::engine;
use crate::error::{Error, ErrorHandler, Result, Status};
use crate::format::Format;
use crate::generator::{Generator, Report, SaveContext};
use crate::options::GenerationOptions;
use crate::pdf;
use crate::prettify::prettify;
use crate::resume::Resume;
use crate::theme::{self, Theme};

/// Outcome of [`Pipeline::generate`].
#[derive(Debug)]
pub struct GenerationReport {
    pub format: Format,
    /// Name of the theme that was used.
    pub theme: String,
    /// Per-file results of walking the theme manifest.
    pub files: Report,
    /// The rasterized PDF, for PDF output.
    pub pdf: Option<PathBuf>,
}

impl GenerationReport {
    pub fn is_clean(&self) -> bool {
        self.files.is_clean()
    }
}

/// Generation entry point configured with one set of options.
#[derive(Clone)]
pub struct Pipeline {
    options: GenerationOptions,
    error_handler: Option<Arc<dyn ErrorHandler>>,
}

impl Pipeline {
    pub fn new(options: GenerationOptions) -> Self {
        Self {
            options,
            error_handler: None,
        }
    }

    /// Receive theme and PDF failures in addition to the returned error.
    pub fn with_error_handler(mut self, handler: Arc<dyn ErrorHandler>) -> Self {
        self.error_handler = Some(handler);
        self
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Generate `resume` into `output`.
    pub async fn generate(&self, resume: &Resume, output: &Path) -> Result<GenerationReport> {
        let format = Format::from_path(output).ok_or_else(|| {
            Error::Options(format!(
                "cannot infer an output format from '{}'",
                output.display()
            ))
        })?;

        let theme = self.load_theme()?;
        let kind = theme.engine.unwrap_or(self.options.engine);
        let engine = engine::builtin(kind);
        let output_dir = output
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        log::info!(
            "Generating {} with theme '{}' ({} engine)",
            output.display(),
            theme.name,
            engine.name()
        );

        let generator = || Generator::new(format, &self.options, engine.as_ref());
        let (files, pdf) = match format {
            Format::Html => {
                let hook = |ctx: SaveContext<'_>| Some(self.prettify_html(ctx));
                let files = generator()
                    .with_hook(&hook)
                    .materialize(resume.as_value(), &theme, output_dir)?;
                (files, None)
            }
            Format::Text | Format::Markdown => {
                let files = generator().materialize(resume.as_value(), &theme, output_dir)?;
                (files, None)
            }
            Format::Pdf => {
                let (files, markup) = {
                    let captured: RefCell<Option<String>> = RefCell::new(None);
                    let hook = |ctx: SaveContext<'_>| capture_html(&captured, ctx);
                    let files = generator()
                        .with_hook(&hook)
                        .materialize(resume.as_value(), &theme, output_dir)?;
                    (files, captured.into_inner())
                };
                let markup = markup.ok_or_else(|| Error::UnsupportedFormat {
                    theme: theme.name.clone(),
                    format: "pdf (no HTML template to rasterize)".to_string(),
                })?;
                let written = pdf::render(
                    self.options.pdf,
                    &markup,
                    output,
                    &self.options,
                    self.error_handler.as_deref(),
                )
                .await?;
                (files, Some(written))
            }
        };

        Ok(GenerationReport {
            format,
            theme: theme.name,
            files,
            pdf,
        })
    }

    fn load_theme(&self) -> Result<Theme> {
        let folder = match theme::resolve(&self.options.theme, &self.options.theme_dirs) {
            Ok(folder) => folder,
            Err(err) => {
                if let Some(handler) = &self.error_handler {
                    handler.err(Status::ThemeNotFound, &err);
                }
                return Err(err);
            }
        };
        Theme::open(&folder)
    }

    fn prettify_html(&self, ctx: SaveContext<'_>) -> String {
        if self.options.prettify.enabled && is_html_file(ctx.destination) {
            prettify(&ctx.markup, &self.options.prettify)
        } else {
            ctx.markup
        }
    }
}

/// Capture the first HTML entry for rasterization and suppress its write.
/// Other entries (stylesheets, images, …) are written as usual so the
/// intermediate file can reference them.
fn capture_html(slot: &RefCell<Option<String>>, ctx: SaveContext<'_>) -> Option<String> {
    if !is_html_file(ctx.destination) {
        return Some(ctx.markup);
    }
    let mut slot = slot.borrow_mut();
    if slot.is_some() {
        log::warn!(
            "Only the first HTML file is rasterized; writing {} as-is",
            ctx.destination.display()
        );
        return Some(ctx.markup);
    }
    *slot = Some(ctx.markup);
    None
}

fn is_html_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}
