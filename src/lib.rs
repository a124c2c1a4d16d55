//! # resume-forge – Theme-driven resume generation
//!
//! This crate turns a JSON resume into HTML, plain text, Markdown or PDF by
//! expanding the templates of a theme. The pipeline stages are:
//!
//! 1. **Resolve** – theme name → theme folder and manifest ([`theme`])
//! 2. **Expand** – template + resume → markup, with optional line-break
//!    freezing ([`engine`], [`filters`], [`freeze`])
//! 3. **Materialize** – write, copy and link the theme's files ([`generator`])
//! 4. **Post-process** – re-indent HTML ([`prettify`]) or rasterize it to PDF
//!    with an external engine ([`pdf`])
//!
//! [`pipeline::Pipeline`] drives all stages for one output path.

pub mod chrome;
pub mod dom;
pub mod engine;
pub mod error;
pub mod filters;
pub mod format;
pub mod freeze;
pub mod generator;
pub mod options;
pub mod pdf;
pub mod pipeline;
pub mod prettify;
pub mod resume;
pub mod spawn;
pub mod templates;
pub mod theme;

// Re-exports for convenience
pub use error::{Error, ErrorHandler, PdfError, Result, Status};
pub use format::Format;
pub use options::{EngineKind, GenerationOptions, PdfEngine};
pub use pipeline::{GenerationReport, Pipeline};
pub use resume::Resume;
