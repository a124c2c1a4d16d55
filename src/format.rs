//! Output formats.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::Error;

/// A generated output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Html,
    Text,
    Markdown,
    Pdf,
}

impl Format {
    /// Key used for this format in theme manifests and templates.
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Html => "html",
            Format::Text => "txt",
            Format::Markdown => "md",
            Format::Pdf => "pdf",
        }
    }

    /// Format of the theme templates used to produce this format. PDF is
    /// rasterized from the theme's HTML.
    pub fn template_format(&self) -> Format {
        match self {
            Format::Pdf => Format::Html,
            other => *other,
        }
    }

    /// Infer the format from an output file extension.
    pub fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?;
        ext.parse().ok()
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.to_ascii_lowercase().as_str() {
            "html" | "htm" => Ok(Format::Html),
            "txt" | "text" => Ok(Format::Text),
            "md" | "markdown" => Ok(Format::Markdown),
            "pdf" => Ok(Format::Pdf),
            other => Err(Error::Options(format!("unsupported output format '{other}'"))),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
