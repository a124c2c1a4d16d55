//! Themes – resolution of a theme name to a folder, and the `theme.json`
//! manifest that lists the files each output format produces.
//!
//! ```json
//! {
//!   "name": "modern",
//!   "engine": "underscore",
//!   "formats": {
//!     "html": {
//!       "files": [
//!         { "path": "index.html", "action": "transform", "source": "src/index.html", "css": "src/style.css" },
//!         { "path": "css/style.css", "action": "copy", "source": "src/style.css" }
//!       ],
//!       "symLinks": { "latest": "css" }
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use serde::Deserialize;

use crate::engine::CssInfo;
use crate::error::{Error, Result};
use crate::format::Format;
use crate::options::EngineKind;

/// File name of the manifest inside a theme folder.
pub const MANIFEST_FILE: &str = "theme.json";

/// How a manifest entry is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAction {
    /// Expand the template and write the result.
    Transform,
    /// Copy the source verbatim.
    Copy,
    /// Declared but not produced.
    #[serde(rename = "none")]
    Skip,
}

/// One output file declared by a theme.
#[derive(Debug, Clone)]
pub struct ThemeFile {
    /// Output path relative to the output directory.
    pub relative_path: PathBuf,
    pub action: FileAction,
    /// Absolute path of the source inside the theme.
    pub source: Option<PathBuf>,
    /// Template text, loaded for `transform` entries.
    pub template: Option<String>,
    pub css: CssInfo,
}

/// The manifest for one output format.
#[derive(Debug, Clone, Default)]
pub struct ThemeFormat {
    pub files: Vec<ThemeFile>,
    /// Link location → target, both relative to the output directory and the
    /// link's own directory respectively.
    pub sym_links: BTreeMap<PathBuf, PathBuf>,
}

/// A loaded theme. Immutable once opened.
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub folder: PathBuf,
    /// Engine the theme's templates are written for, if declared.
    pub engine: Option<EngineKind>,
    formats: BTreeMap<String, ThemeFormat>,
}

// ---------------------------------------------------------------------------
// Raw manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    name: Option<String>,
    engine: Option<EngineKind>,
    #[serde(default)]
    formats: BTreeMap<String, RawFormat>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFormat {
    #[serde(default)]
    files: Vec<RawFile>,
    #[serde(default)]
    sym_links: BTreeMap<PathBuf, PathBuf>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    path: PathBuf,
    action: FileAction,
    source: Option<PathBuf>,
    css: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl Theme {
    /// Open the theme stored in `folder`.
    ///
    /// Template sources and stylesheets of `transform` entries are read
    /// eagerly; `copy` sources are only checked when materialized.
    pub fn open(folder: &Path) -> Result<Self> {
        let manifest_path = folder.join(MANIFEST_FILE);
        let text = fs::read_to_string(&manifest_path).map_err(|e| Error::ThemeManifest {
            path: manifest_path.clone(),
            message: e.to_string(),
        })?;
        let raw: RawManifest =
            serde_json::from_str(&text).map_err(|e| Error::ThemeManifest {
                path: manifest_path.clone(),
                message: e.to_string(),
            })?;

        let name = raw.name.unwrap_or_else(|| {
            folder
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("theme")
                .to_string()
        });

        let mut formats = BTreeMap::new();
        for (key, raw_format) in raw.formats {
            let mut files = Vec::with_capacity(raw_format.files.len());
            for raw_file in raw_format.files {
                files.push(load_file(folder, &manifest_path, raw_file)?);
            }
            if let Some(link) = raw_format.sym_links.keys().find(|l| !stays_inside(l)) {
                return Err(Error::ThemeManifest {
                    path: manifest_path,
                    message: format!(
                        "link '{}' must be relative and stay inside the output directory",
                        link.display()
                    ),
                });
            }
            formats.insert(
                key,
                ThemeFormat {
                    files,
                    sym_links: raw_format.sym_links,
                },
            );
        }

        log::debug!("Opened theme '{}' from {}", name, folder.display());
        Ok(Self {
            name,
            folder: folder.to_path_buf(),
            engine: raw.engine,
            formats,
        })
    }

    /// Manifest for `format`, using the format's template format (PDF → HTML).
    pub fn format(&self, format: Format) -> Option<&ThemeFormat> {
        self.formats.get(format.template_format().as_str())
    }

    /// Format keys declared by this theme.
    pub fn format_names(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(|k| k.as_str())
    }
}

fn load_file(folder: &Path, manifest_path: &Path, raw: RawFile) -> Result<ThemeFile> {
    let manifest_error = |message: String| Error::ThemeManifest {
        path: manifest_path.to_path_buf(),
        message,
    };

    if !stays_inside(&raw.path) {
        return Err(manifest_error(format!(
            "output path '{}' must be relative and stay inside the output directory",
            raw.path.display()
        )));
    }

    let source = raw.source.map(|s| folder.join(s));
    if raw.action != FileAction::Skip && source.is_none() {
        return Err(manifest_error(format!(
            "entry '{}' needs a source",
            raw.path.display()
        )));
    }

    let (template, css) = match (raw.action, &source) {
        (FileAction::Transform, Some(src)) => {
            let template = fs::read_to_string(src)
                .map_err(|e| manifest_error(format!("{}: {e}", src.display())))?;
            let css = match raw.css {
                Some(rel) => {
                    let data = fs::read_to_string(folder.join(&rel))
                        .map_err(|e| manifest_error(format!("{}: {e}", rel.display())))?;
                    CssInfo {
                        file: Some(rel),
                        data: Some(data),
                    }
                }
                None => CssInfo::default(),
            };
            (Some(template), css)
        }
        _ => (None, CssInfo::default()),
    };

    Ok(ThemeFile {
        relative_path: raw.path,
        action: raw.action,
        source,
        template,
        css,
    })
}

/// True for relative paths made only of plain names and `.`.
fn stays_inside(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Resolve a theme name to its folder.
///
/// Each search root is tried in order (`root/<name>`), then `name` itself as
/// a path. A folder only counts if it contains a manifest.
pub fn resolve(name: &str, search_dirs: &[PathBuf]) -> Result<PathBuf> {
    let candidates = search_dirs
        .iter()
        .map(|dir| dir.join(name))
        .chain(std::iter::once(PathBuf::from(name)));
    for candidate in candidates {
        if candidate.join(MANIFEST_FILE).is_file() {
            log::debug!("Resolved theme '{}' to {}", name, candidate.display());
            return Ok(candidate);
        }
    }
    Err(Error::ThemeNotFound(name.to_string()))
}
