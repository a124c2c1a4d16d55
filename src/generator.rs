//! Theme file walker.
//!
//! [`Generator::materialize`] produces every file a theme declares for one
//! format: `transform` entries are expanded and written, `copy` entries are
//! copied verbatim, `none` entries are skipped, and declared symlinks are
//! created last. Failures are isolated per entry and collected in the
//! returned [`Report`].

use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::engine::{expand, TemplateEngine};
use crate::error::{Error, Result};
use crate::format::Format;
use crate::options::GenerationOptions;
use crate::theme::{FileAction, Theme, ThemeFile};

/// What a save hook sees for each expanded `transform` entry.
#[derive(Debug)]
pub struct SaveContext<'a> {
    /// Expanded markup.
    pub markup: String,
    pub file: &'a ThemeFile,
    pub theme: &'a Theme,
    pub format: Format,
    /// Where the markup would be written.
    pub destination: &'a Path,
}

/// Post-processes expanded markup before it is written. Returning `None`
/// suppresses the write.
pub type SaveHook<'h> = dyn Fn(SaveContext<'_>) -> Option<String> + 'h;

/// Kind of filesystem link created for a `symLinks` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    File,
    Directory,
}

impl LinkKind {
    /// Destinations with an extension are file links; others are directory
    /// links.
    pub fn for_destination(path: &Path) -> Self {
        if path.extension().is_some() {
            LinkKind::File
        } else {
            LinkKind::Directory
        }
    }
}

/// A link created by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedLink {
    pub location: PathBuf,
    pub target: PathBuf,
    pub kind: LinkKind,
}

/// A manifest entry that could not be produced.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Outcome of one [`Generator::materialize`] call.
#[derive(Debug, Default)]
pub struct Report {
    /// Files written or copied, in manifest order.
    pub written: Vec<PathBuf>,
    /// Transform entries whose hook suppressed the write.
    pub suppressed: Vec<PathBuf>,
    pub links: Vec<CreatedLink>,
    pub failures: Vec<FileFailure>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Walks a theme manifest for one output format.
pub struct Generator<'a> {
    format: Format,
    options: &'a GenerationOptions,
    engine: &'a dyn TemplateEngine,
    hook: Option<&'a SaveHook<'a>>,
}

impl<'a> Generator<'a> {
    pub fn new(
        format: Format,
        options: &'a GenerationOptions,
        engine: &'a dyn TemplateEngine,
    ) -> Self {
        Self {
            format,
            options,
            engine,
            hook: None,
        }
    }

    /// Install a hook run on every expanded `transform` entry.
    pub fn with_hook(mut self, hook: &'a SaveHook<'a>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// Produce the theme's files for this generator's format under
    /// `output_dir`.
    ///
    /// Only a missing format manifest is fatal; every other failure is logged
    /// and recorded in the report.
    pub fn materialize(&self, resume: &Value, theme: &Theme, output_dir: &Path) -> Result<Report> {
        let manifest = theme
            .format(self.format)
            .ok_or_else(|| Error::UnsupportedFormat {
                theme: theme.name.clone(),
                format: self.format.to_string(),
            })?;

        let mut report = Report::default();
        let mut seen: HashSet<PathBuf> = HashSet::new();

        for file in &manifest.files {
            let destination = output_dir.join(&file.relative_path);
            if file.action == FileAction::Skip {
                log::debug!("Skipping {}", file.relative_path.display());
                continue;
            }
            if !seen.insert(destination.clone()) {
                let err = Error::Io(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} is declared more than once", file.relative_path.display()),
                ));
                log::error!("{err}");
                report.failures.push(FileFailure {
                    path: destination,
                    error: err,
                });
                continue;
            }

            let outcome = match file.action {
                FileAction::Transform => self.transform(resume, theme, file, &destination),
                FileAction::Copy => copy(file, &destination).map(|()| true),
                FileAction::Skip => continue,
            };
            match outcome {
                Ok(true) => report.written.push(destination),
                Ok(false) => report.suppressed.push(destination),
                Err(err) => {
                    log::error!("Failed to produce {}: {err}", destination.display());
                    report.failures.push(FileFailure {
                        path: destination,
                        error: err,
                    });
                }
            }
        }

        for (location, target) in &manifest.sym_links {
            let abs_location = output_dir.join(location);
            let abs_target = abs_location
                .parent()
                .unwrap_or(output_dir)
                .join(target);
            let kind = LinkKind::for_destination(&abs_location);
            match create_link(&abs_target, &abs_location, kind) {
                Ok(()) => {
                    log::debug!(
                        "Linked {} -> {} ({:?})",
                        abs_location.display(),
                        abs_target.display(),
                        kind
                    );
                    report.links.push(CreatedLink {
                        location: abs_location,
                        target: abs_target,
                        kind,
                    });
                }
                Err(err) => {
                    log::error!("Failed to link {}: {err}", abs_location.display());
                    report.failures.push(FileFailure {
                        path: abs_location,
                        error: err.into(),
                    });
                }
            }
        }

        log::info!(
            "Generated {} file(s) for '{}' ({}), {} failure(s)",
            report.written.len(),
            theme.name,
            self.format,
            report.failures.len()
        );
        Ok(report)
    }

    /// Expand one template. Returns `false` when the hook suppressed the write.
    fn transform(
        &self,
        resume: &Value,
        theme: &Theme,
        file: &ThemeFile,
        destination: &Path,
    ) -> Result<bool> {
        let template = file.template.as_deref().unwrap_or_default();
        let markup = expand(
            self.engine,
            resume,
            template,
            self.format,
            &file.css,
            self.options,
        )?;

        let markup = match self.hook {
            Some(hook) => hook(SaveContext {
                markup,
                file,
                theme,
                format: self.format,
                destination,
            }),
            None => Some(markup),
        };
        let Some(markup) = markup else {
            log::debug!("Write of {} suppressed by hook", destination.display());
            return Ok(false);
        };

        ensure_parent(destination)?;
        fs::write(destination, markup)?;
        Ok(true)
    }
}

fn copy(file: &ThemeFile, destination: &Path) -> Result<()> {
    let source = file.source.as_deref().ok_or_else(|| {
        Error::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} has no source", file.relative_path.display()),
        ))
    })?;
    ensure_parent(destination)?;
    fs::copy(source, destination)?;
    Ok(())
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(unix)]
fn create_link(target: &Path, location: &Path, _kind: LinkKind) -> io::Result<()> {
    ensure_parent(location)?;
    std::os::unix::fs::symlink(target, location)
}

#[cfg(windows)]
fn create_link(target: &Path, location: &Path, kind: LinkKind) -> io::Result<()> {
    ensure_parent(location)?;
    match kind {
        LinkKind::File => std::os::windows::fs::symlink_file(target, location),
        LinkKind::Directory => std::os::windows::fs::symlink_dir(target, location),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_kind_follows_extension() {
        assert_eq!(LinkKind::for_destination(Path::new("out/index.html")), LinkKind::File);
        assert_eq!(LinkKind::for_destination(Path::new("out/assets")), LinkKind::Directory);
    }

    #[test]
    fn ensure_parent_accepts_bare_file_names() {
        assert!(ensure_parent(Path::new("resume.html")).is_ok());
    }
}
