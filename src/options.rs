//! Generation options.
//!
//! Options are layered as built-in defaults ← caller overrides. Overrides are a
//! JSON object deep-merged into the serialized defaults; the merged value is
//! then deserialized and validated, so an options value is never mutated after
//! construction and unknown engine names fail here rather than at render time.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::freeze::{Freezer, NEWLINE_SENTINEL, RETURN_SENTINEL};

// ---------------------------------------------------------------------------
// Engine names
// ---------------------------------------------------------------------------

/// Template-expansion back-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EngineKind {
    /// Underscore-style delimiters taken from [`TemplateDelimiters`].
    #[default]
    Underscore,
    /// Stock Jinja syntax.
    Jinja,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::Underscore => "underscore",
            EngineKind::Jinja => "jinja",
        }
    }
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "underscore" => Ok(EngineKind::Underscore),
            "jinja" | "minijinja" => Ok(EngineKind::Jinja),
            other => Err(Error::Options(format!(
                "unknown template engine '{other}' (expected underscore or jinja)"
            ))),
        }
    }
}

impl TryFrom<String> for EngineKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<EngineKind> for String {
    fn from(value: EngineKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// PDF rasterization back-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PdfEngine {
    #[default]
    Wkhtmltopdf,
    Phantomjs,
    Weasyprint,
    Chrome,
}

impl PdfEngine {
    pub const ALL: [PdfEngine; 4] = [
        PdfEngine::Wkhtmltopdf,
        PdfEngine::Phantomjs,
        PdfEngine::Weasyprint,
        PdfEngine::Chrome,
    ];

    /// Resolve an engine name. `phantom` is accepted as an alias of
    /// `phantomjs`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "wkhtmltopdf" => Some(PdfEngine::Wkhtmltopdf),
            "phantomjs" | "phantom" => Some(PdfEngine::Phantomjs),
            "weasyprint" => Some(PdfEngine::Weasyprint),
            "chrome" => Some(PdfEngine::Chrome),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PdfEngine::Wkhtmltopdf => "wkhtmltopdf",
            PdfEngine::Phantomjs => "phantomjs",
            PdfEngine::Weasyprint => "weasyprint",
            PdfEngine::Chrome => "chrome",
        }
    }
}

impl FromStr for PdfEngine {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PdfEngine::from_name(s).ok_or_else(|| {
            Error::Options(format!(
                "unknown PDF engine '{s}' (expected wkhtmltopdf, phantomjs, weasyprint or chrome)"
            ))
        })
    }
}

impl TryFrom<String> for PdfEngine {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PdfEngine> for String {
    fn from(value: PdfEngine) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for PdfEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Option groups
// ---------------------------------------------------------------------------

/// Opening and closing delimiter for one template construct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiter {
    pub open: String,
    pub close: String,
}

impl Delimiter {
    fn new(open: &str, close: &str) -> Self {
        Self {
            open: open.to_string(),
            close: close.to_string(),
        }
    }
}

/// Delimiters recognised by the underscore-style engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateDelimiters {
    /// `{{ expr }}` – insert a value.
    pub interpolate: Delimiter,
    /// `{{= expr }}` – insert an XML-escaped value.
    pub escape: Delimiter,
    /// `{% stmt %}` – control flow.
    pub evaluate: Delimiter,
    /// `{# text #}` – dropped from output.
    pub comment: Delimiter,
}

impl Default for TemplateDelimiters {
    fn default() -> Self {
        Self {
            interpolate: Delimiter::new("{{", "}}"),
            escape: Delimiter::new("{{=", "}}"),
            evaluate: Delimiter::new("{%", "%}"),
            comment: Delimiter::new("{#", "#}"),
        }
    }
}

/// HTML output formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrettifyOptions {
    pub enabled: bool,
    pub indent_size: usize,
    /// Tags whose content is never reflowed.
    pub unformatted: Vec<String>,
    /// Wrap column for inline runs; 0 disables wrapping.
    pub max_char: usize,
}

impl Default for PrettifyOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            indent_size: 2,
            unformatted: vec!["em".to_string(), "strong".to_string(), "a".to_string()],
            max_char: 80,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhantomOptions {
    /// Rasterization script; the bundled script is used when unset.
    pub script: Option<PathBuf>,
}

/// Browser launch settings for the chrome engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeLaunchOptions {
    pub headless: bool,
    pub sandbox: bool,
    /// Browser executable; auto-detected when unset.
    pub path: Option<PathBuf>,
    pub args: Vec<String>,
}

impl Default for ChromeLaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            sandbox: true,
            path: None,
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfMargins {
    pub top: String,
    pub bottom: String,
    pub left: String,
    pub right: String,
}

impl Default for PdfMargins {
    fn default() -> Self {
        Self {
            top: "0.4in".to_string(),
            bottom: "0.56in".to_string(),
            left: "0.4in".to_string(),
            right: "0.4in".to_string(),
        }
    }
}

/// Page settings for the chrome engine. Lengths accept `in`, `cm`, `mm` and
/// `px` units; a bare number is pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ChromePdfOptions {
    pub landscape: bool,
    pub display_header_footer: bool,
    pub print_background: bool,
    /// Paper format name (`A4`, `Letter`, …). Takes precedence over
    /// `width` / `height` when set.
    pub format: Option<String>,
    pub scale: f64,
    pub width: String,
    pub height: String,
    pub page_ranges: String,
    pub margin: PdfMargins,
}

impl Default for ChromePdfOptions {
    fn default() -> Self {
        Self {
            landscape: false,
            display_header_footer: false,
            print_background: false,
            format: Some("A4".to_string()),
            scale: 1.0,
            width: "8.5in".to_string(),
            height: "11in".to_string(),
            page_ranges: String::new(),
            margin: PdfMargins::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChromeOptions {
    pub launch: ChromeLaunchOptions,
    pub pdf: ChromePdfOptions,
}

// ---------------------------------------------------------------------------
// GenerationOptions
// ---------------------------------------------------------------------------

/// Complete, validated configuration for one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationOptions {
    /// Theme name (looked up under `theme_dirs`) or path.
    pub theme: String,
    pub theme_dirs: Vec<PathBuf>,
    pub engine: EngineKind,
    /// When false, newlines after block tags are trimmed.
    pub keep_breaks: bool,
    pub freeze_breaks: bool,
    pub n_sym: String,
    pub r_sym: String,
    pub template: TemplateDelimiters,
    pub prettify: PrettifyOptions,
    pub pdf: PdfEngine,
    /// Extra `wkhtmltopdf` flags, keyed without the leading `--`.
    pub wkhtmltopdf: Map<String, Value>,
    pub phantomjs: PhantomOptions,
    pub chrome: ChromeOptions,
    /// Executable override per PDF engine name.
    pub executables: BTreeMap<String, PathBuf>,
    /// Unrecognised keys, kept for pass-through.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            theme: "modern".to_string(),
            theme_dirs: Vec::new(),
            engine: EngineKind::Underscore,
            keep_breaks: true,
            freeze_breaks: false,
            n_sym: NEWLINE_SENTINEL.to_string(),
            r_sym: RETURN_SENTINEL.to_string(),
            template: TemplateDelimiters::default(),
            prettify: PrettifyOptions::default(),
            pdf: PdfEngine::Wkhtmltopdf,
            wkhtmltopdf: Map::new(),
            phantomjs: PhantomOptions::default(),
            chrome: ChromeOptions::default(),
            executables: BTreeMap::new(),
            extra: Map::new(),
        }
    }
}

impl GenerationOptions {
    /// Merge `overrides` (a JSON object) into the defaults.
    pub fn with_overrides(overrides: &Value) -> Result<Self> {
        Self::default().merged(overrides)
    }

    /// Produce a new options value with `overrides` deep-merged over `self`.
    pub fn merged(&self, overrides: &Value) -> Result<Self> {
        if !overrides.is_object() && !overrides.is_null() {
            return Err(Error::Options(
                "overrides must be a JSON object".to_string(),
            ));
        }
        let mut base = serde_json::to_value(self)?;
        if overrides.is_object() {
            deep_merge(&mut base, overrides);
        }
        let merged: GenerationOptions =
            serde_json::from_value(base).map_err(|e| Error::Options(e.to_string()))?;
        merged.validate()?;
        Ok(merged)
    }

    /// Load overrides from a JSON file and merge them into the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let overrides: Value = serde_json::from_str(&text)?;
        Self::with_overrides(&overrides)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.freeze_breaks {
            if self.n_sym.is_empty() || self.r_sym.is_empty() {
                return Err(Error::Options(
                    "nSym and rSym must be non-empty when freezeBreaks is set".to_string(),
                ));
            }
            if self.n_sym == self.r_sym {
                return Err(Error::Options(
                    "nSym and rSym must differ".to_string(),
                ));
            }
        }
        for (name, d) in [
            ("interpolate", &self.template.interpolate),
            ("escape", &self.template.escape),
            ("evaluate", &self.template.evaluate),
            ("comment", &self.template.comment),
        ] {
            if d.open.is_empty() || d.close.is_empty() {
                return Err(Error::Options(format!(
                    "template.{name} delimiters must be non-empty"
                )));
            }
        }
        for key in self.executables.keys() {
            if PdfEngine::from_name(key).is_none() {
                return Err(Error::Options(format!(
                    "executables: unknown PDF engine '{key}'"
                )));
            }
        }
        if self.chrome.pdf.scale <= 0.0 {
            return Err(Error::Options("chrome.pdf.scale must be positive".to_string()));
        }
        Ok(())
    }

    /// Freezer configured with this run's sentinels.
    pub fn freezer(&self) -> Freezer {
        Freezer::new(self.n_sym.clone(), self.r_sym.clone())
    }

    /// Executable to run for `engine`, honouring `executables` overrides
    /// (either the engine name or an alias may be used as key).
    pub fn executable(&self, engine: PdfEngine) -> PathBuf {
        self.executables
            .iter()
            .find(|(k, _)| PdfEngine::from_name(k) == Some(engine))
            .map(|(_, v)| v.clone())
            .unwrap_or_else(|| PathBuf::from(engine.as_str()))
    }
}

/// Recursively merge `overlay` into `base`. Objects merge key by key; any
/// other overlay value, `null` included, replaces the base value.
pub fn deep_merge(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_documented_values() {
        let opts = GenerationOptions::default();
        assert_eq!(opts.engine, EngineKind::Underscore);
        assert!(opts.keep_breaks);
        assert!(!opts.freeze_breaks);
        assert_eq!(opts.n_sym, "&newl;");
        assert_eq!(opts.r_sym, "&retn;");
        assert_eq!(opts.pdf, PdfEngine::Wkhtmltopdf);
        assert_eq!(opts.prettify.indent_size, 2);
        assert_eq!(opts.prettify.unformatted, vec!["em", "strong", "a"]);
        assert_eq!(opts.chrome.pdf.format.as_deref(), Some("A4"));
        assert_eq!(opts.chrome.pdf.margin.bottom, "0.56in");
    }

    #[test]
    fn overrides_merge_deeply() {
        let opts = GenerationOptions::with_overrides(&json!({
            "freezeBreaks": true,
            "pdf": "phantom",
            "chrome": { "pdf": { "landscape": true, "margin": { "top": "1in" } } },
            "prettify": { "indentSize": 4 }
        }))
        .unwrap();
        assert!(opts.freeze_breaks);
        assert_eq!(opts.pdf, PdfEngine::Phantomjs);
        assert!(opts.chrome.pdf.landscape);
        assert_eq!(opts.chrome.pdf.margin.top, "1in");
        // untouched siblings keep their defaults
        assert_eq!(opts.chrome.pdf.margin.left, "0.4in");
        assert_eq!(opts.prettify.indent_size, 4);
        assert_eq!(opts.prettify.max_char, 80);
    }

    #[test]
    fn merging_does_not_touch_the_source() {
        let base = GenerationOptions::default();
        let derived = base.merged(&json!({ "theme": "compact" })).unwrap();
        assert_eq!(base.theme, "modern");
        assert_eq!(derived.theme, "compact");
    }

    #[test]
    fn unknown_engine_names_fail_fast() {
        let err = GenerationOptions::with_overrides(&json!({ "pdf": "prince" })).unwrap_err();
        assert!(err.to_string().contains("prince"), "{err}");

        let err = GenerationOptions::with_overrides(&json!({ "engine": "mustache" })).unwrap_err();
        assert!(err.to_string().contains("mustache"), "{err}");
    }

    #[test]
    fn unrecognised_keys_are_preserved() {
        let opts = GenerationOptions::with_overrides(&json!({ "css": "embed", "debug": true })).unwrap();
        assert_eq!(opts.extra.get("css"), Some(&json!("embed")));
        assert_eq!(opts.extra.get("debug"), Some(&json!(true)));
    }

    #[test]
    fn executable_overrides_accept_aliases() {
        let opts = GenerationOptions::with_overrides(&json!({
            "executables": { "phantom": "/opt/phantom/bin/phantomjs" }
        }))
        .unwrap();
        assert_eq!(
            opts.executable(PdfEngine::Phantomjs),
            PathBuf::from("/opt/phantom/bin/phantomjs")
        );
        assert_eq!(opts.executable(PdfEngine::Weasyprint), PathBuf::from("weasyprint"));
    }

    #[test]
    fn non_object_overrides_are_rejected() {
        assert!(GenerationOptions::with_overrides(&json!([1, 2])).is_err());
        assert!(GenerationOptions::with_overrides(&Value::Null).is_ok());
    }

    #[test]
    fn null_override_clears_a_default() {
        let base = GenerationOptions::with_overrides(&json!({
            "chrome": { "launch": { "path": "/opt/chrome" } },
            "phantomjs": { "script": "print.js" }
        }))
        .unwrap();
        let cleared = base
            .merged(&json!({
                "chrome": { "launch": { "path": null }, "pdf": { "format": null } },
                "phantomjs": { "script": null }
            }))
            .unwrap();
        assert_eq!(cleared.chrome.launch.path, None);
        assert_eq!(cleared.chrome.pdf.format, None);
        assert_eq!(cleared.phantomjs.script, None);
        // siblings survive
        assert!(cleared.chrome.launch.headless);
        assert_eq!(cleared.chrome.pdf.width, "8.5in");
    }

    #[test]
    fn null_for_a_required_field_is_an_options_error() {
        let err = GenerationOptions::with_overrides(&json!({ "prettify": null })).unwrap_err();
        assert!(matches!(err, Error::Options(_)), "{err}");
    }

    #[test]
    fn every_engine_name_round_trips() {
        for engine in PdfEngine::ALL {
            assert_eq!(engine.as_str().parse::<PdfEngine>().unwrap(), engine);
            let opts = GenerationOptions::with_overrides(&json!({ "pdf": engine.as_str() })).unwrap();
            assert_eq!(opts.pdf, engine);
        }
    }

    #[test]
    fn phantom_alias_resolves_to_phantomjs() {
        assert_eq!(PdfEngine::from_name("phantom"), Some(PdfEngine::Phantomjs));
        assert_eq!(PdfEngine::from_name("PhantomJS"), Some(PdfEngine::Phantomjs));
        assert_eq!(PdfEngine::from_name("nope"), None);
    }
}
