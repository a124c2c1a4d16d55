//! Template invocation.
//!
//! A [`TemplateEngine`] turns `(resume, template source, format, css info,
//! options)` into markup. Two back-ends ship with the crate, both built on
//! `minijinja`; [`expand`] wraps any engine with line-break freezing.

use std::path::PathBuf;

use minijinja::syntax::SyntaxConfig;
use minijinja::{context, AutoEscape, Environment, UndefinedBehavior};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::filters;
use crate::format::Format;
use crate::options::{EngineKind, GenerationOptions, TemplateDelimiters};

/// Stylesheet associated with a template, exposed to templates as `css`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CssInfo {
    /// Path of the stylesheet inside the theme.
    pub file: Option<PathBuf>,
    /// Stylesheet contents.
    pub data: Option<String>,
}

/// A template-expansion back-end.
pub trait TemplateEngine: Send + Sync {
    /// Name of this engine
    fn name(&self) -> &'static str;

    /// Expand `source` against `resume`.
    fn render(
        &self,
        resume: &Value,
        source: &str,
        format: Format,
        css: &CssInfo,
        options: &GenerationOptions,
    ) -> Result<String>;
}

/// Instantiate a built-in engine.
pub fn builtin(kind: EngineKind) -> Box<dyn TemplateEngine> {
    match kind {
        EngineKind::Underscore => Box::new(UnderscoreEngine),
        EngineKind::Jinja => Box::new(JinjaEngine),
    }
}

/// Expand a template, freezing line breaks around the engine call when
/// `freeze_breaks` is enabled.
pub fn expand(
    engine: &dyn TemplateEngine,
    resume: &Value,
    source: &str,
    format: Format,
    css: &CssInfo,
    options: &GenerationOptions,
) -> Result<String> {
    if !options.freeze_breaks {
        return engine.render(resume, source, format, css, options);
    }
    let freezer = options.freezer();
    let frozen = freezer.freeze(source);
    let result = engine.render(resume, &frozen, format, css, options)?;
    Ok(freezer.unfreeze(&result))
}

// ---------------------------------------------------------------------------
// Built-in engines
// ---------------------------------------------------------------------------

/// Underscore-style templates: `{{ }}` interpolation, `{{= }}` escaped
/// interpolation, `{% %}` statements and `{# #}` comments, all configurable
/// through [`TemplateDelimiters`]. Missing attributes render empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnderscoreEngine;

impl TemplateEngine for UnderscoreEngine {
    fn name(&self) -> &'static str {
        "underscore"
    }

    fn render(
        &self,
        resume: &Value,
        source: &str,
        format: Format,
        css: &CssInfo,
        options: &GenerationOptions,
    ) -> Result<String> {
        let delims = &options.template;
        let syntax = SyntaxConfig::builder()
            .block_delimiters(delims.evaluate.open.clone(), delims.evaluate.close.clone())
            .variable_delimiters(
                delims.interpolate.open.clone(),
                delims.interpolate.close.clone(),
            )
            .comment_delimiters(delims.comment.open.clone(), delims.comment.close.clone())
            .build()?;

        let mut env = environment(options, UndefinedBehavior::Chainable);
        env.set_syntax(syntax);

        let source = rewrite_escapes(source, delims)?;
        render_with(&env, &source, resume, format, css)
    }
}

/// Stock Jinja syntax. Undefined values render empty.
#[derive(Debug, Default, Clone, Copy)]
pub struct JinjaEngine;

impl TemplateEngine for JinjaEngine {
    fn name(&self) -> &'static str {
        "jinja"
    }

    fn render(
        &self,
        resume: &Value,
        source: &str,
        format: Format,
        css: &CssInfo,
        options: &GenerationOptions,
    ) -> Result<String> {
        let env = environment(options, UndefinedBehavior::Lenient);
        render_with(&env, source, resume, format, css)
    }
}

fn environment(options: &GenerationOptions, undefined: UndefinedBehavior) -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(undefined);
    env.set_auto_escape_callback(|_: &str| AutoEscape::None);
    env.set_keep_trailing_newline(true);
    env.set_trim_blocks(!options.keep_breaks);
    env.set_lstrip_blocks(!options.keep_breaks);
    filters::register(&mut env);
    env
}

fn render_with(
    env: &Environment<'_>,
    source: &str,
    resume: &Value,
    format: Format,
    css: &CssInfo,
) -> Result<String> {
    let ctx = context! {
        r => resume,
        resume => resume,
        css => css,
        format => format.as_str(),
    };
    Ok(env.render_str(source, ctx)?)
}

/// Rewrite escape blocks (`{{= expr }}`) into interpolations piped through
/// the `xml` filter. Runs before compilation, so the escape opener may share
/// a prefix with the interpolation opener.
fn rewrite_escapes(source: &str, delims: &TemplateDelimiters) -> Result<String> {
    let pattern = format!(
        "{}(.+?){}",
        regex::escape(&delims.escape.open),
        regex::escape(&delims.escape.close)
    );
    let re = Regex::new(&pattern).map_err(|e| Error::Options(e.to_string()))?;
    let open = &delims.interpolate.open;
    let close = &delims.interpolate.close;
    Ok(re
        .replace_all(source, |caps: &regex::Captures<'_>| {
            format!("{open} ({})|xml {close}", caps[1].trim())
        })
        .into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn resume() -> Value {
        json!({
            "name": "Ada Lovelace",
            "contact": { "email": "ada@example.com" },
            "skills": ["Analysis", "Notes & Diagrams"]
        })
    }

    fn run(engine: &dyn TemplateEngine, src: &str, opts: &GenerationOptions) -> String {
        expand(engine, &resume(), src, Format::Html, &CssInfo::default(), opts).unwrap()
    }

    #[test]
    fn underscore_interpolates_and_loops() {
        let opts = GenerationOptions::default();
        let out = run(
            &UnderscoreEngine,
            "<h1>{{ r.name }}</h1>{% for s in r.skills %}[{{ s }}]{% endfor %}",
            &opts,
        );
        assert_eq!(out, "<h1>Ada Lovelace</h1>[Analysis][Notes & Diagrams]");
    }

    #[test]
    fn underscore_escape_blocks_use_xml_filter() {
        let opts = GenerationOptions::default();
        let out = run(&UnderscoreEngine, "{{= r.skills[1] }}", &opts);
        assert_eq!(out, "Notes &amp; Diagrams");
    }

    #[test]
    fn underscore_comments_are_dropped() {
        let opts = GenerationOptions::default();
        let out = run(&UnderscoreEngine, "a{# hidden #}b", &opts);
        assert_eq!(out, "ab");
    }

    #[test]
    fn underscore_tolerates_missing_chains() {
        let opts = GenerationOptions::default();
        let out = run(&UnderscoreEngine, "[{{ r.social.github.url }}]", &opts);
        assert_eq!(out, "[]");
    }

    #[test]
    fn custom_delimiters() {
        let opts = GenerationOptions::with_overrides(&json!({
            "template": {
                "interpolate": { "open": "[[", "close": "]]" },
                "escape": { "open": "[[!", "close": "]]" },
                "evaluate": { "open": "[%", "close": "%]" },
                "comment": { "open": "[#", "close": "#]" }
            }
        }))
        .unwrap();
        let out = run(
            &UnderscoreEngine,
            "[% if r.name %][[ r.contact.email ]][% endif %]|[[! r.skills[1] ]][# note #]",
            &opts,
        );
        assert_eq!(out, "ada@example.com|Notes &amp; Diagrams");
    }

    #[test]
    fn jinja_engine_uses_stock_syntax() {
        let opts = GenerationOptions::default();
        let out = run(&JinjaEngine, "{{ r.name|lower }} ({{ format }})", &opts);
        assert_eq!(out, "ada lovelace (html)");
    }

    #[test]
    fn css_info_is_exposed() {
        let css = CssInfo {
            file: Some(PathBuf::from("src/style.css")),
            data: Some("body{}".to_string()),
        };
        let out = UnderscoreEngine
            .render(
                &resume(),
                "<style>{{ css.data }}</style>",
                Format::Html,
                &css,
                &GenerationOptions::default(),
            )
            .unwrap();
        assert_eq!(out, "<style>body{}</style>");
    }

    #[test]
    fn trailing_newline_is_kept() {
        let opts = GenerationOptions::default();
        assert_eq!(run(&JinjaEngine, "x\n", &opts), "x\n");
    }

    #[test]
    fn keep_breaks_off_trims_block_lines() {
        let opts = GenerationOptions::with_overrides(&json!({ "keepBreaks": false })).unwrap();
        let src = "{% for s in r.skills %}\n- {{ s }}\n{% endfor %}\n";
        assert_eq!(run(&UnderscoreEngine, src, &opts), "- Analysis\n- Notes & Diagrams\n");
    }

    /// Engine that flattens whitespace the way some template libraries do.
    struct CollapsingEngine;

    impl TemplateEngine for CollapsingEngine {
        fn name(&self) -> &'static str {
            "collapsing"
        }

        fn render(
            &self,
            _resume: &Value,
            source: &str,
            _format: Format,
            _css: &CssInfo,
            _options: &GenerationOptions,
        ) -> Result<String> {
            Ok(source.split_whitespace().collect::<Vec<_>>().join(" "))
        }
    }

    #[test]
    fn freeze_breaks_survive_whitespace_collapsing() {
        let src = "line one\nline two\r\nline three";
        let plain = run(&CollapsingEngine, src, &GenerationOptions::default());
        assert_eq!(plain, "line one line two line three");

        let opts = GenerationOptions::with_overrides(&json!({ "freezeBreaks": true })).unwrap();
        assert_eq!(run(&CollapsingEngine, src, &opts), src);
    }

    #[test]
    fn builtin_resolves_by_kind() {
        assert_eq!(builtin(EngineKind::Underscore).name(), "underscore");
        assert_eq!(builtin(EngineKind::Jinja).name(), "jinja");
    }
}
