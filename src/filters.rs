//! Built-in text filters available to every theme template.
//!
//! | name    | effect                                              |
//! |---------|-----------------------------------------------------|
//! | `out`   | passthrough                                         |
//! | `raw`   | passthrough                                         |
//! | `xml`   | escape `& < > " '`                                  |
//! | `md`    | Markdown → HTML                                     |
//! | `mdin`  | Markdown → HTML without a single wrapping `<p>`     |
//! | `lower` | lowercase                                           |
//! | `link`  | `<a href="url">name</a>` when a URL is given        |

use std::sync::OnceLock;

use minijinja::{Environment, Value};
use pulldown_cmark::{html, Options, Parser};
use regex::Regex;

/// Names of the filters registered by [`register`].
pub const BUILTIN_FILTERS: [&str; 7] = ["out", "raw", "xml", "md", "mdin", "lower", "link"];

/// Register the built-in filters on a template environment.
pub fn register(env: &mut Environment<'_>) {
    env.add_filter("out", out);
    env.add_filter("raw", raw);
    env.add_filter("xml", xml);
    env.add_filter("md", md);
    env.add_filter("mdin", mdin);
    env.add_filter("lower", lower);
    env.add_filter("link", link);
}

fn out(value: Value) -> Value {
    value
}

fn raw(value: Value) -> Value {
    value
}

/// Escape the five reserved markup characters.
pub fn xml(text: String) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Render Markdown to HTML. Missing input renders as an empty string.
pub fn md(text: Option<String>) -> String {
    let text = text.unwrap_or_default();
    let mut buffer = String::with_capacity(text.len() * 3 / 2);
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    html::push_html(&mut buffer, Parser::new_ext(&text, options));
    buffer
}

/// Render inline Markdown: like [`md`] but with one wrapping paragraph removed.
pub fn mdin(text: Option<String>) -> String {
    static WRAPPING_P: OnceLock<Option<Regex>> = OnceLock::new();
    let rendered = md(text);
    match WRAPPING_P.get_or_init(|| Regex::new(r"(?i)^\s*<p>|</p>\s*$").ok()) {
        Some(re) => re.replace_all(&rendered, "").into_owned(),
        None => rendered,
    }
}

pub fn lower(text: String) -> String {
    text.to_lowercase()
}

/// Anchor when `url` is present and non-empty, otherwise the bare name.
pub fn link(name: String, url: Option<String>) -> String {
    match url {
        Some(url) if !url.is_empty() => format!("<a href=\"{url}\">{name}</a>"),
        _ => name,
    }
}
