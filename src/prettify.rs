//! HTML re-indentation for generated markup.
//!
//! Block elements go on their own lines, indented per nesting level. Inline
//! elements and text stay together as runs that are whitespace-collapsed and
//! wrapped at `max_char`. Tags listed in `unformatted` are emitted exactly as
//! parsed, as is the content of raw-text elements such as `<pre>`.

use crate::dom::{is_inline, parse_html, DomNode, ElementNode};
use crate::options::PrettifyOptions;

/// Re-indent `html` according to `options`.
pub fn prettify(html: &str, options: &PrettifyOptions) -> String {
    let nodes = parse_html(html);
    let mut printer = Printer {
        options,
        lines: Vec::new(),
    };
    printer.write_block(&nodes, 0);
    if printer.lines.is_empty() {
        return String::new();
    }
    let mut out = printer.lines.join("\n");
    out.push('\n');
    out
}

/// A word or inline element, and whether whitespace preceded it.
#[derive(Debug)]
struct Token {
    text: String,
    space_before: bool,
}

struct Printer<'a> {
    options: &'a PrettifyOptions,
    lines: Vec<String>,
}

impl Printer<'_> {
    fn indent(&self, depth: usize) -> String {
        " ".repeat(depth * self.options.indent_size)
    }

    fn line(&mut self, depth: usize, content: &str) {
        let indent = self.indent(depth);
        self.lines.push(format!("{indent}{content}"));
    }

    fn is_unformatted(&self, tag: &str) -> bool {
        self.options.unformatted.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    fn is_inline_node(&self, node: &DomNode) -> bool {
        match node {
            DomNode::Text(_) => true,
            DomNode::Element(e) => is_inline(&e.tag) || self.is_unformatted(&e.tag),
            DomNode::Comment(_) | DomNode::Declaration(_) => false,
        }
    }

    fn write_block(&mut self, nodes: &[DomNode], depth: usize) {
        let mut run: Vec<&DomNode> = Vec::new();
        for node in nodes {
            if self.is_inline_node(node) {
                run.push(node);
                continue;
            }
            self.flush_run(&run, depth);
            run.clear();
            match node {
                DomNode::Comment(body) => self.line(depth, &format!("<!--{body}-->")),
                DomNode::Declaration(decl) => self.line(depth, decl),
                DomNode::Element(e) => self.write_element(e, depth),
                DomNode::Text(_) => {}
            }
        }
        self.flush_run(&run, depth);
    }

    fn flush_run(&mut self, run: &[&DomNode], depth: usize) {
        let tokens = self.tokens(run.iter().copied());
        for text in self.wrap(&tokens, depth) {
            self.line(depth, &text);
        }
    }

    fn write_element(&mut self, e: &ElementNode, depth: usize) {
        let open = open_tag(e);
        if crate::dom::is_void(&e.tag) {
            self.line(depth, &open);
            return;
        }
        let close = format!("</{}>", e.tag);
        if let Some(raw) = &e.raw_content {
            self.line(depth, &format!("{open}{raw}{close}"));
            return;
        }

        if e.children.iter().all(|c| self.is_inline_node(c)) {
            let tokens = self.tokens(e.children.iter());
            let inline = join_tokens(&tokens);
            let single = format!("{open}{inline}{close}");
            let fits = self.options.max_char == 0
                || width(&self.indent(depth)) + width(&single) <= self.options.max_char;
            if fits {
                self.line(depth, &single);
                return;
            }
            self.line(depth, &open);
            for text in self.wrap(&tokens, depth + 1) {
                self.line(depth + 1, &text);
            }
            self.line(depth, &close);
            return;
        }

        self.line(depth, &open);
        self.write_block(&e.children, depth + 1);
        self.line(depth, &close);
    }

    /// Tokenize an inline run, collapsing whitespace.
    fn tokens<'n>(&self, nodes: impl Iterator<Item = &'n DomNode>) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut pending_space = false;
        for node in nodes {
            match node {
                DomNode::Text(text) => {
                    if text.starts_with(char::is_whitespace) {
                        pending_space = true;
                    }
                    for word in text.split_whitespace() {
                        tokens.push(Token {
                            text: word.to_string(),
                            space_before: pending_space,
                        });
                        pending_space = true;
                    }
                    pending_space = text.ends_with(char::is_whitespace)
                        || (pending_space && text.trim().is_empty());
                }
                other => {
                    tokens.push(Token {
                        text: self.serialize_inline(other),
                        space_before: pending_space,
                    });
                    pending_space = false;
                }
            }
        }
        tokens
    }

    /// Compact single-line form of an inline node.
    fn serialize_inline(&self, node: &DomNode) -> String {
        let DomNode::Element(e) = node else {
            return serialize_verbatim(node);
        };
        if self.is_unformatted(&e.tag) || e.raw_content.is_some() || crate::dom::is_void(&e.tag)
        {
            return serialize_verbatim(node);
        }
        let mut out = open_tag(e);
        let tokens = self.tokens(e.children.iter());
        for t in &tokens {
            if t.space_before {
                out.push(' ');
            }
            out.push_str(&t.text);
        }
        if e
            .children
            .last()
            .is_some_and(|c| matches!(c, DomNode::Text(t) if t.ends_with(char::is_whitespace) && !t.trim().is_empty()))
        {
            out.push(' ');
        }
        out.push_str(&format!("</{}>", e.tag));
        out
    }

    /// Break tokens into lines no wider than `max_char` (including the
    /// indentation at `depth`). Tokens glued to their predecessor never start
    /// a line.
    fn wrap(&self, tokens: &[Token], depth: usize) -> Vec<String> {
        let limit = match self.options.max_char {
            0 => usize::MAX,
            n => n.saturating_sub(width(&self.indent(depth))).max(1),
        };
        let mut lines = Vec::new();
        let mut current = String::new();
        for t in tokens {
            if current.is_empty() {
                current.push_str(&t.text);
            } else if !t.space_before {
                current.push_str(&t.text);
            } else if width(&current) + 1 + width(&t.text) > limit {
                lines.push(std::mem::take(&mut current));
                current.push_str(&t.text);
            } else {
                current.push(' ');
                current.push_str(&t.text);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

fn join_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    for (i, t) in tokens.iter().enumerate() {
        if i > 0 && t.space_before {
            out.push(' ');
        }
        out.push_str(&t.text);
    }
    out
}

fn width(s: &str) -> usize {
    s.chars().count()
}

fn open_tag(e: &ElementNode) -> String {
    let mut out = format!("<{}", e.tag);
    for (name, value) in &e.attributes {
        out.push(' ');
        out.push_str(name);
        if let Some(v) = value {
            if v.contains('"') && !v.contains('\'') {
                out.push_str(&format!("='{v}'"));
            } else {
                out.push_str(&format!("=\"{v}\""));
            }
        }
    }
    out.push('>');
    out
}

/// Serialize a node exactly as parsed.
fn serialize_verbatim(node: &DomNode) -> String {
    match node {
        DomNode::Text(t) => t.clone(),
        DomNode::Comment(c) => format!("<!--{c}-->"),
        DomNode::Declaration(d) => d.clone(),
        DomNode::Element(e) => {
            let mut out = open_tag(e);
            if crate::dom::is_void(&e.tag) {
                return out;
            }
            match &e.raw_content {
                Some(raw) => out.push_str(raw),
                None => {
                    for child in &e.children {
                        out.push_str(&serialize_verbatim(child));
                    }
                }
            }
            out.push_str(&format!("</{}>", e.tag));
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts() -> PrettifyOptions {
        PrettifyOptions::default()
    }

    #[test]
    fn indents_block_structure() {
        let html = "<!DOCTYPE html><html><head><title>CV</title></head>\
                    <body><div><p>Hello <em>there</em></p></div></body></html>";
        let expected = "\
<!DOCTYPE html>
<html>
  <head>
    <title>CV</title>
  </head>
  <body>
    <div>
      <p>Hello <em>there</em></p>
    </div>
  </body>
</html>
";
        assert_eq!(prettify(html, &opts()), expected);
    }

    #[test]
    fn collapses_whitespace_between_blocks() {
        let html = "<ul>\n\n   <li>  One </li>\n      <li>Two</li>\n</ul>";
        assert_eq!(prettify(html, &opts()), "<ul>\n  <li>One</li>\n  <li>Two</li>\n</ul>\n");
    }

    #[test]
    fn respects_indent_size() {
        let o = PrettifyOptions {
            indent_size: 4,
            ..opts()
        };
        assert_eq!(prettify("<div><p>x</p></div>", &o), "<div>\n    <p>x</p>\n</div>\n");
    }

    #[test]
    fn keeps_spacing_around_inline_elements() {
        let html = "<p>Worked at <span class=\"org\">Acme</span>, then <b>Initech</b>.</p>";
        assert_eq!(
            prettify(html, &opts()),
            "<p>Worked at <span class=\"org\">Acme</span>, then <b>Initech</b>.</p>\n"
        );
    }

    #[test]
    fn wraps_long_inline_runs() {
        let words = vec!["word"; 30].join(" ");
        let html = format!("<div><p>{words}</p></div>");
        let out = prettify(&html, &opts());
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "<div>");
        assert_eq!(lines[1], "  <p>");
        assert_eq!(lines[lines.len() - 2], "  </p>");
        for line in &lines {
            assert!(line.chars().count() <= 80, "line too long: {line:?}");
        }
        let rejoined: Vec<&str> = lines[2..lines.len() - 2]
            .iter()
            .map(|l| l.trim())
            .collect();
        assert_eq!(rejoined.join(" "), words);
    }

    #[test]
    fn max_char_zero_disables_wrapping() {
        let words = vec!["word"; 30].join(" ");
        let o = PrettifyOptions {
            max_char: 0,
            ..opts()
        };
        let out = prettify(&format!("<p>{words}</p>"), &o);
        assert_eq!(out, format!("<p>{words}</p>\n"));
    }

    #[test]
    fn preformatted_content_is_untouched() {
        let html = "<div><pre>  a\n    b</pre></div>";
        assert_eq!(prettify(html, &opts()), "<div>\n  <pre>  a\n    b</pre>\n</div>\n");
    }

    #[test]
    fn unformatted_tags_are_verbatim() {
        let html = "<p>See <a href=\"x\">my   site</a></p>";
        assert_eq!(prettify(html, &opts()), "<p>See <a href=\"x\">my   site</a></p>\n");
    }

    #[test]
    fn void_and_comment_nodes() {
        let html = "<head><meta charset=\"utf-8\"><!-- theme --></head>";
        assert_eq!(
            prettify(html, &opts()),
            "<head>\n  <meta charset=\"utf-8\">\n  <!-- theme -->\n</head>\n"
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(prettify("", &opts()), "");
        assert_eq!(prettify("   \n ", &opts()), "");
    }
}
