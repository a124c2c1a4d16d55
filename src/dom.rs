//! HTML parser – converts generated markup into a lightweight DOM tree used by
//! the prettifier.
//!
//! The parser is lenient and lossless where it matters for re-indentation:
//! attribute order and raw attribute values are preserved, entities are left
//! untouched, and the content of raw-text elements (`pre`, `textarea`,
//! `script`, `style`) is kept byte-for-byte.

// ---------------------------------------------------------------------------
// Element classification
// ---------------------------------------------------------------------------

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose content is not markup and must not be reflowed.
const RAW_TEXT_ELEMENTS: &[&str] = &["pre", "textarea", "script", "style"];

/// Phrasing elements kept on the line of their surrounding text.
const INLINE_ELEMENTS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "button", "cite", "code", "data", "dfn", "em", "i",
    "img", "input", "kbd", "label", "mark", "q", "s", "samp", "select", "small", "span", "strong",
    "sub", "sup", "time", "u", "var", "wbr",
];

pub fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

pub fn is_raw_text(tag: &str) -> bool {
    RAW_TEXT_ELEMENTS.contains(&tag)
}

pub fn is_inline(tag: &str) -> bool {
    INLINE_ELEMENTS.contains(&tag)
}

// ---------------------------------------------------------------------------
// DOM types
// ---------------------------------------------------------------------------

/// A node in the DOM tree.
#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Element(ElementNode),
    /// Raw text, entities preserved.
    Text(String),
    /// Comment body without the `<!--` / `-->` markers.
    Comment(String),
    /// `<!DOCTYPE …>` or another `<!…>` / `<?…>` declaration, verbatim.
    Declaration(String),
}

/// An element node carrying tag, attributes, and children.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementNode {
    /// Lowercased tag name.
    pub tag: String,
    /// Attributes in source order; `None` for bare attributes.
    pub attributes: Vec<(String, Option<String>)>,
    pub children: Vec<DomNode>,
    /// Verbatim content of raw-text elements.
    pub raw_content: Option<String>,
}

impl ElementNode {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: Vec::new(),
            children: Vec::new(),
            raw_content: None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .and_then(|(_, v)| v.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Parser – recursive descent over HTML
// ---------------------------------------------------------------------------

/// Parse an HTML string into a list of top-level DOM nodes.
pub fn parse_html(html: &str) -> Vec<DomNode> {
    let mut parser = Parser::new(html);
    parser.parse_nodes(&mut Vec::new())
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    /// Parse siblings until a closing tag of an open element (or EOF).
    /// Closing tags that match no open element are dropped.
    fn parse_nodes(&mut self, open: &mut Vec<String>) -> Vec<DomNode> {
        let mut nodes = Vec::new();
        while !self.eof() {
            if self.starts_with("</") {
                let name = self.peek_closing_name().to_ascii_lowercase();
                if open.iter().any(|t| *t == name) {
                    break;
                }
                self.skip_closing_tag();
                continue;
            }
            if let Some(node) = self.parse_node(open) {
                nodes.push(node);
            }
        }
        nodes
    }

    fn parse_node(&mut self, open: &mut Vec<String>) -> Option<DomNode> {
        if self.starts_with("<!--") {
            return Some(self.parse_comment());
        }
        if self.starts_with("<!") || self.starts_with("<?") {
            let start = self.pos;
            while !self.eof() && !self.starts_with(">") {
                self.advance(1);
            }
            if !self.eof() {
                self.advance(1); // skip '>'
            }
            return Some(DomNode::Declaration(self.input[start..self.pos].to_string()));
        }
        if self.starts_with("<") && self.next_is_tag_start() {
            Some(self.parse_element(open))
        } else {
            Some(self.parse_text())
        }
    }

    fn parse_text(&mut self) -> DomNode {
        let start = self.pos;
        // A '<' that does not open a tag is text.
        if self.starts_with("<") {
            self.advance(1);
        }
        while !self.eof() && !(self.starts_with("<") && self.next_is_markup()) {
            self.advance(1);
        }
        DomNode::Text(self.input[start..self.pos].to_string())
    }

    fn parse_comment(&mut self) -> DomNode {
        self.advance(4); // skip <!--
        let start = self.pos;
        while !self.eof() && !self.starts_with("-->") {
            self.advance(1);
        }
        let body = self.input[start..self.pos].to_string();
        if !self.eof() {
            self.advance(3);
        }
        DomNode::Comment(body)
    }

    fn parse_element(&mut self, open: &mut Vec<String>) -> DomNode {
        // Consume '<'
        self.advance(1);
        let tag_name = self.parse_name();
        let mut elem = ElementNode::new(&tag_name);

        // Parse attributes
        loop {
            self.skip_whitespace();
            if self.eof() || self.starts_with(">") || self.starts_with("/>") {
                break;
            }
            let before = self.pos;
            let attr = self.parse_attribute();
            if self.pos == before {
                // Unparseable character; skip it.
                self.advance(1);
                continue;
            }
            elem.attributes.push(attr);
        }

        if self.starts_with("/>") {
            self.advance(2);
            return DomNode::Element(elem);
        }
        if self.starts_with(">") {
            self.advance(1);
        }
        if is_void(&elem.tag) {
            return DomNode::Element(elem);
        }

        if is_raw_text(&elem.tag) {
            elem.raw_content = Some(self.take_raw_text(&elem.tag));
        } else {
            open.push(elem.tag.clone());
            elem.children = self.parse_nodes(open);
            open.pop();
        }

        // Consume our own closing tag only.
        if self.starts_with("</") && self.peek_closing_name().eq_ignore_ascii_case(&elem.tag) {
            self.skip_closing_tag();
        }

        DomNode::Element(elem)
    }

    /// Everything up to `</tag`, verbatim.
    fn take_raw_text(&mut self, tag: &str) -> String {
        let start = self.pos;
        let closing = format!("</{tag}");
        while !self.eof() {
            let rest = &self.input[self.pos..];
            if rest.len() >= closing.len()
                && rest.is_char_boundary(closing.len())
                && rest[..closing.len()].eq_ignore_ascii_case(&closing)
            {
                break;
            }
            self.advance(1);
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_name(&mut self) -> String {
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ':' || c == '.' {
                self.advance(1);
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn parse_attribute(&mut self) -> (String, Option<String>) {
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_whitespace() || c == '=' || c == '>' || c == '/' || c == '"' || c == '\'' {
                break;
            }
            self.advance(1);
        }
        let key = self.input[start..self.pos].to_string();
        self.skip_whitespace();
        if !self.starts_with("=") {
            return (key, None);
        }
        self.advance(1); // skip '='
        self.skip_whitespace();
        (key, Some(self.parse_attr_value()))
    }

    fn parse_attr_value(&mut self) -> String {
        for quote in ["\"", "'"] {
            if self.starts_with(quote) {
                self.advance(1);
                let start = self.pos;
                while !self.eof() && !self.starts_with(quote) {
                    self.advance(1);
                }
                let val = self.input[start..self.pos].to_string();
                if !self.eof() {
                    self.advance(1);
                }
                return val;
            }
        }
        let start = self.pos;
        while !self.eof() {
            let c = self.current_char();
            if c.is_whitespace() || c == '>' {
                break;
            }
            self.advance(1);
        }
        self.input[start..self.pos].to_string()
    }

    /// Name of the closing tag at the cursor, without moving.
    fn peek_closing_name(&self) -> String {
        self.input[self.pos + 2..]
            .chars()
            .take_while(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
            .collect()
    }

    fn skip_closing_tag(&mut self) {
        while !self.eof() && !self.starts_with(">") {
            self.advance(1);
        }
        if !self.eof() {
            self.advance(1);
        }
    }

    /// `<` followed by a letter opens an element.
    fn next_is_tag_start(&self) -> bool {
        self.input[self.pos + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic())
    }

    /// `<` followed by a letter, `/`, `!` or `?` starts markup.
    fn next_is_markup(&self) -> bool {
        self.input[self.pos + 1..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'))
    }

    fn skip_whitespace(&mut self) {
        while !self.eof() && self.current_char().is_whitespace() {
            self.advance(1);
        }
    }

    fn starts_with(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }

    fn eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn current_char(&self) -> char {
        self.input[self.pos..].chars().next().unwrap_or('\0')
    }

    fn advance(&mut self, n: usize) {
        // Advance by `n` characters (not bytes).
        for _ in 0..n {
            if let Some(c) = self.input[self.pos..].chars().next() {
                self.pos += c.len_utf8();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: &DomNode) -> &ElementNode {
        match node {
            DomNode::Element(e) => e,
            other => panic!("Expected element, got {other:?}"),
        }
    }

    #[test]
    fn parse_nested_elements() {
        let nodes = parse_html(r#"<div class="a b"><p>Hello <em>world</em>!</p></div>"#);
        assert_eq!(nodes.len(), 1);
        let div = element(&nodes[0]);
        assert_eq!(div.tag, "div");
        assert_eq!(div.attribute("class"), Some("a b"));
        let p = element(&div.children[0]);
        assert_eq!(p.children.len(), 3); // "Hello ", <em>, "!"
    }

    #[test]
    fn attributes_keep_order_and_bare_flags() {
        let nodes = parse_html(r#"<input type="checkbox" checked data-x='1'>"#);
        let input = element(&nodes[0]);
        assert_eq!(
            input.attributes,
            vec![
                ("type".to_string(), Some("checkbox".to_string())),
                ("checked".to_string(), None),
                ("data-x".to_string(), Some("1".to_string())),
            ]
        );
        assert!(input.children.is_empty());
    }

    #[test]
    fn void_elements_take_no_children() {
        let nodes = parse_html("<p>a<br>b</p>");
        let p = element(&nodes[0]);
        assert_eq!(p.children.len(), 3);
    }

    #[test]
    fn raw_text_is_verbatim() {
        let src = "<pre>  keep\n    <b>this</b></pre><style>a > b { x: 1 }</style>";
        let nodes = parse_html(src);
        assert_eq!(nodes.len(), 2);
        assert_eq!(
            element(&nodes[0]).raw_content.as_deref(),
            Some("  keep\n    <b>this</b>")
        );
        assert_eq!(element(&nodes[1]).raw_content.as_deref(), Some("a > b { x: 1 }"));
    }

    #[test]
    fn doctype_and_comments_are_kept() {
        let nodes = parse_html("<!DOCTYPE html><!-- note --><html></html>");
        assert_eq!(nodes[0], DomNode::Declaration("<!DOCTYPE html>".to_string()));
        assert_eq!(nodes[1], DomNode::Comment(" note ".to_string()));
        assert_eq!(element(&nodes[2]).tag, "html");
    }

    #[test]
    fn stray_closing_tags_do_not_truncate() {
        let nodes = parse_html("<p>a</p></div><p>b</p>");
        assert_eq!(nodes.len(), 2);

        let nodes = parse_html("<div><p>a</span>b</p></div>");
        assert_eq!(nodes.len(), 1);
        let p = element(&element(&nodes[0]).children[0]);
        assert_eq!(
            p.children,
            vec![DomNode::Text("a".to_string()), DomNode::Text("b".to_string())]
        );
    }

    #[test]
    fn unclosed_child_is_closed_by_ancestor() {
        let nodes = parse_html("<ul><li>one<li>two</ul><p>after</p>");
        assert_eq!(nodes.len(), 2);
        assert_eq!(element(&nodes[1]).tag, "p");
    }

    #[test]
    fn lone_angle_bracket_is_text() {
        let nodes = parse_html("<p>1 < 2</p>");
        let p = element(&nodes[0]);
        assert_eq!(p.children, vec![DomNode::Text("1 < 2".to_string())]);
    }
}
