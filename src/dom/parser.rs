// ABOUTME: Hand-written markup parser producing document fragments
// ABOUTME: Keeps text and attribute values byte-for-byte so placeholder tokens survive parsing

use super::{Document, DomError, NodeId, Result, VOID_ELEMENTS};

impl Document {
    /// Parse a markup string into a new fragment owned by this document.
    ///
    /// Text runs and attribute values are preserved verbatim (no entity
    /// decoding), so reserved tokens embedded by the template layer survive
    /// a round-trip through parsing and can be located by content.
    pub fn parse_fragment(&mut self, markup: &str) -> Result<NodeId> {
        let root = self.create_fragment();
        let mut parser = MarkupParser {
            input: markup,
            pos: 0,
        };
        parser.parse_into(self, root)?;
        Ok(root)
    }
}

struct MarkupParser<'a> {
    input: &'a str,
    pos: usize,
}

impl MarkupParser<'_> {
    fn parse_into(&mut self, doc: &mut Document, root: NodeId) -> Result<()> {
        let mut stack = vec![root];
        while self.pos < self.input.len() {
            let rest = &self.input[self.pos..];
            if let Some(after) = rest.strip_prefix("<!--") {
                let end = after
                    .find("-->")
                    .ok_or_else(|| self.error("unterminated comment"))?;
                self.pos += 4 + end + 3;
            } else if rest.starts_with("</") {
                self.pos += 2;
                let tag = self.read_name("closing tag name")?;
                self.skip_whitespace();
                self.expect('>')?;
                let current = *stack.last().unwrap_or(&root);
                if stack.len() == 1 {
                    return Err(self.error(&format!("unexpected closing tag </{tag}>")));
                }
                if doc.tag(current) != Some(tag.as_str()) {
                    return Err(self.error(&format!(
                        "mismatched closing tag </{tag}>, expected </{}>",
                        doc.tag(current).unwrap_or("?")
                    )));
                }
                stack.pop();
            } else if rest.starts_with('<') {
                self.pos += 1;
                let tag = self.read_name("tag name")?;
                let element = doc.create_element(&tag);
                let self_closed = self.read_attributes(doc, element)?;
                let parent = *stack.last().unwrap_or(&root);
                doc.append_child(parent, element);
                if !self_closed && !VOID_ELEMENTS.contains(&tag.as_str()) {
                    stack.push(element);
                }
            } else {
                let end = rest.find('<').unwrap_or(rest.len());
                let text = doc.create_text(&rest[..end]);
                let parent = *stack.last().unwrap_or(&root);
                doc.append_child(parent, text);
                self.pos += end;
            }
        }
        if stack.len() > 1 {
            let unclosed = stack
                .last()
                .and_then(|id| doc.tag(*id))
                .unwrap_or("?")
                .to_string();
            return Err(self.error(&format!("unclosed element <{unclosed}>")));
        }
        Ok(())
    }

    /// Read attributes up to and including the closing `>` or `/>`.
    /// Returns true when the tag was self-closing.
    fn read_attributes(&mut self, doc: &mut Document, element: NodeId) -> Result<bool> {
        loop {
            self.skip_whitespace();
            let rest = &self.input[self.pos..];
            if rest.starts_with("/>") {
                self.pos += 2;
                return Ok(true);
            }
            if rest.starts_with('>') {
                self.pos += 1;
                return Ok(false);
            }
            if rest.is_empty() {
                return Err(self.error("unterminated tag"));
            }
            let name = self.read_name("attribute name")?;
            self.skip_whitespace();
            let value = if self.peek() == Some('=') {
                self.pos += 1;
                self.skip_whitespace();
                self.read_attribute_value()?
            } else {
                // bare attribute
                String::new()
            };
            doc.set_attribute(element, &name, &value)
                .map_err(|_| self.error("attribute on non-element"))?;
        }
    }

    fn read_attribute_value(&mut self) -> Result<String> {
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let rest = &self.input[self.pos..];
                let end = rest
                    .find(quote)
                    .ok_or_else(|| self.error("unterminated attribute value"))?;
                let value = rest[..end].to_string();
                self.pos += end + 1;
                Ok(value)
            }
            Some(_) => {
                let rest = &self.input[self.pos..];
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or(rest.len());
                if end == 0 {
                    return Err(self.error("empty attribute value"));
                }
                let value = rest[..end].to_string();
                self.pos += end;
                Ok(value)
            }
            None => Err(self.error("unterminated attribute value")),
        }
    }

    fn read_name(&mut self, what: &str) -> Result<String> {
        let rest = &self.input[self.pos..];
        let end = rest
            .find(|c: char| !is_name_char(c))
            .unwrap_or(rest.len());
        if end == 0 {
            return Err(self.error(&format!("expected {what}")));
        }
        self.pos += end;
        Ok(rest[..end].to_string())
    }

    fn skip_whitespace(&mut self) {
        let rest = &self.input[self.pos..];
        let skipped = rest.len() - rest.trim_start().len();
        self.pos += skipped;
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.error(&format!("expected '{c}'")))
        }
    }

    fn error(&self, message: &str) -> DomError {
        DomError::Parse {
            pos: self.pos,
            message: message.to_string(),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == ':' || c == '.'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::NodeKind;

    fn parse(markup: &str) -> (Document, NodeId) {
        let mut doc = Document::new();
        let root = doc.parse_fragment(markup).unwrap();
        (doc, root)
    }

    #[test]
    fn test_parse_nested_elements_and_text() {
        let (doc, root) = parse("<div>hello <span>world</span>!</div>");
        assert_eq!(doc.markup(root), "<div>hello <span>world</span>!</div>");

        let div = doc.first_child(root).unwrap();
        assert_eq!(doc.tag(div), Some("div"));
        let children: Vec<NodeId> = doc.children(div).collect();
        assert_eq!(children.len(), 3);
        assert_eq!(doc.text(children[0]), Some("hello "));
        assert_eq!(doc.tag(children[1]), Some("span"));
        assert_eq!(doc.text(children[2]), Some("!"));
    }

    #[test]
    fn test_parse_attribute_styles() {
        let (doc, root) = parse(r#"<input type="text" id='a' step=2 required>"#);
        let input = doc.first_child(root).unwrap();
        assert_eq!(doc.attribute(input, "type"), Some("text"));
        assert_eq!(doc.attribute(input, "id"), Some("a"));
        assert_eq!(doc.attribute(input, "step"), Some("2"));
        assert_eq!(doc.attribute(input, "required"), Some(""));
        // input is void, no children expected and no closing tag required
        assert_eq!(doc.first_child(input), None);
        assert!(doc.markup(root).starts_with("<input"));
    }

    #[test]
    fn test_parse_self_closing() {
        let (doc, root) = parse("<div><widget/></div>");
        let div = doc.first_child(root).unwrap();
        let widget = doc.first_child(div).unwrap();
        assert_eq!(doc.tag(widget), Some("widget"));
        assert_eq!(doc.first_child(widget), None);
    }

    #[test]
    fn test_parse_keeps_marker_tokens_verbatim() {
        let (doc, root) = parse(r#"<div class="{{}}-{{}}">a{{}}b</div>"#);
        let div = doc.first_child(root).unwrap();
        assert_eq!(doc.attribute(div, "class"), Some("{{}}-{{}}"));
        let text = doc.first_child(div).unwrap();
        assert_eq!(doc.text(text), Some("a{{}}b"));
    }

    #[test]
    fn test_parse_skips_comments() {
        let (doc, root) = parse("<div><!-- hidden -->shown</div>");
        let div = doc.first_child(root).unwrap();
        let children: Vec<NodeId> = doc.children(div).collect();
        assert_eq!(children.len(), 1);
        assert!(matches!(doc.kind(children[0]), NodeKind::Text(t) if t == "shown"));
    }

    #[test]
    fn test_parse_whitespace_preserved() {
        let (doc, root) = parse("<p>  spaced  </p>");
        let p = doc.first_child(root).unwrap();
        assert_eq!(doc.text(doc.first_child(p).unwrap()), Some("  spaced  "));
    }

    #[test]
    fn test_parse_errors() {
        let mut doc = Document::new();
        assert!(doc.parse_fragment("<div>").is_err());
        assert!(doc.parse_fragment("<div></span>").is_err());
        assert!(doc.parse_fragment("</div>").is_err());
        assert!(doc.parse_fragment("<div foo=\"bar>").is_err());
        assert!(doc.parse_fragment("<!-- no end").is_err());
        assert!(doc.parse_fragment("< div></div>").is_err());
    }

    #[test]
    fn test_parse_error_reports_position() {
        let mut doc = Document::new();
        let err = doc.parse_fragment("<div></span>").unwrap_err();
        match err {
            DomError::Parse { pos, .. } => assert!(pos > 0),
            other => panic!("unexpected error: {other}"),
        }
    }
}
