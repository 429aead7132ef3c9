//! Parser for the XML subset used in render markup

use super::tokens::scan;
use super::{Attribute, Element, MarkupError, Node, Token};

/// Parse a markup string into its single root node
pub fn parse(markup: &str) -> Result<Node, MarkupError> {
    if markup.trim().is_empty() {
        return Err(MarkupError::new(1, 1, "empty markup"));
    }
    if !markup.trim_start().starts_with('<') {
        return Ok(Node::Text(scan(markup)?));
    }

    let mut parser = Parser::new(markup);
    parser.skip_misc()?;
    if !parser.peek_element_start() {
        return Err(parser.error("expected a root element"));
    }
    let root = parser.parse_element()?;
    parser.skip_misc()?;
    if !parser.at_end() {
        return Err(parser.error("unexpected content after the root element"));
    }
    Ok(Node::Element(root))
}

/// A pending text segment; CDATA segments are not scanned for `{}`
struct Segment {
    text: String,
    literal: bool,
    pos: usize,
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> Self {
        Parser {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    /// Whitespace, comments, XML declaration and processing instructions
    fn skip_misc(&mut self) -> Result<(), MarkupError> {
        loop {
            self.skip_whitespace();
            if self.starts_with("<!--") {
                self.skip_comment()?;
            } else if self.starts_with("<?") {
                self.skip_past("<?", "?>", "unterminated processing instruction")?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element, MarkupError> {
        let start = self.pos;
        self.expect("<")?;
        let name = self.read_name()?;

        let mut attributes: Vec<Attribute> = Vec::new();
        loop {
            self.skip_whitespace();
            if self.starts_with("/>") {
                self.pos += 2;
                return Ok(Element {
                    name,
                    attributes,
                    children: Vec::new(),
                });
            }
            match self.peek_char() {
                Some('>') => {
                    self.pos += 1;
                    break;
                }
                None => {
                    return Err(self.error_at(start, format!("unclosed tag <{}>", name)));
                }
                _ => {}
            }

            let attribute_start = self.pos;
            let attribute = self.parse_attribute()?;
            if attributes.iter().any(|a| a.name == attribute.name) {
                return Err(self.error_at(
                    attribute_start,
                    format!("duplicate attribute `{}` on <{}>", attribute.name, name),
                ));
            }
            attributes.push(attribute);
        }

        let children = self.parse_children(&name, start)?;
        Ok(Element {
            name,
            attributes,
            children,
        })
    }

    fn parse_attribute(&mut self) -> Result<Attribute, MarkupError> {
        let name = self.read_name()?;
        self.skip_whitespace();
        if self.peek_char() != Some('=') {
            return Err(self.error(format!("expected `=` after attribute `{}`", name)));
        }
        self.pos += 1;
        self.skip_whitespace();

        let quote = match self.peek_char() {
            Some(q @ ('\'' | '"')) => q,
            _ => return Err(self.error(format!("attribute `{}` value must be quoted", name))),
        };
        self.pos += 1;
        let value_start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == quote {
                break;
            }
            if c == '<' {
                return Err(self.error("`<` is not allowed in attribute values"));
            }
            self.pos += 1;
        }
        if self.at_end() {
            return Err(self.error_at(value_start, format!("unterminated value of `{}`", name)));
        }
        let raw: String = self.chars[value_start..self.pos].iter().collect();
        self.pos += 1;

        Ok(Attribute {
            name,
            value: self.decode_entities(&raw, value_start)?,
        })
    }

    fn parse_children(&mut self, name: &str, start: usize) -> Result<Vec<Node>, MarkupError> {
        let mut children = Vec::new();
        let mut segments: Vec<Segment> = Vec::new();

        loop {
            if self.at_end() {
                return Err(self.error_at(start, format!("unclosed element <{}>", name)));
            }

            if self.starts_with("</") {
                self.flush_text(&mut segments, &mut children)?;
                let close_start = self.pos;
                self.pos += 2;
                let closing = self.read_name()?;
                self.skip_whitespace();
                self.expect(">")?;
                if closing != name {
                    return Err(self.error_at(
                        close_start,
                        format!("mismatched closing tag: expected </{}>, found </{}>", name, closing),
                    ));
                }
                return Ok(children);
            }

            if self.starts_with("<!--") {
                self.skip_comment()?;
            } else if self.starts_with("<![CDATA[") {
                let pos = self.pos;
                let text = self.skip_past("<![CDATA[", "]]>", "unterminated CDATA section")?;
                segments.push(Segment {
                    text,
                    literal: true,
                    pos,
                });
            } else if self.starts_with("<?") {
                self.skip_past("<?", "?>", "unterminated processing instruction")?;
            } else if self.peek_char() == Some('<') {
                self.flush_text(&mut segments, &mut children)?;
                children.push(Node::Element(self.parse_element()?));
            } else {
                let pos = self.pos;
                let raw = self.read_text();
                segments.push(Segment {
                    text: self.decode_entities(&raw, pos)?,
                    literal: false,
                    pos,
                });
            }
        }
    }

    /// Turn pending text into a text node; whitespace-only runs are dropped
    fn flush_text(
        &self,
        segments: &mut Vec<Segment>,
        children: &mut Vec<Node>,
    ) -> Result<(), MarkupError> {
        if segments.iter().all(|s| s.text.trim().is_empty()) {
            segments.clear();
            return Ok(());
        }

        let mut tokens: Vec<Token> = Vec::new();
        for segment in segments.drain(..) {
            let scanned = if segment.literal {
                vec![Token::Text(segment.text)]
            } else {
                scan(&segment.text).map_err(|e| {
                    let (line, column) = self.position(segment.pos);
                    e.relative_to(line, column)
                })?
            };
            for token in scanned {
                match (tokens.last_mut(), token) {
                    (Some(Token::Text(previous)), Token::Text(text)) => previous.push_str(&text),
                    (_, token) => tokens.push(token),
                }
            }
        }
        children.push(Node::Text(tokens));
        Ok(())
    }

    fn decode_entities(&self, raw: &str, pos: usize) -> Result<String, MarkupError> {
        if !raw.contains('&') {
            return Ok(raw.to_string());
        }
        let mut out = String::new();
        let mut rest = raw;
        while let Some(amp) = rest.find('&') {
            out.push_str(&rest[..amp]);
            let offset = raw.len() - rest.len() + amp;
            let after = &rest[amp + 1..];
            let semi = match after.find(';') {
                Some(semi) if semi <= 10 => semi,
                _ => return Err(self.error_at(pos + raw[..offset].chars().count(), "unterminated entity reference")),
            };
            let entity = &after[..semi];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| entity.strip_prefix('#').map(|dec| dec.parse::<u32>()))
                    .and_then(|code| code.ok())
                    .and_then(char::from_u32),
            };
            match decoded {
                Some(c) => out.push(c),
                None => {
                    return Err(self.error_at(
                        pos + raw[..offset].chars().count(),
                        format!("unknown entity `&{};`", entity),
                    ))
                }
            }
            rest = &after[semi + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }

    fn skip_comment(&mut self) -> Result<(), MarkupError> {
        self.skip_past("<!--", "-->", "unterminated comment").map(|_| ())
    }

    /// Consume `open ... close` and return what was between them
    fn skip_past(&mut self, open: &str, close: &str, message: &str) -> Result<String, MarkupError> {
        let start = self.pos;
        self.pos += open.chars().count();
        let content_start = self.pos;
        while !self.at_end() {
            if self.starts_with(close) {
                let content = self.chars[content_start..self.pos].iter().collect();
                self.pos += close.chars().count();
                return Ok(content);
            }
            self.pos += 1;
        }
        Err(self.error_at(start, message))
    }

    fn read_name(&mut self) -> Result<String, MarkupError> {
        let start = self.pos;
        match self.peek_char() {
            Some(c) if c.is_alphabetic() || c == '_' || c == ':' => self.pos += 1,
            _ => return Err(self.error("expected a name")),
        }
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | ':') {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn read_text(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c == '<' {
                break;
            }
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_element_start(&self) -> bool {
        self.peek_char() == Some('<')
            && self
                .chars
                .get(self.pos + 1)
                .is_some_and(|c| c.is_alphabetic() || *c == '_' || *c == ':')
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn starts_with(&self, s: &str) -> bool {
        let mut i = self.pos;
        for c in s.chars() {
            if self.chars.get(i) != Some(&c) {
                return false;
            }
            i += 1;
        }
        true
    }

    fn expect(&mut self, s: &str) -> Result<(), MarkupError> {
        if self.starts_with(s) {
            self.pos += s.chars().count();
            Ok(())
        } else {
            Err(self.error(format!("expected `{}`", s)))
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn position(&self, pos: usize) -> (usize, usize) {
        let mut line = 1;
        let mut column = 1;
        for &c in &self.chars[..pos.min(self.chars.len())] {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        (line, column)
    }

    fn error(&self, message: impl Into<String>) -> MarkupError {
        self.error_at(self.pos, message)
    }

    fn error_at(&self, pos: usize, message: impl Into<String>) -> MarkupError {
        let (line, column) = self.position(pos);
        MarkupError::new(line, column, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(node: Node) -> Element {
        match node {
            Node::Element(e) => e,
            Node::Text(t) => panic!("expected element, got text {:?}", t),
        }
    }

    #[test]
    fn test_parse_nested_elements() {
        let root = element(
            parse("<div class='empty'><h1>Hello!</h1><h2>Good to see it working!</h2></div>")
                .unwrap(),
        );
        assert_eq!(root.name, "div");
        assert_eq!(root.attributes[0].name, "class");
        assert_eq!(root.attributes[0].value, "empty");
        assert_eq!(root.children.len(), 2);
        let h2 = element(root.children[1].clone());
        assert_eq!(
            h2.children,
            vec![Node::Text(vec![Token::Text("Good to see it working!".to_string())])]
        );
    }

    #[test]
    fn test_whitespace_between_elements_is_dropped() {
        let root = element(parse("<ul>\n  <li>a</li>\n  <li/>\n</ul>").unwrap());
        assert_eq!(root.children.len(), 2);
        let li = element(root.children[1].clone());
        assert!(li.children.is_empty());
    }

    #[test]
    fn test_text_keeps_surrounding_whitespace() {
        let root = element(parse("<p> a {b} </p>").unwrap());
        assert_eq!(
            root.children,
            vec![Node::Text(vec![
                Token::Text(" a ".to_string()),
                Token::Variable("b".to_string()),
                Token::Text(" ".to_string()),
            ])]
        );
    }

    #[test]
    fn test_attribute_order_and_quotes() {
        let root = element(parse(r#"<input value="{value}" type='text' onChange='{ch}'/>"#).unwrap());
        let names: Vec<&str> = root.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["value", "type", "onChange"]);
        assert_eq!(root.attributes[0].value, "{value}");
    }

    #[test]
    fn test_entities_cdata_and_comments() {
        let root = element(
            parse("<p title='a &amp; b'><!-- note -->x &lt; y<![CDATA[{raw}]]>&#65;</p>").unwrap(),
        );
        assert_eq!(root.attributes[0].value, "a & b");
        assert_eq!(
            root.children,
            vec![Node::Text(vec![Token::Text("x < y{raw}A".to_string())])]
        );
    }

    #[test]
    fn test_xml_declaration_is_skipped() {
        let root = element(parse("<?xml version='1.0'?>\n<br/>").unwrap());
        assert_eq!(root.name, "br");
    }

    #[test]
    fn test_text_root() {
        let node = parse("Hello {name}").unwrap();
        assert_eq!(
            node,
            Node::Text(vec![
                Token::Text("Hello ".to_string()),
                Token::Variable("name".to_string()),
            ])
        );
    }

    #[test]
    fn test_mismatched_closing_tag() {
        let err = parse("<div>\n  <span></div>").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 9);
        assert!(err.message.contains("mismatched closing tag"));
    }

    #[test]
    fn test_errors() {
        assert!(parse("").unwrap_err().message.contains("empty markup"));
        assert!(parse("<div>").unwrap_err().message.contains("unclosed element <div>"));
        assert!(parse("<a/><b/>").unwrap_err().message.contains("after the root"));
        assert!(parse("<a x='1' x='2'/>").unwrap_err().message.contains("duplicate attribute"));
        assert!(parse("<a>&nbsp;</a>").unwrap_err().message.contains("unknown entity"));
        assert!(parse("<a x=1/>").unwrap_err().message.contains("must be quoted"));
    }

    #[test]
    fn test_scan_error_position_inside_element() {
        let err = parse("<p>\nab {c</p>").unwrap_err();
        assert_eq!((err.line, err.column), (2, 4));
    }
}
