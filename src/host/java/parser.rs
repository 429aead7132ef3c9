//! Declaration parser for Java sources

use std::path::Path;

use super::ast::*;
use super::lexer::{Lexer, Token, TokenKind};
use super::JavaSyntaxError;
use crate::host::{DeclKind, Modifier, Parameter, TypeParameter};

/// Parse one compilation unit
pub fn parse_unit(source: &str, path: &Path) -> Result<CompilationUnit, JavaSyntaxError> {
    let tokens = Lexer::new(source, path).tokenize()?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        path,
    };
    parser.parse()
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    path: &'a Path,
}

impl<'a> Parser<'a> {
    fn parse(&mut self) -> Result<CompilationUnit, JavaSyntaxError> {
        let mut unit = CompilationUnit {
            path: self.path.to_path_buf(),
            package: None,
            imports: Vec::new(),
            types: Vec::new(),
        };

        loop {
            if self.is_eof() {
                break;
            }
            if self.eat_punct(';') {
                continue;
            }

            let line = self.line();
            let (modifiers, annotations) = self.parse_modifiers()?;

            if self.eat_ident("package") {
                unit.package = Some(self.parse_qualified_name()?);
                self.expect_punct(';')?;
            } else if self.eat_ident("import") {
                let is_static = self.eat_ident("static");
                let path = self.parse_qualified_name()?;
                let wildcard = if self.peek_punct('.') && self.peek_punct_at(1, '*') {
                    self.pos += 2;
                    true
                } else {
                    false
                };
                self.expect_punct(';')?;
                unit.imports.push(ImportDecl {
                    path,
                    is_static,
                    wildcard,
                });
            } else if let Some(kind) = self.peek_type_keyword() {
                let decl = self.parse_type_decl(kind, modifiers, annotations, line)?;
                unit.types.push(decl);
            } else {
                return Err(self.error(format!(
                    "expected class, interface, enum or record, found {}",
                    self.describe()
                )));
            }
        }

        Ok(unit)
    }

    // Declarations

    fn parse_type_decl(
        &mut self,
        kind: DeclKind,
        modifiers: Vec<Modifier>,
        annotations: Vec<Annotation>,
        line: usize,
    ) -> Result<TypeDecl, JavaSyntaxError> {
        if kind == DeclKind::AnnotationType {
            self.expect_punct('@')?;
        }
        self.pos += 1; // class / interface / enum / record keyword
        let name = self.expect_identifier()?;

        let type_params = if self.peek_punct('<') {
            self.parse_type_params()?
        } else {
            Vec::new()
        };

        if kind == DeclKind::Record && self.peek_punct('(') {
            self.skip_balanced('(', ')')?;
        }

        // extends / implements / permits clauses
        while !self.peek_punct('{') {
            if self.is_eof() {
                return Err(self.error(format!("expected '{{' to open body of {}", name)));
            }
            if self.peek_punct('<') {
                self.skip_balanced('<', '>')?;
            } else {
                self.pos += 1;
            }
        }
        self.expect_punct('{')?;

        if kind == DeclKind::Enum {
            self.skip_enum_constants()?;
        }

        let members = self.parse_members()?;

        Ok(TypeDecl {
            kind,
            name,
            modifiers,
            annotations,
            type_params,
            members,
            line,
        })
    }

    fn parse_members(&mut self) -> Result<Vec<Member>, JavaSyntaxError> {
        let mut members = Vec::new();

        loop {
            if self.eat_punct('}') {
                return Ok(members);
            }
            if self.is_eof() {
                return Err(self.error("unexpected end of file inside type body"));
            }
            if self.eat_punct(';') {
                continue;
            }

            let line = self.line();
            let (modifiers, annotations) = self.parse_modifiers()?;

            if self.peek_punct('{') {
                // initializer block
                self.skip_balanced('{', '}')?;
                continue;
            }

            if let Some(kind) = self.peek_type_keyword() {
                let decl = self.parse_type_decl(kind, modifiers, annotations, line)?;
                members.push(Member::Type(decl));
                continue;
            }

            let type_params = if self.peek_punct('<') {
                self.parse_type_params()?
            } else {
                Vec::new()
            };

            let return_type = self.parse_type()?;

            if self.peek_punct('(') {
                // constructor: what looked like a type was its name
                self.skip_balanced('(', ')')?;
                self.skip_method_tail()?;
                continue;
            }

            let name = self.expect_identifier()?;

            if self.peek_punct('(') {
                let params = self.parse_params()?;
                let mut return_type = return_type;
                while self.peek_punct('[') && self.peek_punct_at(1, ']') {
                    self.pos += 2;
                    return_type.push_str("[]");
                }
                let has_body = self.skip_method_tail()?;
                members.push(Member::Method(MethodDecl {
                    name,
                    modifiers,
                    annotations,
                    type_params,
                    return_type,
                    params,
                    has_body,
                    line,
                }));
            } else {
                self.skip_field_rest()?;
            }
        }
    }

    fn parse_params(&mut self) -> Result<Vec<Parameter>, JavaSyntaxError> {
        self.expect_punct('(')?;
        let mut params = Vec::new();

        if self.eat_punct(')') {
            return Ok(params);
        }

        loop {
            // `final` and annotations on parameters carry no meaning here
            self.parse_modifiers()?;
            let mut type_name = self.parse_type()?;

            // receiver parameter: `Outer Outer.this`
            if self.eat_ident("this") {
                if !self.eat_punct(',') {
                    self.expect_punct(')')?;
                    return Ok(params);
                }
                continue;
            }

            let name = self.expect_identifier()?;
            while self.peek_punct('[') && self.peek_punct_at(1, ']') {
                self.pos += 2;
                type_name.push_str("[]");
            }
            params.push(Parameter { name, type_name });

            if self.eat_punct(',') {
                continue;
            }
            self.expect_punct(')')?;
            return Ok(params);
        }
    }

    /// Skips `throws`, `default` values and the body; true if a body was present
    fn skip_method_tail(&mut self) -> Result<bool, JavaSyntaxError> {
        loop {
            if self.eat_punct(';') {
                return Ok(false);
            }
            if self.peek_punct('{') {
                self.skip_balanced('{', '}')?;
                return Ok(true);
            }
            if self.is_eof() {
                return Err(self.error("unexpected end of file in method declaration"));
            }
            if self.peek_punct('(') {
                self.skip_balanced('(', ')')?;
            } else {
                self.pos += 1;
            }
        }
    }

    fn skip_field_rest(&mut self) -> Result<(), JavaSyntaxError> {
        loop {
            if self.eat_punct(';') {
                return Ok(());
            }
            if self.is_eof() {
                return Err(self.error("unexpected end of file in field declaration"));
            }
            if self.peek_punct('{') {
                self.skip_balanced('{', '}')?;
            } else if self.peek_punct('(') {
                self.skip_balanced('(', ')')?;
            } else {
                self.pos += 1;
            }
        }
    }

    fn skip_enum_constants(&mut self) -> Result<(), JavaSyntaxError> {
        loop {
            if self.eat_punct(';') || self.peek_punct('}') {
                return Ok(());
            }
            if self.is_eof() {
                return Err(self.error("unexpected end of file in enum constants"));
            }
            if self.peek_punct('{') {
                self.skip_balanced('{', '}')?;
            } else if self.peek_punct('(') {
                self.skip_balanced('(', ')')?;
            } else {
                self.pos += 1;
            }
        }
    }

    fn parse_type_params(&mut self) -> Result<Vec<TypeParameter>, JavaSyntaxError> {
        self.expect_punct('<')?;
        let mut params = Vec::new();

        loop {
            while self.peek_punct('@') {
                self.parse_annotation()?;
            }
            let name = self.expect_identifier()?;
            let mut bounds = Vec::new();
            if self.eat_ident("extends") {
                bounds.push(self.parse_type()?);
                while self.eat_punct('&') {
                    bounds.push(self.parse_type()?);
                }
            }
            params.push(TypeParameter { name, bounds });

            if self.eat_punct(',') {
                continue;
            }
            if self.is_eof() {
                return Err(self.error("unterminated type parameter list"));
            }
            self.expect_punct('>')?;
            return Ok(params);
        }
    }

    // Modifiers and annotations

    fn parse_modifiers(&mut self) -> Result<(Vec<Modifier>, Vec<Annotation>), JavaSyntaxError> {
        let mut modifiers = Vec::new();
        let mut annotations = Vec::new();

        loop {
            if self.peek_punct('@') && !self.peek_ident_at(1, "interface") {
                annotations.push(self.parse_annotation()?);
                continue;
            }
            let modifier = match &self.peek().kind {
                TokenKind::Ident(word) => Modifier::from_keyword(word),
                _ => None,
            };
            match modifier {
                Some(modifier) => {
                    modifiers.push(modifier);
                    self.pos += 1;
                }
                None => return Ok((modifiers, annotations)),
            }
        }
    }

    fn parse_annotation(&mut self) -> Result<Annotation, JavaSyntaxError> {
        self.expect_punct('@')?;
        let name = self.parse_qualified_name()?;
        let mut values = Vec::new();

        if self.eat_punct('(') {
            if self.eat_punct(')') {
                return Ok(Annotation { name, values });
            }

            let named = matches!(self.peek().kind, TokenKind::Ident(_)) && self.peek_punct_at(1, '=');
            if named {
                loop {
                    let member = self.expect_identifier()?;
                    self.expect_punct('=')?;
                    let value = self.parse_element_value()?;
                    values.push((member, value));
                    if self.eat_punct(',') {
                        continue;
                    }
                    self.expect_punct(')')?;
                    break;
                }
            } else {
                let value = self.parse_element_value()?;
                values.push(("value".to_string(), value));
                self.expect_punct(')')?;
            }
        }

        Ok(Annotation { name, values })
    }

    fn parse_element_value(&mut self) -> Result<AnnotationValue, JavaSyntaxError> {
        let start = self.pos;

        // fold `"a" + "b" + """..."""` into one string
        let mut folded = String::new();
        let mut all_strings = true;
        let mut expect_operand = true;
        while !(self.peek_punct(',') || self.peek_punct(')')) {
            match self.peek().kind.clone() {
                TokenKind::Str(s) if expect_operand => {
                    folded.push_str(&s);
                    expect_operand = false;
                    self.pos += 1;
                }
                TokenKind::Punct('+') if !expect_operand => {
                    expect_operand = true;
                    self.pos += 1;
                }
                _ => {
                    all_strings = false;
                    break;
                }
            }
        }
        if all_strings && !expect_operand {
            return Ok(AnnotationValue::Str(folded));
        }

        self.pos = start;
        let mut raw = Vec::new();
        let mut depth = 0usize;
        loop {
            let token = self.peek().clone();
            match token.kind {
                TokenKind::Eof => return Err(self.error("unterminated annotation")),
                TokenKind::Punct(',') | TokenKind::Punct(')') if depth == 0 => break,
                TokenKind::Punct('(') | TokenKind::Punct('{') => depth += 1,
                TokenKind::Punct(')') | TokenKind::Punct('}') => depth = depth.saturating_sub(1),
                _ => {}
            }
            raw.push(token);
            self.pos += 1;
        }
        Ok(AnnotationValue::Raw(render_tokens(&raw)))
    }

    // Types

    /// Parses a type and renders it back as source text
    fn parse_type(&mut self) -> Result<String, JavaSyntaxError> {
        // type annotations
        while self.peek_punct('@') && !self.peek_ident_at(1, "interface") {
            self.parse_annotation()?;
        }
        let type_start = self.pos;

        self.expect_identifier()?;
        loop {
            if self.peek_punct('<') {
                self.skip_balanced('<', '>')?;
            } else if self.peek_punct('.') && matches!(self.peek_at(1).kind, TokenKind::Ident(_)) {
                self.pos += 2;
            } else {
                break;
            }
        }
        while self.peek_punct('[') && self.peek_punct_at(1, ']') {
            self.pos += 2;
        }
        if self.peek().kind == TokenKind::Ellipsis {
            self.pos += 1;
        }

        Ok(render_tokens(&self.tokens[type_start..self.pos]))
    }

    fn parse_qualified_name(&mut self) -> Result<String, JavaSyntaxError> {
        let mut name = self.expect_identifier()?;
        while self.peek_punct('.') && matches!(self.peek_at(1).kind, TokenKind::Ident(_)) {
            self.pos += 1;
            name.push('.');
            name.push_str(&self.expect_identifier()?);
        }
        Ok(name)
    }

    fn peek_type_keyword(&self) -> Option<DeclKind> {
        if self.peek_punct('@') && self.peek_ident_at(1, "interface") {
            return Some(DeclKind::AnnotationType);
        }
        match &self.peek().kind {
            TokenKind::Ident(word) => match word.as_str() {
                "class" => Some(DeclKind::Class),
                "interface" => Some(DeclKind::Interface),
                "enum" => Some(DeclKind::Enum),
                // `record` is contextual: `record Name(` or `record Name<`
                "record"
                    if matches!(self.peek_at(1).kind, TokenKind::Ident(_))
                        && (self.peek_punct_at(2, '(') || self.peek_punct_at(2, '<')) =>
                {
                    Some(DeclKind::Record)
                }
                _ => None,
            },
            _ => None,
        }
    }

    // Helpers

    fn skip_balanced(&mut self, open: char, close: char) -> Result<(), JavaSyntaxError> {
        let start_line = self.line();
        self.expect_punct(open)?;
        let mut depth = 1;
        while depth > 0 {
            let token = self.next_token();
            match token.kind {
                TokenKind::Punct(c) if c == open => depth += 1,
                TokenKind::Punct(c) if c == close => depth -= 1,
                TokenKind::Eof => {
                    return Err(JavaSyntaxError::new(
                        self.path,
                        start_line,
                        format!("unbalanced '{}'", open),
                    ))
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index]
    }

    fn next_token(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn line(&self) -> usize {
        self.peek().line
    }

    fn is_eof(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn peek_punct(&self, c: char) -> bool {
        self.peek_punct_at(0, c)
    }

    fn peek_punct_at(&self, offset: usize, c: char) -> bool {
        self.peek_at(offset).kind == TokenKind::Punct(c)
    }

    fn peek_ident_at(&self, offset: usize, word: &str) -> bool {
        matches!(&self.peek_at(offset).kind, TokenKind::Ident(w) if w == word)
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if self.peek_punct(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_ident(&mut self, word: &str) -> bool {
        if self.peek_ident_at(0, word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, c: char) -> Result<(), JavaSyntaxError> {
        if self.eat_punct(c) {
            Ok(())
        } else {
            Err(self.error(format!("expected '{}', found {}", c, self.describe())))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, JavaSyntaxError> {
        match &self.peek().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(self.error(format!("expected identifier, found {}", self.describe()))),
        }
    }

    fn describe(&self) -> String {
        match &self.peek().kind {
            TokenKind::Eof => "end of file".to_string(),
            _ => format!("'{}'", render_tokens(std::slice::from_ref(self.peek()))),
        }
    }

    fn error(&self, message: impl Into<String>) -> JavaSyntaxError {
        JavaSyntaxError::new(self.path, self.line(), message)
    }
}

/// Render tokens back into compact source text
fn render_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut previous_word = false;

    for token in tokens {
        let (text, word) = match &token.kind {
            TokenKind::Ident(s) | TokenKind::Number(s) => (s.clone(), true),
            TokenKind::Char(s) => (s.clone(), true),
            TokenKind::Str(s) => (quote(s), true),
            TokenKind::Ellipsis => ("...".to_string(), false),
            TokenKind::Punct('?') => ("?".to_string(), true),
            TokenKind::Punct(c) => (c.to_string(), false),
            TokenKind::Eof => continue,
        };
        if word && previous_word {
            out.push(' ');
        }
        out.push_str(&text);
        if text == "," {
            out.push(' ');
        }
        previous_word = word;
    }

    out
}

fn quote(s: &str) -> String {
    let mut out = String::from("\"");
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}
