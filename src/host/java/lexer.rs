//! Tokenizer for the declaration-level subset of Java
//!
//! Only what the declaration parser needs survives: identifiers (keywords
//! are identifiers here), literals, and single-character punctuation.
//! Comments and whitespace are dropped. Tokens are recognized by a logos
//! enum; string literals and text blocks are then fully unescaped so
//! annotation values arrive as the compiler would see them.

use logos::Logos;
use std::path::Path;

use super::JavaSyntaxError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    /// String literal or text block, escapes already processed
    Str(String),
    /// Char literal, kept as written including quotes
    Char(String),
    Number(String),
    /// `...`
    Ellipsis,
    Punct(char),
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
}

/// Raw Java tokens as recognized by logos; trivia is filtered afterwards
#[derive(Logos, Debug, PartialEq, Clone)]
enum RawToken {
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*")]
    Identifier,
    // the only hyphenated keyword
    #[token("non-sealed")]
    NonSealed,

    #[regex(r"[0-9][0-9a-zA-Z_]*(\.[0-9][0-9a-zA-Z_]*)?([eEpP][+-][0-9][0-9_]*[fFdD]?)?")]
    Number,
    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    StringLiteral,
    #[regex(r#""([^"\\\n]|\\[^\n])*"#)]
    UnterminatedString,
    #[token("\"\"\"", text_block)]
    TextBlock,
    #[regex(r"'([^'\\\n]|\\u+[0-9a-fA-F]{4}|\\[0-7]{1,3}|\\[^\n])'")]
    CharLiteral,
    #[regex(r"'([^'\\\n]|\\[^\n])*")]
    UnterminatedChar,

    #[token("...")]
    Ellipsis,
    #[regex(r#"[^ \t\r\n\x0Ca-zA-Z0-9_$"'\x{FEFF}]"#, |lex| lex.slice().chars().next())]
    Punct(char),

    #[regex(r"//[^\n]*")]
    LineComment,
    #[regex(r"/\*[^*]*\*+([^/*][^*]*\*+)*/", priority = 3)]
    BlockComment,
    #[token("/*")]
    UnterminatedComment,
    #[regex(r"[ \t\r\n\x0C]+")]
    Whitespace,
    #[token("\u{FEFF}")]
    Bom,
}

/// Consume a text block body up to and including the closing delimiter
fn text_block(lex: &mut logos::Lexer<RawToken>) -> bool {
    let rest = lex.remainder();
    let mut chars = rest.char_indices();
    while let Some((i, c)) = chars.next() {
        if c == '\\' {
            chars.next();
        } else if rest[i..].starts_with("\"\"\"") {
            lex.bump(i + 3);
            return true;
        }
    }
    false
}

pub struct Lexer<'a> {
    source: &'a str,
    path: &'a Path,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, path: &'a Path) -> Self {
        Lexer { source, path }
    }

    pub fn tokenize(self) -> Result<Vec<Token>, JavaSyntaxError> {
        let mut tokens = Vec::new();
        let mut raw = RawToken::lexer(self.source);
        let mut line = 1;
        let mut counted = 0;

        while let Some(result) = raw.next() {
            let span = raw.span();
            line += self.source[counted..span.start].matches('\n').count();
            counted = span.start;
            let slice = raw.slice();

            let kind = match result {
                Ok(RawToken::Identifier) | Ok(RawToken::NonSealed) => TokenKind::Ident(slice.to_string()),
                Ok(RawToken::Number) => TokenKind::Number(slice.to_string()),
                Ok(RawToken::StringLiteral) => {
                    let body = &slice[1..slice.len() - 1];
                    TokenKind::Str(unescape(body).map_err(|m| self.error(line, m))?)
                }
                Ok(RawToken::TextBlock) => TokenKind::Str(self.text_block_value(slice, line)?),
                Ok(RawToken::CharLiteral) => TokenKind::Char(slice.to_string()),
                Ok(RawToken::Ellipsis) => TokenKind::Ellipsis,
                Ok(RawToken::Punct(c)) => TokenKind::Punct(c),
                Ok(RawToken::UnterminatedString) => return Err(self.error(line, "unterminated string literal")),
                Ok(RawToken::UnterminatedChar) => return Err(self.error(line, "unterminated character literal")),
                Ok(RawToken::UnterminatedComment) => return Err(self.error(line, "unterminated comment")),
                Ok(RawToken::LineComment)
                | Ok(RawToken::BlockComment)
                | Ok(RawToken::Whitespace)
                | Ok(RawToken::Bom) => continue,
                Err(()) if slice.starts_with("\"\"\"") => {
                    return Err(self.error(line, "unterminated text block"))
                }
                Err(()) => return Err(self.error(line, format!("unexpected input `{}`", slice))),
            };
            tokens.push(Token { kind, line });
        }

        line += self.source[counted..].matches('\n').count();
        tokens.push(Token {
            kind: TokenKind::Eof,
            line,
        });
        Ok(tokens)
    }

    fn error(&self, line: usize, message: impl Into<String>) -> JavaSyntaxError {
        JavaSyntaxError::new(self.path, line, message)
    }

    /// `slice` spans both delimiters
    fn text_block_value(&self, slice: &str, line: usize) -> Result<String, JavaSyntaxError> {
        let body = &slice[3..slice.len() - 3];
        // the opening delimiter must be followed by a line terminator
        let header_end = body.find('\n').ok_or_else(|| {
            self.error(line, "text block opening delimiter must be followed by a line terminator")
        })?;
        if !body[..header_end].trim().is_empty() {
            return Err(self.error(
                line,
                "text block opening delimiter must be followed by a line terminator",
            ));
        }
        let stripped = strip_indentation(&body[header_end + 1..]);
        unescape(&stripped).map_err(|m| self.error(line, m))
    }
}

/// Incidental whitespace removal for text block content
fn strip_indentation(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n");
    let lines: Vec<&str> = normalized.split('\n').collect();
    let last = lines.len() - 1;
    let closing_on_own_line = lines[last].trim().is_empty();

    let indent = lines
        .iter()
        .enumerate()
        .filter(|(i, line)| !line.trim().is_empty() || (*i == last && closing_on_own_line))
        .map(|(_, line)| line.chars().take_while(|c| c.is_whitespace()).count())
        .min()
        .unwrap_or(0);

    let mut out: Vec<String> = lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                line.chars().skip(indent).collect::<String>().trim_end().to_string()
            }
        })
        .collect();

    if closing_on_own_line {
        // the closing delimiter line contributes only the final line terminator
        out[last] = String::new();
    }
    out.join("\n")
}

/// Process Java escape sequences
pub fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = chars
            .next()
            .ok_or_else(|| "dangling backslash in literal".to_string())?;
        match escaped {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'b' => out.push('\u{8}'),
            'r' => out.push('\r'),
            'f' => out.push('\u{c}'),
            's' => out.push(' '),
            '"' => out.push('"'),
            '\'' => out.push('\''),
            '\\' => out.push('\\'),
            '\n' => {}
            'u' => {
                while chars.peek() == Some(&'u') {
                    chars.next();
                }
                let hex: String = chars.by_ref().take(4).collect();
                let value = u32::from_str_radix(&hex, 16)
                    .map_err(|_| format!("invalid unicode escape \\u{}", hex))?;
                let ch = char::from_u32(value)
                    .ok_or_else(|| format!("invalid unicode escape \\u{}", hex))?;
                out.push(ch);
            }
            '0'..='7' => {
                let mut value = escaped.to_digit(8).unwrap_or(0);
                let max_digits = if escaped <= '3' { 3 } else { 2 };
                let mut digits = 1;
                while digits < max_digits {
                    match chars.peek().and_then(|c| c.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                            digits += 1;
                        }
                        None => break,
                    }
                }
                out.push(char::from_u32(value).unwrap_or('\u{fffd}'));
            }
            other => return Err(format!("illegal escape character \\{}", other)),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> Vec<TokenKind> {
        Lexer::new(source, Path::new("Test.java"))
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_identifiers_and_punctuation() {
        let tokens = lex("protected abstract React.Element noArgs();");
        assert_eq!(tokens[0], TokenKind::Ident("protected".to_string()));
        assert_eq!(tokens[3], TokenKind::Punct('.'));
        assert_eq!(tokens[6], TokenKind::Punct('('));
        assert_eq!(tokens.last(), Some(&TokenKind::Eof));
    }

    #[test]
    fn test_comments_are_skipped_and_lines_counted() {
        let tokens = Lexer::new("// one\n/* two\n three */ class", Path::new("T.java"))
            .tokenize()
            .unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Ident("class".to_string()));
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn test_string_escapes() {
        let tokens = lex(r#""a\tb\"c\\dA\101""#);
        assert_eq!(tokens[0], TokenKind::Str("a\tb\"c\\dAA".to_string()));
    }

    #[test]
    fn test_text_block_strips_incidental_indentation() {
        let source = "\"\"\"\n      <div>\n        <h1>Hi</h1>   \n      </div>\"\"\"";
        let tokens = lex(source);
        assert_eq!(
            tokens[0],
            TokenKind::Str("<div>\n  <h1>Hi</h1>\n</div>".to_string())
        );
    }

    #[test]
    fn test_text_block_closing_delimiter_on_own_line() {
        let source = "\"\"\"\n    <div/>\n  \"\"\"";
        assert_eq!(lex(source)[0], TokenKind::Str("  <div/>\n".to_string()));
    }

    #[test]
    fn test_text_block_requires_line_terminator() {
        let result = Lexer::new("\"\"\"<div/>\"\"\"", Path::new("T.java")).tokenize();
        assert!(result.is_err());
    }

    #[test]
    fn test_varargs_and_non_sealed() {
        let tokens = lex("non-sealed class X { void f(int... xs) {} }");
        assert_eq!(tokens[0], TokenKind::Ident("non-sealed".to_string()));
        assert!(tokens.contains(&TokenKind::Ellipsis));
    }

    #[test]
    fn test_numbers_with_exponent() {
        assert_eq!(lex("1.5e-3")[0], TokenKind::Number("1.5e-3".to_string()));
        assert_eq!(lex("0xFFL")[0], TokenKind::Number("0xFFL".to_string()));
    }

    #[test]
    fn test_unterminated_string_is_an_error() {
        let result = Lexer::new("\"abc\n", Path::new("T.java")).tokenize();
        let err = result.unwrap_err();
        assert_eq!(err.line, 1);
    }

    #[test]
    fn test_unterminated_comment_and_text_block() {
        let err = Lexer::new("class A {}\n/* open", Path::new("T.java")).tokenize().unwrap_err();
        assert_eq!(err.message, "unterminated comment");
        assert_eq!(err.line, 2);

        let err = Lexer::new("\"\"\"\n  <div/>", Path::new("T.java")).tokenize().unwrap_err();
        assert_eq!(err.message, "unterminated text block");
    }

    #[test]
    fn test_text_block_line_is_tracked_past_its_body() {
        let tokens = Lexer::new("\"\"\"\n  a\n  b\n  \"\"\"\nclass", Path::new("T.java"))
            .tokenize()
            .unwrap();
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].kind, TokenKind::Ident("class".to_string()));
        assert_eq!(tokens[1].line, 5);
    }
}
