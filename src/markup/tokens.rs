//! Expression scanning for text runs and attribute values

use super::{AttributeValue, MarkupError, Piece, Token};

/// Split a text run into literal text, variables and calls, left to right
pub fn scan(text: &str) -> Result<Vec<Token>, MarkupError> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut pos = 0;

    while pos < chars.len() {
        if chars[pos] != '{' {
            literal.push(chars[pos]);
            pos += 1;
            continue;
        }

        let close = match matching_brace(&chars, pos) {
            Some(close) => close,
            None => {
                let (line, column) = position(&chars, pos);
                return Err(MarkupError::new(line, column, "unterminated `{` expression"));
            }
        };
        let content: String = chars[pos + 1..close].iter().collect();
        let content = content.trim();
        if content.is_empty() {
            let (line, column) = position(&chars, pos);
            return Err(MarkupError::new(line, column, "empty `{}` expression"));
        }

        if !literal.is_empty() {
            tokens.push(Token::Text(std::mem::take(&mut literal)));
        }
        if content.contains('(') {
            tokens.push(Token::Call(content.to_string()));
        } else {
            tokens.push(Token::Variable(content.to_string()));
        }
        pos = close + 1;
    }

    if !literal.is_empty() {
        tokens.push(Token::Text(literal));
    }
    Ok(tokens)
}

/// Substitute `{param}` and `{this.call()}` occurrences in an attribute value
///
/// Returns the resolved value and the parameters it referenced, in order of
/// first use. A value that is exactly one substitution becomes a bare
/// expression; anything else with substitutions becomes a concatenation.
/// Braces around unknown names are left as literal text.
pub fn substitute_attribute(value: &str, parameters: &[String]) -> (AttributeValue, Vec<String>) {
    let chars: Vec<char> = value.chars().collect();
    let mut pieces: Vec<Piece> = Vec::new();
    let mut used: Vec<String> = Vec::new();
    let mut literal = String::new();
    let mut pos = 0;

    while pos < chars.len() {
        if chars[pos] == '{' {
            if let Some(close) = matching_brace(&chars, pos) {
                let content: String = chars[pos + 1..close].iter().collect();
                let content = content.trim();
                let is_parameter = parameters.iter().any(|p| p == content);
                if is_parameter || content.contains('(') {
                    if !literal.is_empty() {
                        pieces.push(Piece::Text(std::mem::take(&mut literal)));
                    }
                    if is_parameter && !used.iter().any(|u| u == content) {
                        used.push(content.to_string());
                    }
                    pieces.push(Piece::Expression(content.to_string()));
                    pos = close + 1;
                    continue;
                }
            }
        }
        literal.push(chars[pos]);
        pos += 1;
    }
    if !literal.is_empty() {
        pieces.push(Piece::Text(literal));
    }

    let value = match pieces.as_slice() {
        [] => AttributeValue::Literal(String::new()),
        [Piece::Expression(expr)] => AttributeValue::Expression(expr.clone()),
        [Piece::Text(text)] => AttributeValue::Literal(text.clone()),
        _ => AttributeValue::Concat(pieces),
    };
    (value, used)
}

fn matching_brace(chars: &[char], open: usize) -> Option<usize> {
    let mut depth = 0;
    for (i, &c) in chars.iter().enumerate().skip(open) {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// 1-based line and column of `pos`
fn position(chars: &[char], pos: usize) -> (usize, usize) {
    let mut line = 1;
    let mut column = 1;
    for &c in &chars[..pos] {
        if c == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_scan_text_and_variable() {
        let tokens = scan("Hello, {name}!").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Text("Hello, ".to_string()),
                Token::Variable("name".to_string()),
                Token::Text("!".to_string()),
            ]
        );
    }

    #[test]
    fn test_scan_call_and_nested_braces() {
        let tokens = scan("{this.input(i, ch)}").unwrap();
        assert_eq!(tokens, vec![Token::Call("this.input(i, ch)".to_string())]);

        let tokens = scan("a{this.list(new int[]{1, 2})}b").unwrap();
        assert_eq!(tokens[1], Token::Call("this.list(new int[]{1, 2})".to_string()));
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_scan_trims_variable_names() {
        assert_eq!(scan("{ name }").unwrap(), vec![Token::Variable("name".to_string())]);
    }

    #[test]
    fn test_scan_reports_unterminated_brace() {
        let err = scan("ok\nthen {oops").unwrap_err();
        assert_eq!((err.line, err.column), (2, 6));
        assert!(scan("{}").is_err());
    }

    #[test]
    fn test_attribute_single_parameter_is_bare() {
        let (value, used) = substitute_attribute("{url}", &params(&["url"]));
        assert_eq!(value, AttributeValue::Expression("url".to_string()));
        assert_eq!(used, params(&["url"]));
    }

    #[test]
    fn test_attribute_partial_becomes_concat() {
        let (value, used) = substitute_attribute("item-{id}-{id}", &params(&["id", "other"]));
        assert_eq!(
            value,
            AttributeValue::Concat(vec![
                Piece::Text("item-".to_string()),
                Piece::Expression("id".to_string()),
                Piece::Text("-".to_string()),
                Piece::Expression("id".to_string()),
            ])
        );
        assert_eq!(used, params(&["id"]));
    }

    #[test]
    fn test_attribute_without_substitution_is_literal() {
        let (value, used) = substitute_attribute("empty {unknown}", &params(&["name"]));
        assert_eq!(value, AttributeValue::Literal("empty {unknown}".to_string()));
        assert!(used.is_empty());
    }

    #[test]
    fn test_attribute_call_expression() {
        let (value, used) = substitute_attribute("{this.getInt()}", &[]);
        assert_eq!(value, AttributeValue::Expression("this.getInt()".to_string()));
        assert!(used.is_empty());
    }
}
