//! Markup embedded in render annotations
//!
//! A markup string is either a single XML-like element tree or, when it does
//! not start with `<`, one run of text. Text runs and attribute values may
//! interpolate `{expr}` tokens.

pub mod parser;
pub mod tokens;

use thiserror::Error;

pub use parser::parse;
pub use tokens::{scan, substitute_attribute};

/// One piece of a scanned text run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text
    Text(String),
    /// `{name}` - a render method parameter
    Variable(String),
    /// `{this.m(..)}` - emitted verbatim as a sibling node
    Call(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(Vec<Token>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

/// Attribute with its entity-decoded value; `{}` substitution happens when
/// the owning render method's parameters are known
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

/// Attribute value after parameter substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Literal(String),
    /// The whole value was one `{expr}`; emitted without quoting
    Expression(String),
    Concat(Vec<Piece>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    Text(String),
    Expression(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("line {line}, column {column}: {message}")]
pub struct MarkupError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl MarkupError {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        MarkupError {
            line,
            column,
            message: message.into(),
        }
    }

    /// Shift a position relative to a text run onto the run's own position
    pub(crate) fn relative_to(self, line: usize, column: usize) -> Self {
        if self.line == 1 {
            MarkupError::new(line, column + self.column - 1, self.message)
        } else {
            MarkupError::new(line + self.line - 1, self.column, self.message)
        }
    }
}
