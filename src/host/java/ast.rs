//! Declaration-level syntax tree of a Java compilation unit
//!
//! Method bodies, field initializers and expressions are skipped by the
//! parser; only what annotation processing can observe is kept.

use std::path::PathBuf;

use crate::host::{DeclKind, Modifier, Parameter, TypeParameter};

#[derive(Debug, Clone, PartialEq)]
pub struct CompilationUnit {
    pub path: PathBuf,
    pub package: Option<String>,
    pub imports: Vec<ImportDecl>,
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub path: String, // without the trailing `.*`
    pub is_static: bool,
    pub wildcard: bool,
}

impl ImportDecl {
    /// Renders the import the way it is written after `import `
    pub fn to_source(&self) -> String {
        let mut out = String::new();
        if self.is_static {
            out.push_str("static ");
        }
        out.push_str(&self.path);
        if self.wildcard {
            out.push_str(".*");
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub name: String,
    pub values: Vec<(String, AnnotationValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    /// A string literal or a `+` concatenation of string literals
    Str(String),
    /// Anything else, as source text
    Raw(String),
}

impl AnnotationValue {
    pub fn as_text(&self) -> &str {
        match self {
            AnnotationValue::Str(s) | AnnotationValue::Raw(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub kind: DeclKind,
    pub name: String,
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
    pub type_params: Vec<TypeParameter>,
    pub members: Vec<Member>,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Member {
    Method(MethodDecl),
    Type(TypeDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub name: String,
    pub modifiers: Vec<Modifier>,
    pub annotations: Vec<Annotation>,
    pub type_params: Vec<TypeParameter>,
    pub return_type: String,
    pub params: Vec<Parameter>,
    pub has_body: bool,
    pub line: usize,
}
