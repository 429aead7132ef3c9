//! Host-side view of the declarations a compilation round works on
//!
//! The processor never looks at source text directly. Everything it needs to
//! know about classes and methods goes through [`DeclarationInspector`], and
//! everything it produces goes out through a [`Filer`]. The `java` submodule
//! provides an inspector backed by parsed Java sources.

pub mod filer;
pub mod java;

use std::fmt;
use std::path::PathBuf;

pub use filer::{hash_content, DirectoryFiler, Filer, MemoryFiler};

/// Handle to a declaration known to an inspector
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Package,
    Class,
    Interface,
    Enum,
    Record,
    AnnotationType,
    Method,
}

impl DeclKind {
    pub fn is_type(self) -> bool {
        !matches!(self, DeclKind::Package | DeclKind::Method)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Abstract,
    Static,
    Final,
    Default,
    Sealed,
    NonSealed,
    Native,
    Synchronized,
    Transient,
    Volatile,
    Strictfp,
}

impl Modifier {
    pub fn from_keyword(word: &str) -> Option<Modifier> {
        let modifier = match word {
            "public" => Modifier::Public,
            "protected" => Modifier::Protected,
            "private" => Modifier::Private,
            "abstract" => Modifier::Abstract,
            "static" => Modifier::Static,
            "final" => Modifier::Final,
            "default" => Modifier::Default,
            "sealed" => Modifier::Sealed,
            "non-sealed" => Modifier::NonSealed,
            "native" => Modifier::Native,
            "synchronized" => Modifier::Synchronized,
            "transient" => Modifier::Transient,
            "volatile" => Modifier::Volatile,
            "strictfp" => Modifier::Strictfp,
            _ => return None,
        };
        Some(modifier)
    }
}

/// A method parameter as declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    /// Type exactly as written, e.g. `java.util.List<String>` or `int...`
    pub type_name: String,
}

/// A declared type variable, e.g. `T extends Comparable<T>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeParameter {
    pub name: String,
    /// Bounds as written after `extends`, split on `&`
    pub bounds: Vec<String>,
}

/// The single abstract method of a function-like interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackSignature {
    pub method: String,
    /// Parameter types with the interface's type arguments substituted
    pub parameter_types: Vec<String>,
}

/// Where a declaration lives, for diagnostics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: PathBuf,
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.display(), self.line)
    }
}

/// Static reflection over the declarations of one compilation round
///
/// Annotation and type names passed in are fully qualified
/// (`net.java.html.react.Render`); implementations decide how written names
/// resolve against them.
pub trait DeclarationInspector {
    /// Declarations carrying `annotation`, in source order
    fn annotated_with(&self, annotation: &str) -> Vec<DeclId>;

    fn kind(&self, decl: DeclId) -> DeclKind;

    fn simple_name(&self, decl: DeclId) -> &str;

    /// Dotted name including the package; methods are qualified by their type
    fn qualified_name(&self, decl: DeclId) -> String;

    fn has_modifier(&self, decl: DeclId, modifier: Modifier) -> bool;

    /// Resolved, fully qualified return type of a method, if it resolves
    fn return_type_name(&self, decl: DeclId) -> Option<String>;

    fn parameters(&self, decl: DeclId) -> Vec<Parameter>;

    /// Type variables declared by a method or type, in declaration order
    fn type_parameters(&self, decl: DeclId) -> Vec<TypeParameter>;

    /// `written` spelled with fully qualified names as seen from `context`
    ///
    /// Type arguments, array dimensions and varargs are kept. Names that do
    /// not resolve, and type variables in scope, stay as written.
    fn qualified_type(&self, context: DeclId, written: &str) -> String;

    /// Directly enclosing declaration; `None` only for packages
    fn enclosing(&self, decl: DeclId) -> Option<DeclId>;

    /// Members of a type declaration, in source order
    fn enclosed(&self, decl: DeclId) -> Vec<DeclId>;

    /// String value of `member` on `annotation`, if the declaration carries it
    fn annotation_value(&self, decl: DeclId, annotation: &str, member: &str) -> Option<String>;

    fn has_annotation(&self, decl: DeclId, annotation: &str) -> bool;

    /// Single abstract method of `type_name` as seen from `context`
    fn functional_method(&self, context: DeclId, type_name: &str) -> Option<CallbackSignature>;

    /// Imports of the compilation unit that declares `decl`
    fn imports(&self, decl: DeclId) -> Vec<String>;

    fn location(&self, decl: DeclId) -> Option<Location>;

    fn is_abstract(&self, decl: DeclId) -> bool {
        self.has_modifier(decl, Modifier::Abstract)
    }

    /// Enclosing declarations from the innermost outwards, ending at the package
    fn enclosing_chain(&self, decl: DeclId) -> Vec<DeclId> {
        let mut chain = Vec::new();
        let mut current = self.enclosing(decl);
        while let Some(id) = current {
            chain.push(id);
            current = self.enclosing(id);
        }
        chain
    }

    /// Package a declaration belongs to; empty for the default package
    fn package_of(&self, decl: DeclId) -> String {
        let mut current = Some(decl);
        while let Some(id) = current {
            if self.kind(id) == DeclKind::Package {
                return self.qualified_name(id);
            }
            current = self.enclosing(id);
        }
        String::new()
    }
}
