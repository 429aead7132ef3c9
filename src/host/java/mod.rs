//! Java source front-end
//!
//! Parses the declaration skeleton of `.java` files into a [`JavaModel`],
//! an arena of packages, types and methods that answers the processor's
//! [`DeclarationInspector`] queries.

pub mod ast;
pub mod callbacks;
pub mod lexer;
pub mod parser;

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::host::{
    CallbackSignature, DeclId, DeclKind, DeclarationInspector, Location, Modifier, Parameter,
    TypeParameter,
};
use ast::{Annotation, CompilationUnit, ImportDecl, Member, MethodDecl, TypeDecl};
pub use callbacks::CallbackInterface;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}:{line}: {message}", path.display())]
pub struct JavaSyntaxError {
    pub path: PathBuf,
    pub line: usize,
    pub message: String,
}

impl JavaSyntaxError {
    pub fn new(path: &Path, line: usize, message: impl Into<String>) -> Self {
        JavaSyntaxError {
            path: path.to_path_buf(),
            line,
            message: message.into(),
        }
    }
}

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

#[derive(Debug, Clone)]
struct Decl {
    kind: DeclKind,
    name: String,
    parent: Option<DeclId>,
    unit: Option<usize>,
    modifiers: Vec<Modifier>,
    annotations: Vec<Annotation>,
    type_params: Vec<TypeParameter>,
    return_type: Option<String>,
    params: Vec<Parameter>,
    has_body: bool,
    children: Vec<DeclId>,
    line: usize,
}

impl Decl {
    fn package(name: &str) -> Self {
        Decl {
            kind: DeclKind::Package,
            name: name.to_string(),
            parent: None,
            unit: None,
            modifiers: Vec::new(),
            annotations: Vec::new(),
            type_params: Vec::new(),
            return_type: None,
            params: Vec::new(),
            has_body: false,
            children: Vec::new(),
            line: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct Unit {
    path: PathBuf,
    package: String,
    imports: Vec<ImportDecl>,
}

/// Declarations of every parsed compilation unit
#[derive(Debug, Default)]
pub struct JavaModel {
    decls: Vec<Decl>,
    units: Vec<Unit>,
    packages: BTreeMap<String, DeclId>,
    types: BTreeMap<String, DeclId>,
    known_types: BTreeSet<String>,
    callbacks: Vec<CallbackInterface>,
}

impl JavaModel {
    pub fn new() -> Self {
        let mut model = JavaModel::default();
        for callback in callbacks::builtin() {
            model.add_callback_interface(callback);
        }
        model
    }

    /// Types that wildcard imports may resolve to even though their source
    /// is not part of the model (framework classes)
    pub fn add_known_type(&mut self, qualified: &str) {
        self.known_types.insert(qualified.to_string());
    }

    pub fn add_callback_interface(&mut self, callback: CallbackInterface) {
        self.known_types.insert(callback.interface.clone());
        self.callbacks.retain(|c| c.interface != callback.interface);
        self.callbacks.push(callback);
    }

    /// Parse `source` and add its declarations
    pub fn add_source(&mut self, path: &Path, source: &str) -> Result<(), JavaSyntaxError> {
        let unit = parser::parse_unit(source, path)?;
        self.add_unit(unit);
        Ok(())
    }

    pub fn add_unit(&mut self, unit: CompilationUnit) {
        let package_name = unit.package.clone().unwrap_or_default();
        let package = self.package_decl(&package_name);
        let unit_index = self.units.len();
        self.units.push(Unit {
            path: unit.path,
            package: package_name.clone(),
            imports: unit.imports,
        });
        log::debug!(
            "model: unit {} with {} top-level types",
            self.units[unit_index].path.display(),
            unit.types.len()
        );

        for decl in unit.types {
            let prefix = if package_name.is_empty() {
                String::new()
            } else {
                format!("{}.", package_name)
            };
            self.add_type(decl, package, unit_index, &prefix);
        }
    }

    pub fn units(&self) -> usize {
        self.units.len()
    }

    /// Look up a type by its qualified name
    pub fn find_type(&self, qualified: &str) -> Option<DeclId> {
        self.types.get(qualified).copied()
    }

    /// Types whose qualified name is `name` or ends with `.name`
    pub fn types_named(&self, name: &str) -> Vec<DeclId> {
        let suffix = format!(".{}", name);
        self.types
            .iter()
            .filter(|(qualified, _)| *qualified == name || qualified.ends_with(&suffix))
            .map(|(_, &id)| id)
            .collect()
    }

    /// Look up a method `Type.method` by qualified type name and simple method name
    pub fn find_method(&self, qualified_type: &str, method: &str) -> Option<DeclId> {
        let owner = self.find_type(qualified_type)?;
        self.decl(owner)
            .children
            .iter()
            .copied()
            .find(|&id| self.decl(id).kind == DeclKind::Method && self.decl(id).name == method)
    }

    fn package_decl(&mut self, name: &str) -> DeclId {
        if let Some(&id) = self.packages.get(name) {
            return id;
        }
        let id = DeclId(self.decls.len());
        self.decls.push(Decl::package(name));
        self.packages.insert(name.to_string(), id);
        id
    }

    fn add_type(&mut self, decl: TypeDecl, parent: DeclId, unit: usize, prefix: &str) -> DeclId {
        let id = DeclId(self.decls.len());
        let qualified = format!("{}{}", prefix, decl.name);
        self.decls.push(Decl {
            kind: decl.kind,
            name: decl.name,
            parent: Some(parent),
            unit: Some(unit),
            modifiers: decl.modifiers,
            annotations: decl.annotations,
            type_params: decl.type_params,
            return_type: None,
            params: Vec::new(),
            has_body: true,
            children: Vec::new(),
            line: decl.line,
        });
        self.decls[parent.0].children.push(id);
        self.types.insert(qualified.clone(), id);

        let nested_prefix = format!("{}.", qualified);
        for member in decl.members {
            match member {
                Member::Method(method) => {
                    self.add_method(method, id, unit);
                }
                Member::Type(nested) => {
                    self.add_type(nested, id, unit, &nested_prefix);
                }
            }
        }
        id
    }

    fn add_method(&mut self, method: MethodDecl, parent: DeclId, unit: usize) -> DeclId {
        let id = DeclId(self.decls.len());
        self.decls.push(Decl {
            kind: DeclKind::Method,
            name: method.name,
            parent: Some(parent),
            unit: Some(unit),
            modifiers: method.modifiers,
            annotations: method.annotations,
            type_params: method.type_params,
            return_type: Some(method.return_type),
            params: method.params,
            has_body: method.has_body,
            children: Vec::new(),
            line: method.line,
        });
        self.decls[parent.0].children.push(id);
        id
    }

    fn decl(&self, id: DeclId) -> &Decl {
        &self.decls[id.0]
    }

    fn unit_of(&self, id: DeclId) -> Option<&Unit> {
        self.decl(id).unit.map(|index| &self.units[index])
    }

    /// Resolve a written type name to a qualified name as seen from `context`
    pub fn resolve_type(&self, context: DeclId, written: &str) -> Option<String> {
        let base = erase(written);
        if base.is_empty() {
            return None;
        }
        if PRIMITIVES.contains(&base.as_str()) {
            return Some(base);
        }

        let (first, rest) = match base.find('.') {
            Some(dot) => (&base[..dot], &base[dot..]),
            None => (base.as_str(), ""),
        };

        // member and sibling types visible from the enclosing chain
        let mut scope = Some(context);
        while let Some(id) = scope {
            let decl = self.decl(id);
            if decl.kind.is_type() {
                if decl.name == first {
                    return Some(format!("{}{}", self.qualified_name(id), rest));
                }
                for &child in &decl.children {
                    let child_decl = self.decl(child);
                    if child_decl.kind.is_type() && child_decl.name == first {
                        return Some(format!("{}{}", self.qualified_name(child), rest));
                    }
                }
            }
            scope = decl.parent;
        }

        let unit = self.unit_of(context)?;

        for import in unit.imports.iter().filter(|i| !i.is_static && !i.wildcard) {
            if import.path == first || import.path.ends_with(&format!(".{}", first)) {
                return Some(format!("{}{}", import.path, rest));
            }
        }

        let same_package = qualify(&unit.package, &base);
        if self.types.contains_key(&same_package) {
            return Some(same_package);
        }

        if base.contains('.') && first.chars().next().is_some_and(|c| c.is_lowercase()) {
            return Some(base);
        }

        for import in unit.imports.iter().filter(|i| !i.is_static && i.wildcard) {
            let candidate = format!("{}.{}", import.path, first);
            if self.types.contains_key(&candidate) || self.known_types.contains(&candidate) {
                return Some(format!("{}{}", candidate, rest));
            }
        }

        let java_lang = format!("java.lang.{}", first);
        if self.known_types.contains(&java_lang) {
            return Some(format!("{}{}", java_lang, rest));
        }

        None
    }

    /// True when `name` is a type variable declared by `context` or one of
    /// its enclosing declarations
    fn is_type_variable(&self, context: DeclId, name: &str) -> bool {
        let mut scope = Some(context);
        while let Some(id) = scope {
            let decl = self.decl(id);
            if decl.type_params.iter().any(|p| p.name == name) {
                return true;
            }
            if decl.modifiers.contains(&Modifier::Static) && decl.kind.is_type() {
                // outer type variables are not visible in static nested types
                return false;
            }
            scope = decl.parent;
        }
        false
    }

    /// Spell `written` with qualified names as seen from `context`
    pub fn qualify_type(&self, context: DeclId, written: &str) -> String {
        let written = written.trim();
        if written == "?" {
            return written.to_string();
        }
        for wildcard in ["? extends ", "? super "] {
            if let Some(bound) = written.strip_prefix(wildcard) {
                return format!("{}{}", wildcard, self.qualify_type(context, bound));
            }
        }

        let (body, dimensions) = split_dimensions(written);
        let (base, type_args) = if body.ends_with('>') {
            callbacks::split_type_args(body)
        } else {
            (body.to_string(), Vec::new())
        };

        let mut out = if PRIMITIVES.contains(&base.as_str()) || self.is_type_variable(context, &base) {
            base
        } else {
            self.resolve_type(context, &base).unwrap_or(base)
        };
        if !type_args.is_empty() {
            let type_args: Vec<String> = type_args
                .iter()
                .map(|arg| self.qualify_type(context, arg))
                .collect();
            out.push('<');
            out.push_str(&type_args.join(", "));
            out.push('>');
        }
        out.push_str(dimensions);
        out
    }

    /// True when `written`, seen from `context`, names the type `qualified`
    fn names_type(&self, context: DeclId, written: &str, qualified: &str) -> bool {
        if written == qualified {
            return true;
        }
        if let Some(resolved) = self.resolve_type(context, written) {
            return resolved == qualified;
        }
        let base = erase(written);
        if let Some(unit) = self.unit_of(context) {
            let wildcard = unit
                .imports
                .iter()
                .filter(|i| !i.is_static && i.wildcard)
                .any(|i| format!("{}.{}", i.path, base) == qualified);
            if wildcard || qualify(&unit.package, &base) == qualified {
                return true;
            }
        }
        // unresolvable simple names are matched by simple name
        !base.contains('.') && simple_name(qualified) == base
    }

    fn find_annotation(&self, decl: DeclId, annotation: &str) -> Option<&Annotation> {
        self.decl(decl)
            .annotations
            .iter()
            .find(|a| self.names_type(decl, &a.name, annotation))
    }

    fn interface_signature(&self, id: DeclId, type_args: &[String]) -> Option<CallbackSignature> {
        let decl = self.decl(id);
        if decl.kind != DeclKind::Interface {
            return None;
        }
        let mut abstract_methods = decl.children.iter().copied().filter(|&c| {
            let m = self.decl(c);
            m.kind == DeclKind::Method
                && !m.has_body
                && !m.modifiers.iter().any(|modifier| {
                    matches!(modifier, Modifier::Default | Modifier::Static | Modifier::Private)
                })
        });
        let method = abstract_methods.next()?;
        if abstract_methods.next().is_some() {
            return None;
        }
        let names: Vec<String> = decl.type_params.iter().map(|p| p.name.clone()).collect();
        let method_decl = self.decl(method);
        Some(CallbackSignature {
            method: method_decl.name.clone(),
            parameter_types: method_decl
                .params
                .iter()
                .map(|p| {
                    let qualified = self.qualify_type(method, &p.type_name);
                    callbacks::substitute(&qualified, &names, type_args)
                })
                .collect(),
        })
    }
}

impl DeclarationInspector for JavaModel {
    fn annotated_with(&self, annotation: &str) -> Vec<DeclId> {
        (0..self.decls.len())
            .map(DeclId)
            .filter(|&id| self.find_annotation(id, annotation).is_some())
            .collect()
    }

    fn kind(&self, decl: DeclId) -> DeclKind {
        self.decl(decl).kind
    }

    fn simple_name(&self, decl: DeclId) -> &str {
        &self.decl(decl).name
    }

    fn qualified_name(&self, decl: DeclId) -> String {
        let d = self.decl(decl);
        match d.parent {
            None => d.name.clone(),
            Some(parent) => qualify(&self.qualified_name(parent), &d.name),
        }
    }

    fn has_modifier(&self, decl: DeclId, modifier: Modifier) -> bool {
        self.decl(decl).modifiers.contains(&modifier)
    }

    fn return_type_name(&self, decl: DeclId) -> Option<String> {
        let written = self.decl(decl).return_type.as_ref()?;
        Some(self.qualify_type(decl, written))
    }

    fn parameters(&self, decl: DeclId) -> Vec<Parameter> {
        self.decl(decl).params.clone()
    }

    fn type_parameters(&self, decl: DeclId) -> Vec<TypeParameter> {
        self.decl(decl).type_params.clone()
    }

    fn qualified_type(&self, context: DeclId, written: &str) -> String {
        self.qualify_type(context, written)
    }

    fn enclosing(&self, decl: DeclId) -> Option<DeclId> {
        self.decl(decl).parent
    }

    fn enclosed(&self, decl: DeclId) -> Vec<DeclId> {
        self.decl(decl).children.clone()
    }

    fn annotation_value(&self, decl: DeclId, annotation: &str, member: &str) -> Option<String> {
        self.find_annotation(decl, annotation)?
            .values
            .iter()
            .find(|(name, _)| name == member)
            .map(|(_, value)| value.as_text().to_string())
    }

    fn has_annotation(&self, decl: DeclId, annotation: &str) -> bool {
        self.find_annotation(decl, annotation).is_some()
    }

    fn functional_method(&self, context: DeclId, type_name: &str) -> Option<CallbackSignature> {
        let (base, type_args) = callbacks::split_type_args(type_name);
        if !split_dimensions(type_name).1.is_empty() || self.is_type_variable(context, &base) {
            return None;
        }
        let qualified = self.resolve_type(context, &base)?;
        let type_args: Vec<String> = type_args
            .iter()
            .map(|arg| self.qualify_type(context, arg))
            .collect();

        if let Some(&id) = self.types.get(&qualified) {
            return self.interface_signature(id, &type_args);
        }

        let callback = self.callbacks.iter().find(|c| c.interface == qualified)?;
        Some(CallbackSignature {
            method: callback.method.clone(),
            parameter_types: callback
                .parameters
                .iter()
                .map(|p| callbacks::substitute(p, &callback.type_params, &type_args))
                .collect(),
        })
    }

    fn imports(&self, decl: DeclId) -> Vec<String> {
        self.unit_of(decl)
            .map(|unit| unit.imports.iter().map(ImportDecl::to_source).collect())
            .unwrap_or_default()
    }

    fn location(&self, decl: DeclId) -> Option<Location> {
        let unit = self.unit_of(decl)?;
        Some(Location {
            path: unit.path.clone(),
            line: self.decl(decl).line,
        })
    }
}

/// Strip type arguments, array brackets and varargs dots
fn erase(written: &str) -> String {
    let mut out = String::new();
    let mut depth = 0;
    for c in written.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.trim()
        .trim_end_matches("...")
        .trim_end_matches("[]")
        .trim_end_matches("[]")
        .trim()
        .to_string()
}

/// `int[][]` -> (`int`, `[][]`), `String...` -> (`String`, `...`)
fn split_dimensions(written: &str) -> (&str, &str) {
    let mut body = written.trim_end();
    loop {
        let trimmed = body.trim_end();
        if let Some(rest) = trimmed.strip_suffix("...") {
            body = rest;
        } else if let Some(rest) = trimmed.strip_suffix("[]") {
            body = rest;
        } else {
            body = trimmed;
            break;
        }
    }
    (body, &written.trim_end()[body.len()..])
}

fn qualify(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", prefix, name)
    }
}

/// `net.java.html.react.Render` -> `Render`
pub fn simple_name(qualified: &str) -> &str {
    qualified.rsplit('.').next().unwrap_or(qualified)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPONENT: &str = r#"
package demo.ui;

import net.java.html.react.React;
import net.java.html.react.Render;
import net.java.html.react.RegisterComponent;
import java.util.function.*;

public class Screens {
    @RegisterComponent(name = "HelloImpl")
    static abstract class Hello {
        @Render("<h1>Hello, {name}!</h1>")
        protected abstract React.Element greet(String name, Consumer<String> onName);

        protected int count() { return 1; }
    }

    interface Listener<T> {
        void changed(T value, int index);
        default void ignored() {}
    }
}
"#;

    fn model() -> JavaModel {
        let mut model = JavaModel::new();
        model.add_source(Path::new("src/demo/ui/Screens.java"), COMPONENT).unwrap();
        model
    }

    #[test]
    fn test_annotated_with_resolves_imports() {
        let model = model();
        let components = model.annotated_with("net.java.html.react.RegisterComponent");
        assert_eq!(components.len(), 1);
        assert_eq!(model.qualified_name(components[0]), "demo.ui.Screens.Hello");
        assert!(model.annotated_with("other.RegisterComponent").is_empty());

        let renders = model.annotated_with("net.java.html.react.Render");
        assert_eq!(model.simple_name(renders[0]), "greet");
        assert_eq!(
            model.annotation_value(renders[0], "net.java.html.react.Render", "value").as_deref(),
            Some("<h1>Hello, {name}!</h1>")
        );
    }

    #[test]
    fn test_enclosing_chain_and_package() {
        let model = model();
        let greet = model.find_method("demo.ui.Screens.Hello", "greet").unwrap();
        let chain = model.enclosing_chain(greet);
        let names: Vec<String> = chain.iter().map(|&id| model.qualified_name(id)).collect();
        assert_eq!(names, vec!["demo.ui.Screens.Hello", "demo.ui.Screens", "demo.ui"]);
        assert_eq!(model.package_of(greet), "demo.ui");
        assert_eq!(model.kind(*chain.last().unwrap()), DeclKind::Package);
    }

    #[test]
    fn test_return_type_resolution() {
        let model = model();
        let greet = model.find_method("demo.ui.Screens.Hello", "greet").unwrap();
        assert_eq!(
            model.return_type_name(greet).as_deref(),
            Some("net.java.html.react.React.Element")
        );
        let count = model.find_method("demo.ui.Screens.Hello", "count").unwrap();
        assert_eq!(model.return_type_name(count).as_deref(), Some("int"));
    }

    #[test]
    fn test_functional_method_from_builtin_via_wildcard() {
        let model = model();
        let greet = model.find_method("demo.ui.Screens.Hello", "greet").unwrap();
        let signature = model.functional_method(greet, "Consumer<String>").unwrap();
        assert_eq!(signature.method, "accept");
        assert_eq!(signature.parameter_types, vec!["String".to_string()]);

        let runnable = model.functional_method(greet, "Runnable").unwrap();
        assert_eq!(runnable.method, "run");
        assert!(model.functional_method(greet, "String").is_none());
        assert!(model.functional_method(greet, "int").is_none());
    }

    #[test]
    fn test_functional_method_from_source_interface() {
        let model = model();
        let greet = model.find_method("demo.ui.Screens.Hello", "greet").unwrap();
        let signature = model.functional_method(greet, "Listener<java.util.Date>").unwrap();
        assert_eq!(signature.method, "changed");
        assert_eq!(
            signature.parameter_types,
            vec!["java.util.Date".to_string(), "int".to_string()]
        );
    }

    #[test]
    fn test_location_and_imports() {
        let model = model();
        let greet = model.find_method("demo.ui.Screens.Hello", "greet").unwrap();
        let location = model.location(greet).unwrap();
        assert_eq!(location.path, PathBuf::from("src/demo/ui/Screens.java"));
        assert_eq!(location.line, 12);
        assert!(model.imports(greet).contains(&"java.util.function.*".to_string()));
    }

    #[test]
    fn test_simple_name_fallback_without_imports() {
        let mut model = JavaModel::new();
        model
            .add_source(
                Path::new("T.java"),
                "@RegisterComponent(name = \"X\") abstract class T {}",
            )
            .unwrap();
        assert_eq!(model.annotated_with("net.java.html.react.RegisterComponent").len(), 1);
    }

    #[test]
    fn test_known_types_resolve_through_wildcards() {
        let mut model = JavaModel::new();
        model.add_known_type("net.java.html.react.React");
        model
            .add_source(
                Path::new("T.java"),
                "import net.java.html.react.*; abstract class T { protected abstract React.Element m(); }",
            )
            .unwrap();
        let m = model.find_method("T", "m").unwrap();
        assert_eq!(
            model.return_type_name(m).as_deref(),
            Some("net.java.html.react.React.Element")
        );
    }

    #[test]
    fn test_qualified_types_keep_arguments_and_dimensions() {
        let mut model = JavaModel::new();
        model
            .add_source(
                Path::new("src/demo/Outer.java"),
                r#"
package demo;

import net.java.html.react.React;
import java.util.function.*;

public class Outer<X> {
    enum Mode { ON, OFF }

    interface Listener {
        void changed(Mode m);
    }

    static abstract class NestCmp {
        protected abstract React.Element[] many();
        protected abstract <T extends Listener> React.Element m(Mode mode, Listener l, Consumer<Mode[]> c, T t, X x, int... n);
    }
}
"#,
            )
            .unwrap();
        let m = model.find_method("demo.Outer.NestCmp", "m").unwrap();
        let qualified: Vec<String> = model
            .parameters(m)
            .iter()
            .map(|p| model.qualified_type(m, &p.type_name))
            .collect();
        assert_eq!(
            qualified,
            vec![
                "demo.Outer.Mode",
                "demo.Outer.Listener",
                "java.util.function.Consumer<demo.Outer.Mode[]>",
                "T",
                // outer type variables are not in scope of a static nested type
                "X",
                "int...",
            ]
        );
        assert_eq!(model.qualify_type(m, "java.util.Map<? extends Mode, ?>"), "java.util.Map<? extends demo.Outer.Mode, ?>");

        let many = model.find_method("demo.Outer.NestCmp", "many").unwrap();
        assert_eq!(
            model.return_type_name(many).as_deref(),
            Some("net.java.html.react.React.Element[]")
        );

        let params = model.type_parameters(m);
        assert_eq!(params[0].name, "T");
        assert_eq!(model.qualified_type(m, &params[0].bounds[0]), "demo.Outer.Listener");

        let listener = model.functional_method(m, "Listener").unwrap();
        assert_eq!(listener.parameter_types, vec!["demo.Outer.Mode".to_string()]);
        let consumer = model.functional_method(m, "Consumer<Mode>").unwrap();
        assert_eq!(consumer.parameter_types, vec!["demo.Outer.Mode".to_string()]);
        assert!(model.functional_method(m, "T").is_none());
        assert!(model.functional_method(m, "Listener[]").is_none());
    }

    #[test]
    fn test_split_dimensions() {
        assert_eq!(split_dimensions("int[][]"), ("int", "[][]"));
        assert_eq!(split_dimensions("String..."), ("String", "..."));
        assert_eq!(split_dimensions("List<String>"), ("List<String>", ""));
    }

    #[test]
    fn test_erase() {
        assert_eq!(erase("java.util.List<String>[]"), "java.util.List");
        assert_eq!(erase("int..."), "int");
        assert_eq!(erase("Map<K, List<V>>"), "Map");
    }
}
