//! Render-method processor
//!
//! Finds abstract render methods on component classes, validates them and
//! writes one generated subclass per component through a [`Filer`].

pub mod completion;
pub mod diagnostics;

use std::collections::{BTreeMap, BTreeSet};

use crate::emit::{
    render_component, ComponentSource, Lowering, MethodParameter, RenderMethod, Runtime,
    TreeContext,
};
use crate::host::java::simple_name;
use crate::host::{DeclId, DeclKind, DeclarationInspector, Filer, Modifier, TypeParameter};
use crate::markup;

pub use completion::{completions, Completion};
pub use diagnostics::{AssertionState, CompilationRound, Diagnostic, Severity};

/// Annotation and runtime names the processor works with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    pub render_annotation: String,
    pub component_annotation: String,
    pub expected_error_annotation: String,
    pub runtime: Runtime,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        ProcessorConfig {
            render_annotation: "net.java.html.react.Render".to_string(),
            component_annotation: "net.java.html.react.RegisterComponent".to_string(),
            expected_error_annotation: "net.java.html.react.test.ExpectedError".to_string(),
            runtime: Runtime::default(),
        }
    }
}

/// A source file written during a round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSource {
    /// Qualified name, `<package>.<component name>`
    pub name: String,
    pub originating: Vec<DeclId>,
    pub contents: String,
}

pub struct Processor {
    config: ProcessorConfig,
}

impl Processor {
    pub fn new(config: ProcessorConfig) -> Self {
        Processor { config }
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Run one compilation round
    pub fn process(&self, inspector: &dyn DeclarationInspector, filer: &mut dyn Filer) -> CompilationRound {
        let mut round = CompilationRound::new(&self.config.expected_error_annotation);

        // BTreeMap keyed by class id keeps components in declaration order
        let mut methods_by_class: BTreeMap<DeclId, Vec<DeclId>> = BTreeMap::new();
        for method in inspector.annotated_with(&self.config.render_annotation) {
            if inspector.kind(method) != DeclKind::Method {
                continue;
            }
            match self.validate_render_method(inspector, method) {
                Ok(class) => {
                    round.mark_clean(method);
                    methods_by_class.entry(class).or_default().push(method);
                }
                Err(message) => round.report_error(inspector, method, &message),
            }
        }

        let mut rejected: BTreeSet<DeclId> = BTreeSet::new();
        for class in inspector.annotated_with(&self.config.component_annotation) {
            match self.validate_component(inspector, class) {
                Ok(()) => round.mark_clean(class),
                Err(message) => {
                    round.report_error(inspector, class, &message);
                    rejected.insert(class);
                }
            }
        }

        log::debug!(
            "round: {} component(s) with render methods, {} rejected",
            methods_by_class.len(),
            rejected.len()
        );

        for (class, methods) in &methods_by_class {
            if rejected.contains(class) {
                continue;
            }
            let package = match self.verify_enclosing(inspector, &mut round, *class) {
                Some(package) => package,
                None => continue,
            };
            self.generate(inspector, filer, &mut round, *class, &package, methods);
        }

        round.finish(inspector);
        round
    }

    /// Rules for a single render method; returns the component class
    fn validate_render_method(&self, inspector: &dyn DeclarationInspector, method: DeclId) -> Result<DeclId, String> {
        let render = self.render_name();
        let component = self.component_name();

        let class = inspector.enclosing(method).filter(|&class| {
            inspector.kind(class) == DeclKind::Class
                && inspector.has_annotation(class, &self.config.component_annotation)
        });
        let class = match class {
            Some(class) => class,
            None => return Err(format!("@{} in a class without @{}", render, component)),
        };

        if !inspector.is_abstract(method) || !inspector.has_modifier(method, Modifier::Protected) {
            return Err(format!("@{} method must be protected abstract", render));
        }

        let element_type = &self.config.runtime.element_type;
        if inspector.return_type_name(method).as_deref() != Some(element_type.as_str()) {
            return Err(format!(
                "@{} method must return {}",
                render,
                self.config.runtime.local_name(element_type)
            ));
        }

        let markup = inspector.annotation_value(method, &self.config.render_annotation, "value");
        if markup.map_or(true, |m| m.trim().is_empty()) {
            return Err(format!("@{} requires a markup value", render));
        }

        Ok(class)
    }

    fn validate_component(&self, inspector: &dyn DeclarationInspector, class: DeclId) -> Result<(), String> {
        let component = self.component_name();
        if inspector.kind(class) != DeclKind::Class || !inspector.is_abstract(class) {
            return Err(format!("@{} can only annotate abstract class", component));
        }

        let name = inspector.annotation_value(class, &self.config.component_annotation, "name");
        if !name.as_deref().is_some_and(is_java_identifier) {
            return Err(format!("@{} requires a valid name", component));
        }
        Ok(())
    }

    /// Nested component classes and their enclosing classes must be
    /// non-private and static; returns the package to generate into
    fn verify_enclosing(
        &self,
        inspector: &dyn DeclarationInspector,
        round: &mut CompilationRound,
        class: DeclId,
    ) -> Option<String> {
        let component = self.component_name();

        let mut types = vec![class];
        types.extend(
            inspector
                .enclosing_chain(class)
                .into_iter()
                .filter(|&decl| inspector.kind(decl).is_type()),
        );
        // the top-level class may be anything
        types.pop();

        for decl in types {
            let in_interface = inspector.enclosing(decl).is_some_and(|outer| {
                matches!(
                    inspector.kind(outer),
                    DeclKind::Interface | DeclKind::AnnotationType
                )
            });
            if inspector.has_modifier(decl, Modifier::Private) {
                round.report_error(inspector, decl, &format!("@{}: Make class non-private!", component));
                return None;
            }
            if !in_interface && !inspector.has_modifier(decl, Modifier::Static) {
                round.report_error(inspector, decl, &format!("@{}: Make class static!", component));
                return None;
            }
        }
        Some(inspector.package_of(class))
    }

    fn generate(
        &self,
        inspector: &dyn DeclarationInspector,
        filer: &mut dyn Filer,
        round: &mut CompilationRound,
        class: DeclId,
        package: &str,
        methods: &[DeclId],
    ) {
        let runtime = &self.config.runtime;
        let element_type = runtime.local_name(&runtime.element_type);
        let name = inspector
            .annotation_value(class, &self.config.component_annotation, "name")
            .unwrap_or_default();

        let mut render_methods = Vec::with_capacity(methods.len());
        let mut malformed = false;
        for &method in methods {
            let markup = inspector
                .annotation_value(method, &self.config.render_annotation, "value")
                .unwrap_or_default();
            let parameters: Vec<String> = inspector
                .parameters(method)
                .into_iter()
                .map(|p| p.name)
                .collect();

            let mut lowering = Lowering::new(TreeContext {
                runtime: runtime.runtime_name(),
                element_type: &element_type,
                parameters: &parameters,
            });
            let tree = markup::parse(&markup).and_then(|root| lowering.lower_root(&root));
            let tree = match tree {
                Ok(tree) => tree,
                Err(err) => {
                    let message = format!(
                        "malformed markup in {}(): {}",
                        inspector.simple_name(method),
                        err
                    );
                    round.report_error(inspector, method, &message);
                    malformed = true;
                    continue;
                }
            };

            for unused in parameters.iter().filter(|p| !lowering.used().contains(*p)) {
                let message = format!(
                    "parameter `{}` of {}() is not used by the markup",
                    unused,
                    inspector.simple_name(method)
                );
                round.report_warning(inspector, method, &message);
            }

            render_methods.push(RenderMethod {
                name: inspector.simple_name(method).to_string(),
                type_parameters: inspector
                    .type_parameters(method)
                    .into_iter()
                    .map(|p| declare_type_parameter(inspector, method, &p))
                    .collect(),
                parameters: inspector
                    .parameters(method)
                    .into_iter()
                    .map(|p| MethodParameter {
                        callback: inspector.functional_method(method, &p.type_name),
                        type_name: inspector.qualified_type(method, &p.type_name),
                        name: p.name,
                    })
                    .collect(),
                tree,
            });
        }
        if malformed {
            log::debug!("skipping {}: malformed markup", name);
            return;
        }

        let source = ComponentSource {
            package: package.to_string(),
            name: name.clone(),
            base_class: inspector.qualified_name(class),
            imports: inspector.imports(class),
            methods: render_methods,
        };
        let contents = render_component(&source, runtime);
        let qualified = if package.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", package, name)
        };

        let mut originating = vec![class];
        originating.extend_from_slice(methods);
        match filer.write_source_file(&qualified, &originating, &contents) {
            Ok(()) => {
                log::info!("generated {}", qualified);
                round.add_generated(GeneratedSource {
                    name: qualified,
                    originating,
                    contents,
                });
            }
            Err(err) => {
                round.report_error(inspector, class, &format!("{} while generating {}", err, name));
            }
        }
    }

    fn render_name(&self) -> &str {
        simple_name(&self.config.render_annotation)
    }

    fn component_name(&self) -> &str {
        simple_name(&self.config.component_annotation)
    }
}

/// `T extends Comparable<T>` with the bounds qualified as seen from `method`
fn declare_type_parameter(
    inspector: &dyn DeclarationInspector,
    method: DeclId,
    param: &TypeParameter,
) -> String {
    if param.bounds.is_empty() {
        return param.name.clone();
    }
    let bounds: Vec<String> = param
        .bounds
        .iter()
        .map(|bound| inspector.qualified_type(method, bound))
        .collect();
    format!("{} extends {}", param.name, bounds.join(" & "))
}

pub fn is_java_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
}
