//! Layout of one generated component class
use super::java::{JavaExpr, SourceWriter};
use super::Runtime;
use crate::host::CallbackSignature;

/// Everything needed to write the generated subclass of one component
#[derive(Debug, Clone)]
pub struct ComponentSource {
    pub package: String,
    /// Name of the generated class (the registered component name)
    pub name: String,
    /// Qualified name of the abstract component class
    pub base_class: String,
    /// Imports of the component's compilation unit, as written after `import `
    pub imports: Vec<String>,
    pub methods: Vec<RenderMethod>,
}

#[derive(Debug, Clone)]
pub struct RenderMethod {
    pub name: String,
    /// Declared type variables, e.g. `T extends java.lang.Comparable<T>`
    pub type_parameters: Vec<String>,
    pub parameters: Vec<MethodParameter>,
    pub tree: JavaExpr,
}

#[derive(Debug, Clone)]
pub struct MethodParameter {
    pub name: String,
    pub type_name: String,
    /// Set when the parameter type is a single-method interface
    pub callback: Option<CallbackSignature>,
}

/// Render the full source text of a generated component
pub fn render_component(source: &ComponentSource, runtime: &Runtime) -> String {
    let mut w = SourceWriter::new();

    if !source.package.is_empty() {
        w.line(&format!("package {};", source.package));
        w.blank_line();
    }

    w.line(&format!("import {};", runtime.runtime_class));
    let mut imports: Vec<&String> = source
        .imports
        .iter()
        .filter(|i| **i != runtime.runtime_class)
        .collect();
    imports.sort();
    imports.dedup();
    for import in imports {
        w.line(&format!("import {};", import));
    }
    w.blank_line();

    w.open(&format!(
        "final class {} extends {} {{",
        source.name, source.base_class
    ));
    w.open(&format!(
        "{}({} props) {{",
        source.name,
        runtime.local_name(&runtime.props_type)
    ));
    w.line("super(props);");
    w.close("}");

    let element_type = runtime.local_name(&runtime.element_type);
    for method in &source.methods {
        w.blank_line();
        render_method(&mut w, method, &element_type, runtime);
    }
    w.close("}");
    w.finish()
}

fn render_method(w: &mut SourceWriter, method: &RenderMethod, element_type: &str, runtime: &Runtime) {
    let mut declared = Vec::with_capacity(method.parameters.len());
    let mut adapters = Vec::new();
    let mut callback_count = 0;

    for parameter in &method.parameters {
        match &parameter.callback {
            Some(signature) => {
                callback_count += 1;
                let holder = format!("_callback{}", callback_count);
                declared.push(format!("{} {}", parameter.type_name, holder));
                adapters.push((parameter.name.as_str(), holder, signature));
            }
            None => declared.push(format!("{} {}", parameter.type_name, parameter.name)),
        }
    }

    let type_parameters = if method.type_parameters.is_empty() {
        String::new()
    } else {
        format!("<{}> ", method.type_parameters.join(", "))
    };
    w.line("@Override");
    w.open(&format!(
        "protected final {}{} {}({}) {{",
        type_parameters,
        element_type,
        method.name,
        declared.join(", ")
    ));

    let callback_class = &runtime.callback_class;
    for (name, holder, signature) in adapters {
        let casts: Vec<String> = signature
            .parameter_types
            .iter()
            .enumerate()
            .map(|(i, t)| format!("({}) args[{}]", t, i))
            .collect();
        w.open(&format!(
            "java.lang.Object {} = {}.wrapCallback(new {}.Callback() {{",
            name, callback_class, callback_class
        ));
        w.line("@Override");
        w.open("protected void callback(java.lang.Object[] args) {");
        w.line(&format!("{}.{}({});", holder, signature.method, casts.join(", ")));
        w.close("}");
        w.close("});");
    }

    w.statement("return ", &method.tree, ";");
    w.close("}");
}
