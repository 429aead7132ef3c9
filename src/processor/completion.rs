//! Completion of `{...}` expressions while typing render markup

use super::ProcessorConfig;
use crate::host::{DeclId, DeclKind, DeclarationInspector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Full replacement for the typed text
    pub value: String,
    pub message: String,
}

/// Suggestions for markup `user_text` typed into the render annotation of `method`
///
/// After `{` every parameter and `this.` are offered; after `{this.` the
/// sibling methods returning the element type.
pub fn completions(
    inspector: &dyn DeclarationInspector,
    config: &ProcessorConfig,
    method: DeclId,
    user_text: &str,
) -> Vec<Completion> {
    let mut result = Vec::new();
    if inspector.kind(method) != DeclKind::Method {
        return result;
    }

    if user_text.ends_with('{') {
        for parameter in inspector.parameters(method) {
            result.push(Completion {
                value: format!("{}{}}}", user_text, parameter.name),
                message: format!("Access parameter {}", parameter.name),
            });
        }
        result.push(Completion {
            value: format!("{}this.", user_text),
            message: "Call this method".to_string(),
        });
    } else if user_text.ends_with("{this.") {
        let owner = match inspector.enclosing(method) {
            Some(owner) => owner,
            None => return result,
        };
        for sibling in inspector.enclosed(owner) {
            if sibling == method || inspector.kind(sibling) != DeclKind::Method {
                continue;
            }
            if inspector.return_type_name(sibling).as_deref() != Some(config.runtime.element_type.as_str()) {
                continue;
            }
            let defaults: Vec<&str> = inspector
                .parameters(sibling)
                .iter()
                .map(|p| default_value(&p.type_name))
                .collect();
            let name = inspector.simple_name(sibling);
            result.push(Completion {
                value: format!("{}{}({})}}", user_text, name, defaults.join(", ")),
                message: format!("Call {}", name),
            });
        }
    }
    result
}

fn default_value(type_name: &str) -> &'static str {
    match type_name.trim() {
        "boolean" => "false",
        "byte" | "char" | "short" | "int" | "long" | "float" | "double" => "0",
        _ => "null",
    }
}
