//! Code generation for component classes
//!
//! `tree` lowers markup into [`java::JavaExpr`] values, `component` lays out
//! the generated compilation unit and `java` renders both as text.

pub mod component;
pub mod java;
pub mod tree;

pub use component::{render_component, ComponentSource, MethodParameter, RenderMethod};
pub use java::{JavaExpr, SourceWriter};
pub use tree::{Lowering, TreeContext};

/// Framework types the generated code is written against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runtime {
    /// Class providing `createElement`, `createText` and `props`
    pub runtime_class: String,
    pub element_type: String,
    pub props_type: String,
    /// Class providing `wrapCallback` and the nested `Callback` adapter
    pub callback_class: String,
}

impl Runtime {
    /// Simple name of the runtime class; generated files import it
    pub fn runtime_name(&self) -> &str {
        crate::host::java::simple_name(&self.runtime_class)
    }

    /// How a qualified type is spelled once the runtime class is imported
    ///
    /// `net.java.html.react.React.Element` becomes `React.Element`; types
    /// outside the runtime class stay qualified.
    pub fn local_name(&self, qualified: &str) -> String {
        match qualified.strip_prefix(&self.runtime_class) {
            Some(rest) if rest.is_empty() || rest.starts_with('.') => {
                format!("{}{}", self.runtime_name(), rest)
            }
            _ => qualified.to_string(),
        }
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Runtime {
            runtime_class: "net.java.html.react.React".to_string(),
            element_type: "net.java.html.react.React.Element".to_string(),
            props_type: "net.java.html.react.React.Props".to_string(),
            callback_class: "net.java.html.react.React4J".to_string(),
        }
    }
}
