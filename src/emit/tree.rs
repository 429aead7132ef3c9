//! Lowering of parsed markup into element construction calls

use std::collections::BTreeSet;

use super::java::JavaExpr;
use crate::markup::{substitute_attribute, AttributeValue, Element, MarkupError, Node, Piece, Token};

/// Names the lowered calls refer to
pub struct TreeContext<'a> {
    /// Runtime class as written in generated code, e.g. `React`
    pub runtime: &'a str,
    /// Element type as written in generated code, e.g. `React.Element`
    pub element_type: &'a str,
    /// Parameter names of the render method
    pub parameters: &'a [String],
}

pub struct Lowering<'a> {
    context: TreeContext<'a>,
    used: BTreeSet<String>,
}

impl<'a> Lowering<'a> {
    pub fn new(context: TreeContext<'a>) -> Self {
        Lowering {
            context,
            used: BTreeSet::new(),
        }
    }

    /// Parameters referenced by the markup so far
    pub fn used(&self) -> &BTreeSet<String> {
        &self.used
    }

    /// Lower a root node into the single expression a render method returns
    pub fn lower_root(&mut self, root: &Node) -> Result<JavaExpr, MarkupError> {
        let mut nodes = self.lower(root);
        if nodes.len() != 1 {
            return Err(MarkupError::new(
                1,
                1,
                format!("text markup must produce exactly one node, found {}", nodes.len()),
            ));
        }
        Ok(nodes.remove(0))
    }

    fn lower(&mut self, node: &Node) -> Vec<JavaExpr> {
        match node {
            Node::Element(element) => vec![self.lower_element(element)],
            Node::Text(tokens) => self.lower_text(tokens),
        }
    }

    fn lower_element(&mut self, element: &Element) -> JavaExpr {
        let props = self.lower_props(element);

        let mut children: Vec<JavaExpr> = Vec::new();
        for child in &element.children {
            children.extend(self.lower(child));
        }
        if children.is_empty() {
            children.push(JavaExpr::Cast {
                type_name: format!("{}[]", self.context.element_type),
                expr: Box::new(JavaExpr::Null),
            });
        }

        JavaExpr::Call {
            callee: format!("{}.createElement", self.context.runtime),
            args: vec![JavaExpr::Str(element.name.clone()), props],
            children,
        }
    }

    fn lower_props(&mut self, element: &Element) -> JavaExpr {
        if element.attributes.is_empty() {
            return JavaExpr::Null;
        }

        let mut args = Vec::with_capacity(element.attributes.len() * 2);
        for attribute in &element.attributes {
            let (value, used) = substitute_attribute(&attribute.value, self.context.parameters);
            self.used.extend(used);

            args.push(JavaExpr::Str(attribute.name.clone()));
            args.push(match value {
                AttributeValue::Literal(text) => JavaExpr::Str(text),
                AttributeValue::Expression(expr) => JavaExpr::Raw(expr),
                AttributeValue::Concat(pieces) => {
                    let mut parts = Vec::with_capacity(pieces.len() + 1);
                    if matches!(pieces.first(), Some(Piece::Expression(_))) {
                        parts.push(JavaExpr::Str(String::new()));
                    }
                    for piece in pieces {
                        parts.push(match piece {
                            Piece::Text(text) => JavaExpr::Str(text),
                            Piece::Expression(expr) => JavaExpr::Raw(expr),
                        });
                    }
                    JavaExpr::Concat(parts)
                }
            });
        }
        JavaExpr::call(format!("{}.props", self.context.runtime), args)
    }

    /// A text run becomes one `createText` per stretch between calls
    fn lower_text(&mut self, tokens: &[Token]) -> Vec<JavaExpr> {
        let mut siblings = Vec::new();
        let mut pending: Vec<JavaExpr> = Vec::new();

        for token in tokens {
            match token {
                Token::Text(text) => pending.push(JavaExpr::Str(text.clone())),
                Token::Variable(name) => {
                    if self.context.parameters.contains(name) {
                        self.used.insert(name.clone());
                    }
                    if pending.is_empty() {
                        pending.push(JavaExpr::Str(String::new()));
                    }
                    pending.push(JavaExpr::Raw(name.clone()));
                }
                Token::Call(call) => {
                    self.flush_text(&mut pending, &mut siblings);
                    siblings.push(JavaExpr::Raw(call.clone()));
                }
            }
        }
        self.flush_text(&mut pending, &mut siblings);
        siblings
    }

    fn flush_text(&self, pending: &mut Vec<JavaExpr>, siblings: &mut Vec<JavaExpr>) {
        if pending.is_empty() {
            return;
        }
        let text = if pending.len() == 1 {
            pending.remove(0)
        } else {
            JavaExpr::Concat(std::mem::take(pending))
        };
        siblings.push(JavaExpr::call(
            format!("{}.createText", self.context.runtime),
            vec![text],
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emit::java::SourceWriter;
    use crate::markup::parse;

    fn lower(markup: &str, parameters: &[&str]) -> Result<String, MarkupError> {
        let parameters: Vec<String> = parameters.iter().map(|s| s.to_string()).collect();
        let mut lowering = Lowering::new(TreeContext {
            runtime: "React",
            element_type: "React.Element",
            parameters: &parameters,
        });
        let expr = lowering.lower_root(&parse(markup)?)?;
        Ok(SourceWriter::new().render(&expr, 0))
    }

    #[test]
    fn test_childless_element_gets_marker() {
        assert_eq!(
            lower("<br/>", &[]).unwrap(),
            r#"React.createElement("br", null, (React.Element[]) null)"#
        );
    }

    #[test]
    fn test_variable_in_text() {
        assert_eq!(
            lower("<h1>Hello, {name}!</h1>", &["name"]).unwrap(),
            r#"React.createElement("h1", null, React.createText("Hello, " + name + "!"))"#
        );
        assert_eq!(
            lower("<b>{count}</b>", &["count"]).unwrap(),
            r#"React.createElement("b", null, React.createText("" + count))"#
        );
    }

    #[test]
    fn test_bare_attribute_expression() {
        assert_eq!(
            lower("<a href='{url}'>link</a>", &["url"]).unwrap(),
            r#"React.createElement("a", React.props("href", url), React.createText("link"))"#
        );
        assert_eq!(
            lower("<a href='/u/{id}'/>", &["id"]).unwrap(),
            r#"React.createElement("a", React.props("href", "/u/" + id), (React.Element[]) null)"#
        );
    }

    #[test]
    fn test_call_splits_text_run() {
        let out = lower("<div>a{this.input(i)}b</div>", &["i"]).unwrap();
        assert_eq!(
            out,
            "React.createElement(\"div\", null, React.createText(\"a\"), this.input(i), React.createText(\"b\"))"
        );
    }

    #[test]
    fn test_text_root_must_be_single_node() {
        assert_eq!(
            lower("{this.other()}", &[]).unwrap(),
            "this.other()"
        );
        assert!(lower("a{this.other()}", &[]).is_err());
    }

    #[test]
    fn test_used_parameters_are_recorded() {
        let parameters = vec!["ch".to_string(), "value".to_string(), "unused".to_string()];
        let mut lowering = Lowering::new(TreeContext {
            runtime: "React",
            element_type: "React.Element",
            parameters: &parameters,
        });
        lowering
            .lower_root(&parse("<input value='{value}' onChange='{ch}'/>").unwrap())
            .unwrap();
        let used: Vec<&String> = lowering.used().iter().collect();
        assert_eq!(used, vec!["ch", "value"]);
    }
}
