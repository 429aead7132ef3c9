//! Java expression tree and the writer that turns it into source text
//!
//! All indentation and string escaping of generated code happens here.

/// Expression in generated Java code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JavaExpr {
    /// String literal, unescaped
    Str(String),
    /// Source text emitted as-is (identifiers, calls from markup)
    Raw(String),
    Null,
    Cast {
        type_name: String,
        expr: Box<JavaExpr>,
    },
    /// `a + b + c`
    Concat(Vec<JavaExpr>),
    /// `callee(args..., children...)`; children may be laid out one per line
    Call {
        callee: String,
        args: Vec<JavaExpr>,
        children: Vec<JavaExpr>,
    },
}

impl JavaExpr {
    pub fn call(callee: impl Into<String>, args: Vec<JavaExpr>) -> Self {
        JavaExpr::Call {
            callee: callee.into(),
            args,
            children: Vec::new(),
        }
    }

    /// A call that fits on one line
    pub fn is_leaf(&self) -> bool {
        match self {
            JavaExpr::Call { children, .. } => children.iter().all(JavaExpr::is_flat),
            _ => true,
        }
    }

    fn is_flat(&self) -> bool {
        match self {
            JavaExpr::Call { children, .. } => {
                !children.iter().any(|c| matches!(c, JavaExpr::Call { .. }))
            }
            _ => true,
        }
    }
}

/// Quote and escape `text` as a Java string literal
pub fn string_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Line-oriented source builder
pub struct SourceWriter {
    output: String,
    indent_level: usize,
}

impl SourceWriter {
    pub fn new() -> Self {
        SourceWriter {
            output: String::new(),
            indent_level: 0,
        }
    }

    fn indent(&self) -> String {
        "    ".repeat(self.indent_level)
    }

    pub fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.output.push('\n');
            return;
        }
        self.output.push_str(&self.indent());
        self.output.push_str(text);
        self.output.push('\n');
    }

    pub fn blank_line(&mut self) {
        self.output.push('\n');
    }

    /// Write `text` and indent what follows, e.g. `class A {`
    pub fn open(&mut self, text: &str) {
        self.line(text);
        self.indent_level += 1;
    }

    /// Dedent and write `text`, e.g. `}`
    pub fn close(&mut self, text: &str) {
        self.indent_level = self.indent_level.saturating_sub(1);
        self.line(text);
    }

    /// `prefix` + expression + `suffix`, continuing lines at the current indent
    pub fn statement(&mut self, prefix: &str, expr: &JavaExpr, suffix: &str) {
        let rendered = self.render(expr, self.indent_level);
        self.line(&format!("{}{}{}", prefix, rendered, suffix));
    }

    pub fn render(&self, expr: &JavaExpr, level: usize) -> String {
        match expr {
            JavaExpr::Str(text) => string_literal(text),
            JavaExpr::Raw(text) => text.clone(),
            JavaExpr::Null => "null".to_string(),
            JavaExpr::Cast { type_name, expr } => {
                format!("({}) {}", type_name, self.render(expr, level))
            }
            JavaExpr::Concat(parts) => parts
                .iter()
                .map(|p| self.render(p, level))
                .collect::<Vec<_>>()
                .join(" + "),
            JavaExpr::Call {
                callee,
                args,
                children,
            } => {
                let mut out = format!("{}(", callee);
                let args: Vec<String> = args.iter().map(|a| self.render(a, level)).collect();
                out.push_str(&args.join(", "));

                if expr.is_leaf() {
                    for child in children {
                        if !out.ends_with('(') {
                            out.push_str(", ");
                        }
                        out.push_str(&self.render(child, level));
                    }
                    out.push(')');
                    return out;
                }

                let inner = "    ".repeat(level + 1);
                for (i, child) in children.iter().enumerate() {
                    if i > 0 || !args.is_empty() {
                        out.push(',');
                    }
                    out.push('\n');
                    out.push_str(&inner);
                    out.push_str(&self.render(child, level + 1));
                }
                out.push('\n');
                out.push_str(&"    ".repeat(level));
                out.push(')');
                out
            }
        }
    }

    pub fn finish(self) -> String {
        self.output
    }
}

impl Default for SourceWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_literal_escaping() {
        assert_eq!(string_literal("a\\b"), r#""a\\b""#);
        assert_eq!(string_literal("line\nnext"), r#""line\nnext""#);
        assert_eq!(string_literal("say \"hi\"\t"), r#""say \"hi\"\t""#);
    }

    #[test]
    fn test_leaf_call_stays_on_one_line() {
        let writer = SourceWriter::new();
        let expr = JavaExpr::Call {
            callee: "React.createElement".to_string(),
            args: vec![JavaExpr::Str("h1".to_string()), JavaExpr::Null],
            children: vec![JavaExpr::call(
                "React.createText",
                vec![JavaExpr::Str("Hello!".to_string())],
            )],
        };
        assert_eq!(
            writer.render(&expr, 0),
            r#"React.createElement("h1", null, React.createText("Hello!"))"#
        );
    }

    #[test]
    fn test_nested_children_one_per_line() {
        let leaf = |tag: &str| JavaExpr::Call {
            callee: "e".to_string(),
            args: vec![JavaExpr::Str(tag.to_string())],
            children: vec![JavaExpr::Cast {
                type_name: "E[]".to_string(),
                expr: Box::new(JavaExpr::Null),
            }],
        };
        let inner = JavaExpr::Call {
            callee: "e".to_string(),
            args: vec![JavaExpr::Str("li".to_string())],
            children: vec![leaf("b")],
        };
        let expr = JavaExpr::Call {
            callee: "e".to_string(),
            args: vec![JavaExpr::Str("ul".to_string())],
            children: vec![inner, leaf("hr")],
        };

        let mut writer = SourceWriter::new();
        writer.open("m() {");
        writer.statement("return ", &expr, ";");
        writer.close("}");
        let expected = "m() {\n    return e(\"ul\",\n        e(\"li\", e(\"b\", (E[]) null)),\n        e(\"hr\", (E[]) null)\n    );\n}\n";
        assert_eq!(writer.finish(), expected);
    }

    #[test]
    fn test_concat_and_cast() {
        let writer = SourceWriter::new();
        let expr = JavaExpr::Concat(vec![
            JavaExpr::Str("Hello, ".to_string()),
            JavaExpr::Raw("name".to_string()),
            JavaExpr::Str("!".to_string()),
        ]);
        assert_eq!(writer.render(&expr, 0), r#""Hello, " + name + "!""#);
    }
}
