//! Function-like interfaces the model knows without seeing their source

/// A single-abstract-method interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackInterface {
    pub interface: String,
    pub type_params: Vec<String>,
    pub method: String,
    pub parameters: Vec<String>,
}

impl CallbackInterface {
    pub fn new(interface: &str, type_params: &[&str], method: &str, parameters: &[&str]) -> Self {
        CallbackInterface {
            interface: interface.to_string(),
            type_params: type_params.iter().map(|s| s.to_string()).collect(),
            method: method.to_string(),
            parameters: parameters.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// JDK interfaces commonly passed as event handlers
pub fn builtin() -> Vec<CallbackInterface> {
    vec![
        CallbackInterface::new("java.lang.Runnable", &[], "run", &[]),
        CallbackInterface::new("java.util.concurrent.Callable", &["V"], "call", &[]),
        CallbackInterface::new("java.util.function.Consumer", &["T"], "accept", &["T"]),
        CallbackInterface::new("java.util.function.BiConsumer", &["T", "U"], "accept", &["T", "U"]),
        CallbackInterface::new("java.util.function.IntConsumer", &[], "accept", &["int"]),
        CallbackInterface::new("java.util.function.LongConsumer", &[], "accept", &["long"]),
        CallbackInterface::new("java.util.function.DoubleConsumer", &[], "accept", &["double"]),
        CallbackInterface::new("java.util.function.ObjIntConsumer", &["T"], "accept", &["T", "int"]),
        CallbackInterface::new("java.util.function.Supplier", &["T"], "get", &[]),
        CallbackInterface::new("java.util.function.BooleanSupplier", &[], "getAsBoolean", &[]),
        CallbackInterface::new("java.util.function.Function", &["T", "R"], "apply", &["T"]),
        CallbackInterface::new("java.util.function.BiFunction", &["T", "U", "R"], "apply", &["T", "U"]),
        CallbackInterface::new("java.util.function.UnaryOperator", &["T"], "apply", &["T"]),
        CallbackInterface::new("java.util.function.Predicate", &["T"], "test", &["T"]),
        CallbackInterface::new("java.util.function.BiPredicate", &["T", "U"], "test", &["T", "U"]),
    ]
}

/// Replace type variables in `type_name` by their arguments
///
/// Variables without a matching argument (raw types) become `java.lang.Object`.
pub fn substitute(type_name: &str, type_params: &[String], type_args: &[String]) -> String {
    let mut out = String::new();
    let mut word = String::new();

    let flush = |word: &mut String, out: &mut String| {
        if word.is_empty() {
            return;
        }
        match type_params.iter().position(|p| p == word) {
            Some(index) => match type_args.get(index) {
                Some(arg) => out.push_str(&bound_of(arg)),
                None => out.push_str("java.lang.Object"),
            },
            None => out.push_str(word),
        }
        word.clear();
    };

    for c in type_name.chars() {
        if c.is_alphanumeric() || c == '_' || c == '$' || c == '.' {
            word.push(c);
        } else {
            flush(&mut word, &mut out);
            out.push(c);
        }
    }
    flush(&mut word, &mut out);
    out
}

/// The type a cast should use for a type argument
fn bound_of(arg: &str) -> String {
    let arg = arg.trim();
    if arg == "?" {
        "java.lang.Object".to_string()
    } else if let Some(rest) = arg.strip_prefix("? extends ") {
        rest.trim().to_string()
    } else if let Some(rest) = arg.strip_prefix("? super ") {
        rest.trim().to_string()
    } else {
        arg.to_string()
    }
}

/// Split `Name<A, B<C>>` into `Name` and `["A", "B<C>"]`
pub fn split_type_args(type_name: &str) -> (String, Vec<String>) {
    let type_name = type_name.trim();
    let open = match type_name.find('<') {
        Some(open) => open,
        None => return (type_name.to_string(), Vec::new()),
    };
    let close = type_name.rfind('>').unwrap_or(type_name.len());
    let base = type_name[..open].trim().to_string();
    let inner = &type_name[open + 1..close.max(open + 1)];

    let mut args = Vec::new();
    let mut depth = 0;
    let mut current = String::new();
    for c in inner.chars() {
        match c {
            '<' => {
                depth += 1;
                current.push(c);
            }
            '>' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        args.push(current.trim().to_string());
    }
    (base, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_type_args() {
        let (base, args) = split_type_args("java.util.function.BiConsumer<String, java.util.List<Integer>>");
        assert_eq!(base, "java.util.function.BiConsumer");
        assert_eq!(args, vec!["String".to_string(), "java.util.List<Integer>".to_string()]);

        let (base, args) = split_type_args("Runnable");
        assert_eq!(base, "Runnable");
        assert!(args.is_empty());
    }

    #[test]
    fn test_substitute_type_variables() {
        let params = vec!["T".to_string(), "U".to_string()];
        let args = vec!["String".to_string(), "? extends Number".to_string()];
        assert_eq!(substitute("T", &params, &args), "String");
        assert_eq!(substitute("java.util.List<U>", &params, &args), "java.util.List<Number>");
        assert_eq!(substitute("int", &params, &args), "int");
        assert_eq!(substitute("T", &params, &[]), "java.lang.Object");
        assert_eq!(substitute("Tee", &params, &args), "Tee");
    }

    #[test]
    fn test_builtin_table_has_runnable() {
        let runnable = builtin()
            .into_iter()
            .find(|c| c.interface == "java.lang.Runnable")
            .unwrap();
        assert_eq!(runnable.method, "run");
        assert!(runnable.parameters.is_empty());
    }
}
