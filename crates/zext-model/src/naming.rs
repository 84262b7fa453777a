//! Qualified-name helpers
//!
//! Class names use `\` as the namespace separator. Native symbols replace it
//! with `_`; that substitution is not injective on its own (`A\B_C` and
//! `A_B\C` collide), so the registry refuses to declare a second class whose
//! symbol fragment is already taken.

pub const NAMESPACE_SEPARATOR: char = '\\';

/// Registry key: no leading separator, lowercased
pub fn normalize(name: &str) -> String {
    name.trim_start_matches(NAMESPACE_SEPARATOR).to_lowercase()
}

/// Split `A\B\C` into (`A\B`, `C`)
pub fn split_qualified(name: &str) -> (&str, &str) {
    let name = name.trim_start_matches(NAMESPACE_SEPARATOR);
    match name.rfind(NAMESPACE_SEPARATOR) {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => ("", name),
    }
}

/// Join a namespace and a short name
pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", namespace, NAMESPACE_SEPARATOR, name)
    }
}

/// Namespace usable inside C identifiers
pub fn c_namespace(namespace: &str) -> String {
    namespace.replace(NAMESPACE_SEPARATOR, "_")
}

/// Double every separator so the name survives inside a C string literal
pub fn escape(name: &str) -> String {
    name.replace(NAMESPACE_SEPARATOR, "\\\\")
}

/// Lowercased symbol fragment shared by every native symbol of a class
pub fn symbol_fragment(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_lowercase()
    } else {
        format!("{}_{}", c_namespace(namespace), name).to_lowercase()
    }
}

/// Escape arbitrary text for a C string literal
pub fn c_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_class_name() {
        assert_eq!(escape("\\Bar\\Foo"), "\\\\Bar\\\\Foo");
    }

    #[test]
    fn test_split_and_qualify() {
        assert_eq!(split_qualified("\\App\\Geometry\\Circle"), ("App\\Geometry", "Circle"));
        assert_eq!(split_qualified("Countable"), ("", "Countable"));
        assert_eq!(qualify("App", "Circle"), "App\\Circle");
        assert_eq!(qualify("", "Countable"), "Countable");
    }

    #[test]
    fn test_symbol_fragment() {
        assert_eq!(symbol_fragment("Stub\\Properties", "ProtectedProperties"), "stub_properties_protectedproperties");
        assert_eq!(symbol_fragment("A\\B_C", "D"), symbol_fragment("A_B\\C", "D"));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("\\App\\Circle"), "app\\circle");
    }

    #[test]
    fn test_c_string() {
        assert_eq!(c_string("say \"hi\"\n"), "say \\\"hi\\\"\\n");
    }
}
