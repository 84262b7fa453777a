//! Value descriptors for constants and default values

use std::fmt;

/// Primitive kind of a class constant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstantKind {
    Bool,
    Int,
    Double,
    String,
    Null,
}

impl ConstantKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConstantKind::Bool => "bool",
            ConstantKind::Int => "int",
            ConstantKind::Double => "double",
            ConstantKind::String => "string",
            ConstantKind::Null => "null",
        }
    }
}

impl fmt::Display for ConstantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed value of a class constant
#[derive(Debug, Clone, PartialEq)]
pub enum ConstantValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Null,
}

impl ConstantValue {
    pub fn kind(&self) -> ConstantKind {
        match self {
            ConstantValue::Bool(_) => ConstantKind::Bool,
            ConstantValue::Int(_) => ConstantKind::Int,
            ConstantValue::Double(_) => ConstantKind::Double,
            ConstantValue::String(_) => ConstantKind::String,
            ConstantValue::Null => ConstantKind::Null,
        }
    }
}

/// Default value of a property or parameter
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    /// Positional array literal; `Array(vec![])` is the empty array
    Array(Vec<DefaultValue>),
    /// `Class::CONSTANT`, read when the object is created
    ClassConstant { class: String, constant: String },
}

impl DefaultValue {
    /// Whether the value has to be built at construction time instead of
    /// being declared statically on the class entry
    pub fn needs_runtime_init(&self) -> bool {
        matches!(self, DefaultValue::Array(_) | DefaultValue::ClassConstant { .. })
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DefaultValue::Null)
    }

    /// Replace `self::` references, nested ones included, with `owner::`.
    /// `static::` stays late bound.
    pub fn bind_self(&self, owner: &str) -> DefaultValue {
        match self {
            DefaultValue::ClassConstant { class, constant } if class.eq_ignore_ascii_case("self") => {
                DefaultValue::ClassConstant {
                    class: owner.to_string(),
                    constant: constant.clone(),
                }
            }
            DefaultValue::Array(items) => {
                DefaultValue::Array(items.iter().map(|item| item.bind_self(owner)).collect())
            }
            other => other.clone(),
        }
    }
}

impl From<ConstantValue> for DefaultValue {
    fn from(value: ConstantValue) -> Self {
        match value {
            ConstantValue::Bool(b) => DefaultValue::Bool(b),
            ConstantValue::Int(i) => DefaultValue::Int(i),
            ConstantValue::Double(d) => DefaultValue::Double(d),
            ConstantValue::String(s) => DefaultValue::String(s),
            ConstantValue::Null => DefaultValue::Null,
        }
    }
}
