//! Runtime reflection of bundled classes
//!
//! Classes and interfaces that ship with the host runtime are never declared
//! by the compilation unit. When a lookup misses, the registry asks a
//! [`RuntimeReflector`] to describe the class and imports the description as a
//! [`Provenance::Bundled`] definition.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::definition::{ClassDefinition, ClassKind, Provenance};
use crate::error::{ClassError, ClassResult};
use crate::members::{Constant, Modifier, Modifiers, Property};
use crate::method::{Method, Parameter};
use crate::naming;
use crate::value::{ConstantValue, DefaultValue};

/// A value as observed through runtime reflection
#[derive(Debug, Clone, PartialEq)]
pub enum ReflectedValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Null,
    Array,
    Object(String),
    Resource,
}

impl ReflectedValue {
    /// Runtime type name, as `gettype()` reports it
    pub fn type_name(&self) -> &'static str {
        match self {
            ReflectedValue::Bool(_) => "boolean",
            ReflectedValue::Int(_) => "integer",
            ReflectedValue::Double(_) => "double",
            ReflectedValue::String(_) => "string",
            ReflectedValue::Null => "NULL",
            ReflectedValue::Array => "array",
            ReflectedValue::Object(_) => "object",
            ReflectedValue::Resource => "resource",
        }
    }

    fn to_default(&self) -> DefaultValue {
        match self {
            ReflectedValue::Bool(b) => DefaultValue::Bool(*b),
            ReflectedValue::Int(i) => DefaultValue::Int(*i),
            ReflectedValue::Double(d) => DefaultValue::Double(*d),
            ReflectedValue::String(s) => DefaultValue::String(s.clone()),
            ReflectedValue::Array => DefaultValue::Array(Vec::new()),
            ReflectedValue::Null | ReflectedValue::Object(_) | ReflectedValue::Resource => {
                DefaultValue::Null
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReflectedParameter {
    pub name: String,
    pub optional: bool,
    /// `None` when the runtime cannot introspect the default of an optional
    /// parameter
    pub default: Option<ReflectedValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReflectedMethod {
    pub name: String,
    pub is_static: bool,
    pub is_final: bool,
    pub parameters: Vec<ReflectedParameter>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReflectedProperty {
    pub name: String,
    pub visibility: Modifier,
    pub is_static: bool,
}

/// Everything reflection reports about one runtime class
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectedClass {
    /// Qualified name as the runtime spells it
    pub name: String,
    pub is_interface: bool,
    pub is_final: bool,
    pub is_abstract: bool,
    pub parent: Option<String>,
    pub interfaces: Vec<String>,
    pub methods: Vec<ReflectedMethod>,
    pub constants: Vec<(String, ReflectedValue)>,
    pub properties: Vec<ReflectedProperty>,
}

impl ReflectedClass {
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_interface: false,
            is_final: false,
            is_abstract: false,
            parent: None,
            interfaces: Vec::new(),
            methods: Vec::new(),
            constants: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            is_interface: true,
            ..Self::class(name)
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReflectionError {
    #[error("Class \"{0}\" does not exist")]
    ClassNotFound(String),

    #[error("Reflection failed: {0}")]
    Failed(String),
}

/// Describes classes provided by the host runtime
pub trait RuntimeReflector: Send + Sync {
    fn reflect(&self, name: &str) -> Result<ReflectedClass, ReflectionError>;
}

/// Static description of the runtime's core classes and interfaces
#[derive(Debug, Clone)]
pub struct BuiltinCatalog {
    classes: FxHashMap<String, ReflectedClass>,
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn method(name: &str, parameters: &[&str]) -> ReflectedMethod {
    ReflectedMethod {
        name: name.to_string(),
        is_static: false,
        is_final: false,
        parameters: parameters
            .iter()
            .map(|p| ReflectedParameter {
                name: (*p).to_string(),
                optional: false,
                default: None,
            })
            .collect(),
    }
}

fn optional(name: &str, default: Option<ReflectedValue>) -> ReflectedParameter {
    ReflectedParameter {
        name: name.to_string(),
        optional: true,
        default,
    }
}

fn protected(name: &str) -> ReflectedProperty {
    ReflectedProperty {
        name: name.to_string(),
        visibility: Modifier::Protected,
        is_static: false,
    }
}

impl BuiltinCatalog {
    /// Catalog of the core runtime types
    pub fn new() -> Self {
        let mut catalog = Self::empty();

        catalog.insert(ReflectedClass::interface("Traversable"));

        let mut iterator = ReflectedClass::interface("Iterator");
        iterator.interfaces.push("Traversable".into());
        for name in ["current", "next", "key", "valid", "rewind"] {
            iterator.methods.push(method(name, &[]));
        }
        catalog.insert(iterator);

        let mut aggregate = ReflectedClass::interface("IteratorAggregate");
        aggregate.interfaces.push("Traversable".into());
        aggregate.methods.push(method("getIterator", &[]));
        catalog.insert(aggregate);

        let mut array_access = ReflectedClass::interface("ArrayAccess");
        array_access.methods.push(method("offsetExists", &["offset"]));
        array_access.methods.push(method("offsetGet", &["offset"]));
        array_access.methods.push(method("offsetSet", &["offset", "value"]));
        array_access.methods.push(method("offsetUnset", &["offset"]));
        catalog.insert(array_access);

        let mut countable = ReflectedClass::interface("Countable");
        countable.methods.push(method("count", &[]));
        catalog.insert(countable);

        let mut serializable = ReflectedClass::interface("Serializable");
        serializable.methods.push(method("serialize", &[]));
        serializable.methods.push(method("unserialize", &["data"]));
        catalog.insert(serializable);

        let mut json = ReflectedClass::interface("JsonSerializable");
        json.methods.push(method("jsonSerialize", &[]));
        catalog.insert(json);

        let mut stringable = ReflectedClass::interface("Stringable");
        stringable.methods.push(method("__toString", &[]));
        catalog.insert(stringable);

        let accessors = [
            "getMessage",
            "getCode",
            "getFile",
            "getLine",
            "getTrace",
            "getPrevious",
            "getTraceAsString",
        ];

        let mut throwable = ReflectedClass::interface("Throwable");
        throwable.interfaces.push("Stringable".into());
        for name in accessors {
            throwable.methods.push(method(name, &[]));
        }
        catalog.insert(throwable);

        let mut exception = ReflectedClass::class("Exception");
        exception.interfaces = vec!["Throwable".into(), "Stringable".into()];
        let mut construct = method("__construct", &[]);
        construct.parameters = vec![
            optional("message", Some(ReflectedValue::String(String::new()))),
            optional("code", Some(ReflectedValue::Int(0))),
            optional("previous", Some(ReflectedValue::Null)),
        ];
        exception.methods.push(construct);
        for name in accessors {
            let mut accessor = method(name, &[]);
            accessor.is_final = true;
            exception.methods.push(accessor);
        }
        exception.methods.push(method("__toString", &[]));
        for name in ["message", "code", "file", "line"] {
            exception.properties.push(protected(name));
        }
        catalog.insert(exception);

        catalog.insert(ReflectedClass::class("stdClass"));

        let mut closure = ReflectedClass::class("Closure");
        closure.is_final = true;
        let mut bind = method("bind", &["closure", "newThis"]);
        bind.is_static = true;
        bind.parameters.push(optional("newScope", None));
        closure.methods.push(bind);
        let mut bind_to = method("bindTo", &["newThis"]);
        bind_to.parameters.push(optional("newScope", None));
        closure.methods.push(bind_to);
        closure.methods.push(method("call", &["newThis"]));
        let mut from_callable = method("fromCallable", &["callback"]);
        from_callable.is_static = true;
        closure.methods.push(from_callable);
        catalog.insert(closure);

        catalog
    }

    pub fn empty() -> Self {
        Self {
            classes: FxHashMap::default(),
        }
    }

    pub fn insert(&mut self, class: ReflectedClass) {
        self.classes.insert(naming::normalize(&class.name), class);
    }
}

impl RuntimeReflector for BuiltinCatalog {
    fn reflect(&self, name: &str) -> Result<ReflectedClass, ReflectionError> {
        self.classes
            .get(&naming::normalize(name))
            .cloned()
            .ok_or_else(|| ReflectionError::ClassNotFound(name.to_string()))
    }
}

/// Placeholder default for optional parameters whose default the runtime
/// does not expose
const UNKNOWN_DEFAULT: ReflectedValue = ReflectedValue::Bool(true);

impl ClassDefinition {
    /// Build a bundled definition from a runtime description
    pub fn from_reflection(class: &ReflectedClass) -> ClassResult<Self> {
        let (namespace, name) = naming::split_qualified(&class.name);
        let kind = if class.is_interface {
            ClassKind::Interface
        } else {
            ClassKind::Class
        };

        let mut definition =
            ClassDefinition::new(namespace, name, kind).with_provenance(Provenance::Bundled);
        definition.set_final(class.is_final);
        definition.set_abstract(class.is_abstract);
        definition.set_extends(class.parent.clone());
        definition.set_interfaces(class.interfaces.clone());

        for reflected in &class.methods {
            let mut modifiers = Modifiers::new().with(Modifier::Public);
            if reflected.is_static {
                modifiers.insert(Modifier::Static);
            }
            if reflected.is_final {
                modifiers.insert(Modifier::Final);
            }
            if class.is_interface {
                modifiers.insert(Modifier::Abstract);
            }

            let parameters = reflected
                .parameters
                .iter()
                .map(|p| {
                    if p.optional {
                        let default = p.default.clone().unwrap_or(UNKNOWN_DEFAULT);
                        Parameter::optional(&p.name, default.to_default())
                    } else {
                        Parameter::required(&p.name)
                    }
                })
                .collect();

            let mut method = Method::new(&reflected.name, modifiers).with_parameters(parameters);
            method.is_bundled = true;
            definition.add_method(method)?;
        }

        for (constant, value) in &class.constants {
            let value = match value {
                ReflectedValue::Bool(b) => ConstantValue::Bool(*b),
                ReflectedValue::Int(i) => ConstantValue::Int(*i),
                ReflectedValue::Double(d) => ConstantValue::Double(*d),
                ReflectedValue::String(s) => ConstantValue::String(s.clone()),
                ReflectedValue::Null => ConstantValue::Null,
                other => {
                    return Err(ClassError::UnmappableConstantType {
                        class: class.name.clone(),
                        constant: constant.clone(),
                        kind: other.type_name().to_string(),
                        location: None,
                    })
                }
            };
            definition.add_constant(Constant::new(constant, value))?;
        }

        for reflected in &class.properties {
            let mut modifiers = Modifiers::new().with(reflected.visibility);
            if reflected.is_static {
                modifiers.insert(Modifier::Static);
            }
            definition.add_property(Property::new(&reflected.name, modifiers))?;
        }

        Ok(definition)
    }
}
