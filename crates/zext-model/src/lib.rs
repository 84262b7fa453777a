//! Zext Class Model
//!
//! Metadata model for the classes and interfaces an extension declares.
//!
//! This crate provides:
//! - Ordered member tables for properties, constants and methods
//! - Class and interface definitions with inherited member lookup
//! - A shared registry that owns every definition and imports runtime classes
//! - Native naming helpers (class entries, method entries, headers)
//!
//! # Usage
//!
//! ```ignore
//! use zext_model::{ClassDefinition, ClassRegistry, Method, Modifier, Modifiers};
//!
//! let registry = ClassRegistry::new();
//! let mut shape = ClassDefinition::class("App", "Shape");
//! shape.add_method(Method::new("area", Modifiers::new().with(Modifier::Public)))?;
//! let id = registry.declare(shape)?;
//!
//! let circle = ClassDefinition::class("App", "Circle").with_extends("App\\Shape");
//! let circle = registry.declare(circle)?;
//! assert!(registry.get(circle).read().has_method("AREA", &registry));
//! ```

pub mod definition;
pub mod error;
pub mod members;
pub mod metaphone;
pub mod method;
pub mod naming;
pub mod reflection;
pub mod registry;
pub mod value;

pub use definition::{ClassDefinition, ClassKind, HeaderSink, Provenance};
pub use error::{ClassError, ClassResult, MemberKind, SourceLocation};
pub use members::{Constant, Member, MemberTable, Modifier, Modifiers, Property};
pub use method::{Method, ParamType, Parameter, ReturnType, ReturnTypes, Statement, StatementsBlock};
pub use reflection::{
    BuiltinCatalog, ReflectedClass, ReflectedMethod, ReflectedParameter, ReflectedProperty,
    ReflectedValue, ReflectionError, RuntimeReflector,
};
pub use registry::{ClassHandle, ClassId, ClassRegistry};
pub use value::{ConstantKind, ConstantValue, DefaultValue};
