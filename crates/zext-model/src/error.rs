//! Class model errors
//!
//! Every variant carries the declaration site it was raised for (when known);
//! the rendered message ends with ` in <file> on line <line>` in that case.

use std::fmt;
use thiserror::Error;

/// Result alias used throughout the class model
pub type ClassResult<T> = Result<T, ClassError>;

/// A declaration site: file plus line, echoed verbatim in error messages
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// Source file the declaration was parsed from
    pub file: String,
    /// 1-indexed line of the declaration
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

fn located(location: &Option<SourceLocation>) -> String {
    match location {
        Some(loc) => format!(" in {} on line {}", loc.file, loc.line),
        None => String::new(),
    }
}

fn currently_a_class(is_class: &bool, interface: &str) -> String {
    if *is_class {
        format!(". {} is currently a class", interface)
    } else {
        String::new()
    }
}

/// The three member tables of a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Property,
    Constant,
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Property => write!(f, "Property"),
            MemberKind::Constant => write!(f, "Constant"),
            MemberKind::Method => write!(f, "Method"),
        }
    }
}

/// Errors raised while populating, resolving, validating or emitting classes
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ClassError {
    /// A property, constant or method name was declared twice
    #[error("{kind} '{name}' was defined more than one time{}", located(.location))]
    DuplicateMember {
        /// Which member table rejected the insertion
        kind: MemberKind,
        /// Name of the member as declared
        name: String,
        location: Option<SourceLocation>,
    },

    /// An update targeted a method that was never declared
    #[error("Method '{name}' does not exist{}", located(.location))]
    UndefinedMethod {
        name: String,
        location: Option<SourceLocation>,
    },

    /// A concrete class lacks a method required by one of its interfaces
    #[error(
        "Class {class} must implement a method called: \"{method}\" as requirement of interface: \"{interface}\"{}",
        located(.location)
    )]
    MissingMethod {
        class: String,
        method: String,
        interface: String,
        location: Option<SourceLocation>,
    },

    /// A concrete class implements an interface method with incompatible arity
    #[error(
        "Method {class}::{method}() does not have the same number of required parameters in interface: \"{interface}\"{}",
        located(.location)
    )]
    ArityMismatch {
        class: String,
        method: String,
        interface: String,
        location: Option<SourceLocation>,
    },

    /// An `implements` target is not a known interface
    #[error(
        "Cannot locate interface {interface} when implementing interfaces on {class}{}{}",
        currently_a_class(.is_class, .interface),
        located(.location)
    )]
    UnresolvableInterface {
        interface: String,
        class: String,
        /// The name resolved, but to a class
        is_class: bool,
        location: Option<SourceLocation>,
    },

    /// An interface declared a class as its supertype
    #[error("Interface {class} cannot extend {supertype} because it is a class{}", located(.location))]
    InvalidSupertype {
        class: String,
        supertype: String,
        location: Option<SourceLocation>,
    },

    /// A reflected constant has a value kind with no native mapping
    #[error("Cannot parse constant type '{kind}' of {class}::{constant}{}", located(.location))]
    UnmappableConstantType {
        class: String,
        constant: String,
        /// Runtime type name of the offending value (e.g. "array")
        kind: String,
        location: Option<SourceLocation>,
    },

    /// An external class entry was requested without a compilation context
    #[error("A compilation context is required to reference external class {class}{}", located(.location))]
    MissingCompilationContext {
        class: String,
        location: Option<SourceLocation>,
    },

    /// Two declarations share one qualified name
    #[error("Class {name} was declared more than one time{}", located(.location))]
    DuplicateClass {
        name: String,
        location: Option<SourceLocation>,
    },

    /// Two distinct qualified names map to the same native symbol
    #[error("Classes {first} and {second} both map to the native symbol '{symbol}'{}", located(.location))]
    SymbolCollision {
        first: String,
        second: String,
        symbol: String,
        location: Option<SourceLocation>,
    },

    /// The runtime could not describe a builtin class
    #[error("Cannot reflect runtime class {class}: {message}{}", located(.location))]
    Reflection {
        class: String,
        message: String,
        location: Option<SourceLocation>,
    },
}

impl ClassError {
    /// Declaration site carried by this error, if any
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            ClassError::DuplicateMember { location, .. }
            | ClassError::UndefinedMethod { location, .. }
            | ClassError::MissingMethod { location, .. }
            | ClassError::ArityMismatch { location, .. }
            | ClassError::UnresolvableInterface { location, .. }
            | ClassError::InvalidSupertype { location, .. }
            | ClassError::UnmappableConstantType { location, .. }
            | ClassError::MissingCompilationContext { location, .. }
            | ClassError::DuplicateClass { location, .. }
            | ClassError::SymbolCollision { location, .. }
            | ClassError::Reflection { location, .. } => location.as_ref(),
        }
    }

    /// Attach a declaration site unless the error already carries one
    pub fn or_located(mut self, site: Option<&SourceLocation>) -> Self {
        let slot = match &mut self {
            ClassError::DuplicateMember { location, .. }
            | ClassError::UndefinedMethod { location, .. }
            | ClassError::MissingMethod { location, .. }
            | ClassError::ArityMismatch { location, .. }
            | ClassError::UnresolvableInterface { location, .. }
            | ClassError::InvalidSupertype { location, .. }
            | ClassError::UnmappableConstantType { location, .. }
            | ClassError::MissingCompilationContext { location, .. }
            | ClassError::DuplicateClass { location, .. }
            | ClassError::SymbolCollision { location, .. }
            | ClassError::Reflection { location, .. } => location,
        };
        if slot.is_none() {
            *slot = site.cloned();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_without_location() {
        let err = ClassError::DuplicateMember {
            kind: MemberKind::Property,
            name: "count".to_string(),
            location: None,
        };
        assert_eq!(err.to_string(), "Property 'count' was defined more than one time");
    }

    #[test]
    fn test_message_with_location() {
        let err = ClassError::DuplicateMember {
            kind: MemberKind::Method,
            name: "run".to_string(),
            location: Some(SourceLocation::new("app/task.zep", 12)),
        };
        assert_eq!(
            err.to_string(),
            "Method 'run' was defined more than one time in app/task.zep on line 12"
        );
    }

    #[test]
    fn test_unresolvable_interface_names_class() {
        let err = ClassError::UnresolvableInterface {
            interface: "App\\Shape".to_string(),
            class: "App\\Circle".to_string(),
            is_class: true,
            location: None,
        };
        assert_eq!(
            err.to_string(),
            "Cannot locate interface App\\Shape when implementing interfaces on App\\Circle. App\\Shape is currently a class"
        );
    }

    #[test]
    fn test_or_located_keeps_existing_site() {
        let first = SourceLocation::new("a.zep", 1);
        let second = SourceLocation::new("b.zep", 2);
        let err = ClassError::UndefinedMethod {
            name: "x".to_string(),
            location: Some(first.clone()),
        }
        .or_located(Some(&second));
        assert_eq!(err.location(), Some(&first));

        let err = ClassError::UndefinedMethod {
            name: "x".to_string(),
            location: None,
        }
        .or_located(Some(&second));
        assert_eq!(err.location(), Some(&second));
    }
}
