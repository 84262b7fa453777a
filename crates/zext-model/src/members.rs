//! Member tables: ordered, uniqueness-checked storage for properties,
//! constants and methods of one class.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::error::{ClassError, ClassResult, MemberKind, SourceLocation};
use crate::value::{ConstantValue, DefaultValue};

/// A declaration modifier, kept in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Static,
    Abstract,
    Final,
    Internal,
    Deprecated,
    Inline,
    Scoped,
}

impl Modifier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Static => "static",
            Modifier::Abstract => "abstract",
            Modifier::Final => "final",
            Modifier::Internal => "internal",
            Modifier::Deprecated => "deprecated",
            Modifier::Inline => "inline",
            Modifier::Scoped => "scoped",
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered modifier set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers(Vec<Modifier>);

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a modifier; repeated modifiers are kept once
    pub fn insert(&mut self, modifier: Modifier) {
        if !self.0.contains(&modifier) {
            self.0.push(modifier);
        }
    }

    pub fn with(mut self, modifier: Modifier) -> Self {
        self.insert(modifier);
        self
    }

    pub fn contains(&self, modifier: Modifier) -> bool {
        self.0.contains(&modifier)
    }

    pub fn iter(&self) -> impl Iterator<Item = Modifier> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Modifier> for Modifiers {
    fn from_iter<T: IntoIterator<Item = Modifier>>(iter: T) -> Self {
        let mut modifiers = Modifiers::new();
        for modifier in iter {
            modifiers.insert(modifier);
        }
        modifiers
    }
}

/// Anything stored in a [`MemberTable`]
pub trait Member {
    /// Table the member belongs to (used in duplicate errors)
    const KIND: MemberKind;
    /// Method names are compared case-insensitively, everything else exactly
    const CASE_INSENSITIVE: bool;

    fn name(&self) -> &str;
    fn location(&self) -> Option<&SourceLocation>;
}

/// Insertion-ordered member storage with the table's uniqueness rule
#[derive(Debug, Clone)]
pub struct MemberTable<T> {
    entries: IndexMap<String, Arc<T>, FxBuildHasher>,
}

impl<T> Default for MemberTable<T> {
    fn default() -> Self {
        Self {
            entries: IndexMap::default(),
        }
    }
}

impl<T: Member> MemberTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(name: &str) -> Cow<'_, str> {
        if T::CASE_INSENSITIVE {
            Cow::Owned(name.to_lowercase())
        } else {
            Cow::Borrowed(name)
        }
    }

    /// Insert a member, failing if its name is already taken
    pub fn insert(&mut self, member: T) -> ClassResult<Arc<T>> {
        let key = Self::key(member.name()).into_owned();
        if self.entries.contains_key(&key) {
            return Err(ClassError::DuplicateMember {
                kind: T::KIND,
                name: member.name().to_string(),
                location: member.location().cloned(),
            });
        }
        let member = Arc::new(member);
        self.entries.insert(key, Arc::clone(&member));
        Ok(member)
    }

    /// Replace an existing member in place, keeping its position
    pub fn replace(&mut self, member: T) -> Option<Arc<T>> {
        let key = Self::key(member.name()).into_owned();
        let slot = self.entries.get_mut(&key)?;
        Some(std::mem::replace(slot, Arc::new(member)))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<T>> {
        self.entries.get(Self::key(name).as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(Self::key(name).as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<T>> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A declared class property
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub modifiers: Modifiers,
    pub default: Option<DefaultValue>,
    pub doc_block: Option<String>,
    pub location: Option<SourceLocation>,
}

impl Property {
    pub fn new(name: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            name: name.into(),
            modifiers,
            default: None,
            doc_block: None,
            location: None,
        }
    }

    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_doc_block(mut self, doc_block: impl Into<String>) -> Self {
        self.doc_block = Some(doc_block.into());
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }

    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifier::Static)
    }

    /// Default has to be evaluated by a synthesized initializer
    pub fn needs_initializer(&self) -> bool {
        self.default
            .as_ref()
            .is_some_and(DefaultValue::needs_runtime_init)
    }
}

impl Member for Property {
    const KIND: MemberKind = MemberKind::Property;
    const CASE_INSENSITIVE: bool = false;

    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }
}

/// A declared class constant
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub value: ConstantValue,
    pub doc_block: Option<String>,
    pub location: Option<SourceLocation>,
}

impl Constant {
    pub fn new(name: impl Into<String>, value: ConstantValue) -> Self {
        Self {
            name: name.into(),
            value,
            doc_block: None,
            location: None,
        }
    }

    pub fn with_doc_block(mut self, doc_block: impl Into<String>) -> Self {
        self.doc_block = Some(doc_block.into());
        self
    }

    pub fn with_location(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

impl Member for Constant {
    const KIND: MemberKind = MemberKind::Constant;
    const CASE_INSENSITIVE: bool = false;

    fn name(&self) -> &str {
        &self.name
    }

    fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifiers_keep_order() {
        let modifiers = Modifiers::new()
            .with(Modifier::Protected)
            .with(Modifier::Static)
            .with(Modifier::Protected);
        let order: Vec<_> = modifiers.iter().collect();
        assert_eq!(order, vec![Modifier::Protected, Modifier::Static]);
    }

    #[test]
    fn test_property_names_are_exact() {
        let mut table = MemberTable::new();
        table
            .insert(Property::new("count", Modifiers::new().with(Modifier::Public)))
            .unwrap();
        // Case differs: a distinct property
        table
            .insert(Property::new("Count", Modifiers::new().with(Modifier::Public)))
            .unwrap();
        assert_eq!(table.len(), 2);

        let err = table
            .insert(Property::new("count", Modifiers::new()))
            .unwrap_err();
        assert!(matches!(
            err,
            ClassError::DuplicateMember { kind: MemberKind::Property, .. }
        ));
    }

    #[test]
    fn test_constant_duplicate() {
        let mut table = MemberTable::new();
        table.insert(Constant::new("MAX", ConstantValue::Int(10))).unwrap();
        let err = table
            .insert(Constant::new("MAX", ConstantValue::Int(11)))
            .unwrap_err();
        assert_eq!(err.to_string(), "Constant 'MAX' was defined more than one time");
    }

    #[test]
    fn test_insertion_order() {
        let mut table = MemberTable::new();
        for name in ["a", "b", "c"] {
            table.insert(Constant::new(name, ConstantValue::Null)).unwrap();
        }
        let names: Vec<_> = table.iter().map(|c| c.name.clone()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_array_default_needs_initializer() {
        let prop = Property::new("items", Modifiers::new().with(Modifier::Protected))
            .with_default(DefaultValue::Array(vec![]));
        assert!(prop.needs_initializer());
        let prop = Property::new("name", Modifiers::new()).with_default(DefaultValue::Null);
        assert!(!prop.needs_initializer());
    }
}
