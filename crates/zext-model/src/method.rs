//! Methods, their parameters, return type hints and bodies

use crate::error::{MemberKind, SourceLocation};
use crate::members::{Member, Modifier, Modifiers};
use crate::value::DefaultValue;

/// Declared data type of a parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamType {
    /// Untyped (`var`) parameter
    Variable,
    Bool,
    Int,
    Double,
    String,
    Array,
    Callable,
    /// Object, optionally restricted to a class
    Object(Option<String>),
}

/// One method parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub is_const: bool,
    pub data_type: ParamType,
    pub mandatory: bool,
    pub default: Option<DefaultValue>,
}

impl Parameter {
    /// A mandatory untyped parameter
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_const: false,
            data_type: ParamType::Variable,
            mandatory: true,
            default: None,
        }
    }

    /// An optional untyped parameter with a default
    pub fn optional(name: impl Into<String>, default: DefaultValue) -> Self {
        Self {
            name: name.into(),
            is_const: false,
            data_type: ParamType::Variable,
            mandatory: false,
            default: Some(default),
        }
    }

    pub fn typed(mut self, data_type: ParamType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn constant(mut self) -> Self {
        self.is_const = true;
        self
    }

    /// A `null` default makes the parameter nullable
    pub fn allows_null(&self) -> bool {
        self.default.as_ref().is_some_and(DefaultValue::is_null)
    }
}

/// A single return type hint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Void,
    Null,
    Bool,
    Int,
    Double,
    String,
    Array,
    Callable,
    Iterable,
    Object(Option<String>),
    /// Any value; makes the return type undetermined
    Variable,
}

/// The return type hints declared on a method
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReturnTypes(Vec<ReturnType>);

impl ReturnTypes {
    pub fn new(types: Vec<ReturnType>) -> Self {
        Self(types)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReturnType> {
        self.0.iter()
    }

    pub fn is_void(&self) -> bool {
        !self.0.is_empty() && self.0.iter().all(|t| *t == ReturnType::Void)
    }

    pub fn allows_null(&self) -> bool {
        self.0.contains(&ReturnType::Null)
    }

    /// Every hint is concrete and at most one class is named
    pub fn is_determined(&self) -> bool {
        if self.0.is_empty() {
            return false;
        }
        if self.is_void() {
            return true;
        }
        if self.0.contains(&ReturnType::Variable) {
            return false;
        }
        let classes = self
            .0
            .iter()
            .filter(|t| matches!(t, ReturnType::Object(Some(_))))
            .count();
        classes <= 1
    }

    /// All non-null hints collapse onto one native type
    pub fn are_compatible(&self) -> bool {
        if self.is_void() {
            return true;
        }
        let mut distinct: Vec<&ReturnType> = Vec::new();
        for ty in self.0.iter().filter(|t| **t != ReturnType::Null) {
            if !distinct.contains(&ty) {
                distinct.push(ty);
            }
        }
        distinct.len() == 1
    }

    /// The one non-null hint when the hints are compatible
    pub fn single(&self) -> Option<&ReturnType> {
        if !self.are_compatible() {
            return None;
        }
        self.0.iter().find(|t| **t != ReturnType::Null)
    }
}

/// A statement of a method body as handed over by the body compiler's front end
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Assign a property's default at construction time
    InitializeProperty {
        property: String,
        is_static: bool,
        value: DefaultValue,
    },
    /// Already-compiled native code, emitted verbatim
    Raw(String),
}

/// Ordered statements of a method body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementsBlock {
    statements: Vec<Statement>,
}

impl StatementsBlock {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn push(&mut self, statement: Statement) {
        self.statements.push(statement);
    }

    /// Put `other`'s statements before this block's own
    pub fn prepend(&mut self, other: &StatementsBlock) {
        let mut merged = other.statements.clone();
        merged.append(&mut self.statements);
        self.statements = merged;
    }

    pub fn iter(&self) -> impl Iterator<Item = &Statement> {
        self.statements.iter()
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

/// A declared or synthesized method
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub modifiers: Modifiers,
    pub parameters: Vec<Parameter>,
    pub return_types: ReturnTypes,
    pub body: StatementsBlock,
    pub doc_block: Option<String>,
    pub location: Option<SourceLocation>,
    /// Synthesized property initializer
    pub is_initializer: bool,
    /// Imported from the runtime, never emitted
    pub is_bundled: bool,
}

impl Method {
    pub fn new(name: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            name: name.into(),
            modifiers,
            parameters: Vec::new(),
            return_types: ReturnTypes::default(),
            body: StatementsBlock::default(),
            doc_block: None,
            location: None,
            is_initializer: false,
            is_bundled: false,
        }
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_return_types(mut self, types: Vec<ReturnType>) -> Self {
        self.return_types = ReturnTypes::new(types);
        self
    }

    pub fn with_body(mut self, body: StatementsBlock) -> Self {
        self.body = body;
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

    pub fn is_abstract(&self) -> bool {
        self.modifiers.contains(Modifier::Abstract)
    }

    pub fn is_final(&self) -> bool {
        self.modifiers.contains(Modifier::Final)
    }

    pub fn is_internal(&self) -> bool {
        self.modifiers.contains(Modifier::Internal)
    }

    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    pub fn required_parameter_count(&self) -> usize {
        self.parameters.iter().filter(|p| p.mandatory).count()
    }

    pub fn is_return_type_determined(&self) -> bool {
        self.return_types.is_determined()
    }

    pub fn are_return_types_compatible(&self) -> bool {
        self.return_types.are_compatible()
    }
}

impl Member for Method {
    const KIND: MemberKind = MemberKind::Method;
    const CASE_INSENSITIVE: bool = true;

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
    use crate::members::MemberTable;

    #[test]
    fn test_method_names_are_case_insensitive() {
        let mut table = MemberTable::new();
        table
            .insert(Method::new("getName", Modifiers::new().with(Modifier::Public)))
            .unwrap();
        assert!(table.contains("GETNAME"));
        assert!(table.insert(Method::new("getname", Modifiers::new())).is_err());
    }

    #[test]
    fn test_parameter_counts() {
        let method = Method::new("bar", Modifiers::new()).with_parameters(vec![
            Parameter::required("a"),
            Parameter::optional("b", DefaultValue::Null),
        ]);
        assert_eq!(method.parameter_count(), 2);
        assert_eq!(method.required_parameter_count(), 1);
        assert!(method.parameters[1].allows_null());
    }

    #[test]
    fn test_return_type_determination() {
        assert!(!ReturnTypes::default().is_determined());
        assert!(ReturnTypes::new(vec![ReturnType::Void]).is_determined());
        assert!(ReturnTypes::new(vec![ReturnType::Array]).is_determined());
        assert!(!ReturnTypes::new(vec![ReturnType::Variable]).is_determined());
        assert!(!ReturnTypes::new(vec![
            ReturnType::Object(Some("A".into())),
            ReturnType::Object(Some("B".into())),
        ])
        .is_determined());
    }

    #[test]
    fn test_return_type_compatibility() {
        let nullable = ReturnTypes::new(vec![ReturnType::String, ReturnType::Null]);
        assert!(nullable.are_compatible());
        assert!(nullable.allows_null());
        assert_eq!(nullable.single(), Some(&ReturnType::String));

        let mixed = ReturnTypes::new(vec![ReturnType::Int, ReturnType::String]);
        assert!(!mixed.are_compatible());
        assert_eq!(mixed.single(), None);

        assert!(!ReturnTypes::new(vec![ReturnType::Null]).are_compatible());
    }

    #[test]
    fn test_prepend_statements() {
        let mut child = StatementsBlock::new(vec![Statement::Raw("child".into())]);
        let parent = StatementsBlock::new(vec![Statement::Raw("parent".into())]);
        child.prepend(&parent);
        let order: Vec<_> = child.iter().cloned().collect();
        assert_eq!(
            order,
            vec![Statement::Raw("parent".into()), Statement::Raw("child".into())]
        );
    }
}
