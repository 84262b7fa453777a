//! Class and interface definitions
//!
//! A [`ClassDefinition`] aggregates the three member tables of a class or
//! interface together with its declaration metadata. Supertype and interface
//! links are stored by name and resolved through the [`ClassRegistry`] on
//! first access; the resolved [`ClassId`] is cached but never owns the target.
//!
//! Inheritance walks assume the class graph is acyclic, which the source
//! language guarantees. A cyclic graph is not detected here.

use std::sync::{Arc, OnceLock};

use tracing::{debug, trace};

use crate::error::{ClassError, ClassResult, SourceLocation};
use crate::members::{Constant, MemberTable, Modifier, Modifiers, Property};
use crate::metaphone::metaphone;
use crate::method::{Method, StatementsBlock};
use crate::naming;
use crate::registry::{ClassId, ClassRegistry};

/// Class or interface; both share one record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
}

/// Where a definition comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Declared in the compilation unit and emitted by it
    UserDefined,
    /// Compiled by another extension; referenced through its header
    External,
    /// Provided by the host runtime; only ever queried
    Bundled,
}

/// Receives headers an emitted class depends on
pub trait HeaderSink {
    fn add_external_header(&mut self, header: String);
}

/// Metadata of one class or interface
#[derive(Debug)]
pub struct ClassDefinition {
    namespace: String,
    name: String,
    kind: ClassKind,
    is_final: bool,
    is_abstract: bool,
    provenance: Provenance,
    extends: Option<String>,
    interfaces: Vec<String>,
    properties: MemberTable<Property>,
    constants: MemberTable<Constant>,
    methods: MemberTable<Method>,
    dependency_rank: usize,
    doc_block: Option<String>,
    location: Option<SourceLocation>,
    extends_id: OnceLock<ClassId>,
    interface_ids: OnceLock<Vec<ClassId>>,
}

impl ClassDefinition {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, kind: ClassKind) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            kind,
            is_final: false,
            is_abstract: false,
            provenance: Provenance::UserDefined,
            extends: None,
            interfaces: Vec::new(),
            properties: MemberTable::new(),
            constants: MemberTable::new(),
            methods: MemberTable::new(),
            dependency_rank: 0,
            doc_block: None,
            location: None,
            extends_id: OnceLock::new(),
            interface_ids: OnceLock::new(),
        }
    }

    pub fn class(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, ClassKind::Class)
    }

    pub fn interface(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(namespace, name, ClassKind::Interface)
    }

    // ========================================================================
    // Declaration metadata
    // ========================================================================

    pub fn with_extends(mut self, name: impl Into<String>) -> Self {
        self.set_extends(Some(name.into()));
        self
    }

    pub fn set_extends(&mut self, name: Option<String>) {
        self.extends = name;
        self.extends_id = OnceLock::new();
    }

    pub fn with_interfaces<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_interfaces(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn set_interfaces(&mut self, names: Vec<String>) {
        self.interfaces = names;
        self.interface_ids = OnceLock::new();
    }

    pub fn with_final(mut self) -> Self {
        self.is_final = true;
        self
    }

    pub fn with_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn set_final(&mut self, is_final: bool) {
        self.is_final = is_final;
    }

    pub fn set_abstract(&mut self, is_abstract: bool) {
        self.is_abstract = is_abstract;
    }

    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = provenance;
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

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Class name without its namespace
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    pub fn is_class(&self) -> bool {
        self.kind == ClassKind::Class
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    pub fn is_bundled(&self) -> bool {
        self.provenance == Provenance::Bundled
    }

    pub fn is_external(&self) -> bool {
        self.provenance == Provenance::External
    }

    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    pub fn doc_block(&self) -> Option<&str> {
        self.doc_block.as_deref()
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    pub fn dependency_rank(&self) -> usize {
        self.dependency_rank
    }

    pub fn increase_dependency_rank(&mut self, amount: usize) {
        self.dependency_rank += amount;
    }

    // ========================================================================
    // Names and native symbols
    // ========================================================================

    /// `Namespace\Name`
    pub fn complete_name(&self) -> String {
        naming::qualify(&self.namespace, &self.name)
    }

    /// Namespace with separators replaced by underscores
    pub fn c_namespace(&self) -> String {
        naming::c_namespace(&self.namespace)
    }

    /// Namespace escaped for a C string literal
    pub fn escaped_namespace(&self) -> String {
        naming::escape(&self.namespace)
    }

    /// Name used by `ZEPHIR_INIT_CLASS` and `PHP_METHOD`
    pub fn init_class_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}_{}", self.c_namespace(), self.name)
        }
    }

    pub fn symbol_fragment(&self) -> String {
        naming::symbol_fragment(&self.namespace, &self.name)
    }

    /// `zend_class_entry` variable holding the registered class
    pub fn class_entry_symbol(&self) -> String {
        format!("{}_ce", self.symbol_fragment())
    }

    pub fn method_entry_symbol(&self) -> String {
        format!("{}_method_entry", self.symbol_fragment())
    }

    /// Lowercased native name without the project namespace prefix
    pub fn short_c_name(&self, project_namespace: &str) -> String {
        let fragment = self.symbol_fragment();
        let prefix = format!("{}_", naming::c_namespace(project_namespace).to_lowercase());
        fragment.replacen(&prefix, "", 1)
    }

    /// Location of the header declaring an external class
    pub fn external_header(&self) -> String {
        let root = self.namespace.split(naming::NAMESPACE_SEPARATOR).next().unwrap_or_default();
        let path = self.namespace.replace(naming::NAMESPACE_SEPARATOR, "/");
        format!("ext/{}/{}/{}.zep", root, path, self.name).to_lowercase()
    }

    /// Class entry symbol; external classes also register their header
    pub fn class_entry(&self, headers: Option<&mut dyn HeaderSink>) -> ClassResult<String> {
        if self.is_external() {
            let Some(sink) = headers else {
                return Err(ClassError::MissingCompilationContext {
                    class: self.complete_name(),
                    location: self.location.clone(),
                });
            };
            sink.add_external_header(self.external_header());
        }
        Ok(self.class_entry_symbol())
    }

    // ========================================================================
    // Members
    // ========================================================================

    pub fn add_property(&mut self, property: Property) -> ClassResult<()> {
        self.properties.insert(property)?;
        Ok(())
    }

    pub fn add_constant(&mut self, constant: Constant) -> ClassResult<()> {
        self.constants.insert(constant)?;
        Ok(())
    }

    pub fn add_method(&mut self, method: Method) -> ClassResult<()> {
        self.methods.insert(method)?;
        Ok(())
    }

    /// Replace an existing method, keeping its position
    pub fn update_method(&mut self, method: Method) -> ClassResult<()> {
        let name = method.name.clone();
        let location = method.location.clone();
        match self.methods.replace(method) {
            Some(_) => Ok(()),
            None => Err(ClassError::UndefinedMethod { name, location }),
        }
    }

    pub fn properties(&self) -> &MemberTable<Property> {
        &self.properties
    }

    pub fn constants(&self) -> &MemberTable<Constant> {
        &self.constants
    }

    pub fn methods(&self) -> &MemberTable<Method> {
        &self.methods
    }

    // ========================================================================
    // Resolution
    // ========================================================================

    /// Resolve the supertype through the registry, caching a hit
    pub fn parent_id(&self, registry: &ClassRegistry) -> Option<ClassId> {
        if let Some(id) = self.extends_id.get() {
            return Some(*id);
        }
        let name = self.extends.as_deref()?;
        match registry.resolve(name) {
            Ok(Some(id)) => {
                let _ = self.extends_id.set(id);
                Some(id)
            }
            Ok(None) => {
                trace!(class = %self.complete_name(), supertype = name, "supertype is not known");
                None
            }
            Err(err) => {
                debug!(class = %self.complete_name(), supertype = name, error = %err, "supertype lookup failed");
                None
            }
        }
    }

    /// Resolved interfaces in declaration order; unknown names are skipped
    pub fn interface_ids(&self, registry: &ClassRegistry) -> Vec<ClassId> {
        if let Some(ids) = self.interface_ids.get() {
            return ids.clone();
        }
        let mut ids = Vec::with_capacity(self.interfaces.len());
        let mut complete = true;
        for name in &self.interfaces {
            match registry.resolve(name) {
                Ok(Some(id)) => ids.push(id),
                Ok(None) => complete = false,
                Err(err) => {
                    debug!(class = %self.complete_name(), interface = %name, error = %err, "interface lookup failed");
                    complete = false;
                }
            }
        }
        if complete {
            let _ = self.interface_ids.set(ids.clone());
        }
        ids
    }

    /// Supertype and interfaces that take part in compile ordering
    pub fn dependencies(&self, registry: &ClassRegistry) -> Vec<ClassId> {
        let mut dependencies = Vec::new();
        let candidates = self.parent_id(registry).into_iter().chain(self.interface_ids(registry));
        for id in candidates {
            if !registry.get(id).read().is_bundled() {
                dependencies.push(id);
            }
        }
        dependencies
    }

    /// Visit supertypes from the closest up, stopping at the first hit
    fn find_in_ancestors<T>(
        &self,
        registry: &ClassRegistry,
        mut probe: impl FnMut(&ClassDefinition) -> Option<T>,
    ) -> Option<T> {
        let mut next = self.parent_id(registry);
        while let Some(id) = next {
            let handle = registry.get(id);
            let ancestor = handle.read();
            if let Some(found) = probe(&ancestor) {
                return Some(found);
            }
            next = ancestor.parent_id(registry);
        }
        None
    }

    pub fn has_property(&self, name: &str, registry: &ClassRegistry) -> bool {
        self.get_property(name, registry).is_some()
    }

    /// Most-derived property called `name`
    pub fn get_property(&self, name: &str, registry: &ClassRegistry) -> Option<Arc<Property>> {
        if let Some(property) = self.properties.get(name) {
            return Some(Arc::clone(property));
        }
        self.find_in_ancestors(registry, |ancestor| ancestor.properties.get(name).cloned())
    }

    pub fn has_constant(&self, name: &str, registry: &ClassRegistry) -> bool {
        self.get_constant(name, registry).is_some()
    }

    /// Most-derived constant called `name`; interface constants are
    /// consulted once the class chain is exhausted
    pub fn get_constant(&self, name: &str, registry: &ClassRegistry) -> Option<Arc<Constant>> {
        if let Some(constant) = self.constants.get(name) {
            return Some(Arc::clone(constant));
        }
        if let Some(constant) =
            self.find_in_ancestors(registry, |ancestor| ancestor.constants.get(name).cloned())
        {
            return Some(constant);
        }
        if let Some(constant) = self.constant_from_interfaces(name, registry) {
            return Some(constant);
        }
        self.find_in_ancestors(registry, |ancestor| {
            ancestor.constant_from_interfaces(name, registry)
        })
    }

    fn constant_from_interfaces(&self, name: &str, registry: &ClassRegistry) -> Option<Arc<Constant>> {
        for id in self.interface_ids(registry) {
            let handle = registry.get(id);
            let interface = handle.read();
            if let Some(constant) = interface.get_constant(name, registry) {
                return Some(constant);
            }
        }
        None
    }

    /// Whether the class or any supertype declares `name`.
    ///
    /// Supertypes provided by the runtime are imported on demand; if the
    /// runtime cannot describe one the method is simply reported missing.
    pub fn has_method(&self, name: &str, registry: &ClassRegistry) -> bool {
        if self.methods.contains(name) {
            return true;
        }
        self.find_in_ancestors(registry, |ancestor| ancestor.methods.contains(name).then_some(()))
            .is_some()
    }

    /// Most-derived method called `name` (case-insensitive)
    pub fn get_method(
        &self,
        name: &str,
        registry: &ClassRegistry,
        include_inherited: bool,
    ) -> Option<Arc<Method>> {
        if let Some(method) = self.methods.get(name) {
            return Some(Arc::clone(method));
        }
        if !include_inherited {
            return None;
        }
        self.find_in_ancestors(registry, |ancestor| ancestor.methods.get(name).cloned())
    }

    /// Declared method that sounds like `name`, for "did you mean" hints
    pub fn suggest_method_name(&self, name: &str, registry: &ClassRegistry) -> Option<String> {
        let key = metaphone(name);
        let sounds_alike = |class: &ClassDefinition| {
            class
                .methods
                .iter()
                .find(|method| metaphone(&method.name) == key)
                .map(|method| method.name.clone())
        };
        sounds_alike(self).or_else(|| self.find_in_ancestors(registry, sounds_alike))
    }

    // ========================================================================
    // Initializers
    // ========================================================================

    pub fn init_method_name(&self) -> String {
        format!("zephir_init_properties_{}", self.init_class_name())
    }

    pub fn static_init_method_name(&self) -> String {
        format!("zephir_init_static_properties_{}", self.init_class_name())
    }

    /// Synthesized instance initializer, if any
    pub fn init_method(&self) -> Option<Arc<Method>> {
        self.methods.get(&self.init_method_name()).cloned()
    }

    /// Synthesized static initializer, if any
    pub fn static_init_method(&self) -> Option<Arc<Method>> {
        self.methods.get(&self.static_init_method_name()).cloned()
    }

    /// Add the instance initializer; an empty block adds nothing
    pub fn add_init_method(&mut self, block: StatementsBlock) -> ClassResult<()> {
        if block.is_empty() {
            return Ok(());
        }
        let mut method = Method::new(self.init_method_name(), Modifiers::new().with(Modifier::Internal))
            .with_body(block);
        method.is_initializer = true;
        self.add_method(method)
    }

    /// Add the static initializer; an empty block adds nothing
    pub fn add_static_init_method(&mut self, block: StatementsBlock) -> ClassResult<()> {
        if block.is_empty() {
            return Ok(());
        }
        let modifiers = Modifiers::new().with(Modifier::Internal).with(Modifier::Static);
        let mut method = Method::new(self.static_init_method_name(), modifiers).with_body(block);
        method.is_initializer = true;
        self.add_method(method)
    }
}
