//! Per-class compilation state

use indexmap::IndexSet;
use zext_model::{ClassRegistry, HeaderSink};

use crate::backend::Backend;
use crate::config::ExtensionConfig;
use crate::printer::CodePrinter;

/// Extra headers a generated file has to include, in first-use order
#[derive(Debug, Default, Clone)]
pub struct HeadersManager {
    headers: IndexSet<String>,
}

impl HeadersManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header (without the `.h` extension); repeats are ignored
    pub fn add(&mut self, header: impl Into<String>) {
        self.headers.insert(header.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.headers.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.headers.into_iter().collect()
    }
}

impl HeaderSink for HeadersManager {
    fn add_external_header(&mut self, header: String) {
        self.add(header);
    }
}

/// Everything emission of one class needs; never shared between classes
pub struct CompilationContext<'a> {
    pub config: &'a ExtensionConfig,
    pub backend: &'a dyn Backend,
    pub registry: &'a ClassRegistry,
    /// Qualified name of the class being compiled
    pub class_name: String,
    pub printer: CodePrinter,
    pub headers: HeadersManager,
}

impl<'a> CompilationContext<'a> {
    pub fn new(
        config: &'a ExtensionConfig,
        backend: &'a dyn Backend,
        registry: &'a ClassRegistry,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            config,
            backend,
            registry,
            class_name: class_name.into(),
            printer: CodePrinter::new(),
            headers: HeadersManager::new(),
        }
    }
}
