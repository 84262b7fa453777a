//! Zext Compiler - Class Registration Code Generation
//!
//! Turns the class definitions of an extension into the C registration code
//! and header declarations a Zend engine extension is built from.
//!
//! Compilation runs in two phases. Declarations are collected into a shared
//! [`ClassRegistry`], possibly from several threads. Compiling then ranks the
//! classes so supertypes come first, synthesizes property initializers and
//! emits each class with its own [`CompilationContext`].

pub mod arginfo;
pub mod backend;
pub mod body;
pub mod class_entry;
pub mod config;
pub mod context;
pub mod error;
pub mod header;
pub mod initializer;
pub mod printer;
pub mod registration;
pub mod unit;

pub use backend::{Backend, BackendKind, ZendEngine2, ZendEngine3};
pub use body::{BodyCompiler, PlainBodyCompiler};
pub use class_entry::ExternalEntry;
pub use config::{ConfigError, ExtensionConfig};
pub use context::{CompilationContext, HeadersManager};
pub use error::{CompileError, CompileResult};
pub use header::HeaderEmitter;
pub use initializer::InitializerSynthesizer;
pub use registration::RegistrationEmitter;
pub use unit::{CompiledClass, CompiledUnit};

use std::path::Path;

use parking_lot::Mutex;
use tracing::{debug, warn};
use zext_checker::DependencyRanker;
use zext_model::{ClassDefinition, ClassId, ClassRegistry, Provenance};

/// Main compiler entry point
pub struct Compiler {
    config: ExtensionConfig,
    backend: Box<dyn Backend>,
    registry: ClassRegistry,
    body: Box<dyn BodyCompiler>,
    /// Ranked classes; ranks accumulate so each class is ranked once
    order: Mutex<Vec<ClassId>>,
}

impl Compiler {
    pub fn new(config: ExtensionConfig) -> CompileResult<Self> {
        Self::with_registry(config, ClassRegistry::new())
    }

    /// Compiler over a registry with a custom runtime reflector
    pub fn with_registry(config: ExtensionConfig, registry: ClassRegistry) -> CompileResult<Self> {
        config.validate()?;
        Ok(Self {
            backend: config.backend.backend(),
            config,
            registry,
            body: Box::new(PlainBodyCompiler),
            order: Mutex::new(Vec::new()),
        })
    }

    /// Load the configuration file and create a compiler for it
    pub fn from_config_file(path: &Path) -> CompileResult<Self> {
        Self::new(ExtensionConfig::from_file(path)?)
    }

    pub fn with_body_compiler(mut self, body: impl BodyCompiler + 'static) -> Self {
        self.body = Box::new(body);
        self
    }

    pub fn config(&self) -> &ExtensionConfig {
        &self.config
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Declare a class; safe to call from several threads
    pub fn declare(&self, definition: ClassDefinition) -> CompileResult<ClassId> {
        Ok(self.registry.declare(definition)?)
    }

    /// Compile every declared class, stopping at the first failure
    pub fn compile(&self) -> CompileResult<CompiledUnit> {
        let order = self.prepare();
        let synthesizer = InitializerSynthesizer::new(&self.registry);
        for &id in &order {
            synthesizer.synthesize(id)?;
        }

        let mut classes = Vec::with_capacity(order.len());
        for id in order {
            classes.push(self.emit(id)?);
        }
        debug!(classes = classes.len(), "compiled extension classes");
        Ok(CompiledUnit::new(classes))
    }

    /// Compile every declared class, carrying on past failures.
    ///
    /// Results come in compile order, keyed by qualified class name.
    pub fn compile_each(&self) -> Vec<(String, CompileResult<CompiledClass>)> {
        let order = self.prepare();
        let synthesizer = InitializerSynthesizer::new(&self.registry);
        order
            .into_iter()
            .map(|id| {
                let name = self.registry.get(id).read().complete_name();
                let result = synthesizer
                    .synthesize(id)
                    .map_err(CompileError::from)
                    .and_then(|()| self.emit(id));
                if let Err(err) = &result {
                    warn!(class = %name, error = %err, "class failed to compile");
                }
                (name, result)
            })
            .collect()
    }

    /// Compile a single declared class
    pub fn compile_class(&self, name: &str) -> CompileResult<CompiledClass> {
        let id = self
            .registry
            .lookup(name)
            .filter(|id| self.registry.get(*id).read().provenance() == Provenance::UserDefined)
            .ok_or_else(|| CompileError::UnknownClass {
                name: name.to_string(),
            })?;

        InitializerSynthesizer::new(&self.registry).synthesize(id)?;
        self.emit(id)
    }

    /// Rank classes declared since the last call and return the compile order
    fn prepare(&self) -> Vec<ClassId> {
        let mut order = self.order.lock();
        let pending: Vec<ClassId> = self
            .registry
            .user_ids()
            .into_iter()
            .filter(|id| !order.contains(id))
            .collect();
        if !pending.is_empty() {
            let ranked = DependencyRanker::new(&self.registry).rank(&pending);
            order.extend(ranked);
        }
        order.clone()
    }

    fn emit(&self, id: ClassId) -> CompileResult<CompiledClass> {
        let handle = self.registry.get(id);
        let class = handle.read();
        let name = class.complete_name();

        let mut ctx = CompilationContext::new(&self.config, self.backend.as_ref(), &self.registry, name.clone());
        RegistrationEmitter::new(self.body.as_ref()).emit(&class, &mut ctx)?;
        let header = HeaderEmitter::new(&self.config, self.backend.as_ref()).emit(&class);

        Ok(CompiledClass {
            id,
            name,
            class_entry: class.class_entry_symbol(),
            source: ctx.printer.into_output(),
            header,
            headers: ctx.headers.into_vec(),
            static_initializer: class.static_init_method().map(|method| method.name.clone()),
        })
    }
}
