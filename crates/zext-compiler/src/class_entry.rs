//! Class entry expressions for classes referenced from generated code

use tracing::trace;
use zext_model::{naming, ClassResult};

use crate::context::CompilationContext;

/// A class referenced by name (a supertype, an implemented interface, a
/// constant holder) whose `zend_class_entry` the generated code needs
#[derive(Debug, Clone)]
pub struct ExternalEntry {
    name: String,
}

impl ExternalEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// C expression evaluating to the class entry.
    ///
    /// Compiled classes use their own symbol, runtime classes the engine's
    /// well-known entries, and anything else a lookup at load time.
    pub fn resolve(&self, ctx: &mut CompilationContext<'_>) -> ClassResult<String> {
        if let Some(handle) = ctx.registry.find(&self.name) {
            let definition = handle.read();
            if !definition.is_bundled() {
                return definition.class_entry(Some(&mut ctx.headers));
            }
        }

        let lower = naming::normalize(&self.name);
        if let Some((entry, header)) = ctx.backend.builtin_class_entry(&lower) {
            if let Some(header) = header {
                ctx.headers.add(header);
            }
            return Ok(entry);
        }

        trace!(class = %self.name, "class entry looked up at load time");
        Ok(format!("zephir_get_internal_ce(SL(\"{}\"))", naming::escape(&lower)))
    }
}
