//! Interface conformance
//!
//! A concrete class must provide every method its interfaces declare, with a
//! compatible parameter count: it may not require more arguments than the
//! interface does, and must accept at least as many in total.

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use zext_model::{ClassDefinition, ClassError, ClassId, ClassRegistry, ClassResult, Method};

/// Checks classes against the interfaces they implement
pub struct ConformanceChecker<'a> {
    registry: &'a ClassRegistry,
}

impl<'a> ConformanceChecker<'a> {
    pub fn new(registry: &'a ClassRegistry) -> Self {
        Self { registry }
    }

    /// Check `class` against `interface` and the interfaces it extends.
    ///
    /// Abstract classes and interfaces are exempt.
    pub fn check(&self, class: &ClassDefinition, interface: &ClassDefinition) -> ClassResult<()> {
        if class.is_abstract() || class.is_interface() {
            return Ok(());
        }

        let interface_name = interface.complete_name();
        trace!(class = %class.complete_name(), interface = %interface_name, "checking conformance");

        for required in interface.methods().iter() {
            self.check_method(class, required, &interface_name)?;
        }

        let mut visited = FxHashSet::default();
        let mut pending = interface.interface_ids(self.registry);
        while let Some(id) = pending.pop() {
            if !visited.insert(id) {
                continue;
            }
            let handle = self.registry.get(id);
            let parent = handle.read();
            let parent_name = parent.complete_name();
            for required in parent.methods().iter() {
                self.check_method(class, required, &parent_name)?;
            }
            pending.extend(parent.interface_ids(self.registry));
        }

        Ok(())
    }

    fn check_method(
        &self,
        class: &ClassDefinition,
        required: &Method,
        interface: &str,
    ) -> ClassResult<()> {
        let Some(implemented) = class.get_method(&required.name, self.registry, true) else {
            return Err(ClassError::MissingMethod {
                class: class.complete_name(),
                method: required.name.clone(),
                interface: interface.to_string(),
                location: class.location().cloned(),
            });
        };

        if required.has_parameters()
            && (implemented.required_parameter_count() > required.required_parameter_count()
                || implemented.parameter_count() < required.parameter_count())
        {
            return Err(ClassError::ArityMismatch {
                class: class.complete_name(),
                method: required.name.clone(),
                interface: interface.to_string(),
                location: class.location().cloned(),
            });
        }

        Ok(())
    }

    /// Re-check the interfaces implemented by a user-defined supertype.
    ///
    /// Interfaces that cannot be resolved are skipped here; the supertype's
    /// own emission reports them.
    pub fn check_inherited(&self, class: &ClassDefinition) -> ClassResult<()> {
        if class.is_abstract() || class.is_interface() {
            return Ok(());
        }
        let Some(parent_id) = class.parent_id(self.registry) else {
            return Ok(());
        };

        let parent = self.registry.get(parent_id);
        let interfaces: Vec<ClassId> = {
            let parent = parent.read();
            if parent.is_bundled() {
                return Ok(());
            }
            parent.interface_ids(self.registry)
        };

        for id in interfaces {
            let handle = self.registry.get(id);
            let interface = handle.read();
            if !interface.is_interface() {
                debug!(interface = %interface.complete_name(), "inherited implements target is a class");
                continue;
            }
            self.check(class, &interface)?;
        }
        Ok(())
    }
}
