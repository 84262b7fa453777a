//! Property initializer synthesis
//!
//! Defaults that cannot be declared statically on a class entry (arrays,
//! class constant references) are assigned by synthesized internal methods:
//! one run when an object is created, one run when the class is loaded.

use std::sync::Arc;

use tracing::debug;
use zext_model::{ClassId, ClassRegistry, ClassResult, Method, Provenance, Statement, StatementsBlock};

/// Builds the instance and static initializers of a class
pub struct InitializerSynthesizer<'a> {
    registry: &'a ClassRegistry,
}

impl<'a> InitializerSynthesizer<'a> {
    pub fn new(registry: &'a ClassRegistry) -> Self {
        Self { registry }
    }

    /// Synthesize the initializers of `id`.
    ///
    /// User-defined supertypes are synthesized first, root down, so their
    /// statements are merged in whatever order classes were declared.
    /// Running twice yields the same methods.
    pub fn synthesize(&self, id: ClassId) -> ClassResult<()> {
        for ancestor in self.user_chain(id).into_iter().rev() {
            self.synthesize_one(ancestor)?;
        }
        Ok(())
    }

    /// `id` followed by its user-defined supertypes, nearest first
    fn user_chain(&self, id: ClassId) -> Vec<ClassId> {
        let mut chain = vec![id];
        let mut current = id;
        loop {
            let parent = self.registry.get(current).read().parent_id(self.registry);
            let Some(parent) = parent.filter(|parent| !chain.contains(parent)) else {
                break;
            };
            if self.registry.get(parent).read().provenance() != Provenance::UserDefined {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    fn synthesize_one(&self, id: ClassId) -> ClassResult<()> {
        let handle = self.registry.get(id);
        let (mut instance, statics, parent) = {
            let class = handle.read();
            if class.is_bundled() || class.is_interface() {
                return Ok(());
            }
            let owner = class.complete_name();
            let mut instance = StatementsBlock::default();
            let mut statics = StatementsBlock::default();
            for property in class.properties().iter() {
                let Some(value) = property.default.as_ref().filter(|v| v.needs_runtime_init()) else {
                    continue;
                };
                let statement = Statement::InitializeProperty {
                    property: property.name.clone(),
                    is_static: property.is_static(),
                    value: value.bind_self(&owner),
                };
                if property.is_static() {
                    statics.push(statement);
                } else {
                    instance.push(statement);
                }
            }
            (instance, statics, class.parent_id(self.registry))
        };

        if let Some(parent) = parent {
            let parent = self.registry.get(parent);
            let parent = parent.read();
            if !parent.is_bundled() {
                if let Some(inherited) = parent.init_method() {
                    instance.prepend(&inherited.body);
                }
            }
        }

        let mut class = handle.write();
        debug!(
            class = %class.complete_name(),
            instance = instance.len(),
            statics = statics.len(),
            "synthesized initializers"
        );
        match class.init_method() {
            Some(existing) => class.update_method(with_body(&existing, instance))?,
            None => class.add_init_method(instance)?,
        }
        match class.static_init_method() {
            Some(existing) => class.update_method(with_body(&existing, statics))?,
            None => class.add_static_init_method(statics)?,
        }
        Ok(())
    }
}

fn with_body(method: &Arc<Method>, body: StatementsBlock) -> Method {
    let mut method = Method::clone(method);
    method.body = body;
    method
}

#[cfg(test)]
mod tests {
    use super::*;
    use zext_model::{ClassDefinition, DefaultValue, Modifier, Modifiers, Property};

    fn protected() -> Modifiers {
        Modifiers::new().with(Modifier::Protected)
    }

    #[test]
    fn test_splits_instance_and_static_defaults() {
        let registry = ClassRegistry::new();
        let mut class = ClassDefinition::class("App", "Config");
        class
            .add_property(Property::new("items", protected()).with_default(DefaultValue::Array(vec![])))
            .unwrap();
        class
            .add_property(
                Property::new("registry", protected().with(Modifier::Static))
                    .with_default(DefaultValue::Array(vec![])),
            )
            .unwrap();
        class
            .add_property(Property::new("name", protected()).with_default(DefaultValue::String("x".into())))
            .unwrap();
        let id = registry.declare(class).unwrap();

        InitializerSynthesizer::new(&registry).synthesize(id).unwrap();

        let handle = registry.get(id);
        let class = handle.read();
        let init = class.init_method().unwrap();
        assert!(init.is_initializer && init.is_internal() && !init.is_static());
        assert_eq!(init.body.len(), 1);
        let statics = class.static_init_method().unwrap();
        assert!(statics.is_static());
        assert_eq!(statics.body.len(), 1);
    }

    #[test]
    fn test_parent_statements_are_prepended_once() {
        let registry = ClassRegistry::new();
        let mut base = ClassDefinition::class("App", "Base");
        base.add_property(Property::new("tags", protected()).with_default(DefaultValue::Array(vec![])))
            .unwrap();
        let base = registry.declare(base).unwrap();

        let mut child = ClassDefinition::class("App", "Child").with_extends("App\\Base");
        child
            .add_property(
                Property::new("options", protected()).with_default(DefaultValue::Array(vec![DefaultValue::Int(1)])),
            )
            .unwrap();
        let child = registry.declare(child).unwrap();

        let synthesizer = InitializerSynthesizer::new(&registry);
        synthesizer.synthesize(base).unwrap();
        synthesizer.synthesize(child).unwrap();
        synthesizer.synthesize(child).unwrap();

        let handle = registry.get(child);
        let child = handle.read();
        let init = child.init_method().unwrap();
        let targets: Vec<_> = init
            .body
            .iter()
            .map(|statement| match statement {
                Statement::InitializeProperty { property, .. } => property.as_str(),
                Statement::Raw(_) => "raw",
            })
            .collect();
        assert_eq!(targets, vec!["tags", "options"]);
        assert!(child.static_init_method().is_none());
    }

    fn initialized(registry: &ClassRegistry, id: ClassId) -> Vec<String> {
        let handle = registry.get(id);
        let class = handle.read();
        class
            .init_method()
            .map(|init| {
                init.body
                    .iter()
                    .filter_map(|statement| match statement {
                        Statement::InitializeProperty { property, .. } => Some(property.clone()),
                        Statement::Raw(_) => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_reverse_declaration_merges_whole_chain() {
        let registry = ClassRegistry::new();
        let with_list = |mut class: ClassDefinition, name: &str| {
            class
                .add_property(Property::new(name, protected()).with_default(DefaultValue::Array(vec![])))
                .unwrap();
            class
        };
        let c = registry
            .declare(with_list(ClassDefinition::class("App", "C").with_extends("App\\B"), "cs"))
            .unwrap();
        let b = registry
            .declare(with_list(ClassDefinition::class("App", "B").with_extends("App\\A"), "bs"))
            .unwrap();
        let a = registry.declare(with_list(ClassDefinition::class("App", "A"), "as_")).unwrap();

        let synthesizer = InitializerSynthesizer::new(&registry);
        synthesizer.synthesize(c).unwrap();
        assert_eq!(initialized(&registry, c), vec!["as_", "bs", "cs"]);
        assert_eq!(initialized(&registry, b), vec!["as_", "bs"]);

        synthesizer.synthesize(a).unwrap();
        synthesizer.synthesize(b).unwrap();
        synthesizer.synthesize(c).unwrap();
        assert_eq!(initialized(&registry, c), vec!["as_", "bs", "cs"]);
    }

    #[test]
    fn test_self_binds_to_declaring_class() {
        let registry = ClassRegistry::new();
        let mut base = ClassDefinition::class("App", "Base");
        base.add_property(Property::new("limit", protected()).with_default(DefaultValue::ClassConstant {
            class: "self".into(),
            constant: "X".into(),
        }))
        .unwrap();
        registry.declare(base).unwrap();
        let child = registry
            .declare(ClassDefinition::class("App", "Child").with_extends("App\\Base"))
            .unwrap();

        InitializerSynthesizer::new(&registry).synthesize(child).unwrap();

        let handle = registry.get(child);
        let child = handle.read();
        let init = child.init_method().unwrap();
        assert!(matches!(
            init.body.iter().next(),
            Some(Statement::InitializeProperty {
                value: DefaultValue::ClassConstant { class, .. },
                ..
            }) if class == "App\\Base"
        ));
    }

    #[test]
    fn test_child_without_defaults_inherits_initializer() {
        let registry = ClassRegistry::new();
        let mut base = ClassDefinition::class("App", "Base");
        base.add_property(Property::new("tags", protected()).with_default(DefaultValue::Array(vec![])))
            .unwrap();
        let base = registry.declare(base).unwrap();
        let child = registry
            .declare(ClassDefinition::class("App", "Leaf").with_extends("App\\Base"))
            .unwrap();

        let synthesizer = InitializerSynthesizer::new(&registry);
        synthesizer.synthesize(base).unwrap();
        synthesizer.synthesize(child).unwrap();

        let handle = registry.get(child);
        let child = handle.read();
        assert_eq!(child.init_method_name(), "zephir_init_properties_App_Leaf");
        assert_eq!(child.init_method().unwrap().body.len(), 1);
    }

    #[test]
    fn test_plain_defaults_need_no_initializer() {
        let registry = ClassRegistry::new();
        let mut class = ClassDefinition::class("App", "Plain");
        class
            .add_property(Property::new("count", protected()).with_default(DefaultValue::Int(0)))
            .unwrap();
        let id = registry.declare(class).unwrap();

        InitializerSynthesizer::new(&registry).synthesize(id).unwrap();
        assert!(registry.get(id).read().methods().is_empty());
    }
}
