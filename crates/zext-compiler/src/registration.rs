//! Registration source of one class or interface
//!
//! Emission runs in fixed stages: the `ZEPHIR_INIT_CLASS` block with the
//! registration call, property and constant declarations, implemented
//! interfaces (with conformance checks), then one block per method.

use tracing::{debug, trace};
use zext_checker::ConformanceChecker;
use zext_model::{
    naming, ClassDefinition, ClassError, ClassHandle, ConstantValue, DefaultValue, Property,
};

use crate::backend::modifier_flags;
use crate::body::BodyCompiler;
use crate::class_entry::ExternalEntry;
use crate::context::CompilationContext;
use crate::error::CompileResult;

pub struct RegistrationEmitter<'a> {
    body: &'a dyn BodyCompiler,
}

impl<'a> RegistrationEmitter<'a> {
    pub fn new(body: &'a dyn BodyCompiler) -> Self {
        Self { body }
    }

    /// Print the registration source of `class` into the context's printer
    pub fn emit(&self, class: &ClassDefinition, ctx: &mut CompilationContext<'_>) -> CompileResult<()> {
        debug!(class = %class.complete_name(), "emitting registration");
        self.emit_register(class, ctx)?;
        self.emit_properties(class, ctx);
        self.emit_constants(class, ctx);
        self.emit_interfaces(class, ctx)?;

        let printer = &mut ctx.printer;
        printer.output("return SUCCESS;");
        printer.decrease_level();
        printer.output("}");
        printer.output_blank_line();

        self.emit_methods(class, ctx)
    }

    fn emit_register(&self, class: &ClassDefinition, ctx: &mut CompilationContext<'_>) -> CompileResult<()> {
        let project = ctx.config.c_namespace();
        let short_name = class.short_c_name(&ctx.config.namespace).to_lowercase();
        let method_entry = if class.methods().is_empty() {
            "NULL".to_string()
        } else {
            class.method_entry_symbol()
        };

        let parent_entry = match class.extends() {
            Some(supertype) => {
                if class.is_interface()
                    && (ctx.registry.is_class(supertype) || ctx.registry.is_bundled_class(supertype))
                {
                    return Err(ClassError::InvalidSupertype {
                        class: class.complete_name(),
                        supertype: supertype.to_string(),
                        location: class.location().cloned(),
                    }
                    .into());
                }
                Some(ExternalEntry::new(supertype).resolve(ctx)?)
            }
            None => None,
        };

        ctx.printer.output(&format!("ZEPHIR_INIT_CLASS({})", class.init_class_name()));
        ctx.printer.output("{");
        ctx.printer.increase_level();

        let namespace = class.escaped_namespace();
        let name = class.name();
        let call = match (class.is_class(), parent_entry) {
            (true, Some(parent)) => format!(
                "ZEPHIR_REGISTER_CLASS_EX({}, {}, {}, {}, {}, {}, {});",
                namespace,
                name,
                project,
                short_name,
                parent,
                method_entry,
                class_flags(class)
            ),
            (true, None) => format!(
                "ZEPHIR_REGISTER_CLASS({}, {}, {}, {}, {}, {});",
                namespace,
                name,
                project,
                short_name,
                method_entry,
                class_flags(class)
            ),
            (false, Some(parent)) => format!(
                "ZEPHIR_REGISTER_INTERFACE_EX({}, {}, {}, {}, {}, {});",
                namespace, name, project, short_name, parent, method_entry
            ),
            (false, None) => format!(
                "ZEPHIR_REGISTER_INTERFACE({}, {}, {}, {}, {});",
                namespace, name, project, short_name, method_entry
            ),
        };
        ctx.printer.output(&call);
        ctx.printer.output_blank_line();
        Ok(())
    }

    fn emit_properties(&self, class: &ClassDefinition, ctx: &mut CompilationContext<'_>) {
        let entry = class.class_entry_symbol();
        let suffix = ctx.backend.declaration_suffix();
        for property in class.properties().iter() {
            if let Some(doc_block) = &property.doc_block {
                ctx.printer.output_doc_block(doc_block);
            }
            ctx.printer.output(&declare_property(&entry, property, suffix));
            ctx.printer.output_blank_line();
        }

        if let Some(init) = class.init_method() {
            ctx.printer.output(&format!(
                "{}->create_object = {};",
                class.class_entry_symbol(),
                init.name
            ));
        }
    }

    fn emit_constants(&self, class: &ClassDefinition, ctx: &mut CompilationContext<'_>) {
        let entry = class.class_entry_symbol();
        let suffix = ctx.backend.declaration_suffix();
        for constant in class.constants().iter() {
            if let Some(doc_block) = &constant.doc_block {
                ctx.printer.output_doc_block(doc_block);
            }
            let (kind, value) = match &constant.value {
                ConstantValue::Null => ("null", None),
                ConstantValue::Bool(b) => ("bool", Some(u8::from(*b).to_string())),
                ConstantValue::Int(i) => ("long", Some(i.to_string())),
                ConstantValue::Double(d) => ("double", Some(format!("{:?}", d))),
                ConstantValue::String(s) => ("string", Some(format!("\"{}\"", naming::c_string(s)))),
            };
            let value = value.map(|v| format!(", {}", v)).unwrap_or_default();
            ctx.printer.output(&format!(
                "zephir_declare_class_constant_{}({}, SL(\"{}\"){}{});",
                kind, entry, constant.name, value, suffix
            ));
            ctx.printer.output_blank_line();
        }
    }

    fn emit_interfaces(&self, class: &ClassDefinition, ctx: &mut CompilationContext<'_>) -> CompileResult<()> {
        if !class.interfaces().is_empty() {
            ctx.printer.output_blank_line_if_needed();
        }

        let checker = ConformanceChecker::new(ctx.registry);
        for interface in class.interfaces() {
            let (handle, entry) = self.resolve_interface(class, interface, ctx)?;
            checker.check(class, &handle.read())?;
            trace!(class = %class.complete_name(), interface = %interface, "implements");
            ctx.printer.output(&format!(
                "zend_class_implements({}, 1, {});",
                class.class_entry_symbol(),
                entry
            ));
        }

        checker.check_inherited(class)?;
        Ok(())
    }

    fn resolve_interface(
        &self,
        class: &ClassDefinition,
        interface: &str,
        ctx: &mut CompilationContext<'_>,
    ) -> CompileResult<(ClassHandle, String)> {
        if ctx.registry.is_interface(interface) {
            if let Some(handle) = ctx.registry.find(interface) {
                let entry = handle.read().class_entry(Some(&mut ctx.headers))?;
                return Ok((handle, entry));
            }
        }

        if ctx.registry.is_bundled_interface(interface) {
            if let Some(handle) = ctx.registry.internal_class_definition(interface)? {
                let name = handle.read().complete_name();
                let entry = ExternalEntry::new(name).resolve(ctx)?;
                return Ok((handle, entry));
            }
        }

        Err(ClassError::UnresolvableInterface {
            interface: interface.to_string(),
            class: class.complete_name(),
            is_class: ctx.registry.is_class(interface) || ctx.registry.is_bundled_class(interface),
            location: class.location().cloned(),
        }
        .into())
    }

    fn emit_methods(&self, class: &ClassDefinition, ctx: &mut CompilationContext<'_>) -> CompileResult<()> {
        let init_name = class.init_class_name();
        for method in class.methods().iter() {
            if let Some(doc_block) = &method.doc_block {
                ctx.printer.output_doc_block(doc_block);
            }

            if class.is_interface() {
                ctx.printer
                    .output(&format!("ZEPHIR_DOC_METHOD({}, {});", init_name, method.name));
                continue;
            }

            if method.is_internal() {
                let signature = ctx.backend.internal_signature(method, class);
                ctx.printer.output(&signature);
            } else {
                ctx.printer.output(&format!("PHP_METHOD({}, {})", init_name, method.name));
            }
            ctx.printer.output("{");
            if !method.is_abstract() {
                self.body.compile_body(method, class, ctx)?;
            }
            ctx.printer.output("}");
            ctx.printer.output_blank_line();
        }
        Ok(())
    }
}

/// Flag word of the registration call
pub fn class_flags(class: &ClassDefinition) -> String {
    match (class.is_abstract(), class.is_final()) {
        (true, true) => "ZEND_ACC_EXPLICIT_ABSTRACT_CLASS|ZEND_ACC_FINAL_CLASS".to_string(),
        (true, false) => "ZEND_ACC_EXPLICIT_ABSTRACT_CLASS".to_string(),
        (false, true) => "ZEND_ACC_FINAL_CLASS".to_string(),
        (false, false) => "0".to_string(),
    }
}

/// `zend_declare_property_*` call; runtime-initialized defaults start as null
fn declare_property(entry: &str, property: &Property, suffix: &str) -> String {
    let flags = modifier_flags(&property.modifiers);
    let (kind, value) = match property.default.as_ref() {
        None | Some(DefaultValue::Null) | Some(DefaultValue::Array(_)) | Some(DefaultValue::ClassConstant { .. }) => {
            ("null", None)
        }
        Some(DefaultValue::Bool(b)) => ("bool", Some(u8::from(*b).to_string())),
        Some(DefaultValue::Int(i)) => ("long", Some(i.to_string())),
        Some(DefaultValue::Double(d)) => ("double", Some(format!("{:?}", d))),
        Some(DefaultValue::String(s)) => ("string", Some(format!("\"{}\"", naming::c_string(s)))),
    };
    let value = value.map(|v| format!("{}, ", v)).unwrap_or_default();
    format!(
        "zend_declare_property_{}({}, SL(\"{}\"), {}{}{});",
        kind, entry, property.name, value, flags, suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Backend, BackendKind, ZendEngine3};
    use crate::body::PlainBodyCompiler;
    use crate::config::ExtensionConfig;
    use crate::error::CompileError;
    use zext_model::{
        ClassRegistry, Constant, Method, Modifier, Modifiers, Parameter, Statement, StatementsBlock,
    };

    fn public() -> Modifiers {
        Modifiers::new().with(Modifier::Public)
    }

    fn emit(registry: &ClassRegistry, name: &str, config: &ExtensionConfig) -> CompileResult<String> {
        let backend = config.backend.backend();
        let mut ctx = CompilationContext::new(config, backend.as_ref(), registry, name);
        let handle = registry.find(name).expect("declared");
        let class = handle.read();
        RegistrationEmitter::new(&PlainBodyCompiler).emit(&class, &mut ctx)?;
        Ok(ctx.printer.into_output())
    }

    #[test]
    fn test_final_class_without_members() {
        let registry = ClassRegistry::new();
        registry
            .declare(ClassDefinition::class("Stub", "11__closure").with_final())
            .unwrap();
        let output = emit(&registry, "Stub\\11__closure", &ExtensionConfig::new("Stub")).unwrap();
        assert_eq!(
            output,
            "ZEPHIR_INIT_CLASS(Stub_11__closure)\n\
             {\n\
             \tZEPHIR_REGISTER_CLASS(Stub, 11__closure, Stub, 11__closure, NULL, ZEND_ACC_FINAL_CLASS);\n\
             \n\
             \treturn SUCCESS;\n\
             }\n\
             \n"
        );
    }

    #[test]
    fn test_declarations() {
        let registry = ClassRegistry::new();
        let mut class = ClassDefinition::class("Stub\\Properties", "Limits").with_abstract().with_final();
        class
            .add_property(
                Property::new("size", Modifiers::new().with(Modifier::Protected))
                    .with_default(DefaultValue::Int(10))
                    .with_doc_block("**\n * Maximum size\n "),
            )
            .unwrap();
        class
            .add_property(
                Property::new("items", Modifiers::new().with(Modifier::Public).with(Modifier::Static))
                    .with_default(DefaultValue::Array(vec![])),
            )
            .unwrap();
        class
            .add_constant(Constant::new("NAME", ConstantValue::String("limits".into())))
            .unwrap();
        class.add_constant(Constant::new("NONE", ConstantValue::Null)).unwrap();
        registry.declare(class).unwrap();

        let config = ExtensionConfig::new("Stub").with_backend(BackendKind::ZendEngine2);
        let output = emit(&registry, "Stub\\Properties\\Limits", &config).unwrap();
        assert!(output.contains(
            "\tZEPHIR_REGISTER_CLASS(Stub\\\\Properties, Limits, Stub, properties_limits, NULL, ZEND_ACC_EXPLICIT_ABSTRACT_CLASS|ZEND_ACC_FINAL_CLASS);\n"
        ));
        assert!(output.contains(
            "\t/**\n\t * Maximum size\n\t */\n\tzend_declare_property_long(stub_properties_limits_ce, SL(\"size\"), 10, ZEND_ACC_PROTECTED TSRMLS_CC);\n"
        ));
        assert!(output.contains(
            "\tzend_declare_property_null(stub_properties_limits_ce, SL(\"items\"), ZEND_ACC_PUBLIC|ZEND_ACC_STATIC TSRMLS_CC);\n"
        ));
        assert!(output.contains(
            "\tzephir_declare_class_constant_string(stub_properties_limits_ce, SL(\"NAME\"), \"limits\" TSRMLS_CC);\n"
        ));
        assert!(output.contains(
            "\tzephir_declare_class_constant_null(stub_properties_limits_ce, SL(\"NONE\") TSRMLS_CC);\n"
        ));
    }

    #[test]
    fn test_create_object_outside_project_namespace() {
        let registry = ClassRegistry::new();
        let mut class = ClassDefinition::class("Vendor\\Util", "Pool");
        class
            .add_init_method(StatementsBlock::new(vec![Statement::Raw("/* warm up */".into())]))
            .unwrap();
        registry.declare(class).unwrap();

        let output = emit(&registry, "Vendor\\Util\\Pool", &ExtensionConfig::new("App")).unwrap();
        assert!(output.contains("\tvendor_util_pool_ce->create_object = zephir_init_properties_Vendor_Util_Pool;\n"));
        assert!(!output.contains("app_"));
    }

    #[test]
    fn test_interface_extending_class_is_rejected() {
        let registry = ClassRegistry::new();
        registry.declare(ClassDefinition::class("App", "Base")).unwrap();
        registry
            .declare(ClassDefinition::interface("App", "Contract").with_extends("App\\Base"))
            .unwrap();
        let err = emit(&registry, "App\\Contract", &ExtensionConfig::new("App")).unwrap_err();
        assert!(matches!(
            err.as_class_error(),
            Some(ClassError::InvalidSupertype { .. })
        ));
    }

    #[test]
    fn test_implementing_a_class_is_rejected() {
        let registry = ClassRegistry::new();
        registry.declare(ClassDefinition::class("App", "Base")).unwrap();
        registry
            .declare(ClassDefinition::class("App", "Impl").with_interfaces(["App\\Base"]))
            .unwrap();
        let err = emit(&registry, "App\\Impl", &ExtensionConfig::new("App")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot locate interface App\\Base when implementing interfaces on App\\Impl. App\\Base is currently a class"
        );

        registry
            .declare(ClassDefinition::class("App", "Lost").with_interfaces(["App\\Missing"]))
            .unwrap();
        let err = emit(&registry, "App\\Lost", &ExtensionConfig::new("App")).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Class(ClassError::UnresolvableInterface { is_class: false, .. })
        ));
    }

    #[test]
    fn test_runtime_interface_and_methods() {
        let registry = ClassRegistry::new();
        let mut class = ClassDefinition::class("App", "Bag").with_interfaces(["Countable"]);
        class
            .add_method(Method::new("count", public()).with_body(StatementsBlock::new(vec![
                Statement::Raw("RETURN_LONG(0);".into()),
            ])))
            .unwrap();
        let fetch = Method::new("fetch", public().with(Modifier::Internal))
            .with_parameters(vec![Parameter::required("key")]);
        let signature = ZendEngine3.internal_signature(&fetch, &class);
        class.add_method(fetch).unwrap();
        registry.declare(class).unwrap();

        let output = emit(&registry, "App\\Bag", &ExtensionConfig::new("App")).unwrap();
        assert!(output.contains("\tZEPHIR_REGISTER_CLASS(App, Bag, App, bag, app_bag_method_entry, 0);\n"));
        assert!(output.contains("\tzend_class_implements(app_bag_ce, 1, zend_ce_countable);\n"));
        assert!(output.contains("PHP_METHOD(App_Bag, count)\n{\n\tRETURN_LONG(0);\n}\n"));
        assert!(output.contains(&format!("{}\n{{\n}}\n", signature)));
    }
}
