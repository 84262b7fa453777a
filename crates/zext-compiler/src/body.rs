//! Method body compilation
//!
//! Statement lowering belongs to the front end; the emitter only needs
//! something that prints a finished body between the braces of a method
//! block. [`PlainBodyCompiler`] prints raw statements verbatim and lowers the
//! property-initialization statements produced by the initializer
//! synthesizer.

use zext_model::{naming, ClassDefinition, DefaultValue, Method, Statement};

use crate::class_entry::ExternalEntry;
use crate::context::CompilationContext;
use crate::error::{CompileError, CompileResult};

/// Prints the body of one method at the printer's current level
pub trait BodyCompiler: Send + Sync {
    fn compile_body(
        &self,
        method: &Method,
        class: &ClassDefinition,
        ctx: &mut CompilationContext<'_>,
    ) -> CompileResult<()>;
}

/// Default body compiler
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainBodyCompiler;

impl BodyCompiler for PlainBodyCompiler {
    fn compile_body(
        &self,
        method: &Method,
        class: &ClassDefinition,
        ctx: &mut CompilationContext<'_>,
    ) -> CompileResult<()> {
        let mut lowering = Lowering::default();
        let mut lines = Vec::new();
        for statement in method.body.iter() {
            match statement {
                Statement::Raw(code) => lines.extend(code.lines().map(str::to_string)),
                Statement::InitializeProperty {
                    property,
                    is_static,
                    value,
                } => {
                    if !class.has_property(property, ctx.registry) {
                        return Err(CompileError::Body {
                            class: class.complete_name(),
                            method: method.name.clone(),
                            message: format!("Property '{}' is not declared", property),
                        });
                    }
                    let temp = lowering.value(value, class, ctx, &mut lines)?;
                    if *is_static {
                        let entry = class.class_entry(Some(&mut ctx.headers))?;
                        lines.push(format!(
                            "zephir_update_static_property_ce({}, ZEND_STRL(\"{}\"), &{});",
                            entry, property, temp
                        ));
                    } else {
                        lines.push(format!(
                            "zephir_update_property_zval(this_ptr, ZEND_STRL(\"{}\"), &{});",
                            property, temp
                        ));
                    }
                }
            }
        }

        let printer = &mut ctx.printer;
        printer.increase_level();
        if lowering.count > 0 {
            let temps: Vec<String> = (0..lowering.count).map(|i| format!("_{}", i)).collect();
            printer.output(&format!("zval {};", temps.join(", ")));
            printer.output_blank_line();
            for temp in &temps {
                printer.output(&format!("ZVAL_UNDEF(&{});", temp));
            }
            printer.output_blank_line();
        }

        if method.is_initializer && !method.is_static() {
            printer.output("{");
            printer.increase_level();
            printer.output("zval local_this_ptr, *this_ptr = &local_this_ptr;");
            printer.output("ZEPHIR_CREATE_OBJECT(this_ptr, class_type);");
            for line in &lines {
                printer.output(line);
            }
            printer.output(&format!("return {};", ctx.backend.object_return()));
            printer.decrease_level();
            printer.output("}");
        } else {
            for line in &lines {
                printer.output(line);
            }
        }
        printer.decrease_level();
        Ok(())
    }
}

/// Temporaries allocated while lowering default values
#[derive(Default)]
struct Lowering {
    count: usize,
}

impl Lowering {
    fn temp(&mut self) -> String {
        let name = format!("_{}", self.count);
        self.count += 1;
        name
    }

    /// Emit code building `value` into a fresh temporary and return its name
    fn value(
        &mut self,
        value: &DefaultValue,
        class: &ClassDefinition,
        ctx: &mut CompilationContext<'_>,
        lines: &mut Vec<String>,
    ) -> CompileResult<String> {
        let temp = self.temp();
        match value {
            DefaultValue::Null => lines.push(format!("ZVAL_NULL(&{});", temp)),
            DefaultValue::Bool(b) => lines.push(format!("ZVAL_BOOL(&{}, {});", temp, u8::from(*b))),
            DefaultValue::Int(i) => lines.push(format!("ZVAL_LONG(&{}, {});", temp, i)),
            DefaultValue::Double(d) => lines.push(format!("ZVAL_DOUBLE(&{}, {:?});", temp, d)),
            DefaultValue::String(s) => {
                lines.push(format!("ZVAL_STRING(&{}, \"{}\");", temp, naming::c_string(s)))
            }
            DefaultValue::Array(items) => {
                if items.is_empty() {
                    lines.push(format!("array_init(&{});", temp));
                } else {
                    lines.push(format!("zephir_create_array(&{}, {}, 0);", temp, items.len()));
                }
                for item in items {
                    match item {
                        DefaultValue::Null => lines.push(format!("add_next_index_null(&{});", temp)),
                        DefaultValue::Bool(b) => {
                            lines.push(format!("add_next_index_bool(&{}, {});", temp, u8::from(*b)))
                        }
                        DefaultValue::Int(i) => {
                            lines.push(format!("add_next_index_long(&{}, {});", temp, i))
                        }
                        DefaultValue::Double(d) => {
                            lines.push(format!("add_next_index_double(&{}, {:?});", temp, d))
                        }
                        DefaultValue::String(s) => lines.push(format!(
                            "add_next_index_stringl(&{}, SL(\"{}\"));",
                            temp,
                            naming::c_string(s)
                        )),
                        nested => {
                            let inner = self.value(nested, class, ctx, lines)?;
                            lines.push(format!("zephir_array_fast_append(&{}, &{});", temp, inner));
                        }
                    }
                }
            }
            DefaultValue::ClassConstant {
                class: holder,
                constant,
            } => {
                let entry = if holder.eq_ignore_ascii_case("self") || holder.eq_ignore_ascii_case("static") {
                    class.class_entry(Some(&mut ctx.headers))?
                } else {
                    ExternalEntry::new(holder.as_str()).resolve(ctx)?
                };
                lines.push(format!(
                    "zephir_get_class_constant(&{}, {}, SL(\"{}\"));",
                    temp, entry, constant
                ));
            }
        }
        Ok(temp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ZendEngine2, ZendEngine3};
    use crate::config::ExtensionConfig;
    use zext_model::{ClassRegistry, Modifier, Modifiers, Property, StatementsBlock};

    fn property(name: &str) -> Property {
        Property::new(name, Modifiers::new().with(Modifier::Protected))
    }

    #[test]
    fn test_raw_statements_are_indented() {
        let config = ExtensionConfig::new("App");
        let registry = ClassRegistry::new();
        let class = ClassDefinition::class("App", "Greeter");
        let method = Method::new("hello", Modifiers::new().with(Modifier::Public)).with_body(
            StatementsBlock::new(vec![Statement::Raw("RETURN_STRING(\"hi\");".into())]),
        );
        let mut ctx = CompilationContext::new(&config, &ZendEngine3, &registry, "App\\Greeter");

        PlainBodyCompiler.compile_body(&method, &class, &mut ctx).unwrap();
        assert_eq!(ctx.printer.output_str(), "\tRETURN_STRING(\"hi\");\n");
    }

    #[test]
    fn test_instance_initializer_body() {
        let config = ExtensionConfig::new("App");
        let registry = ClassRegistry::new();
        let mut class = ClassDefinition::class("App", "Bag");
        class
            .add_property(property("items").with_default(DefaultValue::Array(vec![
                DefaultValue::Int(1),
                DefaultValue::String("two".into()),
            ])))
            .unwrap();
        class
            .add_init_method(StatementsBlock::new(vec![Statement::InitializeProperty {
                property: "items".into(),
                is_static: false,
                value: DefaultValue::Array(vec![DefaultValue::Int(1), DefaultValue::String("two".into())]),
            }]))
            .unwrap();
        let init = class.init_method().unwrap();
        let mut ctx = CompilationContext::new(&config, &ZendEngine3, &registry, "App\\Bag");

        PlainBodyCompiler.compile_body(&init, &class, &mut ctx).unwrap();
        let expected = "\tzval _0;\n\
                        \n\
                        \tZVAL_UNDEF(&_0);\n\
                        \n\
                        \t{\n\
                        \t\tzval local_this_ptr, *this_ptr = &local_this_ptr;\n\
                        \t\tZEPHIR_CREATE_OBJECT(this_ptr, class_type);\n\
                        \t\tzephir_create_array(&_0, 2, 0);\n\
                        \t\tadd_next_index_long(&_0, 1);\n\
                        \t\tadd_next_index_stringl(&_0, SL(\"two\"));\n\
                        \t\tzephir_update_property_zval(this_ptr, ZEND_STRL(\"items\"), &_0);\n\
                        \t\treturn Z_OBJ_P(this_ptr);\n\
                        \t}\n";
        assert_eq!(ctx.printer.output_str(), expected);
    }

    #[test]
    fn test_static_initializer_uses_class_entry() {
        let config = ExtensionConfig::new("App");
        let registry = ClassRegistry::new();
        let mut class = ClassDefinition::class("App", "Limits");
        class
            .add_property(
                Property::new("defaults", Modifiers::new().with(Modifier::Public).with(Modifier::Static))
                    .with_default(DefaultValue::ClassConstant {
                        class: "self".into(),
                        constant: "MAX".into(),
                    }),
            )
            .unwrap();
        class
            .add_static_init_method(StatementsBlock::new(vec![Statement::InitializeProperty {
                property: "defaults".into(),
                is_static: true,
                value: DefaultValue::ClassConstant {
                    class: "self".into(),
                    constant: "MAX".into(),
                },
            }]))
            .unwrap();
        let init = class.static_init_method().unwrap();
        let mut ctx = CompilationContext::new(&config, &ZendEngine2, &registry, "App\\Limits");

        PlainBodyCompiler.compile_body(&init, &class, &mut ctx).unwrap();
        let output = ctx.printer.output_str();
        assert!(output.contains("zephir_get_class_constant(&_0, app_limits_ce, SL(\"MAX\"));"));
        assert!(output.contains("zephir_update_static_property_ce(app_limits_ce, ZEND_STRL(\"defaults\"), &_0);"));
        assert!(!output.contains("ZEPHIR_CREATE_OBJECT"));
    }

    #[test]
    fn test_undeclared_property_is_rejected() {
        let config = ExtensionConfig::new("App");
        let registry = ClassRegistry::new();
        let class = ClassDefinition::class("App", "Empty");
        let method = Method::new("init", Modifiers::new().with(Modifier::Internal)).with_body(
            StatementsBlock::new(vec![Statement::InitializeProperty {
                property: "ghost".into(),
                is_static: false,
                value: DefaultValue::Array(vec![]),
            }]),
        );
        let mut ctx = CompilationContext::new(&config, &ZendEngine3, &registry, "App\\Empty");

        let err = PlainBodyCompiler.compile_body(&method, &class, &mut ctx).unwrap_err();
        assert!(matches!(err, CompileError::Body { .. }));
        assert!(err.to_string().contains("Property 'ghost' is not declared"));
    }
}
