//! Argument and return descriptors (`arginfo`) and method-entry tables

use zext_model::{naming, ClassDefinition, Method, ParamType, ReturnType};

use crate::backend::Backend;
use crate::printer::CodePrinter;

/// Descriptor table of one method
pub struct ArgInfo<'a> {
    method: &'a Method,
    class: &'a ClassDefinition,
    backend: &'a dyn Backend,
}

impl<'a> ArgInfo<'a> {
    pub fn new(method: &'a Method, class: &'a ClassDefinition, backend: &'a dyn Backend) -> Self {
        Self {
            method,
            class,
            backend,
        }
    }

    /// `arginfo_<fragment>_<method>`, all lowercase
    pub fn name(&self) -> String {
        arginfo_name(self.method, self.class)
    }

    /// Typed return descriptor is usable for this method
    pub fn is_rich(&self) -> bool {
        is_rich(self.method, self.backend)
    }

    pub fn render(&self, printer: &mut CodePrinter) {
        let name = self.name();
        let required = self.method.required_parameter_count();
        let return_types = &self.method.return_types;

        if self.is_rich() {
            let nullable = u8::from(return_types.allows_null());
            match return_types.single() {
                _ if return_types.is_void() => printer.output(&format!(
                    "ZEND_BEGIN_ARG_WITH_RETURN_TYPE_INFO_EX({}, 0, {}, IS_VOID, 0)",
                    name, required
                )),
                Some(ReturnType::Object(Some(class))) => printer.output(&format!(
                    "ZEND_BEGIN_ARG_WITH_RETURN_OBJ_INFO_EX({}, 0, {}, {}, {})",
                    name,
                    required,
                    escaped_class(class),
                    nullable
                )),
                single => printer.output(&format!(
                    "ZEND_BEGIN_ARG_WITH_RETURN_TYPE_INFO_EX({}, 0, {}, {}, {})",
                    name,
                    required,
                    self.return_type_code(single),
                    nullable
                )),
            }
        } else {
            printer.output(&format!("ZEND_BEGIN_ARG_INFO_EX({}, 0, 0, {})", name, required));
        }

        printer.increase_level();
        for parameter in &self.method.parameters {
            let nullable = u8::from(parameter.allows_null());
            let line = match &parameter.data_type {
                ParamType::Array => format!("ZEND_ARG_ARRAY_INFO(0, {}, {})", parameter.name, nullable),
                ParamType::Object(Some(class)) => format!(
                    "ZEND_ARG_OBJ_INFO(0, {}, {}, {})",
                    parameter.name,
                    escaped_class(class),
                    nullable
                ),
                ParamType::Callable => {
                    format!("ZEND_ARG_CALLABLE_INFO(0, {}, {})", parameter.name, nullable)
                }
                scalar @ (ParamType::Bool | ParamType::Int | ParamType::Double | ParamType::String)
                    if self.backend.supports_rich_arginfo() =>
                {
                    format!(
                        "ZEND_ARG_TYPE_INFO(0, {}, {}, {})",
                        parameter.name,
                        self.scalar_code(scalar),
                        nullable
                    )
                }
                _ => format!("ZEND_ARG_INFO(0, {})", parameter.name),
            };
            printer.output(&line);
        }
        printer.decrease_level();
        printer.output("ZEND_END_ARG_INFO()");
        printer.output_blank_line();
    }

    fn return_type_code(&self, single: Option<&ReturnType>) -> &'static str {
        match single {
            Some(ReturnType::Bool) => self.backend.bool_type(),
            Some(ReturnType::Int) => "IS_LONG",
            Some(ReturnType::Double) => "IS_DOUBLE",
            Some(ReturnType::String) => "IS_STRING",
            Some(ReturnType::Array) => "IS_ARRAY",
            Some(ReturnType::Callable) => "IS_CALLABLE",
            Some(ReturnType::Iterable) => "IS_ITERABLE",
            Some(ReturnType::Object(_)) => "IS_OBJECT",
            Some(ReturnType::Void) => "IS_VOID",
            Some(ReturnType::Null) | Some(ReturnType::Variable) | None => "IS_NULL",
        }
    }

    fn scalar_code(&self, data_type: &ParamType) -> &'static str {
        match data_type {
            ParamType::Bool => self.backend.bool_type(),
            ParamType::Int => "IS_LONG",
            ParamType::Double => "IS_DOUBLE",
            _ => "IS_STRING",
        }
    }
}

pub fn arginfo_name(method: &Method, class: &ClassDefinition) -> String {
    format!("arginfo_{}_{}", class.symbol_fragment(), method.name.to_lowercase())
}

/// Typed return descriptor: rich backend, determined and compatible hints
pub fn is_rich(method: &Method, backend: &dyn Backend) -> bool {
    backend.supports_rich_arginfo()
        && method.return_types.is_determined()
        && method.return_types.are_compatible()
}

fn escaped_class(class: &str) -> String {
    naming::escape(class.trim_start_matches(naming::NAMESPACE_SEPARATOR))
}

/// `ZEPHIR_INIT_FUNCS` table listing every exported method
pub struct MethodEntryTable<'a> {
    class: &'a ClassDefinition,
    backend: &'a dyn Backend,
}

impl<'a> MethodEntryTable<'a> {
    pub fn new(class: &'a ClassDefinition, backend: &'a dyn Backend) -> Self {
        Self { class, backend }
    }

    pub fn render(&self, printer: &mut CodePrinter) {
        let class = self.class;
        let init_name = class.init_class_name();
        printer.output(&format!("ZEPHIR_INIT_FUNCS({}) {{", class.method_entry_symbol()));
        for method in class.methods().iter() {
            let arginfo = arginfo_name(method, class);
            if class.is_class() {
                if method.is_internal() {
                    continue;
                }
                let flags = self.backend.method_flags(method);
                let entry = |arginfo: &str| {
                    format!("\tPHP_ME({}, {}, {}, {})", init_name, method.name, arginfo, flags)
                };
                if is_rich(method, self.backend) || method.has_parameters() {
                    printer.output(&entry(&arginfo));
                } else {
                    version_shim(printer, &entry(&arginfo), &entry("NULL"));
                }
            } else if method.is_static() {
                let entry = |arginfo: &str| {
                    format!(
                        "\tZEND_FENTRY({}, NULL, {}, ZEND_ACC_STATIC|ZEND_ACC_ABSTRACT|ZEND_ACC_PUBLIC)",
                        method.name, arginfo
                    )
                };
                if is_rich(method, self.backend) || method.has_parameters() {
                    printer.output(&entry(&arginfo));
                } else {
                    version_shim(printer, &entry(&arginfo), &entry("NULL"));
                }
            } else {
                printer.output(&format!(
                    "\tPHP_ABSTRACT_ME({}, {}, {})",
                    init_name, method.name, arginfo
                ));
            }
        }
        printer.output("\tPHP_FE_END");
        printer.output("};");
    }
}

/// Descriptors are only mandatory from PHP 8 on; older runtimes get `NULL`
fn version_shim(printer: &mut CodePrinter, modern: &str, legacy: &str) {
    printer.output("#if PHP_VERSION_ID >= 80000");
    printer.output(modern);
    printer.output("#else");
    printer.output(legacy);
    printer.output("#endif");
}
