//! Header block of one class: class entry, prototypes, descriptors and the
//! method-entry table

use zext_model::ClassDefinition;

use crate::arginfo::{ArgInfo, MethodEntryTable};
use crate::backend::Backend;
use crate::config::ExtensionConfig;
use crate::printer::CodePrinter;

pub struct HeaderEmitter<'a> {
    config: &'a ExtensionConfig,
    backend: &'a dyn Backend,
}

impl<'a> HeaderEmitter<'a> {
    pub fn new(config: &'a ExtensionConfig, backend: &'a dyn Backend) -> Self {
        Self { config, backend }
    }

    /// Render the header of a finalized class. Nothing is validated here.
    pub fn emit(&self, class: &ClassDefinition) -> String {
        let mut printer = CodePrinter::new();
        let init_name = class.init_class_name();
        let export = if self.config.extra.export_classes {
            "extern ZEPHIR_API"
        } else {
            "extern"
        };

        printer.output_blank_line();
        printer.output(&format!("{} zend_class_entry *{};", export, class.class_entry_symbol()));
        printer.output_blank_line();
        printer.output(&format!("ZEPHIR_INIT_CLASS({});", init_name));
        printer.output_blank_line();

        let methods = class.methods();
        if class.is_class() && !methods.is_empty() {
            for method in methods.iter() {
                if method.is_internal() {
                    printer.output(&format!("{};", self.backend.internal_signature(method, class)));
                } else {
                    printer.output(&format!("PHP_METHOD({}, {});", init_name, method.name));
                }
            }
            printer.output_blank_line();
        }

        for method in methods.iter() {
            ArgInfo::new(method, class, self.backend).render(&mut printer);
        }

        if !methods.is_empty() {
            MethodEntryTable::new(class, self.backend).render(&mut printer);
        }

        printer.into_output()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ZendEngine2, ZendEngine3};
    use zext_model::{Method, Modifier, Modifiers, Parameter, ReturnType};

    #[test]
    fn test_class_without_methods() {
        let config = ExtensionConfig::new("Stub");
        let class = ClassDefinition::class("Stub", "Empty");
        assert_eq!(
            HeaderEmitter::new(&config, &ZendEngine3).emit(&class),
            "\nextern zend_class_entry *stub_empty_ce;\n\nZEPHIR_INIT_CLASS(Stub_Empty);\n\n"
        );
    }

    #[test]
    fn test_exported_class_entry() {
        let config = ExtensionConfig::new("Stub").with_export_classes(true);
        let class = ClassDefinition::class("Stub", "Shared");
        let header = HeaderEmitter::new(&config, &ZendEngine3).emit(&class);
        assert!(header.contains("extern ZEPHIR_API zend_class_entry *stub_shared_ce;"));
    }

    #[test]
    fn test_full_layout() {
        let config = ExtensionConfig::new("Stub");
        let mut class = ClassDefinition::class("Stub", "Counter");
        class
            .add_method(
                Method::new("add", Modifiers::new().with(Modifier::Public))
                    .with_parameters(vec![Parameter::required("n")]),
            )
            .unwrap();
        class
            .add_method(
                Method::new("total", Modifiers::new().with(Modifier::Public))
                    .with_return_types(vec![ReturnType::Int]),
            )
            .unwrap();

        let expected = "\n\
            extern zend_class_entry *stub_counter_ce;\n\
            \n\
            ZEPHIR_INIT_CLASS(Stub_Counter);\n\
            \n\
            PHP_METHOD(Stub_Counter, add);\n\
            PHP_METHOD(Stub_Counter, total);\n\
            \n\
            ZEND_BEGIN_ARG_INFO_EX(arginfo_stub_counter_add, 0, 0, 1)\n\
            \tZEND_ARG_INFO(0, n)\n\
            ZEND_END_ARG_INFO()\n\
            \n\
            ZEND_BEGIN_ARG_WITH_RETURN_TYPE_INFO_EX(arginfo_stub_counter_total, 0, 0, IS_LONG, 0)\n\
            ZEND_END_ARG_INFO()\n\
            \n\
            ZEPHIR_INIT_FUNCS(stub_counter_method_entry) {\n\
            \tPHP_ME(Stub_Counter, add, arginfo_stub_counter_add, ZEND_ACC_PUBLIC)\n\
            \tPHP_ME(Stub_Counter, total, arginfo_stub_counter_total, ZEND_ACC_PUBLIC)\n\
            \tPHP_FE_END\n\
            };\n";
        assert_eq!(HeaderEmitter::new(&config, &ZendEngine3).emit(&class), expected);

        // Without typed returns the legacy backend falls back to the shim
        let legacy = HeaderEmitter::new(&config, &ZendEngine2).emit(&class);
        assert!(legacy.contains("ZEND_BEGIN_ARG_INFO_EX(arginfo_stub_counter_total, 0, 0, 0)"));
        assert!(legacy.contains("#else\n\tPHP_ME(Stub_Counter, total, NULL, ZEND_ACC_PUBLIC)\n#endif\n"));
    }

    #[test]
    fn test_interface_has_no_prototypes() {
        let config = ExtensionConfig::new("Stub");
        let mut iface = ClassDefinition::interface("Stub", "Measurable");
        iface
            .add_method(Method::new("area", Modifiers::new().with(Modifier::Public)))
            .unwrap();
        let header = HeaderEmitter::new(&config, &ZendEngine3).emit(&iface);
        assert!(!header.contains("PHP_METHOD"));
        assert!(header.contains("\tPHP_ABSTRACT_ME(Stub_Measurable, area, arginfo_stub_measurable_area)\n"));
    }
}
