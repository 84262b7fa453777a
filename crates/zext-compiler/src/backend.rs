//! Target ABI generations
//!
//! Both backends share one emission pipeline; they differ in internal function
//! signatures, a few flags, descriptor richness and how runtime class entries
//! are spelled.

use serde::{Deserialize, Serialize};
use zext_model::{ClassDefinition, Method, Modifier, Modifiers};

/// Selectable backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BackendKind {
    ZendEngine2,
    #[default]
    ZendEngine3,
}

impl BackendKind {
    pub fn backend(self) -> Box<dyn Backend> {
        match self {
            BackendKind::ZendEngine2 => Box::new(ZendEngine2),
            BackendKind::ZendEngine3 => Box::new(ZendEngine3),
        }
    }
}

/// ABI-specific parts of emission
pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Typed argument and return descriptors are available
    fn supports_rich_arginfo(&self) -> bool;

    /// Type code used for boolean descriptors
    fn bool_type(&self) -> &'static str;

    /// Native signature of an internal (non-exported) method
    fn internal_signature(&self, method: &Method, class: &ClassDefinition) -> String;

    /// Flag word of a method-entry
    fn method_flags(&self, method: &Method) -> String {
        modifier_flags(&method.modifiers)
    }

    /// Appended to property and constant declaration calls
    fn declaration_suffix(&self) -> &'static str {
        ""
    }

    /// Expression returning the created object from an instance initializer
    fn object_return(&self) -> &'static str;

    /// Class entry of a runtime class, keyed by lowercased name, plus the
    /// header that declares it when not part of the core
    fn builtin_class_entry(&self, name: &str) -> Option<(String, Option<&'static str>)> {
        core_class_entry(name).map(|entry| (entry.to_string(), None)).or_else(|| {
            (name == "jsonserializable")
                .then(|| ("php_json_serializable_ce".to_string(), Some("ext/json/php_json")))
        })
    }
}

/// `ZEND_ACC_*` flags for a modifier list, in declaration order
pub fn modifier_flags(modifiers: &Modifiers) -> String {
    let flags: Vec<&str> = modifiers
        .iter()
        .filter_map(|modifier| match modifier {
            Modifier::Public => Some("ZEND_ACC_PUBLIC"),
            Modifier::Protected => Some("ZEND_ACC_PROTECTED"),
            Modifier::Private => Some("ZEND_ACC_PRIVATE"),
            Modifier::Static => Some("ZEND_ACC_STATIC"),
            Modifier::Final => Some("ZEND_ACC_FINAL"),
            Modifier::Abstract => Some("ZEND_ACC_ABSTRACT"),
            Modifier::Deprecated => Some("ZEND_ACC_DEPRECATED"),
            Modifier::Internal | Modifier::Inline | Modifier::Scoped => None,
        })
        .collect();
    if flags.is_empty() {
        "0".to_string()
    } else {
        flags.join("|")
    }
}

fn core_class_entry(name: &str) -> Option<&'static str> {
    let entry = match name {
        "iterator" => "zend_ce_iterator",
        "iteratoraggregate" => "zend_ce_aggregate",
        "arrayaccess" => "zend_ce_arrayaccess",
        "countable" => "zend_ce_countable",
        "serializable" => "zend_ce_serializable",
        "traversable" => "zend_ce_traversable",
        "stdclass" => "zend_standard_class_def",
        "closure" => "zend_ce_closure",
        "throwable" => "zend_ce_throwable",
        "stringable" => "zend_ce_stringable",
        "exception" => "zend_ce_exception",
        _ => return None,
    };
    Some(entry)
}

fn internal_name(method: &Method, class: &ClassDefinition) -> String {
    format!("zep_{}_{}", class.init_class_name(), method.name)
}

fn parameter_slots(method: &Method) -> String {
    method
        .parameters
        .iter()
        .map(|p| format!(", zval *{}_param_ext", p.name))
        .collect()
}

/// Current engine generation
#[derive(Debug, Clone, Copy, Default)]
pub struct ZendEngine3;

impl Backend for ZendEngine3 {
    fn kind(&self) -> BackendKind {
        BackendKind::ZendEngine3
    }

    fn supports_rich_arginfo(&self) -> bool {
        true
    }

    fn bool_type(&self) -> &'static str {
        "_IS_BOOL"
    }

    fn internal_signature(&self, method: &Method, class: &ClassDefinition) -> String {
        if method.is_initializer {
            return if method.is_static() {
                format!("void {}()", method.name)
            } else {
                format!("zend_object *{}(zend_class_entry *class_type)", method.name)
            };
        }
        format!(
            "static void {}(int ht, zend_execute_data *execute_data, zval *return_value, zval *this_ptr, int return_value_used{})",
            internal_name(method, class),
            parameter_slots(method)
        )
    }

    fn object_return(&self) -> &'static str {
        "Z_OBJ_P(this_ptr)"
    }
}

/// Legacy engine generation with thread-safety macros
#[derive(Debug, Clone, Copy, Default)]
pub struct ZendEngine2;

impl Backend for ZendEngine2 {
    fn kind(&self) -> BackendKind {
        BackendKind::ZendEngine2
    }

    fn supports_rich_arginfo(&self) -> bool {
        false
    }

    fn bool_type(&self) -> &'static str {
        "IS_BOOL"
    }

    fn internal_signature(&self, method: &Method, class: &ClassDefinition) -> String {
        if method.is_initializer {
            return if method.is_static() {
                format!("void {}(TSRMLS_D)", method.name)
            } else {
                format!(
                    "static zend_object_value {}(zend_class_entry *class_type TSRMLS_DC)",
                    method.name
                )
            };
        }
        format!(
            "static void {}(int ht, zval *return_value, zval **return_value_ptr, zval *this_ptr, int return_value_used{} TSRMLS_DC)",
            internal_name(method, class),
            parameter_slots(method)
        )
    }

    fn method_flags(&self, method: &Method) -> String {
        let flags = modifier_flags(&method.modifiers);
        if method.name.eq_ignore_ascii_case("__construct") {
            format!("{}|ZEND_ACC_CTOR", flags)
        } else {
            flags
        }
    }

    fn declaration_suffix(&self) -> &'static str {
        " TSRMLS_CC"
    }

    fn object_return(&self) -> &'static str {
        "Z_OBJVAL_P(this_ptr)"
    }

    fn builtin_class_entry(&self, name: &str) -> Option<(String, Option<&'static str>)> {
        match name {
            "exception" => Some(("zend_exception_get_default(TSRMLS_C)".to_string(), None)),
            // Not part of this generation's core
            "throwable" | "stringable" => None,
            _ => core_class_entry(name)
                .map(|entry| (entry.to_string(), None))
                .or_else(|| {
                    (name == "jsonserializable")
                        .then(|| ("php_json_serializable_ce".to_string(), Some("ext/json/php_json")))
                }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zext_model::{Parameter, StatementsBlock};

    fn public() -> Modifiers {
        Modifiers::new().with(Modifier::Public)
    }

    #[test]
    fn test_modifier_flags() {
        let modifiers = Modifiers::new()
            .with(Modifier::Public)
            .with(Modifier::Static)
            .with(Modifier::Internal);
        assert_eq!(modifier_flags(&modifiers), "ZEND_ACC_PUBLIC|ZEND_ACC_STATIC");
        assert_eq!(modifier_flags(&Modifiers::new()), "0");
    }

    #[test]
    fn test_initializer_signatures() {
        let mut class = ClassDefinition::class("Stub\\Properties", "ProtectedProperties");
        class
            .add_init_method(StatementsBlock::new(vec![zext_model::Statement::Raw(
                "/* init */".into(),
            )]))
            .unwrap();
        let init = class.init_method().unwrap();

        assert_eq!(
            ZendEngine3.internal_signature(&init, &class),
            "zend_object *zephir_init_properties_Stub_Properties_ProtectedProperties(zend_class_entry *class_type)"
        );
        assert_eq!(
            ZendEngine2.internal_signature(&init, &class),
            "static zend_object_value zephir_init_properties_Stub_Properties_ProtectedProperties(zend_class_entry *class_type TSRMLS_DC)"
        );
    }

    #[test]
    fn test_internal_method_signatures() {
        let class = ClassDefinition::class("App", "Cache");
        let method = Method::new("fetch", public().with(Modifier::Internal))
            .with_parameters(vec![Parameter::required("key")]);

        assert_eq!(
            ZendEngine3.internal_signature(&method, &class),
            "static void zep_App_Cache_fetch(int ht, zend_execute_data *execute_data, zval *return_value, zval *this_ptr, int return_value_used, zval *key_param_ext)"
        );
        assert_eq!(
            ZendEngine2.internal_signature(&method, &class),
            "static void zep_App_Cache_fetch(int ht, zval *return_value, zval **return_value_ptr, zval *this_ptr, int return_value_used, zval *key_param_ext TSRMLS_DC)"
        );
    }

    #[test]
    fn test_constructor_flag_only_on_legacy_backend() {
        let ctor = Method::new("__construct", public());
        assert_eq!(ZendEngine3.method_flags(&ctor), "ZEND_ACC_PUBLIC");
        assert_eq!(ZendEngine2.method_flags(&ctor), "ZEND_ACC_PUBLIC|ZEND_ACC_CTOR");
    }

    #[test]
    fn test_builtin_class_entries() {
        assert_eq!(
            ZendEngine3.builtin_class_entry("exception"),
            Some(("zend_ce_exception".to_string(), None))
        );
        assert_eq!(
            ZendEngine2.builtin_class_entry("exception"),
            Some(("zend_exception_get_default(TSRMLS_C)".to_string(), None))
        );
        assert_eq!(
            ZendEngine3.builtin_class_entry("jsonserializable"),
            Some(("php_json_serializable_ce".to_string(), Some("ext/json/php_json")))
        );
        assert_eq!(ZendEngine2.builtin_class_entry("throwable"), None);
        assert_eq!(ZendEngine3.builtin_class_entry("app\\widget"), None);
    }

    #[test]
    fn test_kind_selects_backend() {
        assert_eq!(BackendKind::default().backend().kind(), BackendKind::ZendEngine3);
        assert!(!BackendKind::ZendEngine2.backend().supports_rich_arginfo());
    }
}
