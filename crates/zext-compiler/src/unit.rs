//! Compilation outputs

use indexmap::IndexSet;
use zext_model::{naming, ClassId};

/// Generated code of one class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledClass {
    pub id: ClassId,
    /// Qualified class name
    pub name: String,
    /// `zend_class_entry` symbol the registration fills in
    pub class_entry: String,
    /// `ZEPHIR_INIT_CLASS` block followed by the method blocks
    pub source: String,
    /// Class entry declaration, prototypes, descriptors and method table
    pub header: String,
    /// Extra headers the source needs, without the `.h` extension
    pub headers: Vec<String>,
    /// Static initializer to call once the class is registered
    pub static_initializer: Option<String>,
}

impl CompiledClass {
    /// Complete `.zep.c` file: include preamble then the registration source
    pub fn source_file(&self) -> String {
        let depth = self.name.matches(naming::NAMESPACE_SEPARATOR).count().max(1);
        let up = "../".repeat(depth);

        let mut file = String::new();
        file.push('\n');
        file.push_str("#ifdef HAVE_CONFIG_H\n");
        file.push_str(&format!("#include \"{}ext_config.h\"\n", up));
        file.push_str("#endif\n\n");
        file.push_str("#include <php.h>\n");
        file.push_str(&format!("#include \"{}php_ext.h\"\n", up));
        file.push_str(&format!("#include \"{}ext.h\"\n\n", up));
        file.push_str("#include <Zend/zend_operators.h>\n");
        file.push_str("#include <Zend/zend_exceptions.h>\n");
        file.push_str("#include <Zend/zend_interfaces.h>\n\n");
        file.push_str("#include \"kernel/main.h\"\n");
        for header in &self.headers {
            file.push_str(&format!("#include \"{}.h\"\n", header));
        }
        file.push_str("\n\n");
        file.push_str(&self.source);
        file
    }
}

/// Every class of one compilation, in compile order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledUnit {
    classes: Vec<CompiledClass>,
}

impl CompiledUnit {
    pub fn new(classes: Vec<CompiledClass>) -> Self {
        Self { classes }
    }

    pub fn classes(&self) -> &[CompiledClass] {
        &self.classes
    }

    pub fn get(&self, name: &str) -> Option<&CompiledClass> {
        let key = naming::normalize(name);
        self.classes
            .iter()
            .find(|class| naming::normalize(&class.name) == key)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// All registration sources concatenated
    pub fn source(&self) -> String {
        self.classes.iter().map(|class| class.source.as_str()).collect()
    }

    /// All header blocks concatenated
    pub fn header(&self) -> String {
        self.classes.iter().map(|class| class.header.as_str()).collect()
    }

    /// Union of the extra headers, first use first
    pub fn headers(&self) -> Vec<&str> {
        let unique: IndexSet<&str> = self
            .classes
            .iter()
            .flat_map(|class| class.headers.iter().map(String::as_str))
            .collect();
        unique.into_iter().collect()
    }

    /// Static initializers in compile order
    pub fn static_initializers(&self) -> Vec<&str> {
        self.classes
            .iter()
            .filter_map(|class| class.static_initializer.as_deref())
            .collect()
    }
}
