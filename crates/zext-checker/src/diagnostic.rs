//! Diagnostic infrastructure for error reporting
//!
//! Turns class model errors into codespan diagnostics with a stable error
//! code, the declaration line as label, and hints where one is known.

use codespan_reporting::diagnostic::{Diagnostic as CsDiagnostic, Label, LabelStyle, Severity};
use codespan_reporting::files::{Files, SimpleFiles};
use codespan_reporting::term;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use termcolor::{ColorChoice, StandardStream, WriteColor};

use zext_model::{ClassError, MemberKind, SourceLocation};

/// Error code for a diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCode(pub &'static str);

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        self.0
    }
}

/// Source files addressable by the names used in [`SourceLocation`]s
pub struct SourceFiles {
    files: SimpleFiles<String, String>,
    ids: FxHashMap<String, usize>,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceFiles {
    pub fn new() -> Self {
        Self {
            files: SimpleFiles::new(),
            ids: FxHashMap::default(),
        }
    }

    /// Register a file; re-adding a name replaces the lookup
    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) -> usize {
        let name = name.into();
        let id = self.files.add(name.clone(), source.into());
        self.ids.insert(name, id);
        id
    }

    pub fn id(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    /// File id and byte range of the line a location points at
    fn line_span(&self, location: &SourceLocation) -> Option<(usize, std::ops::Range<usize>)> {
        let id = self.id(&location.file)?;
        let line_index = (location.line as usize).checked_sub(1)?;
        let range = self.files.line_range(id, line_index).ok()?;
        // Drop the trailing newline from the label
        let source = self.files.get(id).ok()?.source();
        let end = source[range.clone()].trim_end_matches(['\n', '\r']).len() + range.start;
        Some((id, range.start..end))
    }

    pub fn inner(&self) -> &SimpleFiles<String, String> {
        &self.files
    }
}

/// A diagnostic message with source code context
pub struct Diagnostic {
    inner: CsDiagnostic<usize>,
    code: Option<ErrorCode>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Diagnostic {
            inner: CsDiagnostic::new(severity).with_message(message),
            code: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Set the error code
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.inner = self.inner.with_code(code.0);
        self.code = Some(code);
        self
    }

    /// Label the line a declaration sits on, when its file is known
    pub fn with_location_label(
        mut self,
        files: &SourceFiles,
        location: Option<&SourceLocation>,
        message: impl Into<String>,
    ) -> Self {
        let Some(location) = location else {
            return self;
        };
        match files.line_span(location) {
            Some((id, range)) => {
                let style = if self.inner.labels.is_empty() {
                    LabelStyle::Primary
                } else {
                    LabelStyle::Secondary
                };
                self.inner
                    .labels
                    .push(Label::new(style, id, range).with_message(message));
            }
            // Unknown file: keep the site in the notes
            None => self.inner.notes.push(format!("declared at {}", location)),
        }
        self
    }

    /// Add a note (additional context)
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.inner.notes.push(note.into());
        self
    }

    /// Add a help suggestion
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.inner.notes.push(format!("help: {}", help.into()));
        self
    }

    /// Create diagnostic from a ClassError
    pub fn from_class_error(error: &ClassError, files: &SourceFiles) -> Self {
        use ClassError::*;

        let location = error.location();
        match error {
            DuplicateMember { kind, name, .. } => {
                let table = match kind {
                    MemberKind::Property => "property",
                    MemberKind::Constant => "constant",
                    MemberKind::Method => "method",
                };
                let mut diag = Diagnostic::error(format!("{} '{}' was defined more than one time", kind, name))
                    .with_code(error_code(error))
                    .with_location_label(files, location, format!("duplicate {}", table));
                if *kind == MemberKind::Method {
                    diag = diag.with_note("method names are compared case-insensitively");
                }
                diag
            }

            UndefinedMethod { name, .. } => {
                Diagnostic::error(format!("Method '{}' does not exist", name))
                    .with_code(error_code(error))
                    .with_location_label(files, location, "method not declared")
            }

            MissingMethod { class, method, interface, .. } => Diagnostic::error(format!(
                "Class {} must implement a method called: \"{}\" as requirement of interface: \"{}\"",
                class, method, interface
            ))
            .with_code(error_code(error))
            .with_location_label(files, location, "missing interface method")
            .with_help(format!("add a method called '{}' or declare the class abstract", method)),

            ArityMismatch { class, method, interface, .. } => Diagnostic::error(format!(
                "Method {}::{}() does not have the same number of required parameters in interface: \"{}\"",
                class, method, interface
            ))
            .with_code(error_code(error))
            .with_location_label(files, location, "incompatible parameter count")
            .with_note(
                "an implementation may not require more parameters, nor accept fewer, than the interface declares",
            ),

            UnresolvableInterface { interface, class, is_class, .. } => {
                let mut diag = Diagnostic::error(format!(
                    "Cannot locate interface {} when implementing interfaces on {}",
                    interface, class
                ))
                .with_code(error_code(error))
                .with_location_label(files, location, "unknown interface");
                if *is_class {
                    diag = diag.with_note(format!("{} is currently a class", interface));
                }
                diag
            }

            InvalidSupertype { class, supertype, .. } => Diagnostic::error(format!(
                "Interface {} cannot extend {} because it is a class",
                class, supertype
            ))
            .with_code(error_code(error))
            .with_location_label(files, location, "invalid supertype"),

            UnmappableConstantType { class, constant, kind, .. } => Diagnostic::error(format!(
                "Cannot parse constant type '{}' of {}::{}",
                kind, class, constant
            ))
            .with_code(error_code(error))
            .with_note("only bool, int, double, string and null constants can be declared"),

            MissingCompilationContext { class, .. } => Diagnostic::error(format!(
                "A compilation context is required to reference external class {}",
                class
            ))
            .with_code(error_code(error))
            .with_location_label(files, location, "external class referenced here"),

            DuplicateClass { name, .. } => {
                Diagnostic::error(format!("Class {} was declared more than one time", name))
                    .with_code(error_code(error))
                    .with_location_label(files, location, "duplicate declaration")
            }

            SymbolCollision { first, second, symbol, .. } => Diagnostic::error(format!(
                "Classes {} and {} both map to the native symbol '{}'",
                first, second, symbol
            ))
            .with_code(error_code(error))
            .with_location_label(files, location, "colliding declaration")
            .with_help("rename one of the classes or namespaces"),

            Reflection { class, message, .. } => {
                Diagnostic::error(format!("Cannot reflect runtime class {}: {}", class, message))
                    .with_code(error_code(error))
            }
        }
    }

    /// Emit the diagnostic to stderr with colors
    pub fn emit(&self, files: &SourceFiles) -> Result<(), codespan_reporting::files::Error> {
        let mut writer = StandardStream::stderr(ColorChoice::Auto);
        self.emit_to(&mut writer, files)
    }

    /// Render into any color-aware writer
    pub fn emit_to(
        &self,
        writer: &mut dyn WriteColor,
        files: &SourceFiles,
    ) -> Result<(), codespan_reporting::files::Error> {
        let config = term::Config::default();
        term::emit(writer, &config, files.inner(), &self.inner)
    }

    /// Get the underlying codespan diagnostic (for testing/custom rendering)
    pub fn inner(&self) -> &CsDiagnostic<usize> {
        &self.inner
    }

    pub fn code(&self) -> Option<&ErrorCode> {
        self.code.as_ref()
    }

    /// Convert to JSON representation for IDE integration
    pub fn to_json(&self, files: &SourceFiles) -> Result<String, serde_json::Error> {
        let json_diag = JsonDiagnostic::from_diagnostic(self, files);
        serde_json::to_string_pretty(&json_diag)
    }
}

/// JSON representation of a diagnostic for IDE integration
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    /// Error code (e.g., "E1003")
    pub code: Option<String>,
    /// Severity level
    pub severity: String,
    /// Main error message
    pub message: String,
    /// Source locations with labels
    pub labels: Vec<JsonLabel>,
    /// Additional notes and help
    pub notes: Vec<String>,
}

/// JSON representation of a diagnostic label
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonLabel {
    pub file: String,
    /// 1-indexed
    pub line: usize,
    pub message: Option<String>,
    /// "primary" or "secondary"
    pub style: String,
}

impl JsonDiagnostic {
    pub fn from_diagnostic(diag: &Diagnostic, files: &SourceFiles) -> Self {
        let severity = match diag.inner.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Help => "help",
            Severity::Bug => "bug",
        };

        let labels = diag
            .inner
            .labels
            .iter()
            .filter_map(|label| {
                let file = files.inner().get(label.file_id).ok()?;
                let location = file.location((), label.range.start).ok()?;
                Some(JsonLabel {
                    file: file.name().to_string(),
                    line: location.line_number,
                    message: (!label.message.is_empty()).then(|| label.message.clone()),
                    style: match label.style {
                        LabelStyle::Primary => "primary",
                        LabelStyle::Secondary => "secondary",
                    }
                    .to_string(),
                })
            })
            .collect();

        JsonDiagnostic {
            code: diag.code.as_ref().map(|c| c.0.to_string()),
            severity: severity.to_string(),
            message: diag.inner.message.clone(),
            labels,
            notes: diag.inner.notes.clone(),
        }
    }
}

/// Get error code for a ClassError
pub fn error_code(error: &ClassError) -> ErrorCode {
    use ClassError::*;

    match error {
        DuplicateMember { .. } => ErrorCode("E1001"),
        UndefinedMethod { .. } => ErrorCode("E1002"),
        MissingMethod { .. } => ErrorCode("E1003"),
        ArityMismatch { .. } => ErrorCode("E1004"),
        UnresolvableInterface { .. } => ErrorCode("E1005"),
        InvalidSupertype { .. } => ErrorCode("E1006"),
        UnmappableConstantType { .. } => ErrorCode("E1007"),
        MissingCompilationContext { .. } => ErrorCode("E1008"),
        DuplicateClass { .. } => ErrorCode("E1009"),
        SymbolCollision { .. } => ErrorCode("E1010"),
        Reflection { .. } => ErrorCode("E1011"),
    }
}

/// Helper to create a single-file source map
pub fn create_files(name: impl Into<String>, source: impl Into<String>) -> SourceFiles {
    let mut files = SourceFiles::new();
    files.add(name, source);
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "namespace App;\n\nclass K implements I\n{\n}\n";

    fn arity_error() -> ClassError {
        ClassError::ArityMismatch {
            class: "App\\K".to_string(),
            method: "bar".to_string(),
            interface: "App\\I".to_string(),
            location: Some(SourceLocation::new("app/k.zep", 3)),
        }
    }

    #[test]
    fn test_diagnostic_with_code() {
        let diag = Diagnostic::error("Test error").with_code(ErrorCode("E1001"));
        assert_eq!(diag.code, Some(ErrorCode("E1001")));
        assert_eq!(diag.inner.severity, Severity::Error);
    }

    #[test]
    fn test_location_becomes_primary_label() {
        let files = create_files("app/k.zep", SOURCE);
        let diag = Diagnostic::from_class_error(&arity_error(), &files);

        assert_eq!(diag.code(), Some(&ErrorCode("E1004")));
        assert_eq!(diag.inner.labels.len(), 1);
        let label = &diag.inner.labels[0];
        assert_eq!(label.style, LabelStyle::Primary);
        assert_eq!(&SOURCE[label.range.clone()], "class K implements I");
    }

    #[test]
    fn test_unknown_file_goes_to_notes() {
        let files = SourceFiles::new();
        let diag = Diagnostic::from_class_error(&arity_error(), &files);
        assert!(diag.inner.labels.is_empty());
        assert!(diag.inner.notes.iter().any(|n| n == "declared at app/k.zep:3"));
    }

    #[test]
    fn test_rendered_output() {
        let files = create_files("app/k.zep", SOURCE);
        let diag = Diagnostic::from_class_error(&arity_error(), &files);

        let mut buffer = termcolor::Buffer::no_color();
        diag.emit_to(&mut buffer, &files).unwrap();
        let rendered = String::from_utf8(buffer.into_inner()).unwrap();

        assert!(rendered.contains("error[E1004]"));
        assert!(rendered.contains("app/k.zep:3"));
        assert!(rendered.contains("incompatible parameter count"));
    }

    #[test]
    fn test_json_output() {
        let files = create_files("app/k.zep", SOURCE);
        let diag = Diagnostic::from_class_error(&arity_error(), &files);
        let json = diag.to_json(&files).unwrap();

        let parsed: JsonDiagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.code.as_deref(), Some("E1004"));
        assert_eq!(parsed.severity, "error");
        assert_eq!(parsed.labels.len(), 1);
        assert_eq!(parsed.labels[0].file, "app/k.zep");
        assert_eq!(parsed.labels[0].line, 3);
    }

    #[test]
    fn test_unresolvable_interface_notes_class() {
        let error = ClassError::UnresolvableInterface {
            interface: "App\\Shape".to_string(),
            class: "App\\Circle".to_string(),
            is_class: true,
            location: None,
        };
        let diag = Diagnostic::from_class_error(&error, &SourceFiles::new());
        assert_eq!(diag.code(), Some(&ErrorCode("E1005")));
        assert!(diag.inner.notes.iter().any(|n| n.contains("currently a class")));
    }
}
