//! Operator registration side-table
//!
//! A host exposes the importer through named operators (menu entries, file
//! dialogs). This module keeps the descriptors those hosts need and dispatches
//! an invocation to the matching operator, turning the result into a single
//! finished/cancelled report.

use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::importer::{ImportConfig, export, import_with_config};
use crate::scene::SceneSink;

/// Identifier of the import operator
pub const IMPORT_OPERATOR_ID: &str = "import_3mf.3mf";

/// Identifier of the export operator
pub const EXPORT_OPERATOR_ID: &str = "export_3mf.3mf";

/// Direction of an operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
    /// Reads a file into the scene
    Import,
    /// Writes the scene to a file
    Export,
}

/// Static description of an operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorInfo {
    /// Unique identifier
    pub id: &'static str,
    /// Label shown on the operator
    pub label: &'static str,
    /// Text of the file menu entry
    pub menu_text: &'static str,
    /// File extension, including the dot
    pub filename_ext: &'static str,
    /// File dialog filter
    pub filter_glob: &'static str,
    /// Direction
    pub kind: OperatorKind,
}

/// Terminal report of one operator invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorOutcome {
    /// The operator completed; carries the message shown to the user
    Finished(String),
    /// The operator failed; carries the diagnostic shown to the user
    Cancelled(String),
}

impl OperatorOutcome {
    /// True for [`OperatorOutcome::Finished`]
    pub fn is_finished(&self) -> bool {
        matches!(self, OperatorOutcome::Finished(_))
    }

    /// The message or diagnostic
    pub fn message(&self) -> &str {
        match self {
            OperatorOutcome::Finished(message) | OperatorOutcome::Cancelled(message) => message,
        }
    }
}

/// An operator a host can invoke on a file path
///
/// # Example
///
/// ```ignore
/// struct Reload;
///
/// impl Operator for Reload {
///     fn info(&self) -> &OperatorInfo { &RELOAD_INFO }
///     fn execute(&self, path: &Path, sink: &mut dyn SceneSink) -> Result<String> {
///         Ok(format!("Reloaded {}", path.display()))
///     }
/// }
/// ```
pub trait Operator: Send + Sync {
    /// Descriptor of this operator
    fn info(&self) -> &OperatorInfo;

    /// Run the operator, returning the success message
    fn execute(&self, path: &Path, sink: &mut dyn SceneSink) -> Result<String>;
}

const IMPORT_INFO: OperatorInfo = OperatorInfo {
    id: IMPORT_OPERATOR_ID,
    label: "Import 3MF (3D Manufacturing Format)",
    menu_text: "3D Manufacturing Format (.3mf)",
    filename_ext: ".3mf",
    filter_glob: "*.3mf",
    kind: OperatorKind::Import,
};

const EXPORT_INFO: OperatorInfo = OperatorInfo {
    id: EXPORT_OPERATOR_ID,
    label: "Export 3MF (3D Manufacturing Format)",
    menu_text: "3D Manufacturing Format (.3mf)",
    filename_ext: ".3mf",
    filter_glob: "*.3mf",
    kind: OperatorKind::Export,
};

/// Imports a 3MF file with a fixed configuration
#[derive(Debug, Clone, Default)]
pub struct ImportOperator {
    config: ImportConfig,
}

impl ImportOperator {
    /// Create an import operator
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }
}

impl Operator for ImportOperator {
    fn info(&self) -> &OperatorInfo {
        &IMPORT_INFO
    }

    fn execute(&self, path: &Path, sink: &mut dyn SceneSink) -> Result<String> {
        let summary = import_with_config(path, sink, &self.config)?;
        Ok(format!(
            "Successfully imported {}: {}",
            path.display(),
            summary
        ))
    }
}

/// Export stub; every invocation is cancelled
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportOperator;

impl Operator for ExportOperator {
    fn info(&self) -> &OperatorInfo {
        &EXPORT_INFO
    }

    fn execute(&self, path: &Path, _sink: &mut dyn SceneSink) -> Result<String> {
        export(path)?;
        Ok(String::new())
    }
}

/// Registry of operators by id
#[derive(Clone, Default)]
pub struct OperatorRegistry {
    operators: Vec<Arc<dyn Operator>>,
}

impl OperatorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the 3MF import and export operators
    pub fn with_defaults(config: ImportConfig) -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ImportOperator::new(config)));
        registry.register(Arc::new(ExportOperator));
        registry
    }

    /// Register an operator, replacing any with the same id
    pub fn register(&mut self, operator: Arc<dyn Operator>) {
        let id = operator.info().id;
        self.operators.retain(|existing| existing.info().id != id);
        self.operators.push(operator);
    }

    /// Remove an operator by id
    pub fn unregister(&mut self, id: &str) -> bool {
        let before = self.operators.len();
        self.operators.retain(|existing| existing.info().id != id);
        self.operators.len() != before
    }

    /// Find an operator by id
    pub fn get(&self, id: &str) -> Option<&dyn Operator> {
        self.operators
            .iter()
            .find(|operator| operator.info().id == id)
            .map(|operator| operator.as_ref())
    }

    /// Descriptors of all registered operators, in registration order
    pub fn infos(&self) -> impl Iterator<Item = &OperatorInfo> + '_ {
        self.operators.iter().map(|operator| operator.info())
    }

    /// Run an operator and report the outcome
    pub fn invoke(&self, id: &str, path: &Path, sink: &mut dyn SceneSink) -> OperatorOutcome {
        let Some(operator) = self.get(id) else {
            return OperatorOutcome::Cancelled(format!("Unknown operator '{}'", id));
        };

        match operator.execute(path, sink) {
            Ok(message) => OperatorOutcome::Finished(message),
            Err(e) => {
                let verb = match operator.info().kind {
                    OperatorKind::Import => "import",
                    OperatorKind::Export => "export",
                };
                OperatorOutcome::Cancelled(format!("Failed to {} 3MF file: {}", verb, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MemoryScene;

    #[test]
    fn test_default_operators() {
        let registry = OperatorRegistry::with_defaults(ImportConfig::default());
        let import = registry.get(IMPORT_OPERATOR_ID).unwrap().info();
        assert_eq!(import.label, "Import 3MF (3D Manufacturing Format)");
        assert_eq!(import.filename_ext, ".3mf");
        assert_eq!(import.filter_glob, "*.3mf");
        assert_eq!(import.kind, OperatorKind::Import);
        assert_eq!(registry.infos().count(), 2);
    }

    #[test]
    fn test_export_is_cancelled() {
        let registry = OperatorRegistry::with_defaults(ImportConfig::default());
        let mut scene = MemoryScene::new();
        let outcome = registry.invoke(EXPORT_OPERATOR_ID, Path::new("out.3mf"), &mut scene);
        assert!(!outcome.is_finished());
        assert!(outcome.message().contains("[E4001]"));
        assert!(!Path::new("out.3mf").exists());
    }

    #[test]
    fn test_missing_file_is_cancelled() {
        let registry = OperatorRegistry::with_defaults(ImportConfig::default());
        let mut scene = MemoryScene::new();
        let outcome = registry.invoke(
            IMPORT_OPERATOR_ID,
            Path::new("/nonexistent/model.3mf"),
            &mut scene,
        );
        assert!(outcome.message().starts_with("Failed to import 3MF file"));
        assert!(scene.is_empty());
    }

    #[test]
    fn test_unknown_operator_and_unregister() {
        let mut registry = OperatorRegistry::with_defaults(ImportConfig::default());
        let mut scene = MemoryScene::new();
        let outcome = registry.invoke("import_obj.obj", Path::new("x.obj"), &mut scene);
        assert_eq!(
            outcome,
            OperatorOutcome::Cancelled("Unknown operator 'import_obj.obj'".to_string())
        );

        assert!(registry.unregister(EXPORT_OPERATOR_ID));
        assert!(!registry.unregister(EXPORT_OPERATOR_ID));
        assert!(registry.get(EXPORT_OPERATOR_ID).is_none());
    }

    #[test]
    fn test_register_replaces_same_id() {
        let mut registry = OperatorRegistry::new();
        registry.register(Arc::new(ImportOperator::default()));
        registry.register(Arc::new(ImportOperator::new(
            ImportConfig::new().with_strict_objects(true),
        )));
        assert_eq!(registry.infos().count(), 1);
    }
}
