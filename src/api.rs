use crate::bundle::{BundleEntry, Origin, ResourceBundle};
use crate::config::CompileOptions;
use crate::discovery::find_resource_files;
use crate::error::CompileError;
use crate::ignore::IgnoreSet;
use crate::inline::inline_task_sources;
use crate::loader::{load_file, RawDocument};
use crate::value::normalize;
use log::debug;
use std::path::{Path, PathBuf};

/// Compiles a project directory into a deployment bundle.
///
/// Each invocation walks and reads the whole tree again; nothing is cached.
#[derive(Debug, Clone)]
pub struct Compiler {
    root: PathBuf,
    options: CompileOptions,
}

impl Compiler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            options: CompileOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Reads the project's ignore file, if any, and appends the extra
    /// patterns from the options.
    ///
    /// # Errors
    /// Returns `CompileError::Ignore` if the file cannot be read or a pattern
    /// does not compile.
    pub fn load_ignore_set(&self) -> Result<IgnoreSet, CompileError> {
        let mut ignore = IgnoreSet::load_directory_if_exists(&self.root, &self.options.ignore_file)?;
        for pattern in &self.options.extra_ignore {
            ignore.add_pattern(pattern)?;
        }
        Ok(ignore)
    }

    /// Lists the resource files that a compilation would read.
    ///
    /// # Errors
    /// Returns a `CompileError` if the ignore file is invalid or a directory
    /// cannot be read.
    pub fn find_files(&self) -> Result<Vec<String>, CompileError> {
        let ignore = self.load_ignore_set()?;
        find_resource_files(&self.root, &ignore, &self.options)
    }

    /// Runs the full pipeline: discovery, loading, normalization and source
    /// inlining, in file order and then document order.
    ///
    /// # Errors
    /// Returns the first `CompileError` encountered; no partial bundle is
    /// ever returned.
    pub fn compile(&self) -> Result<ResourceBundle, CompileError> {
        let mut bundle = ResourceBundle::new();
        for relative in self.find_files()? {
            for document in load_file(&self.root, &relative)? {
                bundle.push(self.compile_document(document)?);
            }
        }
        debug!(
            "compiled {} documents from {}",
            bundle.len(),
            self.root.display()
        );
        Ok(bundle)
    }

    /// Normalizes one raw document and inlines its step sources.
    ///
    /// # Errors
    /// Returns `CompileError::Normalize` for values the wire format cannot
    /// carry, or an inlining error for task documents.
    pub fn compile_document(&self, document: RawDocument) -> Result<BundleEntry, CompileError> {
        let origin = Origin {
            path: document.path,
            document: document.document,
        };
        let mut spec = normalize(document.value).map_err(|source| CompileError::Normalize {
            path: origin.path.clone(),
            document: origin.document,
            source,
        })?;
        inline_task_sources(&mut spec, &self.root, &self.options.task_type, &origin)?;
        Ok(BundleEntry { origin, spec })
    }
}

/// Compiles `root` with the default options.
///
/// This is the primary entry point: it reads the `.evcli-ignore` file at
/// the root if there is one, collects every `.yml`/`.yaml` file that is not
/// excluded, and returns their documents as a [`ResourceBundle`] ready to be
/// sent as a deploy request.
///
/// # Errors
/// Returns a `CompileError` if any file or document cannot be compiled.
pub fn compile(root: &Path) -> Result<ResourceBundle, CompileError> {
    Compiler::new(root).compile()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_documents;

    #[test]
    fn test_compile_document_attaches_origin() {
        let compiler = Compiler::new("/unused");
        let document = load_documents("a.yaml", "---\nname: x\n---\nname: y\n")
            .unwrap()
            .pop()
            .unwrap();
        let entry = compiler.compile_document(document).unwrap();
        assert_eq!(
            entry.origin,
            Origin {
                path: "a.yaml".to_string(),
                document: 2
            }
        );
        assert_eq!(entry.spec.get_str("name"), Some("y"));
    }

    #[test]
    fn test_compile_document_reports_non_string_key() {
        let compiler = Compiler::new("/unused");
        let document = load_documents("ports.yaml", "a: 1\n---\n8080: web\n")
            .unwrap()
            .pop()
            .unwrap();
        let err = compiler.compile_document(document).unwrap_err();
        assert_eq!(
            err.to_string(),
            "ports.yaml: document 2 is not a valid json value"
        );
    }

    #[test]
    fn test_custom_task_type() {
        let compiler = Compiler::new("/unused")
            .with_options(CompileOptions::default().with_task_type("job"));
        let document = load_documents("t.yaml", "type: task\ndata:\n  steps:\n    - source: missing.sh\n")
            .unwrap()
            .pop()
            .unwrap();
        assert!(compiler.compile_document(document).is_ok());
    }
}
