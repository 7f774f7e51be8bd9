use crate::error::CompileError;
use log::debug;
use miette::{NamedSource, SourceSpan};
use serde::Deserialize;
use std::path::Path;

/// One YAML document of a resource file, numbered from 1 in file order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawDocument {
    pub path: String,
    pub document: usize,
    pub value: serde_yaml::Value,
}

/// Splits `source` into its YAML documents.
///
/// A file without any content (only blank lines and comments) has no
/// documents. `<<` merge keys are resolved in every document. `path` is
/// the name used in errors.
///
/// # Errors
/// Returns `CompileError::Syntax` for the first document that does not
/// parse or whose merge keys do not name mappings, with the parser's
/// position labelled in the file text when it has one.
pub fn load_documents(path: &str, source: &str) -> Result<Vec<RawDocument>, CompileError> {
    if is_blank(source) {
        return Ok(Vec::new());
    }

    let mut documents = Vec::new();
    for (i, deserializer) in serde_yaml::Deserializer::from_str(source).enumerate() {
        let document = i + 1;
        let mut value = serde_yaml::Value::deserialize(deserializer)
            .map_err(|err| syntax_error(path, document, source, &err))?;
        value
            .apply_merge()
            .map_err(|err| syntax_error(path, document, source, &err))?;
        documents.push(RawDocument {
            path: path.to_string(),
            document,
            value,
        });
    }
    Ok(documents)
}

/// Reads `relative` under `root` and splits it into documents.
///
/// # Errors
/// Returns `CompileError::ReadFile` if the file cannot be read as UTF-8 text,
/// or `CompileError::Syntax` as for [`load_documents`].
pub fn load_file(root: &Path, relative: &str) -> Result<Vec<RawDocument>, CompileError> {
    let path = root.join(relative);
    debug!("loading resource file {}", path.display());
    let source = std::fs::read_to_string(&path)
        .map_err(|source| CompileError::ReadFile { path, source })?;
    load_documents(relative, &source)
}

fn is_blank(source: &str) -> bool {
    source.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

fn syntax_error(path: &str, document: usize, source: &str, err: &serde_yaml::Error) -> CompileError {
    let span: SourceSpan = match err.location() {
        Some(location) => {
            let offset = location.index().min(source.len());
            let len = usize::from(offset < source.len());
            (offset, len).into()
        }
        None => (0, 0).into(),
    };
    CompileError::Syntax {
        path: path.to_string(),
        document,
        message: err.to_string(),
        src: NamedSource::new(path, source.to_string()),
        span,
    }
}
