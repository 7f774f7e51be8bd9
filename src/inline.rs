use crate::bundle::Origin;
use crate::error::CompileError;
use crate::pointer::Pointer;
use crate::value::Value;
use log::debug;
use std::path::{Path, PathBuf};

/// The document's top-level `type`, if it is a string.
pub fn spec_type(spec: &Value) -> Option<&str> {
    spec.pointer(&Pointer::from_iter(["type"]))
        .and_then(Value::as_str)
}

/// Copies the content of every step's `source` file into the step's `code`
/// field, for documents whose type is `task_type`.
///
/// Source paths are relative to `root`, the compilation root, whatever the
/// location of the document's own file. Steps without a `source` field and
/// documents without a `data.steps` array are left untouched; checking the
/// rest of the task is up to the server. Returns whether the document was a
/// task.
///
/// # Errors
/// Returns `CompileError::SourceNotString` if a step's `source` is not a
/// string and `CompileError::SourceUnreadable` if the file cannot be read.
pub fn inline_task_sources(
    spec: &mut Value,
    root: &Path,
    task_type: &str,
    origin: &Origin,
) -> Result<bool, CompileError> {
    if spec_type(spec) != Some(task_type) {
        return Ok(false);
    }

    let steps_pointer: Pointer = ["data", "steps"].into_iter().collect();
    let Some(Value::Array(steps)) = spec.pointer_mut(&steps_pointer) else {
        return Ok(true);
    };

    for (i, step) in steps.iter_mut().enumerate() {
        let Value::Object(step) = step else {
            continue;
        };
        let source_path = match step.get("source") {
            None => continue,
            Some(Value::String(source)) => resolve_source(root, source),
            Some(_) => {
                return Err(CompileError::SourceNotString {
                    path: origin.path.clone(),
                    document: origin.document,
                    step: i,
                })
            }
        };

        debug!("loading task step source file {}", source_path.display());
        let code = std::fs::read_to_string(&source_path).map_err(|source| {
            CompileError::SourceUnreadable {
                path: origin.path.clone(),
                document: origin.document,
                source_path: source_path.clone(),
                source,
            }
        })?;
        step.insert("code".to_string(), Value::String(code));
    }

    Ok(true)
}

// A leading slash still means "from the project root".
fn resolve_source(root: &Path, source: &str) -> PathBuf {
    root.join(source.trim_start_matches('/'))
}
