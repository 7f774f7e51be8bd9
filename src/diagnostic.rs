//! Maps server validation failures back to resource files.
//!
//! A rejected deploy request carries a list of `(pointer, reason)` pairs
//! whose pointers are rooted at the request body, e.g.
//! `/specs/2/data/steps/0/source`. The bundle index in the second segment
//! selects the origin of the failing document in the same
//! [`ResourceBundle`] that produced the request.

use crate::bundle::{ResourceBundle, PAYLOAD_FIELD};
use crate::error::DiagnosticError;
use crate::pointer::Pointer;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use thiserror::Error;

/// Error code of the server response carrying validation failures.
pub const INVALID_REQUEST_BODY: &str = "invalid_request_body";

/// One failure reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub pointer: String,
    pub reason: String,
}

/// Error envelope returned by the server on any failed request.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    #[serde(rename = "error")]
    pub message: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidRequestBody {
    #[serde(default)]
    pub jsv_errors: Vec<ValidationFailure>,
}

impl ApiError {
    /// Extracts the validation failures of an `invalid_request_body` error.
    /// Returns `Ok(None)` for any other error code.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if the error data does not have the
    /// expected shape.
    pub fn invalid_request_body(&self) -> Result<Option<InvalidRequestBody>, serde_json::Error> {
        if self.code != INVALID_REQUEST_BODY {
            return Ok(None);
        }
        match &self.data {
            Some(data) => InvalidRequestBody::deserialize(data).map(Some),
            None => Ok(Some(InvalidRequestBody::default())),
        }
    }
}

/// How a failing document is named in a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceId {
    /// Position of the document within its file.
    Document(usize),
    /// The document's own `type` and `name` fields.
    Named { kind: String, name: String },
}

impl Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceId::Document(n) => write!(f, "document {n}"),
            ResourceId::Named { kind, name } => write!(f, "{kind} {name:?}"),
        }
    }
}

/// A validation failure resolved to its source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub path: String,
    pub resource: ResourceId,
    /// Location inside the document, e.g. `data/steps/0/source`; `None` when
    /// the failure is about the document as a whole.
    pub field: Option<String>,
    pub reason: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: invalid {}: ", self.path, self.resource)?;
        if let Some(field) = &self.field {
            write!(f, "{field}: ")?;
        }
        f.write_str(&self.reason)
    }
}

/// Resolves one failure against the bundle that produced the request.
///
/// # Errors
/// Returns a `DiagnosticError` when the pointer is malformed, is not rooted
/// at the payload array, or names a bundle index that does not exist.
pub fn map_failure(
    bundle: &ResourceBundle,
    failure: &ValidationFailure,
) -> Result<Diagnostic, DiagnosticError> {
    let pointer = Pointer::parse(&failure.pointer)?;
    let segments = pointer.segments();

    if segments.first().map(String::as_str) != Some(PAYLOAD_FIELD) {
        return Err(DiagnosticError::UnexpectedRoot {
            pointer: failure.pointer.clone(),
            expected: PAYLOAD_FIELD.to_string(),
        });
    }

    let Some(index_segment) = segments.get(1) else {
        return Err(DiagnosticError::MissingIndex {
            pointer: failure.pointer.clone(),
        });
    };
    let index = parse_index(index_segment).ok_or_else(|| DiagnosticError::InvalidIndex {
        pointer: failure.pointer.clone(),
        index: index_segment.clone(),
    })?;

    let (origin, spec) = bundle.get(index).ok_or_else(|| DiagnosticError::IndexOutOfRange {
        pointer: failure.pointer.clone(),
        index,
        len: bundle.len(),
    })?;

    let field = pointer.skip(2);
    let mut resource = ResourceId::Document(origin.document);
    // "/specs/1/" names the document itself, not a field with an empty key.
    let whole_document = field.is_root() || matches!(field.segments(), [only] if only.is_empty());
    if whole_document {
        return Ok(Diagnostic {
            path: origin.path.clone(),
            resource,
            field: None,
            reason: failure.reason.clone(),
        });
    }

    if let (Some(kind), Some(name)) = (spec.get_str("type"), spec.get_str("name")) {
        if !kind.is_empty() && !name.is_empty() {
            resource = ResourceId::Named {
                kind: kind.to_string(),
                name: name.to_string(),
            };
        }
    }

    Ok(Diagnostic {
        path: origin.path.clone(),
        resource,
        field: Some(field.relative()),
        reason: failure.reason.clone(),
    })
}

/// Resolves every failure independently; an unusable pointer only affects
/// its own entry.
pub fn map_failures(
    bundle: &ResourceBundle,
    failures: &[ValidationFailure],
) -> Vec<Result<Diagnostic, DiagnosticError>> {
    failures.iter().map(|f| map_failure(bundle, f)).collect()
}

/// Renders all failures, one line each, in server order.
///
/// # Errors
/// Returns the first `DiagnosticError`: a pointer the client cannot place
/// means client and server disagree on the request format.
pub fn render_failures(
    bundle: &ResourceBundle,
    failures: &[ValidationFailure],
) -> Result<String, DiagnosticError> {
    let lines = map_failures(bundle, failures)
        .into_iter()
        .map(|d| d.map(|d| d.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

// Decimal digits only: "+1" and "" are not indices.
fn parse_index(segment: &str) -> Option<usize> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}
