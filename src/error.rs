use miette::{Diagnostic, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

/// Any failure of a compilation pass. Compilation is fail-fast: the first
/// error aborts the pass and no partial bundle is returned.
#[derive(Error, Debug, Diagnostic)]
pub enum CompileError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Ignore(#[from] IgnoreError),

    #[error("cannot read directory {}", .path.display())]
    #[diagnostic(
        code(compiler::walk),
        help("Check that the directory exists and is readable.")
    )]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("cannot read {}", .path.display())]
    #[diagnostic(code(compiler::read_file))]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: document {document} is not valid yaml: {message}")]
    #[diagnostic(
        code(compiler::syntax),
        help("Fix the yaml syntax of this document; nothing was deployed.")
    )]
    Syntax {
        path: String,
        document: usize,
        message: String,
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: SourceSpan,
    },

    #[error("{path}: document {document} is not a valid json value")]
    #[diagnostic(code(compiler::normalize))]
    Normalize {
        path: String,
        document: usize,
        #[source]
        #[diagnostic_source]
        source: NormalizeError,
    },

    #[error("{path}: cannot load task source for document {document}: step {step} has a non-string source")]
    #[diagnostic(
        code(compiler::source_not_string),
        help("The `source` field of a step must be a path relative to the project directory.")
    )]
    SourceNotString {
        path: String,
        document: usize,
        step: usize,
    },

    #[error("{path}: cannot load task source for document {document}: cannot read file {}", .source_path.display())]
    #[diagnostic(code(compiler::source_unreadable))]
    SourceUnreadable {
        path: String,
        document: usize,
        source_path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, Diagnostic)]
pub enum IgnoreError {
    #[error("invalid glob pattern {pattern:?} on line {line}: {reason}")]
    #[diagnostic(
        code(ignore::invalid_pattern),
        help("Patterns support `*`, `**`, `?`, character classes, alternatives and `\\` escapes.")
    )]
    InvalidPattern {
        line: usize,
        pattern: String,
        reason: GlobError,
        #[source_code]
        src: NamedSource<String>,
        #[label("{reason}")]
        span: SourceSpan,
    },

    #[error("cannot read {}", .path.display())]
    #[diagnostic(code(ignore::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Why a glob pattern could not be compiled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GlobError {
    #[error("trailing escape character")]
    TrailingEscape,

    #[error("unclosed '['")]
    UnclosedClass,

    #[error("unclosed '{{'")]
    UnclosedBrace,

    #[error("invalid range '{lo}-{hi}'")]
    InvalidRange { lo: char, hi: char },

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// A parsed value that cannot be represented in the wire format.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum NormalizeError {
    #[error("{at}: mapping key {key} is not a string")]
    #[diagnostic(
        code(normalize::non_string_key),
        help("Quote the key so that it is read as a string.")
    )]
    NonStringKey { at: String, key: String },

    #[error("{at}: number is not finite")]
    #[diagnostic(code(normalize::non_finite_number))]
    NonFiniteNumber { at: String },
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum PointerError {
    #[error("pointer {0:?} does not start with '/'")]
    MissingLeadingSlash(String),

    #[error("pointer {pointer:?} contains an invalid escape sequence at byte {offset}")]
    InvalidEscape { pointer: String, offset: usize },
}

/// The server returned a failure location this client cannot interpret.
///
/// These indicate a contract mismatch between client and server rather
/// than a mistake in the resource files.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum DiagnosticError {
    #[error("invalid json pointer in error response")]
    #[diagnostic(code(diagnostic::invalid_pointer))]
    InvalidPointer(#[from] PointerError),

    #[error("invalid json pointer {pointer:?} in error response: expected it to start with /{expected}")]
    #[diagnostic(code(diagnostic::unexpected_root))]
    UnexpectedRoot { pointer: String, expected: String },

    #[error("invalid json pointer {pointer:?} in error response: missing document index")]
    #[diagnostic(code(diagnostic::missing_index))]
    MissingIndex { pointer: String },

    #[error("invalid document index {index:?} in json pointer {pointer:?}")]
    #[diagnostic(code(diagnostic::invalid_index))]
    InvalidIndex { pointer: String, index: String },

    #[error("invalid document index {index} in json pointer {pointer:?}: the bundle has {len} documents")]
    #[diagnostic(code(diagnostic::index_out_of_range))]
    IndexOutOfRange {
        pointer: String,
        index: usize,
        len: usize,
    },
}
