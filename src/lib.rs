//! Compiles a project directory of YAML resource definitions into a single
//! deployment bundle, and maps validation failures returned by the server
//! back to the file and document they came from.
//!
//! ```no_run
//! use resource_compiler::{compile, render_failures, ValidationFailure};
//! use std::path::Path;
//!
//! let bundle = compile(Path::new("my-project")).unwrap();
//! let body = bundle.to_json().unwrap();
//! // ... send `body`, and on rejection:
//! let failures = vec![ValidationFailure {
//!     pointer: "/specs/0/data".to_string(),
//!     reason: "is required".to_string(),
//! }];
//! println!("{}", render_failures(&bundle, &failures).unwrap());
//! ```

pub mod api;
pub mod bundle;
pub mod config;
pub mod diagnostic;
pub mod discovery;
pub mod error;
pub mod ignore;
pub mod inline;
pub mod loader;
pub mod pointer;
pub mod value;

pub use api::{compile, Compiler};
pub use bundle::{BundleEntry, Origin, ResourceBundle};
pub use config::CompileOptions;
pub use diagnostic::{map_failure, map_failures, render_failures, Diagnostic, ResourceId, ValidationFailure};
pub use error::{CompileError, DiagnosticError, GlobError};
pub use value::Value;
