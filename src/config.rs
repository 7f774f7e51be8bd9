use serde::Deserialize;

/// Name of the exclusion file looked up at the root of a project directory.
pub const DEFAULT_IGNORE_FILE: &str = ".evcli-ignore";

/// The document type whose steps get their `source` files inlined.
pub const DEFAULT_TASK_TYPE: &str = "task";

/// Knobs for a compilation pass.
///
/// Every field has a default, so hosts can embed a partial `compiler:`
/// section in their own configuration and deserialize it directly.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompileOptions {
    /// Exclusion file read from the compilation root when present.
    pub ignore_file: String,
    /// Candidate file suffixes without the dot, compared case-insensitively.
    pub extensions: Vec<String>,
    /// Document `type` that triggers source inlining.
    pub task_type: String,
    /// Patterns applied after the ones from the ignore file.
    pub extra_ignore: Vec<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            ignore_file: DEFAULT_IGNORE_FILE.to_string(),
            extensions: vec!["yml".to_string(), "yaml".to_string()],
            task_type: DEFAULT_TASK_TYPE.to_string(),
            extra_ignore: Vec::new(),
        }
    }
}

impl CompileOptions {
    /// Reads options from YAML (or JSON, which is valid YAML).
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` on malformed input or unknown fields.
    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    #[must_use]
    pub fn with_ignore_file(mut self, name: impl Into<String>) -> Self {
        self.ignore_file = name.into();
        self
    }

    #[must_use]
    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    #[must_use]
    pub fn with_extra_ignore(mut self, pattern: impl Into<String>) -> Self {
        self.extra_ignore.push(pattern.into());
        self
    }

    /// True if `file_name` ends with one of the configured extensions.
    #[must_use]
    pub fn is_candidate(&self, file_name: &str) -> bool {
        let Some((_, ext)) = file_name.rsplit_once('.') else {
            return false;
        };
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}
