use crate::value::Value;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Name of the request body field holding the compiled documents. Failure
/// pointers returned by the server are rooted at this field.
pub const PAYLOAD_FIELD: &str = "specs";

/// Where a compiled document came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    /// Path relative to the compilation root, `/`-separated.
    pub path: String,
    /// 1-based position of the document within its file.
    pub document: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BundleEntry {
    pub origin: Origin,
    pub spec: Value,
}

/// The compiled documents of a project, in discovery order.
///
/// Specs and origins are stored as two arrays sharing the same index: the
/// bundle index of a document is its position in the request body and the
/// key used to trace a server failure back to its file. Entries are only
/// ever appended together, so the arrays cannot drift apart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceBundle {
    specs: Vec<Value>,
    origins: Vec<Origin>,
}

impl ResourceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry and returns its bundle index.
    pub fn push(&mut self, entry: BundleEntry) -> usize {
        self.specs.push(entry.spec);
        self.origins.push(entry.origin);
        self.specs.len() - 1
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// The wire payload.
    pub fn specs(&self) -> &[Value] {
        &self.specs
    }

    /// Local metadata, never transmitted.
    pub fn origins(&self) -> &[Origin] {
        &self.origins
    }

    pub fn get(&self, index: usize) -> Option<(&Origin, &Value)> {
        Some((self.origins.get(index)?, self.specs.get(index)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Origin, &Value)> {
        self.origins.iter().zip(&self.specs)
    }

    /// Serializes the request body, `{"specs": [...]}`.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the request body as pretty-printed JSON.
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for ResourceBundle {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut body = serializer.serialize_struct("ResourceBundle", 1)?;
        body.serialize_field(PAYLOAD_FIELD, &self.specs)?;
        body.end()
    }
}

impl Extend<BundleEntry> for ResourceBundle {
    fn extend<I: IntoIterator<Item = BundleEntry>>(&mut self, iter: I) {
        for entry in iter {
            self.push(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, document: usize, name: &str) -> BundleEntry {
        let mut spec = std::collections::BTreeMap::new();
        spec.insert("name".to_string(), Value::from(name));
        BundleEntry {
            origin: Origin {
                path: path.to_string(),
                document,
            },
            spec: Value::Object(spec),
        }
    }

    #[test]
    fn test_push_keeps_arrays_aligned() {
        let mut bundle = ResourceBundle::new();
        assert_eq!(bundle.push(entry("a.yaml", 1, "x")), 0);
        assert_eq!(bundle.push(entry("a.yaml", 2, "y")), 1);
        bundle.extend([entry("b.yaml", 1, "x")]);

        assert_eq!(bundle.len(), 3);
        assert_eq!(bundle.specs().len(), bundle.origins().len());
        let (origin, spec) = bundle.get(2).unwrap();
        assert_eq!(origin.path, "b.yaml");
        assert_eq!(spec.get_str("name"), Some("x"));
        assert!(bundle.get(3).is_none());
    }

    #[test]
    fn test_no_deduplication() {
        let mut bundle = ResourceBundle::new();
        bundle.extend([entry("a.yaml", 1, "same"), entry("b.yaml", 1, "same")]);
        assert_eq!(bundle.len(), 2);
        assert_eq!(bundle.specs()[0], bundle.specs()[1]);
    }

    #[test]
    fn test_serializes_specs_only() {
        let mut bundle = ResourceBundle::new();
        bundle.push(entry("a.yaml", 1, "x"));
        assert_eq!(bundle.to_json().unwrap(), r#"{"specs":[{"name":"x"}]}"#);
        assert_eq!(ResourceBundle::new().to_json().unwrap(), r#"{"specs":[]}"#);
    }
}
