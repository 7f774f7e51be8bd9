use crate::error::NormalizeError;
use crate::pointer::Pointer;
use serde::Serialize;
use std::collections::BTreeMap;

/// An interchange-safe document value: every `Value` can be written as JSON
/// without loss.
///
/// Numbers keep their integer/float distinction through
/// `serde_json::Number`, which also rules out NaN and infinities.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Number(serde_json::Number),
    Boolean(bool),
    Null,
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// Tolerant lookup: returns `None` instead of failing when any segment
    /// is missing, is not a valid array index, or walks into a scalar.
    #[must_use]
    pub fn pointer(&self, pointer: &Pointer) -> Option<&Value> {
        pointer
            .segments()
            .iter()
            .try_fold(self, |value, segment| match value {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => parse_index(segment).and_then(|i| items.get(i)),
                _ => None,
            })
    }

    pub fn pointer_mut(&mut self, pointer: &Pointer) -> Option<&mut Value> {
        pointer
            .segments()
            .iter()
            .try_fold(self, |value, segment| match value {
                Value::Object(map) => map.get_mut(segment),
                Value::Array(items) => parse_index(segment).and_then(move |i| items.get_mut(i)),
                _ => None,
            })
    }

    /// Reads a top-level string field of an object value.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self {
            Value::Object(map) => map.get(key).and_then(Value::as_str),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

// Array indices are plain decimal numbers, "01" is not an index.
fn parse_index(segment: &str) -> Option<usize> {
    if segment.len() > 1 && segment.starts_with('0') {
        return None;
    }
    segment.parse().ok()
}

/// Converts a parsed YAML value into the interchange-safe model.
///
/// Mapping keys must be strings; YAML allows any value as a key but the
/// wire format does not. Tags are dropped and the tagged value is kept.
///
/// # Errors
/// Returns a `NormalizeError` naming the location of the first mapping with
/// a non-string key or the first non-finite number.
pub fn normalize(value: serde_yaml::Value) -> Result<Value, NormalizeError> {
    normalize_at(value, &mut Pointer::root())
}

fn normalize_at(value: serde_yaml::Value, at: &mut Pointer) -> Result<Value, NormalizeError> {
    Ok(match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Boolean(b),
        serde_yaml::Value::Number(n) => Value::Number(normalize_number(&n, at)?),
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                at.push(i.to_string());
                out.push(normalize_at(item, at)?);
                at.pop();
            }
            Value::Array(out)
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut out = BTreeMap::new();
            for (key, item) in mapping {
                let serde_yaml::Value::String(key) = key else {
                    return Err(NormalizeError::NonStringKey {
                        at: display_location(at),
                        key: describe_key(&key),
                    });
                };
                at.push(key.clone());
                let item = normalize_at(item, at)?;
                at.pop();
                out.insert(key, item);
            }
            Value::Object(out)
        }
        serde_yaml::Value::Tagged(tagged) => normalize_at(tagged.value, at)?,
    })
}

fn normalize_number(n: &serde_yaml::Number, at: &Pointer) -> Result<serde_json::Number, NormalizeError> {
    if let Some(i) = n.as_i64() {
        return Ok(i.into());
    }
    if let Some(u) = n.as_u64() {
        return Ok(u.into());
    }
    n.as_f64()
        .and_then(serde_json::Number::from_f64)
        .ok_or_else(|| NormalizeError::NonFiniteNumber {
            at: display_location(at),
        })
}

fn display_location(at: &Pointer) -> String {
    if at.is_root() {
        "/".to_string()
    } else {
        at.to_string()
    }
}

fn describe_key(key: &serde_yaml::Value) -> String {
    match serde_yaml::to_string(key) {
        Ok(text) => text.trim_end().to_string(),
        Err(_) => format!("{key:?}"),
    }
}
