//! Slash-separated value locations with `~0`/`~1` escaping.
//!
//! The server reports validation failures as pointers rooted at the request
//! body, and the compiler uses the same syntax to name locations inside a
//! document.

use crate::error::PointerError;
use std::fmt::{self, Display};

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Pointer {
    segments: Vec<String>,
}

impl Pointer {
    /// The empty pointer, which denotes the whole value.
    #[must_use]
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a pointer such as `/specs/2/data/steps/0/source`.
    ///
    /// The empty string is the root pointer. Any other pointer must start
    /// with `/`, and `~` may only appear as `~0` or `~1`.
    ///
    /// # Errors
    /// Returns a `PointerError` if the leading slash is missing or an escape
    /// sequence is malformed.
    pub fn parse(input: &str) -> Result<Self, PointerError> {
        if input.is_empty() {
            return Ok(Self::root());
        }
        let Some(rest) = input.strip_prefix('/') else {
            return Err(PointerError::MissingLeadingSlash(input.to_string()));
        };

        let mut segments = Vec::new();
        let mut offset = 1;
        for raw in rest.split('/') {
            segments.push(unescape(raw).map_err(|at| PointerError::InvalidEscape {
                pointer: input.to_string(),
                offset: offset + at,
            })?);
            offset += raw.len() + 1;
        }
        Ok(Self { segments })
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    pub fn pop(&mut self) -> Option<String> {
        self.segments.pop()
    }

    /// Returns a copy of this pointer extended by one segment.
    #[must_use]
    pub fn join(&self, segment: impl Into<String>) -> Self {
        let mut child = self.clone();
        child.push(segment);
        child
    }

    /// The pointer made of the segments after the first `n`.
    #[must_use]
    pub fn skip(&self, n: usize) -> Self {
        Self {
            segments: self.segments.iter().skip(n).cloned().collect(),
        }
    }

    /// Encodes the segments without the leading slash, e.g. `data/steps/0`.
    #[must_use]
    pub fn relative(&self) -> String {
        self.segments
            .iter()
            .map(|s| escape(s))
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl Display for Pointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "/{}", escape(segment))?;
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for Pointer {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

fn escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

/// Decodes one segment; on failure returns the byte offset of the bad `~`.
fn unescape(raw: &str) -> Result<String, usize> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some((_, '0')) => out.push('~'),
            Some((_, '1')) => out.push('/'),
            _ => return Err(i),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decodes_escapes() {
        let ptr = Pointer::parse("/specs/0/a~1b/c~0d/~01").unwrap();
        assert_eq!(ptr.segments(), ["specs", "0", "a/b", "c~d", "~1"]);
    }

    #[test]
    fn test_display_re_encodes() {
        let ptr: Pointer = ["data", "a/b", "c~d"].into_iter().collect();
        assert_eq!(ptr.to_string(), "/data/a~1b/c~0d");
        assert_eq!(ptr.relative(), "data/a~1b/c~0d");
    }

    #[test]
    fn test_root_and_empty_segments() {
        assert!(Pointer::parse("").unwrap().is_root());
        assert_eq!(Pointer::parse("/").unwrap().segments(), [""]);
        assert_eq!(Pointer::parse("/a//b").unwrap().segments(), ["a", "", "b"]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            Pointer::parse("specs/0"),
            Err(PointerError::MissingLeadingSlash("specs/0".to_string()))
        );
        assert_eq!(
            Pointer::parse("/specs/a~2"),
            Err(PointerError::InvalidEscape {
                pointer: "/specs/a~2".to_string(),
                offset: 8,
            })
        );
        assert!(Pointer::parse("/trailing~").is_err());
    }

    #[test]
    fn test_skip() {
        let ptr = Pointer::parse("/specs/2/data/steps").unwrap();
        assert_eq!(ptr.skip(2).relative(), "data/steps");
        assert!(ptr.skip(5).is_root());
    }
}
