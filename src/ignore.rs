//! Exclusion patterns read from the project's ignore file.
//!
//! Patterns are path globs over `/`-separated relative paths:
//!
//! * `*` matches any run of characters except `/`;
//! * `**` matches any run of characters, `/` included;
//! * `?` matches one character except `/`;
//! * `[abc]`, `[a-z]` and `[!abc]` match one character from (or not from) a set;
//! * `{a,b}` matches any of the comma-separated alternatives;
//! * `\` makes the next character literal.
//!
//! Before compiling, a pattern that is not anchored with a leading `/` is
//! prefixed with `**/` so that it matches at any depth, and a pattern ending
//! in `/` gets a `**` suffix so that it covers everything under the
//! directory. There is no negation: once a path matches any pattern it stays
//! excluded.

use crate::error::{GlobError, IgnoreError};
use log::{debug, trace};
use miette::NamedSource;
use regex::Regex;
use std::path::{Path, PathBuf};

/// A single compiled exclusion pattern.
#[derive(Debug, Clone)]
pub struct IgnorePattern {
    pattern: String,
    regex: Regex,
}

impl IgnorePattern {
    /// Normalizes and compiles a raw pattern line.
    ///
    /// # Errors
    /// Returns a `GlobError` describing why the glob could not be compiled.
    pub fn compile(raw: &str) -> Result<Self, GlobError> {
        let pattern = normalize_pattern(raw);
        let translated = GlobTranslator::new(&pattern).translate()?;
        let regex = Regex::new(&format!("^{translated}$"))?;
        Ok(Self { pattern, regex })
    }

    /// The pattern after normalization, e.g. `**/build/**` for `build/`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }
}

/// Applies the leading `**/` and trailing `**` rules.
#[must_use]
pub fn normalize_pattern(raw: &str) -> String {
    let mut pattern = String::with_capacity(raw.len() + 5);
    if !raw.starts_with('/') && !raw.starts_with("**/") {
        pattern.push_str("**/");
    }
    pattern.push_str(raw);
    if raw.ends_with('/') && !raw.ends_with("/**/") {
        pattern.push_str("**");
    }
    pattern
}

/// An ordered list of exclusion patterns.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses newline-separated patterns. Lines are trimmed and blank lines
    /// are skipped; `name` is only used to label errors.
    ///
    /// # Errors
    /// Returns `IgnoreError::InvalidPattern` for the first line that does not
    /// compile, with the line highlighted in the ignore file text.
    pub fn parse(data: &str, name: &str) -> Result<Self, IgnoreError> {
        let mut set = Self::new();
        let mut offset = 0;
        for (i, raw_line) in data.split_inclusive('\n').enumerate() {
            let line = raw_line.trim();
            if !line.is_empty() {
                set.patterns.push(IgnorePattern::compile(line).map_err(|reason| {
                    let start = offset + (raw_line.len() - raw_line.trim_start().len());
                    IgnoreError::InvalidPattern {
                        line: i + 1,
                        pattern: line.to_string(),
                        reason,
                        src: NamedSource::new(name, data.to_string()),
                        span: (start, line.len()).into(),
                    }
                })?);
            }
            offset += raw_line.len();
        }
        Ok(set)
    }

    /// Loads an ignore file; a file that does not exist yields an empty set.
    ///
    /// # Errors
    /// Returns `IgnoreError::Read` if the file exists but cannot be read, or
    /// `IgnoreError::InvalidPattern` if one of its lines does not compile.
    pub fn load_file_if_exists(path: &Path) -> Result<Self, IgnoreError> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                trace!("no ignore file at {}", path.display());
                return Ok(Self::new());
            }
            Err(source) => {
                return Err(IgnoreError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        debug!("loading ignore set from {}", path.display());
        Self::parse(&data, &path.to_string_lossy())
    }

    /// Loads the ignore file named `file_name` at the root of `dir`.
    ///
    /// # Errors
    /// See [`IgnoreSet::load_file_if_exists`].
    pub fn load_directory_if_exists(dir: &Path, file_name: &str) -> Result<Self, IgnoreError> {
        let path: PathBuf = dir.join(file_name);
        Self::load_file_if_exists(&path)
    }

    /// Compiles and appends one more pattern.
    ///
    /// # Errors
    /// Returns `IgnoreError::InvalidPattern` if the pattern does not compile.
    pub fn add_pattern(&mut self, raw: &str) -> Result<(), IgnoreError> {
        let pattern = IgnorePattern::compile(raw).map_err(|reason| IgnoreError::InvalidPattern {
            line: 1,
            pattern: raw.to_string(),
            reason,
            src: NamedSource::new("<pattern>", raw.to_string()),
            span: (0, raw.len()).into(),
        })?;
        self.patterns.push(pattern);
        Ok(())
    }

    pub fn patterns(&self) -> &[IgnorePattern] {
        &self.patterns
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// True if any pattern matches `path` as given.
    pub fn is_match(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(path))
    }

    /// Tests a path relative to the project root, such as `a/b/c.yaml`.
    ///
    /// The path is anchored as `/a/b/c.yaml` so that `/`-prefixed patterns
    /// only match from the root. Directories are also tested with a trailing
    /// slash, which lets `dir/` patterns exclude the directory itself.
    pub fn is_excluded(&self, relative: &str, is_dir: bool) -> bool {
        let anchored = format!("/{}", relative.trim_start_matches('/'));
        if self.is_match(&anchored) {
            return true;
        }
        is_dir && self.is_match(&format!("{anchored}/"))
    }
}

/// Translates glob syntax into an unanchored regular expression.
struct GlobTranslator<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    output: String,
}

impl<'a> GlobTranslator<'a> {
    fn new(pattern: &'a str) -> Self {
        Self {
            chars: pattern.chars().peekable(),
            output: String::with_capacity(pattern.len() * 2),
        }
    }

    fn translate(mut self) -> Result<String, GlobError> {
        self.sequence(0)?;
        Ok(self.output)
    }

    /// Translates until end of input or, inside braces, until the `,` or
    /// `}` that ends the current alternative (left unconsumed).
    fn sequence(&mut self, depth: usize) -> Result<(), GlobError> {
        while let Some(&c) = self.chars.peek() {
            if depth > 0 && (c == ',' || c == '}') {
                return Ok(());
            }
            self.chars.next();
            match c {
                '*' => {
                    if self.chars.peek() == Some(&'*') {
                        self.chars.next();
                        self.output.push_str(".*");
                    } else {
                        self.output.push_str("[^/]*");
                    }
                }
                '?' => self.output.push_str("[^/]"),
                '[' => self.class()?,
                '{' => self.alternatives(depth + 1)?,
                '\\' => match self.chars.next() {
                    Some(escaped) => self.literal(escaped),
                    None => return Err(GlobError::TrailingEscape),
                },
                other => self.literal(other),
            }
        }
        Ok(())
    }

    fn alternatives(&mut self, depth: usize) -> Result<(), GlobError> {
        self.output.push_str("(?:");
        loop {
            self.sequence(depth)?;
            match self.chars.next() {
                Some(',') => self.output.push('|'),
                Some('}') => break,
                _ => return Err(GlobError::UnclosedBrace),
            }
        }
        self.output.push(')');
        Ok(())
    }

    fn class(&mut self) -> Result<(), GlobError> {
        let negated = matches!(self.chars.peek(), Some('!' | '^'));
        if negated {
            self.chars.next();
        }

        let mut members = String::new();
        let mut empty = true;
        loop {
            let c = match self.chars.next() {
                Some(']') if !empty => break,
                Some(']') | None => return Err(GlobError::UnclosedClass),
                Some('\\') => self.chars.next().ok_or(GlobError::UnclosedClass)?,
                Some(c) => c,
            };
            empty = false;

            if self.chars.peek() == Some(&'-') {
                self.chars.next();
                match self.chars.next() {
                    Some(']') => {
                        push_class_char(&mut members, c);
                        push_class_char(&mut members, '-');
                        break;
                    }
                    Some(hi) => {
                        if hi < c {
                            return Err(GlobError::InvalidRange { lo: c, hi });
                        }
                        push_class_char(&mut members, c);
                        members.push('-');
                        push_class_char(&mut members, hi);
                    }
                    None => return Err(GlobError::UnclosedClass),
                }
            } else {
                push_class_char(&mut members, c);
            }
        }

        if negated {
            self.output.push_str(&format!("[^/{members}]"));
        } else {
            self.output.push_str(&format!("[{members}]"));
        }
        Ok(())
    }

    fn literal(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.output.push_str(&regex::escape(c.encode_utf8(&mut buf)));
    }
}

fn push_class_char(members: &mut String, c: char) {
    if matches!(c, '\\' | ']' | '[' | '^' | '-' | '&' | '~') {
        members.push('\\');
    }
    members.push(c);
}
