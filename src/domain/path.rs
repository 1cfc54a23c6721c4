use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Dotted attribute path (`customer.address.city`) addressing a value inside an input mapping.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttrPath {
    segments: Vec<String>,
}

impl AttrPath {
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, AttrPathError> {
        let path = Self::unchecked(input);
        path.check()?;
        Ok(path)
    }

    /// Splits on `.` without validating; `check` must run before the path is used.
    pub fn unchecked(input: &str) -> Self {
        Self {
            segments: input.split('.').map(str::to_string).collect(),
        }
    }

    pub fn check(&self) -> Result<(), AttrPathError> {
        if self.segments.iter().all(String::is_empty) {
            return Err(AttrPathError::new(
                &self.to_string(),
                "path must not be empty",
            ));
        }
        match self.segments.iter().position(String::is_empty) {
            Some(index) => Err(AttrPathError::new(
                &self.to_string(),
                format!("segment {index} is empty"),
            )),
            None => Ok(()),
        }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns `self` extended by every segment of `other`.
    pub fn join(&self, other: &AttrPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    pub fn child(&self, key: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(key.into());
        Self { segments }
    }

    /// Resolves the path against `root`.
    ///
    /// `None` means the key is missing: either a segment is absent or an
    /// intermediate value is not an object. A present `null` is `Some(Value::Null)`.
    pub fn lookup<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            match current {
                Value::Object(map) => current = map.get(segment)?,
                _ => return None,
            }
        }
        Some(current)
    }
}

impl fmt::Display for AttrPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.segments.join("."))
    }
}

/// Presence state of an attribute before any predicate runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Missing,
    Nil,
    /// Empty string, array or object. Whitespace-only strings are filled.
    Blank,
    Filled,
}

impl Presence {
    pub fn of(value: Option<&Value>) -> Self {
        match value {
            None => Self::Missing,
            Some(Value::Null) => Self::Nil,
            Some(value) if is_blank(value) => Self::Blank,
            Some(_) => Self::Filled,
        }
    }
}

pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::String(text) => text.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid attribute path `{input}`: {reason}")]
pub struct AttrPathError {
    input: String,
    reason: String,
}

impl AttrPathError {
    fn new(input: &str, reason: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
