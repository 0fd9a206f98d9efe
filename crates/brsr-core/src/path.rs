//! # Field Paths
//!
//! A [`FieldPath`] names a position in the nested report, one field name per
//! level. Its textual form is the dotted notation used by the presentation
//! layer, e.g. `sectionA.employees.permanent.male`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PathParseError;

/// Ordered sequence of field names from the registry root to a node.
///
/// The root path has no segments and displays as `(root)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// The empty path, addressing the registry root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Build a path from individual segments without validation.
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Returns a new path extended by one segment.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_string());
        Self(segments)
    }

    /// Append a segment in place.
    pub fn push(&mut self, segment: impl Into<String>) {
        self.0.push(segment.into());
    }

    /// Remove and return the last segment.
    pub fn pop(&mut self) -> Option<String> {
        self.0.pop()
    }

    /// The segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// The number of segments.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for the root path.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The last segment, if any.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("(root)")
        } else {
            f.write_str(&self.0.join("."))
        }
    }
}

impl FromStr for FieldPath {
    type Err = PathParseError;

    /// Parse dotted notation. An empty string is the root path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        let segments: Vec<String> = s.split('.').map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(PathParseError::EmptySegment {
                input: s.to_string(),
            });
        }
        Ok(Self(segments))
    }
}

impl TryFrom<String> for FieldPath {
    type Error = PathParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.0.join(".")
    }
}

impl<'a> IntoIterator for &'a FieldPath {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
