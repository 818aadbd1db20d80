// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Dotted field paths and identifier validation.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FilterError, FilterResult};

/// Plain identifier: ASCII alphanumerics and underscore.
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("Invalid identifier pattern"));

/// Returns `true` if `segment` is a plain identifier.
pub fn is_identifier(segment: &str) -> bool {
    IDENTIFIER.is_match(segment)
}

/// Validates one identifier, naming `context` in the error.
pub fn validate_identifier(context: &str, segment: &str) -> FilterResult<()> {
    if is_identifier(segment) {
        Ok(())
    } else {
        tracing::warn!(path = %context, segment = %segment, "Rejected filter identifier");
        Err(FilterError::invalid_identifier(context, segment))
    }
}

// =============================================================================
// FieldPath
// =============================================================================

/// A dotted path such as `enrollments.student.user.id`.
///
/// Every segment but the last names a relationship; the last names a field.
/// Segments are not validated on construction; [`FieldPath::validate`] must
/// pass before a path is used to build query text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    /// Splits a dotted path.
    pub fn from_dotted(path: &str) -> Self {
        Self {
            segments: path.split('.').map(str::to_string).collect(),
        }
    }

    /// Returns all segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns the relationship segments (all but the last).
    pub fn relations(&self) -> &[String] {
        match self.segments.split_last() {
            Some((_, relations)) => relations,
            None => &[],
        }
    }

    /// Returns the final field segment.
    pub fn field(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Checks every segment against the identifier pattern.
    pub fn validate(&self) -> FilterResult<()> {
        if self.segments.is_empty() {
            return Err(FilterError::EmptyPath);
        }
        let dotted = self.to_string();
        for segment in &self.segments {
            validate_identifier(&dotted, segment)?;
        }
        Ok(())
    }

    /// Returns `true` if the value at this path in `instance` equals
    /// `expected`. Arrays along the way match if any element matches.
    pub fn matches(&self, instance: &Value, expected: &Value) -> bool {
        value_matches(instance, &self.segments, expected)
    }
}

fn value_matches(value: &Value, segments: &[String], expected: &Value) -> bool {
    if let Value::Array(items) = value {
        return items
            .iter()
            .any(|item| value_matches(item, segments, expected));
    }
    match segments.split_first() {
        None => value == expected,
        Some((head, rest)) => value
            .get(head.as_str())
            .is_some_and(|next| value_matches(next, rest, expected)),
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl From<&str> for FieldPath {
    fn from(path: &str) -> Self {
        Self::from_dotted(path)
    }
}

impl From<String> for FieldPath {
    fn from(path: String) -> Self {
        Self::from_dotted(&path)
    }
}

impl From<FieldPath> for String {
    fn from(path: FieldPath) -> Self {
        path.to_string()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_relations_and_field() {
        let path = FieldPath::from_dotted("enrollments.student.user.id");
        assert_eq!(path.relations(), &["enrollments", "student", "user"]);
        assert_eq!(path.field(), Some("id"));

        let flat = FieldPath::from_dotted("name");
        assert!(flat.relations().is_empty());
        assert_eq!(flat.field(), Some("name"));
    }

    #[test]
    fn test_validate() {
        assert!(FieldPath::from_dotted("teacher.user.id").validate().is_ok());
        assert!(FieldPath::from_dotted("final_grade").validate().is_ok());

        let err = FieldPath::from_dotted("teacher.user;DROP TABLE users.id")
            .validate()
            .unwrap_err();
        assert_eq!(
            err,
            FilterError::invalid_identifier("teacher.user;DROP TABLE users.id", "user;DROP TABLE users")
        );

        assert!(FieldPath::from_dotted("teacher..id").validate().is_err());
        assert!(FieldPath::from_dotted("id\"").validate().is_err());
        assert!(FieldPath::from_dotted("naïve").validate().is_err());
    }

    #[test]
    fn test_matches() {
        let path = FieldPath::from_dotted("teacher.user.id");
        let course = json!({ "teacher": { "user": { "id": 2 } } });
        assert!(path.matches(&course, &json!(2)));
        assert!(!path.matches(&course, &json!("2")));
        assert!(!path.matches(&json!({ "teacher": null }), &json!(2)));
    }

    #[test]
    fn test_matches_array_leaf() {
        let path = FieldPath::from_dotted("tags");
        assert!(path.matches(&json!({ "tags": ["a", "b"] }), &json!("b")));
    }
}
