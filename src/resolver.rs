//! Adapter from schema validators to whole-form [`Validator`]s.
//!
//! A schema reports a flat list of issues, each with a segment path. The
//! resolver keeps the first message per path, flattens union branches into
//! the same list, and nests the result into an error tree.

use serde_json::Value;
use std::fmt;
use thiserror::Error;

use crate::error::ValidatorError;
use crate::path;
use crate::store::empty_tree;
use crate::validate::Validator;

/// One step of an issue path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(key) => f.write_str(key),
            PathSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        PathSegment::Index(index)
    }
}

/// A single schema violation.
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaIssue {
    pub path: Vec<PathSegment>,
    pub message: String,
    /// Issues of each failed branch when the violation is a union mismatch.
    pub union_issues: Vec<Vec<SchemaIssue>>,
}

impl SchemaIssue {
    pub fn new(path: impl IntoIterator<Item = PathSegment>, message: impl Into<String>) -> Self {
        SchemaIssue {
            path: path.into_iter().collect(),
            message: message.into(),
            union_issues: Vec::new(),
        }
    }

    /// Builds an issue from a dotted/bracketed path string.
    pub fn at(path: &str, message: impl Into<String>) -> Self {
        let segments = path::string_to_path(path).into_iter().map(|segment| {
            match segment.parse::<usize>() {
                Ok(index) => PathSegment::Index(index),
                Err(_) => PathSegment::Key(segment),
            }
        });
        SchemaIssue::new(segments, message)
    }

    pub fn with_union(mut self, branches: Vec<Vec<SchemaIssue>>) -> Self {
        self.union_issues = branches;
        self
    }

    /// The path joined with `.`.
    pub fn dotted_path(&self) -> String {
        self.path
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".")
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
pub enum SchemaError {
    #[error("schema rejected the values ({} issue(s))", .0.len())]
    Invalid(Vec<SchemaIssue>),
    #[error("schema failed: {0}")]
    Other(String),
}

/// A schema that can check a values tree.
pub trait Schema {
    fn validate(&self, values: &Value) -> Result<(), SchemaError>;
}

impl<F> Schema for F
where
    F: Fn(&Value) -> Result<(), SchemaError>,
{
    fn validate(&self, values: &Value) -> Result<(), SchemaError> {
        self(values)
    }
}

/// Flattens issues (union branches included, breadth-first) into
/// `(path, message)` pairs, keeping only the first message per path.
pub fn flatten_issues(issues: Vec<SchemaIssue>) -> Vec<(String, String)> {
    let mut flat: Vec<(String, String)> = Vec::new();
    let mut queue = std::collections::VecDeque::from(issues);

    while let Some(issue) = queue.pop_front() {
        let path = issue.dotted_path();
        if !flat.iter().any(|(existing, _)| *existing == path) {
            flat.push((path, issue.message));
        }
        for branch in issue.union_issues {
            queue.extend(branch);
        }
    }
    flat
}

/// Nests flat `(path, message)` pairs into an error tree. A root-level
/// message is kept under the empty key.
pub fn to_nest_error(errors: impl IntoIterator<Item = (String, String)>) -> Value {
    let mut tree = empty_tree();
    for (path, message) in errors {
        if path.is_empty() {
            if let Value::Object(map) = &mut tree {
                map.insert(path, Value::String(message));
            }
        } else {
            path::set(&mut tree, &path, Value::String(message));
        }
    }
    tree
}

/// Wraps a schema as a whole-form validator.
///
/// A passing schema yields an empty error tree; [`SchemaError::Other`] is a
/// validator failure, not a validation error.
pub fn resolver<S: Schema + 'static>(schema: S) -> Validator {
    Validator::try_sync(move |values| match schema.validate(values) {
        Ok(()) => Ok(Some(empty_tree())),
        Err(SchemaError::Invalid(issues)) => Ok(Some(to_nest_error(flatten_issues(issues)))),
        Err(SchemaError::Other(message)) => Err(ValidatorError::new(message)),
    })
}
