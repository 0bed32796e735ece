use thiserror::Error;

/// Raised by a validator whose own code failed (as opposed to reporting a
/// validation error for the value it was given).
///
/// Validation failures are never errors: they are returned as `Ok(Some(..))`
/// and land in the form's error tree.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("validator for '{path}' failed: {message}")]
pub struct ValidatorError {
    /// Field path of the failing validator, or empty for the whole-form validator.
    pub path: String,
    pub message: String,
}

impl ValidatorError {
    pub fn new(message: impl Into<String>) -> Self {
        ValidatorError {
            path: String::new(),
            message: message.into(),
        }
    }

    pub(crate) fn at(mut self, path: &str) -> Self {
        if self.path.is_empty() {
            self.path = path.to_string();
        }
        self
    }
}

/// Produced by an asynchronous submit handler that did not complete.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct SubmitError {
    pub message: String,
}

impl SubmitError {
    pub fn new(message: impl Into<String>) -> Self {
        SubmitError {
            message: message.into(),
        }
    }
}

/// Error kind for configuration loading failures.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigErrorKind {
    Syntax,
    MissingInitialValues,
    InvalidMode,
}

/// Produced when a declarative form configuration cannot be loaded.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ConfigError {
    pub kind: ConfigErrorKind,
    pub message: String,
}

/// Errors surfaced by form operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FormError {
    /// A registered validator (field or whole-form) failed to run.
    #[error(transparent)]
    Validator(#[from] ValidatorError),
    /// A binding outlived the form or field array it was created from.
    #[error("'{name}' is not attached to a live form context")]
    MissingContext { name: String },
}
