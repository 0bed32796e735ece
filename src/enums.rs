//! Closed enumerations used by the form engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ConfigError, ConfigErrorKind};

/// The user-interaction category that causes validation to run.
///
/// The active mode is `validate_mode` until the first submit attempt and
/// `re_validate_mode` afterwards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidateMode {
    Blur,
    Input,
    Change,
    #[default]
    Submit,
}

impl ValidateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidateMode::Blur => "blur",
            ValidateMode::Input => "input",
            ValidateMode::Change => "change",
            ValidateMode::Submit => "submit",
        }
    }
}

impl fmt::Display for ValidateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValidateMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "blur" => Ok(ValidateMode::Blur),
            "input" => Ok(ValidateMode::Input),
            "change" => Ok(ValidateMode::Change),
            "submit" => Ok(ValidateMode::Submit),
            other => Err(ConfigError {
                kind: ConfigErrorKind::InvalidMode,
                message: format!(
                    "unknown validate mode '{}' (expected blur, input, change or submit)",
                    other
                ),
            }),
        }
    }
}

/// Outcome of a submit attempt once validation has settled.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitStatus {
    /// Validation passed and the submit handler was invoked.
    Submitted,
    /// Validation failed; carries the error tree passed to `on_invalid`.
    Invalid(serde_json::Value),
}

impl SubmitStatus {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitStatus::Submitted)
    }
}
