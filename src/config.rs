//! Declarative form configuration.
//!
//! JSON and YAML inputs both go through a `serde_json::Value` first, so the
//! two formats share one set of checks and error kinds.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::ValidateMode;
use crate::error::{ConfigError, ConfigErrorKind};
use crate::form::{FormOptions, SubmitHandler};

/// The serializable part of [`FormOptions`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FormConfig {
    pub initial_values: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_errors: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_touched: Option<Value>,
    #[serde(default)]
    pub validate_mode: ValidateMode,
    #[serde(default = "default_re_validate_mode")]
    pub re_validate_mode: ValidateMode,
    #[serde(default)]
    pub validate_on_mounted: bool,
}

fn default_re_validate_mode() -> ValidateMode {
    ValidateMode::Change
}

impl FormConfig {
    pub fn from_json(input: &str) -> Result<FormConfig, ConfigError> {
        let value: Value = serde_json::from_str(input).map_err(|e| ConfigError {
            kind: ConfigErrorKind::Syntax,
            message: e.to_string(),
        })?;
        Self::from_value(value)
    }

    #[cfg(feature = "yaml")]
    pub fn from_yaml(input: &str) -> Result<FormConfig, ConfigError> {
        if input.trim().is_empty() {
            return Err(ConfigError {
                kind: ConfigErrorKind::Syntax,
                message: "empty input".to_string(),
            });
        }
        let value: Value = serde_saphyr::from_str(input).map_err(|e| ConfigError {
            kind: ConfigErrorKind::Syntax,
            message: e.to_string(),
        })?;
        Self::from_value(value)
    }

    /// Converts an already-parsed document.
    pub fn from_value(value: Value) -> Result<FormConfig, ConfigError> {
        let Some(root) = value.as_object() else {
            return Err(ConfigError {
                kind: ConfigErrorKind::Syntax,
                message: "form configuration must be a mapping".to_string(),
            });
        };
        if !root.contains_key("initialValues") {
            return Err(ConfigError {
                kind: ConfigErrorKind::MissingInitialValues,
                message: "missing required field: initialValues".to_string(),
            });
        }

        serde_json::from_value(value).map_err(|e| {
            let message = e.to_string();
            ConfigError {
                kind: classify_json_error(&message),
                message,
            }
        })
    }
}

fn classify_json_error(message: &str) -> ConfigErrorKind {
    if message.contains("unknown variant") {
        ConfigErrorKind::InvalidMode
    } else {
        ConfigErrorKind::Syntax
    }
}

impl FormOptions {
    /// Seeds the builder from a configuration.
    pub fn from_config(config: FormConfig, on_submit: SubmitHandler) -> FormOptions {
        let mut options = FormOptions::new(config.initial_values, on_submit)
            .validate_mode(config.validate_mode)
            .re_validate_mode(config.re_validate_mode)
            .validate_on_mounted(config.validate_on_mounted);
        if let Some(errors) = config.initial_errors {
            options = options.initial_errors(errors);
        }
        if let Some(touched) = config.initial_touched {
            options = options.initial_touched(touched);
        }
        options
    }
}
