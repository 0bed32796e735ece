//! Reactive form state for Rust UIs.
//!
//! A [`Form`] keeps three parallel trees (values, errors, touched flags) plus
//! submission metadata, addressed by path strings such as `users.0.name`.
//! Every write goes through a reducer; every read can be observed through
//! [`reactive::Cell`] and [`reactive::Derived`] handles.
//!
//! ```text
//! FormOptions → Form ─ register(name) → FieldBinding
//!                    ─ FieldArray::new(name) → FieldEntry (stable keys)
//!                    ─ handle_submit → validate (fields + whole form) → on_submit
//! ```
//!
//! # Quick Start
//!
//! ```rust
//! use formstate::{Form, FormOptions, RegisterOptions, SubmitHandler, Validator};
//! use futures::executor::block_on;
//! use serde_json::json;
//!
//! let form = Form::new(FormOptions::new(
//!     json!({ "name": "" }),
//!     SubmitHandler::sync(|values, helper| {
//!         println!("submitted {values}");
//!         helper.set_submitting(false);
//!     }),
//! ));
//!
//! let name = form.register(
//!     "name",
//!     RegisterOptions::validate(Validator::sync(|value| {
//!         value.as_str().filter(|s| s.is_empty()).map(|_| json!("required"))
//!     })),
//! );
//!
//! let status = block_on(form.handle_submit(None)).expect("validators run");
//! assert!(!status.is_submitted());
//! assert_eq!(name.error(), Some(json!("required")));
//! ```
//!
//! # Async
//!
//! Validators and submit handlers may be asynchronous. Operations return a
//! [`FormFuture`] that any single-threaded executor can drive. State changes
//! that do not depend on validation are applied before the future is
//! returned.
//!
//! # Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `yaml`  | yes     | [`FormConfig::from_yaml`] via the [`serde_saphyr`] crate. |

pub mod array;
pub mod config;
pub mod enums;
pub mod error;
pub mod field;
pub mod field_array;
pub mod form;
pub mod path;
pub mod reactive;
pub mod resolver;
pub mod store;
pub mod validate;
pub mod value;

pub(crate) mod registry;

pub use config::FormConfig;
pub use enums::{SubmitStatus, ValidateMode};
pub use error::*;
pub use field::{FieldAttrs, FieldBinding, FieldMeta, FieldName, FormEvent, RegisterOptions, TargetEvent};
pub use field_array::{FieldArray, FieldEntry};
pub use form::{Form, FormFuture, FormOptions, ResetState, SubmitHandler, SubmitHelper};
pub use resolver::{resolver, Schema, SchemaError, SchemaIssue};
pub use validate::Validator;

/// Builds a form from a JSON configuration and a submit handler.
///
/// # Errors
///
/// Returns a [`ConfigError`] when the configuration cannot be loaded.
///
/// # Example
///
/// ```rust
/// use formstate::SubmitHandler;
///
/// let form = formstate::load(
///     r#"{ "initialValues": { "email": "" }, "validateMode": "blur" }"#,
///     SubmitHandler::sync(|_, _| {}),
/// )
/// .expect("valid configuration");
/// assert_eq!(form.validate_mode(), formstate::ValidateMode::Blur);
/// ```
pub fn load(config: &str, on_submit: SubmitHandler) -> Result<Form, ConfigError> {
    let config = FormConfig::from_json(config)?;
    Ok(Form::new(FormOptions::from_config(config, on_submit)))
}
