//! Validation orchestration: validators, error-tree merging and timing.
//!
//! A run starts every registered field validator and the whole-form validator
//! together, waits for all of them, and deep-merges the two error trees.

use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use tracing::debug;

use crate::enums::ValidateMode;
use crate::error::ValidatorError;
use crate::path;
use crate::store::empty_tree;
use crate::value::is_empty_error;

/// Future returned by a [`Validator`]: `Ok(None)` (or an empty value) means
/// valid, `Ok(Some(error))` carries the error leaf or subtree.
pub type ValidationFuture = LocalBoxFuture<'static, Result<Option<Value>, ValidatorError>>;

// ─── Validator ──────────────────────────────────────────────────────────────

/// A field-level or whole-form validator.
///
/// Field validators receive the current value at their path and return an
/// error string, an array of strings, or an error subtree. The whole-form
/// validator receives the full values tree and returns an error tree.
#[derive(Clone)]
pub struct Validator {
    run: Rc<dyn Fn(&Value) -> ValidationFuture>,
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Validator")
    }
}

impl Validator {
    /// Wraps a synchronous validator.
    pub fn sync<F>(validate: F) -> Self
    where
        F: Fn(&Value) -> Option<Value> + 'static,
    {
        Validator {
            run: Rc::new(move |value| future::ready(Ok(validate(value))).boxed_local()),
        }
    }

    /// Wraps a synchronous validator whose own code can fail.
    pub fn try_sync<F>(validate: F) -> Self
    where
        F: Fn(&Value) -> Result<Option<Value>, ValidatorError> + 'static,
    {
        Validator {
            run: Rc::new(move |value| future::ready(validate(value)).boxed_local()),
        }
    }

    /// Wraps an asynchronous validator. It receives its own copy of the value.
    pub fn future<F, Fut>(validate: F) -> Self
    where
        F: Fn(Value) -> Fut + 'static,
        Fut: Future<Output = Result<Option<Value>, ValidatorError>> + 'static,
    {
        Validator {
            run: Rc::new(move |value| validate(value.clone()).boxed_local()),
        }
    }

    /// Starts a validation of `value`.
    pub fn call(&self, value: &Value) -> ValidationFuture {
        (self.run)(value)
    }
}

// ─── Timing ─────────────────────────────────────────────────────────────────

/// Selects the active trigger: `validate_mode` before the first submit
/// attempt, `re_validate_mode` afterwards.
pub fn validate_timing(
    submit_count: u32,
    validate_mode: ValidateMode,
    re_validate_mode: ValidateMode,
) -> ValidateMode {
    if submit_count == 0 {
        validate_mode
    } else {
        re_validate_mode
    }
}

// ─── Merging ────────────────────────────────────────────────────────────────

/// Deep-merges `source` into `target`.
///
/// Objects merge key-wise. Arrays merge element-wise: an empty (`null`) or
/// missing target slot takes the source element, a container element merges
/// into the slot, and a scalar element not already in the target is appended.
/// Any other combination takes the source.
pub fn merge_errors(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) => {
                        let current = std::mem::take(existing);
                        *existing = merge_errors(current, value);
                    }
                    None => {
                        target.insert(key, value);
                    }
                }
            }
            Value::Object(target)
        }
        (Value::Array(target), Value::Array(source)) => Value::Array(merge_arrays(target, source)),
        (_, source) => source,
    }
}

fn merge_arrays(target: Vec<Value>, source: Vec<Value>) -> Vec<Value> {
    let mut destination = target.clone();

    for (index, item) in source.into_iter().enumerate() {
        let slot_empty = destination.get(index).is_none_or(Value::is_null);
        if slot_empty {
            if destination.len() <= index {
                destination.resize(index + 1, Value::Null);
            }
            destination[index] = item;
        } else if item.is_object() || item.is_array() {
            let current = target.get(index).cloned().unwrap_or(Value::Null);
            destination[index] = merge_errors(current, item);
        } else if !target.contains(&item) {
            destination.push(item);
        }
    }

    destination
}

// ─── Runs ───────────────────────────────────────────────────────────────────

/// Runs every field validator against the value at its path and collects the
/// non-empty results into one error tree.
pub(crate) async fn run_field_validators(
    validators: &[(String, Validator)],
    values: &Value,
) -> Result<Value, ValidatorError> {
    let runs: Vec<ValidationFuture> = validators
        .iter()
        .map(|(field, validator)| {
            let value = path::get(values, field).cloned().unwrap_or(Value::Null);
            validator.call(&value)
        })
        .collect();

    let results = future::join_all(runs).await;

    let mut errors = empty_tree();
    for ((field, _), result) in validators.iter().zip(results) {
        if let Some(error) = result.map_err(|e| e.at(field))?
            && !is_empty_error(&error)
        {
            path::set(&mut errors, field, error);
        }
    }
    Ok(errors)
}

/// Runs the whole-form validator. No validator, or an empty result, is an
/// empty tree. A non-empty result that is not a tree is kept under the `""`
/// key.
pub(crate) async fn run_form_validator(
    validator: Option<&Validator>,
    values: &Value,
) -> Result<Value, ValidatorError> {
    let Some(validator) = validator else {
        return Ok(empty_tree());
    };
    let errors = match validator.call(values).await? {
        Some(tree @ Value::Object(_)) => tree,
        Some(error) if !is_empty_error(&error) => {
            let mut tree = Map::new();
            tree.insert(String::new(), error);
            Value::Object(tree)
        }
        _ => empty_tree(),
    };
    Ok(errors)
}

/// Runs field and whole-form validation concurrently and merges the results.
pub(crate) async fn run_all(
    field_validators: Vec<(String, Validator)>,
    form_validator: Option<Validator>,
    values: Value,
) -> Result<Value, ValidatorError> {
    debug!(
        fields = field_validators.len(),
        whole_form = form_validator.is_some(),
        "running validation"
    );

    let (field_errors, form_errors) = future::join(
        run_field_validators(&field_validators, &values),
        run_form_validator(form_validator.as_ref(), &values),
    )
    .await;

    Ok(merge_errors(field_errors?, form_errors?))
}

/// Whether an error tree reports no errors at all.
pub fn is_valid(errors: &Value) -> bool {
    match errors {
        Value::Object(map) => map.is_empty(),
        other => is_empty_error(other),
    }
}
