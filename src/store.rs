//! Canonical form state and the reducer that mutates it.
//!
//! Every mutation of values, errors, touched flags and submission metadata is
//! an [`Action`] applied through [`FormState::dispatch`].

use serde_json::{Map, Value};
use tracing::{trace, warn};

use crate::path;
use crate::reactive::Cell;

/// Payload of [`Action::ResetForm`], fully resolved by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct ResetPayload {
    pub values: Value,
    pub errors: Value,
    pub touched: Value,
    pub submit_count: u32,
}

/// A state transition.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    SubmitAttempt,
    SubmitSuccess,
    SubmitFailure,
    /// Replaces the whole values tree; keys absent from the payload disappear.
    SetValues(Value),
    SetFieldValue { path: String, value: Value },
    SetTouched { path: String, touched: Value },
    SetErrors(Value),
    /// `None` removes the error leaf.
    SetFieldError { path: String, error: Option<Value> },
    SetSubmitting(bool),
    SetValidating(bool),
    /// Replaces values, errors, touched and submit count, and re-baselines the
    /// initial snapshots to the same payload.
    ResetForm(ResetPayload),
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::SubmitAttempt => "submit_attempt",
            Action::SubmitSuccess => "submit_success",
            Action::SubmitFailure => "submit_failure",
            Action::SetValues(_) => "set_values",
            Action::SetFieldValue { .. } => "set_field_value",
            Action::SetTouched { .. } => "set_touched",
            Action::SetErrors(_) => "set_errors",
            Action::SetFieldError { .. } => "set_field_error",
            Action::SetSubmitting(_) => "set_submitting",
            Action::SetValidating(_) => "set_validating",
            Action::ResetForm(_) => "reset_form",
        }
    }
}

/// The form's state record. Each part is an observable [`Cell`].
#[derive(Clone, Debug)]
pub struct FormState {
    pub values: Cell<Value>,
    pub errors: Cell<Value>,
    pub touched: Cell<Value>,
    pub submit_count: Cell<u32>,
    pub is_submitting: Cell<bool>,
    pub is_validating: Cell<bool>,
    /// Baseline for dirty comparison and for resets without explicit values.
    pub initial_values: Cell<Value>,
    pub initial_errors: Cell<Value>,
    pub initial_touched: Cell<Value>,
}

pub(crate) fn empty_tree() -> Value {
    Value::Object(Map::new())
}

impl FormState {
    /// Seeds the state. Each snapshot is stored twice: once as live state and
    /// once as the baseline.
    pub fn new(values: Value, errors: Value, touched: Value) -> Self {
        FormState {
            values: Cell::new(values.clone()),
            errors: Cell::new(errors.clone()),
            touched: Cell::new(touched.clone()),
            submit_count: Cell::new(0),
            is_submitting: Cell::new(false),
            is_validating: Cell::new(false),
            initial_values: Cell::new(values),
            initial_errors: Cell::new(errors),
            initial_touched: Cell::new(touched),
        }
    }

    /// Applies one action synchronously.
    pub fn dispatch(&self, action: Action) {
        trace!(action = action.kind(), "dispatch");

        if let Action::SetFieldValue { path, .. }
        | Action::SetTouched { path, .. }
        | Action::SetFieldError { path, .. } = &action
            && path::is_root(path)
        {
            warn!(action = action.kind(), "field action without a path ignored");
            return;
        }

        match action {
            Action::SubmitAttempt => {
                self.is_submitting.set(true);
                self.submit_count.update(|count| *count += 1);
            }
            Action::SubmitSuccess | Action::SubmitFailure => {
                self.is_submitting.set(false);
            }
            Action::SetValues(values) => {
                self.values.set(values);
            }
            Action::SetFieldValue { path, value } => {
                self.values.update(|values| {
                    path::set(values, &path, value);
                });
            }
            Action::SetTouched { path, touched } => {
                self.touched.update(|tree| {
                    path::set(tree, &path, touched);
                });
            }
            Action::SetErrors(errors) => {
                self.errors.set(errors);
            }
            Action::SetFieldError { path, error } => {
                self.errors.update(|tree| match error {
                    Some(error) => {
                        path::set(tree, &path, error);
                    }
                    None => {
                        path::unset(tree, &path);
                    }
                });
            }
            Action::SetSubmitting(flag) => {
                self.is_submitting.set(flag);
            }
            Action::SetValidating(flag) => {
                self.is_validating.set(flag);
            }
            Action::ResetForm(payload) => {
                self.initial_values.set(payload.values.clone());
                self.initial_errors.set(payload.errors.clone());
                self.initial_touched.set(payload.touched.clone());
                self.values.set(payload.values);
                self.errors.set(payload.errors);
                self.touched.set(payload.touched);
                self.submit_count.set(payload.submit_count);
            }
        }
    }
}
