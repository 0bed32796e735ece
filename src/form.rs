//! The form handle: options, submission and every state operation.
//!
//! A [`Form`] owns a [`FormState`] and the registries of field validators and
//! field-array reset hooks. Mutations dispatch synchronously when the method is
//! called; the returned [`FormFuture`] only carries whatever validation the
//! mutation triggers, and does nothing until polled.

use futures::future::{self, LocalBoxFuture};
use futures::FutureExt;
use serde_json::Value;
use std::cell::{Cell as StdCell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};
use tracing::{debug, warn};

use crate::array::ArrayEdit;
use crate::enums::{SubmitStatus, ValidateMode};
use crate::error::{FormError, SubmitError};
use crate::field::{FieldAttrs, FieldBinding, FieldName, FormEvent, RegisterOptions};
use crate::path;
use crate::reactive::{Cell, Derived};
use crate::registry::Registry;
use crate::store::{empty_tree, Action, FormState, ResetPayload};
use crate::validate::{self, Validator};
use crate::value::{deep_equal, is_empty_error, is_touched, option_deep_equal};

/// Future returned by form operations.
pub type FormFuture<T> = LocalBoxFuture<'static, Result<T, FormError>>;

type SubmitFuture = LocalBoxFuture<'static, Result<(), SubmitError>>;

// ─── Submission ─────────────────────────────────────────────────────────────

/// Passed to the submit handler.
#[derive(Clone, Debug)]
pub struct SubmitHelper {
    form: Form,
}

impl SubmitHelper {
    /// Sets the submitting flag. A synchronous handler calls
    /// `set_submitting(false)` when it is done.
    pub fn set_submitting(&self, flag: bool) {
        self.form.set_submitting(flag);
    }

    /// The values baseline at the time of the call.
    pub fn initial_values(&self) -> Value {
        self.form.inner.state.initial_values.get_untracked()
    }
}

#[derive(Clone)]
enum SubmitKind {
    Sync(Rc<dyn Fn(Value, &SubmitHelper)>),
    Future(Rc<dyn Fn(Value, SubmitHelper) -> SubmitFuture>),
}

/// The callback invoked with the values once validation passes.
#[derive(Clone)]
pub struct SubmitHandler {
    kind: SubmitKind,
}

impl fmt::Debug for SubmitHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            SubmitKind::Sync(_) => f.write_str("SubmitHandler::Sync"),
            SubmitKind::Future(_) => f.write_str("SubmitHandler::Future"),
        }
    }
}

impl SubmitHandler {
    /// A synchronous handler. The form stays submitting until the handler
    /// clears the flag through the helper.
    pub fn sync(handler: impl Fn(Value, &SubmitHelper) + 'static) -> Self {
        SubmitHandler {
            kind: SubmitKind::Sync(Rc::new(handler)),
        }
    }

    /// An asynchronous handler. Completion marks the submission successful;
    /// an error marks it failed.
    pub fn future<F, Fut>(handler: F) -> Self
    where
        F: Fn(Value, SubmitHelper) -> Fut + 'static,
        Fut: Future<Output = Result<(), SubmitError>> + 'static,
    {
        SubmitHandler {
            kind: SubmitKind::Future(Rc::new(move |values, helper| {
                handler(values, helper).boxed_local()
            })),
        }
    }
}

// ─── Options ────────────────────────────────────────────────────────────────

/// Construction options for a [`Form`].
#[derive(Clone)]
pub struct FormOptions {
    pub(crate) initial_values: Value,
    pub(crate) initial_errors: Option<Value>,
    pub(crate) initial_touched: Option<Value>,
    pub(crate) validate_mode: ValidateMode,
    pub(crate) re_validate_mode: ValidateMode,
    pub(crate) validate_on_mounted: bool,
    pub(crate) on_submit: SubmitHandler,
    pub(crate) on_invalid: Option<Rc<dyn Fn(&Value)>>,
    pub(crate) validate: Option<Validator>,
}

impl fmt::Debug for FormOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormOptions")
            .field("initial_values", &self.initial_values)
            .field("initial_errors", &self.initial_errors)
            .field("initial_touched", &self.initial_touched)
            .field("validate_mode", &self.validate_mode)
            .field("re_validate_mode", &self.re_validate_mode)
            .field("validate_on_mounted", &self.validate_on_mounted)
            .finish_non_exhaustive()
    }
}

impl FormOptions {
    pub fn new(initial_values: Value, on_submit: SubmitHandler) -> Self {
        FormOptions {
            initial_values,
            initial_errors: None,
            initial_touched: None,
            validate_mode: ValidateMode::Submit,
            re_validate_mode: ValidateMode::Change,
            validate_on_mounted: false,
            on_submit,
            on_invalid: None,
            validate: None,
        }
    }

    pub fn initial_errors(mut self, errors: Value) -> Self {
        self.initial_errors = Some(errors);
        self
    }

    pub fn initial_touched(mut self, touched: Value) -> Self {
        self.initial_touched = Some(touched);
        self
    }

    pub fn validate_mode(mut self, mode: ValidateMode) -> Self {
        self.validate_mode = mode;
        self
    }

    pub fn re_validate_mode(mut self, mode: ValidateMode) -> Self {
        self.re_validate_mode = mode;
        self
    }

    pub fn validate_on_mounted(mut self, enabled: bool) -> Self {
        self.validate_on_mounted = enabled;
        self
    }

    /// Called with the error tree when a submit attempt fails validation.
    pub fn on_invalid(mut self, callback: impl Fn(&Value) + 'static) -> Self {
        self.on_invalid = Some(Rc::new(callback));
        self
    }

    /// Whole-form validator, run with the entire values tree.
    pub fn validate(mut self, validator: Validator) -> Self {
        self.validate = Some(validator);
        self
    }
}

/// Partial reset request. Missing parts fall back to the current baselines
/// (values, errors, touched) or zero (submit count).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResetState {
    pub values: Option<Value>,
    pub errors: Option<Value>,
    pub touched: Option<Value>,
    pub submit_count: Option<u32>,
}

// ─── Form ───────────────────────────────────────────────────────────────────

struct FormInner {
    state: FormState,
    validate_mode: ValidateMode,
    re_validate_mode: ValidateMode,
    validate_on_mounted: bool,
    validate: Option<Validator>,
    on_submit: SubmitHandler,
    on_invalid: Option<Rc<dyn Fn(&Value)>>,
    fields: RefCell<Registry<Validator>>,
    field_arrays: RefCell<Registry<Rc<dyn Fn()>>>,
    dirty: Derived<bool>,
    timing: Derived<ValidateMode>,
    latest_run: StdCell<u64>,
}

/// A form: its state plus every operation on it.
///
/// Cloning a `Form` clones the handle.
#[derive(Clone)]
pub struct Form {
    inner: Rc<FormInner>,
}

/// Non-owning handle, held by callbacks the form itself stores.
#[derive(Clone)]
pub(crate) struct WeakForm {
    inner: Weak<FormInner>,
}

impl WeakForm {
    pub(crate) fn upgrade(&self) -> Option<Form> {
        self.inner.upgrade().map(|inner| Form { inner })
    }
}

impl fmt::Debug for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = &self.inner.state;
        f.debug_struct("Form")
            .field("values", &state.values.get_untracked())
            .field("errors", &state.errors.get_untracked())
            .field("touched", &state.touched.get_untracked())
            .field("submit_count", &state.submit_count.get_untracked())
            .field("fields", &self.inner.fields.borrow().len())
            .field("field_arrays", &self.inner.field_arrays.borrow().len())
            .finish_non_exhaustive()
    }
}

impl Form {
    pub fn new(options: FormOptions) -> Form {
        let state = FormState::new(
            options.initial_values,
            options.initial_errors.unwrap_or_else(empty_tree),
            options.initial_touched.unwrap_or_else(empty_tree),
        );

        let dirty = {
            let values = state.values.clone();
            let initial = state.initial_values.clone();
            Derived::new(move || values.with(|v| initial.with(|i| !deep_equal(v, i))))
        };

        let timing = {
            let submit_count = state.submit_count.clone();
            let (validate_mode, re_validate_mode) = (options.validate_mode, options.re_validate_mode);
            Derived::new(move || {
                validate::validate_timing(submit_count.get(), validate_mode, re_validate_mode)
            })
        };

        Form {
            inner: Rc::new(FormInner {
                state,
                validate_mode: options.validate_mode,
                re_validate_mode: options.re_validate_mode,
                validate_on_mounted: options.validate_on_mounted,
                validate: options.validate,
                on_submit: options.on_submit,
                on_invalid: options.on_invalid,
                fields: RefCell::new(Registry::default()),
                field_arrays: RefCell::new(Registry::default()),
                dirty,
                timing,
                latest_run: StdCell::new(0),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakForm {
        WeakForm {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Mount hook: validates the initial values when `validate_on_mounted`
    /// is set. The submit count is left alone.
    pub fn mount(&self) -> FormFuture<Option<Value>> {
        if !self.inner.validate_on_mounted {
            return ready(None);
        }
        let initial = self.inner.state.initial_values.get_untracked();
        self.run_validation(Some(initial)).map(|r| r.map(Some)).boxed_local()
    }

    fn dispatch(&self, action: Action) {
        self.inner.state.dispatch(action);
    }

    // ─── State views ────────────────────────────────────────────────────────

    pub fn values(&self) -> Value {
        self.inner.state.values.get()
    }

    pub fn errors(&self) -> Value {
        self.inner.state.errors.get()
    }

    pub fn touched(&self) -> Value {
        self.inner.state.touched.get()
    }

    pub fn submit_count(&self) -> u32 {
        self.inner.state.submit_count.get()
    }

    pub fn is_submitting(&self) -> bool {
        self.inner.state.is_submitting.get()
    }

    pub fn is_validating(&self) -> bool {
        self.inner.state.is_validating.get()
    }

    /// Whether the values differ (deeply) from the baseline.
    pub fn dirty(&self) -> bool {
        self.inner.dirty.get()
    }

    /// The trigger currently in force.
    pub fn validate_timing(&self) -> ValidateMode {
        self.inner.timing.get()
    }

    pub fn validate_mode(&self) -> ValidateMode {
        self.inner.validate_mode
    }

    pub fn re_validate_mode(&self) -> ValidateMode {
        self.inner.re_validate_mode
    }

    /// The underlying state record.
    pub fn state(&self) -> &FormState {
        &self.inner.state
    }

    pub fn values_cell(&self) -> Cell<Value> {
        self.inner.state.values.clone()
    }

    pub fn errors_cell(&self) -> Cell<Value> {
        self.inner.state.errors.clone()
    }

    pub fn touched_cell(&self) -> Cell<Value> {
        self.inner.state.touched.clone()
    }

    pub fn submit_count_cell(&self) -> Cell<u32> {
        self.inner.state.submit_count.clone()
    }

    pub fn is_submitting_cell(&self) -> Cell<bool> {
        self.inner.state.is_submitting.clone()
    }

    pub fn is_validating_cell(&self) -> Cell<bool> {
        self.inner.state.is_validating.clone()
    }

    pub fn dirty_derived(&self) -> Derived<bool> {
        self.inner.dirty.clone()
    }

    // ─── Field reads ────────────────────────────────────────────────────────

    pub fn field_value(&self, name: &str) -> Option<Value> {
        self.inner
            .state
            .values
            .with(|values| path::get(values, name).cloned())
    }

    /// The field's error leaf or subtree. `null` slots read as no error.
    pub fn field_error(&self, name: &str) -> Option<Value> {
        self.inner.state.errors.with(|errors| {
            path::get(errors, name)
                .filter(|error| !error.is_null())
                .cloned()
        })
    }

    pub fn field_touched(&self, name: &str) -> bool {
        self.inner
            .state
            .touched
            .with(|touched| path::get(touched, name).is_some_and(is_touched))
    }

    /// Whether the value at `name` differs from the baseline value there.
    pub fn field_dirty(&self, name: &str) -> bool {
        let state = &self.inner.state;
        state.values.with(|values| {
            state.initial_values.with(|initial| {
                !option_deep_equal(path::get(values, name), path::get(initial, name))
            })
        })
    }

    pub fn field_attrs(&self, name: &str) -> FieldAttrs {
        FieldAttrs {
            name: name.to_string(),
        }
    }

    // ─── Registration ───────────────────────────────────────────────────────

    /// Registers (or replaces) the validator for a field path.
    pub fn register_field(&self, name: impl Into<FieldName>, validator: Validator) {
        let name = name.into().resolve();
        debug!(field = %name, "registering field validator");
        self.inner.fields.borrow_mut().insert(name, validator);
    }

    pub(crate) fn register_field_array(
        &self,
        name: &str,
        validator: Option<Validator>,
        reset: Rc<dyn Fn()>,
    ) {
        if let Some(validator) = validator {
            self.register_field(name, validator);
        }
        self.inner
            .field_arrays
            .borrow_mut()
            .insert(name.to_string(), reset);
    }

    /// Binds a field: registers its validator, if any, and returns the
    /// binding.
    pub fn register(&self, name: impl Into<FieldName>, options: RegisterOptions) -> FieldBinding {
        let name = name.into();
        if let Some(validator) = options.validate {
            self.register_field(name.clone(), validator);
        }
        FieldBinding::new(self.clone(), name)
    }

    // ─── Mutations ──────────────────────────────────────────────────────────

    /// Replaces the whole values tree.
    ///
    /// Validation runs when `should_validate` is `Some(true)`, or when it is
    /// `None` and the active timing is [`ValidateMode::Change`].
    pub fn set_values(&self, values: Value, should_validate: Option<bool>) -> FormFuture<Option<Value>> {
        self.dispatch(Action::SetValues(values));
        self.validate_if(self.should_validate(should_validate))
    }

    /// Writes one value by path, with the same validation rule as
    /// [`Form::set_values`].
    pub fn set_field_value(
        &self,
        name: &str,
        value: Value,
        should_validate: Option<bool>,
    ) -> FormFuture<Option<Value>> {
        self.dispatch(Action::SetFieldValue {
            path: name.to_string(),
            value,
        });
        self.validate_if(self.should_validate(should_validate))
    }

    /// Writes an array value and replays `edit` on the errors and touched
    /// arrays at the same path.
    pub(crate) fn set_field_array_value(
        &self,
        name: &str,
        values: Vec<Value>,
        edit: Option<&ArrayEdit>,
        edit_meta: bool,
    ) -> FormFuture<Option<Value>> {
        if let Some(edit) = edit
            && edit_meta
        {
            let state = &self.inner.state;
            let replay = |tree: &Value| {
                path::get(tree, name)
                    .and_then(Value::as_array)
                    .and_then(|seq| edit.apply_meta(seq))
            };

            if let Some(errors) = state.errors.with_untracked(&replay) {
                self.dispatch(Action::SetFieldError {
                    path: name.to_string(),
                    error: Some(Value::Array(errors)),
                });
            }
            if let Some(touched) = state.touched.with_untracked(&replay) {
                self.dispatch(Action::SetTouched {
                    path: name.to_string(),
                    touched: Value::Array(touched),
                });
            }
        }
        self.set_field_value(name, Value::Array(values), None)
    }

    pub fn set_errors(&self, errors: Value) {
        self.dispatch(Action::SetErrors(errors));
    }

    /// Sets a field's error; `None` removes it.
    pub fn set_field_error(&self, name: &str, error: Option<Value>) {
        self.dispatch(Action::SetFieldError {
            path: name.to_string(),
            error,
        });
    }

    /// Marks a field touched or untouched; validates when the active timing
    /// is [`ValidateMode::Blur`].
    pub fn set_field_touched(&self, name: &str, touched: bool) -> FormFuture<Option<Value>> {
        self.dispatch(Action::SetTouched {
            path: name.to_string(),
            touched: Value::Bool(touched),
        });
        self.validate_if(self.validate_timing() == ValidateMode::Blur)
    }

    pub fn set_submitting(&self, flag: bool) {
        self.dispatch(Action::SetSubmitting(flag));
    }

    // ─── Handlers ───────────────────────────────────────────────────────────

    /// Blur handler. The field path is `path` when given, else the event
    /// target's `name`, else its `id`. Empty strings are skipped.
    pub fn handle_blur(
        &self,
        event: Option<&dyn FormEvent>,
        path: Option<&str>,
    ) -> FormFuture<Option<Value>> {
        let target = path
            .into_iter()
            .chain(event.and_then(|e| e.target_name()))
            .chain(event.and_then(|e| e.target_id()))
            .find(|candidate| !candidate.is_empty())
            .map(str::to_string);

        match target {
            Some(name) => self.set_field_touched(&name, true),
            None => {
                warn!("blur event without a field path, name or id");
                ready(None)
            }
        }
    }

    /// Change handler: validates when the active timing is
    /// [`ValidateMode::Change`].
    pub fn handle_change(&self) -> FormFuture<Option<Value>> {
        self.validate_if(self.validate_timing() == ValidateMode::Change)
    }

    /// Input handler: validates when the active timing is
    /// [`ValidateMode::Input`].
    pub fn handle_input(&self) -> FormFuture<Option<Value>> {
        self.validate_if(self.validate_timing() == ValidateMode::Input)
    }

    /// Submits the form.
    ///
    /// The attempt is recorded immediately; validation and the handler run
    /// when the future is polled. A validator that fails to run marks the
    /// submission failed and is returned as the error.
    pub fn handle_submit(&self, event: Option<&mut dyn FormEvent>) -> FormFuture<SubmitStatus> {
        if let Some(event) = event {
            event.prevent_default();
        }
        self.dispatch(Action::SubmitAttempt);

        let form = self.clone();
        async move {
            let errors = match form.run_validation(None).await {
                Ok(errors) => errors,
                Err(err) => {
                    form.dispatch(Action::SubmitFailure);
                    return Err(err);
                }
            };

            if !validate::is_valid(&errors) {
                debug!("submit blocked by validation errors");
                form.dispatch(Action::SubmitFailure);
                if let Some(on_invalid) = form.inner.on_invalid.clone() {
                    on_invalid(&errors);
                }
                return Ok(SubmitStatus::Invalid(errors));
            }

            let values = form.inner.state.values.get_untracked();
            let helper = SubmitHelper { form: form.clone() };
            match form.inner.on_submit.kind.clone() {
                SubmitKind::Sync(handler) => handler(values, &helper),
                SubmitKind::Future(handler) => match handler(values, helper).await {
                    Ok(()) => {
                        debug!("submit handler completed");
                        form.dispatch(Action::SubmitSuccess);
                    }
                    Err(err) => {
                        warn!(error = %err, "submit handler failed");
                        form.dispatch(Action::SubmitFailure);
                    }
                },
            }
            Ok(SubmitStatus::Submitted)
        }
        .boxed_local()
    }

    /// Reset handler: resets to the current baselines.
    pub fn handle_reset(&self, event: Option<&mut dyn FormEvent>) {
        if let Some(event) = event {
            event.prevent_default();
        }
        self.reset_form(None);
    }

    /// Resets values, errors, touched and submit count, re-baselines the
    /// initial snapshots, and resets every registered field array.
    pub fn reset_form(&self, next: Option<ResetState>) {
        let next = next.unwrap_or_default();
        let state = &self.inner.state;
        let payload = ResetPayload {
            values: next
                .values
                .unwrap_or_else(|| state.initial_values.get_untracked()),
            errors: next
                .errors
                .unwrap_or_else(|| state.initial_errors.get_untracked()),
            touched: next
                .touched
                .unwrap_or_else(|| state.initial_touched.get_untracked()),
            submit_count: next.submit_count.unwrap_or(0),
        };
        self.dispatch(Action::ResetForm(payload));

        let resets = self.inner.field_arrays.borrow().values();
        for reset in resets {
            reset();
        }
    }

    // ─── Validation ─────────────────────────────────────────────────────────

    /// Runs every validator and commits the merged error tree.
    pub fn validate_form(&self) -> FormFuture<Value> {
        self.run_validation(None)
    }

    /// Runs one field's validator and writes its error leaf. `Ok(None)` when
    /// the field has no validator or the value is valid.
    pub fn validate_field(&self, name: &str) -> FormFuture<Option<Value>> {
        let validator = self.inner.fields.borrow().get(name).cloned();
        let Some(validator) = validator else {
            return ready(None);
        };

        let form = self.clone();
        let name = name.to_string();
        async move {
            form.dispatch(Action::SetValidating(true));
            let value = form
                .inner
                .state
                .values
                .with_untracked(|values| path::get(values, &name).cloned())
                .unwrap_or(Value::Null);
            let result = validator.call(&value).await.map_err(|e| e.at(&name));
            form.dispatch(Action::SetValidating(false));

            let error = result
                .inspect_err(|err| warn!(error = %err, "field validator failed"))?
                .filter(|error| !is_empty_error(error));
            form.dispatch(Action::SetFieldError {
                path: name,
                error: error.clone(),
            });
            Ok(error)
        }
        .boxed_local()
    }

    fn should_validate(&self, explicit: Option<bool>) -> bool {
        explicit.unwrap_or_else(|| self.validate_timing() == ValidateMode::Change)
    }

    fn validate_if(&self, condition: bool) -> FormFuture<Option<Value>> {
        if condition {
            self.run_validation(None).map(|r| r.map(Some)).boxed_local()
        } else {
            ready(None)
        }
    }

    /// One full validation run.
    ///
    /// Runs are numbered; only the most recently started run commits its
    /// errors and clears `is_validating`. Older runs still return what they
    /// computed.
    fn run_validation(&self, values: Option<Value>) -> FormFuture<Value> {
        let form = self.clone();
        async move {
            let token = form.inner.latest_run.get() + 1;
            form.inner.latest_run.set(token);
            form.dispatch(Action::SetValidating(true));

            let values = values.unwrap_or_else(|| form.inner.state.values.get_untracked());
            let fields = form.inner.fields.borrow().entries();
            let result = validate::run_all(fields, form.inner.validate.clone(), values).await;

            let is_latest = form.inner.latest_run.get() == token;
            match result {
                Ok(errors) => {
                    if is_latest {
                        form.dispatch(Action::SetErrors(errors.clone()));
                        form.dispatch(Action::SetValidating(false));
                    } else {
                        warn!(token, "discarding stale validation result");
                    }
                    Ok(errors)
                }
                Err(err) => {
                    if is_latest {
                        form.dispatch(Action::SetValidating(false));
                    }
                    warn!(error = %err, "validator failed to run");
                    Err(err.into())
                }
            }
        }
        .boxed_local()
    }
}

fn ready<T: 'static>(value: T) -> FormFuture<T> {
    future::ready(Ok(value)).boxed_local()
}
