//! Field names, bindings and the event seam.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

use crate::form::{Form, FormFuture};
use crate::reactive::{Cell, Derived};
use crate::validate::Validator;

// ─── FieldName ──────────────────────────────────────────────────────────────

/// The path a binding is attached to.
///
/// A dynamic name is resolved again on every read, so a binding can be
/// re-targeted (for example a form row switching which list it edits).
#[derive(Clone)]
pub enum FieldName {
    Literal(String),
    Dynamic(Rc<dyn Fn() -> String>),
}

impl FieldName {
    pub fn getter(get: impl Fn() -> String + 'static) -> Self {
        FieldName::Dynamic(Rc::new(get))
    }

    /// The current path.
    pub fn resolve(&self) -> String {
        match self {
            FieldName::Literal(name) => name.clone(),
            FieldName::Dynamic(get) => get(),
        }
    }
}

impl fmt::Debug for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldName::Literal(name) => f.debug_tuple("Literal").field(name).finish(),
            FieldName::Dynamic(get) => f.debug_tuple("Dynamic").field(&get()).finish(),
        }
    }
}

impl From<&str> for FieldName {
    fn from(name: &str) -> Self {
        FieldName::Literal(name.to_string())
    }
}

impl From<String> for FieldName {
    fn from(name: String) -> Self {
        FieldName::Literal(name)
    }
}

impl From<&String> for FieldName {
    fn from(name: &String) -> Self {
        FieldName::Literal(name.clone())
    }
}

impl From<Cell<String>> for FieldName {
    fn from(cell: Cell<String>) -> Self {
        FieldName::Dynamic(Rc::new(move || cell.get()))
    }
}

impl From<&Cell<String>> for FieldName {
    fn from(cell: &Cell<String>) -> Self {
        FieldName::from(cell.clone())
    }
}

// ─── Events ─────────────────────────────────────────────────────────────────

/// A platform event delivered to a form or field handler.
///
/// Handlers call [`FormEvent::prevent_default`] before doing anything else, so
/// the same handler can be wired to a native submit/reset event or invoked
/// programmatically with no event.
pub trait FormEvent {
    fn prevent_default(&mut self) {}

    /// `name` attribute of the element the event fired on.
    fn target_name(&self) -> Option<&str> {
        None
    }

    /// `id` attribute of the element the event fired on.
    fn target_id(&self) -> Option<&str> {
        None
    }
}

/// A plain event record, for callers without a platform event type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TargetEvent {
    pub name: Option<String>,
    pub id: Option<String>,
    pub default_prevented: bool,
}

impl TargetEvent {
    pub fn named(name: impl Into<String>) -> Self {
        TargetEvent {
            name: Some(name.into()),
            ..TargetEvent::default()
        }
    }
}

impl FormEvent for TargetEvent {
    fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    fn target_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn target_id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}

// ─── Bindings ───────────────────────────────────────────────────────────────

/// Options accepted by [`Form::register`] and `FieldArray::new`.
#[derive(Clone, Debug, Default)]
pub struct RegisterOptions {
    pub validate: Option<Validator>,
}

impl RegisterOptions {
    pub fn validate(validator: Validator) -> Self {
        RegisterOptions {
            validate: Some(validator),
        }
    }
}

/// Attributes a UI layer binds onto an input element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAttrs {
    pub name: String,
}

/// Snapshot of a field's metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldMeta {
    pub dirty: bool,
    pub error: Option<Value>,
    pub touched: bool,
}

/// What [`Form::register`] hands back: everything a field needs, resolved
/// through the field's name on every call.
#[derive(Clone, Debug)]
pub struct FieldBinding {
    form: Form,
    name: FieldName,
}

impl FieldBinding {
    pub(crate) fn new(form: Form, name: FieldName) -> Self {
        FieldBinding { form, name }
    }

    pub fn name(&self) -> String {
        self.name.resolve()
    }

    pub fn value(&self) -> Option<Value> {
        self.form.field_value(&self.name())
    }

    /// Writes the field's value; validation follows the form's change policy.
    pub fn set_value(&self, value: Value) -> FormFuture<Option<Value>> {
        self.form.set_field_value(&self.name(), value, None)
    }

    pub fn error(&self) -> Option<Value> {
        self.form.field_error(&self.name())
    }

    pub fn touched(&self) -> bool {
        self.form.field_touched(&self.name())
    }

    pub fn dirty(&self) -> bool {
        self.form.field_dirty(&self.name())
    }

    pub fn attrs(&self) -> FieldAttrs {
        self.form.field_attrs(&self.name())
    }

    pub fn meta(&self) -> FieldMeta {
        FieldMeta {
            dirty: self.dirty(),
            error: self.error(),
            touched: self.touched(),
        }
    }

    /// Blur handler: marks the field touched.
    pub fn blur(&self) -> FormFuture<Option<Value>> {
        self.form.set_field_touched(&self.name(), true)
    }

    /// Change handler.
    pub fn change(&self) -> FormFuture<Option<Value>> {
        self.form.handle_change()
    }

    /// Input handler.
    pub fn input(&self) -> FormFuture<Option<Value>> {
        self.form.handle_input()
    }

    /// A memoized view over this binding, recomputed when any form state it
    /// reads changes.
    pub fn derive<T: 'static>(&self, view: impl Fn(&FieldBinding) -> T + 'static) -> Derived<T> {
        let binding = self.clone();
        Derived::new(move || view(&binding))
    }
}
