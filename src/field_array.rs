//! Dynamic lists of fields with stable identities.
//!
//! A [`FieldArray`] mirrors the array at its path with a list of
//! [`FieldEntry`] records. Each entry gets a key from a per-array counter when
//! it is created and keeps it across reorders, so a UI can reconcile rows by
//! key while indices shift.

use futures::future;
use futures::FutureExt;
use serde_json::Value;
use std::cell::Cell as StdCell;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::debug;

use crate::array::{self, ArrayEdit};
use crate::error::FormError;
use crate::field::{FieldAttrs, FieldName, RegisterOptions};
use crate::form::{Form, FormFuture};
use crate::path;
use crate::reactive::Cell;

struct ArrayInner {
    fields: Cell<Vec<FieldEntry>>,
    seed: StdCell<u64>,
}

/// Binding for an array-valued field.
#[derive(Clone)]
pub struct FieldArray {
    form: Form,
    name: FieldName,
    inner: Rc<ArrayInner>,
}

impl fmt::Debug for FieldArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldArray")
            .field("name", &self.name)
            .field("fields", &self.inner.fields.with_untracked(Vec::len))
            .finish()
    }
}

impl FieldArray {
    /// Binds the array at `name`, registering its validator (which receives
    /// the whole array) and a reset hook, and creates one entry per element.
    pub fn new(form: &Form, name: impl Into<FieldName>, options: RegisterOptions) -> FieldArray {
        let array = FieldArray {
            form: form.clone(),
            name: name.into(),
            inner: Rc::new(ArrayInner {
                fields: Cell::new(Vec::new()),
                seed: StdCell::new(0),
            }),
        };

        let reset: Rc<dyn Fn()> = {
            let form = form.downgrade();
            let name = array.name.clone();
            let inner = Rc::downgrade(&array.inner);
            Rc::new(move || {
                if let (Some(form), Some(inner)) = (form.upgrade(), inner.upgrade()) {
                    FieldArray {
                        form,
                        name: name.clone(),
                        inner,
                    }
                    .reset();
                }
            })
        };
        form.register_field_array(&array.name.resolve(), options.validate, reset);

        array.reset();
        array
    }

    pub fn name(&self) -> String {
        self.name.resolve()
    }

    /// The current entries, in array order.
    pub fn fields(&self) -> Vec<FieldEntry> {
        self.inner.fields.get()
    }

    pub fn fields_cell(&self) -> Cell<Vec<FieldEntry>> {
        self.inner.fields.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.fields.with(Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn value(&self) -> Option<Value> {
        self.form.field_value(&self.name())
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

    /// Regenerates every entry from the current array value. Keys keep
    /// counting up.
    pub fn reset(&self) {
        let entries: Vec<FieldEntry> = self
            .current_values()
            .into_iter()
            .map(|value| self.create_entry(value))
            .collect();
        self.inner.fields.set(entries);
    }

    pub fn append(&self, value: Value) -> FormFuture<Option<Value>> {
        let entry = self.create_entry(value.clone());
        self.edit(ArrayEdit::Append(value), |fields| array::append(fields, entry))
    }

    pub fn prepend(&self, value: Value) -> FormFuture<Option<Value>> {
        let entry = self.create_entry(value.clone());
        self.edit(ArrayEdit::Prepend(value), |fields| array::prepend(fields, entry))
    }

    /// Inserts at `index`; past the end appends.
    pub fn insert(&self, index: usize, value: Value) -> FormFuture<Option<Value>> {
        let entry = self.create_entry(value.clone());
        self.edit(ArrayEdit::Insert(index, value), |fields| {
            array::insert(fields, index, entry)
        })
    }

    /// Removes the element at `index`; `None` clears the array.
    pub fn remove(&self, index: Option<usize>) -> FormFuture<Option<Value>> {
        self.edit(ArrayEdit::Remove(index), |fields| array::remove(fields, index))
    }

    /// Swaps two elements. Entries keep their keys. An index out of range
    /// leaves the array untouched.
    pub fn swap(&self, a: usize, b: usize) -> FormFuture<Option<Value>> {
        let len = self.len_untracked();
        if a >= len || b >= len {
            debug!(field = %self.name(), a, b, len, "swap out of range ignored");
            return future::ready(Ok(None)).boxed_local();
        }
        self.edit(ArrayEdit::Swap(a, b), |fields| {
            let mut fields = fields.to_vec();
            fields.swap(a, b);
            fields
        })
    }

    /// Moves the element at `from` to `to` (clamped to the end). Entries keep
    /// their keys. A `from` out of range leaves the array untouched.
    pub fn move_item(&self, from: usize, to: usize) -> FormFuture<Option<Value>> {
        let len = self.len_untracked();
        if from >= len {
            debug!(field = %self.name(), from, len, "move out of range ignored");
            return future::ready(Ok(None)).boxed_local();
        }
        self.edit(ArrayEdit::Move(from, to), |fields| {
            let mut fields = fields.to_vec();
            let entry = fields.remove(from);
            let to = to.min(fields.len());
            fields.insert(to, entry);
            fields
        })
    }

    fn len_untracked(&self) -> usize {
        self.inner.fields.with_untracked(Vec::len)
    }

    /// Replaces the element at `index` with a fresh entry; past the end
    /// appends.
    pub fn update(&self, index: usize, value: Value) -> FormFuture<Option<Value>> {
        let entry = self.create_entry(value.clone());
        self.edit(ArrayEdit::Update(index, value), |fields| {
            array::update(fields, index, entry)
        })
    }

    /// Replaces the whole array; every entry is regenerated. Errors and
    /// touched flags are left as they are.
    pub fn replace(&self, values: Vec<Value>) -> FormFuture<Option<Value>> {
        let entries: Vec<FieldEntry> = values
            .iter()
            .map(|value| self.create_entry(value.clone()))
            .collect();
        self.edit(ArrayEdit::Replace(values), |_| entries)
    }

    fn edit(
        &self,
        edit: ArrayEdit,
        reconcile: impl FnOnce(&[FieldEntry]) -> Vec<FieldEntry>,
    ) -> FormFuture<Option<Value>> {
        let name = self.name();
        debug!(field = %name, edit = edit.name(), "field array edit");

        let next = edit.apply(&self.current_values());
        let validation = self
            .form
            .set_field_array_value(&name, next, Some(&edit), true);

        let entries = self.inner.fields.with_untracked(|fields| reconcile(fields));
        self.inner.fields.set(entries);
        validation
    }

    fn current_values(&self) -> Vec<Value> {
        let name = self.name();
        self.form
            .state()
            .values
            .with_untracked(|values| path::get(values, &name).and_then(Value::as_array).cloned())
            .unwrap_or_default()
    }

    fn create_entry(&self, value: Value) -> FieldEntry {
        let key = self.inner.seed.get();
        self.inner.seed.set(key + 1);
        FieldEntry {
            key,
            initial: value,
            form: self.form.clone(),
            name: self.name.clone(),
            array: Rc::downgrade(&self.inner),
        }
    }
}

/// One element of a [`FieldArray`].
///
/// An entry stays usable after it is removed: its index reads `None`, its
/// value falls back to what the element held when the entry was created, and
/// writes are ignored.
#[derive(Clone)]
pub struct FieldEntry {
    key: u64,
    initial: Value,
    form: Form,
    name: FieldName,
    array: Weak<ArrayInner>,
}

impl fmt::Debug for FieldEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldEntry")
            .field("key", &self.key)
            .field("initial", &self.initial)
            .finish_non_exhaustive()
    }
}

impl PartialEq for FieldEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && Weak::ptr_eq(&self.array, &other.array)
    }
}

impl FieldEntry {
    pub fn key(&self) -> u64 {
        self.key
    }

    /// Current position in the array, or `None` once removed.
    pub fn index(&self) -> Option<usize> {
        let array = self.array.upgrade()?;
        array
            .fields
            .with(|fields| fields.iter().position(|entry| entry.key == self.key))
    }

    /// Full path of the element, e.g. `users.2`.
    pub fn name(&self) -> Option<String> {
        let index = self.index()?;
        Some(path::join(&self.name.resolve(), index))
    }

    pub fn value(&self) -> Option<Value> {
        match self.name() {
            Some(name) => self.form.field_value(&name),
            None => Some(self.initial.clone()),
        }
    }

    pub fn error(&self) -> Option<Value> {
        self.name().and_then(|name| self.form.field_error(&name))
    }

    pub fn touched(&self) -> bool {
        self.name()
            .is_some_and(|name| self.form.field_touched(&name))
    }

    pub fn dirty(&self) -> bool {
        self.name().is_some_and(|name| self.form.field_dirty(&name))
    }

    pub fn attrs(&self) -> Option<FieldAttrs> {
        self.name().map(|name| self.form.field_attrs(&name))
    }

    /// Writes the element's value. A no-op for a removed entry; an error once
    /// the owning array is gone.
    pub fn set_value(&self, value: Value) -> FormFuture<Option<Value>> {
        if self.array.strong_count() == 0 {
            let err = FormError::MissingContext {
                name: self.name.resolve(),
            };
            return future::ready(Err(err)).boxed_local();
        }
        match self.name() {
            Some(name) => self.form.set_field_value(&name, value, None),
            None => future::ready(Ok(None)).boxed_local(),
        }
    }
}
