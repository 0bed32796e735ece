//! Edit primitives on ordered sequences.
//!
//! The same primitive, with the same index arguments, is applied to a field
//! array's values, its errors and its touched flags so the three trees stay
//! positionally aligned. Out-of-range indices never panic; each primitive has
//! a fixed fallback instead.
//!
//! `swap` and `move_to` work in place. Every other primitive returns a new
//! sequence and leaves its input untouched.

use serde_json::Value;

use crate::path::MAX_INDEX;

/// Returns a copy of `seq` with `value` at the end.
pub fn append<T: Clone>(seq: &[T], value: T) -> Vec<T> {
    let mut out = Vec::with_capacity(seq.len() + 1);
    out.extend_from_slice(seq);
    out.push(value);
    out
}

/// Returns a copy of `seq` with `value` at the start.
pub fn prepend<T: Clone>(seq: &[T], value: T) -> Vec<T> {
    let mut out = Vec::with_capacity(seq.len() + 1);
    out.push(value);
    out.extend_from_slice(seq);
    out
}

/// Returns a copy of `seq` with `value` at `index`, shifting the tail right.
///
/// An index past the end appends.
pub fn insert<T: Clone>(seq: &[T], index: usize, value: T) -> Vec<T> {
    let split = index.min(seq.len());
    let mut out = Vec::with_capacity(seq.len() + 1);
    out.extend_from_slice(&seq[..split]);
    out.push(value);
    out.extend_from_slice(&seq[split..]);
    out
}

/// Returns a copy of `seq` without the element at `index`.
///
/// `None` yields an empty sequence. An out-of-range index yields an unchanged
/// copy.
pub fn remove<T: Clone>(seq: &[T], index: Option<usize>) -> Vec<T> {
    let Some(index) = index else {
        return Vec::new();
    };
    let mut out = seq.to_vec();
    if index < out.len() {
        out.remove(index);
    }
    out
}

/// Returns a copy of `seq` with the element at `index` replaced.
///
/// An out-of-range index appends instead.
pub fn update<T: Clone>(seq: &[T], index: usize, value: T) -> Vec<T> {
    let mut out = seq.to_vec();
    match out.get_mut(index) {
        Some(slot) => *slot = value,
        None => out.push(value),
    }
    out
}

/// Returns a shallow copy of `values`.
pub fn replace<T: Clone>(values: &[T]) -> Vec<T> {
    values.to_vec()
}

/// Exchanges the elements at `a` and `b` in place.
///
/// Indices are not bounds-checked against the current length: a missing
/// element reads as `null`, and writing it past the end grows the sequence,
/// padding with `null`. An index past [`MAX_INDEX`] leaves the sequence as is.
pub fn swap(seq: &mut Vec<Value>, a: usize, b: usize) {
    if a.max(b) > MAX_INDEX {
        return;
    }
    let value_a = seq.get(a).cloned().unwrap_or(Value::Null);
    let value_b = seq.get(b).cloned().unwrap_or(Value::Null);
    write_padded(seq, a, value_b);
    write_padded(seq, b, value_a);
}

fn write_padded(seq: &mut Vec<Value>, index: usize, value: Value) {
    if seq.len() <= index {
        seq.resize(index + 1, Value::Null);
    }
    seq[index] = value;
}

/// Removes the element at `from` and splices it in at `to`, in place.
///
/// A missing `from` element moves a `null`; `to` is clamped to the length.
pub fn move_to(seq: &mut Vec<Value>, from: usize, to: usize) {
    let moved = if from < seq.len() {
        seq.remove(from)
    } else {
        Value::Null
    };
    let to = to.min(seq.len());
    seq.insert(to, moved);
}

// ─── ArrayEdit ──────────────────────────────────────────────────────────────

/// A single structural edit of a field array, replayable on parallel trees.
#[derive(Clone, Debug, PartialEq)]
pub enum ArrayEdit {
    Append(Value),
    Prepend(Value),
    Insert(usize, Value),
    Remove(Option<usize>),
    Update(usize, Value),
    Swap(usize, usize),
    Move(usize, usize),
    Replace(Vec<Value>),
}

impl ArrayEdit {
    /// Applies the edit to a values sequence.
    pub fn apply(&self, seq: &[Value]) -> Vec<Value> {
        match self {
            ArrayEdit::Append(value) => append(seq, value.clone()),
            ArrayEdit::Prepend(value) => prepend(seq, value.clone()),
            ArrayEdit::Insert(index, value) => insert(seq, *index, value.clone()),
            ArrayEdit::Remove(index) => remove(seq, *index),
            ArrayEdit::Update(index, value) => update(seq, *index, value.clone()),
            ArrayEdit::Swap(a, b) => {
                let mut out = seq.to_vec();
                swap(&mut out, *a, *b);
                out
            }
            ArrayEdit::Move(from, to) => {
                let mut out = seq.to_vec();
                move_to(&mut out, *from, *to);
                out
            }
            ArrayEdit::Replace(values) => replace(values),
        }
    }

    /// Applies the edit to an errors or touched sequence.
    ///
    /// Added or updated slots carry `null` (no error, untouched). `Replace`
    /// returns `None`: metadata of a wholesale replacement is left as is.
    pub fn apply_meta(&self, seq: &[Value]) -> Option<Vec<Value>> {
        let blank = match self {
            ArrayEdit::Append(_) => ArrayEdit::Append(Value::Null),
            ArrayEdit::Prepend(_) => ArrayEdit::Prepend(Value::Null),
            ArrayEdit::Insert(index, _) => ArrayEdit::Insert(*index, Value::Null),
            ArrayEdit::Update(index, _) => ArrayEdit::Update(*index, Value::Null),
            ArrayEdit::Replace(_) => return None,
            other => return Some(other.apply(seq)),
        };
        Some(blank.apply(seq))
    }

    pub fn name(&self) -> &'static str {
        match self {
            ArrayEdit::Append(_) => "append",
            ArrayEdit::Prepend(_) => "prepend",
            ArrayEdit::Insert(..) => "insert",
            ArrayEdit::Remove(_) => "remove",
            ArrayEdit::Update(..) => "update",
            ArrayEdit::Swap(..) => "swap",
            ArrayEdit::Move(..) => "move",
            ArrayEdit::Replace(_) => "replace",
        }
    }
}
