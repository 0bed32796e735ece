//! Path-addressed access into value trees.
//!
//! A path is a string such as `family.0.habit.1`. Bracket segments are
//! accepted as well (`family[0].habit["name"]`) and normalized to plain
//! dotted segments before walking. Numeric segments index arrays, every other
//! segment keys objects.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

// ─── Cached regexes ─────────────────────────────────────────────────────────

static PATH_NOISE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"["'\]]"#).unwrap());

static PATH_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.\[]").unwrap());

// ─── Path parsing ───────────────────────────────────────────────────────────

/// Returns `true` when the path is a single segment (no `.` and no `[`).
///
/// Single-segment paths skip splitting entirely.
pub fn is_key(path: &str) -> bool {
    !path.contains('.') && !path.contains('[')
}

/// Splits a path into its segments.
///
/// Quotes and closing brackets are dropped, then the remainder is split on
/// `.` and `[`. Empty segments are discarded, so `""` yields no segments.
pub fn string_to_path(path: &str) -> Vec<String> {
    let cleaned = PATH_NOISE_RE.replace_all(path, "");
    PATH_SEPARATOR_RE
        .split(&cleaned)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

fn segments_of(path: &str) -> Vec<String> {
    if is_key(path) {
        if path.is_empty() {
            vec![]
        } else {
            vec![path.to_string()]
        }
    } else {
        string_to_path(path)
    }
}

/// Joins a base path and a child segment with `.`.
pub fn join(base: &str, segment: impl std::fmt::Display) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{}.{}", base, segment)
    }
}

// ─── get ────────────────────────────────────────────────────────────────────

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// Reads the value at `path`.
///
/// Returns `None` when any segment is missing or traverses a scalar. An empty
/// path resolves to nothing. When the walk fails, a key equal to the whole
/// path (for example a literal `"a.b"` key) is tried before giving up.
pub fn get<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return None;
    }
    if is_key(path) {
        return child(root, path);
    }

    let segments = string_to_path(path);
    let walked = if segments.is_empty() {
        None
    } else {
        segments
            .iter()
            .try_fold(root, |current, segment| child(current, segment))
    };

    walked.or_else(|| root.as_object().and_then(|map| map.get(path)))
}

/// Reads the value at `path`, returning a clone or `fallback` when missing.
pub fn get_or(root: &Value, path: &str, fallback: Value) -> Value {
    get(root, path).cloned().unwrap_or(fallback)
}

/// Whether `path` has no segments and so addresses the root itself.
pub fn is_root(path: &str) -> bool {
    segments_of(path).is_empty()
}

/// Mutable counterpart of [`get`] without the literal-key fallback.
pub fn get_mut<'a>(root: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    let segments = segments_of(path);
    if segments.is_empty() {
        return None;
    }
    let mut current = root;
    for segment in &segments {
        current = match current {
            Value::Object(map) => map.get_mut(segment.as_str())?,
            Value::Array(items) => {
                let index = segment.parse::<usize>().ok()?;
                items.get_mut(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

// ─── set ────────────────────────────────────────────────────────────────────

/// Largest array index a write may pad up to. Larger numeric segments are
/// written as object keys.
pub const MAX_INDEX: usize = 1 << 20;

fn write_index(segment: &str) -> Option<usize> {
    segment.parse::<usize>().ok().filter(|index| *index <= MAX_INDEX)
}

fn is_index(segment: &str) -> bool {
    write_index(segment).is_some()
}

fn empty_container_for(next_segment: &str) -> Value {
    if is_index(next_segment) {
        Value::Array(Vec::new())
    } else {
        Value::Object(Map::new())
    }
}

/// Returns the slot for `segment` inside `container`, creating it as `null`.
///
/// A scalar container becomes an object. An array addressed with a
/// non-numeric key (or an index past [`MAX_INDEX`]) is replaced by an object.
fn slot_mut<'a>(container: &'a mut Value, segment: &str) -> &'a mut Value {
    let index = write_index(segment);
    let keep = match container {
        Value::Object(_) => true,
        Value::Array(_) => index.is_some(),
        _ => false,
    };
    if !keep {
        *container = Value::Object(Map::new());
    }

    match (container, index) {
        (Value::Array(items), Some(index)) => {
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            &mut items[index]
        }
        (Value::Object(map), _) => map.entry(segment.to_string()).or_insert(Value::Null),
        (other, _) => other,
    }
}

/// Writes `value` at `path`, creating every missing intermediate container.
///
/// An intermediate that is not an object or array is overwritten with a fresh
/// container: an array when the next segment is numeric, an object otherwise.
/// Writing past the end of an array pads it with `null`, up to [`MAX_INDEX`].
/// An empty path replaces the root. Returns a reference to the stored value.
pub fn set<'a>(root: &'a mut Value, path: &str, value: Value) -> &'a mut Value {
    let segments = segments_of(path);
    let Some((last, intermediate)) = segments.split_last() else {
        *root = value;
        return root;
    };

    let mut current = root;
    for (i, segment) in intermediate.iter().enumerate() {
        let slot = slot_mut(current, segment);
        if !slot.is_object() && !slot.is_array() {
            *slot = empty_container_for(&segments[i + 1]);
        }
        current = slot;
    }

    let slot = slot_mut(current, last);
    *slot = value;
    slot
}

/// Removes the value at `path`, returning it.
///
/// Object entries are deleted; array slots are replaced by `null` so sibling
/// positions stay aligned.
pub fn unset(root: &mut Value, path: &str) -> Option<Value> {
    let segments = segments_of(path);
    let (last, parent_segments) = segments.split_last()?;

    let parent = if parent_segments.is_empty() {
        root
    } else {
        get_mut(root, &parent_segments.join("."))?
    };

    match parent {
        Value::Object(map) => map.shift_remove(last.as_str()),
        Value::Array(items) => {
            let index = last.parse::<usize>().ok()?;
            items
                .get_mut(index)
                .map(|slot| std::mem::replace(slot, Value::Null))
        }
        _ => None,
    }
}
